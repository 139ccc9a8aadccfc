//! Tether engine crate.
//!
//! Runs rendering on a dedicated thread that owns the native graphics
//! context, and keeps that thread in step with the host's lifecycle
//! (pause/resume, focus, surface creation and loss, resizes).

pub mod device;
pub mod input;
pub mod lifecycle;
pub mod logging;
pub mod provider;
pub mod time;
pub mod window;

pub use lifecycle::{LifecycleError, LoopConfig, LoopPhase, SurfaceOwner};
pub use provider::{ConfigRequest, ContextProvider, FrameCtx, PresentResult, Renderer};
