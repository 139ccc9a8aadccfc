//! Render thread lifecycle.
//!
//! A [`SurfaceOwner`] receives platform notifications on UI threads and turns
//! each one into a mutation of the shared [`Lifecycle`]. A single render
//! thread ([`RenderLoop`]) parks on that state, creates and releases the
//! native context and surface as it changes, runs queued commands, and draws.
//!
//! Loops that would otherwise hold native contexts at the same time serialize
//! on a [`ContextLock`].

mod error;
mod lock;
mod owner;
mod queue;
mod render_loop;
mod state;

pub use error::LifecycleError;
pub use lock::{ContextLease, ContextLock};
pub use owner::SurfaceOwner;
pub use queue::{Command, CommandQueue};
pub use render_loop::{LoopConfig, RenderLoop, StatsListener};
pub use state::{Lifecycle, LifecycleState, LoopPhase};
