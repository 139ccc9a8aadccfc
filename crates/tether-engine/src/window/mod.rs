//! winit host runtime.
//!
//! Owns the `winit` EventLoop and Window and translates their lifecycle into
//! [`SurfaceOwner`](crate::lifecycle::SurfaceOwner) notifications.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
