//! Capabilities consumed by the render loop.
//!
//! The loop never talks to a graphics API directly. Native context and
//! surface management goes through [`ContextProvider`]; application drawing
//! goes through [`Renderer`]. Both are driven exclusively from the render
//! thread.

mod config;
mod logging;
mod renderer;

#[cfg(test)]
pub(crate) mod recording;

pub use config::ConfigRequest;
pub use logging::LoggingProvider;
pub use renderer::{FrameCtx, Renderer};

use anyhow::Result;
use winit::dpi::PhysicalSize;

/// Outcome of presenting a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentResult {
    Ok,
    /// The context was invalidated; nothing may be drawn on it again.
    ContextLost,
}

/// Native context/surface API.
///
/// All methods are called on the render thread only. Handles are opaque to the
/// loop; it only moves them between calls.
pub trait ContextProvider: Send + 'static {
    /// Window handle surfaces are bound to.
    type Window: Clone + Send + 'static;
    type Config;
    type Context;
    type Surface;

    /// Picks a configuration satisfying `request`, or `None` if none does.
    fn choose_config(&mut self, request: &ConfigRequest) -> Result<Option<Self::Config>>;

    fn create_context(&mut self, config: &Self::Config) -> Result<Self::Context>;

    /// Creates a drawable surface bound to `window`, sized `size`.
    fn create_surface(
        &mut self,
        context: &Self::Context,
        window: &Self::Window,
        size: PhysicalSize<u32>,
    ) -> Result<Self::Surface>;

    /// Binds `context` to `surface`. `false` means the context is unusable.
    fn make_current(&mut self, context: &Self::Context, surface: &Self::Surface) -> bool;

    /// Presents the frame drawn into `surface`.
    fn present(&mut self, surface: &mut Self::Surface) -> PresentResult;

    fn destroy_surface(&mut self, context: &Self::Context, surface: Self::Surface);

    fn destroy_context(&mut self, context: Self::Context);

    /// Releases provider-wide resources once the loop stops.
    fn terminate(&mut self);
}
