use winit::dpi::PhysicalSize;

use crate::time::FrameTime;

use super::{ConfigRequest, ContextProvider};

/// Per-callback view of the live context and surface.
///
/// Only handed out on the render thread while both exist.
pub struct FrameCtx<'a, P: ContextProvider> {
    pub context: &'a P::Context,
    pub surface: &'a mut P::Surface,
    pub size: PhysicalSize<u32>,
    pub time: FrameTime,
}

/// Application drawing contract.
///
/// Callbacks run on the render thread. `on_surface_created` fires once per
/// context creation, before any `on_draw_frame` on that context; recreate GPU
/// resources there.
pub trait Renderer<P: ContextProvider>: Send + 'static {
    /// Framebuffer configuration to request from the provider.
    fn config_spec(&self) -> ConfigRequest {
        ConfigRequest::default()
    }

    fn on_surface_created(&mut self, ctx: &mut FrameCtx<'_, P>);

    /// Drawable size changed. Never called with a zero dimension.
    fn on_size_changed(&mut self, ctx: &mut FrameCtx<'_, P>, width: u32, height: u32);

    fn on_draw_frame(&mut self, ctx: &mut FrameCtx<'_, P>);
}
