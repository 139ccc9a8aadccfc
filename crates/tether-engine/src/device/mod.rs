//! wgpu-backed context provider.
//!
//! Maps the render loop's context model onto wgpu:
//! - config: an adapter able to serve the requested framebuffer
//! - context: logical device + queue
//! - surface: a configured `wgpu::Surface` bound to a window
//!
//! Renderers acquire frames through [`WgpuSurface::begin_frame`] and hand them
//! back with [`WgpuSurface::submit`]; the render loop presents.

mod frame;
mod init;
mod provider;
mod surface;

pub use frame::GpuFrame;
pub use init::WgpuInit;
pub use provider::{WgpuConfig, WgpuContext, WgpuProvider, WgpuSurface};
pub use surface::SurfaceErrorAction;
