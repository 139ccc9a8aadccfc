use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::provider::{ConfigRequest, ContextProvider, PresentResult};

use super::surface::{self, SurfaceErrorAction};
use super::{GpuFrame, WgpuInit};

/// Adapter chosen for a renderer's [`ConfigRequest`].
pub struct WgpuConfig {
    pub adapter: wgpu::Adapter,
    pub request: ConfigRequest,
}

/// Set once by the device-lost callback; shared by a context and its surfaces.
#[derive(Clone, Default)]
struct LossFlag(Arc<AtomicBool>);

impl LossFlag {
    fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A logical device and its queue.
pub struct WgpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub request: ConfigRequest,
    lost: LossFlag,
}

impl WgpuContext {
    /// Whether the device reported itself lost.
    pub fn is_lost(&self) -> bool {
        self.lost.is_set()
    }
}

/// A configured window surface plus the texture acquired for the current frame.
pub struct WgpuSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    pending: Option<wgpu::SurfaceTexture>,
    lost: bool,
    device_lost: LossFlag,
}

impl WgpuSurface {
    /// The surface itself failed, or the device behind it is gone.
    pub fn is_lost(&self) -> bool {
        self.lost || self.device_lost.is_set()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    /// Acquires the next surface texture and creates an encoder.
    ///
    /// Returns `None` when no frame can be drawn this iteration. A lost
    /// surface or device is reported as a context loss when the loop presents.
    pub fn begin_frame(&mut self, context: &WgpuContext) -> Option<GpuFrame> {
        if self.is_lost() {
            return None;
        }

        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                match surface::classify_surface_error(&err) {
                    SurfaceErrorAction::Reconfigure => {
                        log::debug!("surface outdated; reconfiguring");
                        self.surface.configure(&context.device, &self.config);
                    }
                    SurfaceErrorAction::SkipFrame => {
                        log::debug!("skipping frame: {err}");
                    }
                    SurfaceErrorAction::Lost => {
                        log::warn!("surface lost: {err}");
                        self.lost = true;
                    }
                }
                return None;
            }
        };

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tether frame encoder"),
            });

        self.pending = Some(texture);
        Some(GpuFrame {
            view,
            encoder,
            format: self.config.format,
        })
    }

    /// Submits the commands recorded into `frame`. Presentation happens when
    /// the render loop presents the surface.
    pub fn submit(&mut self, context: &WgpuContext, frame: GpuFrame) {
        context
            .queue
            .submit(std::iter::once(frame.encoder.finish()));
    }
}

/// [`ContextProvider`] over wgpu for any window exposing raw handles.
///
/// Adapters are picked to match the last window a surface was created for.
/// Before any window is known the choice is surface-agnostic; a mismatch then
/// shows up as a context loss and the next start picks a compatible adapter.
pub struct WgpuProvider<W> {
    instance: wgpu::Instance,
    init: WgpuInit,
    target: Option<Arc<W>>,
}

impl<W> WgpuProvider<W> {
    pub fn new(init: WgpuInit) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });
        Self {
            instance,
            init,
            target: None,
        }
    }
}

impl<W> Default for WgpuProvider<W> {
    fn default() -> Self {
        Self::new(WgpuInit::default())
    }
}

impl<W> ContextProvider for WgpuProvider<W>
where
    W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
{
    type Window = Arc<W>;
    type Config = WgpuConfig;
    type Context = WgpuContext;
    type Surface = WgpuSurface;

    fn choose_config(&mut self, request: &ConfigRequest) -> Result<Option<WgpuConfig>> {
        if !surface::supports_request(request) {
            return Ok(None);
        }

        // Only used to filter adapters; dropped before the real surface exists.
        let target = self.target.as_ref().and_then(|window| {
            self.instance
                .create_surface(Arc::clone(window))
                .inspect_err(|err| log::debug!("adapter not matched to window: {err}"))
                .ok()
        });

        let adapter = pollster::block_on(self.instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: self.init.power_preference,
                compatible_surface: target.as_ref(),
                force_fallback_adapter: false,
            },
        ));
        drop(target);

        match adapter {
            Ok(adapter) => {
                let info = adapter.get_info();
                log::info!("using adapter {} ({:?})", info.name, info.backend);
                Ok(Some(WgpuConfig {
                    adapter,
                    request: *request,
                }))
            }
            Err(err) => {
                log::warn!("no adapter for {request}: {err}");
                Ok(None)
            }
        }
    }

    fn create_context(&mut self, config: &WgpuConfig) -> Result<WgpuContext> {
        let (device, queue) = pollster::block_on(config.adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tether device"),
                required_features: self.init.required_features,
                required_limits: self.init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            },
        ))
        .context("failed to create wgpu device/queue")?;

        let lost = LossFlag::default();
        {
            let lost = lost.clone();
            device.set_device_lost_callback(move |reason, message| {
                log::warn!("wgpu device lost ({reason:?}): {message}");
                lost.mark();
            });
        }

        Ok(WgpuContext {
            adapter: config.adapter.clone(),
            device,
            queue,
            request: config.request,
            lost,
        })
    }

    fn create_surface(
        &mut self,
        context: &WgpuContext,
        window: &Arc<W>,
        size: PhysicalSize<u32>,
    ) -> Result<WgpuSurface> {
        self.target = Some(Arc::clone(window));
        let surface = self
            .instance
            .create_surface(Arc::clone(window))
            .context("failed to create wgpu surface")?;

        let caps = surface.get_capabilities(&context.adapter);
        let supported = surface::choose_surface_format(&caps, context.request.prefer_srgb);
        if supported.is_none() {
            log::warn!("adapter cannot present to this window; dropping the context");
        }
        // An unsupported surface is never configured; it only reports the loss.
        let format = supported.unwrap_or(wgpu::TextureFormat::Bgra8Unorm);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface::choose_present_mode(&caps, context.request.vsync),
            alpha_mode: surface::choose_alpha_mode(
                &caps,
                self.init.alpha_mode,
                context.request.alpha_bits > 0,
            ),
            view_formats: vec![],
            desired_maximum_frame_latency: self.init.desired_maximum_frame_latency,
        };
        if supported.is_none() {
            return Ok(WgpuSurface {
                surface,
                config,
                pending: None,
                lost: true,
                device_lost: context.lost.clone(),
            });
        }
        surface.configure(&context.device, &config);

        log::info!(
            "surface configured {}x{} {:?} {:?}",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(WgpuSurface {
            surface,
            config,
            pending: None,
            lost: false,
            device_lost: context.lost.clone(),
        })
    }

    fn make_current(&mut self, context: &WgpuContext, surface: &WgpuSurface) -> bool {
        !context.is_lost() && !surface.is_lost()
    }

    fn present(&mut self, surface: &mut WgpuSurface) -> PresentResult {
        if surface.is_lost() {
            surface.pending = None;
            return PresentResult::ContextLost;
        }
        if let Some(texture) = surface.pending.take() {
            texture.present();
        }
        PresentResult::Ok
    }

    fn destroy_surface(&mut self, _context: &WgpuContext, mut surface: WgpuSurface) {
        // An acquired texture must be released before its surface.
        surface.pending = None;
        drop(surface);
    }

    fn destroy_context(&mut self, context: WgpuContext) {
        context.device.destroy();
    }

    fn terminate(&mut self) {
        log::debug!("wgpu provider terminated");
    }
}
