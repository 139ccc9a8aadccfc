use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::input::platform::WinitTranslator;
use crate::lifecycle::{LifecycleError, SurfaceOwner};
use crate::provider::{ContextProvider, Renderer};

/// How often the host checks on the render loop while idle.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tether".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Hosts a single window on the winit event loop and forwards its lifecycle
/// to a [`SurfaceOwner`]. Drawing happens on the owner's render thread.
pub struct Runtime;

impl Runtime {
    /// Runs until the window closes or the render loop stops.
    ///
    /// `renderer` is installed on the owner the first time the platform
    /// resumes the application.
    pub fn run<P, R>(config: RuntimeConfig, owner: SurfaceOwner<P>, renderer: R) -> Result<()>
    where
        P: ContextProvider<Window = Arc<Window>>,
        R: Renderer<P>,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut host = Host::new(config, owner, renderer);

        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")?;

        host.finish().context("render loop failed")
    }
}

struct Host<P: ContextProvider, R> {
    config: RuntimeConfig,
    owner: SurfaceOwner<P>,
    renderer: Option<R>,
    window: Option<Arc<Window>>,
    translator: WinitTranslator,
    outcome: Option<Result<(), LifecycleError>>,
}

impl<P, R> Host<P, R>
where
    P: ContextProvider<Window = Arc<Window>>,
    R: Renderer<P>,
{
    fn new(config: RuntimeConfig, owner: SurfaceOwner<P>, renderer: R) -> Self {
        Self {
            config,
            owner,
            renderer: Some(renderer),
            window: None,
            translator: WinitTranslator::new(),
            outcome: None,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<Arc<Window>> {
        if let Some(window) = &self.window {
            return Ok(Arc::clone(window));
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        self.window = Some(Arc::clone(&window));
        Ok(window)
    }

    fn resize(&self, size: PhysicalSize<u32>) {
        self.owner.on_surface_resized(size.width, size.height);
    }

    /// Stops the render thread once; later calls keep the first outcome.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if self.outcome.is_none() {
            self.outcome = Some(self.owner.on_detach());
        }
        event_loop.exit();
    }

    fn finish(mut self) -> Result<(), LifecycleError> {
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.owner.on_detach(),
        }
    }
}

impl<P, R> ApplicationHandler for Host<P, R>
where
    P: ContextProvider<Window = Arc<Window>>,
    R: Renderer<P>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = match self.ensure_window(event_loop) {
            Ok(window) => window,
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.shutdown(event_loop);
                return;
            }
        };

        self.resize(window.inner_size());
        self.owner.on_focus_changed(window.has_focus());
        self.owner.on_surface_available(window);

        if let Some(renderer) = self.renderer.take() {
            if let Err(e) = self.owner.set_renderer(renderer) {
                log::error!("failed to start render loop: {e}");
                self.shutdown(event_loop);
                return;
            }
        }

        self.owner.on_resume();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.owner.on_pause();
        self.owner.on_surface_lost();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_none() && self.outcome.is_none() && !self.owner.is_running() {
            if let Some(err) = self.owner.failure() {
                log::error!("render loop stopped: {err}");
            }
            self.shutdown(event_loop);
            return;
        }

        // Desktop platforms never hand over a fresh surface after a device
        // loss, so recovery is requested here.
        if let Some(err) = self.owner.failure()
            && err.is_recoverable()
        {
            log::warn!("{err}; recreating the rendering context");
            self.owner.clear_context_lost();
        }

        event_loop.set_control_flow(ControlFlow::wait_duration(HEALTH_CHECK_INTERVAL));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.shutdown(event_loop);
                return;
            }
            WindowEvent::Destroyed => self.owner.on_surface_lost(),
            WindowEvent::Focused(focused) => self.owner.on_focus_changed(*focused),
            WindowEvent::Resized(size) => self.resize(*size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.resize(window.inner_size());
                }
            }
            _ => {}
        }

        if let Some(input) = self.translator.translate(&event) {
            if !self.owner.dispatch_input(&input) {
                log::trace!("unhandled input {input:?}");
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.outcome.is_none() {
            self.outcome = Some(self.owner.on_detach());
        }
    }
}
