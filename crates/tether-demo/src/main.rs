use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tether_engine::device::{WgpuInit, WgpuProvider};
use tether_engine::input::{EventListener, Key, KeyEvent};
use tether_engine::lifecycle::{CommandQueue, LoopConfig, SurfaceOwner};
use tether_engine::logging::{LoggingConfig, init_logging};
use tether_engine::provider::{ConfigRequest, FrameCtx, LoggingProvider, Renderer};
use tether_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;
use winit::window::Window;

type Provider = LoggingProvider<WgpuProvider<Window>>;

/// Clears the window to a slowly cycling colour.
struct ClearRenderer {
    animating: Arc<AtomicBool>,
    phase: f32,
}

impl ClearRenderer {
    fn color(&self) -> wgpu::Color {
        let third = std::f32::consts::TAU / 3.0;
        let channel = |offset: f32| (0.5 + 0.4 * (self.phase + offset).sin()) as f64;
        wgpu::Color {
            r: channel(0.0),
            g: channel(third),
            b: channel(2.0 * third),
            a: 1.0,
        }
    }
}

impl Renderer<Provider> for ClearRenderer {
    fn config_spec(&self) -> ConfigRequest {
        ConfigRequest {
            depth_bits: 0,
            ..ConfigRequest::default()
        }
    }

    fn on_surface_created(&mut self, ctx: &mut FrameCtx<'_, Provider>) {
        log::info!(
            "surface created: {:?} {}x{}",
            ctx.surface.format(),
            ctx.size.width,
            ctx.size.height
        );
    }

    fn on_size_changed(&mut self, _ctx: &mut FrameCtx<'_, Provider>, width: u32, height: u32) {
        log::info!("drawable size {width}x{height}");
    }

    fn on_draw_frame(&mut self, ctx: &mut FrameCtx<'_, Provider>) {
        if self.animating.load(Ordering::Relaxed) {
            self.phase = (self.phase + ctx.time.dt * 0.8) % std::f32::consts::TAU;
        }

        let Some(mut frame) = ctx.surface.begin_frame(ctx.context) else {
            return;
        };
        frame.clear(self.color());
        ctx.surface.submit(ctx.context, frame);
    }
}

/// Space toggles the animation on the render thread.
struct Controls {
    commands: CommandQueue,
    animating: Arc<AtomicBool>,
}

impl EventListener for Controls {
    fn on_key(&mut self, event: &KeyEvent) -> bool {
        if event.key != Key::Space || !event.is_pressed() || event.repeat {
            return false;
        }
        let animating = Arc::clone(&self.animating);
        self.commands.enqueue(move || {
            let was = animating.fetch_xor(true, Ordering::Relaxed);
            log::info!("animation {}", if was { "paused" } else { "resumed" });
        });
        true
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let provider = LoggingProvider::with_label(WgpuProvider::new(WgpuInit::default()), "wgpu");
    let owner = SurfaceOwner::with_config(provider, LoopConfig::default());

    let animating = Arc::new(AtomicBool::new(true));
    owner.set_event_listener(Controls {
        commands: owner.commands(),
        animating: Arc::clone(&animating),
    });
    owner.set_frame_stats_listener(|stats| {
        log::info!("{:.1} fps ({} frames total)", stats.fps, stats.total_frames);
    });

    let renderer = ClearRenderer {
        animating,
        phase: 0.0,
    };
    let config = RuntimeConfig {
        title: "tether demo".to_string(),
        initial_size: LogicalSize::new(960.0, 600.0),
    };

    Runtime::run(config, owner, renderer)
}
