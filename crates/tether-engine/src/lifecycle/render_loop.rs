use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use winit::dpi::PhysicalSize;

use crate::provider::{ConfigRequest, ContextProvider, FrameCtx, PresentResult, Renderer};
use crate::time::{FpsCounter, FrameClock, FrameStats};

use super::error::LifecycleError;
use super::lock::ContextLock;
use super::queue::CommandQueue;
use super::state::{FrameRequest, Lifecycle, LoopPhase};

/// Render thread configuration.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Thread name prefix. Each loop appends its own sequence number; the
    /// result names the OS thread, the context lock holder and log lines.
    pub thread_name: String,

    /// How often frame statistics are reported.
    pub stats_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            thread_name: "render-thread".to_string(),
            stats_interval: Duration::from_secs(1),
        }
    }
}

/// Callback receiving periodic frame statistics on the render thread.
pub type StatsListener = Box<dyn FnMut(FrameStats) + Send>;

pub(crate) type StatsSlot = Arc<Mutex<Option<StatsListener>>>;

static NEXT_LOOP_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a running render thread.
pub struct RenderLoop<W> {
    name: String,
    lifecycle: Arc<Lifecycle<W>>,
    handle: JoinHandle<Result<(), LifecycleError>>,
}

impl<W: Clone + Send + 'static> RenderLoop<W> {
    /// Starts the render thread.
    ///
    /// The thread first takes `lock`, blocking while another loop holds it.
    pub fn spawn<P, R>(
        provider: P,
        renderer: R,
        lifecycle: Arc<Lifecycle<W>>,
        commands: CommandQueue,
        lock: ContextLock,
        config: LoopConfig,
    ) -> Result<Self, LifecycleError>
    where
        P: ContextProvider<Window = W>,
        R: Renderer<P>,
    {
        Self::spawn_with_stats(
            provider,
            renderer,
            lifecycle,
            commands,
            lock,
            config,
            Arc::new(Mutex::new(None)),
        )
    }

    pub(crate) fn spawn_with_stats<P, R>(
        provider: P,
        renderer: R,
        lifecycle: Arc<Lifecycle<W>>,
        commands: CommandQueue,
        lock: ContextLock,
        config: LoopConfig,
        stats: StatsSlot,
    ) -> Result<Self, LifecycleError>
    where
        P: ContextProvider<Window = W>,
        R: Renderer<P>,
    {
        lifecycle.set_phase(LoopPhase::Starting);

        let mut config = config;
        config.thread_name = format!(
            "{}-{}",
            config.thread_name,
            NEXT_LOOP_ID.fetch_add(1, Ordering::Relaxed)
        );
        let name = config.thread_name.clone();
        let shared = Arc::clone(&lifecycle);

        // Context and surface handles are created on the render thread and
        // never leave it, so the thread state is assembled there as well.
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let fps = FpsCounter::new(config.stats_interval);
                RenderThread {
                    provider,
                    renderer,
                    lifecycle: shared,
                    commands,
                    lock,
                    config,
                    stats,
                    clock: FrameClock::new(),
                    fps,
                    active: None,
                    surfaces_created: 0,
                }
                .run()
            })
            .map_err(|e| {
                lifecycle.set_phase(LoopPhase::Terminated);
                LifecycleError::Spawn(e.to_string())
            })?;

        Ok(Self {
            name,
            lifecycle,
            handle,
        })
    }

    /// Thread name, also the name the loop holds the context lock under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the render thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Asks the render thread to stop and joins it.
    ///
    /// Must not be called from the render thread itself: it would wait for
    /// its own exit forever.
    pub fn request_exit_and_wait(self) -> Result<(), LifecycleError> {
        self.lifecycle.request_exit();
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(LifecycleError::RenderThreadPanicked),
        }
    }
}

struct ActiveContext<P: ContextProvider> {
    context: P::Context,
    surface: Option<BoundSurface<P>>,
    /// `on_surface_created` already fired for this context.
    announced: bool,
}

struct BoundSurface<P: ContextProvider> {
    surface: P::Surface,
    id: u64,
    generation: u64,
    /// Size last passed to `on_size_changed` for this surface.
    reported: Option<PhysicalSize<u32>>,
}

/// Marks the loop terminated however the thread exits.
struct ExitGuard<W> {
    lifecycle: Arc<Lifecycle<W>>,
}

impl<W> Drop for ExitGuard<W> {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("render thread panicked");
            self.lifecycle.record_failure(LifecycleError::RenderThreadPanicked);
        }
        self.lifecycle.set_phase(LoopPhase::Terminated);
    }
}

struct RenderThread<P: ContextProvider, R> {
    provider: P,
    renderer: R,
    lifecycle: Arc<Lifecycle<P::Window>>,
    commands: CommandQueue,
    lock: ContextLock,
    config: LoopConfig,
    stats: StatsSlot,
    clock: FrameClock,
    fps: FpsCounter,
    active: Option<ActiveContext<P>>,
    surfaces_created: u64,
}

impl<P, R> RenderThread<P, R>
where
    P: ContextProvider,
    R: Renderer<P>,
{
    fn run(mut self) -> Result<(), LifecycleError> {
        let _exit = ExitGuard {
            lifecycle: Arc::clone(&self.lifecycle),
        };

        let lease = self.lock.acquire(&self.config.thread_name);
        let request = self.renderer.config_spec();

        // Context and surface are released before the lease, panic or not.
        let result = if self.lifecycle.read(|s| s.done) {
            Ok(())
        } else {
            panic::catch_unwind(AssertUnwindSafe(|| {
                self.start(&request)
                    .and_then(|()| self.guarded_run(&request))
            }))
            .unwrap_or_else(|payload| {
                log::error!(
                    "{}: render thread panicked: {}",
                    self.config.thread_name,
                    panic_message(payload.as_ref())
                );
                Err(LifecycleError::RenderThreadPanicked)
            })
        };

        self.lifecycle.set_phase(LoopPhase::Stopping);
        self.release_context();
        self.provider.terminate();
        drop(lease);

        let discarded = self.commands.discard();
        if discarded > 0 {
            log::debug!("{}: discarded {discarded} pending command(s)", self.config.thread_name);
        }

        if let Err(err) = &result {
            log::error!("{}: render loop failed: {err}", self.config.thread_name);
            self.lifecycle.record_failure(err.clone());
        }
        result
    }

    fn guarded_run(&mut self, request: &ConfigRequest) -> Result<(), LifecycleError> {
        loop {
            self.commands.drain_all();

            let Some(frame) = self.await_frame() else {
                return Ok(());
            };

            // Commands queued while parked still precede the next frame.
            self.commands.drain_all();

            if self.active.is_none() {
                self.lifecycle.set_phase(LoopPhase::Restarting);
                self.start(request)?;
            }
            self.lifecycle.set_phase(LoopPhase::Active);

            if !self.prepare_surface(&frame)? {
                continue;
            }
            if !self.draw(frame.size) {
                self.lifecycle.wait_for_change(frame.revision);
            }
        }
    }

    /// Chooses a config and creates a fresh context.
    fn start(&mut self, request: &ConfigRequest) -> Result<(), LifecycleError> {
        let config = self
            .provider
            .choose_config(request)
            .map_err(|e| LifecycleError::provider(&e))?
            .ok_or_else(|| LifecycleError::ConfigUnavailable(request.to_string()))?;

        let context = self
            .provider
            .create_context(&config)
            .map_err(|e| LifecycleError::provider(&e))?;
        log::info!("{}: rendering context created", self.config.thread_name);

        self.active = Some(ActiveContext {
            context,
            surface: None,
            announced: false,
        });
        self.clock.reset();
        self.fps.restart(Instant::now());
        Ok(())
    }

    /// Blocks until a frame may be drawn. `None` once exit was requested.
    ///
    /// Releases the context while paused or lost, and the surface while the
    /// platform has none, before parking.
    fn await_frame(&mut self) -> Option<FrameRequest<P::Window>> {
        let lifecycle = Arc::clone(&self.lifecycle);
        let mut state = lifecycle.lock();
        loop {
            if state.done {
                return None;
            }

            if (state.paused || state.context_lost) && self.active.is_some() {
                MutexGuard::unlocked(&mut state, || self.release_context());
                continue;
            }

            if !state.has_surface && self.has_surface() {
                MutexGuard::unlocked(&mut state, || self.release_surface());
                continue;
            }

            if !state.need_to_wait() {
                return Some(state.take_frame());
            }

            state.enter(LoopPhase::Waiting);
            lifecycle.wait(&mut state);
        }
    }

    /// Makes sure a current surface matching `frame` exists.
    ///
    /// Returns `false` when nothing can be drawn this iteration.
    fn prepare_surface(
        &mut self,
        frame: &FrameRequest<P::Window>,
    ) -> Result<bool, LifecycleError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(false);
        };

        let stale = match &active.surface {
            None => true,
            Some(bound) => bound.generation != frame.surface_generation || frame.size_changed,
        };
        if !stale {
            return Ok(true);
        }

        let Some(window) = frame.window.as_ref() else {
            return Ok(false);
        };

        if let Some(old) = active.surface.take() {
            self.provider.destroy_surface(&active.context, old.surface);
        }

        let surface = self
            .provider
            .create_surface(&active.context, window, frame.size)
            .map_err(|e| LifecycleError::provider(&e))?;
        self.surfaces_created += 1;

        if !self.provider.make_current(&active.context, &surface) {
            log::warn!(
                "{}: make_current failed; treating the context as lost",
                self.config.thread_name
            );
            self.provider.destroy_surface(&active.context, surface);
            self.lifecycle.mark_context_lost();
            return Ok(false);
        }

        log::debug!(
            "{}: surface #{} bound at {}x{}",
            self.config.thread_name,
            self.surfaces_created,
            frame.size.width,
            frame.size.height
        );
        active.surface = Some(BoundSurface {
            surface,
            id: self.surfaces_created,
            generation: frame.surface_generation,
            reported: None,
        });
        Ok(true)
    }

    /// Runs the renderer callbacks for one frame and presents it.
    ///
    /// Returns `false` if the size is degenerate and nothing was drawn.
    fn draw(&mut self, size: PhysicalSize<u32>) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let Some(bound) = active.surface.as_mut() else {
            return false;
        };

        let mut ctx = FrameCtx::<P> {
            context: &active.context,
            surface: &mut bound.surface,
            size,
            time: self.clock.peek(),
        };

        if !active.announced {
            self.renderer.on_surface_created(&mut ctx);
            active.announced = true;
        }

        let drawable = size.width > 0 && size.height > 0;
        if !drawable {
            return false;
        }

        if bound.reported != Some(size) {
            self.renderer.on_size_changed(&mut ctx, size.width, size.height);
            bound.reported = Some(size);
        }

        ctx.time = self.clock.tick();
        self.renderer.on_draw_frame(&mut ctx);

        match self.provider.present(&mut bound.surface) {
            PresentResult::Ok => self.report_frame(),
            PresentResult::ContextLost => {
                log::warn!(
                    "{}: context lost while presenting surface #{}",
                    self.config.thread_name,
                    bound.id
                );
                self.lifecycle.mark_context_lost();
            }
        }
        true
    }

    fn report_frame(&mut self) {
        let Some(stats) = self.fps.record(Instant::now()) else {
            return;
        };
        log::debug!(
            "{}: {:.1} fps ({} frames total)",
            self.config.thread_name,
            stats.fps,
            stats.total_frames
        );
        if let Some(listener) = self.stats.lock().as_mut() {
            listener(stats);
        }
    }

    fn has_surface(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.surface.is_some())
    }

    fn release_surface(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if let Some(bound) = active.surface.take() {
            log::debug!("{}: releasing surface #{}", self.config.thread_name, bound.id);
            self.provider.destroy_surface(&active.context, bound.surface);
        }
    }

    fn release_context(&mut self) {
        self.release_surface();
        if let Some(active) = self.active.take() {
            self.provider.destroy_context(active.context);
            log::info!("{}: rendering context released", self.config.thread_name);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
