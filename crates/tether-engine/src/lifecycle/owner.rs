use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::input::{self, EventListener, InputEvent};
use crate::provider::{ContextProvider, Renderer};
use crate::time::FrameStats;

use super::error::LifecycleError;
use super::lock::ContextLock;
use super::queue::CommandQueue;
use super::render_loop::{LoopConfig, RenderLoop, StatsSlot};
use super::state::{Lifecycle, LoopPhase};

/// Where the owner's render loop is in its life.
enum LoopSlot<W> {
    Idle,
    Running(RenderLoop<W>),
    /// Joined; later detaches report the same result.
    Joined(Result<(), LifecycleError>),
}

/// UI-facing façade over one render loop.
///
/// Every platform notification maps to exactly one lifecycle mutation and
/// returns immediately. The only blocking call is [`SurfaceOwner::on_detach`],
/// which joins the render thread. All methods take `&self`, so the owner can
/// be shared between several UI threads.
///
/// Notifications delivered before [`SurfaceOwner::set_renderer`] are kept and
/// observed by the loop once it starts.
pub struct SurfaceOwner<P: ContextProvider> {
    lifecycle: Arc<Lifecycle<P::Window>>,
    commands: CommandQueue,
    lock: ContextLock,
    config: LoopConfig,
    provider: Mutex<Option<P>>,
    render_loop: Mutex<LoopSlot<P::Window>>,
    listener: Mutex<Option<Box<dyn EventListener>>>,
    stats: StatsSlot,
}

impl<P: ContextProvider> SurfaceOwner<P> {
    /// Owner whose loop serializes on the process-wide context lock.
    pub fn new(provider: P) -> Self {
        Self::with_lock(provider, ContextLock::process(), LoopConfig::default())
    }

    pub fn with_config(provider: P, config: LoopConfig) -> Self {
        Self::with_lock(provider, ContextLock::process(), config)
    }

    /// Owner whose loop serializes on `lock` instead of the process-wide one.
    pub fn with_lock(provider: P, lock: ContextLock, config: LoopConfig) -> Self {
        Self {
            lifecycle: Arc::new(Lifecycle::new()),
            commands: CommandQueue::new(),
            lock,
            config,
            provider: Mutex::new(Some(provider)),
            render_loop: Mutex::new(LoopSlot::Idle),
            listener: Mutex::new(None),
            stats: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts the render thread driving `renderer`.
    ///
    /// An owner runs at most one loop; later calls fail with
    /// [`LifecycleError::AlreadyStarted`].
    pub fn set_renderer<R: Renderer<P>>(&self, renderer: R) -> Result<(), LifecycleError> {
        let mut slot = self.render_loop.lock();
        if !matches!(*slot, LoopSlot::Idle) {
            return Err(LifecycleError::AlreadyStarted);
        }
        let provider = self
            .provider
            .lock()
            .take()
            .ok_or(LifecycleError::AlreadyStarted)?;

        let render_loop = RenderLoop::spawn_with_stats(
            provider,
            renderer,
            Arc::clone(&self.lifecycle),
            self.commands.clone(),
            self.lock.clone(),
            self.config.clone(),
            Arc::clone(&self.stats),
        )?;
        log::debug!("{}: render thread started", render_loop.name());
        *slot = LoopSlot::Running(render_loop);
        Ok(())
    }

    pub fn on_pause(&self) {
        self.lifecycle.set_paused(true);
    }

    pub fn on_resume(&self) {
        self.lifecycle.set_paused(false);
    }

    pub fn on_focus_changed(&self, has_focus: bool) {
        self.lifecycle.set_focus(has_focus);
    }

    /// The platform created (or replaced) the window surfaces are bound to.
    pub fn on_surface_available(&self, window: P::Window) {
        self.lifecycle.surface_available(window);
    }

    /// The platform is about to destroy the window surface.
    pub fn on_surface_lost(&self) {
        self.lifecycle.set_surface_present(false);
    }

    pub fn on_surface_resized(&self, width: u32, height: u32) {
        self.lifecycle.set_size(width, height);
    }

    /// Clears a context loss so the loop recreates its context.
    pub fn clear_context_lost(&self) {
        self.lifecycle.clear_context_lost();
    }

    /// Stops the render thread and waits for it to exit.
    ///
    /// Returns the loop's terminal result. Concurrent callers all block until
    /// the thread has exited and then see the same result. Must not be called
    /// from the render thread (including from queued commands).
    pub fn on_detach(&self) -> Result<(), LifecycleError> {
        let mut slot = self.render_loop.lock();
        let result = match mem::replace(&mut *slot, LoopSlot::Idle) {
            LoopSlot::Idle => return Ok(()),
            LoopSlot::Joined(result) => result,
            LoopSlot::Running(render_loop) => {
                let name = render_loop.name().to_owned();
                let result = render_loop.request_exit_and_wait();
                log::debug!("{name}: render thread joined");
                result
            }
        };
        *slot = LoopSlot::Joined(result.clone());
        result
    }

    /// Runs `action` on the render thread before its next frame.
    pub fn queue_event<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.commands.enqueue(action);
    }

    /// Handle to the command queue, for code that outlives a borrow of the owner.
    pub fn commands(&self) -> CommandQueue {
        self.commands.clone()
    }

    pub fn set_event_listener<L: EventListener + 'static>(&self, listener: L) {
        *self.listener.lock() = Some(Box::new(listener));
    }

    /// Hands `event` to the installed listener. `false` if nobody consumed it.
    pub fn dispatch_input(&self, event: &InputEvent) -> bool {
        match self.listener.lock().as_mut() {
            Some(listener) => input::dispatch(listener.as_mut(), event),
            None => false,
        }
    }

    /// Installs a callback receiving frame statistics on the render thread.
    pub fn set_frame_stats_listener<F>(&self, listener: F)
    where
        F: FnMut(FrameStats) + Send + 'static,
    {
        *self.stats.lock() = Some(Box::new(listener));
    }

    pub fn phase(&self) -> LoopPhase {
        self.lifecycle.phase()
    }

    /// Fatal error the render loop stopped with, or
    /// [`LifecycleError::ContextLost`] while it is parked on a lost context.
    pub fn failure(&self) -> Option<LifecycleError> {
        self.lifecycle.failure().or_else(|| {
            self.lifecycle
                .read(|s| s.context_lost)
                .then_some(LifecycleError::ContextLost)
        })
    }

    /// Blocks while another thread is inside [`SurfaceOwner::on_detach`].
    pub fn is_running(&self) -> bool {
        match &*self.render_loop.lock() {
            LoopSlot::Running(render_loop) => !render_loop.is_finished(),
            LoopSlot::Idle | LoopSlot::Joined(_) => false,
        }
    }
}

impl<P: ContextProvider> Drop for SurfaceOwner<P> {
    fn drop(&mut self) {
        let name = match self.render_loop.get_mut() {
            LoopSlot::Running(render_loop) => render_loop.name().to_owned(),
            LoopSlot::Idle | LoopSlot::Joined(_) => return,
        };
        if let Err(err) = self.on_detach() {
            log::warn!("{name}: render loop ended with error: {err}");
        }
    }
}
