use parking_lot::{Condvar, Mutex, MutexGuard};
use winit::dpi::PhysicalSize;

use super::error::LifecycleError;

/// Observable phase of a render loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopPhase {
    /// No render thread has been started yet.
    Idle,
    /// Waiting for the context lock or creating the first context.
    Starting,
    /// Parked on the lifecycle condition variable.
    Waiting,
    /// Drawing frames.
    Active,
    /// Recreating the context after a pause or a context loss.
    Restarting,
    /// Tearing down the context and surface.
    Stopping,
    /// The render thread has exited.
    Terminated,
}

/// Lifecycle flags shared between owner threads and the render thread.
///
/// Only reachable through the [`Lifecycle`] lock.
#[derive(Debug)]
pub struct LifecycleState<W> {
    pub paused: bool,
    pub has_focus: bool,
    pub has_surface: bool,
    pub context_lost: bool,
    pub size_changed: bool,
    pub done: bool,
    pub width: u32,
    pub height: u32,

    /// Window the next surface is bound to.
    window: Option<W>,
    /// Bumped each time the platform hands over a (possibly new) window.
    surface_generation: u64,
    /// Bumped on every mutation.
    revision: u64,
    phase: LoopPhase,
    failure: Option<LifecycleError>,
}

impl<W> Default for LifecycleState<W> {
    fn default() -> Self {
        Self {
            paused: false,
            has_focus: false,
            has_surface: false,
            context_lost: false,
            size_changed: false,
            done: false,
            width: 0,
            height: 0,
            window: None,
            surface_generation: 0,
            revision: 0,
            phase: LoopPhase::Idle,
            failure: None,
        }
    }
}

impl<W> LifecycleState<W> {
    /// Render thread wait predicate.
    pub fn need_to_wait(&self) -> bool {
        (self.paused || !self.has_focus || !self.has_surface || self.context_lost) && !self.done
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width, self.height)
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn enter(&mut self, phase: LoopPhase) {
        if self.phase != phase {
            log::debug!("render loop: {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

impl<W: Clone> LifecycleState<W> {
    /// Takes everything the next frame needs in one step, clearing the
    /// size-changed flag in the same critical section that reads the size.
    pub(crate) fn take_frame(&mut self) -> FrameRequest<W> {
        let size_changed = std::mem::take(&mut self.size_changed);
        FrameRequest {
            size: self.size(),
            size_changed,
            surface_generation: self.surface_generation,
            window: self.window.clone(),
            revision: self.revision,
        }
    }
}

/// Snapshot taken by the render thread once it is allowed to proceed.
#[derive(Debug, Clone)]
pub(crate) struct FrameRequest<W> {
    pub size: PhysicalSize<u32>,
    pub size_changed: bool,
    pub surface_generation: u64,
    pub window: Option<W>,
    pub revision: u64,
}

/// Lifecycle state plus the condition variable the render thread parks on.
pub struct Lifecycle<W> {
    state: Mutex<LifecycleState<W>>,
    changed: Condvar,
}

impl<W> Default for Lifecycle<W> {
    fn default() -> Self {
        Self {
            state: Mutex::new(LifecycleState::default()),
            changed: Condvar::new(),
        }
    }
}

impl<W> Lifecycle<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `f` under the lock, then wakes the render thread.
    fn update<T>(&self, f: impl FnOnce(&mut LifecycleState<W>) -> T) -> T {
        let mut state = self.state.lock();
        let out = f(&mut state);
        state.revision = state.revision.wrapping_add(1);
        drop(state);
        self.changed.notify_all();
        out
    }

    pub fn set_paused(&self, paused: bool) {
        self.update(|s| s.paused = paused);
    }

    pub fn set_focus(&self, has_focus: bool) {
        self.update(|s| s.has_focus = has_focus);
    }

    /// Marks the surface present or gone.
    ///
    /// Presence requires a window previously handed over through
    /// [`Lifecycle::surface_available`]; without one the call is ignored.
    pub fn set_surface_present(&self, present: bool) {
        self.update(|s| {
            if present && s.window.is_none() {
                log::warn!("surface marked present but no window was ever attached; ignoring");
                return;
            }
            s.has_surface = present;
        });
    }

    /// Hands a window to the render thread and marks the surface present.
    ///
    /// A fresh surface also clears a pending context loss.
    pub fn surface_available(&self, window: W) {
        self.update(|s| {
            s.window = Some(window);
            s.surface_generation = s.surface_generation.wrapping_add(1);
            s.has_surface = true;
            s.context_lost = false;
        });
    }

    /// Records a new drawable size. Repeating the current size is a no-op.
    pub fn set_size(&self, width: u32, height: u32) {
        self.update(|s| {
            if s.width != width || s.height != height {
                s.width = width;
                s.height = height;
                s.size_changed = true;
            }
        });
    }

    pub fn request_exit(&self) {
        self.update(|s| s.done = true);
    }

    pub fn clear_context_lost(&self) {
        self.update(|s| s.context_lost = false);
    }

    pub(crate) fn mark_context_lost(&self) {
        self.update(|s| s.context_lost = true);
    }

    pub(crate) fn set_phase(&self, phase: LoopPhase) {
        self.state.lock().enter(phase);
    }

    pub(crate) fn record_failure(&self, err: LifecycleError) {
        self.state.lock().failure = Some(err);
    }

    pub fn phase(&self) -> LoopPhase {
        self.state.lock().phase
    }

    pub fn failure(&self) -> Option<LifecycleError> {
        self.state.lock().failure.clone()
    }

    /// Copies a field out of the state.
    pub fn read<T>(&self, f: impl FnOnce(&LifecycleState<W>) -> T) -> T {
        f(&self.state.lock())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, LifecycleState<W>> {
        self.state.lock()
    }

    /// Parks until any setter signals. Spurious wakeups are possible; callers
    /// re-check their predicate.
    pub(crate) fn wait(&self, guard: &mut MutexGuard<'_, LifecycleState<W>>) {
        self.changed.wait(guard);
    }

    /// Parks in [`LoopPhase::Waiting`] until the state moves past `revision`.
    pub(crate) fn wait_for_change(&self, revision: u64) {
        let mut state = self.state.lock();
        while state.revision == revision && !state.done {
            state.enter(LoopPhase::Waiting);
            self.changed.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn ready() -> Lifecycle<u32> {
        let lifecycle = Lifecycle::new();
        lifecycle.set_focus(true);
        lifecycle.surface_available(7);
        lifecycle
    }

    #[test]
    fn waits_until_focused_with_a_surface() {
        let lifecycle: Lifecycle<u32> = Lifecycle::new();
        assert!(lifecycle.read(|s| s.need_to_wait()));

        lifecycle.set_focus(true);
        assert!(lifecycle.read(|s| s.need_to_wait()));

        lifecycle.surface_available(1);
        assert!(!lifecycle.read(|s| s.need_to_wait()));
    }

    #[test]
    fn pause_and_context_loss_force_waiting() {
        let lifecycle = ready();

        lifecycle.set_paused(true);
        assert!(lifecycle.read(|s| s.need_to_wait()));
        lifecycle.set_paused(false);
        assert!(!lifecycle.read(|s| s.need_to_wait()));

        lifecycle.mark_context_lost();
        assert!(lifecycle.read(|s| s.need_to_wait()));
        lifecycle.clear_context_lost();
        assert!(!lifecycle.read(|s| s.need_to_wait()));
    }

    #[test]
    fn done_overrides_every_wait_reason() {
        let lifecycle: Lifecycle<u32> = Lifecycle::new();
        lifecycle.set_paused(true);
        lifecycle.mark_context_lost();
        lifecycle.request_exit();
        assert!(!lifecycle.read(|s| s.need_to_wait()));
    }

    #[test]
    fn repeating_the_current_size_does_not_mark_a_change() {
        let lifecycle = ready();
        lifecycle.set_size(100, 200);
        assert!(lifecycle.lock().take_frame().size_changed);

        lifecycle.set_size(100, 200);
        let frame = lifecycle.lock().take_frame();
        assert!(!frame.size_changed);
        assert_eq!(frame.size, PhysicalSize::new(100, 200));
    }

    #[test]
    fn take_frame_clears_size_changed_once() {
        let lifecycle = ready();
        lifecycle.set_size(4, 4);
        let mut state = lifecycle.lock();
        assert!(state.take_frame().size_changed);
        assert!(!state.take_frame().size_changed);
    }

    #[test]
    fn new_surface_clears_context_loss_and_bumps_generation() {
        let lifecycle = ready();
        let before = lifecycle.lock().take_frame().surface_generation;

        lifecycle.mark_context_lost();
        lifecycle.surface_available(8);

        let state = lifecycle.lock();
        assert!(!state.context_lost);
        assert_eq!(state.window, Some(8));
        assert_eq!(state.surface_generation, before + 1);
    }

    #[test]
    fn presence_without_a_window_is_ignored() {
        let lifecycle: Lifecycle<u32> = Lifecycle::new();
        lifecycle.set_surface_present(true);
        assert!(!lifecycle.read(|s| s.has_surface));

        lifecycle.surface_available(3);
        lifecycle.set_surface_present(false);
        assert!(!lifecycle.read(|s| s.has_surface));
        lifecycle.set_surface_present(true);
        assert!(lifecycle.read(|s| s.has_surface));
    }

    #[test]
    fn wait_for_change_parks_until_a_setter_runs() {
        let lifecycle = Arc::new(ready());
        let revision = lifecycle.read(|s| s.revision());

        let resizer = {
            let lifecycle = Arc::clone(&lifecycle);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                lifecycle.set_size(8, 8);
            })
        };

        let start = Instant::now();
        lifecycle.wait_for_change(revision);
        assert!(start.elapsed() >= Duration::from_millis(25));
        assert!(lifecycle.read(|s| s.revision()) > revision);
        assert_eq!(lifecycle.phase(), LoopPhase::Waiting);
        resizer.join().expect("resizer thread");
    }

    #[test]
    fn wait_for_change_returns_at_once_when_already_changed() {
        let lifecycle = ready();
        let revision = lifecycle.read(|s| s.revision());
        lifecycle.set_focus(false);
        lifecycle.wait_for_change(revision);
        assert_eq!(lifecycle.phase(), LoopPhase::Idle);
    }
}
