//! Journaling provider and renderer used by the lifecycle tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use parking_lot::Mutex;
use winit::dpi::PhysicalSize;

use super::{ConfigRequest, ContextProvider, FrameCtx, PresentResult, Renderer};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// One provider call or renderer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ChooseConfig,
    CreateContext { context: u64 },
    CreateSurface { context: u64, surface: u64, width: u32, height: u32 },
    MakeCurrent { context: u64, surface: u64 },
    Present { surface: u64 },
    DestroySurface { surface: u64 },
    DestroyContext { context: u64 },
    Terminate,
    SurfaceCreated { context: u64 },
    SizeChanged { surface: u64, width: u32, height: u32 },
    DrawFrame { context: u64, surface: u64 },
    Command(&'static str),
}

/// Shared, ordered record of calls.
#[derive(Clone, Default)]
pub(crate) struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Journal {
    pub fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Polls until `pred` holds for the journal or five seconds pass.
    pub fn wait_until(&self, pred: impl Fn(&[Call]) -> bool) -> bool {
        wait_until(|| pred(&self.calls.lock()))
    }

    pub fn draws(&self) -> usize {
        self.count(|c| matches!(c, Call::DrawFrame { .. }))
    }
}

/// Polls `cond` every couple of milliseconds for up to five seconds.
pub(crate) fn wait_until(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

/// Knobs and counters shared by every provider built from the same value.
#[derive(Default)]
pub(crate) struct Knobs {
    pub lose_next_present: AtomicBool,
    pub fail_make_current: AtomicBool,
    pub live_contexts: AtomicUsize,
    pub max_live_contexts: AtomicUsize,
}

#[derive(Debug)]
pub(crate) struct MockContext {
    pub id: u64,
}

#[derive(Debug)]
pub(crate) struct MockSurface {
    pub id: u64,
}

pub(crate) struct RecordingProvider {
    journal: Journal,
    knobs: Arc<Knobs>,
    offers: Vec<ConfigRequest>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            journal: Journal::default(),
            knobs: Arc::new(Knobs::default()),
            offers: vec![ConfigRequest {
                alpha_bits: 8,
                depth_bits: 24,
                stencil_bits: 8,
                ..ConfigRequest::default()
            }],
        }
    }

    /// Provider sharing `journal` and `knobs` with others.
    pub fn sharing(journal: Journal, knobs: Arc<Knobs>) -> Self {
        Self {
            journal,
            knobs,
            ..Self::new()
        }
    }

    pub fn with_offers(mut self, offers: Vec<ConfigRequest>) -> Self {
        self.offers = offers;
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn knobs(&self) -> Arc<Knobs> {
        Arc::clone(&self.knobs)
    }
}

impl ContextProvider for RecordingProvider {
    type Window = ();
    type Config = ConfigRequest;
    type Context = MockContext;
    type Surface = MockSurface;

    fn choose_config(&mut self, request: &ConfigRequest) -> Result<Option<ConfigRequest>> {
        self.journal.push(Call::ChooseConfig);
        Ok(self.offers.iter().copied().find(|o| request.is_satisfied_by(o)))
    }

    fn create_context(&mut self, _config: &ConfigRequest) -> Result<MockContext> {
        let live = self.knobs.live_contexts.fetch_add(1, Ordering::SeqCst) + 1;
        self.knobs.max_live_contexts.fetch_max(live, Ordering::SeqCst);

        let context = MockContext { id: next_id() };
        self.journal.push(Call::CreateContext { context: context.id });
        Ok(context)
    }

    fn create_surface(
        &mut self,
        context: &MockContext,
        _window: &(),
        size: PhysicalSize<u32>,
    ) -> Result<MockSurface> {
        if size.width > 16_384 {
            bail!("surface too large");
        }
        let surface = MockSurface { id: next_id() };
        self.journal.push(Call::CreateSurface {
            context: context.id,
            surface: surface.id,
            width: size.width,
            height: size.height,
        });
        Ok(surface)
    }

    fn make_current(&mut self, context: &MockContext, surface: &MockSurface) -> bool {
        self.journal.push(Call::MakeCurrent {
            context: context.id,
            surface: surface.id,
        });
        !self.knobs.fail_make_current.swap(false, Ordering::SeqCst)
    }

    fn present(&mut self, surface: &mut MockSurface) -> PresentResult {
        self.journal.push(Call::Present { surface: surface.id });
        if self.knobs.lose_next_present.swap(false, Ordering::SeqCst) {
            PresentResult::ContextLost
        } else {
            PresentResult::Ok
        }
    }

    fn destroy_surface(&mut self, _context: &MockContext, surface: MockSurface) {
        self.journal.push(Call::DestroySurface { surface: surface.id });
    }

    fn destroy_context(&mut self, context: MockContext) {
        self.knobs.live_contexts.fetch_sub(1, Ordering::SeqCst);
        self.journal.push(Call::DestroyContext { context: context.id });
    }

    fn terminate(&mut self) {
        self.journal.push(Call::Terminate);
    }
}

/// Renderer appending its callbacks to a journal.
pub(crate) struct RecordingRenderer {
    journal: Journal,
    request: ConfigRequest,
    /// Draw calls slow down by this much to keep journals small.
    frame_delay: Duration,
}

impl RecordingRenderer {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            request: ConfigRequest::default(),
            frame_delay: Duration::from_millis(1),
        }
    }

    pub fn requesting(mut self, request: ConfigRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_frame_delay(mut self, frame_delay: Duration) -> Self {
        self.frame_delay = frame_delay;
        self
    }
}

impl Renderer<RecordingProvider> for RecordingRenderer {
    fn config_spec(&self) -> ConfigRequest {
        self.request
    }

    fn on_surface_created(&mut self, ctx: &mut FrameCtx<'_, RecordingProvider>) {
        self.journal.push(Call::SurfaceCreated {
            context: ctx.context.id,
        });
    }

    fn on_size_changed(
        &mut self,
        ctx: &mut FrameCtx<'_, RecordingProvider>,
        width: u32,
        height: u32,
    ) {
        self.journal.push(Call::SizeChanged {
            surface: ctx.surface.id,
            width,
            height,
        });
    }

    fn on_draw_frame(&mut self, ctx: &mut FrameCtx<'_, RecordingProvider>) {
        self.journal.push(Call::DrawFrame {
            context: ctx.context.id,
            surface: ctx.surface.id,
        });
        thread::sleep(self.frame_delay);
    }
}
