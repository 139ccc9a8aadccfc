use std::time::Instant;

use anyhow::Result;
use winit::dpi::PhysicalSize;

use super::{ConfigRequest, ContextProvider, PresentResult};

/// Provider decorator logging every call made by the render loop.
///
/// Creation and teardown are logged at debug, per-frame calls at trace.
pub struct LoggingProvider<P> {
    inner: P,
    label: &'static str,
    presented: u64,
}

impl<P> LoggingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_label(inner, "provider")
    }

    pub fn with_label(inner: P, label: &'static str) -> Self {
        Self {
            inner,
            label,
            presented: 0,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    /// Frames presented through this decorator.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl<P: ContextProvider> ContextProvider for LoggingProvider<P> {
    type Window = P::Window;
    type Config = P::Config;
    type Context = P::Context;
    type Surface = P::Surface;

    fn choose_config(&mut self, request: &ConfigRequest) -> Result<Option<Self::Config>> {
        let config = self.inner.choose_config(request)?;
        log::debug!(
            "{}: choose_config({request}) -> {}",
            self.label,
            if config.is_some() { "matched" } else { "none" }
        );
        Ok(config)
    }

    fn create_context(&mut self, config: &Self::Config) -> Result<Self::Context> {
        let start = Instant::now();
        let context = self.inner.create_context(config);
        log::debug!(
            "{}: create_context ok={} in {:?}",
            self.label,
            context.is_ok(),
            start.elapsed()
        );
        context
    }

    fn create_surface(
        &mut self,
        context: &Self::Context,
        window: &Self::Window,
        size: PhysicalSize<u32>,
    ) -> Result<Self::Surface> {
        let surface = self.inner.create_surface(context, window, size);
        log::debug!(
            "{}: create_surface {}x{} ok={}",
            self.label,
            size.width,
            size.height,
            surface.is_ok()
        );
        surface
    }

    fn make_current(&mut self, context: &Self::Context, surface: &Self::Surface) -> bool {
        let current = self.inner.make_current(context, surface);
        log::debug!("{}: make_current -> {current}", self.label);
        current
    }

    fn present(&mut self, surface: &mut Self::Surface) -> PresentResult {
        let result = self.inner.present(surface);
        self.presented += 1;
        log::trace!("{}: present #{} -> {result:?}", self.label, self.presented);
        result
    }

    fn destroy_surface(&mut self, context: &Self::Context, surface: Self::Surface) {
        log::debug!("{}: destroy_surface", self.label);
        self.inner.destroy_surface(context, surface);
    }

    fn destroy_context(&mut self, context: Self::Context) {
        log::debug!("{}: destroy_context", self.label);
        self.inner.destroy_context(context);
    }

    fn terminate(&mut self) {
        log::debug!("{}: terminate after {} frame(s)", self.label, self.presented);
        self.inner.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::recording::{Call, RecordingProvider};

    #[test]
    fn forwards_calls_to_inner_provider() {
        let recording = RecordingProvider::new();
        let journal = recording.journal();
        let mut provider = LoggingProvider::with_label(recording, "test");

        let config = provider
            .choose_config(&ConfigRequest::default())
            .expect("choose_config failed")
            .expect("default request should match");
        let context = provider.create_context(&config).expect("create_context failed");
        let mut surface = provider
            .create_surface(&context, &(), PhysicalSize::new(10, 10))
            .expect("create_surface failed");
        assert!(provider.make_current(&context, &surface));
        assert_eq!(provider.present(&mut surface), PresentResult::Ok);
        provider.destroy_surface(&context, surface);
        provider.destroy_context(context);
        provider.terminate();

        assert_eq!(provider.presented(), 1);
        let calls = journal.calls();
        assert!(matches!(calls.first(), Some(Call::ChooseConfig)));
        assert!(matches!(calls.last(), Some(Call::Terminate)));
        assert_eq!(calls.len(), 8);
    }
}
