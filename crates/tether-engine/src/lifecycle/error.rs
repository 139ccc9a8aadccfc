use std::fmt;

/// Failure reported by the render loop or the owner façade.
///
/// Values are cloneable so the render thread can record its terminal failure
/// in the shared lifecycle state while also returning it from the join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// No configuration offered by the provider satisfies the renderer's request.
    ///
    /// Fatal at startup: the loop never reaches the active phase.
    ConfigUnavailable(String),

    /// The native context was invalidated by the platform.
    ///
    /// Recoverable: the loop parks until the flag is cleared, then recreates
    /// the context.
    ContextLost,

    /// The provider failed to create a context or surface.
    Provider(String),

    /// `set_renderer` was called while a render loop already exists.
    AlreadyStarted,

    /// The OS refused to spawn the render thread.
    Spawn(String),

    /// A renderer callback or provider call panicked on the render thread.
    RenderThreadPanicked,
}

impl LifecycleError {
    pub(crate) fn provider(err: &anyhow::Error) -> Self {
        Self::Provider(format!("{err:#}"))
    }

    /// Whether the loop can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ContextLost)
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigUnavailable(request) => {
                write!(f, "no rendering config matches the request ({request})")
            }
            Self::ContextLost => f.write_str("rendering context was lost"),
            Self::Provider(msg) => write!(f, "context provider failed: {msg}"),
            Self::AlreadyStarted => f.write_str("a renderer has already been set"),
            Self::Spawn(msg) => write!(f, "failed to spawn render thread: {msg}"),
            Self::RenderThreadPanicked => f.write_str("render thread panicked"),
        }
    }
}

impl std::error::Error for LifecycleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_context_loss_is_recoverable() {
        assert!(LifecycleError::ContextLost.is_recoverable());
        assert!(!LifecycleError::ConfigUnavailable("rgb888".into()).is_recoverable());
        assert!(!LifecycleError::RenderThreadPanicked.is_recoverable());
    }

    #[test]
    fn provider_error_keeps_context_chain() {
        let err = anyhow::anyhow!("device removed").context("failed to create wgpu device/queue");
        let lifecycle = LifecycleError::provider(&err);
        assert_eq!(
            lifecycle.to_string(),
            "context provider failed: failed to create wgpu device/queue: device removed"
        );
    }
}
