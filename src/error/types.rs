use thiserror::Error;

/// Unified result type for the carousel engine.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced while constructing or configuring the engine.
///
/// Runtime operations degrade silently instead of returning these; see
/// [`crate::CarouselRuntime`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("carousel needs at least one slide")]
    EmptySlideSet,
    #[error("invalid engine config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
