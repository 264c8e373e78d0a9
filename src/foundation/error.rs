/// Convenience result type used across reelforge.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Every stage fails fast with one of these; nothing is retried.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// A required input file or path does not exist or is unreadable.
    #[error("input missing: {0}")]
    InputMissing(String),

    /// Degenerate input, such as a zero-duration narration.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// The caption font could not be loaded.
    #[error("font unavailable: {0}")]
    FontUnavailable(String),

    /// A decode, render or encode step failed.
    #[error("render error: {0}")]
    Render(String),

    /// The final container mux failed.
    #[error("mux error: {0}")]
    Mux(String),

    /// Invalid configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::InputMissing`] value.
    pub fn input_missing(msg: impl Into<String>) -> Self {
        Self::InputMissing(msg.into())
    }

    /// Build a [`ReelError::EmptyInput`] value.
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// Build a [`ReelError::FontUnavailable`] value.
    pub fn font_unavailable(msg: impl Into<String>) -> Self {
        Self::FontUnavailable(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Mux`] value.
    pub fn mux(msg: impl Into<String>) -> Self {
        Self::Mux(msg.into())
    }

    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
