//! Error type shared by every renderer operation.

/// Errors raised by the renderer. Capability errors surface at startup, before
/// any light store or cluster builder exists.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    AdapterUnavailable,

    #[error("device request failed: {0}")]
    DeviceRequest(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("device limits insufficient: {0}")]
    Limits(String),

    #[error("light count {requested} out of range (capacity {capacity})")]
    LightCountOutOfRange { requested: u32, capacity: u32 },

    #[error("no render target set for this frame")]
    NoTarget,

    #[error("readback error: {0}")]
    Readback(String),
}

impl RenderError {
    pub fn device<T: ToString>(msg: T) -> Self {
        RenderError::DeviceRequest(msg.to_string())
    }

    pub fn surface<T: ToString>(msg: T) -> Self {
        RenderError::Surface(msg.to_string())
    }

    pub fn readback<T: ToString>(msg: T) -> Self {
        RenderError::Readback(msg.to_string())
    }
}

/// Result alias for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;
