/// Errors raised by GPU backends and the resource manager.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("GPU allocation failed: {0}")]
    Allocation(String),

    #[error("unknown GPU handle: {0}")]
    UnknownHandle(String),

    #[error("frame error: {0}")]
    Frame(String),

    #[error("unsupported by this backend: {0}")]
    Unsupported(String),

    #[error("Vulkan error: {0}")]
    Vulkan(String),
}

impl RenderError {
    /// Wrap any displayable Vulkan-side error.
    pub fn vulkan(context: &str, err: impl std::fmt::Display) -> Self {
        RenderError::Vulkan(format!("{}: {}", context, err))
    }
}
