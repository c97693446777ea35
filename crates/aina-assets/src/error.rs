use std::path::PathBuf;

use crate::accessor::AccessorError;

/// Errors that can occur during asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported model format '{0}' (expected .gltf or .glb)")]
    UnsupportedFormat(PathBuf),

    #[error("failed to load glTF file '{0}': {1}")]
    GltfLoadFailed(PathBuf, String),

    #[error("binary-packaged asset '{0}' has no embedded binary chunk")]
    MissingBinaryChunk(PathBuf),

    #[error("external buffer not found: {0}")]
    MissingExternalBuffer(PathBuf),

    #[error("failed to load image '{0}': {1}")]
    ImageLoadFailed(String, String),

    #[error("primitive has no {0} attribute")]
    MissingAttribute(&'static str),

    #[error("failed to decode accessor {index}: {source}")]
    Accessor {
        index: usize,
        #[source]
        source: AccessorError,
    },

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
}
