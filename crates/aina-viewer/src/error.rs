use aina_assets::AssetError;
use aina_render::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Failed to load model: {0}")]
    Asset(#[from] AssetError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Background loader failed: {0}")]
    Loader(String),
}
