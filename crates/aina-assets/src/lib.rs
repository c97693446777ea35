//! AINA Assets - glTF scene decoding
//!
//! Reads .gltf/.glb files into renderer-agnostic parts: decoded vertex
//! streams per mesh primitive, material bindings, and prepared textures.

pub mod accessor;
mod error;
mod gltf_loader;
mod mesh;
mod texture;
pub mod uri;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use accessor::{decode_accessor, AccessorError, AccessorLayout, ComponentType, ViewLayout};
pub use error::AssetError;
pub use gltf_loader::{is_supported_model, load_scene, SceneAsset};
pub use mesh::{MaterialInfo, PartData, PartGeometry};
pub use texture::{
    decode_texture, fit_within, load_texture, prepare_texture, TextureAsset, MAX_TEXTURE_SIZE,
};
