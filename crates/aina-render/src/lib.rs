//! AINA Render - GPU resources and Vulkan rendering for loaded models
//!
//! Rendering goes through the [`GpuBackend`] trait. [`VulkanBackend`] draws
//! into a window via vulkano; [`HeadlessBackend`] records every call so the
//! resource lifecycle can be exercised without a GPU.

pub mod backend;
pub mod camera;
mod error;
pub mod frame;
pub mod headless;
pub mod normalize;
pub mod resources;
pub mod scene;
pub mod vertex;
pub mod vulkan;

pub use backend::{
    BufferHandle, BufferKind, DrawCall, FrameParams, FrameStatus, GpuBackend, MinFilter,
    SamplerSettings, TextureHandle,
};
pub use camera::{CameraConfig, OrbitCamera};
pub use error::RenderError;
pub use frame::{effective_mode, render_frame, FrameStats};
pub use headless::{AllocationKind, HeadlessBackend, RecordedFrame};
pub use normalize::{compute_normalization, normalize_scene, Normalization, TARGET_EXTENT};
pub use resources::{GpuResources, PartBuffers, PartRecord};
pub use scene::PartPushConstants;
pub use vulkan::VulkanBackend;
