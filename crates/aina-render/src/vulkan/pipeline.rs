//! Render pass, framebuffers, and one graphics pipeline per fill mode

use std::sync::Arc;

use aina_core::RenderMode;
use vulkano::device::Device;
use vulkano::format::Format;
use vulkano::image::view::ImageView;
use vulkano::image::{Image, ImageCreateInfo, ImageType, ImageUsage};
use vulkano::memory::allocator::{AllocationCreateInfo, StandardMemoryAllocator};
use vulkano::pipeline::graphics::color_blend::{
    AttachmentBlend, ColorBlendAttachmentState, ColorBlendState,
};
use vulkano::pipeline::graphics::depth_stencil::{DepthState, DepthStencilState};
use vulkano::pipeline::graphics::input_assembly::{InputAssemblyState, PrimitiveTopology};
use vulkano::pipeline::graphics::multisample::MultisampleState;
use vulkano::pipeline::graphics::rasterization::{
    CullMode, FrontFace, PolygonMode, RasterizationState,
};
use vulkano::pipeline::graphics::vertex_input::VertexDefinition;
use vulkano::pipeline::graphics::viewport::ViewportState;
use vulkano::pipeline::graphics::GraphicsPipelineCreateInfo;
use vulkano::pipeline::layout::PipelineDescriptorSetLayoutCreateInfo;
use vulkano::pipeline::{DynamicState, GraphicsPipeline, PipelineLayout, PipelineShaderStageCreateInfo};
use vulkano::render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass, Subpass};

use super::shaders::{fs, vs};
use crate::error::RenderError;
use crate::vertex;

pub const DEPTH_FORMAT: Format = Format::D16_UNORM;

pub fn create_render_pass(
    device: Arc<Device>,
    color_format: Format,
) -> Result<Arc<RenderPass>, RenderError> {
    vulkano::single_pass_renderpass!(
        device,
        attachments: {
            color: {
                format: color_format,
                samples: 1,
                load_op: Clear,
                store_op: Store,
            },
            depth_stencil: {
                format: DEPTH_FORMAT,
                samples: 1,
                load_op: Clear,
                store_op: DontCare,
            },
        },
        pass: {
            color: [color],
            depth_stencil: {depth_stencil},
        },
    )
    .map_err(|e| RenderError::vulkan("create render pass", e))
}

/// Framebuffers for every swapchain image, sharing one depth buffer.
pub fn create_framebuffers(
    images: &[Arc<Image>],
    render_pass: &Arc<RenderPass>,
    memory_allocator: &Arc<StandardMemoryAllocator>,
) -> Result<Vec<Arc<Framebuffer>>, RenderError> {
    let Some(first) = images.first() else {
        return Ok(Vec::new());
    };

    let depth_image = Image::new(
        memory_allocator.clone(),
        ImageCreateInfo {
            image_type: ImageType::Dim2d,
            format: DEPTH_FORMAT,
            extent: first.extent(),
            usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT | ImageUsage::TRANSIENT_ATTACHMENT,
            ..Default::default()
        },
        AllocationCreateInfo::default(),
    )
    .map_err(|e| RenderError::vulkan("create depth buffer", e))?;
    let depth_view = ImageView::new_default(depth_image)
        .map_err(|e| RenderError::vulkan("create depth view", e))?;

    images
        .iter()
        .map(|image| {
            let view = ImageView::new_default(image.clone())
                .map_err(|e| RenderError::vulkan("create swapchain view", e))?;
            Framebuffer::new(
                render_pass.clone(),
                FramebufferCreateInfo {
                    attachments: vec![view, depth_view.clone()],
                    ..Default::default()
                },
            )
            .map_err(|e| RenderError::vulkan("create framebuffer", e))
        })
        .collect()
}

/// Shared pipeline layout derived from the shaders
pub fn create_layout(device: Arc<Device>) -> Result<Arc<PipelineLayout>, RenderError> {
    let stages = shader_stages(device.clone())?;
    let create_info = PipelineDescriptorSetLayoutCreateInfo::from_stages(&stages)
        .into_pipeline_layout_create_info(device.clone())
        .map_err(|e| RenderError::vulkan("derive pipeline layout", e))?;
    PipelineLayout::new(device, create_info)
        .map_err(|e| RenderError::vulkan("create pipeline layout", e))
}

fn shader_stages(device: Arc<Device>) -> Result<[PipelineShaderStageCreateInfo; 2], RenderError> {
    let vs = vs::load(device.clone())
        .map_err(|e| RenderError::vulkan("load vertex shader", e))?
        .entry_point("main")
        .ok_or_else(|| RenderError::Vulkan("vertex shader has no main".into()))?;
    let fs = fs::load(device)
        .map_err(|e| RenderError::vulkan("load fragment shader", e))?
        .entry_point("main")
        .ok_or_else(|| RenderError::Vulkan("fragment shader has no main".into()))?;
    Ok([
        PipelineShaderStageCreateInfo::new(vs),
        PipelineShaderStageCreateInfo::new(fs),
    ])
}

/// Pipeline for one render mode: back-face culling, depth test, alpha blend.
pub fn create_pipeline(
    device: Arc<Device>,
    render_pass: &Arc<RenderPass>,
    layout: Arc<PipelineLayout>,
    mode: RenderMode,
) -> Result<Arc<GraphicsPipeline>, RenderError> {
    let stages = shader_stages(device.clone())?;
    let vertex_input_state = vertex::all_streams()
        .definition(&stages[0].entry_point)
        .map_err(|e| RenderError::vulkan("vertex input", e))?;
    let subpass = Subpass::from(render_pass.clone(), 0)
        .ok_or_else(|| RenderError::Vulkan("render pass has no subpass 0".into()))?;

    let polygon_mode = match mode {
        RenderMode::Solid => PolygonMode::Fill,
        RenderMode::Wireframe => PolygonMode::Line,
        RenderMode::Points => PolygonMode::Point,
    };

    GraphicsPipeline::new(
        device,
        None,
        GraphicsPipelineCreateInfo {
            stages: stages.into_iter().collect(),
            vertex_input_state: Some(vertex_input_state),
            input_assembly_state: Some(InputAssemblyState {
                topology: PrimitiveTopology::TriangleList,
                ..Default::default()
            }),
            viewport_state: Some(ViewportState::default()),
            rasterization_state: Some(RasterizationState {
                polygon_mode,
                cull_mode: CullMode::Back,
                front_face: FrontFace::CounterClockwise,
                ..Default::default()
            }),
            depth_stencil_state: Some(DepthStencilState {
                depth: Some(DepthState::simple()),
                ..Default::default()
            }),
            multisample_state: Some(MultisampleState::default()),
            color_blend_state: Some(ColorBlendState::with_attachment_states(
                subpass.num_color_attachments(),
                ColorBlendAttachmentState {
                    blend: Some(AttachmentBlend::alpha()),
                    ..Default::default()
                },
            )),
            dynamic_state: [DynamicState::Viewport].into_iter().collect(),
            subpass: Some(subpass.into()),
            ..GraphicsPipelineCreateInfo::layout(layout)
        },
    )
    .map_err(|e| RenderError::vulkan("create graphics pipeline", e))
}
