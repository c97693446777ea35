//! On-screen backend built on vulkano
//!
//! Each vertex stream is its own host-visible buffer. Streams a part lacks
//! are bound to a shared zero buffer and untextured parts sample a 1x1 white
//! texture, so a single pipeline layout serves every draw.

mod context;
mod pipeline;
mod shaders;

use std::collections::HashMap;
use std::sync::Arc;

use aina_assets::TextureAsset;
use aina_core::RenderMode;
use tracing::{debug, info, warn};
use vulkano::buffer::{Buffer, BufferContents, BufferCreateInfo, BufferUsage, Subbuffer};
use vulkano::command_buffer::allocator::StandardCommandBufferAllocator;
use vulkano::command_buffer::{
    AutoCommandBufferBuilder, BlitImageInfo, CommandBufferUsage, CopyBufferToImageInfo,
    ImageBlit, PrimaryAutoCommandBuffer, PrimaryCommandBufferAbstract, RenderPassBeginInfo,
    SubpassBeginInfo, SubpassContents, SubpassEndInfo,
};
use vulkano::descriptor_set::allocator::StandardDescriptorSetAllocator;
use vulkano::descriptor_set::{DescriptorSet, WriteDescriptorSet};
use vulkano::format::{Format, FormatFeatures};
use vulkano::image::sampler::{
    Filter, Sampler, SamplerAddressMode, SamplerCreateInfo, SamplerMipmapMode, LOD_CLAMP_NONE,
};
use vulkano::image::view::ImageView;
use vulkano::image::{
    Image, ImageAspects, ImageCreateInfo, ImageLayout, ImageSubresourceLayers, ImageType,
    ImageUsage,
};
use vulkano::memory::allocator::{AllocationCreateInfo, MemoryTypeFilter, StandardMemoryAllocator};
use vulkano::pipeline::graphics::viewport::Viewport;
use vulkano::pipeline::{GraphicsPipeline, PipelineBindPoint, PipelineLayout};
use vulkano::render_pass::{Framebuffer, RenderPass};
use vulkano::device::{Device, Queue};
use vulkano::swapchain::{
    self, CompositeAlpha, PresentMode, Swapchain, SwapchainCreateInfo, SwapchainPresentInfo,
};
use vulkano::sync::{self, GpuFuture};
use vulkano::{Validated, VulkanError};
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::backend::{
    BufferHandle, BufferKind, DrawCall, FrameParams, FrameStatus, GpuBackend, SamplerSettings,
    TextureHandle,
};
use crate::error::RenderError;
use crate::scene::PartPushConstants;
use crate::vertex;

pub use context::VulkanContext;

const TEXTURE_FORMAT: Format = Format::R8G8B8A8_SRGB;

enum GpuBuffer {
    Vertex(Subbuffer<[f32]>),
    Index(Subbuffer<[u32]>),
}

struct FrameInFlight {
    builder: AutoCommandBufferBuilder<PrimaryAutoCommandBuffer>,
    image_index: u32,
    acquire_future: swapchain::SwapchainAcquireFuture,
    push_constants: PartPushConstants,
}

/// Everything needed to create buffers and textures outside a frame.
struct Uploader {
    device: Arc<Device>,
    queue: Arc<Queue>,
    memory_allocator: Arc<StandardMemoryAllocator>,
    command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
    descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,
    layout: Arc<PipelineLayout>,
}

pub struct VulkanBackend {
    window: Arc<Window>,
    context: VulkanContext,
    uploader: Uploader,
    swapchain: Arc<Swapchain>,
    render_pass: Arc<RenderPass>,
    framebuffers: Vec<Arc<Framebuffer>>,
    pipelines: HashMap<RenderMode, Arc<GraphicsPipeline>>,
    viewport: Viewport,
    next_handle: u64,
    buffers: HashMap<BufferHandle, GpuBuffer>,
    textures: HashMap<TextureHandle, Arc<DescriptorSet>>,
    white_texture: Arc<DescriptorSet>,
    zero_stream: Subbuffer<[f32]>,
    recreate_swapchain: bool,
    previous_frame_end: Option<Box<dyn GpuFuture>>,
    frame: Option<FrameInFlight>,
}

impl VulkanBackend {
    /// Create the device, swapchain, and pipelines for `window`.
    pub fn new(event_loop: &ActiveEventLoop, window: Arc<Window>) -> Result<Self, RenderError> {
        let context = VulkanContext::new(event_loop, window.clone())?;
        let device = context.device.clone();

        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));
        let command_buffer_allocator = Arc::new(StandardCommandBufferAllocator::new(
            device.clone(),
            Default::default(),
        ));
        let descriptor_set_allocator = Arc::new(StandardDescriptorSetAllocator::new(
            device.clone(),
            Default::default(),
        ));

        let (swapchain, images) = create_swapchain(&context, &window)?;
        let render_pass = pipeline::create_render_pass(device.clone(), swapchain.image_format())?;
        let framebuffers =
            pipeline::create_framebuffers(&images, &render_pass, &memory_allocator)?;
        let layout = pipeline::create_layout(device.clone())?;

        let mut pipelines = HashMap::new();
        for mode in [RenderMode::Solid, RenderMode::Wireframe, RenderMode::Points] {
            if mode != RenderMode::Solid && !context.non_solid_fill {
                continue;
            }
            let created =
                pipeline::create_pipeline(device.clone(), &render_pass, layout.clone(), mode)?;
            pipelines.insert(mode, created);
        }

        let extent = swapchain.image_extent();
        let viewport = Viewport {
            offset: [0.0, 0.0],
            extent: [extent[0] as f32, extent[1] as f32],
            depth_range: 0.0..=1.0,
        };

        let uploader = Uploader {
            device: device.clone(),
            queue: context.queue.clone(),
            memory_allocator,
            command_buffer_allocator,
            descriptor_set_allocator,
            layout,
        };
        let zero_stream = uploader.buffer(BufferUsage::VERTEX_BUFFER, vec![0.0f32; 3])?;
        let white_texture = uploader.texture(
            &TextureAsset {
                image_index: usize::MAX,
                width: 1,
                height: 1,
                data: vec![255; 4],
            },
            SamplerSettings::LINEAR,
        )?;

        info!(
            "Vulkan backend ready: {}x{} swapchain, {:?}",
            extent[0],
            extent[1],
            swapchain.image_format()
        );

        Ok(Self {
            window,
            context,
            uploader,
            swapchain,
            render_pass,
            framebuffers,
            pipelines,
            viewport,
            next_handle: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            white_texture,
            zero_stream,
            recreate_swapchain: false,
            previous_frame_end: Some(sync::now(device).boxed()),
            frame: None,
        })
    }

    /// Mark the swapchain for recreation after a resize.
    pub fn resize(&mut self) {
        self.recreate_swapchain = true;
    }

    fn next_raw(&mut self) -> u64 {
        let raw = self.next_handle;
        self.next_handle += 1;
        raw
    }

    fn recreate(&mut self) -> Result<bool, RenderError> {
        let extent: [u32; 2] = self.window.inner_size().into();
        if extent.contains(&0) {
            return Ok(false);
        }

        let (swapchain, images) = self
            .swapchain
            .recreate(SwapchainCreateInfo {
                image_extent: extent,
                ..self.swapchain.create_info()
            })
            .map_err(|e| RenderError::vulkan("recreate swapchain", e))?;
        self.swapchain = swapchain;
        self.framebuffers =
            pipeline::create_framebuffers(&images, &self.render_pass, &self.uploader.memory_allocator)?;
        self.viewport.extent = [extent[0] as f32, extent[1] as f32];
        self.recreate_swapchain = false;
        debug!("Swapchain recreated at {}x{}", extent[0], extent[1]);
        Ok(true)
    }

    /// Zero stream with room for at least `floats` values.
    fn zero_stream_for(&mut self, floats: usize) -> Result<Subbuffer<[f32]>, RenderError> {
        if (self.zero_stream.len() as usize) < floats {
            self.zero_stream = self
                .uploader
                .buffer(BufferUsage::VERTEX_BUFFER, vec![0.0f32; floats])?;
        }
        Ok(self.zero_stream.clone())
    }

    fn vertex_buffer(&self, handle: BufferHandle) -> Result<Subbuffer<[f32]>, RenderError> {
        match self.buffers.get(&handle) {
            Some(GpuBuffer::Vertex(buffer)) => Ok(buffer.clone()),
            _ => Err(RenderError::UnknownHandle(format!("vertex buffer {:?}", handle))),
        }
    }

    fn index_buffer(&self, handle: BufferHandle) -> Result<Subbuffer<[u32]>, RenderError> {
        match self.buffers.get(&handle) {
            Some(GpuBuffer::Index(buffer)) => Ok(buffer.clone()),
            _ => Err(RenderError::UnknownHandle(format!("index buffer {:?}", handle))),
        }
    }
}

impl Uploader {
    /// Host-visible buffer filled with `data`.
    fn buffer<T>(&self, usage: BufferUsage, data: Vec<T>) -> Result<Subbuffer<[T]>, RenderError>
    where
        T: BufferContents,
    {
        Buffer::from_iter(
            self.memory_allocator.clone(),
            BufferCreateInfo {
                usage,
                ..Default::default()
            },
            AllocationCreateInfo {
                memory_type_filter: MemoryTypeFilter::PREFER_DEVICE
                    | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                ..Default::default()
            },
            data,
        )
        .map_err(|e| RenderError::Allocation(e.to_string()))
    }

    /// Upload pixels, build mipmaps if asked, and wrap the image in a
    /// descriptor set for the part pipeline.
    fn texture(
        &self,
        texture: &TextureAsset,
        sampler: SamplerSettings,
    ) -> Result<Arc<DescriptorSet>, RenderError> {
        let mip_levels = if sampler.wants_mipmaps() {
            if !self.can_blit_mipmaps() {
                return Err(RenderError::Unsupported(
                    "linear blits for mipmap generation".into(),
                ));
            }
            u32::BITS - texture.width.max(texture.height).max(1).leading_zeros()
        } else {
            1
        };

        let staging = self.buffer(BufferUsage::TRANSFER_SRC, texture.data.clone())?;
        let image = Image::new(
            self.memory_allocator.clone(),
            ImageCreateInfo {
                image_type: ImageType::Dim2d,
                format: TEXTURE_FORMAT,
                extent: [texture.width, texture.height, 1],
                mip_levels,
                usage: ImageUsage::TRANSFER_DST | ImageUsage::TRANSFER_SRC | ImageUsage::SAMPLED,
                ..Default::default()
            },
            AllocationCreateInfo::default(),
        )
        .map_err(|e| RenderError::Allocation(format!("texture image: {}", e)))?;

        let mut builder = AutoCommandBufferBuilder::primary(
            self.command_buffer_allocator.clone(),
            self.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .map_err(|e| RenderError::vulkan("begin upload", e))?;
        builder
            .copy_buffer_to_image(CopyBufferToImageInfo::buffer_image(staging, image.clone()))
            .map_err(|e| RenderError::vulkan("copy texture", e))?;

        for level in 1..mip_levels {
            let src = mip_extent(texture.width, texture.height, level - 1);
            let dst = mip_extent(texture.width, texture.height, level);
            builder
                .blit_image(BlitImageInfo {
                    src_image_layout: ImageLayout::General,
                    dst_image_layout: ImageLayout::General,
                    regions: [ImageBlit {
                        src_subresource: color_layers(level - 1),
                        src_offsets: [[0, 0, 0], [src[0], src[1], 1]],
                        dst_subresource: color_layers(level),
                        dst_offsets: [[0, 0, 0], [dst[0], dst[1], 1]],
                        ..Default::default()
                    }]
                    .into(),
                    filter: Filter::Linear,
                    ..BlitImageInfo::images(image.clone(), image.clone())
                })
                .map_err(|e| RenderError::vulkan("blit mip level", e))?;
        }

        let commands = builder
            .build()
            .map_err(|e| RenderError::vulkan("build upload", e))?;
        commands
            .execute(self.queue.clone())
            .map_err(|e| RenderError::vulkan("submit upload", e))?
            .then_signal_fence_and_flush()
            .map_err(|e| RenderError::vulkan("flush upload", e))?
            .wait(None)
            .map_err(|e| RenderError::vulkan("wait for upload", e))?;

        let view =
            ImageView::new_default(image).map_err(|e| RenderError::vulkan("texture view", e))?;
        let vk_sampler = Sampler::new(
            self.device.clone(),
            SamplerCreateInfo {
                mag_filter: Filter::Linear,
                min_filter: Filter::Linear,
                mipmap_mode: SamplerMipmapMode::Linear,
                address_mode: if sampler.repeat {
                    [SamplerAddressMode::Repeat; 3]
                } else {
                    [SamplerAddressMode::ClampToEdge; 3]
                },
                lod: if mip_levels > 1 { 0.0..=LOD_CLAMP_NONE } else { 0.0..=0.0 },
                ..Default::default()
            },
        )
        .map_err(|e| RenderError::vulkan("create sampler", e))?;

        let set_layout = self
            .layout
            .set_layouts()
            .first()
            .ok_or_else(|| RenderError::Vulkan("pipeline layout has no descriptor set".into()))?
            .clone();
        DescriptorSet::new(
            self.descriptor_set_allocator.clone(),
            set_layout,
            [WriteDescriptorSet::image_view_sampler(0, view, vk_sampler)],
            [],
        )
        .map_err(|e| RenderError::vulkan("create texture descriptor set", e))
    }

    fn can_blit_mipmaps(&self) -> bool {
        self.device
            .physical_device()
            .format_properties(TEXTURE_FORMAT)
            .map(|props| {
                props.optimal_tiling_features.contains(
                    FormatFeatures::BLIT_SRC
                        | FormatFeatures::BLIT_DST
                        | FormatFeatures::SAMPLED_IMAGE_FILTER_LINEAR,
                )
            })
            .unwrap_or(false)
    }
}

impl GpuBackend for VulkanBackend {
    fn create_vertex_buffer(
        &mut self,
        kind: BufferKind,
        data: &[f32],
    ) -> Result<BufferHandle, RenderError> {
        if data.is_empty() {
            return Err(RenderError::Allocation(format!("empty {:?} stream", kind)));
        }
        let buffer = self.uploader.buffer(BufferUsage::VERTEX_BUFFER, data.to_vec())?;
        let handle = BufferHandle::from_raw(self.next_raw());
        self.buffers.insert(handle, GpuBuffer::Vertex(buffer));
        Ok(handle)
    }

    fn update_vertex_buffer(
        &mut self,
        handle: BufferHandle,
        data: &[f32],
    ) -> Result<(), RenderError> {
        let buffer = self.vertex_buffer(handle)?;
        let mut contents = buffer
            .write()
            .map_err(|e| RenderError::vulkan("map vertex buffer", e))?;
        if contents.len() != data.len() {
            return Err(RenderError::Allocation(format!(
                "update of {} floats into a buffer of {}",
                data.len(),
                contents.len()
            )));
        }
        contents.copy_from_slice(data);
        Ok(())
    }

    fn create_index_buffer(&mut self, data: &[u32]) -> Result<BufferHandle, RenderError> {
        if data.is_empty() {
            return Err(RenderError::Allocation("empty index stream".into()));
        }
        let buffer = self.uploader.buffer(BufferUsage::INDEX_BUFFER, data.to_vec())?;
        let handle = BufferHandle::from_raw(self.next_raw());
        self.buffers.insert(handle, GpuBuffer::Index(buffer));
        Ok(handle)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        // In-flight command buffers hold their own references.
        self.buffers.remove(&handle);
    }

    fn create_texture(
        &mut self,
        texture: &TextureAsset,
        sampler: SamplerSettings,
    ) -> Result<TextureHandle, RenderError> {
        let set = self.uploader.texture(texture, sampler)?;
        let handle = TextureHandle::from_raw(self.next_raw());
        self.textures.insert(handle, set);
        Ok(handle)
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    fn supports_render_mode(&self, mode: RenderMode) -> bool {
        self.pipelines.contains_key(&mode)
    }

    fn begin_frame(&mut self, frame: &FrameParams) -> Result<FrameStatus, RenderError> {
        if self.frame.is_some() {
            return Err(RenderError::Frame("frame already in progress".into()));
        }
        if let Some(previous) = self.previous_frame_end.as_mut() {
            previous.cleanup_finished();
        }

        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Ok(FrameStatus::Skipped);
        }
        if self.recreate_swapchain && !self.recreate()? {
            return Ok(FrameStatus::Skipped);
        }

        let (image_index, suboptimal, acquire_future) =
            match swapchain::acquire_next_image(self.swapchain.clone(), None)
                .map_err(Validated::unwrap)
            {
                Ok(acquired) => acquired,
                Err(VulkanError::OutOfDate) => {
                    self.recreate_swapchain = true;
                    return Ok(FrameStatus::Skipped);
                }
                Err(e) => return Err(RenderError::vulkan("acquire swapchain image", e)),
            };
        if suboptimal {
            self.recreate_swapchain = true;
        }

        let framebuffer = self
            .framebuffers
            .get(image_index as usize)
            .cloned()
            .ok_or_else(|| RenderError::Frame(format!("no framebuffer for image {}", image_index)))?;

        let mut builder = AutoCommandBufferBuilder::primary(
            self.uploader.command_buffer_allocator.clone(),
            self.context.queue.queue_family_index(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .map_err(|e| RenderError::vulkan("begin frame commands", e))?;

        builder
            .begin_render_pass(
                RenderPassBeginInfo {
                    clear_values: vec![
                        Some(frame.clear_color.to_array().into()),
                        Some(1f32.into()),
                    ],
                    ..RenderPassBeginInfo::framebuffer(framebuffer)
                },
                SubpassBeginInfo {
                    contents: SubpassContents::Inline,
                    ..Default::default()
                },
            )
            .map_err(|e| RenderError::vulkan("begin render pass", e))?
            .set_viewport(0, [self.viewport.clone()].into_iter().collect())
            .map_err(|e| RenderError::vulkan("set viewport", e))?;

        self.frame = Some(FrameInFlight {
            builder,
            image_index,
            acquire_future,
            push_constants: PartPushConstants::new(frame.model_view, frame.projection),
        });
        Ok(FrameStatus::Ready)
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        let pipeline = self
            .pipelines
            .get(&call.mode)
            .or_else(|| self.pipelines.get(&RenderMode::Solid))
            .cloned()
            .ok_or_else(|| RenderError::Unsupported("no pipeline available".into()))?;

        let positions = self.vertex_buffer(call.positions)?;
        let fallback = self.zero_stream_for(positions.len() as usize)?;
        let normals = match call.normals {
            Some(handle) => self.vertex_buffer(handle)?,
            None => fallback.clone(),
        };
        let (tex_coords, texture) = match (call.texture, call.tex_coords) {
            (Some(texture), Some(uvs)) => {
                let set = self
                    .textures
                    .get(&texture)
                    .cloned()
                    .ok_or_else(|| RenderError::UnknownHandle(format!("texture {:?}", texture)))?;
                (self.vertex_buffer(uvs)?, set)
            }
            _ => (fallback, self.white_texture.clone()),
        };
        let indices = call.indices.map(|handle| self.index_buffer(handle)).transpose()?;

        let layout = self.uploader.layout.clone();
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| RenderError::Frame("draw outside of a frame".into()))?;

        frame
            .builder
            .bind_pipeline_graphics(pipeline)
            .map_err(|e| RenderError::vulkan("bind pipeline", e))?
            .bind_descriptor_sets(PipelineBindPoint::Graphics, layout.clone(), 0, texture)
            .map_err(|e| RenderError::vulkan("bind texture", e))?
            .push_constants(layout, 0, frame.push_constants)
            .map_err(|e| RenderError::vulkan("push constants", e))?
            .bind_vertex_buffers(
                vertex::binding(BufferKind::Positions),
                [positions, normals, tex_coords],
            )
            .map_err(|e| RenderError::vulkan("bind vertex buffers", e))?;

        match indices {
            Some(indices) => {
                frame
                    .builder
                    .bind_index_buffer(indices)
                    .map_err(|e| RenderError::vulkan("bind index buffer", e))?;
                // SAFETY: GpuResources only uploads indices below the vertex count.
                unsafe { frame.builder.draw_indexed(call.element_count, 1, 0, 0, 0) }
                    .map_err(|e| RenderError::vulkan("draw indexed", e))?;
            }
            None => {
                // SAFETY: element_count never exceeds the bound vertex count.
                unsafe { frame.builder.draw(call.element_count, 1, 0, 0) }
                    .map_err(|e| RenderError::vulkan("draw", e))?;
            }
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let mut frame = self
            .frame
            .take()
            .ok_or_else(|| RenderError::Frame("end_frame without begin_frame".into()))?;

        frame
            .builder
            .end_render_pass(SubpassEndInfo::default())
            .map_err(|e| RenderError::vulkan("end render pass", e))?;
        let commands = frame
            .builder
            .build()
            .map_err(|e| RenderError::vulkan("build frame commands", e))?;

        let previous = self
            .previous_frame_end
            .take()
            .unwrap_or_else(|| sync::now(self.context.device.clone()).boxed());

        let future = previous
            .join(frame.acquire_future)
            .then_execute(self.context.queue.clone(), commands)
            .map_err(|e| RenderError::vulkan("execute frame", e))?
            .then_swapchain_present(
                self.context.queue.clone(),
                SwapchainPresentInfo::swapchain_image_index(self.swapchain.clone(), frame.image_index),
            )
            .then_signal_fence_and_flush();

        match future.map_err(Validated::unwrap) {
            Ok(future) => {
                self.previous_frame_end = Some(future.boxed());
                Ok(())
            }
            Err(VulkanError::OutOfDate) => {
                self.recreate_swapchain = true;
                self.previous_frame_end = Some(sync::now(self.context.device.clone()).boxed());
                Ok(())
            }
            Err(e) => {
                self.previous_frame_end = Some(sync::now(self.context.device.clone()).boxed());
                Err(RenderError::vulkan("present frame", e))
            }
        }
    }
}

fn create_swapchain(
    context: &VulkanContext,
    window: &Arc<Window>,
) -> Result<(Arc<Swapchain>, Vec<Arc<Image>>), RenderError> {
    let physical = context.device.physical_device();
    let capabilities = physical
        .surface_capabilities(&context.surface, Default::default())
        .map_err(|e| RenderError::vulkan("query surface capabilities", e))?;
    let formats = physical
        .surface_formats(&context.surface, Default::default())
        .map_err(|e| RenderError::vulkan("query surface formats", e))?;
    let image_format = formats
        .iter()
        .map(|(format, _)| *format)
        .find(|format| *format == Format::B8G8R8A8_SRGB || *format == Format::R8G8B8A8_SRGB)
        .or_else(|| formats.first().map(|(format, _)| *format))
        .ok_or_else(|| RenderError::Vulkan("surface reports no formats".into()))?;

    let supported: Vec<CompositeAlpha> = capabilities.supported_composite_alpha.into_iter().collect();
    let composite_alpha = [
        CompositeAlpha::PreMultiplied,
        CompositeAlpha::PostMultiplied,
        CompositeAlpha::Inherit,
        CompositeAlpha::Opaque,
    ]
    .into_iter()
    .find(|alpha| supported.contains(alpha))
    .ok_or_else(|| RenderError::Vulkan("no usable composite alpha mode".into()))?;
    if matches!(composite_alpha, CompositeAlpha::Inherit | CompositeAlpha::Opaque) {
        warn!(
            "Compositor does not support transparent windows ({:?}); background will be opaque",
            composite_alpha
        );
    }

    Swapchain::new(
        context.device.clone(),
        context.surface.clone(),
        SwapchainCreateInfo {
            min_image_count: capabilities.min_image_count.max(2),
            image_format,
            image_extent: window.inner_size().into(),
            image_usage: ImageUsage::COLOR_ATTACHMENT,
            composite_alpha,
            present_mode: PresentMode::Fifo,
            ..Default::default()
        },
    )
    .map_err(|e| RenderError::vulkan("create swapchain", e))
}

fn mip_extent(width: u32, height: u32, level: u32) -> [u32; 2] {
    [(width >> level).max(1), (height >> level).max(1)]
}

fn color_layers(mip_level: u32) -> ImageSubresourceLayers {
    ImageSubresourceLayers {
        aspects: ImageAspects::COLOR,
        mip_level,
        array_layers: 0..1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_extent() {
        assert_eq!(mip_extent(1024, 256, 0), [1024, 256]);
        assert_eq!(mip_extent(1024, 256, 3), [128, 32]);
        assert_eq!(mip_extent(1024, 256, 10), [1, 1]);
    }
}
