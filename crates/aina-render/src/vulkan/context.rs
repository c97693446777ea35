//! Instance, device, and queue selection

use std::sync::Arc;

use tracing::info;
use vulkano::device::physical::{PhysicalDevice, PhysicalDeviceType};
use vulkano::device::{
    Device, DeviceCreateInfo, DeviceExtensions, DeviceFeatures, Queue, QueueCreateInfo, QueueFlags,
};
use vulkano::instance::{Instance, InstanceCreateFlags, InstanceCreateInfo};
use vulkano::swapchain::Surface;
use vulkano::VulkanLibrary;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::error::RenderError;

/// Device-level objects shared by the whole backend.
pub struct VulkanContext {
    pub instance: Arc<Instance>,
    pub surface: Arc<Surface>,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    /// Whether wireframe and point fill modes were enabled
    pub non_solid_fill: bool,
}

impl VulkanContext {
    pub fn new(event_loop: &ActiveEventLoop, window: Arc<Window>) -> Result<Self, RenderError> {
        let library =
            VulkanLibrary::new().map_err(|e| RenderError::vulkan("load Vulkan library", e))?;

        let required_extensions = Surface::required_extensions(event_loop)
            .map_err(|e| RenderError::vulkan("query surface extensions", e))?;

        let instance = Instance::new(
            library,
            InstanceCreateInfo {
                flags: InstanceCreateFlags::ENUMERATE_PORTABILITY,
                enabled_extensions: required_extensions,
                ..Default::default()
            },
        )
        .map_err(|e| RenderError::vulkan("create instance", e))?;

        let surface = Surface::from_window(instance.clone(), window)
            .map_err(|e| RenderError::vulkan("create surface", e))?;

        let device_extensions = DeviceExtensions {
            khr_swapchain: true,
            ..DeviceExtensions::empty()
        };

        let (physical_device, queue_family_index) =
            select_physical_device(&instance, &surface, &device_extensions)?;

        info!(
            "Using GPU: {} ({:?})",
            physical_device.properties().device_name,
            physical_device.properties().device_type
        );

        let non_solid_fill = physical_device.supported_features().fill_mode_non_solid;
        if !non_solid_fill {
            info!("fillModeNonSolid not supported - wireframe and point modes disabled");
        }

        let (device, mut queues) = Device::new(
            physical_device,
            DeviceCreateInfo {
                queue_create_infos: vec![QueueCreateInfo {
                    queue_family_index,
                    ..Default::default()
                }],
                enabled_extensions: device_extensions,
                enabled_features: DeviceFeatures {
                    fill_mode_non_solid: non_solid_fill,
                    ..DeviceFeatures::empty()
                },
                ..Default::default()
            },
        )
        .map_err(|e| RenderError::vulkan("create logical device", e))?;

        let queue = queues
            .next()
            .ok_or_else(|| RenderError::Vulkan("device returned no queue".into()))?;

        Ok(Self {
            instance,
            surface,
            device,
            queue,
            non_solid_fill,
        })
    }
}

/// Pick a GPU with a graphics queue that can present to `surface`,
/// preferring discrete over integrated over virtual over software.
fn select_physical_device(
    instance: &Arc<Instance>,
    surface: &Arc<Surface>,
    device_extensions: &DeviceExtensions,
) -> Result<(Arc<PhysicalDevice>, u32), RenderError> {
    instance
        .enumerate_physical_devices()
        .map_err(|e| RenderError::vulkan("enumerate physical devices", e))?
        .filter(|p| p.supported_extensions().contains(device_extensions))
        .filter_map(|p| {
            p.queue_family_properties()
                .iter()
                .enumerate()
                .position(|(i, q)| {
                    q.queue_flags.contains(QueueFlags::GRAPHICS)
                        && p.surface_support(i as u32, surface).unwrap_or(false)
                })
                .map(|i| (p, i as u32))
        })
        .min_by_key(|(p, _)| match p.properties().device_type {
            PhysicalDeviceType::DiscreteGpu => 0,
            PhysicalDeviceType::IntegratedGpu => 1,
            PhysicalDeviceType::VirtualGpu => 2,
            PhysicalDeviceType::Cpu => 3,
            _ => 4,
        })
        .ok_or_else(|| RenderError::Vulkan("no suitable GPU found".into()))
}
