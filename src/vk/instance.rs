use super::{debug, GraphicsError, QueueInfo, SwapchainInfo};
use erupt::{vk, ExtendableFromConst};
use raw_window_handle::HasRawWindowHandle;
use std::mem::ManuallyDrop;
use std::os::raw::c_char;

const VAL_LAYER: *const c_char = erupt::cstr!("VK_LAYER_KHRONOS_validation");

/// Vulkan instance, window surface and logical device, shared by everything
/// that records into the swapchain.
pub struct Instance {
    entry: ManuallyDrop<erupt::EntryLoader>,
    instance: ManuallyDrop<erupt::InstanceLoader>,
    device: ManuallyDrop<erupt::DeviceLoader>,
    allocator: vk_alloc::Allocator,

    messenger: Option<vk::DebugUtilsMessengerEXT>,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
    graphics_queue: QueueInfo,
    present_queue: QueueInfo,
}

impl Instance {
    pub fn new(
        window: &impl HasRawWindowHandle,
        validation: bool,
    ) -> Result<std::sync::Arc<Self>, GraphicsError> {
        let mut instance_extensions =
            erupt::utils::surface::enumerate_required_extensions(window).result()?;
        let device_extensions = [vk::KHR_SWAPCHAIN_EXTENSION_NAME];
        let layers = if validation {
            instance_extensions.push(vk::EXT_DEBUG_UTILS_EXTENSION_NAME);
            vec![VAL_LAYER]
        } else {
            Vec::new()
        };

        let (entry, instance, messenger) =
            create_entry_instance_messenger(&instance_extensions, &layers, validation)?;

        let surface =
            unsafe { erupt::utils::surface::create_surface(&instance, window, None) }.result()?;

        let (physical_device, (graphics_family, present_family)) =
            find_physical_device(&instance, |physical_device| {
                let queue_families = unsafe {
                    instance.get_physical_device_queue_family_properties(physical_device, None)
                };
                let present_family = (0..queue_families.len() as u32).find(|&index| {
                    unsafe {
                        instance.get_physical_device_surface_support_khr(
                            physical_device,
                            index,
                            surface,
                        )
                    }
                    .result()
                    .unwrap_or(false)
                })?;
                let graphics_family = queue_families
                    .iter()
                    .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))?
                    as u32;
                Some((graphics_family, present_family))
            })?
            .ok_or(GraphicsError::NoCapableDevice)?;

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let device_name = unsafe { std::ffi::CStr::from_ptr(properties.device_name.as_ptr()) };
        log::info!(
            "using {} (graphics family {}, present family {})",
            device_name.to_string_lossy(),
            graphics_family,
            present_family
        );

        let (device, [graphics_queue, present_queue]) = create_device(
            &instance,
            &device_extensions,
            &layers,
            physical_device,
            [graphics_family, present_family],
        )?;

        let allocator = vk_alloc::Allocator::new(&instance, physical_device, &Default::default())
            .map_err(GraphicsError::allocation)?;

        Ok(std::sync::Arc::new(Self {
            entry,
            instance,
            device,
            allocator,

            messenger,
            surface,
            physical_device,
            graphics_queue,
            present_queue,
        }))
    }

    pub fn device(&self) -> &erupt::DeviceLoader {
        &self.device
    }

    pub fn allocator(&self) -> &vk_alloc::Allocator {
        &self.allocator
    }

    pub fn graphics_queue(&self) -> QueueInfo {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> QueueInfo {
        self.present_queue
    }

    pub fn wait_idle(&self) -> Result<(), GraphicsError> {
        Ok(unsafe { self.device.device_wait_idle() }.result()?)
    }

    pub fn swapchain_info(&self, (width, height): (u32, u32)) -> Result<SwapchainInfo, GraphicsError> {
        let surface_caps = unsafe {
            self.instance
                .get_physical_device_surface_capabilities_khr(self.physical_device, self.surface)
        }
        .result()?;

        let surface_formats = unsafe {
            self.instance.get_physical_device_surface_formats_khr(
                self.physical_device,
                self.surface,
                None,
            )
        }
        .result()?;
        let surface_format = surface_formats
            .iter()
            .find(|surface_format| {
                surface_format.format == vk::Format::B8G8R8A8_SRGB
                    && surface_format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR_KHR
            })
            .or_else(|| surface_formats.first())
            .copied()
            .ok_or(GraphicsError::NoSurfaceFormat)?;

        // FIFO paces presentation to the display; the frame loop caps itself anyway
        let present_mode = vk::PresentModeKHR::FIFO_KHR;

        let extent = vk::Extent2D {
            width: width.clamp(
                surface_caps.min_image_extent.width,
                surface_caps.max_image_extent.width,
            ),
            height: height.clamp(
                surface_caps.min_image_extent.height,
                surface_caps.max_image_extent.height,
            ),
        };

        Ok(SwapchainInfo {
            surface: self.surface,
            surface_caps,
            surface_format,
            present_mode,
            extent,
        })
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            self.allocator.cleanup(&self.device);
            self.device.destroy_device(None);
            self.instance.destroy_surface_khr(Some(self.surface), None);
            if let Some(messenger) = self.messenger {
                self.instance
                    .destroy_debug_utils_messenger_ext(Some(messenger), None)
            }
            self.instance.destroy_instance(None);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.instance);
            ManuallyDrop::drop(&mut self.entry)
        }
        log::debug!("vulkan instance destroyed")
    }
}

fn create_entry_instance_messenger(
    instance_extensions: &[*const c_char],
    instance_layers: &[*const c_char],
    validation: bool,
) -> Result<
    (
        ManuallyDrop<erupt::EntryLoader>,
        ManuallyDrop<erupt::InstanceLoader>,
        Option<vk::DebugUtilsMessengerEXT>,
    ),
    GraphicsError,
> {
    let entry = erupt::EntryLoader::new().map_err(GraphicsError::loader)?;

    let application_info =
        vk::ApplicationInfoBuilder::new().api_version(vk::make_api_version(0, 1, 1, 0));
    let messenger_create_info = debug::create_info();
    let mut instance_create_info = vk::InstanceCreateInfoBuilder::new()
        .application_info(&application_info)
        .enabled_layer_names(instance_layers)
        .enabled_extension_names(instance_extensions);
    if validation {
        instance_create_info = instance_create_info.extend_from(&messenger_create_info);
    }
    let instance = unsafe { erupt::InstanceLoader::new(&entry, &instance_create_info, None) }
        .map_err(GraphicsError::loader)?;

    let messenger = if validation {
        Some(
            unsafe { instance.create_debug_utils_messenger_ext(&messenger_create_info, None) }
                .result()?,
        )
    } else {
        None
    };
    Ok((ManuallyDrop::new(entry), ManuallyDrop::new(instance), messenger))
}

/// Picks the best-ranked device accepted by `filter`, discrete GPUs first.
fn find_physical_device<T>(
    instance: &erupt::InstanceLoader,
    filter: impl Fn(vk::PhysicalDevice) -> Option<T>,
) -> Result<Option<(vk::PhysicalDevice, T)>, GraphicsError> {
    let physical_devices = unsafe { instance.enumerate_physical_devices(None) }.result()?;
    Ok(physical_devices
        .into_iter()
        .filter_map(|physical_device| filter(physical_device).map(|x| (physical_device, x)))
        .min_by_key(|(physical_device, _)| {
            let properties = unsafe { instance.get_physical_device_properties(*physical_device) };
            device_rank(properties.device_type)
        }))
}

fn device_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 0,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
        _ => 2,
    }
}

fn create_device<const N: usize>(
    instance: &erupt::InstanceLoader,
    device_extensions: &[*const c_char],
    device_layers: &[*const c_char],
    physical_device: vk::PhysicalDevice,
    queue_families: [u32; N],
) -> Result<(ManuallyDrop<erupt::DeviceLoader>, [QueueInfo; N]), GraphicsError> {
    let unique_queues = queue_families
        .iter()
        .collect::<std::collections::BTreeSet<_>>();
    let queue_create_infos = unique_queues
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfoBuilder::new()
                .queue_family_index(*family)
                .queue_priorities(&[1.0])
        })
        .collect::<Vec<_>>();
    let device_create_info = vk::DeviceCreateInfoBuilder::new()
        .queue_create_infos(&queue_create_infos)
        .enabled_layer_names(device_layers)
        .enabled_extension_names(device_extensions);
    let device =
        unsafe { erupt::DeviceLoader::new(instance, physical_device, &device_create_info, None) }
            .map_err(GraphicsError::loader)?;
    let queues = queue_families.map(|family| QueueInfo {
        family,
        queue: unsafe { device.get_device_queue(family, 0) },
    });
    Ok((ManuallyDrop::new(device), queues))
}
