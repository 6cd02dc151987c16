use super::{GraphicsError, Instance, RenderInfo};
use erupt::vk;
use std::sync::Arc;

const MAX_FRAMES_IN_FLIGHT: u32 = 2;

/// Presentable images of the window surface plus the per-frame command
/// buffers and synchronization used to fill them.
pub struct Swapchain {
    instance: Arc<Instance>,
    render_pass: vk::RenderPass,
    extent: vk::Extent2D,
    format: vk::Format,

    swapchain: vk::SwapchainKHR,
    swapchain_framebuffers: Vec<SwapchainFramebuffer>,

    command_pool: vk::CommandPool,
    sync_objects: Vec<RenderSyncObject>,
    current_frame: usize,
}

#[derive(Debug, Default, Copy, Clone)]
struct SwapchainFramebuffer {
    view: vk::ImageView,
    framebuffer: vk::Framebuffer,
    fence: vk::Fence,
}

#[derive(Debug, Default, Copy, Clone)]
struct RenderSyncObject {
    in_flight: vk::Fence,
    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
    command_buffer: vk::CommandBuffer,
}

impl Swapchain {
    pub fn new(instance: Arc<Instance>, size: (u32, u32)) -> Result<Self, GraphicsError> {
        Self::create(instance, size, vk::SwapchainKHR::null())
    }

    fn create(
        instance: Arc<Instance>,
        size: (u32, u32),
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<Self, GraphicsError> {
        let device = instance.device();
        let swapchain_info = instance.swapchain_info(size)?;
        let (graphics, present) = (instance.graphics_queue(), instance.present_queue());

        let color_attachment_description = vk::AttachmentDescriptionBuilder::new()
            .format(swapchain_info.surface_format.format)
            .samples(vk::SampleCountFlagBits::_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);
        let color_attachment = vk::AttachmentReferenceBuilder::new()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        let subpass = vk::SubpassDescriptionBuilder::new()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(std::slice::from_ref(&color_attachment));
        let dependency = vk::SubpassDependencyBuilder::new()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
        let render_pass_create_info = vk::RenderPassCreateInfoBuilder::new()
            .attachments(std::slice::from_ref(&color_attachment_description))
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));
        let render_pass =
            unsafe { device.create_render_pass(&render_pass_create_info, None) }.result()?;

        let (sharing_mode, queue_families) = if graphics.family == present.family {
            (vk::SharingMode::EXCLUSIVE, Vec::new())
        } else {
            (
                vk::SharingMode::CONCURRENT,
                vec![graphics.family, present.family],
            )
        };
        let caps = swapchain_info.surface_caps;
        let min_image_count = if caps.max_image_count == 0 {
            caps.min_image_count + 1
        } else {
            (caps.min_image_count + 1).min(caps.max_image_count)
        };

        let swapchain_create_info = vk::SwapchainCreateInfoKHRBuilder::new()
            .surface(swapchain_info.surface)
            .min_image_count(min_image_count)
            .image_format(swapchain_info.surface_format.format)
            .image_color_space(swapchain_info.surface_format.color_space)
            .image_extent(swapchain_info.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(&queue_families)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagBitsKHR::OPAQUE_KHR)
            .present_mode(swapchain_info.present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);
        let swapchain =
            unsafe { device.create_swapchain_khr(&swapchain_create_info, None) }.result()?;

        let images = unsafe { device.get_swapchain_images_khr(swapchain, None) }.result()?;
        let swapchain_framebuffers = images
            .into_iter()
            .map(|image| -> Result<SwapchainFramebuffer, GraphicsError> {
                let view_create_info = vk::ImageViewCreateInfoBuilder::new()
                    .image(image)
                    .view_type(vk::ImageViewType::_2D)
                    .format(swapchain_info.surface_format.format)
                    .components(vk::ComponentMapping::default())
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                let view =
                    unsafe { device.create_image_view(&view_create_info, None) }.result()?;
                let framebuffer_create_info = vk::FramebufferCreateInfoBuilder::new()
                    .render_pass(render_pass)
                    .attachments(std::slice::from_ref(&view))
                    .width(swapchain_info.extent.width)
                    .height(swapchain_info.extent.height)
                    .layers(1);
                let framebuffer =
                    unsafe { device.create_framebuffer(&framebuffer_create_info, None) }
                        .result()?;
                Ok(SwapchainFramebuffer {
                    view,
                    framebuffer,
                    fence: vk::Fence::null(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let command_pool_create_info = vk::CommandPoolCreateInfoBuilder::new()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(graphics.family);
        let command_pool =
            unsafe { device.create_command_pool(&command_pool_create_info, None) }.result()?;

        let command_buffer_allocate_info = vk::CommandBufferAllocateInfoBuilder::new()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(MAX_FRAMES_IN_FLIGHT);
        let command_buffers =
            unsafe { device.allocate_command_buffers(&command_buffer_allocate_info) }.result()?;
        let semaphore_create_info = vk::SemaphoreCreateInfoBuilder::new();
        let fence_create_info =
            vk::FenceCreateInfoBuilder::new().flags(vk::FenceCreateFlags::SIGNALED);
        let sync_objects = command_buffers
            .into_iter()
            .map(|command_buffer| -> Result<RenderSyncObject, GraphicsError> {
                Ok(RenderSyncObject {
                    in_flight: unsafe { device.create_fence(&fence_create_info, None) }
                        .result()?,
                    image_available: unsafe {
                        device.create_semaphore(&semaphore_create_info, None)
                    }
                    .result()?,
                    render_finished: unsafe {
                        device.create_semaphore(&semaphore_create_info, None)
                    }
                    .result()?,
                    command_buffer,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "swapchain {}x{} {:?}, {} images",
            swapchain_info.extent.width,
            swapchain_info.extent.height,
            swapchain_info.surface_format.format,
            swapchain_framebuffers.len()
        );

        Ok(Self {
            instance,
            render_pass,
            extent: swapchain_info.extent,
            format: swapchain_info.surface_format.format,

            swapchain,
            swapchain_framebuffers,

            command_pool,
            sync_objects,
            current_frame: 0,
        })
    }

    /// Recreates the swapchain for a new window size, retiring the old one.
    /// Returns `false` and keeps the old swapchain while the surface has no
    /// area, as when the window is minimized.
    pub fn rebuild(&mut self, size: (u32, u32)) -> Result<bool, GraphicsError> {
        let extent = self.instance.swapchain_info(size)?.extent;
        if !has_area((extent.width, extent.height)) {
            log::debug!("surface is {}x{}, not rebuilding", extent.width, extent.height);
            return Ok(false);
        }
        self.instance.wait_idle()?;
        log::debug!("rebuilding swapchain for {}x{}", size.0, size.1);
        *self = Self::create(self.instance.clone(), size, self.swapchain)?;
        Ok(true)
    }

    pub fn render_info(&self) -> RenderInfo {
        RenderInfo {
            render_pass: self.render_pass,
            extent: self.extent,
        }
    }

    pub fn frames_in_flight(&self) -> usize {
        self.sync_objects.len()
    }

    /// Whether the images re-encode linear shader output to sRGB.
    pub fn is_srgb(&self) -> bool {
        is_srgb_format(self.format)
    }

    /// Clears the next image to `clear_color`, lets `record` fill the render
    /// pass, and presents. `record` also receives the frame slot, which stays
    /// unused by the GPU until the slot comes around again. Returns `false`
    /// when the swapchain is out of date and must be rebuilt.
    pub fn render(
        &mut self,
        clear_color: [f32; 4],
        record: impl FnOnce(vk::CommandBuffer, usize) -> Result<(), GraphicsError>,
    ) -> Result<bool, GraphicsError> {
        let device = self.instance.device();
        let (graphics, present) = (
            self.instance.graphics_queue(),
            self.instance.present_queue(),
        );
        let frame = self.current_frame;
        let sync = self.sync_objects[frame];

        unsafe { device.wait_for_fences(&[sync.in_flight], true, u64::MAX) }.result()?;

        let image_acquired = unsafe {
            device.acquire_next_image_khr(
                self.swapchain,
                u64::MAX,
                Some(sync.image_available),
                None,
            )
        };
        let index = match image_acquired.result() {
            Ok(x) => x as usize,
            Err(vk::Result::SUBOPTIMAL_KHR | vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let image_fence = self.swapchain_framebuffers[index].fence;
        if !image_fence.is_null() {
            unsafe { device.wait_for_fences(&[image_fence], true, u64::MAX) }.result()?
        };
        self.swapchain_framebuffers[index].fence = sync.in_flight;

        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: clear_color,
            },
        }];
        let render_pass_begin_info = vk::RenderPassBeginInfoBuilder::new()
            .render_pass(self.render_pass)
            .framebuffer(self.swapchain_framebuffers[index].framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.extent,
            })
            .clear_values(&clear_values);
        let command_buffer_begin_info = vk::CommandBufferBeginInfoBuilder::new()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            device
                .begin_command_buffer(sync.command_buffer, &command_buffer_begin_info)
                .result()?;
            device.cmd_begin_render_pass(
                sync.command_buffer,
                &render_pass_begin_info,
                vk::SubpassContents::INLINE,
            );
        }
        record(sync.command_buffer, frame)?;
        unsafe {
            device.cmd_end_render_pass(sync.command_buffer);
            device.end_command_buffer(sync.command_buffer).result()?;
            device.reset_fences(&[sync.in_flight]).result()?;
        }

        let submit_info = vk::SubmitInfoBuilder::new()
            .wait_semaphores(std::slice::from_ref(&sync.image_available))
            .wait_dst_stage_mask(&[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT])
            .command_buffers(std::slice::from_ref(&sync.command_buffer))
            .signal_semaphores(std::slice::from_ref(&sync.render_finished));
        unsafe { device.queue_submit(graphics.queue, &[submit_info], Some(sync.in_flight)) }
            .result()?;
        self.current_frame = next_frame(frame, self.sync_objects.len());

        let image_index = index as u32;
        let present_info = vk::PresentInfoKHRBuilder::new()
            .wait_semaphores(std::slice::from_ref(&sync.render_finished))
            .swapchains(std::slice::from_ref(&self.swapchain))
            .image_indices(std::slice::from_ref(&image_index));
        let presented = unsafe { device.queue_present_khr(present.queue, &present_info) };
        match presented.result() {
            Ok(()) => Ok(true),
            Err(vk::Result::SUBOPTIMAL_KHR | vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether a surface of this size can back a swapchain.
pub fn has_area((width, height): (u32, u32)) -> bool {
    width > 0 && height > 0
}

fn next_frame(frame: usize, frames_in_flight: usize) -> usize {
    (frame + 1) % frames_in_flight
}

fn is_srgb_format(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::B8G8R8A8_SRGB | vk::Format::R8G8B8A8_SRGB | vk::Format::A8B8G8R8_SRGB_PACK32
    )
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        let device = self.instance.device();
        if let Err(err) = self.instance.wait_idle() {
            log::error!("destroying swapchain on a busy device: {}", err)
        }

        unsafe {
            for sync in &self.sync_objects {
                device.destroy_fence(Some(sync.in_flight), None);
                device.destroy_semaphore(Some(sync.image_available), None);
                device.destroy_semaphore(Some(sync.render_finished), None)
            }
            device.destroy_command_pool(Some(self.command_pool), None);
            for framebuffer in &self.swapchain_framebuffers {
                device.destroy_framebuffer(Some(framebuffer.framebuffer), None);
                device.destroy_image_view(Some(framebuffer.view), None)
            }
            device.destroy_swapchain_khr(Some(self.swapchain), None);
            device.destroy_render_pass(Some(self.render_pass), None)
        }
    }
}
