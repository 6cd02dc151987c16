use super::{GraphicsError, Instance, RenderInfo, Swapchain};
use erupt::vk;
use std::sync::Arc;

/// One filled circle, laid out as the instance attributes of `circle.vert`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CircleInstance {
    /// Center in canvas pixels, y down.
    pub center: [f32; 2],
    pub radius: f32,
    /// Color as written to the attachment.
    pub color: [f32; 3],
}

impl CircleInstance {
    const CENTER_OFFSET: u32 = 0;
    const RADIUS_OFFSET: u32 = 8;
    const COLOR_OFFSET: u32 = 12;
}

struct InstanceBuffer {
    buffer: vk::Buffer,
    allocation: vk_alloc::Allocation,
}

struct CirclePipeline {
    instance: Arc<Instance>,
    layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
}

/// Draws circles as instanced quads, discarding fragments outside the radius.
pub struct CircleRenderer {
    instance: Arc<Instance>,
    pipeline: CirclePipeline,
    buffers: Vec<InstanceBuffer>,
    capacity: usize,
    canvas_size: [f32; 2],
}

impl InstanceBuffer {
    fn new(instance: &Instance, capacity: usize) -> Result<Self, GraphicsError> {
        let device = instance.device();
        let allocator = instance.allocator();

        let buffer_info = vk::BufferCreateInfoBuilder::new()
            .size((std::mem::size_of::<CircleInstance>() * capacity) as vk::DeviceSize)
            .usage(vk::BufferUsageFlags::VERTEX_BUFFER)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { device.create_buffer(&buffer_info, None) }.result()?;

        let allocation = allocator
            .allocate_memory_for_buffer(device, buffer, vk_alloc::MemoryLocation::CpuToGpu)
            .map_err(GraphicsError::allocation)?;
        unsafe { device.bind_buffer_memory(buffer, allocation.device_memory, allocation.offset) }
            .result()?;

        Ok(Self { buffer, allocation })
    }

    fn write(&mut self, circles: &[CircleInstance]) -> Result<(), GraphicsError> {
        let slice = self
            .allocation
            .mapped_slice_mut()
            .map_err(GraphicsError::allocation)?
            .ok_or(GraphicsError::Unmapped)?;
        unsafe {
            std::ptr::copy_nonoverlapping(circles.as_ptr(), slice.as_mut_ptr().cast(), circles.len())
        };
        Ok(())
    }

    fn destroy(&self, instance: &Instance) {
        let device = instance.device();
        if let Err(err) = instance.allocator().deallocate(device, &self.allocation) {
            log::error!("failed to free circle buffer: {:?}", err)
        }
        unsafe { device.destroy_buffer(Some(self.buffer), None) }
    }
}

impl CirclePipeline {
    const CIRCLE_VERT_SPV_BYTES: &'static [u8] = include_shader!("circle.vert");
    const CIRCLE_FRAG_SPV_BYTES: &'static [u8] = include_shader!("circle.frag");

    fn new(instance: Arc<Instance>, render_info: RenderInfo) -> Result<Self, GraphicsError> {
        let device = instance.device();

        let vert_code = erupt::utils::decode_spv(Self::CIRCLE_VERT_SPV_BYTES)?;
        let vert_shader_module_create_info =
            vk::ShaderModuleCreateInfoBuilder::new().code(&vert_code);
        let vert_shader_module =
            unsafe { device.create_shader_module(&vert_shader_module_create_info, None) }
                .result()?;

        let frag_code = erupt::utils::decode_spv(Self::CIRCLE_FRAG_SPV_BYTES)?;
        let frag_shader_module_create_info =
            vk::ShaderModuleCreateInfoBuilder::new().code(&frag_code);
        let frag_shader_module =
            unsafe { device.create_shader_module(&frag_shader_module_create_info, None) }
                .result()?;

        let entry_point = unsafe { std::ffi::CStr::from_bytes_with_nul_unchecked(b"main\0") };

        let stages = [
            vk::PipelineShaderStageCreateInfoBuilder::new()
                .stage(vk::ShaderStageFlagBits::VERTEX)
                .module(vert_shader_module)
                .name(entry_point),
            vk::PipelineShaderStageCreateInfoBuilder::new()
                .stage(vk::ShaderStageFlagBits::FRAGMENT)
                .module(frag_shader_module)
                .name(entry_point),
        ];

        let vertex_binding = vk::VertexInputBindingDescriptionBuilder::new()
            .binding(0)
            .stride(std::mem::size_of::<CircleInstance>() as u32)
            .input_rate(vk::VertexInputRate::INSTANCE);
        let vertex_attributes = [
            vk::VertexInputAttributeDescriptionBuilder::new()
                .location(0)
                .binding(0)
                .format(vk::Format::R32G32_SFLOAT)
                .offset(CircleInstance::CENTER_OFFSET),
            vk::VertexInputAttributeDescriptionBuilder::new()
                .location(1)
                .binding(0)
                .format(vk::Format::R32_SFLOAT)
                .offset(CircleInstance::RADIUS_OFFSET),
            vk::VertexInputAttributeDescriptionBuilder::new()
                .location(2)
                .binding(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(CircleInstance::COLOR_OFFSET),
        ];
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfoBuilder::new()
            .vertex_binding_descriptions(std::slice::from_ref(&vertex_binding))
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfoBuilder::new()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport = vk::ViewportBuilder::new()
            .x(0.0)
            .y(0.0)
            .width(render_info.extent.width as f32)
            .height(render_info.extent.height as f32)
            .min_depth(0.0)
            .max_depth(1.0);
        let scissor = vk::Rect2DBuilder::new()
            .offset(vk::Offset2D { x: 0, y: 0 })
            .extent(render_info.extent);
        let viewport_state = vk::PipelineViewportStateCreateInfoBuilder::new()
            .viewports(std::slice::from_ref(&viewport))
            .scissors(std::slice::from_ref(&scissor));

        let rasterization_state = vk::PipelineRasterizationStateCreateInfoBuilder::new()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false)
            .line_width(1.0);

        let multisample_state = vk::PipelineMultisampleStateCreateInfoBuilder::new()
            .rasterization_samples(vk::SampleCountFlagBits::_1)
            .sample_shading_enable(false)
            .alpha_to_coverage_enable(false)
            .alpha_to_one_enable(false);

        // later circles overwrite earlier ones, no depth test
        let color_blend_attachment = vk::PipelineColorBlendAttachmentStateBuilder::new()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::all());
        let color_blend_state = vk::PipelineColorBlendStateCreateInfoBuilder::new()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment))
            .blend_constants([0.0, 0.0, 0.0, 0.0]);

        let push_constant_range = vk::PushConstantRangeBuilder::new()
            .stage_flags(vk::ShaderStageFlags::VERTEX)
            .offset(0)
            .size(std::mem::size_of::<[f32; 2]>() as u32);

        let layout_create_info = vk::PipelineLayoutCreateInfoBuilder::new()
            .push_constant_ranges(std::slice::from_ref(&push_constant_range));
        let layout =
            unsafe { device.create_pipeline_layout(&layout_create_info, None) }.result()?;

        let pipeline_create_info = vk::GraphicsPipelineCreateInfoBuilder::new()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(layout)
            .render_pass(render_info.render_pass)
            .subpass(0);

        let pipelines =
            unsafe { device.create_graphics_pipelines(None, &[pipeline_create_info], None) }
                .result();

        unsafe {
            device.destroy_shader_module(Some(vert_shader_module), None);
            device.destroy_shader_module(Some(frag_shader_module), None);
        }

        let pipeline = pipelines?[0];
        Ok(Self {
            instance,
            layout,
            pipeline,
        })
    }
}

impl Drop for CirclePipeline {
    fn drop(&mut self) {
        let device = self.instance.device();
        unsafe {
            device.destroy_pipeline(Some(self.pipeline), None);
            device.destroy_pipeline_layout(Some(self.layout), None)
        }
    }
}

impl CircleRenderer {
    /// `canvas_size` is the logical pixel space circles are given in; it is
    /// stretched over the whole swapchain image.
    pub fn new(
        instance: Arc<Instance>,
        swapchain: &Swapchain,
        capacity: usize,
        canvas_size: [f32; 2],
    ) -> Result<Self, GraphicsError> {
        let pipeline = CirclePipeline::new(instance.clone(), swapchain.render_info())?;
        let buffers = (0..swapchain.frames_in_flight())
            .map(|_| InstanceBuffer::new(&instance, capacity))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            instance,
            pipeline,
            buffers,
            capacity,
            canvas_size,
        })
    }

    pub fn rebuild(&mut self, swapchain: &Swapchain) -> Result<(), GraphicsError> {
        self.pipeline = CirclePipeline::new(self.instance.clone(), swapchain.render_info())?;
        Ok(())
    }

    /// Uploads `circles` into the buffer of `frame` and records the draw.
    pub fn record(
        &mut self,
        command_buffer: vk::CommandBuffer,
        frame: usize,
        circles: &[CircleInstance],
    ) -> Result<(), GraphicsError> {
        if circles.len() > self.capacity {
            log::warn!(
                "dropping {} of {} circles",
                circles.len() - self.capacity,
                circles.len()
            )
        }
        let circles = &circles[..circles.len().min(self.capacity)];
        if circles.is_empty() {
            return Ok(());
        }
        let buffer = &mut self.buffers[frame];
        buffer.write(circles)?;

        let device = self.instance.device();
        unsafe {
            device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.pipeline,
            );
            device.cmd_push_constants(
                command_buffer,
                self.pipeline.layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                std::mem::size_of::<[f32; 2]>() as u32,
                self.canvas_size.as_ptr().cast(),
            );
            device.cmd_bind_vertex_buffers(command_buffer, 0, &[buffer.buffer], &[0]);
            device.cmd_draw(command_buffer, 6, circles.len() as u32, 0, 0)
        }
        Ok(())
    }
}

impl Drop for CircleRenderer {
    fn drop(&mut self) {
        for buffer in &self.buffers {
            buffer.destroy(&self.instance)
        }
    }
}
