/// Pipeline - the triangle's graphics pipeline and its layout
///
/// Viewport and scissor are baked in, so the pipeline is recreated together
/// with the swapchain.

use ash::vk;
use hello_triangle::triangle::{Result, Vertex};
use hello_triangle::app_err;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_selection::vertex_format_to_vk;
use crate::vulkan_shader::ShaderModule;

const SOURCE: &str = "triangle::vulkan";

/// Graphics pipeline with an empty layout (no descriptors, no push constants)
pub struct Pipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) pipeline_layout: vk::PipelineLayout,
}

impl Pipeline {
    pub fn new(
        ctx: Arc<GpuContext>,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
        render_pass: vk::RenderPass,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        unsafe {
            let shader_stages = [
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::VERTEX)
                    .module(vertex_shader.module)
                    .name(c"main"),
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::FRAGMENT)
                    .module(fragment_shader.module)
                    .name(c"main"),
            ];

            // Vertex input: binding 0, per-vertex position + color
            let binding = vk::VertexInputBindingDescription::default()
                .binding(0)
                .stride(Vertex::stride())
                .input_rate(vk::VertexInputRate::VERTEX);
            let attributes: Vec<vk::VertexInputAttributeDescription> = Vertex::attributes()
                .iter()
                .map(|attr| {
                    vk::VertexInputAttributeDescription::default()
                        .location(attr.location)
                        .binding(attr.binding)
                        .format(vertex_format_to_vk(attr.format))
                        .offset(attr.offset)
                })
                .collect();
            let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(std::slice::from_ref(&binding))
                .vertex_attribute_descriptions(&attributes);

            let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                .primitive_restart_enable(false);

            let viewport = vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            };
            let scissor = vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            };
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewports(std::slice::from_ref(&viewport))
                .scissors(std::slice::from_ref(&scissor));

            let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::BACK)
                .front_face(vk::FrontFace::CLOCKWISE)
                .depth_bias_enable(false);

            let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false);
            let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(std::slice::from_ref(&color_blend_attachment));

            let layout = ctx
                .device
                .create_pipeline_layout(&vk::PipelineLayoutCreateInfo::default(), None)
                .map_err(|e| app_err!(SOURCE, "Failed to create pipeline layout: {:?}", e))?;

            let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&shader_stages)
                .vertex_input_state(&vertex_input_state)
                .input_assembly_state(&input_assembly_state)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization_state)
                .multisample_state(&multisample_state)
                .color_blend_state(&color_blend_state)
                .layout(layout)
                .render_pass(render_pass)
                .subpass(0);

            let pipelines = match ctx.device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_create_info],
                None,
            ) {
                Ok(pipelines) => pipelines,
                Err((_, e)) => {
                    ctx.device.destroy_pipeline_layout(layout, None);
                    return Err(app_err!(SOURCE, "Failed to create graphics pipeline: {:?}", e));
                }
            };

            Ok(Self {
                pipeline: pipelines[0],
                pipeline_layout: layout,
                ctx,
            })
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}
