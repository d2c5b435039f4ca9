use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::render::{RenderCtx, RenderTarget};

use super::texture::PixelTexture;
use super::transform::{ZoomState, ZoomUniform};

/// Background behind the quad, visible only while rendering degraded.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// Draws the source texture as a full-window quad through the zoom transform.
///
/// Owns the quad mesh, the pipeline, the nearest/clamp sampler, the zoom
/// uniform buffer, and the bind group tying them to the pixel texture. All
/// fields are `Option`: `initialize` populates them once and `release` drops
/// them, making double-shutdown a no-op.
#[derive(Default)]
pub(crate) struct BlitRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    // Rebuilt whenever the pixel texture is re-specified.
    bind_group: Option<wgpu::BindGroup>,
    bind_group_generation: u64,

    zoom_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
}

impl BlitRenderer {
    pub(crate) fn new() -> Self {
        Self {
            bind_group_generation: u64::MAX,
            ..Self::default()
        }
    }

    /// Creates the pipeline, quad geometry, sampler and uniform buffer.
    pub(crate) fn initialize(&mut self, ctx: &RenderCtx<'_>) {
        self.ensure_pipeline(ctx);
        self.ensure_sampler(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_zoom_ubo(ctx);
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Writes the current zoom state to the uniform buffer, immediately.
    pub(crate) fn write_zoom_uniform(&self, ctx: &RenderCtx<'_>, zoom: &ZoomState) {
        let Some(ubo) = self.zoom_ubo.as_ref() else {
            return;
        };
        ctx.queue
            .write_buffer(ubo, 0, bytemuck::bytes_of(&zoom.as_uniform()));
    }

    /// Records the frame: clear, then one indexed draw of the quad.
    ///
    /// When the pipeline or texture is missing (failed validation, no source
    /// declared yet) the pass still clears and the draw is skipped — degraded
    /// output instead of an abort.
    pub(crate) fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        texture: &PixelTexture,
    ) {
        self.ensure_bindings(ctx, texture);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("pixelview blit pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let (Some(pipeline), Some(bind_group), Some(quad_vbo), Some(quad_ibo)) = (
            self.pipeline.as_ref(),
            self.bind_group.as_ref(),
            self.quad_vbo.as_ref(),
            self.quad_ibo.as_ref(),
        ) else {
            return;
        };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..1);
    }

    /// Drops every GPU object. Safe to call more than once.
    pub(crate) fn release(&mut self) {
        self.pipeline_format = None;
        self.pipeline = None;
        self.bind_group_layout = None;
        self.bind_group = None;
        self.bind_group_generation = u64::MAX;
        self.zoom_ubo = None;
        self.sampler = None;
        self.quad_vbo = None;
        self.quad_ibo = None;
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        // Validation errors from shader or pipeline creation are captured
        // here and logged; compilation is single-shot and never retried.
        // While the pipeline is missing, render() clears and skips the draw.
        let error_scope = ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pixelview blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bgl = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("pixelview blit bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(zoom_ubo_min_binding_size()),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pixelview blit pipeline layout"),
                bind_group_layouts: &[&bgl],
                immediate_size: 0,
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("pixelview blit pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[QuadVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        // Marking the format before checking the scope makes the failure
        // single-shot: a rejected pipeline is not recompiled every frame.
        self.pipeline_format = Some(ctx.surface_format);

        if let Some(err) = pollster::block_on(error_scope.pop()) {
            log::error!("blit pipeline rejected by the driver: {err}");
            self.pipeline = None;
            self.bind_group_layout = None;
            return;
        }

        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bgl);
        self.bind_group = None;
        self.bind_group_generation = u64::MAX;
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }

        // Nearest keeps hard pixel edges under zoom; clamp-to-edge stops the
        // transform from sampling wrapped texels past the borders.
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("pixelview blit sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pixelview quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pixelview quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_zoom_ubo(&mut self, ctx: &RenderCtx<'_>) {
        if self.zoom_ubo.is_some() {
            return;
        }

        self.zoom_ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pixelview zoom ubo"),
            size: std::mem::size_of::<ZoomUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
    }

    /// Rebuilds the bind group when the pixel texture was re-specified.
    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, texture: &PixelTexture) {
        if self.bind_group.is_some() && self.bind_group_generation == texture.generation() {
            return;
        }

        let Some(bgl) = self.bind_group_layout.as_ref() else {
            return;
        };
        let Some(view) = texture.view() else {
            self.bind_group = None;
            return;
        };
        let (Some(ubo), Some(sampler)) = (self.zoom_ubo.as_ref(), self.sampler.as_ref()) else {
            return;
        };

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pixelview blit bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }));
        self.bind_group_generation = texture.generation();
    }
}

fn zoom_ubo_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<ZoomUniform>() as u64)
        .expect("ZoomUniform has non-zero size by construction")
}

// ── quad geometry ─────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    pos: [f32; 2], // NDC
    uv: [f32; 2],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// Unit square spanning the whole clip-space viewport. The top screen edge
// samples texture row 0: source rows run top-to-bottom.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { pos: [ 1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { pos: [ 1.0,  1.0], uv: [1.0, 0.0] },
    QuadVertex { pos: [-1.0,  1.0], uv: [0.0, 0.0] },
];

// Two triangles sharing the bottom-left → top-right diagonal.
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_spans_clip_space() {
        for v in &QUAD_VERTICES {
            assert!(v.pos[0].abs() == 1.0 && v.pos[1].abs() == 1.0);
            assert!((0.0..=1.0).contains(&v.uv[0]) && (0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn indices_form_two_triangles_over_four_vertices() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
        // The shared diagonal is 0–2.
        assert_eq!(&QUAD_INDICES[..3], &[0, 1, 2]);
        assert_eq!(&QUAD_INDICES[3..], &[0, 2, 3]);
    }

    #[test]
    fn top_edge_samples_row_zero() {
        for v in &QUAD_VERTICES {
            if v.pos[1] == 1.0 {
                assert_eq!(v.uv[1], 0.0);
            } else {
                assert_eq!(v.uv[1], 1.0);
            }
        }
    }
}
