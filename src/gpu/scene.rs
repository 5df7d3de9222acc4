/// wgpu render pipelines for the 3D world scene
///
/// This module manages all the wgpu boilerplate:
/// - Sky, lit-scene, and wireframe pipelines over a shared depth buffer
/// - Static geometry (ground plane, placeholder cube) uploaded once
/// - Model buffers swapped whenever a new mesh revision arrives
/// - Per-frame uniform writes for camera and model matrices
///
/// The renderer lives in the shader widget's Storage and is created
/// lazily on the first prepare call.

// Use wgpu from iced to avoid dependency conflicts
use iced_wgpu::wgpu;
use wgpu::util::DeviceExt;

use std::sync::Arc;

use cgmath::{Matrix4, Rad};

use crate::gpu::mesh::{self, LineVertex, MeshVertex, WorldMesh};
use crate::gpu::shaders;

/// Ambient light: white at intensity 0.5
const AMBIENT: [f32; 4] = [1.0, 1.0, 1.0, 0.5];
/// Directional light direction (toward the light, normalized (10,10,5)), intensity 1.0
const SUN: [f32; 4] = [0.6667, 0.6667, 0.3333, 1.0];
/// Point light position, intensity 0.5
const POINT_LIGHT: [f32; 4] = [-10.0, 10.0, -10.0, 0.5];

/// Placeholder cube spin rates, radians per second
const CUBE_SPIN_X: f32 = 0.3;
const CUBE_SPIN_Y: f32 = 0.4;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-frame inputs computed by the widget
#[derive(Debug, Clone)]
pub struct SceneFrame {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub content: SceneContent,
}

/// What occupies the center of the scene this frame
#[derive(Debug, Clone)]
pub enum SceneContent {
    /// Spinning wireframe cube while the mesh downloads
    Placeholder { spin: f32 },
    /// A decoded world mesh; the revision bumps when a new one arrives
    Mesh { mesh: Arc<WorldMesh>, revision: u64 },
}

/// Camera and model state in the GPU-friendly layout
/// Must match the WGSL Globals struct field for field
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    sun: [f32; 4],
    point_light: [f32; 4],
}

struct GlobalsBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct GeometryBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct ModelBuffers {
    geometry: GeometryBuffers,
    revision: u64,
}

struct DepthTexture {
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// All GPU state for the world scene
pub struct SceneRenderer {
    sky_pipeline: wgpu::RenderPipeline,
    scene_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    ground: GeometryBuffers,
    cube: GeometryBuffers,
    ground_globals: GlobalsBinding,
    model_globals: GlobalsBinding,
    model: Option<ModelBuffers>,
    show_mesh: bool,
    depth: Option<DepthTexture>,
    last_bounds: (f32, f32, f32, f32),
}

// Manual Debug implementation (wgpu types don't implement Debug)
impl std::fmt::Debug for SceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRenderer")
            .field("show_mesh", &self.show_mesh)
            .field("has_model", &self.model.is_some())
            .finish_non_exhaustive()
    }
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        // Shared Globals bind group layout (vertex + fragment)
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Globals Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sky Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SKY_SHADER.into()),
        });

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let sky_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sky Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let mesh_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 24,
                    shader_location: 2,
                },
            ],
        };

        let line_vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        };

        let color_target = Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        });

        // Sky: full-screen triangle, no depth writes, always passes
        let sky_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sky Pipeline"),
            layout: Some(&sky_layout),
            vertex: wgpu::VertexState {
                module: &sky_shader,
                entry_point: "vs_sky",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sky_shader,
                entry_point: "fs_sky",
                targets: &[color_target.clone()],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        // Lit triangles: ground plane and the loaded model
        // Culling stays off; generated meshes have no reliable winding
        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&scene_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: "vs_main",
                buffers: &[mesh_vertex_layout],
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: "fs_main",
                targets: &[color_target.clone()],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        // Wireframe placeholder cube
        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Placeholder Pipeline"),
            layout: Some(&scene_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: "vs_line",
                buffers: &[line_vertex_layout],
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: "fs_line",
                targets: &[color_target],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let (ground_vertices, ground_indices) = mesh::ground_plane();
        let ground = Self::upload_mesh(device, "Ground", &ground_vertices, &ground_indices);

        let (cube_vertices, cube_indices) = mesh::placeholder_cube();
        let cube = GeometryBuffers {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cube Vertex Buffer"),
                contents: bytemuck::cast_slice(&cube_vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cube Index Buffer"),
                contents: bytemuck::cast_slice(&cube_indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: cube_indices.len() as u32,
        };

        let ground_globals = Self::create_globals(device, &globals_layout, "Ground Globals");
        let model_globals = Self::create_globals(device, &globals_layout, "Model Globals");

        println!("🗺️  Scene renderer initialized");

        Self {
            sky_pipeline,
            scene_pipeline,
            line_pipeline,
            ground,
            cube,
            ground_globals,
            model_globals,
            model: None,
            show_mesh: false,
            depth: None,
            last_bounds: (0.0, 0.0, 1.0, 1.0),
        }
    }

    fn create_globals(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
    ) -> GlobalsBinding {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Globals>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        GlobalsBinding { buffer, bind_group }
    }

    fn upload_mesh(
        device: &wgpu::Device,
        label: &str,
        vertices: &[MeshVertex],
        indices: &[u32],
    ) -> GeometryBuffers {
        GeometryBuffers {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: indices.len() as u32,
        }
    }

    /// Upload what this frame needs: depth texture, mesh buffers, uniforms
    ///
    /// `bounds` is the widget rectangle in physical pixels; it becomes the
    /// render viewport. `target_size` is the full frame, which the depth
    /// texture must match.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &SceneFrame,
        bounds: (f32, f32, f32, f32),
        target_size: (u32, u32),
    ) {
        self.ensure_depth(device, target_size);
        self.last_bounds = bounds;

        let model_matrix = match &frame.content {
            SceneContent::Placeholder { spin } => {
                self.show_mesh = false;
                Matrix4::from_angle_x(Rad(spin * CUBE_SPIN_X))
                    * Matrix4::from_angle_y(Rad(spin * CUBE_SPIN_Y))
            }
            SceneContent::Mesh { mesh, revision } => {
                self.show_mesh = true;
                let stale = self.model.as_ref().map(|m| m.revision) != Some(*revision);
                if stale {
                    println!(
                        "📦 Uploading world mesh to GPU ({} vertices)",
                        mesh.vertices.len()
                    );
                    self.model = Some(ModelBuffers {
                        geometry: Self::upload_mesh(device, "World", &mesh.vertices, &mesh.indices),
                        revision: *revision,
                    });
                }
                mesh.model_matrix()
            }
        };

        let camera_pos = [
            frame.camera_pos[0],
            frame.camera_pos[1],
            frame.camera_pos[2],
            1.0,
        ];

        let ground = Globals {
            view_proj: frame.view_proj,
            model: Matrix4::from_scale(1.0).into(),
            camera_pos,
            ambient: AMBIENT,
            sun: SUN,
            point_light: POINT_LIGHT,
        };

        let model = Globals {
            model: model_matrix.into(),
            ..ground
        };

        queue.write_buffer(&self.ground_globals.buffer, 0, bytemuck::cast_slice(&[ground]));
        queue.write_buffer(&self.model_globals.buffer, 0, bytemuck::cast_slice(&[model]));
    }

    fn ensure_depth(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if self.depth.as_ref().map(|d| d.size) == Some(size) {
            return;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Texture"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        self.depth = Some(DepthTexture {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            size,
        });
    }

    /// Draw the scene into the widget's clip rectangle
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clip: (u32, u32, u32, u32),
    ) {
        let Some(depth) = &self.depth else {
            return;
        };

        let (x, y, width, height) = clip;
        if width == 0 || height == 0 {
            return;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let (bx, by, bw, bh) = self.last_bounds;
        pass.set_viewport(bx, by, bw, bh, 0.0, 1.0);
        pass.set_scissor_rect(x, y, width, height);

        // Sky backdrop first, depth-transparent
        pass.set_pipeline(&self.sky_pipeline);
        pass.draw(0..3, 0..1);

        // Ground plane
        pass.set_pipeline(&self.scene_pipeline);
        pass.set_bind_group(0, &self.ground_globals.bind_group, &[]);
        pass.set_vertex_buffer(0, self.ground.vertices.slice(..));
        pass.set_index_buffer(self.ground.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.ground.index_count, 0, 0..1);

        if self.show_mesh {
            if let Some(model) = &self.model {
                pass.set_bind_group(0, &self.model_globals.bind_group, &[]);
                pass.set_vertex_buffer(0, model.geometry.vertices.slice(..));
                pass.set_index_buffer(model.geometry.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..model.geometry.index_count, 0, 0..1);
            }
        } else {
            pass.set_pipeline(&self.line_pipeline);
            pass.set_bind_group(0, &self.model_globals.bind_group, &[]);
            pass.set_vertex_buffer(0, self.cube.vertices.slice(..));
            pass.set_index_buffer(self.cube.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.cube.index_count, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_layout_matches_wgsl() {
        // 2 mat4x4 + 4 vec4 = 192 bytes, the size the shader expects
        assert_eq!(std::mem::size_of::<Globals>(), 192);
    }

    #[test]
    fn test_sun_direction_is_normalized() {
        let length =
            (SUN[0] * SUN[0] + SUN[1] * SUN[1] + SUN[2] * SUN[2]).sqrt();
        assert!((length - 1.0).abs() < 1e-3);
    }
}
