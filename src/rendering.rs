//! Rendering system with wgpu pipeline and shader management.
//!
//! This is the backend the scheduler hands each finished frame to. It owns
//! GPU copies of meshes, per-entity uniforms and the camera feed texture,
//! and draws whatever is in the scene every call.

mod mesh;

pub use mesh::{MeshData, Vertex};

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::Camera;
use crate::scene::{names, Entity, EntityId, Material, Scene, Shape};
use crate::scheduler::RenderFrame;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Failures while creating the GPU context
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Uniform buffer shared by every material variant
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct EntityUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub light_dir: [f32; 4],
    pub ego_pos: [f32; 4],
    pub ego_color: [f32; 4],
    /// time, user_dist, camera_opacity, distortion
    pub params: [f32; 4],
    /// material, ego_radius, has_texture, unused
    pub extra: [f32; 4],
}

impl EntityUniforms {
    /// Pack an entity's transform and material parameters
    pub fn from_entity(entity: &Entity, camera: &Camera) -> Self {
        let p = &entity.params;
        let scalar = |name: &str| p.scalar(name).unwrap_or(0.0);
        let vec4 = |name: &str| p.vec3(name).unwrap_or(Vec3::ZERO).extend(0.0).to_array();

        let material = match entity.material {
            Material::Floor => 0.0,
            Material::Primary => 1.0,
            Material::Id => 2.0,
            Material::Superego => 3.0,
        };

        Self {
            model: entity.model_matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix().to_cols_array_2d(),
            color: p
                .vec3(names::COLOR)
                .map_or(Vec4::ONE, |c| c.extend(1.0))
                .to_array(),
            light_dir: vec4(names::LIGHT_DIR),
            ego_pos: vec4(names::EGO_POS),
            ego_color: vec4(names::EGO_COLOR),
            params: [
                scalar(names::TIME),
                scalar(names::USER_DIST),
                scalar(names::CAMERA_OPACITY),
                scalar(names::DISTORTION),
            ],
            extra: [
                material,
                scalar(names::EGO_RADIUS),
                if entity.texture.is_some() { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

struct GpuMesh {
    shape: Shape,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct EntityBinding {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Camera feed texture and the version of the frame last uploaded
struct FeedTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
    uploaded_version: u64,
}

/// Rendering system managing wgpu device, pipeline, and buffers
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    placeholder_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    meshes: Vec<GpuMesh>,
    bindings: HashMap<EntityId, EntityBinding>,
    feed: Option<FeedTexture>,
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Entity Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Feed Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Feed Sampler"),
            address_mode_u: wgpu::AddressMode::MirrorRepeat,
            address_mode_v: wgpu::AddressMode::MirrorRepeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // 1x1 white texture bound for bodies without a feed
        let placeholder = create_feed_texture(&device, 1, 1);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &placeholder,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255, 255, 255, 255],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let placeholder_bind_group =
            create_texture_bind_group(&device, &texture_layout, &placeholder, &sampler);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Floor and the feed body are both double-sided
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_view = create_depth_view(&device, config.width, config.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_layout,
            texture_layout,
            sampler,
            placeholder_bind_group,
            depth_view,
            meshes: Vec::new(),
            bindings: HashMap::new(),
            feed: None,
        })
    }

    /// Reconfigure the surface for a new window size (pixels)
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, width, height);
    }

    /// Index of the GPU mesh for `shape`, uploading it on first use
    fn mesh_index(&mut self, shape: &Shape) -> usize {
        if let Some(i) = self.meshes.iter().position(|m| m.shape == *shape) {
            return i;
        }
        let data = MeshData::for_shape(shape);
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.meshes.push(GpuMesh {
            shape: *shape,
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        });
        self.meshes.len() - 1
    }

    /// Write an entity's uniforms, creating its buffer on first use
    fn write_uniforms(&mut self, id: EntityId, uniforms: &EntityUniforms) {
        let binding = self.bindings.entry(id).or_insert_with(|| {
            let uniform_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Entity Uniform Buffer"),
                    contents: bytemuck::cast_slice(&[*uniforms]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Entity Uniform Bind Group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
            EntityBinding {
                uniform_buffer,
                bind_group,
            }
        });
        self.queue.write_buffer(
            &binding.uniform_buffer,
            0,
            bytemuck::cast_slice(&[*uniforms]),
        );
    }

    /// Upload the latest camera frame if the entity's texture was marked stale
    fn refresh_feed(&mut self, entity: &Entity) {
        let Some(texture) = entity.texture.as_ref() else {
            return;
        };
        if self
            .feed
            .as_ref()
            .is_some_and(|f| f.uploaded_version == texture.version())
        {
            return;
        }
        let Some(frame) = texture.frames().latest() else {
            return;
        };
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        if self.feed.as_ref().map(|f| f.size) != Some((width, height)) {
            let gpu_texture = create_feed_texture(&self.device, width, height);
            let bind_group = create_texture_bind_group(
                &self.device,
                &self.texture_layout,
                &gpu_texture,
                &self.sampler,
            );
            self.feed = Some(FeedTexture {
                texture: gpu_texture,
                bind_group,
                size: (width, height),
                uploaded_version: 0,
            });
        }

        if let Some(feed) = self.feed.as_mut() {
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &feed.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                frame.as_raw(),
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
            feed.uploaded_version = texture.version();
        }
    }

    /// Draw every entity in the scene
    fn draw(&mut self, scene: &Scene, camera: &Camera) -> Result<(), wgpu::SurfaceError> {
        // Drop GPU state of entities that left the scene
        self.bindings.retain(|id, _| scene.contains(*id));

        let mut draws = Vec::with_capacity(scene.len());
        for (id, entity) in scene.iter() {
            self.refresh_feed(entity);
            self.write_uniforms(id, &EntityUniforms::from_entity(entity, camera));
            let mesh = self.mesh_index(&entity.shape);
            draws.push((id, mesh, entity.texture.is_some()));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            for (id, mesh, textured) in draws {
                let (Some(binding), Some(mesh)) = (self.bindings.get(&id), self.meshes.get(mesh))
                else {
                    continue;
                };
                let texture_group = match (&self.feed, textured) {
                    (Some(feed), true) => &feed.bind_group,
                    _ => &self.placeholder_bind_group,
                };
                render_pass.set_bind_group(0, &binding.bind_group, &[]);
                render_pass.set_bind_group(1, texture_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl RenderFrame for RenderSystem {
    fn render_frame(&mut self, scene: &Scene, camera: &Camera) {
        match self.draw(scene, camera) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
            }
            Err(e) => log::error!("Render error: {:?}", e),
        }
    }
}

fn create_feed_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Feed Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn create_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &wgpu::Texture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Feed Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies;
    use crate::params::{FeedConfig, RenderConfig, SceneLayout};
    use crate::scene::FrameSlot;

    #[test]
    fn test_uniform_layout_matches_shader() {
        // 3 mat4 + 6 vec4
        assert_eq!(std::mem::size_of::<EntityUniforms>(), 3 * 64 + 6 * 16);
    }

    #[test]
    fn test_uniforms_from_camera_fed_body() {
        let camera = Camera::new(&RenderConfig::default());
        let mut entity = bodies::camera_fed_primary(
            &SceneLayout::default(),
            &FeedConfig::default(),
            FrameSlot::new(),
        );
        entity.params.set_scalar(names::TIME, 2.5);

        let u = EntityUniforms::from_entity(&entity, &camera);
        assert_eq!(u.params, [2.5, 0.0, 0.25, 0.02]);
        assert_eq!(u.extra[0], 1.0);
        assert_eq!(u.extra[2], 1.0);
        assert_eq!(u.color[3], 1.0);
    }

    #[test]
    fn test_uniforms_from_floor() {
        let camera = Camera::new(&RenderConfig::default());
        let entity = bodies::floor(&SceneLayout::default());
        let u = EntityUniforms::from_entity(&entity, &camera);

        assert_eq!(u.extra[0], 0.0);
        assert_eq!(u.extra[1], 10.0);
        assert_eq!(u.extra[2], 0.0);
        // Floor sits one meter below the origin
        assert_eq!(u.model[3][1], -1.0);
    }
}
