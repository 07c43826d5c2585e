use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::error::TextureUploadError;

use super::{
    BufferId, BufferKind, ColorSpace, DrawTarget, GpuBackend, ImageData, TextureId, VertexArrayId,
    VertexLayout,
};

/// Texture unit `n` is bound at bind group `TEXTURE_BIND_GROUP_BASE + n`.
/// Group 0 is left to the caller for camera and per-frame uniforms.
pub const TEXTURE_BIND_GROUP_BASE: u32 = 1;

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

// wgpu has no vertex array objects; the pairing is kept here and applied at bind time.
#[derive(Default)]
struct VertexArray {
    vertex_buffer: Option<BufferId>,
    index_buffer: Option<BufferId>,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    vertex_arrays: HashMap<VertexArrayId, VertexArray>,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    textures: HashMap<TextureId, GpuTexture>,
    next_id: u32,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Unit Bind Group Layout"),
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

        Self {
            device,
            queue,
            texture_bind_group_layout: layout,
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Layout of every texture unit's bind group, for building pipeline layouts.
    pub fn texture_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_bind_group_layout
    }

    pub fn max_texture_units(&self) -> u32 {
        self.device
            .limits()
            .max_bind_groups
            .saturating_sub(TEXTURE_BIND_GROUP_BASE)
    }

    pub fn draw_target<'a, 'enc>(
        &'a self,
        pass: &'a mut wgpu::RenderPass<'enc>,
    ) -> WgpuDrawTarget<'a, 'enc> {
        WgpuDrawTarget {
            backend: self,
            pass,
            active_unit: 0,
            max_units: self.max_texture_units(),
        }
    }

    fn next_handle(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GpuBackend for WgpuBackend {
    fn create_vertex_array(&mut self, _label: &str) -> VertexArrayId {
        let id = VertexArrayId(self.next_handle());
        self.vertex_arrays.insert(id, VertexArray::default());
        id
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8], label: &str) -> BufferId {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: usage | wgpu::BufferUsages::COPY_SRC,
        });

        let id = BufferId(self.next_handle());
        self.buffers.insert(id, buffer);
        id
    }

    fn configure_vertex_array(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        layout: &VertexLayout,
    ) {
        // The attribute table itself lives in the render pipeline (`Vertex::desc`).
        log::trace!(
            "{} uses stride {} with {} attributes",
            vertex_array,
            layout.stride,
            layout.attributes.len()
        );
        match self.vertex_arrays.get_mut(&vertex_array) {
            Some(entry) => {
                entry.vertex_buffer = Some(vertex_buffer);
                entry.index_buffer = Some(index_buffer);
            }
            None => log::warn!("Configuring unknown {}", vertex_array),
        }
    }

    fn create_texture_2d(
        &mut self,
        image: &ImageData,
        color_space: ColorSpace,
        label: &str,
    ) -> Result<TextureId, TextureUploadError> {
        // Oversized textures are a validation error; the default handler panics on those.
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        if image.width > max_dimension || image.height > max_dimension {
            return Err(TextureUploadError {
                width: image.width,
                height: image.height,
                max_dimension,
            });
        }

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let format = match color_space {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let bytes_per_row = image.width * 4;
        let aligned_bytes_per_row = (bytes_per_row + 255) & !255;
        let mut aligned_data = vec![0u8; aligned_bytes_per_row as usize * image.height as usize];

        for y in 0..image.height {
            let src_start = (y * bytes_per_row) as usize;
            let src_end = src_start + bytes_per_row as usize;
            let dst_start = (y * aligned_bytes_per_row) as usize;
            let dst_end = dst_start + bytes_per_row as usize;

            if src_end <= image.pixels.len() {
                aligned_data[dst_start..dst_end].copy_from_slice(&image.pixels[src_start..src_end]);
            }
        }

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &aligned_data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(aligned_bytes_per_row),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let id = TextureId(self.next_handle());
        self.textures.insert(id, GpuTexture { texture, bind_group });
        Ok(id)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if self.vertex_arrays.remove(&vertex_array).is_none() {
            log::warn!("Deleting unknown {}", vertex_array);
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        match self.buffers.remove(&buffer) {
            Some(buffer) => buffer.destroy(),
            None => log::warn!("Deleting unknown {}", buffer),
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        match self.textures.remove(&texture) {
            Some(entry) => entry.texture.destroy(),
            None => log::warn!("Deleting unknown {}", texture),
        }
    }
}

/// Records draw-dispatch calls into an open render pass. The caller sets the
/// pipeline (built with `Vertex::desc()`) and group 0 beforehand.
pub struct WgpuDrawTarget<'a, 'enc> {
    backend: &'a WgpuBackend,
    pass: &'a mut wgpu::RenderPass<'enc>,
    active_unit: u32,
    max_units: u32,
}

impl WgpuDrawTarget<'_, '_> {
    pub fn active_texture_unit(&self) -> u32 {
        self.active_unit
    }
}

impl DrawTarget for WgpuDrawTarget<'_, '_> {
    fn set_active_texture_unit(&mut self, unit: u32) {
        self.active_unit = unit;
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        if unit >= self.max_units {
            log::warn!(
                "Texture unit {} exceeds the {} units this device supports, {} not bound",
                unit,
                self.max_units,
                texture
            );
            return;
        }
        match self.backend.textures.get(&texture) {
            Some(entry) => self
                .pass
                .set_bind_group(TEXTURE_BIND_GROUP_BASE + unit, &entry.bind_group, &[]),
            None => log::warn!("Binding unknown {}", texture),
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        let Some(entry) = self.backend.vertex_arrays.get(&vertex_array) else {
            log::warn!("Binding unknown {}", vertex_array);
            return;
        };
        let buffers = entry
            .vertex_buffer
            .zip(entry.index_buffer)
            .and_then(|(vb, ib)| {
                Some((self.backend.buffers.get(&vb)?, self.backend.buffers.get(&ib)?))
            });

        match buffers {
            Some((vertex_buffer, index_buffer)) => {
                self.pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                self.pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            }
            None => log::warn!("{} has no live buffers attached", vertex_array),
        }
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.pass.draw_indexed(0..index_count, 0, 0..1);
    }
}
