use std::mem::{offset_of, size_of};

use crate::gpu::{VertexAttribute, VertexLayout};

/// Interleaved vertex record shared with the shading stage.
///
/// `repr(C)` over `f32` arrays only, so the record has no padding and the
/// byte offsets below are exact. The stride is asserted at compile time.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

pub const VERTEX_STRIDE: usize = 56;

const _: () = assert!(size_of::<Vertex>() == VERTEX_STRIDE);

impl Vertex {
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: VERTEX_STRIDE as u32,
        attributes: &[
            VertexAttribute {
                location: 0,
                components: 3,
                offset: offset_of!(Vertex, position) as u32,
            },
            VertexAttribute {
                location: 1,
                components: 3,
                offset: offset_of!(Vertex, normal) as u32,
            },
            VertexAttribute {
                location: 2,
                components: 2,
                offset: offset_of!(Vertex, tex_coords) as u32,
            },
            VertexAttribute {
                location: 3,
                components: 3,
                offset: offset_of!(Vertex, tangent) as u32,
            },
            VertexAttribute {
                location: 4,
                components: 3,
                offset: offset_of!(Vertex, bitangent) as u32,
            },
        ],
    };

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,  // position
        1 => Float32x3,  // normal
        2 => Float32x2,  // tex_coords
        3 => Float32x3,  // tangent
        4 => Float32x3,  // bitangent
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
