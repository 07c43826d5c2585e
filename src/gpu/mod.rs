//! The GPU boundary the loader and the draw dispatcher talk to.
//!
//! Resources are addressed through opaque integer handles so the model code
//! never holds API objects directly. `WgpuBackend` maps the handles onto
//! `wgpu` objects; `RecordingBackend` only records the command stream.

mod recording;
mod wgpu_backend;

pub use recording::{GpuCommand, RecordingBackend};
pub use wgpu_backend::{WgpuBackend, WgpuDrawTarget, TEXTURE_BIND_GROUP_BASE};

use std::collections::HashMap;
use std::fmt;

use crate::error::TextureUploadError;

macro_rules! handle {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle!(VertexArrayId);
handle!(BufferId);
handle!(TextureId);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// How texel values are interpreted when sampled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

/// One float attribute inside an interleaved vertex record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub offset: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: &'static [VertexAttribute],
}

/// Tightly packed RGBA8 pixels, ready for upload.
#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Resource creation and destruction. Every call must happen on the thread
/// that owns the rendering context.
pub trait GpuBackend {
    fn create_vertex_array(&mut self, label: &str) -> VertexArrayId;
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8], label: &str) -> BufferId;
    fn configure_vertex_array(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        layout: &VertexLayout,
    );
    /// Fails without side effects when the device cannot hold the image.
    fn create_texture_2d(
        &mut self,
        image: &ImageData,
        color_space: ColorSpace,
        label: &str,
    ) -> Result<TextureId, TextureUploadError>;

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);
    fn delete_buffer(&mut self, buffer: BufferId);
    fn delete_texture(&mut self, texture: TextureId);
}

/// Per-frame state changes and draw calls.
pub trait DrawTarget {
    fn set_active_texture_unit(&mut self, unit: u32);
    fn bind_texture(&mut self, unit: u32, texture: TextureId);
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId);
    fn draw_indexed(&mut self, index_count: u32);
}

/// The shading stage's sampler uniforms, addressed by name.
pub trait ShaderUniforms {
    fn set_sampler_unit(&mut self, name: &str, unit: u32);
}

/// Sampler name to texture unit table, in the order the names were set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SamplerBindings {
    assignments: Vec<(String, u32)>,
    latest: HashMap<String, u32>,
}

impl SamplerBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.latest.get(name).copied()
    }

    pub fn assignments(&self) -> &[(String, u32)] {
        &self.assignments
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
        self.latest.clear();
    }
}

impl ShaderUniforms for SamplerBindings {
    fn set_sampler_unit(&mut self, name: &str, unit: u32) {
        self.assignments.push((name.to_string(), unit));
        self.latest.insert(name.to_string(), unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_bindings_keep_order_and_latest_unit() {
        let mut bindings = SamplerBindings::new();
        bindings.set_sampler_unit("texture_diffuse1", 0);
        bindings.set_sampler_unit("texture_normal1", 1);
        bindings.set_sampler_unit("texture_diffuse1", 2);

        assert_eq!(bindings.get("texture_diffuse1"), Some(2));
        assert_eq!(bindings.get("texture_normal1"), Some(1));
        assert_eq!(bindings.get("texture_height1"), None);
        assert_eq!(bindings.assignments().len(), 3);
        assert_eq!(bindings.assignments()[0], ("texture_diffuse1".to_string(), 0));
    }

    #[test]
    fn handles_display_with_their_kind() {
        assert_eq!(TextureId(7).to_string(), "TextureId#7");
        assert_eq!(VertexArrayId(1).to_string(), "VertexArrayId#1");
    }
}
