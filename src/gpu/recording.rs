use std::collections::BTreeSet;

use crate::error::TextureUploadError;

use super::{
    BufferId, BufferKind, ColorSpace, DrawTarget, GpuBackend, ImageData, TextureId, VertexArrayId,
    VertexLayout,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GpuCommand {
    CreateVertexArray(VertexArrayId),
    CreateBuffer { buffer: BufferId, kind: BufferKind, size: usize },
    ConfigureVertexArray {
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        stride: u32,
        attributes: usize,
    },
    CreateTexture { texture: TextureId, width: u32, height: u32, color_space: ColorSpace },
    DeleteVertexArray(VertexArrayId),
    DeleteBuffer(BufferId),
    DeleteTexture(TextureId),
    ActiveTextureUnit(u32),
    BindTexture { unit: u32, texture: TextureId },
    BindVertexArray(VertexArrayId),
    DrawIndexed { index_count: u32 },
}

/// A backend that allocates handles and records every call instead of
/// talking to a device. Used for headless inspection of a load and its
/// draw stream.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<GpuCommand>,
    next_id: u32,
    live_vertex_arrays: BTreeSet<VertexArrayId>,
    live_buffers: BTreeSet<BufferId>,
    live_textures: BTreeSet<TextureId>,
    max_texture_dimension: Option<u32>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects textures wider or taller than `max`, like a device limit.
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = Some(max);
        self
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drains the recorded commands, keeping the live resource bookkeeping.
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn texture_uploads(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::CreateTexture { .. }))
            .count()
    }

    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::DrawIndexed { .. }))
            .count()
    }

    pub fn live_resources(&self) -> usize {
        self.live_vertex_arrays.len() + self.live_buffers.len() + self.live_textures.len()
    }

    fn next_handle(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GpuBackend for RecordingBackend {
    fn create_vertex_array(&mut self, _label: &str) -> VertexArrayId {
        let id = VertexArrayId(self.next_handle());
        self.live_vertex_arrays.insert(id);
        self.commands.push(GpuCommand::CreateVertexArray(id));
        id
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8], _label: &str) -> BufferId {
        let id = BufferId(self.next_handle());
        self.live_buffers.insert(id);
        self.commands.push(GpuCommand::CreateBuffer {
            buffer: id,
            kind,
            size: contents.len(),
        });
        id
    }

    fn configure_vertex_array(
        &mut self,
        vertex_array: VertexArrayId,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        layout: &VertexLayout,
    ) {
        self.commands.push(GpuCommand::ConfigureVertexArray {
            vertex_array,
            vertex_buffer,
            index_buffer,
            stride: layout.stride,
            attributes: layout.attributes.len(),
        });
    }

    fn create_texture_2d(
        &mut self,
        image: &ImageData,
        color_space: ColorSpace,
        _label: &str,
    ) -> Result<TextureId, TextureUploadError> {
        if let Some(max_dimension) = self.max_texture_dimension {
            if image.width > max_dimension || image.height > max_dimension {
                return Err(TextureUploadError {
                    width: image.width,
                    height: image.height,
                    max_dimension,
                });
            }
        }

        let id = TextureId(self.next_handle());
        self.live_textures.insert(id);
        self.commands.push(GpuCommand::CreateTexture {
            texture: id,
            width: image.width,
            height: image.height,
            color_space,
        });
        Ok(id)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if !self.live_vertex_arrays.remove(&vertex_array) {
            log::warn!("Deleting unknown or already deleted {}", vertex_array);
        }
        self.commands.push(GpuCommand::DeleteVertexArray(vertex_array));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if !self.live_buffers.remove(&buffer) {
            log::warn!("Deleting unknown or already deleted {}", buffer);
        }
        self.commands.push(GpuCommand::DeleteBuffer(buffer));
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if !self.live_textures.remove(&texture) {
            log::warn!("Deleting unknown or already deleted {}", texture);
        }
        self.commands.push(GpuCommand::DeleteTexture(texture));
    }
}

impl DrawTarget for RecordingBackend {
    fn set_active_texture_unit(&mut self, unit: u32) {
        self.commands.push(GpuCommand::ActiveTextureUnit(unit));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.commands.push(GpuCommand::BindTexture { unit, texture });
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.commands.push(GpuCommand::BindVertexArray(vertex_array));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.commands.push(GpuCommand::DrawIndexed { index_count });
    }
}
