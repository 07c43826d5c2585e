use crate::error::EmptyMeshError;
use crate::gpu::{BufferId, BufferKind, GpuBackend, VertexArrayId};

use super::vertex::Vertex;

/// GPU side of one mesh: a vertex array wired to its vertex and index buffers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertex_array: VertexArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub index_count: u32,
}

impl MeshBuffers {
    /// Uploads the vertices and indices once and binds them to a vertex array
    /// using `Vertex::LAYOUT`. Empty input is rejected before any GPU call,
    /// since zero-length buffers are undefined on the target APIs.
    pub fn build<G: GpuBackend + ?Sized>(
        gpu: &mut G,
        name: &str,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self, EmptyMeshError> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(EmptyMeshError {
                mesh: name.to_string(),
                vertex_count: vertices.len(),
                index_count: indices.len(),
            });
        }

        let vertex_array = gpu.create_vertex_array(&format!("{} Vertex Array", name));
        let vertex_buffer = gpu.create_buffer(
            BufferKind::Vertex,
            bytemuck::cast_slice(vertices),
            &format!("{} Vertex Buffer", name),
        );
        let index_buffer = gpu.create_buffer(
            BufferKind::Index,
            bytemuck::cast_slice(indices),
            &format!("{} Index Buffer", name),
        );
        gpu.configure_vertex_array(vertex_array, vertex_buffer, index_buffer, &Vertex::LAYOUT);

        Ok(Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    pub fn release<G: GpuBackend + ?Sized>(self, gpu: &mut G) {
        gpu.delete_vertex_array(self.vertex_array);
        gpu.delete_buffer(self.vertex_buffer);
        gpu.delete_buffer(self.index_buffer);
    }
}
