use std::error::Error;
use std::path::Path;
use std::rc::Rc;

use crate::error::EmptyMeshError;
use crate::gpu::{DrawTarget, GpuBackend, ShaderUniforms};
use crate::scene::{ImportedMaterial, ImportedMesh};

use super::buffers::MeshBuffers;
use super::texture::{TextureCache, TextureKind, TextureRecord};
use super::vertex::Vertex;

/// One entry of a mesh's texture list: the slot the material asked for and
/// the shared record that fills it.
#[derive(Clone, Debug)]
pub struct MeshTexture {
    pub kind: TextureKind,
    pub record: Rc<TextureRecord>,
}

/// A mesh ready for drawing. Its GPU handles are released together with the
/// owning `Model`.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<MeshTexture>,
    pub buffers: MeshBuffers,
}

impl Mesh {
    /// Builds the interleaved vertices, uploads them, then resolves the
    /// material's textures through `cache`. Geometry failures are fatal;
    /// texture failures are logged and the slot is left out.
    pub fn assemble<G: GpuBackend + ?Sized>(
        gpu: &mut G,
        cache: &mut TextureCache,
        directory: &Path,
        imported: &ImportedMesh,
        material: Option<&ImportedMaterial>,
    ) -> Result<Self, EmptyMeshError> {
        let vertices = interleave(imported);
        let buffers = MeshBuffers::build(gpu, &imported.name, &vertices, &imported.indices)?;

        let mut textures = Vec::new();
        if let Some(material) = material {
            for kind in TextureKind::ALL {
                for texture_path in material.textures_of(kind) {
                    let path = directory.join(texture_path);
                    match cache.resolve(gpu, &path, kind) {
                        Ok(record) => textures.push(MeshTexture { kind, record }),
                        Err(err) => log::warn!(
                            "Mesh `{}`: skipping {} texture: {} ({})",
                            imported.name,
                            kind,
                            err,
                            err.source().map(ToString::to_string).unwrap_or_default()
                        ),
                    }
                }
            }
        }

        log::debug!(
            "Assembled mesh `{}`: {} vertices, {} indices, {} textures",
            imported.name,
            vertices.len(),
            imported.indices.len(),
            textures.len()
        );

        Ok(Self {
            name: imported.name.clone(),
            vertices,
            indices: imported.indices.clone(),
            textures,
            buffers,
        })
    }

    /// Binds each texture to the unit matching its list position, names the
    /// sampler `texture_<kind><n>` with `n` counted per kind from 1, then
    /// issues one indexed draw. Leaves texture unit 0 active.
    pub fn draw<T, S>(&self, target: &mut T, shader: &mut S)
    where
        T: DrawTarget + ?Sized,
        S: ShaderUniforms + ?Sized,
    {
        let mut counters = [0u32; TextureKind::ALL.len()];
        for (unit, texture) in self.textures.iter().enumerate() {
            let unit = unit as u32;
            target.set_active_texture_unit(unit);

            let counter = &mut counters[texture.kind as usize];
            *counter += 1;
            shader.set_sampler_unit(&format!("{}{}", texture.kind.uniform_prefix(), counter), unit);
            target.bind_texture(unit, texture.record.handle);
        }

        target.bind_vertex_array(self.buffers.vertex_array);
        target.draw_indexed(self.buffers.index_count);
        target.set_active_texture_unit(0);
    }

    pub(crate) fn release<G: GpuBackend + ?Sized>(self, gpu: &mut G) {
        self.buffers.release(gpu);
    }
}

fn interleave(mesh: &ImportedMesh) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: mesh.normals.get(i).copied().unwrap_or_default(),
            tex_coords: mesh.tex_coords.get(i).copied().unwrap_or_default(),
            tangent: mesh.tangents.get(i).copied().unwrap_or_default(),
            bitangent: mesh.bitangents.get(i).copied().unwrap_or_default(),
        })
        .collect()
}
