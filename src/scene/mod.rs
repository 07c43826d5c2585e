//! Imported scene description: an arena of nodes, meshes and materials,
//! as returned by the asset importers and before anything touches the GPU.

mod gltf_importer;
mod material;
mod obj_importer;
mod options;
mod post_process;
#[cfg(test)]
mod tests;

pub use material::{ImportedMaterial, MaterialTexture};
pub use options::ImportOptions;

use std::fmt;
use std::path::Path;

use crate::error::SceneImportError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node refers to meshes by index into `ImportedScene::meshes`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedNode {
    pub name: String,
    pub meshes: Vec<usize>,
    pub children: Vec<NodeId>,
}

/// Per-vertex attribute arrays plus a triangle list. Every non-empty
/// attribute array has one entry per position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneFlags {
    /// Set when the importer could not read part of the asset.
    pub incomplete: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ImportedScene {
    pub nodes: Vec<ImportedNode>,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
    pub root: Option<NodeId>,
    pub flags: SceneFlags,
    /// Post-processing the importer guarantees to have applied.
    pub applied: ImportOptions,
}

impl ImportedScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: ImportedNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: ImportedMesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_material(&mut self, material: ImportedMaterial) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn node(&self, id: NodeId) -> Option<&ImportedNode> {
        self.nodes.get(id.0)
    }

    pub fn root_node(&self) -> Option<&ImportedNode> {
        self.root.and_then(|id| self.node(id))
    }
}

/// Imports the asset at `path`, picking the importer from the file extension.
pub fn import(
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> Result<ImportedScene, SceneImportError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("");

    let scene = match extension.to_lowercase().as_str() {
        "glb" | "gltf" => gltf_importer::import(path, options),
        "obj" => obj_importer::import(path, options),
        _ => Err(SceneImportError::new(format!(
            "unsupported model format `{}` ({})",
            extension,
            path.display()
        ))),
    }?;

    log::debug!(
        "Imported {}: {} nodes, {} meshes, {} materials",
        path.display(),
        scene.nodes.len(),
        scene.meshes.len(),
        scene.materials.len()
    );
    Ok(scene)
}
