use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{CyclicSceneGraphError, ModelError, SceneImportError};
use crate::gpu::{DrawTarget, GpuBackend, ShaderUniforms};
use crate::scene::{self, ImportOptions, ImportedScene, NodeId};

use super::mesh::Mesh;
use super::texture::TextureCache;

/// A loaded scene flattened into draw order, plus the textures its meshes share.
///
/// The GPU handles live until [`Model::release`] hands them back to the
/// backend that created them. Dropping an unreleased model leaks them and
/// logs a warning.
#[derive(Debug)]
#[must_use = "a Model owns GPU handles that must be freed with `Model::release`"]
pub struct Model {
    directory: PathBuf,
    meshes: Vec<Mesh>,
    textures: TextureCache,
}

impl Model {
    /// An empty model whose texture references resolve against `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            meshes: Vec::new(),
            textures: TextureCache::new(),
        }
    }

    pub fn load<G: GpuBackend + ?Sized>(
        gpu: &mut G,
        path: impl AsRef<Path>,
    ) -> Result<Self, ModelError> {
        Self::load_with(gpu, path, &ImportOptions::default())
    }

    /// Imports the asset and builds every mesh. On any fatal error all GPU
    /// resources created so far are released and no model is returned.
    pub fn load_with<G: GpuBackend + ?Sized>(
        gpu: &mut G,
        path: impl AsRef<Path>,
        options: &ImportOptions,
    ) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !options.is_compatible() {
            return Err(SceneImportError::new(format!(
                "import options for {} leave out required post-processing: {}",
                path.display(),
                options.missing().join(", ")
            ))
            .into());
        }

        let scene = scene::import(path, options)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let model = Self::from_scene(gpu, &scene, directory)?;

        log::info!(
            "Loaded {}: {} meshes, {} textures",
            path.display(),
            model.meshes.len(),
            model.textures.len()
        );
        Ok(model)
    }

    /// Builds a model from an already imported scene, walking from its root.
    pub fn from_scene<G: GpuBackend + ?Sized>(
        gpu: &mut G,
        scene: &ImportedScene,
        directory: impl Into<PathBuf>,
    ) -> Result<Self, ModelError> {
        if scene.flags.incomplete {
            return Err(SceneImportError::new("importer flagged the scene as incomplete").into());
        }
        let Some(root) = scene.root else {
            return Err(SceneImportError::new("scene has no root node").into());
        };
        if !scene.applied.is_compatible() {
            return Err(SceneImportError::new(format!(
                "scene was imported without: {}",
                scene.applied.missing().join(", ")
            ))
            .into());
        }

        let mut model = Self::new(directory);
        match model.walk(gpu, scene, root) {
            Ok(()) => Ok(model),
            Err(err) => {
                log::debug!("Load failed, releasing {} partially built meshes", model.meshes.len());
                model.release(gpu);
                Err(err)
            }
        }
    }

    /// Depth-first walk from `node`: the node's meshes in order, then each
    /// child. Every visited mesh reference is assembled and appended, so a
    /// mesh shared by two nodes appears twice.
    pub fn walk<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        scene: &ImportedScene,
        node: NodeId,
    ) -> Result<(), ModelError> {
        let mut ancestors = HashSet::new();
        self.walk_node(gpu, scene, node, &mut ancestors)
    }

    fn walk_node<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        scene: &ImportedScene,
        id: NodeId,
        ancestors: &mut HashSet<NodeId>,
    ) -> Result<(), ModelError> {
        let node = scene
            .node(id)
            .ok_or_else(|| SceneImportError::new(format!("node {} does not exist", id)))?;
        if !ancestors.insert(id) {
            return Err(CyclicSceneGraphError { node: id }.into());
        }

        for &mesh_index in &node.meshes {
            let imported = scene.meshes.get(mesh_index).ok_or_else(|| {
                SceneImportError::new(format!(
                    "node {} references mesh {} but the scene has {}",
                    id,
                    mesh_index,
                    scene.meshes.len()
                ))
            })?;
            let material = imported.material.and_then(|index| scene.materials.get(index));
            let mesh =
                Mesh::assemble(gpu, &mut self.textures, &self.directory, imported, material)?;
            self.meshes.push(mesh);
        }

        for &child in &node.children {
            self.walk_node(gpu, scene, child, ancestors)?;
        }

        ancestors.remove(&id);
        Ok(())
    }

    /// Issues the draw sequence for every mesh in list order.
    pub fn draw<T, S>(&self, target: &mut T, shader: &mut S)
    where
        T: DrawTarget + ?Sized,
        S: ShaderUniforms + ?Sized,
    {
        for mesh in &self.meshes {
            mesh.draw(target, shader);
        }
    }

    /// Releases every mesh buffer and every cached texture in one teardown.
    pub fn release<G: GpuBackend + ?Sized>(mut self, gpu: &mut G) {
        for mesh in std::mem::take(&mut self.meshes) {
            mesh.release(gpu);
        }
        std::mem::take(&mut self.textures).release(gpu);
    }

    /// GPU handles this model still owns: a vertex array and two buffers per
    /// mesh, plus one per cached texture.
    pub fn gpu_handles(&self) -> usize {
        self.meshes.len() * 3 + self.textures.len()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    /// Axis-aligned bounds over all vertices, `None` for an empty model.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut vertices = self.meshes.iter().flat_map(|mesh| mesh.vertices.iter());
        let first = vertices.next()?;
        let mut min = first.position;
        let mut max = first.position;

        for vertex in vertices {
            for i in 0..3 {
                min[i] = min[i].min(vertex.position[i]);
                max[i] = max[i].max(vertex.position[i]);
            }
        }
        Some((min, max))
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        let handles = self.gpu_handles();
        if handles > 0 {
            log::warn!(
                "Model from {} dropped without release, leaking {} GPU handles",
                self.directory.display(),
                handles
            );
        }
    }
}
