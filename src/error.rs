use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scene::NodeId;

/// The asset could not be imported, or the import did not meet the
/// post-conditions the vertex layout depends on.
#[derive(Debug, Error)]
#[error("scene import failed: {reason}")]
pub struct SceneImportError {
    reason: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SceneImportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn with_source(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A mesh reached the buffer builder without geometry.
#[derive(Debug, Error)]
#[error("mesh `{mesh}` is empty ({vertex_count} vertices, {index_count} indices)")]
pub struct EmptyMeshError {
    pub mesh: String,
    pub vertex_count: usize,
    pub index_count: usize,
}

/// The device refused a texture, e.g. one larger than its dimension limit.
#[derive(Debug, Error)]
#[error("{width}x{height} texture exceeds the device limit of {max_dimension} texels per side")]
pub struct TextureUploadError {
    pub width: u32,
    pub height: u32,
    pub max_dimension: u32,
}

/// An image file could not be read, decoded or uploaded. Recoverable: the
/// texture is skipped and the mesh keeps loading.
#[derive(Debug, Error)]
pub enum TextureLoadError {
    #[error("failed to decode texture {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to upload texture {}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: TextureUploadError,
    },
}

impl TextureLoadError {
    pub fn path(&self) -> &Path {
        match self {
            TextureLoadError::Decode { path, .. } | TextureLoadError::Upload { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
#[error("scene graph contains a cycle through node {node}")]
pub struct CyclicSceneGraphError {
    pub node: NodeId,
}

/// Fatal errors of a model load. No partially built model survives any of these.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    SceneImport(#[from] SceneImportError),
    #[error(transparent)]
    EmptyMesh(#[from] EmptyMeshError),
    #[error(transparent)]
    CyclicSceneGraph(#[from] CyclicSceneGraphError),
}
