//! Loads glTF and OBJ scenes into GPU-ready meshes with a fixed 56-byte
//! vertex layout, uploads each texture once per path, and replays the
//! per-frame draw sequence against a GPU backend.

pub mod error;
pub mod gpu;
pub mod model;
pub mod scene;

pub use error::{
    CyclicSceneGraphError, EmptyMeshError, ModelError, SceneImportError, TextureLoadError,
    TextureUploadError,
};
pub use gpu::{
    DrawTarget, GpuBackend, RecordingBackend, SamplerBindings, ShaderUniforms, WgpuBackend,
};
pub use model::{Mesh, Model, TextureKind, TextureRecord, Vertex};
pub use scene::{ImportOptions, ImportedScene};
