mod buffers;
mod loader;
mod mesh;
mod texture;
mod vertex;

pub use buffers::MeshBuffers;
pub use loader::Model;
pub use mesh::{Mesh, MeshTexture};
pub use texture::{decode_texture, TextureCache, TextureKind, TextureRecord};
pub use vertex::{Vertex, VERTEX_STRIDE};
