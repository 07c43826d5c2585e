use crate::model::TextureKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialTexture {
    pub kind: TextureKind,
    /// As written in the asset, relative to the asset's directory.
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportedMaterial {
    pub name: String,
    pub textures: Vec<MaterialTexture>,
}

impl ImportedMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: Vec::new(),
        }
    }

    pub fn with_texture(mut self, kind: TextureKind, path: impl Into<String>) -> Self {
        self.add_texture(kind, path);
        self
    }

    pub fn add_texture(&mut self, kind: TextureKind, path: impl Into<String>) {
        self.textures.push(MaterialTexture {
            kind,
            path: path.into(),
        });
    }

    pub fn textures_of(&self, kind: TextureKind) -> impl Iterator<Item = &str> + '_ {
        self.textures
            .iter()
            .filter(move |t| t.kind == kind)
            .map(|t| t.path.as_str())
    }
}
