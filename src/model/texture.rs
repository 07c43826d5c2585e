use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::GenericImageView;

use crate::error::TextureLoadError;
use crate::gpu::{ColorSpace, GpuBackend, ImageData, TextureId};

/// Semantic slot a texture fills in a material.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    /// Slot order used when assembling a mesh's texture list.
    pub const ALL: [TextureKind; 4] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Normal,
        TextureKind::Height,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "diffuse",
            TextureKind::Specular => "specular",
            TextureKind::Normal => "normal",
            TextureKind::Height => "height",
        }
    }

    /// Sampler uniform prefix; the shader declares `<prefix><n>` with `n` from 1.
    pub fn uniform_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }

    pub fn color_space(self) -> ColorSpace {
        match self {
            TextureKind::Diffuse => ColorSpace::Srgb,
            _ => ColorSpace::Linear,
        }
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A texture living on the GPU, shared by every mesh that references its path.
#[derive(Debug, PartialEq, Eq)]
pub struct TextureRecord {
    pub handle: TextureId,
    /// Kind of the first reference that loaded it.
    pub kind: TextureKind,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Reads and decodes an image into RGBA8. Touches only the filesystem, so it
/// can run away from the thread that owns the GPU context.
pub fn decode_texture(path: &Path) -> Result<ImageData, TextureLoadError> {
    let img = image::open(path).map_err(|source| TextureLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = img.dimensions();

    Ok(ImageData {
        width,
        height,
        pixels: img.to_rgba8().into_raw(),
    })
}

/// Path-keyed texture table. Each path is decoded and uploaded at most once.
#[derive(Debug, Default)]
pub struct TextureCache {
    records: Vec<Rc<TextureRecord>>,
    by_path: HashMap<PathBuf, usize>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&Rc<TextureRecord>> {
        self.by_path.get(path).map(|&index| &self.records[index])
    }

    /// Records in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<TextureRecord>> {
        self.records.iter()
    }

    /// Returns the cached record for `path`, or decodes and uploads it.
    /// Failures are not cached, so a corrected file can be retried.
    pub fn resolve<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        path: &Path,
        kind: TextureKind,
    ) -> Result<Rc<TextureRecord>, TextureLoadError> {
        if let Some(record) = self.cached(path, kind) {
            return Ok(record);
        }

        let image = decode_texture(path)?;
        self.upload(gpu, path, kind, &image)
    }

    /// Uploads an image decoded elsewhere. If `path` is already cached the
    /// existing record is returned and nothing is uploaded. A rejected upload
    /// leaves the cache unchanged.
    pub fn upload<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        path: &Path,
        kind: TextureKind,
        image: &ImageData,
    ) -> Result<Rc<TextureRecord>, TextureLoadError> {
        if let Some(record) = self.cached(path, kind) {
            return Ok(record);
        }

        let handle = gpu
            .create_texture_2d(image, kind.color_space(), &path.display().to_string())
            .map_err(|source| TextureLoadError::Upload {
                path: path.to_path_buf(),
                source,
            })?;
        let record = Rc::new(TextureRecord {
            handle,
            kind,
            path: path.to_path_buf(),
            width: image.width,
            height: image.height,
        });
        log::debug!(
            "Uploaded {} texture {} ({}x{}) as {}",
            kind,
            path.display(),
            image.width,
            image.height,
            handle
        );

        self.by_path.insert(path.to_path_buf(), self.records.len());
        self.records.push(Rc::clone(&record));
        Ok(record)
    }

    // The first kind fixes the color space; a later kind needing the other one
    // still gets the shared record.
    fn cached(&self, path: &Path, kind: TextureKind) -> Option<Rc<TextureRecord>> {
        let record = self.get(path)?;
        log::trace!("Texture cache hit for {}", path.display());
        if record.kind.color_space() != kind.color_space() {
            log::warn!(
                "{} is cached as a {:?} {} texture; reusing it as {} without {:?} sampling",
                path.display(),
                record.kind.color_space(),
                record.kind,
                kind,
                kind.color_space()
            );
        }
        Some(Rc::clone(record))
    }

    /// Deletes every cached texture. Meshes still holding records must be
    /// released in the same teardown.
    pub fn release<G: GpuBackend + ?Sized>(self, gpu: &mut G) {
        for record in &self.records {
            gpu.delete_texture(record.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_prefixes_follow_shader_names() {
        let prefixes: Vec<_> = TextureKind::ALL.iter().map(|k| k.uniform_prefix()).collect();
        assert_eq!(
            prefixes,
            ["texture_diffuse", "texture_specular", "texture_normal", "texture_height"]
        );
    }

    #[test]
    fn only_diffuse_is_srgb() {
        assert_eq!(TextureKind::Diffuse.color_space(), ColorSpace::Srgb);
        assert_eq!(TextureKind::Normal.color_space(), ColorSpace::Linear);
        assert_eq!(TextureKind::Specular.color_space(), ColorSpace::Linear);
        assert_eq!(TextureKind::Height.color_space(), ColorSpace::Linear);
    }
}
