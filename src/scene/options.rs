/// Post-processing requested from an importer.
///
/// The model loader needs all three: triangle lists, UVs with a bottom-left
/// origin, and per-vertex tangent/bitangent. Any other combination is only
/// useful for inspecting the imported data directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    pub triangulate: bool,
    pub flip_uvs: bool,
    pub calc_tangent_space: bool,
}

impl ImportOptions {
    pub const REQUIRED: ImportOptions = ImportOptions {
        triangulate: true,
        flip_uvs: true,
        calc_tangent_space: true,
    };

    pub fn is_compatible(&self) -> bool {
        self.missing().is_empty()
    }

    /// Names of the required steps this set leaves out.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.triangulate {
            missing.push("triangulate");
        }
        if !self.flip_uvs {
            missing.push("flip_uvs");
        }
        if !self.calc_tangent_space {
            missing.push("calc_tangent_space");
        }
        missing
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::REQUIRED
    }
}
