use std::path::Path;

use gltf::mesh::Mode;

use crate::error::SceneImportError;
use crate::model::TextureKind;

use super::{
    post_process, ImportOptions, ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene,
    NodeId, SceneFlags,
};

pub(super) fn import(
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportedScene, SceneImportError> {
    // Images are not loaded here; a missing texture file fails later, per texture.
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(|e| {
        SceneImportError::with_source(format!("failed to read glTF {}", path.display()), e)
    })?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(|e| {
        SceneImportError::with_source(format!("failed to load buffers of {}", path.display()), e)
    })?;

    let mut scene = ImportedScene {
        applied: *options,
        ..Default::default()
    };

    for material in document.materials() {
        scene.materials.push(load_material(&material));
    }

    // glTF meshes own several primitives; each primitive becomes one imported mesh.
    let mut primitives_of_mesh = Vec::new();
    for mesh in document.meshes() {
        let mut produced = Vec::new();
        for primitive in mesh.primitives() {
            let imported =
                load_primitive(&mesh, &primitive, &buffers, options, &mut scene.flags)?;
            if let Some(imported) = imported {
                produced.push(scene.add_mesh(imported));
            }
        }
        primitives_of_mesh.push(produced);
    }

    for node in document.nodes() {
        scene.nodes.push(ImportedNode {
            name: node.name().unwrap_or("").to_string(),
            meshes: node
                .mesh()
                .map(|mesh| primitives_of_mesh[mesh.index()].clone())
                .unwrap_or_default(),
            children: node.children().map(|child| NodeId(child.index())).collect(),
        });
    }

    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(gltf_scene) => {
            let root = scene.add_node(ImportedNode {
                name: gltf_scene.name().unwrap_or("root").to_string(),
                meshes: Vec::new(),
                children: gltf_scene.nodes().map(|node| NodeId(node.index())).collect(),
            });
            scene.root = Some(root);
        }
        None => {
            log::warn!("{} defines no scene", path.display());
            scene.flags.incomplete = true;
        }
    }

    Ok(scene)
}

fn load_material(material: &gltf::Material) -> ImportedMaterial {
    let mut imported = ImportedMaterial::new(material.name().unwrap_or(""));
    let pbr = material.pbr_metallic_roughness();

    if let Some(info) = pbr.base_color_texture() {
        add_texture(&mut imported, TextureKind::Diffuse, &info.texture());
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        add_texture(&mut imported, TextureKind::Specular, &info.texture());
    }
    if let Some(normal) = material.normal_texture() {
        add_texture(&mut imported, TextureKind::Normal, &normal.texture());
    }
    imported
}

fn add_texture(material: &mut ImportedMaterial, kind: TextureKind, texture: &gltf::Texture) {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
            // Relative URIs are percent-encoded.
            match urlencoding::decode(uri) {
                Ok(path) => material.add_texture(kind, path.into_owned()),
                Err(err) => log::warn!(
                    "Material `{}`: {} image URI `{}` does not decode to UTF-8 ({}); skipped",
                    material.name,
                    kind,
                    uri,
                    err
                ),
            }
        }
        _ => log::warn!(
            "Material `{}` embeds its {} image, only file textures are supported; skipped",
            material.name,
            kind
        ),
    }
}

fn load_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    options: &ImportOptions,
    flags: &mut SceneFlags,
) -> Result<Option<ImportedMesh>, SceneImportError> {
    let name = match mesh.name() {
        Some(name) => format!("{}.{}", name, primitive.index()),
        None => format!("mesh{}.{}", mesh.index(), primitive.index()),
    };
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let Some(positions) = reader.read_positions() else {
        log::warn!("Primitive `{}` has no positions", name);
        flags.incomplete = true;
        return Ok(None);
    };
    let positions: Vec<[f32; 3]> = positions.collect();

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let indices = match primitive.mode() {
        Mode::Triangles => indices,
        Mode::TriangleStrip if options.triangulate => strip_to_list(&indices),
        Mode::TriangleFan if options.triangulate => fan_to_list(&indices),
        mode => {
            log::warn!("Skipping primitive `{}` drawn as {:?}", name, mode);
            return Ok(None);
        }
    };

    let supplied_tangents: Option<Vec<[f32; 4]>> =
        reader.read_tangents().map(|iter| iter.collect());
    let mut imported = ImportedMesh {
        name,
        normals: reader.read_normals().map(|iter| iter.collect()).unwrap_or_default(),
        tex_coords: reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_default(),
        positions,
        indices,
        material: primitive.material().index(),
        ..Default::default()
    };

    post_process::apply(&mut imported, options, supplied_tangents.as_deref())?;
    Ok(Some(imported))
}

fn strip_to_list(strip: &[u32]) -> Vec<u32> {
    let mut list = Vec::with_capacity(strip.len().saturating_sub(2) * 3);
    for (i, window) in strip.windows(3).enumerate() {
        // Every other triangle flips to keep a consistent winding.
        if i % 2 == 0 {
            list.extend_from_slice(&[window[0], window[1], window[2]]);
        } else {
            list.extend_from_slice(&[window[1], window[0], window[2]]);
        }
    }
    list
}

fn fan_to_list(fan: &[u32]) -> Vec<u32> {
    let Some((&center, rest)) = fan.split_first() else {
        return Vec::new();
    };
    rest.windows(2)
        .flat_map(|pair| [center, pair[0], pair[1]])
        .collect()
}
