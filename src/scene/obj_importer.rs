use std::path::Path;

use crate::error::SceneImportError;
use crate::model::TextureKind;

use super::{
    post_process, ImportOptions, ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene,
};

pub(super) fn import(
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportedScene, SceneImportError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: options.triangulate,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| {
        SceneImportError::with_source(format!("failed to read OBJ {}", path.display()), e)
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::warn!("No usable MTL file for {}: {}", path.display(), err);
        Vec::new()
    });

    let mut scene = ImportedScene {
        applied: *options,
        ..Default::default()
    };

    for material in &materials {
        scene.materials.push(load_material(material));
    }

    let mut children = Vec::with_capacity(models.len());
    for model in &models {
        let mesh = &model.mesh;
        if mesh.face_arities.iter().any(|&arity| arity != 3) {
            log::warn!("Skipping untriangulated object `{}`", model.name);
            continue;
        }

        let mut imported = ImportedMesh {
            name: model.name.clone(),
            positions: mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect(),
            normals: mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect(),
            tex_coords: mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect(),
            indices: mesh.indices.clone(),
            material: mesh.material_id.filter(|&id| id < scene.materials.len()),
            ..Default::default()
        };
        post_process::apply(&mut imported, options, None)?;

        let mesh_index = scene.add_mesh(imported);
        children.push(scene.add_node(ImportedNode {
            name: model.name.clone(),
            meshes: vec![mesh_index],
            children: Vec::new(),
        }));
    }

    let root_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("root")
        .to_string();
    let root = scene.add_node(ImportedNode {
        name: root_name,
        meshes: Vec::new(),
        children,
    });
    scene.root = Some(root);

    Ok(scene)
}

// map_Bump carries the normal map and map_Ka the height map, the usual
// convention for OBJ exports of normal-mapped models.
fn load_material(material: &tobj::Material) -> ImportedMaterial {
    let mut imported = ImportedMaterial::new(material.name.clone());
    let slots = [
        (TextureKind::Diffuse, &material.diffuse_texture),
        (TextureKind::Specular, &material.specular_texture),
        (TextureKind::Normal, &material.normal_texture),
        (TextureKind::Height, &material.ambient_texture),
    ];
    for (kind, texture) in slots {
        if let Some(texture) = texture.as_deref().filter(|t| !t.is_empty()) {
            imported.add_texture(kind, texture);
        }
    }
    imported
}
