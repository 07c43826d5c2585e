use super::*;
use crate::gpu::RecordingBackend;
use crate::model::{Model, TextureKind};
use approx::assert_abs_diff_eq;
use assert_fs::prelude::*;
use base64::Engine;

const QUAD_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
                        vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
                        vn 0 0 1\n\
                        f 1/1/1 2/2/1 3/3/1 4/4/1\n";

fn assert_vec3_eq(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*a, *e, epsilon = 1e-5);
    }
}

fn vertex_at(mesh: &ImportedMesh, position: [f32; 3]) -> usize {
    mesh.positions
        .iter()
        .position(|p| *p == position)
        .unwrap_or_else(|| panic!("no vertex at {:?}", position))
}

/// One triangle in a base64 data URI buffer, instanced by a parent node and
/// its child. `material` is spliced into the document as-is.
fn triangle_gltf(material: &str) -> String {
    let mut bytes = Vec::new();
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    for index in [0u16, 1, 2] {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    let data = base64::engine::general_purpose::STANDARD.encode(&bytes);

    format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            "scene": 0,
            "scenes": [{{ "nodes": [0] }}],
            "nodes": [
                {{ "name": "parent", "mesh": 0, "children": [1] }},
                {{ "name": "child", "mesh": 0 }}
            ],
            "meshes": [{{
                "name": "tri",
                "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }}]
            }}],
            {material}
            "accessors": [
                {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                   "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
                {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
            ],
            "bufferViews": [
                {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
                {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
            ],
            "buffers": [{{ "byteLength": {len}, "uri": "data:application/octet-stream;base64,{data}" }}]
        }}"#,
        material = material,
        len = bytes.len(),
        data = data,
    )
}

const ALBEDO_MATERIAL: &str = r#"
    "materials": [{ "name": "painted", "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }],
    "textures": [{ "source": 0 }],
    "images": [{ "uri": "albedo.png" }],
"#;

const SPACED_ALBEDO_MATERIAL: &str = r#"
    "materials": [{ "name": "painted", "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }],
    "textures": [{ "source": 0 }],
    "images": [{ "uri": "my%20albedo.png" }],
"#;

#[test]
fn test_options_report_missing_steps() {
    assert!(ImportOptions::default().is_compatible());
    assert_eq!(ImportOptions::default(), ImportOptions::REQUIRED);

    let options = ImportOptions {
        triangulate: false,
        flip_uvs: true,
        calc_tangent_space: false,
    };
    assert!(!options.is_compatible());
    assert_eq!(options.missing(), vec!["triangulate", "calc_tangent_space"]);
}

#[test]
fn test_material_textures_by_kind() {
    let material = ImportedMaterial::new("brick")
        .with_texture(TextureKind::Diffuse, "a.png")
        .with_texture(TextureKind::Normal, "n.png")
        .with_texture(TextureKind::Diffuse, "b.png");

    assert_eq!(material.textures_of(TextureKind::Diffuse).collect::<Vec<_>>(), ["a.png", "b.png"]);
    assert_eq!(material.textures_of(TextureKind::Normal).collect::<Vec<_>>(), ["n.png"]);
    assert_eq!(material.textures_of(TextureKind::Height).count(), 0);
}

#[test]
fn test_tangent_space_of_flipped_quad() {
    let mut mesh = ImportedMesh {
        name: "quad".to_string(),
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        indices: vec![0, 1, 2, 0, 2, 3],
        ..Default::default()
    };
    post_process::apply(&mut mesh, &ImportOptions::default(), None).unwrap();

    assert_eq!(mesh.tex_coords[0], [0.0, 1.0]);
    assert_eq!(mesh.tex_coords[2], [1.0, 0.0]);
    assert_eq!(mesh.tangents.len(), 4);
    assert_eq!(mesh.bitangents.len(), 4);
    for (tangent, bitangent) in mesh.tangents.iter().zip(&mesh.bitangents) {
        assert_vec3_eq(*tangent, [1.0, 0.0, 0.0]);
        assert_vec3_eq(*bitangent, [0.0, -1.0, 0.0]);
    }
}

#[test]
fn test_supplied_tangents_are_kept() {
    let mut mesh = ImportedMesh {
        name: "tri".to_string(),
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 3],
        tex_coords: vec![[0.0, 0.0]; 3],
        indices: vec![0, 1, 2],
        ..Default::default()
    };
    let supplied = [[0.0, 1.0, 0.0, 1.0]; 3];
    post_process::apply(&mut mesh, &ImportOptions::default(), Some(&supplied)).unwrap();

    assert_vec3_eq(mesh.tangents[1], [0.0, 1.0, 0.0]);
    // cross(n, t) = -x, negated again for the flipped V axis
    assert_vec3_eq(mesh.bitangents[1], [1.0, 0.0, 0.0]);
}

#[test]
fn test_post_process_rejects_malformed_meshes() {
    let triangle = ImportedMesh {
        name: "bad".to_string(),
        positions: vec![[0.0; 3]; 3],
        indices: vec![0, 1, 2],
        ..Default::default()
    };

    let mut short_normals = ImportedMesh {
        normals: vec![[0.0, 0.0, 1.0]],
        ..triangle.clone()
    };
    let err = post_process::apply(&mut short_normals, &ImportOptions::default(), None).unwrap_err();
    assert!(err.reason().contains("1 normals for 3 positions"));

    let mut not_triangles = ImportedMesh {
        indices: vec![0, 1],
        ..triangle.clone()
    };
    assert!(post_process::apply(&mut not_triangles, &ImportOptions::default(), None).is_err());

    let mut out_of_range = ImportedMesh {
        indices: vec![0, 1, 3],
        ..triangle
    };
    let err = post_process::apply(&mut out_of_range, &ImportOptions::default(), None).unwrap_err();
    assert!(err.reason().contains("vertex 3"));
}

#[test]
fn test_import_obj_quad() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("quad.obj");
    file.write_str(&format!("o panel\n{}", QUAD_OBJ)).unwrap();

    let scene = import(file.path(), &ImportOptions::default()).unwrap();
    assert!(!scene.flags.incomplete);
    assert_eq!(scene.applied, ImportOptions::REQUIRED);
    assert_eq!(scene.meshes.len(), 1);

    let root = scene.root_node().unwrap();
    assert_eq!(root.name, "quad");
    assert!(root.meshes.is_empty());
    assert_eq!(root.children.len(), 1);
    let panel = scene.node(root.children[0]).unwrap();
    assert_eq!(panel.name, "panel");
    assert_eq!(panel.meshes, vec![0]);

    let mesh = &scene.meshes[0];
    assert_eq!(mesh.positions.len(), 4);
    assert_eq!(mesh.indices.len(), 6);
    assert_eq!(mesh.material, None);

    let origin = vertex_at(mesh, [0.0, 0.0, 0.0]);
    let top_right = vertex_at(mesh, [1.0, 1.0, 0.0]);
    assert_eq!(mesh.tex_coords[origin], [0.0, 1.0]);
    assert_eq!(mesh.tex_coords[top_right], [1.0, 0.0]);
    assert_vec3_eq(mesh.tangents[origin], [1.0, 0.0, 0.0]);
    assert_vec3_eq(mesh.bitangents[origin], [0.0, -1.0, 0.0]);
}

#[test]
fn test_import_obj_material_slots() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("wall.mtl")
        .write_str(
            "newmtl wall\n\
             map_Kd wall_diffuse.png\n\
             map_Ks wall_specular.png\n\
             map_Bump wall_normal.png\n\
             map_Ka wall_height.png\n",
        )
        .unwrap();
    let file = temp.child("wall.obj");
    file.write_str(&format!("mtllib wall.mtl\no wall\nusemtl wall\n{}", QUAD_OBJ))
        .unwrap();

    let scene = import(file.path(), &ImportOptions::default()).unwrap();
    assert_eq!(scene.materials.len(), 1);
    assert_eq!(scene.meshes[0].material, Some(0));

    let material = &scene.materials[0];
    assert_eq!(material.name, "wall");
    let slot = |kind| material.textures_of(kind).collect::<Vec<_>>();
    assert_eq!(slot(TextureKind::Diffuse), ["wall_diffuse.png"]);
    assert_eq!(slot(TextureKind::Specular), ["wall_specular.png"]);
    assert_eq!(slot(TextureKind::Normal), ["wall_normal.png"]);
    assert_eq!(slot(TextureKind::Height), ["wall_height.png"]);
}

#[test_log::test]
fn test_import_obj_with_missing_mtl() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("lonely.obj");
    file.write_str(&format!("mtllib nowhere.mtl\no lonely\nusemtl ghost\n{}", QUAD_OBJ))
        .unwrap();

    let scene = import(file.path(), &ImportOptions::default()).unwrap();
    assert!(scene.materials.is_empty());
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.meshes[0].material, None);
}

#[test]
fn test_import_obj_triangulates_polygons() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("pentagon.obj");
    file.write_str("v 0 0 0\nv 2 0 0\nv 3 1 0\nv 1 2 0\nv -1 1 0\nf 1 2 3 4 5\n")
        .unwrap();

    let scene = import(file.path(), &ImportOptions::default()).unwrap();
    assert_eq!(scene.meshes[0].indices.len(), 9);
}

#[test]
fn test_import_gltf_nodes_and_material() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("tri.gltf");
    file.write_str(&triangle_gltf(ALBEDO_MATERIAL)).unwrap();

    let scene = import(file.path(), &ImportOptions::default()).unwrap();
    assert!(!scene.flags.incomplete);

    // Two document nodes plus the synthetic scene root.
    assert_eq!(scene.nodes.len(), 3);
    let root = scene.root_node().unwrap();
    assert_eq!(root.children, vec![NodeId(0)]);
    assert_eq!(scene.nodes[0].name, "parent");
    assert_eq!(scene.nodes[0].meshes, vec![0]);
    assert_eq!(scene.nodes[0].children, vec![NodeId(1)]);
    assert_eq!(scene.nodes[1].meshes, vec![0]);

    assert_eq!(scene.meshes.len(), 1);
    let mesh = &scene.meshes[0];
    assert_eq!(mesh.name, "tri.0");
    assert_eq!(mesh.positions.len(), 3);
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.material, Some(0));
    assert_eq!(mesh.tangents.len(), 3);

    assert_eq!(
        scene.materials[0].textures_of(TextureKind::Diffuse).collect::<Vec<_>>(),
        ["albedo.png"]
    );
}

#[test_log::test]
fn test_load_gltf_model_instances_shared_mesh() {
    let temp = assert_fs::TempDir::new().unwrap();
    image::RgbaImage::new(4, 4)
        .save(temp.child("albedo.png").path())
        .unwrap();
    let file = temp.child("tri.gltf");
    file.write_str(&triangle_gltf(ALBEDO_MATERIAL)).unwrap();

    let mut gpu = RecordingBackend::new();
    let model = Model::load(&mut gpu, file.path()).unwrap();
    assert_eq!(model.meshes().len(), 2);
    assert_eq!(model.textures().len(), 1);
    assert_eq!(gpu.texture_uploads(), 1);
    assert_eq!(model.meshes()[1].textures[0].record.width, 4);
    model.release(&mut gpu);
    assert_eq!(gpu.live_resources(), 0);
}

#[test_log::test]
fn test_load_gltf_with_missing_image() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("tri.gltf");
    file.write_str(&triangle_gltf(ALBEDO_MATERIAL)).unwrap();

    let mut gpu = RecordingBackend::new();
    let model = Model::load(&mut gpu, file.path()).unwrap();
    assert_eq!(model.meshes().len(), 2);
    assert!(model.meshes().iter().all(|m| m.textures.is_empty()));
    assert!(model.textures().is_empty());
}

#[test]
fn test_gltf_image_uri_is_percent_decoded() {
    let temp = assert_fs::TempDir::new().unwrap();
    image::RgbaImage::new(2, 2)
        .save(temp.child("my albedo.png").path())
        .unwrap();
    let file = temp.child("spaced.gltf");
    file.write_str(&triangle_gltf(SPACED_ALBEDO_MATERIAL)).unwrap();

    let scene = import(file.path(), &ImportOptions::default()).unwrap();
    assert_eq!(
        scene.materials[0].textures_of(TextureKind::Diffuse).collect::<Vec<_>>(),
        ["my albedo.png"]
    );

    let mut gpu = RecordingBackend::new();
    let model = Model::load(&mut gpu, file.path()).unwrap();
    assert_eq!(model.textures().len(), 1);
    assert!(model.meshes().iter().all(|m| m.textures.len() == 1));
    model.release(&mut gpu);
}

#[test]
fn test_gltf_without_scene_is_incomplete() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("empty.gltf");
    file.write_str(r#"{ "asset": { "version": "2.0" } }"#).unwrap();

    let scene = import(file.path(), &ImportOptions::default()).unwrap();
    assert!(scene.flags.incomplete);
    assert!(scene.root.is_none());

    let mut gpu = RecordingBackend::new();
    let err = Model::load(&mut gpu, file.path()).unwrap_err();
    assert!(err.to_string().contains("incomplete"));
}

#[test]
fn test_gltf_parse_error_is_reported() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("broken.gltf");
    file.write_str("{ not json").unwrap();

    let err = import(file.path(), &ImportOptions::default()).unwrap_err();
    assert!(err.reason().contains("failed to read glTF"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_unknown_extension_is_rejected() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("model.fbx");
    file.touch().unwrap();

    let err = import(file.path(), &ImportOptions::default()).unwrap_err();
    assert!(err.reason().contains("unsupported model format `fbx`"));
}
