use glam::{Vec2, Vec3};

use crate::error::SceneImportError;

use super::{ImportOptions, ImportedMesh};

/// Validates a freshly read mesh and applies the requested post-processing.
/// `supplied_tangents` are xyz + handedness tangents shipped with the asset.
pub(super) fn apply(
    mesh: &mut ImportedMesh,
    options: &ImportOptions,
    supplied_tangents: Option<&[[f32; 4]]>,
) -> Result<(), SceneImportError> {
    check(mesh)?;

    if options.flip_uvs {
        flip_uvs(mesh);
    }

    if options.calc_tangent_space {
        match supplied_tangents {
            Some(tangents)
                if tangents.len() == mesh.positions.len() && !mesh.normals.is_empty() =>
            {
                use_supplied_tangents(mesh, tangents, options.flip_uvs)
            }
            _ => calc_tangent_space(mesh),
        }
    }
    Ok(())
}

fn check(mesh: &ImportedMesh) -> Result<(), SceneImportError> {
    let vertex_count = mesh.positions.len();
    let attributes = [
        ("normals", mesh.normals.len()),
        ("texture coordinates", mesh.tex_coords.len()),
        ("tangents", mesh.tangents.len()),
        ("bitangents", mesh.bitangents.len()),
    ];
    for (attribute, len) in attributes {
        if len != 0 && len != vertex_count {
            return Err(SceneImportError::new(format!(
                "mesh `{}` has {} {} for {} positions",
                mesh.name, len, attribute, vertex_count
            )));
        }
    }

    if mesh.indices.len() % 3 != 0 {
        return Err(SceneImportError::new(format!(
            "mesh `{}` has {} indices, not a triangle list",
            mesh.name,
            mesh.indices.len()
        )));
    }
    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(SceneImportError::new(format!(
            "mesh `{}` references vertex {} but has {} vertices",
            mesh.name, index, vertex_count
        )));
    }
    Ok(())
}

pub(super) fn flip_uvs(mesh: &mut ImportedMesh) {
    for uv in &mut mesh.tex_coords {
        uv[1] = 1.0 - uv[1];
    }
}

fn use_supplied_tangents(mesh: &mut ImportedMesh, tangents: &[[f32; 4]], flipped: bool) {
    let flip = if flipped { -1.0 } else { 1.0 };
    mesh.tangents = tangents.iter().map(|t| [t[0], t[1], t[2]]).collect();
    mesh.bitangents = tangents
        .iter()
        .zip(&mesh.normals)
        .map(|(t, n)| {
            let b = Vec3::from(*n).cross(Vec3::new(t[0], t[1], t[2])) * t[3] * flip;
            b.to_array()
        })
        .collect();
}

/// Per-vertex tangent frame from triangle position/UV derivatives, accumulated
/// over adjacent triangles and orthogonalised against the normal.
pub(super) fn calc_tangent_space(mesh: &mut ImportedMesh) {
    let vertex_count = mesh.positions.len();
    let mut tangents = vec![Vec3::ZERO; vertex_count];
    let mut bitangents = vec![Vec3::ZERO; vertex_count];

    let uv = |i: usize| mesh.tex_coords.get(i).map(|&uv| Vec2::from(uv)).unwrap_or(Vec2::ZERO);

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];

        let delta_pos1 = Vec3::from(mesh.positions[i1]) - Vec3::from(mesh.positions[i0]);
        let delta_pos2 = Vec3::from(mesh.positions[i2]) - Vec3::from(mesh.positions[i0]);
        let delta_uv1 = uv(i1) - uv(i0);
        let delta_uv2 = uv(i2) - uv(i0);

        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    mesh.tangents = Vec::with_capacity(vertex_count);
    mesh.bitangents = Vec::with_capacity(vertex_count);
    for i in 0..vertex_count {
        let normal = mesh.normals.get(i).map(|&n| Vec3::from(n)).unwrap_or(Vec3::ZERO);
        let (tangent, bitangent) = if normal == Vec3::ZERO {
            (tangents[i].normalize_or_zero(), bitangents[i].normalize_or_zero())
        } else {
            let tangent = (tangents[i] - normal * normal.dot(tangents[i])).normalize_or_zero();
            let handedness = if normal.cross(tangent).dot(bitangents[i]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            (tangent, normal.cross(tangent).normalize_or_zero() * handedness)
        };
        mesh.tangents.push(tangent.to_array());
        mesh.bitangents.push(bitangent.to_array());
    }
}
