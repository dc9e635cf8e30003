use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec3, Vec4};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// `w` holds the bitangent handedness.
    pub tangent: Vec4,
    pub texcoord: Vec2,
}

/// Immutable triangle list read by the rendering passes.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Mesh {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex at `corner` (0..3) of `triangle`.
    pub fn vertex(&self, triangle: usize, corner: usize) -> &MeshVertex {
        &self.vertices[self.indices[triangle * 3 + corner] as usize]
    }

    pub fn position(&self, triangle: usize, corner: usize) -> Vec3 {
        self.vertex(triangle, corner).position
    }

    pub fn normal(&self, triangle: usize, corner: usize) -> Vec3 {
        self.vertex(triangle, corner).normal
    }

    pub fn tangent(&self, triangle: usize, corner: usize) -> Vec4 {
        self.vertex(triangle, corner).tangent
    }

    pub fn texcoord(&self, triangle: usize, corner: usize) -> Vec2 {
        self.vertex(triangle, corner).texcoord
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// Reads and parses an OBJ file.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("unable to read mesh {}", path.display()))?;
    load_obj_from_str(&data).with_context(|| format!("invalid mesh {}", path.display()))
}

/// Parses an OBJ file from memory.
///
/// Polygons are fan-triangulated. Normals are generated when the file does
/// not supply them, and tangents are always derived from the texture
/// coordinates.
pub fn load_obj_from_str(data: &str) -> Result<Mesh> {
    let mut positions = Vec::new();
    let mut texcoords = Vec::new();
    let mut normals = Vec::new();
    let mut faces: Vec<[FaceIndex; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            "vt" => texcoords.push(
                parse_vec2(parts)
                    .with_context(|| format!("invalid texcoord on line {}", line_no + 1))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts)
                    .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
            ),
            "f" => {
                let polygon = parse_face(parts)
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                triangulate_face(&polygon, &mut faces);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }
    if faces.is_empty() {
        return Err(anyhow!("OBJ file does not define any faces"));
    }

    let mut builder = build_mesh(&positions, &texcoords, &normals, &faces)?;
    if builder.mesh.vertices.iter().any(|v| v.normal == Vec3::ZERO) {
        compute_normals(&mut builder, positions.len());
    }
    compute_tangents(&mut builder.mesh);
    Ok(builder.mesh)
}

fn parse_component<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<f32> {
    let text = parts
        .next()
        .ok_or_else(|| anyhow!("missing vector component"))?;
    let value = text.parse::<f32>()?;
    if !value.is_finite() {
        return Err(anyhow!("vector component {text} is not a finite number"));
    }
    Ok(value)
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2> {
    let u = parse_component(&mut parts)?;
    let v = parse_component(&mut parts)?;
    Ok(Vec2::new(u, v))
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let x = parse_component(&mut parts)?;
    let y = parse_component(&mut parts)?;
    let z = parse_component(&mut parts)?;
    Ok(Vec3::new(x, y, z))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let vt = parse_optional_index(segments.next())?;
        let vn = parse_optional_index(segments.next())?;
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(indices)
}

fn parse_optional_index(segment: Option<&str>) -> Result<i32> {
    match segment {
        Some(s) if !s.is_empty() => Ok(s.parse::<i32>()?),
        _ => Ok(0),
    }
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

struct MeshBuilder {
    mesh: Mesh,
    /// Source position index of each vertex, used to smooth generated normals
    /// across texture seams.
    position_of: Vec<usize>,
}

fn build_mesh(
    positions: &[Vec3],
    texcoords: &[Vec2],
    normals: &[Vec3],
    faces: &[[FaceIndex; 3]],
) -> Result<MeshBuilder> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut position_of = Vec::new();
    let mut indices = Vec::with_capacity(faces.len() * 3);

    for face in faces {
        for idx in face {
            let position =
                fix_index(idx.v, positions.len()).ok_or_else(|| anyhow!("invalid vertex index"))?;
            let key = Key {
                position,
                texcoord: fix_index(idx.vt, texcoords.len()),
                normal: fix_index(idx.vn, normals.len()),
            };
            let next_index = vertices.len() as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                vertices.push(MeshVertex {
                    position: positions[position],
                    normal: key.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO),
                    tangent: Vec4::ZERO,
                    texcoord: key.texcoord.map(|i| texcoords[i]).unwrap_or(Vec2::ZERO),
                });
                position_of.push(position);
                next_index
            });
            indices.push(*entry);
        }
    }

    Ok(MeshBuilder {
        mesh: Mesh { vertices, indices },
        position_of,
    })
}

fn fix_index(index: i32, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

/// Area-weighted smooth normals, accumulated per source position.
fn compute_normals(builder: &mut MeshBuilder, position_count: usize) {
    let mesh = &mut builder.mesh;
    let mut accum = vec![Vec3::ZERO; position_count];

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let p0 = mesh.vertices[i0].position;
        let p1 = mesh.vertices[i1].position;
        let p2 = mesh.vertices[i2].position;
        let normal = (p1 - p0).cross(p2 - p0);
        for i in [i0, i1, i2] {
            accum[builder.position_of[i]] += normal;
        }
    }

    for (vertex, &position) in mesh.vertices.iter_mut().zip(&builder.position_of) {
        if vertex.normal == Vec3::ZERO {
            vertex.normal = accum[position].normalize_or_zero();
        }
    }
}

fn compute_tangents(mesh: &mut Mesh) {
    let vertex_count = mesh.vertices.len();
    let mut tangents = vec![Vec3::ZERO; vertex_count];
    let mut bitangents = vec![Vec3::ZERO; vertex_count];

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let (v0, v1, v2) = (mesh.vertices[i0], mesh.vertices[i1], mesh.vertices[i2]);
        let e1 = v1.position - v0.position;
        let e2 = v2.position - v0.position;
        let d1 = v1.texcoord - v0.texcoord;
        let d2 = v2.texcoord - v0.texcoord;
        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (e1 * d2.y - e2 * d1.y) * r;
        let bitangent = (e2 * d1.x - e1 * d2.x) * r;
        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for (i, vertex) in mesh.vertices.iter_mut().enumerate() {
        let n = vertex.normal;
        let mut t = (tangents[i] - n * n.dot(tangents[i])).normalize_or_zero();
        if t == Vec3::ZERO {
            t = if n == Vec3::ZERO {
                Vec3::X
            } else {
                n.any_orthonormal_vector()
            };
        }
        let handedness = if n.cross(t).dot(bitangents[i]) < 0.0 {
            -1.0
        } else {
            1.0
        };
        vertex.tangent = t.extend(handedness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_triangle() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.position(0, 1), Vec3::X);
    }

    #[test]
    fn computes_missing_normals() {
        let obj = "\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = load_obj_from_str(obj).unwrap();
        for corner in 0..3 {
            assert!((mesh.normal(0, corner) - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn reads_texcoords_and_derives_tangents() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.texcoord(0, 2), Vec2::new(0.0, 1.0));
        let tangent = mesh.tangent(0, 0);
        assert!((tangent.truncate() - Vec3::X).length() < 1e-5);
        assert_eq!(tangent.w, 1.0);
    }

    #[test]
    fn mirrored_uvs_flip_handedness() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 -1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.tangent(0, 0).w, -1.0);
    }

    #[test]
    fn quads_are_fan_triangulated_with_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf -4 -3 -2 -1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.position(1, 2), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn malformed_faces_are_errors() {
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nf 1 2\n").is_err());
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n").is_err());
        assert!(load_obj_from_str("# empty\n").is_err());
    }

    #[test]
    fn non_finite_components_are_errors() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 1e39 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";
        let err = load_obj_from_str(obj).unwrap_err();
        assert!(format!("{err:#}").contains("line 4"));
        assert!(load_obj_from_str("v 0 nan 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").is_err());
        assert!(load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 inf\nf 1//1 2//1 3//1\n").is_err());
    }
}
