//! Ready-made meshes for demos and tests.
//!
//! Every face carries a full tangent frame with U along the tangent and V
//! along the bitangent, so normal maps work out of the box.

use std::sync::Arc;

use super::mesh::Mesh;
use crate::codec::Vertex;
use crate::material::Material;
use crate::util::{Vec2, Vec3};

fn face_vertex(position: Vec3, normal: Vec3, tangent: Vec3, uv: Vec2) -> Vertex {
    let bitangent = normal.cross(tangent);
    Vertex::with_tangent_frame(
        position.extend(1.0),
        normal.extend(0.0),
        tangent.extend(0.0),
        bitangent.extend(0.0),
        uv,
    )
}

/// Unit triangle in the XY plane facing +Z.
pub fn triangle(material: Option<Arc<Material>>) -> Mesh {
    let corners = [
        (Vec3::new(-0.5, -0.5, 0.0), Vec2::new(0.0, 0.0)),
        (Vec3::new(0.5, -0.5, 0.0), Vec2::new(1.0, 0.0)),
        (Vec3::new(0.0, 0.5, 0.0), Vec2::new(0.5, 1.0)),
    ];
    let vertices = corners
        .iter()
        .map(|&(p, uv)| face_vertex(p, Vec3::Z, Vec3::X, uv))
        .collect();
    Mesh::new(vertices, vec![0, 1, 2], material).with_name("Triangle")
}

/// Unit quad in the XY plane facing +Z, two triangles.
pub fn quad(material: Option<Arc<Material>>) -> Mesh {
    let (vertices, indices) = face(Vec3::ZERO, Vec3::Z, Vec3::X, 0);
    Mesh::new(vertices, indices, material).with_name("Quad")
}

/// Unit cube centered on the origin, 4 vertices per face.
pub fn cube(material: Option<Arc<Material>>) -> Mesh {
    const FACES: [(Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_X, Vec3::Z),
        (Vec3::Y, Vec3::X),
        (Vec3::NEG_Y, Vec3::X),
        (Vec3::Z, Vec3::X),
        (Vec3::NEG_Z, Vec3::NEG_X),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, tangent) in FACES {
        let (v, i) = face(normal * 0.5, normal, tangent, vertices.len() as u32);
        vertices.extend(v);
        indices.extend(i);
    }
    Mesh::new(vertices, indices, material).with_name("Cube")
}

/// Square face of side 1 around `center`, indices starting at `base`.
fn face(center: Vec3, normal: Vec3, tangent: Vec3, base: u32) -> (Vec<Vertex>, Vec<u32>) {
    let bitangent = normal.cross(tangent);
    let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
    let vertices = corners
        .iter()
        .map(|&(u, v)| {
            let p = center + tangent * u + bitangent * v;
            face_vertex(p, normal, tangent, Vec2::new(u + 0.5, v + 0.5))
        })
        .collect();
    let indices = vec![base, base + 1, base + 2, base + 2, base + 3, base];
    (vertices, indices)
}
