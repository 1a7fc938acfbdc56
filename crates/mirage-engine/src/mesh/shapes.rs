//! Builders for the simple solids the scene is made of.
//!
//! Front faces wind counter-clockwise seen from the side the normal points to.

use glam::Vec3;

use super::builder::MeshBuilder;

const QUAD_FRONT: [u32; 6] = [0, 2, 1, 0, 3, 2];
const QUAD_BACK: [u32; 6] = [0, 1, 2, 0, 2, 3];

fn quad(corners: [Vec3; 4], normal: Vec3, facing_positive: bool) -> MeshBuilder {
    MeshBuilder {
        positions: corners.to_vec(),
        normals: vec![normal; 4],
        indices: if facing_positive { QUAD_FRONT } else { QUAD_BACK }.to_vec(),
        ..Default::default()
    }
}

fn plane_x(x: f32, ymin: f32, zmin: f32, ymax: f32, zmax: f32, positive: bool) -> MeshBuilder {
    let corners = [
        Vec3::new(x, ymin, zmin),
        Vec3::new(x, ymin, zmax),
        Vec3::new(x, ymax, zmax),
        Vec3::new(x, ymax, zmin),
    ];
    quad(corners, Vec3::X * sign(positive), positive)
}

fn plane_y(y: f32, xmin: f32, zmin: f32, xmax: f32, zmax: f32, positive: bool) -> MeshBuilder {
    let corners = [
        Vec3::new(xmin, y, zmin),
        Vec3::new(xmax, y, zmin),
        Vec3::new(xmax, y, zmax),
        Vec3::new(xmin, y, zmax),
    ];
    quad(corners, Vec3::Y * sign(positive), positive)
}

fn plane_z(z: f32, xmin: f32, ymin: f32, xmax: f32, ymax: f32, positive: bool) -> MeshBuilder {
    let corners = [
        Vec3::new(xmin, ymin, z),
        Vec3::new(xmin, ymax, z),
        Vec3::new(xmax, ymax, z),
        Vec3::new(xmax, ymin, z),
    ];
    quad(corners, Vec3::Z * sign(positive), positive)
}

fn sign(positive: bool) -> f32 {
    if positive { 1.0 } else { -1.0 }
}

/// Quad at `x` facing +x.
pub fn plane_right(x: f32, ymin: f32, zmin: f32, ymax: f32, zmax: f32) -> MeshBuilder {
    plane_x(x, ymin, zmin, ymax, zmax, true)
}

/// Quad at `x` facing -x.
pub fn plane_left(x: f32, ymin: f32, zmin: f32, ymax: f32, zmax: f32) -> MeshBuilder {
    plane_x(x, ymin, zmin, ymax, zmax, false)
}

/// Quad at `y` facing +y.
pub fn plane_up(y: f32, xmin: f32, zmin: f32, xmax: f32, zmax: f32) -> MeshBuilder {
    plane_y(y, xmin, zmin, xmax, zmax, true)
}

/// Quad at `y` facing -y.
pub fn plane_down(y: f32, xmin: f32, zmin: f32, xmax: f32, zmax: f32) -> MeshBuilder {
    plane_y(y, xmin, zmin, xmax, zmax, false)
}

/// Quad at `z` facing +z.
pub fn plane_front(z: f32, xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> MeshBuilder {
    plane_z(z, xmin, ymin, xmax, ymax, true)
}

/// Quad at `z` facing -z.
pub fn plane_back(z: f32, xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> MeshBuilder {
    plane_z(z, xmin, ymin, xmax, ymax, false)
}

/// Axis-aligned box with 24 vertices (flat normals per face).
pub fn cube(min: Vec3, max: Vec3) -> MeshBuilder {
    let normals = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];

    let positions = vec![
        // +x
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        // -x
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(min.x, max.y, min.z),
        // +y
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(max.x, max.y, min.z),
        // -y
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, min.y, max.z),
        // +z
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        // -z
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(max.x, min.y, min.z),
    ];

    MeshBuilder {
        positions,
        normals: normals.iter().flat_map(|&n| [n; 4]).collect(),
        indices: (0..6u32)
            .flat_map(|f| [0, 1, 2, 0, 2, 3].map(|i| 4 * f + i))
            .collect(),
        ..Default::default()
    }
}

/// Fills colour and shininess for every vertex that lacks them.
pub fn with_parameters(mut mesh: MeshBuilder, color: [u8; 4], shininess: f32) -> MeshBuilder {
    let n = mesh.vertex_count();
    mesh.colors.resize(n, color);
    mesh.shininess.resize(n, shininess);
    mesh
}

/// Flips the winding of every triangle.
pub fn swap_winding(mesh: &mut MeshBuilder) {
    for tri in mesh.indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Geometric normal of each indexed triangle.
    fn face_normals(m: &MeshBuilder) -> Vec<Vec3> {
        m.indices
            .chunks_exact(3)
            .map(|t| {
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| m.positions[i as usize]);
                (b - a).cross(c - a).normalize()
            })
            .collect()
    }

    fn winding_matches_normals(m: &MeshBuilder) -> bool {
        m.indices.chunks_exact(3).zip(face_normals(m)).all(|(t, n)| {
            n.abs_diff_eq(m.normals[t[0] as usize], 1e-5)
        })
    }

    #[test]
    fn planes_wind_towards_their_normal() {
        for m in [
            plane_right(1.0, 0.0, 0.0, 2.0, 3.0),
            plane_left(1.0, 0.0, 0.0, 2.0, 3.0),
            plane_up(1.0, 0.0, 0.0, 2.0, 3.0),
            plane_down(1.0, 0.0, 0.0, 2.0, 3.0),
            plane_front(1.0, 0.0, 0.0, 2.0, 3.0),
            plane_back(1.0, 0.0, 0.0, 2.0, 3.0),
        ] {
            assert!(winding_matches_normals(&m), "{m:?}");
        }
    }

    #[test]
    fn cube_has_24_vertices_and_outward_faces() {
        let m = cube(Vec3::ZERO, Vec3::ONE);
        assert_eq!(m.validate(), Ok(24));
        assert_eq!(m.indices.len(), 36);
        assert!(winding_matches_normals(&m));
    }

    #[test]
    fn parameters_fill_every_vertex() {
        let m = with_parameters(cube(Vec3::ZERO, Vec3::ONE), [1, 2, 3, 4], 6.5);
        assert_eq!(m.colors.len(), 24);
        assert!(m.shininess.iter().all(|&s| s == 6.5));
        assert_eq!(m.validate(), Ok(24));
    }

    #[test]
    fn swapping_winding_flips_faces() {
        let mut m = plane_up(0.0, 0.0, 0.0, 1.0, 1.0);
        swap_winding(&mut m);
        assert_eq!(m.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(face_normals(&m).iter().all(|n| n.abs_diff_eq(Vec3::NEG_Y, 1e-5)));
    }
}
