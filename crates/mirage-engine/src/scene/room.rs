//! The static floor and walls around the box grid.

use glam::Vec3;

use crate::mesh::{shapes, MeshBuilder, MeshValidationError};

use super::layout::LayoutParams;
use super::lighting::Bounds;
use super::palette::RED;

/// Gap between the grid and the walls.
pub const MARGIN: f32 = 1.0;
/// Height of the wall bottoms.
pub const BOTTOM_Y: f32 = -3.0;

const FLOOR_SPECULAR: f32 = 0.75;
const WALL_SPECULAR: f32 = 0.5;
const ROOM_SHININESS: f32 = 40.0;

fn extent(params: &LayoutParams) -> (f32, f32) {
    (params.grid_width as f32, params.grid_height as f32)
}

/// Floor at y = 0 plus four walls hanging below it, all facing inwards.
pub fn room_mesh(params: &LayoutParams) -> Result<MeshBuilder, MeshValidationError> {
    let (w, h) = extent(params);
    let b = MARGIN;

    let floor = shapes::with_parameters(
        shapes::plane_up(0.0, -b, -b, b + w, b + h),
        RED.with_specular(FLOOR_SPECULAR),
        ROOM_SHININESS,
    );
    let walls = [
        shapes::plane_back(b + h, -b, BOTTOM_Y, b + w, 0.0),
        shapes::plane_right(-b, BOTTOM_Y, -b, 0.0, b + h),
        shapes::plane_left(b + w, BOTTOM_Y, -b, 0.0, b + h),
    ]
    .into_iter()
    .try_fold(shapes::plane_front(-b, -b, BOTTOM_Y, b + w, 0.0), |acc, wall| acc + wall)?;
    let walls = shapes::with_parameters(walls, RED.with_specular(WALL_SPECULAR), ROOM_SHININESS);

    &floor + &walls
}

/// World-space box enclosing everything that casts or receives shadows.
pub fn scene_bounds(params: &LayoutParams) -> Bounds {
    let (w, h) = extent(params);
    Bounds::new(
        Vec3::new(-MARGIN, BOTTOM_Y, -MARGIN),
        Vec3::new(MARGIN + w, params.max_stacked as f32 + 1.0, MARGIN + h),
    )
}

/// Starting eye position and the point it looks at: above and behind the
/// front wall, toward the grid centre.
pub fn initial_view(params: &LayoutParams) -> (Vec3, Vec3) {
    let (w, h) = extent(params);
    let eye = Vec3::new(w / 2.0, params.max_stacked as f32 + 3.0, h + 6.0);
    let target = Vec3::new(w / 2.0, 0.0, h / 2.0);
    (eye, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_is_five_quads() {
        let mesh = room_mesh(&LayoutParams::default()).unwrap();
        assert_eq!(mesh.validate().unwrap(), 20);
        assert_eq!(mesh.indices.len(), 30);
        assert_eq!(mesh.colors[0], RED.with_specular(FLOOR_SPECULAR));
        assert_eq!(mesh.colors[4], RED.with_specular(WALL_SPECULAR));
        assert!(mesh.shininess.iter().all(|&s| s == ROOM_SHININESS));
    }

    #[test]
    fn walls_face_the_grid() {
        let params = LayoutParams::default();
        let mesh = room_mesh(&params).unwrap();
        let centre = Vec3::new(4.0, -1.0, 3.0);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals).skip(4) {
            assert!((centre - *p).dot(*n) > 0.0, "wall at {p} faces {n}");
        }
    }

    #[test]
    fn bounds_cover_the_tallest_stack() {
        let params = LayoutParams::default();
        let b = scene_bounds(&params);
        assert_eq!(b.min, Vec3::new(-1.0, -3.0, -1.0));
        assert_eq!(b.max, Vec3::new(9.0, 5.0, 7.0));
    }

    #[test]
    fn initial_view_looks_down_at_the_grid() {
        let (eye, target) = initial_view(&LayoutParams::default());
        assert_eq!(eye, Vec3::new(4.0, 7.0, 12.0));
        assert_eq!(target, Vec3::new(4.0, 0.0, 3.0));
    }
}
