use glam::{Mat4, Vec3, Vec4};

use crate::render::stages::ResolveUniforms;

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }
}

/// Directional light with an orthographic shadow fitted around `bounds`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    direction: Vec3,
    color: Vec3,
    shadow_view_projection: Mat4,
    shadow_resolution: u32,
}

impl Lighting {
    /// `direction` points from the light into the scene. The shadow map gets
    /// one texel per `texel_size` world units across the fitted box, at most
    /// `max_resolution`.
    pub fn new(bounds: Bounds, direction: Vec3, texel_size: f32, max_resolution: u32) -> Self {
        let direction = direction.normalize();
        let center = (bounds.min + bounds.max) * 0.5;
        let up = if direction.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_to_rh(center, direction, up);

        let mut lo = Vec3::splat(f32::INFINITY);
        let mut hi = Vec3::splat(f32::NEG_INFINITY);
        for corner in bounds.corners() {
            let p = view.transform_point3(corner);
            lo = lo.min(p);
            hi = hi.max(p);
        }

        // View space looks down -z: near is the largest z.
        let projection = Mat4::orthographic_rh(lo.x, hi.x, lo.y, hi.y, -hi.z, -lo.z);

        let extent = (hi.x - lo.x).max(hi.y - lo.y);
        let wanted = (extent / texel_size.max(f32::EPSILON)).ceil() as u32;
        let shadow_resolution = wanted.clamp(1, max_resolution.max(1));
        if shadow_resolution < wanted {
            log::warn!("shadow map clamped to {shadow_resolution} texels (wanted {wanted})");
        }

        Self {
            direction,
            color: Vec3::ONE,
            shadow_view_projection: projection * view,
            shadow_resolution,
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// World space to shadow clip space.
    pub fn shadow_view_projection(&self) -> Mat4 {
        self.shadow_view_projection
    }

    pub fn shadow_resolution(&self) -> u32 {
        self.shadow_resolution
    }

    /// Resolve parameters for a camera with `view` and `projection`.
    pub fn resolve_uniforms(&self, view: Mat4, projection: Mat4, screen_size: (u32, u32)) -> ResolveUniforms {
        let light_view = view.transform_vector3(self.direction).normalize();
        let texel = 1.0 / self.shadow_resolution as f32;
        ResolveUniforms {
            inverse_projection: projection.inverse(),
            inv_view_shadow_view_projection: self.shadow_view_projection * view.inverse(),
            light_direction: light_view.extend(0.0),
            light_color: Vec4::from((self.color, 1.0)),
            screen_size: glam::Vec2::new(screen_size.0 as f32, screen_size.1 as f32),
            shadow_texel: glam::Vec2::splat(texel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_bounds() -> Bounds {
        Bounds::new(Vec3::new(-1.0, -3.0, -1.0), Vec3::new(9.0, 5.0, 7.0))
    }

    fn light() -> Lighting {
        Lighting::new(scene_bounds(), Vec3::new(0.5, -1.0, -0.5), 1.0 / 256.0, 8192)
    }

    #[test]
    fn shadow_projection_contains_the_scene() {
        let l = light();
        for corner in scene_bounds().corners() {
            let p = l.shadow_view_projection().project_point3(corner);
            assert!(p.x >= -1.0 - 1e-4 && p.x <= 1.0 + 1e-4, "{p}");
            assert!(p.y >= -1.0 - 1e-4 && p.y <= 1.0 + 1e-4, "{p}");
            assert!(p.z >= -1e-4 && p.z <= 1.0 + 1e-4, "{p}");
        }
    }

    #[test]
    fn points_toward_the_light_are_nearer() {
        let l = light();
        let center = Vec3::new(4.0, 1.0, 3.0);
        let near = l.shadow_view_projection().project_point3(center - l.direction());
        let far = l.shadow_view_projection().project_point3(center + l.direction());
        assert!(near.z < far.z);
    }

    #[test]
    fn resolution_follows_texel_size_and_device_limit() {
        let fine = light();
        assert!(fine.shadow_resolution() > 2048);
        assert!(fine.shadow_resolution() <= 8192);

        let clamped = Lighting::new(scene_bounds(), Vec3::new(0.5, -1.0, -0.5), 1.0 / 256.0, 2048);
        assert_eq!(clamped.shadow_resolution(), 2048);

        let coarse = Lighting::new(scene_bounds(), Vec3::new(0.5, -1.0, -0.5), 1.0, 8192);
        assert!(coarse.shadow_resolution() < 32);
    }

    #[test]
    fn vertical_light_still_builds_a_basis() {
        let l = Lighting::new(scene_bounds(), Vec3::NEG_Y, 0.5, 4096);
        assert!(l.shadow_view_projection().is_finite());
    }

    #[test]
    fn resolve_uniforms_use_view_space_direction() {
        let l = light();
        let view = Mat4::from_rotation_y(0.7) * Mat4::from_translation(Vec3::new(-3.0, 2.0, 1.0));
        let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);
        let u = l.resolve_uniforms(view, projection, (800, 600));

        let expected = view.transform_vector3(l.direction()).normalize();
        assert!((u.light_direction.truncate() - expected).length() < 1e-5);
        assert_eq!(u.light_direction.w, 0.0);

        // A view-space point maps to the same shadow coordinates as its
        // world-space origin.
        let world = Vec3::new(2.0, 0.5, 4.0);
        let from_view = u.inv_view_shadow_view_projection.project_point3(view.transform_point3(world));
        let direct = l.shadow_view_projection().project_point3(world);
        assert!((from_view - direct).length() < 1e-4);
    }
}
