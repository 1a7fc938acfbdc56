use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Movement intent sampled from the keyboard for one step.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CameraInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Mouse motion in pixels.
    pub look: (f32, f32),
}

/// Free-fly camera: position plus yaw (around +y, 0 looks down -z) and pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second.
    pub speed: f32,
    /// Radians per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Camera {
    /// Camera at `position` looking at `target`.
    pub fn looking_at(position: Vec3, target: Vec3, far: f32) -> Self {
        let dir = target - position;
        let yaw = (-dir.x).atan2(-dir.z);
        let horizontal = dir.x.hypot(dir.z);
        let pitch = dir.y.atan2(horizontal).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Self {
            position,
            yaw,
            pitch,
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far,
            speed: 4.0,
            sensitivity: 0.002,
        }
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(-sy * cp, sp, -cy * cp)
    }

    /// Unit horizontal direction the camera faces.
    fn heading(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        Vec3::new(-sy, 0.0, -cy)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(f32::EPSILON), self.near, self.far)
    }

    /// Applies one step of movement and mouse look.
    pub fn update(&mut self, input: &CameraInput, dt: f32) {
        let (dx, dy) = input.look;
        self.yaw -= dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let heading = self.heading();
        let side = heading.cross(Vec3::Y);
        let axis = |pos: bool, neg: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));

        let motion = heading * axis(input.forward, input.back)
            + side * axis(input.right, input.left)
            + Vec3::Y * axis(input.up, input.down);
        if motion != Vec3::ZERO {
            self.position += motion.normalize() * self.speed * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn looking_at_points_forward_at_target() {
        let pos = Vec3::new(4.0, 7.0, 12.0);
        let target = Vec3::new(4.0, 0.0, 3.0);
        let cam = Camera::looking_at(pos, target, 1000.0);
        assert!(approx(cam.forward(), (target - pos).normalize()));
        assert!(cam.yaw.abs() < 1e-6);
        assert!(cam.pitch < 0.0);
    }

    #[test]
    fn default_heading_is_negative_z() {
        let cam = Camera::looking_at(Vec3::ZERO, Vec3::NEG_Z, 100.0);
        assert!(approx(cam.forward(), Vec3::NEG_Z));
        let view = cam.view();
        let ahead = view.transform_point3(Vec3::new(0.0, 0.0, -5.0));
        assert!(approx(ahead, Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = Camera::looking_at(Vec3::ZERO, Vec3::NEG_Z, 100.0);
        cam.update(&CameraInput { look: (0.0, -1e6), ..Default::default() }, 0.016);
        assert!((cam.pitch - PITCH_LIMIT).abs() < 1e-6);
        cam.update(&CameraInput { look: (0.0, 1e6), ..Default::default() }, 0.016);
        assert!((cam.pitch + PITCH_LIMIT).abs() < 1e-6);
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut cam = Camera::looking_at(Vec3::ZERO, Vec3::NEG_Z, 100.0);
        cam.update(&CameraInput { look: (100.0, 0.0), ..Default::default() }, 0.016);
        assert!(cam.forward().x > 0.0);
    }

    #[test]
    fn forward_moves_horizontally_even_when_looking_down() {
        let mut cam = Camera::looking_at(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 0.0, -5.0), 100.0);
        cam.update(&CameraInput { forward: true, ..Default::default() }, 0.5);
        assert!(approx(cam.position, Vec3::new(0.0, 5.0, -2.0)));
    }

    #[test]
    fn diagonal_motion_is_not_faster() {
        let mut cam = Camera::looking_at(Vec3::ZERO, Vec3::NEG_Z, 100.0);
        cam.update(&CameraInput { forward: true, right: true, up: true, ..Default::default() }, 1.0);
        assert!((cam.position.length() - cam.speed).abs() < 1e-4);
        assert!(cam.position.x > 0.0 && cam.position.y > 0.0 && cam.position.z < 0.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut cam = Camera::looking_at(Vec3::ZERO, Vec3::NEG_Z, 100.0);
        cam.update(&CameraInput { left: true, right: true, ..Default::default() }, 1.0);
        assert_eq!(cam.position, Vec3::ZERO);
    }
}
