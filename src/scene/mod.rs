use crate::config::CameraConfig;
use crate::input::InputState;
use crate::math::{Mat4, Vec3};
use winit::keyboard::KeyCode;

const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Free-fly camera driven by WASD/QE and mouse look.
pub struct FlyCamera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    fov_y: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    move_speed: f32,
    fast_multiplier: f32,
    mouse_sensitivity: f32,
}

impl FlyCamera {
    #[must_use]
    pub fn new(position: Vec3, aspect_ratio: f32) -> Self {
        Self::from_config(&CameraConfig::default(), aspect_ratio).with_position(position)
    }

    #[must_use]
    pub fn from_config(config: &CameraConfig, aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::from(config.position),
            yaw: config.yaw,
            pitch: config.pitch.clamp(-MAX_PITCH, MAX_PITCH),
            fov_y: config.fov_degrees.to_radians(),
            aspect_ratio,
            near: config.near,
            far: config.far,
            move_speed: config.move_speed,
            fast_multiplier: config.fast_multiplier,
            mouse_sensitivity: config.mouse_sensitivity,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Unit view direction. Yaw 0 / pitch 0 looks down -Z.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.forward().cross(&Vec3::up()).normalize()
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Applies a mouse delta in pixels. Moving right turns right, moving up looks up.
    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * self.mouse_sensitivity;
        self.pitch = (self.pitch - delta_y * self.mouse_sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Moves and turns the camera from this frame's input.
    ///
    /// Mouse look is applied only when `mouse_look` is set, i.e. while the
    /// cursor is captured by the window.
    pub fn update(&mut self, input: &InputState, delta_time: f32, mouse_look: bool) {
        if mouse_look {
            let (dx, dy) = input.mouse_delta();
            if dx != 0.0 || dy != 0.0 {
                self.rotate(dx, dy);
            }
        }

        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };

        let forward_input = axis(input.key_held(KeyCode::KeyW), input.key_held(KeyCode::KeyS));
        let right_input = axis(input.key_held(KeyCode::KeyD), input.key_held(KeyCode::KeyA));
        let up_input = axis(
            input.key_held(KeyCode::KeyE) || input.key_held(KeyCode::Space),
            input.key_held(KeyCode::KeyQ),
        );

        let direction = self.forward() * forward_input
            + self.right() * right_input
            + Vec3::up() * up_input;
        if direction.length() <= f32::EPSILON {
            return;
        }

        let mut speed = self.move_speed;
        if input.shift() {
            speed *= self.fast_multiplier;
        }
        self.position += direction.normalize() * (speed * delta_time);
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        let target = self.position + self.forward();
        Mat4::look_at(&self.position, &target, &Vec3::up())
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix().multiply(&self.view_matrix())
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::ModifiersState;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = FlyCamera::new(Vec3::zero(), 1.0);
        let forward = camera.forward();
        assert!(approx(forward.z, -1.0));
        let right = camera.right();
        assert!(approx(right.x, 1.0));
    }

    #[test]
    fn test_forward_movement() {
        let mut camera = FlyCamera::new(Vec3::new(0.0, 0.0, 3.0), 1.0);
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyW);

        camera.update(&input, 1.0, false);
        assert!(approx(camera.position().z, 3.0 - 2.5));
        assert!(approx(camera.position().x, 0.0));
    }

    #[test]
    fn test_shift_speeds_up() {
        let mut camera = FlyCamera::new(Vec3::zero(), 1.0);
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyD);
        input.set_modifiers(ModifiersState::SHIFT);

        camera.update(&input, 0.5, false);
        assert!(approx(camera.position().x, 2.5 * 4.0 * 0.5));
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut camera = FlyCamera::new(Vec3::zero(), 1.0);
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyE);
        input.key_down(KeyCode::KeyQ);

        camera.update(&input, 1.0, false);
        assert_eq!(camera.position(), Vec3::zero());
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FlyCamera::new(Vec3::zero(), 1.0);
        camera.rotate(0.0, -100_000.0);
        assert!(approx(camera.pitch(), MAX_PITCH));
        camera.rotate(0.0, 100_000.0);
        assert!(approx(camera.pitch(), -MAX_PITCH));
    }

    #[test]
    fn test_mouse_look_only_when_captured() {
        let mut camera = FlyCamera::new(Vec3::zero(), 1.0);
        let mut input = InputState::new();
        input.add_mouse_motion(100.0, 0.0);

        camera.update(&input, 0.016, false);
        assert_eq!(camera.yaw(), 0.0);

        camera.update(&input, 0.016, true);
        assert!(approx(camera.yaw(), 100.0 * 0.0025));
    }

    #[test]
    fn test_matrices() {
        let camera = FlyCamera::new(Vec3::new(5.0, 5.0, 5.0), 16.0 / 9.0);
        assert_ne!(camera.view_matrix(), Mat4::identity());
        assert_ne!(camera.projection_matrix(), Mat4::identity());
        assert_ne!(camera.view_matrix(), camera.projection_matrix());
    }
}
