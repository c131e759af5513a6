use mesh_viewer::config::ViewerConfig;
use mesh_viewer::input::InputState;
use mesh_viewer::math::{Mat4, Vec3, Vec4};
use mesh_viewer::scene::FlyCamera;
use winit::keyboard::KeyCode;

#[test]
fn test_camera_projects_target_into_view_volume() {
    let camera = FlyCamera::new(Vec3::new(0.0, 0.0, 3.0), 16.0 / 9.0);

    let view_proj = camera.view_projection_matrix();
    assert_ne!(view_proj, Mat4::identity());
    assert_ne!(camera.view_matrix(), camera.projection_matrix());

    // The origin sits straight ahead of the default camera
    let clip = view_proj.multiply_vec4(&Vec4::new(0.0, 0.0, 0.0, 1.0));
    assert!(clip.w > 0.0);
    let ndc = Vec3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w);
    assert!(ndc.x.abs() < 1e-5);
    assert!(ndc.y.abs() < 1e-5);
    assert!(ndc.z > 0.0 && ndc.z < 1.0);

    // Behind the camera is outside
    let behind = view_proj.multiply_vec4(&Vec4::new(0.0, 0.0, 10.0, 1.0));
    assert!(behind.w < 0.0);
}

#[test]
fn test_camera_flies_with_held_keys() {
    let config = ViewerConfig::default();
    let mut camera = FlyCamera::from_config(&config.camera, 1.0);
    let mut input = InputState::new();

    input.key_down(KeyCode::KeyW);
    camera.update(&input, 1.0, false);
    input.end_frame();

    // One second forward at the configured speed, straight down -Z
    let moved = camera.position();
    let start = Vec3::from(config.camera.position);
    assert!((start.z - moved.z - config.camera.move_speed).abs() < 1e-4);
    assert!((moved.x - start.x).abs() < 1e-5);

    // Releasing stops the camera
    input.key_up(KeyCode::KeyW);
    camera.update(&input, 1.0, false);
    assert_eq!(camera.position(), moved);
}

#[test]
fn test_mouse_look_only_while_captured() {
    let mut camera = FlyCamera::new(Vec3::new(0.0, 0.0, 0.0), 1.0);
    let mut input = InputState::new();
    input.add_mouse_motion(100.0, 0.0);

    camera.update(&input, 0.016, false);
    assert_eq!(camera.yaw(), 0.0);

    camera.update(&input, 0.016, true);
    assert!(camera.yaw() > 0.0);
}

#[test]
fn test_translation_composes_with_view() {
    let translate = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
    let point = translate.multiply_vec4(&Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(point, Vec4::new(2.0, 2.0, 3.0, 1.0));

    // Translating and then viewing from the translated position cancels out
    let eye = Vec3::new(1.0, 2.0, 3.0);
    let view = Mat4::look_at(&eye, &Vec3::new(1.0, 2.0, 0.0), &Vec3::up());
    let combined = view.multiply(&translate);
    let origin = combined.multiply_vec4(&Vec4::new(0.0, 0.0, 0.0, 1.0));
    assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5 && origin.z.abs() < 1e-5);
}
