mod texture;

pub use texture::{load_texture_image, TextureError, TextureFormat, TextureImage};
#[cfg(target_os = "macos")]
pub use texture::Texture;

use std::time::Instant;

pub struct Timer {
    start: Instant,
    last_update: Instant,
}

impl Timer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_update: now,
        }
    }

    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;
        delta
    }

    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Averages frame times over roughly one second windows.
pub struct FpsCounter {
    frame_times: Vec<f32>,
    window_time: f32,
    current_fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frame_times: Vec::with_capacity(120),
            window_time: 0.0,
            current_fps: 0.0,
        }
    }

    /// Records a frame. Returns the new average once a full second has passed.
    pub fn update(&mut self, delta_time: f32) -> Option<f32> {
        self.frame_times.push(delta_time);
        self.window_time += delta_time;

        if self.window_time < 1.0 {
            return None;
        }

        let avg_frame_time = self.window_time / self.frame_times.len() as f32;
        if avg_frame_time > 0.0 {
            self.current_fps = 1.0 / avg_frame_time;
        }
        self.frame_times.clear();
        self.window_time = 0.0;
        Some(self.current_fps)
    }

    pub fn fps(&self) -> f32 {
        self.current_fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
