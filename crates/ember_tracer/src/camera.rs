//! Pinhole camera.
//!
//! Parameterized by a position, a view target, and an up hint; the screen
//! rectangle is recomputed whenever the camera moves. The core treats this
//! as an opaque ray source.

use ember_math::{Ray, Vec3};

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    pub up: Vec3,
    /// Distance from the eye to the screen plane; larger = narrower view.
    pub field_of_view: f32,

    pub image_width: u32,
    pub image_height: u32,

    // Screen corners, cached by calculate_screen()
    top_left: Vec3,
    top_right: Vec3,
    bottom_left: Vec3,
    forward: Vec3,
    right: Vec3,
}

impl Camera {
    pub fn new(image_width: u32, image_height: u32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
            field_of_view: 1.0,
            image_width,
            image_height,
            top_left: Vec3::ZERO,
            top_right: Vec3::ZERO,
            bottom_left: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
        };
        camera.calculate_screen();
        camera
    }

    pub fn with_position(mut self, position: Vec3, target: Vec3, up: Vec3) -> Self {
        self.position = position;
        self.target = target;
        self.up = up;
        self.calculate_screen();
        self
    }

    /// Recompute the screen rectangle. Must be called after mutating any
    /// positional field directly.
    pub fn calculate_screen(&mut self) {
        self.forward = (self.target - self.position).normalize();
        self.right = self.up.cross(self.forward).normalize();
        let up = self.forward.cross(self.right);

        let aspect = self.image_height as f32 / self.image_width as f32;
        let center = self.position + self.field_of_view * self.forward;

        self.top_left = center - self.right + up * aspect;
        self.top_right = center + self.right + up * aspect;
        self.bottom_left = center - self.right - up * aspect;
    }

    /// Primary ray through fractional pixel coordinates.
    pub fn generate_ray(&self, x: f32, y: f32) -> Ray {
        let u = x / self.image_width as f32;
        let v = y / self.image_height as f32;

        let point = self.top_left
            + u * (self.top_right - self.top_left)
            + v * (self.bottom_left - self.top_left);

        Ray::new(self.position, (point - self.position).normalize())
    }

    /// Move the eye and target together.
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        self.target += offset;
        self.calculate_screen();
    }
}
