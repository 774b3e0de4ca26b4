//! Progressive per-pixel radiance accumulator.
//!
//! One running radiance sum per pixel plus a global sample counter. The
//! display average divides by the counter through a reciprocal cached once
//! per pass. Reset whenever the camera or scene changes, since accumulated
//! samples assume both are fixed.

use crate::material::Color;

pub struct Accumulator {
    width: usize,
    buffer: Vec<Color>,
    counter: u32,
    inv_counter: f32,
}

impl Accumulator {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            buffer: vec![Color::ZERO; width * height],
            counter: 0,
            inv_counter: 0.0,
        }
    }

    /// Samples accumulated per pixel so far.
    pub fn samples(&self) -> u32 {
        self.counter
    }

    /// Bump the sample counter before a render pass and refresh the cached
    /// reciprocal used for averaging.
    pub fn increase(&mut self) {
        self.counter += 1;
        self.inv_counter = 1.0 / self.counter as f32;
    }

    /// Zero the sums and counter. Required after any camera or scene
    /// mutation.
    pub fn reset(&mut self) {
        self.buffer.fill(Color::ZERO);
        self.counter = 0;
        self.inv_counter = 0.0;
    }

    /// Raw pixel sums, row-major. The render loop splits this into
    /// disjoint row chunks for its fork/join workers.
    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.buffer
    }

    /// Current average radiance of one pixel.
    pub fn average(&self, x: usize, y: usize) -> Color {
        self.buffer[y * self.width + x] * self.inv_counter
    }

    /// Resolve the averaged buffer to 8-bit RGBA with a brightness factor
    /// and sqrt gamma.
    pub fn to_rgba(&self, brightness: f32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.buffer.len() * 4);
        for color in &self.buffer {
            let c = *color * self.inv_counter;
            bytes.push(tonemap_channel(c.x, brightness));
            bytes.push(tonemap_channel(c.y, brightness));
            bytes.push(tonemap_channel(c.z, brightness));
            bytes.push(255);
        }
        bytes
    }
}

#[inline]
fn tonemap_channel(linear: f32, brightness: f32) -> u8 {
    (256.0 * brightness * linear.max(0.0).sqrt()).min(255.0) as u8
}
