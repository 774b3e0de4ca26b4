//! Ember tracing core - progressive CPU path tracing.
//!
//! A Monte Carlo path tracer built around a two-level bounding volume
//! hierarchy: one bottom-level tree per loaded model (or standalone
//! primitive), composed under a top-level tree that is rebuilt whenever
//! the model set changes. Radiance estimates accumulate per pixel across
//! render passes until the scene or camera moves.

mod accumulator;
mod bvh;
mod camera;
mod error;
mod integrator;
mod light;
mod material;
mod primitive;
mod renderer;
mod scene;
mod skydome;
mod top_bvh;

pub use accumulator::Accumulator;
pub use bvh::Bvh;
pub use camera::Camera;
pub use error::SceneError;
pub use integrator::{sample, sample_nee, MAX_NEE_DEPTH, MAX_PATH_DEPTH};
pub use light::Light;
pub use material::{Color, Material, MaterialKind};
pub use primitive::{Primitive, Shape};
pub use renderer::{Renderer, RenderSettings, SamplingMode};
pub use scene::{Model, Scene};
pub use skydome::Skydome;
pub use top_bvh::TopBvh;

/// Re-export common math types from ember_math
pub use ember_math::{Aabb, Hit, Ray, Vec3, Vec4, EPSILON};
