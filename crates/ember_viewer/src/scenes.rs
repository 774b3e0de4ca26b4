//! Demo scene construction.

use anyhow::{Context, Result};
use ember_math::Vec3;
use ember_tracer::{Camera, Color, Light, Material, Scene, Shape, Skydome};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoScene {
    /// Mirror-walled showroom: glass sphere wearing a torus, cylinder
    /// rows, pedestal spheres, two spherical lights.
    Showcase,
    /// A few diffuse objects under an environment dome and a point light.
    Skydome,
}

pub fn build(demo: DemoScene, model: Option<&Path>, skydome: Option<&Path>) -> Result<Scene> {
    match demo {
        DemoScene::Showcase => showcase(model),
        DemoScene::Skydome => skydome_scene(model, skydome),
    }
}

/// Frame the chosen scene. Resolution comes from the render settings; only
/// the eye, target, and up hint differ per scene.
pub fn place_camera(camera: &mut Camera, demo: DemoScene) {
    match demo {
        DemoScene::Showcase => {
            camera.position = Vec3::new(0.0, 10.0, -60.0);
            camera.target = Vec3::new(0.0, 0.0, -20.0);
            camera.up = Vec3::Y;
        }
        DemoScene::Skydome => {
            camera.position = Vec3::new(-32.0, 0.0, 40.0);
            camera.target = Vec3::new(10.0, 2.0, 0.0);
            camera.up = Vec3::Y;
        }
    }
    camera.calculate_screen();
}

fn showcase(model: Option<&Path>) -> Result<Scene> {
    let mut scene = Scene::new();

    scene.add_light(Light::sphere(
        Vec3::new(-5.0, 30.0, -20.0),
        6.0,
        Color::ONE,
        1000.0,
    ));
    scene.add_light(Light::sphere(
        Vec3::new(15.0, 30.0, -20.0),
        10.0,
        Color::ONE,
        1000.0,
    ));

    let floor = scene.add_material(Material::diffuse(Color::new(0.5, 0.5, 0.5, 1.0)));
    let white = scene.add_material(Material::diffuse(Color::ONE));
    let mirror = scene.add_material(Material::mirror(Color::new(0.75, 0.8, 0.7, 1.0)));
    let orange = scene.add_material(Material::diffuse(Color::new(0.95, 0.61, 0.07, 1.0)));
    let red = scene.add_material(Material::diffuse(Color::new(0.8, 0.21, 0.19, 1.0)));
    let glass = scene.add_material(Material::dielectric(
        Color::new(0.9, 0.9, 0.9, 1.0),
        1.33,
        0.1,
    ));

    // Floor and a mirror back wall
    scene.add_primitive(
        Shape::plane(Vec3::new(50.0, -10.0, 10.0), Vec3::Y, 100.0),
        floor,
    );
    scene.add_primitive(
        Shape::triangle(
            Vec3::new(50.0, -50.0, 10.0),
            Vec3::new(-50.0, -50.0, 10.0),
            Vec3::new(50.0, 50.0, 10.0),
        ),
        mirror,
    );
    scene.add_primitive(
        Shape::triangle(
            Vec3::new(-50.0, -50.0, 10.0),
            Vec3::new(-50.0, 50.0, 10.0),
            Vec3::new(50.0, 50.0, 10.0),
        ),
        mirror,
    );

    // Centerpiece: glass sphere wearing a tilted torus
    scene.add_primitive(Shape::sphere(Vec3::new(0.0, -5.0, -10.0), 5.0), glass);
    scene.add_primitive(
        Shape::torus(
            Vec3::new(0.0, -5.0, -10.0),
            Vec3::new(-1.0, -1.5, 0.0),
            7.0,
            1.0,
        ),
        orange,
    );

    // Cylinder rows marching away on both sides
    for i in 0..6 {
        let material = if i % 2 == 0 { red } else { glass };
        let x = 10.0 + 3.0 * i as f32;
        let z = -20.0 - 2.0 * i as f32;
        scene.add_primitive(
            Shape::cylinder(Vec3::new(-x, -5.0, z), Vec3::Y, 0.5, 10.0),
            material,
        );
        scene.add_primitive(
            Shape::cylinder(Vec3::new(x, -5.0, z), Vec3::Y, 0.5, 10.0),
            material,
        );
    }

    // Pedestal spheres, with an optional mesh perched on each
    scene.add_primitive(Shape::sphere(Vec3::new(-10.0, -12.0, -30.0), 5.0), white);
    scene.add_primitive(Shape::sphere(Vec3::new(10.0, -12.0, -30.0), 5.0), white);

    if let Some(path) = model {
        let tan = scene.add_material(Material::diffuse(Color::new(1.0, 0.8, 0.5, 1.0)));
        for x in [-10.0, 10.0] {
            scene
                .load_model(path, tan, Vec3::new(x, -7.0, -30.0))
                .with_context(|| format!("loading model {}", path.display()))?;
        }
    }

    Ok(scene)
}

fn skydome_scene(model: Option<&Path>, skydome: Option<&Path>) -> Result<Scene> {
    let mut scene = Scene::new();

    match skydome {
        Some(path) => scene
            .load_skydome(path)
            .with_context(|| format!("loading skydome {}", path.display()))?,
        None => scene.set_skydome(gradient_dome()),
    }

    scene.add_light(Light::point(Vec3::new(-10.0, 0.0, 20.0), Color::ONE, 250.0));

    let red = scene.add_material(Material::diffuse(Color::new(1.0, 0.0, 0.0, 1.0)));
    scene.add_primitive(Shape::sphere(Vec3::new(-25.0, 10.0, 0.0), 5.0), red);

    let tan = scene.add_material(Material::diffuse(Color::new(1.0, 0.8, 0.5, 1.0)));
    if let Some(path) = model {
        for i in 0..3 {
            scene
                .load_model(path, tan, Vec3::new(i as f32 * 40.0, 0.0, 0.0))
                .with_context(|| format!("loading model {}", path.display()))?;
        }
    } else {
        for i in 0..3 {
            scene.add_primitive(
                Shape::sphere(Vec3::new(i as f32 * 40.0, 0.0, 0.0), 8.0),
                tan,
            );
        }
    }

    Ok(scene)
}

/// Fallback environment when no dome image is supplied: a vertical
/// blue-to-warm gradient, bright zenith.
fn gradient_dome() -> Skydome {
    let (width, height) = (64, 32);
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        let t = y as f32 / (height - 1) as f32;
        let sky = Color::new(0.35, 0.55, 0.95, 1.0);
        let horizon = Color::new(0.9, 0.8, 0.7, 1.0);
        let color = sky * (1.0 - t) + horizon * t;
        for _ in 0..width {
            pixels.push(color);
        }
    }
    Skydome::from_pixels(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_showcase_builds_without_assets() {
        let scene = build(DemoScene::Showcase, None, None).unwrap();
        assert!(scene.primitive_count() > 10);
        assert_eq!(scene.lights().len(), 2);
    }

    #[test]
    fn test_skydome_scene_has_fallback_dome() {
        let scene = build(DemoScene::Skydome, None, None).unwrap();
        assert!(scene.skydome().is_some());
        assert_eq!(scene.lights().len(), 1);
    }

    #[test]
    fn test_demo_scene_parses_from_json() {
        let demo: DemoScene = serde_json::from_str("\"showcase\"").unwrap();
        assert_eq!(demo, DemoScene::Showcase);
    }
}
