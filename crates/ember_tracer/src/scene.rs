//! Scene orchestrator.
//!
//! Owns the primitive, material, light, and model lists plus both BVH
//! levels. Every mutating operation rebuilds the affected bottom-level
//! tree and the top-level tree before returning, so a ray can never be
//! traced against a stale acceleration structure.

use crate::bvh::Bvh;
use crate::error::SceneError;
use crate::light::Light;
use crate::material::{Color, Material};
use crate::primitive::{Primitive, Shape};
use crate::skydome::Skydome;
use crate::top_bvh::TopBvh;
use ember_math::{Ray, Vec3};
use std::path::Path;

/// One loaded mesh or standalone primitive: a named inclusive index range
/// into the scene's primitive list. The model's id doubles as the index of
/// its bottom-level tree.
#[derive(Debug, Clone)]
pub struct Model {
    pub id: u32,
    pub name: String,
    pub start: u32,
    pub end: u32,
}

pub struct Scene {
    /// Radiance for rays that miss everything (when no skydome is loaded)
    /// and for terminated paths.
    pub background: Color,

    materials: Vec<Material>,
    primitives: Vec<Primitive>,
    lights: Vec<Light>,
    models: Vec<Model>,
    trees: Vec<Bvh>,
    top: TopBvh,
    skydome: Option<Skydome>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            background: Color::new(0.0, 0.0, 0.0, 1.0),
            materials: Vec::new(),
            primitives: Vec::new(),
            lights: Vec::new(),
            models: Vec::new(),
            trees: Vec::new(),
            top: TopBvh::default(),
            skydome: None,
        }
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Register one standalone primitive as its own model (a bottom-level
    /// tree of a single leaf). Returns the model id.
    pub fn add_primitive(&mut self, shape: Shape, material: usize) -> u32 {
        let id = self.primitives.len() as u32;
        self.primitives.push(Primitive::new(shape, material));
        self.add_model(format!("primitive-{id}"), id, id)
    }

    pub fn add_light(&mut self, light: Light) -> u32 {
        self.lights.push(light);
        self.lights.len() as u32 - 1
    }

    /// Load a triangle mesh from an OBJ file, offset by `translation`, as
    /// one model under `material`. Returns the model id.
    pub fn load_model<P: AsRef<Path>>(
        &mut self,
        path: P,
        material: usize,
        translation: Vec3,
    ) -> Result<u32, SceneError> {
        let path = path.as_ref();
        let (meshes, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
        )
        .map_err(|source| SceneError::Mesh {
            path: path.to_path_buf(),
            source,
        })?;

        let start = self.primitives.len() as u32;
        for mesh in meshes.iter().map(|m| &m.mesh) {
            for face in mesh.indices.chunks_exact(3) {
                let vertex = |i: u32| {
                    let i = i as usize * 3;
                    Vec3::new(
                        mesh.positions[i],
                        mesh.positions[i + 1],
                        mesh.positions[i + 2],
                    ) + translation
                };
                self.primitives.push(Primitive::new(
                    Shape::triangle(vertex(face[0]), vertex(face[1]), vertex(face[2])),
                    material,
                ));
            }
        }

        let end = self.primitives.len() as u32;
        if end == start {
            return Err(SceneError::EmptyMesh {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mesh".to_owned());

        log::info!("loaded {} ({} triangles)", path.display(), end - start);
        Ok(self.add_model(name, start, end - 1))
    }

    /// Rigidly move a model: translate every primitive in its range, then
    /// rebuild its bottom-level tree and the top-level tree. A full
    /// rebuild is preferred over shifting cached boxes; it cannot go stale.
    pub fn translate_model(&mut self, id: u32, offset: Vec3) -> Result<(), SceneError> {
        let model = self
            .models
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(SceneError::UnknownModel(id))?;

        for primitive in &mut self.primitives[model.start as usize..=model.end as usize] {
            primitive.translate(offset);
        }

        self.trees[model.id as usize] = Bvh::build(&self.primitives, model.start, model.end);
        self.top = TopBvh::build(&self.trees);
        Ok(())
    }

    pub fn load_skydome<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SceneError> {
        self.skydome = Some(Skydome::load(path)?);
        Ok(())
    }

    pub fn set_skydome(&mut self, skydome: Skydome) {
        self.skydome = Some(skydome);
    }

    pub fn skydome(&self) -> Option<&Skydome> {
        self.skydome.as_ref()
    }

    /// Drop every primitive, light, model, tree, and the skydome.
    pub fn clear(&mut self) {
        self.materials.clear();
        self.primitives.clear();
        self.lights.clear();
        self.models.clear();
        self.trees.clear();
        self.top = TopBvh::default();
        self.skydome = None;
        log::info!("scene cleared");
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn primitive(&self, id: u32) -> &Primitive {
        &self.primitives[id as usize]
    }

    pub fn material_of(&self, primitive_id: u32) -> &Material {
        &self.materials[self.primitives[primitive_id as usize].material]
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Nearest primitive hit via the two-level hierarchy (or occlusion
    /// existence for shadow rays).
    pub fn intersect_primitives(&self, ray: &mut Ray, is_shadow_ray: bool) {
        self.top
            .traverse(&self.primitives, &self.trees, ray, is_shadow_ray);
    }

    /// Lights are few; tested linearly, outside the BVH.
    pub fn intersect_lights(&self, ray: &mut Ray) {
        for (id, light) in self.lights.iter().enumerate() {
            light.intersect(id as u32, ray);
        }
    }

    fn add_model(&mut self, name: String, start: u32, end: u32) -> u32 {
        let id = self.trees.len() as u32;
        self.trees.push(Bvh::build(&self.primitives, start, end));
        self.models.push(Model {
            id,
            name,
            start,
            end,
        });
        self.top = TopBvh::build(&self.trees);
        id
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
