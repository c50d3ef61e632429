//! Scene graph: entities, their material parameters and the frame context.
//!
//! The scene exclusively owns every entity. Other systems hold [`EntityId`]s
//! and look entities up each frame, so a stale id is simply a miss.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use glam::{Mat4, Quat, Vec3};
use image::RgbaImage;

use crate::camera::Camera;
use crate::params::RenderConfig;

/// Material parameter names shared with the shader programs
pub mod names {
    pub const TIME: &str = "uTime";
    pub const COLOR: &str = "uColor";
    pub const USER_DIST: &str = "userDist";
    pub const CAMERA_OPACITY: &str = "uCameraOpacity";
    pub const DISTORTION: &str = "uDistortion";
    pub const LIGHT_DIR: &str = "uLightDir";
    pub const EGO_POS: &str = "uEgoPos";
    pub const EGO_COLOR: &str = "uEgoColor";
    pub const EGO_RADIUS: &str = "uEgoRadius";
}

/// Handle to an entity owned by a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

/// A single material parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Scalar(f32),
    Vec3(Vec3),
}

/// Named values an entity exposes to its material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    values: BTreeMap<&'static str, ParamValue>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, name: &'static str, value: f32) -> Self {
        self.set_scalar(name, value);
        self
    }

    pub fn with_vec3(mut self, name: &'static str, value: Vec3) -> Self {
        self.set_vec3(name, value);
        self
    }

    pub fn set_scalar(&mut self, name: &'static str, value: f32) {
        self.values.insert(name, ParamValue::Scalar(value));
    }

    pub fn set_vec3(&mut self, name: &'static str, value: Vec3) {
        self.values.insert(name, ParamValue::Vec3(value));
    }

    /// Scalar value, `None` if absent or not a scalar
    pub fn scalar(&self, name: &str) -> Option<f32> {
        match self.values.get(name) {
            Some(ParamValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    /// Vector value, `None` if absent or not a vector
    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.values.get(name) {
            Some(ParamValue::Vec3(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParamValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// Which shader program draws an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    /// Rippling ocean floor with the primary body's imprint
    Floor,
    /// Primary body, optionally blended with a live camera feed
    Primary,
    /// Molten orbiter
    Id,
    /// Golden orbiter
    Superego,
}

/// Geometry descriptor; meshes are built by the rendering backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius_m: f32 },
    Plane { size_m: f32, segments: u32 },
}

/// Latest decoded video frame, shared between a stream and its texture
///
/// Writers publish whole frames; readers take a cheap snapshot of the
/// most recent one.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot(Arc<Mutex<Option<Arc<RgbaImage>>>>);

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: RgbaImage) {
        let mut slot = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(Arc::new(frame));
    }

    pub fn latest(&self) -> Option<Arc<RgbaImage>> {
        match self.0.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Texture backed by a live frame slot
///
/// `version` increases each time the texture is marked stale; the renderer
/// re-uploads when it sees a version it has not uploaded yet.
#[derive(Debug, Clone)]
pub struct VideoTexture {
    frames: FrameSlot,
    version: u64,
}

impl VideoTexture {
    pub fn new(frames: FrameSlot) -> Self {
        Self { frames, version: 0 }
    }

    /// Request a refresh from the latest decoded frame
    pub fn mark_needs_update(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn frames(&self) -> &FrameSlot {
        &self.frames
    }
}

/// Any animatable body in the scene
#[derive(Debug, Clone)]
pub struct Entity {
    /// Debug label
    pub name: &'static str,
    pub position: Vec3,
    pub orientation: Quat,
    pub shape: Shape,
    pub material: Material,
    pub params: ParameterMap,
    pub texture: Option<VideoTexture>,
}

impl Entity {
    pub fn new(name: &'static str, shape: Shape, material: Material) -> Self {
        Self {
            name,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            shape,
            material,
            params: ParameterMap::new(),
            texture: None,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_params(mut self, params: ParameterMap) -> Self {
        self.params = params;
        self
    }

    pub fn with_texture(mut self, texture: VideoTexture) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Object-to-world transform
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

/// Owner of all entities
#[derive(Debug, Default)]
pub struct Scene {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, entity);
        id
    }

    /// Remove and return an entity; removing an unknown id is a no-op
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Everything a frame reads and writes: the scene and the observer
#[derive(Debug)]
pub struct SceneContext {
    pub scene: Scene,
    pub camera: Camera,
}

impl SceneContext {
    pub fn new(render_config: &RenderConfig) -> Self {
        Self {
            scene: Scene::new(),
            camera: Camera::new(render_config),
        }
    }

    /// Viewport resized (pixels)
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(name: &'static str) -> Entity {
        Entity::new(name, Shape::Sphere { radius_m: 1.0 }, Material::Id)
    }

    #[test]
    fn test_add_and_remove_entities() {
        let mut scene = Scene::new();
        let a = scene.add_entity(sphere("a"));
        let b = scene.add_entity(sphere("b"));
        assert_ne!(a, b);
        assert_eq!(scene.len(), 2);

        let removed = scene.remove_entity(a).map(|e| e.name);
        assert_eq!(removed, Some("a"));
        assert!(scene.get(a).is_none());
        assert!(scene.remove_entity(a).is_none());
        assert!(scene.contains(b));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.add_entity(sphere("a"));
        scene.remove_entity(a);
        let b = scene.add_entity(sphere("b"));
        assert_ne!(a, b);
        assert!(scene.get(a).is_none());
    }

    #[test]
    fn test_parameter_map_types() {
        let mut params = ParameterMap::new().with_scalar(names::TIME, 1.0);
        params.set_vec3(names::LIGHT_DIR, Vec3::Y);

        assert_eq!(params.scalar(names::TIME), Some(1.0));
        assert_eq!(params.vec3(names::LIGHT_DIR), Some(Vec3::Y));
        // Wrong type reads as absent
        assert_eq!(params.vec3(names::TIME), None);
        assert_eq!(params.scalar(names::USER_DIST), None);
    }

    #[test]
    fn test_video_texture_version_bumps() {
        let mut texture = VideoTexture::new(FrameSlot::new());
        assert_eq!(texture.version(), 0);
        texture.mark_needs_update();
        texture.mark_needs_update();
        assert_eq!(texture.version(), 2);
    }

    #[test]
    fn test_frame_slot_shares_latest_frame() {
        let slot = FrameSlot::new();
        let reader = slot.clone();
        assert!(reader.latest().is_none());

        slot.publish(RgbaImage::new(4, 2));
        let frame = reader.latest().map(|f| f.dimensions());
        assert_eq!(frame, Some((4, 2)));
    }
}
