//! Builders for the scene's bodies and their initial material parameters.

use glam::Vec3;

use crate::orbit;
use crate::params::{FeedConfig, OrbitSpec, SceneLayout};
use crate::scene::{names, Entity, FrameSlot, Material, ParameterMap, Shape, VideoTexture};

fn base_params(layout: &SceneLayout) -> ParameterMap {
    ParameterMap::new()
        .with_scalar(names::TIME, 0.0)
        .with_vec3(names::COLOR, Vec3::from_array(layout.primary_color))
}

fn primary_shape(layout: &SceneLayout) -> Shape {
    Shape::Sphere {
        radius_m: layout.primary_radius_m,
    }
}

/// Primary body textured with a live camera feed
pub fn camera_fed_primary(layout: &SceneLayout, config: &FeedConfig, frames: FrameSlot) -> Entity {
    let params = base_params(layout)
        .with_scalar(names::CAMERA_OPACITY, config.default_opacity)
        .with_scalar(names::DISTORTION, config.default_distortion)
        .with_vec3(
            names::LIGHT_DIR,
            Vec3::from_array(layout.light_direction).normalize_or_zero(),
        );

    Entity::new("ego", primary_shape(layout), Material::Primary)
        .with_params(params)
        .with_texture(VideoTexture::new(frames))
}

/// Primary body used when no camera is available
pub fn fallback_primary(layout: &SceneLayout) -> Entity {
    let params = base_params(layout).with_vec3(
        names::LIGHT_DIR,
        Vec3::from_array(layout.light_direction).normalize_or_zero(),
    );
    Entity::new("ego-fallback", primary_shape(layout), Material::Primary).with_params(params)
}

fn orbiter(
    name: &'static str,
    material: Material,
    layout: &SceneLayout,
    spec: &OrbitSpec,
    initial_intensity: f32,
) -> Entity {
    let position = orbit::position(0.0, spec);
    let params = base_params(layout).with_scalar(names::USER_DIST, initial_intensity);
    Entity::new(
        name,
        Shape::Sphere {
            radius_m: layout.orbiter_radius_m,
        },
        material,
    )
    .with_position(position)
    .with_orientation(orbit::facing(position, orbit::FOCAL_POINT))
    .with_params(params)
}

/// Molten orbiter
pub fn id_body(layout: &SceneLayout, spec: &OrbitSpec) -> Entity {
    orbiter("id", Material::Id, layout, spec, layout.id_initial_intensity)
}

/// Golden orbiter
pub fn superego_body(layout: &SceneLayout, spec: &OrbitSpec) -> Entity {
    orbiter(
        "superego",
        Material::Superego,
        layout,
        spec,
        layout.superego_initial_intensity,
    )
}

/// Ocean floor plane with the primary body's imprint
pub fn floor(layout: &SceneLayout) -> Entity {
    let params = ParameterMap::new()
        .with_scalar(names::TIME, 0.0)
        .with_vec3(names::EGO_POS, Vec3::ZERO)
        .with_vec3(names::EGO_COLOR, Vec3::from_array(layout.primary_color))
        .with_scalar(names::EGO_RADIUS, layout.imprint_radius_m);

    Entity::new(
        "floor",
        Shape::Plane {
            size_m: layout.floor_size_m,
            segments: layout.floor_segments,
        },
        Material::Floor,
    )
    .with_position(Vec3::new(0.0, layout.floor_height_m, 0.0))
    .with_params(params)
}
