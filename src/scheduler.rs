//! Per-frame animation scheduler.
//!
//! One [`AnimationScheduler::tick`] per display refresh: advance the clock,
//! integrate look input, update the primary body, the orbiters and the floor
//! in that order, then issue exactly one render call. Missing entities are
//! skipped; nothing in a tick can stop the loop.

use std::time::Instant;

use glam::Vec3;

use crate::bodies;
use crate::camera::Camera;
use crate::clock::{Clock, FrameTime};
use crate::distance;
use crate::feed::{Acquisition, CameraFeed};
use crate::look::{LookController, LookIntegrator, SpectatorIntegrator};
use crate::orbit;
use crate::params::{DistanceMapping, OrbitSpec, SceneLayout};
use crate::scene::{names, EntityId, Scene, SceneContext};

/// Render capability of the external backend
pub trait RenderFrame {
    /// Draw one frame; failures are the backend's to report
    fn render_frame(&mut self, scene: &Scene, camera: &Camera);
}

/// The body the observer faces and lights
#[derive(Debug)]
pub enum PrimaryBody {
    CameraFeed(CameraFeed),
    Fallback(EntityId),
}

impl PrimaryBody {
    pub fn entity(&self) -> EntityId {
        match self {
            Self::CameraFeed(feed) => feed.entity(),
            Self::Fallback(id) => *id,
        }
    }

    /// Resolve a finished acquisition, adding the fallback body on failure
    pub fn from_acquisition(
        acquisition: Acquisition,
        scene: &mut Scene,
        layout: &SceneLayout,
    ) -> Self {
        match acquisition {
            Acquisition::Succeeded(feed) => Self::CameraFeed(feed),
            Acquisition::Failed(e) => {
                log::warn!("Camera unavailable ({}), using fallback body", e);
                Self::Fallback(scene.add_entity(bodies::fallback_primary(layout)))
            }
        }
    }
}

/// A body whose position comes entirely from its orbit
#[derive(Debug, Clone, Copy)]
pub struct OrbitingBody {
    pub entity: EntityId,
    pub orbit: OrbitSpec,
}

/// Drives every registered entity once per frame
#[derive(Debug)]
pub struct AnimationScheduler<I = SpectatorIntegrator> {
    clock: Clock,
    look: LookController<I>,
    primary: Option<PrimaryBody>,
    orbiters: Vec<OrbitingBody>,
    floor: Option<EntityId>,
    mapping: DistanceMapping,
    light_direction: Vec3,
    frames_rendered: u64,
}

impl<I: LookIntegrator> AnimationScheduler<I> {
    pub fn new(clock: Clock, look: LookController<I>, layout: &SceneLayout) -> Self {
        Self {
            clock,
            look,
            primary: None,
            orbiters: Vec::new(),
            floor: None,
            mapping: DistanceMapping::default(),
            light_direction: Vec3::from_array(layout.light_direction).normalize_or_zero(),
            frames_rendered: 0,
        }
    }

    pub fn with_mapping(mut self, mapping: DistanceMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Install the primary body, returning the previous camera feed if any
    ///
    /// The replaced body's entity is always removed from the scene so only
    /// one primary body exists. A replaced camera feed is handed back with
    /// its stream still live; the caller decides whether to stop it.
    #[must_use = "dropping a replaced camera feed stops its camera"]
    pub fn install_primary(
        &mut self,
        scene: &mut Scene,
        primary: PrimaryBody,
    ) -> Option<PrimaryBody> {
        let previous = self.primary.replace(primary)?;
        scene.remove_entity(previous.entity());
        match previous {
            PrimaryBody::Fallback(_) => None,
            feed @ PrimaryBody::CameraFeed(_) => Some(feed),
        }
    }

    pub fn add_orbiter(&mut self, entity: EntityId, orbit: OrbitSpec) {
        self.orbiters.push(OrbitingBody { entity, orbit });
    }

    pub fn set_floor(&mut self, entity: EntityId) {
        self.floor = Some(entity);
    }

    /// Add the orbiters and floor to the scene and register them
    pub fn populate(&mut self, scene: &mut Scene, layout: &SceneLayout) {
        let id_orbit = OrbitSpec::id();
        let superego_orbit = OrbitSpec::superego();

        let id = scene.add_entity(bodies::id_body(layout, &id_orbit));
        self.add_orbiter(id, id_orbit);
        let superego = scene.add_entity(bodies::superego_body(layout, &superego_orbit));
        self.add_orbiter(superego, superego_orbit);

        let floor = scene.add_entity(bodies::floor(layout));
        self.set_floor(floor);
    }

    pub fn primary(&self) -> Option<&PrimaryBody> {
        self.primary.as_ref()
    }

    pub fn camera_feed(&self) -> Option<&CameraFeed> {
        match &self.primary {
            Some(PrimaryBody::CameraFeed(feed)) => Some(feed),
            _ => None,
        }
    }

    pub fn camera_feed_mut(&mut self) -> Option<&mut CameraFeed> {
        match &mut self.primary {
            Some(PrimaryBody::CameraFeed(feed)) => Some(feed),
            _ => None,
        }
    }

    pub fn orbiters(&self) -> &[OrbitingBody] {
        &self.orbiters
    }

    pub fn look(&self) -> &LookController<I> {
        &self.look
    }

    pub fn look_mut(&mut self) -> &mut LookController<I> {
        &mut self.look
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Run one frame against wall time
    pub fn tick(&mut self, ctx: &mut SceneContext, renderer: &mut dyn RenderFrame) -> FrameTime {
        let time = self.clock.advance();
        self.run_frame(ctx, renderer, time);
        time
    }

    /// Run one frame with the clock advanced to `now`
    pub fn tick_at(
        &mut self,
        ctx: &mut SceneContext,
        renderer: &mut dyn RenderFrame,
        now: Instant,
    ) -> FrameTime {
        let time = self.clock.advance_to(now);
        self.run_frame(ctx, renderer, time);
        time
    }

    fn run_frame(
        &mut self,
        ctx: &mut SceneContext,
        renderer: &mut dyn RenderFrame,
        time: FrameTime,
    ) {
        self.look.update(&mut ctx.camera, time.delta_s);

        let primary_pos = self.update_primary(ctx, time.elapsed_s);
        self.update_orbiters(ctx, time.elapsed_s);
        self.update_floor(&mut ctx.scene, time.elapsed_s, primary_pos);

        renderer.render_frame(&ctx.scene, &ctx.camera);
        self.frames_rendered += 1;
    }

    /// Animate the primary body and keep it facing and lit from the camera
    fn update_primary(&self, ctx: &mut SceneContext, elapsed_s: f32) -> Option<Vec3> {
        let primary = self.primary.as_ref()?;
        let camera_pos = ctx.camera.position;
        let light_dir = ctx.camera.direction_to_view(self.light_direction);

        match primary {
            PrimaryBody::CameraFeed(feed) => {
                feed.animate(&mut ctx.scene, elapsed_s);
            }
            PrimaryBody::Fallback(id) => {
                if let Some(entity) = ctx.scene.get_mut(*id) {
                    entity.params.set_scalar(names::TIME, elapsed_s);
                }
            }
        }

        let Some(entity) = ctx.scene.get_mut(primary.entity()) else {
            log::trace!("Primary body missing, skipped");
            return None;
        };
        entity.orientation = orbit::facing(entity.position, camera_pos);
        entity.params.set_vec3(names::LIGHT_DIR, light_dir);
        Some(entity.position)
    }

    fn update_orbiters(&self, ctx: &mut SceneContext, elapsed_s: f32) {
        let camera_pos = ctx.camera.position;
        for body in &self.orbiters {
            let Some(entity) = ctx.scene.get_mut(body.entity) else {
                log::trace!("Orbiter {:?} missing, skipped", body.entity);
                continue;
            };
            let position = orbit::position(elapsed_s, &body.orbit);
            entity.position = position;
            entity.orientation = orbit::facing(position, orbit::FOCAL_POINT);

            let intensity = distance::intensity(Some(position), Some(camera_pos), &self.mapping);
            entity.params.set_scalar(names::USER_DIST, intensity);
            entity.params.set_scalar(names::TIME, elapsed_s);
        }
    }

    fn update_floor(&self, scene: &mut Scene, elapsed_s: f32, primary_pos: Option<Vec3>) {
        let Some(floor) = self.floor.and_then(|id| scene.get_mut(id)) else {
            return;
        };
        floor.params.set_scalar(names::TIME, elapsed_s);
        if let Some(pos) = primary_pos {
            floor.params.set_vec3(names::EGO_POS, pos);
        }
    }

    /// Release the camera; the scheduler never does this on its own
    pub fn teardown(&mut self) {
        if let Some(feed) = self.camera_feed_mut() {
            feed.stop_camera();
        }
    }
}
