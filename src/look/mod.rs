//! First-person navigation gated by pointer capture.
//!
//! The controller starts `Disabled`. Capture-acquired enables it, capture-lost
//! disables it again; nothing else changes the state. Input arriving while
//! disabled is dropped, and both transitions discard whatever was pending so
//! a lock/unlock burst never leaves a partially applied frame behind.

mod spectator;

pub use spectator::SpectatorIntegrator;

use glam::Vec2;

use crate::camera::Camera;

/// Gate on input integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Disabled,
    Enabled,
}

/// Movement keys tracked by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

/// Currently held movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MovementKeys {
    fn set(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Back => self.back = pressed,
            MoveKey::Left => self.left = pressed,
            MoveKey::Right => self.right = pressed,
            MoveKey::Up => self.up = pressed,
            MoveKey::Down => self.down = pressed,
        }
    }

    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right || self.up || self.down
    }
}

/// Input consumed by one integration step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LookInput {
    /// Raw pointer motion accumulated since the last step (pixels)
    pub look_delta: Vec2,
    pub movement: MovementKeys,
}

/// Turns one frame of input into a camera transform change
pub trait LookIntegrator {
    fn integrate(&mut self, camera: &mut Camera, input: &LookInput, delta_s: f32);
}

/// Pointer-capture gated look controller
#[derive(Debug)]
pub struct LookController<I = SpectatorIntegrator> {
    state: ControlState,
    pending_delta: Vec2,
    keys: MovementKeys,
    integrator: I,
}

impl<I: LookIntegrator> LookController<I> {
    pub fn new(integrator: I) -> Self {
        Self {
            state: ControlState::Disabled,
            pending_delta: Vec2::ZERO,
            keys: MovementKeys::default(),
            integrator,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == ControlState::Enabled
    }

    /// Pointer capture acquired
    pub fn on_capture_acquired(&mut self) {
        if self.state == ControlState::Enabled {
            return;
        }
        self.clear_pending();
        self.state = ControlState::Enabled;
        log::info!("Look control enabled");
    }

    /// Pointer capture lost
    pub fn on_capture_lost(&mut self) {
        if self.state == ControlState::Disabled {
            return;
        }
        self.clear_pending();
        self.state = ControlState::Disabled;
        log::info!("Look control disabled");
    }

    /// Accumulate raw pointer motion (pixels); dropped while disabled
    pub fn push_look_delta(&mut self, dx: f32, dy: f32) {
        if self.is_enabled() {
            self.pending_delta += Vec2::new(dx, dy);
        }
    }

    /// Record a movement key transition; dropped while disabled
    pub fn set_key(&mut self, key: MoveKey, pressed: bool) {
        if self.is_enabled() {
            self.keys.set(key, pressed);
        }
    }

    /// Apply pending input to the camera
    ///
    /// Returns whether integration ran. The whole accumulated delta is
    /// consumed in one step.
    pub fn update(&mut self, camera: &mut Camera, delta_s: f32) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let input = LookInput {
            look_delta: std::mem::take(&mut self.pending_delta),
            movement: self.keys,
        };
        self.integrator.integrate(camera, &input, delta_s);
        true
    }

    fn clear_pending(&mut self) {
        self.pending_delta = Vec2::ZERO;
        self.keys = MovementKeys::default();
    }
}

impl Default for LookController<SpectatorIntegrator> {
    fn default() -> Self {
        Self::new(SpectatorIntegrator::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RenderConfig;

    /// Integrator that records what it was handed
    #[derive(Default)]
    struct Recording {
        calls: Vec<LookInput>,
    }

    impl LookIntegrator for Recording {
        fn integrate(&mut self, camera: &mut Camera, input: &LookInput, _delta_s: f32) {
            camera.yaw -= input.look_delta.x;
            self.calls.push(*input);
        }
    }

    fn camera() -> Camera {
        Camera::new(&RenderConfig::default())
    }

    #[test]
    fn test_starts_disabled() {
        let controller = LookController::new(Recording::default());
        assert_eq!(controller.state(), ControlState::Disabled);
    }

    #[test]
    fn test_integrates_only_when_enabled() {
        let mut controller = LookController::new(Recording::default());
        let mut cam = camera();

        controller.push_look_delta(5.0, 0.0);
        assert!(!controller.update(&mut cam, 0.016));
        assert!(controller.integrator.calls.is_empty());

        controller.on_capture_acquired();
        controller.push_look_delta(5.0, 0.0);
        assert!(controller.update(&mut cam, 0.016));
        assert_eq!(controller.integrator.calls.len(), 1);
        // Input pushed while disabled was never accumulated
        assert_eq!(controller.integrator.calls[0].look_delta, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_delta_consumed_once() {
        let mut controller = LookController::new(Recording::default());
        let mut cam = camera();
        controller.on_capture_acquired();
        controller.push_look_delta(1.0, 2.0);
        controller.push_look_delta(3.0, 4.0);

        controller.update(&mut cam, 0.016);
        controller.update(&mut cam, 0.016);
        assert_eq!(controller.integrator.calls[0].look_delta, Vec2::new(4.0, 6.0));
        assert_eq!(controller.integrator.calls[1].look_delta, Vec2::ZERO);
    }

    #[test]
    fn test_toggle_within_tick_leaves_camera_unchanged() {
        let mut controller: LookController = LookController::default();
        let mut cam = camera();
        let before = cam.clone();

        controller.on_capture_acquired();
        controller.on_capture_lost();
        assert!(!controller.update(&mut cam, 0.016));
        assert_eq!(cam, before);
    }

    #[test]
    fn test_capture_lost_discards_pending_input() {
        let mut controller: LookController = LookController::default();
        let mut cam = camera();
        let before = cam.clone();

        controller.on_capture_acquired();
        controller.push_look_delta(100.0, -40.0);
        controller.set_key(MoveKey::Forward, true);
        controller.on_capture_lost();
        controller.on_capture_acquired();

        // Re-enabled with nothing pending: the spectator integrator is a no-op
        assert!(controller.update(&mut cam, 0.5));
        assert_eq!(cam, before);
    }

    #[test]
    fn test_redundant_signals_are_idempotent() {
        let mut controller = LookController::new(Recording::default());
        controller.on_capture_acquired();
        controller.push_look_delta(1.0, 0.0);
        // A second acquired signal must not clear input already queued
        controller.on_capture_acquired();
        let mut cam = camera();
        controller.update(&mut cam, 0.016);
        assert_eq!(controller.integrator.calls[0].look_delta, Vec2::new(1.0, 0.0));

        controller.on_capture_lost();
        controller.on_capture_lost();
        assert_eq!(controller.state(), ControlState::Disabled);
    }

    #[test]
    fn test_keys_ignored_while_disabled() {
        let mut controller = LookController::new(Recording::default());
        controller.set_key(MoveKey::Left, true);
        controller.on_capture_acquired();
        let mut cam = camera();
        controller.update(&mut cam, 0.016);
        assert!(!controller.integrator.calls[0].movement.any());
    }
}
