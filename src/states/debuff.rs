use crate::detection;
use crate::machine::{StateCx, StateId};

use super::grounded;
use super::{DebuffKind, MovementState};

/// Timed debuff. Stunned, frozen and shocked differ only in their settings.
///
/// The character keeps floating and may still creep along at the debuff's
/// speed modifier until the timer expires, which always returns to `Idle`.
#[derive(Debug, Clone, Copy)]
pub struct Debuffed {
    kind: DebuffKind,
    elapsed: f32,
}

impl Debuffed {
    pub fn new(kind: DebuffKind) -> Self {
        Self { kind, elapsed: 0.0 }
    }

    pub fn kind(&self) -> DebuffKind {
        self.kind
    }

    /// Seconds spent in the current activation.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn set_flag(&self, cx: &mut StateCx, value: bool) {
        match self.kind {
            DebuffKind::Stunned => cx.ctx.is_stunned = value,
            DebuffKind::Frozen => cx.ctx.is_frozen = value,
            DebuffKind::Shocked => cx.ctx.is_shocked = value,
        }
    }
}

impl MovementState for Debuffed {
    fn id(&self) -> StateId {
        self.kind.state_id()
    }

    fn enter(&mut self, cx: &mut StateCx) {
        let settings = self.kind.settings(&cx.config.debuff);
        self.set_flag(cx, true);
        cx.ctx.movement_speed_modifier = settings.speed_modifier;
        self.elapsed = 0.0;
        cx.start_flag(self.kind.flag());
    }

    fn exit(&mut self, cx: &mut StateCx) {
        self.set_flag(cx, false);
        cx.stop_flag(self.kind.flag());
    }

    fn update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        let duration = self.kind.settings(&cx.config.debuff).duration;
        self.elapsed += cx.dt;
        (self.elapsed >= duration).then_some(StateId::Idle)
    }

    fn physics_update(&mut self, cx: &mut StateCx) -> Option<StateId> {
        grounded::move_with_input(cx);
        let config = cx.config;
        detection::float_capsule(
            cx,
            &config.grounded.floating,
            &config.grounded.slope_speed_angles,
        );
        None
    }
}
