//! The per-tick movement pipeline.
//!
//! `MovementStateMachine::step` runs a fixed sequence of phases. Each phase is
//! a free function over the body so it can be exercised on its own, but the
//! order matters: later phases read what earlier ones committed.
//!
//! 0. depenetrate, then advance the coyote/jump-buffer windows and cooldowns
//! 1. horizontal intent (walk/run target, momentum easing, skid, air drag, wall stick)
//! 2. horizontal integration and collision
//! 3. wall contact
//! 4. gravity, then variable-jump truncation
//! 5. vertical integration and collision (landing, ceilings)
//! 6. jump resolution (wall, ground, coyote, double)
//! 7. dash countdown and signature moves
//!
//! Profile values are read fresh every tick and never cached into the body.

use derive_more::Display;
use ordered_float::OrderedFloat;

use crate::body::{MovementState, PlayerBody, Side};
use crate::input::InputFrame;
use crate::level::Level;
use crate::profile::{CharacterProfile, WallJumpStyle};
use crate::signature::{CosmeticKind, SignatureEffect, SignatureMoveResolver};
use crate::utility::{approach, bottom, left, non_negative, right, top, SignedExt};

pub const SKID_THRESHOLD: f32 = 0.5;
pub const AIR_DRAG: f32 = 0.2;
pub const VARIABLE_JUMP_DAMPING: f32 = 0.5;
pub const DASH_JUMP_MULTIPLIER: f32 = 1.2;

pub const SMB_KICK_MULTIPLIER: f32 = 1.2;
pub const CELESTE_REGRAB_MULTIPLIER: f32 = 0.3;
pub const CELESTE_CLIMB_MULTIPLIER: f32 = 0.6;
pub const NPP_KICK_MULTIPLIER: f32 = 1.1;
pub const NPP_JUMP_MULTIPLIER: f32 = 0.9;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum JumpKind {
    #[display(fmt = "ground")]
    Ground,
    #[display(fmt = "coyote")]
    Coyote,
    #[display(fmt = "double")]
    Double,
    #[display(fmt = "wall {}", _0)]
    Wall(WallJumpStyle),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum DeathCause {
    #[display(fmt = "hazard")]
    Hazard,
    #[display(fmt = "fell out of the level")]
    FellOut,
}

/// Observation-only signals for animation, sound and the session.
#[derive(Copy, Clone, Debug, PartialEq, Display)]
pub enum MovementEvent {
    #[display(fmt = "state {} -> {}", from, to)]
    StateChanged {
        from: MovementState,
        to: MovementState,
    },
    #[display(fmt = "jumped ({})", _0)]
    Jumped(JumpKind),
    #[display(fmt = "landed at {:.1}", impact_speed)]
    Landed { impact_speed: f32 },
    #[display(fmt = "hit ceiling")]
    HitCeiling,
    #[display(fmt = "hit wall on the {}", _0)]
    HitWall(Side),
    #[display(fmt = "dash {}", _0)]
    DashStarted(Side),
    #[display(fmt = "dash ended")]
    DashEnded,
    #[display(fmt = "signature {}", _0)]
    Cosmetic(CosmeticKind),
    #[display(fmt = "finish reached")]
    FinishReached,
    #[display(fmt = "died ({})", _0)]
    Died(DeathCause),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub events: Vec<MovementEvent>,
}

impl StepReport {
    fn push(&mut self, event: MovementEvent) {
        self.events.push(event);
    }

    pub fn jumped(&self) -> Option<JumpKind> {
        self.events.iter().find_map(|event| match event {
            MovementEvent::Jumped(kind) => Some(*kind),
            _ => None,
        })
    }

    pub fn landed(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, MovementEvent::Landed { .. }))
    }

    pub fn finished(&self) -> bool {
        self.events.contains(&MovementEvent::FinishReached)
    }

    pub fn died(&self) -> Option<DeathCause> {
        self.events.iter().find_map(|event| match event {
            MovementEvent::Died(cause) => Some(*cause),
            _ => None,
        })
    }
}

/// Result of the vertical pass.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct VerticalOutcome {
    /// Index of the platform the body ended up standing on
    pub support: Option<usize>,
    pub hit_ceiling: bool,
    /// Downward speed at the moment of landing
    pub impact_speed: f32,
}

#[derive(Default)]
pub struct MovementStateMachine {
    signatures: SignatureMoveResolver,
}

impl MovementStateMachine {
    pub fn new(signatures: SignatureMoveResolver) -> MovementStateMachine {
        MovementStateMachine { signatures }
    }

    /// Advance `body` by one fixed tick.
    pub fn step(
        &self,
        body: &mut PlayerBody,
        profile: &CharacterProfile,
        input: &InputFrame,
        level: &Level,
    ) -> StepReport {
        let mut report = StepReport::default();
        let mut last_state = body.state;
        let was_grounded = body.grounded;

        depenetrate(body, level);
        begin_tick(body, profile, input);

        apply_horizontal_intent(body, profile, input);
        if let Some(side) = move_horizontally(body, level) {
            report.push(MovementEvent::HitWall(side));
        }
        detect_wall_contact(body, profile, input, level);
        note_state_change(&mut report, &mut last_state, body.state);

        apply_gravity(body, profile);
        apply_variable_jump(body, profile, input);
        let vertical = move_vertically(body, profile, level);
        if vertical.hit_ceiling {
            report.push(MovementEvent::HitCeiling);
        }
        if body.grounded && !was_grounded {
            report.push(MovementEvent::Landed {
                impact_speed: vertical.impact_speed,
            });
        }
        note_state_change(&mut report, &mut last_state, body.state);

        if let Some(kind) = resolve_jump(body, profile, input) {
            report.push(MovementEvent::Jumped(kind));
        }
        note_state_change(&mut report, &mut last_state, body.state);
        for event in self.resolve_dash_and_signature(body, profile, input) {
            report.push(event);
        }
        note_state_change(&mut report, &mut last_state, body.state);

        check_outcomes(body, level, &vertical, &mut report);
        report
    }

    /// Phase 7: count an active dash down, then fire a signature on a fresh press.
    pub fn resolve_dash_and_signature(
        &self,
        body: &mut PlayerBody,
        profile: &CharacterProfile,
        input: &InputFrame,
    ) -> Vec<MovementEvent> {
        let mut events = Vec::new();
        if body.dash_timer > 0 {
            body.dash_timer -= 1;
            if body.dash_timer == 0 {
                if body.state == MovementState::Dashing {
                    body.state = body.resting_state();
                }
                events.push(MovementEvent::DashEnded);
            }
        }

        if input.dash_pressed {
            match self.signatures.resolve(body.character, body, profile, input) {
                Some(SignatureEffect::Dash(dash)) => {
                    events.push(MovementEvent::DashStarted(dash.direction))
                }
                Some(SignatureEffect::Cosmetic(kind)) => {
                    events.push(MovementEvent::Cosmetic(kind))
                }
                None => {}
            }
        }
        events
    }
}

/// Every transition is reported, so landing and jumping on one tick gives two.
fn note_state_change(report: &mut StepReport, last: &mut MovementState, now: MovementState) {
    if now != *last {
        report.push(MovementEvent::StateChanged { from: *last, to: now });
        *last = now;
    }
}

/// Eject a body that starts the tick inside geometry along the shallowest axis.
/// Candidates are tried horizontal first, then vertical, platform by platform;
/// equal depths keep the first candidate. Returns whether anything moved.
pub fn depenetrate(body: &mut PlayerBody, level: &Level) -> bool {
    let mut moved = false;
    for _ in 0..=level.platforms().len() {
        let bounds = body.rect();
        let push = level
            .overlapping(&bounds)
            .flat_map(|(_, platform)| {
                let plat = &platform.rect;
                [
                    (left(plat) - right(&bounds), 0.0),
                    (right(plat) - left(&bounds), 0.0),
                    (0.0, top(plat) - bottom(&bounds)),
                    (0.0, bottom(plat) - top(&bounds)),
                ]
            })
            .min_by_key(|(dx, dy): &(f32, f32)| OrderedFloat(dx.abs() + dy.abs()));
        match push {
            Some((dx, dy)) => {
                body.position.set_x(body.position.x() + dx);
                body.position.set_y(body.position.y() + dy);
                moved = true;
            }
            None => break,
        }
    }
    moved
}

/// Pre-phase: grace windows and cooldowns tick before anything reads them.
pub fn begin_tick(body: &mut PlayerBody, profile: &CharacterProfile, input: &InputFrame) {
    body.buffers.advance(input, body.grounded, profile);
    body.signature_cooldown = body.signature_cooldown.saturating_sub(1);
}

/// Phase 1.
pub fn apply_horizontal_intent(body: &mut PlayerBody, profile: &CharacterProfile, input: &InputFrame) {
    body.skidding = false;
    if body.is_dashing() {
        body.set_velocity_x(body.dash_direction.sign() * non_negative(profile.dash_speed));
        return;
    }

    if input.run_held {
        body.run_buffer_timer = profile.run_buffer_frames;
    } else {
        body.run_buffer_timer = body.run_buffer_timer.saturating_sub(1);
    }
    let running = input.run_held || body.run_buffer_timer > 0;

    let mut direction = input.move_direction();
    if body.state == MovementState::WallSliding {
        if let Some(wall) = body.wall {
            if direction == Some(wall.opposite()) {
                if body.wall_stick_timer > 0 {
                    body.wall_stick_timer -= 1;
                    direction = None;
                }
            } else {
                body.wall_stick_timer = profile.wall_stick_time;
            }
        }
    }

    let vx = body.velocity.x();
    let grounded = body.grounded;
    let air_multiplier = if grounded {
        1.0
    } else {
        non_negative(profile.air_acceleration_multiplier)
    };

    let new_vx = match direction {
        Some(side) => {
            body.facing = side;
            let speed = if running {
                profile.run_speed
            } else {
                profile.walk_speed
            };
            let target = side.sign() * non_negative(speed);
            if !profile.has_momentum {
                target
            } else {
                body.skidding = grounded && vx.sign() == -side.sign() && vx.abs() > SKID_THRESHOLD;
                let slowing = vx.sign() == side.sign() && vx.abs() > target.abs();
                let rate = if body.skidding {
                    profile.skid_deceleration
                } else if slowing {
                    profile.deceleration * air_multiplier
                } else {
                    profile.acceleration * air_multiplier
                };
                approach(vx, target, rate)
            }
        }
        None if grounded => {
            if profile.has_momentum {
                approach(vx, 0.0, profile.deceleration)
            } else {
                0.0
            }
        }
        None => {
            if profile.no_horizontal_drag {
                vx
            } else {
                approach(vx, 0.0, AIR_DRAG)
            }
        }
    };
    body.set_velocity_x(new_vx);
}

/// Phase 2. Returns the side a wall was hit on.
pub fn move_horizontally(body: &mut PlayerBody, level: &Level) -> Option<Side> {
    let vx = body.velocity.x();
    if vx == 0.0 {
        return None;
    }
    body.position.set_x(body.position.x() + vx);

    let mut hit = None;
    for _ in 0..=level.platforms().len() {
        let bounds = body.rect();
        let x = body.position.x();
        let snapped = level
            .overlapping(&bounds)
            .map(|(_, platform)| {
                if vx > 0.0 {
                    left(&platform.rect) - body.size.x()
                } else {
                    right(&platform.rect)
                }
            })
            .min_by_key(|target| OrderedFloat((target - x).abs()));
        match snapped {
            Some(target) => {
                body.position.set_x(target);
                hit = Side::from_sign(vx);
            }
            None => break,
        }
    }
    if hit.is_some() {
        body.set_velocity_x(0.0);
    }
    hit
}

/// Phase 3. Enters, keeps or leaves `WallSliding`. `body.grounded` still
/// holds the previous tick's answer here.
pub fn detect_wall_contact(
    body: &mut PlayerBody,
    profile: &CharacterProfile,
    input: &InputFrame,
    level: &Level,
) {
    let contact = if profile.has_wall_slide
        && !body.grounded
        && body.state != MovementState::Dashing
    {
        level.wall_contact(&body.rect())
    } else {
        None
    };

    let side = match contact {
        Some(side) => side,
        None => {
            if body.state == MovementState::WallSliding {
                body.state = MovementState::Airborne;
            }
            body.wall = None;
            body.wall_cling_timer = 0;
            return;
        }
    };

    let already_sliding = body.state == MovementState::WallSliding && body.wall == Some(side);
    let pressing_in = input.move_direction() == Some(side);
    if !already_sliding && !pressing_in {
        body.wall = None;
        return;
    }
    if already_sliding {
        body.wall_cling_timer = body.wall_cling_timer.saturating_sub(1);
    } else {
        body.wall_stick_timer = profile.wall_stick_time;
        body.wall_cling_timer = profile.wall_stick_time;
    }
    body.state = MovementState::WallSliding;
    body.wall = Some(side);
    let slide_speed = non_negative(profile.wall_slide_speed);
    if body.velocity.y() > slide_speed {
        body.set_velocity_y(slide_speed);
    }
}

/// Phase 4. Falling uses `falling_gravity`. A dash freezes vertical velocity.
///
/// A fresh wall slide clings: its downward speed is held for
/// `wall_stick_time` ticks, after which gravity resumes and the fall is capped
/// at `wall_slide_speed`. `max_fall_speed` limits downward speed only.
pub fn apply_gravity(body: &mut PlayerBody, profile: &CharacterProfile) {
    if body.state == MovementState::Dashing {
        return;
    }
    let vy = body.velocity.y();
    let wall_sliding = body.state == MovementState::WallSliding;
    let slide_speed = non_negative(profile.wall_slide_speed);
    if wall_sliding && vy >= 0.0 && body.wall_cling_timer > 0 {
        body.set_velocity_y(vy.min(slide_speed));
        return;
    }
    let gravity = if vy > 0.0 {
        profile.falling_gravity
    } else {
        profile.gravity
    };
    let mut vy = (vy + non_negative(gravity)).min(non_negative(profile.max_fall_speed));
    if wall_sliding {
        vy = vy.min(slide_speed);
    }
    body.set_velocity_y(vy);
}

/// Phase 4b. Letting go of jump while still rising cuts the ascent, every tick.
pub fn apply_variable_jump(body: &mut PlayerBody, profile: &CharacterProfile, input: &InputFrame) {
    if !profile.variable_jump || input.jump_held || body.state == MovementState::Dashing {
        return;
    }
    let vy = body.velocity.y();
    if vy < 0.0 {
        body.set_velocity_y(vy * VARIABLE_JUMP_DAMPING);
    }
}

/// Phase 5.
pub fn move_vertically(body: &mut PlayerBody, profile: &CharacterProfile, level: &Level) -> VerticalOutcome {
    let vy = body.velocity.y();
    let mut outcome = VerticalOutcome::default();
    body.grounded = false;
    body.position.set_y(body.position.y() + vy);

    if vy != 0.0 {
        for _ in 0..=level.platforms().len() {
            let bounds = body.rect();
            let y = body.position.y();
            let snapped = level
                .overlapping(&bounds)
                .map(|(index, platform)| {
                    if vy > 0.0 {
                        (index, top(&platform.rect) - body.size.y())
                    } else {
                        (index, bottom(&platform.rect))
                    }
                })
                .min_by_key(|(_, target)| OrderedFloat((target - y).abs()));
            match snapped {
                Some((index, target)) => {
                    body.position.set_y(target);
                    if vy > 0.0 {
                        outcome.support = Some(index);
                    } else {
                        outcome.hit_ceiling = true;
                    }
                }
                None => break,
            }
        }
    }
    if outcome.support.is_none() && vy >= 0.0 {
        outcome.support = level.support_under(&body.rect());
    }

    if outcome.support.is_some() {
        outcome.impact_speed = vy.max(0.0);
        body.grounded = true;
        body.set_velocity_y(0.0);
        body.buffers.on_landed(profile);
        body.double_jump_charges = profile.double_jump_charges();
        body.wall = None;
        body.wall_stick_timer = 0;
        body.wall_cling_timer = 0;
        if matches!(body.state, MovementState::Airborne | MovementState::WallSliding) {
            body.state = MovementState::Grounded;
        }
    } else if body.state == MovementState::Grounded {
        body.state = MovementState::Airborne;
    }
    if outcome.hit_ceiling {
        body.set_velocity_y(0.0);
    }
    outcome
}

/// Phase 6. A pending buffered press becomes a jump if anything allows it;
/// wall jumps take priority over ground, coyote and double jumps.
pub fn resolve_jump(body: &mut PlayerBody, profile: &CharacterProfile, input: &InputFrame) -> Option<JumpKind> {
    if !body.buffers.jump_pending() {
        return None;
    }

    if profile.has_wall_jump && body.state == MovementState::WallSliding {
        if let Some(wall) = body.wall {
            wall_jump(body, profile, input, wall);
            return Some(JumpKind::Wall(profile.wall_jump_style));
        }
    }

    let from_ground = body.grounded || body.buffers.in_coyote_window();
    let double = !from_ground && profile.has_double_jump && body.double_jump_charges > 0;
    if !from_ground && !double {
        return None;
    }

    let kind = if body.grounded {
        JumpKind::Ground
    } else if from_ground {
        JumpKind::Coyote
    } else {
        JumpKind::Double
    };

    let mut force = non_negative(profile.jump_force);
    if body.velocity.x().abs() > profile.walk_speed {
        force += non_negative(profile.jump_force_run_bonus);
    }
    if body.is_dashing() {
        force *= DASH_JUMP_MULTIPLIER;
    }

    body.set_velocity_y(-force);
    body.buffers.consume_jump();
    body.grounded = false;
    body.wall = None;
    // a dash jump releases the gravity freeze, the horizontal lock runs out on its own
    body.state = MovementState::Airborne;
    if kind == JumpKind::Double {
        body.double_jump_charges -= 1;
    }
    Some(kind)
}

fn wall_jump(body: &mut PlayerBody, profile: &CharacterProfile, input: &InputFrame, wall: Side) {
    let away = wall.opposite();
    let walk = non_negative(profile.walk_speed);
    let run = non_negative(profile.run_speed);
    let jump = non_negative(profile.jump_force);

    let (vx, vy) = match profile.wall_jump_style {
        WallJumpStyle::Smb => (away.sign() * run * SMB_KICK_MULTIPLIER, -jump),
        WallJumpStyle::Celeste => match input.move_direction() {
            Some(direction) if direction == away => (away.sign() * run, -jump),
            Some(_) => (wall.sign() * walk * CELESTE_REGRAB_MULTIPLIER, -jump),
            None => (away.sign() * walk * CELESTE_CLIMB_MULTIPLIER, -jump),
        },
        WallJumpStyle::Npp => {
            let kick = body.velocity.x().abs().max(walk);
            (away.sign() * kick * NPP_KICK_MULTIPLIER, -jump * NPP_JUMP_MULTIPLIER)
        }
    };

    body.velocity.set_x(vx);
    body.velocity.set_y(vy);
    body.facing = away;
    body.buffers.consume_jump();
    body.state = MovementState::Airborne;
    body.wall = None;
    body.wall_stick_timer = 0;
    body.wall_cling_timer = 0;
}

/// Post-phase: finish line, hazards and the kill plane.
fn check_outcomes(body: &PlayerBody, level: &Level, vertical: &VerticalOutcome, report: &mut StepReport) {
    let on_finish = vertical
        .support
        .and_then(|index| level.platform(index))
        .map_or(false, |platform| platform.is_finish);
    if on_finish {
        report.push(MovementEvent::FinishReached);
    }

    let bounds = body.rect();
    if level.touches_hazard(&bounds) {
        report.push(MovementEvent::Died(DeathCause::Hazard));
    } else if level.below_kill_plane(&bounds) {
        report.push(MovementEvent::Died(DeathCause::FellOut));
    }
}
