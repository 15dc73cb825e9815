use geo::{Point, Rect};
use strum_macros::{Display, IntoStaticStr};

use crate::input::BufferedInputTracker;
use crate::profile::{Character, CharacterProfile};
use crate::utility::{p, rect_at};

pub const PLAYER_WIDTH: f32 = 30.0;
pub const PLAYER_HEIGHT: f32 = 60.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum MovementState {
    Grounded,
    Airborne,
    WallSliding,
    Dashing,
}

/// Horizontal direction, used for facing and for which side a wall is on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn sign(&self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn from_sign(value: f32) -> Option<Side> {
        if value > 0.0 {
            Some(Side::Right)
        } else if value < 0.0 {
            Some(Side::Left)
        } else {
            None
        }
    }
}

/// Everything that changes from tick to tick. Only `MovementStateMachine::step` mutates it.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerBody {
    /// Top-left corner, y grows downward
    pub position: Point<f32>,
    pub velocity: Point<f32>,
    pub size: Point<f32>,
    pub character: Character,
    pub state: MovementState,
    /// Resting on a platform after this tick's vertical pass. Independent of
    /// `state` so a ground dash still knows it has floor under it.
    pub grounded: bool,
    pub facing: Side,
    pub wall: Option<Side>,
    pub wall_stick_timer: u32,
    /// Ticks left before a fresh wall slide starts accelerating
    pub wall_cling_timer: u32,
    pub double_jump_charges: u32,
    pub dash_timer: u32,
    pub dash_direction: Side,
    pub signature_cooldown: u32,
    pub run_buffer_timer: u32,
    pub skidding: bool,
    pub buffers: BufferedInputTracker,
}

impl PlayerBody {
    pub fn spawn(position: Point<f32>, character: Character, profile: &CharacterProfile) -> PlayerBody {
        PlayerBody {
            position,
            velocity: p(0.0, 0.0),
            size: p(PLAYER_WIDTH, PLAYER_HEIGHT),
            character,
            state: MovementState::Airborne,
            grounded: false,
            facing: Side::Right,
            wall: None,
            wall_stick_timer: 0,
            wall_cling_timer: 0,
            double_jump_charges: profile.double_jump_charges(),
            dash_timer: 0,
            dash_direction: Side::Right,
            signature_cooldown: 0,
            run_buffer_timer: 0,
            skidding: false,
            buffers: BufferedInputTracker::default(),
        }
    }

    /// Full reinitialisation at `position`, keeping the character.
    pub fn reset(&mut self, position: Point<f32>, profile: &CharacterProfile) {
        *self = PlayerBody::spawn(position, self.character, profile);
    }

    /// Swap archetype mid-run. Position and velocity carry over; abilities do not.
    pub fn switch_character(&mut self, character: Character, profile: &CharacterProfile) {
        self.character = character;
        self.double_jump_charges = profile.double_jump_charges();
        self.dash_timer = 0;
        self.signature_cooldown = 0;
        if self.state == MovementState::Dashing {
            self.state = self.resting_state();
        }
        if !profile.has_wall_slide && self.state == MovementState::WallSliding {
            self.state = MovementState::Airborne;
            self.wall = None;
            self.wall_cling_timer = 0;
        }
    }

    pub fn rect(&self) -> Rect<f32> {
        rect_at(self.position, self.size)
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_timer > 0
    }

    /// The state a body falls back to when no special state holds it.
    pub fn resting_state(&self) -> MovementState {
        if self.grounded {
            MovementState::Grounded
        } else {
            MovementState::Airborne
        }
    }

    pub fn set_velocity_x(&mut self, vx: f32) {
        self.velocity.set_x(vx);
    }

    pub fn set_velocity_y(&mut self, vy: f32) {
        self.velocity.set_y(vy);
    }
}
