//! Character movement profiles.
//!
//! Every archetype has an immutable preset. The simulation reads one mutable
//! working copy, the active profile, which the tuning keys edit between ticks.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;
use tracing::{info, warn};

use crate::utility::Rgb;

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Character {
    Mario,
    #[serde(rename = "meatboy")]
    #[strum(serialize = "meatboy")]
    MeatBoy,
    Link,
    Madeline,
    Ninja,
}

impl Character {
    pub fn preset(&self) -> CharacterProfile {
        match self {
            Character::Mario => mario(),
            Character::MeatBoy => super_meat_boy(),
            Character::Link => link(),
            Character::Madeline => madeline(),
            Character::Ninja => n_ninja(),
        }
    }

    pub fn next(&self) -> Character {
        let roster: Vec<Character> = Character::iter().collect();
        let index = roster.iter().position(|c| c == self).unwrap_or(0);
        return roster[(index + 1) % roster.len()];
    }
}

/// How a wall jump turns input into horizontal velocity.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WallJumpStyle {
    /// Fixed strong kick away from the wall, input ignored
    Smb,
    /// Escape, re-grab or climb depending on input relative to the wall
    Celeste,
    /// Kick scales with current speed, slightly weaker vertical
    Npp,
}

/// Movement constants for one character. Speeds are per tick, timers in ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub name: String,
    pub description: String,
    pub color: Rgb,

    pub walk_speed: f32,
    pub run_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub skid_deceleration: f32,
    pub has_momentum: bool,
    pub air_acceleration_multiplier: f32,
    pub no_horizontal_drag: bool,
    pub run_buffer_frames: u32,

    pub jump_force: f32,
    pub jump_force_run_bonus: f32,
    pub variable_jump: bool,
    pub has_double_jump: bool,
    pub coyote_time: u32,
    pub jump_buffer: u32,

    pub gravity: f32,
    pub falling_gravity: f32,
    pub max_fall_speed: f32,

    pub has_wall_slide: bool,
    pub wall_slide_speed: f32,
    pub has_wall_jump: bool,
    pub wall_jump_style: WallJumpStyle,
    pub wall_stick_time: u32,

    pub has_dash: bool,
    pub dash_speed: f32,
    pub dash_duration: u32,
    pub dash_cooldown: u32,
}

impl Default for CharacterProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            color: Rgb(255, 255, 255),
            walk_speed: 0.0,
            run_speed: 0.0,
            acceleration: 0.0,
            deceleration: 0.0,
            skid_deceleration: 0.0,
            has_momentum: true,
            air_acceleration_multiplier: 1.0,
            no_horizontal_drag: false,
            run_buffer_frames: 0,
            jump_force: 0.0,
            jump_force_run_bonus: 0.0,
            variable_jump: false,
            has_double_jump: false,
            coyote_time: 0,
            jump_buffer: 0,
            gravity: 0.0,
            falling_gravity: 0.0,
            max_fall_speed: 0.0,
            has_wall_slide: false,
            wall_slide_speed: 2.0,
            has_wall_jump: false,
            wall_jump_style: WallJumpStyle::Celeste,
            wall_stick_time: 0,
            has_dash: false,
            dash_speed: 0.0,
            dash_duration: 0,
            dash_cooldown: 0,
        }
    }
}

impl CharacterProfile {
    pub fn double_jump_charges(&self) -> u32 {
        if self.has_double_jump {
            1
        } else {
            0
        }
    }

    /// Values that will make the character feel broken. Never rejected.
    pub fn warnings(&self) -> Vec<ProfileWarning> {
        let mut warnings = Vec::new();
        if !(self.gravity > 0.0) {
            warnings.push(ProfileWarning::NonPositive {
                field: "gravity",
                value: self.gravity,
            });
        }
        if !(self.jump_force > 0.0) {
            warnings.push(ProfileWarning::NonPositive {
                field: "jump_force",
                value: self.jump_force,
            });
        }
        if !(self.acceleration > 0.0) {
            warnings.push(ProfileWarning::NonPositive {
                field: "acceleration",
                value: self.acceleration,
            });
        }
        if self.walk_speed < 0.0 {
            warnings.push(ProfileWarning::Negative {
                field: "walk_speed",
                value: self.walk_speed,
            });
        }
        if self.falling_gravity < self.gravity {
            warnings.push(ProfileWarning::FallSlowerThanRise {
                gravity: self.gravity,
                falling_gravity: self.falling_gravity,
            });
        }
        warnings
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileWarning {
    #[error("{field}={value} (should be > 0)")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field}={value} (should be >= 0)")]
    Negative { field: &'static str, value: f32 },
    #[error("falling_gravity={falling_gravity} is below gravity={gravity}, falls will feel floatier than rises")]
    FallSlowerThanRise { gravity: f32, falling_gravity: f32 },
}

// Momentum-based, weighty, run speed adds jump height
fn mario() -> CharacterProfile {
    CharacterProfile {
        name: "Mario".to_string(),
        description: "Momentum-based, weighty feel, speed affects jump height".to_string(),
        color: Rgb(200, 30, 30),
        walk_speed: 4.0,
        run_speed: 8.0,
        acceleration: 0.3,
        deceleration: 0.3,
        skid_deceleration: 0.6,
        has_momentum: true,
        air_acceleration_multiplier: 0.7,
        no_horizontal_drag: true,
        run_buffer_frames: 10,
        jump_force: 14.0,
        jump_force_run_bonus: 2.0,
        variable_jump: true,
        coyote_time: 6,
        jump_buffer: 5,
        gravity: 0.6,
        falling_gravity: 1.0,
        max_fall_speed: 12.0,
        wall_slide_speed: 0.0,
        ..Default::default()
    }
}

// Instant direction changes, wall slide and the fixed-kick wall jump
fn super_meat_boy() -> CharacterProfile {
    CharacterProfile {
        name: "Super Meat Boy".to_string(),
        description: "Ultra-responsive, wall jumps, buzzsaw survivor".to_string(),
        color: Rgb(120, 40, 40),
        walk_speed: 6.0,
        run_speed: 10.0,
        acceleration: 2.0,
        deceleration: 2.0,
        skid_deceleration: 2.0,
        has_momentum: false,
        air_acceleration_multiplier: 1.0,
        no_horizontal_drag: true,
        jump_force: 15.0,
        variable_jump: true,
        coyote_time: 4,
        jump_buffer: 3,
        gravity: 0.7,
        falling_gravity: 0.7,
        max_fall_speed: 15.0,
        has_wall_slide: true,
        wall_slide_speed: 2.0,
        has_wall_jump: true,
        wall_jump_style: WallJumpStyle::Smb,
        wall_stick_time: 15,
        ..Default::default()
    }
}

// Fixed jump height, no run, a long ground dash
fn link() -> CharacterProfile {
    CharacterProfile {
        name: "Link".to_string(),
        description: "Precise control, dash-jump combos, simple physics".to_string(),
        color: Rgb(40, 180, 40),
        walk_speed: 4.5,
        run_speed: 4.5,
        acceleration: 1.5,
        deceleration: 1.5,
        skid_deceleration: 1.5,
        has_momentum: false,
        air_acceleration_multiplier: 0.5,
        no_horizontal_drag: false,
        jump_force: 13.0,
        variable_jump: false,
        coyote_time: 3,
        jump_buffer: 3,
        gravity: 0.8,
        falling_gravity: 0.8,
        max_fall_speed: 12.0,
        wall_slide_speed: 0.0,
        has_dash: true,
        dash_speed: 12.0,
        dash_duration: 20,
        dash_cooldown: 30,
        ..Default::default()
    }
}

// Double jump, wall jump and a short fast dash
fn madeline() -> CharacterProfile {
    CharacterProfile {
        name: "Madeline".to_string(),
        description: "Double jump + wall jump, air dash, excellent air control".to_string(),
        color: Rgb(230, 80, 120),
        walk_speed: 5.5,
        run_speed: 5.5,
        acceleration: 1.2,
        deceleration: 1.2,
        skid_deceleration: 1.2,
        has_momentum: false,
        air_acceleration_multiplier: 0.85,
        no_horizontal_drag: true,
        jump_force: 14.5,
        variable_jump: true,
        has_double_jump: true,
        coyote_time: 5,
        jump_buffer: 4,
        gravity: 0.65,
        falling_gravity: 0.9,
        max_fall_speed: 13.0,
        has_wall_slide: true,
        wall_slide_speed: 1.5,
        has_wall_jump: true,
        wall_jump_style: WallJumpStyle::Celeste,
        wall_stick_time: 10,
        has_dash: true,
        dash_speed: 15.0,
        dash_duration: 12,
        dash_cooldown: 20,
        ..Default::default()
    }
}

// Floaty, slippery, wall kicks keep their speed
fn n_ninja() -> CharacterProfile {
    CharacterProfile {
        name: "Ninja (N++)".to_string(),
        description: "Floaty, high momentum, fluid parkour flow".to_string(),
        color: Rgb(180, 180, 180),
        walk_speed: 5.0,
        run_speed: 11.0,
        acceleration: 0.4,
        deceleration: 0.2,
        skid_deceleration: 0.3,
        has_momentum: true,
        air_acceleration_multiplier: 0.9,
        no_horizontal_drag: true,
        run_buffer_frames: 15,
        jump_force: 13.0,
        variable_jump: true,
        coyote_time: 5,
        jump_buffer: 5,
        gravity: 0.55,
        falling_gravity: 0.55,
        max_fall_speed: 18.0,
        has_wall_slide: true,
        wall_slide_speed: 2.5,
        has_wall_jump: true,
        wall_jump_style: WallJumpStyle::Npp,
        wall_stick_time: 0,
        ..Default::default()
    }
}

/// Profile fields exposed to live tuning, each with the range the editor clamps to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TunableParam {
    Gravity,
    FallingGravity,
    WalkSpeed,
    Acceleration,
    JumpForce,
}

impl TunableParam {
    pub fn range(&self) -> (f32, f32) {
        match self {
            TunableParam::Gravity => (0.1, 2.0),
            TunableParam::FallingGravity => (0.1, 2.5),
            TunableParam::WalkSpeed => (1.0, 12.0),
            TunableParam::Acceleration => (0.05, 2.5),
            TunableParam::JumpForce => (5.0, 20.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TunableParam::Gravity => "Gravity",
            TunableParam::FallingGravity => "Fall Grav",
            TunableParam::WalkSpeed => "Speed",
            TunableParam::Acceleration => "Accel",
            TunableParam::JumpForce => "Jump",
        }
    }

    pub fn get(&self, profile: &CharacterProfile) -> f32 {
        match self {
            TunableParam::Gravity => profile.gravity,
            TunableParam::FallingGravity => profile.falling_gravity,
            TunableParam::WalkSpeed => profile.walk_speed,
            TunableParam::Acceleration => profile.acceleration,
            TunableParam::JumpForce => profile.jump_force,
        }
    }

    fn field_mut<'a>(&self, profile: &'a mut CharacterProfile) -> &'a mut f32 {
        match self {
            TunableParam::Gravity => &mut profile.gravity,
            TunableParam::FallingGravity => &mut profile.falling_gravity,
            TunableParam::WalkSpeed => &mut profile.walk_speed,
            TunableParam::Acceleration => &mut profile.acceleration,
            TunableParam::JumpForce => &mut profile.jump_force,
        }
    }

    pub fn next(&self) -> TunableParam {
        let all: Vec<TunableParam> = TunableParam::iter().collect();
        let index = all.iter().position(|t| t == self).unwrap_or(0);
        return all[(index + 1) % all.len()];
    }

    pub fn previous(&self) -> TunableParam {
        let all: Vec<TunableParam> = TunableParam::iter().collect();
        let index = all.iter().position(|t| t == self).unwrap_or(0);
        return all[(index + all.len() - 1) % all.len()];
    }
}

/// Owns the active working copy. Presets are rebuilt on demand from `Character::preset`.
pub struct ProfileStore {
    character: Character,
    active: CharacterProfile,
    tuning_steps: u32,
}

impl ProfileStore {
    pub fn new(character: Character, tuning_steps: u32) -> ProfileStore {
        let store = ProfileStore {
            character,
            active: character.preset(),
            tuning_steps: tuning_steps.max(1),
        };
        store.log_warnings();
        store
    }

    pub fn character(&self) -> Character {
        self.character
    }

    pub fn active(&self) -> &CharacterProfile {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut CharacterProfile {
        &mut self.active
    }

    /// Switch to another archetype. The working copy starts from its preset.
    pub fn select(&mut self, character: Character) {
        self.character = character;
        self.active = character.preset();
        info!(character = %character, "selected character profile");
        self.log_warnings();
    }

    /// Restore the working copy from the preset of `character`.
    pub fn reset_to_default(&mut self, character: Character) {
        self.character = character;
        self.active = character.preset();
        info!(character = %character, "profile reset to preset");
    }

    /// Nudge a parameter by `steps` slider notches and return the new value.
    pub fn tune(&mut self, param: TunableParam, steps: i32) -> f32 {
        let (min, max) = param.range();
        let notch = (max - min) / self.tuning_steps as f32;
        let field = param.field_mut(self.active_mut());
        let start = if field.is_finite() { *field } else { min };
        *field = (start + notch * steps as f32).clamp(min, max);
        let value = *field;
        info!(param = %param, value, "tuned profile");
        self.log_warnings();
        value
    }

    fn log_warnings(&self) {
        for warning in self.active.warnings() {
            warn!(profile = %self.active.name, "{}", warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use assert2::assert;
    use std::str::FromStr;

    #[test]
    fn test_character_ids_round_trip_through_strings() {
        for character in Character::iter() {
            let id: &'static str = character.into();
            assert!(Character::from_str(id) == Ok(character));
        }
        assert!(Character::from_str("meatboy") == Ok(Character::MeatBoy));
        assert!(Character::from_str("bowser").is_err());
    }

    #[test]
    fn test_next_character_cycles_through_roster() {
        assert!(Character::Mario.next() == Character::MeatBoy);
        assert!(Character::Ninja.next() == Character::Mario);
    }

    #[test]
    fn test_wall_jump_styles_parse() {
        assert!(WallJumpStyle::from_str("smb") == Ok(WallJumpStyle::Smb));
        assert!(WallJumpStyle::from_str("celeste") == Ok(WallJumpStyle::Celeste));
        assert!(WallJumpStyle::from_str("npp") == Ok(WallJumpStyle::Npp));
        assert!(WallJumpStyle::from_str("megaman").is_err());
    }

    #[test]
    fn test_presets_are_sane() {
        for character in Character::iter() {
            let profile = character.preset();
            assert!(profile.warnings().is_empty(), "{:?}", character);
            assert!(profile.run_speed >= profile.walk_speed);
            if profile.has_dash {
                assert!(profile.dash_cooldown >= profile.dash_duration);
            }
        }
    }

    #[test]
    fn test_only_madeline_double_jumps() {
        assert!(Character::Madeline.preset().double_jump_charges() == 1);
        assert!(Character::Mario.preset().double_jump_charges() == 0);
    }

    #[test]
    fn test_warnings_flag_inverted_gravity_without_rejecting() {
        let mut profile = Character::Mario.preset();
        profile.gravity = 1.5;
        profile.falling_gravity = 0.5;
        profile.jump_force = -1.0;
        let warnings = profile.warnings();
        assert!(warnings.len() == 2);
        assert!(warnings.contains(&ProfileWarning::FallSlowerThanRise {
            gravity: 1.5,
            falling_gravity: 0.5
        }));
        assert!(warnings[0].to_string() == "jump_force=-1 (should be > 0)");
    }

    #[test]
    fn test_tune_moves_by_notches_and_clamps() {
        let mut store = ProfileStore::new(Character::Mario, 20);
        let value = store.tune(TunableParam::Gravity, 2);
        assert_relative_eq!(value, 0.6 + 2.0 * 1.9 / 20.0, epsilon = 1e-5);
        assert_relative_eq!(store.active().gravity, value);

        let value = store.tune(TunableParam::JumpForce, 1000);
        assert!(value == 20.0);
        let value = store.tune(TunableParam::JumpForce, -1000);
        assert!(value == 5.0);
    }

    #[test]
    fn test_tune_recovers_from_nan() {
        let mut store = ProfileStore::new(Character::Link, 10);
        store.active_mut().walk_speed = f32::NAN;
        let value = store.tune(TunableParam::WalkSpeed, 0);
        assert!(value == 1.0);
    }

    #[test]
    fn test_reset_restores_every_field() {
        let mut store = ProfileStore::new(Character::Ninja, 20);
        store.tune(TunableParam::Acceleration, 5);
        store.active_mut().has_dash = true;
        store.reset_to_default(Character::Ninja);
        assert!(store.active() == &Character::Ninja.preset());
    }

    #[test]
    fn test_select_replaces_working_copy() {
        let mut store = ProfileStore::new(Character::Mario, 20);
        store.tune(TunableParam::WalkSpeed, 3);
        store.select(Character::Madeline);
        assert!(store.character() == Character::Madeline);
        assert!(store.active() == &Character::Madeline.preset());
    }

    #[test]
    fn test_tunable_param_cycle() {
        assert!(TunableParam::Gravity.next() == TunableParam::FallingGravity);
        assert!(TunableParam::JumpForce.next() == TunableParam::Gravity);
        assert!(TunableParam::Gravity.previous() == TunableParam::JumpForce);
        for param in TunableParam::iter() {
            let (min, max) = param.range();
            let value = param.get(&Character::Mario.preset());
            assert!(min < max);
            assert!(value >= min && value <= max, "{}", param.label());
        }
    }
}
