//! One play session: the active profile, the body, the loaded playground, and
//! what happens when the player dies or reaches the finish.

use std::time::Duration;

use tracing::{debug, info};

use crate::body::PlayerBody;
use crate::input::InputFrame;
use crate::level::Level;
use crate::movement::{MovementEvent, MovementStateMachine, StepReport};
use crate::playgrounds::{Playground, PlaygroundCatalog};
use crate::profile::{Character, CharacterProfile, ProfileStore, TunableParam};
use crate::signature::SignatureMoveResolver;

/// Converts wall-clock frame time into whole simulation ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl FixedTimestep {
    pub fn new(tick_rate_hz: u32, max_ticks_per_frame: u32) -> FixedTimestep {
        FixedTimestep {
            fixed_dt: Duration::from_nanos(1_000_000_000 / tick_rate_hz.max(1) as u64),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    /// Bank `frame_dt` and return how many ticks to run now. Anything beyond
    /// `max_ticks_per_frame` is dropped rather than carried into the next frame.
    pub fn advance(&mut self, frame_dt: Duration) -> u32 {
        let mut accumulator = self.accumulator.saturating_add(frame_dt);
        let mut ticks = 0;
        while accumulator >= self.fixed_dt && ticks < self.max_ticks_per_frame {
            accumulator -= self.fixed_dt;
            ticks += 1;
        }
        if accumulator >= self.fixed_dt {
            debug!(dropped_ms = accumulator.as_millis() as u64, "simulation backlog dropped");
            accumulator = Duration::ZERO;
        }
        self.accumulator = accumulator;
        ticks
    }
}

pub struct Sandbox {
    profiles: ProfileStore,
    machine: MovementStateMachine,
    playgrounds: PlaygroundCatalog,
    body: PlayerBody,
    tick_count: u64,
    deaths: u32,
    last_event: Option<MovementEvent>,
}

impl Sandbox {
    pub fn new(character: Character, playground: Playground, seed: Option<u64>, tuning_steps: u32) -> Sandbox {
        let profiles = ProfileStore::new(character, tuning_steps);
        let playgrounds = PlaygroundCatalog::new(playground, seed);
        let body = PlayerBody::spawn(playgrounds.level().start_position(), character, profiles.active());
        info!(character = %character, level = %playgrounds.level().name, "sandbox started");
        Sandbox {
            profiles,
            machine: MovementStateMachine::new(SignatureMoveResolver::default()),
            playgrounds,
            body,
            tick_count: 0,
            deaths: 0,
            last_event: None,
        }
    }

    pub fn body(&self) -> &PlayerBody {
        &self.body
    }

    pub fn profile(&self) -> &CharacterProfile {
        self.profiles.active()
    }

    pub fn character(&self) -> Character {
        self.profiles.character()
    }

    pub fn level(&self) -> &Level {
        self.playgrounds.level()
    }

    pub fn playgrounds(&self) -> &PlaygroundCatalog {
        &self.playgrounds
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Most recent event other than a plain state change, for the HUD.
    pub fn last_event(&self) -> Option<MovementEvent> {
        self.last_event
    }

    pub fn tick(&mut self, input: &InputFrame) -> StepReport {
        let report = self.machine.step(
            &mut self.body,
            self.profiles.active(),
            input,
            self.playgrounds.level(),
        );
        self.tick_count += 1;

        for event in &report.events {
            debug!(tick = self.tick_count, %event, "movement");
            if !matches!(event, MovementEvent::StateChanged { .. }) {
                self.last_event = Some(*event);
            }
        }

        if report.finished() {
            let character = self.body.character;
            let new_key = self.playgrounds.record_key(character);
            info!(character = %character, level = %self.playgrounds.level().name, new_key, "finish reached");
            self.respawn();
        } else if let Some(cause) = report.died() {
            self.deaths += 1;
            info!(cause = %cause, deaths = self.deaths, "player died");
            self.respawn();
        }
        report
    }

    /// Switch archetype in place. The body keeps its position and velocity.
    pub fn select_character(&mut self, character: Character) {
        self.profiles.select(character);
        self.body.switch_character(character, self.profiles.active());
    }

    pub fn load_level(&mut self, playground: Playground) {
        self.playgrounds.load(playground);
        self.respawn();
    }

    pub fn next_level(&mut self) {
        self.playgrounds.next();
        self.respawn();
    }

    pub fn previous_level(&mut self) {
        self.playgrounds.previous();
        self.respawn();
    }

    pub fn randomize_level(&mut self) -> bool {
        let changed = self.playgrounds.randomize();
        if changed {
            self.respawn();
        }
        changed
    }

    pub fn reset_player(&mut self) {
        info!("player reset");
        self.respawn();
    }

    pub fn tune(&mut self, param: TunableParam, steps: i32) -> f32 {
        self.profiles.tune(param, steps)
    }

    /// Restore the current character's preset. Abilities refill, motion is kept.
    pub fn reset_profile(&mut self) {
        let character = self.character();
        self.profiles.reset_to_default(character);
        self.body.switch_character(character, self.profiles.active());
    }

    fn respawn(&mut self) {
        let start = self.playgrounds.level().start_position();
        self.body.reset(start, self.profiles.active());
    }
}
