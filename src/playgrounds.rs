//! The six test playgrounds and the victory keys collected on them.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use geo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tracing::info;

use crate::body::PLAYER_HEIGHT;
use crate::level::{Level, Platform};
use crate::profile::Character;
use crate::utility::{center_x, p, rect, top, Rgb};

pub const SCREEN_WIDTH: f32 = 1280.0;
pub const SCREEN_HEIGHT: f32 = 720.0;
pub const LEVEL_COUNT: usize = 6;

/// Keys hover this far above the finish platform, this far apart.
const KEY_HOVER: f32 = 15.0;
const KEY_SPACING: f32 = 15.0;

const FINISH_GOLD: Rgb = Rgb(200, 200, 50);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Playground {
    #[strum(serialize = "Flat Run")]
    FlatRun,
    #[strum(serialize = "Wall Climb")]
    WallClimb,
    #[strum(serialize = "SMB Factory")]
    SmbFactory,
    #[strum(serialize = "Celeste Summit")]
    CelesteSummit,
    #[strum(serialize = "N++ Void")]
    NppVoid,
    #[strum(serialize = "The Shaft")]
    TheShaft,
}

impl Playground {
    pub fn from_index(index: usize) -> Option<Playground> {
        Playground::iter().nth(index)
    }

    pub fn index(&self) -> usize {
        Playground::iter().position(|pg| pg == *self).unwrap_or(0)
    }

    pub fn title(&self) -> String {
        format!("Level {}: {}", self.index() + 1, self)
    }

    pub fn supports_randomize(&self) -> bool {
        !matches!(self, Playground::FlatRun | Playground::WallClimb)
    }

    /// Build the layout. With `rng` the randomizable playgrounds roll a fresh variant.
    pub fn build(&self, rng: Option<&mut StdRng>) -> Level {
        let rng = if self.supports_randomize() { rng } else { None };
        let mut level = Level::new(&self.title(), p(0.0, 0.0), SCREEN_HEIGHT);
        match self {
            Playground::FlatRun => flat_run(&mut level),
            Playground::WallClimb => wall_climb(&mut level),
            Playground::SmbFactory => smb_factory(&mut level, rng),
            Playground::CelesteSummit => celeste_summit(&mut level, rng),
            Playground::NppVoid => npp_void(&mut level, rng),
            Playground::TheShaft => the_shaft(&mut level, rng),
        }
        level
    }
}

/// Where a body of standard height stands on a floor whose top is `floor_y`.
fn standing_on(x: f32, floor_y: f32) -> Point<f32> {
    p(x, floor_y - PLAYER_HEIGHT)
}

fn roll(rng: &mut Option<&mut StdRng>, range: RangeInclusive<i32>, fixed: i32) -> f32 {
    match rng {
        Some(rng) => rng.gen_range(range) as f32,
        None => fixed as f32,
    }
}

fn flat_run(level: &mut Level) {
    let ground_y = SCREEN_HEIGHT - 80.0;
    level.add_platform(Platform::new(0.0, ground_y, 300.0, 80.0, Rgb(60, 100, 60)));
    level.add_platform(Platform::new(300.0, ground_y, 700.0, 80.0, Rgb(80, 80, 80)));
    level.add_platform(Platform::finish(1000.0, ground_y, SCREEN_WIDTH - 1000.0, 80.0, Rgb(180, 150, 50)));
    level.set_start_position(standing_on(100.0, ground_y));
}

fn wall_climb(level: &mut Level) {
    let ground_y = SCREEN_HEIGHT - 80.0;
    let wall = Rgb(100, 80, 120);
    level.add_platform(Platform::new(50.0, ground_y, 250.0, 80.0, Rgb(60, 100, 60)));
    level.add_platform(Platform::new(500.0, ground_y, 300.0, 80.0, Rgb(80, 80, 80)));

    let shaft_x = 900.0;
    level.add_platform(Platform::new(shaft_x, ground_y, 40.0, 80.0, wall));
    level.add_platform(Platform::new(shaft_x + 150.0, ground_y - 100.0, 40.0, 180.0, wall));
    level.add_platform(Platform::new(shaft_x, ground_y - 200.0, 40.0, 100.0, wall));
    level.add_platform(Platform::new(shaft_x + 150.0, ground_y - 300.0, 40.0, 100.0, wall));
    level.add_platform(Platform::finish(
        shaft_x + 40.0,
        ground_y - 350.0,
        110.0,
        20.0,
        Rgb(180, 150, 50),
    ));
    level.set_start_position(standing_on(100.0, ground_y));
}

// tight wall pairs over a hazard pit
fn smb_factory(level: &mut Level, mut rng: Option<&mut StdRng>) {
    let ground_y = SCREEN_HEIGHT - 50.0;
    let wall = Rgb(80, 50, 50);
    level.add_platform(Platform::new(50.0, ground_y, 150.0, 50.0, Rgb(100, 50, 50)));
    level.set_start_position(standing_on(80.0, ground_y));

    level.add_hazard(rect(200.0, ground_y + 20.0, 800.0, 30.0));

    let shaft_count = roll(&mut rng, 3..=5, 3) as usize;
    let shaft_gap = roll(&mut rng, 150..=250, 200);
    let mut shaft_x = 300.0;
    for i in 0..shaft_count {
        let height = roll(&mut rng, 120..=180, 150);
        let step = roll(&mut rng, 150..=200, 180);
        let width_gap = roll(&mut rng, 90..=140, 130);
        let y_base = ground_y - i as f32 * step - 100.0;

        level.add_platform(Platform::new(shaft_x, y_base, 30.0, height, wall));
        level.add_platform(Platform::new(shaft_x + width_gap, y_base, 30.0, height, wall));
        if i + 1 < shaft_count {
            level.add_platform(Platform::new(shaft_x + 30.0, y_base - 30.0, 70.0, 20.0, Rgb(100, 50, 50)));
        }
        shaft_x += shaft_gap;
    }

    let finish_y = ground_y - shaft_count as f32 * 150.0 - 50.0;
    level.add_platform(Platform::finish(shaft_x, finish_y, 100.0, 30.0, FINISH_GOLD));
}

fn celeste_summit(level: &mut Level, rng: Option<&mut StdRng>) {
    let ground_y = SCREEN_HEIGHT - 50.0;
    let near = Rgb(60, 120, 180);
    let far = Rgb(80, 140, 200);
    level.add_platform(Platform::new(50.0, ground_y, 200.0, 50.0, Rgb(50, 100, 150)));
    level.set_start_position(standing_on(100.0, ground_y));

    let rng = match rng {
        Some(rng) => rng,
        None => {
            level.add_platform(Platform::new(300.0, ground_y - 100.0, 40.0, 200.0, near));
            level.add_platform(Platform::new(450.0, ground_y - 250.0, 40.0, 150.0, near));
            level.add_platform(Platform::new(600.0, ground_y - 350.0, 40.0, 300.0, far));
            level.add_platform(Platform::new(750.0, ground_y - 100.0, 40.0, 400.0, far));
            level.add_platform(Platform::finish(750.0, ground_y - 550.0, 100.0, 20.0, FINISH_GOLD));
            return;
        }
    };

    let mut x = 300.0;
    let mut y = ground_y - 100.0;
    for _ in 0..5 {
        if rng.gen_bool(0.5) {
            let height = rng.gen_range(150..=300) as f32;
            level.add_platform(Platform::new(x, y, 40.0, height, near));
            x += rng.gen_range(100..=150) as f32;
            y -= rng.gen_range(50..=100) as f32;
        } else {
            let width = rng.gen_range(40..=80) as f32;
            let height = rng.gen_range(20..=40) as f32;
            level.add_platform(Platform::new(x, y, width, height, far));
            x += rng.gen_range(80..=140) as f32;
            y -= rng.gen_range(40..=120) as f32;
        }
    }
    level.add_platform(Platform::finish(x, y - 50.0, 100.0, 20.0, FINISH_GOLD));
}

// downhill ramps for speed, then a few floating islands
fn npp_void(level: &mut Level, rng: Option<&mut StdRng>) {
    let ground_y = SCREEN_HEIGHT - 50.0;
    let ramp = Rgb(100, 100, 100);
    let island = Rgb(150, 150, 150);
    level.add_platform(Platform::new(50.0, ground_y, 100.0, 20.0, island));
    level.set_start_position(standing_on(70.0, ground_y));

    let rng = match rng {
        Some(rng) => rng,
        None => {
            for i in 0..5 {
                let i = i as f32;
                level.add_platform(Platform::new(200.0 + i * 60.0, ground_y + i * 10.0, 60.0, 20.0, ramp));
            }
            level.add_platform(Platform::new(600.0, ground_y - 200.0, 20.0, 400.0, Rgb(180, 180, 180)));
            level.add_platform(Platform::new(400.0, ground_y - 300.0, 100.0, 20.0, island));
            level.add_platform(Platform::new(200.0, ground_y - 450.0, 100.0, 20.0, island));
            level.add_platform(Platform::finish(800.0, ground_y - 300.0, 50.0, 50.0, FINISH_GOLD));
            return;
        }
    };

    let mut x = 200.0;
    let mut y = ground_y;
    for _ in 0..rng.gen_range(4..=7) {
        level.add_platform(Platform::new(x, y, 60.0, 20.0, ramp));
        x += 60.0;
        y += 10.0;
    }
    for _ in 0..5 {
        x = rng.gen_range(200..=900) as f32;
        y = rng.gen_range(100..=500) as f32;
        let width = rng.gen_range(50..=150) as f32;
        level.add_platform(Platform::new(x, y, width, 20.0, island));
    }
    level.add_platform(Platform::finish(x, y - 50.0, 50.0, 50.0, FINISH_GOLD));
}

// three stacked shafts, each narrower than the last
fn the_shaft(level: &mut Level, mut rng: Option<&mut StdRng>) {
    let ground_y = SCREEN_HEIGHT - 50.0;
    let floor = Rgb(100, 100, 120);
    level.add_platform(Platform::new(50.0, ground_y, 400.0, 50.0, floor));
    level.set_start_position(standing_on(80.0, ground_y));

    let shaft_x = 450.0;
    let start_y = ground_y - 50.0;
    level.add_platform(Platform::new(450.0, ground_y, 250.0, 50.0, floor));
    level.add_platform(Platform::new(shaft_x + 180.0, start_y - 150.0, 40.0, 200.0, Rgb(80, 80, 100)));

    // the left wall leaves a walkway under it
    let width_wide = 180.0;
    let y_1 = start_y - 200.0;
    level.add_platform(Platform::new(shaft_x, y_1 - 50.0, 30.0, 200.0, Rgb(80, 80, 100)));
    level.add_platform(Platform::new(shaft_x + width_wide, y_1 - 200.0, 30.0, 400.0, Rgb(80, 80, 100)));

    let width_med = roll(&mut rng, 120..=160, 140);
    let y_2 = y_1 - 250.0;
    let offset_2 = ((width_wide - width_med) / 2.0).floor();
    let medium = Rgb(90, 90, 110);
    level.add_platform(Platform::new(shaft_x + offset_2, y_2, 30.0, 200.0, medium));
    level.add_platform(Platform::new(shaft_x + offset_2 + width_med, y_2 - 50.0, 30.0, 250.0, medium));

    let width_narrow = roll(&mut rng, 90..=110, 100);
    let y_3 = y_2 - 250.0;
    let offset_3 = ((width_wide - width_narrow) / 2.0).floor();
    let narrow = Rgb(100, 100, 120);
    level.add_platform(Platform::new(shaft_x + offset_3, y_3, 30.0, 250.0, narrow));
    level.add_platform(Platform::new(shaft_x + offset_3 + width_narrow, y_3, 30.0, 250.0, narrow));

    level.add_platform(Platform::finish(
        shaft_x + offset_3 - 40.0,
        y_3 - 50.0,
        width_narrow + 110.0,
        30.0,
        Rgb(210, 180, 50),
    ));
}

/// The loaded playground plus the keys each character has earned per playground.
pub struct PlaygroundCatalog {
    current: Playground,
    level: Level,
    rng: StdRng,
    collected_keys: HashMap<Playground, Vec<Character>>,
}

impl PlaygroundCatalog {
    pub fn new(start: Playground, seed: Option<u64>) -> PlaygroundCatalog {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        PlaygroundCatalog {
            current: start,
            level: start.build(None),
            rng,
            collected_keys: HashMap::new(),
        }
    }

    pub fn current(&self) -> Playground {
        self.current
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn load(&mut self, playground: Playground) {
        self.current = playground;
        self.level = playground.build(None);
        info!(level = %self.level.name, "loaded playground");
    }

    pub fn next(&mut self) {
        self.load(Playground::from_index((self.current.index() + 1) % LEVEL_COUNT).unwrap_or(self.current));
    }

    pub fn previous(&mut self) {
        let index = (self.current.index() + LEVEL_COUNT - 1) % LEVEL_COUNT;
        self.load(Playground::from_index(index).unwrap_or(self.current));
    }

    /// Re-roll the current playground. Fixed layouts stay put and return false.
    pub fn randomize(&mut self) -> bool {
        if !self.current.supports_randomize() {
            return false;
        }
        self.level = self.current.build(Some(&mut self.rng));
        info!(level = %self.level.name, platforms = self.level.platforms().len(), "randomized playground");
        true
    }

    /// Award `character` the current playground's key. Each character earns it once.
    pub fn record_key(&mut self, character: Character) -> bool {
        let keys = self.collected_keys.entry(self.current).or_default();
        if keys.contains(&character) {
            return false;
        }
        keys.push(character);
        info!(level = %self.level.name, character = %character, keys = keys.len(), "victory key collected");
        true
    }

    pub fn keys(&self, playground: Playground) -> &[Character] {
        self.collected_keys
            .get(&playground)
            .map(|keys| keys.as_slice())
            .unwrap_or(&[])
    }

    /// Keys lined up and centred above the finish platform.
    pub fn key_positions(&self) -> Vec<(Point<f32>, Character)> {
        let finish = match self.level.finish_platform() {
            Some(finish) => finish,
            None => return Vec::new(),
        };
        let keys = self.keys(self.current);
        let start_x = center_x(&finish.rect) - (keys.len() as f32 - 1.0) * KEY_SPACING / 2.0;
        let y = top(&finish.rect) - KEY_HOVER;
        keys.iter()
            .enumerate()
            .map(|(i, character)| (p(start_x + i as f32 * KEY_SPACING, y), *character))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PLAYER_WIDTH;
    use crate::utility::rect_at;
    use assert2::assert;

    fn assert_playable(level: &Level) {
        let body = rect_at(level.start_position(), p(PLAYER_WIDTH, PLAYER_HEIGHT));
        assert!(level.support_under(&body).is_some(), "{}", level.name);
        assert!(level.overlapping(&body).next().is_none(), "{}", level.name);
        assert!(level.finish_platform().is_some(), "{}", level.name);
        assert!(level.kill_plane_y() == SCREEN_HEIGHT);
    }

    #[test]
    fn test_titles() {
        assert!(Playground::FlatRun.title() == "Level 1: Flat Run");
        assert!(Playground::TheShaft.title() == "Level 6: The Shaft");
        assert!(Playground::from_index(LEVEL_COUNT) == None);
        assert!(Playground::iter().count() == LEVEL_COUNT);
    }

    #[test]
    fn test_every_fixed_playground_is_playable() {
        for playground in Playground::iter() {
            assert_playable(&playground.build(None));
        }
    }

    #[test]
    fn test_randomized_variants_are_playable() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            for playground in Playground::iter().filter(|pg| pg.supports_randomize()) {
                assert_playable(&playground.build(Some(&mut rng)));
            }
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let mut a = PlaygroundCatalog::new(Playground::CelesteSummit, Some(42));
        let mut b = PlaygroundCatalog::new(Playground::CelesteSummit, Some(42));
        assert!(a.randomize());
        assert!(b.randomize());
        assert!(a.level().platforms() == b.level().platforms());
    }

    #[test]
    fn test_fixed_layouts_ignore_randomize() {
        let mut catalog = PlaygroundCatalog::new(Playground::WallClimb, Some(1));
        let before = catalog.level().platforms().to_vec();
        assert!(!catalog.randomize());
        assert!(catalog.level().platforms() == before.as_slice());
    }

    #[test]
    fn test_smb_factory_has_a_hazard_pit() {
        let level = Playground::SmbFactory.build(None);
        assert!(level.hazards().len() == 1);
        assert!(level.touches_hazard(&rect(400.0, 650.0, 30.0, 60.0)));
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut catalog = PlaygroundCatalog::new(Playground::TheShaft, None);
        catalog.next();
        assert!(catalog.current() == Playground::FlatRun);
        catalog.previous();
        assert!(catalog.current() == Playground::TheShaft);
        assert!(catalog.level().name == "Level 6: The Shaft");
    }

    #[test]
    fn test_keys_recorded_once_per_character() {
        let mut catalog = PlaygroundCatalog::new(Playground::FlatRun, None);
        assert!(catalog.record_key(Character::Mario));
        assert!(!catalog.record_key(Character::Mario));
        assert!(catalog.record_key(Character::Link));
        assert!(catalog.keys(Playground::FlatRun) == &[Character::Mario, Character::Link]);
        assert!(catalog.keys(Playground::WallClimb).is_empty());

        let positions = catalog.key_positions();
        // finish platform centre is 1140, keys straddle it
        assert!(positions[0].0 == p(1132.5, 625.0));
        assert!(positions[1].0 == p(1147.5, 625.0));

        catalog.load(Playground::WallClimb);
        catalog.load(Playground::FlatRun);
        assert!(catalog.keys(Playground::FlatRun).len() == 2);
    }
}
