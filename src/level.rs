//! Static level geometry and the spatial queries the movement phases run against it.

use geo::{Point, Rect};

use crate::body::Side;
use crate::utility::{
    bottom, center_x, left, overlap_x, overlaps, rect, right, top, Rgb, COLLISION_EPSILON,
};

/// Body bottom must sit this far below a platform's top before its side counts as a wall.
pub const WALL_CONTACT_MIN_DEPTH: f32 = 5.0;
/// How far beyond each side of the body walls are probed.
pub const WALL_PROBE_REACH: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    pub rect: Rect<f32>,
    pub color: Rgb,
    pub is_finish: bool,
}

impl Platform {
    pub fn new(x: f32, y: f32, width: f32, height: f32, color: Rgb) -> Platform {
        Platform {
            rect: rect(x, y, width, height),
            color,
            is_finish: false,
        }
    }

    pub fn finish(x: f32, y: f32, width: f32, height: f32, color: Rgb) -> Platform {
        Platform {
            is_finish: true,
            ..Platform::new(x, y, width, height, color)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    platforms: Vec<Platform>,
    hazards: Vec<Rect<f32>>,
    start_position: Point<f32>,
    kill_plane_y: f32,
}

impl Level {
    pub fn new(name: &str, start_position: Point<f32>, kill_plane_y: f32) -> Level {
        Level {
            name: name.to_string(),
            platforms: Vec::new(),
            hazards: Vec::new(),
            start_position,
            kill_plane_y,
        }
    }

    pub fn add_platform(&mut self, platform: Platform) {
        self.platforms.push(platform);
    }

    pub fn add_hazard(&mut self, hazard: Rect<f32>) {
        self.hazards.push(hazard);
    }

    pub fn set_start_position(&mut self, start_position: Point<f32>) {
        self.start_position = start_position;
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn hazards(&self) -> &[Rect<f32>] {
        &self.hazards
    }

    pub fn start_position(&self) -> Point<f32> {
        self.start_position
    }

    pub fn kill_plane_y(&self) -> f32 {
        self.kill_plane_y
    }

    pub fn finish_platform(&self) -> Option<&Platform> {
        self.platforms.iter().find(|platform| platform.is_finish)
    }

    pub fn platform(&self, index: usize) -> Option<&Platform> {
        self.platforms.get(index)
    }

    /// Platforms overlapping `body`, in level order, with their indices.
    pub fn overlapping<'a>(
        &'a self,
        body: &'a Rect<f32>,
    ) -> impl Iterator<Item = (usize, &'a Platform)> + 'a {
        self.platforms
            .iter()
            .enumerate()
            .filter(move |(_, platform)| overlaps(body, &platform.rect))
    }

    /// First platform whose top edge the body is resting on.
    pub fn support_under(&self, body: &Rect<f32>) -> Option<usize> {
        self.platforms.iter().position(|platform| {
            (top(&platform.rect) - bottom(body)).abs() <= COLLISION_EPSILON
                && overlap_x(body, &platform.rect) > COLLISION_EPSILON
        })
    }

    /// Which side of the body a platform's vertical face touches, if any.
    /// Probes `WALL_PROBE_REACH` past each side and ignores ledges the body is
    /// only standing on. When both sides touch, the last platform in level
    /// order wins.
    pub fn wall_contact(&self, body: &Rect<f32>) -> Option<Side> {
        let probe = rect(
            left(body) - WALL_PROBE_REACH,
            top(body),
            right(body) - left(body) + 2.0 * WALL_PROBE_REACH,
            bottom(body) - top(body),
        );
        let mut contact = None;
        for platform in &self.platforms {
            if !overlaps(&probe, &platform.rect) {
                continue;
            }
            if bottom(body) <= top(&platform.rect) + WALL_CONTACT_MIN_DEPTH {
                continue;
            }
            if center_x(body) < left(&platform.rect) {
                contact = Some(Side::Right);
            } else if center_x(body) > right(&platform.rect) {
                contact = Some(Side::Left);
            }
        }
        contact
    }

    pub fn touches_hazard(&self, body: &Rect<f32>) -> bool {
        self.hazards.iter().any(|hazard| overlaps(body, hazard))
    }

    pub fn below_kill_plane(&self, body: &Rect<f32>) -> bool {
        top(body) > self.kill_plane_y()
    }
}

#[cfg(test)]
impl Level {
    pub fn with_platform(mut self, platform: Platform) -> Level {
        self.platforms.push(platform);
        self
    }

    pub fn with_hazard(mut self, hazard: Rect<f32>) -> Level {
        self.hazards.push(hazard);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::p;
    use assert2::assert;

    fn gray() -> Rgb {
        Rgb(100, 100, 100)
    }

    fn shaft() -> Level {
        Level::new("shaft", p(100.0, 430.0), 720.0)
            .with_platform(Platform::new(0.0, 500.0, 400.0, 60.0, gray()))
            .with_platform(Platform::new(200.0, 100.0, 40.0, 400.0, gray()))
            .with_platform(Platform::finish(300.0, 300.0, 50.0, 20.0, gray()))
            .with_hazard(rect(350.0, 480.0, 40.0, 20.0))
    }

    #[test]
    fn test_overlapping_reports_indices_in_order() {
        let level = shaft();
        let body = rect(190.0, 460.0, 30.0, 60.0);
        let hits: Vec<usize> = level.overlapping(&body).map(|(i, _)| i).collect();
        assert!(hits == vec![0, 1]);
    }

    #[test]
    fn test_support_under_requires_flush_contact() {
        let level = shaft();
        assert!(level.support_under(&rect(50.0, 440.0, 30.0, 60.0)) == Some(0));
        assert!(level.support_under(&rect(50.0, 430.0, 30.0, 60.0)) == None);
        assert!(level.support_under(&rect(500.0, 440.0, 30.0, 60.0)) == None);
    }

    #[test]
    fn test_wall_contact_on_each_side() {
        let level = shaft();
        assert!(level.wall_contact(&rect(170.0, 300.0, 30.0, 60.0)) == Some(Side::Right));
        assert!(level.wall_contact(&rect(240.0, 300.0, 30.0, 60.0)) == Some(Side::Left));
        assert!(level.wall_contact(&rect(120.0, 300.0, 30.0, 60.0)) == None);
    }

    #[test]
    fn test_standing_on_a_ledge_is_not_a_wall() {
        let level = shaft();
        // sunk 3 units into the finish platform's top, its corner inside the probe
        let body = rect(275.0, 243.0, 30.0, 60.0);
        assert!(level.wall_contact(&body) == None);
    }

    #[test]
    fn test_hazards_and_kill_plane() {
        let level = shaft();
        assert!(level.touches_hazard(&rect(340.0, 430.0, 30.0, 60.0)));
        assert!(!level.touches_hazard(&rect(300.0, 430.0, 30.0, 60.0)));
        assert!(level.below_kill_plane(&rect(0.0, 721.0, 30.0, 60.0)));
        assert!(!level.below_kill_plane(&rect(0.0, 700.0, 30.0, 60.0)));
    }

    #[test]
    fn test_finish_platform_lookup() {
        let level = shaft();
        assert!(level.finish_platform().map(|f| f.rect) == Some(rect(300.0, 300.0, 50.0, 20.0)));
        assert!(level.platform(2).map(|f| f.is_finish) == Some(true));
    }
}
