use geo::{point, CoordNum, Point, Rect};
use serde::{Deserialize, Serialize};

/// Overlaps shallower than this are treated as touching, not colliding.
/// Keeps a body resting exactly on a floor from registering a sideways hit.
pub const COLLISION_EPSILON: f32 = 1e-3;

pub fn p<T: 'static>(x: T, y: T) -> Point<T>
where
    T: CoordNum,
{
    return point!(x: x, y: y);
}

pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Rect<f32> {
    return Rect::new((x, y), (x + width, y + height));
}

pub fn rect_at(top_left: Point<f32>, size: Point<f32>) -> Rect<f32> {
    return rect(top_left.x(), top_left.y(), size.x(), size.y());
}

pub fn left(r: &Rect<f32>) -> f32 {
    r.min().x
}
pub fn right(r: &Rect<f32>) -> f32 {
    r.max().x
}
pub fn top(r: &Rect<f32>) -> f32 {
    r.min().y
}
pub fn bottom(r: &Rect<f32>) -> f32 {
    r.max().y
}
pub fn center_x(r: &Rect<f32>) -> f32 {
    (left(r) + right(r)) / 2.0
}

/// Depth of overlap along x, negative when apart
pub fn overlap_x(a: &Rect<f32>, b: &Rect<f32>) -> f32 {
    right(a).min(right(b)) - left(a).max(left(b))
}

/// Depth of overlap along y, negative when apart
pub fn overlap_y(a: &Rect<f32>, b: &Rect<f32>) -> f32 {
    bottom(a).min(bottom(b)) - top(a).max(top(b))
}

/// Strict AABB overlap. Shared edges do not count.
pub fn overlaps(a: &Rect<f32>, b: &Rect<f32>) -> bool {
    overlap_x(a, b) > COLLISION_EPSILON && overlap_y(a, b) > COLLISION_EPSILON
}

/// Step `current` toward `target` by at most `max_delta`, never past it.
pub fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    let max_delta = non_negative(max_delta);
    if current < target {
        return (current + max_delta).min(target);
    } else {
        return (current - max_delta).max(target);
    }
}

/// Live-tuned values can go negative or NaN; physics treats those as zero.
pub fn non_negative(x: f32) -> f32 {
    x.max(0.0)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn lighten(&self, amount: u8) -> Rgb {
        return Rgb(
            self.0.saturating_add(amount),
            self.1.saturating_add(amount),
            self.2.saturating_add(amount),
        );
    }
}

/// Maps a world position onto a terminal cell of `cell_size` world units.
pub fn world_to_cell(world_pos: Point<f32>, cell_size: Point<f32>) -> Point<i32> {
    return trunc(p(
        (world_pos.x() / cell_size.x()).floor(),
        (world_pos.y() / cell_size.y()).floor(),
    ));
}

pub fn trunc(vec: Point<f32>) -> Point<i32> {
    return Point::<i32>::new(vec.x().trunc() as i32, vec.y().trunc() as i32);
}

pub trait SignedExt: num::Signed {
    fn sign(&self) -> Self;
}

impl<T: num::Signed> SignedExt for T {
    // signum() on floats maps 0.0 to 1.0, which is useless for input axes
    fn sign(&self) -> T {
        if *self == T::zero() {
            return T::zero();
        } else if self.is_negative() {
            return -T::one();
        } else {
            return T::one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use assert2::assert;

    #[test]
    fn test_rect_edges() {
        let r = rect(10.0, 20.0, 30.0, 60.0);
        assert!(left(&r) == 10.0);
        assert!(right(&r) == 40.0);
        assert!(top(&r) == 20.0);
        assert!(bottom(&r) == 80.0);
        assert!(center_x(&r) == 25.0);
    }

    #[test]
    fn test_touching_rects_do_not_overlap() {
        let floor = rect(0.0, 500.0, 400.0, 60.0);
        let standing = rect(100.0, 440.0, 30.0, 60.0);
        assert!(!overlaps(&standing, &floor));
        assert!(!overlaps(&floor, &standing));
    }

    #[test]
    fn test_sunken_rect_overlaps() {
        let floor = rect(0.0, 500.0, 400.0, 60.0);
        let sunk = rect(100.0, 440.6, 30.0, 60.0);
        assert!(overlaps(&sunk, &floor));
        assert_relative_eq!(overlap_y(&sunk, &floor), 0.6, epsilon = 1e-4);
    }

    #[test]
    fn test_separated_rects_have_negative_overlap() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(15.0, 0.0, 10.0, 10.0);
        assert!(overlap_x(&a, &b) == -5.0);
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn test_approach_never_overshoots() {
        assert!(approach(0.0, 8.0, 0.5) == 0.5);
        assert!(approach(7.8, 8.0, 0.5) == 8.0);
        assert!(approach(-0.2, 0.0, 0.5) == 0.0);
        assert!(approach(0.3, 0.0, 0.5) == 0.0);
        assert!(approach(5.0, -5.0, 2.0) == 3.0);
    }

    #[test]
    fn test_approach_ignores_negative_rate() {
        assert!(approach(3.0, 8.0, -1.0) == 3.0);
        assert!(approach(3.0, 8.0, f32::NAN) == 3.0);
    }

    #[test]
    fn test_lighten_saturates() {
        assert!(Rgb(200, 30, 250).lighten(30) == Rgb(230, 60, 255));
    }

    #[test]
    fn test_world_to_cell_at_zero() {
        assert!(world_to_cell(p(0.0, 0.0), p(10.0, 20.0)) == p(0, 0));
    }

    #[test]
    fn test_world_to_cell_rounds_down() {
        assert!(world_to_cell(p(19.9, 39.9), p(10.0, 20.0)) == p(1, 1));
        assert!(world_to_cell(p(20.0, 40.0), p(10.0, 20.0)) == p(2, 2));
    }

    #[test]
    fn test_world_to_cell_in_the_negazone() {
        assert!(world_to_cell(p(-0.1, -20.1), p(10.0, 20.0)) == p(-1, -2));
    }

    #[test]
    fn test_sign() {
        assert!(9.0_f32.sign() == 1.0);
        assert!(0.1_f32.sign() == 1.0);
        assert!(0.0_f32.sign() == 0.0);
        assert!((-0.1_f32).sign() == -1.0);
        assert!((-100.0_f32).sign() == -1.0);

        assert!(9_i32.sign() == 1);
        assert!(0_i32.sign() == 0);
        assert!((-100_i32).sign() == -1);
    }
}
