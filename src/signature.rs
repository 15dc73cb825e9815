//! Per-character one-shot special actions.
//!
//! Each archetype maps to exactly one `SignatureMove` through a lookup table.
//! Dashes change the body's motion; everything else is cosmetic and only
//! produces an effect for the presentation layer to show.

use std::collections::HashMap;

use enum_as_inner::EnumAsInner;
use strum_macros::Display;

use crate::body::{MovementState, PlayerBody, Side};
use crate::input::InputFrame;
use crate::profile::{Character, CharacterProfile};
use crate::utility::non_negative;

/// Cooldown between purely visual signatures so holding the key doesn't spam them.
pub const COSMETIC_COOLDOWN: u32 = 12;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum CosmeticKind {
    Coin,
    BloodSplatter,
    Shuriken,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignatureMove {
    Dash,
    Cosmetic(CosmeticKind),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DashEffect {
    pub direction: Side,
    pub speed: f32,
    pub duration: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, EnumAsInner)]
pub enum SignatureEffect {
    Dash(DashEffect),
    Cosmetic(CosmeticKind),
}

pub struct SignatureMoveResolver {
    table: HashMap<Character, SignatureMove>,
}

impl Default for SignatureMoveResolver {
    fn default() -> Self {
        SignatureMoveResolver::from_entries([
            (Character::Mario, SignatureMove::Cosmetic(CosmeticKind::Coin)),
            (
                Character::MeatBoy,
                SignatureMove::Cosmetic(CosmeticKind::BloodSplatter),
            ),
            (Character::Link, SignatureMove::Dash),
            (Character::Madeline, SignatureMove::Dash),
            (Character::Ninja, SignatureMove::Cosmetic(CosmeticKind::Shuriken)),
        ])
    }
}

impl SignatureMoveResolver {
    pub fn from_entries<I>(entries: I) -> SignatureMoveResolver
    where
        I: IntoIterator<Item = (Character, SignatureMove)>,
    {
        SignatureMoveResolver {
            table: entries.into_iter().collect(),
        }
    }

    pub fn signature_for(&self, character: Character) -> Option<SignatureMove> {
        self.table.get(&character).copied()
    }

    /// Fire `character`'s signature if it is available and apply its physics to `body`.
    /// Unmapped characters, cooldowns and disabled dashes all resolve to `None`.
    pub fn resolve(
        &self,
        character: Character,
        body: &mut PlayerBody,
        profile: &CharacterProfile,
        input: &InputFrame,
    ) -> Option<SignatureEffect> {
        if body.signature_cooldown > 0 || body.is_dashing() {
            return None;
        }
        match self.signature_for(character)? {
            SignatureMove::Dash => {
                if !profile.has_dash {
                    return None;
                }
                let direction = input.move_direction().unwrap_or(body.facing);
                let effect = DashEffect {
                    direction,
                    speed: non_negative(profile.dash_speed),
                    duration: profile.dash_duration.max(1),
                };
                body.set_velocity_x(direction.sign() * effect.speed);
                body.dash_timer = effect.duration;
                body.dash_direction = direction;
                body.facing = direction;
                body.state = MovementState::Dashing;
                body.wall = None;
                body.signature_cooldown = profile.dash_cooldown.max(effect.duration);
                Some(SignatureEffect::Dash(effect))
            }
            SignatureMove::Cosmetic(kind) => {
                body.signature_cooldown = COSMETIC_COOLDOWN;
                Some(SignatureEffect::Cosmetic(kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::p;
    use assert2::assert;

    fn body_for(character: Character) -> (PlayerBody, CharacterProfile) {
        let profile = character.preset();
        let body = PlayerBody::spawn(p(100.0, 100.0), character, &profile);
        (body, profile)
    }

    #[test]
    fn test_every_character_has_one_signature() {
        let resolver = SignatureMoveResolver::default();
        assert!(resolver.signature_for(Character::Link) == Some(SignatureMove::Dash));
        assert!(resolver.signature_for(Character::Madeline) == Some(SignatureMove::Dash));
        assert!(
            resolver.signature_for(Character::Mario)
                == Some(SignatureMove::Cosmetic(CosmeticKind::Coin))
        );
    }

    #[test]
    fn test_dash_sets_velocity_in_facing_direction() {
        let resolver = SignatureMoveResolver::default();
        let (mut body, profile) = body_for(Character::Link);
        body.facing = Side::Left;
        body.velocity = p(3.0, -4.0);
        let effect = resolver.resolve(Character::Link, &mut body, &profile, &InputFrame::idle());
        let dash = effect.as_ref().and_then(|e| e.as_dash()).copied();
        assert!(dash == Some(DashEffect { direction: Side::Left, speed: 12.0, duration: 20 }));
        assert!(body.velocity == p(-12.0, -4.0));
        assert!(body.state == MovementState::Dashing);
        assert!(body.dash_timer == 20);
        assert!(body.signature_cooldown == 30);
    }

    #[test]
    fn test_dash_prefers_held_direction_over_facing() {
        let resolver = SignatureMoveResolver::default();
        let (mut body, profile) = body_for(Character::Madeline);
        body.facing = Side::Left;
        resolver.resolve(Character::Madeline, &mut body, &profile, &InputFrame::moving(1.0));
        assert!(body.velocity.x() == 15.0);
        assert!(body.facing == Side::Right);
    }

    #[test]
    fn test_dash_blocked_by_cooldown() {
        let resolver = SignatureMoveResolver::default();
        let (mut body, profile) = body_for(Character::Link);
        body.signature_cooldown = 3;
        let before = body.clone();
        let effect = resolver.resolve(Character::Link, &mut body, &profile, &InputFrame::idle());
        assert!(effect == None);
        assert!(body == before);
    }

    #[test]
    fn test_dash_requires_has_dash() {
        let resolver = SignatureMoveResolver::default();
        let (mut body, mut profile) = body_for(Character::Link);
        profile.has_dash = false;
        let effect = resolver.resolve(Character::Link, &mut body, &profile, &InputFrame::idle());
        assert!(effect == None);
        assert!(body.state != MovementState::Dashing);
    }

    #[test]
    fn test_cosmetic_signature_leaves_physics_alone() {
        let resolver = SignatureMoveResolver::default();
        let (mut body, profile) = body_for(Character::Ninja);
        body.velocity = p(5.0, 2.0);
        let effect = resolver.resolve(Character::Ninja, &mut body, &profile, &InputFrame::moving(-1.0));
        assert!(effect.as_ref().and_then(|e| e.as_cosmetic()) == Some(&CosmeticKind::Shuriken));
        assert!(body.velocity == p(5.0, 2.0));
        assert!(body.position == p(100.0, 100.0));
        assert!(body.state == MovementState::Airborne);
        assert!(body.signature_cooldown == COSMETIC_COOLDOWN);
    }

    #[test]
    fn test_unmapped_character_is_a_no_op() {
        let resolver = SignatureMoveResolver::from_entries([(Character::Link, SignatureMove::Dash)]);
        let (mut body, profile) = body_for(Character::Mario);
        let before = body.clone();
        let effect = resolver.resolve(Character::Mario, &mut body, &profile, &InputFrame::idle());
        assert!(effect == None);
        assert!(body == before);
    }
}
