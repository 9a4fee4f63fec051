//! Pair filtering and circle narrow phase.

use ember_ecs::state;
use glam::Vec2;

/// Squared distances at or below this are treated as coincident centres.
pub const COINCIDENT_EPSILON: f32 = 1e-4;

/// Layer/mask filter: either side wanting to hit the other is enough.
#[inline]
pub fn should_collide(flags_a: u64, flags_b: u64) -> bool {
    let (layer_a, mask_a) = (state::get_layer(flags_a), state::get_mask(flags_a));
    let (layer_b, mask_b) = (state::get_layer(flags_b), state::get_mask(flags_b));
    mask_a & layer_b != 0 || mask_b & layer_a != 0
}

/// Penetration between two circles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Unit vector pointing from `b` towards `a`.
    pub normal: Vec2,
    /// Penetration depth, always positive.
    pub overlap: f32,
}

/// Overlap test for circles at `a` and `b`.
///
/// Returns `None` when they are apart or their centres coincide (no usable
/// normal).
pub fn circle_contact(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> Option<Contact> {
    let diff = a - b;
    let dist_sq = diff.length_squared();
    let combined = radius_a + radius_b;
    if dist_sq >= combined * combined || dist_sq <= COINCIDENT_EPSILON {
        return None;
    }
    let dist = dist_sq.sqrt();
    Some(Contact {
        normal: diff / dist,
        overlap: combined - dist,
    })
}

/// Impulse magnitude along `normal` for relative velocity `va - vb`.
///
/// `inv_mass_sum` is the sum of both inverse masses (2.0 for two unit
/// masses). Returns `None` for separating or massless pairs.
pub fn normal_impulse(
    relative_velocity: Vec2,
    normal: Vec2,
    restitution: f32,
    inv_mass_sum: f32,
) -> Option<f32> {
    let vn = relative_velocity.dot(normal);
    if vn > 0.0 || inv_mass_sum <= 0.0 {
        return None;
    }
    Some(-(1.0 + restitution) * vn / inv_mass_sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(layer: u16, mask: u16) -> u64 {
        state::ACTIVE | state::layer(layer) | state::mask(mask)
    }

    #[test]
    fn test_should_collide_is_symmetric() {
        let cases = [
            (flags(1, 2), flags(2, 0), true),
            (flags(1, 0), flags(2, 1), true),
            (flags(1, 1), flags(2, 2), false),
            (flags(0, 0), flags(0xFFFF, 0xFFFF), false),
        ];
        for (a, b, expected) in cases {
            assert_eq!(should_collide(a, b), expected);
            assert_eq!(should_collide(b, a), expected);
        }
    }

    #[test]
    fn test_behaviour_bits_do_not_leak_into_filter() {
        let a = state::VISIBLE | state::SOLID | state::layer(0);
        let b = state::ACTIVE | state::STATIC | state::mask(0);
        assert!(!should_collide(a, b));
    }

    #[test]
    fn test_circle_contact_overlap_and_normal() {
        let c = circle_contact(Vec2::new(10.0, 0.0), 8.0, Vec2::ZERO, 8.0);
        let c = c.unwrap_or_else(|| panic!("expected contact"));
        assert_eq!(c.normal, Vec2::X);
        assert!((c.overlap - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_contact_apart_or_touching() {
        assert!(circle_contact(Vec2::new(16.0, 0.0), 8.0, Vec2::ZERO, 8.0).is_none());
        assert!(circle_contact(Vec2::new(40.0, 0.0), 8.0, Vec2::ZERO, 8.0).is_none());
    }

    #[test]
    fn test_coincident_centres_have_no_contact() {
        assert!(circle_contact(Vec2::ONE, 8.0, Vec2::ONE, 8.0).is_none());
    }

    #[test]
    fn test_normal_impulse() {
        // Head-on approach at 10 units/s, perfectly elastic, unit masses.
        let j = normal_impulse(Vec2::new(-10.0, 0.0), Vec2::X, 1.0, 2.0);
        assert_eq!(j, Some(10.0));
        // Separating.
        assert_eq!(normal_impulse(Vec2::new(5.0, 0.0), Vec2::X, 1.0, 2.0), None);
        // Both immovable.
        assert_eq!(normal_impulse(Vec2::new(-5.0, 0.0), Vec2::X, 1.0, 0.0), None);
    }
}
