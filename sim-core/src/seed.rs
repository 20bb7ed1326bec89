//! Initial shapes for new paths and boundary regions.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

/// `count` points evenly spaced on a circle, counter-clockwise from the
/// positive x axis.
pub fn ring(center: Vec2, radius: f32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let a = i as f32 / count as f32 * TAU;
            center + Vec2::new(a.cos(), a.sin()) * radius
        })
        .collect()
}

/// Like [`ring`], with each point's radius drawn from
/// `radius ± 10%`.
pub fn jittered_ring(center: Vec2, radius: f32, count: usize, rng: &mut impl Rng) -> Vec<Vec2> {
    let spread = (radius * 0.1).abs();
    (0..count)
        .map(|i| {
            let a = i as f32 / count as f32 * TAU;
            let r = radius + rng.random_range(-spread..=spread);
            center + Vec2::new(a.cos(), a.sin()) * r
        })
        .collect()
}

/// Corners of the axis-aligned rectangle centered on `center`.
pub fn rect(center: Vec2, half_extents: Vec2) -> Vec<Vec2> {
    let (min, max) = (center - half_extents, center + half_extents);
    vec![min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn ring_points_sit_on_the_circle() {
        let center = Vec2::new(256.0, 256.0);
        let points = ring(center, 20.0, 12);

        assert_eq!(points.len(), 12);
        for p in &points {
            assert_relative_eq!(p.distance(center), 20.0, epsilon = 1e-3);
        }
        assert_relative_eq!(points[0].x, 276.0, epsilon = 1e-3);
        assert_relative_eq!(points[0].y, 256.0, epsilon = 1e-3);
    }

    #[test]
    fn jittered_ring_stays_within_ten_percent() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let points = jittered_ring(Vec2::ZERO, 20.0, 64, &mut rng);

        assert_eq!(points.len(), 64);
        for p in &points {
            let r = p.length();
            assert!((18.0 - 1e-3..=22.0 + 1e-3).contains(&r), "radius {r}");
        }
    }

    #[test]
    fn rect_corners_wind_counter_clockwise() {
        let corners = rect(Vec2::new(5.0, 5.0), Vec2::new(5.0, 2.0));
        assert_eq!(
            corners,
            vec![
                Vec2::new(0.0, 3.0),
                Vec2::new(10.0, 3.0),
                Vec2::new(10.0, 7.0),
                Vec2::new(0.0, 7.0),
            ]
        );
    }

    #[test]
    fn empty_ring_is_empty() {
        assert!(ring(Vec2::ZERO, 10.0, 0).is_empty());
    }
}
