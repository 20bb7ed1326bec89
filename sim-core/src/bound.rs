use glam::Vec2;

use crate::error::{GrowthError, GrowthResult};

/// A polygonal region that pins nodes crossing its edge.
///
/// A normal region keeps nodes inside: a node outside it is fixed. A
/// reversed region keeps nodes out: a node inside it is fixed.
#[derive(Clone, Debug, PartialEq)]
pub struct Bound {
    polygon: Vec<Vec2>,
    reverse: bool,
}

impl Bound {
    /// Creates a region from a simple polygon.
    ///
    /// The polygon is implicitly closed; the last vertex connects back to
    /// the first.
    ///
    /// ### Returns
    /// - `Err(GrowthError::DegeneratePolygon)` for fewer than 3 vertices.
    pub fn new(polygon: Vec<Vec2>, reverse: bool) -> GrowthResult<Self> {
        if polygon.len() < 3 {
            return Err(GrowthError::DegeneratePolygon(polygon.len()));
        }
        Ok(Self { polygon, reverse })
    }

    /// Axis-aligned rectangle between `min` and `max`.
    pub fn rect(min: Vec2, max: Vec2, reverse: bool) -> Self {
        Self {
            polygon: vec![
                min,
                Vec2::new(max.x, min.y),
                max,
                Vec2::new(min.x, max.y),
            ],
            reverse,
        }
    }

    pub fn polygon(&self) -> &[Vec2] {
        &self.polygon
    }

    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    /// Crossing-number point-in-polygon test, ignoring `reverse`.
    ///
    /// Edges are half-open: a point on a left or bottom edge counts as
    /// inside, a point on a right or top edge as outside.
    pub fn polygon_contains(&self, p: Vec2) -> bool {
        let mut inside = false;
        let mut j = self.polygon.len() - 1;
        for (i, a) in self.polygon.iter().enumerate() {
            let b = self.polygon[j];
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Polygon containment, negated for reversed regions.
    pub fn contains(&self, p: Vec2) -> bool {
        self.polygon_contains(p) != self.reverse
    }

    /// `true` when a node at `p` must be pinned by this region.
    #[inline]
    pub fn is_violated_by(&self, p: Vec2) -> bool {
        !self.contains(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn interior_and_exterior_points_flip_with_reverse() {
        let normal = Bound::new(square(), false).unwrap();
        let reversed = Bound::new(square(), true).unwrap();
        let inside = Vec2::new(5.0, 5.0);
        let outside = Vec2::new(15.0, 5.0);

        assert!(normal.contains(inside));
        assert!(!reversed.contains(inside));
        assert!(!normal.contains(outside));
        assert!(reversed.contains(outside));

        assert!(!normal.is_violated_by(inside));
        assert!(reversed.is_violated_by(inside));
    }

    #[test]
    fn concave_notch_is_outside() {
        // A "U" shape opening upward.
        let u = Bound::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(9.0, 0.0),
                Vec2::new(9.0, 9.0),
                Vec2::new(6.0, 9.0),
                Vec2::new(6.0, 3.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(3.0, 9.0),
                Vec2::new(0.0, 9.0),
            ],
            false,
        )
        .unwrap();

        assert!(u.contains(Vec2::new(1.5, 6.0)));
        assert!(!u.contains(Vec2::new(4.5, 6.0)));
        assert!(u.contains(Vec2::new(4.5, 1.5)));
    }

    #[test]
    fn edges_are_half_open() {
        let b = Bound::new(square(), false).unwrap();
        assert!(b.contains(Vec2::new(0.0, 5.0)));
        assert!(b.contains(Vec2::new(5.0, 0.0)));
        assert!(!b.contains(Vec2::new(10.0, 5.0)));
        assert!(!b.contains(Vec2::new(5.0, 10.0)));
    }

    #[test]
    fn rejects_degenerate_polygon() {
        assert_eq!(
            Bound::new(vec![Vec2::ZERO, Vec2::ONE], false),
            Err(GrowthError::DegeneratePolygon(2))
        );
    }

    #[test]
    fn rect_matches_explicit_polygon() {
        let r = Bound::rect(Vec2::ZERO, Vec2::splat(10.0), false);
        assert_eq!(r, Bound::new(square(), false).unwrap());
    }
}
