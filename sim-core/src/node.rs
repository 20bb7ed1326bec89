use glam::Vec2;

use crate::config::Config;
use crate::error::GrowthResult;

/// A single point of a growing path.
///
/// Forces never move `pos` directly. They blend `next_pos` toward their
/// own targets, and [`Node::commit`] then moves `pos` part of the way
/// toward the staged position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub pos: Vec2,
    pub next_pos: Vec2,
    /// Set while the node violates a boundary region. Fixed nodes ignore
    /// attraction and alignment and are never pruned.
    pub fixed: bool,
    pub min_distance: f32,
    pub repulsion_radius: f32,
}

impl Node {
    /// Creates a node at `pos`, copying its parameters from `cfg`.
    ///
    /// ### Returns
    /// - `Ok(node)` if `cfg` passes [`Config::validate`].
    /// - `Err` with the first invalid option otherwise.
    pub fn new(pos: Vec2, cfg: &Config) -> GrowthResult<Self> {
        cfg.validate()?;
        Ok(Self::spawn(pos, cfg))
    }

    /// Builds a node from a config that was already validated.
    pub(crate) fn spawn(pos: Vec2, cfg: &Config) -> Self {
        Self {
            pos,
            next_pos: pos,
            fixed: false,
            min_distance: cfg.min_distance,
            repulsion_radius: cfg.repulsion_radius,
        }
    }

    /// Resets the staged position to the current one.
    #[inline]
    pub fn stage(&mut self) {
        self.next_pos = self.pos;
    }

    /// Blends the staged position toward `target` by `weight`.
    #[inline]
    pub fn blend_toward(&mut self, target: Vec2, weight: f32) {
        self.next_pos = self.next_pos.lerp(target, weight);
    }

    /// Moves `pos` toward `next_pos` by the interpolation factor
    /// `max_velocity`.
    #[inline]
    pub fn commit(&mut self, max_velocity: f32) {
        self.pos = self.pos.lerp(self.next_pos, max_velocity);
    }

    #[inline]
    pub fn distance(&self, other: &Node) -> f32 {
        self.pos.distance(other.pos)
    }

    /// Midpoint of two nodes' current positions.
    #[inline]
    pub fn midpoint(&self, other: &Node) -> Vec2 {
        (self.pos + other.pos) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrowthError;
    use approx::assert_relative_eq;

    #[test]
    fn new_copies_parameters_from_config() {
        let cfg = Config {
            min_distance: 2.0,
            repulsion_radius: 7.0,
            ..Config::default()
        };
        let node = Node::new(Vec2::new(1.0, 2.0), &cfg).unwrap();

        assert_eq!(node.pos, Vec2::new(1.0, 2.0));
        assert_eq!(node.next_pos, node.pos);
        assert!(!node.fixed);
        assert_eq!(node.min_distance, 2.0);
        assert_eq!(node.repulsion_radius, 7.0);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let cfg = Config {
            min_distance: 20.0,
            max_distance: 10.0,
            ..Config::default()
        };
        assert_eq!(
            Node::new(Vec2::ZERO, &cfg),
            Err(GrowthError::DistanceOrder {
                min: 20.0,
                max: 10.0
            })
        );
    }

    #[test]
    fn commit_interpolates_instead_of_overwriting() {
        let mut node = Node::spawn(Vec2::ZERO, &Config::default());
        node.next_pos = Vec2::new(10.0, -20.0);
        node.commit(0.25);

        assert_relative_eq!(node.pos.x, 2.5);
        assert_relative_eq!(node.pos.y, -5.0);
    }

    #[test]
    fn later_blend_partially_supersedes_earlier_one() {
        let mut node = Node::spawn(Vec2::ZERO, &Config::default());
        node.blend_toward(Vec2::new(10.0, 0.0), 0.5);
        node.blend_toward(Vec2::new(0.0, 10.0), 0.5);

        assert_relative_eq!(node.next_pos.x, 2.5);
        assert_relative_eq!(node.next_pos.y, 5.0);

        node.stage();
        assert_eq!(node.next_pos, Vec2::ZERO);
    }
}
