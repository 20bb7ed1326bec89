use serde::{Deserialize, Serialize};

use crate::error::{GrowthError, GrowthResult};

/// How the repulsion stage combines the neighbors returned by the
/// spatial index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepulsionMode {
    /// Each neighbor re-interpolates the staged position from the current
    /// one, so only the last (farthest) neighbor in range has an effect.
    #[default]
    LastWins,
    /// The mean push-away displacement over every other node in range is
    /// added to the staged position.
    Accumulate,
}

/// Growth parameters shared by every node of a path.
///
/// Values are copied into nodes and paths at construction. Nothing reads
/// a `Config` by reference while a tick runs, so two paths built from
/// different configs keep their own parameters.
///
/// Serialized field names follow the sketch settings
/// (`MinDistance`, `MaxDistance`, ...). Missing fields take their
/// [`Default`] value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Config {
    /// Edges at or below this length are pruned.
    pub min_distance: f32,
    /// Edges at or above this length are split.
    pub max_distance: f32,
    pub repulsion_radius: f32,
    /// Interpolation factor used when committing staged positions.
    pub max_velocity: f32,
    pub attraction_force: f32,
    pub repulsion_force: f32,
    pub alignment_force: f32,
    pub use_brownian_motion: bool,
    pub brownian_motion_range: f32,
    /// Node count above which a path stops being updated by the world.
    pub max_nodes: usize,
    pub repulsion_mode: RepulsionMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_distance: 5.0,
            max_distance: 11.0,
            repulsion_radius: 20.0,
            max_velocity: 0.18,
            attraction_force: 0.3,
            repulsion_force: 0.9,
            alignment_force: 0.45,
            use_brownian_motion: true,
            brownian_motion_range: 0.05,
            max_nodes: 1000,
            repulsion_mode: RepulsionMode::LastWins,
        }
    }
}

impl Config {
    /// Checks every invariant the growth algorithm relies on.
    ///
    /// ### Returns
    /// - `Ok(())` if the config can drive a path.
    /// - `Err` describing the first offending option otherwise.
    pub fn validate(&self) -> GrowthResult<()> {
        let numeric = [
            ("min_distance", self.min_distance),
            ("max_distance", self.max_distance),
            ("repulsion_radius", self.repulsion_radius),
            ("max_velocity", self.max_velocity),
            ("attraction_force", self.attraction_force),
            ("repulsion_force", self.repulsion_force),
            ("alignment_force", self.alignment_force),
            ("brownian_motion_range", self.brownian_motion_range),
        ];
        for (name, value) in numeric {
            if !value.is_finite() {
                return Err(GrowthError::NonFinite { name, value });
            }
            if value < 0.0 {
                return Err(GrowthError::Negative { name, value });
            }
        }

        if self.min_distance >= self.max_distance {
            return Err(GrowthError::DistanceOrder {
                min: self.min_distance,
                max: self.max_distance,
            });
        }
        if self.max_velocity > 1.0 {
            return Err(GrowthError::MaxVelocity(self.max_velocity));
        }
        if self.max_nodes == 0 {
            return Err(GrowthError::ZeroNodeCap);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_min_not_below_max() {
        let cfg = Config {
            min_distance: 11.0,
            max_distance: 11.0,
            ..Config::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(GrowthError::DistanceOrder {
                min: 11.0,
                max: 11.0
            })
        );
    }

    #[test]
    fn rejects_negative_radius() {
        let cfg = Config {
            repulsion_radius: -1.0,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(GrowthError::Negative {
                name: "repulsion_radius",
                ..
            })
        ));
    }

    #[test]
    fn rejects_nan_and_out_of_range_velocity() {
        let nan = Config {
            attraction_force: f32::NAN,
            ..Config::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(GrowthError::NonFinite {
                name: "attraction_force",
                ..
            })
        ));

        let fast = Config {
            max_velocity: 1.5,
            ..Config::default()
        };
        assert_eq!(fast.validate(), Err(GrowthError::MaxVelocity(1.5)));
    }

    #[test]
    fn rejects_zero_node_cap() {
        let cfg = Config {
            max_nodes: 0,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(GrowthError::ZeroNodeCap));
    }
}
