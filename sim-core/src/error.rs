//! Error type shared by every fallible constructor in the crate.

use thiserror::Error;

/// Failures raised while building nodes, paths, regions or worlds.
///
/// All of these are configuration problems caught at construction time.
/// Once a [`crate::path::Path`] exists, ticking it cannot fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrowthError {
    /// Split and prune would fight each other forever.
    #[error("min_distance ({min}) must be less than max_distance ({max})")]
    DistanceOrder { min: f32, max: f32 },

    /// A length or force that only makes sense as a non-negative number.
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    /// NaN or infinity in a numeric option.
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },

    /// The commit step interpolates by this factor.
    #[error("max_velocity must lie in [0, 1], got {0}")]
    MaxVelocity(f32),

    #[error("max_nodes must be at least 1")]
    ZeroNodeCap,

    /// A boundary region needs an area to contain anything.
    #[error("boundary polygon needs at least 3 vertices, got {0}")]
    DegeneratePolygon(usize),

    #[error("no path with id {0}")]
    UnknownPath(usize),
}

pub type GrowthResult<T> = Result<T, GrowthError>;
