//! Core 2-D differential growth library.
//!
//! A [`path::Path`] is a chain of nodes that attract their neighbors,
//! repel every nearby node, straighten toward their neighbors' midpoint
//! and subdivide as they spread apart. A [`world::World`] owns several
//! paths and steps them together.
//!
//! Main components:
//! - [`config`] - growth parameters and their validation.
//! - [`node`] - a single point with staged motion.
//! - [`path`] - node sequences, neighbor lookups and topology edits.
//! - [`phases`] - the per-tick force, split and prune passes.
//! - [`spatial`] - bulk-loaded R-tree for radius and k-nearest queries.
//! - [`bound`] - polygon regions that pin nodes.
//! - [`world`] - scene ownership, the tick loop and the draw seam.
//! - [`seed`] - initial shapes.
//! - [`error`] - construction errors.
//! - [`types`] - shared id aliases.

pub mod bound;
pub mod config;
pub mod error;
pub mod node;
pub mod path;
pub mod phases;
pub mod seed;
pub mod spatial;
pub mod types;
pub mod world;
