use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
    bound::Bound,
    error::{GrowthError, GrowthResult},
    path::{GrowthStats, Path},
    spatial::SpatialIndex,
    types::{NodeId, PathId},
};

/// Rendering collaborator fed by [`World::draw`].
pub trait Canvas {
    /// One path's node positions in curve order.
    fn path(&mut self, points: &[Vec2], closed: bool);

    /// One boundary region. Ignored unless overridden.
    fn bound(&mut self, _polygon: &[Vec2], _reverse: bool) {}
}

/// Result of one [`World::update`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// The world is paused; nothing moved.
    Paused,
    Advanced {
        /// Paths that were updated this tick.
        active: usize,
        /// Paths skipped because they are above their node cap.
        saturated: usize,
    },
}

/// Owns every path of a scene and drives their growth.
///
/// Each tick rebuilds one [`SpatialIndex`] over all nodes of all paths so
/// that paths repel each other as well as themselves.
#[derive(Debug, Default)]
pub struct World {
    paths: Vec<Path>,
    index: SpatialIndex,
    paused: bool,
    ticks: u64,
    /// Topology changes of the last tick, one entry per path.
    last_stats: Vec<GrowthStats>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths(paths: Vec<Path>) -> Self {
        Self {
            paths,
            ..Self::default()
        }
    }

    pub fn add_path(&mut self, path: Path) -> PathId {
        self.paths.push(path);
        self.paths.len() - 1
    }

    pub fn add_paths<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = Path>,
    {
        self.paths.extend(paths);
    }

    /// Removes and returns a path. Ids of later paths shift down by one.
    pub fn remove_path(&mut self, id: PathId) -> GrowthResult<Path> {
        if id >= self.paths.len() {
            warn!(id, "remove_path: no such path");
            return Err(GrowthError::UnknownPath(id));
        }
        self.last_stats.clear();
        Ok(self.paths.remove(id))
    }

    pub fn clear_paths(&mut self) {
        self.paths.clear();
        self.index.clear();
        self.last_stats.clear();
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.paths.get(id)
    }

    pub fn path_mut(&mut self, id: PathId) -> Option<&mut Path> {
        self.paths.get_mut(id)
    }

    /// Attaches `bound` to the path `id`.
    pub fn attach_bound(&mut self, id: PathId, bound: Arc<Bound>) -> GrowthResult<()> {
        let path = self
            .paths
            .get_mut(id)
            .ok_or(GrowthError::UnknownPath(id))?;
        path.attach_bound(bound);
        Ok(())
    }

    /// Attaches `bound` to every path currently in the world.
    pub fn attach_bound_to_all(&mut self, bound: &Arc<Bound>) {
        for path in &mut self.paths {
            path.attach_bound(Arc::clone(bound));
        }
    }

    /// Detaches `bound` from every path.
    ///
    /// ### Returns
    /// Number of paths it was detached from.
    pub fn detach_bound(&mut self, bound: &Arc<Bound>) -> usize {
        self.paths
            .iter_mut()
            .map(|p| p.detach_bound(bound))
            .filter(|&detached| detached)
            .count()
    }

    pub fn node_count(&self) -> usize {
        self.paths.iter().map(Path::len).sum()
    }

    /// Number of ticks that actually advanced the simulation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Per-path topology changes from the last advancing tick.
    ///
    /// Saturated paths report empty stats.
    pub fn last_stats(&self) -> &[GrowthStats] {
        &self.last_stats
    }

    /// Ids of nodes inserted during the last tick, tagged with their path.
    pub fn last_inserted(&self) -> impl Iterator<Item = (PathId, NodeId)> + '_ {
        self.last_stats
            .iter()
            .enumerate()
            .flat_map(|(path, s)| s.inserted.iter().map(move |&node| (path, node)))
    }

    /// Ids of paths above their node cap. The world no longer updates
    /// them.
    pub fn saturated(&self) -> impl Iterator<Item = PathId> + '_ {
        self.paths
            .iter()
            .enumerate()
            .filter(|(_, p)| p.exceeds_cap())
            .map(|(id, _)| id)
    }

    /// `true` once any path is above its node cap.
    pub fn is_done(&self) -> bool {
        self.paths.iter().any(Path::exceeds_cap)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            info!(tick = self.ticks, "paused");
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            info!(tick = self.ticks, "resumed");
        }
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Rebuilds the spatial index from the current nodes of every path.
    pub fn rebuild_index(&mut self) {
        let entries = self
            .paths
            .iter()
            .enumerate()
            .flat_map(|(id, path)| path.index_entries(id));
        self.index.rebuild(entries);
    }

    /// Advances the simulation by one tick unless paused.
    ///
    /// ### Parameters
    /// - `rng` - Random source shared by every path for jitter.
    pub fn update(&mut self, rng: &mut impl Rng) -> TickOutcome {
        if self.paused {
            return TickOutcome::Paused;
        }
        self.advance(rng)
    }

    /// Runs one tick regardless of the pause flag.
    ///
    /// The index is rebuilt from scratch, then every path below its node
    /// cap runs [`Path::update`] against it, in path order. Paths above
    /// the cap are skipped and counted as saturated.
    pub fn advance(&mut self, rng: &mut impl Rng) -> TickOutcome {
        self.rebuild_index();

        let mut active = 0;
        let mut saturated = 0;
        self.last_stats.clear();
        for (id, path) in self.paths.iter_mut().enumerate() {
            if path.exceeds_cap() {
                saturated += 1;
                self.last_stats.push(GrowthStats::default());
                continue;
            }
            active += 1;
            let stats = path.update(&self.index, rng);
            if path.exceeds_cap() {
                info!(path = id, nodes = path.len(), "path reached its node cap");
            }
            self.last_stats.push(stats);
        }

        self.ticks += 1;
        debug!(
            tick = self.ticks,
            nodes = self.node_count(),
            active,
            saturated,
            "world tick"
        );
        TickOutcome::Advanced { active, saturated }
    }

    /// Inserts one random midpoint node into every path below its cap.
    ///
    /// ### Returns
    /// Number of nodes inserted.
    pub fn inject_nodes(&mut self, rng: &mut impl Rng) -> usize {
        self.paths
            .iter_mut()
            .filter(|p| !p.exceeds_cap())
            .filter_map(|p| p.inject_random_node(rng))
            .count()
    }

    /// Hands every path, then every distinct boundary region, to `canvas`.
    pub fn draw(&self, canvas: &mut impl Canvas) {
        let mut seen: Vec<&Arc<Bound>> = Vec::new();
        for path in &self.paths {
            canvas.path(&path.positions(), path.is_closed());
            for bound in path.bounds() {
                if !seen.iter().any(|b| Arc::ptr_eq(b, bound)) {
                    seen.push(bound);
                }
            }
        }
        for bound in seen {
            canvas.bound(bound.polygon(), bound.is_reversed());
        }
    }
}
