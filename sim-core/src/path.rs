use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use tracing::debug;

use crate::{
    bound::Bound,
    config::Config,
    error::GrowthResult,
    node::Node,
    phases,
    spatial::{Entry, SpatialIndex},
    types::{NodeId, PathId},
};

/// Topology changes made by one call to [`Path::update`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrowthStats {
    /// Ids of midpoint nodes inserted by the split pass.
    pub inserted: Vec<NodeId>,
    /// Number of nodes removed by the prune pass.
    pub pruned: usize,
}

/// An open or closed curve of nodes that grows by differential growth.
///
/// Nodes live in an arena addressed by [`NodeId`]; `order` lists the live
/// ids in curve order. Positional inserts and removals only touch `order`,
/// so ids handed out earlier stay valid until their node is pruned.
#[derive(Debug)]
pub struct Path {
    pub(crate) slots: Vec<Option<Node>>,
    free: Vec<NodeId>,
    pub(crate) order: Vec<NodeId>,
    closed: bool,
    pub(crate) bounds: Vec<Arc<Bound>>,
    pub(crate) cfg: Config,
    /// Reused buffer for repulsion queries.
    pub(crate) scratch: Vec<Entry>,
}

impl Path {
    /// Creates an empty path.
    ///
    /// ### Returns
    /// - `Err` if `cfg` fails [`Config::validate`].
    pub fn new(cfg: Config, closed: bool) -> GrowthResult<Self> {
        cfg.validate()?;
        Ok(Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            closed,
            bounds: Vec::new(),
            cfg,
            scratch: Vec::new(),
        })
    }

    /// Creates a path with one node per position, in the given order.
    pub fn from_positions<I>(positions: I, cfg: Config, closed: bool) -> GrowthResult<Self>
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut path = Self::new(cfg, closed)?;
        for pos in positions {
            let node = path.create_node(pos);
            path.add_node(node);
        }
        Ok(path)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `true` once the node count is above the configured cap.
    pub fn exceeds_cap(&self) -> bool {
        self.order.len() > self.cfg.max_nodes
    }

    /// Live node ids in curve order.
    pub fn ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    /// Node at sequence position `at`.
    pub fn node_at(&self, at: usize) -> Option<&Node> {
        self.order.get(at).and_then(|&id| self.node(id))
    }

    /// Nodes in curve order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|&id| self.node(id))
    }

    /// Current positions in curve order.
    pub fn positions(&self) -> Vec<Vec2> {
        self.nodes().map(|n| n.pos).collect()
    }

    /// Current positions as `[x, y]` pairs in curve order, for renderers.
    pub fn to_array(&self) -> Vec<[f32; 2]> {
        self.nodes().map(|n| n.pos.to_array()).collect()
    }

    /// Sequence position of the previous neighbor of position `at`.
    ///
    /// `None` at the start of an open path, for paths shorter than two
    /// nodes, and for out-of-range positions.
    pub fn prev_index(&self, at: usize) -> Option<usize> {
        let len = self.order.len();
        if len < 2 || at >= len {
            None
        } else if at > 0 {
            Some(at - 1)
        } else if self.closed {
            Some(len - 1)
        } else {
            None
        }
    }

    /// Sequence position of the next neighbor of position `at`.
    pub fn next_index(&self, at: usize) -> Option<usize> {
        let len = self.order.len();
        if len < 2 || at >= len {
            None
        } else if at + 1 < len {
            Some(at + 1)
        } else if self.closed {
            Some(0)
        } else {
            None
        }
    }

    pub fn previous(&self, at: usize) -> Option<&Node> {
        self.prev_index(at).and_then(|i| self.node_at(i))
    }

    pub fn next(&self, at: usize) -> Option<&Node> {
        self.next_index(at).and_then(|i| self.node_at(i))
    }

    /// Builds a node carrying this path's parameters. The node is not
    /// added to the path.
    pub fn create_node(&self, pos: Vec2) -> Node {
        Node::spawn(pos, &self.cfg)
    }

    /// Appends `node` at the end of the sequence.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.alloc(node);
        self.order.push(id);
        id
    }

    /// Inserts `node` at sequence position `at`, shifting later nodes.
    ///
    /// ### Returns
    /// The new node's id, or `None` (and nothing inserted) if
    /// `at > self.len()`.
    pub fn add_node_at(&mut self, at: usize, node: Node) -> Option<NodeId> {
        if at > self.order.len() {
            return None;
        }
        let id = self.alloc(node);
        self.order.insert(at, id);
        Some(id)
    }

    /// Removes the node at sequence position `at`, if there is one.
    pub fn remove_node_at(&mut self, at: usize) -> Option<Node> {
        if at >= self.order.len() {
            return None;
        }
        let id = self.order.remove(at);
        self.release(id)
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    pub(crate) fn release(&mut self, id: NodeId) -> Option<Node> {
        let node = self.slots.get_mut(id)?.take()?;
        self.free.push(id);
        Some(node)
    }

    /// Attaches a boundary region. The same region may be attached to
    /// several paths.
    pub fn attach_bound(&mut self, bound: Arc<Bound>) {
        self.bounds.push(bound);
    }

    /// Detaches every attachment of `bound` (compared by identity).
    ///
    /// ### Returns
    /// `true` if anything was detached.
    pub fn detach_bound(&mut self, bound: &Arc<Bound>) -> bool {
        let before = self.bounds.len();
        self.bounds.retain(|b| !Arc::ptr_eq(b, bound));
        self.bounds.len() != before
    }

    pub fn bounds(&self) -> &[Arc<Bound>] {
        &self.bounds
    }

    /// Inserts a midpoint node before a randomly chosen node.
    ///
    /// The node is picked from positions `1..len`. Nothing happens unless
    /// it has both neighbors and its edge to the previous one is longer
    /// than the configured minimum distance.
    ///
    /// ### Returns
    /// The id of the inserted node, if one was inserted.
    pub fn inject_random_node(&mut self, rng: &mut impl Rng) -> Option<NodeId> {
        if self.order.len() < 2 {
            return None;
        }
        let at = rng.random_range(1..self.order.len());
        self.next(at)?;
        let node = *self.node_at(at)?;
        let prev = *self.previous(at)?;
        if node.distance(&prev) <= self.cfg.min_distance {
            return None;
        }
        let mid = self.create_node(node.midpoint(&prev));
        self.add_node_at(at, mid)
    }

    /// Snapshot of this path's nodes for the spatial index.
    pub fn index_entries(&self, path: PathId) -> impl Iterator<Item = Entry> + '_ {
        self.order.iter().filter_map(move |&node| {
            self.node(node).map(|n| Entry {
                pos: n.pos,
                path,
                node,
            })
        })
    }

    /// Runs one growth tick.
    ///
    /// Every node, in sequence order, goes through jitter, attraction,
    /// repulsion, alignment, boundary containment and commit. Then the
    /// split pass runs, then the prune pass.
    ///
    /// ### Parameters
    /// - `index` - Spatial index over every node of the world, rebuilt
    ///   for this tick.
    /// - `rng` - Random source for jitter.
    pub fn update(&mut self, index: &SpatialIndex, rng: &mut impl Rng) -> GrowthStats {
        phases::force_phase(self, index, rng);
        let inserted = phases::split_phase(self);
        let pruned = phases::prune_phase(self);

        debug!(
            nodes = self.order.len(),
            split = inserted.len(),
            pruned,
            "path tick"
        );
        GrowthStats { inserted, pruned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrowthError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn line(n: usize, spacing: f32, closed: bool) -> Path {
        Path::from_positions(
            (0..n).map(|i| Vec2::new(i as f32 * spacing, 0.0)),
            Config::default(),
            closed,
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let cfg = Config {
            min_distance: 12.0,
            ..Config::default()
        };
        assert!(matches!(
            Path::new(cfg, true),
            Err(GrowthError::DistanceOrder { .. })
        ));
    }

    #[test]
    fn closed_neighbors_wrap_around() {
        let path = line(4, 8.0, true);
        assert_eq!(path.prev_index(0), Some(3));
        assert_eq!(path.next_index(3), Some(0));
        assert_eq!(path.prev_index(2), Some(1));
        assert_eq!(path.next_index(2), Some(3));
    }

    #[test]
    fn open_ends_have_no_outer_neighbor() {
        let path = line(4, 8.0, false);
        assert_eq!(path.prev_index(0), None);
        assert_eq!(path.next_index(3), None);
        assert!(path.previous(0).is_none());
        assert!(path.next(0).is_some());
    }

    #[test]
    fn degenerate_paths_have_no_neighbors() {
        let empty = line(0, 8.0, true);
        assert_eq!(empty.prev_index(0), None);
        assert_eq!(empty.next_index(0), None);

        let single = line(1, 8.0, true);
        assert_eq!(single.prev_index(0), None);
        assert_eq!(single.next_index(0), None);

        let pair = line(2, 8.0, true);
        assert_eq!(pair.prev_index(0), Some(1));
        assert_eq!(pair.next_index(0), Some(1));
    }

    #[test]
    fn export_preserves_traversal_order() {
        let mut path = line(3, 8.0, false);
        let node = path.create_node(Vec2::new(4.0, 1.0));
        path.add_node_at(1, node).unwrap();

        let exported = path.to_array();
        assert_eq!(exported.len(), path.len());
        assert_eq!(
            exported,
            vec![[0.0, 0.0], [4.0, 1.0], [8.0, 0.0], [16.0, 0.0]]
        );
        let positions: Vec<Vec2> = exported.iter().map(|&p| Vec2::from_array(p)).collect();
        assert_eq!(positions, path.positions());
    }

    #[test]
    fn removed_ids_are_recycled_without_reordering() {
        let mut path = line(4, 8.0, false);
        let removed_id = path.ids()[1];
        let removed = path.remove_node_at(1).unwrap();
        assert_eq!(removed.pos, Vec2::new(8.0, 0.0));
        assert!(path.node(removed_id).is_none());
        assert_eq!(path.len(), 3);

        let node = path.create_node(Vec2::new(100.0, 0.0));
        let id = path.add_node(node);
        assert_eq!(id, removed_id);
        assert_eq!(
            path.positions(),
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(16.0, 0.0),
                Vec2::new(24.0, 0.0),
                Vec2::new(100.0, 0.0),
            ]
        );
        assert!(path.remove_node_at(10).is_none());
    }

    #[test]
    fn insert_out_of_range_is_rejected() {
        let mut path = line(3, 8.0, false);
        let node = path.create_node(Vec2::new(50.0, 0.0));
        assert_eq!(path.add_node_at(4, node), None);
        assert_eq!(path.len(), 3);

        let id = path.add_node_at(3, node).unwrap();
        assert_eq!(path.ids()[3], id);
        assert_eq!(path.node_at(3).unwrap().pos, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn bounds_attach_and_detach_by_identity() {
        let mut path = line(3, 8.0, true);
        let a = Arc::new(Bound::rect(Vec2::ZERO, Vec2::splat(10.0), false));
        let b = Arc::new(Bound::rect(Vec2::ZERO, Vec2::splat(10.0), false));

        path.attach_bound(a.clone());
        path.attach_bound(b.clone());
        assert_eq!(path.bounds().len(), 2);

        assert!(path.detach_bound(&a));
        assert_eq!(path.bounds().len(), 1);
        assert!(Arc::ptr_eq(&path.bounds()[0], &b));
        assert!(!path.detach_bound(&a));
    }

    #[test]
    fn injection_inserts_midpoint_before_chosen_node() {
        let mut path = line(6, 8.0, true);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let id = path.inject_random_node(&mut rng).unwrap();
        assert_eq!(path.len(), 7);

        let at = path.ids().iter().position(|&i| i == id).unwrap();
        assert!(at >= 1);
        let prev = path.node_at(at - 1).unwrap().pos;
        let next = path.node_at(at + 1).unwrap().pos;
        assert_eq!(path.node(id).unwrap().pos, (prev + next) * 0.5);
    }

    #[test]
    fn injection_skips_short_edges() {
        // Every edge is at the minimum distance.
        let mut path = line(6, 5.0, true);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(path.inject_random_node(&mut rng).is_none());
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn cap_is_exceeded_only_above_max_nodes() {
        let cfg = Config {
            max_nodes: 3,
            ..Config::default()
        };
        let mut path =
            Path::from_positions([Vec2::ZERO, Vec2::X, Vec2::Y], cfg, true).unwrap();
        assert!(!path.exceeds_cap());
        let node = path.create_node(Vec2::ONE);
        path.add_node(node);
        assert!(path.exceeds_cap());
    }
}
