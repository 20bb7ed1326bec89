//! Per-tick phases of the differential growth algorithm.
//!
//! [`crate::path::Path::update`] runs them in this order:
//! 1. [`force_phase`] - every node, in sequence order, is jittered,
//!    attracted to its neighbors, repelled by nearby nodes, aligned with
//!    its neighbors, checked against boundary regions and committed.
//! 2. [`split_phase`] - edges that grew too long get a midpoint node.
//! 3. [`prune_phase`] - nodes closing a too-short edge are removed.

use glam::Vec2;
use rand::Rng;

use crate::{
    config::RepulsionMode,
    node::Node,
    path::Path,
    spatial::{Entry, SpatialIndex},
    types::NodeId,
};

/// Applies all forces to every node of `path` and commits the result.
///
/// Nodes are processed strictly in sequence order and each node is
/// written back before the next one is read, so a node sees the already
/// committed position of its previous neighbor and the not yet committed
/// position of its next neighbor.
///
/// Each stage blends the staged position toward its own target, so the
/// order of the stages matters:
///
/// 1. Jitter moves the current position itself (if enabled).
/// 2. The staged position is reset to the current one.
/// 3. Attraction toward the next, then the previous neighbor.
/// 4. Repulsion from the index hits within the node's radius.
/// 5. Alignment toward the neighbors' midpoint.
/// 6. Boundary containment sets or clears `fixed`.
/// 7. Commit.
///
/// ### Parameters
/// - `path` - The path to move. Its node sequence is not changed.
/// - `index` - Snapshot of every node in the world, including this path.
/// - `rng` - Random source for jitter.
pub fn force_phase(path: &mut Path, index: &SpatialIndex, rng: &mut impl Rng) {
    let cfg = path.cfg;
    let mut hits = std::mem::take(&mut path.scratch);

    for at in 0..path.order.len() {
        let id = path.order[at];
        let Some(mut node) = path.node(id).copied() else {
            continue;
        };
        let prev = path.previous(at).copied();
        let next = path.next(at).copied();

        if cfg.use_brownian_motion {
            let half = cfg.brownian_motion_range / 2.0;
            node.pos.x += rng.random_range(-half..=half);
            node.pos.y += rng.random_range(-half..=half);
        }
        node.stage();

        if !node.fixed {
            for neighbor in [next, prev].into_iter().flatten() {
                attract(&mut node, &neighbor, cfg.attraction_force);
            }
        }

        index.within_into(node.pos, node.repulsion_radius, &mut hits);
        match cfg.repulsion_mode {
            RepulsionMode::LastWins => repel_last_wins(&mut node, &hits, cfg.repulsion_force),
            RepulsionMode::Accumulate => repel_accumulate(&mut node, &hits, cfg.repulsion_force),
        }

        if !node.fixed
            && let (Some(prev), Some(next)) = (prev, next)
        {
            node.blend_toward(prev.midpoint(&next), cfg.alignment_force);
        }

        node.fixed = path.bounds.iter().any(|b| b.is_violated_by(node.pos));

        node.commit(cfg.max_velocity);

        if let Some(slot) = path.node_mut(id) {
            *slot = node;
        }
    }

    path.scratch = hits;
}

/// Pulls the staged position toward `neighbor` unless the two are already
/// within the smaller of their minimum distances.
fn attract(node: &mut Node, neighbor: &Node, weight: f32) {
    let least_min = node.min_distance.min(neighbor.min_distance);
    if node.distance(neighbor) > least_min {
        node.blend_toward(neighbor.pos, weight);
    }
}

/// Re-interpolates the staged position away from each hit in turn,
/// starting from the current position every time.
///
/// Only the last hit (the farthest one, since hits are sorted by
/// distance) determines the result.
fn repel_last_wins(node: &mut Node, hits: &[Entry], weight: f32) {
    for hit in hits {
        node.next_pos = node.pos.lerp(hit.pos, -weight);
    }
}

/// Adds the mean push-away displacement of every hit that is not at the
/// node's own position.
fn repel_accumulate(node: &mut Node, hits: &[Entry], weight: f32) {
    let mut sum = Vec2::ZERO;
    let mut count = 0_u32;
    for hit in hits {
        let away = node.pos - hit.pos;
        if away != Vec2::ZERO {
            sum += away * weight;
            count += 1;
        }
    }
    if count > 0 {
        node.next_pos += sum / count as f32;
    }
}

/// Inserts a midpoint node into every edge at least `max_distance` long.
///
/// Each edge present when the pass starts is checked once, walking the
/// sequence in order and comparing every node with its previous neighbor.
/// New edges created by an insertion are not checked again. On a closed
/// path the midpoint of the wrap-around edge is appended at the end so
/// it still sits between the last and the first node.
///
/// ### Returns
/// Ids of the inserted nodes, in the order they were created.
pub fn split_phase(path: &mut Path) -> Vec<NodeId> {
    let len = path.order.len();
    let mut inserted = Vec::new();
    if len < 2 {
        return inserted;
    }

    let max_distance = path.cfg.max_distance;
    let old = std::mem::take(&mut path.order);
    let mut order = Vec::with_capacity(len + len / 4);
    let mut wrap = None;

    for (at, &id) in old.iter().enumerate() {
        let prev_id = if at > 0 {
            Some(old[at - 1])
        } else if path.is_closed() {
            Some(old[len - 1])
        } else {
            None
        };

        if let Some(prev_id) = prev_id
            && let (Some(node), Some(prev)) = (path.node(id), path.node(prev_id))
            && node.distance(prev) >= max_distance
        {
            let mid = path.create_node(node.midpoint(prev));
            let mid_id = path.alloc(mid);
            inserted.push(mid_id);
            if at == 0 {
                wrap = Some(mid_id);
            } else {
                order.push(mid_id);
            }
        }
        order.push(id);
    }
    order.extend(wrap);

    path.order = order;
    inserted
}

/// Removes the previous neighbor of every node that sits at most
/// `min_distance` away from it, unless that neighbor is fixed.
///
/// Positions are visited once, in ascending order, over the sequence as
/// it shrinks. Removing the node before position `at` shifts the rest of
/// the sequence down by one while the walk still moves on to `at + 1`, so
/// the node right after each removal is not visited this tick. On a
/// closed path position 0 is compared with the last node.
///
/// ### Returns
/// The number of removed nodes.
pub fn prune_phase(path: &mut Path) -> usize {
    let min_distance = path.cfg.min_distance;
    let mut removed = 0;
    let mut at = 0;

    while at < path.order.len() {
        if let Some(prev_at) = path.prev_index(at)
            && let (Some(node), Some(prev)) = (path.node_at(at), path.node_at(prev_at))
            && !prev.fixed
            && node.distance(prev) <= min_distance
        {
            path.remove_node_at(prev_at);
            removed += 1;
        }
        at += 1;
    }
    removed
}
