//! Bulk-loaded R-tree over node positions.
//!
//! The index is rebuilt from scratch every tick with a sort-tile-recursive
//! packing pass, then answers radius and k-nearest queries with a
//! best-first traversal ordered by squared box distance.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec2;

use crate::types::{NodeId, PathId};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Degenerate box around a single point.
    #[inline]
    pub fn point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    #[inline]
    pub fn union(self, other: Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Squared distance from `p` to the closest point of the box.
    ///
    /// Zero when `p` lies inside.
    #[inline]
    pub fn distance_squared(&self, p: Vec2) -> f32 {
        let d = (self.min - p).max(p - self.max).max(Vec2::ZERO);
        d.length_squared()
    }
}

/// One indexed node: a position snapshot tagged with its owner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry {
    pub pos: Vec2,
    pub path: PathId,
    pub node: NodeId,
}

#[derive(Debug)]
struct IndexNode {
    bbox: Aabb,
    leaf: bool,
    /// Indices into `entries` for leaves, into `arena` otherwise.
    children: Vec<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Node(usize),
    Item(usize),
}

/// Queue element for the best-first search.
#[derive(Debug)]
struct Candidate {
    d2: f32,
    seq: usize,
    slot: Slot,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so that `BinaryHeap` pops the closest candidate first;
    // ties go to whichever was queued earlier.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .d2
            .total_cmp(&self.d2)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Point R-tree rebuilt in bulk.
///
/// The index owns copies of the positions it was loaded with, so it never
/// borrows from the paths it describes.
#[derive(Debug)]
pub struct SpatialIndex {
    max_children: usize,
    entries: Vec<Entry>,
    arena: Vec<IndexNode>,
    root: Option<usize>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::with_node_capacity(9)
    }
}

impl SpatialIndex {
    /// Creates an empty index whose tree nodes hold at most
    /// `max_children` children (clamped to at least 2).
    pub fn with_node_capacity(max_children: usize) -> Self {
        Self {
            max_children: max_children.max(2),
            entries: Vec::new(),
            arena: Vec::new(),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All indexed entries, in packing order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.arena.clear();
        self.root = None;
    }

    /// Replaces the whole content of the index with `entries`.
    ///
    /// Storage from the previous build is reused.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = Entry>,
    {
        self.clear();
        self.entries.extend(entries);
        self.root = self.pack();
    }

    /// Sort-tile-recursive packing of `self.entries` into `self.arena`.
    fn pack(&mut self) -> Option<usize> {
        let n = self.entries.len();
        if n == 0 {
            return None;
        }
        let m = self.max_children;

        // Leaf level: vertical slices by x, each slice sorted by y and cut
        // into runs of `m` consecutive entries.
        self.entries.sort_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
        let slice_size = m * tiles_per_axis(n.div_ceil(m));
        let mut level = Vec::with_capacity(n.div_ceil(m));
        let mut start = 0;
        for slice in self.entries.chunks_mut(slice_size) {
            slice.sort_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
            for run in slice.chunks(m) {
                let children: Vec<usize> = (start..start + run.len()).collect();
                let bbox = run
                    .iter()
                    .map(|e| Aabb::point(e.pos))
                    .reduce(Aabb::union)
                    .unwrap_or(Aabb::point(Vec2::ZERO));
                start += run.len();
                self.arena.push(IndexNode {
                    bbox,
                    leaf: true,
                    children,
                });
                level.push(self.arena.len() - 1);
            }
        }

        // Promote until a single root remains.
        while level.len() > 1 {
            let count = level.len();
            let arena = &self.arena;
            level.sort_by(|&a, &b| {
                arena[a].bbox.center().x.total_cmp(&arena[b].bbox.center().x)
            });
            let slice_size = m * tiles_per_axis(count.div_ceil(m));
            let mut next = Vec::with_capacity(count.div_ceil(m));
            for slice in level.chunks_mut(slice_size) {
                let arena = &self.arena;
                slice.sort_by(|&a, &b| {
                    arena[a].bbox.center().y.total_cmp(&arena[b].bbox.center().y)
                });
                for run in slice.chunks(m) {
                    let bbox = run
                        .iter()
                        .map(|&i| self.arena[i].bbox)
                        .reduce(Aabb::union)
                        .unwrap_or(Aabb::point(Vec2::ZERO));
                    self.arena.push(IndexNode {
                        bbox,
                        leaf: false,
                        children: run.to_vec(),
                    });
                    next.push(self.arena.len() - 1);
                }
            }
            level = next;
        }
        level.first().copied()
    }

    /// Best-first nearest-neighbor search.
    ///
    /// Entries are written to `out` (cleared first) in ascending distance
    /// from `center`. Internal nodes are expanded before any entry farther
    /// away is emitted, so the output is globally ordered.
    ///
    /// ### Parameters
    /// - `center` - Query point.
    /// - `max_results` - Stop after this many accepted entries, if set.
    /// - `max_distance` - Ignore boxes and entries farther than this, if set.
    ///   Compared in squared form.
    /// - `predicate` - Entries for which this returns `false` are skipped
    ///   and do not count towards `max_results`.
    /// - `out` - Reusable output buffer.
    pub fn knn_into<F>(
        &self,
        center: Vec2,
        max_results: Option<usize>,
        max_distance: Option<f32>,
        mut predicate: F,
        out: &mut Vec<Entry>,
    ) where
        F: FnMut(&Entry) -> bool,
    {
        out.clear();
        if max_results == Some(0) {
            return;
        }
        let Some(mut current) = self.root else {
            return;
        };

        let r2 = max_distance.map(|r| r * r);
        let mut queue = BinaryHeap::new();
        let mut seq = 0;

        loop {
            let node = &self.arena[current];
            for &child in &node.children {
                let (bbox, slot) = if node.leaf {
                    (Aabb::point(self.entries[child].pos), Slot::Item(child))
                } else {
                    (self.arena[child].bbox, Slot::Node(child))
                };
                let d2 = bbox.distance_squared(center);
                if r2.is_none_or(|r2| d2 <= r2) {
                    queue.push(Candidate { d2, seq, slot });
                    seq += 1;
                }
            }

            // Emit every entry that is closer than the closest unexpanded node.
            while let Some(Candidate {
                slot: Slot::Item(item),
                ..
            }) = queue.peek()
            {
                let entry = self.entries[*item];
                queue.pop();
                if predicate(&entry) {
                    out.push(entry);
                    if max_results == Some(out.len()) {
                        return;
                    }
                }
            }

            match queue.pop() {
                Some(Candidate {
                    slot: Slot::Node(next),
                    ..
                }) => current = next,
                _ => return,
            }
        }
    }

    /// All entries within `radius` of `center`, closest first.
    pub fn within_into(&self, center: Vec2, radius: f32, out: &mut Vec<Entry>) {
        self.knn_into(center, None, Some(radius), |_| true, out);
    }

    /// Convenience wrapper around [`SpatialIndex::within_into`].
    pub fn within(&self, center: Vec2, radius: f32) -> Vec<Entry> {
        let mut out = Vec::new();
        self.within_into(center, radius, &mut out);
        out
    }

    /// The `k` entries closest to `center`, closest first.
    pub fn nearest(&self, center: Vec2, k: usize) -> Vec<Entry> {
        let mut out = Vec::with_capacity(k);
        self.knn_into(center, Some(k), None, |_| true, &mut out);
        out
    }
}

/// Number of tiles per axis when packing `groups` groups into a square grid.
fn tiles_per_axis(groups: usize) -> usize {
    let mut g = 1_usize;
    while g * g < groups {
        g += 1;
    }
    g
}
