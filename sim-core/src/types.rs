/// Identifier for a node in a [`crate::path::Path`].
///
/// This is a slot in the path's node arena. It stays valid while the
/// node is alive; once the node is pruned the slot may be reused by a
/// later insertion.
pub type NodeId = usize;

/// Identifier for a path owned by a [`crate::world::World`].
///
/// This is an index into the world's path list, so removing a path
/// shifts the ids of every path after it.
pub type PathId = usize;
