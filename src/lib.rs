//! Compute an optimal placement for a set of screens inside a bounding
//! *virtual screen*, given their sizes and optional pairwise relative
//! positions (`left`, `right`, `above`, `under`).
//!
//! The entry point is [`compute_layout`]. Placement is exhaustive over
//! packing topologies and deterministic : equal inputs give equal outputs.

/// Basic geometric primitives.
pub mod geometry;
/// Placement solver and its data model.
pub mod layout;

pub use layout::{compute_layout, Error, RelationMatrix, Solution};
