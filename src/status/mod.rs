//! Working-tree file status
//!
//! - `FileSnapshot` - one consistent classification of every changed path
//! - `FileStatusAggregator` - rebuilds the snapshot from four git queries

mod aggregator;
mod snapshot;

pub use aggregator::*;
pub use snapshot::*;
