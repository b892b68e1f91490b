//! In-memory L2 vector index over chunk embeddings, with a versioned,
//! checksummed on-disk snapshot.
pub mod index_build;
pub mod snapshot;

pub use index_build::{BuildOptions, VectorIndex};
pub use snapshot::{SNAPSHOT_FORMAT, SNAPSHOT_VERSION};

/// Similarity exposed to callers: `1 / (1 + distance)`, in (0, 1].
pub fn similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}
