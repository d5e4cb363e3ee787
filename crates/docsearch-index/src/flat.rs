//! In-memory flat exact-search index.
//!
//! Vectors live in one contiguous `Vec<f32>` buffer, `dimension` values per
//! entry. A vector's position in the buffer is its id: 0-based, strictly
//! increasing, assigned in append order. Search is a brute-force scan over
//! every entry, which is exact and fast enough at the target scale; smarter
//! index structures are out of scope.

use docsearch_core::{IndexError, VectorId};
use serde::{Deserialize, Serialize};

/// Serialized form of the index. The on-disk snapshot is the bincode
/// encoding of this struct.
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    dimension: u64,
    vectors: Vec<f32>,
}

/// Flat exact-search index over fixed-dimension vectors.
#[derive(Debug)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index.
    ///
    /// `dimension` must be greater than zero; it is fixed for the lifetime
    /// of the index.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "dimension must be > 0");
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Number of vectors stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    /// True if no vectors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector dimension fixed at construction.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Append a batch of vectors, returning the assigned ids in order.
    ///
    /// The whole batch is validated before anything is stored: one
    /// wrong-length vector fails the append with
    /// [`IndexError::DimensionMismatch`] and the index is left unchanged,
    /// so a failed append never advances the id counter or inserts a
    /// subset of the batch.
    pub fn append(&mut self, batch: &[Vec<f32>]) -> Result<Vec<VectorId>, IndexError> {
        for vector in batch {
            if vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        let start = self.len() as VectorId;
        self.vectors.reserve(batch.len() * self.dimension);
        for vector in batch {
            self.vectors.extend_from_slice(vector);
        }

        Ok((start..start + batch.len() as VectorId).collect())
    }

    /// Exact k-nearest-neighbor search by Euclidean distance.
    ///
    /// Returns up to `min(k, len)` entries ordered by ascending distance,
    /// ties broken by ascending vector id. An empty index yields an empty
    /// result, not an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(VectorId, f32)>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(VectorId, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, vector)| (id as VectorId, Self::euclidean(query, vector)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Drop every vector with id `len` or higher. A `len` at or beyond the
    /// current size is a no-op.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.vectors.truncate(len * self.dimension);
        }
    }

    /// Encode the index into its durable snapshot representation.
    pub fn encode(&self) -> Result<Vec<u8>, IndexError> {
        let snapshot = IndexSnapshot {
            dimension: self.dimension as u64,
            vectors: self.vectors.clone(),
        };
        bincode::serialize(&snapshot).map_err(|e| IndexError::Snapshot(e.to_string()))
    }

    /// Rebuild an index from a snapshot produced by [`encode`](Self::encode).
    ///
    /// Fails with [`IndexError::Corrupted`] if the payload does not decode
    /// to a structurally valid index.
    pub fn decode(bytes: &[u8]) -> Result<Self, IndexError> {
        let snapshot: IndexSnapshot = bincode::deserialize(bytes)
            .map_err(|e| IndexError::Corrupted(format!("snapshot does not decode: {e}")))?;

        let dimension = snapshot.dimension as usize;
        if dimension == 0 {
            return Err(IndexError::Corrupted(
                "snapshot declares dimension 0".to_string(),
            ));
        }
        if snapshot.vectors.len() % dimension != 0 {
            return Err(IndexError::Corrupted(format!(
                "snapshot holds {} values, not a multiple of dimension {}",
                snapshot.vectors.len(),
                dimension
            )));
        }

        Ok(Self {
            dimension,
            vectors: snapshot.vectors,
        })
    }

    /// Euclidean distance between two equal-length vectors.
    fn euclidean(a: &[f32], b: &[f32]) -> f32 {
        let sum: f32 = a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum();
        sum.sqrt()
    }
}
