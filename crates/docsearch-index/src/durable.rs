//! Durable index handle shared across coordinators.
//!
//! Wraps [`FlatIndex`] in a read/write lock and ties every mutation to a
//! snapshot write: an append is only acknowledged after the new snapshot has
//! reached stable storage, so a crash right after acknowledgment cannot lose
//! vectors a caller believes durable. Appends are single-writer behind the
//! exclusive lock; searches share the read lock and never block each other.
//!
//! Writing a full snapshot per append is the accepted bottleneck at this
//! scale; replacing it with a write-ahead log is out of scope.

use docsearch_core::{IndexError, VectorId};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::flat::FlatIndex;

/// Vector index backed by an on-disk snapshot.
#[derive(Debug)]
pub struct DurableIndex {
    inner: RwLock<FlatIndex>,
    path: PathBuf,
}

impl DurableIndex {
    /// Open the index at `path`, loading the snapshot if one exists.
    /// `dimension` must be greater than zero.
    ///
    /// A missing snapshot starts an empty index. A snapshot whose persisted
    /// dimension disagrees with the configured `dimension` is fatal: the
    /// vectors were produced by a different embedding model and mixing them
    /// would corrupt every search, so the mismatch is reported instead of
    /// absorbed.
    pub async fn open(path: impl Into<PathBuf>, dimension: usize) -> Result<Self, IndexError> {
        let path = path.into();

        let index = match fs::read(&path).await {
            Ok(bytes) => {
                let index = FlatIndex::decode(&bytes)?;
                if index.dimension() != dimension {
                    return Err(IndexError::DimensionMismatch {
                        expected: dimension,
                        actual: index.dimension(),
                    });
                }
                info!(
                    "loaded index snapshot with {} vectors from {}",
                    index.len(),
                    path.display()
                );
                index
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no index snapshot at {}, starting empty", path.display());
                FlatIndex::new(dimension)
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: RwLock::new(index),
            path,
        })
    }

    /// Append a batch of vectors and persist the result.
    ///
    /// The snapshot write happens before the append returns; on any
    /// failure (dimension mismatch, encoding, I/O) the in-memory state is
    /// rolled back so the index never partially advances.
    pub async fn append(&self, batch: &[Vec<f32>]) -> Result<Vec<VectorId>, IndexError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let mut index = self.inner.write().await;
        let before = index.len();
        let ids = index.append(batch)?;

        let persisted = async {
            let bytes = index.encode()?;
            write_snapshot(&self.path, &bytes).await
        }
        .await;

        if let Err(err) = persisted {
            warn!("snapshot write failed, rolling back append: {err}");
            index.truncate(before);
            return Err(err);
        }

        debug!("appended {} vectors, index now {}", batch.len(), index.len());
        Ok(ids)
    }

    /// Exact k-NN search under the shared read lock.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<(VectorId, f32)>, IndexError> {
        let index = self.inner.read().await;
        index.search(query, k)
    }

    /// Number of vectors stored.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// True if no vectors are stored.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Vector dimension fixed at open time.
    pub async fn dimension(&self) -> usize {
        self.inner.read().await.dimension()
    }

    /// Drop every vector with id `len` or higher and persist the shorter
    /// index. Used by orphan repair; the dropped ids were never
    /// acknowledged to any caller.
    ///
    /// If the snapshot write fails the in-memory index stays truncated:
    /// memory is then behind the disk state, which a reload resolves, and
    /// the watermark keeps the stale tail invisible either way.
    pub async fn truncate(&self, len: usize) -> Result<(), IndexError> {
        let mut index = self.inner.write().await;
        if len >= index.len() {
            return Ok(());
        }

        let dropped = index.len() - len;
        index.truncate(len);
        let bytes = index.encode()?;
        write_snapshot(&self.path, &bytes).await?;

        info!("truncated {} vectors, index now {}", dropped, index.len());
        Ok(())
    }
}

/// Write the snapshot atomically: temp file, flush to disk, rename over the
/// live path. A crash mid-write leaves the previous snapshot intact.
async fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = tmp_path(path);
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, path).await?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}
