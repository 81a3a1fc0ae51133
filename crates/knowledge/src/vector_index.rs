//! Vector index for passage embeddings.
//!
//! [`FlatL2Index`] is an exact, brute-force index over squared Euclidean
//! distance. It is persisted as a small little-endian binary file:
//!
//! ```text
//! magic    b"DQVX"
//! version  u32   (1)
//! metric   u8    (1 = squared L2)
//! dim      u32
//! count    u64
//! data     count * dim * f32
//! ```

use crate::types::Neighbor;
use docqa_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

const MAGIC: &[u8; 4] = b"DQVX";
const FORMAT_VERSION: u32 = 1;
const METRIC_L2: u8 = 1;
const HEADER_LEN: usize = 4 + 4 + 1 + 4 + 8;

/// Nearest-neighbour search over stored vectors.
///
/// Vector `i` corresponds to document position `i`.
pub trait VectorIndex: Send + Sync {
    /// Width of every stored vector.
    fn dimension(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the `min(k, len)` nearest vectors, ascending by distance.
    ///
    /// Ties are broken by ascending position.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>>;
}

/// Exact squared-L2 index holding all vectors in one contiguous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Create an empty index.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Create an index from vectors, in order.
    pub fn build(dimension: usize, vectors: &[Vec<f32>]) -> AppResult<Self> {
        let mut index = Self::new(dimension);
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    /// Append a vector; it takes the next position.
    pub fn add(&mut self, vector: &[f32]) -> AppResult<()> {
        if vector.len() != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    /// Stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Write the index to `path`.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        fs::write(path, self.to_bytes())?;
        tracing::debug!("Saved {} vectors to {:?}", self.len(), path);
        Ok(())
    }

    /// Read an index from `path`.
    ///
    /// A missing or malformed file is a startup failure.
    pub fn load(path: &Path) -> AppResult<Self> {
        let bytes = fs::read(path).map_err(|e| {
            AppError::Startup(format!("Failed to read vector index {:?}: {}", path, e))
        })?;
        Self::from_bytes(&bytes)
            .map_err(|e| AppError::Startup(format!("Invalid vector index {:?}: {}", path, e)))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.push(METRIC_L2);
        out.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.data {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!("file too short ({} bytes)", bytes.len()));
        }
        if &bytes[0..4] != MAGIC {
            return Err("bad magic".to_string());
        }

        let version = u32::from_le_bytes(read_array(bytes, 4)?);
        if version != FORMAT_VERSION {
            return Err(format!("unsupported format version {}", version));
        }
        if bytes[8] != METRIC_L2 {
            return Err(format!("unsupported metric {}", bytes[8]));
        }

        let dimension = u32::from_le_bytes(read_array(bytes, 9)?) as usize;
        let count = u64::from_le_bytes(read_array(bytes, 13)?) as usize;

        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| "header overflows".to_string())?;
        if bytes.len() != expected {
            return Err(format!(
                "expected {} bytes for {} vectors of dimension {}, found {}",
                expected,
                count,
                dimension,
                bytes.len()
            ));
        }

        let data = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self { dimension, data })
    }
}

fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N], String> {
    bytes
        .get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| format!("truncated header at offset {}", offset))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl VectorIndex for FlatL2Index {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>> {
        if k == 0 {
            return Err(AppError::Other("top_k must be at least 1".to_string()));
        }
        if query.len() != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.dimension == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                distance: squared_l2(query, vector),
                position,
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }
}
