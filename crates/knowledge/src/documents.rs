//! Ordered passage store.
//!
//! Passage `i` corresponds to vector `i` in the index. On disk the store is a
//! UTF-8 text file with one passage per line.

use docqa_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    passages: Vec<String>,
}

impl DocumentStore {
    pub fn from_passages(passages: Vec<String>) -> Self {
        Self { passages }
    }

    /// Load passages from a line-per-passage file.
    ///
    /// Every line is trimmed. Blank lines are kept so positions stay aligned
    /// with the vector file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::Startup(format!("Failed to read documents {:?}: {}", path, e))
        })?;

        let passages = contents.lines().map(|line| line.trim().to_string()).collect();
        Ok(Self { passages })
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let mut out = String::new();
        for (position, passage) in self.passages.iter().enumerate() {
            if passage.contains('\n') || passage.contains('\r') {
                return Err(AppError::Other(format!(
                    "Passage {} contains a line break",
                    position
                )));
            }
            out.push_str(passage);
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Passage at `position`.
    pub fn get(&self, position: usize) -> AppResult<&str> {
        self.passages
            .get(position)
            .map(String::as_str)
            .ok_or(AppError::OutOfRange {
                position,
                count: self.passages.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.passages.iter().map(String::as_str)
    }
}
