//! Knowledge base artifact locations.
//!
//! A knowledge base lives in `.docqa/knowledge/<base>/` and consists of three
//! files written together by the offline build.

use std::path::{Path, PathBuf};

/// Base name used when none is given.
pub const DEFAULT_BASE: &str = "default";

/// Vector index file name.
pub const INDEX_FILE: &str = "vectors.index";

/// Passage listing file name.
pub const DOCUMENTS_FILE: &str = "documents.txt";

/// Build manifest file name.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Get the base directory for a knowledge base.
pub fn get_base_dir(workspace: &Path, base_name: &str) -> PathBuf {
    workspace.join(".docqa").join("knowledge").join(base_name)
}

/// Get the vector index path inside a base directory.
pub fn get_index_path(base_dir: &Path) -> PathBuf {
    base_dir.join(INDEX_FILE)
}

/// Get the passage listing path inside a base directory.
pub fn get_documents_path(base_dir: &Path) -> PathBuf {
    base_dir.join(DOCUMENTS_FILE)
}

/// Get the manifest path inside a base directory.
pub fn get_manifest_path(base_dir: &Path) -> PathBuf {
    base_dir.join(MANIFEST_FILE)
}
