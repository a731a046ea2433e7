//! Host filesystem access for port configuration files
//!
//! Reads are best-effort: anything that cannot be read comes back as `None`
//! or an empty listing, never as an error.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// Read-only view of the host filesystem.
#[async_trait]
pub trait HostFs: Send + Sync {
    /// Returns the file contents, or `None` when missing, unreadable or empty.
    async fn read_file(&self, path: &str) -> Option<Vec<u8>>;

    /// Returns paths matching a shell glob, in listing (lexicographic) order.
    async fn list_files(&self, pattern: &str) -> Vec<String>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalHostFs;

#[async_trait]
impl HostFs for LocalHostFs {
    async fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => None,
            Err(e) => {
                debug!(path, error = %e, "host file not readable");
                None
            }
        }
    }

    async fn list_files(&self, pattern: &str) -> Vec<String> {
        let pattern = pattern.to_string();
        let listed = tokio::task::spawn_blocking(move || {
            let Ok(paths) = glob::glob(&pattern) else {
                return Vec::new();
            };
            let mut files: Vec<String> = paths
                .filter_map(|p| p.ok())
                .filter(|p| p.is_file())
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            files.sort();
            files
        })
        .await;
        listed.unwrap_or_default()
    }
}

/// In-memory filesystem for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryHostFs {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryHostFs {
    /// Creates an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.write().insert(path.into(), contents.into());
    }

    /// Removes every file.
    pub fn clear(&self) {
        self.files.write().clear();
    }
}

#[async_trait]
impl HostFs for MemoryHostFs {
    async fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .get(path)
            .filter(|b| !b.is_empty())
            .cloned()
    }

    async fn list_files(&self, pattern: &str) -> Vec<String> {
        let Ok(pattern) = glob::Pattern::new(pattern) else {
            return Vec::new();
        };
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..Default::default()
        };
        self.files
            .read()
            .keys()
            .filter(|p| pattern.matches_with(p, options))
            .cloned()
            .collect()
    }
}
