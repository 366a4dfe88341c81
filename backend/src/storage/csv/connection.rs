use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock key guarding `guardians.yaml`
const ACCOUNTS_LOCK_KEY: &str = "accounts";

/// CsvConnection resolves file paths for every document and collection and
/// hands out the per-guardian write locks.
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    write_locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
            write_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Generate a safe filesystem name from a record ID or free text.
    /// Converts "child::1702516122000::3fa2c9d1" -> "child_1702516122000_3fa2c9d1",
    /// "José María" -> "jose_maria", etc.
    pub fn safe_directory_name(raw: &str) -> String {
        let mapped: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else if c == '-' {
                    c
                } else {
                    // Replace accented characters and special chars
                    match c {
                        'á' | 'à' | 'ä' | 'â' => 'a',
                        'é' | 'è' | 'ë' | 'ê' => 'e',
                        'í' | 'ì' | 'ï' | 'î' => 'i',
                        'ó' | 'ò' | 'ö' | 'ô' => 'o',
                        'ú' | 'ù' | 'ü' | 'û' => 'u',
                        'ñ' => 'n',
                        'ç' => 'c',
                        _ => '_',
                    }
                }
            })
            .collect();

        // Collapse runs of '_' so "child::1" maps to "child_1"
        let mut collapsed = String::with_capacity(mapped.len());
        for c in mapped.chars() {
            if c == '_' && collapsed.ends_with('_') {
                continue;
            }
            collapsed.push(c);
        }

        collapsed.trim_matches('_').to_string()
    }

    /// Path of the account registry shared by all guardians
    pub fn guardians_file_path(&self) -> PathBuf {
        self.base_directory.join("guardians.yaml")
    }

    /// Root directory of everything a guardian owns
    pub fn guardian_directory(&self, guardian_id: &str) -> PathBuf {
        self.base_directory
            .join("guardians")
            .join(Self::safe_directory_name(guardian_id))
    }

    /// Directory holding one sub-directory per child
    pub fn children_directory(&self, guardian_id: &str) -> PathBuf {
        self.guardian_directory(guardian_id).join("children")
    }

    /// Directory holding a single child's documents
    pub fn child_directory(&self, guardian_id: &str, child_id: &str) -> PathBuf {
        self.children_directory(guardian_id)
            .join(Self::safe_directory_name(child_id))
    }

    pub fn child_file_path(&self, guardian_id: &str, child_id: &str) -> PathBuf {
        self.child_directory(guardian_id, child_id).join("child.yaml")
    }

    pub fn history_file_path(&self, guardian_id: &str, child_id: &str) -> PathBuf {
        self.child_directory(guardian_id, child_id).join("history.csv")
    }

    pub fn items_file_path(&self, guardian_id: &str, child_id: &str) -> PathBuf {
        self.child_directory(guardian_id, child_id).join("items.yaml")
    }

    pub fn tasks_file_path(&self, guardian_id: &str) -> PathBuf {
        self.guardian_directory(guardian_id).join("tasks.csv")
    }

    pub fn rewards_file_path(&self, guardian_id: &str) -> PathBuf {
        self.guardian_directory(guardian_id).join("rewards.yaml")
    }

    /// Blob directory for profile pictures, kept outside the children tree
    pub fn pictures_directory(&self, guardian_id: &str) -> PathBuf {
        self.guardian_directory(guardian_id).join("pictures")
    }

    /// Acquire the write lock for one guardian's documents.
    ///
    /// Only one store transaction per guardian runs at a time inside this
    /// process; the lock is released when the guard is dropped.
    pub async fn lock_guardian(&self, guardian_id: &str) -> OwnedMutexGuard<()> {
        self.lock(&format!("guardian:{}", guardian_id)).await
    }

    /// Acquire the write lock for the account registry
    pub async fn lock_accounts(&self) -> OwnedMutexGuard<()> {
        self.lock(ACCOUNTS_LOCK_KEY).await
    }

    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self
                .write_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        debug!("Waiting for write lock '{}'", key);
        mutex.lock_owned().await
    }
}
