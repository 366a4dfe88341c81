//! # Guardian Repository
//!
//! Account registry stored as a single YAML document, `guardians.yaml`, at the
//! root of the data directory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::connection::CsvConnection;
use super::write_batch::WriteBatch;
use crate::domain::models::guardian::Guardian;
use crate::storage::traits::GuardianStorage;

#[derive(Debug, Default, Serialize, Deserialize)]
struct GuardianRegistry {
    #[serde(default)]
    guardians: Vec<Guardian>,
}

#[derive(Clone)]
pub struct GuardianRepository {
    connection: CsvConnection,
}

impl GuardianRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn load_registry(&self, batch: &WriteBatch) -> Result<GuardianRegistry> {
        let path = self.connection.guardians_file_path();
        match batch.read_to_string(&path)? {
            Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(&yaml)
                .with_context(|| format!("Failed to parse {}", path.display())),
            _ => Ok(GuardianRegistry::default()),
        }
    }

    fn stage_registry(&self, batch: &mut WriteBatch, registry: &GuardianRegistry) -> Result<()> {
        let yaml = serde_yaml::to_string(registry)?;
        batch.put(self.connection.guardians_file_path(), yaml.into_bytes());
        Ok(())
    }
}

#[async_trait]
impl GuardianStorage for GuardianRepository {
    async fn get_guardian(&self, guardian_id: &str) -> Result<Option<Guardian>> {
        let registry = self.load_registry(&WriteBatch::new())?;
        Ok(registry.guardians.into_iter().find(|g| g.id == guardian_id))
    }

    async fn find_guardian_by_email(&self, email: &str) -> Result<Option<Guardian>> {
        let email = Guardian::normalize_email(email);
        let registry = self.load_registry(&WriteBatch::new())?;
        Ok(registry.guardians.into_iter().find(|g| g.email == email))
    }

    async fn insert_guardian(&self, guardian: &Guardian) -> Result<bool> {
        let _lock = self.connection.lock_accounts().await;

        let mut batch = WriteBatch::new();
        let mut registry = self.load_registry(&batch)?;
        if registry.guardians.iter().any(|g| g.email == guardian.email) {
            debug!("Email already registered: {}", guardian.email);
            return Ok(false);
        }

        registry.guardians.push(guardian.clone());
        self.stage_registry(&mut batch, &registry)?;
        batch.commit()?;

        info!("Stored guardian {} ({})", guardian.id, guardian.email);
        Ok(true)
    }

    async fn update_guardian(&self, guardian: &Guardian) -> Result<()> {
        let _lock = self.connection.lock_accounts().await;

        let mut batch = WriteBatch::new();
        let mut registry = self.load_registry(&batch)?;
        let slot = registry
            .guardians
            .iter_mut()
            .find(|g| g.id == guardian.id)
            .ok_or_else(|| anyhow::anyhow!("Could not find guardian with ID: {}", guardian.id))?;
        *slot = guardian.clone();

        self.stage_registry(&mut batch, &registry)?;
        batch.commit()
    }
}
