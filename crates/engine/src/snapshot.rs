//! JSON snapshots of the engine's inputs.
//!
//! A snapshot holds the raw recipes, users and interactions, not the
//! derived models. Loading one rebuilds every scorer, so a reloaded engine
//! behaves exactly like one constructed from the same catalog.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use data_loader::{Catalog, Interaction, Recipe, User};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::orchestrator::RecommendationEngine;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub recipes: Vec<Recipe>,
    pub users: Vec<User>,
    pub interactions: Vec<Interaction>,
}

impl Snapshot {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            recipes: catalog.recipes().to_vec(),
            users: catalog.users().to_vec(),
            interactions: catalog.interactions().to_vec(),
        }
    }

    /// Rebuild and validate a catalog from the snapshot tables
    pub fn into_catalog(self) -> Result<Catalog> {
        if self.version != SNAPSHOT_VERSION {
            return Err(EngineError::SnapshotVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(Catalog::from_parts(self.recipes, self.users, self.interactions)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let io_err = |source| EngineError::Io {
            path: path.display().to_string(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl RecommendationEngine {
    /// Persist the catalog this engine was built from
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot::from_catalog(self.catalog());
        snapshot.write_to(path)?;
        info!(
            "Saved snapshot to {} ({} recipes, {} users, {} interactions)",
            path.display(),
            snapshot.recipes.len(),
            snapshot.users.len(),
            snapshot.interactions.len()
        );
        Ok(())
    }

    /// Build a fresh engine from a saved snapshot
    pub fn load_snapshot(path: &Path, config: EngineConfig) -> Result<Self> {
        let catalog = Snapshot::read_from(path)?.into_catalog()?;
        info!("Loaded snapshot from {}", path.display());
        RecommendationEngine::new(Arc::new(catalog), config)
    }
}
