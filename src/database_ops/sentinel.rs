//! Decides whether schema setup has to run before seeding.

use tracing::debug;

use super::schema::{MARKER_TABLE, SEASON_TYPE_CONSTRAINT};
use super::{Store, SCHEMA};
use crate::error::SeedResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentinelReport {
    pub namespace: bool,
    pub marker: bool,
    pub constraint: bool,
}

impl SentinelReport {
    pub fn is_initialized(&self) -> bool {
        self.namespace && self.marker && self.constraint
    }
}

/// Checks namespace, marker table and constraint in that order and stops at
/// the first one missing.
pub async fn is_initialized<S: Store + ?Sized>(store: &S) -> SeedResult<bool> {
    if !store.schema_exists().await? {
        debug!(schema = SCHEMA, "namespace missing");
        return Ok(false);
    }
    if !store.table_exists(&format!("{SCHEMA}.{MARKER_TABLE}")).await? {
        debug!("marker table missing");
        return Ok(false);
    }
    if !store.constraint_exists(SEASON_TYPE_CONSTRAINT).await? {
        debug!(constraint = SEASON_TYPE_CONSTRAINT, "constraint missing");
        return Ok(false);
    }
    Ok(true)
}

/// All three signals, for status output.
pub async fn inspect<S: Store + ?Sized>(store: &S) -> SeedResult<SentinelReport> {
    let namespace = store.schema_exists().await?;
    if !namespace {
        return Ok(SentinelReport::default());
    }
    Ok(SentinelReport {
        namespace,
        marker: store.table_exists(&format!("{SCHEMA}.{MARKER_TABLE}")).await?,
        constraint: store.constraint_exists(SEASON_TYPE_CONSTRAINT).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::memory::MemoryStore;
    use crate::database_ops::schema;
    use crate::entities;

    #[tokio::test]
    async fn empty_store_is_not_initialized() {
        let store = MemoryStore::new();
        assert!(!is_initialized(&store).await.unwrap());
        assert_eq!(inspect(&store).await.unwrap(), SentinelReport::default());
    }

    #[tokio::test]
    async fn full_setup_is_initialized() {
        let store = MemoryStore::new();
        schema::initialize(&store, &entities::tables()).await.unwrap();
        assert!(is_initialized(&store).await.unwrap());
        assert!(inspect(&store).await.unwrap().is_initialized());
    }

    #[tokio::test]
    async fn setup_interrupted_before_constraint_is_not_initialized() {
        let store = MemoryStore::new();
        store.fail_step(SEASON_TYPE_CONSTRAINT);
        assert!(schema::initialize(&store, &entities::tables()).await.is_err());

        let report = inspect(&store).await.unwrap();
        assert!(report.namespace);
        assert!(report.marker);
        assert!(!report.constraint);
        assert!(!is_initialized(&store).await.unwrap());

        // a clean re-run completes the setup
        store.clear_failures();
        schema::initialize(&store, &entities::tables()).await.unwrap();
        assert!(is_initialized(&store).await.unwrap());
    }
}
