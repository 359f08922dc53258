//! The two operations the directory exposes: register a school, list schools.
//!
//! Registration runs validation, then the asset write, then the insert. The
//! asset write and the insert are two independent mutations with no shared
//! transaction: if the insert fails after the file was written, the file
//! stays on disk without a record. That case is logged and reported as
//! [`ServiceError::Write`]; nothing deletes the file, because another record
//! may already reference the same name.

use serde::Serialize;
use thiserror::Error;

use crate::assets::{AssetStore, StorageError};
use crate::db::ConnectionError;
use crate::directory::{self, SortKey};
use crate::registry::{Registry, RegistryError};
use crate::types::{SchoolRecord, SchoolSubmission, SchoolSummary};
use crate::validation::{self, ValidationErrors};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Storage,
    Write,
    Connection,
    Read,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Storage => "storage",
            ErrorKind::Write => "write",
            ErrorKind::Connection => "connection",
            ErrorKind::Read => "read",
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("failed to store image: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to record school: {0}")]
    Write(#[source] RegistryError),
    #[error("store unavailable: {0}")]
    Connection(#[from] ConnectionError),
    #[error("failed to list schools: {0}")]
    Read(#[source] RegistryError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Storage(_) => ErrorKind::Storage,
            ServiceError::Write(_) => ErrorKind::Write,
            ServiceError::Connection(_) => ErrorKind::Connection,
            ServiceError::Read(_) => ErrorKind::Read,
        }
    }

    fn from_write(err: RegistryError) -> Self {
        match err {
            RegistryError::Connection(e) => ServiceError::Connection(e),
            other => ServiceError::Write(other),
        }
    }

    fn from_read(err: RegistryError) -> Self {
        match err {
            RegistryError::Connection(e) => ServiceError::Connection(e),
            other => ServiceError::Read(other),
        }
    }
}

/// Result of a listing; no records is a normal outcome, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Listing {
    /// The store holds no schools.
    Empty,
    /// The store has schools but the query selected none of them.
    NoMatches,
    Schools(Vec<SchoolSummary>),
}

impl Listing {
    pub fn from_vec(schools: Vec<SchoolSummary>) -> Self {
        if schools.is_empty() {
            Listing::Empty
        } else {
            Listing::Schools(schools)
        }
    }

    pub fn is_empty(&self) -> bool {
        !matches!(self, Listing::Schools(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Listing::Empty | Listing::NoMatches => 0,
            Listing::Schools(schools) => schools.len(),
        }
    }

    pub fn into_vec(self) -> Vec<SchoolSummary> {
        match self {
            Listing::Empty | Listing::NoMatches => Vec::new(),
            Listing::Schools(schools) => schools,
        }
    }
}

#[derive(Clone)]
pub struct SchoolService<R: Registry> {
    registry: R,
    assets: AssetStore,
}

impl<R: Registry> SchoolService<R> {
    pub fn new(registry: R, assets: AssetStore) -> Self {
        Self { registry, assets }
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    #[tracing::instrument(name = "register_school", skip_all)]
    pub async fn register(&self, submission: SchoolSubmission) -> Result<SchoolRecord, ServiceError> {
        let school = validation::validate(submission).map_err(|e| {
            log::info!("Rejected submission: {}", e);
            e
        })?;

        // Fail before touching the filesystem when the store is down.
        self.registry.connect().await?;

        let (fields, image) = school.into_parts();
        let reference = self.assets.store(image).await.map_err(|e| {
            log::error!("Failed to store image for {:?}: {}", fields.name, e);
            e
        })?;

        match self.registry.insert(fields, reference.clone()).await {
            Ok(record) => {
                log::info!(
                    "🏫 Registered school id={} name={:?} image={}",
                    record.id,
                    record.name,
                    record.image
                );
                Ok(record)
            }
            Err(e) => {
                log::warn!(
                    "Insert failed after storing {}; the image has no record: {}",
                    reference,
                    e
                );
                Err(ServiceError::from_write(e))
            }
        }
    }

    #[tracing::instrument(name = "list_schools", skip_all)]
    pub async fn list(&self) -> Result<Listing, ServiceError> {
        let schools = self.registry.list().await.map_err(|e| {
            log::error!("Failed to list schools: {}", e);
            ServiceError::from_read(e)
        })?;
        log::debug!("Listed {} schools", schools.len());
        Ok(Listing::from_vec(schools))
    }

    /// [`list`](Self::list) narrowed by `query` and ordered by `sort`.
    pub async fn browse(&self, query: &str, sort: Option<SortKey>) -> Result<Listing, ServiceError> {
        Ok(match self.list().await? {
            Listing::Schools(schools) => {
                let selected = directory::view(&schools, query, sort);
                if selected.is_empty() {
                    Listing::NoMatches
                } else {
                    Listing::Schools(selected)
                }
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::memory::MemoryRegistry;
    use crate::types::UploadedAsset;
    use crate::validation::Field;
    use tempfile::TempDir;

    fn submission(name: &str, city: &str, image: &str, bytes: &[u8]) -> SchoolSubmission {
        SchoolSubmission {
            name: Some(name.into()),
            email: Some("a@b.com".into()),
            address: Some("12 Elm".into()),
            city: Some(city.into()),
            state: Some("IL".into()),
            contact: Some("5551234567".into()),
            image: Some(UploadedAsset::new(image, bytes.to_vec()).with_content_type("image/png")),
        }
    }

    fn service(dir: &TempDir, registry: MemoryRegistry) -> SchoolService<MemoryRegistry> {
        SchoolService::new(registry, AssetStore::new(dir.path()))
    }

    #[tokio::test]
    async fn register_stores_image_then_record() {
        let dir = TempDir::new().unwrap();
        let registry = MemoryRegistry::default();
        let service = service(&dir, registry.clone());

        let record = service
            .register(submission("Oak Hill", "Springfield", "oak.png", b"png-bytes"))
            .await
            .unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.image.as_str(), "/schoolImages/oak.png");
        let path = service.assets().resolve(&record.image).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"png-bytes");
        assert_eq!(registry.records(), vec![record]);
    }

    #[tokio::test]
    async fn validation_failure_has_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let registry = MemoryRegistry::default();
        let service = service(&dir, registry.clone());

        let mut bad = submission("Oak Hill", "Springfield", "oak.png", b"x");
        bad.email = None;
        let err = service.register(bad).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        match err {
            ServiceError::Validation(v) => assert!(v.has(Field::Email)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(registry.insert_attempts(), 0);
        assert!(!service.assets().directory().exists());
    }

    #[tokio::test]
    async fn storage_failure_skips_insert() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("schoolImages"), b"blocking file").unwrap();
        let registry = MemoryRegistry::default();
        let service = service(&dir, registry.clone());

        let err = service
            .register(submission("Oak Hill", "Springfield", "oak.png", b"x"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(registry.insert_attempts(), 0);
    }

    #[tokio::test]
    async fn unreachable_store_fails_before_writing_the_image() {
        let dir = TempDir::new().unwrap();
        let registry = MemoryRegistry::default().failing_connect();
        let service = service(&dir, registry.clone());

        let err = service
            .register(submission("Oak Hill", "Springfield", "oak.png", b"x"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!service.assets().directory().join("oak.png").exists());
    }

    #[tokio::test]
    async fn write_failure_leaves_orphaned_image() {
        let dir = TempDir::new().unwrap();
        let registry = MemoryRegistry::default().failing_writes();
        let service = service(&dir, registry.clone());

        let err = service
            .register(submission("Oak Hill", "Springfield", "oak.png", b"x"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Write);
        assert!(registry.records().is_empty());
        assert!(service.assets().directory().join("oak.png").exists());
    }

    #[tokio::test]
    async fn failed_call_does_not_block_later_calls() {
        let dir = TempDir::new().unwrap();
        let registry = MemoryRegistry::default().failing_connect();
        let service = service(&dir, registry.clone());

        assert!(service.list().await.is_err());
        registry.set_fail_connect(false);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_store_lists_as_empty() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, MemoryRegistry::default());
        assert_eq!(service.list().await.unwrap(), Listing::Empty);
    }

    #[tokio::test]
    async fn read_failure_is_reported_as_read() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, MemoryRegistry::default().failing_reads());
        assert_eq!(service.list().await.unwrap_err().kind(), ErrorKind::Read);
    }

    #[tokio::test]
    async fn browse_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, MemoryRegistry::default());
        for (name, city, image) in [
            ("Pine Ridge", "Springfield", "pine.png"),
            ("Oak Hill", "Shelbyville", "oak.png"),
            ("Birch Lane", "Capital City", "birch.png"),
        ] {
            service
                .register(submission(name, city, image, b"x"))
                .await
                .unwrap();
        }

        let names: Vec<_> = service
            .browse("", Some(SortKey::Name))
            .await
            .unwrap()
            .into_vec()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Birch Lane", "Oak Hill", "Pine Ridge"]);

        let listing = service.browse("ville", None).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(service.browse("nowhere", None).await.unwrap(), Listing::NoMatches);
    }

    #[tokio::test]
    async fn browse_on_empty_store_reports_empty() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, MemoryRegistry::default());
        assert_eq!(service.browse("oak", None).await.unwrap(), Listing::Empty);
    }
}
