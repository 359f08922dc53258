use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::{Registry, RegistryError};
use crate::db::ConnectionError;
use crate::types::{AssetReference, NewSchool, SchoolRecord, SchoolSummary};

/// In-process registry with switchable failures for service and handler tests.
#[derive(Clone, Default)]
pub(crate) struct MemoryRegistry {
    records: Arc<RwLock<Vec<SchoolRecord>>>,
    fail_connect: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    inserts: Arc<AtomicUsize>,
}

impl MemoryRegistry {
    pub(crate) fn failing_connect(self) -> Self {
        self.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn records(&self) -> Vec<SchoolRecord> {
        self.records.read().unwrap().clone()
    }

    /// Insert attempts, successful or not.
    pub(crate) fn insert_attempts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn connection_error() -> ConnectionError {
        ConnectionError::Timeout(Duration::from_millis(1))
    }
}

impl Registry for MemoryRegistry {
    async fn connect(&self) -> Result<(), ConnectionError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(Self::connection_error());
        }
        Ok(())
    }

    async fn insert(
        &self,
        school: NewSchool,
        image: AssetReference,
    ) -> Result<SchoolRecord, RegistryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.connect().await?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RegistryError::Task("insert rejected".to_string()));
        }
        let mut records = self.records.write().unwrap();
        let id = records.len() as i64 + 1;
        let record = school.into_record(id, image);
        records.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<SchoolSummary>, RegistryError> {
        self.connect().await?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RegistryError::Task("scan rejected".to_string()));
        }
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .map(|r| SchoolSummary {
                id: r.id,
                name: r.name.clone(),
                address: r.address.clone(),
                city: r.city.clone(),
                image: r.image.clone(),
            })
            .collect())
    }
}
