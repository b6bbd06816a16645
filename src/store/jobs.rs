//! Per-session status and result records.
//!
//! Each session owns two independent keys, `status:{id}` and
//! `analysis:{id}`, both overwritten wholesale and both refreshed to the
//! full TTL on every write. Reads never fail: a backend error or an
//! undecodable record is logged and reported as absent.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::domain::{AnalysisResult, JobStatus, StatusRecord};
use crate::store::{KvBackend, StoreError};

/// Default record lifetime (one hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

pub struct JobStore {
    backend: Arc<dyn KvBackend>,
    ttl: Duration,
}

impl JobStore {
    pub fn new(backend: Arc<dyn KvBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Overwrite the status record.
    ///
    /// Status is advisory: a failed write is logged, never propagated.
    pub fn put_status(&self, session_id: &str, status: JobStatus, message: &str) {
        let record = StatusRecord::new(status, message);
        let written = serde_json::to_string(&record)
            .map_err(StoreError::from)
            .and_then(|json| self.backend.set_ex(&status_key(session_id), &json, self.ttl));
        match written {
            Ok(()) => info!(session_id, %status, detail = message, "status updated"),
            Err(e) => error!(session_id, %status, error = %e, "failed to update status"),
        }
    }

    /// Overwrite the analysis result.
    pub fn put_result(&self, session_id: &str, result: &AnalysisResult) -> Result<(), StoreError> {
        let json = serde_json::to_string(result)?;
        self.backend
            .set_ex(&result_key(session_id), &json, self.ttl)
            .inspect_err(|e| error!(session_id, error = %e, "failed to store analysis result"))?;
        info!(session_id, items = result.item_parameters.len(), "stored analysis result");
        Ok(())
    }

    pub fn get_status(&self, session_id: &str) -> Option<StatusRecord> {
        self.read(&status_key(session_id), session_id)
    }

    pub fn get_result(&self, session_id: &str) -> Option<AnalysisResult> {
        self.read(&result_key(session_id), session_id)
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str, session_id: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(session_id, key, error = %e, "state store read failed; treating as miss");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(session_id, key, error = %e, "undecodable state record; treating as miss"))
            .ok()
    }
}

fn status_key(session_id: &str) -> String {
    format!("status:{session_id}")
}

fn result_key(session_id: &str) -> String {
    format!("analysis:{session_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    /// Backend whose every call fails.
    struct BrokenBackend;

    impl KvBackend for BrokenBackend {
        fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }

        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    fn memory_store() -> JobStore {
        JobStore::new(Arc::new(MemoryBackend::new()), DEFAULT_TTL)
    }

    #[test]
    fn status_and_result_are_independent() {
        let store = memory_store();
        store.put_status("s1", JobStatus::Processing, "reading data");

        assert_eq!(
            store.get_status("s1"),
            Some(StatusRecord::new(JobStatus::Processing, "reading data"))
        );
        assert_eq!(store.get_result("s1"), None);
        assert_eq!(store.get_status("s2"), None);
    }

    #[test]
    fn status_is_overwritten_wholesale() {
        let store = memory_store();
        store.put_status("s1", JobStatus::Processing, "step one");
        store.put_status("s1", JobStatus::Error, "");
        assert_eq!(store.get_status("s1"), Some(StatusRecord::new(JobStatus::Error, "")));
    }

    #[test]
    fn result_round_trips() {
        let store = memory_store();
        let result = AnalysisResult {
            session_id: "s1".into(),
            status: JobStatus::Completed,
            data_path: "/tmp/cleaned_s1.csv".into(),
            ..AnalysisResult::default()
        };
        store.put_result("s1", &result).unwrap();
        assert_eq!(store.get_result("s1"), Some(result));
    }

    #[test]
    fn backend_failures_read_as_absent() {
        let store = JobStore::new(Arc::new(BrokenBackend), DEFAULT_TTL);
        store.put_status("s1", JobStatus::Pending, "queued");
        assert_eq!(store.get_status("s1"), None);
        assert_eq!(store.get_result("s1"), None);
        assert!(store.put_result("s1", &AnalysisResult::default()).is_err());
    }

    #[test]
    fn garbage_records_read_as_absent() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_ex("status:s1", "{{{", DEFAULT_TTL).unwrap();
        let store = JobStore::new(backend, DEFAULT_TTL);
        assert_eq!(store.get_status("s1"), None);
    }
}
