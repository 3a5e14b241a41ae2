use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::records::ChildRecord;

/// Immutable, already-validated view of the children table at fetch time.
#[derive(Debug, Clone)]
pub struct RecordSnapshot {
    children: Arc<[ChildRecord]>,
    fetched_at: DateTime<Utc>,
    fingerprint: String,
    rejected: usize,
}

impl RecordSnapshot {
    pub fn new(children: Vec<ChildRecord>) -> Self {
        let fingerprint = fingerprint(&children);
        Self {
            children: children.into(),
            fetched_at: Utc::now(),
            fingerprint,
            rejected: 0,
        }
    }

    pub fn with_rejected(mut self, rejected: usize) -> Self {
        self.rejected = rejected;
        self
    }

    pub fn children(&self) -> &[ChildRecord] {
        &self.children
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for RecordSnapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn fingerprint(children: &[ChildRecord]) -> String {
    let canonical = serde_json::to_string(children).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::RecordSnapshot;
    use crate::records::{ChildRecord, EducationStatus, Gender, HealthStatus};

    fn child(id: &str, age: u32) -> ChildRecord {
        ChildRecord {
            id: id.to_string(),
            name: format!("Child {id}"),
            age,
            gender: Gender::Other,
            district: "Kolkata East".to_string(),
            location: "Salt Lake".to_string(),
            education_status: EducationStatus::Secondary,
            health_status: HealthStatus::Good,
            guardian_name: None,
            guardian_phone: None,
            special_needs: None,
            verified: true,
            created_at: None,
        }
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = RecordSnapshot::new(vec![child("1", 8)]);
        let b = RecordSnapshot::new(vec![child("1", 8)]);
        let c = RecordSnapshot::new(vec![child("1", 9)]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
