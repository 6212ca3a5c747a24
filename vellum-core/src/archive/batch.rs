use crate::model::PendingFileRecord;

/// Ordered records awaiting a single submission.
///
/// Only the pipeline worker touches the batch, so append and clear are the
/// whole mutation surface. A failed submission leaves it intact; the next
/// attempt resends everything it holds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubmissionBatch {
    records: Vec<PendingFileRecord>,
}

impl SubmissionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: PendingFileRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PendingFileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the batch holds enough records to be submitted.
    pub fn is_due(&self, batch_size: usize) -> bool {
        !self.records.is_empty() && self.records.len() >= batch_size.max(1)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> PendingFileRecord {
        PendingFileRecord {
            encoded_content: String::new(),
            size_bytes: "0".into(),
            file_name: name.into(),
            mime_type: "text/plain".into(),
        }
    }

    #[test]
    fn keeps_append_order() {
        let mut batch = SubmissionBatch::new();
        batch.append(record("a"));
        batch.append(record("b"));
        let names: Vec<_> =
            batch.records().iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn due_at_configured_width() {
        let mut batch = SubmissionBatch::new();
        assert!(!batch.is_due(1));
        batch.append(record("a"));
        assert!(batch.is_due(1));
        assert!(!batch.is_due(2));
        batch.append(record("b"));
        assert!(batch.is_due(2));
        // zero behaves like one
        assert!(batch.is_due(0));
        batch.clear();
        assert!(batch.is_empty());
        assert!(!batch.is_due(0));
    }
}
