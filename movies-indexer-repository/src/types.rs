//! Response types for search index operations.

use crate::errors::SearchIndexError;

/// Result of a batch operation for a single document.
///
/// Indicates whether the document was written and includes error details if
/// it was rejected.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The index document id.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    pub fn succeeded(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(document_id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            document_id: document_id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// Allows callers to handle partial failures: accepted documents stay written
/// while rejected ones are reported here.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of documents in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each document.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-document results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Results of the rejected documents.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let summary = BatchOperationSummary::from_results(vec![
            BatchOperationResult::succeeded("a"),
            BatchOperationResult::failed("b", SearchIndexError::document_rejected("mapping")),
            BatchOperationResult::succeeded("c"),
        ]);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        let failed: Vec<_> = summary.failures().map(|r| r.document_id.as_str()).collect();
        assert_eq!(failed, vec!["b"]);
    }
}
