//! Bulk request bodies and response parsing.
//!
//! A bulk body is a sequence of newline-delimited JSON lines: an action line
//! naming the target index and document id, immediately followed by the
//! document itself.

use movies_indexer_shared::FilmDocument;
use serde_json::{json, Value};

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationResult, BatchOperationSummary};

/// Build the action/document line pairs for a bulk upsert.
pub fn build_bulk_lines(
    index: &str,
    documents: &[FilmDocument],
) -> Result<Vec<Value>, SearchIndexError> {
    let mut lines = Vec::with_capacity(documents.len() * 2);
    for document in documents {
        lines.push(json!({
            "index": {
                "_index": index,
                "_id": document.document_id()
            }
        }));
        let body = serde_json::to_value(document)
            .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
        lines.push(body);
    }
    Ok(lines)
}

/// Summarize a bulk response into per-document results.
///
/// Items come back in request order. Documents the response does not
/// mention are counted as failed.
pub fn summarize_bulk_response(documents: &[FilmDocument], response: &Value) -> BatchOperationSummary {
    let items = response["items"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    let results = documents
        .iter()
        .enumerate()
        .map(|(position, document)| {
            let requested_id = document.document_id();
            let Some(item) = items.get(position) else {
                return BatchOperationResult::failed(
                    requested_id,
                    SearchIndexError::document_rejected("missing from bulk response"),
                );
            };

            // Each item is keyed by its action type: {"index": {...}}
            let operation = item
                .as_object()
                .and_then(|o| o.values().next())
                .unwrap_or(&Value::Null);
            let document_id = operation["_id"]
                .as_str()
                .map(str::to_string)
                .unwrap_or(requested_id);
            let status = operation["status"].as_u64().unwrap_or(0);

            match operation.get("error") {
                Some(error) if !error.is_null() => {
                    BatchOperationResult::failed(document_id, rejection(error, status))
                }
                _ if !(200..300).contains(&status) => BatchOperationResult::failed(
                    document_id,
                    SearchIndexError::document_rejected(format!("status {}", status)),
                ),
                _ => BatchOperationResult::succeeded(document_id),
            }
        })
        .collect();

    BatchOperationSummary::from_results(results)
}

fn rejection(error: &Value, status: u64) -> SearchIndexError {
    let kind = error["type"].as_str().unwrap_or("unknown");
    let reason = error["reason"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    SearchIndexError::document_rejected(format!("{} (status {}): {}", kind, status, reason))
}

/// Whether an index-creation error body reports that the index already exists.
pub fn is_already_exists(body: &str) -> bool {
    body.contains("resource_already_exists_exception")
}
