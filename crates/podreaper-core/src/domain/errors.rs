//! Errors - reconcile の失敗分類
//!
//! Only namespace enumeration is fatal to a pass. Everything else (listing a
//! single namespace, deleting a single pod, a bad annotation, a bad window
//! time) is reported as a `ReapEvent` and skipped; the next pass retries it.

use crate::ports::ClusterError;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to list managed namespaces: {0}")]
    NamespaceListing(#[source] ClusterError),
}
