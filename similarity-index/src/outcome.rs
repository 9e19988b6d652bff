use crate::index::{Neighbor, SimilarityIndex};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Result of asking for one signal.
///
/// `Absent` and `UpstreamError` both contribute nothing to a score, but they
/// are kept apart so callers can tell "no neighbors" from "index unreachable".
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome<T> {
    Present(T),
    Absent,
    UpstreamError(String),
}

impl<T> SignalOutcome<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, SignalOutcome::Present(_))
    }

    /// The value if present, `T::default()` otherwise
    pub fn present_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            SignalOutcome::Present(value) => value,
            SignalOutcome::Absent | SignalOutcome::UpstreamError(_) => T::default(),
        }
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            SignalOutcome::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Drop the payload, keeping only which state the signal was in
    pub fn status(&self) -> SignalStatus {
        match self {
            SignalOutcome::Present(_) => SignalStatus::Present,
            SignalOutcome::Absent => SignalStatus::Absent,
            SignalOutcome::UpstreamError(detail) => SignalStatus::UpstreamError {
                detail: detail.clone(),
            },
        }
    }
}

/// Serializable form of a [`SignalOutcome`] without its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SignalStatus {
    Present,
    Absent,
    UpstreamError { detail: String },
}

/// Query `index` and fold the answer into a [`SignalOutcome`].
///
/// An empty neighbor list is `Absent`; any error is logged and becomes
/// `UpstreamError`. Never fails.
pub async fn fetch_neighbors(
    index: &dyn SimilarityIndex,
    product_id: &str,
    k: usize,
) -> SignalOutcome<Vec<Neighbor>> {
    if k == 0 {
        return SignalOutcome::Absent;
    }

    match index.nearest(product_id, k).await {
        Ok(mut neighbors) => {
            neighbors.retain(|n| n.product_id != product_id);
            neighbors.truncate(k);
            if neighbors.is_empty() {
                debug!("No similarity neighbors for {product_id}");
                SignalOutcome::Absent
            } else {
                SignalOutcome::Present(neighbors)
            }
        }
        Err(e) => {
            warn!("Similarity query for {product_id} failed, treating as absent: {e}");
            SignalOutcome::UpstreamError(e.to_string())
        }
    }
}
