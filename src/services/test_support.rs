//! Test utilities for price sources.
//!
//! [`StubPriceSource`] is a deterministic test double for [`PriceSource`]
//! that replays queued responses, optionally after a delay, without making
//! HTTP requests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::services::links::RideLinks;
use crate::services::price_source::PriceSource;
use crate::types::{RawPriceMatrix, RideCompareError, Result};

#[derive(Debug, Clone)]
enum StubOutcome {
    Matrix(RawPriceMatrix),
    Failure { status: Option<u16>, message: String },
}

#[derive(Debug, Clone)]
struct StubResponse {
    delay: Duration,
    outcome: StubOutcome,
}

/// Stub `PriceSource` for testing.
///
/// Responses are served in queue order; the last queued response repeats
/// once the queue is drained.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ridecompare::services::test_support::StubPriceSource;
/// use ridecompare::types::RawPriceMatrix;
///
/// let source = StubPriceSource::new()
///     .then_matrix(RawPriceMatrix::new(), Duration::from_millis(50))
///     .then_failure(Some(503), Duration::ZERO);
/// assert_eq!(source.calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct StubPriceSource {
    responses: Mutex<VecDeque<StubResponse>>,
    requests: Mutex<Vec<RideLinks>>,
    calls: AtomicUsize,
}

impl StubPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that always returns `matrix`
    pub fn with_matrix(matrix: RawPriceMatrix) -> Self {
        Self::new().then_matrix(matrix, Duration::ZERO)
    }

    /// Source that always fails with the given HTTP status
    pub fn with_failure(status: Option<u16>) -> Self {
        Self::new().then_failure(status, Duration::ZERO)
    }

    pub fn then_matrix(self, matrix: RawPriceMatrix, delay: Duration) -> Self {
        self.push(StubResponse {
            delay,
            outcome: StubOutcome::Matrix(matrix),
        })
    }

    pub fn then_failure(self, status: Option<u16>, delay: Duration) -> Self {
        let message = match status {
            Some(code) => format!("HTTP error! status: {}", code),
            None => "connection refused".to_string(),
        };
        self.push(StubResponse {
            delay,
            outcome: StubOutcome::Failure { status, message },
        })
    }

    /// Number of fetches served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Body of the most recent fetch
    pub fn last_request(&self) -> Option<RideLinks> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    fn push(self, response: StubResponse) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    fn next_response(&self) -> Option<StubResponse> {
        let mut queue = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl PriceSource for StubPriceSource {
    async fn fetch(&self, links: &RideLinks) -> Result<RawPriceMatrix> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(links.clone());

        let response = self
            .next_response()
            .ok_or_else(|| RideCompareError::upstream("no stubbed response"))?;

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        match response.outcome {
            StubOutcome::Matrix(matrix) => Ok(matrix),
            StubOutcome::Failure { status, message } => {
                Err(RideCompareError::UpstreamFetch { status, message })
            }
        }
    }
}
