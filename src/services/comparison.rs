//! Price comparison orchestration
//!
//! Builds request links for a route, fetches the price matrix and normalizes
//! it, discarding results that were overtaken by a newer request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::services::links::RideLinks;
use crate::services::normalizer::{normalize, normalize_strict};
use crate::services::price_source::PriceSource;
use crate::services::ranking::{rank, recommended};
use crate::services::tracker::{RequestToken, RequestTracker};
use crate::types::{ProviderFilter, Result, RideOption, Route, SortState};

/// Normalized result of one fetch
#[derive(Debug, Clone)]
pub struct Comparison {
    pub token: RequestToken,
    pub route: Route,
    pub links: RideLinks,
    pub fetched_at: DateTime<Utc>,
    pub options: Vec<RideOption>,
}

impl Comparison {
    pub fn recommended(&self) -> Vec<RideOption> {
        recommended(&self.options)
    }

    pub fn ranked(&self, sort: SortState, filter: ProviderFilter) -> Vec<RideOption> {
        rank(&self.options, sort.key, sort.order, filter)
    }
}

/// Outcome of [`ComparisonService::compare`]
#[derive(Debug)]
pub enum FetchOutcome {
    /// Result of the most recent request
    Fresh(Box<Comparison>),
    /// A newer request was issued before this one completed
    Stale { token: RequestToken },
}

/// Fetches and normalizes ride prices for routes
pub struct ComparisonService {
    source: Arc<dyn PriceSource>,
    tracker: RequestTracker,
    customer_id: String,
    strict: bool,
}

impl ComparisonService {
    pub fn new(source: Arc<dyn PriceSource>, customer_id: impl Into<String>) -> Self {
        Self {
            source,
            tracker: RequestTracker::new(),
            customer_id: customer_id.into(),
            strict: false,
        }
    }

    /// Reject unparseable prices instead of falling back to 0
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.tracker.is_current(token)
    }

    /// Issue a token for a fetch started later with [`Self::compare_for`]
    pub fn begin_request(&self) -> RequestToken {
        self.tracker.begin()
    }

    /// Fetch and normalize prices for `route`.
    ///
    /// Errors from the current request propagate; anything (success or
    /// failure) belonging to a request that has since been superseded comes
    /// back as [`FetchOutcome::Stale`].
    pub async fn compare(&self, route: &Route) -> Result<FetchOutcome> {
        self.compare_for(self.begin_request(), route).await
    }

    /// [`Self::compare`] with a token already taken from [`Self::begin_request`]
    pub async fn compare_for(&self, token: RequestToken, route: &Route) -> Result<FetchOutcome> {
        let links = RideLinks::for_route(route, &self.customer_id)?;
        debug!(
            "request {}: {} -> {}",
            token, route.pickup.address, route.dropoff.address
        );

        let fetched = self.source.fetch(&links).await;

        if !self.tracker.is_current(token) {
            debug!("request {} superseded, discarding result", token);
            return Ok(FetchOutcome::Stale { token });
        }

        let matrix = fetched.inspect_err(|e| warn!("request {} failed: {}", token, e))?;
        let options = if self.strict {
            normalize_strict(&matrix)?
        } else {
            normalize(&matrix)
        };
        info!(
            "request {}: {} ride options across {} ride types",
            token,
            options.len(),
            matrix.len()
        );

        Ok(FetchOutcome::Fresh(Box::new(Comparison {
            token,
            route: route.clone(),
            links,
            fetched_at: Utc::now(),
            options,
        })))
    }
}
