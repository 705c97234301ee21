//! Ranking service for recommended and sorted ride options

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::{ProviderFilter, RideOption, SortKey, SortOrder};

/// Cheapest option per ride type.
///
/// One entry per distinct `ride_type`, in first-seen order of the type.
/// Ties on price keep the first-seen option.
pub fn recommended(options: &[RideOption]) -> Vec<RideOption> {
    let mut cheapest: Vec<&RideOption> = Vec::new();
    let mut slot_by_type: HashMap<&str, usize> = HashMap::new();

    for option in options {
        match slot_by_type.get(option.ride_type.as_str()) {
            Some(&slot) => {
                if option.price < cheapest[slot].price {
                    cheapest[slot] = option;
                }
            }
            None => {
                slot_by_type.insert(option.ride_type.as_str(), cheapest.len());
                cheapest.push(option);
            }
        }
    }

    cheapest.into_iter().cloned().collect()
}

/// Provider-filtered, stably sorted view of `options`.
///
/// Equal keys keep their input order in both directions.
pub fn rank(
    options: &[RideOption],
    key: SortKey,
    order: SortOrder,
    filter: ProviderFilter,
) -> Vec<RideOption> {
    let mut ranked: Vec<RideOption> = options
        .iter()
        .filter(|o| filter.matches(o.provider))
        .cloned()
        .collect();

    // slice::sort_by is stable
    ranked.sort_by(|a, b| {
        let ordering = compare_by(a, b, key);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    ranked
}

fn compare_by(a: &RideOption, b: &RideOption, key: SortKey) -> Ordering {
    match key {
        // NaN-safe
        SortKey::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
        SortKey::Eta => a.eta.cmp(&b.eta),
    }
}
