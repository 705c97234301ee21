//! Ride option normalization service
//!
//! Flattens the per-ride-type, per-provider price matrix returned by the
//! aggregation endpoint into a list of comparable [`RideOption`]s.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::types::{
    Provider, RawPriceMatrix, RawProviderQuote, RideCompareError, RideOption, Result,
};

/// Shown when a quote carries no usable ETA
pub const ETA_UNKNOWN: &str = "N/A";

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\+?(\d+)").expect("valid regex"));

/// Parse a currency-formatted price into currency units.
///
/// Strips the currency prefix ("₹", "Rs.") and thousands separators. A minus
/// sign anywhere before the amount makes the price unparseable.
///
/// # Examples
/// ```
/// use ridecompare::services::normalizer::parse_price;
///
/// assert_eq!(parse_price("₹1,250"), Some(1250.0));
/// assert_eq!(parse_price("₹.50"), Some(0.5));
/// assert_eq!(parse_price("₹-50"), None);
/// assert_eq!(parse_price("Not a price"), None);
/// ```
pub fn parse_price(text: &str) -> Option<f64> {
    let without_separators: String = text.chars().filter(|c| *c != ',').collect();
    let text = without_separators.trim();
    let first_digit = text.find(|c: char| c.is_ascii_digit())?;
    let prefix = &text[..first_digit];
    if prefix.contains('-') {
        return None;
    }
    // A dot right before the digits is a decimal point unless it ends an
    // abbreviation such as "Rs."
    let amount = match prefix.strip_suffix('.') {
        Some(before) if !before.ends_with(char::is_alphabetic) => &text[first_digit - 1..],
        _ => &text[first_digit..],
    };
    let value = amount.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Leading integer of a duration string ("5 mins" → 5)
pub fn parse_eta(text: &str) -> Option<u32> {
    LEADING_INT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Normalize a price matrix, falling back to a price of 0 for quotes whose
/// price text cannot be parsed.
///
/// Output is grouped by ride type in matrix order, then Uber, Ola, Rapido.
pub fn normalize(matrix: &RawPriceMatrix) -> Vec<RideOption> {
    available_quotes(matrix)
        .map(|(provider, quote, price_text)| {
            let price = parse_price(price_text).unwrap_or_else(|| {
                warn!(
                    "unparseable price {:?} from {} for {}, using 0",
                    price_text, provider, quote.name
                );
                0.0
            });
            build_option(provider, quote, price_text, price)
        })
        .collect()
}

/// Like [`normalize`], but an available quote with an unparseable price is
/// reported as [`RideCompareError::MalformedQuote`].
pub fn normalize_strict(matrix: &RawPriceMatrix) -> Result<Vec<RideOption>> {
    available_quotes(matrix)
        .map(|(provider, quote, price_text)| {
            let price =
                parse_price(price_text).ok_or_else(|| RideCompareError::MalformedQuote {
                    provider,
                    ride_type: quote.name.clone(),
                    price_text: price_text.to_string(),
                })?;
            Ok(build_option(provider, quote, price_text, price))
        })
        .collect()
}

/// Every quote passing the inclusion rule, in output order
fn available_quotes(
    matrix: &RawPriceMatrix,
) -> impl Iterator<Item = (Provider, &RawProviderQuote, &str)> {
    matrix.iter().flat_map(|(_, quotes)| {
        Provider::ALL.into_iter().filter_map(move |provider| {
            let quote = quotes.quote(provider);
            quote
                .available_price()
                .map(|price_text| (provider, quote, price_text))
        })
    })
}

fn build_option(
    provider: Provider,
    quote: &RawProviderQuote,
    price_text: &str,
    price: f64,
) -> RideOption {
    let eta_text = quote.eta.as_deref().map(str::trim).unwrap_or("");
    let (eta, display_eta) = match parse_eta(eta_text) {
        Some(minutes) => (minutes, eta_text.to_string()),
        None => (0, ETA_UNKNOWN.to_string()),
    };

    RideOption {
        provider,
        ride_type: quote.name.clone(),
        price,
        eta,
        display_price: price_text.to_string(),
        display_eta,
    }
}
