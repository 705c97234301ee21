//! Ride quote and ride option types

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{RideCompareError, Result};

/// Sentinel price text sent by the aggregation endpoint for missing quotes
pub const NOT_AVAILABLE: &str = "Not Available";

/// Ride-hailing provider whose quotes are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Uber,
    Ola,
    Rapido,
}

/// Static per-provider data
#[derive(Debug)]
pub struct ProviderInfo {
    /// Display name ("Uber")
    pub name: &'static str,
    /// Lowercase key used by the aggregation endpoint ("uber")
    pub key: &'static str,
    /// Brand colour as RGB
    pub brand_color: (u8, u8, u8),
}

/// Indexed by `Provider as usize`
static PROVIDER_TABLE: [ProviderInfo; 3] = [
    ProviderInfo {
        name: "Uber",
        key: "uber",
        brand_color: (0x00, 0x00, 0x00),
    },
    ProviderInfo {
        name: "Ola",
        key: "ola",
        brand_color: (0x45, 0xB7, 0x48),
    },
    ProviderInfo {
        name: "Rapido",
        key: "rapido",
        brand_color: (0xFF, 0xCA, 0x28),
    },
];

impl Provider {
    /// All providers in quote order
    pub const ALL: [Provider; 3] = [Provider::Uber, Provider::Ola, Provider::Rapido];

    pub fn info(self) -> &'static ProviderInfo {
        &PROVIDER_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn key(self) -> &'static str {
        self.info().key
    }

    pub fn brand_color(self) -> (u8, u8, u8) {
        self.info().brand_color
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim();
        Provider::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown provider: {}", s))
    }
}

/// One provider's quote for one ride type, as sent by the endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProviderQuote {
    /// Provider's own label for the ride type ("UberGo", "Mini")
    #[serde(default)]
    pub name: String,
    /// Currency-formatted price or "Not Available"
    #[serde(default)]
    pub price: Option<String>,
    /// Duration text such as "5 mins"
    #[serde(default)]
    pub eta: Option<String>,
}

impl RawProviderQuote {
    /// Raw price text when the quote is available (non-empty, not the sentinel)
    pub fn available_price(&self) -> Option<&str> {
        let price = self.price.as_deref()?;
        if price.is_empty() || price == NOT_AVAILABLE {
            None
        } else {
            Some(price)
        }
    }
}

/// The fixed provider triple for one ride type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RideTypeQuotes {
    #[serde(default)]
    pub uber: RawProviderQuote,
    #[serde(default)]
    pub ola: RawProviderQuote,
    #[serde(default)]
    pub rapido: RawProviderQuote,
}

impl RideTypeQuotes {
    pub fn quote(&self, provider: Provider) -> &RawProviderQuote {
        match provider {
            Provider::Uber => &self.uber,
            Provider::Ola => &self.ola,
            Provider::Rapido => &self.rapido,
        }
    }
}

/// Ride-type key → provider quotes, in the order the endpoint sent them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPriceMatrix(IndexMap<String, RideTypeQuotes>);

impl RawPriceMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a matrix from JSON bytes (buffer is used as scratch space)
    pub fn from_json_slice(bytes: &mut [u8]) -> Result<Self> {
        simd_json::from_slice(bytes).map_err(|e| RideCompareError::Parse(e.to_string()))
    }

    pub fn insert(&mut self, ride_type: impl Into<String>, quotes: RideTypeQuotes) {
        self.0.insert(ride_type.into(), quotes);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RideTypeQuotes)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, RideTypeQuotes)> for RawPriceMatrix {
    fn from_iter<I: IntoIterator<Item = (K, RideTypeQuotes)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A comparable ride option derived from one available quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideOption {
    pub provider: Provider,
    /// Provider's ride-type label, not the matrix key
    #[serde(rename = "type")]
    pub ride_type: String,
    pub price: f64,
    /// Minutes until pickup, 0 when unknown
    pub eta: u32,
    pub display_price: String,
    pub display_eta: String,
}

/// Field used to order ride options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Price,
    Eta,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(Self::Price),
            "eta" | "time" => Ok(Self::Eta),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Price => "price",
            Self::Eta => "eta",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Active sort control (key + direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortState {
    /// Clicking the active ascending key flips to descending; anything else
    /// selects `key` ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        let order = if self.key == key && self.order == SortOrder::Asc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        Self { key, order }
    }
}

/// Provider restriction for the ranked view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderFilter {
    #[default]
    All,
    Only(Provider),
}

impl ProviderFilter {
    pub fn matches(self, provider: Provider) -> bool {
        match self {
            Self::All => true,
            Self::Only(p) => p == provider,
        }
    }

    /// Selecting the active provider again clears the filter
    pub fn toggle(self, provider: Provider) -> Self {
        match self {
            Self::Only(p) if p == provider => Self::All,
            _ => Self::Only(provider),
        }
    }
}

impl fmt::Display for ProviderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(p) => f.write_str(p.key()),
        }
    }
}

impl FromStr for ProviderFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Provider ==========

    #[test]
    fn test_provider_lookup_table_matches_variants() {
        for provider in Provider::ALL {
            assert_eq!(provider.key(), provider.name().to_ascii_lowercase());
        }
        assert_eq!(Provider::Ola.brand_color(), (0x45, 0xB7, 0x48));
        assert_eq!(Provider::Rapido.brand_color(), (0xFF, 0xCA, 0x28));
    }

    #[test]
    fn test_provider_from_str_case_insensitive() {
        assert_eq!("UBER".parse::<Provider>(), Ok(Provider::Uber));
        assert_eq!(" rapido ".parse::<Provider>(), Ok(Provider::Rapido));
        assert!("lyft".parse::<Provider>().is_err());
    }

    // ========== RawProviderQuote ==========

    #[test]
    fn test_available_price_excludes_sentinel_and_empty() {
        let mut quote = RawProviderQuote {
            name: "Mini".into(),
            price: Some("Not Available".into()),
            eta: None,
        };
        assert_eq!(quote.available_price(), None);

        quote.price = Some(String::new());
        assert_eq!(quote.available_price(), None);

        quote.price = None;
        assert_eq!(quote.available_price(), None);

        quote.price = Some("₹150".into());
        assert_eq!(quote.available_price(), Some("₹150"));
    }

    #[test]
    fn test_available_price_keeps_raw_text() {
        let mut quote = RawProviderQuote {
            name: "Mini".into(),
            price: Some("  ".into()),
            eta: None,
        };
        assert_eq!(quote.available_price(), Some("  "));

        quote.price = Some(" Not Available".into());
        assert_eq!(quote.available_price(), Some(" Not Available"));

        quote.price = Some(" ₹90 ".into());
        assert_eq!(quote.available_price(), Some(" ₹90 "));
    }

    // ========== RawPriceMatrix ==========

    #[test]
    fn test_matrix_preserves_key_order() {
        let mut json = r#"{
            "sedan": {"uber": {"name": "Premier", "price": "₹300", "eta": "4 mins"}},
            "auto": {"rapido": {"name": "Auto", "price": "₹90", "eta": "2 mins"}},
            "mini": {}
        }"#
        .as_bytes()
        .to_vec();

        let matrix = RawPriceMatrix::from_json_slice(&mut json).unwrap();
        let keys: Vec<&str> = matrix.iter().map(|(k, _)| k).collect();

        assert_eq!(keys, vec!["sedan", "auto", "mini"]);
        assert_eq!(matrix.len(), 3);
    }

    #[test]
    fn test_matrix_missing_slot_defaults_to_empty_quote() {
        let mut json = r#"{"bike": {"rapido": {"name": "Bike", "price": "₹40"}}}"#
            .as_bytes()
            .to_vec();

        let matrix = RawPriceMatrix::from_json_slice(&mut json).unwrap();
        let (_, quotes) = matrix.iter().next().unwrap();

        assert_eq!(quotes.uber, RawProviderQuote::default());
        assert_eq!(quotes.quote(Provider::Rapido).eta, None);
    }

    #[test]
    fn test_matrix_rejects_non_object() {
        let mut json = b"[1, 2, 3]".to_vec();
        let err = RawPriceMatrix::from_json_slice(&mut json).unwrap_err();
        assert!(matches!(err, RideCompareError::Parse(_)));
    }

    // ========== RideOption ==========

    #[test]
    fn test_ride_option_serializes_camel_case() {
        let option = RideOption {
            provider: Provider::Uber,
            ride_type: "UberGo".into(),
            price: 120.0,
            eta: 5,
            display_price: "₹120".into(),
            display_eta: "5 mins".into(),
        };

        let value = serde_json::to_value(&option).unwrap();

        assert_eq!(value["provider"], "Uber");
        assert_eq!(value["type"], "UberGo");
        assert_eq!(value["displayPrice"], "₹120");
        assert_eq!(value["displayEta"], "5 mins");
    }

    // ========== Sort / filter controls ==========

    #[test]
    fn test_sort_state_toggle_same_key_flips_order() {
        let state = SortState::default();
        assert_eq!(state.key, SortKey::Price);

        let state = state.toggle(SortKey::Price);
        assert_eq!(state.order, SortOrder::Desc);

        // Desc on the same key goes back to asc
        let state = state.toggle(SortKey::Price);
        assert_eq!(state.order, SortOrder::Asc);
    }

    #[test]
    fn test_sort_state_toggle_other_key_resets_to_asc() {
        let state = SortState {
            key: SortKey::Price,
            order: SortOrder::Desc,
        };
        let state = state.toggle(SortKey::Eta);
        assert_eq!(
            state,
            SortState {
                key: SortKey::Eta,
                order: SortOrder::Asc
            }
        );
    }

    #[test]
    fn test_provider_filter_toggle() {
        let filter = ProviderFilter::All.toggle(Provider::Ola);
        assert_eq!(filter, ProviderFilter::Only(Provider::Ola));

        let filter = filter.toggle(Provider::Uber);
        assert_eq!(filter, ProviderFilter::Only(Provider::Uber));

        let filter = filter.toggle(Provider::Uber);
        assert_eq!(filter, ProviderFilter::All);
    }

    #[test]
    fn test_provider_filter_from_str() {
        assert_eq!("all".parse::<ProviderFilter>(), Ok(ProviderFilter::All));
        assert_eq!(
            "Ola".parse::<ProviderFilter>(),
            Ok(ProviderFilter::Only(Provider::Ola))
        );
        assert!("nobody".parse::<ProviderFilter>().is_err());
    }

    #[test]
    fn test_provider_filter_display_parses_back() {
        assert_eq!(ProviderFilter::All.to_string(), "all");
        assert_eq!(ProviderFilter::Only(Provider::Uber).to_string(), "uber");
        for filter in [ProviderFilter::All, ProviderFilter::Only(Provider::Rapido)] {
            assert_eq!(filter.to_string().parse::<ProviderFilter>(), Ok(filter));
        }
    }

    #[test]
    fn test_sort_key_and_order_from_str() {
        assert_eq!("time".parse::<SortKey>(), Ok(SortKey::Eta));
        assert_eq!("PRICE".parse::<SortKey>(), Ok(SortKey::Price));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortKey::Eta.to_string(), "eta");
        assert_eq!(SortOrder::Desc.to_string(), "desc");
    }
}
