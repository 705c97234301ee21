//! Provider link construction
//!
//! Builds the request body sent to the price aggregation endpoint and the
//! per-provider deep links that open a booking. Provider-specific URL
//! templates live only in this module.

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use crate::types::{LatLng, Place, Provider, RideCompareError, Result, Route};

const UBER_PRODUCT_SELECTION_URL: &str = "https://m.uber.com/go/product-selection";
const UBER_LOOKING_URL: &str = "https://m.uber.com/looking";
const OLA_BOOKING_URL: &str = "https://book.olacabs.com/";
const OLA_UNIVERSAL_LINK_URL: &str = "https://olawebcdn.com/assets/ola-universal-link.html";
const RAPIDO_SEO_URL: &str = "https://m.rapido.bike/unup-home/seo";

/// Uber vehicle id requested by the product-selection page
const UBER_VEHICLE_ID: &str = "2019";

/// Request body for the price aggregation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideLinks {
    pub uber_link: String,
    pub ola_link: String,
    pub rapido_data: RapidoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RapidoData {
    pub pickup_location: LatLng,
    pub drop_location: LatLng,
    pub customer: String,
}

impl RideLinks {
    /// Build the aggregation request for `route`
    pub fn for_route(route: &Route, customer_id: &str) -> Result<Self> {
        Ok(Self {
            uber_link: uber_product_url(route)?.into(),
            ola_link: ola_booking_url(route)?.into(),
            rapido_data: RapidoData {
                pickup_location: route.pickup.location,
                drop_location: route.dropoff.location,
                customer: customer_id.to_string(),
            },
        })
    }
}

/// URL that opens a booking for `route` in the provider's app or site
pub fn build_deep_link(provider: Provider, route: &Route) -> Result<String> {
    let url = match provider {
        Provider::Uber => rehost_query(&uber_product_url(route)?, UBER_LOOKING_URL)?,
        Provider::Ola => rehost_query(&ola_booking_url(route)?, OLA_UNIVERSAL_LINK_URL)?,
        Provider::Rapido => Url::parse(&format!(
            "{}/{}/{}?version=v3",
            RAPIDO_SEO_URL,
            encode_component(&route.pickup.location.to_string()),
            encode_component(&route.dropoff.location.to_string()),
        ))?,
    };
    Ok(url.into())
}

/// Location object embedded (as JSON) in Uber's query string
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UberLocation<'a> {
    address_line1: &'a str,
    address_line2: &'a str,
    id: &'a str,
    latitude: f64,
    longitude: f64,
}

impl<'a> From<&'a Place> for UberLocation<'a> {
    fn from(place: &'a Place) -> Self {
        Self {
            address_line1: &place.address,
            address_line2: &place.address,
            id: place.place_id.as_deref().unwrap_or(""),
            latitude: place.location.lat,
            longitude: place.location.lng,
        }
    }
}

fn uber_product_url(route: &Route) -> Result<Url> {
    let to_json = |place: &Place| {
        serde_json::to_string(&UberLocation::from(place))
            .map_err(|e| RideCompareError::Parse(e.to_string()))
    };
    let drop = to_json(&route.dropoff)?;
    let pickup = to_json(&route.pickup)?;

    Ok(Url::parse_with_params(
        UBER_PRODUCT_SELECTION_URL,
        &[
            ("drop[0]", drop.as_str()),
            ("pickup", pickup.as_str()),
            ("vehicle", UBER_VEHICLE_ID),
        ],
    )?)
}

fn ola_booking_url(route: &Route) -> Result<Url> {
    let pickup = &route.pickup;
    let dropoff = &route.dropoff;
    let drop_lat = dropoff.location.lat.to_string();
    let drop_lng = dropoff.location.lng.to_string();
    let lat = pickup.location.lat.to_string();
    let lng = pickup.location.lng.to_string();

    Ok(Url::parse_with_params(
        OLA_BOOKING_URL,
        &[
            ("serviceType", "p2p"),
            ("utm_source", "widget_on_olacabs"),
            ("drop_lat", drop_lat.as_str()),
            ("drop_lng", drop_lng.as_str()),
            ("drop_name", dropoff.address.as_str()),
            ("lat", lat.as_str()),
            ("lng", lng.as_str()),
            ("pickup_name", pickup.address.as_str()),
            ("pickup", ""),
        ],
    )?)
}

/// Copy the query of `source` onto `base`
fn rehost_query(source: &Url, base: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.set_query(source.query());
    Ok(url)
}

fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_route() -> Route {
        Route::new(
            Place::new("MG Road", LatLng::new(12.9756, 77.6066).unwrap())
                .with_place_id("ChIJpickup"),
            Place::new("Koramangala 5th Block", LatLng::new(12.9352, 77.6245).unwrap()),
        )
    }

    fn query_map(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    // ========== RideLinks ==========

    #[test]
    fn test_ride_links_uber_embeds_json_locations() {
        let links = RideLinks::for_route(&sample_route(), "cust-1").unwrap();
        assert!(links.uber_link.starts_with(UBER_PRODUCT_SELECTION_URL));

        let query = query_map(&links.uber_link);
        assert_eq!(query["vehicle"], "2019");

        let pickup: serde_json::Value = serde_json::from_str(&query["pickup"]).unwrap();
        assert_eq!(pickup["addressLine1"], "MG Road");
        assert_eq!(pickup["id"], "ChIJpickup");
        assert_eq!(pickup["latitude"], 12.9756);

        let drop: serde_json::Value = serde_json::from_str(&query["drop[0]"]).unwrap();
        assert_eq!(drop["addressLine2"], "Koramangala 5th Block");
        assert_eq!(drop["id"], "");
        assert_eq!(drop["longitude"], 77.6245);
    }

    #[test]
    fn test_ride_links_ola_query() {
        let links = RideLinks::for_route(&sample_route(), "cust-1").unwrap();
        let query = query_map(&links.ola_link);

        assert_eq!(query["serviceType"], "p2p");
        assert_eq!(query["lat"], "12.9756");
        assert_eq!(query["drop_lng"], "77.6245");
        assert_eq!(query["pickup_name"], "MG Road");
        assert_eq!(query["drop_name"], "Koramangala 5th Block");
        assert_eq!(query["pickup"], "");
    }

    #[test]
    fn test_ride_links_request_body_shape() {
        let links = RideLinks::for_route(&sample_route(), "67bda9ddfb42731aac8e99ca").unwrap();
        let body = serde_json::to_value(&links).unwrap();

        assert!(body["uber_link"].is_string());
        assert!(body["ola_link"].is_string());
        assert_eq!(body["rapido_data"]["pickupLocation"]["lat"], 12.9756);
        assert_eq!(body["rapido_data"]["dropLocation"]["lng"], 77.6245);
        assert_eq!(body["rapido_data"]["customer"], "67bda9ddfb42731aac8e99ca");
    }

    // ========== build_deep_link ==========

    #[test]
    fn test_deep_link_uber_rehosts_query() {
        let route = sample_route();
        let link = build_deep_link(Provider::Uber, &route).unwrap();
        let product = uber_product_url(&route).unwrap();

        assert!(link.starts_with("https://m.uber.com/looking?"));
        assert_eq!(Url::parse(&link).unwrap().query(), product.query());
    }

    #[test]
    fn test_deep_link_ola_universal_link() {
        let link = build_deep_link(Provider::Ola, &sample_route()).unwrap();

        assert!(link.starts_with(OLA_UNIVERSAL_LINK_URL));
        assert_eq!(query_map(&link)["drop_lat"], "12.9352");
    }

    #[test]
    fn test_deep_link_rapido_encodes_coordinates() {
        let link = build_deep_link(Provider::Rapido, &sample_route()).unwrap();

        assert_eq!(
            link,
            "https://m.rapido.bike/unup-home/seo/12.9756%2C77.6066/12.9352%2C77.6245?version=v3"
        );
    }

    #[test]
    fn test_deep_link_every_provider_builds() {
        let route = sample_route();
        for provider in Provider::ALL {
            assert!(build_deep_link(provider, &route).is_ok());
        }
    }
}
