//! Pickup/dropoff location types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{RideCompareError, Result};

/// Validated WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(RideCompareError::InvalidLocation(format!(
                "latitude out of range: {}",
                lat
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(RideCompareError::InvalidLocation(format!(
                "longitude out of range: {}",
                lng
            )));
        }
        Ok(Self { lat, lng })
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Parses "lat,lng"
impl FromStr for LatLng {
    type Err = RideCompareError;

    fn from_str(s: &str) -> Result<Self> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| RideCompareError::InvalidLocation(format!("expected LAT,LNG: {}", s)))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| RideCompareError::InvalidLocation(format!("{}: {}", s, e)))
        };
        Self::new(parse(lat)?, parse(lng)?)
    }
}

/// A selected place: display address plus validated coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub address: String,
    /// Identifier from the places collaborator, if the place came from one
    #[serde(default)]
    pub place_id: Option<String>,
    pub location: LatLng,
}

impl Place {
    pub fn new(address: impl Into<String>, location: LatLng) -> Self {
        Self {
            address: address.into(),
            place_id: None,
            location,
        }
    }

    pub fn with_place_id(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }
}

/// A pickup/dropoff pair ready for price lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub pickup: Place,
    pub dropoff: Place,
}

impl Route {
    pub fn new(pickup: Place, dropoff: Place) -> Self {
        Self { pickup, dropoff }
    }

    /// Same route in the opposite direction
    pub fn swapped(&self) -> Self {
        Self {
            pickup: self.dropoff.clone(),
            dropoff: self.pickup.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlng_valid() {
        let p = LatLng::new(12.9716, 77.5946).unwrap();
        assert_eq!(p.lat, 12.9716);
        assert_eq!(p.lng, 77.5946);
    }

    #[test]
    fn test_latlng_out_of_range() {
        assert!(LatLng::new(91.0, 0.0).is_err());
        assert!(LatLng::new(0.0, -180.5).is_err());
        assert!(LatLng::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_latlng_from_str() {
        let p: LatLng = " 12.97 , 77.59 ".parse().unwrap();
        assert_eq!(p, LatLng { lat: 12.97, lng: 77.59 });
    }

    #[test]
    fn test_latlng_from_str_rejects_garbage() {
        assert!("12.97".parse::<LatLng>().is_err());
        assert!("north,east".parse::<LatLng>().is_err());
        assert!("100,0".parse::<LatLng>().is_err());
    }

    #[test]
    fn test_latlng_display_round_trips_through_from_str() {
        let p = LatLng::new(-33.5, 151.25).unwrap();
        assert_eq!(p.to_string(), "-33.5,151.25");
        assert_eq!(p.to_string().parse::<LatLng>().unwrap(), p);
    }

    #[test]
    fn test_route_swapped() {
        let a = Place::new("Home", LatLng::new(1.0, 2.0).unwrap()).with_place_id("p1");
        let b = Place::new("Office", LatLng::new(3.0, 4.0).unwrap());
        let route = Route::new(a.clone(), b.clone());

        let swapped = route.swapped();

        assert_eq!(swapped.pickup, b);
        assert_eq!(swapped.dropoff, a);
    }
}
