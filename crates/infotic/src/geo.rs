//! Best-effort geolocation.
//!
//! A capture asks a [`Geolocator`] for a position once. The answer never
//! blocks the submission: a provider that errors or runs past its timeout
//! yields [`Location::fallback`], and a missing provider yields
//! [`Location::unsupported`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::evidence::Location;

/// A source of device positions.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// The name of this provider (for logging).
    fn name(&self) -> &'static str;

    /// Produce the current position.
    ///
    /// # Errors
    ///
    /// Returns an error if no position can be determined.
    async fn locate(&self) -> Result<Location>;
}

/// A provider that always reports the same coordinates.
///
/// Used when the inspector types the position in, or reads it from a
/// handheld GPS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedGeolocator {
    lat: f64,
    lon: f64,
}

impl FixedGeolocator {
    /// Create a provider for the given coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Geolocation`] if the coordinates are out of range.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::geolocation(format!(
                "latitude {lat} is outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(Error::geolocation(format!(
                "longitude {lon} is outside -180..=180"
            )));
        }
        Ok(Self { lat, lon })
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn locate(&self) -> Result<Location> {
        Ok(Location::at(self.lat, self.lon))
    }
}

/// Ask `geolocator` for a position, never failing.
pub async fn resolve(geolocator: Option<&dyn Geolocator>, timeout: Duration) -> Location {
    let Some(geolocator) = geolocator else {
        debug!("No geolocation provider available");
        return Location::unsupported();
    };

    match tokio::time::timeout(timeout, geolocator.locate()).await {
        Ok(Ok(location)) => {
            debug!("{} reported {}", geolocator.name(), location);
            location
        }
        Ok(Err(e)) => {
            warn!("Location unavailable from {}: {}", geolocator.name(), e);
            Location::fallback()
        }
        Err(_) => {
            warn!(
                "Location unavailable from {}: timed out after {:?}",
                geolocator.name(),
                timeout
            );
            Location::fallback()
        }
    }
}
