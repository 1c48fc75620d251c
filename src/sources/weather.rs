//! Temperature readings

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where a weather sound reports from
///
/// Numeric locations are provider city ids, anything else is a free-form
/// query such as `warsaw,pl`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Id(u64),
    Name(String),
}

impl Location {
    /// Parse a configured location, treating all-digit strings as ids
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = raw.parse() {
                return Location::Id(id);
            }
        }
        Location::Name(raw.to_string())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Id(id) => write!(f, "{}", id),
            Location::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Measurement system requested from the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

/// Provider of current temperature readings
pub trait WeatherSource: Send + Sync {
    /// Current temperature, or `None` when the reading is unavailable
    fn fetch_temperature(&self, location: &Location, units: Units) -> Option<f64>;
}

/// OpenWeatherMap-compatible HTTP endpoint
#[derive(Debug, Clone)]
pub struct OpenWeatherMap {
    api_url: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl OpenWeatherMap {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();

        Self {
            api_url: api_url.into(),
            api_key,
            agent,
        }
    }

    fn request(&self, location: &Location, units: Units) -> Result<serde_json::Value, ureq::Error> {
        let mut request = self.agent.get(&self.api_url).query("units", units.as_str());

        request = match location {
            Location::Id(id) => request.query("id", &id.to_string()),
            Location::Name(name) => request.query("q", name),
        };

        if let Some(key) = &self.api_key {
            request = request.query("appid", key);
        }

        Ok(request.call()?.into_json()?)
    }
}

impl WeatherSource for OpenWeatherMap {
    fn fetch_temperature(&self, location: &Location, units: Units) -> Option<f64> {
        match self.request(location, units) {
            Ok(body) => {
                let temp = temperature_from_body(&body);
                if temp.is_none() {
                    warn!(%location, "weather response has no main.temp");
                }
                debug!(%location, ?temp, "weather reading");
                temp
            }
            Err(e) => {
                warn!(%location, error = %e, "weather request failed");
                None
            }
        }
    }
}

fn temperature_from_body(body: &serde_json::Value) -> Option<f64> {
    body.get("main")?.get("temp")?.as_f64()
}
