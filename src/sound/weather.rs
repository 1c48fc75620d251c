//! Spoken temperature report

use tracing::info;

use crate::sources::{Location, Units};

use super::vox::say;
use super::{SoundContext, SoundError};

const REPORT: &str = "black mesa topside temperature is";

/// Speaks the last known temperature for a location
#[derive(Debug)]
pub struct Weather {
    location: Location,
    temperature: Option<f64>,
    ctx: SoundContext,
}

impl Weather {
    pub fn new(ctx: &SoundContext, location: Location) -> Self {
        Self {
            location,
            temperature: None,
            ctx: ctx.clone(),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    #[cfg(test)]
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn update_temperature(&mut self, temperature: f64) {
        info!(
            location = %self.location,
            old = ?self.temperature,
            new = temperature,
            "temperature updated"
        );
        self.temperature = Some(temperature);
    }

    /// Ask the weather source for a fresh reading
    pub fn fetch_temperature(&self, units: Units) -> Option<f64> {
        self.ctx.weather.fetch_temperature(&self.location, units)
    }

    pub fn sentence(&self) -> String {
        match self.temperature {
            Some(t) => {
                // Whole degrees, truncated toward zero
                let degrees = t.trunc() as i64;
                let mut sentence = format!("{} {} degrees", REPORT, degrees);
                if t < 0.0 {
                    sentence.push_str(" ebin");
                }
                sentence
            }
            None => format!("{} unavailable", REPORT),
        }
    }

    pub fn play(&self) -> Result<(), SoundError> {
        say(&self.ctx, &self.sentence())
    }
}
