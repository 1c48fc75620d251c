//! Live data sources consumed by the weather and transit sounds
//!
//! Both sources swallow their own failures and report `None`, so a flaky
//! network never reaches the dispatch loop.

mod refresh;
mod transit;
mod weather;

pub use refresh::refresh_weather;
pub use transit::{ScheduledTransit, TransitSource};
pub use weather::{Location, OpenWeatherMap, Units, WeatherSource};
