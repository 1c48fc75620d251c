//! Button-combination dispatcher
//!
//! Maps sets of simultaneously held buttons to sounds and turns press and
//! release events into `play` / `end` calls.

mod combo;
mod set;

pub use combo::ButtonCombo;
pub use set::SoundSet;

use crate::sources::Location;

/// Work items processed by the dispatcher, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum BoardCommand {
    /// These buttons are now held together
    Press(ButtonCombo),
    /// These buttons were let go
    Release(ButtonCombo),
    /// Fresh reading for every weather sound at `location`
    UpdateTemperature { location: Location, temperature: f64 },
}
