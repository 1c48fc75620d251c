//! Button line parsing and held-button tracking
//!
//! The controller writes one line per edge:
//!
//! ```text
//! press 1 2
//! release 1
//! ```

use crate::board::{BoardCommand, ButtonCombo};

use super::InputError;

/// One parsed controller line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Press(Vec<u32>),
    Release(Vec<u32>),
}

/// Parse a controller line; blank lines and `#` comments yield `None`
pub fn parse_line(line: &str) -> Result<Option<ButtonAction>, InputError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_lowercase();

    let ids = words
        .map(|w| {
            w.parse::<u32>()
                .map_err(|_| InputError::Malformed(line.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if ids.is_empty() {
        return Err(InputError::Malformed(line.to_string()));
    }

    match verb.as_str() {
        "press" | "p" => Ok(Some(ButtonAction::Press(ids))),
        "release" | "r" => Ok(Some(ButtonAction::Release(ids))),
        _ => Err(InputError::Malformed(line.to_string())),
    }
}

/// Tracks which buttons are currently held down
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldButtons {
    held: ButtonCombo,
}

impl HeldButtons {
    #[cfg(test)]
    pub fn held(&self) -> &ButtonCombo {
        &self.held
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Apply an action and return the command for the dispatcher
    ///
    /// A press reports everything held so far, a release only the buttons
    /// that went up.
    pub fn apply(&mut self, action: ButtonAction) -> BoardCommand {
        match action {
            ButtonAction::Press(ids) => {
                for id in ids {
                    self.held.insert(id);
                }
                BoardCommand::Press(self.held.clone())
            }
            ButtonAction::Release(ids) => {
                for &id in &ids {
                    self.held.remove(id);
                }
                BoardCommand::Release(ButtonCombo::new(ids))
            }
        }
    }
}
