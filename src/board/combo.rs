//! Button combinations

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An unordered set of button ids used as a dispatch key
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonCombo(BTreeSet<u32>);

impl ButtonCombo {
    pub fn new(buttons: impl IntoIterator<Item = u32>) -> Self {
        Self(buttons.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, button: u32) -> bool {
        self.0.contains(&button)
    }

    /// True when at least one button is shared
    pub fn intersects(&self, other: &ButtonCombo) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    pub fn insert(&mut self, button: u32) -> bool {
        self.0.insert(button)
    }

    pub fn remove(&mut self, button: u32) -> bool {
        self.0.remove(&button)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl FromIterator<u32> for ButtonCombo {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for ButtonCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{{{}}}", ids.join("+"))
    }
}
