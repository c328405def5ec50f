//! Newtype label for objects inside a population.
//!
//! Labels are what reports print and what foci carry as their parent
//! back-reference, so they get their own type instead of a bare integer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A positive object label, unique within one [`Population`](super::Population).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

impl Label {
    /// Background in a label volume. Never the label of a live object.
    pub const BACKGROUND: Label = Label(0);

    /// Creates a new Label.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value.
    #[inline]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_background(&self) -> bool {
        self.0 == 0
    }

    /// The label that follows this one.
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u32> for Label {
    fn from(id: u32) -> Self {
        Label::new(id)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
