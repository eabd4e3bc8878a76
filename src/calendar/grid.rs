//! Inline button grid primitives.

/// One pressable control in an inline grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridButton {
    /// Text shown on the button.
    pub label: String,

    /// Opaque payload delivered back when the button is pressed.
    pub payload: String,
}

impl GridButton {
    /// Creates a new button.
    #[must_use]
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// A matrix of buttons: rows of columns, rendered top to bottom.
pub type InlineGrid = Vec<Vec<GridButton>>;
