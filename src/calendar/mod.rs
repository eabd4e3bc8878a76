//! Calendar picker module.
//!
//! Renders a month as an inline button grid and interprets button
//! payloads into a day selection or month navigation.

mod grid;
mod picker;

pub use grid::{GridButton, InlineGrid};
pub use picker::{CalendarCursor, Selection, interpret, render};
