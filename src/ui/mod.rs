//! UI module for Sign Speller
//!
//! Provides all UI panels for the application.

pub mod control_panel;
pub mod history_panel;
pub mod preview;
pub mod spelling_panel;

pub use control_panel::{ControlAction, ControlPanel};
pub use history_panel::HistoryPanel;
pub use preview::PreviewPanel;
pub use spelling_panel::{SpellingAction, SpellingPanel};
