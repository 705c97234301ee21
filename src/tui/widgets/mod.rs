//! TUI widgets

pub mod help;
pub mod rides;
pub mod spinner;
