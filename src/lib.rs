//! Compare ride prices across Uber, Ola and Rapido

pub mod cli;
pub mod config;
pub mod services;
pub mod tui;
pub mod types;
