//! Core domain types and logic.

pub mod bar;
pub mod clock;
pub mod config_validation;
pub mod error;
pub mod interval;
pub mod session;
pub mod truncate;
