//! Collaborator traits consumed by the domain.

pub mod config_port;
pub mod schedule_port;
