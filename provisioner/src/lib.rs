//! Command line provisioner for fan-out topologies

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

pub mod cli;
pub mod commands;
pub mod types;
