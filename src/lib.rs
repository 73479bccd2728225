//! radmac - FreeRADIUS MAC Enrollment and Log Watching Library
//!
//! This library exposes the MAC normalization, users-file store, command
//! execution and log monitoring used by the `radmac-enroll` and
//! `radmac-watch` binaries.

pub mod cli;
pub mod command;
pub mod config;
pub mod constants;
pub mod enroll;
pub mod logging;
pub mod mac;
pub mod models;
pub mod monitor;
pub mod output;
pub mod store;
