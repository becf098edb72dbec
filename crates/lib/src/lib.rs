//! envlens-lib: Core logic for envlens
//!
//! This crate provides everything the `envlens` CLI renders:
//! - `loader`: best-effort reading of an environment's manifest and lock file
//! - `reconcile`: per-entity lifecycle state from the two documents
//! - `services`: tolerant parsing of service status output
//! - `environment`: diffing and applying activation snapshots
//! - `guard`: single-flight activation and debounced file events
//! - `command`: typed invocations of the external environment tool

pub mod command;
pub mod consts;
pub mod environment;
pub mod guard;
pub mod loader;
pub mod lock;
pub mod manifest;
pub mod panel;
pub mod platform;
pub mod reconcile;
pub mod search;
pub mod services;
pub mod settings;
