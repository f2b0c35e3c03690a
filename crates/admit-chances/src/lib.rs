//! Admission chances engine and the collaborators that feed it.
//!
//! [`engine`] is the pure classification core. [`cohort`] holds the data-source
//! boundary, caching and the in-memory store; [`service`] and [`router`] wire them
//! together for the HTTP service.

pub mod cohort;
pub mod config;
pub mod engine;
pub mod error;
pub mod router;
pub mod service;
pub mod telemetry;
