//! Channel Integrations
//!
//! Chat-platform glue around the relay pipeline.

pub mod telegram;
