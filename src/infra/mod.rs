//! Infrastructure layer (adapters/implementations).
//!
//! This module contains IO-heavy integrations (change record files, agent
//! session logs, configuration).

pub mod app_config;
pub mod hash;
pub mod session;
pub mod store;
