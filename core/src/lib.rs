//! Synthetic client-portfolio generation for an economic-nexus advisory
//! dashboard: LLM-backed record generation with deterministic fallback,
//! nexus threshold monitoring, and persistence of every dependent row.

pub mod clock;
pub mod config;
pub mod error;
pub mod fallback;
pub mod form;
pub mod llm;
pub mod monitoring;
pub mod name_generator;
pub mod orchestrator;
pub mod record;
pub mod risk_policy;
pub mod rng;
pub mod store;
pub mod thresholds;
pub mod types;

pub use error::{SeedError, SeedResult};
