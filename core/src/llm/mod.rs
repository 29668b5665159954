//! LLM-backed record generation.
//!
//! The model is asked for one client as JSON. Its reply is free text; the
//! first top-level JSON object is cut out, deserialised into a
//! `ClientRecord` and validated. Any failure along the way is recovered by
//! the fallback generator.

pub mod client;
pub mod extract;
pub mod generator;
pub mod prompt;

pub use client::{AnthropicClient, LlmClient};
pub use extract::extract_first_json_object;
pub use generator::{LlmRecordGenerator, RecordGenerator};
pub use prompt::{build_prompt, Prompt};
