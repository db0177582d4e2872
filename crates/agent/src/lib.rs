//! Chat reply resolution for the shop assistant.
//!
//! Every incoming message is answered by walking a short chain of stages:
//! 1. **Topic gate** (`guardrails`) - refuse messages that are not about the shop
//! 2. **Remote inference** (`llm`, `prompt`) - ask the hosted model when a credential exists
//! 3. **Simulated reply** (`fallback`) - deterministic keyword-classified answer
//!
//! # Key Types
//!
//! - `ResponseResolver` - the chain itself (see `runtime` module)
//! - `LlmClient` - pluggable trait for the hosted inference endpoint
//! - `ReplyTemplates` - locale and tone resources, swappable from TOML
//!
//! # Totality
//!
//! `ResponseResolver::resolve` returns text for every input. Remote failures of any
//! kind are absorbed by the simulated tier and never reach the caller.

pub mod fallback;
pub mod guardrails;
pub mod llm;
pub mod prompt;
pub mod runtime;
pub mod templates;

pub use runtime::{ResolverError, ResponseResolver};
