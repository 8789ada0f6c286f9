//! Fieldops LLM - Insight enhancement
//!
//! This crate defines the port through which rule-generated insight drafts are
//! reworded by a language model, the provider-health tracker that gates calls
//! to it, and an adapter for OpenAI-compatible chat-completions endpoints.

pub mod chat;
pub mod health;
pub mod ports;

pub use chat::{ChatEnhancer, ChatEnhancerConfig};
pub use health::{HealthState, ProviderHealth};
pub use ports::{EnhancerError, InsightEnhancer, NoopEnhancer};
