//! # Insight Providers
//!
//! LLM provider implementations for the news insight engine.
//!
//! Three provider families are supported, selected by model-label prefix:
//! - GPT-family (`gpt-*`) — OpenAI-compatible chat completions
//! - Claude-family (`claude-*`) — Anthropic-compatible messages
//! - Gemini-family (`gemini-*`) — Google-compatible generateContent
//!
//! A deterministic [`MockProvider`] implements the same interface and is
//! substituted when no real provider is configured, or when the process-wide
//! router mode override requests it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod google;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod registry;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use google::{GoogleConfig, GoogleProvider};
pub use mock::MockProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{Completion, LlmProvider, ProviderFamily};
pub use registry::ProviderRegistry;
