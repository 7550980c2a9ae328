//! Provider clients and the concurrent query executor.
//!
//! Each [`ProviderClient`] asks one conversational AI service one question and
//! always comes back with a [`QueryOutcome`](aivis_core::QueryOutcome).
//! [`QueryExecutor`] fans the prompt catalog out across every client.

pub mod client;
pub mod clients;
pub mod error;
pub mod executor;
pub mod retry;

pub use client::ProviderClient;
pub use clients::{build_clients, AnthropicClient, ClientSettings, GeminiClient, OpenAiClient};
pub use error::ProviderError;
pub use executor::{ExecutorConfig, QueryExecutor};
pub use retry::RetryPolicy;
