//! fashionbench-providers: Responder implementations.
//!
//! Implements the `Responder` trait for deterministic stubs, the offline
//! simulated model, cached replays of earlier reports, and the Anthropic,
//! OpenAI and Ollama APIs.

pub mod anthropic;
pub mod config;
pub mod ollama;
pub mod openai;
pub mod replay;
pub mod simulated;
pub mod stub;

pub use config::{
    create_responder, load_config, load_config_from, resolve_responder, FashionbenchConfig,
    ModelSpec, ProviderConfig,
};
pub use replay::ReplayResponder;
pub use simulated::SimulatedResponder;
pub use stub::StubResponder;
pub use fashionbench_core::error::ResponderError;
