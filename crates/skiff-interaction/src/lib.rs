//! The AI subsystem for Skiff.
//!
//! One provider adapter per backend, a fallback-chain normalizer for
//! unreliable local-model output, and a gateway that presents a single
//! normalized contract and never fails: every error becomes a diagnostic
//! [`AiResponse`](skiff_core::ai::AiResponse).

pub mod gateway;
pub mod normalize;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use gateway::AiGateway;
pub use normalize::{normalize_reply, parse_structured};
pub use provider::{ProviderAdapter, ProviderError, ResponseMode};
