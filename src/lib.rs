//! Token Launch - SPL token creation library
//!
//! Creates a fungible SPL token with metadata in one atomic transaction:
//! mint account, mint initialization, holding account, full supply and
//! metadata record either all land or none do.

pub mod config;
pub mod errors;
pub mod metrics;
pub mod network;
pub mod observability;
pub mod pipeline;
pub mod rpc;
pub mod structured_logging;
pub mod submission;
pub mod token;
pub mod tx_builder;
pub mod validation;
pub mod wallet;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use errors::MintError;
pub use network::{Network, NetworkProfile};
pub use pipeline::{MintPipeline, PipelineSettings, SubmissionResult};
pub use validation::{ConfigSupplier, RawMintConfig, ValidatedConfig};
