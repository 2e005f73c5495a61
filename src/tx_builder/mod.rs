//! Launch transaction builder
//!
//! Turns validated token parameters into one signed, atomic transaction:
//!
//! - **instructions**: ordered instruction planning and validation
//! - **context**: block-reference captured for one assembly
//! - **assembler**: message compilation and dual signing (payer + mint)
//! - **output**: the immutable signed transaction handed to submission
//!
//! ## Instruction order
//!
//! create mint account → initialize mint → create associated token account →
//! mint full supply → create metadata. Any other order is rejected by
//! `sanity_check_ix_order` before a message is compiled.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use token_launch::tx_builder::{plan_mint_instructions, TransactionAssembler};
//!
//! # async fn example() -> Result<(), token_launch::errors::MintError> {
//! // let set = plan_mint_instructions(inputs)?;
//! // let assembled = assembler.build(&set, &payer, &mint).await?;
//! // Signatures cover the exact message bytes; the output is not mutated
//! // after this point.
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod context;
pub mod instructions;
pub mod output;

pub use assembler::{assemble_signed, TransactionAssembler};
pub use context::ExecutionContext;
pub use instructions::{
    derive_associated_token_address, derive_metadata_address, mint_account_len,
    plan_mint_instructions, sanity_check_ix_order, token_account_len, InstructionSet,
    MintInstructionInputs, MintStep,
};
pub use output::AssembledTransaction;
