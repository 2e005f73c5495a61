//! Instruction planning and ordering validation
//!
//! This module builds the fixed five-instruction sequence that creates a
//! token in one transaction:
//! 1. create_account (system program) - allocate the mint account
//! 2. initialize_mint2 (token program) - decimals and authorities
//! 3. create associated token account (ATA program) - issuer holding account
//! 4. mint_to (token program) - full supply into the holding account
//! 5. create_metadata_accounts_v3 (metadata program) - name, symbol, uri
//!
//! Steps 2-5 all reference the account created in step 1, so the order is a
//! correctness invariant. The sequence is never reordered, deduplicated or
//! split across transactions.
//!
//! ## Key Features
//! - Pure, deterministic address derivation (no randomness, no network state)
//! - Stateless instruction planning
//! - Order validation against the expected program sequence

use crate::errors::MintError;
use crate::token::{
    TokenMetadata, TokenSpec, MAX_BASIS_POINTS, MAX_NAME_LEN, MAX_SYMBOL_LEN, MAX_URI_LEN,
};
use mpl_token_metadata::instructions::{
    CreateMetadataAccountV3, CreateMetadataAccountV3InstructionArgs,
};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_instruction, system_program};
use spl_associated_token_account::instruction::create_associated_token_account;
use spl_token::solana_program::program_pack::Pack;

/// Seed prefix of metadata account addresses
pub const METADATA_SEED: &[u8] = b"metadata";

/// Number of instructions in a launch transaction
pub const INSTRUCTION_COUNT: usize = 5;

// Leading data bytes identifying the system and token instructions we emit
const CREATE_ACCOUNT_TAG: [u8; 4] = [0, 0, 0, 0];
const INITIALIZE_MINT2_TAG: u8 = 20;
const MINT_TO_TAG: u8 = 7;

/// Size of the mint account allocated in step 1
pub fn mint_account_len() -> usize {
    spl_token::state::Mint::LEN
}

/// Size of the associated token account created in step 3
pub fn token_account_len() -> usize {
    spl_token::state::Account::LEN
}

/// Derive the issuer's associated token account for `mint`
///
/// One-way function of (owner, token program, mint) under the associated
/// token account program.
pub fn derive_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), spl_token::id().as_ref(), mint.as_ref()],
        &spl_associated_token_account::id(),
    )
    .0
}

/// Derive the metadata account for `mint`
pub fn derive_metadata_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[METADATA_SEED, mpl_token_metadata::ID.as_ref(), mint.as_ref()],
        &mpl_token_metadata::ID,
    )
    .0
}

/// The five steps of a launch, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintStep {
    AllocateMint,
    InitializeMint,
    CreateAssociatedAccount,
    MintTo,
    CreateMetadata,
}

impl MintStep {
    /// Execution order; index `i` is instruction `i` of the transaction
    pub const ORDER: [MintStep; INSTRUCTION_COUNT] = [
        MintStep::AllocateMint,
        MintStep::InitializeMint,
        MintStep::CreateAssociatedAccount,
        MintStep::MintTo,
        MintStep::CreateMetadata,
    ];

    /// Program the step's instruction must target
    pub fn program_id(&self) -> Pubkey {
        match self {
            MintStep::AllocateMint => system_program::id(),
            MintStep::InitializeMint | MintStep::MintTo => spl_token::id(),
            MintStep::CreateAssociatedAccount => spl_associated_token_account::id(),
            MintStep::CreateMetadata => mpl_token_metadata::ID,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MintStep::AllocateMint => "create_account",
            MintStep::InitializeMint => "initialize_mint2",
            MintStep::CreateAssociatedAccount => "create_associated_token_account",
            MintStep::MintTo => "mint_to",
            MintStep::CreateMetadata => "create_metadata_accounts_v3",
        }
    }
}

/// Everything the builder needs; only `rent_lamports` comes from the network
#[derive(Debug, Clone, Copy)]
pub struct MintInstructionInputs<'a> {
    pub token: &'a TokenSpec,
    pub metadata: &'a TokenMetadata,
    /// Fee payer, mint authority and metadata update authority
    pub payer: Pubkey,
    /// Address of the freshly generated mint signer
    pub mint: Pubkey,
    /// Owner of the holding account that receives the supply
    pub owner: Pubkey,
    /// Rent-exempt minimum for a mint account
    pub rent_lamports: u64,
}

/// Ordered launch instructions plus the addresses they create
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionSet {
    instructions: Vec<Instruction>,
    pub mint: Pubkey,
    pub associated_account: Pubkey,
    pub metadata_account: Pubkey,
}

impl InstructionSet {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Plan the launch instructions
///
/// # Errors
///
/// Returns `MintError::InstructionBuild` if the metadata payload exceeds the
/// metadata program's byte limits, the rent figure is zero, or an SPL helper
/// rejects its arguments.
pub fn plan_mint_instructions(
    inputs: MintInstructionInputs<'_>,
) -> Result<InstructionSet, MintError> {
    check_metadata_payload(inputs.metadata)?;
    if inputs.rent_lamports == 0 {
        return Err(MintError::instruction_failed(
            "system",
            "rent-exempt minimum for the mint account is zero",
        ));
    }

    let token_program = spl_token::id();
    let associated_account = derive_associated_token_address(&inputs.owner, &inputs.mint);
    let metadata_account = derive_metadata_address(&inputs.mint);

    // Pre-allocate for the fixed sequence
    let mut instructions = Vec::with_capacity(INSTRUCTION_COUNT);

    // 1. Allocate the mint account, owned by the token program
    instructions.push(system_instruction::create_account(
        &inputs.payer,
        &inputs.mint,
        inputs.rent_lamports,
        mint_account_len() as u64,
        &token_program,
    ));

    // 2. Initialize: payer is mint authority, no freeze authority
    instructions.push(
        spl_token::instruction::initialize_mint2(
            &token_program,
            &inputs.mint,
            &inputs.payer,
            None,
            inputs.token.decimals(),
        )
        .map_err(|e| MintError::instruction_failed("spl-token", e.to_string()))?,
    );

    // 3. Issuer holding account
    instructions.push(create_associated_token_account(
        &inputs.payer,
        &inputs.owner,
        &inputs.mint,
        &token_program,
    ));

    // 4. Full supply into the holding account
    instructions.push(
        spl_token::instruction::mint_to(
            &token_program,
            &inputs.mint,
            &associated_account,
            &inputs.payer,
            &[],
            inputs.token.raw_amount(),
        )
        .map_err(|e| MintError::instruction_failed("spl-token", e.to_string()))?,
    );

    // 5. Metadata record, mutable, payer as update authority
    instructions.push(
        CreateMetadataAccountV3 {
            metadata: metadata_account,
            mint: inputs.mint,
            mint_authority: inputs.payer,
            payer: inputs.payer,
            update_authority: (inputs.payer, true),
            system_program: system_program::id(),
            rent: None,
        }
        .instruction(CreateMetadataAccountV3InstructionArgs {
            data: inputs.metadata.to_data_v2(),
            is_mutable: true,
            collection_details: None,
        }),
    );

    sanity_check_ix_order(&instructions, &inputs.mint)?;

    Ok(InstructionSet {
        instructions,
        mint: inputs.mint,
        associated_account,
        metadata_account,
    })
}

fn check_metadata_payload(metadata: &TokenMetadata) -> Result<(), MintError> {
    let limits = [
        ("name", metadata.name.len(), MAX_NAME_LEN),
        ("symbol", metadata.symbol.len(), MAX_SYMBOL_LEN),
        ("uri", metadata.uri.len(), MAX_URI_LEN),
    ];
    for (field, len, max) in limits {
        if len > max {
            return Err(MintError::instruction_failed(
                "token-metadata",
                format!("{} is {} bytes, limit is {}", field, len, max),
            ));
        }
    }
    if metadata.seller_fee_basis_points > MAX_BASIS_POINTS {
        return Err(MintError::instruction_failed(
            "token-metadata",
            format!(
                "seller fee {} exceeds {} basis points",
                metadata.seller_fee_basis_points, MAX_BASIS_POINTS
            ),
        ));
    }
    Ok(())
}

/// Validate a launch instruction list
///
/// Checks count, the program targeted at every position, the leading data
/// bytes of the system/token instructions, and that every instruction after
/// the allocation references the mint being created.
pub fn sanity_check_ix_order(instructions: &[Instruction], mint: &Pubkey) -> Result<(), MintError> {
    if instructions.len() != INSTRUCTION_COUNT {
        return Err(MintError::instruction_failed(
            "sequence",
            format!(
                "expected {} instructions, got {}",
                INSTRUCTION_COUNT,
                instructions.len()
            ),
        ));
    }

    for (idx, (ix, step)) in instructions.iter().zip(MintStep::ORDER.iter()).enumerate() {
        if ix.program_id != step.program_id() {
            return Err(MintError::instruction_failed(
                "sequence",
                format!(
                    "instruction {} must be {} ({}), got program_id: {}",
                    idx,
                    step.name(),
                    step.program_id(),
                    ix.program_id
                ),
            ));
        }

        let tag_ok = match step {
            MintStep::AllocateMint => ix.data.starts_with(&CREATE_ACCOUNT_TAG),
            MintStep::InitializeMint => ix.data.first() == Some(&INITIALIZE_MINT2_TAG),
            MintStep::MintTo => ix.data.first() == Some(&MINT_TO_TAG),
            MintStep::CreateAssociatedAccount | MintStep::CreateMetadata => true,
        };
        if !tag_ok {
            return Err(MintError::instruction_failed(
                "sequence",
                format!("instruction {} is not {}", idx, step.name()),
            ));
        }

        let touches_mint = ix.accounts.iter().any(|meta| meta.pubkey == *mint);
        if !touches_mint {
            return Err(MintError::instruction_failed(
                "sequence",
                format!("instruction {} ({}) does not reference mint {}", idx, step.name(), mint),
            ));
        }
    }

    // The allocation must create the mint as a signer
    let allocation = &instructions[0];
    let mint_is_new_signer = allocation
        .accounts
        .get(1)
        .map_or(false, |meta| meta.pubkey == *mint && meta.is_signer && meta.is_writable);
    if !mint_is_new_signer {
        return Err(MintError::instruction_failed(
            "sequence",
            "create_account must allocate the mint as a writable signer",
        ));
    }

    Ok(())
}
