//! SPL Token plumbing shared by every path that pays out of custody.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::constants::ENGINE_SEED;
use crate::error::StaggeredError;

/// ATA derivation: PDA(owner, token_program_id, mint) under the associated token program.
pub fn expected_ata_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    let seeds: &[&[u8]] = &[
        owner.as_ref(),
        anchor_spl::token::ID.as_ref(),
        mint.as_ref(),
    ];
    let (ata, _) = Pubkey::find_program_address(seeds, &anchor_spl::associated_token::ID);
    ata
}

/// Strict recipient ATA checks (pre-created ATA policy).
pub fn check_recipient_ata(
    ata_key: &Pubkey,
    ata: &TokenAccount,
    recipient: &Pubkey,
    mint: &Pubkey,
) -> Result<()> {
    require_keys_eq!(
        *ata_key,
        expected_ata_address(recipient, mint),
        StaggeredError::InvalidRecipientAta
    );
    require_keys_eq!(ata.mint, *mint, StaggeredError::InvalidTokenMint);
    require_keys_eq!(ata.owner, *recipient, StaggeredError::InvalidTokenAccount);
    Ok(())
}

/// CPI transfer out of the vault, signed by the engine state PDA.
pub fn transfer_from_vault<'info>(
    token_program: AccountInfo<'info>,
    vault: AccountInfo<'info>,
    destination: AccountInfo<'info>,
    engine_state: AccountInfo<'info>,
    engine_bump: u8,
    amount: u64,
) -> Result<()> {
    let signer_seeds: &[&[&[u8]]] = &[&[ENGINE_SEED, &[engine_bump]]];
    token::transfer(
        CpiContext::new_with_signer(
            token_program,
            Transfer {
                from: vault,
                to: destination,
                authority: engine_state,
            },
            signer_seeds,
        ),
        amount,
    )
}
