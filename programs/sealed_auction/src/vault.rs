use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::constants::VAULT_SEED;
use crate::errors::AuctionError;

/// Escrow bookkeeping for one auction. The vault PDA is the token authority
/// of the escrow token account that actually holds the deposits.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Vault {
    pub auction: Pubkey,
    pub escrow: Pubkey,
    pub total_deposited: u64,
    pub total_paid_out: u64,
    pub bump: u8,
}

impl Vault {
    pub const LEN: usize = 32  // auction
        + 32                   // escrow
        + 8                    // total_deposited
        + 8                    // total_paid_out
        + 1;                   // bump

    pub fn new(auction: Pubkey, escrow: Pubkey, bump: u8) -> Self {
        Self {
            auction,
            escrow,
            total_deposited: 0,
            total_paid_out: 0,
            bump,
        }
    }

    /// Funds still held on behalf of the auction.
    pub fn balance(&self) -> u64 {
        self.total_deposited.saturating_sub(self.total_paid_out)
    }

    pub fn record_deposit(&mut self, amount: u64) -> Result<()> {
        self.total_deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or(AuctionError::MathOverflow)?;
        Ok(())
    }

    /// Books an outflow; payouts can never exceed what was deposited.
    pub fn record_payout(&mut self, amount: u64) -> Result<()> {
        require!(
            self.balance() >= amount,
            AuctionError::InsufficientVaultBalance
        );
        self.total_paid_out = self
            .total_paid_out
            .checked_add(amount)
            .ok_or(AuctionError::MathOverflow)?;
        Ok(())
    }
}

/// Moves `amount` from the bidder's token account into the escrow.
pub fn deposit_to_escrow<'info>(
    token_program: &Program<'info, Token>,
    source: &Account<'info, TokenAccount>,
    escrow: &Account<'info, TokenAccount>,
    owner: &Signer<'info>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let cpi_ctx = CpiContext::new(
        token_program.to_account_info(),
        Transfer {
            from: source.to_account_info(),
            to: escrow.to_account_info(),
            authority: owner.to_account_info(),
        },
    );
    token::transfer(cpi_ctx, amount)
}

/// Pays `amount` out of the escrow, signed by the vault PDA.
pub fn pay_from_escrow<'info>(
    token_program: &Program<'info, Token>,
    escrow: &Account<'info, TokenAccount>,
    recipient: &Account<'info, TokenAccount>,
    vault: &Account<'info, Vault>,
    amount: u64,
) -> Result<()> {
    require!(
        escrow.amount >= amount,
        AuctionError::InsufficientVaultBalance
    );

    let auction_key = vault.auction;
    let seeds = &[VAULT_SEED, auction_key.as_ref(), &[vault.bump]];
    let signer_seeds = &[&seeds[..]];

    let cpi_ctx = CpiContext::new_with_signer(
        token_program.to_account_info(),
        Transfer {
            from: escrow.to_account_info(),
            to: recipient.to_account_info(),
            authority: vault.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(cpi_ctx, amount)
}
