use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

pub mod access;
pub mod address;
pub mod auction;
pub mod bid;
pub mod constants;
pub mod delegation;
pub mod errors;
pub mod events;
pub mod settlement;
pub mod vault;

use crate::access::require_owner;
use crate::auction::{AuctionHouse, AuctionTerms};
use crate::bid::{ExecutionEnvironment, SealedBid};
use crate::constants::*;
use crate::delegation::DelegationRecord;
use crate::errors::AuctionError;
use crate::events::*;
use crate::vault::{deposit_to_escrow, pay_from_escrow, Vault};

declare_id!("CoxdM5k4LNDBhegMXRZU7uMRKi2vz5syh7oMDAxadXjo");

#[program]
pub mod sealed_auction {
    use super::*;

    /// Open a new auction together with its vault and escrow token account
    pub fn create_auction(
        ctx: Context<CreateAuction>,
        auction_id: u64,
        min_bid: u64,
        min_increment: u64,
        duration: i64,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let terms = AuctionTerms {
            auction_id,
            min_bid,
            min_increment,
            duration,
        };

        let mut auction = AuctionHouse::open(
            ctx.accounts.authority.key(),
            ctx.accounts.bid_mint.key(),
            terms,
            now,
        )?;
        auction.bump = ctx.bumps.auction_house;
        let ends_at = auction.end_time;
        ctx.accounts.auction_house.set_inner(auction);

        let auction_key = ctx.accounts.auction_house.key();
        ctx.accounts.vault.set_inner(Vault::new(
            auction_key,
            ctx.accounts.escrow.key(),
            ctx.bumps.vault,
        ));

        emit!(AuctionCreated {
            auction: auction_key,
            authority: ctx.accounts.authority.key(),
            auction_id,
            bid_mint: ctx.accounts.bid_mint.key(),
            min_bid,
            min_increment,
            ends_at,
        });

        Ok(())
    }

    /// Create the caller's sealed bid record for an open auction
    pub fn initialize_sealed_bid(ctx: Context<InitializeSealedBid>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction = &mut ctx.accounts.auction_house;
        auction.require_open(now)?;
        auction.register_bidder()?;

        let bidder = ctx.accounts.bidder.key();
        ctx.accounts.sealed_bid.set_inner(SealedBid::new(
            auction.key(),
            bidder,
            ctx.bumps.sealed_bid,
        ));

        emit!(BidderRegistered {
            auction: auction.key(),
            bidder,
            bidder_count: auction.bidder_count,
        });

        Ok(())
    }

    /// Declare a bid on the primary ledger and escrow any shortfall
    pub fn submit_sealed_bid(ctx: Context<SubmitSealedBid>, amount: u64) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction = &ctx.accounts.auction_house;
        let sealed_bid = &mut ctx.accounts.sealed_bid;
        require_owner(&ctx.accounts.bidder.key(), &sealed_bid.bidder)?;
        sealed_bid.require_auction(&auction.key())?;

        let shortfall = sealed_bid.submit(auction, ExecutionEnvironment::Primary, amount, now)?;
        ctx.accounts.vault.record_deposit(shortfall)?;
        deposit_to_escrow(
            &ctx.accounts.token_program,
            &ctx.accounts.bidder_tokens,
            &ctx.accounts.escrow,
            &ctx.accounts.bidder,
            shortfall,
        )?;

        emit!(BidSubmitted::primary(auction.key(), sealed_bid.bidder, amount, shortfall));

        Ok(())
    }

    /// Declare a bid against the delegated copy inside the private environment
    pub fn submit_sealed_bid_delegated(
        ctx: Context<SubmitSealedBidDelegated>,
        amount: u64,
    ) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction = &ctx.accounts.auction_house;
        let record = &mut ctx.accounts.delegation_record;
        require_owner(&ctx.accounts.bidder.key(), &record.bidder)?;
        record.require_validator(&ctx.accounts.validator.key())?;

        let auction_key = auction.key();
        let shortfall = record.apply(|bid| {
            bid.require_auction(&auction_key)?;
            bid.submit(auction, ExecutionEnvironment::Delegated, amount, now)
        })?;
        ctx.accounts.vault.record_deposit(shortfall)?;
        deposit_to_escrow(
            &ctx.accounts.token_program,
            &ctx.accounts.bidder_tokens,
            &ctx.accounts.escrow,
            &ctx.accounts.bidder,
            shortfall,
        )?;

        emit!(BidSubmitted::delegated(auction_key, record.bidder));

        Ok(())
    }

    /// Move write authority over a sealed bid to the private environment
    pub fn delegate_bid(ctx: Context<DelegateBid>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let sealed_bid_key = ctx.accounts.sealed_bid.key();
        let validator = ctx.accounts.validator.key();
        let sealed_bid = &mut ctx.accounts.sealed_bid;
        require_owner(&ctx.accounts.bidder.key(), &sealed_bid.bidder)?;

        let mut record = delegation::delegate(sealed_bid, sealed_bid_key, validator, now)?;
        record.bump = ctx.bumps.delegation_record;
        ctx.accounts.delegation_record.set_inner(record);

        msg!("sealed bid {} delegated to {}", sealed_bid_key, validator);
        emit!(BidDelegated {
            sealed_bid: sealed_bid_key,
            bidder: ctx.accounts.bidder.key(),
            validator,
        });

        Ok(())
    }

    /// Write the delegated copy back to the primary ledger and drop the binding
    pub fn process_undelegation(
        ctx: Context<ProcessUndelegation>,
        account_seeds: Vec<Vec<u8>>,
    ) -> Result<()> {
        let record = &ctx.accounts.delegation_record;
        record.require_validator(&ctx.accounts.validator.key())?;

        let sealed_bid_key = ctx.accounts.sealed_bid.key();
        let restored = record.release(&sealed_bid_key, &account_seeds, ctx.program_id)?;
        ctx.accounts.sealed_bid.set_inner(restored);

        msg!("sealed bid {} returned from {}", sealed_bid_key, record.validator);
        emit!(BidUndelegated {
            sealed_bid: sealed_bid_key,
            bidder: record.bidder,
            validator: record.validator,
        });

        Ok(())
    }

    /// Commit the declared amount from the primary ledger
    pub fn commit_bid(ctx: Context<CommitBid>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction_key = ctx.accounts.auction_house.key();
        let sealed_bid = &mut ctx.accounts.sealed_bid;
        require_owner(&ctx.accounts.bidder.key(), &sealed_bid.bidder)?;
        sealed_bid.require_auction(&auction_key)?;

        let amount = sealed_bid.commit(
            &mut ctx.accounts.auction_house,
            ExecutionEnvironment::Primary,
            now,
        )?;

        emit!(BidCommitted {
            auction: auction_key,
            bidder: sealed_bid.bidder,
            amount,
            delegated: false,
        });

        Ok(())
    }

    /// Commit the declared amount from inside the private environment
    pub fn commit_bid_delegated(ctx: Context<CommitBidDelegated>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction_key = ctx.accounts.auction_house.key();
        let auction = &mut ctx.accounts.auction_house;
        let record = &mut ctx.accounts.delegation_record;
        require_owner(&ctx.accounts.bidder.key(), &record.bidder)?;
        record.require_validator(&ctx.accounts.validator.key())?;

        let amount = record.apply(|bid| {
            bid.require_auction(&auction_key)?;
            bid.commit(auction, ExecutionEnvironment::Delegated, now)
        })?;

        emit!(BidCommitted {
            auction: auction_key,
            bidder: record.bidder,
            amount,
            delegated: true,
        });

        Ok(())
    }

    /// Fold one committed bid into the authoritative highest bid
    pub fn settle_committed_bid(ctx: Context<SettleCommittedBid>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction = &mut ctx.accounts.auction_house;
        let sealed_bid = &mut ctx.accounts.sealed_bid;
        sealed_bid.require_auction(&auction.key())?;

        settlement::settle(auction, sealed_bid, now)?;

        emit!(BidSettled {
            auction: auction.key(),
            bidder: sealed_bid.bidder,
            amount: sealed_bid.amount,
            current_highest_bid: auction.highest_bid,
            current_winner: auction.winner,
        });

        Ok(())
    }

    /// Lock the winner once every committed bid has been settled
    pub fn finalize_auction(ctx: Context<FinalizeAuction>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction = &mut ctx.accounts.auction_house;
        require_owner(&ctx.accounts.authority.key(), &auction.authority)?;

        auction.finalize(now)?;

        emit!(AuctionFinalized {
            auction: auction.key(),
            winner: auction.winner,
            final_bid: auction.highest_bid,
        });

        Ok(())
    }

    /// Pay the winning amount from the escrow to the seller
    pub fn claim_seller_proceeds(ctx: Context<ClaimSellerProceeds>) -> Result<()> {
        let auction = &mut ctx.accounts.auction_house;
        require_owner(&ctx.accounts.authority.key(), &auction.authority)?;

        let amount = auction.claim_proceeds()?;
        ctx.accounts.vault.record_payout(amount)?;
        pay_from_escrow(
            &ctx.accounts.token_program,
            &ctx.accounts.escrow,
            &ctx.accounts.seller_tokens,
            &ctx.accounts.vault,
            amount,
        )?;

        emit!(SellerProceedsClaimed {
            auction: auction.key(),
            authority: auction.authority,
            amount,
        });

        Ok(())
    }

    /// Return a settled losing bidder's deposit
    pub fn claim_refund(ctx: Context<ClaimRefund>) -> Result<()> {
        let auction = &ctx.accounts.auction_house;
        let sealed_bid = &mut ctx.accounts.sealed_bid;
        require_owner(&ctx.accounts.bidder.key(), &sealed_bid.bidder)?;
        sealed_bid.require_auction(&auction.key())?;

        let amount = settlement::claim_refund(auction, sealed_bid, &mut ctx.accounts.vault)?;
        pay_from_escrow(
            &ctx.accounts.token_program,
            &ctx.accounts.escrow,
            &ctx.accounts.bidder_tokens,
            &ctx.accounts.vault,
            amount,
        )?;

        emit!(RefundClaimed {
            auction: auction.key(),
            bidder: sealed_bid.bidder,
            amount,
        });

        Ok(())
    }

    /// Return a deposit whose bid was never committed before the end time
    pub fn withdraw_uncommitted_deposit(ctx: Context<WithdrawUncommittedDeposit>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction = &ctx.accounts.auction_house;
        let sealed_bid = &mut ctx.accounts.sealed_bid;
        require_owner(&ctx.accounts.bidder.key(), &sealed_bid.bidder)?;
        sealed_bid.require_auction(&auction.key())?;

        let amount =
            settlement::withdraw_uncommitted(auction, sealed_bid, &mut ctx.accounts.vault, now)?;
        pay_from_escrow(
            &ctx.accounts.token_program,
            &ctx.accounts.escrow,
            &ctx.accounts.bidder_tokens,
            &ctx.accounts.vault,
            amount,
        )?;

        emit!(DepositWithdrawn {
            auction: auction.key(),
            bidder: sealed_bid.bidder,
            amount,
        });

        Ok(())
    }

    /// Reclaim a resolved sealed bid account's rent
    pub fn close_sealed_bid(ctx: Context<CloseSealedBid>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let auction = &ctx.accounts.auction_house;
        let sealed_bid = &ctx.accounts.sealed_bid;
        require_owner(&ctx.accounts.bidder.key(), &sealed_bid.bidder)?;
        sealed_bid.require_auction(&auction.key())?;

        settlement::ensure_closable(auction, sealed_bid, now)?;

        emit!(SealedBidClosed {
            auction: auction.key(),
            bidder: sealed_bid.bidder,
        });

        Ok(())
    }
}

///////////////////////
// Contexts
///////////////////////

#[derive(Accounts)]
#[instruction(auction_id: u64)]
pub struct CreateAuction<'info> {
    #[account(
        init,
        payer = authority,
        space = 8 + AuctionHouse::LEN,
        seeds = [AUCTION_SEED, authority.key().as_ref(), &auction_id.to_le_bytes()],
        bump
    )]
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        init,
        payer = authority,
        space = 8 + Vault::LEN,
        seeds = [VAULT_SEED, auction_house.key().as_ref()],
        bump
    )]
    pub vault: Account<'info, Vault>,

    pub bid_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = authority,
        token::mint = bid_mint,
        token::authority = vault,
        seeds = [ESCROW_SEED, vault.key().as_ref()],
        bump
    )]
    pub escrow: Account<'info, TokenAccount>,

    #[account(mut)]
    pub authority: Signer<'info>, // seller

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct InitializeSealedBid<'info> {
    #[account(mut)]
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        init,
        payer = bidder,
        space = 8 + SealedBid::LEN,
        seeds = [BID_SEED, auction_house.key().as_ref(), bidder.key().as_ref()],
        bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(mut)]
    pub bidder: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Primary-ledger submission; funds move into the escrow immediately
#[derive(Accounts)]
pub struct SubmitSealedBid<'info> {
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        mut,
        seeds = [BID_SEED, auction_house.key().as_ref(), bidder.key().as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(
        mut,
        seeds = [VAULT_SEED, auction_house.key().as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(mut, address = vault.escrow)]
    pub escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = bidder_tokens.mint == auction_house.bid_mint @ AuctionError::MintMismatch,
        constraint = bidder_tokens.owner == bidder.key() @ AuctionError::Unauthorized
    )]
    pub bidder_tokens: Account<'info, TokenAccount>,

    pub bidder: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

/// Submission executed by the delegated environment on the bid's private copy
#[derive(Accounts)]
pub struct SubmitSealedBidDelegated<'info> {
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        constraint = sealed_bid.environment == ExecutionEnvironment::Delegated @ AuctionError::AccountNotDelegated,
        seeds = [BID_SEED, auction_house.key().as_ref(), bidder.key().as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(
        mut,
        seeds = [DELEGATION_SEED, sealed_bid.key().as_ref()],
        bump = delegation_record.bump
    )]
    pub delegation_record: Account<'info, DelegationRecord>,

    #[account(
        mut,
        seeds = [VAULT_SEED, auction_house.key().as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(mut, address = vault.escrow)]
    pub escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = bidder_tokens.mint == auction_house.bid_mint @ AuctionError::MintMismatch,
        constraint = bidder_tokens.owner == bidder.key() @ AuctionError::Unauthorized
    )]
    pub bidder_tokens: Account<'info, TokenAccount>,

    pub bidder: Signer<'info>,
    pub validator: Signer<'info>, // delegated environment identity

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct DelegateBid<'info> {
    #[account(
        mut,
        seeds = [BID_SEED, sealed_bid.auction.as_ref(), bidder.key().as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(
        init,
        payer = bidder,
        space = 8 + DelegationRecord::LEN,
        seeds = [DELEGATION_SEED, sealed_bid.key().as_ref()],
        bump
    )]
    pub delegation_record: Account<'info, DelegationRecord>,

    /// CHECK: Identity of the environment receiving write authority; only its key is stored.
    pub validator: UncheckedAccount<'info>,

    #[account(mut)]
    pub bidder: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Submitted by the bound environment once private processing is done.
/// The sealed bid address is validated from `account_seeds` in the handler.
#[derive(Accounts)]
pub struct ProcessUndelegation<'info> {
    #[account(
        mut,
        constraint = sealed_bid.environment == ExecutionEnvironment::Delegated @ AuctionError::AccountNotDelegated
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(
        mut,
        close = bidder,
        seeds = [DELEGATION_SEED, sealed_bid.key().as_ref()],
        bump = delegation_record.bump
    )]
    pub delegation_record: Account<'info, DelegationRecord>,

    #[account(mut, address = delegation_record.bidder)]
    pub bidder: SystemAccount<'info>,

    pub validator: Signer<'info>,
}

#[derive(Accounts)]
pub struct CommitBid<'info> {
    #[account(mut)]
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        mut,
        seeds = [BID_SEED, auction_house.key().as_ref(), bidder.key().as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    pub bidder: Signer<'info>,
}

#[derive(Accounts)]
pub struct CommitBidDelegated<'info> {
    #[account(mut)]
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        constraint = sealed_bid.environment == ExecutionEnvironment::Delegated @ AuctionError::AccountNotDelegated,
        seeds = [BID_SEED, auction_house.key().as_ref(), bidder.key().as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(
        mut,
        seeds = [DELEGATION_SEED, sealed_bid.key().as_ref()],
        bump = delegation_record.bump
    )]
    pub delegation_record: Account<'info, DelegationRecord>,

    pub bidder: Signer<'info>,
    pub validator: Signer<'info>,
}

/// Permissionless: anyone may crank settlement once the auction has ended
#[derive(Accounts)]
pub struct SettleCommittedBid<'info> {
    #[account(mut)]
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        mut,
        seeds = [BID_SEED, sealed_bid.auction.as_ref(), sealed_bid.bidder.as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,
}

#[derive(Accounts)]
pub struct FinalizeAuction<'info> {
    #[account(
        mut,
        seeds = [
            AUCTION_SEED,
            auction_house.authority.as_ref(),
            &auction_house.auction_id.to_le_bytes()
        ],
        bump = auction_house.bump
    )]
    pub auction_house: Account<'info, AuctionHouse>,

    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct ClaimSellerProceeds<'info> {
    #[account(
        mut,
        seeds = [
            AUCTION_SEED,
            auction_house.authority.as_ref(),
            &auction_house.auction_id.to_le_bytes()
        ],
        bump = auction_house.bump
    )]
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        mut,
        seeds = [VAULT_SEED, auction_house.key().as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(mut, address = vault.escrow)]
    pub escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = seller_tokens.mint == auction_house.bid_mint @ AuctionError::MintMismatch,
        constraint = seller_tokens.owner == authority.key() @ AuctionError::Unauthorized
    )]
    pub seller_tokens: Account<'info, TokenAccount>,

    pub authority: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimRefund<'info> {
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        mut,
        seeds = [BID_SEED, auction_house.key().as_ref(), bidder.key().as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(
        mut,
        seeds = [VAULT_SEED, auction_house.key().as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(mut, address = vault.escrow)]
    pub escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = bidder_tokens.mint == auction_house.bid_mint @ AuctionError::MintMismatch,
        constraint = bidder_tokens.owner == bidder.key() @ AuctionError::Unauthorized
    )]
    pub bidder_tokens: Account<'info, TokenAccount>,

    pub bidder: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct WithdrawUncommittedDeposit<'info> {
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        mut,
        seeds = [BID_SEED, auction_house.key().as_ref(), bidder.key().as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(
        mut,
        seeds = [VAULT_SEED, auction_house.key().as_ref()],
        bump = vault.bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(mut, address = vault.escrow)]
    pub escrow: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = bidder_tokens.mint == auction_house.bid_mint @ AuctionError::MintMismatch,
        constraint = bidder_tokens.owner == bidder.key() @ AuctionError::Unauthorized
    )]
    pub bidder_tokens: Account<'info, TokenAccount>,

    pub bidder: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct CloseSealedBid<'info> {
    pub auction_house: Account<'info, AuctionHouse>,

    #[account(
        mut,
        close = bidder,
        seeds = [BID_SEED, auction_house.key().as_ref(), bidder.key().as_ref()],
        bump = sealed_bid.bump
    )]
    pub sealed_bid: Account<'info, SealedBid>,

    #[account(mut)]
    pub bidder: Signer<'info>,
}
