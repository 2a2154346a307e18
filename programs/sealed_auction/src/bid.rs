use anchor_lang::prelude::*;

use crate::auction::AuctionHouse;
use crate::errors::AuctionError;

/// Lifecycle of an individual bidder's private bid account.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BidStatus {
    #[default]
    Ready,
    Active,
    Committed,
}

/// Where write authority over a sealed bid currently lives.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionEnvironment {
    #[default]
    Primary,
    Delegated,
}

/// Bidder-specific sealed bid state.
#[account]
#[derive(Default, Debug, PartialEq, Eq)]
pub struct SealedBid {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub amount: u64,    // declared amount
    pub deposited: u64, // escrowed in the vault
    pub status: BidStatus,
    pub environment: ExecutionEnvironment,
    pub committed: bool,
    pub settled: bool,
    pub refund_claimed: bool,
    pub bump: u8,
}

impl SealedBid {
    pub const LEN: usize = 32 + 32 + 8 + 8 + 1 + 1 + 1 + 1 + 1 + 1;

    pub fn new(auction: Pubkey, bidder: Pubkey, bump: u8) -> Self {
        Self {
            auction,
            bidder,
            bump,
            ..Self::default()
        }
    }

    /// Every operation names the environment it runs in; a mismatch fails closed.
    pub fn require_environment(&self, env: ExecutionEnvironment) -> Result<()> {
        match (self.environment, env) {
            (held, running) if held == running => Ok(()),
            (ExecutionEnvironment::Delegated, _) => err!(AuctionError::AccountDelegated),
            (ExecutionEnvironment::Primary, _) => err!(AuctionError::AccountNotDelegated),
        }
    }

    pub fn require_auction(&self, auction: &Pubkey) -> Result<()> {
        require_keys_eq!(self.auction, *auction, AuctionError::BidAuctionMismatch);
        Ok(())
    }

    /// Declares `amount` and returns the shortfall that must move into the vault.
    ///
    /// A repeat submission has to raise the declared amount by at least the
    /// auction's increment; only the difference to what is already escrowed
    /// is charged.
    pub fn submit(
        &mut self,
        auction: &AuctionHouse,
        env: ExecutionEnvironment,
        amount: u64,
        now: i64,
    ) -> Result<u64> {
        self.require_environment(env)?;
        auction.require_open(now)?;
        require!(
            self.status != BidStatus::Committed,
            AuctionError::BidAlreadyCommitted
        );
        require!(amount >= auction.min_bid, AuctionError::BidBelowMinimum);

        if self.status == BidStatus::Active {
            let required_min = self
                .amount
                .checked_add(auction.min_increment)
                .ok_or(AuctionError::MathOverflow)?;
            require!(amount >= required_min, AuctionError::BidIncrementTooSmall);
        }

        let shortfall = amount.saturating_sub(self.deposited);
        let deposited = self
            .deposited
            .checked_add(shortfall)
            .ok_or(AuctionError::MathOverflow)?;

        self.amount = amount;
        self.deposited = deposited;
        self.status = BidStatus::Active;
        Ok(shortfall)
    }

    /// Locks the declared amount into the auction's running state.
    ///
    /// Both commit entry points run this transition; they differ only in the
    /// environment they claim to execute in.
    pub fn commit(
        &mut self,
        auction: &mut AuctionHouse,
        env: ExecutionEnvironment,
        now: i64,
    ) -> Result<u64> {
        self.require_environment(env)?;
        auction.require_open(now)?;
        match self.status {
            BidStatus::Active => {}
            BidStatus::Committed => return err!(AuctionError::BidAlreadyCommitted),
            BidStatus::Ready => return err!(AuctionError::BidNotActive),
        }
        require!(self.amount >= auction.min_bid, AuctionError::BidBelowMinimum);
        require!(
            self.amount >= auction.commit_threshold()?,
            AuctionError::BidIncrementTooSmall
        );

        auction.record_commit(self.bidder, self.amount)?;
        self.committed = true;
        self.status = BidStatus::Committed;
        Ok(self.amount)
    }
}
