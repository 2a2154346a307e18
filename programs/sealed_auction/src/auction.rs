use anchor_lang::prelude::*;

use crate::errors::AuctionError;
use crate::settlement::{merge_highest, Standing};

/// Terms a seller fixes when opening an auction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuctionTerms {
    pub auction_id: u64,
    pub min_bid: u64,
    pub min_increment: u64,
    pub duration: i64,
}

/// Aggregate terms and running state of one auction.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct AuctionHouse {
    pub authority: Pubkey,        // seller
    pub auction_id: u64,          // unique per authority
    pub bid_mint: Pubkey,         // SPL mint bids are paid in
    pub min_bid: u64,
    pub min_increment: u64,
    pub highest_bid: u64,         // non-decreasing
    pub winner: Pubkey,           // default until highest_bid > 0
    pub end_time: i64,
    pub bidder_count: u32,
    pub committed_count: u32,
    pub settled_count: u32,
    pub finalized: bool,
    pub proceeds_claimed: bool,
    pub bump: u8,
}

impl AuctionHouse {
    pub const LEN: usize = 32  // authority
        + 8                    // auction_id
        + 32                   // bid_mint
        + 8                    // min_bid
        + 8                    // min_increment
        + 8                    // highest_bid
        + 32                   // winner
        + 8                    // end_time
        + 4                    // bidder_count
        + 4                    // committed_count
        + 4                    // settled_count
        + 1                    // finalized
        + 1                    // proceeds_claimed
        + 1;                   // bump

    pub fn open(authority: Pubkey, bid_mint: Pubkey, terms: AuctionTerms, now: i64) -> Result<Self> {
        require!(terms.duration > 0, AuctionError::InvalidDuration);
        require!(terms.min_bid > 0, AuctionError::InvalidMinBid);
        let end_time = now
            .checked_add(terms.duration)
            .ok_or(AuctionError::MathOverflow)?;

        Ok(Self {
            authority,
            auction_id: terms.auction_id,
            bid_mint,
            min_bid: terms.min_bid,
            min_increment: terms.min_increment,
            highest_bid: 0,
            winner: Pubkey::default(),
            end_time,
            bidder_count: 0,
            committed_count: 0,
            settled_count: 0,
            finalized: false,
            proceeds_claimed: false,
            bump: 0,
        })
    }

    pub fn phase(&self, now: i64) -> AuctionPhase {
        if self.finalized {
            AuctionPhase::Finalized
        } else if now < self.end_time {
            AuctionPhase::Open
        } else {
            AuctionPhase::Ended
        }
    }

    /// Bidding operations are only accepted while the auction is open.
    pub fn require_open(&self, now: i64) -> Result<()> {
        match self.phase(now) {
            AuctionPhase::Open => Ok(()),
            AuctionPhase::Ended => err!(AuctionError::AuctionEnded),
            AuctionPhase::Finalized => err!(AuctionError::AuctionFinalized),
        }
    }

    /// Settlement runs after the end time and before finalization.
    pub fn require_ended(&self, now: i64) -> Result<()> {
        match self.phase(now) {
            AuctionPhase::Ended => Ok(()),
            AuctionPhase::Open => err!(AuctionError::AuctionActive),
            AuctionPhase::Finalized => err!(AuctionError::AuctionFinalized),
        }
    }

    pub fn standing(&self) -> Standing {
        Standing {
            amount: self.highest_bid,
            bidder: self.winner,
        }
    }

    pub fn is_winner(&self, bidder: &Pubkey) -> bool {
        self.highest_bid > 0 && self.winner == *bidder
    }

    /// Smallest amount a commit may lock in right now.
    pub fn commit_threshold(&self) -> Result<u64> {
        if self.highest_bid == 0 {
            return Ok(self.min_bid);
        }
        let over_highest = self
            .highest_bid
            .checked_add(self.min_increment)
            .ok_or(AuctionError::MathOverflow)?;
        Ok(over_highest.max(self.min_bid))
    }

    pub fn register_bidder(&mut self) -> Result<()> {
        self.bidder_count = self
            .bidder_count
            .checked_add(1)
            .ok_or(AuctionError::MathOverflow)?;
        Ok(())
    }

    /// Counts a commit and provisionally raises the standing bid.
    pub fn record_commit(&mut self, bidder: Pubkey, amount: u64) -> Result<()> {
        let committed_count = self
            .committed_count
            .checked_add(1)
            .ok_or(AuctionError::MathOverflow)?;

        self.committed_count = committed_count;
        self.apply(merge_highest(self.standing(), Standing { amount, bidder }));
        Ok(())
    }

    /// Counts a settlement and folds the settled bid into the standing bid.
    pub fn record_settlement(&mut self, bidder: Pubkey, amount: u64) -> Result<()> {
        let settled_count = self
            .settled_count
            .checked_add(1)
            .ok_or(AuctionError::MathOverflow)?;

        self.settled_count = settled_count;
        self.apply(merge_highest(self.standing(), Standing { amount, bidder }));
        Ok(())
    }

    pub fn finalize(&mut self, now: i64) -> Result<()> {
        require!(!self.finalized, AuctionError::AuctionFinalized);
        require!(now >= self.end_time, AuctionError::AuctionActive);
        require!(
            self.settled_count == self.committed_count,
            AuctionError::UnsettledCommittedBids
        );

        self.finalized = true;
        Ok(())
    }

    /// Marks proceeds claimed and returns the amount owed to the seller.
    pub fn claim_proceeds(&mut self) -> Result<u64> {
        require!(self.finalized, AuctionError::AuctionNotFinalized);
        require!(!self.proceeds_claimed, AuctionError::ProceedsAlreadyClaimed);
        require!(self.highest_bid > 0, AuctionError::NoWinningBid);

        self.proceeds_claimed = true;
        Ok(self.highest_bid)
    }

    fn apply(&mut self, standing: Standing) {
        self.highest_bid = standing.amount;
        self.winner = standing.bidder;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionPhase {
    Open,
    Ended,
    Finalized,
}
