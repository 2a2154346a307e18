use anchor_lang::prelude::*;

#[event]
pub struct AuctionCreated {
    pub auction: Pubkey,
    pub authority: Pubkey,
    pub auction_id: u64,
    pub bid_mint: Pubkey,
    pub min_bid: u64,
    pub min_increment: u64,
    pub ends_at: i64,
}

#[event]
pub struct BidderRegistered {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub bidder_count: u32,
}

/// Amount fields are `None` when the submission happened inside the delegated
/// environment. The escrow top-up is still a visible token transfer there.
#[event]
pub struct BidSubmitted {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub amount: Option<u64>,
    pub deposited_delta: Option<u64>,
}

impl BidSubmitted {
    pub fn primary(auction: Pubkey, bidder: Pubkey, amount: u64, deposited_delta: u64) -> Self {
        Self {
            auction,
            bidder,
            amount: Some(amount),
            deposited_delta: Some(deposited_delta),
        }
    }

    pub fn delegated(auction: Pubkey, bidder: Pubkey) -> Self {
        Self {
            auction,
            bidder,
            amount: None,
            deposited_delta: None,
        }
    }
}

#[event]
pub struct BidDelegated {
    pub sealed_bid: Pubkey,
    pub bidder: Pubkey,
    pub validator: Pubkey,
}

#[event]
pub struct BidUndelegated {
    pub sealed_bid: Pubkey,
    pub bidder: Pubkey,
    pub validator: Pubkey,
}

#[event]
pub struct BidCommitted {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub amount: u64,
    pub delegated: bool,
}

#[event]
pub struct BidSettled {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub amount: u64,
    pub current_highest_bid: u64,
    pub current_winner: Pubkey,
}

#[event]
pub struct AuctionFinalized {
    pub auction: Pubkey,
    pub winner: Pubkey,
    pub final_bid: u64,
}

#[event]
pub struct SellerProceedsClaimed {
    pub auction: Pubkey,
    pub authority: Pubkey,
    pub amount: u64,
}

#[event]
pub struct RefundClaimed {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub amount: u64,
}

#[event]
pub struct DepositWithdrawn {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub amount: u64,
}

#[event]
pub struct SealedBidClosed {
    pub auction: Pubkey,
    pub bidder: Pubkey,
}
