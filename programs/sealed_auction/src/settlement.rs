use anchor_lang::prelude::*;

use crate::auction::{AuctionHouse, AuctionPhase};
use crate::bid::{BidStatus, ExecutionEnvironment, SealedBid};
use crate::errors::AuctionError;
use crate::vault::Vault;

/// A bid amount together with the bidder who holds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Standing {
    pub amount: u64,
    pub bidder: Pubkey,
}

/// Max-merge of two standings under a total order: higher amount wins, equal
/// amounts go to the smaller bidder key. Commutative, associative and
/// idempotent, so replaying or reordering merges converges on one result.
pub fn merge_highest(current: Standing, candidate: Standing) -> Standing {
    let candidate_wins = candidate.amount > current.amount
        || (candidate.amount == current.amount
            && candidate.amount > 0
            && candidate.bidder < current.bidder);

    if candidate_wins {
        candidate
    } else {
        current
    }
}

/// Folds one committed bid into the auction's authoritative highest bid.
///
/// The stored highest bid may already include speculative commit-time
/// updates; merging is safe regardless because `merge_highest` only ever
/// moves towards the same maximum.
pub fn settle(auction: &mut AuctionHouse, bid: &mut SealedBid, now: i64) -> Result<()> {
    bid.require_environment(ExecutionEnvironment::Primary)?;
    auction.require_ended(now)?;
    require!(
        bid.status == BidStatus::Committed && bid.committed,
        AuctionError::BidNotCommitted
    );
    require!(!bid.settled, AuctionError::BidAlreadySettled);

    auction.record_settlement(bid.bidder, bid.amount)?;
    bid.settled = true;
    Ok(())
}

/// Releases a settled loser's deposit and returns the amount to transfer.
pub fn claim_refund(auction: &AuctionHouse, bid: &mut SealedBid, vault: &mut Vault) -> Result<u64> {
    bid.require_environment(ExecutionEnvironment::Primary)?;
    require!(bid.settled, AuctionError::BidNotSettled);
    require!(!auction.is_winner(&bid.bidder), AuctionError::WinnerNoRefund);
    require!(!bid.refund_claimed, AuctionError::RefundAlreadyClaimed);
    require!(bid.deposited > 0, AuctionError::NoRefundAvailable);

    let refund_amount = bid.deposited;
    vault.record_payout(refund_amount)?;
    bid.refund_claimed = true;
    Ok(refund_amount)
}

/// Returns a deposit that never entered the auction because its bid was not
/// committed before the end time. Committed bids are refunded through
/// settlement instead.
pub fn withdraw_uncommitted(
    auction: &AuctionHouse,
    bid: &mut SealedBid,
    vault: &mut Vault,
    now: i64,
) -> Result<u64> {
    bid.require_environment(ExecutionEnvironment::Primary)?;
    require!(
        auction.phase(now) != AuctionPhase::Open,
        AuctionError::AuctionActive
    );
    require!(
        !bid.committed && bid.status != BidStatus::Committed,
        AuctionError::BidAlreadyCommitted
    );
    require!(bid.deposited > 0, AuctionError::NoRefundAvailable);

    let amount = bid.deposited;
    vault.record_payout(amount)?;
    bid.deposited = 0;
    Ok(amount)
}

/// A bid account may be reclaimed once nothing it escrowed is still owed.
pub fn ensure_closable(auction: &AuctionHouse, bid: &SealedBid, now: i64) -> Result<()> {
    bid.require_environment(ExecutionEnvironment::Primary)?;

    let resolved = if !bid.committed {
        // never committed: the record can no longer commit once bidding is over
        auction.phase(now) != AuctionPhase::Open && bid.deposited == 0
    } else if !bid.settled {
        false
    } else if auction.is_winner(&bid.bidder) {
        auction.proceeds_claimed
    } else {
        bid.refund_claimed || bid.deposited == 0
    };
    require!(resolved, AuctionError::CloseNotAllowed);
    Ok(())
}
