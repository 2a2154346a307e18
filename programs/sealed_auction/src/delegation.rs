use anchor_lang::prelude::*;

use crate::address;
use crate::bid::{BidStatus, ExecutionEnvironment, SealedBid};
use crate::errors::AuctionError;

/// Binding between a sealed bid and the environment holding its write authority.
///
/// Delegating freezes the primary copy and moves a byte snapshot into this
/// record. Operations signed by the bound environment run on the snapshot, and
/// undelegation writes it back over the primary copy.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct DelegationRecord {
    pub sealed_bid: Pubkey,
    pub bidder: Pubkey,
    pub validator: Pubkey, // identity of the delegated environment
    pub delegated_at: i64,
    pub buffer: Vec<u8>,   // the delegated copy of the sealed bid
    pub bump: u8,
}

impl DelegationRecord {
    pub const LEN: usize = 32  // sealed_bid
        + 32                   // bidder
        + 32                   // validator
        + 8                    // delegated_at
        + 4 + SealedBid::LEN   // buffer
        + 1;                   // bump

    /// Only the bound environment may act on the delegated copy.
    pub fn require_validator(&self, signer: &Pubkey) -> Result<()> {
        require_keys_eq!(*signer, self.validator, AuctionError::EnvironmentMismatch);
        Ok(())
    }

    pub fn load(&self) -> Result<SealedBid> {
        let bid = decode(&self.buffer)?;
        require!(
            bid.environment == ExecutionEnvironment::Delegated,
            AuctionError::InvalidSnapshot
        );
        Ok(bid)
    }

    pub fn store(&mut self, bid: &SealedBid) -> Result<()> {
        self.buffer = encode(bid)?;
        Ok(())
    }

    /// Runs `op` against the delegated copy and keeps its result only on success.
    pub fn apply<T>(&mut self, op: impl FnOnce(&mut SealedBid) -> Result<T>) -> Result<T> {
        let mut bid = self.load()?;
        let out = op(&mut bid)?;
        self.store(&bid)?;
        Ok(out)
    }

    /// Verifies the caller's seeds and returns the state to write back to the
    /// primary ledger.
    pub fn release(
        &self,
        target: &Pubkey,
        account_seeds: &[Vec<u8>],
        program_id: &Pubkey,
    ) -> Result<SealedBid> {
        let seeds: Vec<&[u8]> = account_seeds.iter().map(Vec::as_slice).collect();
        require!(
            address::seeds_match(&seeds, program_id, target),
            AuctionError::SeedMismatch
        );
        require_keys_eq!(self.sealed_bid, *target, AuctionError::AccountNotDelegated);

        let mut bid = self.load()?;
        bid.environment = ExecutionEnvironment::Primary;
        Ok(bid)
    }
}

/// Freezes `bid` on the primary ledger and returns the binding that carries
/// its delegated copy.
pub fn delegate(
    bid: &mut SealedBid,
    sealed_bid: Pubkey,
    validator: Pubkey,
    now: i64,
) -> Result<DelegationRecord> {
    require!(
        bid.environment == ExecutionEnvironment::Primary,
        AuctionError::CannotDelegate
    );
    require!(
        matches!(bid.status, BidStatus::Ready | BidStatus::Active),
        AuctionError::CannotDelegate
    );

    let mut frozen = bid.clone();
    frozen.environment = ExecutionEnvironment::Delegated;
    let buffer = encode(&frozen)?;
    *bid = frozen;

    Ok(DelegationRecord {
        sealed_bid,
        bidder: bid.bidder,
        validator,
        delegated_at: now,
        buffer,
        bump: 0,
    })
}

pub fn encode(bid: &SealedBid) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(SealedBid::LEN);
    bid.serialize(&mut bytes)
        .map_err(|_| error!(AuctionError::InvalidSnapshot))?;
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<SealedBid> {
    SealedBid::try_from_slice(bytes).map_err(|_| error!(AuctionError::InvalidSnapshot))
}
