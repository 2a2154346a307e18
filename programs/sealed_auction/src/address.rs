use anchor_lang::prelude::*;

use crate::constants::{AUCTION_SEED, BID_SEED, DELEGATION_SEED, ESCROW_SEED, VAULT_SEED};
use crate::errors::AuctionError;

/// Derives a program address and its bump from `seeds`.
///
/// The bump search is bounded; running out of candidates means the seed
/// scheme itself is wrong, so the error is not worth retrying.
pub fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(seeds, program_id)
        .ok_or_else(|| error!(AuctionError::AddressDerivationFailed))
}

/// Returns true when `seeds` derive exactly `target` under `program_id`.
pub fn seeds_match(seeds: &[&[u8]], program_id: &Pubkey, target: &Pubkey) -> bool {
    matches!(derive(seeds, program_id), Ok((address, _)) if address == *target)
}

pub fn auction_address(
    authority: &Pubkey,
    auction_id: u64,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive(
        &[AUCTION_SEED, authority.as_ref(), &auction_id.to_le_bytes()],
        program_id,
    )
}

pub fn vault_address(auction: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(&[VAULT_SEED, auction.as_ref()], program_id)
}

pub fn escrow_address(vault: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(&[ESCROW_SEED, vault.as_ref()], program_id)
}

pub fn sealed_bid_address(
    auction: &Pubkey,
    bidder: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive(&[BID_SEED, auction.as_ref(), bidder.as_ref()], program_id)
}

pub fn delegation_address(sealed_bid: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(&[DELEGATION_SEED, sealed_bid.as_ref()], program_id)
}

/// Seeds a caller passes to `process_undelegation` for a sealed bid.
pub fn sealed_bid_seeds(auction: &Pubkey, bidder: &Pubkey) -> Vec<Vec<u8>> {
    vec![
        BID_SEED.to_vec(),
        auction.as_ref().to_vec(),
        bidder.as_ref().to_vec(),
    ]
}
