use anchor_lang::prelude::*;

use crate::errors::AuctionError;

/// Capability check: the calling identity must be the record's stored owner.
pub fn require_owner(caller: &Pubkey, owner: &Pubkey) -> Result<()> {
    require_keys_eq!(*caller, *owner, AuctionError::Unauthorized);
    Ok(())
}
