/// PDA seed prefix for each auction account.
pub const AUCTION_SEED: &[u8] = b"auction";
/// PDA seed prefix for the per-auction vault.
pub const VAULT_SEED: &[u8] = b"vault";
/// PDA seed prefix for the vault's escrow token account.
pub const ESCROW_SEED: &[u8] = b"escrow";
/// PDA seed prefix for each bidder's sealed bid account.
pub const BID_SEED: &[u8] = b"bid";
/// PDA seed prefix for the delegation binding of a sealed bid.
pub const DELEGATION_SEED: &[u8] = b"delegation";
