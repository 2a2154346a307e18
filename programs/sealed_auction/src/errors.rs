use anchor_lang::prelude::*;

#[error_code]
pub enum AuctionError {
    // timing
    #[msg("Auction is still active")]
    AuctionActive,
    #[msg("Auction has ended")]
    AuctionEnded,
    #[msg("Auction not finalized")]
    AuctionNotFinalized,
    #[msg("Auction already finalized")]
    AuctionFinalized,

    // economic validation
    #[msg("Bid is below auction minimum")]
    BidBelowMinimum,
    #[msg("Bid increment is too small")]
    BidIncrementTooSmall,
    #[msg("Minimum bid must be greater than zero")]
    InvalidMinBid,
    #[msg("Duration must be greater than zero")]
    InvalidDuration,
    #[msg("Integer overflow")]
    MathOverflow,
    #[msg("Vault balance is insufficient")]
    InsufficientVaultBalance,

    // state machine
    #[msg("Cannot delegate this account in its current state")]
    CannotDelegate,
    #[msg("Bid account is not delegated")]
    AccountNotDelegated,
    #[msg("Bid account is delegated to the private environment")]
    AccountDelegated,
    #[msg("Operation was not signed by the environment holding write authority")]
    EnvironmentMismatch,
    #[msg("Bid account has no active submission")]
    BidNotActive,
    #[msg("Bid account has already been committed")]
    BidAlreadyCommitted,
    #[msg("Bid account is not committed")]
    BidNotCommitted,
    #[msg("Bid account has already been settled")]
    BidAlreadySettled,
    #[msg("Bid account has not been settled")]
    BidNotSettled,
    #[msg("There are unsettled committed bids")]
    UnsettledCommittedBids,
    #[msg("Bid account is linked to a different auction")]
    BidAuctionMismatch,
    #[msg("Bid account cannot be closed yet")]
    CloseNotAllowed,

    // claims
    #[msg("Seller proceeds have already been claimed")]
    ProceedsAlreadyClaimed,
    #[msg("No winning bid in this auction")]
    NoWinningBid,
    #[msg("Winner cannot claim refund")]
    WinnerNoRefund,
    #[msg("Refund already claimed")]
    RefundAlreadyClaimed,
    #[msg("No refundable amount available")]
    NoRefundAvailable,

    // accounts and addressing
    #[msg("Caller does not own this account")]
    Unauthorized,
    #[msg("Token account mint does not match the auction mint")]
    MintMismatch,
    #[msg("Seeds do not derive the target account address")]
    SeedMismatch,
    #[msg("No valid bump exists for these seeds")]
    AddressDerivationFailed,
    #[msg("Delegated bid snapshot could not be decoded")]
    InvalidSnapshot,
}
