#![allow(dead_code)]

use std::collections::HashMap;

use anchor_lang::prelude::*;
use sealed_auction::access::require_owner;
use sealed_auction::address;
use sealed_auction::auction::{AuctionHouse, AuctionTerms};
use sealed_auction::bid::{ExecutionEnvironment, SealedBid};
use sealed_auction::delegation::{self, DelegationRecord};
use sealed_auction::errors::AuctionError;
use sealed_auction::settlement;
use sealed_auction::vault::Vault;

pub const START: i64 = 1_700_000_000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub auctions: HashMap<Pubkey, AuctionHouse>,
    pub vaults: HashMap<Pubkey, Vault>,
    pub bids: HashMap<Pubkey, SealedBid>,
    pub delegations: HashMap<Pubkey, DelegationRecord>,
    /// Token balances keyed by wallet or escrow address.
    pub balances: HashMap<Pubkey, u64>,
}

/// In-memory ledger that drives the program's transitions the way the
/// instruction handlers do, one all-or-nothing transaction per call.
pub struct Ledger {
    pub state: LedgerState,
    pub now: i64,
    pub program_id: Pubkey,
}

fn missing() -> Error {
    ProgramError::UninitializedAccount.into()
}

fn move_tokens(state: &mut LedgerState, from: Pubkey, to: Pubkey, amount: u64) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let source = state.balances.entry(from).or_default();
    *source = source
        .checked_sub(amount)
        .ok_or(ProgramError::InsufficientFunds)?;
    let target = state.balances.entry(to).or_default();
    *target = target.checked_add(amount).ok_or(AuctionError::MathOverflow)?;
    Ok(())
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            state: LedgerState::default(),
            now: START,
            program_id: sealed_auction::ID,
        }
    }

    /// Applies `op` to a draft of the ledger and keeps the draft only on success.
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut LedgerState, i64, &Pubkey) -> Result<T>,
    ) -> Result<T> {
        let mut draft = self.state.clone();
        let out = op(&mut draft, self.now, &self.program_id)?;
        self.state = draft;
        Ok(out)
    }

    pub fn fund(&mut self, owner: Pubkey, amount: u64) {
        *self.state.balances.entry(owner).or_default() += amount;
    }

    pub fn balance(&self, owner: &Pubkey) -> u64 {
        self.state.balances.get(owner).copied().unwrap_or_default()
    }

    pub fn auction(&self, auction: &Pubkey) -> &AuctionHouse {
        &self.state.auctions[auction]
    }

    pub fn bid_address(&self, auction: &Pubkey, bidder: &Pubkey) -> Pubkey {
        address::sealed_bid_address(auction, bidder, &self.program_id)
            .unwrap()
            .0
    }

    pub fn bid(&self, auction: &Pubkey, bidder: &Pubkey) -> &SealedBid {
        &self.state.bids[&self.bid_address(auction, bidder)]
    }

    pub fn escrow_balance(&self, auction: &Pubkey) -> u64 {
        let (vault, _) = address::vault_address(auction, &self.program_id).unwrap();
        self.balance(&self.state.vaults[&vault].escrow)
    }

    pub fn create_auction(
        &mut self,
        seller: Pubkey,
        auction_id: u64,
        min_bid: u64,
        min_increment: u64,
        duration: i64,
    ) -> Result<Pubkey> {
        self.transact(|state, now, program_id| {
            let (auction_key, bump) = address::auction_address(&seller, auction_id, program_id)?;
            let (vault_key, vault_bump) = address::vault_address(&auction_key, program_id)?;
            let (escrow_key, _) = address::escrow_address(&vault_key, program_id)?;
            if state.auctions.contains_key(&auction_key) || state.vaults.contains_key(&vault_key) {
                return Err(ProgramError::AccountAlreadyInitialized.into());
            }

            let terms = AuctionTerms {
                auction_id,
                min_bid,
                min_increment,
                duration,
            };
            let mut auction = AuctionHouse::open(seller, Pubkey::default(), terms, now)?;
            auction.bump = bump;
            state.auctions.insert(auction_key, auction);
            state
                .vaults
                .insert(vault_key, Vault::new(auction_key, escrow_key, vault_bump));
            Ok(auction_key)
        })
    }

    pub fn initialize_sealed_bid(&mut self, auction_key: Pubkey, bidder: Pubkey) -> Result<Pubkey> {
        self.transact(|state, now, program_id| {
            let (bid_key, bump) = address::sealed_bid_address(&auction_key, &bidder, program_id)?;
            if state.bids.contains_key(&bid_key) {
                return Err(ProgramError::AccountAlreadyInitialized.into());
            }
            let auction = state.auctions.get_mut(&auction_key).ok_or_else(missing)?;
            auction.require_open(now)?;
            auction.register_bidder()?;
            state
                .bids
                .insert(bid_key, SealedBid::new(auction_key, bidder, bump));
            Ok(bid_key)
        })
    }

    pub fn submit(&mut self, auction_key: Pubkey, bidder: Pubkey, amount: u64) -> Result<u64> {
        let bid_key = self.bid_address(&auction_key, &bidder);
        self.submit_record(auction_key, bid_key, bidder, amount)
    }

    /// Submits against an explicitly chosen bid record.
    pub fn submit_record(
        &mut self,
        auction_key: Pubkey,
        bid_key: Pubkey,
        bidder: Pubkey,
        amount: u64,
    ) -> Result<u64> {
        self.transact(|state, now, program_id| {
            let (vault_key, _) = address::vault_address(&auction_key, program_id)?;
            let auction = state.auctions.get(&auction_key).ok_or_else(missing)?;
            let bid = state.bids.get_mut(&bid_key).ok_or_else(missing)?;
            require_owner(&bidder, &bid.bidder)?;
            bid.require_auction(&auction_key)?;

            let shortfall = bid.submit(auction, ExecutionEnvironment::Primary, amount, now)?;
            let vault = state.vaults.get_mut(&vault_key).ok_or_else(missing)?;
            vault.record_deposit(shortfall)?;
            let escrow = vault.escrow;
            move_tokens(state, bidder, escrow, shortfall)?;
            Ok(shortfall)
        })
    }

    pub fn submit_delegated(
        &mut self,
        auction_key: Pubkey,
        bidder: Pubkey,
        validator: Pubkey,
        amount: u64,
    ) -> Result<u64> {
        self.transact(|state, now, program_id| {
            let (bid_key, _) = address::sealed_bid_address(&auction_key, &bidder, program_id)?;
            let (vault_key, _) = address::vault_address(&auction_key, program_id)?;
            let bid = state.bids.get(&bid_key).ok_or_else(missing)?;
            require!(
                bid.environment == ExecutionEnvironment::Delegated,
                AuctionError::AccountNotDelegated
            );
            let auction = state.auctions.get(&auction_key).ok_or_else(missing)?;
            let (record_key, _) = address::delegation_address(&bid_key, program_id)?;
            let record = state.delegations.get_mut(&record_key).ok_or_else(missing)?;
            require_owner(&bidder, &record.bidder)?;
            record.require_validator(&validator)?;

            let shortfall = record.apply(|private| {
                private.require_auction(&auction_key)?;
                private.submit(auction, ExecutionEnvironment::Delegated, amount, now)
            })?;
            let vault = state.vaults.get_mut(&vault_key).ok_or_else(missing)?;
            vault.record_deposit(shortfall)?;
            let escrow = vault.escrow;
            move_tokens(state, bidder, escrow, shortfall)?;
            Ok(shortfall)
        })
    }

    pub fn delegate(&mut self, auction_key: Pubkey, bidder: Pubkey, validator: Pubkey) -> Result<()> {
        self.transact(|state, now, program_id| {
            let (bid_key, _) = address::sealed_bid_address(&auction_key, &bidder, program_id)?;
            let (record_key, record_bump) = address::delegation_address(&bid_key, program_id)?;
            if state.delegations.contains_key(&record_key) {
                return Err(ProgramError::AccountAlreadyInitialized.into());
            }
            let bid = state.bids.get_mut(&bid_key).ok_or_else(missing)?;
            require_owner(&bidder, &bid.bidder)?;
            let mut record = delegation::delegate(bid, bid_key, validator, now)?;
            record.bump = record_bump;
            state.delegations.insert(record_key, record);
            Ok(())
        })
    }

    pub fn undelegate(
        &mut self,
        validator: Pubkey,
        bid_key: Pubkey,
        account_seeds: Vec<Vec<u8>>,
    ) -> Result<()> {
        self.transact(|state, _, program_id| {
            let bid = state.bids.get(&bid_key).ok_or_else(missing)?;
            require!(
                bid.environment == ExecutionEnvironment::Delegated,
                AuctionError::AccountNotDelegated
            );
            let (record_key, _) = address::delegation_address(&bid_key, program_id)?;
            let record = state
                .delegations
                .remove(&record_key)
                .ok_or(AuctionError::AccountNotDelegated)?;
            record.require_validator(&validator)?;
            let restored = record.release(&bid_key, &account_seeds, program_id)?;
            state.bids.insert(bid_key, restored);
            Ok(())
        })
    }

    pub fn commit(&mut self, auction_key: Pubkey, bidder: Pubkey) -> Result<u64> {
        self.transact(|state, now, program_id| {
            let (bid_key, _) = address::sealed_bid_address(&auction_key, &bidder, program_id)?;
            let auction = state.auctions.get_mut(&auction_key).ok_or_else(missing)?;
            let bid = state.bids.get_mut(&bid_key).ok_or_else(missing)?;
            require_owner(&bidder, &bid.bidder)?;
            bid.require_auction(&auction_key)?;
            bid.commit(auction, ExecutionEnvironment::Primary, now)
        })
    }

    pub fn commit_delegated(
        &mut self,
        auction_key: Pubkey,
        bidder: Pubkey,
        validator: Pubkey,
    ) -> Result<u64> {
        self.transact(|state, now, program_id| {
            let (bid_key, _) = address::sealed_bid_address(&auction_key, &bidder, program_id)?;
            let bid = state.bids.get(&bid_key).ok_or_else(missing)?;
            require!(
                bid.environment == ExecutionEnvironment::Delegated,
                AuctionError::AccountNotDelegated
            );
            let auction = state.auctions.get_mut(&auction_key).ok_or_else(missing)?;
            let (record_key, _) = address::delegation_address(&bid_key, program_id)?;
            let record = state.delegations.get_mut(&record_key).ok_or_else(missing)?;
            require_owner(&bidder, &record.bidder)?;
            record.require_validator(&validator)?;
            record.apply(|private| {
                private.require_auction(&auction_key)?;
                private.commit(auction, ExecutionEnvironment::Delegated, now)
            })
        })
    }

    pub fn settle(&mut self, auction_key: Pubkey, bidder: Pubkey) -> Result<()> {
        let bid_key = self.bid_address(&auction_key, &bidder);
        self.settle_record(auction_key, bid_key)
    }

    /// Settles an explicitly chosen bid record; settlement is permissionless.
    pub fn settle_record(&mut self, auction_key: Pubkey, bid_key: Pubkey) -> Result<()> {
        self.transact(|state, now, _| {
            let auction = state.auctions.get_mut(&auction_key).ok_or_else(missing)?;
            let bid = state.bids.get_mut(&bid_key).ok_or_else(missing)?;
            bid.require_auction(&auction_key)?;
            settlement::settle(auction, bid, now)
        })
    }

    pub fn finalize(&mut self, caller: Pubkey, auction_key: Pubkey) -> Result<()> {
        self.transact(|state, now, _| {
            let auction = state.auctions.get_mut(&auction_key).ok_or_else(missing)?;
            require_owner(&caller, &auction.authority)?;
            auction.finalize(now)
        })
    }

    pub fn claim_proceeds(&mut self, caller: Pubkey, auction_key: Pubkey) -> Result<u64> {
        self.transact(|state, _, program_id| {
            let (vault_key, _) = address::vault_address(&auction_key, program_id)?;
            let auction = state.auctions.get_mut(&auction_key).ok_or_else(missing)?;
            require_owner(&caller, &auction.authority)?;
            let amount = auction.claim_proceeds()?;
            let vault = state.vaults.get_mut(&vault_key).ok_or_else(missing)?;
            vault.record_payout(amount)?;
            let escrow = vault.escrow;
            move_tokens(state, escrow, caller, amount)?;
            Ok(amount)
        })
    }

    pub fn claim_refund(&mut self, auction_key: Pubkey, bidder: Pubkey) -> Result<u64> {
        self.transact(|state, _, program_id| {
            let (bid_key, _) = address::sealed_bid_address(&auction_key, &bidder, program_id)?;
            let (vault_key, _) = address::vault_address(&auction_key, program_id)?;
            let auction = state.auctions.get(&auction_key).ok_or_else(missing)?;
            let bid = state.bids.get_mut(&bid_key).ok_or_else(missing)?;
            require_owner(&bidder, &bid.bidder)?;
            bid.require_auction(&auction_key)?;
            let vault = state.vaults.get_mut(&vault_key).ok_or_else(missing)?;
            let amount = settlement::claim_refund(auction, bid, vault)?;
            let escrow = vault.escrow;
            move_tokens(state, escrow, bidder, amount)?;
            Ok(amount)
        })
    }

    pub fn withdraw_uncommitted(&mut self, auction_key: Pubkey, bidder: Pubkey) -> Result<u64> {
        self.transact(|state, now, program_id| {
            let (bid_key, _) = address::sealed_bid_address(&auction_key, &bidder, program_id)?;
            let (vault_key, _) = address::vault_address(&auction_key, program_id)?;
            let auction = state.auctions.get(&auction_key).ok_or_else(missing)?;
            let bid = state.bids.get_mut(&bid_key).ok_or_else(missing)?;
            require_owner(&bidder, &bid.bidder)?;
            bid.require_auction(&auction_key)?;
            let vault = state.vaults.get_mut(&vault_key).ok_or_else(missing)?;
            let amount = settlement::withdraw_uncommitted(auction, bid, vault, now)?;
            let escrow = vault.escrow;
            move_tokens(state, escrow, bidder, amount)?;
            Ok(amount)
        })
    }

    pub fn close(&mut self, auction_key: Pubkey, bidder: Pubkey) -> Result<()> {
        self.transact(|state, now, program_id| {
            let (bid_key, _) = address::sealed_bid_address(&auction_key, &bidder, program_id)?;
            let auction = state.auctions.get(&auction_key).ok_or_else(missing)?;
            let bid = state.bids.get(&bid_key).ok_or_else(missing)?;
            require_owner(&bidder, &bid.bidder)?;
            bid.require_auction(&auction_key)?;
            settlement::ensure_closable(auction, bid, now)?;
            state.bids.remove(&bid_key);
            Ok(())
        })
    }
}
