use near_contract_standards::fungible_token::receiver::FungibleTokenReceiver;
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::collections::{LookupMap, LookupSet};
use near_sdk::json_types::U128;
use near_sdk::serde::Deserialize;
use near_sdk::{
    env, near_bindgen, AccountId, Balance, FunctionError, PanicOnDefault, Promise,
    PromiseOrValue, StorageUsage,
};

use cost::storage_cost;
use poll_types::{ChoiceType, OptionId, PollSettings, RewardPolicy};

pub use crate::errors::*;
pub use crate::payout::PayoutKind;
use crate::payout::Payout;
pub use crate::storage::*;
use crate::events::*;

mod errors;
mod events;
mod payout;
pub mod settlement;
mod storage;

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Contract {
    /// Account authorized to schedule, start, finish and resolve the poll.
    pub authority: AccountId,
    /// Receives vote payments under the `ToManager` policy. Set at initialization.
    pub manager: AccountId,
    pub settings: PollSettings,
    pub options: Vec<String>,
    pub window: Window,
    pub outcome: QuizOutcome,
    /// sum of all accepted vote weight.
    pub total_votes: Balance,
    /// accumulated weight per option, indexed by `OptionId`.
    pub option_votes: Vec<Balance>,
    /// (voter, option) -> weight the voter put on the option.
    pub(crate) user_votes: LookupMap<(AccountId, OptionId), Balance>,
    /// accounts which voted at least once.
    pub(crate) voters: LookupSet<AccountId>,
    /// accounts which claimed their quiz reward.
    pub(crate) claimed: LookupSet<AccountId>,
    /// failed payouts, withdrawable by their receiver.
    pub(crate) owed: LookupMap<AccountId, Balance>,
    /// NEAR prepaid for the storage of token votes.
    pub(crate) storage_deposits: LookupMap<AccountId, Balance>,
}

/// Message attached to `ft_transfer_call` when voting with tokens.
#[derive(Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub struct TokenVoteMsg {
    pub option_id: OptionId,
}

// Implement the contract structure
#[near_bindgen]
impl Contract {
    /// @authority: poll administrator.
    /// @manager: receiver of payments for the `ToManager` policy. Defaults to the predecessor,
    ///   which is the factory when the poll is created through it.
    /// Panics if the settings or options are not valid.
    #[init]
    pub fn new(
        authority: AccountId,
        manager: Option<AccountId>,
        settings: PollSettings,
        options: Vec<String>,
    ) -> Self {
        if let Err(e) = settings.validate(&options) {
            e.panic();
        }
        Self {
            authority,
            manager: manager.unwrap_or_else(env::predecessor_account_id),
            settings,
            option_votes: vec![0; options.len()],
            options,
            window: Window::Unscheduled,
            outcome: QuizOutcome::Unresolved,
            total_votes: 0,
            user_votes: LookupMap::new(StorageKey::UserVotes),
            voters: LookupSet::new(StorageKey::Voters),
            claimed: LookupSet::new(StorageKey::Claimed),
            owed: LookupMap::new(StorageKey::Owed),
            storage_deposits: LookupMap::new(StorageKey::StorageDeposits),
        }
    }

    /**********
     * QUERIES
     **********/

    pub fn settings(&self) -> PollSettings {
        self.settings.clone()
    }

    /// Option labels. Index in the list is the `OptionId`.
    pub fn options(&self) -> Vec<String> {
        self.options.clone()
    }

    pub fn authority(&self) -> AccountId {
        self.authority.clone()
    }

    pub fn manager(&self) -> AccountId {
        self.manager.clone()
    }

    /// Start time in milliseconds, if set.
    pub fn start(&self) -> Option<u64> {
        self.window.start()
    }

    /// Finish time in milliseconds, if set.
    pub fn finish(&self) -> Option<u64> {
        self.window.finish()
    }

    pub fn status(&self) -> Status {
        self.window.status(env::block_timestamp_ms())
    }

    /// Returns the winning option once the quiz is resolved.
    pub fn quiz_result(&self) -> Option<OptionId> {
        self.outcome.winner()
    }

    /// Part of the losing stake split among the winners, once the quiz is resolved.
    pub fn winners_pool(&self) -> Option<U128> {
        match self.outcome {
            QuizOutcome::Unresolved => None,
            QuizOutcome::Resolved { winners_pool, .. } => Some(U128(winners_pool)),
        }
    }

    pub fn option_votes(&self) -> Vec<U128> {
        self.option_votes.iter().map(|v| U128(*v)).collect()
    }

    pub fn total_votes(&self) -> U128 {
        U128(self.total_votes)
    }

    /// Weight `account` put on each option.
    pub fn user_votes(&self, account: AccountId) -> Vec<U128> {
        (0..self.options.len() as OptionId)
            .map(|o| U128(self.user_stake(&account, o)))
            .collect()
    }

    pub fn has_voted(&self, account: AccountId) -> bool {
        self.voters.contains(&account)
    }

    pub fn has_claimed(&self, account: AccountId) -> bool {
        self.claimed.contains(&account)
    }

    /// Reward `account` would get from `claim_reward` now. Returns None if there is nothing
    /// to claim yet, the account already claimed, or did not vote.
    pub fn expected_reward(&self, account: AccountId) -> Option<U128> {
        match self.outcome {
            QuizOutcome::Resolved {
                winner,
                winners_pool,
                winning_stake,
            } if self.voters.contains(&account) && !self.claimed.contains(&account) => {
                let stake = self.user_stake(&account, winner);
                settlement::reward_share(winners_pool, winning_stake, stake).map(U128)
            }
            _ => None,
        }
    }

    /// Storage cost in yoctoNEAR of a vote of `account` for `option_id`. Native votes attach
    /// it on top of the stake, token votes take it from the `storage_deposit` balance.
    /// In a quiz the first vote also pays for the claim record.
    pub fn vote_storage_cost(&self, account: AccountId, option_id: OptionId) -> U128 {
        let new_entry = !self.user_votes.contains_key(&(account.clone(), option_id));
        U128(storage_cost(self.vote_storage(&account, new_entry)))
    }

    /// Prepaid storage balance of `account_id`.
    pub fn storage_balance_of(&self, account_id: AccountId) -> U128 {
        U128(self.storage_deposits.get(&account_id).unwrap_or(0))
    }

    /**********
     * AUTHORITY
     **********/

    /// Sets the voting window. `start` and `finish` are unix time in milliseconds.
    /// Can be called only once, and only if the poll was not started.
    #[handle_result]
    pub fn schedule(&mut self, start: u64, finish: u64) -> Result<(), PollError> {
        self.assert_authority()?;
        match self.window {
            Window::Unscheduled => (),
            Window::Open { .. } => return Err(PollError::AlreadyStarted),
            Window::Bounded { .. } => return Err(PollError::AlreadyScheduled),
        }
        if start >= finish || finish <= env::block_timestamp_ms() {
            return Err(PollError::InvalidWindow);
        }
        self.window = Window::Bounded { start, finish };
        emit_scheduled(start, finish);
        Ok(())
    }

    /// Opens voting now. Fails if the start was already set.
    #[handle_result]
    pub fn start_poll(&mut self) -> Result<(), PollError> {
        self.assert_authority()?;
        match self.window {
            Window::Unscheduled => {
                let start = env::block_timestamp_ms();
                self.window = Window::Open { start };
                emit_started(start);
                Ok(())
            }
            Window::Open { .. } => Err(PollError::AlreadyStarted),
            Window::Bounded { .. } => Err(PollError::AlreadyScheduled),
        }
    }

    /// Closes voting now. Fails if the poll was not started or the finish was already set.
    #[handle_result]
    pub fn finish_poll(&mut self) -> Result<(), PollError> {
        self.assert_authority()?;
        match self.window {
            Window::Unscheduled => Err(PollError::NotStarted),
            Window::Open { start } => {
                let finish = env::block_timestamp_ms();
                self.window = Window::Bounded { start, finish };
                emit_finished(finish);
                Ok(())
            }
            Window::Bounded { .. } => Err(PollError::AlreadyFinished),
        }
    }

    /// Declares the correct quiz option and pays the authority cut.
    /// Can be called only once, after the poll is finished. Returns the authority cut.
    #[handle_result]
    pub fn finalize_result(&mut self, result_id: OptionId) -> Result<U128, PollError> {
        self.assert_authority()?;
        self.assert_quiz()?;
        if !self.window.is_finished(env::block_timestamp_ms()) {
            return Err(PollError::NotFinished);
        }
        if self.outcome != QuizOutcome::Unresolved {
            return Err(PollError::AlreadyResolved);
        }
        let winning_stake = self.option_votes[self.option_idx(result_id)?];
        let s = settlement::settle(self.total_votes, winning_stake).ok_or(PollError::Overflow)?;

        self.outcome = QuizOutcome::Resolved {
            winner: result_id,
            winners_pool: s.winners_pool,
            winning_stake,
        };
        emit_result_finalized(result_id, s.winners_pool, s.authority_cut);

        if s.authority_cut > 0 {
            Payout::new(self.authority.clone(), s.authority_cut, PayoutKind::AuthorityCut)
                .send(&self.settings.asset);
        }
        Ok(U128(s.authority_cut))
    }

    #[handle_result]
    pub fn transfer_authority(&mut self, new_authority: AccountId) -> Result<(), PollError> {
        self.assert_authority()?;
        emit_authority_transferred(&self.authority, &new_authority);
        self.authority = new_authority;
        Ok(())
    }

    /**********
     * VOTERS
     **********/

    /// Votes for `option_id` with the attached NEAR. The deposit must cover
    /// `vote_storage_cost` and the price. In a paid poll the rest of the deposit is the
    /// vote weight and repeated votes add up. In a free poll each vote counts as 1,
    /// once per option.
    #[payable]
    #[handle_result]
    pub fn vote(&mut self, option_id: OptionId) -> Result<(), PollError> {
        if self.settings.token().is_some() {
            return Err(PollError::WrongAsset);
        }
        let payout = self.record_vote(
            env::predecessor_account_id(),
            option_id,
            env::attached_deposit(),
        )?;
        if let Some(p) = payout {
            p.send(&self.settings.asset);
        }
        Ok(())
    }

    /// Prepays the storage of token votes of `account_id`, the caller by default.
    /// A new balance record takes its own storage out of the deposit.
    /// Returns the storage balance.
    #[payable]
    #[handle_result]
    pub fn storage_deposit(&mut self, account_id: Option<AccountId>) -> Result<U128, PollError> {
        if self.settings.token().is_none() {
            return Err(PollError::WrongAsset);
        }
        let account = account_id.unwrap_or_else(env::predecessor_account_id);
        let mut deposit = env::attached_deposit();
        let balance = match self.storage_deposits.get(&account) {
            Some(b) => b,
            None => {
                let record = storage_cost(balance_entry_storage(&account));
                deposit = deposit
                    .checked_sub(record)
                    .ok_or(PollError::InsufficientDeposit(record))?;
                0
            }
        };
        let balance = balance.checked_add(deposit).ok_or(PollError::Overflow)?;
        self.storage_deposits.insert(&account, &balance);
        Ok(U128(balance))
    }

    /// Returns the unused storage balance of the caller. The balance record is kept.
    #[handle_result]
    pub fn storage_withdraw(&mut self) -> Result<Promise, PollError> {
        let caller = env::predecessor_account_id();
        let balance = self.storage_deposits.get(&caller).unwrap_or(0);
        if balance == 0 {
            return Err(PollError::NothingOwed);
        }
        self.storage_deposits.insert(&caller, &0);
        Ok(Promise::new(caller).transfer(balance))
    }

    /// Claims the quiz reward of the caller: a pro rata part of the winners pool and the
    /// winning stake. Every voter can claim once, even if the reward is zero.
    /// Returns the reward.
    #[handle_result]
    pub fn claim_reward(&mut self) -> Result<U128, PollError> {
        self.assert_quiz()?;
        if !self.window.is_finished(env::block_timestamp_ms()) {
            return Err(PollError::NotFinished);
        }
        let (winner, winners_pool, winning_stake) = match self.outcome {
            QuizOutcome::Unresolved => return Err(PollError::NotResolved),
            QuizOutcome::Resolved {
                winner,
                winners_pool,
                winning_stake,
            } => (winner, winners_pool, winning_stake),
        };
        let claimant = env::predecessor_account_id();
        // only voters hold a claim
        if !self.voters.contains(&claimant) {
            return Err(PollError::NotVoter);
        }
        if self.claimed.contains(&claimant) {
            return Err(PollError::AlreadyClaimed);
        }
        if winning_stake == 0 {
            return Err(PollError::NoWinningStake);
        }
        let stake = self.user_stake(&claimant, winner);
        let reward = settlement::reward_share(winners_pool, winning_stake, stake)
            .ok_or(PollError::Overflow)?;

        self.claimed.insert(&claimant);
        emit_reward_claimed(&claimant, reward);

        if reward > 0 {
            Payout::new(claimant, reward, PayoutKind::Reward).send(&self.settings.asset);
        }
        Ok(U128(reward))
    }

    /**********
     * INTERNAL
     **********/

    fn assert_authority(&self) -> Result<(), PollError> {
        if self.authority == env::predecessor_account_id() {
            Ok(())
        } else {
            Err(PollError::NotAuthority)
        }
    }

    fn assert_quiz(&self) -> Result<(), PollError> {
        if self.settings.is_quiz() {
            Ok(())
        } else {
            Err(PollError::NotQuiz)
        }
    }

    fn option_idx(&self, option_id: OptionId) -> Result<usize, PollError> {
        let idx = option_id as usize;
        if idx < self.options.len() {
            Ok(idx)
        } else {
            Err(PollError::OptionOutOfRange(option_id))
        }
    }

    fn user_stake(&self, account: &AccountId, option_id: OptionId) -> Balance {
        self.user_votes
            .get(&(account.clone(), option_id))
            .unwrap_or(0)
    }

    /// Bytes a vote adds: the `user_votes` entry if `new_entry`, and the voter records
    /// on the first vote.
    fn vote_storage(&self, voter: &AccountId, new_entry: bool) -> StorageUsage {
        let mut bytes = 0;
        if new_entry {
            bytes += vote_entry_storage(voter);
        }
        if !self.voters.contains(voter) {
            bytes += account_entry_storage(voter);
            if self.settings.is_quiz() {
                // written by `claim_reward`
                bytes += account_entry_storage(voter);
            }
        }
        bytes
    }

    /// Validates and credits a vote paid with `payment`. All checks are done before any
    /// state update. Native payments first cover the storage the vote adds, token votes
    /// take it from the voter's storage balance.
    /// Returns the payment forwarding, if the reward policy requires one.
    fn record_vote(
        &mut self,
        voter: AccountId,
        option_id: OptionId,
        payment: Balance,
    ) -> Result<Option<Payout>, PollError> {
        if !self.window.is_active(env::block_timestamp_ms()) {
            return Err(PollError::NotActive);
        }
        let idx = self.option_idx(option_id)?;
        if self.settings.choice == ChoiceType::SingleChoice && self.voters.contains(&voter) {
            return Err(PollError::DoubleVote);
        }
        let key = (voter, option_id);
        let prev = self.user_votes.get(&key);
        if self.settings.is_free() && prev.is_some() {
            return Err(PollError::DoubleVote);
        }

        let price = self.settings.price();
        let storage = storage_cost(self.vote_storage(&key.0, prev.is_none()));
        let mut storage_left = None;
        let payment = if self.settings.token().is_some() {
            if payment < price {
                return Err(PollError::InsufficientDeposit(price));
            }
            if storage > 0 {
                let prepaid = self.storage_deposits.get(&key.0).unwrap_or(0);
                storage_left = Some(
                    prepaid
                        .checked_sub(storage)
                        .ok_or(PollError::StorageDepositRequired(storage))?,
                );
            }
            payment
        } else {
            match payment.checked_sub(storage) {
                Some(p) if p >= price => p,
                _ => return Err(PollError::InsufficientDeposit(price.saturating_add(storage))),
            }
        };
        let weight = if self.settings.is_free() {
            // a free poll is never settled, so it can't hold funds
            if payment > 0 && self.settings.reward == RewardPolicy::ToWinners {
                return Err(PollError::DepositNotAccepted);
            }
            1
        } else {
            payment
        };
        let user_weight = prev
            .unwrap_or(0)
            .checked_add(weight)
            .ok_or(PollError::Overflow)?;
        let option_weight = self.option_votes[idx]
            .checked_add(weight)
            .ok_or(PollError::Overflow)?;
        let total = self
            .total_votes
            .checked_add(weight)
            .ok_or(PollError::Overflow)?;

        self.user_votes.insert(&key, &user_weight);
        self.option_votes[idx] = option_weight;
        self.total_votes = total;
        let (voter, _) = key;
        self.voters.insert(&voter);
        if let Some(left) = storage_left {
            self.storage_deposits.insert(&voter, &left);
        }
        emit_vote(&voter, option_id, weight);

        Ok(self.forwarding(payment))
    }

    fn forwarding(&self, payment: Balance) -> Option<Payout> {
        if payment == 0 {
            return None;
        }
        let receiver = match self.settings.reward {
            RewardPolicy::ToOwner => self.authority.clone(),
            RewardPolicy::ToManager => self.manager.clone(),
            RewardPolicy::ToWinners => return None,
        };
        Some(Payout::new(receiver, payment, PayoutKind::Forward))
    }

    fn token_vote(
        &mut self,
        sender_id: AccountId,
        amount: Balance,
        msg: &str,
    ) -> Result<Option<Payout>, PollError> {
        match self.settings.token() {
            None => return Err(PollError::WrongAsset),
            Some(token) if *token != env::predecessor_account_id() => {
                return Err(PollError::NotTokenContract)
            }
            Some(_) => (),
        }
        let msg: TokenVoteMsg =
            serde_json::from_str(msg).map_err(|_| PollError::InvalidMessage)?;
        self.record_vote(sender_id, msg.option_id, amount)
    }
}

#[near_bindgen]
impl FungibleTokenReceiver for Contract {
    /// Votes with tokens sent through `ft_transfer_call`. `msg` must be
    /// `{"option_id": <number>}`. On any error the call panics and the token contract
    /// refunds the sender.
    fn ft_on_transfer(
        &mut self,
        sender_id: AccountId,
        amount: U128,
        msg: String,
    ) -> PromiseOrValue<U128> {
        match self.token_vote(sender_id, amount.0, &msg) {
            Ok(payout) => {
                if let Some(p) = payout {
                    p.send(&self.settings.asset);
                }
                PromiseOrValue::Value(U128(0))
            }
            Err(e) => e.panic(),
        }
    }
}
