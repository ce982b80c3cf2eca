use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::collections::LookupMap;
use near_sdk::json_types::U128;
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::serde_json::json;
use near_sdk::{
    env, near_bindgen, require, AccountId, Balance, BorshStorageKey, PanicOnDefault, Promise,
    PromiseOrValue, PromiseResult,
};

use cost::{
    create_poll_deposit, FAILURE_CALLBACK_GAS, FT_TRANSFER_DEPOSIT, FT_TRANSFER_GAS,
    POLL_CREATED_CALLBACK_GAS, POLL_INIT_BALANCE, POLL_INIT_GAS,
};
use poll_types::{ext_ft, PollSettings, RewardPolicy};

pub use crate::errors::*;
use crate::events::*;

mod errors;
mod events;

/// Raw storage key of the poll wasm.
const POLL_CODE_KEY: &[u8] = b"poll_code";

/// Default page size of list queries.
const DEFAULT_LIMIT: u32 = 100;

#[derive(BorshSerialize, BorshStorageKey)]
enum StorageKey {
    Polls,
    ByCreator,
    CreatorPolls,
}

/// Poll creation fee per reward policy, in yoctoNEAR.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[serde(crate = "near_sdk::serde")]
pub struct Prices {
    pub to_owner: U128,
    pub to_manager: U128,
    pub to_winners: U128,
}

impl Prices {
    pub fn of(&self, policy: RewardPolicy) -> Balance {
        match policy {
            RewardPolicy::ToOwner => self.to_owner.0,
            RewardPolicy::ToManager => self.to_manager.0,
            RewardPolicy::ToWinners => self.to_winners.0,
        }
    }
}

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Contract {
    pub authority: AccountId,
    pub prices: Prices,
    /// poll -> creator
    pub polls: LookupMap<AccountId, AccountId>,
    /// (creator, index) -> poll, in creation order.
    pub by_creator: LookupMap<(AccountId, u64), AccountId>,
    /// number of polls per creator.
    pub creator_polls: LookupMap<AccountId, u64>,
    pub polls_count: u64,
    /// used to derive the next poll account name.
    pub next_poll_id: u64,
    /// deposits of poll creations waiting for the callback.
    pub in_flight: Balance,
}

#[near_bindgen]
impl Contract {
    #[init]
    pub fn new(authority: AccountId, prices: Prices) -> Self {
        Self {
            authority,
            prices,
            polls: LookupMap::new(StorageKey::Polls),
            by_creator: LookupMap::new(StorageKey::ByCreator),
            creator_polls: LookupMap::new(StorageKey::CreatorPolls),
            polls_count: 0,
            next_poll_id: 0,
            in_flight: 0,
        }
    }

    /**********
     * QUERIES
     **********/

    pub fn authority(&self) -> AccountId {
        self.authority.clone()
    }

    pub fn prices(&self) -> Prices {
        self.prices.clone()
    }

    /// Total deposit required to create a poll with the given reward policy: the fee and the
    /// initial balance of the poll account.
    pub fn price(&self, policy: RewardPolicy) -> U128 {
        U128(create_poll_deposit(self.prices.of(policy)).unwrap_or(Balance::MAX))
    }

    pub fn has_poll_code(&self) -> bool {
        env::storage_has_key(POLL_CODE_KEY)
    }

    /// Returns the account which created `poll`, if the poll was created by this factory.
    pub fn creator_of(&self, poll: AccountId) -> Option<AccountId> {
        self.polls.get(&poll)
    }

    /// Polls created by `creator`, in creation order, starting at `from_index` (0 by default).
    /// If limit is not specified, default is used: 100.
    pub fn polls_by_creator(
        &self,
        creator: AccountId,
        from_index: Option<u64>,
        limit: Option<u32>,
    ) -> Vec<AccountId> {
        let from = from_index.unwrap_or(0);
        let end = from
            .saturating_add(limit.unwrap_or(DEFAULT_LIMIT).into())
            .min(self.creator_polls_count(creator.clone()));
        (from..end)
            .filter_map(|i| self.by_creator.get(&(creator.clone(), i)))
            .collect()
    }

    /// Number of polls created by `creator`.
    pub fn creator_polls_count(&self, creator: AccountId) -> u64 {
        self.creator_polls.get(&creator).unwrap_or(0)
    }

    pub fn polls_count(&self) -> u64 {
        self.polls_count
    }

    /**********
     * TRANSACTIONS
     **********/

    /// Creates and initializes a new poll account `poll-<n>.<factory>`, with the caller as
    /// the poll authority and this factory as the manager.
    /// Requires a deposit of at least `price(settings.reward)`. The part of the deposit above
    /// it is returned once the poll is created, the whole deposit is returned on failure.
    /// Returns the poll account id.
    #[payable]
    #[handle_result]
    pub fn create_poll(
        &mut self,
        settings: PollSettings,
        options: Vec<String>,
    ) -> Result<Promise, FactoryError> {
        settings.validate(&options)?;
        let fee = self.prices.of(settings.reward);
        let required =
            create_poll_deposit(fee).ok_or(FactoryError::RequiredDeposit(Balance::MAX))?;
        let deposit = env::attached_deposit();
        if deposit < required {
            return Err(FactoryError::RequiredDeposit(required));
        }
        let code = env::storage_read(POLL_CODE_KEY).ok_or(FactoryError::PollCodeNotSet)?;
        let poll: AccountId = format!("poll-{}.{}", self.next_poll_id, env::current_account_id())
            .parse()
            .map_err(|_| FactoryError::InvalidPollAccount)?;

        let creator = env::predecessor_account_id();
        self.next_poll_id += 1;
        self.in_flight += deposit;

        let args = json!({
            "authority": creator,
            "settings": settings,
            "options": options,
        });
        Ok(Promise::new(poll.clone())
            .create_account()
            .transfer(POLL_INIT_BALANCE)
            .deploy_contract(code)
            .function_call(
                "new".to_owned(),
                args.to_string().into_bytes(),
                0,
                POLL_INIT_GAS,
            )
            .then(
                Self::ext(env::current_account_id())
                    .with_static_gas(POLL_CREATED_CALLBACK_GAS + FAILURE_CALLBACK_GAS)
                    .on_poll_created(creator, poll, settings, U128(deposit), U128(required)),
            ))
    }

    #[private]
    pub fn on_poll_created(
        &mut self,
        creator: AccountId,
        poll: AccountId,
        settings: PollSettings,
        deposit: U128,
        required: U128,
    ) -> PromiseOrValue<AccountId> {
        self.in_flight = self.in_flight.saturating_sub(deposit.0);
        if !is_promise_success() {
            // the poll account creation is rolled back, so the initial balance is back here
            return PromiseOrValue::Promise(
                Promise::new(creator).transfer(deposit.0).then(
                    Self::ext(env::current_account_id())
                        .with_static_gas(FAILURE_CALLBACK_GAS)
                        .on_failure(format!("can't create poll {}", poll)),
                ),
            );
        }

        self.polls.insert(&poll, &creator);
        let idx = self.creator_polls.get(&creator).unwrap_or(0);
        self.by_creator.insert(&(creator.clone(), idx), &poll);
        self.creator_polls.insert(&creator, &(idx + 1));
        self.polls_count += 1;
        emit_poll_created(&poll, &creator, &settings);

        let excess = deposit.0.saturating_sub(required.0);
        if excess > 0 {
            Promise::new(creator).transfer(excess);
        }
        PromiseOrValue::Value(poll)
    }

    #[private]
    pub fn on_failure(&mut self, error: String) {
        env::panic_str(&error)
    }

    /**********
     * ADMIN
     **********/

    /// Stores the poll wasm passed as the raw input of the call.
    #[handle_result]
    pub fn set_poll_code(&mut self) -> Result<(), FactoryError> {
        self.assert_authority()?;
        let code = env::input().unwrap_or_default();
        if code.is_empty() {
            return Err(FactoryError::EmptyPollCode);
        }
        env::storage_write(POLL_CODE_KEY, &code);
        Ok(())
    }

    #[handle_result]
    pub fn set_prices(&mut self, prices: Prices) -> Result<(), FactoryError> {
        self.assert_authority()?;
        self.prices = prices;
        Ok(())
    }

    #[handle_result]
    pub fn transfer_authority(&mut self, new_authority: AccountId) -> Result<(), FactoryError> {
        self.assert_authority()?;
        emit_authority_transferred(&self.authority, &new_authority);
        self.authority = new_authority;
        Ok(())
    }

    /// Sends collected fees and manager payments to the authority. The storage stake and
    /// the deposits of pending poll creations can't be withdrawn.
    #[handle_result]
    pub fn withdraw(&mut self, amount: U128) -> Result<Promise, FactoryError> {
        self.assert_authority()?;
        let available = self.withdrawable();
        if amount.0 > available {
            return Err(FactoryError::InsufficientBalance(available));
        }
        Ok(Promise::new(self.authority.clone()).transfer(amount.0))
    }

    /// Sends NEP-141 tokens held by the factory, eg. token payments of polls with the
    /// `ToManager` policy, to the authority.
    #[handle_result]
    pub fn withdraw_token(
        &mut self,
        token: AccountId,
        amount: U128,
    ) -> Result<Promise, FactoryError> {
        self.assert_authority()?;
        Ok(ext_ft::ext(token)
            .with_attached_deposit(FT_TRANSFER_DEPOSIT)
            .with_static_gas(FT_TRANSFER_GAS)
            .ft_transfer(self.authority.clone(), amount, None))
    }

    /**********
     * INTERNAL
     **********/

    fn assert_authority(&self) -> Result<(), FactoryError> {
        if self.authority == env::predecessor_account_id() {
            Ok(())
        } else {
            Err(FactoryError::NotAuthority)
        }
    }

    fn withdrawable(&self) -> Balance {
        let locked = Balance::from(env::storage_usage()) * env::storage_byte_cost();
        env::account_balance()
            .saturating_sub(locked)
            .saturating_sub(self.in_flight)
    }
}

fn is_promise_success() -> bool {
    require!(
        env::promise_results_count() == 1,
        "expected exactly one promise result"
    );
    matches!(env::promise_result(0), PromiseResult::Successful(_))
}
