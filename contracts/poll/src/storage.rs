use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{AccountId, Balance, BorshStorageKey, StorageUsage};

use cost::STORAGE_ENTRY;
use poll_types::OptionId;

/// Helper structure for keys of the persistent collections.
#[derive(BorshSerialize, BorshStorageKey)]
pub enum StorageKey {
    UserVotes,
    Voters,
    Claimed,
    Owed,
    StorageDeposits,
}

/// `StorageKey` prefix [1 byte]
const ENUM_STORAGE_KEY: StorageUsage = 1;
/// Borsh length prefix of a string [4 bytes]
const STR_LEN_STORAGE: StorageUsage = 4;
const OPTION_ID_STORAGE: StorageUsage = std::mem::size_of::<OptionId>() as StorageUsage;
const BALANCE_STORAGE: StorageUsage = 16;

/// Storage of an account entry in a `LookupSet` (`voters`, `claimed`).
pub fn account_entry_storage(account: &AccountId) -> StorageUsage {
    STORAGE_ENTRY + ENUM_STORAGE_KEY + STR_LEN_STORAGE + account.as_str().len() as StorageUsage
}

/// Storage of a `user_votes` entry of `account`.
pub fn vote_entry_storage(account: &AccountId) -> StorageUsage {
    account_entry_storage(account) + OPTION_ID_STORAGE + BALANCE_STORAGE
}

/// Storage of a balance keyed by `account` (`storage_deposits`, `owed`).
pub fn balance_entry_storage(account: &AccountId) -> StorageUsage {
    account_entry_storage(account) + BALANCE_STORAGE
}

/// Voting window. Start and finish are unix time in milliseconds, each can be set only once.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
pub enum Window {
    Unscheduled,
    /// opened by `start_poll`, finish not set.
    Open { start: u64 },
    Bounded { start: u64, finish: u64 },
}

impl Window {
    pub fn start(&self) -> Option<u64> {
        match self {
            Window::Unscheduled => None,
            Window::Open { start } | Window::Bounded { start, .. } => Some(*start),
        }
    }

    pub fn finish(&self) -> Option<u64> {
        match self {
            Window::Bounded { finish, .. } => Some(*finish),
            _ => None,
        }
    }

    pub fn status(&self, now: u64) -> Status {
        match *self {
            Window::Unscheduled => Status::Unscheduled,
            Window::Open { start } if start <= now => Status::Active,
            Window::Open { .. } => Status::Scheduled,
            Window::Bounded { finish, .. } if finish <= now => Status::Finished,
            Window::Bounded { start, .. } if start <= now => Status::Active,
            Window::Bounded { .. } => Status::Scheduled,
        }
    }

    #[inline]
    pub fn is_active(&self, now: u64) -> bool {
        self.status(now) == Status::Active
    }

    #[inline]
    pub fn is_finished(&self, now: u64) -> bool {
        self.status(now) == Status::Finished
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[serde(crate = "near_sdk::serde")]
pub enum Status {
    Unscheduled,
    Scheduled,
    Active,
    Finished,
}

/// Quiz resolution state.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
pub enum QuizOutcome {
    Unresolved,
    Resolved {
        winner: OptionId,
        /// part of the losing stake redistributed to the winners.
        winners_pool: Balance,
        /// total stake on the winning option.
        winning_stake: Balance,
    },
}

impl QuizOutcome {
    pub fn winner(&self) -> Option<OptionId> {
        match self {
            QuizOutcome::Unresolved => None,
            QuizOutcome::Resolved { winner, .. } => Some(*winner),
        }
    }
}
