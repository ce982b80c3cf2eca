mod events;

use std::fmt;

use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::env::panic_str;
use near_sdk::json_types::U128;
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{ext_contract, AccountId, Balance, FunctionError};

pub use crate::events::*;

/// Index of a poll option, as given by the order of labels at poll creation.
pub type OptionId = u32;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 64;
/// Max length of an option label in bytes.
pub const MAX_OPTION_LEN: usize = 256;

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[serde(crate = "near_sdk::serde", rename_all = "snake_case")]
pub enum ChoiceType {
    /// A voter can vote only once, for a single option.
    SingleChoice,
    /// A voter can vote for many options.
    MultiChoice,
    /// Like `MultiChoice`, but once finished the authority declares the correct option
    /// and voters who staked on it split the losing stake.
    Quiz,
}

/// Asset in which the votes are paid.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[serde(crate = "near_sdk::serde", rename_all = "snake_case")]
pub enum AssetKind {
    Native,
    /// NEP-141 token contract.
    FungibleToken(AccountId),
}

/// Describes where the collected funds go.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[serde(crate = "near_sdk::serde", rename_all = "snake_case")]
pub enum RewardPolicy {
    /// every vote payment is forwarded to the poll authority.
    ToOwner,
    /// every vote payment is forwarded to the poll manager (the account which deployed it).
    ToManager,
    /// payments are kept until the quiz is resolved and then split among the winners.
    ToWinners,
}

/// Poll configuration. Immutable once the poll is created.
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[serde(crate = "near_sdk::serde")]
pub struct PollSettings {
    /// Minimum stake of a single vote. Zero makes a free poll, where each vote counts as 1.
    pub price: U128,
    pub choice: ChoiceType,
    pub asset: AssetKind,
    pub reward: RewardPolicy,
}

impl PollSettings {
    #[inline]
    pub fn price(&self) -> Balance {
        self.price.0
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.price.0 == 0
    }

    #[inline]
    pub fn is_quiz(&self) -> bool {
        self.choice == ChoiceType::Quiz
    }

    /// Returns the token contract for token denominated polls.
    pub fn token(&self) -> Option<&AccountId> {
        match &self.asset {
            AssetKind::Native => None,
            AssetKind::FungibleToken(t) => Some(t),
        }
    }

    /// Checks the settings and the option labels a poll is created with.
    pub fn validate(&self, options: &[String]) -> Result<(), SettingsError> {
        let winners_quiz = self.reward == RewardPolicy::ToWinners && !self.is_free();
        if self.is_quiz() != winners_quiz {
            return Err(SettingsError::QuizPolicyMismatch);
        }
        if self.token().is_some() && self.is_free() {
            return Err(SettingsError::FreeTokenPoll);
        }
        if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
            return Err(SettingsError::OptionsCount(options.len()));
        }
        for (i, o) in options.iter().enumerate() {
            if o.is_empty() || o.len() > MAX_OPTION_LEN {
                return Err(SettingsError::OptionLabel(i));
            }
        }
        Ok(())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[derive(PartialEq, Eq)]
pub enum SettingsError {
    QuizPolicyMismatch,
    FreeTokenPoll,
    OptionsCount(usize),
    OptionLabel(usize),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::QuizPolicyMismatch => f.write_str(
                "quiz polls, and only quiz polls, must reward winners and have a non zero price",
            ),
            SettingsError::FreeTokenPoll => f.write_str("token polls must have a non zero price"),
            SettingsError::OptionsCount(n) => write!(
                f,
                "poll must have between {} and {} options, got {}",
                MIN_OPTIONS, MAX_OPTIONS, n
            ),
            SettingsError::OptionLabel(i) => write!(
                f,
                "option {} label must be non empty and at most {} bytes",
                i, MAX_OPTION_LEN
            ),
        }
    }
}

impl FunctionError for SettingsError {
    fn panic(&self) -> ! {
        panic_str(&format!("invalid settings: {}", self))
    }
}

/// NEP-141 methods used to pay out tokens.
#[ext_contract(ext_ft)]
pub trait FungibleToken {
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>);
}
