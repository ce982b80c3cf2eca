//! NEP-141 token with open minting. Used only by the integration tests of token polls.

use near_contract_standards::fungible_token::FungibleToken;
use near_contract_standards::{impl_fungible_token_core, impl_fungible_token_storage};
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::json_types::U128;
use near_sdk::{near_bindgen, AccountId, PanicOnDefault, PromiseOrValue};

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Contract {
    token: FungibleToken,
}

#[near_bindgen]
impl Contract {
    #[init]
    pub fn new() -> Self {
        Self {
            token: FungibleToken::new(b"t".to_vec()),
        }
    }

    /// Registers `account_id` if needed and mints `amount` to it.
    pub fn mint(&mut self, account_id: AccountId, amount: U128) {
        if !self.token.accounts.contains_key(&account_id) {
            self.token.internal_register_account(&account_id);
        }
        self.token.internal_deposit(&account_id, amount.0);
    }
}

impl_fungible_token_core!(Contract, token);
impl_fungible_token_storage!(Contract, token);
