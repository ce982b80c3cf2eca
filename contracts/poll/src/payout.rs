use near_sdk::json_types::U128;
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{env, near_bindgen, require, AccountId, Balance, Promise, PromiseResult};

use cost::{FT_TRANSFER_DEPOSIT, FT_TRANSFER_GAS, PAYOUT_CALLBACK_GAS};
use poll_types::{ext_ft, AssetKind};

use crate::events::emit_payout_failed;
use crate::{Contract, ContractExt, PollError};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[serde(crate = "near_sdk::serde", rename_all = "snake_case")]
pub enum PayoutKind {
    /// vote payment forwarded to the authority or the manager, or a retried payout.
    Forward,
    /// authority part of a finalized quiz.
    AuthorityCut,
    /// winner reward.
    Reward,
}

impl PayoutKind {
    fn memo(&self) -> &'static str {
        match self {
            PayoutKind::Forward => "poll payment",
            PayoutKind::AuthorityCut => "quiz authority cut",
            PayoutKind::Reward => "quiz reward",
        }
    }
}

/// Transfer out of the poll custody.
/// Must be created only once all ledger updates of the call are written, and consumed
/// with `send`.
#[must_use]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
pub(crate) struct Payout {
    receiver: AccountId,
    amount: Balance,
    kind: PayoutKind,
}

impl Payout {
    pub(crate) fn new(receiver: AccountId, amount: Balance, kind: PayoutKind) -> Self {
        Self {
            receiver,
            amount,
            kind,
        }
    }

    /// Schedules the transfer followed by the `on_payout` callback.
    pub(crate) fn send(self, asset: &AssetKind) -> Promise {
        let transfer = match asset {
            AssetKind::Native => Promise::new(self.receiver.clone()).transfer(self.amount),
            AssetKind::FungibleToken(token) => ext_ft::ext(token.clone())
                .with_attached_deposit(FT_TRANSFER_DEPOSIT)
                .with_static_gas(FT_TRANSFER_GAS)
                .ft_transfer(
                    self.receiver.clone(),
                    U128(self.amount),
                    Some(self.kind.memo().to_owned()),
                ),
        };
        transfer.then(
            Contract::ext(env::current_account_id())
                .with_static_gas(PAYOUT_CALLBACK_GAS)
                .on_payout(self.receiver, U128(self.amount), self.kind),
        )
    }
}

#[near_bindgen]
impl Contract {
    /// Payout callback. Returns true if the transfer succeeded.
    /// A failed reward releases the claim, so the winner can claim again. Other failed
    /// payouts are credited to the receiver, who can retry with `withdraw_owed`.
    #[private]
    pub fn on_payout(&mut self, receiver: AccountId, amount: U128, kind: PayoutKind) -> bool {
        if is_promise_success() {
            return true;
        }
        env::log_str(&format!(
            "{} of {} to {} failed",
            kind.memo(),
            amount.0,
            receiver
        ));
        match kind {
            PayoutKind::Reward => {
                self.claimed.remove(&receiver);
            }
            PayoutKind::Forward | PayoutKind::AuthorityCut => {
                let owed = self.owed.get(&receiver).unwrap_or(0);
                self.owed.insert(&receiver, &owed.saturating_add(amount.0));
            }
        }
        emit_payout_failed(&receiver, amount.0, kind);
        false
    }

    /// Retries all failed payouts to the caller.
    #[handle_result]
    pub fn withdraw_owed(&mut self) -> Result<Promise, PollError> {
        let caller = env::predecessor_account_id();
        let amount = self.owed.remove(&caller).ok_or(PollError::NothingOwed)?;
        Ok(Payout::new(caller, amount, PayoutKind::Forward).send(&self.settings.asset))
    }

    /// Amount of failed payouts which `account` can withdraw.
    pub fn owed_to(&self, account: AccountId) -> U128 {
        U128(self.owed.get(&account).unwrap_or(0))
    }
}

fn is_promise_success() -> bool {
    require!(
        env::promise_results_count() == 1,
        "expected exactly one promise result"
    );
    matches!(env::promise_result(0), PromiseResult::Successful(_))
}
