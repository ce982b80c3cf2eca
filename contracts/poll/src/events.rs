use near_sdk::json_types::U128;
use near_sdk::serde::Serialize;
use near_sdk::{AccountId, Balance};

use poll_types::{EventPayload, NearEvent, OptionId};

use crate::payout::PayoutKind;

fn emit_event<T: Serialize>(event: &'static str, data: T) {
    NearEvent {
        standard: "stake-poll",
        version: "1.0.0",
        event: EventPayload { event, data },
    }
    .emit();
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct Window {
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finish: Option<u64>,
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct Vote<'a> {
    voter: &'a AccountId,
    option_id: OptionId,
    weight: U128,
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct ResultFinalized {
    winner: OptionId,
    winners_pool: U128,
    authority_cut: U128,
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct RewardClaimed<'a> {
    claimant: &'a AccountId,
    reward: U128,
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct PayoutFailed<'a> {
    receiver: &'a AccountId,
    amount: U128,
    kind: PayoutKind,
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct AuthorityTransferred<'a> {
    old: &'a AccountId,
    new: &'a AccountId,
}

pub(crate) fn emit_scheduled(start: u64, finish: u64) {
    let data = Window {
        start: Some(start),
        finish: Some(finish),
    };
    emit_event("poll_scheduled", data);
}

pub(crate) fn emit_started(start: u64) {
    let data = Window {
        start: Some(start),
        finish: None,
    };
    emit_event("poll_started", data);
}

pub(crate) fn emit_finished(finish: u64) {
    let data = Window {
        start: None,
        finish: Some(finish),
    };
    emit_event("poll_finished", data);
}

pub(crate) fn emit_vote(voter: &AccountId, option_id: OptionId, weight: Balance) {
    let data = Vote {
        voter,
        option_id,
        weight: U128(weight),
    };
    emit_event("vote", data);
}

pub(crate) fn emit_result_finalized(
    winner: OptionId,
    winners_pool: Balance,
    authority_cut: Balance,
) {
    let data = ResultFinalized {
        winner,
        winners_pool: U128(winners_pool),
        authority_cut: U128(authority_cut),
    };
    emit_event("result_finalized", data);
}

pub(crate) fn emit_reward_claimed(claimant: &AccountId, reward: Balance) {
    let data = RewardClaimed {
        claimant,
        reward: U128(reward),
    };
    emit_event("reward_claimed", data);
}

pub(crate) fn emit_payout_failed(receiver: &AccountId, amount: Balance, kind: PayoutKind) {
    let data = PayoutFailed {
        receiver,
        amount: U128(amount),
        kind,
    };
    emit_event("payout_failed", data);
}

pub(crate) fn emit_authority_transferred(old: &AccountId, new: &AccountId) {
    emit_event("authority_transferred", AuthorityTransferred { old, new });
}

#[cfg(test)]
mod unit_tests {
    use near_sdk::test_utils;

    use super::*;

    fn alice() -> AccountId {
        AccountId::new_unchecked("alice.near".to_string())
    }

    #[test]
    fn log_vote() {
        let expected1 = r#"EVENT_JSON:{"standard":"stake-poll","version":"1.0.0","event":"vote","data":{"voter":"alice.near","option_id":1,"weight":"250"}}"#;
        let expected2 = r#"EVENT_JSON:{"standard":"stake-poll","version":"1.0.0","event":"reward_claimed","data":{"claimant":"alice.near","reward":"1000"}}"#;
        emit_vote(&alice(), 1, 250);
        assert_eq!(vec![expected1], test_utils::get_logs());
        emit_reward_claimed(&alice(), 1000);
        assert_eq!(vec![expected1, expected2], test_utils::get_logs());
    }

    #[test]
    fn log_lifecycle() {
        let expected = vec![
            r#"EVENT_JSON:{"standard":"stake-poll","version":"1.0.0","event":"poll_scheduled","data":{"start":5,"finish":9}}"#,
            r#"EVENT_JSON:{"standard":"stake-poll","version":"1.0.0","event":"poll_finished","data":{"finish":9}}"#,
        ];
        emit_scheduled(5, 9);
        emit_finished(9);
        assert_eq!(expected, test_utils::get_logs());
    }

    #[test]
    fn log_payout_failed() {
        let expected = r#"EVENT_JSON:{"standard":"stake-poll","version":"1.0.0","event":"payout_failed","data":{"receiver":"alice.near","amount":"7","kind":"authority_cut"}}"#;
        emit_payout_failed(&alice(), 7, PayoutKind::AuthorityCut);
        assert_eq!(vec![expected], test_utils::get_logs());
    }
}
