use near_sdk::serde::Serialize;
use near_sdk::AccountId;

use poll_types::{EventPayload, NearEvent, PollSettings};

fn emit_event<T: Serialize>(event: &'static str, data: T) {
    NearEvent {
        standard: "stake-poll-factory",
        version: "1.0.0",
        event: EventPayload { event, data },
    }
    .emit();
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct PollCreated<'a> {
    poll: &'a AccountId,
    creator: &'a AccountId,
    settings: &'a PollSettings,
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct AuthorityTransferred<'a> {
    old: &'a AccountId,
    new: &'a AccountId,
}

pub(crate) fn emit_poll_created(poll: &AccountId, creator: &AccountId, settings: &PollSettings) {
    emit_event(
        "poll_created",
        PollCreated {
            poll,
            creator,
            settings,
        },
    );
}

pub(crate) fn emit_authority_transferred(old: &AccountId, new: &AccountId) {
    emit_event("authority_transferred", AuthorityTransferred { old, new });
}
