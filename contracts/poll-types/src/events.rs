use std::fmt;

use near_sdk::env;
use near_sdk::serde::Serialize;

/// NEP-297 event envelope.
#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
pub struct NearEvent<T: Serialize> {
    pub standard: &'static str,
    pub version: &'static str,

    // `flatten` to not have "event": {<EventPayload>} in the JSON, just have the contents.
    #[serde(flatten)]
    pub event: EventPayload<T>,
}

#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
pub struct EventPayload<T: Serialize> {
    pub event: &'static str,
    pub data: T,
}

impl<T: Serialize> NearEvent<T> {
    pub fn emit(&self) {
        env::log_str(&self.to_string());
    }
}

impl<T: Serialize> fmt::Display for NearEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "EVENT_JSON:{}",
            &serde_json::to_string(self).map_err(|_| fmt::Error)?
        ))
    }
}
