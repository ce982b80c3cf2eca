use near_sdk::env::panic_str;
use near_sdk::{Balance, FunctionError};

use poll_types::SettingsError;

#[cfg_attr(not(target_arch = "wasm32"), derive(PartialEq, Debug))]
pub enum FactoryError {
    NotAuthority,
    InvalidSettings(SettingsError),
    /// attached deposit is below the required amount.
    RequiredDeposit(Balance),
    PollCodeNotSet,
    EmptyPollCode,
    /// the next poll name doesn't form a valid sub-account of the factory.
    InvalidPollAccount,
    /// the amount exceeds the withdrawable balance.
    InsufficientBalance(Balance),
}

impl FunctionError for FactoryError {
    fn panic(&self) -> ! {
        match self {
            FactoryError::NotAuthority => panic_str("not authorized"),
            FactoryError::InvalidSettings(e) => panic_str(&format!("invalid settings: {}", e)),
            FactoryError::RequiredDeposit(min) => {
                panic_str(&format!("requires {} yoctoNEAR deposit", min))
            }
            FactoryError::PollCodeNotSet => panic_str("poll code is not set"),
            FactoryError::EmptyPollCode => panic_str("poll code must not be empty"),
            FactoryError::InvalidPollAccount => panic_str("can't build a valid poll account id"),
            FactoryError::InsufficientBalance(available) => panic_str(&format!(
                "not enough balance, only {} yoctoNEAR can be withdrawn",
                available
            )),
        }
    }
}

impl From<SettingsError> for FactoryError {
    fn from(e: SettingsError) -> Self {
        FactoryError::InvalidSettings(e)
    }
}
