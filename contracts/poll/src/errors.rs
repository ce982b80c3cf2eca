use near_sdk::env::panic_str;
use near_sdk::{Balance, FunctionError};

use poll_types::OptionId;

/// Error classes of the poll contract.
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[derive(PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// operation invoked outside of its lifecycle state.
    State,
    Authorization,
    /// malformed input.
    Validation,
    /// double vote, double resolution or double claim.
    Duplicate,
}

/// Contract errors
#[cfg_attr(not(target_arch = "wasm32"), derive(PartialEq, Debug))]
pub enum PollError {
    NotActive,
    NotFinished,
    NotStarted,
    AlreadyScheduled,
    AlreadyStarted,
    AlreadyFinished,
    NotQuiz,
    NotResolved,
    NoWinningStake,

    NotAuthority,
    NotTokenContract,

    OptionOutOfRange(OptionId),
    WrongAsset,
    InsufficientDeposit(Balance),
    /// prepaid storage balance is below the storage the vote adds.
    StorageDepositRequired(Balance),
    DepositNotAccepted,
    InvalidWindow,
    InvalidMessage,
    NotVoter,
    NothingOwed,
    Overflow,

    DoubleVote,
    AlreadyResolved,
    AlreadyClaimed,
}

impl PollError {
    pub fn kind(&self) -> ErrorKind {
        use PollError::*;
        match self {
            NotActive | NotFinished | NotStarted | AlreadyScheduled | AlreadyStarted
            | AlreadyFinished | NotQuiz | NotResolved | NoWinningStake => ErrorKind::State,
            NotAuthority | NotTokenContract => ErrorKind::Authorization,
            OptionOutOfRange(_) | WrongAsset | InsufficientDeposit(_)
            | StorageDepositRequired(_) | DepositNotAccepted | InvalidWindow | InvalidMessage
            | NotVoter | NothingOwed | Overflow => ErrorKind::Validation,
            DoubleVote | AlreadyResolved | AlreadyClaimed => ErrorKind::Duplicate,
        }
    }

    fn reason(&self) -> String {
        match self {
            PollError::NotActive => "poll is not active".to_owned(),
            PollError::NotFinished => "poll is not finished".to_owned(),
            PollError::NotStarted => "poll is not started".to_owned(),
            PollError::AlreadyScheduled => "poll is already scheduled".to_owned(),
            PollError::AlreadyStarted => "poll is already started".to_owned(),
            PollError::AlreadyFinished => "poll finish is already set".to_owned(),
            PollError::NotQuiz => "poll is not a quiz".to_owned(),
            PollError::NotResolved => "quiz result is not finalized".to_owned(),
            PollError::NoWinningStake => "nobody staked on the winning option".to_owned(),
            PollError::NotAuthority => "required poll authority".to_owned(),
            PollError::NotTokenContract => "must be called by the poll token".to_owned(),
            PollError::OptionOutOfRange(o) => format!("option {} not found", o),
            PollError::WrongAsset => "poll is not paid with this asset".to_owned(),
            PollError::InsufficientDeposit(min) => {
                format!("deposit must be at least {}", min)
            }
            PollError::StorageDepositRequired(min) => format!(
                "vote storage requires {} yoctoNEAR, top it up with storage_deposit",
                min
            ),
            PollError::DepositNotAccepted => {
                "free poll only accepts the vote storage deposit".to_owned()
            }
            PollError::InvalidWindow => {
                "start must be before finish and finish must be in the future".to_owned()
            }
            PollError::InvalidMessage => r#"msg must be {"option_id": <number>}"#.to_owned(),
            PollError::NotVoter => "caller did not vote".to_owned(),
            PollError::NothingOwed => "nothing to withdraw".to_owned(),
            PollError::Overflow => "vote amount overflow".to_owned(),
            PollError::DoubleVote => "caller already voted".to_owned(),
            PollError::AlreadyResolved => "quiz result is already finalized".to_owned(),
            PollError::AlreadyClaimed => "reward already claimed".to_owned(),
        }
    }
}

impl FunctionError for PollError {
    fn panic(&self) -> ! {
        let class = match self.kind() {
            ErrorKind::State => "state error",
            ErrorKind::Authorization => "not authorized",
            ErrorKind::Validation => "invalid input",
            ErrorKind::Duplicate => "duplicate",
        };
        panic_str(&format!("{}: {}", class, self.reason()))
    }
}
