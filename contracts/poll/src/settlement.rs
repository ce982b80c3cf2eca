//! Quiz settlement math. All divisions round down, so the authority keeps the remainder
//! and the sum of all winner rewards never exceeds `winners_pool + winning_stake`.

use near_sdk::Balance;
use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer.
    pub struct U256(4);
}

/// Share of the losing stake redistributed to the winners: 4/5.
const POOL_NUMERATOR: u64 = 4;
const POOL_DENOMINATOR: u64 = 5;

#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Settlement {
    pub winners_pool: Balance,
    /// amount paid to the authority when the result is finalized.
    pub authority_cut: Balance,
}

/// Splits the custody once the winning option is known.
/// If nobody staked on the winning option, the authority takes everything.
/// Returns `None` when `winning_stake > total`.
pub fn settle(total: Balance, winning_stake: Balance) -> Option<Settlement> {
    if winning_stake == 0 {
        return Some(Settlement {
            winners_pool: 0,
            authority_cut: total,
        });
    }
    let losing = total.checked_sub(winning_stake)?;
    let winners_pool = to_balance(
        U256::from(losing) * U256::from(POOL_NUMERATOR) / U256::from(POOL_DENOMINATOR),
    )?;
    // the authority gets the remainder of the floor division
    let authority_cut = total.checked_sub(winners_pool.checked_add(winning_stake)?)?;
    Some(Settlement {
        winners_pool,
        authority_cut,
    })
}

/// Pro rata reward: `(winners_pool + winning_stake) * stake / winning_stake`.
/// Returns `None` when `winning_stake == 0` or the result doesn't fit in a `Balance`.
pub fn reward_share(
    winners_pool: Balance,
    winning_stake: Balance,
    stake: Balance,
) -> Option<Balance> {
    if winning_stake == 0 {
        return None;
    }
    let prize = U256::from(winners_pool) + U256::from(winning_stake);
    to_balance(prize * U256::from(stake) / U256::from(winning_stake))
}

fn to_balance(x: U256) -> Option<Balance> {
    if x > U256::from(Balance::MAX) {
        None
    } else {
        Some(x.low_u128())
    }
}
