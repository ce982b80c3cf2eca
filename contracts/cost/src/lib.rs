use near_sdk::env::STORAGE_PRICE_PER_BYTE;
use near_sdk::{Balance, Gas, StorageUsage, ONE_NEAR};

pub const MICRO_NEAR: Balance = 1_000_000_000_000_000_000;
pub const MILI_NEAR: Balance = 1000 * MICRO_NEAR;

/// Balance transferred to a freshly created poll account. Covers the storage of the poll
/// code (~250kB) and of the initial state.
pub const POLL_INIT_BALANCE: Balance = 5 * ONE_NEAR;

pub const POLL_INIT_GAS: Gas = Gas(30 * Gas::ONE_TERA.0);
pub const POLL_CREATED_CALLBACK_GAS: Gas = Gas(10 * Gas::ONE_TERA.0);
pub const FAILURE_CALLBACK_GAS: Gas = Gas(3 * Gas::ONE_TERA.0);

/// NEP-141 `ft_transfer` requires exactly 1 yoctoNEAR attached.
pub const FT_TRANSFER_DEPOSIT: Balance = 1;
pub const FT_TRANSFER_GAS: Gas = Gas(10 * Gas::ONE_TERA.0);
pub const PAYOUT_CALLBACK_GAS: Gas = Gas(5 * Gas::ONE_TERA.0);

/// Every contract storage key/value entry uses 40 bytes on top of its key and value:
/// key len, key ptr, value len, value ptr and register, each as u64.
pub const STORAGE_ENTRY: StorageUsage = 40;

/// NEAR locked by `bytes` of contract storage.
#[inline]
pub fn storage_cost(bytes: StorageUsage) -> Balance {
    Balance::from(bytes) * STORAGE_PRICE_PER_BYTE
}

/// Minimum deposit the factory accepts for a poll with the given policy `price`.
/// Returns `None` on overflow.
#[inline]
pub fn create_poll_deposit(price: Balance) -> Option<Balance> {
    price.checked_add(POLL_INIT_BALANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_deposit() {
        assert_eq!(create_poll_deposit(0), Some(POLL_INIT_BALANCE));
        assert_eq!(
            create_poll_deposit(2 * MILI_NEAR),
            Some(POLL_INIT_BALANCE + 2 * MILI_NEAR)
        );
        assert_eq!(create_poll_deposit(Balance::MAX), None);
    }

    #[test]
    fn storage() {
        assert_eq!(storage_cost(0), 0);
        // 100kB costs 1 NEAR
        assert_eq!(storage_cost(100_000), ONE_NEAR);
    }
}
