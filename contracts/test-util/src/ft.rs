//! Helpers for the NEP-141 test token.

use near_sdk::json_types::U128;
use near_workspaces::result::ExecutionFinalResult;
use near_workspaces::types::Balance;
use near_workspaces::{Account, AccountId, Contract, DevNetwork, Worker};
use serde_json::json;

use crate::build_contract;

/// Deploys the test token from `project_path` and mints `amount` to every account.
pub async fn deploy_test_ft<T>(
    worker: &Worker<T>,
    project_path: &str,
    holders: &[&AccountId],
    amount: Balance,
) -> anyhow::Result<Contract>
where
    T: DevNetwork + Send + Sync,
{
    let token = build_contract(worker, project_path, "new", json!({})).await?;
    for h in holders {
        mint(&token, h, amount).await?;
    }
    Ok(token)
}

pub async fn mint(token: &Contract, account_id: &AccountId, amount: Balance) -> anyhow::Result<()> {
    let res = token
        .call("mint")
        .args_json(json!({ "account_id": account_id, "amount": U128(amount) }))
        .max_gas()
        .transact()
        .await?;
    assert!(res.is_success(), "{:?}", res.receipt_failures());
    Ok(())
}

/// Registers `account_id` in the token, without any balance.
pub async fn register(token: &AccountId, payer: &Account, account_id: &AccountId) -> anyhow::Result<()> {
    let res = payer
        .call(token, "storage_deposit")
        .args_json(json!({ "account_id": account_id }))
        .deposit(near_units::parse_near!("0.01 N"))
        .max_gas()
        .transact()
        .await?;
    assert!(res.is_success(), "{:?}", res.receipt_failures());
    Ok(())
}

pub async fn balance_of(token: &Contract, account_id: &AccountId) -> anyhow::Result<Balance> {
    let b: U128 = token
        .view("ft_balance_of")
        .args_json(json!({ "account_id": account_id }))
        .await?
        .json()?;
    Ok(b.0)
}

/// Sends `amount` to `receiver` with `ft_transfer_call`. The outcome is returned unchecked.
pub async fn transfer_call(
    token: &AccountId,
    sender: &Account,
    receiver: &AccountId,
    amount: Balance,
    msg: &str,
) -> anyhow::Result<ExecutionFinalResult> {
    Ok(sender
        .call(token, "ft_transfer_call")
        .args_json(json!({ "receiver_id": receiver, "amount": U128(amount), "msg": msg }))
        .deposit(1)
        .max_gas()
        .transact()
        .await?)
}
