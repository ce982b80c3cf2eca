use near_sdk::json_types::U128;
use near_workspaces::network::{NetworkClient, NetworkInfo};
use near_workspaces::types::Balance;
use near_workspaces::{Account, AccountId, Contract, DevNetwork, Worker};
use serde_json::json;

pub mod ft;

/// Compiles the contract at `project_path`.
pub async fn compile(project_path: &str) -> anyhow::Result<Vec<u8>> {
    let mut wasm;
    let mut retry_count = 3;
    // Under some circumstances compilation could provide zero length built wasm. In this case we retry.
    loop {
        wasm = near_workspaces::compile_project(project_path).await?;
        if !wasm.is_empty() || retry_count == 0 {
            break;
        }
        retry_count -= 1;
    }
    Ok(wasm)
}

/// Build contract from sources and initialize it
pub async fn build_contract<T>(
    worker: &Worker<T>,
    project_path: &str,
    init_method: &str,
    args: serde_json::Value,
) -> anyhow::Result<Contract>
where
    T: NetworkInfo + NetworkClient + DevNetwork + Send + Sync,
{
    let wasm = compile(project_path).await?;
    let contract = worker.dev_deploy(&wasm).await?;

    // initialize contract
    let _ = contract
        .call(init_method)
        .args_json(args)
        .max_gas()
        .transact()
        .await?
        .into_result()?;

    Ok(contract)
}

/// Get current block timestamp in nanoseconds
pub async fn get_block_timestamp<T>(worker: &Worker<T>) -> anyhow::Result<u64>
where
    T: NetworkClient + Send + Sync,
{
    Ok(worker.view_block().await?.timestamp())
}

/// NEAR balance of an account.
pub async fn balance_of<T>(worker: &Worker<T>, account_id: &AccountId) -> anyhow::Result<Balance>
where
    T: NetworkClient + Send + Sync,
{
    Ok(worker.view_account(account_id).await?.balance)
}

/// Calls the poll `vote` method with `stake` and the vote storage cost attached, and asserts
/// it succeeded.
pub async fn vote(
    poll: &AccountId,
    voter: &Account,
    option_id: u32,
    stake: Balance,
) -> anyhow::Result<()> {
    let storage: U128 = voter
        .view(poll, "vote_storage_cost")
        .args_json(json!({ "account": voter.id(), "option_id": option_id }))
        .await?
        .json()?;
    let res = voter
        .call(poll, "vote")
        .args_json(json!({ "option_id": option_id }))
        .deposit(stake + storage.0)
        .max_gas()
        .transact()
        .await?;
    assert!(res.is_success(), "{:?}", res.receipt_failures());
    Ok(())
}

/// Prepays `amount` of vote storage of `account` in a token poll.
pub async fn storage_deposit(
    poll: &AccountId,
    account: &Account,
    amount: Balance,
) -> anyhow::Result<()> {
    let res = account
        .call(poll, "storage_deposit")
        .args_json(json!({}))
        .deposit(amount)
        .max_gas()
        .transact()
        .await?;
    assert!(res.is_success(), "{:?}", res.receipt_failures());
    Ok(())
}

/// Reads a `U128` view of the poll, optionally for a given account.
pub async fn view_u128(
    poll: &Contract,
    method: &str,
    account: Option<&AccountId>,
) -> anyhow::Result<u128> {
    let args = match account {
        Some(a) => json!({ "account": a }),
        None => json!({}),
    };
    let v: U128 = poll.view(method).args_json(args).await?.json()?;
    Ok(v.0)
}
