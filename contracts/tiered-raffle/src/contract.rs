use cosmwasm_std::{entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult};
use cw2::{get_contract_version, set_contract_version};

use crate::entropy::{BlockEntropy, RandomnessAccumulator};
use crate::error::ContractError;
use crate::execute;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{RaffleState, CONFIG, RAFFLE_STATE, TIERS};

const CONTRACT_NAME: &str = "crates.io:tiered-raffle";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = execute::build_config(deps.api, info.sender.clone(), &msg)?;
    CONFIG.save(deps.storage, &config)?;

    let accumulator = RandomnessAccumulator::new(&BlockEntropy::new(&env));
    RAFFLE_STATE.save(deps.storage, &RaffleState::new(accumulator))?;
    TIERS.save(deps.storage, &vec![])?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "tiered-raffle")
        .add_attribute("admin", info.sender.to_string())
        .add_attribute("pool_amount", config.pool_amount.to_string())
        .add_attribute("ticket_price", config.ticket_price.to_string())
        .add_attribute("number_of_tickets", config.number_of_tickets.to_string())
        .add_attribute("tier_count", config.tier_count.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::FillTiers {
            winner_counts,
            winner_payouts,
        } => execute::fill_tiers(deps, env, info, winner_counts, winner_payouts),
        ExecuteMsg::PurchaseTickets { quantity } => {
            let entropy = BlockEntropy::new(&env);
            execute::purchase_tickets(deps, env, info, quantity, &entropy)
        }
        ExecuteMsg::Terminate {} => execute::terminate(deps, env, info),
    }
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::State {} => query::query_state(deps),
        QueryMsg::Summary {} => query::query_summary(deps),
        QueryMsg::Tiers {} => query::query_tiers(deps),
        QueryMsg::Tier { rank } => query::query_tier(deps, rank),
        QueryMsg::TicketOwner { ticket_number } => query::query_ticket_owner(deps, ticket_number),
        QueryMsg::Tickets { start_after, limit } => query::query_tickets(deps, start_after, limit),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
