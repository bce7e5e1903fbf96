use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdError, StdResult};
use cw_storage_plus::Bound;

use crate::msg::{SummaryResponse, TicketEntry, TicketOwnerResponse, TicketsResponse, TiersResponse};
use crate::state::{CONFIG, RAFFLE_STATE, TICKET_OWNERS, TIERS};

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_state(deps: Deps) -> StdResult<Binary> {
    let state = RAFFLE_STATE.load(deps.storage)?;
    to_json_binary(&state)
}

pub fn query_summary(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    let state = RAFFLE_STATE.load(deps.storage)?;
    to_json_binary(&SummaryResponse {
        status: state.status,
        ticket_price: config.ticket_price,
        pool_amount: config.pool_amount,
        tier_count: config.tier_count,
        number_of_tickets: config.number_of_tickets,
        current_ticket: state.current_ticket,
        total_collected: state.total_collected,
        denom: config.denom,
    })
}

pub fn query_tiers(deps: Deps) -> StdResult<Binary> {
    let tiers = TIERS.load(deps.storage)?;
    to_json_binary(&TiersResponse { tiers })
}

pub fn query_tier(deps: Deps, rank: u8) -> StdResult<Binary> {
    let tiers = TIERS.load(deps.storage)?;
    let tier = tiers
        .into_iter()
        .nth(rank as usize)
        .ok_or_else(|| StdError::generic_err(format!("tier {} not found", rank)))?;
    to_json_binary(&tier)
}

pub fn query_ticket_owner(deps: Deps, ticket_number: u64) -> StdResult<Binary> {
    let owner = TICKET_OWNERS.may_load(deps.storage, ticket_number)?;
    to_json_binary(&TicketOwnerResponse {
        ticket_number,
        owner,
    })
}

pub fn query_tickets(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(50).min(200) as usize;
    let start = start_after.map(Bound::exclusive);

    let tickets: Vec<TicketEntry> = TICKET_OWNERS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(ticket_number, owner)| TicketEntry {
            ticket_number,
            owner,
        })
        .collect();

    to_json_binary(&TicketsResponse { tickets })
}
