use cosmwasm_std::{
    coins, Addr, Api, BankMsg, Deps, DepsMut, Env, Event, MessageInfo, Response, Uint128,
};
use raffle_common::{ceil_div, safe_add, safe_increment, safe_mul, safe_sub, RaffleStatus};

use crate::draw::draw_winning_numbers;
use crate::entropy::EntropySource;
use crate::error::ContractError;
use crate::msg::InstantiateMsg;
use crate::payout::{compute_fee, gate_open, settle, Settlement, TransferKind};
use crate::state::{
    PrizeTier, RaffleConfig, WinningTicket, CONFIG, RAFFLE_STATE, TICKET_OWNERS, TIERS,
};

/// Used when the requested pool amount is zero.
pub const DEFAULT_POOL_AMOUNT: Uint128 = Uint128::new(1_000_000_000);
/// Used when the requested price is out of range; capped at the pool amount.
pub const DEFAULT_TICKET_PRICE: Uint128 = Uint128::new(10_000_000);
/// Smallest accepted ticket price, in base units of the denom.
pub const MIN_TICKET_PRICE: Uint128 = Uint128::new(1);
pub const MAX_PRIZE_TIERS: u8 = 10;
pub const DEFAULT_TIER_COUNT: u8 = 1;
pub const DEFAULT_DENOM: &str = "uraffle";
pub const MAX_FEE_RATE_PERCENT: u8 = 99;

/// Validate addresses and fee rate, apply the permissive defaults to pool,
/// price and tier count, and derive the ticket count.
pub fn build_config(
    api: &dyn Api,
    admin: Addr,
    msg: &InstantiateMsg,
) -> Result<RaffleConfig, ContractError> {
    let organizer = validate_account(api, "organizer", &msg.organizer)?;
    let fee_recipient = validate_account(api, "fee_recipient", &msg.fee_recipient)?;

    if msg.fee_rate_percent > MAX_FEE_RATE_PERCENT {
        return Err(ContractError::InvalidConfiguration {
            reason: format!(
                "fee rate {}% must be below 100%",
                msg.fee_rate_percent
            ),
        });
    }

    let pool_amount = if msg.pool_amount.is_zero() {
        DEFAULT_POOL_AMOUNT
    } else {
        msg.pool_amount
    };

    let ticket_price = if msg.ticket_price < MIN_TICKET_PRICE || msg.ticket_price > pool_amount {
        DEFAULT_TICKET_PRICE.min(pool_amount)
    } else {
        msg.ticket_price
    };

    let tier_count = if msg.tier_count == 0 || msg.tier_count > MAX_PRIZE_TIERS {
        DEFAULT_TIER_COUNT
    } else {
        msg.tier_count
    };

    let denom = match &msg.denom {
        Some(d) if !d.trim().is_empty() => d.clone(),
        _ => DEFAULT_DENOM.to_string(),
    };

    let tickets = ceil_div(pool_amount, ticket_price)?;
    let number_of_tickets =
        u64::try_from(tickets.u128()).map_err(|_| ContractError::InvalidConfiguration {
            reason: format!("{} tickets is more than can be numbered", tickets),
        })?;

    Ok(RaffleConfig {
        admin,
        organizer,
        fee_recipient,
        fee_rate_percent: msg.fee_rate_percent,
        fee_timing: msg.fee_timing.unwrap_or_default(),
        pool_amount,
        ticket_price,
        tier_count,
        number_of_tickets,
        denom,
    })
}

fn validate_account(api: &dyn Api, field: &str, address: &str) -> Result<Addr, ContractError> {
    if address.trim().is_empty() {
        return Err(ContractError::InvalidConfiguration {
            reason: format!("{} must be set", field),
        });
    }
    api.addr_validate(address)
        .map_err(|e| ContractError::InvalidConfiguration {
            reason: format!("{}: {}", field, e),
        })
}

/// Fix winner count and payout for every tier. Admin only, exactly once.
pub fn fill_tiers(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    winner_counts: Vec<u32>,
    winner_payouts: Vec<Uint128>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can fill tiers".to_string(),
        });
    }

    let existing = TIERS.load(deps.storage)?;
    if !existing.is_empty() {
        return Err(ContractError::AlreadyConfigured);
    }

    let mut state = RAFFLE_STATE.load(deps.storage)?;
    if state.status != RaffleStatus::Filling {
        return Err(ContractError::NotFilling {
            status: state.status.as_str().to_string(),
        });
    }

    let expected = config.tier_count as usize;
    if winner_counts.len() != expected || winner_payouts.len() != expected {
        return Err(ContractError::TierCountMismatch {
            expected: config.tier_count,
            winner_counts: winner_counts.len(),
            winner_payouts: winner_payouts.len(),
        });
    }

    if let Some(rank) = winner_counts.iter().position(|&c| c == 0) {
        return Err(ContractError::InvalidConfiguration {
            reason: format!("tier {} has no winners", rank),
        });
    }
    if let Some(rank) = winner_payouts.iter().position(|p| p.is_zero()) {
        return Err(ContractError::InvalidConfiguration {
            reason: format!("tier {} pays nothing", rank),
        });
    }

    let total_winners: u64 = winner_counts.iter().map(|&c| u64::from(c)).sum();
    if total_winners > config.number_of_tickets {
        return Err(ContractError::OversubscribedTiers {
            total_winners,
            number_of_tickets: config.number_of_tickets,
        });
    }

    let mut liability = Uint128::zero();
    for (count, payout) in winner_counts.iter().zip(winner_payouts.iter()) {
        liability = safe_add(liability, safe_mul(*payout, Uint128::from(*count))?)?;
    }
    let collected = safe_mul(
        config.ticket_price,
        Uint128::from(config.number_of_tickets),
    )?;
    let fee = compute_fee(collected, config.fee_rate_percent)?;
    if safe_add(liability, fee)? > collected {
        return Err(ContractError::PayoutsExceedPool {
            liability,
            fee,
            collected,
        });
    }

    let tiers: Vec<PrizeTier> = winner_counts
        .iter()
        .zip(winner_payouts.iter())
        .map(|(&count, &payout)| PrizeTier::new(count, payout))
        .collect();
    TIERS.save(deps.storage, &tiers)?;

    state.status = RaffleStatus::Selling;
    RAFFLE_STATE.save(deps.storage, &state)?;

    let mut event = Event::new("raffle_tiers_filled")
        .add_attribute("tier_count", config.tier_count.to_string())
        .add_attribute("total_winners", total_winners.to_string())
        .add_attribute("prize_liability", liability.to_string());
    for (rank, tier) in tiers.iter().enumerate() {
        event = event.add_attribute(
            format!("tier_{}", rank),
            format!("{}x{}", tier.winner_count, tier.payout),
        );
    }

    Ok(Response::new()
        .add_attribute("action", "fill_tiers")
        .add_attribute("total_winners", total_winners.to_string())
        .add_event(event))
}

/// Buy tickets for the attached payment.
///
/// Tickets are numbered sequentially from 1 and every sale except the last
/// one of the round feeds the randomness accumulator. When the sale fills up
/// the remaining units are not issued (their payment goes back to the
/// buyer), the draw runs and the whole pot is paid out before returning.
/// Storage is only written once every check, the draw and the payout
/// computation have succeeded.
pub fn purchase_tickets(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    quantity: u64,
    entropy: &impl EntropySource,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    let mut state = RAFFLE_STATE.load(deps.storage)?;

    match state.status {
        RaffleStatus::Selling => {}
        RaffleStatus::Filling => {
            return Err(ContractError::NotSelling {
                status: state.status.as_str().to_string(),
            })
        }
        _ => return Err(ContractError::SoldOut),
    }
    if state.is_sold_out(&config) {
        return Err(ContractError::SoldOut);
    }

    if quantity == 0 {
        return Err(ContractError::ZeroQuantity);
    }

    let expected = safe_mul(config.ticket_price, Uint128::from(quantity))?;
    check_payment(&info, &config.denom, expected)?;

    // Issue tickets
    let first_ticket = safe_increment(state.current_ticket)?;
    let mut issued: u64 = 0;
    while issued < quantity && !state.is_sold_out(&config) {
        state.current_ticket = safe_increment(state.current_ticket)?;
        state.total_collected = safe_add(state.total_collected, config.ticket_price)?;
        issued += 1;
        if !state.is_sold_out(&config) {
            state.accumulator.mix(entropy);
        }
    }
    let last_ticket = state.current_ticket;

    let unissued = safe_sub(Uint128::from(quantity), Uint128::from(issued))?;
    let refund = safe_mul(config.ticket_price, unissued)?;

    // Draw and settle on sell-out
    let mut tiers = TIERS.load(deps.storage)?;
    let mut drawn_events = Vec::new();
    let mut settlement: Option<Settlement> = None;
    if state.is_sold_out(&config) && gate_open(&config, &state, &tiers) {
        state.status = RaffleStatus::Drawing;

        let seed = state.accumulator.finalize(entropy);
        let marker = entropy.ordering_marker();
        let winner_counts: Vec<u32> = tiers.iter().map(|t| t.winner_count).collect();
        let numbers = draw_winning_numbers(&winner_counts, config.number_of_tickets, seed, marker)?;

        for (rank, (tier, tier_numbers)) in tiers.iter_mut().zip(numbers).enumerate() {
            for (slot, ticket_number) in tier_numbers.into_iter().enumerate() {
                let owner = if (first_ticket..=last_ticket).contains(&ticket_number) {
                    info.sender.clone()
                } else {
                    TICKET_OWNERS.load(deps.storage, ticket_number)?
                };
                drawn_events.push(
                    Event::new("raffle_winner_drawn")
                        .add_attribute("tier", rank.to_string())
                        .add_attribute("slot", slot.to_string())
                        .add_attribute("ticket_number", ticket_number.to_string())
                        .add_attribute("owner", owner.to_string())
                        .add_attribute("payout", tier.payout.to_string()),
                );
                tier.winners.push(WinningTicket {
                    ticket_number,
                    owner,
                });
            }
        }
        state.final_seed = Some(hex::encode(seed));

        state.status = RaffleStatus::Distributing;
        settlement = settle(&mut config, &mut state, &tiers)?;
    }

    let payout_total = match &settlement {
        Some(s) => s.total_out()?,
        None => Uint128::zero(),
    };
    let outgoing = safe_add(payout_total, refund)?;
    if !outgoing.is_zero() {
        ensure_solvent(deps.as_ref(), &env, &config.denom, outgoing)?;
    }

    // Commit
    if state.status.is_terminated() {
        TICKET_OWNERS.clear(deps.storage);
        TIERS.save(deps.storage, &tiers)?;
        CONFIG.save(deps.storage, &config)?;
    } else {
        for ticket_number in first_ticket..=last_ticket {
            TICKET_OWNERS.save(deps.storage, ticket_number, &info.sender)?;
        }
    }
    RAFFLE_STATE.save(deps.storage, &state)?;

    let mut response = Response::new()
        .add_attribute("action", "purchase_tickets")
        .add_attribute("buyer", info.sender.to_string())
        .add_attribute("tickets_issued", issued.to_string())
        .add_attribute("current_ticket", last_ticket.to_string())
        .add_event(
            Event::new("raffle_tickets_purchased")
                .add_attribute("buyer", info.sender.to_string())
                .add_attribute("current_ticket", last_ticket.to_string())
                .add_attribute("tickets_issued", issued.to_string())
                .add_attribute("first_ticket", first_ticket.to_string())
                .add_attribute("last_ticket", last_ticket.to_string())
                .add_attribute("refund", refund.to_string()),
        );

    if !refund.is_zero() {
        response = response.add_message(BankMsg::Send {
            to_address: info.sender.to_string(),
            amount: coins(refund.u128(), &config.denom),
        });
    }

    if let Some(settlement) = settlement {
        response = response
            .add_events(drawn_events)
            .add_attribute("status", state.status.as_str());
        if let Some(seed) = &state.final_seed {
            response = response.add_attribute("seed", seed);
        }
        response = add_settlement(response, &settlement, &config.denom);
    }

    Ok(response)
}

/// Exactly one coin of `denom` worth `expected`.
fn check_payment(info: &MessageInfo, denom: &str, expected: Uint128) -> Result<(), ContractError> {
    let matches = info.funds.len() == 1
        && info.funds[0].denom == denom
        && info.funds[0].amount == expected;
    if matches {
        return Ok(());
    }

    let received = if info.funds.is_empty() {
        "nothing".to_string()
    } else {
        info.funds
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    Err(ContractError::IncorrectPayment {
        expected,
        denom: denom.to_string(),
        received,
    })
}

/// The contract must hold enough of `denom` for every transfer it is about
/// to send; a shortfall aborts the whole operation.
fn ensure_solvent(
    deps: Deps,
    env: &Env,
    denom: &str,
    needed: Uint128,
) -> Result<(), ContractError> {
    let available = deps
        .querier
        .query_balance(&env.contract.address, denom)?
        .amount;
    if available < needed {
        return Err(ContractError::TransferFailed {
            needed,
            available,
            denom: denom.to_string(),
        });
    }
    Ok(())
}

fn add_settlement(mut response: Response, settlement: &Settlement, denom: &str) -> Response {
    for transfer in &settlement.transfers {
        let event = match &transfer.kind {
            TransferKind::Fee => Event::new("raffle_fee_paid")
                .add_attribute("recipient", transfer.recipient.to_string())
                .add_attribute("amount", transfer.amount.to_string()),
            TransferKind::Prize {
                rank,
                ticket_number,
            } => Event::new("raffle_prize_paid")
                .add_attribute("tier", rank.to_string())
                .add_attribute("ticket_number", ticket_number.to_string())
                .add_attribute("winner", transfer.recipient.to_string())
                .add_attribute("amount", transfer.amount.to_string()),
            TransferKind::Settlement => Event::new("raffle_settlement_paid")
                .add_attribute("organizer", transfer.recipient.to_string())
                .add_attribute("amount", transfer.amount.to_string()),
        };

        response = response
            .add_message(BankMsg::Send {
                to_address: transfer.recipient.to_string(),
                amount: coins(transfer.amount.u128(), denom),
            })
            .add_event(event);
    }

    response.add_event(
        Event::new("raffle_settled")
            .add_attribute("fee", settlement.fee.to_string())
            .add_attribute("prizes", settlement.prizes.to_string())
            .add_attribute("organizer_amount", settlement.organizer_amount.to_string()),
    )
}

/// Emergency stop. Admin only, any stage.
///
/// Always retires the raffle. Collected funds for the round go to the admin,
/// capped at what the contract actually holds; the ticket ledger is kept so
/// buyers can be made whole off-chain. Calling it again on a retired raffle
/// changes nothing.
pub fn terminate(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can terminate".to_string(),
        });
    }

    let mut state = RAFFLE_STATE.load(deps.storage)?;
    if state.status.is_terminated() {
        return Ok(Response::new()
            .add_attribute("action", "terminate")
            .add_attribute("already_terminated", "true"));
    }

    let previous = state.status;
    let held = state.total_collected;
    let available = deps
        .querier
        .query_balance(&env.contract.address, &config.denom)?
        .amount;
    let swept = held.min(available);
    let shortfall = safe_sub(held, swept)?;

    state.total_collected = Uint128::zero();
    state.status = RaffleStatus::Terminated;
    RAFFLE_STATE.save(deps.storage, &state)?;

    let mut response = Response::new()
        .add_attribute("action", "terminate")
        .add_attribute("already_terminated", "false")
        .add_event(
            Event::new("raffle_terminated")
                .add_attribute("admin", config.admin.to_string())
                .add_attribute("previous_status", previous.as_str())
                .add_attribute("tickets_sold", state.current_ticket.to_string())
                .add_attribute("swept", swept.to_string())
                .add_attribute("shortfall", shortfall.to_string()),
        );

    if !swept.is_zero() {
        response = response.add_message(BankMsg::Send {
            to_address: config.admin.to_string(),
            amount: coins(swept.u128(), &config.denom),
        });
    }

    Ok(response)
}
