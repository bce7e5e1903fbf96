//! Integration tests for the tiered raffle.
//!
//! These tests drive the contract through its `instantiate` / `execute` /
//! `query` entry points using `cosmwasm_std::testing` mocks. The mock bank
//! is kept in step with the contract: attached funds are credited before a
//! call and every `BankMsg::Send` in a successful response is debited after
//! it, so the contract balance can be checked across a whole round.
//!
//! Run:
//! ```bash
//! cargo test -p tiered-raffle-integration-tests
//! ```

use std::collections::BTreeSet;

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coins, from_json, Addr, BankMsg, CosmosMsg, MemoryStorage, OwnedDeps, Response, Uint128,
};
use raffle_common::{FeeTiming, RaffleStatus};
use tiered_raffle::contract;
use tiered_raffle::msg::{ExecuteMsg, InstantiateMsg, QueryMsg, TicketsResponse, TiersResponse};
use tiered_raffle::state::{RaffleConfig, RaffleState};
use tiered_raffle::ContractError;

type MockDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

const DENOM: &str = "uraffle";

// ─── Bank helpers ───

fn contract_balance(deps: &MockDeps) -> u128 {
    let env = mock_env();
    deps.as_ref()
        .querier
        .query_balance(&env.contract.address, DENOM)
        .unwrap()
        .amount
        .u128()
}

fn set_contract_balance(deps: &mut MockDeps, amount: u128) {
    let env = mock_env();
    deps.querier
        .bank
        .update_balance(&env.contract.address, coins(amount, DENOM));
}

fn bank_sends(res: &Response) -> Vec<(String, u128)> {
    res.messages
        .iter()
        .filter_map(|m| match &m.msg {
            CosmosMsg::Bank(BankMsg::Send { to_address, amount }) => {
                Some((to_address.clone(), amount[0].amount.u128()))
            }
            _ => None,
        })
        .collect()
}

fn total_sent(res: &Response) -> u128 {
    bank_sends(res).iter().map(|(_, amount)| amount).sum()
}

// ─── Raffle helpers ───

fn instantiate_msg(
    pool_amount: u128,
    ticket_price: u128,
    tier_count: u8,
    fee_rate_percent: u8,
    fee_timing: FeeTiming,
) -> InstantiateMsg {
    let mock_api = MockApi::default();
    InstantiateMsg {
        organizer: mock_api.addr_make("organizer").to_string(),
        fee_recipient: mock_api.addr_make("fee_recipient").to_string(),
        fee_rate_percent,
        pool_amount: Uint128::new(pool_amount),
        ticket_price: Uint128::new(ticket_price),
        tier_count,
        denom: None,
        fee_timing: Some(fee_timing),
    }
}

fn setup_raffle(deps: &mut MockDeps, msg: InstantiateMsg, counts: &[u32], payouts: &[u128]) {
    let admin = deps.api.addr_make("admin");
    contract::instantiate(deps.as_mut(), mock_env(), message_info(&admin, &[]), msg).unwrap();
    contract::execute(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        ExecuteMsg::FillTiers {
            winner_counts: counts.to_vec(),
            winner_payouts: payouts.iter().map(|p| Uint128::new(*p)).collect(),
        },
    )
    .unwrap();
}

fn query_config(deps: &MockDeps) -> RaffleConfig {
    from_json(contract::query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap()).unwrap()
}

fn query_state(deps: &MockDeps) -> RaffleState {
    from_json(contract::query(deps.as_ref(), mock_env(), QueryMsg::State {}).unwrap()).unwrap()
}

fn query_tiers(deps: &MockDeps) -> TiersResponse {
    from_json(contract::query(deps.as_ref(), mock_env(), QueryMsg::Tiers {}).unwrap()).unwrap()
}

/// Buy at `height`, moving funds through the mock bank the way the chain would.
fn purchase(
    deps: &mut MockDeps,
    height: u64,
    buyer: &Addr,
    quantity: u64,
) -> Result<Response, ContractError> {
    let price = query_config(deps).ticket_price.u128();
    let funds = price * quantity as u128;
    let before = contract_balance(deps);
    set_contract_balance(deps, before + funds);

    let mut env = mock_env();
    env.block.height = height;
    let result = contract::execute(
        deps.as_mut(),
        env,
        message_info(buyer, &coins(funds, DENOM)),
        ExecuteMsg::PurchaseTickets { quantity },
    );

    match &result {
        Ok(res) => {
            let after = contract_balance(deps) - total_sent(res);
            set_contract_balance(deps, after);
        }
        Err(_) => set_contract_balance(deps, before),
    }
    result
}

fn all_tickets(deps: &MockDeps, page_size: u32) -> Vec<(u64, Addr)> {
    let mut out = Vec::new();
    let mut start_after = None;
    loop {
        let page: TicketsResponse = from_json(
            contract::query(
                deps.as_ref(),
                mock_env(),
                QueryMsg::Tickets {
                    start_after,
                    limit: Some(page_size),
                },
            )
            .unwrap(),
        )
        .unwrap();
        if page.tickets.is_empty() {
            return out;
        }
        start_after = page.tickets.last().map(|t| t.ticket_number);
        out.extend(page.tickets.into_iter().map(|t| (t.ticket_number, t.owner)));
    }
}

// ─── Tests ───

#[test]
fn test_full_round_many_buyers() {
    // 100 tickets, 14 winners across 3 tiers, 5% fee
    let mut deps = mock_dependencies();
    setup_raffle(
        &mut deps,
        instantiate_msg(10_000, 100, 3, 5, FeeTiming::BeforePrizes),
        &[1, 3, 10],
        &[3_000, 1_000, 200],
    );

    let buyers: Vec<Addr> = (0..7)
        .map(|i| deps.api.addr_make(&format!("buyer{}", i)))
        .collect();
    let quantities = [3u64, 11, 7, 1, 20, 9, 14];

    // ledger[n - 1] owns ticket n
    let mut ledger: Vec<Addr> = Vec::new();
    let mut height = 1_000;
    let mut round = 0;
    let last_response = loop {
        let buyer = &buyers[round % buyers.len()];
        let quantity = quantities[round % quantities.len()];
        let remaining = 100 - ledger.len() as u64;

        // Ledger is gap-free and matches every purchase so far
        let recorded = all_tickets(&deps, 7);
        assert_eq!(recorded.len(), ledger.len());
        for (i, (number, owner)) in recorded.iter().enumerate() {
            assert_eq!(*number, i as u64 + 1);
            assert_eq!(owner, &ledger[i]);
        }

        let res = purchase(&mut deps, height, buyer, quantity).unwrap();
        for _ in 0..quantity.min(remaining) {
            ledger.push(buyer.clone());
        }
        height += 1;
        round += 1;

        if query_state(&deps).status == RaffleStatus::Terminated {
            break res;
        }
        assert!(bank_sends(&res).is_empty());
        assert_eq!(contract_balance(&deps), ledger.len() as u128 * 100);
    };

    assert_eq!(ledger.len(), 100);

    // 14 distinct winners, each owned by whoever bought that number
    let tiers = query_tiers(&deps).tiers;
    let mut seen = BTreeSet::new();
    for tier in &tiers {
        assert_eq!(tier.winners.len(), tier.winner_count as usize);
        for winner in &tier.winners {
            assert!((1..=100).contains(&winner.ticket_number));
            assert!(seen.insert(winner.ticket_number));
            assert_eq!(winner.owner, ledger[winner.ticket_number as usize - 1]);
        }
    }
    assert_eq!(seen.len(), 14);

    // Every coin collected leaves the contract
    let sends = bank_sends(&last_response);
    let fee_recipient = deps.api.addr_make("fee_recipient").to_string();
    let organizer = deps.api.addr_make("organizer").to_string();
    // The 12th purchase asked for 20 with 13 left: change for 7 goes first
    assert_eq!(sends.len(), 17);
    assert_eq!(sends[0], (buyers[4].to_string(), 700));
    assert_eq!(sends[1], (fee_recipient, 500));
    assert_eq!(sends.last(), Some(&(organizer, 1_500)));
    let prizes: u128 = sends[2..16].iter().map(|(_, amount)| amount).sum();
    assert_eq!(prizes, 8_000);
    assert_eq!(contract_balance(&deps), 0);

    let state = query_state(&deps);
    assert_eq!(state.current_ticket, 0);
    assert_eq!(state.total_collected, Uint128::zero());
    assert!(state.final_seed.is_some());
    assert!(all_tickets(&deps, 50).is_empty());
    assert_eq!(query_config(&deps).fee_rate_percent, 0);

    // Retired
    let late = deps.api.addr_make("late");
    let err = purchase(&mut deps, height, &late, 1).unwrap_err();
    assert!(matches!(err, ContractError::SoldOut));
    assert_eq!(contract_balance(&deps), 0);
}

#[test]
fn test_fee_timing_changes_order_not_amounts() {
    let run = |timing: FeeTiming| {
        let mut deps = mock_dependencies();
        setup_raffle(
            &mut deps,
            instantiate_msg(1_000, 20, 2, 7, timing),
            &[1, 2],
            &[500, 100],
        );
        let alice = deps.api.addr_make("alice");
        let bob = deps.api.addr_make("bob");
        purchase(&mut deps, 10, &alice, 25).unwrap();
        let res = purchase(&mut deps, 11, &bob, 25).unwrap();
        assert_eq!(contract_balance(&deps), 0);
        bank_sends(&res)
    };

    let before = run(FeeTiming::BeforePrizes);
    let after = run(FeeTiming::AfterPrizes);
    let fee_recipient = MockApi::default().addr_make("fee_recipient").to_string();

    assert_eq!(before[0], (fee_recipient.clone(), 70));
    assert_eq!(after[3], (fee_recipient, 70));

    // Same draw, same recipients; only the fee moves
    let mut sorted_before = before.clone();
    let mut sorted_after = after.clone();
    sorted_before.sort();
    sorted_after.sort();
    assert_eq!(sorted_before, sorted_after);
    assert_eq!(before[1..4], after[0..3]);
}

#[test]
fn test_shortfall_aborts_then_retry_succeeds() {
    let mut deps = mock_dependencies();
    setup_raffle(
        &mut deps,
        instantiate_msg(1_000, 100, 1, 10, FeeTiming::BeforePrizes),
        &[1],
        &[800],
    );
    let alice = deps.api.addr_make("alice");
    let bob = deps.api.addr_make("bob");
    purchase(&mut deps, 50, &alice, 9).unwrap();

    // Funds went missing from the contract
    set_contract_balance(&mut deps, 500);
    let state_before = query_state(&deps);
    let tiers_before = query_tiers(&deps);

    let err = purchase(&mut deps, 51, &bob, 1).unwrap_err();
    assert!(matches!(
        err,
        ContractError::TransferFailed { needed, .. } if needed == Uint128::new(1_000)
    ));
    assert_eq!(query_state(&deps), state_before);
    assert_eq!(query_tiers(&deps), tiers_before);
    assert_eq!(all_tickets(&deps, 50).len(), 9);
    assert_eq!(query_config(&deps).fee_rate_percent, 10);

    // Topped back up: the same purchase now completes the round
    set_contract_balance(&mut deps, 900);
    let res = purchase(&mut deps, 52, &bob, 1).unwrap();
    assert_eq!(total_sent(&res), 1_000);
    assert_eq!(contract_balance(&deps), 0);
    assert_eq!(query_state(&deps).status, RaffleStatus::Terminated);
}

#[test]
fn test_terminate_after_funds_went_missing() {
    let mut deps = mock_dependencies();
    setup_raffle(
        &mut deps,
        instantiate_msg(1_000, 100, 1, 10, FeeTiming::BeforePrizes),
        &[1],
        &[800],
    );
    let admin = deps.api.addr_make("admin");
    let alice = deps.api.addr_make("alice");
    purchase(&mut deps, 50, &alice, 9).unwrap();
    set_contract_balance(&mut deps, 500);

    let res = contract::execute(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        ExecuteMsg::Terminate {},
    )
    .unwrap();
    assert_eq!(bank_sends(&res), vec![(admin.to_string(), 500)]);

    let state = query_state(&deps);
    assert_eq!(state.status, RaffleStatus::Terminated);
    assert_eq!(state.total_collected, Uint128::zero());
    assert_eq!(all_tickets(&deps, 50).len(), 9);
}

#[test]
fn test_terminate_mid_sale() {
    let mut deps = mock_dependencies();
    setup_raffle(
        &mut deps,
        instantiate_msg(1_000, 20, 2, 7, FeeTiming::BeforePrizes),
        &[1, 2],
        &[500, 100],
    );
    let admin = deps.api.addr_make("admin");
    let alice = deps.api.addr_make("alice");
    let bob = deps.api.addr_make("bob");
    purchase(&mut deps, 10, &alice, 4).unwrap();
    purchase(&mut deps, 11, &bob, 6).unwrap();

    let res = contract::execute(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        ExecuteMsg::Terminate {},
    )
    .unwrap();
    assert_eq!(bank_sends(&res), vec![(admin.to_string(), 200)]);
    let remaining = contract_balance(&deps) - total_sent(&res);
    set_contract_balance(&mut deps, remaining);
    assert_eq!(contract_balance(&deps), 0);

    // Ledger stays for reconciliation
    let tickets = all_tickets(&deps, 3);
    assert_eq!(tickets.len(), 10);
    assert!(tickets[..4].iter().all(|(_, owner)| *owner == alice));
    assert!(tickets[4..].iter().all(|(_, owner)| *owner == bob));

    let state = query_state(&deps);
    assert_eq!(state.status, RaffleStatus::Terminated);
    assert_eq!(state.current_ticket, 10);
    assert_eq!(state.total_collected, Uint128::zero());
    assert!(state.final_seed.is_none());

    let err = purchase(&mut deps, 12, &alice, 1).unwrap_err();
    assert!(matches!(err, ContractError::SoldOut));

    let res = contract::execute(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        ExecuteMsg::Terminate {},
    )
    .unwrap();
    assert!(res.messages.is_empty());
    assert_eq!(query_state(&deps), state);
}

#[test]
fn test_pool_not_multiple_of_price() {
    // ceil(1001 / 20) = 51 tickets, so 1020 is collected
    let mut deps = mock_dependencies();
    setup_raffle(
        &mut deps,
        instantiate_msg(1_001, 20, 1, 10, FeeTiming::BeforePrizes),
        &[1],
        &[900],
    );
    assert_eq!(query_config(&deps).number_of_tickets, 51);

    let alice = deps.api.addr_make("alice");
    let bob = deps.api.addr_make("bob");
    purchase(&mut deps, 10, &alice, 50).unwrap();
    let res = purchase(&mut deps, 11, &bob, 3).unwrap();

    let sends = bank_sends(&res);
    let organizer = deps.api.addr_make("organizer").to_string();
    // Change for 2 unissued tickets, fee, prize, remainder
    assert_eq!(sends[0], (bob.to_string(), 40));
    assert_eq!(sends[1].1, 102);
    assert_eq!(sends[2].1, 900);
    assert_eq!(sends[3], (organizer, 18));
    assert_eq!(contract_balance(&deps), 0);
}

#[test]
fn test_exact_payout_has_no_remainder() {
    let mut deps = mock_dependencies();
    setup_raffle(
        &mut deps,
        instantiate_msg(1_000, 100, 1, 0, FeeTiming::BeforePrizes),
        &[2],
        &[500],
    );
    let alice = deps.api.addr_make("alice");
    let res = purchase(&mut deps, 10, &alice, 10).unwrap();

    let sends = bank_sends(&res);
    assert_eq!(
        sends,
        vec![(alice.to_string(), 500), (alice.to_string(), 500)]
    );
    assert!(!res.events.iter().any(|e| e.ty == "raffle_fee_paid"));
    assert!(!res.events.iter().any(|e| e.ty == "raffle_settlement_paid"));
}

#[test]
fn test_seed_follows_purchase_sequence() {
    let run = |splits: &[(u64, u64)]| {
        let mut deps = mock_dependencies();
        setup_raffle(
            &mut deps,
            instantiate_msg(1_000, 100, 1, 0, FeeTiming::BeforePrizes),
            &[1],
            &[1_000],
        );
        let buyer = deps.api.addr_make("buyer");
        for (height, quantity) in splits {
            purchase(&mut deps, *height, &buyer, *quantity).unwrap();
        }
        query_state(&deps).final_seed.unwrap()
    };

    let a = run(&[(10, 4), (11, 6)]);
    let b = run(&[(10, 4), (11, 6)]);
    let c = run(&[(10, 5), (12, 5)]);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
}
