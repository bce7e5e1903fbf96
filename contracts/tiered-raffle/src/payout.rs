use cosmwasm_std::{Addr, Uint128};
use raffle_common::{safe_add, safe_div, safe_mul, safe_sub, FeeTiming, MathError, RaffleStatus};

use crate::error::ContractError;
use crate::state::{PrizeTier, RaffleConfig, RaffleState};

const PERCENT_DENOMINATOR: Uint128 = Uint128::new(100);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferKind {
    Fee,
    Prize { rank: usize, ticket_number: u64 },
    Settlement,
}

/// A single outgoing payment, in the order it must be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub recipient: Addr,
    pub amount: Uint128,
    pub kind: TransferKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub transfers: Vec<Transfer>,
    pub fee: Uint128,
    pub prizes: Uint128,
    pub organizer_amount: Uint128,
}

impl Settlement {
    pub fn total_out(&self) -> Result<Uint128, MathError> {
        self.transfers
            .iter()
            .try_fold(Uint128::zero(), |acc, t| safe_add(acc, t.amount))
    }
}

/// Both gates for draw and distribution: the sale has collected at least the
/// pool amount and every tier has been filled.
pub fn gate_open(config: &RaffleConfig, state: &RaffleState, tiers: &[PrizeTier]) -> bool {
    state.total_collected >= config.pool_amount
        && !tiers.is_empty()
        && tiers.len() == config.tier_count as usize
}

/// `floor(total * rate / 100)`
pub fn compute_fee(total: Uint128, fee_rate_percent: u8) -> Result<Uint128, MathError> {
    safe_div(
        safe_mul(total, Uint128::from(fee_rate_percent))?,
        PERCENT_DENOMINATOR,
    )
}

/// Work out every payment for a completed draw and retire the round.
///
/// `tiers` must already carry their winners. On success the fee rate is
/// zeroed, the counters are reset and the state is `Terminated`; on error
/// neither `config` nor `state` has been touched. Returns `None` when the
/// gate is closed.
pub fn settle(
    config: &mut RaffleConfig,
    state: &mut RaffleState,
    tiers: &[PrizeTier],
) -> Result<Option<Settlement>, ContractError> {
    if !gate_open(config, state, tiers) {
        return Ok(None);
    }

    let collected = state.total_collected;
    let mut remaining = collected;
    let mut transfers = Vec::new();

    let (fee, prizes) = match config.fee_timing {
        FeeTiming::BeforePrizes => {
            let fee = charge_fee(config, collected, &mut remaining, &mut transfers)?;
            let prizes = pay_prizes(tiers, &mut remaining, &mut transfers)?;
            (fee, prizes)
        }
        FeeTiming::AfterPrizes => {
            let prizes = pay_prizes(tiers, &mut remaining, &mut transfers)?;
            let fee = charge_fee(config, collected, &mut remaining, &mut transfers)?;
            (fee, prizes)
        }
    };

    if !remaining.is_zero() {
        transfers.push(Transfer {
            recipient: config.organizer.clone(),
            amount: remaining,
            kind: TransferKind::Settlement,
        });
    }

    config.fee_rate_percent = 0;
    state.current_ticket = 0;
    state.total_collected = Uint128::zero();
    state.status = RaffleStatus::Terminated;

    Ok(Some(Settlement {
        transfers,
        fee,
        prizes,
        organizer_amount: remaining,
    }))
}

fn charge_fee(
    config: &RaffleConfig,
    collected: Uint128,
    remaining: &mut Uint128,
    transfers: &mut Vec<Transfer>,
) -> Result<Uint128, MathError> {
    if config.fee_rate_percent == 0 {
        return Ok(Uint128::zero());
    }

    let fee = compute_fee(collected, config.fee_rate_percent)?;
    *remaining = safe_sub(*remaining, fee)?;
    if !fee.is_zero() {
        transfers.push(Transfer {
            recipient: config.fee_recipient.clone(),
            amount: fee,
            kind: TransferKind::Fee,
        });
    }
    Ok(fee)
}

fn pay_prizes(
    tiers: &[PrizeTier],
    remaining: &mut Uint128,
    transfers: &mut Vec<Transfer>,
) -> Result<Uint128, MathError> {
    let mut paid = Uint128::zero();
    for (rank, tier) in tiers.iter().enumerate() {
        for winner in &tier.winners {
            *remaining = safe_sub(*remaining, tier.payout)?;
            paid = safe_add(paid, tier.payout)?;
            if tier.payout.is_zero() {
                continue;
            }
            transfers.push(Transfer {
                recipient: winner.owner.clone(),
                amount: tier.payout,
                kind: TransferKind::Prize {
                    rank,
                    ticket_number: winner.ticket_number,
                },
            });
        }
    }
    Ok(paid)
}
