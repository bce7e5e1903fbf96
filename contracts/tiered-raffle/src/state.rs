use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Uint128};
use cw_storage_plus::{Item, Map};
use raffle_common::{FeeTiming, RaffleStatus};

use crate::entropy::RandomnessAccumulator;

pub const CONFIG: Item<RaffleConfig> = Item::new("config");
pub const RAFFLE_STATE: Item<RaffleState> = Item::new("raffle_state");
/// Ordered by rank; empty until `FillTiers` runs.
pub const TIERS: Item<Vec<PrizeTier>> = Item::new("tiers");
/// Ticket number (1-based) → buyer.
pub const TICKET_OWNERS: Map<u64, Addr> = Map::new("ticket_owners");

#[cw_serde]
pub struct RaffleConfig {
    pub admin: Addr,
    pub organizer: Addr,
    pub fee_recipient: Addr,
    /// Percentage of the collected total paid to `fee_recipient` (0–99).
    /// Zeroed once the fee has been charged.
    pub fee_rate_percent: u8,
    pub fee_timing: FeeTiming,
    pub pool_amount: Uint128,
    pub ticket_price: Uint128,
    pub tier_count: u8,
    /// `ceil(pool_amount / ticket_price)`
    pub number_of_tickets: u64,
    pub denom: String,
}

#[cw_serde]
pub struct RaffleState {
    pub status: RaffleStatus,
    /// Last ticket number issued; 0 before the first sale.
    pub current_ticket: u64,
    pub total_collected: Uint128,
    pub accumulator: RandomnessAccumulator,
    /// Finalized seed, hex-encoded, recorded once the draw has run.
    pub final_seed: Option<String>,
}

impl RaffleState {
    pub fn new(accumulator: RandomnessAccumulator) -> Self {
        RaffleState {
            status: RaffleStatus::Filling,
            current_ticket: 0,
            total_collected: Uint128::zero(),
            accumulator,
            final_seed: None,
        }
    }

    pub fn is_sold_out(&self, config: &RaffleConfig) -> bool {
        self.current_ticket >= config.number_of_tickets
    }
}

#[cw_serde]
pub struct PrizeTier {
    pub winner_count: u32,
    /// Paid to every winner of this tier.
    pub payout: Uint128,
    /// Filled by the draw, one entry per winner slot in slot order.
    pub winners: Vec<WinningTicket>,
}

impl PrizeTier {
    pub fn new(winner_count: u32, payout: Uint128) -> Self {
        PrizeTier {
            winner_count,
            payout,
            winners: Vec::with_capacity(winner_count as usize),
        }
    }

    pub fn winning_numbers(&self) -> impl Iterator<Item = u64> + '_ {
        self.winners.iter().map(|w| w.ticket_number)
    }
}

#[cw_serde]
pub struct WinningTicket {
    pub ticket_number: u64,
    pub owner: Addr,
}
