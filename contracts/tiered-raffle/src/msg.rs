use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};
use raffle_common::{FeeTiming, RaffleStatus};

use crate::state::{PrizeTier, RaffleConfig, RaffleState};

#[cw_serde]
pub struct InstantiateMsg {
    /// Receives whatever is left after the fee and all prizes.
    pub organizer: String,
    pub fee_recipient: String,
    /// 0–99; anything higher is rejected.
    pub fee_rate_percent: u8,
    /// Zero falls back to the default pool.
    pub pool_amount: Uint128,
    /// Out of range falls back to the default price (capped at the pool).
    pub ticket_price: Uint128,
    /// Out of range falls back to a single tier.
    pub tier_count: u8,
    /// Payment denom, defaults to `uraffle`.
    pub denom: Option<String>,
    /// Defaults to paying the fee before prizes.
    pub fee_timing: Option<FeeTiming>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Set winner count and per-winner payout for every tier. Admin only, once.
    FillTiers {
        winner_counts: Vec<u32>,
        winner_payouts: Vec<Uint128>,
    },
    /// Buy `quantity` tickets; attach exactly `ticket_price * quantity`.
    /// Buying the last ticket runs the draw and pays out in the same call.
    PurchaseTickets { quantity: u64 },
    /// Retire the raffle at any stage. Admin only.
    Terminate {},
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(RaffleConfig)]
    Config {},
    #[returns(RaffleState)]
    State {},
    #[returns(SummaryResponse)]
    Summary {},
    #[returns(TiersResponse)]
    Tiers {},
    #[returns(PrizeTier)]
    Tier { rank: u8 },
    #[returns(TicketOwnerResponse)]
    TicketOwner { ticket_number: u64 },
    #[returns(TicketsResponse)]
    Tickets {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
}

#[cw_serde]
pub struct SummaryResponse {
    pub status: RaffleStatus,
    pub ticket_price: Uint128,
    pub pool_amount: Uint128,
    pub tier_count: u8,
    pub number_of_tickets: u64,
    pub current_ticket: u64,
    pub total_collected: Uint128,
    pub denom: String,
}

#[cw_serde]
pub struct TiersResponse {
    pub tiers: Vec<PrizeTier>,
}

#[cw_serde]
pub struct TicketOwnerResponse {
    pub ticket_number: u64,
    pub owner: Option<Addr>,
}

#[cw_serde]
pub struct TicketEntry {
    pub ticket_number: u64,
    pub owner: Addr,
}

#[cw_serde]
pub struct TicketsResponse {
    pub tickets: Vec<TicketEntry>,
}
