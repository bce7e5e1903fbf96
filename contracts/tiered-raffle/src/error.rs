use cosmwasm_std::{StdError, Uint128};
use raffle_common::MathError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Math(#[from] MathError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("prize tiers are already configured")]
    AlreadyConfigured,

    #[error("tier count mismatch: expected {expected}, got {winner_counts} winner counts and {winner_payouts} payouts")]
    TierCountMismatch {
        expected: u8,
        winner_counts: usize,
        winner_payouts: usize,
    },

    #[error("tiers declare {total_winners} winners but only {number_of_tickets} tickets exist")]
    OversubscribedTiers {
        total_winners: u64,
        number_of_tickets: u64,
    },

    #[error("prize liability {liability} plus fee {fee} exceeds the {collected} collected at sell-out")]
    PayoutsExceedPool {
        liability: Uint128,
        fee: Uint128,
        collected: Uint128,
    },

    #[error("raffle is sold out")]
    SoldOut,

    #[error("tiers can only be filled before the sale (status: {status})")]
    NotFilling { status: String },

    #[error("raffle is not selling tickets (status: {status})")]
    NotSelling { status: String },

    #[error("must purchase at least one ticket")]
    ZeroQuantity,

    #[error("incorrect payment: expected {expected}{denom}, got {received}")]
    IncorrectPayment {
        expected: Uint128,
        denom: String,
        received: String,
    },

    #[error("transfer failed: contract holds {available}{denom}, needs {needed}{denom}")]
    TransferFailed {
        needed: Uint128,
        available: Uint128,
        denom: String,
    },
}
