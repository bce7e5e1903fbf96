pub mod contract;
pub mod draw;
pub mod entropy;
pub mod error;
pub mod execute;
pub mod msg;
pub mod payout;
pub mod query;
pub mod state;

pub use crate::error::ContractError;
