pub mod math;
pub mod types;

pub use math::{ceil_div, safe_add, safe_div, safe_increment, safe_mul, safe_sub, MathError};
pub use types::{FeeTiming, RaffleStatus};
