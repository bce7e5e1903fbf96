use cosmwasm_schema::cw_serde;

/// Lifecycle of a raffle instance. Configuring is the instantiate call
/// itself; `Drawing` and `Distributing` only exist while the final purchase
/// is being processed and are never observed in storage.
#[cw_serde]
#[derive(Copy)]
pub enum RaffleStatus {
    Filling,
    Selling,
    Drawing,
    Distributing,
    Terminated,
}

impl RaffleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaffleStatus::Filling => "filling",
            RaffleStatus::Selling => "selling",
            RaffleStatus::Drawing => "drawing",
            RaffleStatus::Distributing => "distributing",
            RaffleStatus::Terminated => "terminated",
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, RaffleStatus::Terminated)
    }
}

/// Whether the fee-recipient share is paid before or after the per-winner prizes.
/// The fee amount is the same either way; only transfer and event order differ.
#[cw_serde]
#[derive(Copy, Default)]
pub enum FeeTiming {
    #[default]
    BeforePrizes,
    AfterPrizes,
}
