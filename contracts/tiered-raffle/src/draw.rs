use cosmwasm_std::{Uint128, Uint256};
use raffle_common::MathError;
use sha2::{Digest, Sha256};

use crate::error::ContractError;

/// Select winning ticket numbers for every tier.
///
/// Tiers are walked in rank order and slots in slot order. Each slot takes
/// `(seed mod number_of_tickets) + 1`; while that number is already held by
/// any earlier slot the seed is re-hashed with `marker` and the slot redraws.
/// Returns one vector of ticket numbers per tier.
pub fn draw_winning_numbers(
    winner_counts: &[u32],
    number_of_tickets: u64,
    seed: [u8; 32],
    marker: u64,
) -> Result<Vec<Vec<u64>>, ContractError> {
    let total_winners: u64 = winner_counts.iter().map(|&c| u64::from(c)).sum();
    if total_winners > number_of_tickets {
        return Err(ContractError::OversubscribedTiers {
            total_winners,
            number_of_tickets,
        });
    }

    let mut seed = seed;
    let mut drawn: Vec<Vec<u64>> = Vec::with_capacity(winner_counts.len());

    for &count in winner_counts {
        drawn.push(Vec::with_capacity(count as usize));
        for _ in 0..count {
            let mut candidate = candidate_from_seed(&seed, number_of_tickets)?;
            while find_drawn(&drawn, candidate).is_some() {
                seed = remix(&seed, marker);
                candidate = candidate_from_seed(&seed, number_of_tickets)?;
            }
            if let Some(tier) = drawn.last_mut() {
                tier.push(candidate);
            }
        }
    }

    Ok(drawn)
}

/// First slot already holding `candidate`, scanning ranks ascending and then
/// slots ascending.
pub fn find_drawn(drawn: &[Vec<u64>], candidate: u64) -> Option<(usize, usize)> {
    for (rank, slots) in drawn.iter().enumerate() {
        for (slot, &number) in slots.iter().enumerate() {
            if number == candidate {
                return Some((rank, slot));
            }
        }
    }
    None
}

/// `(uint256(seed) mod number_of_tickets) + 1`
pub fn candidate_from_seed(seed: &[u8; 32], number_of_tickets: u64) -> Result<u64, ContractError> {
    if number_of_tickets == 0 {
        return Err(MathError::DivisionByZero {
            dividend: Uint128::zero(),
        }
        .into());
    }

    let remainder = Uint256::from_be_bytes(*seed) % Uint256::from(number_of_tickets);

    // remainder < number_of_tickets, so it fits in the low 8 bytes
    let bytes = remainder.to_be_bytes();
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[24..32]);
    Ok(u64::from_be_bytes(low) + 1)
}

/// `sha256(marker || seed)`
pub fn remix(seed: &[u8; 32], marker: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(marker.to_be_bytes());
    hasher.update(seed);
    hasher.finalize().into()
}
