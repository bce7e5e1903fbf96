use cosmwasm_std::Uint128;
use thiserror::Error;

/// Failure of a checked arithmetic step. Every amount and counter in the
/// raffle goes through these helpers so that a bad configuration surfaces as
/// an error instead of a wrapped or panicking value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow: {operation}({left}, {right})")]
    ArithmeticOverflow {
        operation: &'static str,
        left: Uint128,
        right: Uint128,
    },

    #[error("arithmetic underflow: {left} - {right}")]
    ArithmeticUnderflow { left: Uint128, right: Uint128 },

    #[error("division by zero: {dividend} / 0")]
    DivisionByZero { dividend: Uint128 },
}

/// `a + b`, failing when the sum wraps below either operand.
pub fn safe_add(a: Uint128, b: Uint128) -> Result<Uint128, MathError> {
    let sum = a.wrapping_add(b);
    if sum < a || sum < b {
        return Err(MathError::ArithmeticOverflow {
            operation: "add",
            left: a,
            right: b,
        });
    }
    Ok(sum)
}

/// `a - b`, failing when `b > a`.
pub fn safe_sub(a: Uint128, b: Uint128) -> Result<Uint128, MathError> {
    if b > a {
        return Err(MathError::ArithmeticUnderflow { left: a, right: b });
    }
    Ok(a - b)
}

/// `a * b`, failing when the product does not divide back to `a`.
pub fn safe_mul(a: Uint128, b: Uint128) -> Result<Uint128, MathError> {
    if b.is_zero() {
        return Ok(Uint128::zero());
    }
    let product = a.wrapping_mul(b);
    if product / b != a {
        return Err(MathError::ArithmeticOverflow {
            operation: "mul",
            left: a,
            right: b,
        });
    }
    Ok(product)
}

/// Floor division `a / b`.
pub fn safe_div(a: Uint128, b: Uint128) -> Result<Uint128, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero { dividend: a });
    }
    Ok(a / b)
}

/// Ceiling division, used to derive the ticket count from pool and price.
pub fn ceil_div(a: Uint128, b: Uint128) -> Result<Uint128, MathError> {
    let quotient = safe_div(a, b)?;
    if safe_mul(quotient, b)? == a {
        Ok(quotient)
    } else {
        safe_add(quotient, Uint128::one())
    }
}

/// Advance a ticket counter by one.
pub fn safe_increment(counter: u64) -> Result<u64, MathError> {
    counter
        .checked_add(1)
        .ok_or(MathError::ArithmeticOverflow {
            operation: "increment",
            left: Uint128::from(counter),
            right: Uint128::one(),
        })
}
