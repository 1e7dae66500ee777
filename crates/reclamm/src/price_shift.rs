//! Conversions between the externally configured daily price shift exponent
//! (`1e18` = 100% per day) and the per-second decay base used by range
//! tracking.
//!
//! `124649 ≈ 86400 / ln(2)`: with a 100% exponent the overvalued virtual
//! balance halves (and the price doubles) roughly once per day. Both
//! conversions truncate, so they are not exact inverses of each other.

use {
    crate::{error::Error, fixed_point::Bfp},
    primitive_types::U256,
    std::sync::LazyLock,
};

const SHIFT_EXPONENT_INTERNAL_ADJUSTMENT: u64 = 124_649;

/// Largest accepted daily price shift exponent, 100% per day.
pub static MAX_DAILY_PRICE_SHIFT_EXPONENT: LazyLock<Bfp> = LazyLock::new(Bfp::one);

pub fn to_daily_price_shift_base(daily_price_shift_exponent: Bfp) -> Result<Bfp, Error> {
    if daily_price_shift_exponent > *MAX_DAILY_PRICE_SHIFT_EXPONENT {
        return Err(Error::InvalidDailyPriceShiftExponent);
    }
    let per_second = daily_price_shift_exponent.as_uint256()
        / U256::from(SHIFT_EXPONENT_INTERNAL_ADJUSTMENT);
    Ok(Bfp::from_wei(per_second).complement())
}

pub fn to_daily_price_shift_exponent(daily_price_shift_base: Bfp) -> Result<Bfp, Error> {
    let per_second = Bfp::one().sub(daily_price_shift_base)?;
    per_second
        .as_uint256()
        .checked_mul(U256::from(SHIFT_EXPONENT_INTERNAL_ADJUSTMENT))
        .map(Bfp::from_wei)
        .ok_or(Error::MulOverflow)
}

/// Checks that `daily_price_shift_base` is one that an accepted exponent
/// converts to: at most one, and not decaying faster than 100% per day.
pub fn validate_daily_price_shift_base(daily_price_shift_base: Bfp) -> Result<(), Error> {
    if daily_price_shift_base > Bfp::one()
        || to_daily_price_shift_exponent(daily_price_shift_base)?
            > *MAX_DAILY_PRICE_SHIFT_EXPONENT
    {
        return Err(Error::InvalidDailyPriceShiftBase);
    }
    Ok(())
}
