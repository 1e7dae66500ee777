use {
    crate::{error::Error, fixed_point::Bfp, price_shift::MAX_DAILY_PRICE_SHIFT_EXPONENT},
    primitive_types::U256,
    serde::{Deserialize, Serialize},
    std::sync::LazyLock,
};

/// Largest accepted centeredness margin, 90%.
pub static MAX_CENTEREDNESS_MARGIN: LazyLock<Bfp> =
    LazyLock::new(|| Bfp::from_wei(U256::exp10(17) * 9));

/// Creation parameters of a pool. Prices are of token A in terms of token B
/// and, like all fixed point values, are written as decimal strings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PoolConfig {
    pub min_price: Bfp,
    pub max_price: Bfp,
    pub target_price: Bfp,
    pub centeredness_margin: Bfp,
    /// Speed at which the price interval follows the market when the pool is
    /// out of range, `1.0` being 100% per day.
    pub daily_price_shift_exponent: Bfp,
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_price.is_zero()
            || self.min_price >= self.target_price
            || self.target_price >= self.max_price
        {
            return Err(Error::InvalidPriceRange);
        }
        validate_centeredness_margin(self.centeredness_margin)?;
        validate_daily_price_shift_exponent(self.daily_price_shift_exponent)
    }
}

pub fn validate_centeredness_margin(centeredness_margin: Bfp) -> Result<(), Error> {
    if centeredness_margin > *MAX_CENTEREDNESS_MARGIN {
        return Err(Error::InvalidCenterednessMargin);
    }
    Ok(())
}

pub fn validate_daily_price_shift_exponent(daily_price_shift_exponent: Bfp) -> Result<(), Error> {
    if daily_price_shift_exponent > *MAX_DAILY_PRICE_SHIFT_EXPONENT {
        return Err(Error::InvalidDailyPriceShiftExponent);
    }
    Ok(())
}
