//! Time interpolation of the fourth root of the pool price ratio.
//!
//! The price ratio (max price / min price of the current curve) moves
//! geometrically between two endpoints over a time window. Its fourth root is
//! the quantity that is stored and interpolated, since that is what the
//! virtual balance formulas consume.

use {
    crate::{error::Error, fixed_point::Bfp},
    primitive_types::U256,
    serde::{Deserialize, Serialize},
};

/// Snapshot of one in-flight price ratio update.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRatioState {
    pub start_fourth_root_price_ratio: Bfp,
    pub end_fourth_root_price_ratio: Bfp,
    pub price_ratio_update_start_time: u64,
    pub price_ratio_update_end_time: u64,
}

impl PriceRatioState {
    /// A state that is not updating and holds `fourth_root_price_ratio` from
    /// `timestamp` on.
    pub fn constant(fourth_root_price_ratio: Bfp, timestamp: u64) -> Self {
        Self {
            start_fourth_root_price_ratio: fourth_root_price_ratio,
            end_fourth_root_price_ratio: fourth_root_price_ratio,
            price_ratio_update_start_time: timestamp,
            price_ratio_update_end_time: timestamp,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.price_ratio_update_start_time > self.price_ratio_update_end_time {
            return Err(Error::InvalidUpdateWindow);
        }
        if self.start_fourth_root_price_ratio <= Bfp::one()
            || self.end_fourth_root_price_ratio <= Bfp::one()
        {
            return Err(Error::InvalidFourthRootPriceRatio);
        }
        Ok(())
    }

    /// Whether virtual balances must be recomputed for the price ratio when
    /// moving from `last_timestamp` to `current_timestamp`.
    ///
    /// The window is half-open: an interaction strictly after the start
    /// recenters, and it keeps doing so for every interaction whose previous
    /// update happened before the end. The first interaction at or after the
    /// end therefore still applies the final value once.
    pub fn is_updating(&self, last_timestamp: u64, current_timestamp: u64) -> bool {
        current_timestamp > self.price_ratio_update_start_time
            && last_timestamp < self.price_ratio_update_end_time
    }

    pub fn fourth_root_price_ratio_at(&self, current_time: u64) -> Result<Bfp, Error> {
        compute_fourth_root_price_ratio(current_time, self)
    }
}

/// Interpolates the fourth root of the price ratio at `current_time`.
pub fn compute_fourth_root_price_ratio(
    current_time: u64,
    state: &PriceRatioState,
) -> Result<Bfp, Error> {
    let start = state.start_fourth_root_price_ratio;
    let end = state.end_fourth_root_price_ratio;

    if current_time >= state.price_ratio_update_end_time {
        return Ok(end);
    } else if current_time <= state.price_ratio_update_start_time {
        return Ok(start);
    }

    if start == end {
        return Ok(end);
    }

    // Strictly inside the window, so the duration is non-zero.
    let elapsed = current_time - state.price_ratio_update_start_time;
    let duration = state.price_ratio_update_end_time - state.price_ratio_update_start_time;
    let exponent = Bfp::from_wei(U256::from(elapsed))
        .div_down(Bfp::from_wei(U256::from(duration)))?;

    // start * (end / start)^exponent, with both powers taken separately so
    // that close endpoints do not lose precision in the ratio.
    let current = start
        .mul_down(end.pow_down(exponent)?)?
        .div_down(start.pow_down(exponent)?)?;

    Ok(current.max(start.min(end)))
}
