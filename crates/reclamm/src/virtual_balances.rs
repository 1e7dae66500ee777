//! Virtual balance maintenance.
//!
//! Virtual balances move for two independent reasons: an administrator driven
//! price ratio update (the interval is rescaled while keeping the pool's
//! centeredness) and the pool drifting outside its target range (the interval
//! slides toward the market price at the configured daily rate).

use {
    crate::{
        centeredness::{compute_centeredness, is_above_center},
        config::validate_centeredness_margin,
        error::Error,
        fixed_point::{Bfp, Rounding},
        math,
        price_ratio::{PriceRatioState, compute_fourth_root_price_ratio},
        price_shift::validate_daily_price_shift_base,
    },
    num::BigInt,
    primitive_types::U256,
};

/// Computes current virtual balances and whether they changed due to either a
/// price ratio update or out-of-range centeredness drift.
pub fn compute_current_virtual_balances(
    current_timestamp: u64,
    balances_scaled18: &[Bfp; 2],
    last_virtual_balances: &[Bfp; 2],
    daily_price_shift_base: Bfp,
    last_timestamp: u64,
    centeredness_margin: Bfp,
    price_ratio_state: &PriceRatioState,
) -> Result<([Bfp; 2], bool), Error> {
    validate_parameters(daily_price_shift_base, centeredness_margin, price_ratio_state)?;
    if current_timestamp == last_timestamp {
        return Ok((*last_virtual_balances, false));
    }
    if current_timestamp < last_timestamp {
        return Err(Error::TimestampRegression);
    }

    let current_fourth_root_price_ratio =
        compute_fourth_root_price_ratio(current_timestamp, price_ratio_state)?;

    // Fixed for the whole call, even if the price ratio step below moves the
    // balances across the center.
    let is_pool_above_center = is_above_center(balances_scaled18, last_virtual_balances);

    let mut virtual_balances = *last_virtual_balances;
    let mut changed = false;

    if price_ratio_state.is_updating(last_timestamp, current_timestamp) {
        virtual_balances = compute_virtual_balances_updating_price_ratio(
            current_fourth_root_price_ratio,
            balances_scaled18,
            last_virtual_balances,
            is_pool_above_center,
        )?;
        changed = true;
    }

    let (centeredness, _) = compute_centeredness(balances_scaled18, &virtual_balances)?;
    if centeredness < centeredness_margin {
        virtual_balances = compute_virtual_balances_updating_price_range(
            current_fourth_root_price_ratio,
            balances_scaled18,
            &virtual_balances,
            is_pool_above_center,
            daily_price_shift_base,
            current_timestamp - last_timestamp,
        )?;
        changed = true;
    }

    if changed {
        tracing::trace!(
            ?virtual_balances,
            %centeredness,
            fourth_root_price_ratio = %current_fourth_root_price_ratio,
            "recomputed virtual balances"
        );
    }

    Ok((virtual_balances, changed))
}

/// Rejects persisted pool parameters that no valid sequence of transitions can
/// produce.
pub fn validate_parameters(
    daily_price_shift_base: Bfp,
    centeredness_margin: Bfp,
    price_ratio_state: &PriceRatioState,
) -> Result<(), Error> {
    price_ratio_state.validate()?;
    validate_centeredness_margin(centeredness_margin)?;
    validate_daily_price_shift_base(daily_price_shift_base)
}

/// Rescales the virtual balances to `current_fourth_root_price_ratio` while
/// keeping the centeredness constant.
pub fn compute_virtual_balances_updating_price_ratio(
    current_fourth_root_price_ratio: Bfp,
    balances_scaled18: &[Bfp; 2],
    last_virtual_balances: &[Bfp; 2],
    is_pool_above_center: bool,
) -> Result<[Bfp; 2], Error> {
    let (centeredness, _) = compute_centeredness(balances_scaled18, last_virtual_balances)?;
    let sqrt_price_ratio =
        current_fourth_root_price_ratio.mul_down(current_fourth_root_price_ratio)?;
    if sqrt_price_ratio <= Bfp::one() {
        return Err(Error::InvalidFourthRootPriceRatio);
    }

    let (undervalued, overvalued) = token_roles(is_pool_above_center);
    let balance_undervalued = balances_scaled18[undervalued];

    // Positive root of (Q0 - 1) Vu^2 - Ru (1 + C) Vu - Ru^2 C = 0:
    // Vu = Ru (1 + C + sqrt(1 + C (C + 4 Q0 - 2))) / 2 (Q0 - 1)
    // The square root operand is built with 36 decimals so the root keeps 18.
    let one = math::to_big_int(Bfp::one());
    let c = math::to_big_int(centeredness);
    let q0 = math::to_big_int(sqrt_price_ratio);
    let operand = &c * (&c + &q0 * 4 - &one * 2) + math::one_36();
    let root = math::sqrt_36_to_18(&operand)?;

    let numerator =
        math::to_big_int(balance_undervalued) * (&one + &c + math::to_big_int(root));
    let denominator = (q0 - &one) * 2;
    let virtual_undervalued =
        math::from_big_int(&math::div_raw(&numerator, &denominator, Rounding::Down)?)?;

    // Vo = Ro Vu / (C Ru) reduces to Vu * last Vo / last Vu, which stays
    // defined when a real balance is empty.
    let virtual_overvalued = math::mul_div(
        virtual_undervalued,
        last_virtual_balances[overvalued],
        last_virtual_balances[undervalued],
        Rounding::Down,
    )?;

    ensure_positive(from_roles(
        is_pool_above_center,
        virtual_undervalued,
        virtual_overvalued,
    ))
}

/// Moves the price interval toward the market price by decaying the
/// overvalued virtual balance and solving for the undervalued one.
pub fn compute_virtual_balances_updating_price_range(
    current_fourth_root_price_ratio: Bfp,
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
    is_pool_above_center: bool,
    daily_price_shift_base: Bfp,
    elapsed_seconds: u64,
) -> Result<[Bfp; 2], Error> {
    let sqrt_price_ratio =
        current_fourth_root_price_ratio.mul_down(current_fourth_root_price_ratio)?;

    let (undervalued, overvalued) = token_roles(is_pool_above_center);
    let balance_undervalued = balances_scaled18[undervalued];
    let balance_overvalued = balances_scaled18[overvalued];

    // Vo = Vo * dailyPriceShiftBase^(T_curr - T_last)
    let exponent = Bfp::from_wei(
        U256::from(elapsed_seconds)
            .checked_mul(U256::exp10(18))
            .ok_or(Error::MulOverflow)?,
    );
    let decay = match daily_price_shift_base.pow_down(exponent) {
        Ok(decay) => decay,
        // The decay factor is below the smallest representable fixed point
        // value; the floor below takes over.
        Err(Error::ProductOutOfBounds) if daily_price_shift_base < Bfp::one() => Bfp::zero(),
        Err(err) => return Err(err),
    };
    let virtual_overvalued = virtual_balances[overvalued].mul_down(decay)?;

    // Vo may not drop below its value at centeredness one, Ro / (fourthroot - 1).
    let minimum_overvalued =
        balance_overvalued.div_down(current_fourth_root_price_ratio.sub(Bfp::one())?)?;
    let virtual_overvalued = virtual_overvalued.max(minimum_overvalued);

    // Vu = Ru (Vo + Ro) / ((Q0 - 1) Vo - Ro)
    let denominator = sqrt_price_ratio
        .sub(Bfp::one())?
        .mul_down(virtual_overvalued)?;
    if denominator <= balance_overvalued {
        return Err(Error::NonPositiveDenominator);
    }
    let denominator = denominator.sub(balance_overvalued)?;
    let numerator: BigInt = math::to_big_int(balance_undervalued)
        * math::to_big_int(virtual_overvalued.add(balance_overvalued)?);
    let virtual_undervalued = math::from_big_int(&math::div_raw(
        &numerator,
        &math::to_big_int(denominator),
        Rounding::Down,
    )?)?;

    ensure_positive(from_roles(
        is_pool_above_center,
        virtual_undervalued,
        virtual_overvalued,
    ))
}

/// Indices of the (undervalued, overvalued) tokens.
fn token_roles(is_pool_above_center: bool) -> (usize, usize) {
    if is_pool_above_center { (0, 1) } else { (1, 0) }
}

fn from_roles(is_pool_above_center: bool, undervalued: Bfp, overvalued: Bfp) -> [Bfp; 2] {
    if is_pool_above_center {
        [undervalued, overvalued]
    } else {
        [overvalued, undervalued]
    }
}

fn ensure_positive(virtual_balances: [Bfp; 2]) -> Result<[Bfp; 2], Error> {
    if virtual_balances.iter().any(Bfp::is_zero) {
        return Err(Error::ZeroVirtualBalance);
    }
    Ok(virtual_balances)
}
