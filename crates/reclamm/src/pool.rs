//! Persisted pool state and the atomic transitions applied to it.
//!
//! Every transition refreshes the virtual balances up to `now`, computes the
//! new state into locals and only assigns it once nothing can fail anymore.

use {
    crate::{
        centeredness::{compute_centeredness, is_pool_within_target_range},
        config::{PoolConfig, validate_centeredness_margin, validate_daily_price_shift_exponent},
        error::Error,
        fixed_point::{Bfp, Rounding},
        initialization,
        price_ratio::PriceRatioState,
        price_shift,
        swap::{self, SwapRequest},
        virtual_balances::{compute_current_virtual_balances, validate_parameters},
    },
    primitive_types::U256,
    serde::{Deserialize, Serialize},
    std::sync::LazyLock,
};

/// Shortest accepted price ratio update.
pub const MIN_PRICE_RATIO_UPDATE_DURATION: u64 = 86_400;

/// Smallest accepted difference between the start and end fourth root price
/// ratio of an update.
pub static MIN_FOURTH_ROOT_PRICE_RATIO_DELTA: LazyLock<Bfp> =
    LazyLock::new(|| Bfp::from_wei(U256::from(1_000)));

/// Fastest accepted price ratio change, a factor of two per day.
pub static MAX_DAILY_PRICE_RATIO_UPDATE_RATE: LazyLock<Bfp> = LazyLock::new(|| Bfp::from(2));

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub last_virtual_balances: [Bfp; 2],
    pub last_timestamp: u64,
    pub daily_price_shift_base: Bfp,
    pub centeredness_margin: Bfp,
    pub price_ratio_state: PriceRatioState,
}

impl PoolState {
    /// Seeds a pool funded with `balances_scaled18` at `now`.
    pub fn initialize(
        config: &PoolConfig,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<Self, Error> {
        config.validate()?;
        let theoretical = initialization::compute_theoretical_price_ratio_and_balances(
            config.min_price,
            config.max_price,
            config.target_price,
        )?;
        initialization::check_balance_ratio(balances_scaled18, &theoretical.real_balances)?;
        let virtual_balances =
            initialization::scale_virtual_balances(balances_scaled18, &theoretical)?;
        initialization::check_initial_price(
            balances_scaled18,
            &virtual_balances,
            config.target_price,
        )?;
        if !is_pool_within_target_range(
            balances_scaled18,
            &virtual_balances,
            config.centeredness_margin,
        )? {
            return Err(Error::PoolOutsideTargetRange);
        }

        let state = Self {
            last_virtual_balances: virtual_balances,
            last_timestamp: now,
            daily_price_shift_base: price_shift::to_daily_price_shift_base(
                config.daily_price_shift_exponent,
            )?,
            centeredness_margin: config.centeredness_margin,
            price_ratio_state: PriceRatioState::constant(theoretical.fourth_root_price_ratio, now),
        };
        tracing::debug!(?state, "initialized pool");
        Ok(state)
    }

    /// Checks the persisted parameters. Every operation on the state does this
    /// before using them.
    pub fn validate(&self) -> Result<(), Error> {
        validate_parameters(
            self.daily_price_shift_base,
            self.centeredness_margin,
            &self.price_ratio_state,
        )
    }

    /// Virtual balances as they would be after an interaction at `now`,
    /// without persisting them.
    pub fn current_virtual_balances(
        &self,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<([Bfp; 2], bool), Error> {
        compute_current_virtual_balances(
            now,
            balances_scaled18,
            &self.last_virtual_balances,
            self.daily_price_shift_base,
            self.last_timestamp,
            self.centeredness_margin,
            &self.price_ratio_state,
        )
    }

    /// Persists the virtual balances refreshed up to `now`. Returns whether
    /// they changed.
    pub fn sync(&mut self, balances_scaled18: &[Bfp; 2], now: u64) -> Result<bool, Error> {
        let (virtual_balances, changed) = self.current_virtual_balances(balances_scaled18, now)?;
        self.commit(virtual_balances, now);
        Ok(changed)
    }

    /// Prices `request` on the refreshed curve and returns the computed side.
    /// The refreshed virtual balances are only persisted if the swap succeeds.
    pub fn swap(
        &mut self,
        request: &SwapRequest,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<Bfp, Error> {
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        let amount = swap::compute_swap(request, balances_scaled18, &virtual_balances)?;
        self.commit(virtual_balances, now);
        tracing::trace!(?request, %amount, "swapped");
        Ok(amount)
    }

    /// Updates the centeredness margin. The pool has to be within its target
    /// range both before and after the change.
    pub fn set_centeredness_margin(
        &mut self,
        centeredness_margin: Bfp,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<(), Error> {
        validate_centeredness_margin(centeredness_margin)?;
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        for margin in [self.centeredness_margin, centeredness_margin] {
            if !is_pool_within_target_range(balances_scaled18, &virtual_balances, margin)? {
                return Err(Error::PoolOutsideTargetRange);
            }
        }

        self.commit(virtual_balances, now);
        self.centeredness_margin = centeredness_margin;
        tracing::debug!(%centeredness_margin, "updated centeredness margin");
        Ok(())
    }

    /// Updates the daily price shift and returns the exponent actually stored,
    /// which may be slightly below the requested one.
    pub fn set_daily_price_shift_exponent(
        &mut self,
        daily_price_shift_exponent: Bfp,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<Bfp, Error> {
        validate_daily_price_shift_exponent(daily_price_shift_exponent)?;
        // Time elapsed so far is tracked with the previous rate.
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        let daily_price_shift_base =
            price_shift::to_daily_price_shift_base(daily_price_shift_exponent)?;
        let actual_exponent = price_shift::to_daily_price_shift_exponent(daily_price_shift_base)?;

        self.commit(virtual_balances, now);
        self.daily_price_shift_base = daily_price_shift_base;
        tracing::debug!(
            requested = %daily_price_shift_exponent,
            actual = %actual_exponent,
            "updated daily price shift exponent"
        );
        Ok(actual_exponent)
    }

    /// Schedules a geometric move of the price ratio to `end_price_ratio`
    /// between `start_time` and `end_time`, starting from the current value.
    /// Returns the actual start time, which is never in the past.
    pub fn start_price_ratio_update(
        &mut self,
        end_price_ratio: Bfp,
        start_time: u64,
        end_time: u64,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<u64, Error> {
        if start_time > end_time {
            return Err(Error::InvalidUpdateWindow);
        }
        let actual_start_time = start_time.max(now);
        let duration = end_time.saturating_sub(actual_start_time);
        if duration < MIN_PRICE_RATIO_UPDATE_DURATION {
            return Err(Error::PriceRatioUpdateDurationTooShort);
        }

        let end_fourth_root_price_ratio = end_price_ratio.sqrt()?.sqrt()?;
        if end_fourth_root_price_ratio <= Bfp::one() {
            return Err(Error::InvalidFourthRootPriceRatio);
        }

        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        let start_fourth_root_price_ratio = self.current_fourth_root_price_ratio(now)?;

        let higher = start_fourth_root_price_ratio.max(end_fourth_root_price_ratio);
        let lower = start_fourth_root_price_ratio.min(end_fourth_root_price_ratio);
        if higher.sub(lower)? < *MIN_FOURTH_ROOT_PRICE_RATIO_DELTA {
            return Err(Error::FourthRootPriceRatioDeltaBelowMin);
        }

        // (higher / lower)^4 is the total price ratio change, scaled to one day.
        let price_ratio_change = higher.div_up(lower)?.pow_up(Bfp::from(4))?;
        let days = Bfp::from_wei(U256::from(MIN_PRICE_RATIO_UPDATE_DURATION))
            .div_down(Bfp::from_wei(U256::from(duration)))?;
        if price_ratio_change.pow_up(days)? > *MAX_DAILY_PRICE_RATIO_UPDATE_RATE {
            return Err(Error::PriceRatioUpdateTooFast);
        }

        let price_ratio_state = PriceRatioState {
            start_fourth_root_price_ratio,
            end_fourth_root_price_ratio,
            price_ratio_update_start_time: actual_start_time,
            price_ratio_update_end_time: end_time,
        };
        self.commit(virtual_balances, now);
        self.price_ratio_state = price_ratio_state;
        tracing::debug!(?price_ratio_state, "started price ratio update");
        Ok(actual_start_time)
    }

    /// Freezes the price ratio at its current value.
    pub fn stop_price_ratio_update(
        &mut self,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<(), Error> {
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        let fourth_root_price_ratio = self.current_fourth_root_price_ratio(now)?;

        self.commit(virtual_balances, now);
        self.price_ratio_state = PriceRatioState::constant(fourth_root_price_ratio, now);
        tracing::debug!(%fourth_root_price_ratio, "stopped price ratio update");
        Ok(())
    }

    pub fn current_fourth_root_price_ratio(&self, now: u64) -> Result<Bfp, Error> {
        self.validate()?;
        self.price_ratio_state.fourth_root_price_ratio_at(now)
    }

    /// Price ratio of the curve quoted at `now`.
    pub fn current_price_ratio(
        &self,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<Bfp, Error> {
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        swap::compute_price_ratio(balances_scaled18, &virtual_balances)
    }

    /// `(min_price, max_price)` of the curve quoted at `now`.
    pub fn price_range(
        &self,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<(Bfp, Bfp), Error> {
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        swap::compute_price_range(balances_scaled18, &virtual_balances)
    }

    pub fn spot_price(&self, balances_scaled18: &[Bfp; 2], now: u64) -> Result<Bfp, Error> {
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        swap::compute_spot_price(balances_scaled18, &virtual_balances)
    }

    /// Centeredness and above-center classification at `now`.
    pub fn centeredness(
        &self,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<(Bfp, bool), Error> {
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        compute_centeredness(balances_scaled18, &virtual_balances)
    }

    pub fn is_within_target_range(
        &self,
        balances_scaled18: &[Bfp; 2],
        now: u64,
    ) -> Result<bool, Error> {
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        is_pool_within_target_range(balances_scaled18, &virtual_balances, self.centeredness_margin)
    }

    pub fn invariant(
        &self,
        balances_scaled18: &[Bfp; 2],
        now: u64,
        rounding: Rounding,
    ) -> Result<Bfp, Error> {
        let (virtual_balances, _) = self.current_virtual_balances(balances_scaled18, now)?;
        swap::compute_invariant(balances_scaled18, &virtual_balances, rounding)
    }

    pub fn daily_price_shift_exponent(&self) -> Result<Bfp, Error> {
        self.validate()?;
        price_shift::to_daily_price_shift_exponent(self.daily_price_shift_base)
    }

    fn commit(&mut self, virtual_balances: [Bfp; 2], now: u64) {
        self.last_virtual_balances = virtual_balances;
        self.last_timestamp = now;
    }
}
