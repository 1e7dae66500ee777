//! Pool seeding: derives a reference balance ratio, virtual balances and the
//! fourth root of the price ratio from a min/max/target price triple.

use {
    crate::{
        error::Error,
        fixed_point::{Bfp, Rounding},
        math,
        swap::compute_spot_price,
    },
    std::sync::LazyLock,
};

/// Arbitrary reference magnitude for the real balance of token A. Only the
/// ratios of the theoretical outputs are meaningful.
static INITIALIZATION_MAX_BALANCE_A: LazyLock<Bfp> = LazyLock::new(|| Bfp::exp10(6));

/// Relative tolerance between supplied and theoretical balance ratios, 0.01%.
pub static BALANCE_RATIO_AND_PRICE_TOLERANCE: LazyLock<Bfp> =
    LazyLock::new(|| Bfp::exp10(-4));

/// Reference state for a pool quoting `target_price` within
/// `[min_price, max_price]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TheoreticalPool {
    pub real_balances: [Bfp; 2],
    pub virtual_balances: [Bfp; 2],
    pub fourth_root_price_ratio: Bfp,
}

pub fn compute_theoretical_price_ratio_and_balances(
    min_price: Bfp,
    max_price: Bfp,
    target_price: Bfp,
) -> Result<TheoreticalPool, Error> {
    if min_price.is_zero() || min_price >= target_price || target_price >= max_price {
        return Err(Error::InvalidPriceRange);
    }

    let sqrt_price_ratio = max_price.div_down(min_price)?.sqrt()?;
    let fourth_root_price_ratio = sqrt_price_ratio.sqrt()?;
    if fourth_root_price_ratio <= Bfp::one() {
        return Err(Error::InvalidFourthRootPriceRatio);
    }

    let max_balance_a = *INITIALIZATION_MAX_BALANCE_A;
    // Va = Ra_max / (sqrt(Q) - 1), Vb = minPrice * (Va + Ra_max)
    let virtual_balance_a = max_balance_a.div_down(sqrt_price_ratio.sub(Bfp::one())?)?;
    let virtual_balance_b = min_price.mul_down(virtual_balance_a.add(max_balance_a)?)?;

    // The minimum price is quoted with Rb = 0, so L = (Ra_max + Va) * Vb. At the
    // target price (Rb + Vb)^2 = L * targetPrice.
    let real_balance_b = target_price
        .mul_up(virtual_balance_b)?
        .mul_up(max_balance_a.add(virtual_balance_a)?)?
        .sqrt()?
        .sub(virtual_balance_b)?;
    // Ra = (Rb + Vb - Va * targetPrice) / targetPrice
    let real_balance_a = real_balance_b
        .add(virtual_balance_b)?
        .sub(virtual_balance_a.mul_down(target_price)?)?
        .div_down(target_price)?;

    Ok(TheoreticalPool {
        real_balances: [real_balance_a, real_balance_b],
        virtual_balances: [virtual_balance_a, virtual_balance_b],
        fourth_root_price_ratio,
    })
}

/// Real balances funding a new pool with `reference_amount` of
/// `reference_token_index`, in the theoretical ratio.
pub fn compute_initial_balances(
    min_price: Bfp,
    max_price: Bfp,
    target_price: Bfp,
    reference_token_index: usize,
    reference_amount: Bfp,
) -> Result<[Bfp; 2], Error> {
    let theoretical =
        compute_theoretical_price_ratio_and_balances(min_price, max_price, target_price)?;
    let [real_a, real_b] = theoretical.real_balances;
    match reference_token_index {
        0 => Ok([
            reference_amount,
            math::mul_div(reference_amount, real_b, real_a, Rounding::Down)?,
        ]),
        1 => Ok([
            math::mul_div(reference_amount, real_a, real_b, Rounding::Down)?,
            reference_amount,
        ]),
        _ => Err(Error::InvalidToken),
    }
}

/// Checks that `balances_scaled18` are in the theoretical ratio within
/// [`BALANCE_RATIO_AND_PRICE_TOLERANCE`].
pub fn check_balance_ratio(
    balances_scaled18: &[Bfp; 2],
    theoretical_balances: &[Bfp; 2],
) -> Result<(), Error> {
    let actual = balances_scaled18[1].div_down(balances_scaled18[0])?;
    let theoretical = theoretical_balances[1].div_down(theoretical_balances[0])?;

    let tolerance = *BALANCE_RATIO_AND_PRICE_TOLERANCE;
    let lower_bound = theoretical.mul_down(Bfp::one().sub(tolerance)?)?;
    let upper_bound = theoretical.mul_down(Bfp::one().add(tolerance)?)?;
    if actual < lower_bound || actual > upper_bound {
        return Err(Error::BalanceRatioExceedsTolerance);
    }
    Ok(())
}

/// Checks that the pool quotes `target_price` within
/// [`BALANCE_RATIO_AND_PRICE_TOLERANCE`].
pub fn check_initial_price(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
    target_price: Bfp,
) -> Result<(), Error> {
    let spot_price = compute_spot_price(balances_scaled18, virtual_balances)?;

    let tolerance = *BALANCE_RATIO_AND_PRICE_TOLERANCE;
    let lower_bound = target_price.mul_down(Bfp::one().sub(tolerance)?)?;
    let upper_bound = target_price.mul_down(Bfp::one().add(tolerance)?)?;
    if spot_price < lower_bound || spot_price > upper_bound {
        return Err(Error::InitialPriceExceedsTolerance);
    }
    Ok(())
}

/// Virtual balances for a pool funded with `balances_scaled18`: the
/// theoretical ones scaled by the same factor as the real balances.
pub fn scale_virtual_balances(
    balances_scaled18: &[Bfp; 2],
    theoretical: &TheoreticalPool,
) -> Result<[Bfp; 2], Error> {
    let scale = balances_scaled18[0].div_down(theoretical.real_balances[0])?;
    Ok([
        theoretical.virtual_balances[0].mul_down(scale)?,
        theoretical.virtual_balances[1].mul_down(scale)?,
    ])
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            bfp,
            swap::compute_price_range,
        },
        primitive_types::U256,
    };

    fn wei(value: u128) -> Bfp {
        Bfp::from_wei(U256::from(value))
    }

    #[test]
    fn theoretical_pool() {
        let pool = compute_theoretical_price_ratio_and_balances(
            Bfp::from(1_000),
            Bfp::from(4_000),
            Bfp::from(2_500),
        )
        .unwrap();
        // Price ratio 4, fourth root sqrt(2).
        assert_eq!(pool.fourth_root_price_ratio, bfp!("1.414213562373095048"));
        assert_eq!(pool.virtual_balances, [Bfp::exp10(6), bfp!("2000000000")]);
        assert_eq!(
            pool.real_balances,
            [
                bfp!("264911.064067351732799557"),
                bfp!("1162277660.168379331998893544"),
            ]
        );
    }

    #[test]
    fn theoretical_pool_quotes_its_prices() {
        let pool = compute_theoretical_price_ratio_and_balances(
            Bfp::from(1_000),
            Bfp::from(4_000),
            Bfp::from(2_500),
        )
        .unwrap();
        assert_eq!(
            compute_spot_price(&pool.real_balances, &pool.virtual_balances).unwrap(),
            Bfp::from(2_500)
        );
        let (min_price, max_price) =
            compute_price_range(&pool.real_balances, &pool.virtual_balances).unwrap();
        assert_eq!(min_price, Bfp::from(1_000));
        assert_eq!(max_price, bfp!("3999.999999999999999999"));
    }

    #[test]
    fn invalid_price_range() {
        for (min, max, target) in [
            (0, 4_000, 2_500),
            (1_000, 4_000, 1_000),
            (1_000, 4_000, 4_000),
            (1_000, 4_000, 5_000),
            (4_000, 1_000, 2_500),
        ] {
            assert_eq!(
                compute_theoretical_price_ratio_and_balances(
                    Bfp::from(min),
                    Bfp::from(max),
                    Bfp::from(target)
                )
                .unwrap_err(),
                Error::InvalidPriceRange,
                "{min} {max} {target}"
            );
        }
    }

    #[test]
    fn initial_balances() {
        let min = Bfp::from(1_000);
        let max = Bfp::from(4_000);
        let target = Bfp::from(2_500);

        let by_a = compute_initial_balances(min, max, target, 0, Bfp::from(100)).unwrap();
        assert_eq!(by_a[0], Bfp::from(100));
        assert_eq!(by_a[1], wei(438_742_588_672_279_311_066_630));

        let by_b = compute_initial_balances(min, max, target, 1, by_a[1]).unwrap();
        assert_eq!(by_b[1], by_a[1]);
        assert!(check_balance_ratio(&by_b, &by_a).is_ok());

        assert_eq!(
            compute_initial_balances(min, max, target, 2, Bfp::from(100)).unwrap_err(),
            Error::InvalidToken
        );
    }

    #[test]
    fn balance_ratio_tolerance() {
        let theoretical = [Bfp::from(100), Bfp::from(200)];
        assert!(check_balance_ratio(&[Bfp::from(1), Bfp::from(2)], &theoretical).is_ok());
        // 0.005% off.
        assert!(check_balance_ratio(&[Bfp::from(1), bfp!("2.0001")], &theoretical).is_ok());
        // 0.05% off.
        assert_eq!(
            check_balance_ratio(&[Bfp::from(1), bfp!("2.001")], &theoretical).unwrap_err(),
            Error::BalanceRatioExceedsTolerance
        );
        assert_eq!(
            check_balance_ratio(&[Bfp::from(1), bfp!("1.999")], &theoretical).unwrap_err(),
            Error::BalanceRatioExceedsTolerance
        );
    }

    #[test]
    fn scaled_virtual_balances_keep_prices() {
        let pool = compute_theoretical_price_ratio_and_balances(
            Bfp::from(1_000),
            Bfp::from(4_000),
            Bfp::from(2_500),
        )
        .unwrap();
        let balances = compute_initial_balances(
            Bfp::from(1_000),
            Bfp::from(4_000),
            Bfp::from(2_500),
            0,
            Bfp::from(100),
        )
        .unwrap();
        let virtual_balances = scale_virtual_balances(&balances, &pool).unwrap();
        let spot = compute_spot_price(&balances, &virtual_balances).unwrap();
        let diff = spot.max(Bfp::from(2_500)).sub(spot.min(Bfp::from(2_500))).unwrap();
        assert!(diff < bfp!("0.000001"), "{spot}");
        assert!(check_initial_price(&balances, &virtual_balances, Bfp::from(2_500)).is_ok());
        assert_eq!(
            check_initial_price(&balances, &virtual_balances, Bfp::from(2_501)).unwrap_err(),
            Error::InitialPriceExceedsTolerance
        );
    }
}
