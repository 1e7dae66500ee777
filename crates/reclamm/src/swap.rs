//! Invariant and swap pricing on the virtual balance curve
//! `(Ra + Va) * (Rb + Vb) = L`.

use {
    crate::{
        error::Error,
        fixed_point::{Bfp, Rounding},
        math,
    },
    serde::{Deserialize, Serialize},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapKind {
    /// The amount in is fixed and the amount out is computed.
    GivenIn,
    /// The amount out is fixed and the amount in is computed.
    GivenOut,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub kind: SwapKind,
    pub token_in_index: usize,
    pub token_out_index: usize,
    /// The fixed side of the swap, scaled to 18 decimals.
    pub amount_given_scaled18: Bfp,
}

/// Prices `request` against the given real and virtual balances and returns
/// the computed side of the swap.
pub fn compute_swap(
    request: &SwapRequest,
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
) -> Result<Bfp, Error> {
    match request.kind {
        SwapKind::GivenIn => compute_out_given_in(
            balances_scaled18,
            virtual_balances,
            request.token_in_index,
            request.token_out_index,
            request.amount_given_scaled18,
        ),
        SwapKind::GivenOut => compute_in_given_out(
            balances_scaled18,
            virtual_balances,
            request.token_in_index,
            request.token_out_index,
            request.amount_given_scaled18,
        ),
    }
}

pub fn compute_invariant(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
    rounding: Rounding,
) -> Result<Bfp, Error> {
    let a = balances_scaled18[0].add(virtual_balances[0])?;
    let b = balances_scaled18[1].add(virtual_balances[1])?;
    a.mul(b, rounding)
}

/// Compute amountOut for GivenIn swaps.
pub fn compute_out_given_in(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
    token_in_index: usize,
    token_out_index: usize,
    amount_in_scaled18: Bfp,
) -> Result<Bfp, Error> {
    check_indices(token_in_index, token_out_index)?;

    // Ao = floor(((Bo + Vo) * Ai) / (Bi + Vi + Ai)), in a single step.
    let numerator = balances_scaled18[token_out_index].add(virtual_balances[token_out_index])?;
    let denominator = balances_scaled18[token_in_index]
        .add(virtual_balances[token_in_index])?
        .add(amount_in_scaled18)?;
    let amount_out = math::mul_div(numerator, amount_in_scaled18, denominator, Rounding::Down)?;

    if amount_out >= balances_scaled18[token_out_index] {
        return Err(Error::InsufficientLiquidity);
    }
    Ok(amount_out)
}

/// Compute amountIn for GivenOut swaps.
pub fn compute_in_given_out(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
    token_in_index: usize,
    token_out_index: usize,
    amount_out_scaled18: Bfp,
) -> Result<Bfp, Error> {
    check_indices(token_in_index, token_out_index)?;
    if amount_out_scaled18 >= balances_scaled18[token_out_index] {
        return Err(Error::AmountOutExceedsBalance);
    }

    // Ai = ceil(((Bi + Vi) * Ao) / (Bo + Vo - Ao))
    let numerator = balances_scaled18[token_in_index].add(virtual_balances[token_in_index])?;
    let denominator = balances_scaled18[token_out_index]
        .add(virtual_balances[token_out_index])?
        .sub(amount_out_scaled18)?;
    math::mul_div(numerator, amount_out_scaled18, denominator, Rounding::Up)
}

/// Minimum and maximum price of token A in terms of token B on the current
/// curve.
pub fn compute_price_range(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
) -> Result<(Bfp, Bfp), Error> {
    let invariant = compute_invariant(balances_scaled18, virtual_balances, Rounding::Down)?;

    // minPrice = Vb^2 / L, the 36 decimal square divided in one step.
    let virtual_b = math::to_big_int(virtual_balances[1]);
    let min_price = math::from_big_int(&math::div_raw(
        &(&virtual_b * &virtual_b),
        &math::to_big_int(invariant),
        Rounding::Down,
    )?)?;
    // maxPrice = L / Va^2
    let max_price = invariant.div_down(virtual_balances[0].mul_down(virtual_balances[0])?)?;

    Ok((min_price, max_price))
}

pub fn compute_price_ratio(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
) -> Result<Bfp, Error> {
    let (min_price, max_price) = compute_price_range(balances_scaled18, virtual_balances)?;
    max_price.div_up(min_price)
}

/// Marginal price of token A in terms of token B, `(Rb + Vb) / (Ra + Va)`.
pub fn compute_spot_price(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
) -> Result<Bfp, Error> {
    balances_scaled18[1]
        .add(virtual_balances[1])?
        .div_down(balances_scaled18[0].add(virtual_balances[0])?)
}

fn check_indices(token_in_index: usize, token_out_index: usize) -> Result<(), Error> {
    match (token_in_index, token_out_index) {
        (0, 1) | (1, 0) => Ok(()),
        _ => Err(Error::InvalidToken),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{bfp, error::ErrorKind},
        primitive_types::U256,
    };

    fn pool() -> ([Bfp; 2], [Bfp; 2]) {
        (
            [Bfp::from(200), Bfp::from(300)],
            [Bfp::from(100), Bfp::from(100)],
        )
    }

    #[test]
    fn out_given_in() {
        let (balances, virtual_balances) = pool();
        // (300 + 100) * 10 / (200 + 100 + 10)
        let amount_out =
            compute_out_given_in(&balances, &virtual_balances, 0, 1, Bfp::from(10)).unwrap();
        assert_eq!(
            amount_out,
            Bfp::from_wei(U256::from(12_903_225_806_451_612_903_u128))
        );
        assert_eq!(amount_out, bfp!("12.903225806451612903"));
    }

    #[test]
    fn round_trip_never_favours_the_trader() {
        let (balances, virtual_balances) = pool();
        for amount_in in [bfp!("0.000001"), Bfp::from(1), Bfp::from(10), bfp!("123.456")] {
            let amount_out =
                compute_out_given_in(&balances, &virtual_balances, 0, 1, amount_in).unwrap();
            let required_in =
                compute_in_given_out(&balances, &virtual_balances, 0, 1, amount_out).unwrap();
            assert!(required_in <= amount_in, "{required_in} > {amount_in}");
            assert!(
                amount_in.sub(required_in).unwrap() <= Bfp::epsilon(),
                "{required_in} vs {amount_in}"
            );
        }
        let amount_out =
            compute_out_given_in(&balances, &virtual_balances, 0, 1, Bfp::from(10)).unwrap();
        assert_eq!(
            compute_in_given_out(&balances, &virtual_balances, 0, 1, amount_out).unwrap(),
            Bfp::from(10)
        );
    }

    #[test]
    fn swaps_conserve_invariant() {
        let (balances, virtual_balances) = pool();
        let before = compute_invariant(&balances, &virtual_balances, Rounding::Down).unwrap();

        let amount_in = bfp!("7.77");
        let amount_out =
            compute_out_given_in(&balances, &virtual_balances, 1, 0, amount_in).unwrap();
        let after_in = [
            balances[0].sub(amount_out).unwrap(),
            balances[1].add(amount_in).unwrap(),
        ];
        assert!(compute_invariant(&after_in, &virtual_balances, Rounding::Down).unwrap() >= before);

        let amount_out = bfp!("42.5");
        let amount_in =
            compute_in_given_out(&balances, &virtual_balances, 0, 1, amount_out).unwrap();
        let after_out = [
            balances[0].add(amount_in).unwrap(),
            balances[1].sub(amount_out).unwrap(),
        ];
        assert!(
            compute_invariant(&after_out, &virtual_balances, Rounding::Down).unwrap() >= before
        );
    }

    #[test]
    fn invariant_rounding() {
        let balances = [bfp!("0.000000000000000001"), Bfp::zero()];
        let virtual_balances = [Bfp::zero(), bfp!("0.5")];
        assert_eq!(
            compute_invariant(&balances, &virtual_balances, Rounding::Down).unwrap(),
            Bfp::zero()
        );
        assert_eq!(
            compute_invariant(&balances, &virtual_balances, Rounding::Up).unwrap(),
            Bfp::epsilon()
        );
    }

    #[test]
    fn draining_the_pool_fails() {
        let (balances, virtual_balances) = pool();
        // Enough token A to ask for more than the 300 real B.
        let err = compute_out_given_in(&balances, &virtual_balances, 0, 1, Bfp::from(1_000_000))
            .unwrap_err();
        assert_eq!(err, Error::InsufficientLiquidity);
        assert_eq!(err.kind(), ErrorKind::InsufficientLiquidity);

        for amount_out in [Bfp::from(300), Bfp::from(301)] {
            let err = compute_in_given_out(&balances, &virtual_balances, 0, 1, amount_out)
                .unwrap_err();
            assert_eq!(err, Error::AmountOutExceedsBalance);
            assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
        }
    }

    #[test]
    fn invalid_token_indices() {
        let (balances, virtual_balances) = pool();
        for (token_in, token_out) in [(0, 0), (1, 1), (2, 0), (0, 2)] {
            assert_eq!(
                compute_out_given_in(&balances, &virtual_balances, token_in, token_out, Bfp::one())
                    .unwrap_err(),
                Error::InvalidToken
            );
            assert_eq!(
                compute_in_given_out(&balances, &virtual_balances, token_in, token_out, Bfp::one())
                    .unwrap_err(),
                Error::InvalidToken
            );
        }
    }

    #[test]
    fn compute_swap_dispatches_on_kind() {
        let (balances, virtual_balances) = pool();
        let mut request = SwapRequest {
            kind: SwapKind::GivenIn,
            token_in_index: 0,
            token_out_index: 1,
            amount_given_scaled18: Bfp::from(10),
        };
        assert_eq!(
            compute_swap(&request, &balances, &virtual_balances).unwrap(),
            bfp!("12.903225806451612903")
        );
        request.kind = SwapKind::GivenOut;
        request.amount_given_scaled18 = bfp!("12.903225806451612903");
        assert_eq!(
            compute_swap(&request, &balances, &virtual_balances).unwrap(),
            Bfp::from(10)
        );
    }

    #[test]
    fn price_range_of_centered_pool() {
        // Va = Vb = 200 and Ra = Rb = 100: L = 90000, min = 4 / 9, max = 9 / 4.
        let balances = [Bfp::from(100), Bfp::from(100)];
        let virtual_balances = [Bfp::from(200), Bfp::from(200)];
        let (min_price, max_price) = compute_price_range(&balances, &virtual_balances).unwrap();
        assert_eq!(min_price, bfp!("0.444444444444444444"));
        assert_eq!(max_price, bfp!("2.25"));
        // 2.25 / 0.444444444444444444, rounded up.
        assert_eq!(
            compute_price_ratio(&balances, &virtual_balances).unwrap(),
            bfp!("5.062500000000000006")
        );
        assert_eq!(
            compute_spot_price(&balances, &virtual_balances).unwrap(),
            Bfp::one()
        );
    }
}
