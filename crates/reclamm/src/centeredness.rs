//! Pool centeredness: how symmetric the real balances are within the price
//! interval defined by the virtual balances.

use {
    crate::{
        error::Error,
        fixed_point::{Bfp, Rounding},
        math,
    },
    num::BigInt,
};

/// Whether the pool holds relatively more of token A than its virtual
/// balances imply, i.e. `Ra / Rb > Va / Vb`. Token A is then the undervalued
/// (abundant) token and token B the overvalued (scarce) one.
pub fn is_above_center(balances_scaled18: &[Bfp; 2], virtual_balances: &[Bfp; 2]) -> bool {
    if balances_scaled18[1].is_zero() {
        return true;
    }
    math::to_big_int(balances_scaled18[0]) * math::to_big_int(virtual_balances[1])
        > math::to_big_int(virtual_balances[0]) * math::to_big_int(balances_scaled18[1])
}

/// Computes the centeredness in `[0, 1]` together with the
/// [`is_above_center`] classification.
///
/// `centeredness = (Ro * Vu) / (Ru * Vo)`, rounded up. An empty real balance
/// on either side yields zero.
pub fn compute_centeredness(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
) -> Result<(Bfp, bool), Error> {
    let is_above_center = is_above_center(balances_scaled18, virtual_balances);
    if balances_scaled18[0].is_zero() || balances_scaled18[1].is_zero() {
        return Ok((Bfp::zero(), is_above_center));
    }

    let (undervalued, overvalued) = if is_above_center { (0, 1) } else { (1, 0) };
    let numerator = math::to_big_int(balances_scaled18[overvalued])
        * math::to_big_int(virtual_balances[undervalued]);
    let denominator = math::to_big_int(balances_scaled18[undervalued])
        * math::to_big_int(virtual_balances[overvalued]);

    let centeredness = math::div_raw(
        &(numerator * BigInt::from(10).pow(18)),
        &denominator,
        Rounding::Up,
    )?;
    Ok((math::from_big_int(&centeredness)?, is_above_center))
}

/// Whether the pool is inside its target range, `centeredness >= margin`.
pub fn is_pool_within_target_range(
    balances_scaled18: &[Bfp; 2],
    virtual_balances: &[Bfp; 2],
    centeredness_margin: Bfp,
) -> Result<bool, Error> {
    let (centeredness, _) = compute_centeredness(balances_scaled18, virtual_balances)?;
    Ok(centeredness >= centeredness_margin)
}

#[cfg(test)]
mod tests {
    use {super::*, crate::bfp};

    #[test]
    fn perfectly_centered() {
        let balances = [Bfp::from(100), Bfp::from(100)];
        let virtual_balances = [Bfp::from(100), Bfp::from(100)];
        let (centeredness, _) = compute_centeredness(&balances, &virtual_balances).unwrap();
        assert_eq!(centeredness, Bfp::one());
        assert!(is_pool_within_target_range(&balances, &virtual_balances, bfp!("0.2")).unwrap());
    }

    #[test]
    fn classification() {
        let virtual_balances = [Bfp::from(100), Bfp::from(100)];
        assert!(is_above_center(
            &[Bfp::from(300), Bfp::from(200)],
            &virtual_balances
        ));
        assert!(!is_above_center(
            &[Bfp::from(200), Bfp::from(300)],
            &virtual_balances
        ));
        // Equal ratios are not above center.
        assert!(!is_above_center(
            &[Bfp::from(100), Bfp::from(100)],
            &virtual_balances
        ));
    }

    #[test]
    fn imbalanced_pool() {
        // Below center: B is undervalued. (Ra * Vb) / (Rb * Va) = 200 / 300.
        let (centeredness, above) = compute_centeredness(
            &[Bfp::from(200), Bfp::from(300)],
            &[Bfp::from(100), Bfp::from(100)],
        )
        .unwrap();
        assert!(!above);
        assert_eq!(centeredness, bfp!("0.666666666666666667"));

        // Symmetric situation above center.
        let (centeredness, above) = compute_centeredness(
            &[Bfp::from(300), Bfp::from(200)],
            &[Bfp::from(100), Bfp::from(100)],
        )
        .unwrap();
        assert!(above);
        assert_eq!(centeredness, bfp!("0.666666666666666667"));
    }

    #[test]
    fn empty_balances() {
        let virtual_balances = [Bfp::from(100), Bfp::from(100)];
        let (centeredness, above) =
            compute_centeredness(&[Bfp::from(100), Bfp::zero()], &virtual_balances).unwrap();
        assert_eq!(centeredness, Bfp::zero());
        assert!(above);

        let (centeredness, above) =
            compute_centeredness(&[Bfp::zero(), Bfp::from(100)], &virtual_balances).unwrap();
        assert_eq!(centeredness, Bfp::zero());
        assert!(!above);

        let (centeredness, above) =
            compute_centeredness(&[Bfp::zero(), Bfp::zero()], &virtual_balances).unwrap();
        assert_eq!(centeredness, Bfp::zero());
        assert!(above);
    }

    #[test]
    fn centeredness_stays_in_unit_interval() {
        let virtual_balances = [bfp!("1234.5"), bfp!("98.7654321")];
        for a in [1_usize, 7, 100, 12_345, 1_000_000] {
            for b in [1_usize, 3, 250, 99_999, 5_000_000] {
                let (centeredness, _) = compute_centeredness(
                    &[Bfp::from(a), Bfp::from(b)],
                    &virtual_balances,
                )
                .unwrap();
                assert!(centeredness <= Bfp::one(), "{a} {b} -> {centeredness}");
            }
        }
    }

    #[test]
    fn target_range_boundary_is_inclusive() {
        let balances = [Bfp::from(200), Bfp::from(300)];
        let virtual_balances = [Bfp::from(100), Bfp::from(100)];
        let (centeredness, _) = compute_centeredness(&balances, &virtual_balances).unwrap();
        assert!(is_pool_within_target_range(&balances, &virtual_balances, centeredness).unwrap());
        assert!(
            !is_pool_within_target_range(
                &balances,
                &virtual_balances,
                centeredness.add(Bfp::epsilon()).unwrap()
            )
            .unwrap()
        );
    }
}
