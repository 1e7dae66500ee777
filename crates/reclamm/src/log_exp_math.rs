//! Fixed point natural logarithm and exponential used to evaluate `x^y` for
//! fractional exponents.
//!
//! Values are signed 18 decimal fixed point numbers. Internally the series
//! expansions run at 20 decimals, and logarithms of values close to one run at
//! 36 decimals to keep `pow` accurate for bases near one, which is the regime
//! of both price ratio interpolation and daily price shift decay.

use {
    crate::error::Error,
    num::{BigInt, One, Signed, Zero},
    number::conversions::{big_int_to_u256, u256_to_big_int},
    primitive_types::U256,
    std::sync::LazyLock,
};

fn int(digits: &str) -> BigInt {
    BigInt::parse_bytes(digits.as_bytes(), 10).expect("valid decimal constant")
}

static ONE_18: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(10).pow(18));
static ONE_20: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(10).pow(20));
static ONE_36: LazyLock<BigInt> = LazyLock::new(|| BigInt::from(10).pow(36));

static MAX_NATURAL_EXPONENT: LazyLock<BigInt> = LazyLock::new(|| &*ONE_18 * 130);
static MIN_NATURAL_EXPONENT: LazyLock<BigInt> = LazyLock::new(|| &*ONE_18 * -41);

static LN_36_LOWER_BOUND: LazyLock<BigInt> =
    LazyLock::new(|| &*ONE_18 - BigInt::from(10).pow(17));
static LN_36_UPPER_BOUND: LazyLock<BigInt> =
    LazyLock::new(|| &*ONE_18 + BigInt::from(10).pow(17));

/// `2^254 / 1e20`, the largest exponent whose product with a logarithm cannot
/// overflow.
static MILD_EXPONENT_BOUND: LazyLock<U256> =
    LazyLock::new(|| (U256::one() << 254) / U256::exp10(20));

// 18 decimal constants: x_n = 2^(7 - n), a_n = e^(x_n) without decimals.
static X0: LazyLock<BigInt> = LazyLock::new(|| int("128000000000000000000"));
static A0: LazyLock<BigInt> =
    LazyLock::new(|| int("38877084059945950922200000000000000000000000000000000000"));
static X1: LazyLock<BigInt> = LazyLock::new(|| int("64000000000000000000"));
static A1: LazyLock<BigInt> = LazyLock::new(|| int("6235149080811616882910000000"));

// 20 decimal constants: x_n = 2^(7 - n), a_n = e^(x_n).
static STEPS_20: LazyLock<[(BigInt, BigInt); 10]> = LazyLock::new(|| {
    [
        (
            int("3200000000000000000000"),
            int("7896296018268069516100000000000000"),
        ),
        (
            int("1600000000000000000000"),
            int("888611052050787263676000000"),
        ),
        (int("800000000000000000000"), int("298095798704172827474000")),
        (int("400000000000000000000"), int("5459815003314423907810")),
        (int("200000000000000000000"), int("738905609893065022723")),
        (int("100000000000000000000"), int("271828182845904523536")),
        (int("50000000000000000000"), int("164872127070012814685")),
        (int("25000000000000000000"), int("128402541668774148407")),
        (int("12500000000000000000"), int("113314845306682631683")),
        (int("6250000000000000000"), int("106449445891785942956")),
    ]
});

/// Computes `x^y` for 18 decimal fixed point `x` and `y`.
///
/// The result carries a small relative error; callers that care about the
/// rounding direction should go through `Bfp::pow_down` or `Bfp::pow_up`.
pub fn pow(x: U256, y: U256) -> Result<U256, Error> {
    if y.is_zero() {
        return Ok(U256::exp10(18));
    }
    if x.is_zero() {
        return Ok(U256::zero());
    }
    if x.bit(255) {
        return Err(Error::XOutOfBounds);
    }
    if y >= *MILD_EXPONENT_BOUND {
        return Err(Error::YOutOfBounds);
    }

    let x = u256_to_big_int(&x);
    let y = u256_to_big_int(&y);

    let logx_times_y = if *LN_36_LOWER_BOUND < x && x < *LN_36_UPPER_BOUND {
        let ln_36_x = ln_36(x);
        // `ln_36_x` has 36 decimals; split it so the product with `y` keeps
        // the extra precision without overflowing the signed 256 bit domain.
        (&ln_36_x / &*ONE_18) * &y + ((&ln_36_x % &*ONE_18) * &y) / &*ONE_18
    } else {
        ln(x) * &y
    };
    let logx_times_y = logx_times_y / &*ONE_18;

    if logx_times_y < *MIN_NATURAL_EXPONENT || logx_times_y > *MAX_NATURAL_EXPONENT {
        return Err(Error::ProductOutOfBounds);
    }

    big_int_to_u256(&exp(logx_times_y)?).map_err(|_| Error::MulOverflow)
}

/// Natural exponential of an 18 decimal fixed point value in `[-41, 130]`.
pub fn exp(x: BigInt) -> Result<BigInt, Error> {
    if x < *MIN_NATURAL_EXPONENT || x > *MAX_NATURAL_EXPONENT {
        return Err(Error::InvalidExponent);
    }

    if x.is_negative() {
        // e^(-x) = 1 / e^x
        return Ok((&*ONE_18 * &*ONE_18) / exp(-x)?);
    }

    let mut x = x;
    let first_an = if x >= *X0 {
        x -= &*X0;
        A0.clone()
    } else if x >= *X1 {
        x -= &*X1;
        A1.clone()
    } else {
        BigInt::one()
    };

    // Switch to 20 decimals for the remaining decomposition.
    x *= 100;

    let mut product = ONE_20.clone();
    // The two smallest steps are not needed: the Taylor series below converges
    // fast enough for x < 0.25.
    for (x_n, a_n) in STEPS_20.iter().take(8) {
        if x >= *x_n {
            x -= x_n;
            product = (product * a_n) / &*ONE_20;
        }
    }

    let mut series_sum = ONE_20.clone();
    let mut term = x.clone();
    series_sum += &term;
    for n in 2..=12 {
        term = ((term * &x) / &*ONE_20) / n;
        series_sum += &term;
    }

    Ok((((product * series_sum) / &*ONE_20) * first_an) / 100)
}

/// Natural logarithm of a strictly positive 18 decimal fixed point value.
fn ln(a: BigInt) -> BigInt {
    if a < *ONE_18 {
        // ln(a) = -ln(1 / a)
        return -ln((&*ONE_18 * &*ONE_18) / a);
    }

    let mut a = a;
    let mut sum = BigInt::zero();
    if a >= &*A0 * &*ONE_18 {
        a /= &*A0;
        sum += &*X0;
    }
    if a >= &*A1 * &*ONE_18 {
        a /= &*A1;
        sum += &*X1;
    }

    sum *= 100;
    a *= 100;

    for (x_n, a_n) in STEPS_20.iter() {
        if a >= *a_n {
            a = (a * &*ONE_20) / a_n;
            sum += x_n;
        }
    }

    // ln(a) = 2 * artanh(z), z = (a - 1) / (a + 1)
    let z = ((&a - &*ONE_20) * &*ONE_20) / (&a + &*ONE_20);
    let z_squared = (&z * &z) / &*ONE_20;

    let mut num = z.clone();
    let mut series_sum = num.clone();
    for d in [3, 5, 7, 9, 11] {
        num = (num * &z_squared) / &*ONE_20;
        series_sum += &num / d;
    }
    series_sum *= 2;

    (sum + series_sum) / 100
}

/// Natural logarithm with 36 decimals of an 18 decimal value close to one.
fn ln_36(x: BigInt) -> BigInt {
    let x = x * &*ONE_18;

    let z = ((&x - &*ONE_36) * &*ONE_36) / (&x + &*ONE_36);
    let z_squared = (&z * &z) / &*ONE_36;

    let mut num = z.clone();
    let mut series_sum = num.clone();
    for d in [3, 5, 7, 9, 11, 13, 15] {
        num = (num * &z_squared) / &*ONE_36;
        series_sum += &num / d;
    }

    series_sum * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: U256, expected: U256, tolerance: U256) {
        let diff = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        assert!(
            diff <= tolerance,
            "{actual} differs from {expected} by {diff}"
        );
    }

    #[test]
    fn pow_trivial_cases() {
        assert_eq!(pow(U256::from(5), U256::zero()).unwrap(), U256::exp10(18));
        assert_eq!(pow(U256::zero(), U256::exp10(18)).unwrap(), U256::zero());
        assert_eq!(
            pow(U256::one() << 255, U256::exp10(18)).unwrap_err(),
            Error::XOutOfBounds
        );
        assert_eq!(
            pow(U256::exp10(18), U256::MAX).unwrap_err(),
            Error::YOutOfBounds
        );
    }

    #[test]
    fn pow_square_root_of_two() {
        // sqrt(2) = 1.414213562373095048...
        assert_close(
            pow(U256::exp10(18) * 2, U256::exp10(17) * 5).unwrap(),
            U256::from(1_414_213_562_373_095_048_u64),
            U256::from(100_000_u64),
        );
    }

    #[test]
    fn pow_near_one_uses_extended_precision() {
        // 0.5^(1/86400 * 86400) with a base close to one:
        // (1 - 1/124649)^86400 = 0.50000...
        let base = U256::exp10(18) - U256::exp10(18) / U256::from(124_649);
        let result = pow(base, U256::from(86_400) * U256::exp10(18)).unwrap();
        assert_close(result, U256::exp10(17) * 5, U256::exp10(13));
    }

    #[test]
    fn pow_product_out_of_bounds() {
        // ln(0.5) * 100 = -69.3 < -41
        assert_eq!(
            pow(U256::exp10(17) * 5, U256::exp10(20)).unwrap_err(),
            Error::ProductOutOfBounds
        );
    }

    #[test]
    fn exp_of_one() {
        // e = 2.718281828459045235...
        let e = exp(ONE_18.clone()).unwrap();
        let diff = (e - int("2718281828459045235")).abs();
        assert!(diff < BigInt::from(100));
    }

    #[test]
    fn exp_bounds() {
        assert_eq!(
            exp(&*ONE_18 * 131).unwrap_err(),
            Error::InvalidExponent
        );
        assert_eq!(
            exp(&*ONE_18 * -42).unwrap_err(),
            Error::InvalidExponent
        );
        assert_eq!(exp(BigInt::zero()).unwrap(), ONE_18.clone());
    }

    #[test]
    fn ln_is_inverse_of_exp() {
        let x: BigInt = &*ONE_18 * 5;
        let diff = (exp(ln(x.clone())).unwrap() - x).abs();
        assert!(diff < BigInt::from(1_000));
    }
}
