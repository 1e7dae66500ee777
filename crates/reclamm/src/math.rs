//! Single-step operations on raw fixed point integers. Products are formed in
//! arbitrary precision before dividing so that a `mul` followed by a `div`
//! only rounds once.

use {
    crate::{
        error::Error,
        fixed_point::{Bfp, Rounding},
    },
    num::{BigInt, Integer, Zero},
    number::conversions::{big_int_to_u256, u256_to_big_int},
    primitive_types::U256,
};

pub fn to_big_int(value: Bfp) -> BigInt {
    u256_to_big_int(&value.as_uint256())
}

pub fn from_big_int(value: &BigInt) -> Result<Bfp, Error> {
    big_int_to_u256(value)
        .map(Bfp::from_wei)
        .map_err(|_| Error::MulOverflow)
}

/// Divides two arbitrary precision integers with the requested rounding.
pub fn div_raw(
    numerator: &BigInt,
    denominator: &BigInt,
    rounding: Rounding,
) -> Result<BigInt, Error> {
    if denominator.is_zero() {
        return Err(Error::ZeroDivision);
    }
    let (quotient, remainder) = numerator.div_rem(denominator);
    Ok(match rounding {
        Rounding::Up if !remainder.is_zero() => quotient + 1,
        _ => quotient,
    })
}

/// `a * b / c` on the raw 18 decimal integers.
pub fn mul_div(a: Bfp, b: Bfp, c: Bfp, rounding: Rounding) -> Result<Bfp, Error> {
    let product = to_big_int(a) * to_big_int(b);
    from_big_int(&div_raw(&product, &to_big_int(c), rounding)?)
}

/// Integer square root of a raw value, rounded down.
pub fn sqrt_raw(value: &BigInt) -> Result<BigInt, Error> {
    if value < &BigInt::zero() {
        return Err(Error::InvalidExponent);
    }
    Ok(value.sqrt())
}

/// Square root of a raw 36 decimal value, returned with 18 decimals.
pub fn sqrt_36_to_18(value: &BigInt) -> Result<Bfp, Error> {
    from_big_int(&sqrt_raw(value)?)
}

/// `1e36` as a raw integer.
pub fn one_36() -> BigInt {
    u256_to_big_int(&U256::exp10(36))
}

#[cfg(test)]
mod tests {
    use {super::*, crate::bfp};

    #[test]
    fn mul_div_rounds_once() {
        assert_eq!(
            mul_div(Bfp::from(2), Bfp::from(1), Bfp::from(3), Rounding::Down).unwrap(),
            Bfp::from_wei(U256::from(666_666_666_666_666_666_u128))
        );
        assert_eq!(
            mul_div(Bfp::from(2), Bfp::from(1), Bfp::from(3), Rounding::Up).unwrap(),
            Bfp::from_wei(U256::from(666_666_666_666_666_667_u128))
        );
        assert_eq!(
            mul_div(Bfp::one(), Bfp::one(), Bfp::zero(), Rounding::Down).unwrap_err(),
            Error::ZeroDivision
        );
    }

    #[test]
    fn mul_div_with_wide_intermediate() {
        // (2^200 wei)^2 does not fit 256 bits but the quotient does.
        let large = Bfp::from_wei(U256::one() << 200);
        assert_eq!(
            mul_div(large, large, large, Rounding::Down).unwrap(),
            large
        );
    }

    #[test]
    fn sqrt_36() {
        assert_eq!(
            sqrt_36_to_18(&(one_36() * 4)).unwrap(),
            Bfp::from(2)
        );
        assert_eq!(sqrt_36_to_18(&one_36()).unwrap(), bfp!("1"));
        assert_eq!(
            sqrt_raw(&BigInt::from(-1)).unwrap_err(),
            Error::InvalidExponent
        );
    }
}
