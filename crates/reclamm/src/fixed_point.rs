//! Module emulating the operations on fixed points with exactly 18 decimals
//! as used by the ReCLAMM pool math.

use {
    crate::{error::Error, log_exp_math},
    anyhow::{Context, Result, bail},
    primitive_types::U256,
    std::{
        fmt::{self, Debug, Display, Formatter},
        str::FromStr,
        sync::LazyLock,
    },
};

/// Creates a [`Bfp`] from a decimal string literal, panicking on malformed
/// input. Meant for constants and tests.
#[macro_export]
macro_rules! bfp {
    ($val:literal) => {
        $val.parse::<$crate::fixed_point::Bfp>().unwrap()
    };
}

static ONE_18: LazyLock<U256> = LazyLock::new(|| U256::exp10(18));
static ZERO: LazyLock<Bfp> = LazyLock::new(|| Bfp(U256::zero()));
static EPSILON: LazyLock<Bfp> = LazyLock::new(|| Bfp(U256::one()));
static ONE: LazyLock<Bfp> = LazyLock::new(|| Bfp(*ONE_18));
static TWO: LazyLock<Bfp> = LazyLock::new(|| Bfp(*ONE_18 * 2));
static FOUR: LazyLock<Bfp> = LazyLock::new(|| Bfp(*ONE_18 * 4));
/// Relative error bound of `log_exp_math::pow`, `1e-14`.
static MAX_POW_RELATIVE_ERROR: LazyLock<Bfp> = LazyLock::new(|| Bfp(U256::from(10000_usize)));

/// Direction in which a fixed point operation rounds its result. The domain
/// is non-negative, so `Down` is toward zero and `Up` away from it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rounding {
    Down,
    Up,
}

/// Balancer-style fixed point number: an unsigned 256 bit integer scaled by
/// `1e18`.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Bfp(U256);

impl From<usize> for Bfp {
    fn from(num: usize) -> Self {
        Self(U256::from(num).checked_mul(*ONE_18).unwrap())
    }
}

impl FromStr for Bfp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut split_dot = s.splitn(2, '.');
        let units = split_dot
            .next()
            .expect("Splitting a string slice yields at least one element");
        let decimals = split_dot.next().unwrap_or("0");
        if units.is_empty() || decimals.is_empty() || decimals.len() > 18 {
            bail!("Invalid decimal representation");
        }
        Ok(Bfp(U256::from_dec_str(units)?
            .checked_mul(*ONE_18)
            .context("Too large number")?
            .checked_add(U256::from_dec_str(&format!("{decimals:0<18}"))?)
            .context("Too large number")?))
    }
}

impl Debug for Bfp {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "{}.{:0>18}",
            self.0 / *ONE_18,
            (self.0 % *ONE_18).as_u128()
        )
    }
}

impl Display for Bfp {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        Debug::fmt(self, formatter)
    }
}

impl serde::Serialize for Bfp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Bfp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Bfp {
    pub fn exp10(exp: i32) -> Self {
        match exp {
            i32::MIN..=-19 => Bfp::zero(),
            -18..=0 => Bfp(U256::exp10((exp + 18) as usize)),
            1..=i32::MAX => Bfp(U256::exp10(exp as usize + 18)),
        }
    }

    pub fn as_uint256(self) -> U256 {
        self.0
    }

    pub fn zero() -> Self {
        *ZERO
    }

    pub fn one() -> Self {
        *ONE
    }

    pub fn epsilon() -> Self {
        *EPSILON
    }

    pub fn from_wei(num: U256) -> Self {
        Self(num)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Self) -> Result<Self, Error> {
        Ok(Self(self.0.checked_add(other.0).ok_or(Error::AddOverflow)?))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: Self) -> Result<Self, Error> {
        Ok(Self(self.0.checked_sub(other.0).ok_or(Error::SubOverflow)?))
    }

    pub fn mul(self, other: Self, rounding: Rounding) -> Result<Self, Error> {
        match rounding {
            Rounding::Down => self.mul_down(other),
            Rounding::Up => self.mul_up(other),
        }
    }

    pub fn div(self, other: Self, rounding: Rounding) -> Result<Self, Error> {
        match rounding {
            Rounding::Down => self.div_down(other),
            Rounding::Up => self.div_up(other),
        }
    }

    pub fn mul_down(self, other: Self) -> Result<Self, Error> {
        Ok(Self(
            self.0.checked_mul(other.0).ok_or(Error::MulOverflow)? / *ONE_18,
        ))
    }

    pub fn mul_up(self, other: Self) -> Result<Self, Error> {
        let product = self.0.checked_mul(other.0).ok_or(Error::MulOverflow)?;
        Ok(if product.is_zero() {
            Bfp::zero()
        } else {
            Bfp(((product - 1) / *ONE_18) + 1)
        })
    }

    pub fn div_down(self, other: Self) -> Result<Self, Error> {
        if other.is_zero() {
            Err(Error::ZeroDivision)
        } else if self.is_zero() {
            Ok(Bfp::zero())
        } else {
            let a_inflated = self.0.checked_mul(*ONE_18).ok_or(Error::DivInternal)?;
            Ok(Self(a_inflated / other.0))
        }
    }

    pub fn div_up(self, other: Self) -> Result<Self, Error> {
        if other.is_zero() {
            Err(Error::ZeroDivision)
        } else if self.is_zero() {
            Ok(Bfp::zero())
        } else {
            let a_inflated = self.0.checked_mul(*ONE_18).ok_or(Error::DivInternal)?;
            Ok(Self(((a_inflated - 1) / other.0) + 1))
        }
    }

    /// `self^exp`, rounded so that the result never exceeds the exact value.
    pub fn pow_down(self, exp: Self) -> Result<Self, Error> {
        if exp == Bfp::one() {
            return Ok(self);
        } else if exp == *TWO {
            return self.mul_down(self);
        } else if exp == *FOUR {
            let square = self.mul_down(self)?;
            return square.mul_down(square);
        }

        let raw = Bfp(log_exp_math::pow(self.0, exp.0)?);
        let max_error = raw.mul_up(*MAX_POW_RELATIVE_ERROR)?.add(Bfp::epsilon())?;

        if raw < max_error {
            Ok(Bfp::zero())
        } else {
            raw.sub(max_error)
        }
    }

    /// `self^exp`, rounded so that the result is never below the exact value.
    pub fn pow_up(self, exp: Self) -> Result<Self, Error> {
        if exp == Bfp::one() {
            return Ok(self);
        } else if exp == *TWO {
            return self.mul_up(self);
        } else if exp == *FOUR {
            let square = self.mul_up(self)?;
            return square.mul_up(square);
        }

        let raw = Bfp(log_exp_math::pow(self.0, exp.0)?);
        let max_error = raw.mul_up(*MAX_POW_RELATIVE_ERROR)?.add(Bfp::epsilon())?;

        raw.add(max_error)
    }

    /// `1 - self`, saturating at zero.
    pub fn complement(self) -> Self {
        Self(ONE_18.saturating_sub(self.0))
    }

    /// `sqrt(self)`, rounded down.
    pub fn sqrt(self) -> Result<Self, Error> {
        let inflated = self.0.checked_mul(*ONE_18).ok_or(Error::MulOverflow)?;
        Ok(Self(inflated.integer_sqrt()))
    }

    pub fn min(self, other: Self) -> Self {
        std::cmp::min(self, other)
    }

    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }
}
