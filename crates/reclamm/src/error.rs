//! Errors raised by the ReCLAMM pricing engine.

/// Broad category an [`Error`] belongs to. Callers decide retry policy based
/// on this, the engine itself never retries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The caller asked for something the pool state cannot satisfy.
    PreconditionViolation,
    /// The pool cannot pay out the computed amount from its real balances.
    InsufficientLiquidity,
    /// Fixed point arithmetic produced an invalid or unrepresentable value.
    ArithmeticFault,
    /// Pool parameters are out of bounds.
    ConfigurationFault,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("add overflow")]
    AddOverflow,
    #[error("sub overflow")]
    SubOverflow,
    #[error("mul overflow")]
    MulOverflow,
    #[error("zero division")]
    ZeroDivision,
    #[error("div internal")]
    DivInternal,
    #[error("x out of bounds")]
    XOutOfBounds,
    #[error("y out of bounds")]
    YOutOfBounds,
    #[error("product out of bounds")]
    ProductOutOfBounds,
    #[error("invalid exponent")]
    InvalidExponent,
    #[error("range tracking denominator is not positive")]
    NonPositiveDenominator,
    #[error("virtual balance reached zero")]
    ZeroVirtualBalance,

    #[error("invalid token index")]
    InvalidToken,
    #[error("amount out is greater than or equal to the real balance")]
    AmountOutExceedsBalance,
    #[error("current timestamp is before the last update")]
    TimestampRegression,
    #[error("pool is outside its target range")]
    PoolOutsideTargetRange,
    #[error("initial balance ratio exceeds tolerance")]
    BalanceRatioExceedsTolerance,
    #[error("initial spot price deviates from the target price")]
    InitialPriceExceedsTolerance,

    #[error("computed amount out exhausts the real balance")]
    InsufficientLiquidity,

    #[error("centeredness margin out of bounds")]
    InvalidCenterednessMargin,
    #[error("daily price shift exponent out of bounds")]
    InvalidDailyPriceShiftExponent,
    #[error("daily price shift base out of bounds")]
    InvalidDailyPriceShiftBase,
    #[error("fourth root price ratio must be greater than one")]
    InvalidFourthRootPriceRatio,
    #[error("prices must satisfy 0 < min < target < max")]
    InvalidPriceRange,
    #[error("price ratio update start time is after end time")]
    InvalidUpdateWindow,
    #[error("price ratio update duration is too short")]
    PriceRatioUpdateDurationTooShort,
    #[error("price ratio update is too fast")]
    PriceRatioUpdateTooFast,
    #[error("fourth root price ratio delta is below minimum")]
    FourthRootPriceRatioDeltaBelowMin,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AddOverflow
            | Error::SubOverflow
            | Error::MulOverflow
            | Error::ZeroDivision
            | Error::DivInternal
            | Error::XOutOfBounds
            | Error::YOutOfBounds
            | Error::ProductOutOfBounds
            | Error::InvalidExponent
            | Error::NonPositiveDenominator
            | Error::ZeroVirtualBalance => ErrorKind::ArithmeticFault,
            Error::InvalidToken
            | Error::AmountOutExceedsBalance
            | Error::TimestampRegression
            | Error::PoolOutsideTargetRange
            | Error::BalanceRatioExceedsTolerance
            | Error::InitialPriceExceedsTolerance => ErrorKind::PreconditionViolation,
            Error::InsufficientLiquidity => ErrorKind::InsufficientLiquidity,
            Error::InvalidCenterednessMargin
            | Error::InvalidDailyPriceShiftExponent
            | Error::InvalidDailyPriceShiftBase
            | Error::InvalidFourthRootPriceRatio
            | Error::InvalidPriceRange
            | Error::InvalidUpdateWindow
            | Error::PriceRatioUpdateDurationTooShort
            | Error::PriceRatioUpdateTooFast
            | Error::FourthRootPriceRatioDeltaBelowMin => ErrorKind::ConfigurationFault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            Error::AmountOutExceedsBalance.kind(),
            ErrorKind::PreconditionViolation
        );
        assert_eq!(
            Error::InsufficientLiquidity.kind(),
            ErrorKind::InsufficientLiquidity
        );
        assert_eq!(
            Error::NonPositiveDenominator.kind(),
            ErrorKind::ArithmeticFault
        );
        assert_eq!(
            Error::InvalidCenterednessMargin.kind(),
            ErrorKind::ConfigurationFault
        );
    }
}
