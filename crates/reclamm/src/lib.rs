//! Fixed point pricing engine for ReCLAMM pools: two token pools whose
//! concentrated price range follows the market and can be rescaled over
//! time.

pub mod centeredness;
pub mod config;
pub mod error;
pub mod fixed_point;
pub mod initialization;
pub mod log_exp_math;
pub mod math;
pub mod pool;
pub mod price_ratio;
pub mod price_shift;
pub mod swap;
pub mod virtual_balances;

pub use {
    config::PoolConfig,
    error::{Error, ErrorKind},
    fixed_point::{Bfp, Rounding},
    pool::PoolState,
    price_ratio::PriceRatioState,
    swap::{SwapKind, SwapRequest},
};
