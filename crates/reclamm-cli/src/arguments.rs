use {
    reclamm::{Bfp, SwapKind},
    std::{path::PathBuf, time::Duration},
};

#[derive(clap::Parser, Debug)]
#[clap(name = "reclamm", about = "Offline ReCLAMM pool quoting and inspection", version)]
pub struct Arguments {
    #[clap(long, env, default_value = "warn,reclamm=info,reclamm_cli=info")]
    pub log_filter: String,

    /// Emit logs as JSON lines.
    #[clap(long, env)]
    pub log_json: bool,

    /// TOML file holding the pool `balances` and its `config` and/or `state`.
    #[clap(long, env = "RECLAMM_POOL")]
    pub pool: PathBuf,

    /// Ledger time as a unix timestamp in seconds. Defaults to the system
    /// clock.
    #[clap(long)]
    pub now: Option<u64>,

    /// Write the resulting balances and state back to the pool file.
    #[clap(long)]
    pub write: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Funding balances in the ratio the `config` section requires.
    InitialBalances {
        #[clap(long, default_value = "0")]
        reference_token: usize,
        #[clap(long)]
        amount: Bfp,
    },
    /// Seed the pool `state` from its `config` and `balances`.
    Init,
    /// Show the pool as it would look after an interaction at `--now`.
    Inspect,
    /// Price a swap and apply it to the balances.
    Swap {
        #[clap(long, value_enum, default_value = "given-in")]
        kind: Kind,
        #[clap(long)]
        token_in: usize,
        #[clap(long)]
        token_out: usize,
        /// The fixed side of the swap.
        #[clap(long)]
        amount: Bfp,
    },
    /// Persist the virtual balances refreshed up to `--now`.
    Sync,
    SetCenterednessMargin {
        #[clap(long)]
        margin: Bfp,
    },
    SetDailyPriceShiftExponent {
        #[clap(long)]
        exponent: Bfp,
    },
    /// Move the price ratio to `end_price_ratio` over `duration`.
    StartPriceRatioUpdate {
        #[clap(long)]
        end_price_ratio: Bfp,
        /// Delay before the update starts, e.g. `1h`.
        #[clap(long, value_parser = humantime::parse_duration, default_value = "0s")]
        delay: Duration,
        /// Length of the update, e.g. `2days`.
        #[clap(long, value_parser = humantime::parse_duration)]
        duration: Duration,
    },
    StopPriceRatioUpdate,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    GivenIn,
    GivenOut,
}

impl From<Kind> for SwapKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::GivenIn => SwapKind::GivenIn,
            Kind::GivenOut => SwapKind::GivenOut,
        }
    }
}
