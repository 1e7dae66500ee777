pub mod arguments;

use {
    anyhow::{Context, Result},
    arguments::{Arguments, Command},
    reclamm::{
        Bfp,
        PoolConfig,
        PoolState,
        Rounding,
        SwapKind,
        SwapRequest,
        initialization::compute_initial_balances,
    },
    serde::{Deserialize, Serialize},
    serde_json::{Value, json},
    std::{
        path::Path,
        time::{SystemTime, UNIX_EPOCH},
    },
};

/// Contents of a pool file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PoolFile {
    /// Real balances scaled to 18 decimals.
    pub balances: [Bfp; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PoolConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PoolState>,
}

impl PoolFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pool file {}", path.display()))?;
        let file: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse pool file {}", path.display()))?;
        if let Some(config) = &file.config {
            config.validate().context("invalid [config] section")?;
        }
        if let Some(state) = &file.state {
            state.validate().context("invalid [state] section")?;
        }
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize pool file")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write pool file {}", path.display()))
    }

    fn config(&self) -> Result<&PoolConfig> {
        self.config.as_ref().context("pool file has no [config] section")
    }

    fn state_mut(&mut self) -> Result<&mut PoolState> {
        self.state
            .as_mut()
            .context("pool file has no [state] section, run `init` first")
    }
}

/// Executes the command and returns its JSON report.
pub fn run(args: Arguments) -> Result<Value> {
    tracing::debug!(?args, "running");
    let now = match args.now {
        Some(now) => now,
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock is before the unix epoch")?
            .as_secs(),
    };

    let mut file = PoolFile::load(&args.pool)?;
    let report = execute(&args.command, &mut file, now)?;
    if args.write {
        file.save(&args.pool)?;
        tracing::info!(path = %args.pool.display(), "updated pool file");
    }
    Ok(report)
}

fn execute(command: &Command, file: &mut PoolFile, now: u64) -> Result<Value> {
    let report = match command {
        Command::InitialBalances {
            reference_token,
            amount,
        } => {
            let config = file.config()?;
            let balances = compute_initial_balances(
                config.min_price,
                config.max_price,
                config.target_price,
                *reference_token,
                *amount,
            )?;
            file.balances = balances;
            json!({ "balances": balances })
        }
        Command::Init => {
            let state = PoolState::initialize(file.config()?, &file.balances, now)
                .context("failed to initialize pool")?;
            file.state = Some(state);
            json!({ "state": state })
        }
        Command::Inspect => {
            let balances = file.balances;
            inspect(file.state_mut()?, &balances, now)?
        }
        Command::Swap {
            kind,
            token_in,
            token_out,
            amount,
        } => {
            let request = SwapRequest {
                kind: SwapKind::from(*kind),
                token_in_index: *token_in,
                token_out_index: *token_out,
                amount_given_scaled18: *amount,
            };
            let balances = file.balances;
            let computed = file
                .state_mut()?
                .swap(&request, &balances, now)
                .context("swap failed")?;
            let (amount_in, amount_out) = match request.kind {
                SwapKind::GivenIn => (*amount, computed),
                SwapKind::GivenOut => (computed, *amount),
            };
            // Indices were validated by the swap.
            file.balances[*token_in] = file.balances[*token_in].add(amount_in)?;
            file.balances[*token_out] = file.balances[*token_out].sub(amount_out)?;
            json!({
                "amountIn": amount_in,
                "amountOut": amount_out,
                "balances": file.balances,
            })
        }
        Command::Sync => {
            let balances = file.balances;
            let state = file.state_mut()?;
            let changed = state.sync(&balances, now)?;
            json!({ "changed": changed, "virtualBalances": state.last_virtual_balances })
        }
        Command::SetCenterednessMargin { margin } => {
            let balances = file.balances;
            let state = file.state_mut()?;
            state.set_centeredness_margin(*margin, &balances, now)?;
            json!({ "centerednessMargin": state.centeredness_margin })
        }
        Command::SetDailyPriceShiftExponent { exponent } => {
            let balances = file.balances;
            let actual = file
                .state_mut()?
                .set_daily_price_shift_exponent(*exponent, &balances, now)?;
            json!({ "dailyPriceShiftExponent": actual })
        }
        Command::StartPriceRatioUpdate {
            end_price_ratio,
            delay,
            duration,
        } => {
            let start_time = now
                .checked_add(delay.as_secs())
                .context("start time overflows")?;
            let end_time = start_time
                .checked_add(duration.as_secs())
                .context("end time overflows")?;
            let balances = file.balances;
            let state = file.state_mut()?;
            let actual_start_time = state.start_price_ratio_update(
                *end_price_ratio,
                start_time,
                end_time,
                &balances,
                now,
            )?;
            json!({
                "priceRatioUpdateStartTime": actual_start_time,
                "priceRatioState": state.price_ratio_state,
            })
        }
        Command::StopPriceRatioUpdate => {
            let balances = file.balances;
            let state = file.state_mut()?;
            state.stop_price_ratio_update(&balances, now)?;
            json!({ "priceRatioState": state.price_ratio_state })
        }
    };
    Ok(report)
}

fn inspect(state: &PoolState, balances: &[Bfp; 2], now: u64) -> Result<Value> {
    let (virtual_balances, changed) = state.current_virtual_balances(balances, now)?;
    let (centeredness, is_above_center) = state.centeredness(balances, now)?;
    let (min_price, max_price) = state.price_range(balances, now)?;
    Ok(json!({
        "timestamp": now,
        "balances": balances,
        "virtualBalances": virtual_balances,
        "virtualBalancesChanged": changed,
        "fourthRootPriceRatio": state.current_fourth_root_price_ratio(now)?,
        "priceRatio": state.current_price_ratio(balances, now)?,
        "minPrice": min_price,
        "maxPrice": max_price,
        "spotPrice": state.spot_price(balances, now)?,
        "centeredness": centeredness,
        "isAboveCenter": is_above_center,
        "isWithinTargetRange": state.is_within_target_range(balances, now)?,
        "invariant": state.invariant(balances, now, Rounding::Down)?,
        "dailyPriceShiftExponent": state.daily_price_shift_exponent()?,
        "priceRatioState": state.price_ratio_state,
    }))
}
