//! Fixed-precision math for the aggregation engine.
//!
//! On-chain amounts are 256-bit integers (`ethers_core::types::U256`) and
//! never touch floating point. Price impact, savings percentages, and
//! other comparison-only values are `f64` and must never feed back into
//! amount arithmetic: a split between exact reserve arithmetic and
//! display-only ratios.

use ethers_core::types::U256;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

type Result<T> = std::result::Result<T, NumericError>;

/// Qualitative price-impact band (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningLevel {
    Low,
    Medium,
    High,
    VeryHigh,
    Extreme,
}

impl WarningLevel {
    pub fn from_impact_percent(impact: f64) -> Self {
        if impact < 1.0 {
            WarningLevel::Low
        } else if impact < 3.0 {
            WarningLevel::Medium
        } else if impact < 5.0 {
            WarningLevel::High
        } else if impact < 15.0 {
            WarningLevel::VeryHigh
        } else {
            WarningLevel::Extreme
        }
    }

    /// Only `Extreme` sets `shouldBlock` per spec.md §4.1.
    pub fn should_block(self) -> bool {
        matches!(self, WarningLevel::Extreme)
    }
}

/// Uniswap-V2 constant-product output formula with the 0.3% fee embedded:
/// `amountOut = floor((amountIn*997*reserveOut) / (reserveIn*1000 + amountIn*997))`.
pub fn v2_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> Result<U256> {
    if amount_in.is_zero() {
        return Err(NumericError::InvalidAmount("amountIn must be positive".into()));
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(NumericError::InsufficientLiquidity);
    }

    let amount_in_with_fee = amount_in * U256::from(997u64);
    let numerator = amount_in_with_fee * reserve_out;
    let denominator = reserve_in * U256::from(1000u64) + amount_in_with_fee;

    let amount_out = numerator / denominator;
    if amount_out.is_zero() {
        return Err(NumericError::InsufficientLiquidity);
    }
    Ok(amount_out)
}

/// V2 price impact: `|executionPrice - midPrice| / midPrice * 100`, where
/// the execution price is the pool's own post-trade price (reserves shifted
/// by this swap), not the trader's average fill price. Two reserve ratios
/// compared directly, so decimal renormalization cancels out as long as
/// `reserveIn`/`reserveOut` share the same decimal base before and after
/// the shift, which they always do here.
pub fn v2_price_impact(amount_in: U256, amount_out: U256, reserve_in: U256, reserve_out: U256) -> f64 {
    if reserve_in.is_zero() || amount_out >= reserve_out {
        return 0.0;
    }
    let mid = u256_to_f64(reserve_out) / u256_to_f64(reserve_in);
    if mid == 0.0 {
        return 0.0;
    }

    let new_reserve_in = reserve_in + amount_in;
    let new_reserve_out = reserve_out - amount_out;
    let post_trade_price = u256_to_f64(new_reserve_out) / u256_to_f64(new_reserve_in);

    ((post_trade_price - mid).abs() / mid) * 100.0
}

/// `(sqrtPriceX96 / 2^96)^2`, adjusted by `10^(decimals1 - decimals0)`, is
/// the instantaneous price of token0 denominated in token1.
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> f64 {
    let sqrt_price = u256_to_f64(sqrt_price_x96) / TWO_POW_96;
    let raw_price = sqrt_price * sqrt_price;
    raw_price * 10f64.powi(decimals1 as i32 - decimals0 as i32)
}

/// Inverse of [`sqrt_price_x96_to_price`]: given a price of token0 in
/// token1, recover the corresponding `sqrtPriceX96`.
pub fn price_to_sqrt_price_x96(price: f64, decimals0: u8, decimals1: u8) -> U256 {
    let raw_price = price / 10f64.powi(decimals1 as i32 - decimals0 as i32);
    let sqrt_price = raw_price.max(0.0).sqrt() * TWO_POW_96;
    f64_to_u256(sqrt_price)
}

/// V3 price impact from the pre/post-swap `sqrtPriceX96`:
/// `priceRatio = (after/before)^2`; `impact = |priceRatio - 1| * 100`.
pub fn v3_price_impact(sqrt_price_before: U256, sqrt_price_after: U256) -> f64 {
    if sqrt_price_before.is_zero() {
        return 0.0;
    }
    let before = u256_to_f64(sqrt_price_before);
    let after = u256_to_f64(sqrt_price_after);
    let price_ratio = (after / before).powi(2);
    (price_ratio - 1.0).abs() * 100.0
}

/// Provisional impact estimate used only to seed
/// [`reconstruct_sqrt_price_after`] when a V3 quoter doesn't report the
/// post-swap price directly: compares the trade's human-unit execution
/// price (`amountOut`/`amountIn`, decimal-adjusted) against the pool's
/// pre-swap mid price in the same direction as `zero_for_one`.
pub fn v3_execution_vs_mid_impact(
    amount_in: U256,
    amount_out: U256,
    mid_price_token0_in_token1: f64,
    decimals_in: u8,
    decimals_out: u8,
    zero_for_one: bool,
) -> f64 {
    if amount_in.is_zero() || mid_price_token0_in_token1 == 0.0 {
        return 0.0;
    }
    let human_in = u256_to_f64(amount_in) / 10f64.powi(decimals_in as i32);
    let human_out = u256_to_f64(amount_out) / 10f64.powi(decimals_out as i32);
    if human_in == 0.0 {
        return 0.0;
    }
    let execution_token1_per_token0 = if zero_for_one {
        human_out / human_in
    } else {
        human_in / human_out
    };
    ((execution_token1_per_token0 - mid_price_token0_in_token1).abs() / mid_price_token0_in_token1) * 100.0
}

/// Reconstructs `sqrtPriceX96After` from the execution/mid-price ratio when
/// the quoter only reports `amountOut`. Documented fallback per spec.md §9
/// Open question: prefer a quoter reporting the post-swap price directly
/// when the target chain has one.
pub fn reconstruct_sqrt_price_after(sqrt_price_before: U256, impact_percent: f64) -> U256 {
    let ratio = (1.0 + impact_percent / 100.0).abs().sqrt();
    let before = u256_to_f64(sqrt_price_before);
    f64_to_u256(before * ratio)
}

/// `bps = floor(slippagePercent * 100)`; `minOut = amountOut*(10000-bps)/10000`.
pub fn min_amount_out(amount_out: U256, slippage_percent: f64) -> Result<U256> {
    let bps = slippage_bps(slippage_percent)?;
    Ok(amount_out * U256::from(10_000u64 - bps) / U256::from(10_000u64))
}

/// Symmetric counterpart of [`min_amount_out`] for exact-output routes:
/// `maxIn = amountIn*(10000+bps)/10000`.
pub fn max_amount_in(amount_in: U256, slippage_percent: f64) -> Result<U256> {
    let bps = slippage_bps(slippage_percent)?;
    Ok(amount_in * U256::from(10_000u64 + bps) / U256::from(10_000u64))
}

fn slippage_bps(slippage_percent: f64) -> Result<u64> {
    if !(0.0..=100.0).contains(&slippage_percent) {
        return Err(NumericError::InvalidAmount(
            "slippage must be within [0, 100]".into(),
        ));
    }
    Ok((slippage_percent * 100.0).floor() as u64)
}

/// Parses a decimal string into integer token units by shifting the
/// decimal point `decimals` places, per spec.md §4.1.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(NumericError::InvalidAmount("empty amount".into()));
    }

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if frac_part.len() > decimals as usize {
        return Err(NumericError::InvalidAmount(format!(
            "amount has more fractional digits than the token's {decimals} decimals"
        )));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(NumericError::InvalidAmount("amount is not a decimal number".into()));
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let padded_frac = format!("{:0<width$}", frac_part, width = decimals as usize);
    let digits = format!("{int_part}{padded_frac}");

    U256::from_dec_str(&digits).map_err(|e| NumericError::InvalidAmount(e.to_string()))
}

/// Formats integer token units back into a decimal string, trimming
/// superfluous trailing zeros. Inverse of [`parse_amount`].
pub fn format_amount(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{:0>width$}", digits, width = decimals + 1)
    } else {
        digits
    };

    let split_at = padded.len() - decimals;
    let (int_part, frac_part) = padded.split_at(split_at);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

const TWO_POW_96: f64 = 79_228_162_514_264_337_593_543_950_336.0; // 2^96

/// Lossy `U256 -> f64` conversion used only for comparisons and display
/// (price impact, savings percentages), never for amount arithmetic.
fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::MAX)
}

fn f64_to_u256(value: f64) -> U256 {
    if value.is_nan() || value < 0.0 {
        return U256::zero();
    }
    // `U256` has no direct `From<f64>`; round-trip through a decimal string
    // for values that fit, which is sufficient given f64's ~15-digit
    // precision far exceeds anything meaningful for a sqrtPriceX96 ratio.
    let rounded = value.round();
    U256::from_dec_str(&format!("{rounded:.0}")).unwrap_or(U256::zero())
}
