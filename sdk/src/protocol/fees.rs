use crate::core::{FeeSide, SdkError, SdkResult, SwapEstimate, BPS_DENOMINATOR};
use crate::protocol::math::apply_bps;

/// Constant-product estimate with the fee charged on the input amount.
///
/// `fee_bps` and `slippage_bps` are basis points. Integer math throughout:
/// `out = reserve_out - floor(k / (reserve_in + amount_in - fee))`.
pub fn estimate_constant_product(
    reserve_in: u64,
    reserve_out: u64,
    amount_in: u64,
    fee_bps: u16,
    slippage_bps: u16,
) -> SdkResult<SwapEstimate> {
    estimate_swap(reserve_in, reserve_out, amount_in, fee_bps, slippage_bps, FeeSide::Input)
}

/// Constant-product estimate with the fee deducted on the side the program uses
/// for the given direction. Buys pay on input, sells pay on gross output.
pub fn estimate_swap(
    reserve_in: u64,
    reserve_out: u64,
    amount_in: u64,
    fee_bps: u16,
    slippage_bps: u16,
    fee_side: FeeSide,
) -> SdkResult<SwapEstimate> {
    validate_bps("fee", fee_bps)?;
    validate_bps("slippage", slippage_bps)?;

    if amount_in == 0 {
        return Ok(SwapEstimate::default());
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(SdkError::Validation("pool has no liquidity".to_string()));
    }

    let (fee, output) = match fee_side {
        FeeSide::Input => {
            let fee = apply_bps(amount_in, fee_bps as u64);
            (fee, constant_product_output(reserve_in, reserve_out, amount_in - fee))
        }
        FeeSide::Output => {
            let gross = constant_product_output(reserve_in, reserve_out, amount_in);
            let fee = apply_bps(gross, fee_bps as u64);
            (fee, gross - fee)
        }
    };

    Ok(SwapEstimate {
        amount_in,
        fee,
        estimated_output: output,
        minimum_received: apply_bps(output, BPS_DENOMINATOR - slippage_bps as u64),
    })
}

/// Estimate for a swap whose input and output are the same asset: no pool, no fee
pub fn identity_estimate(amount_in: u64) -> SwapEstimate {
    SwapEstimate {
        amount_in,
        fee: 0,
        estimated_output: amount_in,
        minimum_received: amount_in,
    }
}

fn constant_product_output(reserve_in: u64, reserve_out: u64, net_in: u64) -> u64 {
    let k = reserve_in as u128 * reserve_out as u128;
    let new_reserve_in = reserve_in as u128 + net_in as u128;
    let new_reserve_out = k / new_reserve_in;
    (reserve_out as u128 - new_reserve_out) as u64
}

fn validate_bps(name: &str, bps: u16) -> SdkResult<()> {
    if bps as u64 > BPS_DENOMINATOR {
        return Err(SdkError::Validation(format!(
            "{} of {} bps exceeds 100%",
            name, bps
        )));
    }
    Ok(())
}
