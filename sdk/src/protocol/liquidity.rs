use crate::core::{SdkError, SdkResult, PROGRAM_MAX_FEE_BPS};
use crate::protocol::math::percent_to_bps;

/// Convert a new pool's fee percent to the bps stored by the directory and
/// passed to `initialize_pool`: `floor(percent * 100)`.
///
/// `max_percent` is the policy cap. The program's own limit of
/// [`PROGRAM_MAX_FEE_BPS`] applies whatever the policy says.
pub fn pool_fee_bps(fee_percent: &str, max_percent: u16) -> SdkResult<u16> {
    let bps = percent_to_bps(fee_percent)?;
    let cap = (max_percent as u32 * 100).min(PROGRAM_MAX_FEE_BPS as u32);
    if bps as u32 > cap {
        return Err(SdkError::Validation(format!(
            "pool fee {}% ({} bps) exceeds the {} bps limit",
            fee_percent.trim(),
            bps,
            cap
        )));
    }
    Ok(bps)
}

/// Underlying amount paid out for redeeming `liquidity` LP units
pub fn withdrawal_amount(liquidity: u64, reserve: u64, lp_supply: u64) -> SdkResult<u64> {
    if lp_supply == 0 {
        return Err(SdkError::Validation("pool has no outstanding liquidity".to_string()));
    }
    let amount = liquidity as u128 * reserve as u128 / lp_supply as u128;
    u64::try_from(amount)
        .map_err(|_| SdkError::Validation(format!("liquidity {} exceeds supply", liquidity)))
}

/// Redeeming at least the whole held balance counts as full redemption
pub fn is_full_redemption(requested: u64, lp_balance: u64) -> bool {
    requested >= lp_balance
}

/// Holder accounts to close after a removal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedemptionClosures {
    pub lp: bool,
    pub asset_a: bool,
    pub asset_b: bool,
}

/// Decide closures from the projected post-removal balances of each holder.
///
/// Only a full redemption closes anything. Each underlying holder is checked
/// on its own: the owner may still hold balances of the same asset.
pub fn plan_redemption_closures(
    requested: u64,
    lp_balance: u64,
    post_balance_a: u64,
    post_balance_b: u64,
) -> RedemptionClosures {
    if !is_full_redemption(requested, lp_balance) {
        return RedemptionClosures::default();
    }
    RedemptionClosures {
        lp: true,
        asset_a: post_balance_a == 0,
        asset_b: post_balance_b == 0,
    }
}
