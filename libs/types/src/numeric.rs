//! Integer amounts
//!
//! Ledger amounts are unsigned integers in the asset's smallest unit. All
//! arithmetic on them is checked by the callers; nothing here wraps.

/// Quantity of an asset in its smallest unit.
pub type Amount = u128;

/// Basis-point denominator (1 bp = 0.01%).
pub const BPS_DENOMINATOR: Amount = 10_000;

/// Apply a basis-point rate to an amount, rounding down.
///
/// Returns `None` on overflow.
pub fn apply_bps(amount: Amount, bps: u16) -> Option<Amount> {
    amount
        .checked_mul(Amount::from(bps))
        .map(|v| v / BPS_DENOMINATOR)
}
