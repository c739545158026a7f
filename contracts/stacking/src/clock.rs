//! Pure burn-height ↔ reward-cycle arithmetic.
//!
//! Out-of-domain inputs (a height before the configured origin, or cycle
//! arithmetic that overflows `u64`) abort the invocation outright instead of
//! returning an inspectable error: no caller can do anything sensible with a
//! cycle computed from a height the chain never had.

/// Reward cycle containing `burn_height`, zero-indexed from the configured
/// origin. Traps when `burn_height` precedes the origin.
pub fn burn_height_to_reward_cycle(
    burn_height: u64,
    first_burn_height: u64,
    reward_cycle_length: u64,
) -> u64 {
    if burn_height < first_burn_height {
        panic!("burn height precedes the first burnchain block height");
    }
    (burn_height - first_burn_height) / reward_cycle_length
}

/// First burn height of `reward_cycle`. Traps when the height is not
/// representable.
pub fn reward_cycle_to_burn_height(
    reward_cycle: u64,
    first_burn_height: u64,
    reward_cycle_length: u64,
) -> u64 {
    match reward_cycle
        .checked_mul(reward_cycle_length)
        .and_then(|offset| offset.checked_add(first_burn_height))
    {
        Some(height) => height,
        None => panic!("reward cycle burn height overflows u64"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
