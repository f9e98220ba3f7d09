use rand::Rng;
use std::time::Duration;

/// Delay before retry number `attempt` (0-based): `base * 2^attempt` with
/// ±30% jitter, exponent capped at 6.
pub fn calculate_backoff_delay(attempt: u32, base: Duration) -> Duration {
    let capped_attempt = attempt.min(6);
    let base_ms = base.as_millis().min(u64::MAX as u128) as u64;
    let delay_ms = base_ms.saturating_mul(2_u64.saturating_pow(capped_attempt));

    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    Duration::from_millis((delay_ms as f64 * jitter_factor).round() as u64)
}
