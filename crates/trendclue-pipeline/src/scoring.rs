//! Small numeric helpers shared by the scoring stages.

/// Round half away from zero to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Clamp a channel signal to `[0, 100]`. NaN maps to 0.
#[must_use]
pub fn clamp_signal(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Percentage growth of `recent` over `old`.
///
/// With no older activity, any recent activity counts as 50% growth.
#[must_use]
pub fn growth_pct(old: usize, recent: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let (old, recent) = (old as f64, recent as f64);
    if old > 0.0 {
        (recent - old) / old.max(1.0) * 100.0
    } else if recent > 0.0 {
        50.0
    } else {
        0.0
    }
}
