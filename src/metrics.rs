//! Optional Prometheus metrics (§6, §10.5). Emission is best-effort: a
//! failure to record never fails a request.

use once_cell::sync::Lazy;
use prometheus::{register_counter, register_gauge, Counter, Gauge};
use tracing::warn;

static TOTAL_GENERATED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "recommendations_total_generated",
        "Total recommendation lists generated"
    )
    .expect("failed to register recommendations_total_generated")
});

static TOTAL_ITEMS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "recommendations_total_items",
        "Total recommendation items returned across all requests"
    )
    .expect("failed to register recommendations_total_items")
});

static LAST_AVG_SCORE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "recommendations_last_avg_score",
        "Average hybrid score of the most recently generated list"
    )
    .expect("failed to register recommendations_last_avg_score")
});

pub fn record_generated(items: &[f64]) {
    TOTAL_GENERATED.inc();
    TOTAL_ITEMS.inc_by(items.len() as f64);

    if items.is_empty() {
        return;
    }
    let avg = items.iter().sum::<f64>() / items.len() as f64;
    LAST_AVG_SCORE.set(avg);
}

/// Wraps metrics emission so a panic-free failure path never fails the
/// enclosing request (§6: "Failures in metrics emission must not fail the
/// request").
pub fn record_generated_best_effort(items: &[f64]) {
    let result = std::panic::catch_unwind(|| record_generated(items));
    if result.is_err() {
        warn!("metrics emission failed");
    }
}
