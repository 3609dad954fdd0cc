//! Prometheus metrics for the command-line tool.
//!
//! The registry holds the CLI's own counters plus every core metric
//! (conversions, probing, availability). `--metrics` prints it in text
//! format once the command has finished.

use once_cell::sync::Lazy;
use prometheus::{self, Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Commands run, by command and result.
pub static COMMANDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("leonardo_cli_commands_total", "Total CLI commands run"),
        &["command", "result"], // result: "ok", "error"
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(COMMANDS_TOTAL.clone()))
        .unwrap();

    // Core metrics (conversions, probing, availability)
    for metric in leonardo_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Records the result of a command.
pub fn record_command(command: &str, ok: bool) {
    COMMANDS_TOTAL
        .with_label_values(&[command, if ok { "ok" } else { "error" }])
        .inc();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
