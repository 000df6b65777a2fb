use tracing_subscriber::{prelude::*, EnvFilter};

/// Routes codec diagnostics to the test harness. Set `RUST_LOG=bitlayout=trace`
/// to see per-node cursor positions.
pub fn init_tracing() {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap();

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_test_writer();

    // Another test in this binary may have installed it already.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .try_init();
}
