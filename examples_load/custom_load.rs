use std::time::Instant;
use tracing::error;

use tracing_template_fmt::formatter::{TemplateFormatter, Timezone};
use tracing_template_fmt::init::{init_tracing_with_config, LayerConfig, OutputTarget};

fn main() {
    let formatter = TemplateFormatter::builder()
        .template("%time% %level% [%service%] %msg% iteration=%iteration%\n")
        .timestamp_layout("%H:%M:%S%.6f")
        .timezone(Timezone::Local)
        .build()
        .expect("valid formatter config");

    let layer_config = LayerConfig {
        formatter,
        target: OutputTarget::Stderr,
    };

    init_tracing_with_config(layer_config);

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, service = "auth", "custom load test error");
    }

    let elapsed = start.elapsed();
    println!("custom config: wrote {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
