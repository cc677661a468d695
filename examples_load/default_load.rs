use std::time::Instant;

use tracing_template_fmt::formatter::TemplateFormatter;
use tracing_template_fmt::record::{Level, LogEvent};

fn main() {
    let formatter = TemplateFormatter::new();
    let event = LogEvent::new(Level::Error, "default load test error")
        .with_caller("default_load::main", 12)
        .with_field("iteration", 0);

    let n: u64 = 100_000;
    let start = Instant::now();

    let mut bytes = 0usize;
    for _ in 0..n {
        bytes += formatter.format(&event).len();
    }

    let elapsed = start.elapsed();
    println!("default config: formatted {} events ({} bytes) in {:?} (~{:.0} ev/s)",
        n,
        bytes,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
