use crate::formatter::TemplateFormatter;
use crate::layer::template_layer;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Stream the formatted lines are written to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Stderr,
}

impl OutputTarget {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            OutputTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
            OutputTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Logging layer configuration.
///
/// **Fields**
/// - `formatter`: [`TemplateFormatter`] rendering every event.
/// - `target`: [`OutputTarget`] receiving the rendered lines.
#[derive(Clone, Debug, Default)]
pub struct LayerConfig {
    pub formatter: TemplateFormatter,
    pub target: OutputTarget,
}

/// Error returned when the global subscriber cannot be installed.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to set global subscriber: {0}")]
    GlobalDefault(#[from] SetGlobalDefaultError),
}

/// Install a [`Registry`] with a template formatting layer as the global
/// default subscriber.
///
/// **Returns**
/// - `Ok(())` once the subscriber is installed.
/// - `Err(InitError::GlobalDefault)` if a global subscriber was already set.
pub fn try_init_tracing_with_config(config: LayerConfig) -> Result<(), InitError> {
    let template = config.formatter.template().to_string();
    let timestamp_layout = config.formatter.timestamp_layout().to_string();

    let layer = template_layer(config.formatter).with_writer(config.target.make_writer());
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!(template = %template.escape_debug(), %timestamp_layout, "template formatter installed");
    Ok(())
}

/// Initialize global `tracing` subscriber using the provided [`LayerConfig`].
///
/// Panics if a global subscriber is already installed; see
/// [`try_init_tracing_with_config`] for the fallible variant.
pub fn init_tracing_with_config(config: LayerConfig) {
    try_init_tracing_with_config(config).expect("set global subscriber");
}

/// Initialize tracing with the given formatter, writing to stdout.
///
/// Equivalent to calling [`init_tracing_with_config`] with the default
/// [`OutputTarget`].
pub fn init_tracing(formatter: TemplateFormatter) {
    init_tracing_with_config(LayerConfig {
        formatter,
        ..LayerConfig::default()
    });
}
