//! Environment variable names used by this crate for configuring the
//! formatter from a service's environment.
//!
//! These are purely helpers; [`TemplateFormatter`] itself never reads the
//! environment.

use crate::formatter::{ConfigError, TemplateFormatter};

/// Line template, e.g. `[%level%] %time% - %msg%`. Used verbatim.
pub const LOG_TEMPLATE_ENV: &str = "LOG_TEMPLATE";

/// chrono strftime layout for `%time%`.
pub const LOG_TIMESTAMP_FORMAT_ENV: &str = "LOG_TIMESTAMP_FORMAT";

/// `utc` or `local`.
pub const LOG_TIMEZONE_ENV: &str = "LOG_TIMEZONE";

impl TemplateFormatter {
    /// Build a formatter from [`LOG_TEMPLATE_ENV`], [`LOG_TIMESTAMP_FORMAT_ENV`]
    /// and [`LOG_TIMEZONE_ENV`]. Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`TemplateFormatter::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = TemplateFormatter::builder();

        if let Some(template) = lookup(LOG_TEMPLATE_ENV) {
            builder = builder.template(template);
        }
        if let Some(layout) = lookup(LOG_TIMESTAMP_FORMAT_ENV) {
            builder = builder.timestamp_layout(layout);
        }
        if let Some(timezone) = lookup(LOG_TIMEZONE_ENV).filter(|tz| !tz.is_empty()) {
            builder = builder.timezone(timezone.parse()?);
        }

        builder.build()
    }
}
