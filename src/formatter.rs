//! Template rendering of [`LogEvent`]s.
//!
//! See [`TemplateFormatter`] for the placeholder rules.

use crate::record::LogEvent;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use std::borrow::Cow;
use std::fmt::Write;
use std::str::FromStr;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "[%level%] %time% %func% Line:%line% - %msg%\n";

/// strftime layout used for `%time%` when none is configured.
pub const DEFAULT_TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Error raised while building a [`TemplateFormatter`] from configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid timestamp layout: {0:?}")]
    InvalidTimestampLayout(String),

    #[error("unknown timezone {0:?}, expected \"utc\" or \"local\"")]
    InvalidTimezone(String),
}

/// Clock in which `%time%` is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timezone {
    #[default]
    Utc,
    Local,
}

impl FromStr for Timezone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utc" => Ok(Timezone::Utc),
            "local" => Ok(Timezone::Local),
            _ => Err(ConfigError::InvalidTimezone(s.to_string())),
        }
    }
}

/// Renders events by substituting `%name%` placeholders in a template.
///
/// Rendering starts from the template and performs, in order, one
/// first-occurrence replacement for each reserved placeholder:
///
/// | placeholder | value                                          |
/// |-------------|------------------------------------------------|
/// | `%time%`    | timestamp, formatted with the timestamp layout |
/// | `%msg%`     | message, verbatim                              |
/// | `%level%`   | level name in upper case                       |
/// | `%func%`    | caller function, empty without a caller        |
/// | `%line%`    | caller line, `0` without a caller              |
///
/// Then every event field whose value is a string, an integer or a boolean
/// replaces the first occurrence of `%<field name>%`. Other field values are
/// skipped. Reserved placeholders are consumed before fields are looked at,
/// so a field named `level` can never shadow `%level%`.
///
/// Unknown placeholders and stray `%` characters are left as they are.
/// Rendering never fails.
///
/// # Examples
///
/// ```
/// use tracing_template_fmt::formatter::TemplateFormatter;
/// use tracing_template_fmt::record::{Level, LogEvent};
///
/// let formatter = TemplateFormatter::new().with_template("%level% %custom%");
/// let event = LogEvent::new(Level::Warn, "ignored").with_field("custom", "x");
///
/// assert_eq!(formatter.render(&event), "WARN x");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFormatter {
    template: Option<String>,
    timestamp_layout: Option<String>,
    timezone: Timezone,
}

impl TemplateFormatter {
    /// Formatter using the default template, layout and timezone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a [`TemplateFormatterBuilder`] that validates on `build`.
    pub fn builder() -> TemplateFormatterBuilder {
        TemplateFormatterBuilder::default()
    }

    /// Replace the template. An empty string restores the default.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = non_empty(template.into());
        self
    }

    /// Replace the timestamp layout. An empty string restores the default.
    ///
    /// The layout is not validated here; an invalid layout renders with
    /// [`DEFAULT_TIMESTAMP_LAYOUT`] instead. Use [`TemplateFormatter::builder`]
    /// to reject it up front.
    pub fn with_timestamp_layout(mut self, layout: impl Into<String>) -> Self {
        self.timestamp_layout = non_empty(layout.into());
        self
    }

    /// Render `%time%` in the given [`Timezone`].
    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    /// Template in effect, the configured one or [`DEFAULT_TEMPLATE`].
    pub fn template(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }

    /// Layout in effect, the configured one or [`DEFAULT_TIMESTAMP_LAYOUT`].
    pub fn timestamp_layout(&self) -> &str {
        self.timestamp_layout
            .as_deref()
            .unwrap_or(DEFAULT_TIMESTAMP_LAYOUT)
    }

    /// Timezone `%time%` is rendered in.
    pub fn timezone(&self) -> Timezone {
        self.timezone
    }

    /// Render an event into the bytes of one log line.
    pub fn format(&self, event: &LogEvent) -> Vec<u8> {
        self.render(event).into_bytes()
    }

    /// Render an event into a string.
    pub fn render(&self, event: &LogEvent) -> String {
        let mut output = self.template().to_string();

        let (function, line) = match &event.caller {
            Some(caller) => (caller.function.as_str(), caller.line),
            None => ("", 0),
        };

        replace_first(&mut output, "%time%", &self.format_timestamp(&event.timestamp));
        replace_first(&mut output, "%msg%", &event.message);
        replace_first(&mut output, "%level%", event.level.as_upper_str());
        replace_first(&mut output, "%func%", function);
        replace_first(&mut output, "%line%", &line.to_string());

        for (name, value) in &event.fields {
            if let Some(text) = field_text(value) {
                replace_first(&mut output, &format!("%{}%", name), &text);
            }
        }

        output
    }

    fn format_timestamp(&self, timestamp: &DateTime<Utc>) -> String {
        write_timestamp(timestamp, self.timestamp_layout(), self.timezone)
            .or_else(|| write_timestamp(timestamp, DEFAULT_TIMESTAMP_LAYOUT, self.timezone))
            .unwrap_or_default()
    }
}

/// Validating builder for [`TemplateFormatter`].
#[derive(Debug, Clone, Default)]
pub struct TemplateFormatterBuilder {
    template: Option<String>,
    timestamp_layout: Option<String>,
    timezone: Timezone,
}

impl TemplateFormatterBuilder {
    /// Set the template. An empty string keeps the default.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = non_empty(template.into());
        self
    }

    /// Set the timestamp layout, checked by [`TemplateFormatterBuilder::build`].
    pub fn timestamp_layout(mut self, layout: impl Into<String>) -> Self {
        self.timestamp_layout = non_empty(layout.into());
        self
    }

    /// Set the timezone for `%time%`.
    pub fn timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    /// Build the formatter, rejecting timestamp layouts chrono cannot render.
    pub fn build(self) -> Result<TemplateFormatter, ConfigError> {
        if let Some(layout) = &self.timestamp_layout {
            validate_timestamp_layout(layout)?;
        }

        Ok(TemplateFormatter {
            template: self.template,
            timestamp_layout: self.timestamp_layout,
            timezone: self.timezone,
        })
    }
}

/// Check that every strftime specifier in `layout` is understood.
pub fn validate_timestamp_layout(layout: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidTimestampLayout(layout.to_string()));
    }
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn replace_first(output: &mut String, token: &str, value: &str) {
    if let Some(start) = output.find(token) {
        output.replace_range(start..start + token.len(), value);
    }
}

/// Text form of a field value, or `None` for types that are never substituted.
fn field_text(value: &serde_json::Value) -> Option<Cow<'_, str>> {
    match value {
        serde_json::Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Some(Cow::Owned(n.to_string())),
        serde_json::Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        _ => None,
    }
}

// chrono reports unknown specifiers as a fmt::Error while displaying.
fn write_timestamp(timestamp: &DateTime<Utc>, layout: &str, timezone: Timezone) -> Option<String> {
    let mut out = String::new();
    let written = match timezone {
        Timezone::Utc => write!(out, "{}", timestamp.format(layout)),
        Timezone::Local => write!(out, "{}", timestamp.with_timezone(&Local).format(layout)),
    };
    written.ok().map(|_| out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap() + chrono::Duration::milliseconds(123)
    }

    fn event(level: Level, message: &str) -> LogEvent {
        LogEvent::new(level, message).with_timestamp(fixed_time())
    }

    #[test]
    fn default_template_renders_full_line() {
        let formatter = TemplateFormatter::new();
        let event = event(Level::Info, "hello").with_caller("main.Run", 42);

        assert_eq!(
            formatter.format(&event),
            b"[INFO] 2024-01-15 10:30:05.123 main.Run Line:42 - hello\n".to_vec()
        );
    }

    #[test]
    fn custom_field_is_substituted() {
        let formatter = TemplateFormatter::new().with_template("%level% %custom%");
        let event = event(Level::Warn, "msg").with_field("custom", "x");

        assert_eq!(formatter.render(&event), "WARN x");
    }

    #[test]
    fn unknown_placeholder_is_left_verbatim() {
        let formatter = TemplateFormatter::new().with_template("%msg% %missing% 100%");
        let event = event(Level::Info, "hi").with_field("other", "y");

        assert_eq!(formatter.render(&event), "hi %missing% 100%");
    }

    #[test]
    fn reserved_placeholders_win_over_fields() {
        let formatter = TemplateFormatter::new().with_template("%level%");
        let event = event(Level::Error, "m").with_field("level", "ZZZ");

        assert_eq!(formatter.render(&event), "ERROR");
    }

    #[test]
    fn reserved_field_name_fills_a_second_occurrence() {
        let formatter = TemplateFormatter::new().with_template("%level% %level%");
        let event = event(Level::Error, "m").with_field("level", "ZZZ");

        assert_eq!(formatter.render(&event), "ERROR ZZZ");
    }

    #[test]
    fn unsupported_field_values_are_skipped() {
        let formatter = TemplateFormatter::new().with_template("%custom%|%nothing%|%list%|%obj%");
        let event = event(Level::Info, "m")
            .with_field("custom", 1.5)
            .with_field("nothing", serde_json::Value::Null)
            .with_field("list", serde_json::json!([1, 2]))
            .with_field("obj", serde_json::json!({"a": 1}));

        assert_eq!(formatter.render(&event), "%custom%|%nothing%|%list%|%obj%");
    }

    #[test]
    fn integers_and_booleans_use_text_form() {
        let formatter = TemplateFormatter::new().with_template("%neg% %big% %ok% %no%");
        let event = event(Level::Info, "m")
            .with_field("neg", -7)
            .with_field("big", u64::MAX)
            .with_field("ok", true)
            .with_field("no", false);

        assert_eq!(formatter.render(&event), "-7 18446744073709551615 true false");
    }

    #[test]
    fn only_first_occurrence_is_replaced() {
        let formatter = TemplateFormatter::new().with_template("%msg% %msg% %id% %id%");
        let event = event(Level::Info, "a").with_field("id", 3);

        assert_eq!(formatter.render(&event), "a %msg% 3 %id%");
    }

    #[test]
    fn missing_caller_renders_empty_function_and_zero_line() {
        let formatter = TemplateFormatter::new().with_template("[%func%] Line:%line%");

        assert_eq!(formatter.render(&event(Level::Debug, "m")), "[] Line:0");
    }

    #[test]
    fn substituted_text_is_searched_by_later_placeholders() {
        let formatter = TemplateFormatter::new().with_template("%msg% %level%");
        let event = event(Level::Trace, "%level% inside");

        assert_eq!(formatter.render(&event), "TRACE inside %level%");
    }

    #[test]
    fn time_is_substituted_before_message() {
        let formatter = TemplateFormatter::new()
            .with_template("%time%")
            .with_timestamp_layout("%%msg%% %%level%%");

        assert_eq!(formatter.render(&event(Level::Warn, "body")), "body WARN");
    }

    #[test]
    fn caller_is_substituted_after_level() {
        let formatter = TemplateFormatter::new().with_template("%func%|%line%");
        let event = event(Level::Info, "m").with_caller("%line%", 9);

        assert_eq!(formatter.render(&event), "9|%line%");
    }

    #[test]
    fn custom_timestamp_layout() {
        let formatter = TemplateFormatter::new()
            .with_template("%time%")
            .with_timestamp_layout("%d/%m/%Y %H:%M");

        assert_eq!(formatter.render(&event(Level::Info, "m")), "15/01/2024 10:30");
    }

    #[test]
    fn local_timezone_matches_chrono_local() {
        let formatter = TemplateFormatter::new()
            .with_template("%time%")
            .with_timezone(Timezone::Local);
        let expected = fixed_time()
            .with_timezone(&Local)
            .format(DEFAULT_TIMESTAMP_LAYOUT)
            .to_string();

        assert_eq!(formatter.render(&event(Level::Info, "m")), expected);
    }

    #[test]
    fn invalid_layout_falls_back_to_default_at_render_time() {
        let formatter = TemplateFormatter::new()
            .with_template("%time%")
            .with_timestamp_layout("%Q");

        assert_eq!(formatter.render(&event(Level::Info, "m")), "2024-01-15 10:30:05.123");
    }

    #[test]
    fn empty_settings_restore_defaults() {
        let formatter = TemplateFormatter::new()
            .with_template("")
            .with_timestamp_layout("");

        assert_eq!(formatter.template(), DEFAULT_TEMPLATE);
        assert_eq!(formatter.timestamp_layout(), DEFAULT_TIMESTAMP_LAYOUT);
        assert_eq!(formatter, TemplateFormatter::new());
    }

    #[test]
    fn rendering_is_repeatable_and_leaves_config_untouched() {
        let formatter = TemplateFormatter::new().with_template("%level% %msg% %k%");
        let before = formatter.clone();
        let event = event(Level::Info, "same").with_field("k", "v");

        let first = formatter.format(&event);
        let second = formatter.format(&event);

        assert_eq!(first, second);
        assert_eq!(formatter, before);
    }

    #[test]
    fn builder_rejects_unknown_specifiers() {
        let err = TemplateFormatter::builder()
            .timestamp_layout("%Y-%Q")
            .build()
            .unwrap_err();

        assert_eq!(err, ConfigError::InvalidTimestampLayout("%Y-%Q".to_string()));
    }

    #[test]
    fn builder_accepts_valid_configuration() {
        let formatter = TemplateFormatter::builder()
            .template("%msg%")
            .timestamp_layout("%H:%M:%S")
            .timezone(Timezone::Local)
            .build()
            .unwrap();

        assert_eq!(formatter.template(), "%msg%");
        assert_eq!(formatter.timestamp_layout(), "%H:%M:%S");
        assert_eq!(formatter.timezone(), Timezone::Local);
    }

    #[test]
    fn timezone_parsing() {
        assert_eq!("UTC".parse::<Timezone>(), Ok(Timezone::Utc));
        assert_eq!("local".parse::<Timezone>(), Ok(Timezone::Local));
        assert_eq!(
            "mars".parse::<Timezone>(),
            Err(ConfigError::InvalidTimezone("mars".to_string()))
        );
    }
}
