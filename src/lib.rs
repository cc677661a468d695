//! Template-driven event formatting for `tracing-subscriber`.
//!
//! A [`TemplateFormatter`] turns each event into one line by substituting
//! `%name%` placeholders, e.g. the default
//! `[%level%] %time% %func% Line:%line% - %msg%\n`.
//!
//! [`TemplateFormatter`]: formatter::TemplateFormatter

pub mod record;
pub mod formatter;
pub mod layer;

pub mod env;
pub mod init;
