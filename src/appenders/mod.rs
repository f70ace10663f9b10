//! Built-in appender implementations

pub mod console;
pub mod file;
pub mod json;

pub use console::{ConsoleAppender, ConsoleStream};
pub use file::FileAppender;
pub use json::JsonAppender;

// Re-export the trait for convenience
pub use crate::core::{Appender, AppenderRef};

use crate::core::log_message::LogMessage;
use crate::core::registry::FactoryRegistry;
use std::sync::Arc;

/// Register the built-in sink factories. Runs once per
/// [`LogSystem`](crate::LogSystem) construction; plugins add their own
/// kinds through `register_factory`.
pub(crate) fn register_builtin(factories: &FactoryRegistry) {
    factories.register("console", |args| {
        Ok(Arc::new(ConsoleAppender::from_args(args)?) as AppenderRef)
    });
    factories.register("file", |args| {
        Ok(Arc::new(FileAppender::from_args(args)?) as AppenderRef)
    });
    factories.register("json", |args| {
        Ok(Arc::new(JsonAppender::from_args(args)?) as AppenderRef)
    });
}

/// Render a message template by substituting `${name}` placeholders with
/// the bound argument values. Placeholders without a binding are left
/// as-is; bindings without a placeholder are ignored. First binding wins
/// for duplicate names.
pub fn render_template(message: &LogMessage) -> String {
    let mut rendered = message.format.clone();
    for (name, value) in &message.args {
        let placeholder = format!("${{{}}}", name);
        if rendered.contains(&placeholder) {
            rendered = rendered.replace(&placeholder, &value.to_string());
        }
    }
    rendered
}
