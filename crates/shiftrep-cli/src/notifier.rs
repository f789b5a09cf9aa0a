//! Terminal notifier.

use console::style;

use shiftrep_core::error::NotifyError;
use shiftrep_core::service::Notifier;

/// Prints outbound chat messages to stdout.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, target: &str, text: &str) -> Result<(), NotifyError> {
        println!("{} {}", style(format!("[{target}]")).cyan(), text);
        Ok(())
    }
}
