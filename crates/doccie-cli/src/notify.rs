// SPDX-License-Identifier: Apache-2.0

//! Terminal rendering of controller notices.

use console::style;
use doccie_core::{Notice, NoticeLevel, Notifier};

use crate::cli::OutputContext;

/// Writes notices to stderr so structured stdout stays parseable.
///
/// In quiet mode only warnings and errors are shown.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(ctx: &OutputContext) -> Self {
        Self { quiet: ctx.quiet }
    }

    fn is_shown(self, level: NoticeLevel) -> bool {
        !self.quiet || matches!(level, NoticeLevel::Warning | NoticeLevel::Error)
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        if !self.is_shown(notice.level) {
            return;
        }
        let marker = match notice.level {
            NoticeLevel::Info => style("*").cyan().bold(),
            NoticeLevel::Success => style("*").green().bold(),
            NoticeLevel::Warning => style("!").yellow().bold(),
            NoticeLevel::Error => style("!").red().bold(),
        };
        eprintln!("{marker} {}", notice.message);
    }
}
