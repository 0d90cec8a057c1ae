//! Presentation-layer implementations of the `ProgressSink` port.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use deskpilot_common::ProgressEvent;

use crate::application::ports::ProgressSink;
use crate::output::OutputContext;

/// Line-oriented reporter for non-TTY output: one `→ NN% message` line per
/// event. Suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }
}

impl ProgressSink for TerminalReporter<'_> {
    fn emit(&self, event: &ProgressEvent) {
        if !self.ctx.quiet {
            println!("  {} {:>3}% {}", "→".cyan(), event.percent, event.message);
        }
    }
}

/// TTY reporter driving an indicatif bar from the remote percent milestones.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    #[must_use]
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    #[must_use]
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressSink for BarReporter {
    fn emit(&self, event: &ProgressEvent) {
        self.bar.set_position(u64::from(event.percent));
        self.bar.set_message(event.message.clone());
    }
}
