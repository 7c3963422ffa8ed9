// SPDX-License-Identifier: Apache-2.0

use console::style;
use std::io::{self, Write};

use crate::cli::OutputContext;
use crate::commands::types::{DocsResult, ExportResult};

use super::Renderable;

impl Renderable for DocsResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        if !self.available {
            writeln!(
                w,
                "{} No documentation has been generated for {} yet.",
                style("*").cyan().bold(),
                style(&self.repository).cyan()
            )?;
            writeln!(
                w,
                "Documentation appears after the next push to a monitored repository."
            )?;
            return Ok(());
        }

        writeln!(w)?;
        let title = self.title.as_deref().unwrap_or(&self.repository);
        match self.version {
            Some(ref version) => writeln!(w, "{} {}", style(title).bold(), style(version).dim())?,
            None => writeln!(w, "{}", style(title).bold())?,
        }
        writeln!(w, "  Repository: {}", style(&self.repository).cyan())?;
        writeln!(w, "  Operations: {}", self.operations.len())?;
        writeln!(
            w,
            "  Dependency diagram: {}",
            if self.has_diagram { "yes" } else { "no" }
        )?;
        writeln!(w)?;

        for op in &self.operations {
            let method = format!("{:<7}", op.method);
            write!(w, "  {} {}", style(method).yellow(), op.path)?;
            match op.summary {
                Some(ref summary) if !summary.is_empty() => {
                    writeln!(w, "  {}", style(summary).dim())?;
                }
                _ => writeln!(w)?,
            }
        }
        if !self.operations.is_empty() {
            writeln!(w)?;
        }
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let title = self.title.as_deref().unwrap_or(&self.repository);
        writeln!(w, "## {title}\n")?;
        if !self.available {
            writeln!(w, "_No documentation generated yet._")?;
            return Ok(());
        }
        if let Some(ref version) = self.version {
            writeln!(w, "**Version:** {version}\n")?;
        }
        writeln!(w, "| Method | Path | Summary |")?;
        writeln!(w, "|---|---|---|")?;
        for op in &self.operations {
            writeln!(
                w,
                "| `{}` | `{}` | {} |",
                op.method,
                op.path,
                op.summary.as_deref().unwrap_or("")
            )?;
        }
        Ok(())
    }
}

impl Renderable for ExportResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(
            w,
            "{} Wrote {} ({} bytes, {}) for {}.",
            style("*").green().bold(),
            style(self.path.display()).cyan(),
            self.bytes,
            self.format,
            self.repository
        )
    }
}
