// SPDX-License-Identifier: Apache-2.0

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use console::style;
use doccie_core::{NodeKind, RepoStatus, Repository, TreeNode, Visibility};
use std::io::{self, Write};

use crate::cli::OutputContext;
use crate::commands::types::{RepoAction, RepoActionResult, RepoDetailResult, RepoListResult};

use super::Renderable;

fn status_cell(status: RepoStatus) -> Cell {
    match status {
        RepoStatus::Active => Cell::new("active").fg(Color::Green),
        RepoStatus::Inactive => Cell::new("inactive").fg(Color::DarkGrey),
    }
}

fn repo_table(repos: &[Repository]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Repository", "Status", "Backend path"]);
    for repo in repos {
        table.add_row(vec![
            Cell::new(repo.id),
            Cell::new(&repo.full_name),
            status_cell(repo.status()),
            Cell::new(repo.backend_path.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

impl Renderable for RepoListResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        if self.total == 0 {
            writeln!(w, "{} You have no repositories yet.", style("!").yellow().bold())?;
            return Ok(());
        }
        if self.repos.is_empty() {
            writeln!(
                w,
                "{} No repositories match your filters ({} total).",
                style("!").yellow().bold(),
                self.total
            )?;
            return Ok(());
        }

        writeln!(w, "{}", repo_table(&self.repos))?;
        writeln!(
            w,
            "{}",
            style(format!("{} of {} repositories", self.repos.len(), self.total)).dim()
        )?;
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(w, "## Repositories\n")?;
        if self.repos.is_empty() {
            writeln!(w, "_No repositories found._")?;
            return Ok(());
        }
        writeln!(w, "| ID | Repository | Status | Backend path |")?;
        writeln!(w, "|---:|---|---|---|")?;
        for repo in &self.repos {
            writeln!(
                w,
                "| {} | {} | {} | {} |",
                repo.id,
                repo.full_name,
                repo.status(),
                repo.backend_path.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

fn write_tree(w: &mut dyn Write, nodes: &[TreeNode], prefix: &str) -> io::Result<()> {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "└── " } else { "├── " };
        match node.kind {
            NodeKind::Directory => {
                writeln!(w, "{prefix}{branch}{}/", style(&node.name).blue().bold())?;
                let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
                write_tree(w, &node.children, &child_prefix)?;
            }
            NodeKind::File => writeln!(w, "{prefix}{branch}{}", node.name)?,
        }
    }
    Ok(())
}

impl Renderable for RepoDetailResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let details = &self.details;
        writeln!(w)?;
        writeln!(w, "{}", style(&details.full_name).bold())?;
        writeln!(w, "  ID: {}", details.id)?;
        if let Some(visibility) = details.visibility {
            let label = match visibility {
                Visibility::Public => "public",
                Visibility::Private => "private",
            };
            writeln!(w, "  Visibility: {label}")?;
        }
        if let Some(ref branch) = details.default_branch {
            writeln!(w, "  Default branch: {}", style(branch).cyan())?;
        }
        let status = match self.repository.status() {
            RepoStatus::Active => style("monitored").green().to_string(),
            RepoStatus::Inactive => style("not monitored").dim().to_string(),
        };
        writeln!(w, "  Status: {status}")?;
        if let Some(ref path) = self.repository.backend_path {
            writeln!(w, "  Backend path: {path}")?;
        }
        writeln!(w)?;

        if details.directory_structure.is_empty() {
            writeln!(w, "{}", style("(empty repository)").dim())?;
        } else {
            writeln!(w, "{}", style(format!("{} files", details.file_count())).dim())?;
            write_tree(w, &details.directory_structure, "")?;
        }
        writeln!(w)?;
        Ok(())
    }
}

impl Renderable for RepoActionResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        let name = style(&self.repository.full_name).cyan();
        match self.action {
            RepoAction::Activated => writeln!(
                w,
                "{} Monitoring {name} (backend path: {}).",
                style("*").green().bold(),
                self.repository.backend_path.as_deref().unwrap_or("-")
            ),
            RepoAction::Deactivated => {
                writeln!(w, "{} Stopped monitoring {name}.", style("*").green().bold())
            }
            RepoAction::Cancelled => {
                writeln!(w, "{} Left {name} unchanged.", style("!").yellow().bold())
            }
        }
    }
}
