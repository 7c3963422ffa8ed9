// SPDX-License-Identifier: Apache-2.0

use console::style;
use std::io::{self, Write};

use crate::cli::OutputContext;
use crate::commands::types::{AuthStatusResult, LoginResult, LogoutResult};

use super::Renderable;

impl Renderable for AuthStatusResult {
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()> {
        writeln!(w)?;
        if self.authenticated {
            writeln!(w, "{} Signed in with GitHub", style("*").green().bold())?;
            if let Some(ref user) = self.user {
                writeln!(w, "  User: {}", style(user).cyan())?;
            }
            if let Some(ref login) = self.login {
                writeln!(w, "  Login: {}", style(login).cyan())?;
            }
            if let Some(at) = self.signed_in_at {
                writeln!(w, "  Since: {}", at.format("%Y-%m-%d %H:%M UTC"))?;
            }
            if ctx.verbose {
                writeln!(w, "  Stored in: {}", style(&self.storage).dim())?;
            }
        } else {
            writeln!(
                w,
                "{} Not signed in. Run {} to sign in.",
                style("!").yellow().bold(),
                style("doccie auth login").cyan()
            )?;
        }
        writeln!(w)?;
        Ok(())
    }

    fn render_markdown(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(w, "## Authentication Status\n")?;
        if self.authenticated {
            writeln!(w, "**Status:** Signed in")?;
            if let Some(ref user) = self.user {
                writeln!(w, "**User:** {user}")?;
            }
            if let Some(ref login) = self.login {
                writeln!(w, "**Login:** {login}")?;
            }
        } else {
            writeln!(w, "**Status:** Not signed in")?;
        }
        Ok(())
    }
}

impl Renderable for LoginResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        if self.already_signed_in {
            writeln!(
                w,
                "{} Already signed in as {}.",
                style("!").yellow().bold(),
                style(&self.user).cyan()
            )?;
            writeln!(
                w,
                "Run {} first to switch accounts.",
                style("doccie auth logout").cyan()
            )?;
        } else {
            writeln!(
                w,
                "{} Signed in as {}.",
                style("*").green().bold(),
                style(&self.user).cyan()
            )?;
        }
        Ok(())
    }
}

impl Renderable for LogoutResult {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        if self.was_signed_in {
            writeln!(w, "{} Signed out. Session removed.", style("*").green().bold())
        } else {
            writeln!(w, "{} No session stored.", style("!").yellow().bold())
        }
    }
}
