// src/cli.rs
//! Command-line surface and command execution.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};

use crate::config::{resolve_path, HoundConfig, Overrides};
use crate::ingest::providers::{history_activations, http_client, stats_activations};
use crate::ingest::types::{Event, Stat};
use crate::ingest::{aggregate, collect_stats, Collected};
use crate::render::Renderer;
use crate::setup;
use crate::timeline::layout;

/// Display a developer's activity stream from GitHub, GitLab and Jira.
#[derive(Debug, Parser)]
#[command(name = "hound")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Houndfile path (defaults to $HOUND_CONFIG_PATH, then ./.houndfile).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable terminal colors (also honored: NO_COLOR).
    #[arg(long, global = true)]
    pub plain: bool,

    /// The github user.
    #[arg(long = "github-user", visible_alias = "ghu", global = true)]
    pub github_user: Option<String>,

    /// The jira user name.
    #[arg(long = "jira-user", visible_alias = "ju", global = true)]
    pub jira_user: Option<String>,

    /// The jira user name to filter the activity feed.
    #[arg(long = "jira-feed-user", visible_alias = "jfu", global = true)]
    pub jira_feed_user: Option<String>,

    /// Command to run; `history` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the merged activity timeline, grouped by day.
    History,
    /// List repositories, projects and assigned issues per source.
    Stats,
    /// Create the houndfile interactively.
    Setup,
}

impl Cli {
    pub fn effective_command(&self) -> Command {
        self.command.unwrap_or(Command::History)
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            github_user: self.github_user.clone(),
            jira_user: self.jira_user.clone(),
            jira_feed_user: self.jira_feed_user.clone(),
        }
    }

    pub fn color(&self) -> bool {
        !self.plain && std::env::var_os("NO_COLOR").is_none()
    }
}

/// Load the houndfile and apply command-line overrides. Missing or invalid
/// configuration stops the run before anything is fetched.
pub fn load_config(cli: &Cli) -> Result<HoundConfig> {
    let mut cfg = HoundConfig::load(cli.config.as_deref())?;
    cfg.apply_overrides(&cli.overrides());
    cfg.validate()?;
    Ok(cfg)
}

pub async fn execute(cli: &Cli) -> Result<()> {
    let renderer = Renderer::new(Local, cli.color());
    writeln!(io::stdout().lock(), "{}", renderer.banner())?;

    match cli.effective_command() {
        Command::Setup => {
            let path = resolve_path(cli.config.as_deref());
            let mut out = io::stdout().lock();
            let cfg = setup::prompt_config(io::stdin().lock(), &mut out)?;
            setup::write_config(&cfg, &path)?;
            writeln!(out, "Config file successfully created at {}", path.display())?;
        }
        Command::History => {
            let cfg = load_config(cli)?;
            let client = http_client()?;
            let activations = history_activations(&cfg, &client);
            let collected = aggregate(&activations, cfg.engine.dispatch_cfg()).await;
            write_history(&mut io::stdout().lock(), &renderer, &collected, Utc::now(), Local)?;
        }
        Command::Stats => {
            let cfg = load_config(cli)?;
            let client = http_client()?;
            let activations = stats_activations(&cfg, &client);
            let collected = collect_stats(&activations, cfg.engine.dispatch_cfg()).await;
            write_stats(&mut io::stdout().lock(), &renderer, &collected)?;
        }
    }
    Ok(())
}

fn write_incomplete<W: Write, T>(out: &mut W, collected: &Collected<T>) -> Result<()> {
    if !collected.is_complete() {
        writeln!(
            out,
            "aggregation timed out, {}/{} sources reported",
            collected.reported, collected.expected
        )?;
    }
    Ok(())
}

/// Day headers and one line per event, in timeline order.
pub fn write_history<W, Tz, R>(
    out: &mut W,
    renderer: &Renderer<R>,
    collected: &Collected<Event>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    R: TimeZone,
    R::Offset: std::fmt::Display,
{
    write_incomplete(out, collected)?;
    for line in renderer.timeline(&layout(&collected.items, now, tz)) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

pub fn write_stats<W, R>(out: &mut W, renderer: &Renderer<R>, collected: &Collected<Stat>) -> Result<()>
where
    W: Write,
    R: TimeZone,
    R::Offset: std::fmt::Display,
{
    write_incomplete(out, collected)?;
    for line in renderer.stats(&collected.items) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
