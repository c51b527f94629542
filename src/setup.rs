// src/setup.rs
//! Interactive houndfile creation.

use anyhow::{Context, Result};
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::config::HoundConfig;

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, source: &str, field: &str) -> Result<String> {
    write!(out, "> {source} {field} ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading standard input")?;
    Ok(line.trim().to_string())
}

/// Ask for every field; a section is active when its primary field was given.
pub fn prompt_config<R: BufRead, W: Write>(mut input: R, out: &mut W) -> Result<HoundConfig> {
    writeln!(out, "hound interactive setup")?;
    let mut cfg = HoundConfig::default();

    cfg.github.user = ask(&mut input, out, "github", "user")?;
    cfg.github.active = !cfg.github.user.is_empty();

    cfg.gitlab.base_url = ask(&mut input, out, "gitlab", "base url")?;
    cfg.gitlab.active = !cfg.gitlab.base_url.is_empty();
    if cfg.gitlab.active {
        cfg.gitlab.api_path = ask(&mut input, out, "gitlab", "api path")?;
        cfg.gitlab.repo_feed_path = ask(&mut input, out, "gitlab", "repository feed path")?;
        cfg.gitlab.token = ask(&mut input, out, "gitlab", "token (or ENV)")?;
        cfg.gitlab.project_id = ask(&mut input, out, "gitlab", "project id")?;
    }

    cfg.jira.base_url = ask(&mut input, out, "jira", "base url")?;
    cfg.jira.active = !cfg.jira.base_url.is_empty();
    if cfg.jira.active {
        cfg.jira.api_path = ask(&mut input, out, "jira", "api path")?;
        cfg.jira.activity_path = ask(&mut input, out, "jira", "activity path")?;
        cfg.jira.user = ask(&mut input, out, "jira", "user")?;
        cfg.jira.activity_user = ask(&mut input, out, "jira", "activity user")?;
    }

    Ok(cfg)
}

pub fn write_config(cfg: &HoundConfig, path: &Path) -> Result<()> {
    let body = format!("# Hound configuration file\n{}", cfg.to_toml_string()?);
    fs::write(path, body).with_context(|| format!("writing config to {}", path.display()))?;
    tracing::info!(path = %path.display(), "config written");
    Ok(())
}
