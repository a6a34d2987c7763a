//! config command - Get, set, or list configuration values

use crate::cli::Context;
use crate::core::config::{self, Config, Scope, KEYS};
use crate::repository::RepositoryError;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Effective configuration: the repository's if one is open, else global only.
///
/// Only a missing repository falls back to global config; a repository that
/// fails to open for any other reason, a broken repo config included, is an
/// error.
fn load(ctx: &Context) -> Result<Config> {
    match ctx.open_repo() {
        Ok(repo) => Ok(repo.config().clone()),
        Err(err) if ctx.repo.is_none() && not_a_repo(&err) => {
            Config::load(None).context("Failed to load config")
        }
        Err(err) => Err(err),
    }
}

fn not_a_repo(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RepositoryError>()
        .is_some_and(RepositoryError::is_not_a_repo)
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = load(ctx)?;
    let value = config.get(key)?;

    if ctx.json {
        output::json(&serde_json::json!({ key: value }))?;
    } else {
        output::result(value);
    }
    Ok(())
}

/// Set a configuration value in the file its key belongs to.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let written = match config::scope_of(key)? {
        Scope::Global => {
            let config = Config::load(None).context("Failed to load config")?;
            let path = match config.global_config_loaded_from() {
                Some(path) => path.to_path_buf(),
                None => Config::global_config_path()?,
            };
            let mut global = config.global;
            global.set(key, value)?;
            Config::write_global(&path, &global).context("Failed to write config")?;
            warn_if_shadowed(ctx, key);
            path
        }
        Scope::Repo => {
            let repo = ctx.open_repo()?;
            let mut repo_config = repo.config().repo.clone().unwrap_or_default();
            repo_config.set(key, value)?;
            Config::write_repo(repo.raw().git_dir(), &repo_config)
                .context("Failed to write config")?
        }
    };

    output::print(
        format!("Set {} = {} in {}", key, value, written.display()),
        ctx.verbosity(),
    );
    Ok(())
}

/// Warn when the open repository's own config overrides a global key.
fn warn_if_shadowed(ctx: &Context, key: &str) {
    let Ok(repo) = ctx.open_repo() else {
        return;
    };
    let overridden = repo
        .config()
        .repo
        .as_ref()
        .and_then(|r| r.archive.as_ref())
        .is_some_and(|a| match key {
            "archive.format" => a.format.is_some(),
            "archive.storage_path" => a.storage_path.is_some(),
            _ => false,
        });
    if overridden {
        output::warn(
            format!("{} is overridden by this repository's config", key),
            ctx.verbosity(),
        );
    }
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let config = load(ctx)?;
    let values = KEYS
        .iter()
        .map(|(key, _)| -> Result<(&str, String)> { Ok((*key, config.get(key)?)) })
        .collect::<Result<Vec<_>>>()?;

    if ctx.json {
        let map: serde_json::Map<String, serde_json::Value> = values
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect();
        output::json(&map)?;
        return Ok(());
    }

    for (key, value) in values {
        output::result(format!("{} = {}", key, value));
    }
    Ok(())
}
