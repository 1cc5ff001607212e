//! Per-invocation context: configuration, roots and pattern resolution
//!
//! Patterns given on the command line are relative to the current directory
//! when it lies inside the local repository, and to the root otherwise. The
//! same rule decides how paths are printed.

use std::path::{Path, PathBuf};

use knife_core::KnifeConfig;
use knife_fs::{EntryPath, FilePattern, LocalEntry};
use knife_remote::RemoteEntry;
use tracing::debug;

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::logging;

/// Which tree a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl Side {
    pub fn from_local_flag(local: bool) -> Self {
        if local { Self::Local } else { Self::Remote }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

#[derive(Debug)]
pub struct KnifeContext {
    pub config: KnifeConfig,
    pub cwd: PathBuf,
    local: LocalEntry,
    /// Entry path of `cwd` when it lies inside the repository
    base: Option<EntryPath>,
}

impl KnifeContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut config = KnifeConfig::discover(cli.config.as_deref(), &cwd)?;
        if let Some(repo_path) = &cli.repo_path {
            config.repo_path = Some(absolute(&cwd, repo_path));
        }
        if let Some(url) = &cli.server_url {
            config.server_url = Some(url.clone());
        }
        Ok(Self::new(config, cwd))
    }

    pub fn new(config: KnifeConfig, cwd: PathBuf) -> Self {
        let local = config.open_local(&cwd);
        let base = local.entry_path_for(&cwd);
        debug!(repo = %local.base().display(), base = ?base, "resolved repository");
        Self {
            config,
            cwd,
            local,
            base,
        }
    }

    pub fn local(&self) -> LocalEntry {
        self.local.clone()
    }

    /// Open the server tree. Every call gets a fresh listing cache.
    pub fn remote(&self) -> Result<RemoteEntry> {
        Ok(self.config.open_remote()?)
    }

    /// Directory that relative patterns start from.
    pub fn base(&self) -> EntryPath {
        self.base.clone().unwrap_or_else(EntryPath::root)
    }

    /// Compile command-line patterns. Invalid ones are reported and skipped;
    /// the flag is true when any was invalid.
    pub fn patterns(&self, args: &[String]) -> (Vec<FilePattern>, bool) {
        let base = self.base();
        let mut failed = false;
        let patterns = args
            .iter()
            .filter_map(|arg| match FilePattern::relative_to(&base, arg) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    logging::error(e.to_string());
                    failed = true;
                    None
                }
            })
            .collect();
        (patterns, failed)
    }

    /// Patterns, or `.` when none were given.
    pub fn patterns_or_cwd(&self, args: &[String]) -> (Vec<FilePattern>, bool) {
        if args.is_empty() {
            self.patterns(&[".".to_string()])
        } else {
            self.patterns(args)
        }
    }

    /// Path as shown to the user: relative to the current directory when
    /// inside the repository, else absolute.
    pub fn format_path(&self, path: &EntryPath) -> String {
        match &self.base {
            Some(base) => match path.relative_to(base) {
                Some(relative) if relative.is_empty() => ".".to_string(),
                Some(relative) => relative,
                None => path.to_string(),
            },
            None => path.to_string(),
        }
    }
}

/// Fail with the standard message when a command got no patterns.
pub fn require_patterns(args: &[String], command: &str) -> Result<()> {
    if args.is_empty() {
        return Err(CliError::user(format!(
            "Must specify at least one argument.  If you want to {command} everything in this directory, type \"knife {command} .\""
        )));
    }
    Ok(())
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
