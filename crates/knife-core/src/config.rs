//! knife configuration (`.chef/knife.toml`)
//!
//! Looked up in this order: an explicit path, the `KNIFE_CONFIG` environment
//! variable, the nearest `.chef/knife.toml` walking up from the working
//! directory, then `~/.chef/knife.toml`. No file at all is fine: every field
//! has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use knife_fs::LocalEntry;
use knife_remote::{RemoteEntry, RestOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "KNIFE_CONFIG";
/// Directory holding the configuration file
pub const CONFIG_DIR: &str = ".chef";
pub const CONFIG_FILE: &str = "knife.toml";

fn default_retry_secs() -> u64 {
    5
}

/// Settings read from `knife.toml`.
///
/// ```
/// use knife_core::config::KnifeConfig;
///
/// let config = KnifeConfig::parse(r#"
/// server_url = "https://chef.example.com/organizations/acme"
/// client_name = "alice"
/// "#).unwrap();
///
/// assert_eq!(config.client_name.as_deref(), Some("alice"));
/// assert_eq!(config.retry_max_elapsed_secs, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnifeConfig {
    /// Root of the local repository
    pub repo_path: Option<PathBuf>,
    /// `http(s)://` or `file://` URL of the server
    pub server_url: Option<String>,
    /// Sent as `X-Ops-UserId`
    pub client_name: Option<String>,
    /// Budget for retrying transient server failures
    #[serde(default = "default_retry_secs")]
    pub retry_max_elapsed_secs: u64,
    /// Editor for `knife edit` when neither `VISUAL` nor `EDITOR` is set
    pub editor: Option<String>,

    /// File this configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for KnifeConfig {
    fn default() -> Self {
        Self {
            repo_path: None,
            server_url: None,
            client_name: None,
            retry_max_elapsed_secs: default_retry_secs(),
            editor: None,
            source: None,
        }
    }
}

impl KnifeConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a configuration file. A relative `repo_path` is resolved against
    /// the directory holding `.chef/`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(e),
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| Error::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let base = config_base(path);
        if let Some(repo) = config.repo_path.take() {
            config.repo_path = Some(if repo.is_relative() { base.join(repo) } else { repo });
        }
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Find and load the configuration for a command run from `cwd`.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let home = dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE));
        discover_from(explicit, env, cwd, home)
    }

    /// Root of the local repository: the configured path, else the directory
    /// holding `.chef/`, else `cwd`.
    pub fn repo_path(&self, cwd: &Path) -> PathBuf {
        let path = self
            .repo_path
            .clone()
            .or_else(|| self.source.as_deref().map(config_base))
            .unwrap_or_else(|| cwd.to_path_buf());
        dunce::canonicalize(&path).unwrap_or(path)
    }

    pub fn server_url(&self) -> Result<&str> {
        self.server_url.as_deref().ok_or(Error::MissingServerUrl)
    }

    pub fn rest_options(&self) -> RestOptions {
        RestOptions {
            client_name: self.client_name.clone(),
            retry_max_elapsed: Duration::from_secs(self.retry_max_elapsed_secs),
        }
    }

    pub fn open_local(&self, cwd: &Path) -> LocalEntry {
        LocalEntry::open_root(self.repo_path(cwd))
    }

    pub fn open_remote(&self) -> Result<RemoteEntry> {
        Ok(knife_remote::open_remote(
            self.server_url()?,
            &self.rest_options(),
        )?)
    }
}

fn discover_from(
    explicit: Option<&Path>,
    env: Option<PathBuf>,
    cwd: &Path,
    home: Option<PathBuf>,
) -> Result<KnifeConfig> {
    if let Some(path) = explicit {
        return KnifeConfig::load(path);
    }
    if let Some(path) = env {
        return KnifeConfig::load(&path);
    }
    for dir in cwd.ancestors() {
        let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if candidate.is_file() {
            return KnifeConfig::load(&candidate);
        }
    }
    if let Some(path) = home.filter(|p| p.is_file()) {
        return KnifeConfig::load(&path);
    }
    debug!(cwd = %cwd.display(), "no configuration found, using defaults");
    Ok(KnifeConfig::default())
}

/// Directory a configuration file belongs to: the parent of `.chef/` when
/// the file lives there, else the file's own directory.
fn config_base(path: &Path) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    if dir.file_name().is_some_and(|name| name == CONFIG_DIR) {
        dir.parent().unwrap_or(dir).to_path_buf()
    } else {
        dir.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let chef = dir.join(CONFIG_DIR);
        std::fs::create_dir_all(&chef).unwrap();
        let path = chef.join(CONFIG_FILE);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = KnifeConfig::parse("").unwrap();
        assert_eq!(config, KnifeConfig::default());
        assert!(matches!(config.server_url(), Err(Error::MissingServerUrl)));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(KnifeConfig::parse("retry_max_elapsed_secs = \"soon\"").is_err());
    }

    #[test]
    fn discovery_walks_up_to_the_nearest_chef_dir() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "server_url = \"file:///srv/chef\"\n");
        let nested = temp.path().join("roles/web");
        std::fs::create_dir_all(&nested).unwrap();

        let config = discover_from(None, None, &nested, None).unwrap();

        assert_eq!(config.server_url().unwrap(), "file:///srv/chef");
        assert_eq!(
            config.repo_path(&nested),
            dunce::canonicalize(temp.path()).unwrap()
        );
    }

    #[test]
    fn explicit_path_wins_and_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");

        let err = discover_from(Some(&missing), None, temp.path(), None).unwrap_err();

        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn env_path_is_used_before_walking() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "client_name = \"walked\"\n");
        let env_file = temp.path().join("env.toml");
        std::fs::write(&env_file, "client_name = \"env\"\n").unwrap();

        let config = discover_from(None, Some(env_file), temp.path(), None).unwrap();

        assert_eq!(config.client_name.as_deref(), Some("env"));
    }

    #[test]
    fn relative_repo_path_resolves_against_the_chef_parent() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "repo_path = \"repo\"\n");

        let config = KnifeConfig::load(&path).unwrap();

        assert_eq!(config.repo_path, Some(temp.path().join("repo")));
    }

    #[test]
    fn falls_back_to_cwd_without_config() {
        let temp = TempDir::new().unwrap();
        let config = discover_from(None, None, temp.path(), None).unwrap();
        assert_eq!(config.repo_path(temp.path()), dunce::canonicalize(temp.path()).unwrap());
    }

    #[test]
    fn rest_options_carry_client_and_budget() {
        let config = KnifeConfig::parse("client_name = \"alice\"\nretry_max_elapsed_secs = 1\n").unwrap();
        let options = config.rest_options();
        assert_eq!(options.client_name.as_deref(), Some("alice"));
        assert_eq!(options.retry_max_elapsed, Duration::from_secs(1));
    }
}
