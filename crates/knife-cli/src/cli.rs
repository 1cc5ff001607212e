//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// knife - Browse, diff and sync a Chef repository against a server
#[derive(Parser, Debug)]
#[command(name = "knife")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: nearest .chef/knife.toml)
    #[arg(long, global = true, env = "KNIFE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Local repository root, overriding the configuration
    #[arg(long, global = true)]
    pub repo_path: Option<PathBuf>,

    /// Server URL (http://, https:// or file://), overriding the configuration
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List objects on the server or in the local repository
    ///
    /// Examples:
    ///   knife list /                 # Top-level directories on the server
    ///   knife list -R /roles         # Everything under /roles
    ///   knife list --local '/**.rb'  # Every Ruby file in the repository
    List(ListArgs),

    /// Compare the server with the local repository
    ///
    /// Paths only in the local repository are reported as added, paths only
    /// on the server as deleted.
    Diff(DiffArgs),

    /// Upload local objects to the server
    Upload(SyncArgs),

    /// Download objects from the server into the local repository
    Download(SyncArgs),

    /// Delete objects from the server and/or the local repository
    Delete(DeleteArgs),

    /// Print the content of objects
    Show(ShowArgs),

    /// Edit objects in $EDITOR and save them back
    Edit(EditArgs),

    /// Run a command against temporary copies of objects
    ///
    /// Matched objects are copied to temporary files, `{}` in the command
    /// is replaced by their paths (or they are appended), and changed files
    /// are written back.
    Xargs(XargsArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Patterns to list (default: current directory)
    pub patterns: Vec<String>,

    /// List directories recursively
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// When directories match the pattern, do not show the directories' children
    #[arg(short = 'd', long = "bare-directories")]
    pub bare_directories: bool,

    /// Show a single flat list of full paths
    #[arg(short = 'f', long)]
    pub flat: bool,

    /// Append / to directories
    #[arg(short = 'p')]
    pub trailing_slashes: bool,

    /// List the local repository instead of the server
    #[arg(long)]
    pub local: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DiffArgs {
    /// Patterns to compare (default: current directory)
    pub patterns: Vec<String>,

    /// Only show names of changed files
    #[arg(long, conflicts_with = "name_status")]
    pub name_only: bool,

    /// Only show names and statuses of changed files
    #[arg(long)]
    pub name_status: bool,

    /// Select statuses: A(dded), D(eleted), M(odified), T(ype changed); lowercase excludes
    #[arg(long, value_name = "LETTERS")]
    pub diff_filter: Option<String>,

    /// Compare children of matched directories (default)
    #[arg(long, overrides_with = "no_recurse")]
    pub recurse: bool,

    /// Only compare the matched entries, not their children
    #[arg(long, overrides_with = "recurse")]
    pub no_recurse: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SyncArgs {
    /// Patterns to copy
    pub patterns: Vec<String>,

    /// Delete matching destination objects the source does not have
    #[arg(long, overrides_with = "no_purge")]
    pub purge: bool,

    /// Keep destination objects the source does not have (default)
    #[arg(long, overrides_with = "purge")]
    pub no_purge: bool,

    /// Copy even when the destination content is identical
    #[arg(long, overrides_with = "no_force")]
    pub force: bool,

    /// Skip objects whose content is identical (default)
    #[arg(long, overrides_with = "force")]
    pub no_force: bool,

    /// Update existing objects whose content differs (default)
    #[arg(long, overrides_with = "no_diff")]
    pub diff: bool,

    /// Only create missing objects, never update existing ones
    #[arg(long, overrides_with = "diff")]
    pub no_diff: bool,

    /// Copy children of matched directories (default)
    #[arg(long, overrides_with = "no_recurse")]
    pub recurse: bool,

    /// Only copy the matched entries, not their children
    #[arg(long, overrides_with = "recurse")]
    pub no_recurse: bool,

    /// Report what would change without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DeleteArgs {
    /// Patterns to delete
    pub patterns: Vec<String>,

    /// Delete directories and everything in them
    #[arg(short = 'r', long)]
    pub recurse: bool,

    /// Delete from the local repository only
    #[arg(long, conflicts_with = "both")]
    pub local: bool,

    /// Delete from both the server and the local repository
    #[arg(long)]
    pub both: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ShowArgs {
    /// Patterns to show
    pub patterns: Vec<String>,

    /// Show the local repository instead of the server
    #[arg(long)]
    pub local: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EditArgs {
    /// Patterns to edit
    pub patterns: Vec<String>,

    /// Edit the local repository instead of the server
    #[arg(long)]
    pub local: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct XargsArgs {
    /// Patterns to operate on (default: read from stdin)
    #[arg(short = 'p', long = "pattern")]
    pub patterns: Vec<String>,

    /// Operate on the local repository instead of the server
    #[arg(long)]
    pub local: bool,

    /// Print changes instead of writing them back
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print a diff of each changed object
    #[arg(long)]
    pub diff: bool,

    /// Command and arguments to run
    #[arg(last = true)]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_upload_flags() {
        let cli = Cli::try_parse_from(["knife", "upload", "--purge", "-n", "/roles"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Upload(SyncArgs {
                patterns: vec!["/roles".to_string()],
                purge: true,
                no_purge: false,
                force: false,
                no_force: false,
                diff: false,
                no_diff: false,
                recurse: false,
                no_recurse: false,
                dry_run: true,
            })
        );
    }

    fn sync_args(args: &[&str]) -> SyncArgs {
        let cli = Cli::try_parse_from(["knife", "download"].into_iter().chain(args.iter().copied())).unwrap();
        let Commands::Download(args) = cli.command else {
            panic!("expected download");
        };
        args
    }

    #[test]
    fn last_of_a_flag_pair_wins() {
        let args = sync_args(&["--purge", "--no-purge", "--no-recurse", "--recurse", "/"]);
        assert!(!args.purge && args.no_purge);
        assert!(args.recurse && !args.no_recurse);

        let args = sync_args(&["--no-purge", "--purge", "--recurse", "--no-recurse", "/"]);
        assert!(args.purge && !args.no_purge);
        assert!(!args.recurse && args.no_recurse);

        let args = sync_args(&["--force", "--no-force", "--no-diff", "--diff", "/"]);
        assert!(!args.force && !args.no_diff);

        let args = sync_args(&["--no-force", "--force", "/"]);
        assert!(args.force);
    }

    #[test]
    fn diff_accepts_recurse_pair() {
        let cli = Cli::try_parse_from(["knife", "diff", "--no-recurse", "--recurse", "/"]).unwrap();
        let Commands::Diff(args) = cli.command else {
            panic!("expected diff");
        };
        assert!(!args.no_recurse);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "knife",
            "list",
            "-Rfp",
            "--server-url",
            "file:///srv/chef",
            "/",
        ])
        .unwrap();
        assert_eq!(cli.server_url.as_deref(), Some("file:///srv/chef"));
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert!(args.recursive && args.flat && args.trailing_slashes);
    }

    #[test]
    fn name_only_conflicts_with_name_status() {
        assert!(Cli::try_parse_from(["knife", "diff", "--name-only", "--name-status"]).is_err());
    }

    #[test]
    fn xargs_takes_command_after_separator() {
        let cli = Cli::try_parse_from(["knife", "xargs", "-p", "/roles/*", "--", "sed", "-i", "s/a/b/", "{}"])
            .unwrap();
        let Commands::Xargs(args) = cli.command else {
            panic!("expected xargs");
        };
        assert_eq!(args.patterns, vec!["/roles/*"]);
        assert_eq!(args.command, vec!["sed", "-i", "s/a/b/", "{}"]);
    }

    #[test]
    fn delete_local_conflicts_with_both() {
        assert!(Cli::try_parse_from(["knife", "delete", "--local", "--both", "/x"]).is_err());
    }
}
