// Command line handling: works out which directory to watch and which
// client ID to send, falling back to ~/Pictures/Screenshots when only the
// client ID is given.

use crate::clipboard::DEFAULT_CLIPBOARD_COMMAND;
use crate::error::ConfigError;
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "snaplink",
    version,
    about = "Upload new screenshots and copy their links to the clipboard",
    override_usage = "snaplink [DIRECTORY] <CLIENT_ID>"
)]
pub struct Cli {
    /// Directory to watch, or the client ID when given alone
    #[arg(value_name = "DIRECTORY|CLIENT_ID")]
    pub first: String,

    /// Client ID when a directory is given first
    #[arg(value_name = "CLIENT_ID")]
    pub second: Option<String>,

    /// Anything after the client ID is accepted and ignored
    #[arg(hide = true)]
    pub extra: Vec<String>,

    /// Command that receives the link on stdin and puts it on the clipboard
    #[arg(long, default_value = DEFAULT_CLIPBOARD_COMMAND)]
    pub clipboard_command: String,
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub directory: PathBuf,
    pub client_id: String,
    pub clipboard_command: String,
}

impl Settings {
    /// Resolve the positional arguments. `home` is only consulted when the
    /// directory is omitted.
    pub fn resolve(cli: Cli, home: Option<PathBuf>) -> Result<Self, ConfigError> {
        if !cli.extra.is_empty() {
            log::warn!("Ignoring extra arguments: {}", cli.extra.join(" "));
        }
        let (directory, client_id) = match cli.second {
            Some(client_id) => (PathBuf::from(cli.first), client_id),
            None => {
                if Path::new(&cli.first).is_dir() {
                    return Err(ConfigError::MissingClientId(PathBuf::from(cli.first)));
                }
                (default_directory(home)?, cli.first)
            }
        };

        Ok(Settings {
            directory,
            client_id,
            clipboard_command: cli.clipboard_command,
        })
    }
}

/// `<home>/Pictures/Screenshots`.
pub fn default_directory(home: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    let home = home.ok_or(ConfigError::HomeNotSet)?;
    Ok(home.join("Pictures").join("Screenshots"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("snaplink").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn directory_and_client_id() {
        let settings = Settings::resolve(cli(&["/tmp/shots", "abc123"]), None).unwrap();
        assert_eq!(settings.directory, PathBuf::from("/tmp/shots"));
        assert_eq!(settings.client_id, "abc123");
        assert_eq!(settings.clipboard_command, "wl-copy");
    }

    #[test]
    fn client_id_alone_uses_home_screenshots() {
        let settings =
            Settings::resolve(cli(&["abc123"]), Some(PathBuf::from("/home/me"))).unwrap();
        assert_eq!(
            settings.directory,
            PathBuf::from("/home/me/Pictures/Screenshots")
        );
        assert_eq!(settings.client_id, "abc123");
    }

    #[test]
    fn client_id_alone_without_home_fails() {
        let err = Settings::resolve(cli(&["abc123"]), None).unwrap_err();
        assert!(matches!(err, ConfigError::HomeNotSet));
    }

    #[test]
    fn lone_directory_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let arg = dir.path().to_string_lossy().into_owned();
        let err = Settings::resolve(cli(&[arg.as_str()]), Some(PathBuf::from("/home/me"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingClientId(_)));
    }

    #[test]
    fn no_arguments_is_rejected() {
        assert!(Cli::try_parse_from(["snaplink"]).is_err());
    }

    #[test]
    fn extra_arguments_are_ignored() {
        let settings = Settings::resolve(cli(&["/tmp/shots", "abc123", "x", "y"]), None).unwrap();
        assert_eq!(settings.directory, PathBuf::from("/tmp/shots"));
        assert_eq!(settings.client_id, "abc123");
    }

    #[test]
    fn clipboard_command_flag() {
        let settings = Settings::resolve(
            cli(&["--clipboard-command", "xclip -selection clipboard", "/d", "id"]),
            None,
        )
        .unwrap();
        assert_eq!(settings.clipboard_command, "xclip -selection clipboard");
    }
}
