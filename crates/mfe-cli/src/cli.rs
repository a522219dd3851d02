use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output format of command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// JSON documents
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "mfe")]
#[command(about = "mfe - browse mainframe connection profiles")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace); defaults to warn
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project directory holding mfe.config.json (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Global configuration home (defaults to $MFE_CLI_HOME, then ~/.mfe)
    #[arg(long, global = true, env = "MFE_CLI_HOME")]
    pub home: Option<PathBuf>,

    /// Extra profile type to load besides the built-in API types (repeatable)
    #[arg(long = "extra-type", global = true, value_name = "TYPE")]
    pub extra_types: Vec<String>,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl Cli {
    /// Effective log level
    pub fn level_filter(&self) -> LevelFilter {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level.into(),
            (None, true) => LevelFilter::DEBUG,
            (None, false) => LevelFilter::WARN,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect merged profiles
    #[command(subcommand)]
    Profiles(ProfilesCommands),

    /// List the profile types loaded into the catalog
    Types,

    /// Validate a service URL and show its parts
    CheckUrl {
        /// URL to check, e.g. https://lpar1.example.com:443
        url: String,
    },

    /// Report whether secure values are kept in a credential vault
    SecureStatus,
}

#[derive(Subcommand, Debug)]
pub enum ProfilesCommands {
    /// List profiles in catalog order
    List {
        /// Only profiles of this type
        #[arg(short = 't', long = "type")]
        profile_type: Option<String>,
    },

    /// Show the merged properties of one profile
    Show {
        /// Full profile name, e.g. lpar1.zosmf
        name: String,

        /// Profile type, when the name is ambiguous
        #[arg(short = 't', long = "type")]
        profile_type: Option<String>,
    },

    /// Show the default profile of every type
    Defaults,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_list_parses() {
        let cli = Cli::try_parse_from(["mfe", "profiles", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Profiles(ProfilesCommands::List { profile_type: None })
        ));
        assert_eq!(cli.format, OutputFormat::Table);
    }

    #[test]
    fn profiles_show_with_type() {
        let cli = Cli::try_parse_from(["mfe", "profiles", "show", "lpar1.zftp", "--type", "zftp"]).unwrap();
        if let Commands::Profiles(ProfilesCommands::Show { name, profile_type }) = cli.command {
            assert_eq!(name, "lpar1.zftp");
            assert_eq!(profile_type.as_deref(), Some("zftp"));
        } else {
            panic!("Expected profiles show command");
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mfe",
            "types",
            "--format",
            "json",
            "-C",
            "/work/project",
            "--extra-type",
            "tso",
            "--extra-type",
            "rse",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Types));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config_dir, Some(PathBuf::from("/work/project")));
        assert_eq!(cli.extra_types, vec!["tso", "rse"]);
    }

    #[test]
    fn check_url_requires_argument() {
        assert!(Cli::try_parse_from(["mfe", "check-url"]).is_err());
        let cli = Cli::try_parse_from(["mfe", "check-url", "https://example.com:443"]).unwrap();
        assert!(matches!(cli.command, Commands::CheckUrl { url } if url == "https://example.com:443"));
    }

    #[test]
    fn level_filter_precedence() {
        let cli = Cli::try_parse_from(["mfe", "secure-status"]).unwrap();
        assert_eq!(cli.level_filter(), LevelFilter::WARN);

        let cli = Cli::try_parse_from(["mfe", "secure-status", "-v"]).unwrap();
        assert_eq!(cli.level_filter(), LevelFilter::DEBUG);

        let cli = Cli::try_parse_from(["mfe", "secure-status", "-v", "--log-level", "error"]).unwrap();
        assert_eq!(cli.level_filter(), LevelFilter::ERROR);
    }
}
