//! Command-line configuration.
//!
//! Every global option falls back to an environment variable, then to a
//! default under the XDG data directory.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::hotkey::FocusTarget;
use crate::model::{Candidate, Color, Theme};
use crate::resolver::Domain;

#[derive(Debug, Parser)]
#[command(
    name = "shortkey",
    version,
    about = "Bind keyboard chords to URLs, globally or per domain"
)]
pub struct Cli {
    /// JSON file backing the binding store.
    #[arg(long, env = "SHORTKEY_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Directory for the fast-path cache.
    #[arg(long, env = "SHORTKEY_CACHE", global = true)]
    pub cache: Option<PathBuf>,

    /// Program that opens URLs.
    #[arg(long, env = "SHORTKEY_OPENER", default_value = "xdg-open", global = true)]
    pub opener: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the configuration surface: theme and every binding.
    Open,
    /// List bindings in display order.
    List,
    /// Bind a chord to a URL.
    Add(BindingArgs),
    /// Replace a binding, addressed by `#N` display position or id.
    Update {
        target: String,
        #[command(flatten)]
        binding: BindingArgs,
    },
    /// Delete a binding, addressed by `#N` display position or id.
    Delete { target: String },
    /// Show which binding a chord triggers on a domain.
    Resolve {
        chord: String,
        /// Page hostname.
        #[arg(long)]
        domain: String,
    },
    /// Report conflicts a binding would raise, without saving.
    Check {
        #[arg(long)]
        chord: String,
        #[arg(long, default_value = "*")]
        domain: String,
        /// Binding being edited, excluded from the check.
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Feed one key event through the page listener.
    Press {
        /// Raw key identifier (`k`, `Escape`, `ArrowUp`, `F5`).
        #[arg(long)]
        key: String,
        #[arg(long)]
        ctrl: bool,
        #[arg(long)]
        shift: bool,
        #[arg(long)]
        alt: bool,
        /// Page hostname.
        #[arg(long)]
        host: String,
        /// Focused element: `tag`, `tag:type`, `!` suffix for contenteditable.
        #[arg(long)]
        focus: Option<FocusTarget>,
        /// Deliver the navigation with the opener.
        #[arg(long)]
        open: bool,
    },
    /// Show or set the display theme.
    Theme { theme: Option<Theme> },
}

#[derive(Debug, Clone, Args)]
pub struct BindingArgs {
    #[arg(long)]
    pub url: String,
    /// Chord text, e.g. `ctrl+shift+k`.
    #[arg(long)]
    pub chord: String,
    /// `*` for every page; defaults to the URL's host.
    #[arg(long)]
    pub domain: Option<String>,
    #[arg(long, default_value = "default")]
    pub color: Color,
    #[arg(long)]
    pub new_tab: bool,
}

impl BindingArgs {
    /// Build the engine candidate, filling a missing domain from the URL.
    pub fn to_candidate(&self) -> Candidate {
        let domain = self
            .domain
            .clone()
            .or_else(|| Domain::from_url(&self.url).map(|d| d.to_string()))
            .unwrap_or_default();

        Candidate::new(&self.url, &self.chord, domain)
            .color(self.color)
            .new_tab(self.new_tab)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no data directory: set --store, SHORTKEY_STORE, XDG_DATA_HOME or HOME")]
    NoDataDir,
}

/// Resolved file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub store: PathBuf,
    pub cache: PathBuf,
}

impl Paths {
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve_with(cli, |name| std::env::var_os(name).map(PathBuf::from))
    }

    fn resolve_with(
        cli: &Cli,
        env: impl Fn(&str) -> Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let store = match &cli.store {
            Some(path) => path.clone(),
            None => data_dir(&env)?.join("store.json"),
        };

        let cache = match &cli.cache {
            Some(path) => path.clone(),
            None => store
                .parent()
                .map(|p| p.join("cache"))
                .unwrap_or_else(|| PathBuf::from("cache")),
        };

        Ok(Self { store, cache })
    }
}

fn data_dir(env: &impl Fn(&str) -> Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = env("XDG_DATA_HOME").filter(|p| p.is_absolute()) {
        return Ok(xdg.join("shortkey"));
    }
    env("HOME")
        .map(|home| home.join(".local").join("share").join("shortkey"))
        .ok_or(ConfigError::NoDataDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shortkey").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn add_fills_domain_from_url() {
        let cli = parse(&["add", "--url", "https://www.github.com/pulls", "--chord", "g"]);
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        let candidate = args.to_candidate();
        assert_eq!(candidate.domain, "github.com");
        assert_eq!(candidate.color, Color::Default);
        assert!(!candidate.open_in_new_tab);
    }

    #[test]
    fn explicit_domain_and_flags() {
        let cli = parse(&[
            "add", "--url", "https://a.example", "--chord", "ctrl+k", "--domain", "*",
            "--color", "blue", "--new-tab",
        ]);
        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        let candidate = args.to_candidate();
        assert_eq!(candidate.domain, "*");
        assert_eq!(candidate.color, Color::Blue);
        assert!(candidate.open_in_new_tab);
    }

    #[test]
    fn press_parses_focus() {
        let cli = parse(&["press", "--key", "h", "--host", "example.com", "--focus", "input:text"]);
        let Command::Press { focus, .. } = cli.command else {
            panic!("expected press");
        };
        assert_eq!(focus, Some(FocusTarget::input("text")));
    }

    #[test]
    fn unknown_color_is_rejected() {
        let result = Cli::try_parse_from([
            "shortkey", "add", "--url", "https://a.example", "--chord", "k", "--color", "teal",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn paths_prefer_flags_then_xdg_then_home() {
        let cli = parse(&["--store", "/tmp/s/store.json", "list"]);
        let paths = Paths::resolve_with(&cli, |_| None).unwrap();
        assert_eq!(paths.store, PathBuf::from("/tmp/s/store.json"));
        assert_eq!(paths.cache, PathBuf::from("/tmp/s/cache"));

        let cli = parse(&["list"]);
        let paths = Paths::resolve_with(&cli, |name| match name {
            "XDG_DATA_HOME" => Some(PathBuf::from("/xdg")),
            "HOME" => Some(PathBuf::from("/home/u")),
            _ => None,
        })
        .unwrap();
        assert_eq!(paths.store, PathBuf::from("/xdg/shortkey/store.json"));

        let paths = Paths::resolve_with(&cli, |name| {
            (name == "HOME").then(|| PathBuf::from("/home/u"))
        })
        .unwrap();
        assert_eq!(
            paths.store,
            PathBuf::from("/home/u/.local/share/shortkey/store.json")
        );

        assert!(matches!(
            Paths::resolve_with(&cli, |_| None),
            Err(ConfigError::NoDataDir)
        ));
    }
}
