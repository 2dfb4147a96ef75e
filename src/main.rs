use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use shortkey::broker::{CommandNavigator, Engine, EngineError, Navigator, Notifier, SinkError};
use shortkey::config::{Cli, Command, ConfigError, Paths};
use shortkey::hotkey::{KeyOutcome, KeyPress, PageEvent, PageListener};
use shortkey::model::{Binding, BindingId, BindingSet, Candidate};
use shortkey::resolver::ConflictReport;
use shortkey::store::{FileFastPath, FileStore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("no binding at `{0}`: use #N from `list` or a binding id")]
    Target(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("shortkey: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let paths = Paths::resolve(&cli)?;
    tracing::debug!(store = %paths.store.display(), cache = %paths.cache.display(), "paths");

    let notifier = Notifier::new();
    let mut engine = Engine::new(FileStore::new(&paths.store), notifier)
        .with_fast_path(FileFastPath::new(&paths.cache));

    match cli.command {
        Command::Open => {
            println!("theme: {}", engine.theme().await?);
            print_bindings(engine.bindings().await?);
        }
        Command::List => print_bindings(engine.bindings().await?),
        Command::Add(args) => {
            let saved = engine.add(args.to_candidate()).await?;
            print_report(&saved.report);
            println!("added {}", describe(&saved.binding));
        }
        Command::Update { target, binding } => {
            let id = resolve_target(&mut engine, &target).await?;
            let saved = engine.update(id, binding.to_candidate()).await?;
            print_report(&saved.report);
            println!("updated {}", describe(&saved.binding));
        }
        Command::Delete { target } => {
            let id = resolve_target(&mut engine, &target).await?;
            let removed = engine.delete(id).await?;
            println!("deleted {}", describe(&removed));
        }
        Command::Resolve { chord, domain } => {
            let chord = shortkey::hotkey::parse_chord(&chord)
                .map_err(|e| EngineError::Validation(e.into()))?;
            match engine.resolve(&chord, &domain).await? {
                Some(binding) => println!("{}", describe(&binding)),
                None => println!("no binding for \"{chord}\" on {domain}"),
            }
        }
        Command::Check {
            chord,
            domain,
            exclude,
        } => {
            let exclude = match exclude {
                Some(target) => Some(resolve_target(&mut engine, &target).await?),
                None => None,
            };
            // Any URL passes; only chord and scope matter for conflicts.
            let candidate = Candidate::new("https://example.invalid/", chord, domain);
            let report = engine.check(&candidate, exclude).await?;
            if report.is_clear() {
                println!("no conflicts");
            }
            print_report(&report);
        }
        Command::Press {
            key,
            ctrl,
            shift,
            alt,
            host,
            focus,
            open,
        } => {
            let event = PageEvent {
                press: KeyPress {
                    ctrl,
                    shift,
                    alt,
                    key,
                },
                focus,
                default_prevented: false,
            };
            let mut listener = PageListener::new(engine, host);
            match listener.handle_key(&event).await {
                KeyOutcome::Navigate(navigation) => {
                    println!("navigate {:?} {}", navigation.target, navigation.url);
                    if open {
                        CommandNavigator::new(&cli.opener)
                            .navigate(&navigation)
                            .await?;
                    }
                }
                KeyOutcome::Passthrough(reason) => println!("passthrough ({reason:?})"),
            }
        }
        Command::Theme { theme: Some(theme) } => {
            engine.set_theme(theme).await?;
            println!("theme: {theme}");
        }
        Command::Theme { theme: None } => println!("theme: {}", engine.theme().await?),
    }

    Ok(())
}

/// `#N` is a 1-based display position; anything else must be a binding id.
async fn resolve_target(
    engine: &mut Engine<FileStore>,
    target: &str,
) -> Result<BindingId, CliError> {
    let set = engine.bindings().await?;
    let found = match target.strip_prefix('#') {
        Some(n) => n
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| set.id_at(index)),
        None => target.parse::<BindingId>().ok().filter(|id| set.get(*id).is_some()),
    };
    found.ok_or_else(|| CliError::Target(target.to_string()))
}

fn describe(binding: &Binding) -> String {
    let mut line = format!("\"{}\" on {} → {}", binding.chord, binding.domain, binding.url);
    if binding.open_in_new_tab {
        line.push_str(" (new tab)");
    }
    line
}

fn print_bindings(set: &BindingSet) {
    if set.is_empty() {
        println!("no bindings");
        return;
    }
    for (n, binding) in set.iter().enumerate() {
        println!("#{:<3} [{}] {}  {}", n + 1, binding.color, describe(binding), binding.id);
    }
}

fn print_report(report: &ConflictReport) {
    for conflict in &report.conflicts {
        let label = if conflict.kind.is_blocking() { "conflict" } else { "warning" };
        println!("{label}: {conflict}");
    }
    if let Some(reserved) = report.reserved {
        println!("warning: {reserved}");
    }
}
