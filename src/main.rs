use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reel_widgets::cli::{resolve_config, Args, Command};
use reel_widgets::history::{self, RecentKind, RecentList};
use reel_widgets::theme::{Theme, ThemeSurface, ThemeToggle};
use reel_widgets::{
    now_ms, Autocomplete, FileStore, HttpSuggestionSource, KeyValueStore, PanelState,
    SuggestionSource, TokioScheduler, WidgetConfig,
};

/// Terminal stand-in for the document's `data-theme` attribute.
struct TerminalTheme;

impl ThemeSurface for TerminalTheme {
    fn apply(&self, theme: Theme) {
        info!(%theme, "applied theme");
    }
}

fn print_panel(panel: &PanelState) {
    if !panel.visible {
        println!("{}", "  (dropdown hidden)".dimmed());
        return;
    }
    for (i, row) in panel.rows.iter().enumerate() {
        println!("  {} {}", format!("{:>2}.", i + 1).bright_blue(), row);
    }
}

async fn run_suggest(config: &WidgetConfig, prefix: &str) -> Result<(), Box<dyn std::error::Error>> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        println!("{}", "  (blank prefix, nothing to ask)".dimmed());
        return Ok(());
    }
    let source = HttpSuggestionSource::new(config.base_url.clone(), config.request_timeout())?;
    let rows = source.fetch(prefix).await?;
    print_panel(&PanelState {
        visible: !rows.is_empty(),
        rows,
    });
    Ok(())
}

/// Each stdin line is the input's full value after a keystroke. `#N` picks row N.
async fn run_watch(config: &WidgetConfig) -> Result<(), Box<dyn std::error::Error>> {
    let source: Rc<dyn SuggestionSource> = Rc::new(HttpSuggestionSource::new(
        config.base_url.clone(),
        config.request_timeout(),
    )?);
    let scheduler = Rc::new(TokioScheduler::new());
    let ac = Autocomplete::new(source, scheduler, config.debounce());
    ac.subscribe(print_panel);

    eprintln!(
        "{}",
        format!("  Watching input against {}", config.base_url).bright_green()
    );
    eprintln!("{}", "  Type a value per line, #N to pick a row, Ctrl+D to stop.".bright_blue());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(pick) = line.strip_prefix('#') {
            match pick.trim().parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                Some(idx) => match ac.select(idx) {
                    Some(chosen) => println!("{} {}", "  selected".bright_green(), chosen),
                    None => println!("{}", "  no such row".bright_red()),
                },
                None => println!("{}", "  usage: #N".bright_red()),
            }
            continue;
        }
        ac.on_input(&line);
    }

    // Let the last debounce and its request settle before exiting.
    let deadline = tokio::time::Instant::now() + config.debounce() + config.request_timeout();
    while !ac.is_settled() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

fn run_record(
    config: &WidgetConfig,
    store: &dyn KeyValueStore,
    kind: RecentKind,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if history::record(store, kind, value, now_ms(), config.history_cap)? {
        println!("{} {} {}", "  recorded".bright_green(), kind.to_string().dimmed(), value.trim());
    } else {
        println!("{}", "  (blank value, nothing recorded)".dimmed());
    }
    Ok(())
}

fn run_recent(store: &dyn KeyValueStore) {
    let list = RecentList::snapshot(store);
    if list.is_empty() {
        println!("{}", "  (no recent searches)".dimmed());
        return;
    }
    for entry in list.entries() {
        println!("  {} {}", entry.kind.to_string().dimmed(), entry.value);
    }
}

fn run_theme(store: Rc<dyn KeyValueStore>, toggle: bool) -> Result<(), Box<dyn std::error::Error>> {
    let theme = ThemeToggle::init(store, Rc::new(TerminalTheme));
    let current = if toggle { theme.toggle()? } else { theme.current() };
    println!("  theme: {}", current.to_string().bright_cyan());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    let store = Rc::new(FileStore::new(&config.store_path));

    match &args.command {
        Command::Suggest { prefix } => run_suggest(&config, prefix).await?,
        Command::Watch => {
            let local = tokio::task::LocalSet::new();
            local.run_until(run_watch(&config)).await?;
        }
        Command::Record { kind, value } => run_record(&config, store.as_ref(), *kind, value)?,
        Command::Recent => run_recent(store.as_ref()),
        Command::Theme { toggle } => run_theme(store, *toggle)?,
    }

    Ok(())
}
