mod logging;
mod tui;

use adlens_common::Config;
use adlens_core::export::{export_csv, export_json, print_summary, write_csv, write_json, write_table};
use adlens_core::taxonomy::fallback_resolutions;
use adlens_core::{apply, column_by_name, load_source, parse_clauses, sort_rows, Conjunction, CATEGORIES};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf, time::Duration};
use tui::app::{spawn_load, App};
use tui::events::handle_key;
use tui::ui::render;

#[derive(Parser)]
#[command(name = "adlens", version, about = "Ad creative performance report viewer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive table with the filter popover
    View { source: Option<String> },
    /// Filter the report without the UI and print or export the matching rows
    Filter {
        source: Option<String>,
        /// CATEGORY:OPTION:OPERATOR:VALUE, repeatable
        #[arg(long = "where", value_name = "CLAUSE")]
        clauses: Vec<String>,
        /// join clauses with OR instead of AND
        #[arg(long)] any: bool,
        #[arg(long, default_value = "table")] format: String,
        #[arg(long)] output: Option<PathBuf>,
        #[arg(long)] sort: Option<String>,
        #[arg(long)] desc: bool,
    },
    /// List filter categories, options and operators
    Categories,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();
    let interactive = matches!(cli.command, Commands::View { .. });
    if let Err(e) = logging::init(&config.logging, interactive) {
        eprintln!("logging disabled: {e}");
    }
    match cli.command {
        Commands::View { source } => {
            let source = source.unwrap_or_else(|| config.source.default_path.clone());
            run_tui(source, &config)?
        }
        Commands::Filter { source, clauses, any, format, output, sort, desc } => {
            let source = source.unwrap_or_else(|| config.source.default_path.clone());
            run_filter(source, clauses, any, format, output, sort, desc).await?
        }
        Commands::Categories => run_categories(),
    }
    Ok(())
}

fn run_tui(source: String, config: &Config) -> anyhow::Result<()> {
    let mut app = App::new(source.clone(), config);
    app.begin_load(spawn_load(source));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick = Duration::from_millis(66); // 15Hz
    loop {
        app.poll_load();
        terminal.draw(|f| render(f, &app))?;
        if event::poll(tick)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Mouse(mouse) if !app.popover_open => match mouse.kind {
                    MouseEventKind::ScrollDown => app.row_down(),
                    MouseEventKind::ScrollUp => app.row_up(),
                    _ => {}
                },
                _ => {}
            }
        }
        if app.should_quit { break; }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    let fallbacks = fallback_resolutions();
    if fallbacks > 0 {
        tracing::warn!(fallbacks, "option labels resolved to the tags field");
    }
    Ok(())
}

async fn run_filter(
    source: String,
    clauses: Vec<String>,
    any: bool,
    format: String,
    output: Option<PathBuf>,
    sort: Option<String>,
    desc: bool,
) -> anyhow::Result<()> {
    let conjunction = if any { Conjunction::Or } else { Conjunction::And };
    let set = parse_clauses(clauses.as_slice(), conjunction)?;
    let records = load_source(&source).await?;
    tracing::info!(source = %source, rows = records.len(), "report loaded");
    let mut outcome = apply(&records, &set);
    if let Some(name) = sort {
        let column = column_by_name(&name).ok_or_else(|| anyhow::anyhow!("unknown sort column: {name}"))?;
        sort_rows(&records, &mut outcome.rows, column, !desc);
    }
    tracing::debug!(matched = outcome.matched_rows, scanned = outcome.scanned_rows, "filter applied");

    if let Some(parent) = output.as_deref().and_then(|o| o.parent()) {
        if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
    }
    match (format.as_str(), output) {
        ("table", None) => {
            print_summary(&source, &set, &outcome);
            println!();
            write_table(&mut io::stdout().lock(), &records, &outcome.rows)?;
        }
        ("table", Some(path)) => {
            let mut file = std::fs::File::create(&path)?;
            write_table(&mut file, &records, &outcome.rows)?;
            println!("Exported {} rows to {}", outcome.rows.len(), path.display());
        }
        ("json", None) => write_json(io::stdout().lock(), &records, &set, &outcome)?,
        ("json", Some(path)) => {
            export_json(&path, &records, &set, &outcome)?;
            println!("Exported {} rows to {}", outcome.rows.len(), path.display());
        }
        ("csv", None) => write_csv(io::stdout().lock(), &records, &outcome.rows)?,
        ("csv", Some(path)) => {
            export_csv(&path, &records, &outcome.rows)?;
            println!("Exported {} rows to {}", outcome.rows.len(), path.display());
        }
        (other, _) => anyhow::bail!("Unknown format: {other} (use table, json or csv)"),
    }
    Ok(())
}

fn run_categories() {
    for cat in CATEGORIES.iter() {
        let ops: Vec<&str> = cat.operators.iter().map(|o| o.id()).collect();
        println!("{:<12} {:?}", cat.name, cat.field_type);
        println!("  {:<10} {}", "options:", cat.option_labels().join(", "));
        println!("  {:<10} {}", "operators:", ops.join(", "));
    }
}
