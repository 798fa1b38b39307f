//! Marksync - A terminal markdown editor with a synchronized preview.
//!
//! # Usage
//!
//! ```bash
//! marksync README.md
//! marksync --layout read README.md
//! marksync --export README.html README.md
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use marksync::app::{App, export_html};
use marksync::config::{
    ConfigFlags, clear_config_flags, default_log_path, global_config_path, load_config_flags,
    local_override_path, open_log_file, parse_flag_tokens, save_config_flags,
};
use marksync::perf;
use marksync::sync::LayoutMode;

/// A terminal markdown editor with a scroll-synchronized preview
#[derive(Parser, Debug)]
#[command(name = "marksync", version, about, long_about = None)]
struct Cli {
    /// Markdown file to edit (created on first save if missing)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Render FILE to a standalone HTML page and exit
    #[arg(long, value_name = "PATH", requires = "file")]
    export: Option<PathBuf>,

    /// Mark every occurrence of TEXT in the exported page
    #[arg(long, value_name = "TEXT", requires = "export")]
    highlight: Option<String>,

    /// Start with scroll synchronization off
    #[arg(long)]
    no_sync: bool,

    /// Initial pane layout: edit, read or split
    #[arg(long, value_name = "MODE", value_parser = parse_layout)]
    layout: Option<LayoutMode>,

    /// Make find case sensitive
    #[arg(long)]
    case_sensitive: bool,

    /// Log timing information for rendering and search
    #[arg(long)]
    perf: bool,

    /// Write log output to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn parse_layout(value: &str) -> Result<LayoutMode, String> {
    LayoutMode::parse(value).ok_or_else(|| format!("unknown layout `{value}`"))
}

// The terminal is in raw mode while the editor runs, so an interactive
// session never logs to stderr: without `--log-file` it logs to the user's
// state directory, or nowhere if there is none.
fn init_logging(flags: &ConfigFlags, interactive: bool) -> Result<()> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if flags.perf {
        filter = filter.add_directive(
            "marksync::perf=info"
                .parse()
                .context("invalid perf log directive")?,
        );
    }

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let path = match (&flags.log_file, interactive) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => default_log_path(),
        (None, false) => {
            builder.with_writer(std::io::stderr).init();
            return Ok(());
        }
    };
    match path {
        Some(path) => {
            let file = open_log_file(&path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(&effective, cli.export.is_none())?;
    perf::set_enabled(effective.perf);

    if let Some(out) = cli.export {
        let file = cli.file.context("--export needs a FILE to render")?;
        let source = std::fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let highlight = cli
            .highlight
            .as_deref()
            .map(|pattern| (pattern, effective.case_sensitive));
        return export_html(&source, Some(&file), &out, highlight);
    }

    let mut app = App::new(cli.file)
        .with_layout(effective.layout.unwrap_or_default())
        .with_sync(!effective.no_sync)
        .with_case_sensitive(effective.case_sensitive);

    app.run().context("Application error")
}
