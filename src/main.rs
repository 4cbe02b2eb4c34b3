//! changelens CLI entry point.
//!
//! Renders recorded agent file changes as side-by-side diffs in the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use changelens::diff::{DiffModel, RowHighlight, WindowItem, WindowState, extract_source_text};
use changelens::domain::{DiffRow, RowKind, SourceText, WordSpan};
use changelens::infra::store::ChangeStore;
use changelens::state::AppState;

const PANE_WIDTH: usize = 48;

#[derive(Parser, Debug)]
#[command(name = "changelens")]
#[command(version)]
#[command(about = "Side-by-side review of AI agent file changes", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two files
    Diff {
        old: PathBuf,
        new: PathBuf,
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Recover before/after text from a unified diff
    Extract {
        patch: PathBuf,
    },

    /// List the recorded changes of a session
    List {
        session: String,
    },

    /// Show one recorded change
    Show {
        session: String,
        change: String,
        /// Project root used to match tool-call paths (defaults to the recorded one)
        #[arg(long)]
        project: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Export stored diffs as a patch file
    Export {
        session: String,
        out: PathBuf,
        /// Export only this change
        #[arg(long)]
        change: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct WindowArgs {
    /// Show every line instead of collapsing unchanged context
    #[arg(long)]
    full: bool,

    /// Unchanged lines kept around each change
    #[arg(long)]
    context: Option<usize>,
}

impl WindowArgs {
    fn apply(&self, mut state: WindowState) -> WindowState {
        if let Some(context) = self.context {
            state.context_lines = context;
        }
        if self.full && !state.show_full_file() {
            state.toggle_full_file();
        }
        state
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let state = AppState::load();

    match args.command {
        Commands::Diff { old, new, window } => {
            let source = SourceText::new(read_text(&old)?, read_text(&new)?);
            let model = state.models.get_or_build(&source);
            let window = window.apply(state.window_state());
            print!("{}", render(&model, &window.visible_items(&model.rows)));
            print_stats(model.stats.added, model.stats.removed);
        }
        Commands::Extract { patch } => {
            let text = read_text(&patch)?;
            let source = extract_source_text(&text)
                .with_context(|| format!("No usable hunks in {}", patch.display()))?;
            println!("--- old");
            print!("{}", source.old_text);
            println!("+++ new");
            print!("{}", source.new_text);
        }
        Commands::List { session } => {
            let changes = state.changes.list_file_changes(&session).await?;
            if changes.is_empty() {
                println!("No changes recorded for session {session}");
            }
            for change in changes {
                println!(
                    "{}  prompt {:<3} {:<6} +{:<4} -{:<4} {}",
                    change.id,
                    change.prompt_index,
                    change.change_type,
                    change.lines_added.unwrap_or_default(),
                    change.lines_removed.unwrap_or_default(),
                    change.file_path
                );
            }
        }
        Commands::Show {
            session,
            change,
            project,
            window,
        } => {
            let mut view = state
                .open_change(&session, &change, project.as_deref())
                .await
                .with_context(|| format!("Failed to open change {change}"))?;
            *view.window_mut() = window.apply(view.window().clone());

            let record = view.record();
            println!("{} ({}, {})", record.file_path, record.change_type, record.source);
            match view.model() {
                Some(model) => print!("{}", render(model, &view.visible_items())),
                None => println!("No diff available for this change"),
            }
            let stats = view.stats();
            print_stats(stats.added, stats.removed);
        }
        Commands::Export {
            session,
            out,
            change,
        } => {
            let path = match change {
                Some(change) => {
                    state
                        .changes
                        .export_single_change(&session, &change, &out)
                        .await?
                }
                None => state.changes.export_patch(&session, &out).await?,
            };
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_stats(added: usize, removed: usize) {
    println!("+{added} -{removed}");
}

fn render(model: &DiffModel, items: &[WindowItem]) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            WindowItem::Row(index) => {
                let row = &model.rows[*index];
                let highlight = model.highlights.get(*index).and_then(Option::as_ref);
                render_row(&mut out, row, highlight);
            }
            WindowItem::Hunk(hunk) => {
                let _ = writeln!(out, "{:>6} ... {} unchanged lines [{}]", "", hunk.count, hunk.id);
            }
        }
    }
    out
}

fn render_row(out: &mut String, row: &DiffRow, highlight: Option<&RowHighlight>) {
    let (left_marker, right_marker) = match row.kind {
        RowKind::Context => (' ', ' '),
        RowKind::Added => (' ', '+'),
        RowKind::Removed => ('-', ' '),
        RowKind::Modified => (
            if row.has_left { '-' } else { ' ' },
            if row.has_right { '+' } else { ' ' },
        ),
    };
    let (left, right) = match highlight {
        Some(h) => (spans_text(&h.left_spans, "[-", "-]"), spans_text(&h.right_spans, "{+", "+}")),
        None => (row.left.clone(), row.right.clone()),
    };

    let _ = writeln!(
        out,
        "{:>5} {} {:<width$} | {:>5} {} {}",
        line_number(row.old_line_number),
        left_marker,
        left,
        line_number(row.new_line_number),
        right_marker,
        right,
        width = PANE_WIDTH
    );
}

fn spans_text(spans: &[WordSpan], open: &str, close: &str) -> String {
    spans
        .iter()
        .map(|span| {
            if span.changed {
                format!("{open}{}{close}", span.text)
            } else {
                span.text.clone()
            }
        })
        .collect()
}

fn line_number(number: Option<usize>) -> String {
    number.map(|n| n.to_string()).unwrap_or_default()
}
