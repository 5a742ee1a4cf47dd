use anyhow::Context;
use pipesh::io_adapters::{BufReadLines, EditorLines};
use pipesh::{Config, Interpreter};
use std::io;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config: Config = argh::from_env();
    init_logging(config.verbose);

    let mut interpreter = Interpreter::new(&config);
    if config.use_editor() {
        let mut lines = EditorLines::new(config.history.clone()).context("cannot start line editor")?;
        interpreter.repl(&mut lines);
        if let Err(err) = lines.save_history() {
            warn!(%err, "cannot save history");
        }
    } else {
        let mut lines = BufReadLines::new(io::stdin().lock(), io::stdout());
        interpreter.repl(&mut lines);
    }
    Ok(())
}

/// `--verbose` forces debug output; otherwise `RUST_LOG` decides, defaulting to warnings.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
