mod args;
mod dash;

use std::io::{self, BufRead, Write};

use clap::Parser;
use log::{info, warn};
use snafu::{ErrorCompat, ResultExt};

use crate::args::Args;
use crate::dash::*;

fn config_from_args(args: &Args) -> DashResult<DashConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => DashConfig::default(),
    };
    if let Some(input) = &args.input {
        config.file_path = Some(input.clone());
    }
    if let Some(input_type) = &args.input_type {
        config.provider = Some(input_type.clone());
    }
    if let Some(name) = &args.excel_worksheet_name {
        config.excel_worksheet_name = Some(name.clone());
    }
    Ok(config)
}

fn print_choices<W: Write>(config: &DashConfig, output: &mut W) -> io::Result<()> {
    writeln!(output, "Sélectionnez une catégorie à analyser:")?;
    for (idx, c) in config.category_columns().iter().enumerate() {
        writeln!(output, "  {}. {} ({})", idx + 1, c.label, c.column)?;
    }
    write!(output, "> ")?;
    output.flush()
}

// Every line read is a new selection, rendered from the same dataset.
// Returns the number of selections that were rendered.
fn run_interactive<R: BufRead, W: Write>(
    session: &Session,
    out: Option<&str>,
    mut input: R,
    output: &mut W,
) -> DashResult<usize> {
    let mut rendered = 0;
    loop {
        print_choices(&session.config, output).context(WritingPromptSnafu {})?;

        let mut line = String::new();
        let num_read = input
            .read_line(&mut line)
            .context(ReadingSelectionSnafu {})?;
        let line = line.trim();
        if num_read == 0 || line.is_empty() || line == "q" {
            info!("run_interactive: done after {} selections", rendered);
            return Ok(rendered);
        }
        let column = match resolve_choice(&session.config, line) {
            Some(c) => c,
            None => {
                writeln!(output, "Unknown choice: {:?}", line).context(WritingPromptSnafu {})?;
                continue;
            }
        };
        match run_selection(session, &column, out, None) {
            Ok(_) => rendered += 1,
            Err(e) => {
                warn!("run_interactive: selection {:?} failed: {:?}", column, e);
                writeln!(output, "{}", e).context(WritingPromptSnafu {})?;
            }
        }
    }
}

fn run(args: &Args) -> DashResult<()> {
    let config = config_from_args(args)?;
    info!("config: {:?}", config);
    let session = load_session(config)?;
    match &args.column {
        Some(column) => {
            run_selection(
                &session,
                column,
                args.out.as_deref(),
                args.reference.as_deref(),
            )?;
            Ok(())
        }
        None => {
            let stdin = io::stdin();
            let mut stderr = io::stderr();
            run_interactive(&session, args.out.as_deref(), stdin.lock(), &mut stderr)?;
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Err(e) = run(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
