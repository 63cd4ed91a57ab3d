/*!
 * Command-line interface for ai-digest
 */

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;

use ai_digest::config::{AggregationRequest, Cli, Command, ConfigAction, DigestArgs};
use ai_digest::processor::Processor;
use ai_digest::report::{DigestReport, Reporter};
use ai_digest::settings::SettingsManager;

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Command::Digest(args) => run_digest(args, cli.quiet),
        Command::Config { config, action } => run_config(SettingsManager::new(config), action),
        Command::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "ai-digest exited with error");
    }
    result
}

fn run_digest(args: DigestArgs, quiet: bool) -> io::Result<()> {
    let settings = SettingsManager::new(args.config.clone()).load()?;
    let request = AggregationRequest::from_args(args, &settings)?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let progress = ProgressBar::new(0);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.enable_steady_tick(Duration::from_millis(100));
        progress
    };
    progress.set_prefix("📊 Processing");
    progress.set_message(format!(
        "📂 Scanning directory: {}",
        request.input_dir.display()
    ));

    let output_file = request.output_file.display().to_string();
    let split = request.mode.is_split();
    let show_output_files = request.show_output_files;
    let ignore_file = request.ignore_file.clone();

    let start_time = Instant::now();
    let outcome = Processor::new(request, Arc::new(progress.clone()))
        .and_then(|processor| processor.run());
    progress.finish_and_clear();
    let outcome = outcome?;

    if !quiet {
        let report = DigestReport {
            output_file,
            duration: start_time.elapsed(),
            stats: outcome.stats,
            split,
            show_output_files,
            ignore_file,
        };
        Reporter::new().print_report(&report);
    }

    Ok(())
}

fn run_config(manager: SettingsManager, action: ConfigAction) -> io::Result<()> {
    match action {
        ConfigAction::Show => {
            if !manager.exists() {
                println!("No configuration file found. Using default settings:");
            }
            println!("{}", manager.show()?);
        }
        ConfigAction::Init => {
            manager.init()?;
            let path = manager
                .path()
                .canonicalize()
                .unwrap_or_else(|_| manager.path().to_path_buf());
            println!("Created config file: {}", path.display());
            println!("You can now modify this file or use 'ai-digest config show' to view it");
        }
    }
    Ok(())
}
