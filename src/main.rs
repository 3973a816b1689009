use {
    anyhow::{Context, Result},
    clap::Parser,
    sentiment_move::{
        CALIBRATION, Cli, Command, PERSISTENCE, ReportArgs, RunConfig, StageIo,
        analysis::{ConvictionFilter, TickerMatcher},
        data::save_confusion,
        engine::{
            CalibrationOutcome, CalibrationSummary, Pipeline, annotate, calibrate_table,
            print_report, read_table, write_table,
        },
    },
    std::{
        panic,
        path::{Path, PathBuf},
    },
};

fn init_log() {
    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Info)
    };

    let mut builder = env_logger::Builder::new();

    builder
        .filter(None, global_level)
        .filter(Some("sentiment_move"), my_code_level)
        // RUST_LOG wins over the defaults above
        .parse_default_env()
        .init();
}

/// `<output dir>/<name>` unless the user gave an explicit path.
fn artifact_path(explicit: Option<&PathBuf>, output: &Path, name: &str) -> PathBuf {
    explicit.cloned().unwrap_or_else(|| {
        output
            .parent()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    })
}

fn write_calibration(
    outcome: &CalibrationOutcome,
    config: &RunConfig,
    io: &StageIo,
    report: &ReportArgs,
) -> Result<()> {
    write_table(&outcome.table, &io.output)?;
    print_report(&outcome.result, &outcome.evaluation);

    let confusion_path = artifact_path(
        report.confusion.as_ref(),
        &io.output,
        PERSISTENCE.artifacts.confusion_matrix,
    );
    save_confusion(&outcome.evaluation.matrix, &confusion_path)?;
    log::info!("Saved confusion matrix to {:?}", confusion_path);

    let summary_path = artifact_path(
        report.summary.as_ref(),
        &io.output,
        PERSISTENCE.artifacts.calibration_summary,
    );
    CalibrationSummary::new(config, &outcome.result, &outcome.evaluation).save(&summary_path)?;
    log::info!("Saved calibration summary to {:?}", summary_path);
    Ok(())
}

async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::PriceMoves { io, window } => {
            let config = window.apply(RunConfig::default())?;
            let pipeline = Pipeline::with_yahoo(config)?;
            let table = pipeline.price_moves(read_table(&io.input)?).await?;
            write_table(&table, &io.output)
        }
        Command::Calibrate { io, report } => {
            let config = report.apply(RunConfig::default())?;
            let outcome = calibrate_table(&config, read_table(&io.input)?)?;
            write_calibration(&outcome, &config, &io, &report)
        }
        Command::Run { io, window, report } => {
            let config = report.apply(window.apply(RunConfig::default())?)?;
            let pipeline = Pipeline::with_yahoo(config.clone())?;
            let outcome = pipeline.run(read_table(&io.input)?).await?;
            write_calibration(&outcome, &config, &io, &report)
        }
        Command::MatchTickers {
            io,
            stocks,
            bear_min,
            bull_min,
        } => {
            let matcher = TickerMatcher::load(&stocks)
                .with_context(|| format!("Failed to load stock table {:?}", stocks))?;
            let mut filter = ConvictionFilter::from(&CALIBRATION.conviction);
            filter.bear_min = bear_min.unwrap_or(filter.bear_min);
            filter.bull_min = bull_min.unwrap_or(filter.bull_min);
            let table = annotate(
                read_table(&io.input)?,
                &matcher,
                filter,
                CALIBRATION.input.sum_tolerance,
            )?;
            write_table(&table, &io.output)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    init_log();

    let args = Cli::parse();
    if let Err(e) = dispatch(args.command).await {
        log::error!("Fatal: {:#}", e);
        return Err(e);
    }
    Ok(())
}
