use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;

use flipper_cli::analysis::config::AnalysisConfig;
use flipper_cli::analysis::report::write_report;
use flipper_cli::analysis::run::run_analysis;
use flipper_cli::analysis::summary::write_json_summary;
use flipper_cli::cli::build_cli;
use flipper_cli::util::validate_csv_file;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("FLIPPER_LOG", "error,flipper=info"))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("analyze", sub_m)) => handle_analyze(sub_m),
        Some(("config", _)) => handle_config(),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_analyze(matches: &ArgMatches) -> Result<()> {
    let data_path: &PathBuf = matches
        .get_one("data")
        .ok_or_else(|| anyhow::anyhow!("Missing data file argument"))?;
    log::info!("[flipper::analyze] Analyzing: {:?}", data_path);

    if let Err(e) = validate_csv_file(data_path) {
        log::error!("{:#}", e);
        std::process::exit(1)
    }
    let config = AnalysisConfig::from_arguments(matches.get_one::<PathBuf>("config"), matches)?;

    let analysis = match run_analysis(data_path, &config) {
        Ok(analysis) => analysis,
        Err(e) => {
            log::error!("Analysis failed: {:#}", e);
            std::process::exit(1)
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &analysis)?;
    out.flush()?;

    if let Some(json_path) = &config.json_output {
        write_json_summary(&analysis, json_path)?;
    }
    Ok(())
}

fn handle_config() -> Result<()> {
    let json = serde_json::to_string_pretty(&AnalysisConfig::default())?;
    println!("{}", json);
    Ok(())
}
