use clap::{Arg, ArgAction, Command, ValueHint};
use std::path::PathBuf;

/// Fraction strictly between 0 and 1.
fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("test fraction must be in (0, 1), got {}", value))
    }
}

pub fn build_cli() -> Command {
    Command::new("flipper")
        .version(clap::crate_version!())
        .about("\u{1F427} flipper - Penguin species classification and flipper length analysis")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("analyze")
                .about("Run the full analysis on a palmerpenguins CSV file")
                .arg(
                    Arg::new("data")
                        .help("Path to the penguins CSV file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("config")
                        .help("Path to analysis JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("test_fraction")
                        .long("test-fraction")
                        .help("Fraction of each species held out for testing. Overrides the config file.")
                        .value_parser(parse_fraction),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the split and the models. Overrides the config file.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .help("Train the models one after another instead of in parallel.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Also write a JSON summary to this path.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("config").about("Print the default analysis configuration as JSON"),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}
