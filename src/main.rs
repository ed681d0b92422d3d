use clap::{CommandFactory, Parser};
use qrng_choice::qrng::diagnostics::{
    distribution_check, format_distribution, rate_limit_check, DEFAULT_CALLS_PER_STEP,
    DEFAULT_FREQUENCIES, DEFAULT_SAMPLES,
};
use qrng_choice::qrng::settings::SourceSettings;
use qrng_choice::qrng::{
    AnuSource, LocalSource, RandomByteSource, WeightedChooser, DEFAULT_CHOICES, DEFAULT_WEIGHTS,
};
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(author, version, about = "Quantum random choice generator", long_about = None)]
struct Args {
    /// Choices to select from
    #[arg()]
    choices: Vec<String>,

    /// Optional weights for the choices
    #[arg(
        short,
        long,
        num_args = 1..,
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    weights: Vec<f64>,

    /// Run the distribution test
    #[arg(long, conflicts_with = "test_rate_limit")]
    test_distribution: bool,

    /// Run the rate limit test
    #[arg(long)]
    test_rate_limit: bool,

    /// Use a local pseudorandom generator instead of the QRNG service
    #[arg(long)]
    offline: bool,

    /// JSON file with source settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// QRNG endpoint, overriding the config file
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds, overriding the config file
    #[arg(long)]
    timeout: Option<f64>,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", message);
    process::exit(1)
}

fn build_source(args: &Args) -> Box<dyn RandomByteSource> {
    if args.offline {
        log::info!("Using local pseudorandom bytes");
        return Box::new(LocalSource::from_entropy());
    }
    let settings = match &args.config {
        Some(path) => SourceSettings::load(path)
            .unwrap_or_else(|err| fail(format!("{}: {}", path.display(), err))),
        None => SourceSettings::default(),
    };
    let settings = settings
        .with_overrides(args.endpoint.clone(), args.timeout)
        .unwrap_or_else(|err| fail(err));
    log::debug!("Source settings: {:?}", settings);
    match AnuSource::new(&settings) {
        Ok(source) => Box::new(source),
        Err(err) => fail(err),
    }
}

/// Fills in default choices and weights. Weights given without choices are dropped.
fn resolve_args(choices: &[String], weights: &[f64]) -> Result<(Vec<String>, Vec<f64>), String> {
    if choices.is_empty() {
        return Ok((
            DEFAULT_CHOICES.iter().map(|c| c.to_string()).collect(),
            DEFAULT_WEIGHTS.to_vec(),
        ));
    }
    if weights.is_empty() {
        return Ok((choices.to_vec(), vec![1.0; choices.len()]));
    }
    if weights.len() != choices.len() {
        return Err("Number of weights must match number of choices".to_string());
    }
    Ok((choices.to_vec(), weights.to_vec()))
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let mut chooser = WeightedChooser::new(build_source(&args));

    if args.test_distribution {
        let rows = distribution_check(
            &mut chooser,
            &DEFAULT_CHOICES,
            Some(&DEFAULT_WEIGHTS),
            DEFAULT_SAMPLES,
        )
        .unwrap_or_else(|err| fail(err));
        println!("\nDistribution test results:");
        print!("{}", format_distribution(&rows));
    } else if args.test_rate_limit {
        rate_limit_check(
            &mut chooser,
            &DEFAULT_FREQUENCIES,
            DEFAULT_CALLS_PER_STEP,
            |step| {
                println!(
                    "[{}] Made {} calls per second",
                    step.finished_at.format("%H:%M:%S"),
                    step.frequency
                )
            },
        )
        .unwrap_or_else(|err| fail(err));
    } else {
        let (choices, weights) = resolve_args(&args.choices, &args.weights).unwrap_or_else(|err| {
            Args::command()
                .error(clap::error::ErrorKind::WrongNumberOfValues, err)
                .exit()
        });
        match chooser.choose(&choices, Some(weights.as_slice())) {
            Ok(choice) => println!("{}", choice),
            Err(err) => fail(err),
        }
    }
}
