use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tuna_bestcfg::error::SelectResult;
use tuna_bestcfg::fetch::local_inputs;
use tuna_bestcfg::fetch::remote_inputs;
use tuna_bestcfg::fetch::Inputs;
use tuna_bestcfg::pipeline::Report;
use tuna_bestcfg::profile::Preset;
use tuna_bestcfg::run;
use tuna_bestcfg::Profile;
use tuna_bestcfg::SelectError;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
  /// Built-in profile for the target system.
  #[arg(long, value_enum, default_value_t = Preset::Postgres)]
  profile: Preset,

  /// YAML profile to use instead of a built-in one.
  #[arg(long, conflicts_with = "profile")]
  profile_file: Option<PathBuf>,

  /// Results file or glob. Skips fetching the source repository.
  #[arg(long)]
  csv: Option<String>,

  /// Minimum fidelity a row needs to be considered (overrides profile).
  #[arg(long)]
  min_fidelity: Option<f64>,

  /// Directory for output files.
  #[arg(long, default_value = ".")]
  out_dir: PathBuf,
}

fn load_profile(cli: &Cli) -> SelectResult<Profile> {
  let profile = match &cli.profile_file {
    Some(path) => Profile::load(path)?,
    None => Profile::preset(cli.profile)?,
  };
  Ok(match cli.min_fidelity {
    Some(min) => profile.with_min_fidelity(min),
    None => profile,
  })
}

fn resolve_inputs(cli: &Cli, profile: &Profile) -> SelectResult<Inputs> {
  let inputs = match (&cli.csv, &profile.source) {
    (Some(csv), _) => local_inputs(csv)?,
    (None, Some(source)) => remote_inputs(source)?,
    (None, None) => return Err(SelectError::NoSource),
  };
  Ok(inputs)
}

fn exec(cli: &Cli) -> SelectResult<Report> {
  let profile = load_profile(cli)?;
  let inputs = resolve_inputs(cli, &profile)?;
  run(&profile, &inputs, &cli.out_dir)
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  match exec(&cli) {
    Ok(report) => {
      for path in &report.written {
        info!(path = %path.display(), "best configuration written");
      }
      print!("{}", report.summary);
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  }
}
