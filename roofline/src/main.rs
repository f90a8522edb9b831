use clap::Parser;
use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tuna_roofline::write_series;
use tuna_roofline::ChartSpec;
use tuna_roofline::MetricSummary;
use tuna_roofline::RooflineModel;
use tuna_roofline::DEFAULT_APP_LABEL;
use tuna_roofline::DEFAULT_SAMPLES;
use tuna_roofline::DEFAULT_TITLE;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
  /// `metric,value` summary CSV.
  summary: PathBuf,

  /// Series CSV to write. The chart sidecar goes next to it with a `.json` extension.
  #[arg(short, long, default_value = "roofline_series.csv")]
  out: PathBuf,

  #[arg(long, default_value_t = DEFAULT_SAMPLES)]
  samples: usize,

  #[arg(long, default_value = DEFAULT_APP_LABEL)]
  app_label: String,

  #[arg(long, default_value = DEFAULT_TITLE)]
  title: String,
}

fn exec(cli: &Cli) -> Result<(), Box<dyn Error>> {
  let summary = MetricSummary::read(
    File::open(&cli.summary).map_err(|e| format!("cannot open {}: {e}", cli.summary.display()))?,
  )?;
  let model = RooflineModel::from_summary(&summary)?;
  let (x_min, x_max) = model.x_range();
  info!(
    roofs = model.roofs.len(),
    compute = ?model.compute,
    app_x = model.app_x,
    app_y = model.app_y,
    x_min,
    x_max,
    "built roofline model"
  );

  let series = model.series(cli.samples.max(2));
  let rows = write_series(
    BufWriter::new(File::create(&cli.out)?),
    &model,
    &series,
    &cli.app_label,
  )?;
  info!(path = %cli.out.display(), rows, "wrote series");

  let sidecar = cli.out.with_extension("json");
  let spec = ChartSpec::new(
    &model,
    &cli.title,
    &cli.app_label,
    &cli.out.file_name().unwrap_or_default().to_string_lossy(),
  );
  let mut json = serde_json::to_string_pretty(&spec)?;
  json.push('\n');
  fs::write(&sidecar, json)?;
  info!(path = %sidecar.display(), "wrote chart spec");
  Ok(())
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  match exec(&cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  }
}
