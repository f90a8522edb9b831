use crate::profile::Columns;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;

/// One evaluated trial. Never mutated after loading.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
  pub fidelity: f64,
  pub performance: f64,
  /// Undecoded config text.
  pub config: String,
  pub source: PathBuf,
}

#[derive(Debug)]
pub enum LoadError {
  Open(io::Error),
  Csv(csv::Error),
  MissingColumns(Vec<String>),
}

impl Display for LoadError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LoadError::Open(e) => write!(f, "cannot open file: {e}"),
      LoadError::Csv(e) => write!(f, "cannot parse table: {e}"),
      LoadError::MissingColumns(cols) => write!(f, "missing columns {}", cols.join(", ")),
    }
  }
}

impl Error for LoadError {}

impl From<csv::Error> for LoadError {
  fn from(e: csv::Error) -> Self {
    LoadError::Csv(e)
  }
}

#[derive(Debug, Default)]
pub struct LoadedTable {
  pub rows: Vec<ResultRow>,
  /// Records dropped because fidelity or performance was not a finite number.
  pub non_numeric: usize,
}

fn parse_number(cell: Option<&str>) -> Option<f64> {
  cell?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads a results table. `skip_rows` data records directly after the header are discarded before anything is interpreted.
pub fn load_rows<R: io::Read>(
  reader: R,
  source: &Path,
  columns: &Columns,
  skip_rows: usize,
) -> Result<LoadedTable, LoadError> {
  let mut rdr = csv::ReaderBuilder::new()
    .flexible(true)
    .from_reader(reader);
  let headers = rdr.headers()?.clone();
  let find = |name: &str| headers.iter().position(|h| h.trim() == name);

  let wanted = [&columns.fidelity, &columns.performance, &columns.config];
  let missing: Vec<String> = wanted
    .iter()
    .filter(|c| find(c).is_none())
    .map(|c| c.to_string())
    .collect();
  let (Some(fidelity_idx), Some(performance_idx), Some(config_idx)) = (
    find(&columns.fidelity),
    find(&columns.performance),
    find(&columns.config),
  ) else {
    return Err(LoadError::MissingColumns(missing));
  };

  let mut table = LoadedTable::default();
  for (i, record) in rdr.records().skip(skip_rows).enumerate() {
    let record = record?;
    let (Some(fidelity), Some(performance)) = (
      parse_number(record.get(fidelity_idx)),
      parse_number(record.get(performance_idx)),
    ) else {
      debug!(
        source = %source.display(),
        record = i + skip_rows,
        "skipping record without numeric fidelity and performance"
      );
      table.non_numeric += 1;
      continue;
    };
    table.rows.push(ResultRow {
      fidelity,
      performance,
      config: record.get(config_idx).unwrap_or_default().to_string(),
      source: source.to_path_buf(),
    });
  }
  Ok(table)
}

pub fn load_file(path: &Path, columns: &Columns, skip_rows: usize) -> Result<LoadedTable, LoadError> {
  let file = File::open(path).map_err(LoadError::Open)?;
  load_rows(file, path, columns, skip_rows)
}
