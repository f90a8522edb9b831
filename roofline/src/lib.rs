use ahash::HashMap;
use ahash::HashMapExt;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;

/*

# Instruction roofline

The summary table is a two-column `metric,value` CSV produced from hardware counters. Bandwidth roofs are in MBytes/s; the app point is in instructions/byte and instructions/second. Each bandwidth roof is the line `y = x * B`, capped by the compute ceiling when one was estimated. The knee of a roof is where it meets the ceiling.

*/

pub const ROOF_METRICS: [(&str, &str); 4] = [
  ("roof_L1", "L1"),
  ("roof_L2", "L2"),
  ("roof_L3", "L3"),
  ("roof_MEM", "MEM"),
];
pub const APP_X_METRIC: &str = "app_instr_per_byte";
pub const APP_Y_METRIC: &str = "app_instr_per_sec";
pub const COMPUTE_METRIC: &str = "roof_compute_instr_per_sec_est";
pub const COMPUTE_LABEL: &str = "Compute roof (instr/s est)";
pub const DEFAULT_TITLE: &str = "Instruction Roofline (PostgreSQL + BenchBase)";
pub const DEFAULT_APP_LABEL: &str = "PostgreSQL (tpcc)";
pub const DEFAULT_SAMPLES: usize = 256;

#[derive(Debug)]
pub enum RooflineError {
  Csv(csv::Error),
  MissingColumn(&'static str),
  InvalidValue { metric: String, value: String },
  MissingAppPoint,
  InvalidAppPoint { x: f64, y: f64 },
  NoRoofs,
}

impl Display for RooflineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RooflineError::Csv(e) => write!(f, "cannot read or write CSV: {e}"),
      RooflineError::MissingColumn(c) => write!(f, "summary has no {c} column"),
      RooflineError::InvalidValue { metric, value } => {
        write!(f, "metric {metric} has non-numeric value {value:?}")
      }
      RooflineError::MissingAppPoint => write!(
        f,
        "missing app point ({APP_X_METRIC} or {APP_Y_METRIC}) in summary"
      ),
      RooflineError::InvalidAppPoint { x, y } => write!(
        f,
        "app point ({x}, {y}) is not plottable; {APP_X_METRIC} must be positive and both values finite"
      ),
      RooflineError::NoRoofs => write!(f, "no roofs found in summary (roof_L1/roof_L2/roof_L3/roof_MEM)"),
    }
  }
}

impl Error for RooflineError {}

impl From<csv::Error> for RooflineError {
  fn from(e: csv::Error) -> Self {
    RooflineError::Csv(e)
  }
}

/// Metric name to value. Metrics listed with an empty value map to `None`.
#[derive(Debug, Default)]
pub struct MetricSummary {
  metrics: HashMap<String, Option<f64>>,
}

impl MetricSummary {
  pub fn read<R: io::Read>(reader: R) -> Result<Self, RooflineError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let metric_idx = headers
      .iter()
      .position(|h| h.trim() == "metric")
      .ok_or(RooflineError::MissingColumn("metric"))?;
    let value_idx = headers
      .iter()
      .position(|h| h.trim() == "value")
      .ok_or(RooflineError::MissingColumn("value"))?;

    let mut metrics = HashMap::new();
    for record in rdr.records() {
      let record = record?;
      let metric = record.get(metric_idx).unwrap_or_default().trim().to_string();
      let raw = record.get(value_idx).unwrap_or_default().trim();
      let value = if raw.is_empty() {
        None
      } else {
        Some(raw.parse::<f64>().map_err(|_| RooflineError::InvalidValue {
          metric: metric.clone(),
          value: raw.to_string(),
        })?)
      };
      metrics.insert(metric, value);
    }
    Ok(Self { metrics })
  }

  pub fn get(&self, metric: &str) -> Option<f64> {
    self.metrics.get(metric).copied().flatten()
  }
}

pub fn mbytes_to_bytes(mbytes_per_sec: f64) -> f64 {
  mbytes_per_sec * 1024.0 * 1024.0
}

/// `n` log-spaced values from `x0` to `x1` inclusive.
pub fn logspace(x0: f64, x1: f64, n: usize) -> Vec<f64> {
  if n < 2 {
    return vec![x0];
  };
  let (l0, l1) = (x0.log10(), x1.log10());
  let step = (l1 - l0) / (n - 1) as f64;
  (0..n).map(|i| 10f64.powf(l0 + i as f64 * step)).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Roof {
  pub label: &'static str,
  pub bytes_per_sec: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Series {
  pub label: String,
  pub points: Vec<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RooflineModel {
  pub app_x: f64,
  pub app_y: f64,
  /// Ascending by bandwidth.
  pub roofs: Vec<Roof>,
  pub compute: Option<f64>,
}

impl RooflineModel {
  pub fn from_summary(summary: &MetricSummary) -> Result<Self, RooflineError> {
    let (Some(app_x), Some(app_y)) = (summary.get(APP_X_METRIC), summary.get(APP_Y_METRIC)) else {
      return Err(RooflineError::MissingAppPoint);
    };
    if !(app_x.is_finite() && app_x > 0.0 && app_y.is_finite()) {
      return Err(RooflineError::InvalidAppPoint { x: app_x, y: app_y });
    };
    let mut roofs: Vec<Roof> = ROOF_METRICS
      .iter()
      .filter_map(|(metric, label)| {
        let v = summary.get(metric).filter(|v| *v > 0.0)?;
        Some(Roof {
          label: *label,
          bytes_per_sec: mbytes_to_bytes(v),
        })
      })
      .collect();
    if roofs.is_empty() {
      return Err(RooflineError::NoRoofs);
    };
    roofs.sort_by(|a, b| a.bytes_per_sec.total_cmp(&b.bytes_per_sec));
    Ok(Self {
      app_x,
      app_y,
      roofs,
      compute: summary.get(COMPUTE_METRIC).filter(|v| *v > 0.0),
    })
  }

  /// Operational intensity at which each roof meets the compute ceiling.
  pub fn knees(&self) -> Vec<f64> {
    match self.compute {
      Some(c) => self.roofs.iter().map(|r| c / r.bytes_per_sec).collect(),
      None => Vec::new(),
    }
  }

  /// Covers the app point and every knee with a decade of margin.
  pub fn x_range(&self) -> (f64, f64) {
    let knees = self.knees();
    let lo = knees.iter().copied().fold(self.app_x, f64::min);
    let hi = knees.iter().copied().fold(self.app_x, f64::max);
    ((lo / 10.0).max(1e-3), hi * 10.0)
  }

  fn performance_at(&self, roof: &Roof, x: f64) -> f64 {
    let y = x * roof.bytes_per_sec;
    match self.compute {
      Some(c) => y.min(c),
      None => y,
    }
  }

  /// Plot-ready lines: one per bandwidth roof, then the compute ceiling from the lowest knee onwards.
  pub fn series(&self, samples: usize) -> Vec<Series> {
    let (x_min, x_max) = self.x_range();
    let xs = logspace(x_min, x_max, samples);
    let mut out: Vec<Series> = self
      .roofs
      .iter()
      .map(|roof| Series {
        label: format!("{} roof", roof.label),
        points: xs.iter().map(|&x| (x, self.performance_at(roof, x))).collect(),
      })
      .collect();
    if let (Some(c), Some(start)) = (
      self.compute,
      self.knees().into_iter().reduce(f64::min),
    ) {
      let points: Vec<_> = xs.iter().filter(|&&x| x >= start).map(|&x| (x, c)).collect();
      if !points.is_empty() {
        out.push(Series {
          label: COMPUTE_LABEL.to_string(),
          points,
        });
      };
    };
    out
  }
}

#[derive(Serialize)]
struct SeriesPoint<'a> {
  series: &'a str,
  x: f64,
  y: f64,
}

/// Long-format `series,x,y` rows: every sample of every series, then the app point under `app_label`.
pub fn write_series<W: io::Write>(
  out: W,
  model: &RooflineModel,
  series: &[Series],
  app_label: &str,
) -> Result<usize, RooflineError> {
  let mut wtr = csv::Writer::from_writer(out);
  let mut rows = 0;
  for s in series {
    for &(x, y) in &s.points {
      wtr.serialize(SeriesPoint {
        series: &s.label,
        x,
        y,
      })?;
      rows += 1;
    }
  }
  wtr.serialize(SeriesPoint {
    series: app_label,
    x: model.app_x,
    y: model.app_y,
  })?;
  wtr.flush().map_err(|e| RooflineError::Csv(e.into()))?;
  Ok(rows + 1)
}

/// Rendering hints for whatever plots the series file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSpec {
  pub title: String,
  pub x_label: String,
  pub y_label: String,
  pub log_x: bool,
  pub log_y: bool,
  pub x_range: (f64, f64),
  pub app_label: String,
  pub series_file: String,
}

impl ChartSpec {
  pub fn new(model: &RooflineModel, title: &str, app_label: &str, series_file: &str) -> Self {
    Self {
      title: title.to_string(),
      x_label: "Operational intensity (instructions / byte)".to_string(),
      y_label: "Performance (instructions / second)".to_string(),
      log_x: true,
      log_y: true,
      x_range: model.x_range(),
      app_label: app_label.to_string(),
      series_file: series_file.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SUMMARY: &str = "metric,value
app_instr_per_byte,2.0
app_instr_per_sec,1e9
roof_L1,1000
roof_L2, 500
roof_L3,
roof_MEM,100
roof_compute_instr_per_sec_est,1048576000
";

  fn model() -> RooflineModel {
    RooflineModel::from_summary(&MetricSummary::read(SUMMARY.as_bytes()).unwrap()).unwrap()
  }

  #[test]
  fn test_read_summary() {
    let s = MetricSummary::read(SUMMARY.as_bytes()).unwrap();
    assert_eq!(s.get("roof_L2"), Some(500.0));
    assert_eq!(s.get("roof_L3"), None);
    assert_eq!(s.get("unknown"), None);
  }

  #[test]
  fn test_invalid_value() {
    let err = MetricSummary::read("metric,value\nroof_L1,fast\n".as_bytes()).unwrap_err();
    assert!(matches!(err, RooflineError::InvalidValue { ref metric, .. } if metric == "roof_L1"));
    let err = MetricSummary::read("name,value\nroof_L1,1\n".as_bytes()).unwrap_err();
    assert!(matches!(err, RooflineError::MissingColumn("metric")));
  }

  #[test]
  fn test_roofs_sorted_and_converted() {
    let m = model();
    let labels: Vec<_> = m.roofs.iter().map(|r| r.label).collect();
    assert_eq!(labels, vec!["MEM", "L2", "L1"]);
    assert_eq!(m.roofs[0].bytes_per_sec, 100.0 * 1024.0 * 1024.0);
    assert_eq!(m.compute, Some(1048576000.0));
  }

  #[test]
  fn test_knees_and_range() {
    let m = model();
    // compute = 1000 MiB/s worth of instructions, so knees are 1000 / roof MB/s.
    assert_eq!(m.knees(), vec![10.0, 2.0, 1.0]);
    let (lo, hi) = m.x_range();
    assert!((lo - 0.1).abs() < 1e-12);
    assert!((hi - 100.0).abs() < 1e-9);
  }

  #[test]
  fn test_series_clipped_at_compute() {
    let m = model();
    let series = m.series(64);
    assert_eq!(series.len(), 4);
    assert_eq!(series[3].label, COMPUTE_LABEL);
    for s in &series[..3] {
      assert_eq!(s.points.len(), 64);
      assert!(s.points.iter().all(|(_, y)| *y <= 1048576000.0));
    }
    assert!(series[3].points.iter().all(|(x, _)| *x >= 1.0));
  }

  #[test]
  fn test_no_compute_ceiling() {
    let summary = MetricSummary::read(
      "metric,value\napp_instr_per_byte,0.5\napp_instr_per_sec,10\nroof_MEM,1\n".as_bytes(),
    )
    .unwrap();
    let m = RooflineModel::from_summary(&summary).unwrap();
    assert!(m.knees().is_empty());
    let (lo, hi) = m.x_range();
    assert!((lo - 0.05).abs() < 1e-12);
    assert!((hi - 5.0).abs() < 1e-12);
    let series = m.series(8);
    assert_eq!(series.len(), 1);
    let (x, y) = series[0].points[0];
    assert!((y - x * 1024.0 * 1024.0).abs() < 1e-6);
  }

  #[test]
  fn test_missing_inputs() {
    let no_app = MetricSummary::read("metric,value\nroof_MEM,1\n".as_bytes()).unwrap();
    assert!(matches!(
      RooflineModel::from_summary(&no_app),
      Err(RooflineError::MissingAppPoint)
    ));
    let no_roofs = MetricSummary::read(
      "metric,value\napp_instr_per_byte,1\napp_instr_per_sec,1\nroof_MEM,0\n".as_bytes(),
    )
    .unwrap();
    assert!(matches!(
      RooflineModel::from_summary(&no_roofs),
      Err(RooflineError::NoRoofs)
    ));
  }

  #[test]
  fn test_write_series() {
    let m = model();
    let series = m.series(4);
    let mut buf = Vec::new();
    let rows = write_series(&mut buf, &m, &series, DEFAULT_APP_LABEL).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "series,x,y");
    assert_eq!(lines.len(), rows + 1);
    assert!(lines[1].starts_with("MEM roof,"));
    assert_eq!(*lines.last().unwrap(), "PostgreSQL (tpcc),2.0,1000000000.0");
  }

  #[test]
  fn test_chart_spec() {
    let m = model();
    let spec = ChartSpec::new(&m, DEFAULT_TITLE, DEFAULT_APP_LABEL, "series.csv");
    let json = serde_json::to_value(&spec).unwrap();
    assert_eq!(json["log_x"], true);
    assert_eq!(json["title"], DEFAULT_TITLE);
    assert_eq!(json["series_file"], "series.csv");
  }

  #[test]
  fn test_invalid_app_point() {
    for (x, y) in [("0", "1e9"), ("-2", "1e9"), ("nan", "1e9"), ("inf", "1e9"), ("2", "nan")] {
      let summary = MetricSummary::read(
        format!("metric,value\napp_instr_per_byte,{x}\napp_instr_per_sec,{y}\nroof_MEM,100\n").as_bytes(),
      )
      .unwrap();
      assert!(
        matches!(
          RooflineModel::from_summary(&summary),
          Err(RooflineError::InvalidAppPoint { .. })
        ),
        "accepted app point ({x}, {y})"
      );
    }
  }

  #[test]
  fn test_logspace() {
    let xs = logspace(0.01, 100.0, 5);
    let expected = [0.01, 0.1, 1.0, 10.0, 100.0];
    for (x, e) in xs.iter().zip(expected) {
      assert!((x / e - 1.0).abs() < 1e-12);
    }
    assert_eq!(logspace(3.0, 30.0, 1), vec![3.0]);
  }
}
