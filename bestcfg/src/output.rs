use crate::literal::float_text;
use crate::literal::ConfigValue;
use crate::literal::SelectedConfig;
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;

/// What gets written for the selected row.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Payload {
  Decoded(SelectedConfig),
  /// Best-effort fallback when the config text could not be decoded.
  Raw { raw_config: String },
}

/// Pretty, key-sorted JSON with a trailing newline.
pub fn render_json(payload: &Payload) -> serde_json::Result<String> {
  let mut out = serde_json::to_string_pretty(payload)?;
  out.push('\n');
  Ok(out)
}

fn conf_value(value: &ConfigValue) -> String {
  match value {
    ConfigValue::Null => String::new(),
    ConfigValue::Bool(true) => "yes".to_string(),
    ConfigValue::Bool(false) => "no".to_string(),
    ConfigValue::Int(v) => v.to_string(),
    ConfigValue::Float(v) => float_text(*v),
    ConfigValue::Str(v) => v.clone(),
    // Multi-argument directives such as `save 900 1`.
    ConfigValue::List(items) => items.iter().map(conf_value).join(" "),
    ConfigValue::Map(entries) => entries
      .iter()
      .map(|(k, v)| format!("{} {}", k, conf_value(v)))
      .join(" "),
  }
}

/// One `key value` line per entry, in the order the config was written.
pub fn render_conf(config: &SelectedConfig) -> String {
  let mut out = String::new();
  for (key, value) in config.iter() {
    out.push_str(key);
    out.push(' ');
    out.push_str(&conf_value(value));
    out.push('\n');
  }
  out
}

pub fn write_output(path: &Path, contents: &str) -> io::Result<()> {
  fs::write(path, contents)?;
  info!(path = %path.display(), bytes = contents.len(), "wrote output file");
  Ok(())
}

/// Console report for the winning row.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
  pub fidelity_label: String,
  pub fidelity: f64,
  pub performance_label: String,
  pub performance: f64,
  pub source: PathBuf,
}

impl Summary {
  /// Reports `source` relative to `root` when it lives under it.
  pub fn relative_source(source: &Path, root: Option<&Path>) -> PathBuf {
    root
      .and_then(|root| source.strip_prefix(root).ok())
      .unwrap_or(source)
      .to_path_buf()
  }
}

impl Display for Summary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let width = self.fidelity_label.len().max(self.performance_label.len()).max(6);
    writeln!(f, "{:<width$} : {}", self.fidelity_label, self.fidelity)?;
    writeln!(f, "{:<width$} : {}", self.performance_label, self.performance)?;
    writeln!(f, "{:<width$} : {}", "Source", self.source.display())
  }
}
