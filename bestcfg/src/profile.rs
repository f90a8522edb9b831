use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, ValueEnum)]
pub enum Preset {
  Postgres,
  Nginx,
  Redis,
}

impl Preset {
  fn yaml(self) -> &'static str {
    match self {
      Preset::Postgres => include_str!("../profiles/postgres.yaml"),
      Preset::Nginx => include_str!("../profiles/nginx.yaml"),
      Preset::Redis => include_str!("../profiles/redis.yaml"),
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
  #[default]
  Maximize,
  Minimize,
}

/// What the goal is applied to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
  #[default]
  Value,
  /// Absolute value, for results where the optimizer stored a negated metric.
  Magnitude,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
  /// The single best row, whether or not its config decodes.
  #[default]
  Best,
  /// Walk rows in rank order and take the first whose config decodes.
  FirstDecodable,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDecodeError {
  #[default]
  Fail,
  /// Write the undecoded text under a `raw_config` key.
  Raw,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
  pub repo_url: String,

  /// Branch to clone. Defaults to the remote's default branch.
  pub branch: Option<String>,

  /// Directory name of the clone under the system temp dir.
  pub cache_name: String,

  /// Overrides the clone location entirely.
  pub cache_dir: Option<PathBuf>,

  /// Glob relative to the clone root.
  pub csv_glob: String,

  /// File name searched for anywhere in the clone if `csv_glob` matches nothing.
  pub fallback_file_name: Option<String>,
}

impl SourceConfig {
  pub fn cache_path(&self) -> PathBuf {
    self
      .cache_dir
      .clone()
      .unwrap_or_else(|| std::env::temp_dir().join(&self.cache_name))
  }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Columns {
  pub fidelity: String,
  pub performance: String,
  pub config: String,
}

fn default_json_out() -> PathBuf {
  PathBuf::from("best_config.json")
}

/// Everything a selector run needs to know. Loaded once and never mutated.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
  pub source: Option<SourceConfig>,

  pub columns: Columns,

  /// Data records to discard directly after the header row.
  #[serde(default)]
  pub skip_rows: usize,

  /// Rows below this fidelity are dropped. No threshold if unset.
  pub min_fidelity: Option<f64>,

  /// Keep only rows at the highest fidelity present after thresholding.
  #[serde(default)]
  pub top_tier_only: bool,

  #[serde(default)]
  pub goal: Goal,

  #[serde(default)]
  pub ranking: Ranking,

  #[serde(default)]
  pub strategy: Strategy,

  #[serde(default)]
  pub on_decode_error: OnDecodeError,

  /// Relative paths are resolved against the output directory.
  #[serde(default = "default_json_out")]
  pub json_out: PathBuf,

  /// Line-oriented `key value` output, e.g. for redis.conf.
  pub conf_out: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ProfileError {
  Read(PathBuf, io::Error),
  Parse(serde_yaml::Error),
}

impl Display for ProfileError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProfileError::Read(path, e) => {
        write!(f, "cannot read profile {}: {e}", path.display())
      }
      ProfileError::Parse(e) => write!(f, "invalid profile: {e}"),
    }
  }
}

impl Error for ProfileError {}

impl Profile {
  pub fn preset(preset: Preset) -> Result<Self, ProfileError> {
    Self::from_yaml(preset.yaml())
  }

  pub fn load(path: &Path) -> Result<Self, ProfileError> {
    let raw = fs::read_to_string(path).map_err(|e| ProfileError::Read(path.to_path_buf(), e))?;
    Self::from_yaml(&raw)
  }

  pub fn from_yaml(raw: &str) -> Result<Self, ProfileError> {
    serde_yaml::from_str(raw).map_err(ProfileError::Parse)
  }

  /// A copy with the fidelity threshold replaced.
  pub fn with_min_fidelity(&self, min_fidelity: f64) -> Self {
    Self {
      min_fidelity: Some(min_fidelity),
      ..self.clone()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_presets_parse() {
    let pg = Profile::preset(Preset::Postgres).unwrap();
    assert_eq!(pg.columns.fidelity, "Worker");
    assert_eq!(pg.skip_rows, 10);
    assert_eq!(pg.min_fidelity, Some(9.0));
    assert_eq!(pg.on_decode_error, OnDecodeError::Fail);
    assert!(pg.conf_out.is_none());

    let nginx = Profile::preset(Preset::Nginx).unwrap();
    assert_eq!(nginx.on_decode_error, OnDecodeError::Raw);
    assert_eq!(nginx.json_out, PathBuf::from("TUNA_best_nginx_config.json"));

    let redis = Profile::preset(Preset::Redis).unwrap();
    assert_eq!(redis.columns.performance, "Reported Value");
    assert_eq!(redis.min_fidelity, None);
    assert!(redis.top_tier_only);
    assert_eq!(redis.ranking, Ranking::Magnitude);
    assert_eq!(redis.strategy, Strategy::FirstDecodable);
    assert_eq!(
      redis.source.as_ref().unwrap().branch.as_deref(),
      Some("development")
    );
  }

  #[test]
  fn test_defaults_and_unknown_fields() {
    let p = Profile::from_yaml(
      "columns: {fidelity: f, performance: p, config: c}\ngoal: minimize\n",
    )
    .unwrap();
    assert_eq!(p.goal, Goal::Minimize);
    assert_eq!(p.skip_rows, 0);
    assert_eq!(p.strategy, Strategy::Best);
    assert_eq!(p.json_out, PathBuf::from("best_config.json"));
    assert!(p.source.is_none());

    let err = Profile::from_yaml("columns: {fidelity: f, performance: p, config: c}\nbogus: 1\n");
    assert!(matches!(err, Err(ProfileError::Parse(_))));
  }

  #[test]
  fn test_cache_path() {
    let mut src = Profile::preset(Preset::Postgres).unwrap().source.unwrap();
    assert_eq!(src.cache_path(), std::env::temp_dir().join("TUNA"));
    src.cache_dir = Some(PathBuf::from("/data/tuna"));
    assert_eq!(src.cache_path(), PathBuf::from("/data/tuna"));
  }

  #[test]
  fn test_min_fidelity_override() {
    let redis = Profile::preset(Preset::Redis).unwrap();
    let p = redis.with_min_fidelity(27.0);
    assert_eq!(p.min_fidelity, Some(27.0));
    assert_eq!(redis.min_fidelity, None);
  }
}
