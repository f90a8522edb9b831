use crate::profile::SourceConfig;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use tracing::info;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug)]
pub enum FetchError {
  Spawn(io::Error),
  Clone { url: String, status: ExitStatus },
  Pattern(glob::PatternError),
}

impl Display for FetchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FetchError::Spawn(e) => write!(f, "failed to run git: {e}"),
      FetchError::Clone { url, status } => write!(f, "git clone of {url} failed with {status}"),
      FetchError::Pattern(e) => write!(f, "invalid input pattern: {e}"),
    }
  }
}

impl Error for FetchError {}

/// Input files for one run, plus the directory they are reported relative to.
#[derive(Debug, Default)]
pub struct Inputs {
  pub files: Vec<PathBuf>,
  pub root: Option<PathBuf>,
  /// What was searched, for error messages.
  pub pattern: String,
}

/// Clones the source repository into its cache directory unless it is already there.
pub fn ensure_clone(src: &SourceConfig) -> Result<PathBuf, FetchError> {
  let dest = src.cache_path();
  if dest.exists() {
    info!(dir = %dest.display(), "reusing cached clone");
    return Ok(dest);
  };
  info!(url = %src.repo_url, dir = %dest.display(), "cloning");
  let mut cmd = Command::new("git");
  cmd.args(["clone", "--depth", "1"]);
  if let Some(branch) = &src.branch {
    cmd.arg("--branch").arg(branch);
  };
  let status = cmd
    .arg(&src.repo_url)
    .arg(&dest)
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .status()
    .map_err(FetchError::Spawn)?;
  if !status.success() {
    return Err(FetchError::Clone {
      url: src.repo_url.clone(),
      status,
    });
  };
  Ok(dest)
}

/// Files matching `pattern`, sorted by path.
pub fn glob_sorted(pattern: &str) -> Result<Vec<PathBuf>, FetchError> {
  let mut files = Vec::new();
  for entry in glob::glob(pattern).map_err(FetchError::Pattern)? {
    match entry {
      Ok(path) if path.is_file() => files.push(path),
      Ok(_) => {}
      Err(e) => warn!(error = %e, "cannot read glob entry"),
    };
  }
  files.sort();
  Ok(files)
}

/// First file named `name` under `root`, walking directories in name order.
pub fn find_by_name(root: &Path, name: &str) -> Option<PathBuf> {
  WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|e| e.ok())
    .find(|e| e.file_type().is_file() && e.file_name() == name)
    .map(|e| e.into_path())
}

/// An explicit path is used as-is; anything else is treated as a glob.
pub fn local_inputs(path_or_glob: &str) -> Result<Inputs, FetchError> {
  let path = Path::new(path_or_glob);
  let files = if path.is_file() {
    vec![path.to_path_buf()]
  } else {
    glob_sorted(path_or_glob)?
  };
  Ok(Inputs {
    files,
    root: None,
    pattern: path_or_glob.to_string(),
  })
}

pub fn remote_inputs(src: &SourceConfig) -> Result<Inputs, FetchError> {
  let root = ensure_clone(src)?;
  let pattern = root.join(&src.csv_glob).to_string_lossy().into_owned();
  let mut files = glob_sorted(&pattern)?;
  if files.is_empty() {
    if let Some(name) = &src.fallback_file_name {
      if let Some(found) = find_by_name(&root, name) {
        info!(file = %found.display(), "found input outside the expected path");
        files.push(found);
      };
    };
  };
  Ok(Inputs {
    files,
    root: Some(root),
    pattern,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  #[test]
  fn test_glob_sorted_and_local_inputs() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["TUNA_run2.csv", "TUNA_run10.csv", "TUNA_run1.csv", "other.csv"] {
      fs::write(dir.path().join(name), "x\n").unwrap();
    }
    let pattern = dir.path().join("TUNA_run*.csv").to_string_lossy().into_owned();
    let inputs = local_inputs(&pattern).unwrap();
    let names: Vec<_> = inputs
      .files
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["TUNA_run1.csv", "TUNA_run10.csv", "TUNA_run2.csv"]);

    let single = dir.path().join("other.csv");
    let inputs = local_inputs(single.to_str().unwrap()).unwrap();
    assert_eq!(inputs.files, vec![single]);
  }

  #[test]
  fn test_find_by_name() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("b/results")).unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("b/results/full_seed1.csv"), "").unwrap();
    fs::write(dir.path().join("a/full_seed1.csv"), "").unwrap();
    assert_eq!(
      find_by_name(dir.path(), "full_seed1.csv"),
      Some(dir.path().join("a/full_seed1.csv"))
    );
    assert_eq!(find_by_name(dir.path(), "missing.csv"), None);
  }

  #[test]
  fn test_cached_clone_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/results_redis")).unwrap();
    fs::write(dir.path().join("src/results_redis/full_seed1.csv"), "").unwrap();
    let src = SourceConfig {
      repo_url: "https://invalid.example/never-cloned".to_string(),
      branch: None,
      cache_name: "unused".to_string(),
      cache_dir: Some(dir.path().to_path_buf()),
      csv_glob: "src/results_redis/full_seed1.csv".to_string(),
      fallback_file_name: None,
    };
    let inputs = remote_inputs(&src).unwrap();
    assert_eq!(inputs.root.as_deref(), Some(dir.path()));
    assert_eq!(inputs.files, vec![dir.path().join("src/results_redis/full_seed1.csv")]);
  }

  #[test]
  fn test_fallback_file_name() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("moved")).unwrap();
    fs::write(dir.path().join("moved/full_seed1.csv"), "").unwrap();
    let src = SourceConfig {
      repo_url: "https://invalid.example/never-cloned".to_string(),
      branch: None,
      cache_name: "unused".to_string(),
      cache_dir: Some(dir.path().to_path_buf()),
      csv_glob: "src/results_redis/full_seed1.csv".to_string(),
      fallback_file_name: Some("full_seed1.csv".to_string()),
    };
    let inputs = remote_inputs(&src).unwrap();
    assert_eq!(inputs.files, vec![dir.path().join("moved/full_seed1.csv")]);
  }
}
