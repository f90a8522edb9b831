use crate::fetch::FetchError;
use crate::literal::DecodeError;
use crate::profile::ProfileError;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::PathBuf;

pub type SelectResult<T> = Result<T, SelectError>;

/// Conditions that end a selector run. Per-file and per-row problems never surface here; they are logged and skipped.
#[derive(Debug)]
pub enum SelectError {
  Profile(ProfileError),
  Fetch(FetchError),
  NoSource,
  NoInputFiles {
    pattern: String,
  },
  NoUsableInputs {
    files: usize,
    first_failure: String,
  },
  EmptyPool {
    fidelity_column: String,
    min_fidelity: Option<f64>,
  },
  UndecodableConfig {
    error: DecodeError,
    raw: String,
  },
  Write(PathBuf, io::Error),
}

impl Display for SelectError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SelectError::Profile(e) => write!(f, "{e}"),
      SelectError::Fetch(e) => write!(f, "{e}"),
      SelectError::NoSource => write!(f, "profile has no source repository; pass --csv"),
      SelectError::NoInputFiles { pattern } => write!(f, "no input files found matching {pattern}"),
      SelectError::NoUsableInputs {
        files,
        first_failure,
      } => write!(
        f,
        "none of the {files} input files could be used (first failure: {first_failure})"
      ),
      SelectError::EmptyPool {
        fidelity_column,
        min_fidelity: Some(min),
      } => write!(
        f,
        "no configs were tested with {fidelity_column} >= {min} in any input file"
      ),
      SelectError::EmptyPool {
        fidelity_column,
        min_fidelity: None,
      } => write!(f, "no rows with a numeric {fidelity_column} in any input file"),
      SelectError::UndecodableConfig { error, raw } => {
        write!(f, "cannot decode config of the best row ({error}): {raw}")
      }
      SelectError::Write(path, e) => write!(f, "cannot write {}: {e}", path.display()),
    }
  }
}

impl Error for SelectError {}

impl From<ProfileError> for SelectError {
  fn from(e: ProfileError) -> Self {
    SelectError::Profile(e)
  }
}

impl From<FetchError> for SelectError {
  fn from(e: FetchError) -> Self {
    SelectError::Fetch(e)
  }
}
