use crate::error::SelectError;
use crate::error::SelectResult;
use crate::fetch::Inputs;
use crate::output::render_conf;
use crate::output::render_json;
use crate::output::write_output;
use crate::output::Payload;
use crate::output::Summary;
use crate::profile::OnDecodeError;
use crate::profile::Profile;
use crate::select::apply_threshold;
use crate::select::fidelity_tiers;
use crate::select::keep_top_tier;
use crate::select::select;
use crate::select::select_best;
use crate::table::load_file;
use crate::table::ResultRow;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tracing::error;
use tracing::info;
use tracing::warn;

/*

# Selection pipeline

load every input -> threshold per file -> concatenate -> (top tier) -> select -> decode -> write

Nothing is written until a payload exists, so a failed run leaves no output files behind.

*/

#[derive(Debug)]
pub struct Report {
  pub summary: Summary,
  pub payload: Payload,
  pub written: Vec<PathBuf>,
}

/// Loads and filters every input file into one candidate pool, in file order.
pub fn gather(profile: &Profile, files: &[PathBuf]) -> SelectResult<Vec<ResultRow>> {
  let mut pool = Vec::new();
  let mut usable = 0;
  let mut first_failure = None;

  for path in files {
    let table = match load_file(path, &profile.columns, profile.skip_rows) {
      Ok(table) => table,
      Err(e) => {
        warn!(file = %path.display(), error = %e, "skipping input file");
        if first_failure.is_none() {
          first_failure = Some(format!("{}: {e}", path.display()));
        };
        continue;
      }
    };
    usable += 1;

    let rows_read = table.rows.len();
    let max_fidelity = table.rows.iter().map(|r| r.fidelity).reduce(f64::max);
    let kept = apply_threshold(table.rows, profile.min_fidelity);
    match select_best(&kept, profile.goal, profile.ranking) {
      Some(best) => info!(
        file = %path.display(),
        rows_read,
        non_numeric = table.non_numeric,
        ?max_fidelity,
        rows_kept = kept.len(),
        best_performance = best.performance,
        "loaded input file"
      ),
      None => info!(
        file = %path.display(),
        rows_read,
        ?max_fidelity,
        "no high-fidelity rows in input file"
      ),
    };
    pool.extend(kept);
  }

  if usable == 0 && !files.is_empty() {
    return Err(SelectError::NoUsableInputs {
      files: files.len(),
      first_failure: first_failure.unwrap_or_default(),
    });
  };

  if profile.top_tier_only && !pool.is_empty() {
    let tiers = fidelity_tiers(&pool);
    let top = tiers.last().copied();
    pool = keep_top_tier(pool);
    info!(?tiers, ?top, candidates = pool.len(), "restricted to the top fidelity tier");
  };

  if pool.is_empty() {
    return Err(SelectError::EmptyPool {
      fidelity_column: profile.columns.fidelity.clone(),
      min_fidelity: profile.min_fidelity,
    });
  };
  Ok(pool)
}

/// Picks the winning row from a non-empty pool and turns its config into the payload to write.
pub fn choose<'a>(profile: &Profile, pool: &'a [ResultRow]) -> SelectResult<(&'a ResultRow, Payload)> {
  let Some(selection) = select(pool, profile.goal, profile.ranking, profile.strategy) else {
    return Err(SelectError::EmptyPool {
      fidelity_column: profile.columns.fidelity.clone(),
      min_fidelity: profile.min_fidelity,
    });
  };
  let row = selection.row;
  let payload = match (selection.config, profile.on_decode_error) {
    (Ok(config), _) => Payload::Decoded(config),
    (Err(e), OnDecodeError::Raw) => {
      error!(error = %e, "failed to decode the config field; writing the raw text instead");
      Payload::Raw {
        raw_config: row.config.clone(),
      }
    }
    (Err(error), OnDecodeError::Fail) => {
      return Err(SelectError::UndecodableConfig {
        error,
        raw: row.config.clone(),
      })
    }
  };
  Ok((row, payload))
}

fn resolve(out_dir: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    out_dir.join(path)
  }
}

pub fn run(profile: &Profile, inputs: &Inputs, out_dir: &Path) -> SelectResult<Report> {
  if inputs.files.is_empty() {
    return Err(SelectError::NoInputFiles {
      pattern: inputs.pattern.clone(),
    });
  };
  info!(files = inputs.files.len(), "reading tuning results");

  let pool = gather(profile, &inputs.files)?;
  info!(candidates = pool.len(), "candidate pool assembled");
  let (row, payload) = choose(profile, &pool)?;

  let json_path = resolve(out_dir, &profile.json_out);
  let json = render_json(&payload).map_err(|e| SelectError::Write(json_path.clone(), e.into()))?;
  let conf = match (&profile.conf_out, &payload) {
    (Some(conf_out), Payload::Decoded(config)) => Some((resolve(out_dir, conf_out), render_conf(config))),
    (Some(conf_out), Payload::Raw { .. }) => {
      warn!(path = %conf_out.display(), "not writing line-oriented config from an undecoded payload");
      None
    }
    (None, _) => None,
  };

  write_output(&json_path, &json).map_err(|e| SelectError::Write(json_path.clone(), e))?;
  let mut written = vec![json_path];
  if let Some((conf_path, text)) = conf {
    if let Err(e) = write_output(&conf_path, &text) {
      // Either every output file exists or none does.
      for path in &written {
        if let Err(rm) = fs::remove_file(path) {
          warn!(path = %path.display(), error = %rm, "cannot remove partial output");
        };
      }
      return Err(SelectError::Write(conf_path, e));
    };
    written.push(conf_path);
  };

  let summary = Summary {
    fidelity_label: profile.columns.fidelity.clone(),
    fidelity: row.fidelity,
    performance_label: profile.columns.performance.clone(),
    performance: row.performance,
    source: Summary::relative_source(&row.source, inputs.root.as_deref()),
  };
  Ok(Report {
    summary,
    payload,
    written,
  })
}
