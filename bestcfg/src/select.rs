use crate::literal::decode_config;
use crate::literal::DecodeResult;
use crate::literal::SelectedConfig;
use crate::profile::Goal;
use crate::profile::Ranking;
use crate::profile::Strategy;
use crate::table::ResultRow;
use itertools::Itertools;
use std::cmp::Ordering;
use tracing::info;

pub fn apply_threshold(rows: Vec<ResultRow>, min_fidelity: Option<f64>) -> Vec<ResultRow> {
  match min_fidelity {
    Some(min) => rows.into_iter().filter(|r| r.fidelity >= min).collect(),
    None => rows,
  }
}

/// Distinct fidelity values present, ascending.
pub fn fidelity_tiers(rows: &[ResultRow]) -> Vec<f64> {
  rows
    .iter()
    .map(|r| r.fidelity)
    .sorted_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    .dedup()
    .collect()
}

/// Keeps only the rows evaluated at the highest fidelity in the pool.
pub fn keep_top_tier(rows: Vec<ResultRow>) -> Vec<ResultRow> {
  let Some(top) = rows.iter().map(|r| r.fidelity).reduce(f64::max) else {
    return rows;
  };
  rows.into_iter().filter(|r| r.fidelity == top).collect()
}

fn key(row: &ResultRow, ranking: Ranking) -> f64 {
  match ranking {
    Ranking::Value => row.performance,
    Ranking::Magnitude => row.performance.abs(),
  }
}

/// Orders `a` before `b` if `a` is the better row.
fn compare(a: &ResultRow, b: &ResultRow, goal: Goal, ranking: Ranking) -> Ordering {
  let (a, b) = (key(a, ranking), key(b, ranking));
  let ord = match goal {
    Goal::Maximize => b.partial_cmp(&a),
    Goal::Minimize => a.partial_cmp(&b),
  };
  ord.unwrap_or(Ordering::Equal)
}

/// Stable arg-max (or arg-min). On exact ties the row that came first wins.
pub fn select_best(rows: &[ResultRow], goal: Goal, ranking: Ranking) -> Option<&ResultRow> {
  rows.iter().reduce(|best, row| {
    if compare(row, best, goal, ranking) == Ordering::Less {
      row
    } else {
      best
    }
  })
}

/// All rows, best first. Ties keep pool order.
pub fn rank(rows: &[ResultRow], goal: Goal, ranking: Ranking) -> Vec<&ResultRow> {
  rows
    .iter()
    .sorted_by(|a, b| compare(a, b, goal, ranking))
    .collect()
}

#[derive(Debug)]
pub struct Selection<'a> {
  pub row: &'a ResultRow,
  /// Position of `row` in the ranking, starting at 1.
  pub rank: usize,
  pub config: DecodeResult<SelectedConfig>,
}

pub fn select<'a>(
  rows: &'a [ResultRow],
  goal: Goal,
  ranking: Ranking,
  strategy: Strategy,
) -> Option<Selection<'a>> {
  match strategy {
    Strategy::Best => {
      let row = select_best(rows, goal, ranking)?;
      Some(Selection {
        row,
        rank: 1,
        config: decode_config(&row.config),
      })
    }
    Strategy::FirstDecodable => select_first_decodable(rows, goal, ranking),
  }
}

fn select_first_decodable(
  rows: &[ResultRow],
  goal: Goal,
  ranking: Ranking,
) -> Option<Selection<'_>> {
  let ranked = rank(rows, goal, ranking);
  let mut last_err = None;
  for (i, &row) in ranked.iter().enumerate() {
    match decode_config(&row.config) {
      Ok(config) => {
        info!(
          rank = i + 1,
          performance = row.performance,
          fidelity = row.fidelity,
          "picked first row with a decodable config"
        );
        return Some(Selection {
          row,
          rank: i + 1,
          config: Ok(config),
        });
      }
      Err(e) => {
        info!(
          rank = i + 1,
          performance = row.performance,
          error = %e,
          "skipping row with undecodable config"
        );
        last_err = Some(e);
      }
    }
  }
  let row = *ranked.first()?;
  info!(
    performance = row.performance,
    "no row has a decodable config; falling back to the top-ranked row"
  );
  Some(Selection {
    row,
    rank: 1,
    config: Err(last_err?),
  })
}
