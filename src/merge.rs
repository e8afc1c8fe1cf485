use std::collections::HashMap;

use crate::clean::VOTE_COLUMNS;
use crate::error::PipelineError;
use crate::frame::{Cell, Frame};

// Standings mark the division leader's games-behind with an em-dash.
const GB_LEADER_SENTINEL: &str = "—";

/// What the outer joins glossed over, countable instead of silent: rows that
/// found no partner on one side or the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub players_without_votes: usize,
    pub players_without_standings: usize,
    pub standings_only_rows: usize,
}

/// Merge the three cleaned multi-season datasets into the basetable:
/// full outer join with players on (Player, Year), then with standings on
/// (Team, Year).
/// Missing votes become 0, the games-behind sentinel becomes 0, every
/// remaining hole becomes 0, and fully numeric columns turn numeric.
pub fn merge_basetable(
    mvp: Frame,
    players: Frame,
    standings: Frame,
) -> Result<(Frame, MergeReport), PipelineError> {
    let context = "basetable merge";

    let with_players = full_outer_join(&mvp, &players, &["Player", "Year"], context)?;
    let pts_won_idx = with_players.require_column("Pts Won", context)?;
    let players_without_votes = with_players
        .rows
        .iter()
        .filter(|row| row[pts_won_idx].is_null())
        .count();

    let mut basetable = full_outer_join(&with_players, &standings, &["Team", "Year"], context)?;
    let player_idx = basetable.require_column("Player", context)?;
    let conference_idx = basetable.require_column("Conference", context)?;
    let mut standings_only_rows = 0usize;
    let mut players_without_standings = 0usize;
    for row in &basetable.rows {
        if row[player_idx].is_null() {
            standings_only_rows += 1;
        } else if row[conference_idx].is_null() {
            players_without_standings += 1;
        }
    }

    basetable.fill_nulls_in(&VOTE_COLUMNS, &Cell::Number(0.0), context)?;

    let gb_idx = basetable.require_column("GB", context)?;
    for row in &mut basetable.rows {
        if row[gb_idx].as_str() == Some(GB_LEADER_SENTINEL) {
            row[gb_idx] = Cell::Number(0.0);
        }
    }

    basetable.fill_all_nulls(&Cell::Number(0.0));
    basetable.coerce_numeric_columns();

    let report = MergeReport {
        players_without_votes,
        players_without_standings,
        standings_only_rows,
    };
    Ok((basetable, report))
}

/// SQL-style full outer join. Output columns are the left frame's followed
/// by the right frame's non-key columns; left rows keep their order (fanned
/// out per matching right row), unmatched right rows follow with the key
/// values filled in and everything else null.
fn full_outer_join(
    left: &Frame,
    right: &Frame,
    keys: &[&str],
    context: &str,
) -> Result<Frame, PipelineError> {
    let left_keys = keys
        .iter()
        .map(|key| left.require_column(key, context))
        .collect::<Result<Vec<_>, _>>()?;
    let right_keys = keys
        .iter()
        .map(|key| right.require_column(key, context))
        .collect::<Result<Vec<_>, _>>()?;
    let right_extra = (0..right.columns.len())
        .filter(|idx| !right_keys.contains(idx))
        .collect::<Vec<_>>();

    let mut columns = left.columns.clone();
    columns.extend(right_extra.iter().map(|&idx| right.columns[idx].clone()));

    let mut right_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (ridx, row) in right.rows.iter().enumerate() {
        right_index
            .entry(key_of(row, &right_keys))
            .or_default()
            .push(ridx);
    }

    let mut right_matched = vec![false; right.rows.len()];
    let mut rows = Vec::with_capacity(left.rows.len());
    for lrow in &left.rows {
        match right_index.get(&key_of(lrow, &left_keys)) {
            Some(matches) => {
                for &ridx in matches {
                    right_matched[ridx] = true;
                    let mut row = lrow.clone();
                    row.extend(right_extra.iter().map(|&idx| right.rows[ridx][idx].clone()));
                    rows.push(row);
                }
            }
            None => {
                let mut row = lrow.clone();
                row.extend(std::iter::repeat(Cell::Null).take(right_extra.len()));
                rows.push(row);
            }
        }
    }

    for (ridx, rrow) in right.rows.iter().enumerate() {
        if right_matched[ridx] {
            continue;
        }
        let mut row = vec![Cell::Null; left.columns.len()];
        for (pos, &lkey) in left_keys.iter().enumerate() {
            row[lkey] = rrow[right_keys[pos]].clone();
        }
        row.extend(right_extra.iter().map(|&idx| rrow[idx].clone()));
        rows.push(row);
    }

    Ok(Frame { columns, rows })
}

fn key_of(row: &[Cell], indices: &[usize]) -> String {
    let mut key = String::new();
    for &idx in indices {
        match &row[idx] {
            Cell::Null => key.push('\u{0}'),
            Cell::Text(value) => key.push_str(value),
            Cell::Number(value) => key.push_str(&value.to_string()),
        }
        key.push('\u{1f}');
    }
    key
}
