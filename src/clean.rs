use std::collections::HashMap;

use crate::error::PipelineError;
use crate::frame::{Cell, Frame};

/// Synthetic row basketball-reference adds for a player traded mid-season,
/// holding his stats summed across all stints.
pub const TOTAL_TEAM_CODE: &str = "TOT";

pub const VOTE_COLUMNS: [&str; 3] = ["Pts Won", "Pts Max", "Share"];

const MVP_COLUMNS: [&str; 5] = ["Player", "Year", "Pts Won", "Pts Max", "Share"];

// Current franchises only. A code outside this table means the source
// changed under us and the table needs a deliberate update, not a guess.
const TEAM_NAMES: [(&str, &str); 30] = [
    ("ATL", "Atlanta Hawks"),
    ("BOS", "Boston Celtics"),
    ("BRK", "Brooklyn Nets"),
    ("CHO", "Charlotte Hornets"),
    ("CHI", "Chicago Bulls"),
    ("CLE", "Cleveland Cavaliers"),
    ("DAL", "Dallas Mavericks"),
    ("DEN", "Denver Nuggets"),
    ("DET", "Detroit Pistons"),
    ("GSW", "Golden State Warriors"),
    ("HOU", "Houston Rockets"),
    ("IND", "Indiana Pacers"),
    ("LAL", "Los Angeles Lakers"),
    ("LAC", "Los Angeles Clippers"),
    ("MEM", "Memphis Grizzlies"),
    ("MIA", "Miami Heat"),
    ("MIL", "Milwaukee Bucks"),
    ("MIN", "Minnesota Timberwolves"),
    ("NOP", "New Orleans Pelicans"),
    ("NYK", "New York Knicks"),
    ("OKC", "Oklahoma City Thunder"),
    ("ORL", "Orlando Magic"),
    ("PHI", "Philadelphia 76ers"),
    ("PHO", "Phoenix Suns"),
    ("POR", "Portland Trail Blazers"),
    ("SAC", "Sacramento Kings"),
    ("SAS", "San Antonio Spurs"),
    ("TOR", "Toronto Raptors"),
    ("UTA", "Utah Jazz"),
    ("WAS", "Washington Wizards"),
];

pub fn team_name(abbr: &str) -> Option<&'static str> {
    TEAM_NAMES
        .iter()
        .find(|(code, _)| *code == abbr)
        .map(|(_, name)| *name)
}

/// Award pages carry vote tallies plus a stat echo; only identity and the
/// vote columns survive.
pub fn clean_mvp(frame: &Frame) -> Result<Frame, PipelineError> {
    frame.project(&MVP_COLUMNS, "mvp voting table")
}

/// Per-game player stats: drop the page-local rank, strip hall-of-fame
/// asterisks, collapse traded players to one row per season, and expand
/// team codes to the full names the standings use.
pub fn clean_players(mut frame: Frame) -> Result<Frame, PipelineError> {
    let context = "per-game table";
    frame.drop_column("Rk", context)?;
    strip_asterisks(&mut frame, "Player", context)?;
    frame.rename_column("Tm", "Team", context)?;

    let player_idx = frame.require_column("Player", context)?;
    let year_idx = frame.require_column("Year", context)?;
    let team_idx = frame.require_column("Team", context)?;

    let mut frame = collapse_trade_rows(frame, player_idx, year_idx, team_idx);
    expand_team_names(&mut frame, player_idx, year_idx, team_idx)?;
    Ok(frame)
}

/// Standings rows only need the clinched-playoffs asterisk removed; the
/// conference split is already handled at acquisition time.
pub fn clean_standings(mut frame: Frame) -> Result<Frame, PipelineError> {
    strip_asterisks(&mut frame, "Team", "standings table")?;
    Ok(frame)
}

// Only the trailing marker comes off; an asterisk further in is part of
// the name as the source wrote it.
fn strip_asterisks(frame: &mut Frame, column: &str, context: &str) -> Result<(), PipelineError> {
    let idx = frame.require_column(column, context)?;
    for row in &mut frame.rows {
        if let Cell::Text(value) = &mut row[idx]
            && let Some(stripped) = value.strip_suffix('*')
        {
            *value = stripped.to_string();
        }
    }
    Ok(())
}

// One row per (player, season): keep the aggregate row and label it with the
// team of the final stint, so the standings join lands on a real franchise.
fn collapse_trade_rows(frame: Frame, player_idx: usize, year_idx: usize, team_idx: usize) -> Frame {
    let mut order: Vec<(String, i64)> = Vec::new();
    let mut groups: HashMap<(String, i64), Vec<Vec<Cell>>> = HashMap::new();
    for row in frame.rows {
        let key = (
            row[player_idx].as_str().unwrap_or_default().to_string(),
            row[year_idx].as_number().unwrap_or_default() as i64,
        );
        match groups.get_mut(&key) {
            Some(group) => group.push(row),
            None => {
                order.push(key.clone());
                groups.insert(key, vec![row]);
            }
        }
    }

    let mut rows = Vec::with_capacity(order.len());
    for key in &order {
        let Some(group) = groups.remove(key) else {
            continue;
        };
        if let Some(row) = collapse_group(group, team_idx) {
            rows.push(row);
        }
    }
    Frame {
        columns: frame.columns,
        rows,
    }
}

fn collapse_group(mut group: Vec<Vec<Cell>>, team_idx: usize) -> Option<Vec<Cell>> {
    if group.len() <= 1 {
        return group.pop();
    }
    let final_team = group.iter().rev().find_map(|row| {
        row[team_idx]
            .as_str()
            .filter(|team| *team != TOTAL_TEAM_CODE)
            .map(str::to_string)
    });
    let keeper_idx = group
        .iter()
        .position(|row| row[team_idx].as_str() == Some(TOTAL_TEAM_CODE))
        .unwrap_or(group.len() - 1);
    let mut keeper = group.swap_remove(keeper_idx);
    if let Some(team) = final_team {
        keeper[team_idx] = Cell::text(team);
    }
    Some(keeper)
}

fn expand_team_names(
    frame: &mut Frame,
    player_idx: usize,
    year_idx: usize,
    team_idx: usize,
) -> Result<(), PipelineError> {
    for row in &mut frame.rows {
        let abbr = match row[team_idx].as_str() {
            Some(value) => value.to_string(),
            None => continue,
        };
        match team_name(&abbr) {
            Some(name) => row[team_idx] = Cell::text(name),
            None => {
                return Err(PipelineError::UnknownAbbreviation {
                    abbr,
                    player: row[player_idx].as_str().unwrap_or("?").to_string(),
                    year: row[year_idx].as_number().unwrap_or_default() as u16,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players_frame(rows: &[(&str, f64, &str, f64)]) -> Frame {
        Frame {
            columns: ["Rk", "Player", "Tm", "PTS", "Year"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(idx, (player, year, team, pts))| {
                    vec![
                        Cell::text((idx + 1).to_string()),
                        Cell::text(*player),
                        Cell::text(*team),
                        Cell::text(pts.to_string()),
                        Cell::Number(*year),
                    ]
                })
                .collect(),
        }
    }

    #[test]
    fn mvp_cleaner_projects_identity_and_votes() {
        let frame = Frame {
            columns: ["Rank", "Player", "Age", "Tm", "First", "Pts Won", "Pts Max", "Share", "Year"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows: vec![vec![
                Cell::text("1"),
                Cell::text("Prime Candidate"),
                Cell::text("27"),
                Cell::text("BOS"),
                Cell::text("80"),
                Cell::text("980"),
                Cell::text("1010"),
                Cell::text("0.97"),
                Cell::Number(2020.0),
            ]],
        };
        let cleaned = clean_mvp(&frame).expect("clean");
        assert_eq!(
            cleaned.columns,
            vec!["Player", "Year", "Pts Won", "Pts Max", "Share"]
        );
        assert_eq!(cleaned.rows[0][0], Cell::text("Prime Candidate"));
        assert_eq!(cleaned.rows[0][1], Cell::Number(2020.0));
    }

    #[test]
    fn traded_player_collapses_to_total_row_with_final_team() {
        let frame = players_frame(&[
            ("Journey Man", 2020.0, "TOT", 18.0),
            ("Journey Man", 2020.0, "BOS", 20.0),
            ("Journey Man", 2020.0, "MIA", 16.0),
            ("Stay Putter", 2020.0, "LAL", 25.0),
        ]);
        let cleaned = clean_players(frame).expect("clean");
        assert_eq!(cleaned.rows.len(), 2);

        let team_idx = cleaned.column_index("Team").expect("team col");
        let pts_idx = cleaned.column_index("PTS").expect("pts col");
        assert_eq!(cleaned.rows[0][team_idx], Cell::text("Miami Heat"));
        // Stats stay those of the aggregate row, not the final stint.
        assert_eq!(cleaned.rows[0][pts_idx], Cell::text("18"));
        assert_eq!(cleaned.rows[1][team_idx], Cell::text("Los Angeles Lakers"));
    }

    #[test]
    fn same_player_in_two_seasons_is_not_collapsed() {
        let frame = players_frame(&[
            ("Long Career", 2019.0, "CHI", 22.0),
            ("Long Career", 2020.0, "CHI", 21.0),
        ]);
        let cleaned = clean_players(frame).expect("clean");
        assert_eq!(cleaned.rows.len(), 2);
    }

    #[test]
    fn group_without_total_row_keeps_last_stint() {
        let frame = players_frame(&[
            ("Odd Case", 2020.0, "DEN", 10.0),
            ("Odd Case", 2020.0, "POR", 12.0),
        ]);
        let cleaned = clean_players(frame).expect("clean");
        assert_eq!(cleaned.rows.len(), 1);
        let team_idx = cleaned.column_index("Team").expect("team col");
        let pts_idx = cleaned.column_index("PTS").expect("pts col");
        assert_eq!(cleaned.rows[0][team_idx], Cell::text("Portland Trail Blazers"));
        assert_eq!(cleaned.rows[0][pts_idx], Cell::text("12"));
    }

    #[test]
    fn hall_of_fame_asterisk_is_removed() {
        let mut frame = players_frame(&[("Hall Famer", 1988.0, "BOS", 29.0)]);
        let player_idx = 1;
        frame.rows[0][player_idx] = Cell::text("Hall Famer*");
        let cleaned = clean_players(frame).expect("clean");
        let idx = cleaned.column_index("Player").expect("player col");
        assert_eq!(cleaned.rows[0][idx], Cell::text("Hall Famer"));
    }

    #[test]
    fn only_the_trailing_marker_is_stripped() {
        let mut frame = players_frame(&[("placeholder", 2020.0, "BOS", 10.0)]);
        frame.rows[0][1] = Cell::text("Odd*Name*");
        let cleaned = clean_players(frame).expect("clean");
        let idx = cleaned.column_index("Player").expect("player col");
        assert_eq!(cleaned.rows[0][idx], Cell::text("Odd*Name"));
    }

    #[test]
    fn unknown_abbreviation_is_fatal_and_names_the_row() {
        let frame = players_frame(&[("Time Traveler", 1995.0, "SEA", 19.0)]);
        let err = clean_players(frame).unwrap_err();
        match err {
            PipelineError::UnknownAbbreviation { abbr, player, year } => {
                assert_eq!(abbr, "SEA");
                assert_eq!(player, "Time Traveler");
                assert_eq!(year, 1995);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn standings_cleaner_strips_clinch_markers() {
        let frame = Frame {
            columns: ["Team", "W", "Year"].iter().map(|c| c.to_string()).collect(),
            rows: vec![vec![
                Cell::text("Milwaukee Bucks*"),
                Cell::text("56"),
                Cell::Number(2020.0),
            ]],
        };
        let cleaned = clean_standings(frame).expect("clean");
        assert_eq!(cleaned.rows[0][0], Cell::text("Milwaukee Bucks"));
    }
}
