use anyhow::{Result, anyhow};

use crate::frame::Frame;

/// Seam for the regression model that lives outside this crate. Implementors
/// take the scaled predictor table and return one vote-share score per row,
/// in basetable row order.
pub trait VoteShareModel {
    fn score(&self, predictors: &Frame) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvpComparison {
    pub year: u16,
    pub predicted: String,
    pub actual: String,
}

/// Pit the model against history for one season: the player with the top
/// score versus the player who actually drew the most votes. Negative scores
/// count as zero; first row wins ties.
pub fn predicted_mvp(basetable: &Frame, scores: &[f64], year: u16) -> Result<MvpComparison> {
    if scores.len() != basetable.row_count() {
        return Err(anyhow!(
            "{} scores for {} basetable rows",
            scores.len(),
            basetable.row_count()
        ));
    }
    let context = "mvp comparison";
    let player_idx = basetable.require_column("Player", context)?;
    let year_idx = basetable.require_column("Year", context)?;
    let pts_won_idx = basetable.require_column("Pts Won", context)?;

    let wanted = f64::from(year);
    let mut predicted: Option<(usize, f64)> = None;
    let mut actual: Option<(usize, f64)> = None;
    for (row, cells) in basetable.rows.iter().enumerate() {
        if cells[year_idx].as_number() != Some(wanted) {
            continue;
        }
        let score = scores[row].max(0.0);
        if predicted.is_none_or(|(_, best)| score > best) {
            predicted = Some((row, score));
        }
        let pts = cells[pts_won_idx].as_number().unwrap_or(0.0);
        if actual.is_none_or(|(_, best)| pts > best) {
            actual = Some((row, pts));
        }
    }

    let (Some((pred_row, _)), Some((actual_row, _))) = (predicted, actual) else {
        let years = basetable
            .rows
            .iter()
            .filter_map(|row| row[year_idx].as_number())
            .collect::<Vec<_>>();
        let (Some(lo), Some(hi)) = (
            years.iter().copied().reduce(f64::min),
            years.iter().copied().reduce(f64::max),
        ) else {
            return Err(anyhow!("basetable has no seasons to compare against"));
        };
        return Err(anyhow!(
            "year {year} must fall within the range from {lo:.0} to {hi:.0}"
        ));
    };

    Ok(MvpComparison {
        year,
        predicted: player_name(basetable, pred_row, player_idx),
        actual: player_name(basetable, actual_row, player_idx),
    })
}

fn player_name(basetable: &Frame, row: usize, player_idx: usize) -> String {
    basetable.rows[row][player_idx]
        .as_str()
        .unwrap_or("?")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Cell;

    fn basetable() -> Frame {
        Frame {
            columns: ["Player", "Year", "Pts Won"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows: vec![
                vec![
                    Cell::text("Alpha Star"),
                    Cell::Number(2020.0),
                    Cell::Number(960.0),
                ],
                vec![
                    Cell::text("Role Guy"),
                    Cell::Number(2020.0),
                    Cell::Number(0.0),
                ],
                vec![
                    Cell::text("Last Year Guy"),
                    Cell::Number(2019.0),
                    Cell::Number(700.0),
                ],
            ],
        }
    }

    #[test]
    fn picks_top_score_and_top_votes_for_the_season() {
        let cmp = predicted_mvp(&basetable(), &[0.2, 0.9, 0.5], 2020).expect("comparison");
        assert_eq!(cmp.predicted, "Role Guy");
        assert_eq!(cmp.actual, "Alpha Star");
        assert_eq!(cmp.year, 2020);
    }

    #[test]
    fn negative_scores_clamp_to_zero() {
        // Both clamp to 0, so the earlier row wins.
        let cmp = predicted_mvp(&basetable(), &[-0.4, -0.9, 0.0], 2020).expect("comparison");
        assert_eq!(cmp.predicted, "Alpha Star");
    }

    #[test]
    fn out_of_range_year_reports_the_valid_span() {
        let err = predicted_mvp(&basetable(), &[0.1, 0.2, 0.3], 1975).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("1975"), "got: {msg}");
        assert!(msg.contains("2019") && msg.contains("2020"), "got: {msg}");
    }

    #[test]
    fn score_count_must_match_rows() {
        assert!(predicted_mvp(&basetable(), &[0.1], 2020).is_err());
    }

    struct VotesAreDestiny;

    impl VoteShareModel for VotesAreDestiny {
        fn score(&self, predictors: &Frame) -> Result<Vec<f64>> {
            let idx = predictors.require_column("Pts Won", "stub model")?;
            Ok(predictors
                .rows
                .iter()
                .map(|row| row[idx].as_number().unwrap_or(0.0))
                .collect())
        }
    }

    #[test]
    fn a_model_impl_plugs_into_the_comparison() {
        let table = basetable();
        let scores = VotesAreDestiny.score(&table).expect("scores");
        let cmp = predicted_mvp(&table, &scores, 2020).expect("comparison");
        assert_eq!(cmp.predicted, cmp.actual);
    }
}
