use crate::clean::VOTE_COLUMNS;
use crate::frame::{Cell, Frame};

/// Model input derived from the basetable: every fully numeric column except
/// the vote targets, min-max scaled to [0, 1] per column. Column names are
/// kept so the stored table stays self-describing.
pub fn predictor_table(basetable: &Frame) -> Frame {
    let mut columns = Vec::new();
    let mut scaled = Vec::new();
    for (idx, name) in basetable.columns.iter().enumerate() {
        if VOTE_COLUMNS.contains(&name.as_str()) {
            continue;
        }
        let Some(values) = basetable.column_as_numbers(idx) else {
            continue;
        };
        columns.push(name.clone());
        scaled.push(min_max_scale(values));
    }

    let rows = (0..basetable.row_count())
        .map(|row| scaled.iter().map(|col| Cell::Number(col[row])).collect())
        .collect();
    Frame { columns, rows }
}

fn min_max_scale(values: Vec<f64>) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return values;
    };
    let max = values.iter().copied().fold(min, f64::max);
    let range = max - min;
    // A constant column carries no signal; scale it to zero rather than
    // dividing by zero.
    if range == 0.0 {
        return vec![0.0; values.len()];
    }
    values.into_iter().map(|v| (v - min) / range).collect()
}
