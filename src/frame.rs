use crate::error::PipelineError;

/// A single table value. Pages give us text; the merge step decides what
/// becomes numeric. `Null` marks cells that were empty in the source or
/// created by an outer join.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Empty page cells behave like missing values downstream.
    pub fn from_raw(value: &str) -> Self {
        if value.is_empty() {
            Cell::Null
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // f64::parse accepts "inf"/"NaN" spellings; in a stat table those are
    // text, not numbers.
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }

    pub fn require_column(&self, name: &str, context: &str) -> Result<usize, PipelineError> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::ColumnNotFound {
                column: name.to_string(),
                context: context.to_string(),
            })
    }

    /// New frame holding the named columns in the given order.
    pub fn project(&self, names: &[&str], context: &str) -> Result<Frame, PipelineError> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            indices.push(self.require_column(name, context)?);
        }
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
            .collect();
        Ok(Frame {
            columns: names.iter().map(|name| name.to_string()).collect(),
            rows,
        })
    }

    pub fn rename_column(
        &mut self,
        from: &str,
        to: &str,
        context: &str,
    ) -> Result<(), PipelineError> {
        let idx = self.require_column(from, context)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str, context: &str) -> Result<(), PipelineError> {
        let idx = self.require_column(name, context)?;
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(())
    }

    pub fn add_constant_column(&mut self, name: impl Into<String>, value: Cell) {
        self.columns.push(name.into());
        for row in &mut self.rows {
            row.push(value.clone());
        }
    }

    /// Stack frames top to bottom. Columns are the union in first-seen
    /// order; cells a frame does not have come back `Null`.
    pub fn concat(frames: impl IntoIterator<Item = Frame>) -> Frame {
        let frames = frames.into_iter().collect::<Vec<_>>();
        let mut columns: Vec<String> = Vec::new();
        for frame in &frames {
            for col in &frame.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for frame in frames {
            let mapping = columns
                .iter()
                .map(|col| frame.column_index(col))
                .collect::<Vec<_>>();
            for row in frame.rows {
                let out = mapping
                    .iter()
                    .map(|idx| match idx {
                        Some(idx) => row[*idx].clone(),
                        None => Cell::Null,
                    })
                    .collect();
                rows.push(out);
            }
        }
        Frame { columns, rows }
    }

    pub fn fill_nulls_in(
        &mut self,
        names: &[&str],
        value: &Cell,
        context: &str,
    ) -> Result<(), PipelineError> {
        for name in names {
            let idx = self.require_column(name, context)?;
            for row in &mut self.rows {
                if row[idx].is_null() {
                    row[idx] = value.clone();
                }
            }
        }
        Ok(())
    }

    pub fn fill_all_nulls(&mut self, value: &Cell) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if cell.is_null() {
                    *cell = value.clone();
                }
            }
        }
    }

    /// Column-at-a-time numeric coercion: a column converts only if every
    /// non-null cell parses, otherwise it is left exactly as it was. Mixed
    /// columns therefore stay textual instead of half-converting.
    pub fn coerce_numeric_columns(&mut self) {
        for idx in 0..self.columns.len() {
            let mut parsed = Vec::with_capacity(self.rows.len());
            let mut all_numeric = true;
            for row in &self.rows {
                match &row[idx] {
                    Cell::Null => parsed.push(None),
                    Cell::Number(value) => parsed.push(Some(*value)),
                    Cell::Text(raw) => match parse_number(raw) {
                        Some(value) => parsed.push(Some(value)),
                        None => {
                            all_numeric = false;
                            break;
                        }
                    },
                }
            }
            if !all_numeric {
                continue;
            }
            for (row, value) in self.rows.iter_mut().zip(parsed) {
                if let Some(value) = value {
                    row[idx] = Cell::Number(value);
                }
            }
        }
    }

    /// All values of a column when the whole column is numeric.
    pub fn column_as_numbers(&self, idx: usize) -> Option<Vec<f64>> {
        self.rows.iter().map(|row| row[idx].as_number()).collect()
    }
}
