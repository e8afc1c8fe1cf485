use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::PipelineError;
use crate::frame::{Cell, Frame};

static TABLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("static selector"));
static HEAD_ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead tr").expect("static selector"));
static BODY_ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody tr").expect("static selector"));
static CELL_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").expect("static selector"));

/// One table lifted out of a page: header names plus text cells, nothing
/// interpreted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub table_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn into_frame(self) -> Frame {
        let RawTable { columns, rows, .. } = self;
        let rows = rows
            .into_iter()
            .map(|row| row.iter().map(|raw| Cell::from_raw(raw)).collect())
            .collect();
        Frame { columns, rows }
    }
}

/// Find the table with the given id and flatten it. Tables basketball-reference
/// ships inside HTML comments (rendered lazily client-side) are found by
/// re-parsing any comment that mentions the id.
pub fn extract_table(
    html: &str,
    table_id: &str,
    context: &str,
) -> Result<RawTable, PipelineError> {
    let document = Html::parse_document(html);
    if let Some(table) = find_table(&document, table_id) {
        return Ok(read_table(table, table_id));
    }

    for node in document.tree.nodes() {
        let Node::Comment(comment) = node.value() else {
            continue;
        };
        let text: &str = comment;
        if !text.contains(table_id) {
            continue;
        }
        let inner = Html::parse_document(text);
        if let Some(table) = find_table(&inner, table_id) {
            return Ok(read_table(table, table_id));
        }
    }

    Err(PipelineError::TableNotFound {
        table_id: table_id.to_string(),
        context: context.to_string(),
    })
}

fn find_table<'a>(document: &'a Html, table_id: &str) -> Option<ElementRef<'a>> {
    document
        .select(&TABLE_SEL)
        .find(|el| el.value().id() == Some(table_id))
}

fn read_table(table: ElementRef<'_>, table_id: &str) -> RawTable {
    // Spanner rows sit above the real header; only the innermost (last)
    // header row names the columns.
    let mut columns = table
        .select(&HEAD_ROW_SEL)
        .last()
        .map(row_cells)
        .unwrap_or_default();

    let mut rows = Vec::new();
    for row in table.select(&BODY_ROW_SEL) {
        if is_header_row(&row) {
            continue;
        }
        let cells = row_cells(row);
        if cells.is_empty() {
            continue;
        }
        if columns.is_empty() {
            columns = cells;
            continue;
        }
        rows.push(cells);
    }

    for row in &mut rows {
        row.resize(columns.len(), String::new());
    }

    RawTable {
        table_id: table_id.to_string(),
        columns,
        rows,
    }
}

// Long tables repeat their header mid-body as tr.thead; division tables use
// the same class for their group label rows.
fn is_header_row(row: &ElementRef<'_>) -> bool {
    row.value()
        .classes()
        .any(|class| class == "thead" || class == "over_header")
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SEL)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VISIBLE: &str = r#"
        <html><body>
        <table id="per_game_stats">
          <thead>
            <tr class="over_header"><th colspan="2">Totals</th><th>Shooting</th></tr>
            <tr><th>Rk</th><th>Player</th><th>PTS</th></tr>
          </thead>
          <tbody>
            <tr><th>1</th><td>Alpha One</td><td>30.1</td></tr>
            <tr class="thead"><th>Rk</th><th>Player</th><th>PTS</th></tr>
            <tr><th>2</th><td>Beta Two</td><td>28.4</td></tr>
          </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn reads_innermost_header_and_skips_repeats() {
        let table = extract_table(VISIBLE, "per_game_stats", "test page").expect("table");
        assert_eq!(table.columns, vec!["Rk", "Player", "PTS"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["1", "Alpha One", "30.1"]);
        assert_eq!(table.rows[1], vec!["2", "Beta Two", "28.4"]);
    }

    #[test]
    fn finds_table_hidden_in_a_comment() {
        let html = r#"
            <html><body>
            <div id="all_divs_standings_W">
            <!--
            <table id="divs_standings_W">
              <thead><tr><th>Western Conference</th><th>W</th></tr></thead>
              <tbody><tr><th>Vegas Sharks</th><td>50</td></tr></tbody>
            </table>
            -->
            </div>
            </body></html>
        "#;
        let table = extract_table(html, "divs_standings_W", "test page").expect("table");
        assert_eq!(table.columns, vec!["Western Conference", "W"]);
        assert_eq!(table.rows, vec![vec!["Vegas Sharks", "50"]]);
    }

    #[test]
    fn missing_table_reports_id_and_context() {
        let err = extract_table("<html></html>", "mvp", "awards 2020").unwrap_err();
        match err {
            PipelineError::TableNotFound { table_id, context } => {
                assert_eq!(table_id, "mvp");
                assert_eq!(context, "awards 2020");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let html = r#"
            <table id="t">
              <thead><tr><th>A</th><th>B</th><th>C</th></tr></thead>
              <tbody><tr><td>1</td><td>2</td></tr></tbody>
            </table>
        "#;
        let table = extract_table(html, "t", "test page").expect("table");
        assert_eq!(table.rows, vec![vec!["1", "2", ""]]);
    }

    #[test]
    fn nested_markup_flattens_to_cell_text() {
        let html = r#"
            <table id="t">
              <thead><tr><th>Player</th></tr></thead>
              <tbody><tr><td><a href="/x"><strong>Gamma Three</strong></a>*</td></tr></tbody>
            </table>
        "#;
        let table = extract_table(html, "t", "test page").expect("table");
        assert_eq!(table.rows, vec![vec!["Gamma Three*"]]);
    }

    #[test]
    fn empty_source_cells_become_null_frame_cells() {
        let table = RawTable {
            table_id: "t".to_string(),
            columns: vec!["GB".to_string()],
            rows: vec![vec![String::new()], vec!["1.5".to_string()]],
        };
        let frame = table.into_frame();
        assert_eq!(frame.rows[0][0], Cell::Null);
        assert_eq!(frame.rows[1][0], Cell::text("1.5"));
    }
}
