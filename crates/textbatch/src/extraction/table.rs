//! Table detection from positioned words, and table rendering.
//!
//! Words come either from a PDF content stream or from OCR word boxes; both
//! are normalised to [`TextBox`] in a top-left coordinate system. Detection is
//! purely geometric:
//!
//! 1. Words are grouped into lines by vertical centre.
//! 2. A line is split into cells wherever the horizontal gap between two
//!    neighbouring words exceeds `column_gap_ratio` times the median word
//!    height.
//! 3. A table is a run of at least `min_rows` consecutive lines that each have
//!    at least `min_columns` cells.
//!
//! Rendering produces a `Table N:` header followed by one line per row, cells
//! joined by the configured delimiter.

use crate::core::config::TableConfig;
use crate::types::Table;

/// A word with its bounding box, top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TextBox {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Words sharing a baseline, left to right.
#[derive(Debug, Clone)]
struct Line {
    words: Vec<TextBox>,
}

impl Line {
    fn center_y(&self) -> f64 {
        let sum: f64 = self.words.iter().map(TextBox::center_y).sum();
        sum / self.words.len() as f64
    }

    fn height(&self) -> f64 {
        self.words.iter().map(|w| w.height).fold(0.0, f64::max)
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Group words into lines, top to bottom.
fn group_into_lines(words: &[TextBox]) -> Vec<Line> {
    let mut sorted: Vec<&TextBox> = words.iter().filter(|w| !w.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Line> = Vec::new();
    for word in sorted {
        let joins_last = lines.last().is_some_and(|line| {
            let tolerance = line.height().max(word.height) * 0.5;
            (word.center_y() - line.center_y()).abs() <= tolerance
        });

        match lines.last_mut() {
            Some(line) if joins_last => line.words.push(word.clone()),
            _ => lines.push(Line {
                words: vec![word.clone()],
            }),
        }
    }

    for line in &mut lines {
        line.words.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

/// Split a line into cells at gaps wider than `gap_threshold`.
fn split_cells(line: &Line, gap_threshold: f64) -> Vec<String> {
    let mut cells: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut last_right: Option<f64> = None;

    for word in &line.words {
        if let Some(right) = last_right {
            if word.x - right > gap_threshold {
                cells.push(std::mem::take(&mut current));
            } else {
                current.push(' ');
            }
        }
        current.push_str(word.text.trim());
        last_right = Some(word.right());
    }
    if !current.is_empty() {
        cells.push(current);
    }
    cells
}

/// Detect tables among positioned words.
///
/// Returns an empty vector when detection is disabled or no run of aligned
/// rows qualifies.
pub fn detect_tables(words: &[TextBox], config: &TableConfig, page_number: Option<usize>) -> Vec<Table> {
    if !config.enabled || words.is_empty() {
        return Vec::new();
    }

    let mut heights: Vec<f64> = words.iter().map(|w| w.height).filter(|h| *h > 0.0).collect();
    let Some(median_height) = median(&mut heights) else {
        return Vec::new();
    };
    let gap_threshold = median_height * config.column_gap_ratio;

    let rows: Vec<Vec<String>> = group_into_lines(words)
        .iter()
        .map(|line| split_cells(line, gap_threshold))
        .collect();

    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();
    for row in rows.into_iter().chain(std::iter::once(Vec::new())) {
        if row.len() >= config.min_columns {
            run.push(row);
            continue;
        }
        if run.len() >= config.min_rows {
            tables.push(Table {
                cells: std::mem::take(&mut run),
                page_number,
            });
        } else {
            run.clear();
        }
    }

    tables
}

/// Render one table under a `Table N:` header.
pub fn render_table(number: usize, table: &Table, delimiter: &str) -> String {
    let mut out = format!("Table {}:", number);
    for row in &table.cells {
        out.push('\n');
        out.push_str(&row.join(delimiter));
    }
    out
}

/// Render tables as consecutive blocks separated by blank lines, numbered from 1.
pub fn render_tables(tables: &[Table], delimiter: &str) -> String {
    tables
        .iter()
        .enumerate()
        .map(|(i, table)| render_table(i + 1, table, delimiter))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f64, y: f64) -> TextBox {
        TextBox::new(text, x, y, text.len() as f64 * 6.0, 12.0)
    }

    fn grid() -> Vec<TextBox> {
        vec![
            word("Name", 50.0, 100.0),
            word("Age", 200.0, 100.0),
            word("Alice", 50.0, 120.0),
            word("30", 200.0, 121.0),
            word("Bob", 50.0, 140.0),
            word("41", 200.0, 139.5),
        ]
    }

    #[test]
    fn test_detects_simple_grid() {
        let tables = detect_tables(&grid(), &TableConfig::default(), Some(2));
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].cells,
            vec![vec!["Name", "Age"], vec!["Alice", "30"], vec!["Bob", "41"]]
        );
        assert_eq!(tables[0].page_number, Some(2));
    }

    #[test]
    fn test_words_within_cell_are_joined() {
        let words = vec![
            word("First", 50.0, 100.0),
            word("Name", 86.0, 100.0),
            word("City", 250.0, 100.0),
            word("Ada", 50.0, 120.0),
            word("Lovelace", 74.0, 120.0),
            word("London", 250.0, 120.0),
        ];
        let tables = detect_tables(&words, &TableConfig::default(), None);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].cells[0], vec!["First Name", "City"]);
        assert_eq!(tables[0].cells[1], vec!["Ada Lovelace", "London"]);
    }

    #[test]
    fn test_prose_is_not_a_table() {
        let words = vec![
            word("The", 50.0, 100.0),
            word("quick", 74.0, 100.0),
            word("brown", 110.0, 100.0),
            word("fox", 50.0, 120.0),
            word("jumps", 74.0, 120.0),
        ];
        assert!(detect_tables(&words, &TableConfig::default(), None).is_empty());
    }

    #[test]
    fn test_single_aligned_row_is_not_a_table() {
        let words = vec![word("Total", 50.0, 100.0), word("99", 200.0, 100.0)];
        assert!(detect_tables(&words, &TableConfig::default(), None).is_empty());
    }

    #[test]
    fn test_prose_line_splits_tables() {
        let mut words = grid();
        words.push(word("Note", 50.0, 160.0));
        words.push(word("X", 50.0, 180.0));
        words.push(word("Y", 200.0, 180.0));
        words.push(word("Z", 50.0, 200.0));
        words.push(word("W", 200.0, 200.0));

        let tables = detect_tables(&words, &TableConfig::default(), None);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].row_count(), 3);
        assert_eq!(tables[1].cells, vec![vec!["X", "Y"], vec!["Z", "W"]]);
    }

    #[test]
    fn test_min_rows_and_columns_respected() {
        let config = TableConfig {
            min_rows: 4,
            ..TableConfig::default()
        };
        assert!(detect_tables(&grid(), &config, None).is_empty());

        let config = TableConfig {
            min_columns: 3,
            ..TableConfig::default()
        };
        assert!(detect_tables(&grid(), &config, None).is_empty());
    }

    #[test]
    fn test_disabled_detection() {
        let config = TableConfig {
            enabled: false,
            ..TableConfig::default()
        };
        assert!(detect_tables(&grid(), &config, None).is_empty());
    }

    #[test]
    fn test_unsorted_input() {
        let mut words = grid();
        words.reverse();
        let tables = detect_tables(&words, &TableConfig::default(), None);
        assert_eq!(tables[0].cells[0], vec!["Name", "Age"]);
    }

    #[test]
    fn test_render_tables() {
        let table = Table {
            cells: vec![vec!["A".into(), "B".into()], vec!["C".into(), "D".into()]],
            page_number: None,
        };
        let rendered = render_tables(&[table.clone(), table], " | ");
        assert_eq!(rendered, "Table 1:\nA | B\nC | D\n\nTable 2:\nA | B\nC | D");
    }

    #[test]
    fn test_render_with_custom_delimiter() {
        let table = Table {
            cells: vec![vec!["x".into(), "y".into(), "z".into()]],
            page_number: Some(1),
        };
        assert_eq!(render_table(3, &table, "\t"), "Table 3:\nx\ty\tz");
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }
}
