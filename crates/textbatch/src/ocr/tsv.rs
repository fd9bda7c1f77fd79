//! Tesseract TSV output parsing.
//!
//! Tesseract's `tsv` config writes one row per layout element with the
//! columns `level page_num block_num par_num line_num word_num left top width
//! height conf text`. Only word rows (level 5) carry text.

use crate::extraction::table::TextBox;

pub(crate) const TSV_WORD_LEVEL: u32 = 5;
pub(crate) const TSV_MIN_FIELDS: usize = 12;

/// Extract word boxes from Tesseract TSV output.
///
/// Rows that are malformed, not word level, below `min_confidence`, or
/// carry blank text are skipped.
pub fn extract_words_from_tsv(tsv_data: &str, min_confidence: f64) -> Vec<TextBox> {
    let mut words = Vec::new();

    for (line_num, line) in tsv_data.lines().enumerate() {
        if line_num == 0 {
            continue;
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        let level = fields[0].trim().parse::<u32>().unwrap_or(0);
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let conf = fields[10].trim().parse::<f64>().unwrap_or(-1.0);
        if conf < min_confidence {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let number = |idx: usize| fields[idx].trim().parse::<f64>().unwrap_or(0.0);
        words.push(TextBox::new(text, number(6), number(7), number(8), number(9)));
    }

    words
}
