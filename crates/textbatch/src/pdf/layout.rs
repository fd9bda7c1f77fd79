//! Positioned words from a page content stream.
//!
//! The page's content stream is interpreted just far enough to know where
//! each glyph lands: the graphics state (`q`, `Q`, `cm`), text objects and
//! positioning (`BT`, `Td`, `TD`, `Tm`, `T*`), text state (`Tf`, `Tc`, `Tw`,
//! `Tz`, `TL`, `Ts`) and the show operators (`Tj`, `TJ`, `'`, `"`). Glyph
//! widths come from the font's `Widths` array when present and fall back to a
//! fixed em fraction otherwise.
//!
//! Glyphs are then grouped into words the way the table module expects:
//! whitespace, a jump to another baseline, or a horizontal gap larger than a
//! fraction of the glyph height ends a word.
//!
//! Composite (Type0) fonts use multi-byte codes that cannot be mapped to text
//! without their CMaps; text drawn with them advances the cursor but yields no
//! words. This interpreter is the fallback for builds or machines without
//! pdfium; when pdfium is bound, words come from its character boxes instead
//! (see [`RasterSession::page_words`](super::RasterSession::page_words)).

use super::error::{PdfError, Result};
use super::text::PdfDocument;
use crate::extraction::table::TextBox;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object};
use std::collections::HashMap;

/// Glyph width, in text space units per unit font size, when the font has no metrics.
const DEFAULT_GLYPH_WIDTH: f64 = 0.5;

/// Courier and friends are monospaced at 600/1000.
const MONOSPACE_GLYPH_WIDTH: f64 = 0.6;

/// A horizontal gap larger than this fraction of the glyph height splits words.
const WORD_GAP_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f64, ty: f64) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other` in PDF row-vector convention.
    fn multiply(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn scale_x(&self) -> f64 {
        self.0[0].hypot(self.0[1])
    }

    fn scale_y(&self) -> f64 {
        self.0[2].hypot(self.0[3])
    }
}

/// Per-font glyph metrics.
#[derive(Debug, Clone)]
struct FontMetrics {
    first_char: i64,
    widths: Vec<f64>,
    missing_width: f64,
    composite: bool,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            missing_width: DEFAULT_GLYPH_WIDTH,
            composite: false,
        }
    }
}

impl FontMetrics {
    fn from_dict(doc: &PdfDocument<'_>, font: &Dictionary) -> Self {
        let name = |key: &[u8]| font.get(key).ok().and_then(|o| doc.resolve(o).as_name().ok());

        let composite = name(b"Subtype") == Some(b"Type0".as_slice());
        let monospace = name(b"BaseFont").is_some_and(|base| base.starts_with(b"Courier"));

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| doc.resolve(o).as_i64().ok())
            .unwrap_or(0);
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| doc.resolve(o).as_array().ok())
            .map(|values| {
                values
                    .iter()
                    .map(|v| doc.resolve(v).as_float().map(f64::from).unwrap_or(0.0) / 1000.0)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            first_char,
            widths,
            missing_width: if monospace {
                MONOSPACE_GLYPH_WIDTH
            } else {
                DEFAULT_GLYPH_WIDTH
            },
            composite,
        }
    }

    fn width(&self, code: u8) -> f64 {
        let index = i64::from(code) - self.first_char;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.widths.get(i))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.missing_width)
    }
}

/// Text state parameters, saved and restored with the graphics state.
#[derive(Debug, Clone)]
struct TextParams {
    font: Option<Vec<u8>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Glyph with position information, PDF user space (bottom-left origin).
#[derive(Debug, Clone)]
pub(crate) struct CharInfo {
    pub(crate) text: char,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

struct Interpreter<'f> {
    fonts: &'f HashMap<Vec<u8>, FontMetrics>,
    fallback_font: FontMetrics,
    ctm: Matrix,
    text_matrix: Matrix,
    line_matrix: Matrix,
    params: TextParams,
    stack: Vec<(Matrix, TextParams)>,
    chars: Vec<CharInfo>,
    skipped_composite: bool,
}

fn number(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(|o| o.as_float().ok()).map(f64::from)
}

impl<'f> Interpreter<'f> {
    fn new(fonts: &'f HashMap<Vec<u8>, FontMetrics>) -> Self {
        Self {
            fonts,
            fallback_font: FontMetrics::default(),
            ctm: Matrix::IDENTITY,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            params: TextParams::default(),
            stack: Vec::new(),
            chars: Vec::new(),
            skipped_composite: false,
        }
    }

    fn run(&mut self, operations: &[Operation]) {
        for op in operations {
            self.apply(op);
        }
    }

    fn apply(&mut self, op: &Operation) {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => self.stack.push((self.ctm, self.params.clone())),
            "Q" => {
                if let Some((ctm, params)) = self.stack.pop() {
                    self.ctm = ctm;
                    self.params = params;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.ctm = m.multiply(&self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                self.params.font = operands.first().and_then(|o| o.as_name().ok()).map(<[u8]>::to_vec);
                if let Some(size) = number(operands, 1) {
                    self.params.font_size = size;
                }
            }
            "Tc" => self.params.char_spacing = number(operands, 0).unwrap_or(0.0),
            "Tw" => self.params.word_spacing = number(operands, 0).unwrap_or(0.0),
            "Tz" => self.params.horizontal_scale = number(operands, 0).unwrap_or(100.0) / 100.0,
            "TL" => self.params.leading = number(operands, 0).unwrap_or(0.0),
            "Ts" => self.params.rise = number(operands, 0).unwrap_or(0.0),
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.params.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.params.word_spacing = number(operands, 0).unwrap_or(self.params.word_spacing);
                self.params.char_spacing = number(operands, 1).unwrap_or(self.params.char_spacing);
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Ok(adjust) = other.as_float() {
                                    let tx = -f64::from(adjust) / 1000.0
                                        * self.params.font_size
                                        * self.params.horizontal_scale;
                                    self.advance(tx);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.params.leading;
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f64) {
        self.text_matrix = Matrix::translation(tx, 0.0).multiply(&self.text_matrix);
    }

    fn show(&mut self, bytes: &[u8]) {
        let fonts = self.fonts;
        let font = self
            .params
            .font
            .as_ref()
            .and_then(|name| fonts.get(name))
            .unwrap_or(&self.fallback_font)
            .clone();
        let size = self.params.font_size;
        let scale = self.params.horizontal_scale;

        if font.composite {
            self.skipped_composite = true;
            for _ in bytes.chunks(2) {
                let tx = (DEFAULT_GLYPH_WIDTH * size + self.params.char_spacing) * scale;
                self.advance(tx);
            }
            return;
        }

        for &code in bytes {
            let glyph_width = font.width(code);
            let render = Matrix([size * scale, 0.0, 0.0, size, 0.0, self.params.rise])
                .multiply(&self.text_matrix)
                .multiply(&self.ctm);

            self.chars.push(CharInfo {
                text: decode_byte(code),
                x: render.0[4],
                y: render.0[5],
                width: glyph_width * render.scale_x(),
                height: render.scale_y(),
            });

            let word_spacing = if code == b' ' { self.params.word_spacing } else { 0.0 };
            let tx = (glyph_width * size + self.params.char_spacing + word_spacing) * scale;
            self.advance(tx);
        }
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    let mut m = [0.0; 6];
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = number(operands, i)?;
    }
    Some(Matrix(m))
}

/// Simple-font byte to character, Latin-1 with control codes mapped to space.
fn decode_byte(code: u8) -> char {
    if code < 0x20 || code == 0x7f { ' ' } else { char::from(code) }
}

/// Determine if a new glyph should start a new word.
fn should_start_new_word(current_word_chars: &[CharInfo], new_char: &CharInfo) -> bool {
    let Some(last_char) = current_word_chars.last() else {
        return false;
    };

    let height = last_char.height.max(new_char.height);
    let vertical_distance = (new_char.y - last_char.y).abs();
    if vertical_distance > height * 0.5 {
        return true;
    }

    let horizontal_gap = new_char.x - (last_char.x + last_char.width);
    horizontal_gap > height * WORD_GAP_RATIO || horizontal_gap < -height * 0.5
}

/// Convert a run of glyphs into a top-left-origin word box.
fn finalize_word(chars: &[CharInfo], page_top: f64) -> Option<TextBox> {
    if chars.is_empty() {
        return None;
    }
    let text: String = chars.iter().map(|c| c.text).collect();

    let left = chars.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
    let right = chars.iter().map(|c| c.x + c.width).fold(f64::NEG_INFINITY, f64::max);
    let bottom = chars.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
    let top = chars.iter().map(|c| c.y + c.height).fold(f64::NEG_INFINITY, f64::max);

    Some(TextBox::new(text, left, page_top - top, right - left, top - bottom))
}

/// Group glyphs in drawing order into top-left-origin word boxes.
pub(crate) fn group_chars_into_words(chars: &[CharInfo], page_top: f64) -> Vec<TextBox> {
    let mut words = Vec::new();
    let mut current: Vec<CharInfo> = Vec::new();

    for ch in chars {
        if ch.text.is_whitespace() {
            words.extend(finalize_word(&current, page_top));
            current.clear();
            continue;
        }
        if should_start_new_word(&current, ch) {
            words.extend(finalize_word(&current, page_top));
            current.clear();
        }
        current.push(ch.clone());
    }
    words.extend(finalize_word(&current, page_top));
    words
}

fn load_fonts(doc: &PdfDocument<'_>, page_number: u32) -> HashMap<Vec<u8>, FontMetrics> {
    let Some(fonts) = doc.resource_category(page_number, b"Font") else {
        return HashMap::new();
    };
    fonts
        .iter()
        .filter_map(|(name, value)| {
            let dict = doc.resolve(value).as_dict().ok()?;
            Some((name.clone(), FontMetrics::from_dict(doc, dict)))
        })
        .collect()
}

/// Extract positioned words from one page, in top-left page coordinates.
///
/// # Errors
///
/// `ContentStreamFailed` when the page content cannot be read or decoded.
pub fn extract_words_from_page(doc: &PdfDocument<'_>, page_number: u32) -> Result<Vec<TextBox>> {
    let data = doc.page_content(page_number)?;
    let content = Content::decode(&data)
        .map_err(|e| PdfError::ContentStreamFailed(format!("page {}: {}", page_number, e)))?;

    let fonts = load_fonts(doc, page_number);
    let mut interpreter = Interpreter::new(&fonts);
    interpreter.run(&content.operations);

    if interpreter.skipped_composite {
        tracing::debug!(page = page_number, "Composite font text skipped for layout analysis");
    }

    let page_top = doc.media_box(page_number)[3];
    Ok(group_chars_into_words(&interpreter.chars, page_top))
}
