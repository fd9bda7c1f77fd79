//! DOCX (WordprocessingML) text extraction.
//!
//! Reads `word/document.xml` from the package and walks the body in document
//! order. Paragraphs become lines; tables are rendered in place through
//! [`render_table`] so their cell values stay next to the prose around them.
//!
//! Elements are matched by local name, so documents produced by tools that
//! use a non-standard namespace prefix are handled the same way.

use crate::error::{Result, TextbatchError};
use crate::extraction::table::render_table;
use crate::types::Table;
use roxmltree::{Document, Node};
use std::io::{Cursor, Read};

const DOCUMENT_XML: &str = "word/document.xml";

/// Text and tables of a DOCX document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxContent {
    pub text: String,
    pub tables: Vec<Table>,
}

/// Extract text from DOCX bytes.
///
/// Each paragraph contributes one line (empty paragraphs an empty line).
/// Each table contributes a `Table N:` block with one line per row, cells
/// joined by `delimiter`. Tables are numbered from 1 in document order.
///
/// # Errors
///
/// `Decoding` when the bytes are not a ZIP archive, `word/document.xml` is
/// missing, or the XML is malformed.
pub fn extract_docx(bytes: &[u8], delimiter: &str) -> Result<DocxContent> {
    let xml = read_document_xml(bytes)?;
    let doc = Document::parse(&xml)
        .map_err(|e| TextbatchError::decoding_with_source(format!("Failed to parse {}", DOCUMENT_XML), e))?;

    let body = doc
        .root_element()
        .children()
        .find(|n| n.tag_name().name() == "body")
        .ok_or_else(|| TextbatchError::decoding(format!("{} has no body element", DOCUMENT_XML)))?;

    let mut walker = BodyWalker {
        delimiter,
        lines: Vec::new(),
        tables: Vec::new(),
    };
    walker.block_children(body);

    Ok(DocxContent {
        text: walker.lines.join("\n"),
        tables: walker.tables,
    })
}

fn read_document_xml(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| TextbatchError::decoding_with_source("Not a valid DOCX (ZIP) archive", e))?;

    let mut file = archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| TextbatchError::decoding_with_source(format!("DOCX is missing {}", DOCUMENT_XML), e))?;

    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| TextbatchError::decoding_with_source(format!("Failed to read {}", DOCUMENT_XML), e))?;
    Ok(xml)
}

struct BodyWalker<'d> {
    delimiter: &'d str,
    lines: Vec<String>,
    tables: Vec<Table>,
}

impl BodyWalker<'_> {
    fn block_children(&mut self, parent: Node) {
        for node in parent.children().filter(Node::is_element) {
            match node.tag_name().name() {
                "p" => self.lines.push(paragraph_text(node)),
                "tbl" => {
                    let table = Table {
                        cells: table_cells(node),
                        page_number: None,
                    };
                    if table.cells.is_empty() {
                        continue;
                    }
                    self.lines
                        .push(render_table(self.tables.len() + 1, &table, self.delimiter));
                    self.tables.push(table);
                }
                // Content controls wrap ordinary block content.
                "sdt" => {
                    if let Some(content) = node.children().find(|n| n.tag_name().name() == "sdtContent") {
                        self.block_children(content);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Text of one paragraph, with tabs and breaks preserved.
fn paragraph_text(paragraph: Node) -> String {
    let mut text = String::new();
    inline_text(paragraph, &mut text);
    text
}

fn inline_text(node: Node, out: &mut String) {
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "t" => {
                if let Some(t) = child.text() {
                    out.push_str(t);
                }
            }
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            "noBreakHyphen" => out.push('-'),
            // Paragraph properties and deleted runs carry no visible text.
            "pPr" | "rPr" | "del" => {}
            _ => inline_text(child, out),
        }
    }
}

fn table_cells(table: Node) -> Vec<Vec<String>> {
    table
        .children()
        .filter(|n| n.tag_name().name() == "tr")
        .map(|row| {
            row.children()
                .filter(|n| n.tag_name().name() == "tc")
                .map(cell_text)
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// Text of a cell: its paragraphs and any nested tables, space separated.
fn cell_text(cell: Node) -> String {
    let mut parts = Vec::new();
    collect_cell_parts(cell, &mut parts);
    parts.join(" ")
}

fn collect_cell_parts(node: Node, parts: &mut Vec<String>) {
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "p" => {
                let text = paragraph_text(child);
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
            "tbl" => {
                for row in table_cells(child) {
                    parts.extend(row.into_iter().filter(|cell| !cell.is_empty()));
                }
            }
            "tcPr" => {}
            _ => collect_cell_parts(child, parts),
        }
    }
}
