pub mod docx;
pub mod table;
pub mod text;

pub use docx::{DocxContent, extract_docx};
pub use table::{TextBox, detect_tables, render_table, render_tables};
pub use text::decode_utf8;
