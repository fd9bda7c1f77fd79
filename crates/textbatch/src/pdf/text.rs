//! lopdf-backed document access: page enumeration, text layer, and object
//! resolution helpers shared by the layout and image modules.

use super::error::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// US Letter, used when a page has no usable MediaBox.
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Reference chains and Parent chains longer than this are treated as broken.
const MAX_RESOLVE_DEPTH: usize = 32;

/// A parsed PDF plus the bytes it came from.
pub struct PdfDocument<'a> {
    bytes: &'a [u8],
    document: Document,
    pages: Vec<(u32, ObjectId)>,
}

impl<'a> PdfDocument<'a> {
    /// Parse `bytes`.
    ///
    /// # Errors
    ///
    /// `PdfError::InvalidPdf` when the bytes are not a readable PDF. A
    /// document without pages loads and yields no page numbers.
    pub fn load(bytes: &'a [u8]) -> Result<Self> {
        let document = Document::load_mem(bytes)?;
        let pages: Vec<(u32, ObjectId)> = document.get_pages().into_iter().collect();
        Ok(Self { bytes, document, pages })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 1-indexed page numbers in document order.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().map(|(number, _)| *number)
    }

    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        self.pages
            .iter()
            .find(|(number, _)| *number == page_number)
            .map(|(_, id)| *id)
            .ok_or(PdfError::PageNotFound(page_number as usize))
    }

    pub fn lopdf(&self) -> &Document {
        &self.document
    }

    /// Text layer of one page, as lopdf decodes it.
    pub fn page_text(&self, page_number: u32) -> Result<String> {
        self.page_id(page_number)?;
        self.document
            .extract_text(&[page_number])
            .map_err(|e| PdfError::TextExtractionFailed(format!("page {}: {}", page_number, e)))
    }

    /// Decoded content stream bytes of one page.
    pub fn page_content(&self, page_number: u32) -> Result<Vec<u8>> {
        let page_id = self.page_id(page_number)?;
        self.document
            .get_page_content(page_id)
            .map_err(|e| PdfError::ContentStreamFailed(format!("page {}: {}", page_number, e)))
    }

    /// `[llx, lly, urx, ury]` of the page, honouring inheritance.
    pub fn media_box(&self, page_number: u32) -> [f64; 4] {
        let Ok(page_id) = self.page_id(page_number) else {
            return DEFAULT_MEDIA_BOX;
        };
        let Some(Ok(values)) = self.inherited(page_id, b"MediaBox").map(Object::as_array) else {
            return DEFAULT_MEDIA_BOX;
        };
        let numbers: Vec<f64> = values
            .iter()
            .filter_map(|v| self.resolve(v).as_float().ok())
            .map(f64::from)
            .collect();
        match numbers.as_slice() {
            [llx, lly, urx, ury] if urx > llx && ury > lly => [*llx, *lly, *urx, *ury],
            _ => DEFAULT_MEDIA_BOX,
        }
    }

    /// Follow indirect references to the underlying object.
    pub(crate) fn resolve<'d>(&'d self, object: &'d Object) -> &'d Object {
        let mut current = object;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                Object::Reference(id) => match self.document.get_object(*id) {
                    Ok(next) => current = next,
                    Err(_) => break,
                },
                _ => break,
            }
        }
        current
    }

    /// Look up `key` on the page dictionary, walking up the Parent chain.
    pub(crate) fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.document.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_RESOLVE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(self.resolve(value));
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.document.get_dictionary(parent).ok()?;
        }
        None
    }

    /// The page's Resources dictionary, honouring inheritance.
    pub(crate) fn page_resources(&self, page_number: u32) -> Option<&Dictionary> {
        let page_id = self.page_id(page_number).ok()?;
        self.inherited(page_id, b"Resources")?.as_dict().ok()
    }

    /// A named sub-dictionary of the page resources (`Font`, `XObject`, ...).
    pub(crate) fn resource_category(&self, page_number: u32, category: &[u8]) -> Option<&Dictionary> {
        let resources = self.page_resources(page_number)?;
        self.resolve(resources.get(category).ok()?).as_dict().ok()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// Build a PDF whose pages carry the given content stream operations.
    ///
    /// All pages share a Courier font `F1` and an 8x8 white image `Im1`.
    pub fn pdf_with_pages(pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 8,
                "Height" => 8,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![255u8; 64],
        ));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
            "XObject" => dictionary! {
                "Im1" => image_id,
            },
        });

        let mut kids = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// Draws the shared 8x8 gray image `Im1` full page, with no text.
    pub fn image_ops() -> Vec<Operation> {
        vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![595.into(), 0.into(), 0.into(), 842.into(), 0.into(), 0.into()]),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ]
    }

    pub fn text_ops(x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }
}
