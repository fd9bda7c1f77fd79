//! Embedded image extraction.
//!
//! Scanned PDFs usually carry each page as one image XObject. Images are
//! returned in the order the page content draws them (`Do`), each decoded to a
//! [`DynamicImage`]:
//!
//! - `DCTDecode` streams are JPEG files and go straight to the `image` crate.
//! - Unfiltered, `FlateDecode` and `LZWDecode` streams are raw samples in
//!   DeviceGray, DeviceRGB or DeviceCMYK (also via ICCBased), 8 bits per
//!   component, or 1-bit gray / image masks.
//!
//! JPEG 2000, JBIG2, CCITT and indexed images are reported as undecodable.

use super::error::{PdfError, Result};
use super::text::PdfDocument;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::content::Content;
use lopdf::{Dictionary, Object, Stream};

#[derive(Debug)]
pub struct PdfImage {
    /// Resource name the page uses to draw the image
    pub name: String,
    pub image: DynamicImage,
}

/// Names of XObjects drawn by the page, in drawing order, without repeats.
fn drawn_xobject_names(doc: &PdfDocument<'_>, page_number: u32) -> Option<Vec<Vec<u8>>> {
    let data = doc.page_content(page_number).ok()?;
    let content = Content::decode(&data).ok()?;
    let mut names: Vec<Vec<u8>> = Vec::new();
    for op in content.operations.iter().filter(|op| op.operator == "Do") {
        if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok())
            && !names.iter().any(|n| n.as_slice() == name)
        {
            names.push(name.to_vec());
        }
    }
    Some(names)
}

fn filters(doc: &PdfDocument<'_>, dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter").map(|o| doc.resolve(o)) {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| doc.resolve(item).as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn integer(doc: &PdfDocument<'_>, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).ok().and_then(|o| doc.resolve(o).as_i64().ok())
}

/// Number of colour components for a colour space, if supported.
fn components(doc: &PdfDocument<'_>, color_space: &Object) -> Option<u8> {
    match doc.resolve(color_space) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
            b"DeviceCMYK" | b"CMYK" => Some(4),
            _ => None,
        },
        Object::Array(items) => {
            let family = items.first().and_then(|o| doc.resolve(o).as_name().ok())?;
            match family {
                b"ICCBased" => {
                    let profile = doc.resolve(items.get(1)?).as_stream().ok()?;
                    let n = integer(doc, &profile.dict, b"N")?;
                    u8::try_from(n).ok().filter(|n| matches!(n, 1 | 3 | 4))
                }
                b"CalGray" => Some(1),
                b"CalRGB" => Some(3),
                _ => None,
            }
        }
        _ => None,
    }
}

fn is_inverted(doc: &PdfDocument<'_>, dict: &Dictionary) -> bool {
    let Ok(decode) = dict.get(b"Decode").map(|o| doc.resolve(o)) else {
        return false;
    };
    let Ok(values) = decode.as_array() else {
        return false;
    };
    let first = values.first().and_then(|v| v.as_float().ok());
    let second = values.get(1).and_then(|v| v.as_float().ok());
    matches!((first, second), (Some(a), Some(b)) if a > b)
}

fn cmyk_to_rgb(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

fn unpack_bilevel(data: &[u8], width: u32, height: u32, inverted: bool) -> Option<GrayImage> {
    let row_bytes = (width as usize).div_ceil(8);
    if data.len() < row_bytes * height as usize {
        return None;
    }
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for row in data.chunks_exact(row_bytes).take(height as usize) {
        for x in 0..width as usize {
            let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
            let white = (bit == 1) != inverted;
            pixels.push(if white { 255 } else { 0 });
        }
    }
    GrayImage::from_raw(width, height, pixels)
}

fn decode_samples(doc: &PdfDocument<'_>, dict: &Dictionary, data: &[u8]) -> Result<DynamicImage> {
    let width = integer(doc, dict, b"Width").and_then(|w| u32::try_from(w).ok()).unwrap_or(0);
    let height = integer(doc, dict, b"Height").and_then(|h| u32::try_from(h).ok()).unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(PdfError::ImageDecodingFailed("image has no dimensions".to_string()));
    }

    let image_mask = matches!(dict.get(b"ImageMask").map(|o| doc.resolve(o)), Ok(Object::Boolean(true)));
    let bits = if image_mask {
        1
    } else {
        integer(doc, dict, b"BitsPerComponent").unwrap_or(8)
    };
    let comps = if image_mask {
        Some(1)
    } else {
        dict.get(b"ColorSpace").ok().and_then(|cs| components(doc, cs))
    };

    let too_short = || PdfError::ImageDecodingFailed(format!("sample data too short for {}x{} image", width, height));
    let pixel_count = width as usize * height as usize;

    match (comps, bits) {
        (Some(1), 1) => unpack_bilevel(data, width, height, is_inverted(doc, dict))
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(too_short),
        (Some(1), 8) => data
            .get(..pixel_count)
            .and_then(|d| GrayImage::from_raw(width, height, d.to_vec()))
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(too_short),
        (Some(3), 8) => data
            .get(..pixel_count * 3)
            .and_then(|d| RgbImage::from_raw(width, height, d.to_vec()))
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(too_short),
        (Some(4), 8) => data
            .get(..pixel_count * 4)
            .and_then(|d| RgbImage::from_raw(width, height, cmyk_to_rgb(d)))
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(too_short),
        (comps, bits) => Err(PdfError::ImageDecodingFailed(format!(
            "unsupported sample layout: {:?} components at {} bits",
            comps, bits
        ))),
    }
}

fn decode_image_stream(doc: &PdfDocument<'_>, stream: &Stream) -> Result<DynamicImage> {
    let filters = filters(doc, &stream.dict);
    match filters.last().map(Vec::as_slice) {
        Some(b"DCTDecode") | Some(b"DCT") if filters.len() == 1 => {
            image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|e| PdfError::ImageDecodingFailed(format!("JPEG: {}", e)))
        }
        None => decode_samples(doc, &stream.dict, &stream.content),
        Some(b"FlateDecode") | Some(b"Fl") | Some(b"LZWDecode") | Some(b"LZW") => {
            let data = stream
                .decompressed_content()
                .map_err(|e| PdfError::ImageDecodingFailed(format!("decompression failed: {}", e)))?;
            decode_samples(doc, &stream.dict, &data)
        }
        Some(other) => Err(PdfError::ImageDecodingFailed(format!(
            "unsupported filter {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Decode the images drawn on one page.
///
/// Images that cannot be decoded are skipped with a debug log; an error is
/// returned only when the page itself cannot be found.
pub fn extract_page_images(doc: &PdfDocument<'_>, page_number: u32) -> Result<Vec<PdfImage>> {
    doc.page_id(page_number)?;
    let Some(xobjects) = doc.resource_category(page_number, b"XObject") else {
        return Ok(Vec::new());
    };

    let names: Vec<Vec<u8>> = drawn_xobject_names(doc, page_number)
        .unwrap_or_else(|| xobjects.iter().map(|(name, _)| name.clone()).collect());

    let mut images = Vec::new();
    for name in names {
        let Ok(object) = xobjects.get(&name) else {
            continue;
        };
        let Ok(stream) = doc.resolve(object).as_stream() else {
            continue;
        };
        let is_image = matches!(
            stream.dict.get(b"Subtype").map(|o| doc.resolve(o)),
            Ok(Object::Name(subtype)) if subtype.as_slice() == b"Image"
        );
        if !is_image {
            continue;
        }

        let name = String::from_utf8_lossy(&name).into_owned();
        match decode_image_stream(doc, stream) {
            Ok(image) => images.push(PdfImage { name, image }),
            Err(err) => {
                tracing::debug!(page = page_number, image = %name, error = %err, "Skipping undecodable image");
            }
        }
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{Document, dictionary};

    /// One page drawing one raw 8-bit gray image.
    fn pdf_with_gray_image(width: i64, height: i64, samples: Vec<u8>, compress: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            samples,
        );
        if compress {
            image.compress().unwrap();
        }
        let image_id = doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![width.into(), 0.into(), 0.into(), height.into(), 0.into(), 0.into()],
                ),
                Operation::new("Do", vec!["Im1".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extract_raw_gray_image() {
        let samples: Vec<u8> = (0..12).map(|i| i * 20).collect();
        let bytes = pdf_with_gray_image(4, 3, samples.clone(), false);
        let doc = PdfDocument::load(&bytes).unwrap();

        let images = extract_page_images(&doc, 1).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "Im1");
        let gray = images[0].image.to_luma8();
        assert_eq!(gray.dimensions(), (4, 3));
        assert_eq!(gray.into_raw(), samples);
    }

    #[test]
    fn test_extract_flate_image() {
        let samples = vec![200u8; 16 * 16];
        let bytes = pdf_with_gray_image(16, 16, samples, true);
        let doc = PdfDocument::load(&bytes).unwrap();

        let images = extract_page_images(&doc, 1).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].image.width(), 16);
    }

    #[test]
    fn test_short_samples_are_skipped() {
        let bytes = pdf_with_gray_image(10, 10, vec![0u8; 5], false);
        let doc = PdfDocument::load(&bytes).unwrap();
        assert!(extract_page_images(&doc, 1).unwrap().is_empty());
    }

    #[test]
    fn test_page_without_images() {
        let bytes = super::super::text::test_support::pdf_with_pages(vec![vec![]]);
        let doc = PdfDocument::load(&bytes).unwrap();
        assert!(extract_page_images(&doc, 1).unwrap().is_empty());
        assert!(extract_page_images(&doc, 2).is_err());
    }

    #[test]
    fn test_unpack_bilevel() {
        let image = unpack_bilevel(&[0b1010_0000, 0b0100_0000], 3, 2, false).unwrap();
        assert_eq!(image.into_raw(), vec![255, 0, 255, 0, 255, 0]);

        let inverted = unpack_bilevel(&[0b1010_0000], 3, 1, true).unwrap();
        assert_eq!(inverted.into_raw(), vec![0, 255, 0]);

        assert!(unpack_bilevel(&[0xff], 3, 2, false).is_none());
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), vec![0, 255, 255]);
    }
}
