//! First-page raster extraction for PDF uploads
//!
//! Phone-scanner PDFs carry each page as one embedded raster image. The
//! largest image drawn on the first page is taken as the photo.

use crate::error::DigitizeError;
use image::{DynamicImage, ImageFormat};
use lopdf::{Dictionary, Document, Object, Stream};

/// Check the `%PDF-` magic bytes
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Decode the largest raster image on the first page
pub fn first_page_image(bytes: &[u8]) -> Result<DynamicImage, DigitizeError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| DigitizeError::Decode(format!("Failed to load PDF: {}", e)))?;

    let page_id = *doc
        .get_pages()
        .values()
        .next()
        .ok_or_else(|| DigitizeError::Decode("PDF has no pages".to_string()))?;

    let xobjects = page_xobjects(&doc, page_id)
        .ok_or_else(|| DigitizeError::Decode("PDF first page has no images".to_string()))?;

    let mut best: Option<DynamicImage> = None;
    for (name, object) in xobjects.iter() {
        let Some(stream) = resolve(&doc, object).and_then(|o| o.as_stream().ok()) else {
            continue;
        };
        if !is_image(stream) {
            continue;
        }

        match extract_image_from_stream(&doc, stream) {
            Ok(img) => {
                let area = img.width() as u64 * img.height() as u64;
                let best_area = best
                    .as_ref()
                    .map_or(0, |b| b.width() as u64 * b.height() as u64);
                if area > best_area {
                    best = Some(img);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to extract image {} from PDF: {}",
                    String::from_utf8_lossy(name),
                    e
                );
            }
        }
    }

    best.ok_or_else(|| DigitizeError::Decode("PDF first page has no readable images".to_string()))
}

/// XObject dictionary of a page, following inherited `Resources`
fn page_xobjects(doc: &Document, page_id: lopdf::ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    loop {
        if let Some(resources) = node
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve(doc, r))
            .and_then(|r| r.as_dict().ok())
        {
            return resources
                .get(b"XObject")
                .ok()
                .and_then(|x| resolve(doc, x))
                .and_then(|x| x.as_dict().ok());
        }

        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn is_image(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"Subtype")
        .and_then(|s| s.as_name())
        .is_ok_and(|name| name == b"Image")
}

fn has_filter(stream: &Stream, filter: &[u8]) -> bool {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => name.as_slice() == filter,
        Ok(Object::Array(filters)) => filters
            .iter()
            .any(|f| f.as_name().is_ok_and(|name| name == filter)),
        _ => false,
    }
}

/// Decode an image XObject stream
fn extract_image_from_stream(doc: &Document, stream: &Stream) -> Result<DynamicImage, DigitizeError> {
    // Embedded JPEG: the stream content is a complete JPEG file
    if has_filter(stream, b"DCTDecode") {
        return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .map_err(|e| DigitizeError::Decode(format!("Invalid embedded JPEG: {}", e)));
    }

    let dimension = |key: &[u8]| -> Result<u32, DigitizeError> {
        stream
            .dict
            .get(key)
            .ok()
            .and_then(|v| v.as_i64().ok())
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                DigitizeError::Decode(format!("Missing image {}", String::from_utf8_lossy(key)))
            })
    };
    let width = dimension(b"Width")?;
    let height = dimension(b"Height")?;
    let pixels = width as usize * height as usize;

    let data = if stream.dict.has(b"Filter") {
        stream
            .decompressed_content()
            .map_err(|e| DigitizeError::Decode(format!("Failed to decompress image: {}", e)))?
    } else {
        stream.content.clone()
    };

    let bits_per_component = stream
        .dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|b| b.as_i64().ok())
        .unwrap_or(8);
    if bits_per_component != 8 {
        return Err(DigitizeError::Decode(format!(
            "Unsupported bits per component: {}",
            bits_per_component
        )));
    }

    let color_space = get_color_space(doc, stream);
    tracing::debug!(
        width,
        height,
        color_space = %color_space,
        data_len = data.len(),
        "Decoding PDF image"
    );

    let invalid = || DigitizeError::Decode(format!("Invalid {} image data", color_space));
    match color_space.as_str() {
        "DeviceGray" if data.len() >= pixels => {
            let img = image::GrayImage::from_raw(width, height, data[..pixels].to_vec())
                .ok_or_else(invalid)?;
            Ok(DynamicImage::ImageLuma8(img))
        }
        "DeviceRGB" | "ICCBased" if data.len() >= pixels * 3 => {
            let img = image::RgbImage::from_raw(width, height, data[..pixels * 3].to_vec())
                .ok_or_else(invalid)?;
            Ok(DynamicImage::ImageRgb8(img))
        }
        "DeviceCMYK" if data.len() >= pixels * 4 => {
            let rgb: Vec<u8> = data[..pixels * 4]
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let k = 1.0 - cmyk[3] as f32 / 255.0;
                    [0, 1, 2].map(|i| ((1.0 - cmyk[i] as f32 / 255.0) * k * 255.0) as u8)
                })
                .collect();
            let img = image::RgbImage::from_raw(width, height, rgb).ok_or_else(invalid)?;
            Ok(DynamicImage::ImageRgb8(img))
        }
        "DeviceGray" | "DeviceRGB" | "ICCBased" | "DeviceCMYK" => Err(invalid()),
        _ => Err(DigitizeError::Decode(format!(
            "Unsupported color space: {}",
            color_space
        ))),
    }
}

/// Color space name, resolving indirect references and `[/ICCBased ref]` arrays
fn get_color_space(doc: &Document, stream: &Stream) -> String {
    let Some(cs) = stream
        .dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| resolve(doc, cs))
    else {
        return "DeviceRGB".to_string();
    };

    let name = match cs {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(items) => items.first().and_then(|first| first.as_name().ok()),
        _ => None,
    };

    name.map(|n| String::from_utf8_lossy(n).to_string())
        .unwrap_or_else(|| "DeviceRGB".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// One-page PDF drawing a single raw RGB image
    fn pdf_with_rgb_image(width: i64, height: i64, pixel: [u8; 3]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let data: Vec<u8> = (0..width * height).flat_map(|_| pixel).collect();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            data,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
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

    #[test]
    fn test_detects_pdf_magic() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"\x89PNG\r\n"));
    }

    #[test]
    fn test_extracts_first_page_image() {
        let bytes = pdf_with_rgb_image(6, 4, [10, 20, 30]);

        let img = first_page_image(&bytes).unwrap();

        assert_eq!((img.width(), img.height()), (6, 4));
        assert_eq!(img.to_rgb8().get_pixel(5, 3).0, [10, 20, 30]);
    }

    #[test]
    fn test_malformed_pdf_is_decode_error() {
        let result = first_page_image(b"%PDF-1.4\nthis is not a document");
        assert!(matches!(result, Err(DigitizeError::Decode(_))));
    }
}
