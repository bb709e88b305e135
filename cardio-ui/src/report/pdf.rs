//! lopdf rendering of a [`ReportLayout`]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::layout::{Element, Font, ReportLayout, Rgb, PAGE_HEIGHT, PAGE_WIDTH};
use super::ReportError;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// Serialize `layout` into PDF bytes
pub fn render(layout: &ReportLayout) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let image_ids: Vec<ObjectId> = layout
        .images()
        .iter()
        .map(|image| {
            let dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            };
            doc.add_object(Stream::new(dict, image.rgb.clone()))
        })
        .collect();

    let mut kids: Vec<Object> = Vec::with_capacity(layout.page_count());
    for page in layout.pages() {
        let mut operations = Vec::new();
        let mut xobjects = lopdf::Dictionary::new();

        for element in &page.elements {
            match element {
                Element::Text {
                    x,
                    y,
                    size,
                    font,
                    color,
                    text,
                } => {
                    let font_name = match font {
                        Font::Regular => FONT_REGULAR,
                        Font::Bold => FONT_BOLD,
                    };
                    operations.push(fill_color(*color));
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new("Tf", vec![font_name.into(), (*size).into()]));
                    operations.push(Operation::new("Td", vec![(*x).into(), flip(*y).into()]));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::string_literal(pdf_text(text))],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                }
                Element::Rule {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                    color,
                } => {
                    operations.push(stroke_color(*color));
                    operations.push(Operation::new("w", vec![(*width).into()]));
                    operations.push(Operation::new("m", vec![(*x1).into(), flip(*y1).into()]));
                    operations.push(Operation::new("l", vec![(*x2).into(), flip(*y2).into()]));
                    operations.push(Operation::new("S", vec![]));
                }
                Element::Image {
                    x,
                    y,
                    width,
                    height,
                    image,
                } => {
                    let Some(image_id) = image_ids.get(*image) else {
                        return Err(ReportError::Render(format!("image {} not registered", image)));
                    };
                    let name = format!("Im{}", image);
                    xobjects.set(name.as_bytes().to_vec(), Object::Reference(*image_id));

                    // Unit square scaled to the box, origin at its bottom-left
                    operations.push(Operation::new("q", vec![]));
                    operations.push(Operation::new(
                        "cm",
                        vec![
                            (*width).into(),
                            0i64.into(),
                            0i64.into(),
                            (*height).into(),
                            (*x).into(),
                            flip(y + height).into(),
                        ],
                    ));
                    operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                    operations.push(Operation::new("Q", vec![]));
                }
            }
        }

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| ReportError::Render(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), encoded));

        let resources = dictionary! {
            "Font" => dictionary! {
                FONT_REGULAR => regular_id,
                FONT_BOLD => bold_id,
            },
            "XObject" => xobjects,
        };
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![0i64.into(), 0i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()];
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => media_box,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ReportError::Render(e.to_string()))?;
    Ok(bytes)
}

fn flip(y: f32) -> f32 {
    PAGE_HEIGHT - y
}

fn fill_color((r, g, b): Rgb) -> Operation {
    Operation::new("rg", vec![r.into(), g.into(), b.into()])
}

fn stroke_color((r, g, b): Rgb) -> Operation {
    Operation::new("RG", vec![r.into(), g.into(), b.into()])
}

/// Map text onto what the standard Type1 fonts can show
///
/// Common typographic marks are folded to ASCII; anything else becomes '?'.
pub fn pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\t' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::RasterImage;
    use crate::report::layout::TEXT_COLOR;

    #[test]
    fn test_pdf_text_folds_to_ascii() {
        assert_eq!(pdf_text("Ok \u{2014} \u{201c}fine\u{201d}\u{2026}"), "Ok - \"fine\"...");
        assert_eq!(pdf_text("ECG \u{2665}"), "ECG ?");
    }

    #[test]
    fn test_render_loads_back() {
        let mut layout = ReportLayout::new();
        layout.text("Title", 20.0, Font::Bold, TEXT_COLOR);
        layout.image(RasterImage::new(2, 2, vec![0; 12]).unwrap());
        layout.new_page();
        layout.text("Second", 12.0, Font::Regular, TEXT_COLOR);
        layout.stamp_footer("footer");

        let bytes = render(&layout).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
