//! Shared fixtures for integration tests

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, Stream};

/// One page per MediaBox, each with a line of text
pub fn build_pdf(boxes: &[[i64; 4]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for (i, media_box) in boxes.iter().enumerate() {
        let text = format!("BT /F1 10 Tf 40 40 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
            "Contents" => content_id,
            "Resources" => resources_id,
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
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Small RGBA PNG with a diagonal opaque line on a transparent background
pub fn signature_png() -> Vec<u8> {
    let (width, height) = (8u32, 4u32);
    let mut data = vec![0u8; (width * height * 4) as usize];
    for x in 0..width {
        let y = x * height / width;
        let i = ((y * width + x) * 4) as usize;
        data[i + 3] = 255;
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&data).unwrap();
    }
    out
}

/// Operands of every `cm` operator on `page`, in content order
pub fn cm_operands(pdf: &[u8], page: u32) -> Vec<[f32; 6]> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = doc.get_pages()[&page];
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();

    content
        .operations
        .iter()
        .filter(|op| op.operator == "cm")
        .map(|op| {
            let mut values = [0f32; 6];
            for (slot, operand) in values.iter_mut().zip(&op.operands) {
                *slot = operand.as_float().unwrap();
            }
            values
        })
        .collect()
}

pub fn assert_close(actual: f32, expected: f64) {
    assert!(
        (actual as f64 - expected).abs() < 1e-3,
        "expected {} got {}",
        expected,
        actual
    );
}
