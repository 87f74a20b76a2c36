use std::io::{BufWriter, Cursor};

use printpdf::{
    Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference,
};

use super::layout::{
    Block, ReportLayout, ReportPage, FIELD_FONT_PT, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, TEXT_FONT_PT,
    TITLE_FONT_PT,
};
use super::{ReportError, ReportFont, REPORT_TITLE};
use crate::chart::ChartImage;

const MM_PER_INCH: f32 = 25.4;
const PT_TO_MM: f32 = MM_PER_INCH / 72.0;

/// Paint `layout` into a PDF byte stream.
pub fn render_pdf(
    layout: &ReportLayout,
    chart: &ChartImage,
    font: &ReportFont,
) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        REPORT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font_ref = doc
        .add_external_font(Cursor::new(font.bytes()))
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page_ref).get_layer(layer_ref)
        };
        paint_page(&layer, page, chart, &font_ref);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
}

fn paint_page(
    layer: &PdfLayerReference,
    page: &ReportPage,
    chart: &ChartImage,
    font: &IndirectFontRef,
) {
    for placed in &page.blocks {
        match &placed.block {
            Block::Title(text) => {
                // Approximate centring: half an em per character.
                let approx_width = text.chars().count() as f32 * TITLE_FONT_PT * 0.5 * PT_TO_MM;
                let x = ((PAGE_WIDTH_MM - approx_width) / 2.0).max(placed.x_mm);
                let y = baseline(placed.y_mm, TITLE_FONT_PT);
                layer.use_text(text.as_str(), TITLE_FONT_PT, Mm(x), Mm(y), font);
            }
            Block::Field { .. } => {
                if let Some(text) = placed.block.text() {
                    let y = baseline(placed.y_mm, FIELD_FONT_PT);
                    layer.use_text(text, FIELD_FONT_PT, Mm(placed.x_mm), Mm(y), font);
                }
            }
            Block::TextLine(text) => {
                if !text.is_empty() {
                    let y = baseline(placed.y_mm, TEXT_FONT_PT);
                    layer.use_text(text.as_str(), TEXT_FONT_PT, Mm(placed.x_mm), Mm(y), font);
                }
            }
            Block::Chart {
                width_mm,
                height_mm,
            } => {
                let dpi = chart.width() as f32 * MM_PER_INCH / width_mm;
                let image = Image::from_dynamic_image(&chart.to_dynamic());
                image.add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(placed.x_mm)),
                        // printpdf anchors images at their bottom-left corner.
                        translate_y: Some(Mm(PAGE_HEIGHT_MM - placed.y_mm - height_mm)),
                        dpi: Some(dpi),
                        ..Default::default()
                    },
                );
            }
        }
    }
}

/// Convert a top-anchored block position into a PDF text baseline.
fn baseline(top_mm: f32, font_pt: f32) -> f32 {
    PAGE_HEIGHT_MM - top_mm - font_pt * PT_TO_MM
}

#[cfg(test)]
mod tests {
    use super::*;
    use printpdf::lopdf;
    use crate::chart::render_sensor_chart;
    use crate::report::compose;
    use crate::report::tests::system_font;
    use crate::wells::dataset::tests::sample_record;

    #[test]
    fn baseline_sits_below_block_top() {
        let y = baseline(20.0, 12.0);
        assert!(y < PAGE_HEIGHT_MM - 20.0);
        assert!(y > PAGE_HEIGHT_MM - 30.0);
    }

    #[test]
    fn renders_pdf_with_external_font() {
        let Some(font) = system_font() else {
            eprintln!("skipping: no system TTF font available");
            return;
        };
        let record = sample_record();
        let chart = render_sensor_chart(&record).unwrap();
        let layout = compose(&record, "Diagnostic: roulements usés — 振动", &chart);

        let bytes = render_pdf(&layout, &chart, &font).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 1000);
    }

    fn subtype_is(object: &lopdf::Object, name: &[u8]) -> bool {
        let dict = match object {
            lopdf::Object::Dictionary(dict) => dict,
            lopdf::Object::Stream(stream) => &stream.dict,
            _ => return false,
        };
        matches!(dict.get(b"Subtype"), Ok(lopdf::Object::Name(n)) if n.as_slice() == name)
    }

    #[test]
    fn pdf_embeds_one_chart_image_and_unicode_font_on_every_page() {
        let Some(font) = system_font() else {
            eprintln!("skipping: no system TTF font available");
            return;
        };
        let record = sample_record();
        let chart = render_sensor_chart(&record).unwrap();
        let diagnosis = "Vibration élevée sur la pompe.\n".repeat(80);
        let layout = compose(&record, &diagnosis, &chart);
        assert!(layout.pages.len() > 1);

        let bytes = render_pdf(&layout, &chart, &font).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();

        assert_eq!(doc.get_pages().len(), layout.pages.len());

        let images = doc
            .objects
            .values()
            .filter(|object| subtype_is(object, b"Image"))
            .count();
        assert_eq!(images, 1);

        let unicode_font = doc.objects.values().any(|object| {
            subtype_is(object, b"Type0")
                && object
                    .as_dict()
                    .map(|dict| dict.has(b"ToUnicode"))
                    .unwrap_or(false)
        });
        assert!(unicode_font, "expected a Type0 font with a ToUnicode map");
    }
}
