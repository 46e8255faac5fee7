use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use super::report::{day_month_year, Report};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 7.0;

struct Cursor<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor<'_> {
    fn write(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        if self.y < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.y -= LINE_HEIGHT * size / 12.0;
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT / 2.0;
    }
}

/// A4 portrait, Helvetica, one line per entry; overflows onto new pages.
pub fn render(report: &Report) -> Result<Vec<u8>, printpdf::Error> {
    let (doc, page, layer) = PdfDocument::new(
        report.title.as_str(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = Cursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
    };

    cursor.write(&report.title, 20.0, MARGIN, &bold);
    cursor.write(
        &format!("Generated on {}", day_month_year(report.generated_on)),
        11.0,
        MARGIN,
        &regular,
    );
    cursor.gap();

    for section in &report.sections {
        cursor.gap();
        cursor.write(&section.heading, 14.0, MARGIN, &bold);
        for line in &section.lines {
            cursor.write(line, 11.0, MARGIN + 5.0, &regular);
        }
    }

    drop(cursor);
    doc.save_to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::report::Section;
    use time::macros::date;

    fn report(lines: usize) -> Report {
        Report {
            title: "Academic Report".into(),
            generated_on: date!(2025 - 03 - 01),
            sections: vec![Section {
                heading: "Grades".into(),
                lines: (0..lines).map(|i| format!("Course {i}: 12/20")).collect(),
            }],
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render(&report(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_reports_spill_onto_more_pages() {
        let short = render(&report(3)).unwrap();
        let long = render(&report(120)).unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }
}
