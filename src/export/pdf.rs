use std::io::BufWriter;

use printpdf::*;

use crate::error::{RampError, Result};
use crate::export::table::ExportTable;

// US Letter dimensions (mm)
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN_TOP: f32 = 25.4;
const MARGIN_BOTTOM: f32 = 25.4;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 10.0;
const CHAR_W: f32 = 0.18;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * CHAR_W
}

/// Cut `text` so it fits in `width` mm, marking the cut with "..".
fn fit(text: &str, width: f32, size: f32) -> String {
    let max = ((width - 2.0) / (size * CHAR_W)).max(1.0) as usize;
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(2);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("..");
    out
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RampError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RampError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn hline(&self) {
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.set_outline_thickness(0.5);
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.pdf_y())), false),
                (Point::new(Mm(PAGE_W - MARGIN_RIGHT), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn header(&mut self, title: &str, subtitle: &str) {
        self.text(title, MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        if !subtitle.is_empty() {
            self.text(subtitle, MARGIN_LEFT, SUBTITLE_SIZE, false);
            self.y += 5.0;
        }
        let ts = chrono::Utc::now()
            .format("Generated %Y-%m-%d %H:%M UTC")
            .to_string();
        self.text(&ts, MARGIN_LEFT, 8.0, false);
        self.y += 5.0;
        self.hline();
        self.y += 5.0;
    }

    fn cells(&mut self, cols: &[Col], values: &[String], bold: bool) {
        let mut x = MARGIN_LEFT;
        for (col, value) in cols.iter().zip(values) {
            let shown = fit(value, col.width, FONT_SIZE);
            match col.align {
                Align::Left => self.text(&shown, x, FONT_SIZE, bold),
                Align::Right => {
                    let tw = approx_text_width(&shown, FONT_SIZE);
                    self.text(&shown, x + col.width - tw - 1.0, FONT_SIZE, bold);
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[String]) {
        self.ensure_space(ROW_H * 2.0);
        self.cells(cols, headers, true);
        self.hline();
        self.y += 2.0;
    }

    fn section_label(&mut self, label: &str) {
        self.ensure_space(ROW_H * 3.0);
        self.text(label, MARGIN_LEFT, SUBTITLE_SIZE, true);
        self.y += ROW_H + 1.0;
    }

    fn table(&mut self, table: &ExportTable) {
        let usable = PAGE_W - MARGIN_LEFT - MARGIN_RIGHT;
        let width = usable / table.columns.len().max(1) as f32;
        let cols: Vec<Col> = table
            .numeric_columns()
            .into_iter()
            .map(|numeric| Col {
                width,
                align: if numeric { Align::Right } else { Align::Left },
            })
            .collect();

        self.section_label(&table.title);
        self.table_header(&cols, &table.columns);
        if table.is_empty() {
            self.cells(&cols, &["No rows".to_string()], false);
        }
        for row in table.rendered_rows() {
            if self.y + ROW_H > PAGE_H - MARGIN_BOTTOM {
                self.new_page();
                self.table_header(&cols, &table.columns);
            }
            self.cells(&cols, &row, false);
        }
        self.y += ROW_H;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| RampError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| RampError::Pdf(e.to_string()))
    }
}

/// Title, subtitle and timestamp, then one table per section. Long tables
/// continue on new pages with the header row repeated.
pub fn render_pdf(title: &str, subtitle: &str, sections: &[&ExportTable]) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(title)?;
    pdf.header(title, subtitle);
    for table in sections {
        pdf.table(table);
    }
    pdf.to_bytes()
}

pub fn write_pdf_file(
    title: &str,
    subtitle: &str,
    sections: &[&ExportTable],
    path: &std::path::Path,
) -> Result<()> {
    let bytes = render_pdf(title, subtitle, sections)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    log::info!("wrote {}", path.display());
    Ok(())
}
