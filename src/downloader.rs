use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rect,
    Rgb,
};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::error::Result;
use crate::order::{Order, ORDER_COLUMNS};

/// Rows included in the PDF snapshot.
pub const PDF_ROW_LIMIT: usize = 50;

const SHEET_NAME: &str = "Orders";

// Landscape A4, in millimetres.
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const TITLE_SIZE: f32 = 18.0;
const CELL_FONT_SIZE: f32 = 8.0;
const ROW_HEIGHT: f32 = 5.0;
const CELL_PADDING: f32 = 1.2;
const GRID_THICKNESS: f32 = 0.25;

/// Relative column widths for the PDF grid, one per [`ORDER_COLUMNS`] entry.
const COLUMN_WEIGHTS: [f32; 8] = [1.1, 0.9, 1.2, 1.0, 0.8, 1.0, 0.9, 1.6];

/// Convert orders to XLSX format
///
/// Writes a single worksheet named "Orders" holding the header row followed
/// by every order, all as text cells with the library's default formatting.
///
/// # Arguments
/// * `orders` - The table snapshot to export
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
pub fn to_xlsx(orders: &[Order]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_NAME)?;

    for (c, header) in ORDER_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, c as u16, *header)?;
    }

    for (r, order) in orders.iter().enumerate() {
        for (c, value) in order.fields().iter().enumerate() {
            worksheet.write_string((r + 1) as u32, c as u16, *value)?;
        }
    }

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

/// Convert orders to PDF format
///
/// Produces a landscape A4 document titled "<company> - Orders Export"
/// followed by a grid of the header and the first [`PDF_ROW_LIMIT`] orders.
/// The header row sits on a light grey band and is repeated if the grid
/// runs onto a second page.
///
/// # Arguments
/// * `orders` - The table snapshot to export
/// * `company` - Company label for the title
///
/// # Returns
/// * `Result<Vec<u8>>` - PDF file content as bytes or an error
pub fn to_pdf(orders: &[Order], company: &str) -> Result<Vec<u8>> {
    let title = format!("{} - Orders Export", company);
    let (doc, page, layer) =
        PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Orders");
    let title_font = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let cell_font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    let widths = column_widths();
    let mut current = doc.get_page(page).get_layer(layer);

    current.use_text(
        title.as_str(),
        TITLE_SIZE,
        Mm(MARGIN),
        Mm(PAGE_HEIGHT - MARGIN - 6.0),
        &title_font,
    );

    // Top edge of the next row to draw.
    let mut top = PAGE_HEIGHT - MARGIN - 14.0;
    draw_row(&current, &widths, top, &ORDER_COLUMNS, &title_font, true);
    top -= ROW_HEIGHT;

    for order in pdf_rows(orders) {
        if top - ROW_HEIGHT < MARGIN {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Orders");
            current = doc.get_page(page).get_layer(layer);
            top = PAGE_HEIGHT - MARGIN;
            draw_row(&current, &widths, top, &ORDER_COLUMNS, &title_font, true);
            top -= ROW_HEIGHT;
        }
        draw_row(&current, &widths, top, &order.fields(), &cell_font, false);
        top -= ROW_HEIGHT;
    }

    let bytes = doc.save_to_bytes()?;
    Ok(bytes)
}

/// The leading slice of `orders` that fits in the PDF snapshot.
fn pdf_rows(orders: &[Order]) -> &[Order] {
    &orders[..orders.len().min(PDF_ROW_LIMIT)]
}

fn column_widths() -> Vec<f32> {
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    let total: f32 = COLUMN_WEIGHTS.iter().sum();
    COLUMN_WEIGHTS.iter().map(|w| usable * w / total).collect()
}

fn draw_row(
    layer: &PdfLayerReference,
    widths: &[f32],
    top: f32,
    values: &[&str],
    font: &IndirectFontRef,
    header: bool,
) {
    let bottom = top - ROW_HEIGHT;
    let right = MARGIN + widths.iter().sum::<f32>();

    if header {
        layer.set_fill_color(Color::Rgb(Rgb::new(0.83, 0.83, 0.83, None)));
        layer.add_rect(Rect::new(Mm(MARGIN), Mm(bottom), Mm(right), Mm(top)));
    }

    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_color(Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None)));
    layer.set_outline_thickness(GRID_THICKNESS);

    let mut left = MARGIN;
    for (width, value) in widths.iter().zip(values) {
        layer.use_text(
            fit_to_width(value, *width),
            CELL_FONT_SIZE,
            Mm(left + CELL_PADDING),
            Mm(bottom + CELL_PADDING + 0.3),
            font,
        );
        add_segment(layer, left, bottom, left, top);
        left += width;
    }
    add_segment(layer, right, bottom, right, top);
    add_segment(layer, MARGIN, top, right, top);
    add_segment(layer, MARGIN, bottom, right, bottom);
}

fn add_segment(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y2)), false),
        ],
        is_closed: false,
    });
}

/// Truncate `value` so it stays inside a cell of `width` millimetres.
///
/// Uses an average Helvetica glyph width at the cell font size.
fn fit_to_width(value: &str, width: f32) -> String {
    const AVG_GLYPH_MM: f32 = CELL_FONT_SIZE * 0.5 * 0.3528;
    let max_chars = ((width - 2.0 * CELL_PADDING) / AVG_GLYPH_MM).floor().max(1.0) as usize;

    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(max_chars.saturating_sub(1)).collect();
        cut.push('.');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed_orders;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn orders(n: usize) -> Vec<Order> {
        let mut orders = seed_orders(&mut StdRng::seed_from_u64(11), Utc::now());
        orders.truncate(n);
        orders
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = to_xlsx(&orders(10)).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn xlsx_handles_empty_table() {
        let bytes = to_xlsx(&[]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn pdf_has_pdf_header() {
        let bytes = to_pdf(&orders(150), "Agriculture & Forestry").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn pdf_keeps_only_the_first_fifty_rows() {
        let all = orders(150);
        let rows = pdf_rows(&all);
        assert_eq!(rows.len(), PDF_ROW_LIMIT);
        assert_eq!(rows[0].order_id, "VIC-1000");
        assert_eq!(rows[PDF_ROW_LIMIT - 1].order_id, "VIC-1049");

        assert_eq!(pdf_rows(&all[..10]).len(), 10);
        assert!(pdf_rows(&[]).is_empty());
    }

    #[test]
    fn long_values_are_truncated() {
        assert_eq!(fit_to_width("VIC-1000", 30.0), "VIC-1000");
        let cut = fit_to_width(&"x".repeat(200), 20.0);
        assert!(cut.len() < 200);
        assert!(cut.ends_with('.'));
    }

    #[test]
    fn column_widths_fill_the_page() {
        let widths = column_widths();
        assert_eq!(widths.len(), ORDER_COLUMNS.len());
        let total: f32 = widths.iter().sum();
        assert!((total - (PAGE_WIDTH - 2.0 * MARGIN)).abs() < 0.01);
    }
}
