use crate::summary::Summary;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use std::error::Error;

/// Equipment rows included in the report are capped for brevity
const MAX_REPORT_ROWS: usize = 20;

// Column x-positions (mm) for the equipment table
const TABLE_COLUMNS: [f64; 5] = [20.0, 80.0, 125.0, 150.0, 175.0];

/// Build the suggested download filename for a summary's report
pub fn report_filename(summary: &Summary) -> String {
    format!("report_{}.pdf", summary.filename)
}

/// Render a summary as a PDF report
///
/// The report contains the dataset title and upload date, a summary
/// statistics table with the three parameter averages, and the first
/// [`MAX_REPORT_ROWS`] equipment rows.
///
/// # Arguments
/// * `summary` - The summary to render
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - PDF file content as bytes or an error
pub fn render_report(summary: &Summary) -> Result<Vec<u8>, Box<dyn Error>> {
    // US Letter, like the original reports
    let (doc, page, layer) = PdfDocument::new(
        format!("Parameter Report: {}", summary.filename),
        Mm(215.9),
        Mm(279.4),
        "report",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut y = 260.0;

    // Title and upload date
    text(&layer, &bold, 20.0, 20.0, y, &format!("Parameter Report: {}", summary.filename));
    y -= 10.0;
    text(
        &layer,
        &regular,
        11.0,
        20.0,
        y,
        &format!("Upload Date: {}", summary.upload_date.format("%Y-%m-%d %H:%M UTC")),
    );
    y -= 16.0;

    // Summary statistics
    text(&layer, &bold, 14.0, 20.0, y, "Summary Statistics");
    y -= 8.0;
    text(&layer, &bold, 11.0, 20.0, y, "Parameter");
    text(&layer, &bold, 11.0, 80.0, y, "Average Value");
    y -= 7.0;
    let stats = [
        ("Flowrate", summary.avg_flowrate),
        ("Pressure", summary.avg_pressure),
        ("Temperature", summary.avg_temperature),
    ];
    for (parameter, value) in stats {
        text(&layer, &regular, 11.0, 20.0, y, parameter);
        text(&layer, &regular, 11.0, 80.0, y, &format!("{:.2}", value));
        y -= 7.0;
    }
    y -= 10.0;

    // Equipment table, capped at the first rows
    text(
        &layer,
        &bold,
        14.0,
        20.0,
        y,
        &format!("Equipment Data (Top {})", MAX_REPORT_ROWS),
    );
    y -= 8.0;
    table_row(&layer, &bold, 10.0, y, ["Name", "Type", "Flow", "Press.", "Temp."]);
    y -= 6.0;
    for record in summary.data.iter().take(MAX_REPORT_ROWS) {
        table_row(
            &layer,
            &regular,
            9.0,
            y,
            [
                record.name.as_str(),
                record.equipment_type.as_str(),
                &format!("{}", record.flowrate),
                &format!("{}", record.pressure),
                &format!("{}", record.temperature),
            ],
        );
        y -= 6.0;
    }

    let bytes = doc.save_to_bytes()?;
    Ok(bytes)
}

fn text(layer: &PdfLayerReference, font: &IndirectFontRef, size: f64, x: f64, y: f64, content: &str) {
    layer.use_text(content, size as f32, Mm(x as f32), Mm(y as f32), font);
}

fn table_row(layer: &PdfLayerReference, font: &IndirectFontRef, size: f64, y: f64, cells: [&str; 5]) {
    for (cell, x) in cells.iter().zip(TABLE_COLUMNS.iter()) {
        layer.use_text(*cell, size as f32, Mm(*x as f32), Mm(y as f32), font);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::EquipmentRecord;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn sample_summary(rows: usize) -> Summary {
        let data: Vec<EquipmentRecord> = (0..rows)
            .map(|i| EquipmentRecord {
                name: format!("Pump-{}", i),
                equipment_type: "Pump".to_string(),
                flowrate: 100.0,
                pressure: 4.5,
                temperature: 60.0,
            })
            .collect();
        let mut type_distribution = BTreeMap::new();
        if rows > 0 {
            type_distribution.insert("Pump".to_string(), rows);
        }
        Summary {
            id: "ds-1".to_string(),
            filename: "plant.csv".to_string(),
            upload_date: Utc::now(),
            avg_flowrate: 100.0,
            avg_pressure: 4.5,
            avg_temperature: 60.0,
            type_distribution,
            data,
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render_report(&sample_summary(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_even_with_many_rows() {
        // Rows past the cap are dropped, not paginated
        let bytes = render_report(&sample_summary(100)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_summary_still_renders() {
        let bytes = render_report(&sample_summary(0)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn report_filename_uses_upload_name() {
        assert_eq!(report_filename(&sample_summary(1)), "report_plant.csv.pdf");
    }
}
