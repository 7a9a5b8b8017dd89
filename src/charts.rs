use crate::summary::Summary;
use plotters::element::Pie;
use plotters::prelude::*;
use std::fs::remove_file;
use uuid::Uuid;

/// Parameter labels for the averages bar chart, in display order
const PARAMETERS: [&str; 3] = ["Flowrate", "Pressure", "Temperature"];

/// Fixed slice/bar palette so chart colors are stable across renders
const PALETTE: [RGBColor; 8] = [
    RGBColor(66, 133, 244),
    RGBColor(219, 68, 55),
    RGBColor(244, 180, 0),
    RGBColor(15, 157, 88),
    RGBColor(171, 71, 188),
    RGBColor(0, 172, 193),
    RGBColor(255, 112, 67),
    RGBColor(92, 107, 192),
];

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    /// Default configuration: 600x400 pixels with a generic title
    fn default() -> Self {
        Self {
            title: "Chart".to_string(),
            width: 600,
            height: 400,
        }
    }
}

/// Render the equipment-type distribution of a summary as a pie chart
///
/// Each equipment type becomes one labelled slice sized by its row count.
///
/// # Arguments
/// * `summary` - The summary whose type distribution is charted
/// * `options` - Chart title and dimensions
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
///
/// # Errors
/// * Returns an error if the summary has no rows to chart
pub fn type_distribution_pie(
    summary: &Summary,
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if summary.type_distribution.is_empty() {
        return Err("Dataset has no rows to chart".into());
    }

    let sizes: Vec<f64> = summary
        .type_distribution
        .values()
        .map(|&count| count as f64)
        .collect();
    let labels: Vec<String> = summary
        .type_distribution
        .iter()
        .map(|(equipment_type, count)| format!("{} ({})", equipment_type, count))
        .collect();
    let colors: Vec<RGBColor> = (0..sizes.len())
        .map(|i| PALETTE[i % PALETTE.len()])
        .collect();

    // Render to a temporary file-based bitmap, then read it back
    let filename = temp_chart_path();
    {
        let root = BitMapBackend::new(&filename, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(&options.title, ("sans-serif", 30).into_font())?;

        let center = (
            (options.width / 2) as i32,
            (options.height / 2) as i32 - 10,
        );
        let radius = (options.width.min(options.height) as f64) * 0.3;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style(("sans-serif", 18).into_font());
        root.draw(&pie)?;

        root.present()?;
    }

    let png_data = std::fs::read(&filename)?;

    // Clean up
    remove_file(&filename)?;

    Ok(png_data)
}

/// Render the three parameter averages of a summary as a bar chart
///
/// One bar each for flowrate, pressure, and temperature.
///
/// # Arguments
/// * `summary` - The summary whose averages are charted
/// * `options` - Chart title and dimensions
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn averages_bar(
    summary: &Summary,
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let values = [
        summary.avg_flowrate,
        summary.avg_pressure,
        summary.avg_temperature,
    ];

    // Render to a temporary file-based bitmap, then read it back
    let filename = temp_chart_path();
    {
        let root = BitMapBackend::new(&filename, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let max_y = values.iter().cloned().fold(0.0_f64, f64::max).max(1.0);

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5_f64..2.5_f64, 0.0_f64..max_y * 1.1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(PARAMETERS.len())
            .x_label_formatter(&|v| {
                let i = v.round();
                if (v - i).abs() < 0.01 && (0.0..3.0).contains(&i) {
                    PARAMETERS[i as usize].to_string()
                } else {
                    String::new()
                }
            })
            .y_desc("Average value")
            .draw()?;

        chart.draw_series(values.iter().enumerate().map(|(i, &value)| {
            Rectangle::new(
                [(i as f64 - 0.35, 0.0), (i as f64 + 0.35, value)],
                PALETTE[i % PALETTE.len()].filled(),
            )
        }))?;

        root.present()?;
    }

    let png_data = std::fs::read(&filename)?;

    // Clean up
    remove_file(&filename)?;

    Ok(png_data)
}

// Unique temp path per render so concurrent requests don't clobber each other
fn temp_chart_path() -> String {
    format!(
        "{}/chemdash_chart_{}.png",
        std::env::temp_dir().to_string_lossy(),
        Uuid::new_v4()
    )
}
