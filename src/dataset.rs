use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Column headers a dataset CSV must carry, in the order they are reported
/// back to the client when validation fails.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Equipment Name",
    "Type",
    "Flowrate",
    "Pressure",
    "Temperature",
];

/// A single row of equipment data parsed from an uploaded CSV
///
/// Serialized field names match the CSV headers so that JSON rows sent to the
/// equipment table and the rows embedded in PDF reports use the same keys the
/// upload carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    /// Equipment name (free text, e.g. "Pump-101")
    #[serde(rename = "Equipment Name")]
    pub name: String,

    /// Equipment type/category (e.g. "Pump", "Reactor")
    #[serde(rename = "Type")]
    pub equipment_type: String,

    /// Flowrate reading for this equipment item
    #[serde(rename = "Flowrate")]
    pub flowrate: f64,

    /// Pressure reading for this equipment item
    #[serde(rename = "Pressure")]
    pub pressure: f64,

    /// Temperature reading for this equipment item
    #[serde(rename = "Temperature")]
    pub temperature: f64,
}

/// One uploaded dataset as persisted by the store
///
/// A dataset is immutable after upload; summaries are derived from it on
/// demand rather than stored alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique identifier assigned at upload time
    pub id: String,

    /// Original filename of the uploaded CSV
    pub filename: String,

    /// Time the dataset was uploaded
    pub upload_date: DateTime<Utc>,

    /// Parsed equipment rows
    pub records: Vec<EquipmentRecord>,
}

/// Parse equipment records from CSV text
///
/// The first line must be a header row containing all of [`REQUIRED_COLUMNS`]
/// (extra columns are ignored, order does not matter). Every following
/// non-empty line becomes one [`EquipmentRecord`]. Quoted fields with embedded
/// commas and doubled quotes are handled.
///
/// # Arguments
/// * `content` - The full CSV text of the upload
///
/// # Returns
/// * `Result<Vec<EquipmentRecord>, Box<dyn Error>>` - Parsed rows or an error
///
/// # Errors
/// * Returns an error if the file is empty
/// * Returns an error naming the required columns if any are missing
/// * Returns an error pinpointing the first non-numeric parameter value
pub fn from_csv(content: &str) -> Result<Vec<EquipmentRecord>, Box<dyn Error>> {
    let mut lines = content.lines();

    let header_line = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => return Err("CSV file is empty".into()),
    };

    let headers = parse_csv_row(header_line);
    let column_index = |name: &str| headers.iter().position(|h| h.trim() == name);

    // All five required columns must be present before any row is parsed
    let indices: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|c| column_index(c)).collect();
    if indices.iter().any(|idx| idx.is_none()) {
        return Err(format!("Missing columns. Required: {:?}", REQUIRED_COLUMNS).into());
    }
    let name_idx = indices[0].unwrap();
    let type_idx = indices[1].unwrap();
    let flow_idx = indices[2].unwrap();
    let pressure_idx = indices[3].unwrap();
    let temp_idx = indices[4].unwrap();

    let mut records = Vec::new();

    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue; // Trailing blank lines are common in exported CSVs
        }

        let fields = parse_csv_row(line);
        let row = line_no + 2; // 1-based, counting the header

        let field = |idx: usize| fields.get(idx).map(|s| s.trim()).unwrap_or("");

        records.push(EquipmentRecord {
            name: field(name_idx).to_string(),
            equipment_type: field(type_idx).to_string(),
            flowrate: parse_number(field(flow_idx), "Flowrate", row)?,
            pressure: parse_number(field(pressure_idx), "Pressure", row)?,
            temperature: parse_number(field(temp_idx), "Temperature", row)?,
        });
    }

    Ok(records)
}

// Parse one numeric parameter field, reporting where the bad value was found
fn parse_number(value: &str, column: &str, row: usize) -> Result<f64, Box<dyn Error>> {
    value
        .parse::<f64>()
        .map_err(|_| format!("Invalid value '{}' for {} in row {}", value, column, row).into())
}

// Parse a CSV row into a vector of strings
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if let Some(&next) = chars.peek() {
                    if next == '"' && in_quotes {
                        // Double quote inside quoted field - add a single quote
                        current_field.push('"');
                        chars.next();
                    } else {
                        // Toggle quote state
                        in_quotes = !in_quotes;
                    }
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                // End of field
                result.push(current_field);
                current_field = String::new();
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    // Add the last field
    result.push(current_field);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-101,Pump,120.5,4.2,65.0
Reactor-1,Reactor,80.0,12.5,210.0
Pump-102,Pump,95.25,3.8,58.5
";

    #[test]
    fn parses_well_formed_csv() {
        let records = from_csv(SAMPLE).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Pump-101");
        assert_eq!(records[0].equipment_type, "Pump");
        assert_eq!(records[0].flowrate, 120.5);
        assert_eq!(records[1].pressure, 12.5);
        assert_eq!(records[2].temperature, 58.5);
    }

    #[test]
    fn accepts_reordered_and_extra_columns() {
        let csv = "\
Type,Temperature,Equipment Name,Unit,Pressure,Flowrate
Valve,25.0,V-1,bar,1.5,10.0
";
        let records = from_csv(csv).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "V-1");
        assert_eq!(records[0].equipment_type, "Valve");
        assert_eq!(records[0].flowrate, 10.0);
        assert_eq!(records[0].pressure, 1.5);
        assert_eq!(records[0].temperature, 25.0);
    }

    #[test]
    fn handles_quoted_fields() {
        let csv = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
\"Heat Exchanger, Main\",\"Heat \"\"X\"\"\",50.0,2.0,130.0
";
        let records = from_csv(csv).unwrap();
        assert_eq!(records[0].name, "Heat Exchanger, Main");
        assert_eq!(records[0].equipment_type, "Heat \"X\"");
    }

    #[test]
    fn rejects_empty_file() {
        let err = from_csv("").unwrap_err();
        assert_eq!(err.to_string(), "CSV file is empty");
    }

    #[test]
    fn rejects_missing_columns() {
        let err = from_csv("Equipment Name,Type,Flowrate\nP,Pump,1.0\n").unwrap_err();
        assert!(err.to_string().contains("Missing columns"));
        assert!(err.to_string().contains("Temperature"));
    }

    #[test]
    fn rejects_non_numeric_parameter() {
        let csv = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
Pump-101,Pump,fast,4.2,65.0
";
        let err = from_csv(csv).unwrap_err();
        assert!(err.to_string().contains("Flowrate"));
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn skips_trailing_blank_lines() {
        let csv = format!("{}\n\n", SAMPLE);
        let records = from_csv(&csv).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn record_serializes_with_csv_header_keys() {
        let records = from_csv(SAMPLE).unwrap();
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["Equipment Name"], "Pump-101");
        assert_eq!(json["Type"], "Pump");
        assert_eq!(json["Flowrate"], 120.5);
    }
}
