use crate::dataset::{Dataset, EquipmentRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate view of one uploaded dataset
///
/// This is the shape the dashboard consumes: identification, the three
/// parameter averages, the equipment-type distribution, and the raw rows for
/// the table view. History entries use the same shape so the dashboard can
/// display a past upload without a further fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Identifier of the underlying dataset
    pub id: String,

    /// Original filename of the upload
    pub filename: String,

    /// Time the dataset was uploaded
    pub upload_date: DateTime<Utc>,

    /// Mean flowrate across all rows (0.0 for an empty dataset)
    pub avg_flowrate: f64,

    /// Mean pressure across all rows (0.0 for an empty dataset)
    pub avg_pressure: f64,

    /// Mean temperature across all rows (0.0 for an empty dataset)
    pub avg_temperature: f64,

    /// Count of rows per equipment type, ordered by type name
    pub type_distribution: BTreeMap<String, usize>,

    /// The raw equipment rows
    pub data: Vec<EquipmentRecord>,
}

/// Compute the aggregate summary of a dataset
///
/// # Arguments
/// * `dataset` - The dataset to summarize
///
/// # Returns
/// * `Summary` - Averages, type distribution and row data for the dashboard
pub fn summarize(dataset: &Dataset) -> Summary {
    let records = &dataset.records;

    let mut type_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *type_distribution
            .entry(record.equipment_type.clone())
            .or_insert(0) += 1;
    }

    Summary {
        id: dataset.id.clone(),
        filename: dataset.filename.clone(),
        upload_date: dataset.upload_date,
        avg_flowrate: average(records, |r| r.flowrate),
        avg_pressure: average(records, |r| r.pressure),
        avg_temperature: average(records, |r| r.temperature),
        type_distribution,
        data: records.clone(),
    }
}

// Mean of one parameter over all rows; an empty dataset averages to 0.0
fn average<F: Fn(&EquipmentRecord) -> f64>(records: &[EquipmentRecord], field: F) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(field).sum::<f64>() / records.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, equipment_type: &str, flow: f64, pressure: f64, temp: f64) -> EquipmentRecord {
        EquipmentRecord {
            name: name.to_string(),
            equipment_type: equipment_type.to_string(),
            flowrate: flow,
            pressure,
            temperature: temp,
        }
    }

    fn dataset(records: Vec<EquipmentRecord>) -> Dataset {
        Dataset {
            id: "ds-1".to_string(),
            filename: "plant.csv".to_string(),
            upload_date: Utc::now(),
            records,
        }
    }

    #[test]
    fn computes_parameter_averages() {
        let summary = summarize(&dataset(vec![
            record("P1", "Pump", 100.0, 4.0, 60.0),
            record("P2", "Pump", 200.0, 6.0, 80.0),
        ]));
        assert_eq!(summary.avg_flowrate, 150.0);
        assert_eq!(summary.avg_pressure, 5.0);
        assert_eq!(summary.avg_temperature, 70.0);
    }

    #[test]
    fn counts_types_in_distribution() {
        let summary = summarize(&dataset(vec![
            record("P1", "Pump", 1.0, 1.0, 1.0),
            record("P2", "Pump", 1.0, 1.0, 1.0),
            record("R1", "Reactor", 1.0, 1.0, 1.0),
        ]));
        assert_eq!(summary.type_distribution.get("Pump"), Some(&2));
        assert_eq!(summary.type_distribution.get("Reactor"), Some(&1));
        assert_eq!(summary.type_distribution.len(), 2);
    }

    #[test]
    fn empty_dataset_averages_to_zero() {
        let summary = summarize(&dataset(Vec::new()));
        assert_eq!(summary.avg_flowrate, 0.0);
        assert_eq!(summary.avg_pressure, 0.0);
        assert_eq!(summary.avg_temperature, 0.0);
        assert!(summary.type_distribution.is_empty());
        assert!(summary.data.is_empty());
    }

    #[test]
    fn summary_carries_dataset_identity_and_rows() {
        let summary = summarize(&dataset(vec![record("P1", "Pump", 1.0, 2.0, 3.0)]));
        assert_eq!(summary.id, "ds-1");
        assert_eq!(summary.filename, "plant.csv");
        assert_eq!(summary.data.len(), 1);
        assert_eq!(summary.data[0].name, "P1");
    }
}
