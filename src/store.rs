use crate::dataset::{Dataset, EquipmentRecord};
use crate::summary::{self, Summary};
use chrono::Utc;
use std::fs::{self, File, create_dir_all};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// How many past uploads the history listing returns
pub const HISTORY_LIMIT: usize = 5;

/// File-backed dataset store
///
/// Each uploaded dataset is written as one pretty-printed JSON file under
/// `<data_dir>/datasets/<id>.json`. Datasets are immutable once written, so
/// listing works by scanning the directory and sorting by upload date.
pub struct DatasetStore {
    data_dir: PathBuf,
}

impl DatasetStore {
    /// Create a store rooted at the given data directory
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        DatasetStore {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Initialize the store's directory structure
    ///
    /// Creates the data directory and its `datasets` subdirectory if they
    /// don't exist. Call once before serving requests.
    ///
    /// # Returns
    /// * `std::io::Result<()>` - Success or an IO error
    pub fn init(&self) -> std::io::Result<()> {
        let datasets_dir = self.datasets_dir();
        if !datasets_dir.exists() {
            create_dir_all(&datasets_dir)?;
        }
        Ok(())
    }

    /// Persist a new dataset
    ///
    /// Assigns a fresh id and the current time, then writes the dataset to
    /// disk.
    ///
    /// # Arguments
    /// * `filename` - Original filename of the upload
    /// * `records` - Parsed equipment rows
    ///
    /// # Returns
    /// * `Result<Dataset, String>` - The stored dataset or an error message
    pub fn save(&self, filename: &str, records: Vec<EquipmentRecord>) -> Result<Dataset, String> {
        let dataset = Dataset {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            upload_date: Utc::now(),
            records,
        };

        let json = match serde_json::to_string_pretty(&dataset) {
            Ok(json) => json,
            Err(_) => return Err("Failed to serialize dataset".to_string()),
        };

        let path = self.dataset_path(&dataset.id);
        let mut file = match File::create(&path) {
            Ok(file) => file,
            Err(_) => return Err("Failed to create dataset file".to_string()),
        };

        if file.write_all(json.as_bytes()).is_err() {
            return Err("Failed to write dataset file".to_string());
        }

        Ok(dataset)
    }

    /// Load a dataset by id
    ///
    /// # Arguments
    /// * `id` - Dataset identifier as returned by [`DatasetStore::save`]
    ///
    /// # Returns
    /// * `Result<Option<Dataset>, String>` - The dataset, `None` if unknown,
    ///   or an error message
    pub fn load(&self, id: &str) -> Result<Option<Dataset>, String> {
        // Ids are always UUIDs we generated; anything else is unknown and
        // must not reach the filesystem
        if Uuid::parse_str(id).is_err() {
            return Ok(None);
        }

        let path = self.dataset_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(_) => return Err("Failed to open dataset file".to_string()),
        };

        let mut contents = String::new();
        if file.read_to_string(&mut contents).is_err() {
            return Err("Failed to read dataset file".to_string());
        }

        match serde_json::from_str(&contents) {
            Ok(dataset) => Ok(Some(dataset)),
            Err(_) => Err("Failed to parse dataset file".to_string()),
        }
    }

    /// Summary of the most recently uploaded dataset
    ///
    /// # Returns
    /// * `Result<Option<Summary>, String>` - The latest summary, `None` when
    ///   nothing has been uploaded yet, or an error message
    pub fn latest_summary(&self) -> Result<Option<Summary>, String> {
        let datasets = self.all_by_recency()?;
        Ok(datasets.first().map(summary::summarize))
    }

    /// Summaries of the most recent uploads, newest first
    ///
    /// Returns at most [`HISTORY_LIMIT`] entries. Each entry is a full
    /// [`Summary`] so the dashboard can display a past upload without a
    /// further fetch.
    ///
    /// # Returns
    /// * `Result<Vec<Summary>, String>` - History entries or an error message
    pub fn history(&self) -> Result<Vec<Summary>, String> {
        let datasets = self.all_by_recency()?;
        Ok(datasets
            .iter()
            .take(HISTORY_LIMIT)
            .map(summary::summarize)
            .collect())
    }

    // All stored datasets sorted by upload date, newest first. Files that
    // fail to parse are skipped rather than failing the whole listing.
    fn all_by_recency(&self) -> Result<Vec<Dataset>, String> {
        let entries = match fs::read_dir(self.datasets_dir()) {
            Ok(entries) => entries,
            Err(_) => return Err("Failed to read datasets directory".to_string()),
        };

        let mut datasets = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Ok(contents) = fs::read_to_string(&path) {
                if let Ok(dataset) = serde_json::from_str::<Dataset>(&contents) {
                    datasets.push(dataset);
                }
            }
        }

        datasets.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(datasets)
    }

    fn datasets_dir(&self) -> PathBuf {
        self.data_dir.join("datasets")
    }

    fn dataset_path(&self, id: &str) -> PathBuf {
        self.datasets_dir().join(format!("{}.json", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::EquipmentRecord;

    fn record(equipment_type: &str) -> EquipmentRecord {
        EquipmentRecord {
            name: "E-1".to_string(),
            equipment_type: equipment_type.to_string(),
            flowrate: 10.0,
            pressure: 2.0,
            temperature: 40.0,
        }
    }

    fn temp_store() -> (tempfile::TempDir, DatasetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn save_then_load_roundtrip() {
        let (_dir, store) = temp_store();
        let saved = store.save("plant.csv", vec![record("Pump")]).unwrap();

        let loaded = store.load(&saved.id).unwrap().unwrap();
        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.filename, "plant.csv");
        assert_eq!(loaded.records, saved.records);
    }

    #[test]
    fn load_unknown_id_is_none() {
        let (_dir, store) = temp_store();
        let id = Uuid::new_v4().to_string();
        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn load_rejects_non_uuid_id() {
        let (_dir, store) = temp_store();
        assert!(store.load("../users").unwrap().is_none());
    }

    #[test]
    fn latest_summary_is_most_recent_upload() {
        let (_dir, store) = temp_store();
        assert!(store.latest_summary().unwrap().is_none());

        store.save("first.csv", vec![record("Pump")]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.save("second.csv", vec![record("Valve")]).unwrap();

        let latest = store.latest_summary().unwrap().unwrap();
        assert_eq!(latest.filename, "second.csv");
        assert_eq!(latest.type_distribution.get("Valve"), Some(&1));
    }

    #[test]
    fn history_is_capped_and_newest_first() {
        let (_dir, store) = temp_store();
        for i in 0..7 {
            store
                .save(&format!("upload-{}.csv", i), vec![record("Pump")])
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let history = store.history().unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].filename, "upload-6.csv");
        assert_eq!(history[4].filename, "upload-2.csv");
        for pair in history.windows(2) {
            assert!(pair[0].upload_date >= pair[1].upload_date);
        }
    }

    #[test]
    fn history_entries_are_full_summaries() {
        let (_dir, store) = temp_store();
        store
            .save("plant.csv", vec![record("Pump"), record("Pump")])
            .unwrap();

        let history = store.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].data.len(), 2);
        assert_eq!(history[0].type_distribution.get("Pump"), Some(&2));
        assert_eq!(history[0].avg_flowrate, 10.0);
    }
}
