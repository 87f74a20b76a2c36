use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::normalize::normalize_well_id;
use super::DatasetError;

/// Columns every dataset must provide, in display order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Well ID",
    "Temperature",
    "Pressure",
    "Flow Rate",
    "Vibration",
    "Humidity",
    "Fault Detected",
    "Suggested Action",
];

/// Blank numeric cells read as NaN so one gap does not reject the file.
fn blank_as_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Display form of a sensor reading: always with a fractional part
/// (`210.0`), `nan` for a missing cell.
pub fn format_reading(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{value:?}")
    }
}

/// One row of the well dataset. Missing readings are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(rename = "Well ID")]
    pub well_id: String,
    #[serde(rename = "Temperature", deserialize_with = "blank_as_nan")]
    pub temperature: f64,
    #[serde(rename = "Pressure", deserialize_with = "blank_as_nan")]
    pub pressure: f64,
    #[serde(rename = "Flow Rate", deserialize_with = "blank_as_nan")]
    pub flow_rate: f64,
    #[serde(rename = "Vibration", deserialize_with = "blank_as_nan")]
    pub vibration: f64,
    #[serde(rename = "Humidity", deserialize_with = "blank_as_nan")]
    pub humidity: f64,
    #[serde(rename = "Fault Detected")]
    pub fault_detected: String,
    #[serde(rename = "Suggested Action")]
    pub suggested_action: String,
}

impl SensorRecord {
    /// `(column, value)` pairs in dataset column order.
    pub fn fields(&self) -> [(&'static str, String); 8] {
        [
            (REQUIRED_COLUMNS[0], self.well_id.clone()),
            (REQUIRED_COLUMNS[1], format_reading(self.temperature)),
            (REQUIRED_COLUMNS[2], format_reading(self.pressure)),
            (REQUIRED_COLUMNS[3], format_reading(self.flow_rate)),
            (REQUIRED_COLUMNS[4], format_reading(self.vibration)),
            (REQUIRED_COLUMNS[5], format_reading(self.humidity)),
            (REQUIRED_COLUMNS[6], self.fault_detected.clone()),
            (REQUIRED_COLUMNS[7], self.suggested_action.clone()),
        ]
    }
}

/// Immutable in-memory snapshot of the sensor CSV.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SensorRecord>,
}

impl Dataset {
    /// Read and parse the CSV file at `path`.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            rows = dataset.len(),
            "Loaded well dataset"
        );
        Ok(dataset)
    }

    /// Parse CSV from any reader. Identifier cells are lowercased and trimmed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DatasetError::MissingColumn(column));
            }
        }

        let records = rdr
            .deserialize::<SensorRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<SensorRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                record.well_id = record.well_id.trim().to_lowercase();
                record
            })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    /// Look up an already-normalized key. First row in source order wins.
    pub fn find(&self, key: &str) -> Option<&SensorRecord> {
        let mut matches = self.records.iter().filter(|r| r.well_id == key);
        let first = matches.next()?;
        let extra = matches.count();
        if extra > 0 {
            tracing::debug!(well = key, duplicates = extra, "Duplicate well id, using first row");
        }
        Some(first)
    }

    /// Normalize free-form input and look it up.
    pub fn resolve(&self, input: &str) -> Option<&SensorRecord> {
        self.find(&normalize_well_id(input))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_CSV: &str = "\
Well ID,Temperature,Pressure,Flow Rate,Vibration,Humidity,Fault Detected,Suggested Action
WELL 1,180.5,2500,1200,3.2,45,No,Routine inspection
Well 2 ,210.0,3100.5,950,7.8,60,Yes,Check pump bearings
";

    pub(crate) fn sample_dataset() -> Dataset {
        Dataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap()
    }

    pub(crate) fn sample_record() -> SensorRecord {
        sample_dataset().records()[1].clone()
    }

    #[test]
    fn identifiers_are_lowercased_and_trimmed() {
        let dataset = sample_dataset();
        let ids: Vec<&str> = dataset.records().iter().map(|r| r.well_id.as_str()).collect();
        assert_eq!(ids, vec!["well 1", "well 2"]);
    }

    #[test]
    fn resolve_finds_row_by_free_form_input() {
        let dataset = sample_dataset();
        let record = dataset.resolve("2").unwrap();
        assert_eq!(record.well_id, "well 2");
        assert_eq!(record.pressure, 3100.5);
        assert_eq!(record.fault_detected, "Yes");

        assert_eq!(dataset.resolve("WELL-1").unwrap().well_id, "well 1");
    }

    #[test]
    fn resolve_unknown_well_is_none() {
        assert!(sample_dataset().resolve("999").is_none());
    }

    #[test]
    fn duplicate_identifiers_resolve_to_first_row() {
        let csv = "\
Well ID,Temperature,Pressure,Flow Rate,Vibration,Humidity,Fault Detected,Suggested Action
well 5,100,1,1,1,1,No,first
WELL 5,200,2,2,2,2,Yes,second
";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.resolve("5").unwrap().suggested_action, "first");
    }

    #[test]
    fn named_wells_without_digits_resolve() {
        let csv = "\
Well ID,Temperature,Pressure,Flow Rate,Vibration,Humidity,Fault Detected,Suggested Action
North Star,100,1,1,1,1,No,none
";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert!(dataset.resolve("  NORTH STAR ").is_some());
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Well ID,Temperature\nwell 1,10\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("Pressure")));
    }

    #[test]
    fn non_numeric_sensor_value_is_a_csv_error() {
        let csv = "\
Well ID,Temperature,Pressure,Flow Rate,Vibration,Humidity,Fault Detected,Suggested Action
well 1,hot,1,1,1,1,No,none
";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Csv(_)));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "\
Timestamp,Well ID,Temperature,Pressure,Flow Rate,Vibration,Humidity,Fault Detected,Suggested Action
2024-01-01,well 9,1,2,3,4,5,No,none
";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.resolve("9").unwrap().flow_rate, 3.0);
    }

    #[test]
    fn load_reports_missing_file_with_path() {
        let err = Dataset::load(Path::new("/nonexistent/scada.csv")).unwrap_err();
        match err {
            DatasetError::Io { path, .. } => assert!(path.ends_with("scada.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scada_dataset.csv");
        std::fs::write(&path, SAMPLE_CSV).unwrap();
        assert_eq!(Dataset::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn fields_follow_column_order() {
        let record = sample_record();
        let fields = record.fields();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, REQUIRED_COLUMNS.to_vec());
        assert_eq!(fields[1].1, "210.0");
        assert_eq!(fields[2].1, "3100.5");
        assert_eq!(fields[3].1, "950.0");
    }

    #[test]
    fn blank_reading_loads_as_nan() {
        let csv = "\
Well ID,Temperature,Pressure,Flow Rate,Vibration,Humidity,Fault Detected,Suggested Action
well 1,180.5,2500,1200,3.2,45,No,none
well 2,210,3100,950,7.8,,Yes,check
";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);

        let record = dataset.resolve("2").unwrap();
        assert!(record.humidity.is_nan());
        assert_eq!(record.vibration, 7.8);
        assert_eq!(record.fields()[5].1, "nan");
    }

    #[test]
    fn readings_display_like_float_columns() {
        assert_eq!(format_reading(210.0), "210.0");
        assert_eq!(format_reading(7.8), "7.8");
        assert_eq!(format_reading(-3.25), "-3.25");
        assert_eq!(format_reading(f64::NAN), "nan");
    }
}
