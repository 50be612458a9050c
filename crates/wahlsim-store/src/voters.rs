//! Voter seed table loading.

use std::path::Path;

use serde_json::{Number, Value};
use tracing::info;
use wahlsim_core::VoterRecord;

use crate::StoreError;

/// Read a delimited survey file (header row + one voter per row) into memory.
///
/// Cells are typed by shape: integers and finite floats become JSON numbers,
/// empty cells become `null`, everything else stays a string.
pub fn load_voters(path: &Path) -> Result<Vec<VoterRecord>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new().flexible(false).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: VoterRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(key, cell)| (key.to_string(), infer_value(cell)))
            .collect();
        records.push(record);
    }

    info!(count = records.len(), path = %path.display(), "loaded voter records");
    Ok(records)
}

fn infer_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infers_cell_types() {
        assert_eq!(infer_value("34"), json!(34));
        assert_eq!(infer_value("1.5"), json!(1.5));
        assert_eq!(infer_value(""), Value::Null);
        assert_eq!(infer_value("Berlin"), json!("Berlin"));
        assert_eq!(infer_value("NaN"), json!("NaN"));
    }

    #[test]
    fn loads_rows_keyed_by_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voters.csv");
        std::fs::write(
            &path,
            "age,occupation,region\n34,Lehrer,Berlin\n61,Rentnerin,\"Sachsen, Land\"\n",
        )
        .unwrap();

        let voters = load_voters(&path).unwrap();
        assert_eq!(voters.len(), 2);
        assert_eq!(voters[0].get("age"), Some(&json!(34)));
        assert_eq!(voters[0].get("occupation"), Some(&json!("Lehrer")));
        assert_eq!(voters[1].get("region"), Some(&json!("Sachsen, Land")));
    }

    #[test]
    fn prompt_keeps_header_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voters.csv");
        std::fs::write(&path, "region,age,beruf\nBerlin,34,Lehrer\n").unwrap();

        let voters = load_voters(&path).unwrap();
        assert_eq!(
            voters[0].to_prompt_json(),
            r#"{"region":"Berlin","age":34,"beruf":"Lehrer"}"#
        );
    }

    #[test]
    fn ragged_row_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voters.csv");
        std::fs::write(&path, "age,region\n34\n").unwrap();
        assert!(matches!(load_voters(&path), Err(StoreError::Csv(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_voters(Path::new("/nonexistent/voters.csv")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
