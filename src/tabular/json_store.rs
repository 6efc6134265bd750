use serde_json::{Map, Value};

use super::{RawTable, TabularStore};

/// A JSON array of flat row objects: `[{"BRnum": "A1", "Pdf_URL": "..."}]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStore;

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl TabularStore for JsonStore {
    fn decode(&self, bytes: &[u8]) -> Result<RawTable, String> {
        let objects: Vec<Map<String, Value>> =
            serde_json::from_slice(bytes).map_err(|err| err.to_string())?;

        let mut headers: Vec<String> = Vec::new();
        for object in &objects {
            for name in object.keys() {
                if !headers.iter().any(|header| header == name) {
                    headers.push(name.clone());
                }
            }
        }

        let rows: Vec<Vec<String>> = objects
            .iter()
            .map(|object| {
                headers
                    .iter()
                    .map(|header| object.get(header).map(cell_text).unwrap_or_default())
                    .collect::<Vec<String>>()
            })
            .collect();
        Ok(RawTable { headers, rows })
    }

    fn encode(&self, table: &RawTable) -> Result<Vec<u8>, String> {
        let objects: Vec<Map<String, Value>> = table
            .rows
            .iter()
            .map(|row| {
                table
                    .headers
                    .iter()
                    .zip(row)
                    .map(|(header, value)| (header.clone(), Value::String(value.clone())))
                    .collect::<Map<String, Value>>()
            })
            .collect();
        serde_json::to_vec_pretty(&objects).map_err(|err| err.to_string())
    }
}
