use super::{RawTable, TabularStore};

const UTF8_BOM: char = '\u{feff}';

/// Comma-separated tables with a header row, as exported by spreadsheet
/// tools. Ragged rows are accepted; missing trailing cells read as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvStore;

impl TabularStore for CsvStore {
    fn decode(&self, bytes: &[u8]) -> Result<RawTable, String> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| err.to_string())?
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let header = if index == 0 {
                    header.trim_start_matches(UTF8_BOM)
                } else {
                    header
                };
                header.trim().to_string()
            })
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| err.to_string())?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(RawTable { headers, rows })
    }

    fn encode(&self, table: &RawTable) -> Result<Vec<u8>, String> {
        let mut writer = ::csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&table.headers)
            .map_err(|err| err.to_string())?;
        for row in &table.rows {
            writer.write_record(row).map_err(|err| err.to_string())?;
        }
        writer.into_inner().map_err(|err| err.to_string())
    }
}
