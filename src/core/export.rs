use crate::core::nested::sanitize_field_name;
use crate::domain::model::{Record, Table};
use crate::utils::error::{EtlError, Result};

/// Output file names for one run. The date stamp is fixed when the layout is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLayout {
    pub file_prefix: String,
    pub raw_prefix: String,
    pub date_stamp: String,
}

impl ExportLayout {
    pub fn new(
        file_prefix: impl Into<String>,
        raw_prefix: impl Into<String>,
        date_stamp: impl Into<String>,
    ) -> Self {
        Self {
            file_prefix: file_prefix.into(),
            raw_prefix: raw_prefix.into(),
            date_stamp: date_stamp.into(),
        }
    }

    /// Stamped with the local date as `YYYYMMDD`.
    pub fn for_today(file_prefix: impl Into<String>, raw_prefix: impl Into<String>) -> Self {
        let stamp = chrono::Local::now().format("%Y%m%d").to_string();
        Self::new(file_prefix, raw_prefix, stamp)
    }

    pub fn raw_file(&self) -> String {
        format!("{}_{}.json", self.raw_prefix, self.date_stamp)
    }

    pub fn main_file(&self) -> String {
        format!("{}_{}.csv", self.file_prefix, self.date_stamp)
    }

    pub fn nested_file(&self, field: &str) -> String {
        format!(
            "{}_{}_{}.csv",
            self.file_prefix,
            sanitize_field_name(field),
            self.date_stamp
        )
    }
}

/// Pretty JSON with two-space indent, non-ASCII kept as UTF-8.
pub fn render_raw_json(records: &[Record]) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(records)?;
    json.push(b'\n');
    Ok(json)
}

/// Header is the table's column union; absent keys are written as empty cells.
pub fn render_csv(table: &Table) -> Result<Vec<u8>> {
    if table.columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;

    for row in &table.rows {
        writer.write_record(
            table
                .columns
                .iter()
                .map(|column| row.get(column).map(|v| v.to_cell().into_owned()).unwrap_or_default()),
        )?;
    }

    writer.into_inner().map_err(|e| {
        EtlError::IoError(std::io::Error::new(e.error().kind(), e.error().to_string()))
    })
}

/// First `limit` column names in sorted order, for the post-export summary.
pub fn sample_columns(table: &Table, limit: usize) -> Vec<&str> {
    let mut columns: Vec<&str> = table.columns.iter().map(String::as_str).collect();
    columns.sort_unstable();
    columns.truncate(limit);
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flatten::flatten;
    use serde_json::json;

    fn table(value: serde_json::Value) -> Table {
        let records: Vec<Record> = serde_json::from_value(value).unwrap();
        Table::from_rows(records.iter().map(flatten).collect())
    }

    #[test]
    fn test_layout_file_names() {
        let layout = ExportLayout::new("ifrc_countries", "raw_country_data", "20240131");

        assert_eq!(layout.raw_file(), "raw_country_data_20240131.json");
        assert_eq!(layout.main_file(), "ifrc_countries_20240131.csv");
        assert_eq!(
            layout.nested_file("regions.contacts"),
            "ifrc_countries_regions_contacts_20240131.csv"
        );
    }

    #[test]
    fn test_today_stamp_shape() {
        let layout = ExportLayout::for_today("a", "b");
        assert_eq!(layout.date_stamp.len(), 8);
        assert!(layout.date_stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_csv_union_with_missing_cells() {
        let table = table(json!([
            {"id": 1, "name": "Kenya", "active": true},
            {"id": 2, "region": {"code": 0}, "name": null}
        ]));

        let csv = String::from_utf8(render_csv(&table).unwrap()).unwrap();

        assert_eq!(csv, "id,name,active,region.code\n1,Kenya,true,\n2,,,0\n");
    }

    #[test]
    fn test_csv_quotes_delimiters_and_keeps_utf8() {
        let table = table(json!([{"name": "Côte d'Ivoire, Republic", "langs": ["fr", "en"]}]));

        let csv = String::from_utf8(render_csv(&table).unwrap()).unwrap();

        assert_eq!(csv, "name,langs\n\"Côte d'Ivoire, Republic\",fr|en\n");
    }

    #[test]
    fn test_raw_json_is_indented_utf8() {
        let records: Vec<Record> = serde_json::from_value(json!([{"name": "Türkiye", "id": 1}])).unwrap();

        let raw = String::from_utf8(render_raw_json(&records).unwrap()).unwrap();

        assert_eq!(raw, "[\n  {\n    \"name\": \"Türkiye\",\n    \"id\": 1\n  }\n]\n");
    }

    #[test]
    fn test_out_of_range_numbers_keep_their_digits() {
        let body = r#"[{"id": 123456789012345678901234567890, "ratio": 0.10000000000000000000001}]"#;
        let records: Vec<Record> = serde_json::from_str(body).unwrap();

        let raw = String::from_utf8(render_raw_json(&records).unwrap()).unwrap();
        assert!(raw.contains("\"id\": 123456789012345678901234567890"));
        assert!(raw.contains("\"ratio\": 0.10000000000000000000001"));

        let table = Table::from_rows(records.iter().map(flatten).collect());
        let csv = String::from_utf8(render_csv(&table).unwrap()).unwrap();
        assert_eq!(csv, "id,ratio\n123456789012345678901234567890,0.10000000000000000000001\n");
    }

    #[test]
    fn test_sample_columns_sorted_and_limited() {
        let table = table(json!([{"z": 1, "a": 2, "m": 3}]));
        assert_eq!(sample_columns(&table, 2), vec!["a", "m"]);
    }
}
