use crate::core::export::{render_csv, render_raw_json, sample_columns, ExportLayout};
use crate::core::flatten::flatten;
use crate::core::nested::collect_side_tables;
use crate::core::paginator::{PageFetcher, StopReason};
use crate::domain::model::{NestedTable, Record, Table, TransformResult};
use crate::domain::ports::{ConfigProvider, Pipeline, Sleeper, Storage};
use crate::utils::error::Result;
use std::path::Path;
use url::Url;

/// Fetches every page of the endpoint, then writes the raw dump, one CSV per
/// object-list field and the flattened main CSV.
pub struct ExportPipeline<S: Storage, Z: Sleeper, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: PageFetcher<Z>,
    layout: ExportLayout,
}

impl<S: Storage, Z: Sleeper, C: ConfigProvider> ExportPipeline<S, Z, C> {
    pub fn new(storage: S, sleeper: Z, config: C) -> Result<Self> {
        let fetcher = PageFetcher::new(sleeper, config.retry_policy().clone())?;
        let layout = ExportLayout::for_today(config.file_prefix(), config.raw_prefix());

        Ok(Self {
            storage,
            config,
            fetcher,
            layout,
        })
    }

    /// Pins the `YYYYMMDD` stamp used in file names.
    pub fn with_date_stamp(mut self, date_stamp: impl Into<String>) -> Self {
        self.layout.date_stamp = date_stamp.into();
        self
    }

    async fn write(&self, name: &str, data: &[u8]) -> Result<String> {
        self.storage.write_file(name, data).await?;
        let path = Path::new(self.config.output_path())
            .join(name)
            .display()
            .to_string();
        Ok(path)
    }
}

#[async_trait::async_trait]
impl<S: Storage, Z: Sleeper, C: ConfigProvider> Pipeline for ExportPipeline<S, Z, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        let start = Url::parse(self.config.api_endpoint())?;
        tracing::info!("🚀 Starting data extraction from {}", start);

        let outcome = self.fetcher.fetch_all(start).await;

        match outcome.stop {
            StopReason::Completed => {
                tracing::info!("✅ Pagination complete after {} pages", outcome.pages)
            }
            StopReason::RetriesExhausted | StopReason::MalformedBody => tracing::warn!(
                "⚠️ Pagination stopped early ({:?}) after {} pages, keeping {} records",
                outcome.stop,
                outcome.pages,
                outcome.records.len()
            ),
        }

        Ok(outcome.records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        tracing::info!("🔧 Flattening {} records", data.len());

        let nested_tables = collect_side_tables(&data)
            .into_iter()
            .map(|side| {
                tracing::info!(
                    "Processing nested list field '{}' ({} items)",
                    side.field,
                    side.items.len()
                );
                NestedTable {
                    table: Table::from_rows(side.items.iter().map(flatten).collect()),
                    field: side.field,
                }
            })
            .collect();

        let main_table = Table::from_rows(data.iter().map(flatten).collect());

        Ok(TransformResult {
            raw_records: data,
            nested_tables,
            main_table,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<Vec<String>> {
        let mut written = Vec::new();

        let raw = render_raw_json(&result.raw_records)?;
        let path = self.write(&self.layout.raw_file(), &raw).await?;
        tracing::info!("💾 Raw data saved to {}", path);
        written.push(path);

        for nested in &result.nested_tables {
            if nested.table.is_empty() {
                continue;
            }
            let csv = render_csv(&nested.table)?;
            let path = self.write(&self.layout.nested_file(&nested.field), &csv).await?;
            tracing::info!("  Nested data exported to {}", path);
            written.push(path);
        }

        let csv = render_csv(&result.main_table)?;
        let path = self.write(&self.layout.main_file(), &csv).await?;
        tracing::info!("📦 Main data exported to {}", path);
        written.push(path);

        tracing::info!("Total columns in main file: {}", result.main_table.columns.len());
        tracing::info!("Sample columns from main file:");
        for column in sample_columns(&result.main_table, 10) {
            tracing::info!("  - {}", column);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::domain::model::Scalar;
    use crate::utils::error::EtlError;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_on: Option<String>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files.get(path).map(|b| String::from_utf8(b.clone()).unwrap())
        }

        async fn names(&self) -> Vec<String> {
            let mut names: Vec<_> = self.files.lock().await.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct NoSleep;

    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn pipeline(storage: MockStorage) -> ExportPipeline<MockStorage, NoSleep, RunConfig> {
        let config = RunConfig {
            output_path: "test_output".to_string(),
            ..RunConfig::default()
        };
        ExportPipeline::new(storage, NoSleep, config)
            .unwrap()
            .with_date_stamp("20240131")
    }

    fn records(value: serde_json::Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_transform_builds_main_and_nested_tables() {
        let pipeline = pipeline(MockStorage::default());
        let input = records(json!([
            {"id": 1, "name": "Kenya", "contacts": [{"name": "A"}, {"name": "B"}]},
            {"id": 2, "name": "Nepal", "region": {"name": "Asia"}}
        ]));

        let result = pipeline.transform(input).await.unwrap();

        assert_eq!(result.raw_records.len(), 2);
        assert_eq!(result.main_table.columns, vec!["id", "name", "contacts", "region.name"]);
        assert_eq!(
            result.main_table.rows[0].get("contacts"),
            Some(&Scalar::String("[List of 2 items]".into()))
        );
        assert_eq!(result.nested_tables.len(), 1);
        assert_eq!(result.nested_tables[0].field, "contacts");
        assert_eq!(result.nested_tables[0].table.columns, vec!["name", "parent_id"]);
    }

    #[tokio::test]
    async fn test_load_writes_all_artifacts() {
        let storage = MockStorage::default();
        let pipeline = pipeline(storage.clone());
        let input = records(json!([
            {"id": 7, "iso": "KE", "links": [{"url": "a"}], "society.offices": [{"city": "X"}]}
        ]));

        let result = pipeline.transform(input).await.unwrap();
        let written = pipeline.load(result).await.unwrap();

        assert_eq!(written.len(), 4);
        assert_eq!(written[0], Path::new("test_output").join("raw_country_data_20240131.json").display().to_string());
        assert_eq!(
            storage.names().await,
            vec![
                "ifrc_countries_20240131.csv",
                "ifrc_countries_links_20240131.csv",
                "ifrc_countries_society_offices_20240131.csv",
                "raw_country_data_20240131.json",
            ]
        );

        let main = storage.get_file("ifrc_countries_20240131.csv").await.unwrap();
        assert_eq!(
            main,
            "id,iso,links,society.offices\n7,KE,[List of 1 items],[List of 1 items]\n"
        );
        let links = storage.get_file("ifrc_countries_links_20240131.csv").await.unwrap();
        assert_eq!(links, "url,parent_id\na,7\n");
    }

    #[tokio::test]
    async fn test_load_failure_keeps_earlier_files() {
        let storage = MockStorage {
            fail_on: Some("ifrc_countries_20240131.csv".to_string()),
            ..MockStorage::default()
        };
        let pipeline = pipeline(storage.clone());
        let result = pipeline
            .transform(records(json!([{"id": 1, "rows": [{"v": 1}]}])))
            .await
            .unwrap();

        let err = pipeline.load(result).await.unwrap_err();

        assert!(matches!(err, EtlError::IoError(_)));
        assert_eq!(
            storage.names().await,
            vec!["ifrc_countries_rows_20240131.csv", "raw_country_data_20240131.json"]
        );
    }

    #[tokio::test]
    async fn test_extract_rejects_invalid_endpoint() {
        let config = RunConfig {
            api_endpoint: "not a url".to_string(),
            ..RunConfig::default()
        };
        let pipeline = ExportPipeline::new(MockStorage::default(), NoSleep, config).unwrap();

        assert!(matches!(pipeline.extract().await, Err(EtlError::UrlError(_))));
    }
}
