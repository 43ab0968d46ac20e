use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

/// What one run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub records: usize,
    pub files: Vec<String>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Nothing is written when extraction returns no records.
    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Starting ETL process...");

        // Extract
        let raw_data = self.pipeline.extract().await?;
        let records = raw_data.len();
        if records == 0 {
            tracing::warn!("📭 No data to export");
            return Ok(RunReport::default());
        }

        // Transform
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Transformed {} records, {} nested tables",
            transformed.main_table.len(),
            transformed.nested_tables.len()
        );

        // Load
        let files = self.pipeline.load(transformed).await?;
        tracing::info!("Wrote {} files", files.len());

        Ok(RunReport { records, files })
    }
}
