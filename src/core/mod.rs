pub mod etl;
pub mod export;
pub mod flatten;
pub mod nested;
pub mod paginator;

pub use crate::domain::model::{FlatRecord, Page, Record, Scalar, Table, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Sleeper, Storage};
pub use crate::utils::error::Result;
