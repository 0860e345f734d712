pub mod client;
pub mod csv_reader;
pub mod etl;
pub mod normalizer;
pub mod pipeline;

pub use crate::domain::model::{FlatRow, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
