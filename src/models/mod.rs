//! Domain models: the canonical decedent record and the dataset holding it

pub mod dataset;
pub mod record;
pub mod types;

pub use dataset::{CanonicalDataset, DatasetView};
pub use record::{CanonicalRecord, age_in_years};
pub use types::{Sex, YearMonth};
