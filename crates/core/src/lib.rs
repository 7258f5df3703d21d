//! Campaign Insights core: the campaign record data model, error taxonomy,
//! and application configuration shared by every crate in the workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use types::{CampaignRecord, RawTable, REQUIRED_COLUMNS};
