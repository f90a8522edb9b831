//! Picks the best configuration out of TUNA tuning-run result tables.

pub mod error;
pub mod fetch;
pub mod literal;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod select;
pub mod table;

pub use error::SelectError;
pub use literal::decode_config;
pub use literal::ConfigValue;
pub use literal::SelectedConfig;
pub use pipeline::run;
pub use profile::Profile;
