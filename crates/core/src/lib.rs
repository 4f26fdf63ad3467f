pub mod calendar;
pub mod config;
pub mod error;

pub use calendar::WeekSpan;
pub use config::Config;
pub use error::*;
