pub mod archiver;
pub mod engine;
pub mod extractor;
pub mod filter;
pub mod network;
pub mod pipeline;
pub mod render;
pub mod submission;

pub use crate::domain::model::{FilteredReport, Match, ParsedReport};
pub use crate::domain::ports::{
    ConfigProvider, DetectionService, PartnerSource, Pipeline, ReportRenderer, Storage,
};
pub use crate::utils::error::Result;
