use crate::adapters::partners::PartnerFormat;
use crate::core::render::RendererKind;
use crate::domain::model::{
    FileSpec, FilteredReport, MossOptions, ParsedReport, PartnerPair, SubmissionPayload,
    TemplateContext,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn account(&self) -> &str;
    fn language(&self) -> &str;
    fn server(&self) -> &str;
    fn port(&self) -> u16;
    fn moss_options(&self) -> MossOptions;
    fn request_timeout(&self) -> Option<Duration>;

    fn base_files(&self) -> Vec<FileSpec>;
    fn current_files(&self) -> Vec<FileSpec>;
    fn historical_files(&self) -> Vec<FileSpec>;
    /// Location of an already generated report; skips submission.
    fn report_url(&self) -> Option<&str>;
    fn current_students(&self) -> &[String];

    fn output_path(&self) -> &str;
    fn archive(&self) -> bool;
    fn zip_report(&self) -> bool;
    fn filter_enabled(&self) -> bool;
    fn threshold(&self) -> i32;
    fn track_current_students(&self) -> bool;
    fn concurrent_requests(&self) -> usize;
    fn renderer(&self) -> RendererKind;

    fn partners_file(&self) -> Option<&str>;
    fn partner_format(&self) -> PartnerFormat;
    fn assignment(&self) -> usize;
}

/// The plagiarism-detection service.
#[async_trait]
pub trait DetectionService: Send + Sync {
    /// Upload a submission and return the report location.
    async fn submit(&self, payload: &SubmissionPayload) -> Result<String>;

    /// Retrieve a document (main report or per-match resource).
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub trait ReportRenderer: Send + Sync {
    fn render(&self, context: &TemplateContext) -> Result<String>;
}

/// Converts an externally formatted partner file into pairs.
pub trait PartnerSource {
    fn load(&self, path: &Path) -> Result<Vec<PartnerPair>>;
}

impl<F> PartnerSource for F
where
    F: Fn(&Path) -> Result<Vec<PartnerPair>>,
{
    fn load(&self, path: &Path) -> Result<Vec<PartnerPair>> {
        self(path)
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Checks that must pass before any network I/O.
    fn preflight(&self) -> Result<()> {
        Ok(())
    }
    async fn extract(&self) -> Result<ParsedReport>;
    async fn transform(&self, report: ParsedReport) -> Result<FilteredReport>;
    async fn load(&self, report: FilteredReport) -> Result<PathBuf>;
}
