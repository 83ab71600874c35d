use crate::core::archiver::{ArchiveRequest, ReportArchiver};
use crate::core::extractor::{normalize_identity, parse_report};
use crate::core::filter::{rank_networks, summarize, FilterPolicy};
use crate::core::submission::ReportTarget;
use crate::core::{ConfigProvider, DetectionService, Pipeline, ReportRenderer};
use crate::domain::model::{FilteredReport, ParsedReport, PartnerPair};
use crate::utils::error::Result;
use crate::utils::validation::validate_output_dir;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Fetches one report, filters its networks and writes the result.
pub struct MossPipeline<D: DetectionService, R: ReportRenderer, C: ConfigProvider> {
    service: D,
    renderer: R,
    config: C,
    report_url: String,
    current_students: Option<HashSet<String>>,
    partners: Vec<PartnerPair>,
}

impl<D: DetectionService, R: ReportRenderer, C: ConfigProvider> MossPipeline<D, R, C> {
    pub fn new(service: D, renderer: R, config: C, target: ReportTarget, partners: Vec<PartnerPair>) -> Self {
        // 報告內的學生名稱已轉為小寫，比對前先統一格式
        let current_students = target
            .current_students
            .filter(|_| config.track_current_students())
            .map(|set| set.iter().map(|s| normalize_identity(s)).collect());
        let partners = partners
            .iter()
            .map(|p| p.map_members(normalize_identity))
            .collect();

        Self {
            service,
            renderer,
            config,
            report_url: target.report_url,
            current_students,
            partners,
        }
    }

    pub fn service(&self) -> &D {
        &self.service
    }

    fn output_root(&self) -> &Path {
        Path::new(self.config.output_path())
    }
}

#[async_trait::async_trait]
impl<D: DetectionService, R: ReportRenderer, C: ConfigProvider> Pipeline for MossPipeline<D, R, C> {
    fn preflight(&self) -> Result<()> {
        validate_output_dir("output_path", self.output_root())
    }

    async fn extract(&self) -> Result<ParsedReport> {
        tracing::info!("🌐 Fetching report from {}", self.report_url);
        let content = self.service.fetch(&self.report_url).await?;
        let report = parse_report(&content, &self.report_url);

        if report.matches.is_empty() {
            tracing::warn!("No result rows found in the report");
        }
        tracing::info!("📊 Extracted {} matches", report.matches.len());
        Ok(report)
    }

    async fn transform(&self, report: ParsedReport) -> Result<FilteredReport> {
        let policy = FilterPolicy {
            enabled: self.config.filter_enabled(),
            current_students: self.current_students.as_ref(),
            partners: &self.partners,
            threshold: self.config.threshold(),
        };
        tracing::info!(
            "🔧 Filtering (enabled: {}, current-quarter tracking: {}, partners: {}, threshold: {})",
            policy.enabled,
            policy.current_students.is_some(),
            policy.partners.len(),
            policy.threshold
        );

        let groups = rank_networks(&report.matches, &policy);
        let stats = summarize(report.matches.len(), &groups);
        tracing::info!(
            "✅ {} networks, {} of {} matches retained ({} filtered)",
            groups.len(),
            stats.retained_count,
            stats.original_count,
            stats.filtered_count
        );

        Ok(FilteredReport {
            result_id: report.result_id,
            metadata: report.metadata,
            groups,
            stats,
        })
    }

    async fn load(&self, report: FilteredReport) -> Result<PathBuf> {
        let request = ArchiveRequest {
            output_root: self.output_root(),
            report_url: &self.report_url,
            download_resources: self.config.archive(),
            compress: self.config.zip_report(),
            concurrent_requests: self.config.concurrent_requests(),
        };

        ReportArchiver::new(&self.service, &self.renderer)
            .write(&request, &report, &self.partners)
            .await
    }
}
