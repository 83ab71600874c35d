use crate::adapters::partners::load_partners;
use crate::core::submission::{ReportTarget, Submission};
use crate::core::{ConfigProvider, DetectionService, Pipeline};
use crate::domain::model::PartnerPair;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use crate::utils::validation::validate_output_dir;
use std::path::{Path, PathBuf};

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<PathBuf> {
        tracing::info!("🚀 Starting report processing");
        self.pipeline.preflight()?;

        let report = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        let filtered = self.pipeline.transform(report).await?;
        self.monitor.log_stats("Filter");

        let output_path = self.pipeline.load(filtered).await?;
        self.monitor.log_stats("Archive");
        self.monitor.log_final_stats();

        tracing::info!("📁 Report written to {}", output_path.display());
        Ok(output_path)
    }
}

/// Builds the submission described by `config` and sends it, or resumes
/// from a known report location.
pub async fn prepare_target<C, D>(config: &C, service: &D) -> Result<ReportTarget>
where
    C: ConfigProvider,
    D: DetectionService + ?Sized,
{
    // 送出後無法重送，輸出目錄須先確認
    validate_output_dir("output_path", Path::new(config.output_path()))?;

    let mut submission = match config.report_url() {
        Some(url) => {
            tracing::info!("♻️ Using existing report {}", url);
            Submission::resume(
                config.account(),
                config.language(),
                url,
                config.current_students().iter().cloned(),
            )?
        }
        None => {
            let mut submission = Submission::new(config.account(), config.language())?
                .with_options(config.moss_options());
            for file in config.base_files() {
                submission.add_base_file(&file.path, &file.name)?;
            }
            for file in config.current_files() {
                submission.add_file(&file.path, &file.name)?;
            }
            for file in config.historical_files() {
                submission.add_old_student_file(&file.path, &file.name)?;
            }
            submission.send(service).await?;
            submission
        }
    };

    if !config.track_current_students() {
        submission.deactivate_current_students();
    }
    submission.report_target()
}

pub fn configured_partners<C: ConfigProvider>(config: &C) -> Result<Vec<PartnerPair>> {
    match config.partners_file() {
        Some(path) => load_partners(config.partner_format(), Path::new(path), config.assignment()),
        None => Ok(Vec::new()),
    }
}
