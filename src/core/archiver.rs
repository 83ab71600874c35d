//! Writes the filtered report (and optionally its match pages) to disk.

use crate::config::cli::LocalStorage;
use crate::core::filter::{assemble_entries, match_resource_path, match_resource_url, LinkStyle};
use crate::domain::model::{FilteredReport, PartnerPair, TemplateContext};
use crate::domain::ports::{DetectionService, ReportRenderer, Storage};
use crate::utils::error::{MossError, Result};
use crate::utils::validation::validate_output_dir;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{FileOptions, ZipWriter};

/// Full page, the two side-by-side panels, and the top index fragment.
pub const RESOURCE_VARIANTS: [&str; 4] = ["", "-0", "-1", "-top"];

pub const REPORT_FILE: &str = "report.html";

#[derive(Debug, Clone)]
pub struct ArchiveRequest<'a> {
    pub output_root: &'a Path,
    pub report_url: &'a str,
    pub download_resources: bool,
    pub compress: bool,
    pub concurrent_requests: usize,
}

pub struct ReportArchiver<'a, D: ?Sized, R: ?Sized> {
    service: &'a D,
    renderer: &'a R,
}

impl<'a, D, R> ReportArchiver<'a, D, R>
where
    D: DetectionService + ?Sized,
    R: ReportRenderer + ?Sized,
{
    pub fn new(service: &'a D, renderer: &'a R) -> Self {
        Self { service, renderer }
    }

    /// Returns the path of `report.html`, or of the zip file when compressing.
    pub async fn write(
        &self,
        request: &ArchiveRequest<'_>,
        report: &FilteredReport,
        partners: &[PartnerPair],
    ) -> Result<PathBuf> {
        validate_output_dir("output_path", request.output_root)?;

        let directory = create_report_dir(request.output_root)?;
        let storage = LocalStorage::new(&directory);
        tracing::info!("📁 Writing report into {}", directory.display());

        let mut written = Vec::new();
        if request.download_resources {
            written.extend(self.save_resources(request, report, &storage).await?);
        }

        let links = if request.download_resources {
            LinkStyle::Archived
        } else {
            LinkStyle::Remote {
                report_url: request.report_url,
            }
        };
        let context = TemplateContext {
            date: report.metadata.date.clone(),
            options: report.metadata.options.clone(),
            result_id: report.result_id.clone(),
            entries: assemble_entries(&report.groups, partners, links),
            original_count: report.stats.original_count,
            retained_count: report.stats.retained_count,
            filtered_count: report.stats.filtered_count,
        };
        let rendered = self.renderer.render(&context)?;
        storage.write_file(REPORT_FILE, rendered.as_bytes()).await?;
        written.push(REPORT_FILE.to_string());

        if !request.compress {
            return Ok(directory.join(REPORT_FILE));
        }

        let zip_path = compress_report(&directory, &storage, &written).await?;
        std::fs::remove_dir_all(&directory).map_err(|e| MossError::filesystem(&directory, e))?;
        tracing::info!("🗜️ Compressed report to {}", zip_path.display());
        Ok(zip_path)
    }

    async fn save_resources(
        &self,
        request: &ArchiveRequest<'_>,
        report: &FilteredReport,
        storage: &LocalStorage,
    ) -> Result<Vec<String>> {
        // (group, match number, index into RESOURCE_VARIANTS)
        let jobs: Vec<(usize, u32, usize)> = report
            .groups
            .iter()
            .enumerate()
            .flat_map(|(group, g)| {
                g.matches.iter().flat_map(move |m| {
                    (0..RESOURCE_VARIANTS.len()).map(move |variant| (group, m.match_number, variant))
                })
            })
            .collect();
        tracing::info!("⬇️ Downloading {} match resources", jobs.len());

        let report_url = request.report_url;
        let mut downloads = stream::iter(jobs)
            .map(|(group, match_number, variant_index)| async move {
                let variant = RESOURCE_VARIANTS[variant_index];
                let url = match_resource_url(report_url, match_number, variant);
                tracing::debug!("Fetching {}", url);
                let body = self.service.fetch(&url).await?;
                let body = if variant == "-top" {
                    rewrite_self_links(&body, report_url)
                } else {
                    body
                };
                Ok::<_, MossError>((match_resource_path(group, match_number, variant), body))
            })
            .buffer_unordered(request.concurrent_requests.max(1));

        let mut written = Vec::new();
        while let Some(download) = downloads.next().await {
            let (path, body) = download?;
            storage.write_file(&path, body.as_bytes()).await?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Makes absolute links under the report location relative to the archive.
pub fn rewrite_self_links(content: &str, report_url: &str) -> String {
    let prefix = format!("{}/", report_url.trim_end_matches('/'));
    content.replace(&prefix, "")
}

pub fn report_dir_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "moss_report__{}_{:06}",
        now.timestamp(),
        now.timestamp_subsec_micros()
    )
}

fn create_report_dir(root: &Path) -> Result<PathBuf> {
    let directory = root.join(report_dir_name(chrono::Utc::now()));
    std::fs::create_dir(&directory).map_err(|e| MossError::filesystem(&directory, e))?;
    Ok(directory)
}

async fn compress_report(
    directory: &Path,
    storage: &LocalStorage,
    files: &[String],
) -> Result<PathBuf> {
    let zip_path = directory.with_extension("zip");

    let zip_data = {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for name in files {
            let data = storage.read_file(name).await?;
            zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
            zip.write_all(&data)?;
        }
        let cursor = zip.finish()?;
        cursor.into_inner()
    };

    tracing::debug!("Writing ZIP file ({} bytes)", zip_data.len());
    std::fs::write(&zip_path, zip_data).map_err(|e| MossError::filesystem(&zip_path, e))?;
    Ok(zip_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::JsonRenderer;
    use crate::domain::model::{Match, MatchGroup, ReportStats, SubmissionPayload};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const REPORT_URL: &str = "http://moss/results/5/7";

    struct EchoService;

    #[async_trait]
    impl DetectionService for EchoService {
        async fn submit(&self, _payload: &SubmissionPayload) -> Result<String> {
            Ok(REPORT_URL.to_string())
        }

        async fn fetch(&self, url: &str) -> Result<String> {
            Ok(format!("<a href=\"{}\">self</a>", url))
        }
    }

    fn report() -> FilteredReport {
        let m = Match {
            position: 0,
            match_number: 3,
            result_url: format!("{}/match3.html", REPORT_URL),
            student1: "a".to_string(),
            percent1: 90,
            student2: "b".to_string(),
            percent2: 80,
            lines: 12,
        };
        FilteredReport {
            result_id: "7".to_string(),
            groups: vec![MatchGroup { matches: vec![m] }],
            stats: ReportStats::new(1, 1),
            ..FilteredReport::default()
        }
    }

    fn assert_send<T: Send>(value: T) -> T {
        value
    }

    #[tokio::test]
    async fn test_archive_write_is_send_and_saves_every_variant() {
        let out = TempDir::new().unwrap();
        let report = report();
        let request = ArchiveRequest {
            output_root: out.path(),
            report_url: REPORT_URL,
            download_resources: true,
            compress: false,
            concurrent_requests: 3,
        };
        let archiver = ReportArchiver::new(&EchoService, &JsonRenderer);

        let path = assert_send(archiver.write(&request, &report, &[])).await.unwrap();

        let directory = path.parent().unwrap();
        for variant in RESOURCE_VARIANTS {
            assert!(directory.join(format!("group0/match3{}.html", variant)).is_file());
        }
        let top = std::fs::read_to_string(directory.join("group0/match3-top.html")).unwrap();
        assert_eq!(top, r#"<a href="match3-top.html">self</a>"#);
    }

    #[test]
    fn test_rewrite_self_links() {
        let top = r#"<a href="http://moss/results/5/7/match0-0.html#0" target="0">x</a>"#;
        assert_eq!(
            rewrite_self_links(top, "http://moss/results/5/7"),
            r#"<a href="match0-0.html#0" target="0">x</a>"#
        );
        assert_eq!(
            rewrite_self_links(top, "http://moss/results/5/7/"),
            r#"<a href="match0-0.html#0" target="0">x</a>"#
        );
    }

    #[test]
    fn test_report_dir_name() {
        let now = chrono::Utc.timestamp_opt(1_700_000_000, 42_000).unwrap();
        assert_eq!(report_dir_name(now), "moss_report__1700000000_000042");
    }
}
