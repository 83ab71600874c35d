pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_language, validate_non_empty_string, validate_output_dir, validate_path,
    validate_positive_number, validate_range, validate_url,
};
use std::path::Path;

#[cfg(feature = "cli")]
pub use self::cli_args::CliConfig;

/// 兩種配置來源共用的檢查
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_non_empty_string("account", config.account())?;
    validate_language("language", config.language())?;
    validate_non_empty_string("server", config.server())?;
    validate_output_dir("output_path", Path::new(config.output_path()))?;
    validate_range("threshold", config.threshold(), -1, 100)?;
    validate_positive_number("concurrent_requests", config.concurrent_requests(), 1)?;

    if let Some(url) = config.report_url() {
        validate_url("report_url", url)?;
    }
    if let Some(path) = config.partners_file() {
        validate_path("partners", path)?;
    }
    Ok(())
}

#[cfg(feature = "cli")]
mod cli_args {
    use super::validate_provider;
    use crate::adapters::moss_client::{DEFAULT_PORT, DEFAULT_SERVER};
    use crate::adapters::partners::PartnerFormat;
    use crate::core::render::RendererKind;
    use crate::core::ConfigProvider;
    use crate::domain::model::{FileSpec, MossOptions};
    use crate::utils::error::Result;
    use crate::utils::validation::Validate;
    use clap::Parser;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "moss-networks")]
    #[command(about = "Submit to MOSS and consolidate the report into collusion networks")]
    pub struct CliConfig {
        /// MOSS account id
        #[arg(long)]
        pub account: String,

        #[arg(long, default_value = "python")]
        pub language: String,

        #[arg(long, default_value = DEFAULT_SERVER)]
        pub server: String,

        #[arg(long, default_value_t = DEFAULT_PORT)]
        pub port: u16,

        /// Skeleton files, `path[=name]`
        #[arg(long, value_delimiter = ',')]
        pub base: Vec<String>,

        /// Current-quarter submissions, `path[=name]`
        #[arg(long, value_delimiter = ',')]
        pub current: Vec<String>,

        /// Submissions from earlier quarters, `path[=name]`
        #[arg(long, value_delimiter = ',')]
        pub historical: Vec<String>,

        /// Skip submission and process an existing report
        #[arg(long)]
        pub report_url: Option<String>,

        /// Current-quarter identities, used with --report-url
        #[arg(long, value_delimiter = ',')]
        pub current_students: Vec<String>,

        #[arg(long)]
        pub partners: Option<String>,

        #[arg(long, value_enum, default_value_t = PartnerFormat::Roster)]
        pub partner_format: PartnerFormat,

        /// Assignment column in a roster file (1-10)
        #[arg(long, default_value = "1")]
        pub assignment: usize,

        /// Minimum similarity percentage; -1 keeps every match
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        pub threshold: i32,

        #[arg(
            long,
            help = "Disable filtering and ranking: list every match in report order"
        )]
        pub no_filter: bool,

        #[arg(long, help = "Do not require a current-quarter student per network")]
        pub no_track_current: bool,

        #[arg(long, help = "Download per-match pages alongside the report")]
        pub archive: bool,

        #[arg(long, help = "Compress the archive into a zip file")]
        pub zip: bool,

        #[arg(long, default_value = ".")]
        pub output_path: String,

        #[arg(long, default_value = "5")]
        pub concurrent_requests: usize,

        #[arg(long, default_value = "10")]
        pub max_matches: u32,

        #[arg(long, default_value = "250")]
        pub show: u32,

        #[arg(long, default_value = "")]
        pub comment: String,

        #[arg(long, help = "Treat each directory as one submission")]
        pub directory_mode: bool,

        #[arg(long, help = "Use the experimental server")]
        pub experimental: bool,

        #[arg(long, value_enum, default_value_t = RendererKind::Html)]
        pub renderer: RendererKind,

        /// HTTP timeout in seconds
        #[arg(long)]
        pub request_timeout: Option<u64>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log CPU and memory usage per phase")]
        pub monitor: bool,
    }

    impl ConfigProvider for CliConfig {
        fn account(&self) -> &str {
            &self.account
        }

        fn language(&self) -> &str {
            &self.language
        }

        fn server(&self) -> &str {
            &self.server
        }

        fn port(&self) -> u16 {
            self.port
        }

        fn moss_options(&self) -> MossOptions {
            MossOptions {
                max_matches: self.max_matches,
                directory_mode: self.directory_mode,
                experimental: self.experimental,
                show: self.show,
                comment: self.comment.clone(),
            }
        }

        fn request_timeout(&self) -> Option<Duration> {
            self.request_timeout.map(Duration::from_secs)
        }

        fn base_files(&self) -> Vec<FileSpec> {
            self.base.iter().map(|s| FileSpec::parse(s)).collect()
        }

        fn current_files(&self) -> Vec<FileSpec> {
            self.current.iter().map(|s| FileSpec::parse(s)).collect()
        }

        fn historical_files(&self) -> Vec<FileSpec> {
            self.historical.iter().map(|s| FileSpec::parse(s)).collect()
        }

        fn report_url(&self) -> Option<&str> {
            self.report_url.as_deref()
        }

        fn current_students(&self) -> &[String] {
            &self.current_students
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn archive(&self) -> bool {
            self.archive
        }

        fn zip_report(&self) -> bool {
            self.zip
        }

        fn filter_enabled(&self) -> bool {
            !self.no_filter
        }

        fn threshold(&self) -> i32 {
            self.threshold
        }

        fn track_current_students(&self) -> bool {
            !self.no_track_current
        }

        fn concurrent_requests(&self) -> usize {
            self.concurrent_requests
        }

        fn renderer(&self) -> RendererKind {
            self.renderer
        }

        fn partners_file(&self) -> Option<&str> {
            self.partners.as_deref()
        }

        fn partner_format(&self) -> PartnerFormat {
            self.partner_format
        }

        fn assignment(&self) -> usize {
            self.assignment
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_provider(self)
        }
    }

}
