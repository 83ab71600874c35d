use crate::adapters::moss_client::{DEFAULT_PORT, DEFAULT_SERVER};
use crate::adapters::partners::PartnerFormat;
use crate::config::validate_provider;
use crate::core::render::RendererKind;
use crate::core::ConfigProvider;
use crate::domain::model::{FileSpec, MossOptions};
use crate::utils::error::{MossError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub moss: MossSection,
    #[serde(default)]
    pub files: FilesSection,
    #[serde(default)]
    pub report: ReportSection,
    pub partners: Option<PartnersSection>,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MossSection {
    pub account: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub server: Option<String>,
    pub port: Option<u16>,
    pub max_matches: Option<u32>,
    pub show: Option<u32>,
    pub comment: Option<String>,
    #[serde(default)]
    pub directory_mode: bool,
    #[serde(default)]
    pub experimental: bool,
    /// 已產生的報告，設定後略過上傳
    pub report_url: Option<String>,
    #[serde(default)]
    pub current_students: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesSection {
    #[serde(default)]
    pub base: Vec<FileSpec>,
    #[serde(default)]
    pub current: Vec<FileSpec>,
    #[serde(default)]
    pub historical: Vec<FileSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default)]
    pub archive: bool,
    #[serde(default)]
    pub zip: bool,
    #[serde(default = "default_true")]
    pub filter: bool,
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    #[serde(default = "default_true")]
    pub track_current: bool,
    pub concurrent_requests: Option<usize>,
    #[serde(default)]
    pub renderer: RendererKind,
    pub request_timeout_seconds: Option<u64>,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            archive: false,
            zip: false,
            filter: true,
            threshold: default_threshold(),
            track_current: true,
            concurrent_requests: None,
            renderer: RendererKind::default(),
            request_timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnersSection {
    pub file: String,
    #[serde(default)]
    pub format: PartnerFormat,
    #[serde(default = "default_assignment")]
    pub assignment: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub monitor: bool,
}

fn default_language() -> String {
    "python".to_string()
}

fn default_output_path() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> i32 {
    -1
}

fn default_assignment() -> usize {
    1
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| MossError::filesystem(path, e))?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| MossError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MOSS_ACCOUNT})，未定義者保留原文
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn json_logging(&self) -> bool {
        self.logging.as_ref().is_some_and(|l| l.json)
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().is_some_and(|l| l.verbose)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.logging.as_ref().is_some_and(|l| l.monitor)
    }
}

impl ConfigProvider for TomlConfig {
    fn account(&self) -> &str {
        &self.moss.account
    }

    fn language(&self) -> &str {
        &self.moss.language
    }

    fn server(&self) -> &str {
        self.moss.server.as_deref().unwrap_or(DEFAULT_SERVER)
    }

    fn port(&self) -> u16 {
        self.moss.port.unwrap_or(DEFAULT_PORT)
    }

    fn moss_options(&self) -> MossOptions {
        let defaults = MossOptions::default();
        MossOptions {
            max_matches: self.moss.max_matches.unwrap_or(defaults.max_matches),
            directory_mode: self.moss.directory_mode,
            experimental: self.moss.experimental,
            show: self.moss.show.unwrap_or(defaults.show),
            comment: self.moss.comment.clone().unwrap_or(defaults.comment),
        }
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.report.request_timeout_seconds.map(Duration::from_secs)
    }

    fn base_files(&self) -> Vec<FileSpec> {
        self.files.base.clone()
    }

    fn current_files(&self) -> Vec<FileSpec> {
        self.files.current.clone()
    }

    fn historical_files(&self) -> Vec<FileSpec> {
        self.files.historical.clone()
    }

    fn report_url(&self) -> Option<&str> {
        self.moss.report_url.as_deref()
    }

    fn current_students(&self) -> &[String] {
        &self.moss.current_students
    }

    fn output_path(&self) -> &str {
        &self.report.output_path
    }

    fn archive(&self) -> bool {
        self.report.archive
    }

    fn zip_report(&self) -> bool {
        self.report.zip
    }

    fn filter_enabled(&self) -> bool {
        self.report.filter
    }

    fn threshold(&self) -> i32 {
        self.report.threshold
    }

    fn track_current_students(&self) -> bool {
        self.report.track_current
    }

    fn concurrent_requests(&self) -> usize {
        self.report.concurrent_requests.unwrap_or(5)
    }

    fn renderer(&self) -> RendererKind {
        self.report.renderer
    }

    fn partners_file(&self) -> Option<&str> {
        self.partners.as_ref().map(|p| p.file.as_str())
    }

    fn partner_format(&self) -> PartnerFormat {
        self.partners.as_ref().map(|p| p.format).unwrap_or_default()
    }

    fn assignment(&self) -> usize {
        self.partners.as_ref().map_or(1, |p| p.assignment)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
