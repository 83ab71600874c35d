//! Submission state machine: files are collected while `Open`, then the
//! submission is sent exactly once.

use crate::domain::model::{FileCategory, MossOptions, SubmissionPayload, SubmittedFile};
use crate::domain::ports::DetectionService;
use crate::utils::error::{MossError, Result};
use crate::utils::validation::{validate_existing_file, validate_language, validate_url};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ROSTER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(?P<id>[A-Za-z0-9]+)[@_]?uci\.edu").expect("valid roster id pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Open,
    /// Terminal. `report_url` is `None` when the send attempt failed.
    Sent { report_url: Option<String> },
}

/// Where to fetch the report from and whose networks matter.
#[derive(Debug, Clone)]
pub struct ReportTarget {
    pub report_url: String,
    pub current_students: Option<HashSet<String>>,
}

#[derive(Debug, Clone)]
pub struct Submission {
    account: String,
    language: String,
    options: MossOptions,
    files: Vec<SubmittedFile>,
    current_students: HashSet<String>,
    track_current: bool,
    state: SubmissionState,
}

impl Submission {
    pub fn new(account: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let account = account.into();
        let language = language.into();
        if account.trim().is_empty() {
            return Err(MossError::MissingConfigError {
                field: "account".to_string(),
            });
        }
        validate_language("language", &language)?;

        Ok(Self {
            account,
            language,
            options: MossOptions::default(),
            files: Vec::new(),
            current_students: HashSet::new(),
            track_current: true,
            state: SubmissionState::Open,
        })
    }

    /// Rebuilds an already sent submission from a known report location.
    pub fn resume(
        account: impl Into<String>,
        language: impl Into<String>,
        report_url: impl Into<String>,
        current_students: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let report_url = report_url.into();
        validate_url("report_url", &report_url)?;

        let mut submission = Self::new(account, language)?;
        submission.current_students.extend(current_students);
        submission.state = SubmissionState::Sent {
            report_url: Some(report_url),
        };
        Ok(submission)
    }

    pub fn with_options(mut self, options: MossOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_sent(&self) -> bool {
        matches!(self.state, SubmissionState::Sent { .. })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn files(&self) -> &[SubmittedFile] {
        &self.files
    }

    pub fn current_students(&self) -> &HashSet<String> {
        &self.current_students
    }

    pub fn deactivate_current_students(&mut self) {
        self.track_current = false;
    }

    pub fn activate_current_students(&mut self) {
        self.track_current = true;
    }

    fn ensure_open(&self, action: &str) -> Result<()> {
        if self.is_sent() {
            return Err(MossError::locked(action));
        }
        Ok(())
    }

    pub fn set_language(&mut self, language: &str) -> Result<()> {
        self.ensure_open("change the language")?;
        validate_language("language", language)?;
        self.language = language.to_string();
        Ok(())
    }

    pub fn add_base_file(&mut self, path: impl AsRef<Path>, display_name: &str) -> Result<()> {
        self.ensure_open("add a base file")?;
        self.push_file(path.as_ref(), display_name, FileCategory::Base)?;
        Ok(())
    }

    /// Adds a current-quarter file and records its student identity.
    pub fn add_file(&mut self, path: impl AsRef<Path>, display_name: &str) -> Result<()> {
        self.ensure_open("add a file")?;
        let path = path.as_ref();
        let wire_name = self.push_file(path, display_name, FileCategory::Current)?;

        let identity = if display_name.trim().is_empty() {
            derive_identity(path)
        } else {
            wire_name
        };
        tracing::debug!("Tracking current-quarter student: {}", identity);
        self.current_students.insert(identity);
        Ok(())
    }

    pub fn add_old_student_file(&mut self, path: impl AsRef<Path>, display_name: &str) -> Result<()> {
        self.ensure_open("add a historical file")?;
        self.push_file(path.as_ref(), display_name, FileCategory::Historical)?;
        Ok(())
    }

    /// Returns the name the service will show for the file.
    fn push_file(&mut self, path: &Path, display_name: &str, category: FileCategory) -> Result<String> {
        validate_existing_file("file_path", path)?;

        // 顯示名稱中的空白會破壞協定欄位
        let display_name = if display_name.trim().is_empty() {
            default_display_name(path)
        } else {
            display_name.trim().replace(' ', "_")
        };
        tracing::debug!("Adding {:?} file: {}", category, display_name);

        self.files.push(SubmittedFile {
            path: PathBuf::from(path),
            display_name: display_name.clone(),
            category,
        });
        Ok(display_name)
    }

    fn payload(&self) -> SubmissionPayload {
        let (base_files, files): (Vec<_>, Vec<_>) = self
            .files
            .iter()
            .cloned()
            .partition(|f| f.category == FileCategory::Base);

        SubmissionPayload {
            account: self.account.clone(),
            language: self.language.clone(),
            options: self.options.clone(),
            base_files,
            files,
        }
    }

    /// Sends the submission. The lock is taken before contacting the
    /// service, so a failed attempt cannot be retried on this instance.
    pub async fn send<D: DetectionService + ?Sized>(&mut self, service: &D) -> Result<String> {
        self.ensure_open("send again")?;
        self.state = SubmissionState::Sent { report_url: None };

        tracing::info!(
            "📤 Sending submission ({} files, language {})",
            self.files.len(),
            self.language
        );
        let report_url = service.submit(&self.payload()).await?;
        let report_url = report_url.trim().to_string();
        if report_url.is_empty() {
            return Err(MossError::connection(
                "the detection service returned an empty report location",
            ));
        }
        validate_url("report_url", &report_url)
            .map_err(|e| MossError::connection(format!("invalid report location: {}", e)))?;

        tracing::info!("📨 Report available at {}", report_url);
        self.state = SubmissionState::Sent {
            report_url: Some(report_url.clone()),
        };
        Ok(report_url)
    }

    pub fn report_url(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Sent {
                report_url: Some(url),
            } => Some(url),
            _ => None,
        }
    }

    pub fn report_target(&self) -> Result<ReportTarget> {
        let report_url = self
            .report_url()
            .ok_or_else(|| MossError::connection("nothing sent; nothing to download"))?;

        Ok(ReportTarget {
            report_url: report_url.to_string(),
            current_students: self.track_current.then(|| self.current_students.clone()),
        })
    }
}

/// The name the service shows for a file submitted without a display name.
fn default_display_name(path: &Path) -> String {
    path.to_string_lossy().replace(' ', "_").replace('\\', "/")
}

fn derive_identity(path: &Path) -> String {
    let text = path.to_string_lossy();
    match ROSTER_ID_PATTERN.captures(&text) {
        Some(caps) => caps["id"].to_string(),
        None => default_display_name(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeService {
        location: String,
        calls: AtomicUsize,
    }

    impl FakeService {
        fn new(location: &str) -> Self {
            Self {
                location: location.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DetectionService for FakeService {
        async fn submit(&self, payload: &SubmissionPayload) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(payload.account, "12345");
            Ok(self.location.clone())
        }

        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "print('hi')\n").unwrap();
        path
    }

    #[test]
    fn test_account_is_required() {
        assert!(Submission::new("", "python").is_err());
        assert!(Submission::new("12345", "klingon").is_err());
    }

    #[test]
    fn test_add_file_tracks_display_name() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "a.py");
        let mut submission = Submission::new("12345", "python").unwrap();

        submission.add_file(&path, "jdoe").unwrap();
        submission.add_old_student_file(&path, "oldie").unwrap();
        submission.add_base_file(&path, "starter").unwrap();

        assert!(submission.current_students().contains("jdoe"));
        assert!(!submission.current_students().contains("oldie"));
        assert_eq!(submission.files().len(), 3);
    }

    #[test]
    fn test_blank_name_derives_identity_from_path() {
        let dir = TempDir::new().unwrap();
        let roster = touch(&dir, "hw1_jdoe@uci.edu_main.py");
        let plain = touch(&dir, "plain file.py");
        let mut submission = Submission::new("12345", "python").unwrap();

        submission.add_file(&roster, "").unwrap();
        submission.add_file(&plain, " ").unwrap();

        assert!(submission.current_students().contains("jdoe"));
        let expected = plain.to_string_lossy().replace(' ', "_");
        assert!(submission.current_students().contains(&expected));
    }

    #[test]
    fn test_display_name_with_spaces_matches_wire_name() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "a.py");
        let mut submission = Submission::new("12345", "python").unwrap();

        submission.add_file(&path, "Alice Smith").unwrap();

        assert_eq!(submission.files()[0].display_name, "Alice_Smith");
        assert!(submission.current_students().contains("Alice_Smith"));
        assert!(!submission.current_students().contains("Alice Smith"));
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let mut submission = Submission::new("12345", "python").unwrap();
        let err = submission.add_file("/does/not/exist.py", "x").unwrap_err();
        assert!(err.to_string().contains("/does/not/exist.py"));
    }

    #[tokio::test]
    async fn test_send_locks_submission() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "a.py");
        let service = FakeService::new("http://moss.stanford.edu/results/5/1\n");
        let mut submission = Submission::new("12345", "python").unwrap();
        submission.add_file(&path, "jdoe").unwrap();

        let url = submission.send(&service).await.unwrap();
        assert_eq!(url, "http://moss.stanford.edu/results/5/1");

        for result in [
            submission.add_file(&path, "x"),
            submission.add_base_file(&path, "x"),
            submission.add_old_student_file(&path, "x"),
            submission.set_language("java"),
        ] {
            assert!(matches!(result, Err(MossError::LockedSubmission { .. })));
        }

        let again = submission.send(&service).await;
        assert!(matches!(again, Err(MossError::LockedSubmission { .. })));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_location_is_connection_error_and_not_retryable() {
        let service = FakeService::new("  ");
        let mut submission = Submission::new("12345", "python").unwrap();

        let first = submission.send(&service).await;
        assert!(matches!(first, Err(MossError::Connection { .. })));
        assert!(submission.is_sent());
        assert!(matches!(
            submission.report_target(),
            Err(MossError::Connection { .. })
        ));

        let retry = submission.send(&service).await;
        assert!(matches!(retry, Err(MossError::LockedSubmission { .. })));
    }

    #[test]
    fn test_report_target_requires_send() {
        let submission = Submission::new("12345", "python").unwrap();
        let err = submission.report_target().unwrap_err();
        assert!(err.to_string().contains("nothing sent"));
    }

    #[test]
    fn test_deactivated_tracking_clears_current_set() {
        let mut submission = Submission::resume(
            "12345",
            "python",
            "http://moss.stanford.edu/results/5/1",
            vec!["a".to_string()],
        )
        .unwrap();

        let target = submission.report_target().unwrap();
        assert!(target.current_students.unwrap().contains("a"));

        submission.deactivate_current_students();
        assert!(submission.report_target().unwrap().current_students.is_none());
        submission.activate_current_students();
        assert!(submission.report_target().unwrap().current_students.is_some());
    }
}
