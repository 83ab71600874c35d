//! MOSS socket protocol for submissions, HTTP for report retrieval.

use crate::domain::model::{SubmissionPayload, SubmittedFile};
use crate::domain::ports::DetectionService;
use crate::utils::error::{MossError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

pub const DEFAULT_SERVER: &str = "moss.stanford.edu";
pub const DEFAULT_PORT: u16 = 7690;

#[derive(Debug, Clone)]
pub struct MossClient {
    server: String,
    port: u16,
    client: Client,
}

impl MossClient {
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            client: Client::new(),
        }
    }

    pub fn with_timeout(server: impl Into<String>, port: u16, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            server: server.into(),
            port,
            client: builder.build()?,
        })
    }

    fn socket_error(&self, e: std::io::Error) -> MossError {
        MossError::connection(format!("{}:{}: {}", self.server, self.port, e))
    }
}

async fn upload<W>(writer: &mut W, file: &SubmittedFile, file_id: usize, language: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let content = tokio::fs::read(&file.path)
        .await
        .map_err(|e| MossError::filesystem(&file.path, e))?;
    let header = format!(
        "file {} {} {} {}\n",
        file_id,
        language,
        content.len(),
        file.display_name
    );

    tracing::debug!("Uploading {} as {}", file.path.display(), file.display_name);
    let interrupted = |e: std::io::Error| {
        MossError::connection(format!("upload of {} interrupted: {}", file.path.display(), e))
    };
    writer.write_all(header.as_bytes()).await.map_err(interrupted)?;
    writer.write_all(&content).await.map_err(interrupted)?;
    Ok(())
}

#[async_trait]
impl DetectionService for MossClient {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<String> {
        tracing::debug!("Connecting to {}:{}", self.server, self.port);
        let mut stream = TcpStream::connect((self.server.as_str(), self.port))
            .await
            .map_err(|e| self.socket_error(e))?;
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);

        let options = &payload.options;
        let header = format!(
            "moss {}\ndirectory {}\nX {}\nmaxmatches {}\nshow {}\nlanguage {}\n",
            payload.account,
            u8::from(options.directory_mode),
            u8::from(options.experimental),
            options.max_matches,
            options.show,
            payload.language
        );
        writer
            .write_all(header.as_bytes())
            .await
            .map_err(|e| self.socket_error(e))?;

        let mut answer = String::new();
        reader
            .read_line(&mut answer)
            .await
            .map_err(|e| self.socket_error(e))?;
        if answer.trim() != "yes" {
            if let Err(e) = writer.write_all(b"end\n").await {
                tracing::debug!("Could not close session after rejection: {}", e);
            }
            return Err(MossError::connection(format!(
                "language '{}' not accepted by server (reply: {:?})",
                payload.language,
                answer.trim()
            )));
        }

        for file in &payload.base_files {
            upload(&mut writer, file, 0, &payload.language).await?;
        }
        for (index, file) in payload.files.iter().enumerate() {
            upload(&mut writer, file, index + 1, &payload.language).await?;
        }

        writer
            .write_all(format!("query 0 {}\n", options.comment).as_bytes())
            .await
            .map_err(|e| self.socket_error(e))?;
        tracing::info!("⏳ Waiting for the server to process the submission");

        let mut location = String::new();
        reader
            .read_line(&mut location)
            .await
            .map_err(|e| self.socket_error(e))?;
        if let Err(e) = writer.write_all(b"end\n").await {
            tracing::debug!("Could not close session: {}", e);
        }

        Ok(location.trim().to_string())
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            MossError::connection(format!("cannot reach {}: {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MossError::connection(format!("{} returned {}", url, status)));
        }
        Ok(response.text().await?)
    }
}
