// src/recipe/kitchen/archive.rs

//! Source fetching, checksum verification and archive extraction

use crate::error::{Error, Result};
use crate::hash::{verify_file, Hash};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry delay in milliseconds, multiplied by the attempt number
const RETRY_DELAY_MS: u64 = 1000;

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Something that can place the bytes behind a URL into a local file
pub trait SourceFetcher: Send + Sync {
    /// Fetch `url` into `dest`, replacing any existing file
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Fetcher for `http(s)://` and `file://` URLs
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_retries: u32, show_progress: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("glfw-recipe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: max_retries.max(1),
            show_progress,
        })
    }

    fn progress_bar(&self, total_size: u64, name: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = if total_size > 0 {
            let pb = ProgressBar::new(total_size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
                    .expect("Invalid progress bar template")
                    .progress_chars("#>-"),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {msg}")
                    .expect("Invalid spinner template"),
            );
            pb
        };
        pb.set_message(name.to_string());
        Some(pb)
    }

    fn fetch_http(&self, url: &str, dest: &Path) -> Result<()> {
        let name = url.rsplit('/').next().unwrap_or(url).to_string();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(response)
                    if response.status().is_server_error() && attempt < self.max_retries =>
                {
                    warn!(
                        "Download attempt {} got HTTP {}, retrying...",
                        attempt,
                        response.status()
                    );
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {} after {} attempt(s)",
                            response.status(),
                            url,
                            attempt
                        )));
                    }

                    let total_size = response.content_length().unwrap_or(0);
                    let progress = self.progress_bar(total_size, &name);
                    let mut file = File::create(dest).map_err(|e| {
                        Error::IoError(format!("Failed to create file {}: {e}", dest.display()))
                    })?;

                    let downloaded = stream_to_file(response, &mut file, progress.as_ref())?;
                    if let Some(pb) = progress {
                        pb.finish_with_message(format!("{} [done]", name));
                    }
                    debug!("Downloaded {} bytes from {}", downloaded, url);
                    return Ok(());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "Failed to download {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Download attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::DownloadError(format!("Invalid URL {}: {}", url, e)))?;

        match parsed.scheme() {
            "http" | "https" => self.fetch_http(url, dest),
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| Error::DownloadError(format!("Invalid file URL: {}", url)))?;
                fs::copy(&path, dest).map_err(|e| {
                    Error::DownloadError(format!("Failed to copy {}: {}", path.display(), e))
                })?;
                Ok(())
            }
            other => Err(Error::DownloadError(format!(
                "Unsupported URL scheme '{}' in {}",
                other, url
            ))),
        }
    }
}

fn stream_to_file<R: Read>(
    mut reader: R,
    file: &mut File,
    progress: Option<&ProgressBar>,
) -> Result<u64> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| Error::DownloadError(format!("Failed to read response: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .map_err(|e| Error::IoError(format!("Failed to write data: {e}")))?;
        downloaded += n as u64;
        if let Some(pb) = progress {
            pb.set_position(downloaded);
        }
    }

    Ok(downloaded)
}

/// Check a file against a prefixed checksum
///
/// `Ok(false)` means the file was readable but its digest differs.
pub fn verify_file_checksum(path: &Path, expected: &Hash) -> Result<bool> {
    match verify_file(path, expected)? {
        Ok(()) => Ok(true),
        Err(mismatch) => {
            debug!("{}", mismatch);
            Ok(false)
        }
    }
}

/// Extract a `.tar.gz`, `.tgz` or `.tar` archive into `dest`
///
/// Entries that would land outside `dest` are skipped.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let filename = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let file = File::open(archive)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {}", archive.display(), e)))?;

    let reader: Box<dyn Read> = if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
        Box::new(GzDecoder::new(file))
    } else if filename.ends_with(".tar") {
        Box::new(file)
    } else {
        return Err(Error::ParseError(format!(
            "Unknown archive format: {}",
            filename
        )));
    };

    fs::create_dir_all(dest)?;
    unpack_tar(reader, dest)
        .map_err(|e| Error::IoError(format!("Failed to extract {}: {}", archive.display(), e)))?;

    info!("Extracted {} to {}", filename, dest.display());
    Ok(())
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.unpack_in(dest)? {
            warn!(
                "Skipped archive entry outside destination: {}",
                entry.path()?.display()
            );
        }
    }
    Ok(())
}
