use crate::config::ClientConfig;
use crate::error::ValidationError;
use crate::file_types;
use crate::models::{FileId, UploadStatus, UploadedFile};
use crate::transport::{Transport, TransportError, UploadPayload, UploadResponse};
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Stored as the failure reason of every file whose upload did not succeed.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

/// Shown above the file list while any file is in the error state.
pub const BATCH_WARNING: &str =
    "Some files could not be uploaded. Remove them or select them again to retry.";

/// A file picked by the user, before it enters the session.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, taking its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        let mime_type = file_types::mime_from_name(&name).to_string();
        Ok(Self::new(name, mime_type, bytes))
    }
}

#[derive(Debug, Default)]
pub struct SelectionReport {
    pub accepted: Vec<FileId>,
    pub rejected: Vec<ValidationError>,
}

/// Read-only view of the upload set handed to the presentation layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadState {
    /// In selection order.
    pub files: Vec<UploadedFile>,
    /// True while an `upload_all` batch is running.
    pub in_progress: bool,
}

impl UploadState {
    pub fn file(&self, id: &FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|f| &f.id == id)
    }

    /// Files the backend has accepted and that can be queried.
    pub fn successful(&self) -> Vec<UploadedFile> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, UploadStatus::Success { .. }))
            .cloned()
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == UploadStatus::Pending)
            .count()
    }

    pub fn uploading_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == UploadStatus::Uploading)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.files
            .iter()
            .any(|f| matches!(f.status, UploadStatus::Error { .. }))
    }

    pub fn batch_warning(&self) -> Option<&'static str> {
        self.has_errors().then_some(BATCH_WARNING)
    }
}

/// Marks a running batch. Dropping it, whether the batch finished or the
/// caller gave up on the future, clears the running flag and fails any file
/// still left `Uploading`.
struct Batch<'a> {
    state: &'a watch::Sender<UploadState>,
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.in_progress = false;
            for file in s.files.iter_mut() {
                if file.status == UploadStatus::Uploading {
                    tracing::warn!("Upload of file {} abandoned", file.id);
                    file.advance(UploadStatus::Error {
                        reason: UPLOAD_FAILED_MESSAGE.to_string(),
                    });
                }
            }
        });
    }
}

/// Owns the selected files and submits them to the backend one at a time.
pub struct UploadSession {
    transport: Arc<dyn Transport>,
    upload_delay: Duration,
    state: watch::Sender<UploadState>,
    payloads: Mutex<HashMap<FileId, UploadPayload>>,
}

impl UploadSession {
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            upload_delay: config.upload_delay,
            state: watch::Sender::new(UploadState::default()),
            payloads: Mutex::new(HashMap::new()),
        }
    }

    pub fn snapshot(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    /// Add every accepted file as `Pending`. Rejected files are reported back
    /// and never enter the set.
    pub fn select_files(&self, files: Vec<SelectedFile>) -> SelectionReport {
        let mut report = SelectionReport::default();
        let mut added = Vec::new();

        for file in files {
            let mime_type = match file_types::check_accepted(&file.name, &file.mime_type) {
                Ok(mime) => mime.to_string(),
                Err(e) => {
                    tracing::debug!("Rejected selection: {}", e);
                    report.rejected.push(e);
                    continue;
                }
            };
            let record = UploadedFile::pending(file.name.clone(), file.bytes.len() as u64, mime_type.clone());
            report.accepted.push(record.id.clone());
            self.payloads().insert(
                record.id.clone(),
                UploadPayload {
                    filename: file.name,
                    mime_type,
                    bytes: file.bytes,
                },
            );
            added.push(record);
        }

        if !added.is_empty() {
            self.state.send_modify(|s| s.files.extend(added));
        }
        report
    }

    /// Upload every `Pending` file in selection order, one request at a time.
    /// Failures are recorded on the file and never stop the batch. Returns the
    /// files that are in `Success` once the batch is done.
    pub async fn upload_all(&self) -> Vec<UploadedFile> {
        let started = self.state.send_if_modified(|s| {
            if s.in_progress {
                false
            } else {
                s.in_progress = true;
                true
            }
        });
        if !started {
            tracing::debug!("Upload batch already running; ignoring request");
            return self.snapshot().successful();
        }
        let batch = Batch { state: &self.state };

        tracing::info!("Starting upload batch of {} file(s)", self.snapshot().pending_count());
        let mut first = true;
        loop {
            let next = self
                .state
                .borrow()
                .files
                .iter()
                .find(|f| f.status == UploadStatus::Pending)
                .map(|f| f.id.clone());
            let Some(id) = next else {
                break;
            };

            if !first && !self.upload_delay.is_zero() {
                tokio::time::sleep(self.upload_delay).await;
            }
            first = false;

            // the file may have been removed while we were waiting
            if !self.advance(&id, UploadStatus::Uploading) {
                continue;
            }
            let payload = self.payloads().get(&id).cloned();
            let Some(payload) = payload else {
                tracing::debug!("File {} was removed before its upload started", id);
                continue;
            };
            let result = self.transport.upload(payload).await;
            self.finish(&id, result);
        }

        drop(batch);
        let successful = self.snapshot().successful();
        tracing::info!("Upload batch finished: {} file(s) ready", successful.len());
        successful
    }

    /// Drop a file whatever its status. A request already in flight for it is
    /// not cancelled; its result is discarded when it arrives.
    pub fn remove_file(&self, id: &FileId) -> bool {
        let removed = self.state.send_if_modified(|s| {
            let before = s.files.len();
            s.files.retain(|f| &f.id != id);
            s.files.len() != before
        });
        self.payloads().remove(id);
        removed
    }

    pub fn clear_all(&self) {
        self.payloads().clear();
        self.state.send_modify(|s| s.files.clear());
    }

    fn finish(&self, id: &FileId, result: Result<UploadResponse, TransportError>) {
        let status = match result {
            Ok(resp) => UploadStatus::Success {
                message: resp.message,
                server_filename: resp.filename,
            },
            Err(e) => {
                tracing::warn!("Upload of file {} failed: {}", id, e);
                UploadStatus::Error {
                    reason: UPLOAD_FAILED_MESSAGE.to_string(),
                }
            }
        };
        if !self.advance(id, status) {
            tracing::debug!("Discarding upload result for removed file {}", id);
        }
        self.payloads().remove(id);
    }

    fn advance(&self, id: &FileId, next: UploadStatus) -> bool {
        self.state.send_if_modified(|s| {
            s.files
                .iter_mut()
                .find(|f| &f.id == id)
                .is_some_and(|f| f.advance(next))
        })
    }

    fn payloads(&self) -> std::sync::MutexGuard<'_, HashMap<FileId, UploadPayload>> {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
