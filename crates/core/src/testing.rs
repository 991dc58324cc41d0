//! Scripted provider shared by the unit tests.

use crate::error::{AppError, Result};
use crate::generation::{
    ContentRequest, GeneratedVideo, GenerationProvider, ResponsePart, VideoOperation, VideoRequest,
};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;

enum ContentScript {
    Parts(Vec<ResponsePart>),
    Fail,
    /// Fails the first `n` calls, then returns the parts.
    FailTimes(u32, Vec<ResponsePart>),
}

pub(crate) struct MockProvider {
    content: ContentScript,
    done_after: u32,
    video_uri: Option<String>,
    job_error: Option<String>,
    download_fails: bool,
    cancel_on_content: Mutex<Option<CancellationToken>>,
    pub content_calls: AtomicU32,
    pub submit_calls: AtomicU32,
    pub poll_calls: AtomicU32,
    pub download_calls: AtomicU32,
    content_requests: Mutex<Vec<ContentRequest>>,
    video_requests: Mutex<Vec<VideoRequest>>,
    downloads: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Returns image "IMG1" captioned "Great product!", and a video job that
    /// is done on submission with locator `http://video/1`.
    pub fn new() -> Self {
        Self {
            content: ContentScript::Parts(vec![
                ResponsePart::InlineData {
                    mime_type: "image/png".to_string(),
                    data: "IMG1".to_string(),
                },
                ResponsePart::Text("Great product!".to_string()),
            ]),
            done_after: 0,
            video_uri: Some("http://video/1".to_string()),
            job_error: None,
            download_fails: false,
            cancel_on_content: Mutex::new(None),
            content_calls: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            download_calls: AtomicU32::new(0),
            content_requests: Mutex::new(Vec::new()),
            video_requests: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_parts(mut self, parts: Vec<ResponsePart>) -> Self {
        self.content = ContentScript::Parts(parts);
        self
    }

    pub fn with_image(self, data: &str, caption: Option<&str>) -> Self {
        let mut parts = vec![ResponsePart::InlineData {
            mime_type: "image/png".to_string(),
            data: data.to_string(),
        }];
        if let Some(caption) = caption {
            parts.push(ResponsePart::Text(caption.to_string()));
        }
        self.with_parts(parts)
    }

    pub fn failing_image(mut self) -> Self {
        self.content = ContentScript::Fail;
        self
    }

    /// The first `times` image requests fail, later ones succeed.
    pub fn failing_image_times(mut self, times: u32) -> Self {
        let parts = match std::mem::replace(&mut self.content, ContentScript::Fail) {
            ContentScript::Parts(parts) | ContentScript::FailTimes(_, parts) => parts,
            ContentScript::Fail => Vec::new(),
        };
        self.content = ContentScript::FailTimes(times, parts);
        self
    }

    /// Cancels `token` while the next image request is in flight.
    pub fn cancel_during_content(&self, token: CancellationToken) {
        *self.cancel_on_content.lock().unwrap() = Some(token);
    }

    /// The job reports done on the `polls`-th status check.
    pub fn done_after(mut self, polls: u32) -> Self {
        self.done_after = polls;
        self
    }

    pub fn with_video_uri(mut self, uri: Option<&str>) -> Self {
        self.video_uri = uri.map(str::to_string);
        self
    }

    pub fn with_job_error(mut self, message: &str) -> Self {
        self.job_error = Some(message.to_string());
        self
    }

    pub fn failing_download(mut self) -> Self {
        self.download_fails = true;
        self
    }

    pub fn total_calls(&self) -> u32 {
        self.content_calls.load(Ordering::SeqCst)
            + self.submit_calls.load(Ordering::SeqCst)
            + self.poll_calls.load(Ordering::SeqCst)
            + self.download_calls.load(Ordering::SeqCst)
    }

    pub fn last_content_request(&self) -> Option<ContentRequest> {
        self.content_requests.lock().unwrap().last().cloned()
    }

    pub fn last_video_request(&self) -> Option<VideoRequest> {
        self.video_requests.lock().unwrap().last().cloned()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    fn operation(&self, polls: u32) -> VideoOperation {
        let done = polls >= self.done_after;
        VideoOperation {
            name: "operations/mock-1".to_string(),
            done,
            videos: match (&self.video_uri, done) {
                (Some(uri), true) => vec![GeneratedVideo {
                    uri: Some(uri.clone()),
                }],
                _ => Vec::new(),
            },
            error: if done { self.job_error.clone() } else { None },
        }
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn generate_content(&self, request: ContentRequest) -> Result<Vec<ResponsePart>> {
        let call = self.content_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.content_requests.lock().unwrap().push(request);
        if let Some(token) = self.cancel_on_content.lock().unwrap().take() {
            token.cancel();
        }
        match &self.content {
            ContentScript::Parts(parts) => Ok(parts.clone()),
            ContentScript::FailTimes(times, parts) if call > *times => Ok(parts.clone()),
            ContentScript::Fail | ContentScript::FailTimes(..) => {
                Err(AppError::generation("HTTP 503 from mock provider"))
            }
        }
    }

    async fn submit_video(&self, request: VideoRequest) -> Result<VideoOperation> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.video_requests.lock().unwrap().push(request);
        Ok(self.operation(0))
    }

    async fn get_video_operation(&self, _operation: &VideoOperation) -> Result<VideoOperation> {
        let polls = self.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self.operation(polls))
    }

    async fn download(&self, locator: &str) -> Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.downloads.lock().unwrap().push(locator.to_string());
        if self.download_fails {
            return Err(AppError::VideoDownload("404 Not Found".to_string()));
        }
        Ok(b"MP4DATA".to_vec())
    }
}
