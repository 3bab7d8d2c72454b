// The watch → settle → upload → copy cycle.
//
// Each call to [`Pipeline::step`] performs exactly one stage and returns the
// next one. Upload and clipboard failures are logged and send the cycle back
// to [`Stage::Watching`]; only watcher errors escape.

use crate::clipboard::ClipboardSink;
use crate::error::WatchError;
use crate::upload::{ImageUploader, Transport};
use crate::watcher::ImageSource;
use indicatif::{ProgressBar, ProgressStyle};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Pause between noticing a file and reading it, so the program producing it
/// can finish writing.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Watching,
    Debouncing(PathBuf),
    Uploading(PathBuf),
    Publishing(String),
}

pub struct Pipeline<S, T, C> {
    source: S,
    uploader: ImageUploader<T>,
    clipboard: C,
    client_id: String,
    settle_delay: Duration,
}

impl<S, T, C> Pipeline<S, T, C>
where
    S: ImageSource,
    T: Transport,
    C: ClipboardSink,
{
    pub fn new(source: S, transport: T, clipboard: C, client_id: impl Into<String>) -> Self {
        Pipeline {
            source,
            uploader: ImageUploader::new(transport),
            clipboard,
            client_id: client_id.into(),
            settle_delay: SETTLE_DELAY,
        }
    }

    /// Run one stage and return the stage that follows it.
    pub fn step(&mut self, stage: Stage) -> Result<Stage, WatchError> {
        let next = match stage {
            Stage::Watching => {
                let path = self.source.next_image()?;
                println!("New file created: {}", path.display());
                Stage::Debouncing(path)
            }
            Stage::Debouncing(path) => {
                thread::sleep(self.settle_delay);
                Stage::Uploading(path)
            }
            Stage::Uploading(path) => match self.upload(&path) {
                Some(link) => {
                    println!("Uploaded: {}", link);
                    Stage::Publishing(link)
                }
                None => Stage::Watching,
            },
            Stage::Publishing(link) => {
                if let Err(e) = self.clipboard.write_text(&link) {
                    log::error!("Failed to copy the link to clipboard: {}", e);
                }
                Stage::Watching
            }
        };
        Ok(next)
    }

    /// Cycle forever. Returns only when the watcher fails.
    pub fn run(&mut self) -> Result<Infallible, WatchError> {
        let mut stage = Stage::Watching;
        loop {
            stage = self.step(stage)?;
        }
    }

    fn upload(&self, path: &Path) -> Option<String> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Uploading {}...", path.display()));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = self.uploader.upload(path, &self.client_id);
        spinner.finish_and_clear();

        match result {
            Ok(link) => Some(link),
            Err(e) => {
                log::error!("Failed to upload {}: {}", path.display(), e);
                None
            }
        }
    }

    #[cfg(test)]
    fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClipboardError, TransportError};
    use crate::upload::UploadRequest;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    struct QueuedSource(VecDeque<PathBuf>);

    impl ImageSource for QueuedSource {
        fn next_image(&mut self) -> Result<PathBuf, WatchError> {
            self.0.pop_front().ok_or(WatchError::Disconnected)
        }
    }

    struct StaticTransport {
        body: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl StaticTransport {
        fn replying(body: &'static str) -> Self {
            StaticTransport {
                body: Some(body),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            StaticTransport {
                body: None,
                calls: Cell::new(0),
            }
        }
    }

    impl Transport for StaticTransport {
        fn post_image(&self, _request: UploadRequest) -> Result<Vec<u8>, TransportError> {
            self.calls.set(self.calls.get() + 1);
            match self.body {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(TransportError::Timeout),
            }
        }
    }

    #[derive(Default)]
    struct RecordingClipboard {
        texts: RefCell<Vec<String>>,
        fail: bool,
    }

    impl ClipboardSink for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            self.texts.borrow_mut().push(text.to_string());
            if self.fail {
                Err(ClipboardError::Command("broken".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn image_in(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"img").unwrap();
        path
    }

    #[test]
    fn watching_moves_to_debouncing_with_path() {
        let path = PathBuf::from("/shots/a.png");
        let transport = StaticTransport::failing();
        let clipboard = RecordingClipboard::default();
        let mut pipeline = Pipeline::new(
            QueuedSource(VecDeque::from([path.clone()])),
            &transport,
            &clipboard,
            "cid",
        );

        assert_eq!(pipeline.step(Stage::Watching).unwrap(), Stage::Debouncing(path));
    }

    #[test]
    fn debouncing_waits_then_uploads() {
        let transport = StaticTransport::failing();
        let clipboard = RecordingClipboard::default();
        let mut pipeline = Pipeline::new(QueuedSource(VecDeque::new()), &transport, &clipboard, "cid")
            .with_settle_delay(Duration::from_millis(20));

        let started = std::time::Instant::now();
        let next = pipeline.step(Stage::Debouncing("/x.png".into())).unwrap();

        assert_eq!(next, Stage::Uploading("/x.png".into()));
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(transport.calls.get(), 0);
    }

    #[test]
    fn successful_upload_moves_to_publishing() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_in(&dir, "a.png");
        let transport = StaticTransport::replying(r#"{"data":{"link":"https://imgur.com/a"}}"#);
        let clipboard = RecordingClipboard::default();
        let mut pipeline = Pipeline::new(QueuedSource(VecDeque::new()), &transport, &clipboard, "cid");

        let next = pipeline.step(Stage::Uploading(path)).unwrap();

        assert_eq!(next, Stage::Publishing("https://imgur.com/a".to_string()));
    }

    #[test]
    fn failed_upload_returns_to_watching() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_in(&dir, "a.png");
        let transport = StaticTransport::failing();
        let clipboard = RecordingClipboard::default();
        let mut pipeline = Pipeline::new(QueuedSource(VecDeque::new()), &transport, &clipboard, "cid");

        assert_eq!(pipeline.step(Stage::Uploading(path)).unwrap(), Stage::Watching);
        assert_eq!(transport.calls.get(), 1);
        assert!(clipboard.texts.borrow().is_empty());
    }

    #[test]
    fn vanished_file_returns_to_watching_without_network() {
        let transport = StaticTransport::replying(r#"{"data":{"link":"x"}}"#);
        let clipboard = RecordingClipboard::default();
        let mut pipeline = Pipeline::new(QueuedSource(VecDeque::new()), &transport, &clipboard, "cid");

        let next = pipeline.step(Stage::Uploading("/definitely/not/here.png".into())).unwrap();

        assert_eq!(next, Stage::Watching);
        assert_eq!(transport.calls.get(), 0);
    }

    #[test]
    fn clipboard_failure_still_returns_to_watching() {
        let transport = StaticTransport::failing();
        let clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(QueuedSource(VecDeque::new()), &transport, &clipboard, "cid");

        let next = pipeline.step(Stage::Publishing("https://imgur.com/a".into())).unwrap();

        assert_eq!(next, Stage::Watching);
        assert_eq!(*clipboard.texts.borrow(), ["https://imgur.com/a"]);
    }

    #[test]
    fn run_cycles_until_the_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let first = image_in(&dir, "one.png");
        let second = image_in(&dir, "two.jpg");
        let transport = StaticTransport::replying(r#"{"data":{"link":"https://imgur.com/same"}}"#);
        let clipboard = RecordingClipboard::default();
        let mut pipeline = Pipeline::new(
            QueuedSource(VecDeque::from([first, second])),
            &transport,
            &clipboard,
            "cid",
        )
        .with_settle_delay(Duration::ZERO);

        let err = pipeline.run().unwrap_err();

        assert!(matches!(err, WatchError::Disconnected));
        assert_eq!(transport.calls.get(), 2);
        assert_eq!(clipboard.texts.borrow().len(), 2);
    }
}
