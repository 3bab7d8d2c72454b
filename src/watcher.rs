// Blocking wait for new screenshots in a directory.
//
// Each wait sets up a fresh non-recursive `notify` watch, reads events until
// an image file is created directly inside the directory, collects any other
// images already queued behind it, then tears the watch down again. Files
// created while nobody is waiting are not seen.

use crate::error::WatchError;
use notify::event::CreateKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

/// Extensions that make a new file worth uploading. Matching is exact-case.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// How long to keep collecting events once the first image has been seen.
/// Events the backend read in the same batch arrive well inside this window.
pub const BATCH_GRACE: Duration = Duration::from_millis(100);

/// Something that yields the next file to upload, blocking until one exists.
pub trait ImageSource {
    fn next_image(&mut self) -> Result<PathBuf, WatchError>;
}

/// An armed watch on one directory.
pub struct DirectoryWatcher {
    directory: PathBuf,
    /// Spellings of `directory` that event paths may use: as given,
    /// joined onto the working directory, and canonical.
    aliases: Vec<PathBuf>,
    watcher: RecommendedWatcher,
    events: mpsc::Receiver<notify::Result<Event>>,
}

impl DirectoryWatcher {
    /// Start watching `directory` for file creation.
    ///
    /// Events that happen after this returns are buffered until
    /// [`DirectoryWatcher::next_images`] is called.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, WatchError> {
        let directory = directory.as_ref().to_path_buf();
        if !directory.is_dir() {
            return Err(WatchError::Register {
                source: notify::Error::generic("not a directory").add_path(directory.clone()),
                path: directory,
            });
        }

        let (tx, events) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(tx, Config::default()).map_err(WatchError::Init)?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Register {
                path: directory.clone(),
                source,
            })?;

        log::debug!("Watching {}", directory.display());
        Ok(DirectoryWatcher {
            aliases: aliases(&directory),
            directory,
            watcher,
            events,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Block until a qualifying image appears, then return it together with
    /// every other image already queued, in creation order.
    ///
    /// The watch is released before returning, whatever the outcome. The
    /// returned list is never empty.
    pub fn next_images(mut self) -> Result<Vec<PathBuf>, WatchError> {
        let found = self.wait_for_images();
        if let Err(e) = self.watcher.unwatch(&self.directory) {
            log::debug!("Failed to unwatch {}: {}", self.directory.display(), e);
        }
        found
    }

    fn wait_for_images(&self) -> Result<Vec<PathBuf>, WatchError> {
        let mut found = Vec::new();
        while found.is_empty() {
            let event = self
                .events
                .recv()
                .map_err(|_| WatchError::Disconnected)?
                .map_err(WatchError::Read)?;
            self.collect(&event, &mut found);
        }

        loop {
            match self.events.recv_timeout(BATCH_GRACE) {
                Ok(Ok(event)) => self.collect(&event, &mut found),
                Ok(Err(e)) => {
                    log::warn!("Filesystem event error after {} image(s): {}", found.len(), e);
                    break;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(found)
    }

    fn collect(&self, event: &Event, found: &mut Vec<PathBuf>) {
        for path in self.qualifying_paths(event) {
            if !found.contains(&path) {
                found.push(path);
            }
        }
    }

    /// Paths in `event` that are new images directly inside the watched
    /// directory, joined onto the directory as it was given.
    fn qualifying_paths(&self, event: &Event) -> Vec<PathBuf> {
        let check_is_dir = match event.kind {
            EventKind::Create(CreateKind::File) => false,
            EventKind::Create(CreateKind::Folder) => return Vec::new(),
            EventKind::Create(_) => true,
            _ => return Vec::new(),
        };

        event
            .paths
            .iter()
            .filter_map(|path| {
                let name = path.file_name()?;
                if !self.is_watched_parent(path.parent()) {
                    log::debug!("Ignoring {} outside watched directory", path.display());
                    return None;
                }
                if !is_image_name(name) {
                    log::debug!("Ignoring non-image file {}", path.display());
                    return None;
                }
                if check_is_dir && path.is_dir() {
                    return None;
                }
                Some(self.directory.join(name))
            })
            .collect()
    }

    fn is_watched_parent(&self, parent: Option<&Path>) -> bool {
        parent.map_or(false, |parent| self.aliases.iter().any(|alias| alias == parent))
    }
}

fn aliases(directory: &Path) -> Vec<PathBuf> {
    let mut aliases = vec![directory.to_path_buf()];
    if directory.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            aliases.push(cwd.join(directory));
        }
    }
    if let Ok(canonical) = directory.canonicalize() {
        aliases.push(canonical);
    }
    aliases
}

/// Whether a file name ends in one of [`IMAGE_EXTENSIONS`], compared against
/// everything after the last dot.
pub fn is_image_name(name: &OsStr) -> bool {
    name.to_str()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// [`ImageSource`] that opens a new watch whenever it has nothing queued.
///
/// Images that arrived in the same batch as the one returned are handed out
/// by later calls before any new watch is armed.
pub struct DirectorySource {
    directory: PathBuf,
    armed: Option<DirectoryWatcher>,
    pending: VecDeque<PathBuf>,
}

impl DirectorySource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        DirectorySource {
            directory: directory.into(),
            armed: None,
            pending: VecDeque::new(),
        }
    }

    /// Start from a watch that is already open, so events produced between
    /// `open` and the first call are not missed.
    pub fn armed(watcher: DirectoryWatcher) -> Self {
        DirectorySource {
            directory: watcher.directory().to_path_buf(),
            armed: Some(watcher),
            pending: VecDeque::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl ImageSource for DirectorySource {
    fn next_image(&mut self) -> Result<PathBuf, WatchError> {
        if self.pending.is_empty() {
            let watcher = match self.armed.take() {
                Some(watcher) => watcher,
                None => DirectoryWatcher::open(&self.directory)?,
            };
            self.pending.extend(watcher.next_images()?);
        }
        self.pending.pop_front().ok_or(WatchError::Disconnected)
    }
}
