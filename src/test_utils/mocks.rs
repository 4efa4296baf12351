//! Capability traits and hand-written mocks shared by the unit tests

use std::collections::HashMap;
use std::io::Error;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::capability;

pub trait FileSystem: Send + Sync {
    fn read_file(&self, path: &Path) -> Result<String, Error>;
    fn write_file(&self, path: &Path, content: &str) -> Result<(), Error>;
    fn exists(&self, path: &Path) -> bool;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

pub trait AuditTrail: Send + Sync {
    fn entries(&self) -> Vec<String>;
}

capability!(
    dyn FileSystem => MockFileSystem,
    dyn Clock => MockClock,
    dyn Logger => MockLogger,
    dyn AuditTrail => MockLogger,
);

/// In-memory file system
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: Mutex<HashMap<String, String>>,
}

impl MockFileSystem {
    pub fn with_file(path: &str, content: &str) -> Self {
        let fs = Self::default();
        fs.add_file(path, content);
        fs
    }

    pub fn add_file(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

impl FileSystem for MockFileSystem {
    fn read_file(&self, path: &Path) -> Result<String, Error> {
        let files = self.files.lock().unwrap();
        files
            .get(path.to_string_lossy().as_ref())
            .cloned()
            .ok_or_else(|| Error::new(std::io::ErrorKind::NotFound, "File not found"))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<(), Error> {
        self.add_file(&path.to_string_lossy(), content);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap()
            .contains_key(path.to_string_lossy().as_ref())
    }
}

/// Clock that returns whatever it was last set to
#[derive(Debug, Default)]
pub struct MockClock {
    now: AtomicU64,
    reads: AtomicUsize,
}

impl MockClock {
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Clock for MockClock {
    fn now(&self) -> u64 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.now.load(Ordering::SeqCst)
    }
}

/// Logger that keeps every message; also serves as an audit trail
#[derive(Debug, Default)]
pub struct MockLogger {
    messages: Mutex<Vec<String>>,
}

impl MockLogger {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Logger for MockLogger {
    fn log(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

impl AuditTrail for MockLogger {
    fn entries(&self) -> Vec<String> {
        self.messages()
    }
}
