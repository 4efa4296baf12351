//! Types under test with assorted constructor shapes

use std::path::Path;
use std::sync::Arc;

use super::mocks::{AuditTrail, Clock, FileSystem, Logger};
use crate::{Constructible, Constructor};

/// `new(fs)`, `with_root(fs, root)` and a non-public `empty()`
pub struct ReportService {
    pub fs: Option<Arc<dyn FileSystem>>,
    pub root: String,
    pub built_by: &'static str,
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService")
            .field("root", &self.root)
            .field("built_by", &self.built_by)
            .finish_non_exhaustive()
    }
}

impl Constructible for ReportService {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new("new")
                .capability::<dyn FileSystem>("fs")
                .invoke(|args| {
                    Ok(ReportService {
                        fs: Some(args.object(0)?),
                        root: "/".to_string(),
                        built_by: "new",
                    })
                }),
            Constructor::new("with_root")
                .capability::<dyn FileSystem>("fs")
                .value::<String>("root")
                .invoke(|args| {
                    Ok(ReportService {
                        fs: Some(args.object(0)?),
                        root: args.value(1)?,
                        built_by: "with_root",
                    })
                }),
            Constructor::new("empty").non_public().invoke(|_| {
                Ok(ReportService {
                    fs: None,
                    root: String::new(),
                    built_by: "empty",
                })
            }),
        ]
    }
}

/// Single constructor taking two capabilities
pub struct Scheduler {
    pub clock: Arc<dyn Clock>,
    pub logger: Arc<dyn Logger>,
}

impl Scheduler {
    pub fn tick(&self) -> u64 {
        let now = self.clock.now();
        self.logger.log(&format!("tick at {}", now));
        now
    }
}

impl Constructible for Scheduler {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new("new")
            .capability::<dyn Clock>("clock")
            .capability::<dyn Logger>("logger")
            .invoke(|args| {
                Ok(Scheduler {
                    clock: args.object(0)?,
                    logger: args.object(1)?,
                })
            })]
    }
}

/// Two one-parameter constructors, equally resolvable
#[derive(Debug)]
pub struct TwinConstructors {
    pub built_by: &'static str,
}

impl Constructible for TwinConstructors {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new("from_clock")
                .capability::<dyn Clock>("clock")
                .invoke(|_| Ok(TwinConstructors { built_by: "from_clock" })),
            Constructor::new("from_logger")
                .capability::<dyn Logger>("logger")
                .invoke(|_| Ok(TwinConstructors { built_by: "from_logger" })),
        ]
    }
}

/// Two constructors with the same parameter types
#[derive(Debug)]
pub struct Duplicated {
    pub built_by: &'static str,
}

impl Constructible for Duplicated {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new("first")
                .capability::<dyn Clock>("clock")
                .invoke(|_| Ok(Duplicated { built_by: "first" })),
            Constructor::new("second")
                .capability::<dyn Clock>("clock")
                .invoke(|_| Ok(Duplicated { built_by: "second" })),
        ]
    }
}

/// `one(a)` and `two(a, b)`, both taking `u32`
#[derive(Debug)]
pub struct Pair {
    pub values: Vec<u32>,
    pub built_by: &'static str,
}

impl Constructible for Pair {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new("one").value::<u32>("a").invoke(|args| {
                Ok(Pair {
                    values: vec![args.value(0)?],
                    built_by: "one",
                })
            }),
            Constructor::new("two")
                .value::<u32>("a")
                .value::<u32>("b")
                .invoke(|args| {
                    Ok(Pair {
                        values: vec![args.value(0)?, args.value(1)?],
                        built_by: "two",
                    })
                }),
        ]
    }
}

/// Only a value parameter
#[derive(Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
}

impl Constructible for RetryPolicy {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new("new")
            .value::<u32>("attempts")
            .invoke(|args| Ok(RetryPolicy { attempts: args.value(0)? }))]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { batch_size: 16 }
    }
}

/// Capability plus a concrete dependency
pub struct BatchWriter {
    pub fs: Arc<dyn FileSystem>,
    pub settings: Settings,
}

impl BatchWriter {
    /// Write `rows` in files of at most `batch_size` rows, skipping files that
    /// already exist. Returns how many files were written.
    pub fn write(&self, prefix: &str, rows: &[&str]) -> std::io::Result<usize> {
        let mut written = 0;
        for (index, batch) in rows.chunks(self.settings.batch_size.max(1)).enumerate() {
            let path = format!("{}-{}.txt", prefix, index);
            if self.fs.exists(Path::new(&path)) {
                continue;
            }
            self.fs.write_file(Path::new(&path), &batch.join("\n"))?;
            written += 1;
        }
        Ok(written)
    }
}

impl Constructible for BatchWriter {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new("new")
            .capability::<dyn FileSystem>("fs")
            .concrete::<Settings>("settings")
            .invoke(|args| {
                Ok(BatchWriter {
                    fs: args.object(0)?,
                    settings: args.value(1)?,
                })
            })]
    }
}

/// Two file systems told apart by mock name
pub struct Mirror {
    pub primary: Arc<dyn FileSystem>,
    pub backup: Arc<dyn FileSystem>,
}

impl Constructible for Mirror {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new("new")
            .named_capability::<dyn FileSystem>("primary", "primary")
            .named_capability::<dyn FileSystem>("backup", "backup")
            .invoke(|args| {
                Ok(Mirror {
                    primary: args.object(0)?,
                    backup: args.object(1)?,
                })
            })]
    }
}

/// Reads an audit trail; used with combined mocks
pub struct Auditor {
    pub trail: Arc<dyn AuditTrail>,
}

impl Constructible for Auditor {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new("new")
            .capability::<dyn AuditTrail>("trail")
            .invoke(|args| Ok(Auditor { trail: args.object(0)? }))]
    }
}

/// Declares no constructors at all
#[derive(Debug)]
pub struct Unbuildable;

impl Constructible for Unbuildable {
    fn constructors() -> Vec<Constructor<Self>> {
        Vec::new()
    }
}

/// Depends on itself through a registered factory
#[derive(Debug, Clone)]
pub struct Cyclic;

impl Constructible for Cyclic {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new("new").invoke(|_| Ok(Cyclic))]
    }
}
