//! Test doubles for unit tests: a recording process runner and an
//! in-memory resource set.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

use crate::deps::ResourceSet;
use crate::util::{ExecOutput, ProcessBuilder, ProcessRunner};

/// Fake process runner that records every invocation and answers with
/// a configurable handler.
pub struct RecordingRunner {
    calls: Mutex<Vec<ProcessBuilder>>,
    handler: Box<dyn Fn(&ProcessBuilder) -> ExecOutput + Send + Sync>,
}

impl RecordingRunner {
    /// Runner whose every invocation succeeds with empty output.
    pub fn new() -> Self {
        Self::with_handler(|_| ExecOutput::ok())
    }

    /// Runner answering with `handler`.
    pub fn with_handler(
        handler: impl Fn(&ProcessBuilder) -> ExecOutput + Send + Sync + 'static,
    ) -> Self {
        RecordingRunner {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    /// All recorded invocations, in order.
    pub fn calls(&self) -> Vec<ProcessBuilder> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ExecOutput> {
        self.calls.lock().unwrap().push(cmd.clone());
        Ok((self.handler)(cmd))
    }
}

/// In-memory resource set keyed by relative path.
#[derive(Debug, Default)]
pub struct MapResources {
    entries: HashMap<String, Vec<u8>>,
}

impl MapResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(path.into(), contents.into());
        self
    }
}

impl ResourceSet for MapResources {
    fn read(&self, rel: &str) -> Option<Vec<u8>> {
        self.entries.get(rel).cloned()
    }
}
