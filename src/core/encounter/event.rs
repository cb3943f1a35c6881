//! Structured encounter events and sinks.
//!
//! The engine emits typed, untimestamped events; sinks own presentation
//! concerns. The NDJSON file sink stamps wall-clock time on the way out
//! so the engine itself stays byte-deterministic.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind discriminant carried in the `event` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Action,
    Damage,
    Status,
    Summary,
}

/// One state transition in an encounter. Append-only and immutable once
/// emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterEvent {
    pub event: EventKind,
    pub round: u32,
    pub actor: String,
    #[serde(default)]
    pub detail: Map<String, Value>,
}

impl EncounterEvent {
    pub fn new(event: EventKind, round: u32, actor: impl Into<String>) -> Self {
        Self {
            event,
            round,
            actor: actor.into(),
            detail: Map::new(),
        }
    }

    /// Attach one detail field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.detail.insert(key.to_string(), value.into());
        self
    }
}

/// Capability for receiving encounter events.
///
/// Injected into the engine so event production stays separate from
/// stamping/persistence.
pub trait EventSink {
    fn emit(&mut self, event: &EncounterEvent) -> io::Result<()>;

    /// Flush buffered events; called once at resolution.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes one JSON object per line to any writer (the `play --json`
/// stdout stream).
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: &EncounterEvent) -> io::Result<()> {
        let line = serde_json::to_string(event)?;
        writeln!(self.writer, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Append-only NDJSON file sink that stamps each event with wall-clock
/// time. Flushed on drop so the log survives every exit path.
pub struct NdjsonFileSink {
    writer: BufWriter<File>,
}

impl NdjsonFileSink {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for NdjsonFileSink {
    fn emit(&mut self, event: &EncounterEvent) -> io::Result<()> {
        let mut stamped = serde_json::to_value(event)?;
        if let Value::Object(obj) = &mut stamped {
            obj.insert(
                "ts".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        writeln!(self.writer, "{stamped}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for NdjsonFileSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Collects events in memory; used by tests and the text renderer.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<EncounterEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: &EncounterEvent) -> io::Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}
