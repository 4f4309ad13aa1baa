/// Event sinks for mount status records
use crate::config::types::{MountCheckError, Result};
use crate::observability::emitter::MountStatusRecord;
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Downstream receiver of tagged, timestamped records
pub trait EventSink {
    fn emit(&mut self, tag: &str, time: SystemTime, record: &MountStatusRecord) -> Result<()>;
}

#[derive(Serialize)]
struct EventLine<'a> {
    tag: &'a str,
    time: f64,
    record: &'a MountStatusRecord,
}

/// Writes one JSON object per event, newline-delimited
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, tag: &str, time: SystemTime, record: &MountStatusRecord) -> Result<()> {
        let line = EventLine {
            tag,
            time: time
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs_f64(),
            record,
        };

        serde_json::to_writer(&mut self.out, &line)
            .map_err(|e| MountCheckError::Sink(format!("failed to encode event: {e}")))?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// One event as received by [`CollectingSink`]
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedEvent {
    pub tag: String,
    pub time: SystemTime,
    pub record: MountStatusRecord,
}

/// Keeps events in memory; clones share the same buffer
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<CollectedEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CollectedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for CollectingSink {
    fn emit(&mut self, tag: &str, time: SystemTime, record: &MountStatusRecord) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| MountCheckError::Sink("collector lock poisoned".to_string()))?;
        events.push(CollectedEvent {
            tag: tag.to_string(),
            time,
            record: record.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(healthy: bool) -> MountStatusRecord {
        MountStatusRecord {
            device: "nas:/vol".to_string(),
            mountpoint: "/mnt/vol".to_string(),
            fstype: "nfs".to_string(),
            mountpoint_healthy: healthy,
            mountpoint_error: if healthy { None } else { Some("timeout".to_string()) },
        }
    }

    #[test]
    fn json_lines_shape() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let time = UNIX_EPOCH + Duration::from_millis(1_743_645_660_123);
        sink.emit("syscheck", time, &record(false)).unwrap();
        sink.emit("syscheck", time, &record(true)).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["tag"], "syscheck");
        assert!((lines[0]["time"].as_f64().unwrap() - 1_743_645_660.123).abs() < 1e-3);
        assert_eq!(lines[0]["record"]["mountpoint_error"], "timeout");
        assert_eq!(lines[0]["record"]["mountpoint_healthy"], false);
        assert!(lines[1]["record"].get("mountpoint_error").is_none());
    }

    #[test]
    fn collecting_sink_clones_share_events() {
        let sink = CollectingSink::new();
        let mut writer = sink.clone();
        writer.emit("t", UNIX_EPOCH, &record(true)).unwrap();
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].tag, "t");
    }
}
