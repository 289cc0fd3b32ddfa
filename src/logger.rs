//! Interpolation logger
//!
//!  Records what the interpolators did each cycle so a session can be
//!  analysed afterwards. Entries live in memory in two bounded ring buffers,
//!  each behind its own reader/writer lock; writing them to disk is an
//!  explicit, separate step.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::parts::AircraftParts;
use crate::setup::InterpolatorMode;
use crate::situation::{AircraftSituation, Callsign};
use crate::status::{InterpolationStatus, PartsStatus};

pub const DEFAULT_MAX_LOG_ENTRIES: usize = 2500;

/// One situation interpolation cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SituationLog {
    /// Requested time
    pub timestamp_ms: i64,
    pub callsign: Callsign,
    pub mode: InterpolatorMode,
    /// Requested time minus time offset
    pub effective_time_ms: i64,
    pub time_offset_ms: i64,
    pub fraction: f64,
    pub situations_count: usize,
    pub older: Option<AircraftSituation>,
    pub newer: Option<AircraftSituation>,
    pub interpolated: AircraftSituation,
    pub hint_elevation_ft: Option<f64>,
    pub status: InterpolationStatus,
}

/// One parts lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartsLog {
    /// Cutoff time
    pub timestamp_ms: i64,
    pub callsign: Callsign,
    pub parts_count: usize,
    pub parts: AircraftParts,
    pub flaps_blended: bool,
    pub status: PartsStatus,
}

/// Paths written by [`InterpolationLogger::write_log_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFiles {
    pub interpolation: PathBuf,
    pub parts: PathBuf,
}

#[derive(Debug)]
pub struct InterpolationLogger {
    situations: RwLock<VecDeque<SituationLog>>,
    parts: RwLock<VecDeque<PartsLog>>,
    max_entries: AtomicUsize,
}

impl Default for InterpolationLogger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_ENTRIES)
    }
}

impl InterpolationLogger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            situations: RwLock::new(VecDeque::new()),
            parts: RwLock::new(VecDeque::new()),
            max_entries: AtomicUsize::new(max_entries.max(1)),
        }
    }

    fn max_entries(&self) -> usize {
        self.max_entries.load(Ordering::Relaxed)
    }

    /// Store one interpolation cycle
    pub fn log_interpolation(&self, log: SituationLog) {
        let max = self.max_entries();
        let mut situations = self.situations.write();
        while situations.len() >= max {
            situations.pop_front();
        }
        situations.push_back(log);
    }

    /// Store one parts lookup
    pub fn log_parts(&self, log: PartsLog) {
        let max = self.max_entries();
        let mut parts = self.parts.write();
        while parts.len() >= max {
            parts.pop_front();
        }
        parts.push_back(log);
    }

    /// Change the ring size, dropping the oldest entries if needed
    pub fn set_max_situations(&self, max: usize) {
        let max = max.max(1);
        self.max_entries.store(max, Ordering::Relaxed);
        {
            let mut situations = self.situations.write();
            let excess = situations.len().saturating_sub(max);
            situations.drain(..excess);
        }
        let mut parts = self.parts.write();
        let excess = parts.len().saturating_sub(max);
        parts.drain(..excess);
    }

    pub fn clear(&self) {
        self.situations.write().clear();
        self.parts.write().clear();
    }

    pub fn situation_log_count(&self) -> usize {
        self.situations.read().len()
    }

    pub fn parts_log_count(&self) -> usize {
        self.parts.read().len()
    }

    /// All situation logs, oldest first
    pub fn situation_logs(&self) -> Vec<SituationLog> {
        self.situations.read().iter().cloned().collect()
    }

    pub fn situation_logs_for(&self, callsign: &Callsign) -> Vec<SituationLog> {
        self.situations
            .read()
            .iter()
            .filter(|l| &l.callsign == callsign)
            .cloned()
            .collect()
    }

    /// Up to `n` most recent situation logs, newest first
    pub fn latest_situation_logs(&self, n: usize) -> Vec<SituationLog> {
        self.situations.read().iter().rev().take(n).cloned().collect()
    }

    /// Last situation log, optionally for one callsign
    pub fn last_situation_log(&self, callsign: Option<&Callsign>) -> Option<SituationLog> {
        let situations = self.situations.read();
        match callsign {
            Some(cs) => situations.iter().rev().find(|l| &l.callsign == cs).cloned(),
            None => situations.back().cloned(),
        }
    }

    /// Last interpolated situation, optionally for one callsign
    pub fn last_situation(&self, callsign: Option<&Callsign>) -> Option<AircraftSituation> {
        self.last_situation_log(callsign).map(|l| l.interpolated)
    }

    pub fn parts_logs(&self) -> Vec<PartsLog> {
        self.parts.read().iter().cloned().collect()
    }

    pub fn parts_logs_for(&self, callsign: &Callsign) -> Vec<PartsLog> {
        self.parts
            .read()
            .iter()
            .filter(|l| &l.callsign == callsign)
            .cloned()
            .collect()
    }

    pub fn last_parts_log(&self, callsign: Option<&Callsign>) -> Option<PartsLog> {
        let parts = self.parts.read();
        match callsign {
            Some(cs) => parts.iter().rev().find(|l| &l.callsign == cs).cloned(),
            None => parts.back().cloned(),
        }
    }

    pub fn last_parts(&self, callsign: Option<&Callsign>) -> Option<AircraftParts> {
        self.last_parts_log(callsign).map(|l| l.parts)
    }

    /// Write both logs as JSON lines into `dir`
    pub fn write_log_files(&self, dir: &Path) -> Result<LogFiles> {
        write_files(dir, &self.situation_logs(), &self.parts_logs())
    }

    /// Snapshot the logs and write them on a separate thread
    pub fn write_log_in_background(self: &Arc<Self>, dir: PathBuf) -> JoinHandle<Result<LogFiles>> {
        let situations = self.situation_logs();
        let parts = self.parts_logs();
        thread::spawn(move || {
            let result = write_files(&dir, &situations, &parts);
            if let Err(e) = &result {
                warn!("Writing interpolation log failed: {}", e);
            }
            result
        })
    }
}

/// Write records as JSON lines, returns the number written
pub fn write_json_lines<W: Write, T: Serialize>(writer: &mut W, records: &[T]) -> Result<usize> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}

fn write_files(dir: &Path, situations: &[SituationLog], parts: &[PartsLog]) -> Result<LogFiles> {
    fs::create_dir_all(dir)?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    let files = LogFiles {
        interpolation: dir.join(format!("interpolation_{}.log", stamp)),
        parts: dir.join(format!("parts_{}.log", stamp)),
    };

    let mut writer = BufWriter::new(File::create(&files.interpolation)?);
    let n = write_json_lines(&mut writer, situations)?;
    info!("Wrote {} interpolation log entries to {}", n, files.interpolation.display());

    let mut writer = BufWriter::new(File::create(&files.parts)?);
    let n = write_json_lines(&mut writer, parts)?;
    info!("Wrote {} parts log entries to {}", n, files.parts.display());

    Ok(files)
}
