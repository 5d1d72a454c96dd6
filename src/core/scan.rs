//! Full scan orchestration state
//!
//! The scanner runs out of band; the engine only reads when the last full
//! scan completed (to invalidate cached summaries) and what it is doing now.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Option holding the unix timestamp of the last completed full scan
pub const FULLSCAN_COMPLETED_AT_OPTION: &str = "fullscan_completed_at";

/// Option holding the current scan state
pub const FULLSCAN_STATE_OPTION: &str = "fullscan_state";

/// What the scan orchestrator is currently doing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanState {
    #[default]
    Idle,
    PhpScanRunning,
    JsScanRunning,
    Other(String),
}

impl ScanState {
    pub fn as_str(&self) -> &str {
        match self {
            ScanState::Idle => "idle",
            ScanState::PhpScanRunning => "php_scan_running",
            ScanState::JsScanRunning => "js_scan_running",
            ScanState::Other(s) => s,
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(self, ScanState::Idle)
    }
}

impl From<String> for ScanState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "" | "idle" => ScanState::Idle,
            "php_scan_running" => ScanState::PhpScanRunning,
            "js_scan_running" => ScanState::JsScanRunning,
            _ => ScanState::Other(s),
        }
    }
}

impl From<ScanState> for String {
    fn from(state: ScanState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External actor that runs full site scans
pub trait ScanOrchestrator {
    fn last_full_scan_completed_at(&self) -> Option<DateTime<Utc>>;

    fn current_scan_state(&self) -> ScanState;
}

/// Snapshot of the orchestrator as reported in summaries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStatus {
    pub running: bool,
    pub state: ScanState,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScanStatus {
    /// Read the orchestrator, or report "never completed" without one
    pub fn read(orchestrator: Option<&dyn ScanOrchestrator>) -> Self {
        match orchestrator {
            Some(o) => {
                let state = o.current_scan_state();
                Self {
                    running: state.is_running(),
                    state,
                    completed_at: o.last_full_scan_completed_at(),
                }
            }
            None => Self::default(),
        }
    }
}

/// Scan state kept in the site `options` table
pub struct OptionScanOrchestrator<'c> {
    conn: &'c Connection,
    site_id: i64,
}

impl<'c> OptionScanOrchestrator<'c> {
    pub fn new(conn: &'c Connection, site_id: i64) -> Self {
        Self { conn, site_id }
    }

    fn option(&self, name: &str) -> Option<String> {
        self.conn
            .query_row(
                "SELECT value FROM options WHERE site_id = ?1 AND name = ?2",
                params![self.site_id, name],
                |row| row.get(0),
            )
            .optional()
            .unwrap_or_else(|e| {
                warn!(option = name, error = %e, "failed to read scan option");
                None
            })
    }
}

impl ScanOrchestrator for OptionScanOrchestrator<'_> {
    fn last_full_scan_completed_at(&self) -> Option<DateTime<Utc>> {
        let value = self.option(FULLSCAN_COMPLETED_AT_OPTION)?;
        let secs: i64 = value.trim().parse().ok()?;
        // 0 means no full scan ever completed
        if secs <= 0 {
            return None;
        }
        Utc.timestamp_opt(secs, 0).single()
    }

    fn current_scan_state(&self) -> ScanState {
        self.option(FULLSCAN_STATE_OPTION)
            .map(ScanState::from)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::fixtures;

    #[test]
    fn test_state_strings() {
        assert_eq!(ScanState::from("js_scan_running".to_string()), ScanState::JsScanRunning);
        assert_eq!(ScanState::from(String::new()), ScanState::Idle);
        assert_eq!(
            ScanState::from("paused".to_string()),
            ScanState::Other("paused".to_string())
        );
        assert!(!ScanState::Idle.is_running());
        assert!(ScanState::PhpScanRunning.is_running());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&ScanState::PhpScanRunning).unwrap();
        assert_eq!(json, "\"php_scan_running\"");
        let state: ScanState = serde_json::from_str("\"idle\"").unwrap();
        assert_eq!(state, ScanState::Idle);
    }

    #[test]
    fn test_absent_orchestrator_never_completed() {
        let status = ScanStatus::read(None);
        assert!(!status.running);
        assert_eq!(status.state, ScanState::Idle);
        assert_eq!(status.completed_at, None);
    }

    #[test]
    fn test_option_orchestrator() {
        let db = fixtures::database();
        let conn = db.connection();
        let scans = OptionScanOrchestrator::new(conn, 1);

        assert_eq!(scans.last_full_scan_completed_at(), None);
        assert_eq!(scans.current_scan_state(), ScanState::Idle);

        fixtures::set_option(conn, FULLSCAN_COMPLETED_AT_OPTION, "1700000000");
        fixtures::set_option(conn, FULLSCAN_STATE_OPTION, "php_scan_running");

        assert_eq!(
            scans.last_full_scan_completed_at(),
            Utc.timestamp_opt(1_700_000_000, 0).single()
        );
        let status = ScanStatus::read(Some(&scans));
        assert!(status.running);
        assert_eq!(status.state, ScanState::PhpScanRunning);
    }

    #[test]
    fn test_zero_timestamp_means_never() {
        let db = fixtures::database();
        fixtures::set_option(db.connection(), FULLSCAN_COMPLETED_AT_OPTION, "0");
        let scans = OptionScanOrchestrator::new(db.connection(), 1);
        assert_eq!(scans.last_full_scan_completed_at(), None);
    }
}
