use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ATTENDANCE_KEY: &str = "setup.attendance";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceSettings {
    /// Lookback of the roster summary, in days before today.
    pub roster_window_days: u32,
    /// Restrict trainer rosters to the classes a student belongs to.
    pub apply_class_filter: bool,
    /// Refuse compound record filters that have no backing index.
    pub strict_indexes: bool,
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            roster_window_days: 30,
            apply_class_filter: true,
            strict_indexes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsError {
    pub field: String,
    pub message: String,
}

impl AttendanceSettings {
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        let stored = db::settings_get_json(conn, ATTENDANCE_KEY)?;
        Ok(match stored {
            // Unknown or ill-typed stored fields fall back to defaults
            // rather than locking the workspace out.
            Some(v) => serde_json::from_value(v).unwrap_or_default(),
            None => Self::default(),
        })
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_set_json(conn, ATTENDANCE_KEY, &serde_json::to_value(self)?)
    }

    /// Applies a partial JSON patch. Unknown keys and out-of-range values are
    /// rejected as a whole; nothing is applied on error.
    pub fn patched(&self, patch: &Map<String, Value>) -> Result<Self, SettingsError> {
        let mut next = self.clone();
        for (key, value) in patch {
            match key.as_str() {
                "rosterWindowDays" => {
                    let days = value
                        .as_u64()
                        .filter(|d| (1..=365).contains(d))
                        .ok_or_else(|| SettingsError {
                            field: key.clone(),
                            message: "must be an integer between 1 and 365".to_string(),
                        })?;
                    next.roster_window_days = days as u32;
                }
                "applyClassFilter" => {
                    next.apply_class_filter = bool_field(key, value)?;
                }
                "strictIndexes" => {
                    next.strict_indexes = bool_field(key, value)?;
                }
                _ => {
                    return Err(SettingsError {
                        field: key.clone(),
                        message: "unknown setting".to_string(),
                    })
                }
            }
        }
        Ok(next)
    }
}

fn bool_field(key: &str, value: &Value) -> Result<bool, SettingsError> {
    value.as_bool().ok_or_else(|| SettingsError {
        field: key.to_string(),
        message: "must be a boolean".to_string(),
    })
}
