// [libs/domain/models/src/script.rs]
//! Script assignment and version registry entity (spec component C5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, versioned action program a device interprets. At most one
/// script is "current" per sensor; assigning a new one supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub id: i64,
    pub sensor_id: String,
    pub script_content: String,
    pub script_version: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptInput {
    pub script_content: String,
    pub script_version: String,
    pub description: Option<String>,
}

/// Derived classification over the ScriptExecutionReport carried on Device
/// (spec §4.5). Computed fresh on read, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ExecutionStatus {
    Running,
    Recent,
    Idle,
}

impl ExecutionStatus {
    pub fn classify(
        last_script_execution: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        t_running: chrono::Duration,
        t_recent: chrono::Duration,
    ) -> Self {
        let Some(last_execution) = last_script_execution else {
            return ExecutionStatus::Idle;
        };
        let elapsed = now - last_execution;
        if elapsed <= t_running {
            ExecutionStatus::Running
        } else if elapsed <= t_recent {
            ExecutionStatus::Recent
        } else {
            ExecutionStatus::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_when_never_reported() {
        let now = Utc::now();
        let status = ExecutionStatus::classify(
            None,
            now,
            chrono::Duration::seconds(120),
            chrono::Duration::minutes(15),
        );
        assert_eq!(status, ExecutionStatus::Idle);
    }

    #[test]
    fn running_within_threshold() {
        let now = Utc::now();
        let status = ExecutionStatus::classify(
            Some(now - chrono::Duration::seconds(10)),
            now,
            chrono::Duration::seconds(120),
            chrono::Duration::minutes(15),
        );
        assert_eq!(status, ExecutionStatus::Running);
    }

    #[test]
    fn recent_between_thresholds() {
        let now = Utc::now();
        let status = ExecutionStatus::classify(
            Some(now - chrono::Duration::minutes(5)),
            now,
            chrono::Duration::seconds(120),
            chrono::Duration::minutes(15),
        );
        assert_eq!(status, ExecutionStatus::Recent);
    }
}
