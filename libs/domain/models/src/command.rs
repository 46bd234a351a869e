// [libs/domain/models/src/command.rs]
//! Command queue entity and its state DAG (spec component C4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `pending -> delivered -> {completed | failed}`, with `expired` reachable
/// from `pending` or `delivered` once `expires_at` has passed. Terminal
/// states (`completed`, `failed`, `expired`) never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Pending,
    Delivered,
    Completed,
    Failed,
    Expired,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::Delivered => "delivered",
            CommandStatus::Completed => "completed",
            CommandStatus::Failed => "failed",
            CommandStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommandStatus::Completed | CommandStatus::Failed | CommandStatus::Expired
        )
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(CommandStatus::Pending),
            "delivered" => Some(CommandStatus::Delivered),
            "completed" => Some(CommandStatus::Completed),
            "failed" => Some(CommandStatus::Failed),
            "expired" => Some(CommandStatus::Expired),
            _ => None,
        }
    }
}

/// A unit of remote work targeted at one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandQueueEntry {
    pub id: i64,
    pub sensor_id: String,
    pub command_type: String,
    pub command_data: serde_json::Value,
    pub priority: i64,
    pub status: CommandStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub result_message: Option<String>,
}

/// Outcome reported by the device for one delivered command id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckResult {
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_never_transition() {
        assert!(CommandStatus::Completed.is_terminal());
        assert!(CommandStatus::Failed.is_terminal());
        assert!(CommandStatus::Expired.is_terminal());
        assert!(!CommandStatus::Pending.is_terminal());
        assert!(!CommandStatus::Delivered.is_terminal());
    }

    #[test]
    fn parse_round_trips_as_str() {
        for status in [
            CommandStatus::Pending,
            CommandStatus::Delivered,
            CommandStatus::Completed,
            CommandStatus::Failed,
            CommandStatus::Expired,
        ] {
            assert_eq!(CommandStatus::parse(status.as_str()), Some(status));
        }
    }
}
