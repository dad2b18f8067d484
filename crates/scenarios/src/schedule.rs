//! Application activity windows in simulated time

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[start, stop]` interval during which an application is active
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    #[serde(with = "crate::serde_secs")]
    pub start: Duration,
    #[serde(with = "crate::serde_secs")]
    pub stop: Duration,
}

impl ScheduleWindow {
    pub fn new(start: Duration, stop: Duration) -> Self {
        Self { start, stop }
    }

    pub fn from_secs(start: f64, stop: f64) -> Self {
        Self::new(Duration::from_secs_f64(start), Duration::from_secs_f64(stop))
    }

    /// True when `other` lies entirely inside this window
    pub fn contains(&self, other: &ScheduleWindow) -> bool {
        self.start <= other.start && self.stop >= other.stop
    }

    pub fn duration(&self) -> Duration {
        self.stop.saturating_sub(self.start)
    }
}

/// Windows and deadline applied to every run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSchedule {
    pub server: ScheduleWindow,
    pub client: ScheduleWindow,
    /// The engine stops advancing simulated time here
    #[serde(with = "crate::serde_secs")]
    pub deadline: Duration,
}

impl Default for RunSchedule {
    fn default() -> Self {
        Self {
            server: ScheduleWindow::from_secs(1.0, 10.0),
            client: ScheduleWindow::from_secs(2.0, 10.0),
            deadline: Duration::from_secs(10),
        }
    }
}

impl RunSchedule {
    /// Server must be up before and until after every client; nothing may
    /// outlive the deadline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, window) in [("server", &self.server), ("client", &self.client)] {
            if window.start > window.stop {
                return Err(ConfigError::InvalidSchedule(format!(
                    "{} window starts after it stops",
                    name
                )));
            }
            if window.stop > self.deadline {
                return Err(ConfigError::InvalidSchedule(format!(
                    "{} window ends at {:?}, after the {:?} deadline",
                    name, window.stop, self.deadline
                )));
            }
        }
        if !self.server.contains(&self.client) {
            return Err(ConfigError::InvalidSchedule(format!(
                "server window {:?}..{:?} does not contain client window {:?}..{:?}",
                self.server.start, self.server.stop, self.client.start, self.client.stop
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let schedule = RunSchedule::default();
        assert_eq!(schedule.server.start, Duration::from_secs(1));
        assert_eq!(schedule.client.start, Duration::from_secs(2));
        assert_eq!(schedule.deadline, Duration::from_secs(10));
        assert!(schedule.server.contains(&schedule.client));
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn test_client_before_server_rejected() {
        let schedule = RunSchedule {
            client: ScheduleWindow::from_secs(0.5, 10.0),
            ..RunSchedule::default()
        };
        assert!(matches!(schedule.validate(), Err(ConfigError::InvalidSchedule(_))));
    }

    #[test]
    fn test_window_past_deadline_rejected() {
        let schedule = RunSchedule {
            server: ScheduleWindow::from_secs(1.0, 12.0),
            ..RunSchedule::default()
        };
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_window_serializes_as_seconds() {
        let json = serde_json::to_string(&ScheduleWindow::from_secs(2.0, 10.0)).unwrap();
        assert_eq!(json, r#"{"start":2.0,"stop":10.0}"#);
    }
}
