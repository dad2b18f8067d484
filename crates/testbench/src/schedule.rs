//! Start/stop windows for installed applications

use crate::engine::{AppHandle, SimulationEngine};
use crate::traffic::InstalledTraffic;
use crate::Result;
use scenarios::{RunSchedule, ScheduleWindow};
use std::time::Duration;

/// Window applied to one application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledApp {
    pub app: AppHandle,
    pub server_side: bool,
    pub window: ScheduleWindow,
}

pub struct RunScheduler {
    schedule: RunSchedule,
}

impl RunScheduler {
    /// Refuses schedules where the server window does not cover the client
    /// window or either window ends after the deadline
    pub fn new(schedule: RunSchedule) -> Result<Self> {
        schedule.validate()?;
        Ok(Self { schedule })
    }

    pub fn deadline(&self) -> Duration {
        self.schedule.deadline
    }

    pub fn apply(
        &self,
        engine: &mut dyn SimulationEngine,
        traffic: &InstalledTraffic,
    ) -> Result<Vec<ScheduledApp>> {
        let server = traffic
            .server_apps
            .iter()
            .map(|&(_, app)| (app, true, self.schedule.server));
        let client = traffic
            .client_apps
            .iter()
            .map(|&(_, app)| (app, false, self.schedule.client));

        let mut scheduled = Vec::new();
        for (app, server_side, window) in server.chain(client) {
            engine.schedule_application(app, window)?;
            scheduled.push(ScheduledApp {
                app,
                server_side,
                window,
            });
        }
        Ok(scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestbenchError;

    #[test]
    fn test_default_windows_nest() {
        let scheduler = RunScheduler::new(RunSchedule::default()).unwrap();
        assert_eq!(scheduler.deadline(), Duration::from_secs(10));
        assert!(scheduler
            .schedule
            .server
            .contains(&scheduler.schedule.client));
    }

    #[test]
    fn test_client_outside_server_window_rejected() {
        let schedule = RunSchedule {
            server: ScheduleWindow::from_secs(3.0, 10.0),
            ..RunSchedule::default()
        };
        let err = RunScheduler::new(schedule).err().unwrap();
        assert!(matches!(err, TestbenchError::Config(_)));
    }

    #[test]
    fn test_window_past_deadline_rejected() {
        let schedule = RunSchedule {
            deadline: Duration::from_secs(5),
            ..RunSchedule::default()
        };
        assert!(RunScheduler::new(schedule).is_err());
    }
}
