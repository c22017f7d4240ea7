//! Read-only views over a meal's timeline: progress and what to do now.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Meal, MealStatus, Task, TaskStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub completed_count: usize,
    pub total_count: usize,
    /// Rounded percentage, 0 for an empty timeline
    pub percentage: u32,
}

impl Progress {
    pub fn of(tasks: &[Task]) -> Self {
        let completed_count = tasks.iter().filter(|t| t.is_completed()).count();
        let total_count = tasks.len();
        let percentage = if total_count == 0 {
            0
        } else {
            (100.0 * completed_count as f64 / total_count as f64).round() as u32
        };
        Self {
            completed_count,
            total_count,
            percentage,
        }
    }
}

/// Timeline plus derived progress, as returned by "fetch timeline".
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    pub meal_id: String,
    pub status: MealStatus,
    pub timeline: Vec<Task>,
    pub progress: Progress,
}

impl TimelineSnapshot {
    pub fn of(meal: &Meal) -> Self {
        Self {
            meal_id: meal.id.clone(),
            status: meal.status,
            timeline: meal.timeline.clone(),
            progress: Progress::of(&meal.timeline),
        }
    }
}

/// What is happening at a given instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTasks {
    /// First unfinished task whose `[start, end)` contains now
    pub current: Option<Task>,
    /// Pending tasks starting after now, earliest first
    pub upcoming: Vec<Task>,
    /// Unfinished tasks whose interval contains now
    pub active_count: usize,
    /// Whole minutes (rounded up) until the next upcoming task starts
    pub minutes_until_next: Option<i64>,
}

pub fn current_tasks(
    tasks: &[Task],
    now: DateTime<Utc>,
    upcoming_limit: usize,
) -> CurrentTasks {
    let mut running = tasks
        .iter()
        .filter(|t| !t.is_completed() && t.is_running_at(now));
    let current = running.next().cloned();
    let active_count = usize::from(current.is_some()) + running.count();

    let mut upcoming: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Pending && t.start_time > now)
        .collect();
    upcoming.sort_by_key(|t| t.start_time);
    upcoming.truncate(upcoming_limit);

    let minutes_until_next = upcoming.first().map(|next| {
        let millis = (next.start_time - now).num_milliseconds();
        (millis + 59_999) / 60_000
    });

    CurrentTasks {
        current,
        upcoming: upcoming.into_iter().cloned().collect(),
        active_count,
        minutes_until_next,
    }
}
