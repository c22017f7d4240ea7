//! Timeline adjustment when a task is completed.
//!
//! The observed delay (or head start) of the completed task is applied as one flat
//! shift to every pending task that was scheduled to start after it ended. Equipment
//! conflicts are not re-checked after the shift.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::PlannerError;
use crate::log_changes;
use crate::models::{Meal, TaskStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AdjustmentReason {
    #[serde(rename = "completed late")]
    CompletedLate,
    #[serde(rename = "completed early")]
    CompletedEarly,
}

/// One shifted task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAdjustment {
    pub task_id: String,
    pub old_start: DateTime<Utc>,
    pub new_start: DateTime<Utc>,
    pub old_end: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
    pub reason: AdjustmentReason,
}

/// Result of a completion event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub task_id: String,
    pub completed_at: DateTime<Utc>,
    pub adjustments: Vec<TaskAdjustment>,
}

/// Mark `task_id` completed at `completed_at` and shift the downstream pending tasks.
///
/// The meal is only modified once the task has been found and accepted, so an error
/// leaves it untouched.
pub fn apply_completion(
    meal: &mut Meal,
    task_id: &str,
    completed_at: DateTime<Utc>,
    verbosity: u8,
) -> Result<CompletionOutcome, PlannerError> {
    let idx = meal
        .timeline
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| PlannerError::task_not_found(task_id))?;

    if meal.timeline[idx].is_completed() {
        return Err(PlannerError::validation(format!(
            "Task {} is already completed",
            task_id
        )));
    }

    let scheduled_end = meal.timeline[idx].end_time;
    let delta = completed_at - scheduled_end;

    let mut adjustments = Vec::new();
    if delta != TimeDelta::zero() {
        let reason = if delta > TimeDelta::zero() {
            AdjustmentReason::CompletedLate
        } else {
            AdjustmentReason::CompletedEarly
        };
        let shift = |time: DateTime<Utc>| {
            time.checked_add_signed(delta).ok_or_else(|| {
                PlannerError::validation(format!(
                    "Completion time {} moves the timeline out of range",
                    completed_at
                ))
            })
        };

        for (pos, task) in meal.timeline.iter().enumerate() {
            if pos == idx || task.status != TaskStatus::Pending || task.start_time <= scheduled_end
            {
                continue;
            }
            adjustments.push(TaskAdjustment {
                task_id: task.id.clone(),
                old_start: task.start_time,
                new_start: shift(task.start_time)?,
                old_end: task.end_time,
                new_end: shift(task.end_time)?,
                reason,
            });
        }
        // Only apply once every shift is known to be representable
        for adjustment in &adjustments {
            if let Some(task) = meal.timeline.iter_mut().find(|t| t.id == adjustment.task_id) {
                task.start_time = adjustment.new_start;
                task.end_time = adjustment.new_end;
            }
        }

        log_changes!(
            verbosity,
            "Task {} finished {} min {}; shifted {} pending tasks",
            task_id,
            delta.num_minutes().abs(),
            if reason == AdjustmentReason::CompletedLate {
                "late"
            } else {
                "early"
            },
            adjustments.len()
        );
    }

    meal.timeline[idx].status = TaskStatus::Completed;
    meal.refresh_status();

    Ok(CompletionOutcome {
        task_id: task_id.to_string(),
        completed_at,
        adjustments,
    })
}
