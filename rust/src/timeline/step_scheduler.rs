//! Backward placement of one recipe's steps against the shared equipment ledger.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::PlannerError;
use crate::models::{Recipe, Step, Task, TaskStatus};
use crate::{log_changes, log_checks};

use super::ledger::{EquipmentLedger, LedgerError};

/// Equipment ids of a step with duplicates removed, original order kept.
fn unique_equipment(step: &Step) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::with_capacity(step.equipment.len());
    for id in &step.equipment {
        if !ids.contains(&id.as_str()) {
            ids.push(id.as_str());
        }
    }
    ids
}

/// Latest end `<= required_end` at which every piece of equipment is free.
///
/// The most constraining equipment wins. Moving earlier for one piece can collide
/// with another, so the search repeats until all pieces accept the same end. Each
/// round strictly decreases the candidate, and there are finitely many bookings.
fn feasible_end(
    equipment: &[&str],
    duration: TimeDelta,
    required_end: DateTime<Utc>,
    ledger: &EquipmentLedger,
    verbosity: u8,
) -> Result<DateTime<Utc>, LedgerError> {
    let mut end = required_end;
    loop {
        let mut candidate = end;
        for id in equipment {
            let slot_end = ledger.find_next_free_slot_backward(id, duration, end)?;
            if slot_end < candidate {
                log_checks!(
                    verbosity,
                    "  {} busy before {}, pulling step end to {}",
                    id,
                    end,
                    slot_end
                );
                candidate = slot_end;
            }
        }
        if candidate == end {
            return Ok(end);
        }
        end = candidate;
    }
}

/// Place a recipe's steps backwards from `target_end`.
///
/// The last step ends at (or, under equipment contention, before) `target_end`; every
/// earlier step ends where its successor starts, or earlier. Equipment windows are
/// reserved on the ledger as steps are placed. Steps without equipment never touch
/// the ledger. Returns tasks in recipe step order.
pub fn schedule_recipe(
    recipe: &Recipe,
    target_end: DateTime<Utc>,
    ledger: &mut EquipmentLedger,
    verbosity: u8,
) -> Result<Vec<Task>, PlannerError> {
    let task_ids: Vec<String> = recipe
        .steps
        .iter()
        .map(|_| Uuid::new_v4().to_string())
        .collect();

    let mut tasks: Vec<Task> = Vec::with_capacity(recipe.steps.len());
    let mut cursor = target_end;

    for (idx, step) in recipe.steps.iter().enumerate().rev() {
        let duration = step.time_delta();
        let equipment = unique_equipment(step);

        let end = if equipment.is_empty() {
            cursor
        } else {
            feasible_end(&equipment, duration, cursor, ledger, verbosity)?
        };
        let start = end.checked_sub_signed(duration).ok_or_else(|| {
            PlannerError::Internal(format!(
                "Recipe '{}' step {} starts before the earliest representable time",
                recipe.name,
                idx + 1
            ))
        })?;

        for id in &equipment {
            ledger.reserve(id, start, end)?;
        }

        log_changes!(
            verbosity,
            "Placed '{}' step {} ({} min) at {} - {}{}",
            recipe.name,
            idx + 1,
            step.duration,
            start,
            end,
            if equipment.is_empty() {
                String::new()
            } else {
                format!(" on {}", equipment.join(", "))
            }
        );

        let dependencies = if idx > 0 {
            vec![task_ids[idx - 1].clone()]
        } else {
            Vec::new()
        };

        tasks.push(Task {
            id: task_ids[idx].clone(),
            recipe_id: recipe.id.clone(),
            recipe_name: recipe.name.clone(),
            step_id: step.id.clone(),
            instruction: step.instruction.clone(),
            start_time: start,
            end_time: end,
            duration: step.duration,
            step_type: step.step_type,
            equipment: equipment.iter().map(|id| id.to_string()).collect(),
            status: TaskStatus::Pending,
            priority: recipe.priority,
            dependencies,
            temperature: step.temperature,
        });

        cursor = start;
    }

    tasks.reverse();
    Ok(tasks)
}
