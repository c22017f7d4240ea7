//! Multi-recipe timeline generation.
//!
//! Recipes are scaled, ordered by freshness priority, given staggered target end times
//! (highest priority closest to serving), placed backwards against one shared
//! equipment ledger, then merged and truncated to the rounding boundary.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::models::{Equipment, Recipe, Task};
use crate::scaling::scale_recipe;
use crate::{log_changes, log_checks};

use super::ledger::EquipmentLedger;
use super::step_scheduler::schedule_recipe;

/// Output of one generation run.
#[derive(Clone, Debug)]
pub struct GeneratedTimeline {
    /// All tasks, ascending by start time, every one `pending`
    pub tasks: Vec<Task>,
    /// Recipes after scaling, in input order
    pub recipes: Vec<Recipe>,
}

/// Truncate `time` down to a multiple of `boundary` (seconds dropped as well).
pub fn round_down(
    time: DateTime<Utc>,
    boundary: TimeDelta,
) -> Result<DateTime<Utc>, PlannerError> {
    time.duration_trunc(boundary)
        .map_err(|e| PlannerError::Internal(format!("Cannot round {}: {}", time, e)))
}

/// Indices of `recipes` in scheduling order: highest priority first, and among equal
/// priorities the last-listed recipe first.
fn priority_order(recipes: &[Recipe]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..recipes.len()).collect();
    // Stable ascending sort, then walk it from the back
    order.sort_by_key(|&idx| recipes[idx].priority.rank());
    order.reverse();
    order
}

/// Build the full task timeline for a meal.
pub fn generate_timeline(
    recipes: &[Recipe],
    target_time: DateTime<Utc>,
    diners: u32,
    inventory: &[Equipment],
    config: &PlannerConfig,
) -> Result<GeneratedTimeline, PlannerError> {
    if recipes.is_empty() {
        return Err(PlannerError::validation("At least one recipe is required"));
    }

    let scaled: Vec<Recipe> = recipes
        .iter()
        .map(|r| scale_recipe(r, diners))
        .collect::<Result<_, _>>()?;

    let order = priority_order(&scaled);
    log_checks!(
        config.verbosity,
        "Recipe order (closest to serving first): {:?}",
        order
            .iter()
            .map(|&idx| scaled[idx].name.as_str())
            .collect::<Vec<_>>()
    );

    let mut ledger = EquipmentLedger::new(inventory, config.verbosity);
    let mut tasks: Vec<Task> = Vec::with_capacity(scaled.iter().map(|r| r.steps.len()).sum());
    let mut recipe_target = target_time;

    for (position, &idx) in order.iter().enumerate() {
        if position > 0 {
            recipe_target = recipe_target
                .checked_sub_signed(config.stagger())
                .ok_or_else(|| {
                    PlannerError::Internal(format!(
                        "Staggered target before {} is out of range",
                        recipe_target
                    ))
                })?;
        }
        let recipe = &scaled[idx];
        log_changes!(
            config.verbosity,
            "Scheduling '{}' ({:?}) to finish by {}",
            recipe.name,
            recipe.priority,
            recipe_target
        );
        tasks.extend(schedule_recipe(
            recipe,
            recipe_target,
            &mut ledger,
            config.verbosity,
        )?);
    }

    // Stable sort keeps recipe step order for equal start times
    tasks.sort_by_key(|task| task.start_time);

    let boundary = config.rounding();
    for task in &mut tasks {
        task.start_time = round_down(task.start_time, boundary)?;
        task.end_time = round_down(task.end_time, boundary)?;
    }

    Ok(GeneratedTimeline {
        tasks,
        recipes: scaled,
    })
}
