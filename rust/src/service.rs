//! Meal planning service: ties validation, generation, storage and completion together.
//!
//! The algorithms themselves are stateless. All state lives in the injected stores,
//! and every read-modify-write of a meal happens under that meal's own lock so that
//! concurrent completions for one meal cannot lose updates.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::log_changes;
use crate::models::{Meal, MealStatus, Task, TaskStatus};
use crate::progress::{current_tasks, CurrentTasks, TimelineSnapshot};
use crate::request::{CompletionRequest, MealRequest};
use crate::reschedule::{apply_completion, CompletionOutcome};
use crate::store::{InMemoryStore, Store};
use crate::timeline::generate_timeline;

fn lock_poisoned<T>(_: T) -> PlannerError {
    PlannerError::Internal("Meal lock poisoned".to_string())
}

/// Meal planner over pluggable storage.
///
/// `meals` maps meal id → meal; `task_index` maps task id → owning meal id.
pub struct MealPlanner<M = InMemoryStore<Meal>, I = InMemoryStore<String>> {
    meals: M,
    task_index: I,
    config: PlannerConfig,
    // One entry per meal ever mutated. Meals are never deleted, so this is never pruned;
    // a store that evicts meals must drop the matching lock entry too.
    meal_locks: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl MealPlanner {
    /// Planner backed by volatile in-process maps.
    pub fn in_memory(config: PlannerConfig) -> Result<Self, PlannerError> {
        Self::new(InMemoryStore::new(), InMemoryStore::new(), config)
    }
}

impl<M, I> MealPlanner<M, I>
where
    M: Store<Meal>,
    I: Store<String>,
{
    pub fn new(meals: M, task_index: I, config: PlannerConfig) -> Result<Self, PlannerError> {
        config.validate()?;
        Ok(Self {
            meals,
            task_index,
            config,
            meal_locks: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn meal_lock(&self, meal_id: &str) -> Result<Arc<Mutex<()>>, PlannerError> {
        let mut locks = self.meal_locks.lock().map_err(lock_poisoned)?;
        Ok(Arc::clone(
            locks
                .entry(meal_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    fn load_meal(&self, meal_id: &str) -> Result<Meal, PlannerError> {
        self.meals
            .get(meal_id)?
            .ok_or_else(|| PlannerError::meal_not_found(meal_id))
    }

    fn meal_id_for_task(&self, task_id: &str) -> Result<String, PlannerError> {
        self.task_index
            .get(task_id)?
            .ok_or_else(|| PlannerError::task_not_found(task_id))
    }

    /// Validate a request, generate its timeline and store the new meal.
    ///
    /// Nothing is stored unless the whole timeline was generated.
    pub fn create_meal(&self, request: MealRequest) -> Result<Meal, PlannerError> {
        let validated = request.validate()?;
        let generated = generate_timeline(
            &validated.recipes,
            validated.target_time,
            validated.diners,
            &validated.equipment,
            &self.config,
        )?;

        let meal = Meal {
            id: Uuid::new_v4().to_string(),
            timeline: generated.tasks,
            created_at: Utc::now(),
            target_time: validated.target_time,
            diners: validated.diners,
            status: MealStatus::Pending,
            recipes: generated.recipes,
            equipment: validated.equipment,
        };

        // Index first: a dangling index entry only ever resolves to "meal not found"
        for task in &meal.timeline {
            self.task_index.put(&task.id, meal.id.clone())?;
        }
        self.meals.put(&meal.id, meal.clone())?;

        log_changes!(
            self.config.verbosity,
            "Created meal {} with {} tasks for {} diners",
            meal.id,
            meal.timeline.len(),
            meal.diners
        );
        Ok(meal)
    }

    pub fn create_meal_json(&self, json: &str) -> Result<Meal, PlannerError> {
        self.create_meal(MealRequest::from_json(json)?)
    }

    pub fn meal(&self, meal_id: &str) -> Result<Meal, PlannerError> {
        self.load_meal(meal_id)
    }

    /// Current task list with progress.
    pub fn timeline(&self, meal_id: &str) -> Result<TimelineSnapshot, PlannerError> {
        Ok(TimelineSnapshot::of(&self.load_meal(meal_id)?))
    }

    /// Mark a task completed and shift the downstream pending tasks.
    pub fn complete_task(
        &self,
        task_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionOutcome, PlannerError> {
        let meal_id = self.meal_id_for_task(task_id)?;
        let lock = self.meal_lock(&meal_id)?;
        let _guard = lock.lock().map_err(lock_poisoned)?;

        let mut meal = self.load_meal(&meal_id)?;
        let outcome = apply_completion(&mut meal, task_id, completed_at, self.config.verbosity)?;
        self.meals.put(&meal_id, meal)?;
        Ok(outcome)
    }

    pub fn complete_task_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionOutcome, PlannerError> {
        let completed_at = request.completed_at()?;
        self.complete_task(&request.task_id, completed_at)
    }

    /// Mark a pending task as started. Starting an active task is a no-op.
    pub fn start_task(&self, task_id: &str) -> Result<Task, PlannerError> {
        let meal_id = self.meal_id_for_task(task_id)?;
        let lock = self.meal_lock(&meal_id)?;
        let _guard = lock.lock().map_err(lock_poisoned)?;

        let mut meal = self.load_meal(&meal_id)?;
        let task = meal
            .timeline
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| PlannerError::task_not_found(task_id))?;
        match task.status {
            TaskStatus::Completed => {
                return Err(PlannerError::validation(format!(
                    "Task {} is already completed",
                    task_id
                )))
            }
            TaskStatus::Active => return Ok(task.clone()),
            TaskStatus::Pending => task.status = TaskStatus::Active,
        }
        let started = task.clone();
        meal.refresh_status();
        self.meals.put(&meal_id, meal)?;

        log_changes!(self.config.verbosity, "Started task {}", task_id);
        Ok(started)
    }

    /// Running and upcoming tasks of a meal at `now`.
    pub fn current_tasks(
        &self,
        meal_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CurrentTasks, PlannerError> {
        let meal = self.load_meal(meal_id)?;
        Ok(current_tasks(&meal.timeline, now, self.config.upcoming_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepType;
    use chrono::{TimeDelta, TimeZone};
    use std::thread;

    fn t(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
    }

    const DINNER: &str = r#"{
        "recipes": [
            {"name": "Roast Potatoes", "servings": 4, "priority": "low",
             "steps": [
                {"instruction": "Peel and cut", "duration": 15, "type": "prep"},
                {"instruction": "Roast", "duration": 40, "type": "cook", "equipment": ["oven-1"]}
             ]},
            {"name": "Schnitzel", "servings": 4, "priority": "high",
             "steps": [
                {"instruction": "Bread cutlets", "duration": 10, "type": "prep"},
                {"instruction": "Fry", "duration": 15, "type": "cook", "equipment": ["stovetop-1"]}
             ]},
            {"name": "Apple Crumble", "servings": 4, "priority": "medium",
             "steps": [
                {"instruction": "Assemble", "duration": 10, "type": "prep"},
                {"instruction": "Bake", "duration": 30, "type": "cook", "equipment": ["oven-1"]},
                {"instruction": "Cool", "duration": 10, "type": "rest"}
             ]}
        ],
        "diners": 4,
        "targetTime": "2025-06-01T19:00:00Z",
        "equipment": {"oven": 1, "stovetop": 1}
    }"#;

    fn planner() -> MealPlanner {
        MealPlanner::in_memory(PlannerConfig::default()).unwrap()
    }

    #[test]
    fn test_create_meal_end_to_end() {
        let json = r#"{
            "recipes": [{"name": "Lasagna", "servings": 4, "priority": "medium",
                         "steps": [
                            {"instruction": "Layer", "duration": 10, "type": "prep"},
                            {"instruction": "Bake", "duration": 20, "type": "cook", "equipment": ["oven-1"]}
                         ]}],
            "diners": 4,
            "targetTime": "2025-06-01T18:00:00Z",
            "equipment": {"oven": 1}
        }"#;
        let planner = planner();
        let meal = planner.create_meal_json(json).unwrap();

        assert_eq!(meal.status, MealStatus::Pending);
        assert_eq!(meal.timeline.len(), 2);
        assert_eq!(meal.timeline[0].step_type, StepType::Prep);
        assert_eq!(
            (meal.timeline[0].start_time, meal.timeline[0].end_time),
            (t(17, 30), t(17, 40))
        );
        assert_eq!(
            (meal.timeline[1].start_time, meal.timeline[1].end_time),
            (t(17, 40), t(18, 0))
        );
        assert_eq!(planner.meal(&meal.id).unwrap(), meal);
    }

    #[test]
    fn test_generated_timeline_properties() {
        let planner = planner();
        let meal = planner.create_meal_json(DINNER).unwrap();

        for task in &meal.timeline {
            assert_eq!(
                task.end_time - task.start_time,
                TimeDelta::minutes(i64::from(task.duration))
            );
        }
        for (i, a) in meal.timeline.iter().enumerate() {
            for b in meal.timeline.iter().skip(i + 1) {
                let shares = a.equipment.iter().any(|e| b.equipment.contains(e));
                if shares {
                    assert!(
                        a.end_time <= b.start_time || b.end_time <= a.start_time,
                        "{} and {} overlap",
                        a.instruction,
                        b.instruction
                    );
                }
            }
        }
        let last_end = |name: &str| {
            meal.timeline
                .iter()
                .filter(|t| t.recipe_name == name)
                .map(|t| t.end_time)
                .max()
                .unwrap()
        };
        assert_eq!(last_end("Schnitzel"), t(19, 0));
        assert!(last_end("Apple Crumble") <= t(18, 55));
        assert!(last_end("Roast Potatoes") <= t(18, 50));
    }

    #[test]
    fn test_invalid_request_stores_nothing() {
        let meals: InMemoryStore<Meal> = InMemoryStore::new();
        let index: InMemoryStore<String> = InMemoryStore::new();
        let planner = MealPlanner::new(meals, index, PlannerConfig::default()).unwrap();
        let err = planner
            .create_meal_json(r#"{"recipes": [], "diners": 2}"#)
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert!(planner.meals.is_empty().unwrap());
        assert!(planner.task_index.is_empty().unwrap());
    }

    #[test]
    fn test_huge_step_durations_are_rejected_not_scheduled() {
        let steps: Vec<String> = (0..40)
            .map(|i| {
                format!(
                    r#"{{"instruction": "Step {}", "duration": 4000000000, "type": "cook"}}"#,
                    i
                )
            })
            .collect();
        let json = format!(
            r#"{{"recipes": [{{"name": "Endless", "servings": 2, "steps": [{}]}}],
                "diners": 2, "targetTime": "2025-06-01T18:00:00Z", "equipment": {{}}}}"#,
            steps.join(", ")
        );
        let planner = planner();
        let err = planner.create_meal_json(&json).unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert!(planner.meals.is_empty().unwrap());
    }

    #[test]
    fn test_timeline_progress_and_status() {
        let planner = planner();
        let meal = planner.create_meal_json(DINNER).unwrap();
        let first = meal.timeline[0].clone();

        planner.complete_task(&first.id, first.end_time).unwrap();
        let snapshot = planner.timeline(&meal.id).unwrap();

        assert_eq!(snapshot.status, MealStatus::Active);
        assert_eq!(snapshot.progress.completed_count, 1);
        assert_eq!(snapshot.progress.total_count, 7);
        assert_eq!(snapshot.progress.percentage, 14);
    }

    #[test]
    fn test_complete_all_tasks() {
        let planner = planner();
        let meal = planner.create_meal_json(DINNER).unwrap();
        for task in &meal.timeline {
            let current = planner.meal(&meal.id).unwrap();
            let scheduled_end = current.task(&task.id).unwrap().end_time;
            planner.complete_task(&task.id, scheduled_end).unwrap();
        }
        let snapshot = planner.timeline(&meal.id).unwrap();
        assert_eq!(snapshot.status, MealStatus::Completed);
        assert_eq!(snapshot.progress.percentage, 100);
    }

    #[test]
    fn test_late_completion_shifts_later_tasks() {
        let planner = planner();
        let meal = planner.create_meal_json(DINNER).unwrap();
        let first = meal.timeline[0].clone();

        let outcome = planner
            .complete_task(&first.id, first.end_time + TimeDelta::minutes(5))
            .unwrap();
        let updated = planner.meal(&meal.id).unwrap();

        assert!(!outcome.adjustments.is_empty());
        for adj in &outcome.adjustments {
            assert_eq!(adj.new_start - adj.old_start, TimeDelta::minutes(5));
            assert_eq!(updated.task(&adj.task_id).unwrap().start_time, adj.new_start);
        }
    }

    #[test]
    fn test_unknown_ids() {
        let planner = planner();
        assert_eq!(planner.timeline("nope").unwrap_err().code(), "NOT_FOUND");
        assert_eq!(
            planner.complete_task("nope", t(18, 0)).unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(planner.start_task("nope").unwrap_err().code(), "NOT_FOUND");
        assert_eq!(
            planner.current_tasks("nope", t(18, 0)).unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_completion_request_bad_timestamp() {
        let planner = planner();
        let meal = planner.create_meal_json(DINNER).unwrap();
        let request = CompletionRequest {
            task_id: meal.timeline[0].id.clone(),
            completed_at: "half past six".to_string(),
        };
        assert_eq!(
            planner.complete_task_request(&request).unwrap_err().code(),
            "VALIDATION"
        );
        assert_eq!(planner.meal(&meal.id).unwrap(), meal);
    }

    #[test]
    fn test_start_task() {
        let planner = planner();
        let meal = planner.create_meal_json(DINNER).unwrap();
        let first = &meal.timeline[0];

        let started = planner.start_task(&first.id).unwrap();
        assert_eq!(started.status, TaskStatus::Active);
        assert_eq!(planner.meal(&meal.id).unwrap().status, MealStatus::Active);

        // Starting again is harmless
        assert_eq!(
            planner.start_task(&first.id).unwrap().status,
            TaskStatus::Active
        );

        planner.complete_task(&first.id, first.end_time).unwrap();
        assert_eq!(planner.start_task(&first.id).unwrap_err().code(), "VALIDATION");
    }

    #[test]
    fn test_current_tasks_view() {
        let planner = planner();
        let meal = planner.create_meal_json(DINNER).unwrap();
        let earliest = meal.timeline[0].start_time;

        let view = planner
            .current_tasks(&meal.id, earliest - TimeDelta::minutes(1))
            .unwrap();
        assert!(view.current.is_none());
        assert_eq!(view.upcoming.len(), 3);
        assert_eq!(view.minutes_until_next, Some(1));
    }

    #[test]
    fn test_concurrent_completions_are_serialized() {
        let planner = Arc::new(planner());
        let meal = planner.create_meal_json(DINNER).unwrap();

        let handles: Vec<_> = meal
            .timeline
            .iter()
            .map(|task| {
                let planner = Arc::clone(&planner);
                let task_id = task.id.clone();
                let at = task.end_time;
                thread::spawn(move || planner.complete_task(&task_id, at))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let final_meal = planner.meal(&meal.id).unwrap();
        assert!(final_meal.timeline.iter().all(|t| t.is_completed()));
        assert_eq!(final_meal.status, MealStatus::Completed);
    }
}
