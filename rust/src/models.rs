//! Core data types for meals, recipes and scheduled tasks.
//!
//! These are the validated shapes the algorithms work on. Raw request bodies live in
//! `crate::request` and are converted into these types before scheduling starts.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Kind of kitchen equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquipmentType {
    Oven,
    Stovetop,
    PrepSpace,
    Mixer,
    Other,
}

/// One unit of equipment. Each id is scheduled as a single exclusive resource;
/// `capacity` is informational only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    pub capacity: u32,
}

/// Freshness priority of a recipe. Higher priority dishes finish closest to serving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Fixed rank used for the stable priority sort.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Protein,
    Vegetable,
    Grain,
    Dairy,
    Spice,
    #[default]
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub category: IngredientCategory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Prep,
    Cook,
    Rest,
    Serve,
}

/// A single recipe step. Steps run strictly in recipe order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub instruction: String,
    /// Minutes, always > 0
    pub duration: u32,
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Equipment ids needed for the whole step
    pub equipment: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Step {
    pub fn time_delta(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.duration))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub servings: u32,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub priority: Priority,
}

impl Recipe {
    /// Sum of all step durations in minutes.
    pub fn total_time(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.duration)).sum()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

/// A scheduled instance of one recipe step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub recipe_id: String,
    pub recipe_name: String,
    pub step_id: String,
    pub instruction: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Authoritative duration in minutes; never re-derived from the rounded times
    pub duration: u32,
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub equipment: Vec<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Task ids that must finish before this one starts
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Task {
    /// True if `at` falls inside `[start_time, end_time)`.
    pub fn is_running_at(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at < self.end_time
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

/// Aggregate root of one scheduling run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub timeline: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub target_time: DateTime<Utc>,
    pub diners: u32,
    pub status: MealStatus,
    pub recipes: Vec<Recipe>,
    pub equipment: Vec<Equipment>,
}

impl Meal {
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.timeline.iter().find(|t| t.id == task_id)
    }

    /// Re-derive the meal status after a task changed state.
    ///
    /// `completed` once every task is, otherwise a pending meal becomes `active`.
    pub fn refresh_status(&mut self) {
        if self.timeline.iter().all(Task::is_completed) {
            self.status = MealStatus::Completed;
        } else if self.status == MealStatus::Pending {
            self.status = MealStatus::Active;
        }
    }
}
