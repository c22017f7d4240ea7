//! Request bodies at the service boundary and their validation.
//!
//! Raw shapes are deserialized leniently (camelCase or snake_case keys, optional
//! fields) and then checked in one pass that reports every problem found. Only
//! validated, fully typed values reach the scheduler.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::PlannerError;
use crate::models::{
    Equipment, EquipmentType, Ingredient, IngredientCategory, Priority, Recipe, Step, StepType,
};

/// Longest accepted step, one week.
pub const MAX_STEP_MINUTES: u32 = 7 * 24 * 60;
/// Largest accepted diner count.
pub const MAX_DINERS: u32 = 1000;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn parse_json<'a, T: Deserialize<'a>>(json: &'a str) -> Result<T, PlannerError> {
    serde_json::from_str(json)
        .map_err(|e| PlannerError::validation(format!("Malformed request: {}", e)))
}

/// Parse an RFC 3339 / ISO 8601 timestamp into UTC.
pub fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, PlannerError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            PlannerError::validation(format!(
                "{} must be a valid ISO 8601 timestamp, got {:?}",
                field, value
            ))
        })
}

/// Equipment counts per kind, expanded to individually scheduled units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentCounts {
    #[serde(default)]
    pub oven: u32,
    #[serde(default)]
    pub stovetop: u32,
    #[serde(default, alias = "prep_space")]
    pub prep_space: u32,
    #[serde(default)]
    pub mixer: u32,
}

impl EquipmentCounts {
    /// `oven: 2` becomes `oven-1`, `oven-2`, and so on. Every unit has capacity 1.
    pub fn expand(&self) -> Vec<Equipment> {
        let kinds = [
            (self.oven, "oven", "Oven", EquipmentType::Oven),
            (self.stovetop, "stovetop", "Stovetop", EquipmentType::Stovetop),
            (self.prep_space, "prep-space", "Prep Space", EquipmentType::PrepSpace),
            (self.mixer, "mixer", "Mixer", EquipmentType::Mixer),
        ];
        kinds
            .iter()
            .flat_map(|&(count, prefix, name, equipment_type)| {
                (1..=count).map(move |n| Equipment {
                    id: format!("{}-{}", prefix, n),
                    name: name.to_string(),
                    equipment_type,
                    capacity: 1,
                })
            })
            .collect()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientInput {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: IngredientCategory,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub instruction: String,
    pub duration: Option<u32>,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub temperature: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    pub name: Option<String>,
    pub servings: Option<u32>,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pub steps: Vec<StepInput>,
}

/// Body of "create schedule".
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRequest {
    #[serde(default)]
    pub recipes: Vec<RecipeInput>,
    pub diners: Option<u32>,
    #[serde(alias = "target_time")]
    pub target_time: Option<String>,
    #[serde(alias = "capacity")]
    pub equipment: Option<EquipmentCounts>,
}

/// A meal request that passed validation.
#[derive(Clone, Debug)]
pub struct ValidatedMeal {
    pub recipes: Vec<Recipe>,
    pub diners: u32,
    pub target_time: DateTime<Utc>,
    pub equipment: Vec<Equipment>,
}

impl MealRequest {
    pub fn from_json(json: &str) -> Result<Self, PlannerError> {
        parse_json(json)
    }

    /// Check every field and build the typed recipes and inventory.
    pub fn validate(self) -> Result<ValidatedMeal, PlannerError> {
        let mut errors: Vec<String> = Vec::new();

        if self.recipes.is_empty() {
            errors.push("At least one recipe is required".to_string());
        }

        let diners = match self.diners {
            Some(d) if (1..=MAX_DINERS).contains(&d) => d,
            Some(0) => {
                errors.push("diners must be at least 1".to_string());
                0
            }
            Some(d) => {
                errors.push(format!("diners must be at most {}, got {}", MAX_DINERS, d));
                0
            }
            None => {
                errors.push("diners is required".to_string());
                0
            }
        };

        let target_time = match self.target_time.as_deref() {
            Some(raw) => match parse_timestamp(raw, "targetTime") {
                Ok(ts) => Some(ts),
                Err(e) => {
                    errors.push(validation_message(e));
                    None
                }
            },
            None => {
                errors.push("targetTime is required".to_string());
                None
            }
        };

        let equipment = match &self.equipment {
            Some(counts) => counts.expand(),
            None => {
                errors.push("equipment counts are required".to_string());
                Vec::new()
            }
        };
        let recipes: Vec<Recipe> = {
            let known: FxHashSet<&str> = equipment.iter().map(|e| e.id.as_str()).collect();
            self.recipes
                .into_iter()
                .enumerate()
                .map(|(idx, input)| validate_recipe(idx, input, &known, &mut errors))
                .collect()
        };

        match target_time {
            Some(target_time) if errors.is_empty() => Ok(ValidatedMeal {
                recipes,
                diners,
                target_time,
                equipment,
            }),
            _ => Err(PlannerError::Validation(errors.join("; "))),
        }
    }
}

fn validation_message(err: PlannerError) -> String {
    match err {
        PlannerError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

fn validate_recipe(
    idx: usize,
    input: RecipeInput,
    known_equipment: &FxHashSet<&str>,
    errors: &mut Vec<String>,
) -> Recipe {
    let name = match input.name.map(|n| n.trim().to_string()) {
        Some(n) if !n.is_empty() => n,
        _ => {
            errors.push(format!("recipes[{}]: name is required", idx));
            format!("Recipe {}", idx + 1)
        }
    };

    let servings = match input.servings {
        Some(s) if s >= 1 => s,
        _ => {
            errors.push(format!("recipe '{}': servings must be at least 1", name));
            0
        }
    };

    if input.steps.is_empty() {
        errors.push(format!("recipe '{}': at least one step is required", name));
    }

    let ingredients = input
        .ingredients
        .into_iter()
        .map(|ing| {
            if !ing.amount.is_finite() || ing.amount < 0.0 {
                errors.push(format!(
                    "recipe '{}': ingredient '{}' has invalid amount {}",
                    name, ing.name, ing.amount
                ));
            }
            Ingredient {
                id: new_id(),
                name: ing.name,
                amount: ing.amount,
                unit: ing.unit,
                category: ing.category,
            }
        })
        .collect();

    let steps = input
        .steps
        .into_iter()
        .enumerate()
        .map(|(step_idx, step)| {
            let duration = match step.duration {
                Some(d) if (1..=MAX_STEP_MINUTES).contains(&d) => d,
                Some(d) if d > MAX_STEP_MINUTES => {
                    errors.push(format!(
                        "recipe '{}' step {}: duration must be at most {} minutes, got {}",
                        name,
                        step_idx + 1,
                        MAX_STEP_MINUTES,
                        d
                    ));
                    0
                }
                _ => {
                    errors.push(format!(
                        "recipe '{}' step {}: duration must be at least 1 minute",
                        name,
                        step_idx + 1
                    ));
                    0
                }
            };
            let mut equipment: Vec<String> = Vec::with_capacity(step.equipment.len());
            for id in step.equipment {
                let id = id.trim().to_string();
                if !known_equipment.contains(id.as_str()) {
                    errors.push(format!(
                        "recipe '{}' step {}: unknown equipment '{}'",
                        name,
                        step_idx + 1,
                        id
                    ));
                } else if !equipment.contains(&id) {
                    equipment.push(id);
                }
            }
            Step {
                id: new_id(),
                instruction: step.instruction,
                duration,
                step_type: step.step_type,
                equipment,
                temperature: step.temperature,
            }
        })
        .collect();

    Recipe {
        id: new_id(),
        name,
        servings,
        ingredients,
        steps,
        priority: input.priority.unwrap_or_default(),
    }
}

/// Body of "complete task".
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    #[serde(alias = "task_id")]
    pub task_id: String,
    #[serde(alias = "completed_at")]
    pub completed_at: String,
}

impl CompletionRequest {
    pub fn from_json(json: &str) -> Result<Self, PlannerError> {
        parse_json(json)
    }

    pub fn completed_at(&self) -> Result<DateTime<Utc>, PlannerError> {
        parse_timestamp(&self.completed_at, "completedAt")
    }
}
