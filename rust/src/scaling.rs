//! Recipe scaling to a diner count.
//!
//! Ingredient amounts scale linearly. Only `prep` step durations scale (rounded up to
//! whole minutes); cook, rest and serve times are treated as physical constants.

use crate::error::PlannerError;
use crate::models::{Recipe, StepType};

/// Error types for recipe scaling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalingError {
    /// Recipe declares zero servings, so no scale factor exists.
    ZeroServings { recipe: String },
    /// Target diner count is zero.
    ZeroTarget,
    /// Scaled prep duration does not fit in a step.
    DurationOverflow { recipe: String, minutes: u64 },
}

impl std::fmt::Display for ScalingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalingError::ZeroServings { recipe } => {
                write!(f, "Recipe '{}' must serve at least one person", recipe)
            }
            ScalingError::ZeroTarget => write!(f, "Diner count must be at least 1"),
            ScalingError::DurationOverflow { recipe, minutes } => write!(
                f,
                "Recipe '{}' prep step would take {} minutes after scaling",
                recipe, minutes
            ),
        }
    }
}

impl std::error::Error for ScalingError {}

impl From<ScalingError> for PlannerError {
    fn from(err: ScalingError) -> Self {
        PlannerError::Validation(err.to_string())
    }
}

/// Return a copy of `recipe` scaled to `target_servings`.
///
/// The input recipe is left untouched.
pub fn scale_recipe(recipe: &Recipe, target_servings: u32) -> Result<Recipe, ScalingError> {
    if recipe.servings == 0 {
        return Err(ScalingError::ZeroServings {
            recipe: recipe.name.clone(),
        });
    }
    if target_servings == 0 {
        return Err(ScalingError::ZeroTarget);
    }

    let factor = f64::from(target_servings) / f64::from(recipe.servings);
    let mut scaled = recipe.clone();
    scaled.servings = target_servings;

    for ingredient in &mut scaled.ingredients {
        ingredient.amount *= factor;
    }
    for step in &mut scaled.steps {
        if step.step_type == StepType::Prep {
            // ceil(duration * target / servings) in integers to avoid float drift
            let scaled_minutes = (u64::from(step.duration) * u64::from(target_servings))
                .div_ceil(u64::from(recipe.servings));
            step.duration = u32::try_from(scaled_minutes).map_err(|_| {
                ScalingError::DurationOverflow {
                    recipe: recipe.name.clone(),
                    minutes: scaled_minutes,
                }
            })?;
        }
    }

    Ok(scaled)
}
