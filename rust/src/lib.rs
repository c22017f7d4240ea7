//! Backward timeline scheduling for multi-recipe meals.
//!
//! Given recipes, a diner count, a target serving time and a kitchen's equipment, this
//! crate produces a conflict-free task timeline that finishes every dish close to the
//! target, with the freshest dishes finishing last. The timeline is then kept current
//! as tasks are completed early or late.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod progress;
pub mod request;
pub mod reschedule;
pub mod scaling;
pub mod service;
pub mod store;
pub mod timeline;

#[cfg(feature = "python")]
mod python;

pub use config::PlannerConfig;
pub use error::{ErrorKind, PlannerError};
pub use models::{
    Equipment, EquipmentType, Ingredient, IngredientCategory, Meal, MealStatus, Priority, Recipe,
    Step, StepType, Task, TaskStatus,
};
pub use progress::{current_tasks, CurrentTasks, Progress, TimelineSnapshot};
pub use request::{CompletionRequest, EquipmentCounts, MealRequest, ValidatedMeal};
pub use reschedule::{apply_completion, AdjustmentReason, CompletionOutcome, TaskAdjustment};
pub use scaling::{scale_recipe, ScalingError};
pub use service::MealPlanner;
pub use store::{InMemoryStore, Store, StoreError};
pub use timeline::{generate_timeline, EquipmentLedger, GeneratedTimeline, LedgerError};
