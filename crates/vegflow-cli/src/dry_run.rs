use crate::output::OutputWriter;
use crate::output_types::DryRunOutput;
use serde::Serialize;
use vegflow_core::acquisition::AcquisitionPlan;

/// Represents a planned action in dry-run mode
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    pub action_type: ActionType,
    pub description: String,
    pub details: Vec<String>,
}

/// Types of actions that can be planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CreateDirectory,
    CheckScenes,
    FetchComposites,
    WriteFile,
}

impl PlannedAction {
    /// Create a new planned action
    pub fn new(action_type: ActionType, description: impl Into<String>) -> Self {
        Self {
            action_type,
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// Add a detail to the planned action
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }
}

/// Actions a download of `plan` would take
pub fn plan_actions(plan: &AcquisitionPlan) -> Vec<PlannedAction> {
    let mut actions = vec![PlannedAction::new(
        ActionType::CreateDirectory,
        format!("Create {}", plan.output_dir.display()),
    )];

    if plan.tiles.is_empty() {
        return actions;
    }

    let (Some(first), Some(last)) = (plan.months.first(), plan.months.last()) else {
        return actions;
    };

    actions.push(
        PlannedAction::new(
            ActionType::CheckScenes,
            format!("Check scene availability for {} months", plan.months.len()),
        )
        .with_detail(format!("From {} to {}", first.start, last.end)),
    );

    actions.push(
        PlannedAction::new(
            ActionType::FetchComposites,
            format!(
                "Check validity and fetch up to {} composites of {}x{} px",
                plan.job_count(),
                plan.dimensions,
                plan.dimensions
            ),
        )
        .with_detail(format!("{} tiles x {} months", plan.tiles.len(), plan.months.len()))
        .with_detail(format!("At most {} concurrent requests", plan.max_workers)),
    );

    if let Some(tile) = plan.tiles.first() {
        actions.push(
            PlannedAction::new(
                ActionType::WriteFile,
                format!("Write one GeoTIFF per valid tile and month, e.g. {}", plan.output_path(tile, first).display()),
            ),
        );
    }

    actions
}

/// Display planned actions in dry-run mode
pub fn display_plan(output: &OutputWriter, plan: &AcquisitionPlan) -> anyhow::Result<()> {
    let actions = plan_actions(plan);

    if output.is_json() {
        return output.result(DryRunOutput { dry_run: true, plan: plan.summary(), planned_actions: actions });
    }

    output.section("Planned Actions (Dry Run)");
    for (i, action) in actions.iter().enumerate() {
        output.info(format!("{}. {:?}: {}", i + 1, action.action_type, action.description));
        for detail in &action.details {
            output.info(format!("   - {}", detail));
        }
    }
    output.info("No changes were made. Run without --dry-run to execute these actions.");
    Ok(())
}
