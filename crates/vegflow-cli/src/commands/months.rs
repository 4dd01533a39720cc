//! Months command implementation

use super::CommandContext;
use crate::cli::MonthsArgs;
use crate::output_types::MonthRow;
use anyhow::Result;
use chrono::Local;
use vegflow_core::calendar::{monthly_ranges, YearPolicy};

pub fn execute(args: MonthsArgs, ctx: &CommandContext) -> Result<()> {
    let policy = YearPolicy::as_of(ctx.config.earliest_year.value, Local::now().date_naive());
    let ranges = monthly_ranges(args.start_year, args.end_year, &policy)?;

    ctx.output.section(format!(
        "{} months from {} to {}",
        ranges.len(),
        args.start_year,
        args.end_year
    ));
    ctx.output.table(ranges.iter().map(MonthRow::from).collect())
}
