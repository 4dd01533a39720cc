//! Config command implementation

use super::CommandContext;
use crate::output_types::ConfigRow;
use anyhow::Result;

pub fn execute(ctx: &CommandContext) -> Result<()> {
    let mut rows: Vec<ConfigRow> = ctx
        .config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    ctx.output.section("Configuration");
    ctx.output.table(rows)
}
