//! Flows command - print the flow catalog

use clap::Args;

use crate::domain::{FlowRegistry, FlowSummary};

#[derive(Args, Clone, Debug, Default)]
pub struct FlowsArgs {
    /// Print the full catalog, including JSON schemas, as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: FlowsArgs) -> anyhow::Result<()> {
    let registry = FlowRegistry::builtin()?;
    let summaries = registry.summaries();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print!("{}", render_table(&summaries));
    }

    Ok(())
}

fn render_table(summaries: &[FlowSummary]) -> String {
    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);

    summaries
        .iter()
        .map(|s| format!("{:<width$}  {}\n", s.name, s.description, width = width))
        .collect()
}
