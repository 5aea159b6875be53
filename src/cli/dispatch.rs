use super::{Cli, Commands, GraphFormat};
use anyhow::{Context, Result, bail};
use planwright::Config;
use planwright::context::resolve;
use planwright::graph::compile_plan;
use planwright::monitor::{DispatchReport, PlanDispatcher};
use planwright::plan::PlanDocument;
use planwright::simulation::Simulation;
use std::path::Path;
use tracing::info;

pub fn render_graph(path: &Path, format: GraphFormat) -> Result<String> {
    let document = PlanDocument::load(path)?;
    let plan = document.to_plan().context("Failed to build plan")?;
    let graph = compile_plan(&plan).context("Failed to compile plan")?;
    match format {
        GraphFormat::Json => serde_json::to_string_pretty(&graph.summary())
            .context("Failed to serialize graph summary"),
        GraphFormat::Dot => Ok(graph.to_dot()),
    }
}

/// Compiles, resolves against a simulated world and dispatches the plan.
pub async fn run_plan(path: &Path, config: &Config) -> Result<(DispatchReport, Vec<String>)> {
    let document = PlanDocument::load(path)?;
    let plan = document.to_plan().context("Failed to build plan")?;
    let simulation = Simulation::new(&document)?;
    let graph = compile_plan(&plan).context("Failed to compile plan")?;
    let graph = resolve(graph, simulation.context()).context("Failed to bind plan")?;
    info!(plan = %path.display(), nodes = graph.node_count(), "run.resolved");

    let mut dispatcher = PlanDispatcher::new(config.execution_options())
        .with_rules(config.replan.rules.clone(), config.replan.max_attempts);
    let report = dispatcher.execute_plan(plan, graph).await?;
    Ok((report, simulation.snapshot()))
}

fn print_report(report: &DispatchReport, state: &[String]) {
    for record in &report.results {
        let result = &record.result;
        println!(
            "{:<32} pre={} action={} post={}",
            record.node_name,
            result.precondition_status,
            result.action_status,
            result.postcondition_status
        );
    }
    println!("status: {}", report.status);
    if !state.is_empty() {
        println!("final state:");
        for line in state {
            println!("  {line}");
        }
    }
}

pub async fn dispatch(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Commands::Graph { plan, format } => {
            println!("{}", render_graph(&plan, format)?);
            Ok(())
        }
        Commands::Run {
            plan,
            dry_run,
            verbose,
            parallel,
            json,
        } => {
            config.execution.dry_run |= dry_run;
            config.execution.verbose |= verbose;
            config.execution.parallel_siblings |= parallel;

            let (report, state) = run_plan(&plan, &config).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialize report")?
                );
            } else {
                print_report(&report, &state);
            }
            if !report.succeeded() {
                match &report.failure {
                    Some(failure) => bail!("plan did not finish: {failure}"),
                    None => bail!("plan did not finish ({})", report.status),
                }
            }
            Ok(())
        }
    }
}
