use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use rebalance_assignor::assignor::Assignor;
use rebalance_assignor::clock::SystemClock;
use rebalance_assignor::config::AssignorConfig;
use rebalance_assignor::coordinator::{ConfigSnapshot, InMemoryCoordinator};
use rebalance_assignor::ids::{ConnectorId, WorkerId};
use rebalance_assignor::member::MemberMetadata;

/// Run one rebalance round against a JSON fixture and print the resulting assignments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a fixture describing the configured connectors/tasks and the current workforce.
    #[arg(long)]
    fixture: PathBuf,

    /// Override the grace-window delay, in milliseconds.
    #[arg(long, default_value_t = 300_000)]
    max_delay_millis: u64,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    config_offset: u64,
    /// connector id -> number of configured tasks.
    connectors: BTreeMap<String, u32>,
    /// worker ids currently present in the group.
    workers: Vec<String>,
    leader_id: String,
    #[serde(default = "default_leader_url")]
    leader_url: String,
}

fn default_leader_url() -> String {
    "http://localhost:8083".to_string()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let contents = std::fs::read_to_string(&args.fixture)?;
    let fixture: Fixture = serde_json::from_str(&contents)?;

    let tasks_by_connector = fixture
        .connectors
        .iter()
        .map(|(connector, count)| (ConnectorId::new(connector.clone()), (0..*count).collect()))
        .collect();
    let snapshot = ConfigSnapshot::new(fixture.config_offset, tasks_by_connector);

    let leader_id = WorkerId::new(fixture.leader_id.clone());
    let mut coordinator = InMemoryCoordinator::new(leader_id.clone(), snapshot);
    coordinator.set_generation_id(1);
    coordinator.set_last_completed_generation_id(1);

    let members: BTreeMap<WorkerId, MemberMetadata> = fixture
        .workers
        .iter()
        .map(|w| {
            (
                WorkerId::new(w.clone()),
                MemberMetadata::new(format!("http://{w}"), fixture.config_offset, None),
            )
        })
        .collect();

    let mut assignor = Assignor::new(AssignorConfig {
        max_delay_millis: args.max_delay_millis,
    });
    let clock = SystemClock;

    let assignments = assignor.perform_assignment(
        &leader_id,
        &fixture.leader_url,
        &members,
        &mut coordinator,
        &clock,
    )?;

    let rendered: BTreeMap<String, serde_json::Value> = assignments
        .iter()
        .map(|(worker, assignment)| {
            (
                worker.to_string(),
                serde_json::json!({
                    "error": format!("{:?}", assignment.error),
                    "connectorsToStart": assignment.connectors_to_start.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "tasksToStart": assignment.tasks_to_start.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "connectorsToStop": assignment.connectors_to_stop.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "tasksToStop": assignment.tasks_to_stop.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "delayMillis": assignment.delay_millis,
                }),
            )
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}
