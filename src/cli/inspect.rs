//! `statewalker inspect` handler.

use anyhow::Result;

use statewalker_session_store::SessionStore;

use crate::cli::commands::InspectArgs;

pub fn run(args: InspectArgs) -> Result<()> {
    let store = SessionStore::new(&args.snapshot);
    let snapshot = store.load()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let fully_explored = snapshot
        .graph
        .nodes
        .values()
        .filter(|n| n.fully_explored)
        .count();
    let transitions: usize = snapshot
        .graph
        .nodes
        .values()
        .map(|n| n.transitions.len())
        .sum();
    let dead: usize = snapshot.graph.nodes.values().map(|n| n.dead.len()).sum();

    println!("session:          {}", snapshot.session_id);
    println!("root url:         {}", snapshot.root_url);
    println!(
        "root state:       {}",
        snapshot.root_fingerprint.as_deref().unwrap_or("(none)")
    );
    println!("taken at:         {}", snapshot.taken_at.to_rfc3339());
    println!("steps:            {}", snapshot.step_count);
    println!("actions executed: {}", snapshot.actions_executed);
    println!(
        "states:           {} ({} fully explored)",
        snapshot.graph.nodes.len(),
        fully_explored
    );
    println!("transitions:      {transitions}");
    println!("dead actions:     {dead}");
    Ok(())
}
