//! `statewalker explore` handler.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, warn};

use statewalker_action_gate::{SafetyPolicy, ScopeRule};
use statewalker_explorer::{
    ExplorationController, ExplorationSession, RoundRobinOracle,
};
use statewalker_session_store::SessionStore;

use crate::cli::commands::{ExploreArgs, ResumeArgs};
use crate::config::Config;
use crate::scripted::{ScriptedDriver, SiteScript};

fn parse_policy(raw: &str) -> Result<SafetyPolicy> {
    match raw {
        "read_only" => Ok(SafetyPolicy::ReadOnly),
        "exploration_only" => Ok(SafetyPolicy::ExplorationOnly),
        "full_testing" => Ok(SafetyPolicy::FullTesting),
        other => bail!("unknown safety policy `{other}`"),
    }
}

pub async fn resume(args: ResumeArgs, config: Config) -> Result<()> {
    run(
        ExploreArgs {
            script: args.script,
            snapshot: Some(args.snapshot),
            resume: true,
            policy: None,
            max_actions: None,
            max_depth: None,
            pin_scope: false,
            json: args.json,
        },
        config,
    )
    .await
}

pub async fn run(args: ExploreArgs, config: Config) -> Result<()> {
    let script = SiteScript::from_file(&args.script)?;
    let root_url = script.root_url().to_string();

    let mut explorer_config = config.explorer.clone();
    if let Some(policy) = &args.policy {
        explorer_config.policy = parse_policy(policy)?;
    }
    if let Some(budget) = args.max_actions {
        explorer_config.max_total_actions = budget;
    }
    if let Some(depth) = args.max_depth {
        explorer_config.max_depth = depth;
    }
    if args.pin_scope {
        explorer_config.scope = ScopeRule::pin(&root_url);
        if explorer_config.scope.is_none() {
            bail!("cannot pin scope: root url `{root_url}` does not parse");
        }
    }

    let store = args
        .snapshot
        .or_else(|| config.snapshot_path.clone())
        .map(SessionStore::new);

    let session = if args.resume {
        match store.as_ref().and_then(|s| s.load_if_usable()) {
            Some(snapshot) => {
                if snapshot.root_url != root_url {
                    warn!(
                        persisted = %snapshot.root_url,
                        requested = %root_url,
                        "snapshot was taken against a different root, starting fresh"
                    );
                    ExplorationSession::new(root_url, explorer_config.dead_threshold)
                } else {
                    ExplorationSession::resume(snapshot, explorer_config.dead_threshold)
                }
            }
            None => ExplorationSession::new(root_url, explorer_config.dead_threshold),
        }
    } else {
        ExplorationSession::new(root_url, explorer_config.dead_threshold)
    };

    let driver = ScriptedDriver::new(script);
    let mut controller = ExplorationController::new(
        explorer_config,
        session,
        driver.clone(),
        Arc::new(RoundRobinOracle),
        driver.clone(),
    );
    if let Some(store) = store {
        controller = controller.with_store(store);
    }

    let cancel = controller.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, checkpointing and stopping");
            cancel.cancel();
        }
    });

    let report = controller.run().await?;
    if !driver.committed().is_empty() {
        warn!(commits = ?driver.committed(), "destructive commits went through");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}
