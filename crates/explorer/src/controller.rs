//! Exploration controller: the per-step state machine and its
//! recursion/backtracking discipline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_recursion::async_recursion;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use statewalker_action_gate::ActionClassifier;
use statewalker_core_types::{NodeContext, StateFingerprint, TransitionKind};
use statewalker_fingerprint::Fingerprinter;
use statewalker_session_store::SessionStore;
use statewalker_state_graph::{coarse_locator, GraphError, NodeView};

use crate::config::ExplorerConfig;
use crate::errors::{ExploreError, PortError};
use crate::loop_detect::LoopDetector;
use crate::ports::{ActionExecutor, DecisionOracle, Perception};
use crate::report::{ExplorationOutcome, ExplorationReport};
use crate::session::ExplorationSession;

/// Why one branch of the recursion stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchOutcome {
    /// Every action in the node is visited or dead.
    Exhausted,
    /// The node sits at the depth cap and is not expanded.
    DepthCapped,
    /// The coarse locator passed the saturation threshold.
    Saturated,
    /// The same progress transition repeated within the loop window.
    LoopDetected,
    /// A global budget ran out mid-branch.
    BudgetExhausted,
    /// External cancellation.
    Cancelled,
    /// Restoration failed; context was reset to root and the branch given up.
    Abandoned,
}

/// Drives one live-system session through the exploration step machine.
///
/// The controller exclusively owns the session and the only mutable handle
/// to the graph; collaborators receive read-only views and report outcomes.
pub struct ExplorationController {
    config: ExplorerConfig,
    session: ExplorationSession,
    classifier: ActionClassifier,
    fingerprinter: Fingerprinter,
    perception: Arc<dyn Perception>,
    oracle: Arc<dyn DecisionOracle>,
    executor: Arc<dyn ActionExecutor>,
    store: Option<SessionStore>,
    cancel: CancellationToken,
    loop_detector: LoopDetector,
    blocked_actions: u64,
    abandoned_branches: u64,
    started: Instant,
}

impl ExplorationController {
    pub fn new(
        config: ExplorerConfig,
        session: ExplorationSession,
        perception: Arc<dyn Perception>,
        oracle: Arc<dyn DecisionOracle>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        let loop_detector = LoopDetector::new(config.loop_window, config.loop_threshold);
        Self {
            config,
            session,
            classifier: ActionClassifier::new(),
            fingerprinter: Fingerprinter::new(),
            perception,
            oracle,
            executor,
            store: None,
            cancel: CancellationToken::new(),
            loop_detector,
            blocked_actions: 0,
            abandoned_branches: 0,
            started: Instant::now(),
        }
    }

    /// Attach a snapshot store; the session is checkpointed after every
    /// recorded transition.
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Token callers may use to cancel the run from outside.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn session(&self) -> &ExplorationSession {
        &self.session
    }

    /// Run until the root is exhausted or a budget/cancellation ends the
    /// session. Per-action failures never surface here; only a lost live
    /// handle returns `Err`, after the last snapshot has been written.
    pub async fn run(mut self) -> Result<ExplorationReport, ExploreError> {
        self.started = Instant::now();
        info!(
            session = %self.session.id,
            root = %self.session.root_url,
            policy = self.config.policy.name(),
            "starting exploration"
        );

        let (outcome, message) = loop {
            let root_view = match self.observe_and_resolve(None).await {
                Ok(view) => view,
                Err(err) if err.is_fatal() => {
                    self.checkpoint();
                    return Err(ExploreError::Fatal(err.to_string()));
                }
                Err(err) => {
                    warn!(%err, "root context is unobservable");
                    break (
                        ExplorationOutcome::RootUnreachable,
                        format!("root context unobservable: {err}"),
                    );
                }
            };
            if self.session.root_fingerprint.is_none() {
                self.session.root_fingerprint = Some(root_view.fingerprint.clone());
            }

            let root_ctx = root_view.context.clone();
            let branch = self
                .explore_node(root_view.fingerprint.clone(), root_ctx, 0)
                .await?;
            match branch {
                BranchOutcome::Abandoned => {
                    // Context was already reset to root; take a fresh
                    // observation and keep going.
                    continue;
                }
                BranchOutcome::Cancelled => {
                    break (
                        ExplorationOutcome::Cancelled,
                        "cancelled by external signal".to_string(),
                    )
                }
                BranchOutcome::BudgetExhausted | BranchOutcome::DepthCapped => {
                    break (
                        ExplorationOutcome::BudgetExhausted,
                        "global budget exhausted".to_string(),
                    )
                }
                BranchOutcome::Saturated | BranchOutcome::LoopDetected => {
                    break (
                        ExplorationOutcome::BudgetExhausted,
                        "root context saturated".to_string(),
                    )
                }
                BranchOutcome::Exhausted => {
                    break (
                        ExplorationOutcome::RootExhausted,
                        "root node fully explored".to_string(),
                    )
                }
            }
        };

        self.checkpoint();
        let report = self.finish(outcome, message);
        info!(session = %report.session_id, "{}", report.summary());
        Ok(report)
    }

    /// One node of the recursion. The saturation guard fires on entry so a
    /// cycling branch is cut before it executes anything further.
    #[async_recursion]
    async fn explore_node(
        &mut self,
        fingerprint: StateFingerprint,
        context: NodeContext,
        depth: u32,
    ) -> Result<BranchOutcome, ExploreError> {
        let locator = coarse_locator(&context.url);
        let visits = self.session.graph.increment_saturation(&locator);
        if visits > self.config.saturation_threshold {
            info!(
                state = fingerprint.short(),
                locator = %locator,
                visits,
                "saturation guard tripped, backtracking"
            );
            return Ok(BranchOutcome::Saturated);
        }

        loop {
            // CHECK_TERMINATION
            if self.cancel.is_cancelled() {
                self.checkpoint();
                return Ok(BranchOutcome::Cancelled);
            }
            if self.budget_exhausted() {
                return Ok(BranchOutcome::BudgetExhausted);
            }
            if depth >= self.config.max_depth {
                debug!(state = fingerprint.short(), depth, "depth cap reached");
                return Ok(BranchOutcome::DepthCapped);
            }
            if self.session.graph.is_fully_explored(&fingerprint) {
                return Ok(BranchOutcome::Exhausted);
            }

            // SELECT_ACTION
            let unvisited = self.session.graph.unvisited_actions(&fingerprint)?;
            let view = self
                .session
                .graph
                .node_view(&fingerprint)
                .ok_or_else(|| GraphError::UnknownNode(fingerprint.to_string()))?;
            let Some(action) = self.oracle.select_next(&view, &unvisited).await else {
                debug!(state = fingerprint.short(), "no selectable actions remain");
                return Ok(BranchOutcome::Exhausted);
            };
            self.session.step_count += 1;

            // SAFETY_CHECK: a disallowed action is decided-never-to-run and
            // recorded dead without executing.
            let decision = self.classifier.evaluate(&action, self.config.policy);
            let scope_block = self
                .config
                .scope
                .as_ref()
                .and_then(|scope| scope.check(&action, &context.url).err());
            if !decision.allowed || scope_block.is_some() {
                let reason = scope_block.unwrap_or_else(|| decision.reason.clone());
                info!(
                    state = fingerprint.short(),
                    action = %action.id,
                    risk = decision.risk.name(),
                    %reason,
                    "action gated off"
                );
                self.session.graph.mark_dead(&fingerprint, &action.id)?;
                self.blocked_actions += 1;
                continue;
            }

            // EXECUTE: visited is set first so a crash mid-execution cannot
            // silently retry this action forever.
            self.session.graph.mark_visited(&fingerprint, &action.id)?;
            self.session.actions_executed += 1;
            let result = self
                .executor
                .execute(&action, decision.special_handling)
                .await;

            let transition = match result {
                Ok(transition) => transition,
                Err(err) if err.is_fatal() => {
                    self.checkpoint();
                    return Err(ExploreError::Fatal(err.to_string()));
                }
                Err(err) => {
                    warn!(
                        state = fingerprint.short(),
                        action = %action.id,
                        %err,
                        "action execution failed, continuing"
                    );
                    continue;
                }
            };

            // CLASSIFY_TRANSITION / UPDATE_GRAPH
            match transition {
                TransitionKind::Error { reason } => {
                    warn!(
                        state = fingerprint.short(),
                        action = %action.id,
                        %reason,
                        "executor reported action error"
                    );
                    continue;
                }
                TransitionKind::NoChange => {
                    let became_dead = self
                        .session
                        .graph
                        .record_no_change(&fingerprint, &action.id)?;
                    if became_dead {
                        debug!(
                            state = fingerprint.short(),
                            action = %action.id,
                            "action dead after repeated no-ops"
                        );
                    }
                    continue;
                }
                TransitionKind::Navigation { .. } | TransitionKind::DomChange => {
                    let was_navigation =
                        matches!(transition, TransitionKind::Navigation { .. });

                    if self.config.settle_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms))
                            .await;
                    }
                    let child_view = match self
                        .observe_and_resolve(Some((&context, action.label.as_str())))
                        .await
                    {
                        Ok(view) => view,
                        Err(err) if err.is_fatal() => {
                            self.checkpoint();
                            return Err(ExploreError::Fatal(err.to_string()));
                        }
                        Err(err) => {
                            // Terminal leaf: the transition happened but the
                            // resulting state cannot be perceived.
                            warn!(
                                state = fingerprint.short(),
                                action = %action.id,
                                %err,
                                "resulting state unobservable, recording terminal leaf"
                            );
                            let leaf_ctx = context.child(context.url.clone(), &action.label);
                            let (leaf, _) = self.session.graph.resolve(
                                &StateFingerprint::unknown(),
                                &leaf_ctx,
                                Vec::new(),
                            );
                            leaf
                        }
                    };

                    self.session.graph.record_transition(
                        &fingerprint,
                        &action.id,
                        child_view.fingerprint.clone(),
                    )?;
                    self.checkpoint();

                    // A transition back into the current state needs neither
                    // recursion nor backtracking (verify-then-cancel probes
                    // and self-links land here).
                    if child_view.fingerprint == fingerprint {
                        debug!(
                            state = fingerprint.short(),
                            action = %action.id,
                            "self transition, continuing in place"
                        );
                        continue;
                    }

                    self.loop_detector.record(&action.signature());
                    if self.loop_detector.is_looping() {
                        warn!(
                            action = %action.id,
                            "repeating transition detected, forcing backtrack"
                        );
                        if !self
                            .restore_parent(
                                was_navigation,
                                action.requires_replay,
                                &fingerprint,
                                &context,
                            )
                            .await?
                        {
                            return Ok(BranchOutcome::Abandoned);
                        }
                        return Ok(BranchOutcome::LoopDetected);
                    }

                    // RECURSE
                    let child_outcome = self
                        .explore_node(
                            child_view.fingerprint.clone(),
                            child_view.context.clone(),
                            depth + 1,
                        )
                        .await?;
                    match child_outcome {
                        BranchOutcome::Cancelled => return Ok(BranchOutcome::Cancelled),
                        BranchOutcome::BudgetExhausted => {
                            return Ok(BranchOutcome::BudgetExhausted)
                        }
                        BranchOutcome::Abandoned => return Ok(BranchOutcome::Abandoned),
                        BranchOutcome::Exhausted
                        | BranchOutcome::DepthCapped
                        | BranchOutcome::Saturated
                        | BranchOutcome::LoopDetected => {
                            // BACKTRACK: restore this node's context before
                            // resuming selection here.
                            if !self
                                .restore_parent(
                                    was_navigation,
                                    action.requires_replay,
                                    &fingerprint,
                                    &context,
                                )
                                .await?
                            {
                                return Ok(BranchOutcome::Abandoned);
                            }
                        }
                    }
                }
            }
        }
    }

    /// OBSERVE + RESOLVE_NODE. `parent` carries the parent context and the
    /// taken action's label when resolving a transition target; `None`
    /// resolves the session root.
    async fn observe_and_resolve(
        &mut self,
        parent: Option<(&NodeContext, &str)>,
    ) -> Result<NodeView, PortError> {
        let observation = self.perception.observe().await?;
        let context = match parent {
            Some((parent_ctx, label)) => parent_ctx.child(observation.url.clone(), label),
            None => NodeContext::root(observation.url.clone()),
        };
        let fingerprint = self.fingerprinter.fingerprint(&observation.snapshot);
        let (view, is_new) =
            self.session
                .graph
                .resolve(&fingerprint, &context, observation.actions);
        if is_new {
            debug!(state = view.fingerprint.short(), context = %context, "resolved new node");
        }
        Ok(view)
    }

    /// BACKTRACK restoration. Goes back (or replays the parent context)
    /// and then re-observes to confirm the parent is actually on screen
    /// again; a restore that reports success but lands elsewhere is as
    /// lost as one that fails. Returns false when the parent could not be
    /// brought back and the live session was reset to the root instead
    /// (the caller abandons its branch).
    async fn restore_parent(
        &mut self,
        was_navigation: bool,
        requires_replay: bool,
        parent_fingerprint: &StateFingerprint,
        parent: &NodeContext,
    ) -> Result<bool, ExploreError> {
        let restored = if was_navigation && !requires_replay {
            self.perception.go_back().await
        } else {
            self.perception.restore(parent).await
        };

        let back = match restored {
            Ok(()) => match self.perception.observe().await {
                Ok(observation) => {
                    let found = self.fingerprinter.fingerprint(&observation.snapshot);
                    if found == *parent_fingerprint {
                        true
                    } else {
                        warn!(
                            expected = parent_fingerprint.short(),
                            found = found.short(),
                            "restoration landed on a different state"
                        );
                        false
                    }
                }
                Err(err) if err.is_fatal() => {
                    self.checkpoint();
                    return Err(ExploreError::Fatal(err.to_string()));
                }
                Err(err) => {
                    warn!(context = %parent, %err, "restored context is unobservable");
                    false
                }
            },
            Err(err) if err.is_fatal() => {
                self.checkpoint();
                return Err(ExploreError::Fatal(err.to_string()));
            }
            Err(err) => {
                warn!(context = %parent, %err, "restoration failed");
                false
            }
        };
        if back {
            return Ok(true);
        }

        warn!(context = %parent, "resetting to root, abandoning branch");
        self.abandoned_branches += 1;
        match self.perception.goto_root().await {
            Ok(()) => Ok(false),
            Err(root_err) => {
                // Cannot even reach the root context; nothing left to drive.
                self.checkpoint();
                Err(ExploreError::Fatal(root_err.to_string()))
            }
        }
    }

    fn budget_exhausted(&self) -> bool {
        if self.session.actions_executed >= self.config.max_total_actions {
            return true;
        }
        if let Some(limit) = self.config.max_wall_clock_secs {
            if self.started.elapsed().as_secs() >= limit {
                return true;
            }
        }
        false
    }

    /// Snapshot the session if a store is attached. Persistence trouble is
    /// reported but never interrupts exploration.
    fn checkpoint(&self) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&self.session.snapshot()) {
                warn!(%err, "failed to checkpoint session");
            }
        }
    }

    fn finish(self, outcome: ExplorationOutcome, message: String) -> ExplorationReport {
        ExplorationReport {
            outcome,
            session_id: self.session.id.clone(),
            message,
            steps: self.session.step_count,
            actions_executed: self.session.actions_executed,
            blocked_actions: self.blocked_actions,
            abandoned_branches: self.abandoned_branches,
            graph: self.session.graph.stats(),
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use statewalker_action_gate::SpecialHandling;
    use statewalker_core_types::{ActionDescriptor, ActionKind};
    use statewalker_fingerprint::{StateSnapshot, StructuralFact};

    use crate::ports::{Observation, RoundRobinOracle};

    /// What executing one action does to the simulated application.
    #[derive(Clone, Debug)]
    enum Effect {
        /// Navigate to another simulated state.
        Goto(&'static str),
        /// Structural change in place (modal, expanded panel).
        Mutate(&'static str),
        /// No observable effect.
        Noop,
        /// Executor-level error.
        Fail(&'static str),
        /// Destructive commit; verify-then-cancel must avoid this.
        Commit(&'static str),
    }

    #[derive(Clone)]
    struct SimState {
        url: &'static str,
        /// Extra facts distinguishing same-URL states (modals etc.).
        extra_facts: Vec<StructuralFact>,
        actions: Vec<(ActionDescriptor, Effect)>,
    }

    /// A tiny simulated application shared by the perception and executor
    /// ports, mirroring the single serial live session the engine drives.
    struct SimWorld {
        states: HashMap<&'static str, SimState>,
        root: &'static str,
        current: Mutex<&'static str>,
        history: Mutex<Vec<&'static str>>,
        executed: Mutex<Vec<String>>,
        committed: Mutex<Vec<String>>,
        cancelled_probes: Mutex<Vec<String>>,
        /// Broken history: go-back errors instead of popping.
        fail_go_back: bool,
        /// Misleading history: go-back reports success but lands here.
        go_back_lands_on: Option<&'static str>,
        /// State that renders nothing; observing it errors.
        unobservable: Option<&'static str>,
    }

    impl SimWorld {
        fn new(root: &'static str, states: Vec<(&'static str, SimState)>) -> Arc<Self> {
            Arc::new(Self::build(root, states))
        }

        /// Unshared form for tests that flip a failure flag first.
        fn build(root: &'static str, states: Vec<(&'static str, SimState)>) -> Self {
            Self {
                states: states.into_iter().collect(),
                root,
                current: Mutex::new(root),
                history: Mutex::new(Vec::new()),
                executed: Mutex::new(Vec::new()),
                committed: Mutex::new(Vec::new()),
                cancelled_probes: Mutex::new(Vec::new()),
                fail_go_back: false,
                go_back_lands_on: None,
                unobservable: None,
            }
        }

        fn state(&self) -> SimState {
            let key = *self.current.lock();
            self.states[key].clone()
        }
    }

    #[async_trait]
    impl Perception for SimWorld {
        async fn observe(&self) -> Result<Observation, PortError> {
            let key = *self.current.lock();
            if Some(key) == self.unobservable {
                return Err(PortError::Perception(format!("{key} renders nothing")));
            }
            let state = self.state();
            let mut snapshot = StateSnapshot::new(state.url).with_fact(
                StructuralFact::ElementCount {
                    tag: "button".into(),
                    count: state.actions.len() as u32,
                },
            );
            for (action, _) in &state.actions {
                snapshot = snapshot.with_fact(StructuralFact::NavLabel(action.label.clone()));
            }
            for fact in &state.extra_facts {
                snapshot = snapshot.with_fact(fact.clone());
            }
            Ok(Observation {
                snapshot,
                actions: state.actions.iter().map(|(a, _)| a.clone()).collect(),
                url: format!("https://sim.test{}", state.url),
            })
        }

        async fn go_back(&self) -> Result<(), PortError> {
            if self.fail_go_back {
                return Err(PortError::Restoration("history unavailable".into()));
            }
            if let Some(decoy) = self.go_back_lands_on {
                *self.current.lock() = decoy;
                return Ok(());
            }
            let mut history = self.history.lock();
            match history.pop() {
                Some(previous) => {
                    *self.current.lock() = previous;
                    Ok(())
                }
                None => Err(PortError::Restoration("empty history".into())),
            }
        }

        async fn restore(&self, context: &NodeContext) -> Result<(), PortError> {
            // Replay the breadcrumb from the root; same-URL states (modals)
            // are only reachable through their label trail.
            let mut key = self.root;
            let mut trail = Vec::new();
            for label in &context.breadcrumb {
                let effect = self.states[key]
                    .actions
                    .iter()
                    .find(|(a, _)| a.label == *label)
                    .map(|(_, e)| e.clone())
                    .ok_or_else(|| {
                        PortError::Restoration(format!("cannot replay `{label}` from {key}"))
                    })?;
                key = match effect {
                    Effect::Goto(target) => {
                        trail.push(key);
                        target
                    }
                    Effect::Mutate(target) => target,
                    _ => {
                        return Err(PortError::Restoration(format!(
                            "`{label}` does not reach a state"
                        )))
                    }
                };
            }
            *self.current.lock() = key;
            *self.history.lock() = trail;
            Ok(())
        }

        async fn goto_root(&self) -> Result<(), PortError> {
            *self.current.lock() = self.root;
            self.history.lock().clear();
            Ok(())
        }
    }

    #[async_trait]
    impl ActionExecutor for SimWorld {
        async fn execute(
            &self,
            action: &ActionDescriptor,
            special_handling: Option<SpecialHandling>,
        ) -> Result<TransitionKind, PortError> {
            self.executed.lock().push(action.id.clone());
            let state = self.state();
            let effect = state
                .actions
                .iter()
                .find(|(a, _)| a.id == action.id)
                .map(|(_, e)| e.clone())
                .ok_or_else(|| PortError::Execution(format!("{} not present", action.id)))?;

            match effect {
                Effect::Goto(target) => {
                    let previous = *self.current.lock();
                    self.history.lock().push(previous);
                    *self.current.lock() = target;
                    let target_url = self.states[target].url;
                    Ok(TransitionKind::Navigation {
                        context: NodeContext::root(format!("https://sim.test{target_url}")),
                    })
                }
                Effect::Mutate(target) => {
                    *self.current.lock() = target;
                    Ok(TransitionKind::DomChange)
                }
                Effect::Noop => Ok(TransitionKind::NoChange),
                Effect::Fail(reason) => Ok(TransitionKind::Error {
                    reason: reason.to_string(),
                }),
                Effect::Commit(what) => {
                    if special_handling == Some(SpecialHandling::VerifyThenCancel) {
                        // Confirmation surface appeared and was cancelled.
                        self.cancelled_probes.lock().push(action.id.clone());
                        Ok(TransitionKind::DomChange)
                    } else {
                        self.committed.lock().push(what.to_string());
                        Ok(TransitionKind::DomChange)
                    }
                }
            }
        }
    }

    fn action(label: &str, kind: ActionKind, pos: u32) -> ActionDescriptor {
        ActionDescriptor::new(label, kind, pos)
    }

    fn controller(world: &Arc<SimWorld>, config: ExplorerConfig) -> ExplorationController {
        let session = ExplorationSession::new(
            format!("https://sim.test{}", world.states[world.root].url),
            config.dead_threshold,
        );
        let perception: Arc<dyn Perception> = world.clone();
        let executor: Arc<dyn ActionExecutor> = world.clone();
        ExplorationController::new(config, session, perception, Arc::new(RoundRobinOracle), executor)
    }

    /// Exploration-only policy end to end: safe click recurses, delete is
    /// probed with verify-then-cancel, a no-op action dies at threshold,
    /// and the node ends fully explored.
    #[tokio::test]
    async fn exploration_only_scenario() {
        let a1 = action("Open details", ActionKind::Click, 0);
        let a2 = action("Delete row", ActionKind::Click, 1);
        let a3 = action("Refresh list", ActionKind::Click, 2);
        let world = SimWorld::new(
            "list",
            vec![
                (
                    "list",
                    SimState {
                        url: "/list",
                        extra_facts: vec![],
                        actions: vec![
                            (a1.clone(), Effect::Goto("details")),
                            (a2.clone(), Effect::Commit("row")),
                            (a3.clone(), Effect::Noop),
                        ],
                    },
                ),
                (
                    "details",
                    SimState {
                        url: "/details",
                        extra_facts: vec![],
                        actions: vec![],
                    },
                ),
            ],
        );

        let report = controller(&world, ExplorerConfig::minimal())
            .run()
            .await
            .unwrap();

        assert_eq!(report.outcome, ExplorationOutcome::RootExhausted);
        assert!(world.committed.lock().is_empty(), "data was deleted");
        assert_eq!(world.cancelled_probes.lock().as_slice(), &[a2.id.clone()]);
        // a3 was retried up to the dead threshold, then excluded.
        let noop_runs = world.executed.lock().iter().filter(|id| **id == a3.id).count();
        assert_eq!(noop_runs, 3);
        assert_eq!(report.graph.dead_actions, 1);
        assert_eq!(report.graph.fully_explored_nodes, report.graph.nodes);
    }

    /// Safety gate property: a critical action never reaches the executor.
    #[tokio::test]
    async fn critical_actions_never_execute() {
        let kill = action("Delete Account", ActionKind::Click, 0);
        let safe = action("View profile", ActionKind::Click, 1);
        let world = SimWorld::new(
            "settings",
            vec![
                (
                    "settings",
                    SimState {
                        url: "/settings",
                        extra_facts: vec![],
                        actions: vec![
                            (kill.clone(), Effect::Commit("account")),
                            (safe.clone(), Effect::Goto("profile")),
                        ],
                    },
                ),
                (
                    "profile",
                    SimState {
                        url: "/profile",
                        extra_facts: vec![],
                        actions: vec![],
                    },
                ),
            ],
        );

        let report = controller(&world, ExplorerConfig::minimal())
            .run()
            .await
            .unwrap();

        assert!(!world.executed.lock().contains(&kill.id));
        assert!(world.committed.lock().is_empty());
        assert_eq!(report.blocked_actions, 1);
        assert_eq!(report.outcome, ExplorationOutcome::RootExhausted);
    }

    /// No-re-execution property: outside the explicit no-op reset, every
    /// executed action id is unique per node.
    #[tokio::test]
    async fn actions_execute_at_most_once() {
        let go = action("Open reports", ActionKind::Click, 0);
        let broken = action("Flaky widget", ActionKind::Click, 1);
        let world = SimWorld::new(
            "home",
            vec![
                (
                    "home",
                    SimState {
                        url: "/home",
                        extra_facts: vec![],
                        actions: vec![
                            (go.clone(), Effect::Goto("reports")),
                            (broken.clone(), Effect::Fail("timeout")),
                        ],
                    },
                ),
                (
                    "reports",
                    SimState {
                        url: "/reports",
                        extra_facts: vec![],
                        actions: vec![],
                    },
                ),
            ],
        );

        let report = controller(&world, ExplorerConfig::minimal())
            .run()
            .await
            .unwrap();
        assert_eq!(report.outcome, ExplorationOutcome::RootExhausted);

        let executed = world.executed.lock();
        let mut sorted = executed.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), executed.len(), "an action ran twice");
    }

    /// Saturation guard: a location re-entered past the threshold is cut
    /// off without executing anything further there.
    #[tokio::test]
    async fn saturation_guard_stops_ping_pong() {
        let mut a_actions = Vec::new();
        let mut b_actions = Vec::new();
        for i in 0..5 {
            a_actions.push((
                action(&format!("To B {i}"), ActionKind::Click, i),
                Effect::Goto("b"),
            ));
            b_actions.push((
                action(&format!("To A {i}"), ActionKind::Click, i),
                Effect::Goto("a"),
            ));
        }
        let world = SimWorld::new(
            "root",
            vec![
                (
                    "root",
                    SimState {
                        url: "/root",
                        extra_facts: vec![],
                        actions: vec![(
                            action("Enter A", ActionKind::Click, 0),
                            Effect::Goto("a"),
                        )],
                    },
                ),
                (
                    "a",
                    SimState {
                        url: "/a",
                        extra_facts: vec![],
                        actions: a_actions,
                    },
                ),
                (
                    "b",
                    SimState {
                        url: "/b",
                        extra_facts: vec![],
                        actions: b_actions,
                    },
                ),
            ],
        );

        let config = ExplorerConfig::minimal().depth(16).action_budget(100);
        let report = controller(&world, config).run().await.unwrap();

        // Without the guard the mutual links would recurse until the action
        // budget; with it every action still runs exactly once.
        assert_eq!(report.outcome, ExplorationOutcome::RootExhausted);
        assert_eq!(world.executed.lock().len(), 11);
        assert!(report.graph.saturation_entries >= 3);
    }

    /// Cancellation: checked at the top of each step, state checkpointed,
    /// clean return.
    #[tokio::test]
    async fn cancellation_returns_cleanly() {
        let world = SimWorld::new(
            "home",
            vec![(
                "home",
                SimState {
                    url: "/home",
                    extra_facts: vec![],
                    actions: vec![(action("Nothing", ActionKind::Click, 0), Effect::Noop)],
                },
            )],
        );

        let controller = controller(&world, ExplorerConfig::minimal());
        controller.cancellation_token().cancel();
        let report = controller.run().await.unwrap();
        assert_eq!(report.outcome, ExplorationOutcome::Cancelled);
        assert_eq!(report.actions_executed, 0);
    }

    /// Budget: execution stops at the configured action count.
    #[tokio::test]
    async fn action_budget_terminates_session() {
        let mut actions = Vec::new();
        for i in 0..10 {
            actions.push((action(&format!("Noop {i}"), ActionKind::Click, i), Effect::Noop));
        }
        let world = SimWorld::new(
            "home",
            vec![(
                "home",
                SimState {
                    url: "/home",
                    extra_facts: vec![],
                    actions,
                },
            )],
        );

        let report = controller(&world, ExplorerConfig::minimal().action_budget(4))
            .run()
            .await
            .unwrap();
        assert_eq!(report.outcome, ExplorationOutcome::BudgetExhausted);
        assert_eq!(report.actions_executed, 4);
    }

    /// DomChange transitions recurse into the mutated state and restore
    /// the parent by replay.
    #[tokio::test]
    async fn dom_change_recurses_and_restores() {
        let open = action("Open filters", ActionKind::Click, 0);
        let other = action("Toggle layout", ActionKind::Toggle, 1);
        let close = action("Apply", ActionKind::Click, 0);
        let world = SimWorld::new(
            "list",
            vec![
                (
                    "list",
                    SimState {
                        url: "/list",
                        extra_facts: vec![],
                        actions: vec![
                            (open.clone(), Effect::Mutate("list_filters")),
                            (other.clone(), Effect::Noop),
                        ],
                    },
                ),
                (
                    "list_filters",
                    SimState {
                        url: "/list",
                        extra_facts: vec![StructuralFact::ModalCount(1)],
                        actions: vec![(close.clone(), Effect::Mutate("list"))],
                    },
                ),
            ],
        );

        let report = controller(&world, ExplorerConfig::minimal())
            .run()
            .await
            .unwrap();

        // Two distinct fingerprints at the same URL.
        assert!(report.graph.nodes >= 2);
        assert!(world.executed.lock().contains(&open.id));
        assert!(world.executed.lock().contains(&close.id));
    }

    fn two_branch_states(
        a1: &ActionDescriptor,
        a2: &ActionDescriptor,
    ) -> Vec<(&'static str, SimState)> {
        vec![
            (
                "home",
                SimState {
                    url: "/home",
                    extra_facts: vec![],
                    actions: vec![
                        (a1.clone(), Effect::Goto("records")),
                        (a2.clone(), Effect::Goto("alerts")),
                    ],
                },
            ),
            (
                "records",
                SimState {
                    url: "/records",
                    extra_facts: vec![],
                    actions: vec![],
                },
            ),
            (
                "alerts",
                SimState {
                    url: "/alerts",
                    extra_facts: vec![],
                    actions: vec![],
                },
            ),
            (
                "limbo",
                SimState {
                    url: "/limbo",
                    extra_facts: vec![],
                    actions: vec![],
                },
            ),
        ]
    }

    /// A go-back that reports success but lands on the wrong page is
    /// caught by re-observation: the branch is abandoned and exploration
    /// resumes from the root instead of stranding there, so the sibling
    /// branch is still discovered.
    #[tokio::test]
    async fn misleading_go_back_abandons_branch_and_recovers() {
        let a1 = action("Open records", ActionKind::Click, 0);
        let a2 = action("Open alerts", ActionKind::Click, 1);
        let mut world = SimWorld::build("home", two_branch_states(&a1, &a2));
        world.go_back_lands_on = Some("limbo");
        let world = Arc::new(world);

        let report = controller(&world, ExplorerConfig::minimal())
            .run()
            .await
            .unwrap();

        assert_eq!(report.outcome, ExplorationOutcome::RootExhausted);
        assert_eq!(report.abandoned_branches, 2);
        // Both targets were reached anyway; the decoy never entered the
        // graph because it was only seen during verification.
        assert_eq!(report.graph.nodes, 3);
        assert_eq!(report.graph.fully_explored_nodes, 3);
        assert_eq!(world.executed.lock().len(), 2);
    }

    /// A failed go-back resets to the root, counts the abandoned branch,
    /// and the run still finishes the remaining work from there.
    #[tokio::test]
    async fn failed_go_back_resets_to_root() {
        let a1 = action("Open records", ActionKind::Click, 0);
        let a2 = action("Open alerts", ActionKind::Click, 1);
        let mut world = SimWorld::build("home", two_branch_states(&a1, &a2));
        world.fail_go_back = true;
        let world = Arc::new(world);

        let report = controller(&world, ExplorerConfig::minimal())
            .run()
            .await
            .unwrap();

        assert_eq!(report.outcome, ExplorationOutcome::RootExhausted);
        assert_eq!(report.abandoned_branches, 2);
        assert_eq!(report.graph.nodes, 3);
        assert_eq!(report.graph.fully_explored_nodes, 3);
        assert_eq!(world.executed.lock().len(), 2);
    }

    /// A transition whose landing state cannot be perceived is recorded
    /// as a terminal unknown leaf; the branch backtracks cleanly without
    /// being abandoned.
    #[tokio::test]
    async fn unobservable_state_becomes_terminal_leaf() {
        let open = action("Open viewer", ActionKind::Click, 0);
        let mut world = SimWorld::build(
            "home",
            vec![
                (
                    "home",
                    SimState {
                        url: "/home",
                        extra_facts: vec![],
                        actions: vec![(open.clone(), Effect::Goto("blank"))],
                    },
                ),
                (
                    "blank",
                    SimState {
                        url: "/blank",
                        extra_facts: vec![],
                        actions: vec![],
                    },
                ),
            ],
        );
        world.unobservable = Some("blank");
        let world = Arc::new(world);

        let controller = controller(&world, ExplorerConfig::minimal());
        let graph = controller.session().graph.clone();
        let report = controller.run().await.unwrap();

        assert_eq!(report.outcome, ExplorationOutcome::RootExhausted);
        assert_eq!(report.abandoned_branches, 0);
        assert_eq!(report.graph.nodes, 2);
        assert_eq!(report.graph.transitions, 1);
        assert_eq!(report.graph.fully_explored_nodes, 2);
        let snapshot = graph.export();
        assert!(snapshot
            .nodes
            .keys()
            .any(|key| key.starts_with("st_unknown:")));
    }
}
