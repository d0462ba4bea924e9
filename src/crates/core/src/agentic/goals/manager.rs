use super::scheduler::{run_queue, settle, GoalSettlement};
use super::source::validate_goal;
use super::types::{AdhocReport, ExecutionQueue, RunOptions, RunReport};
use crate::agentic::execution::{GoalContext, GoalExecutor};
use crate::infrastructure::events::{GoalEvent, GoalEventBus};
use crate::util::errors::{DataPilotError, DataPilotResult};
use crate::util::now_ms;
use dashmap::DashMap;
use datapilot_core_types::{GoalRecord, GoalSpec, GoalStatus, RenderableTurn, RunState};
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct AdhocGoal {
    record: GoalRecord,
    turns: Vec<RenderableTurn>,
}

/// Sequential goal runner.
///
/// Notes:
/// - At most one execution (batch or ad-hoc) is active at a time; a second one
///   is rejected with [`DataPilotError::Busy`].
/// - Each execution gets a fresh cancellation token. [`cancel`](Self::cancel)
///   latches it; the latch only resets when the next execution starts.
/// - Goal statuses reset only when a new goal list is loaded.
pub struct GoalController {
    executor: Arc<dyn GoalExecutor>,
    options: RunOptions,
    goals: RwLock<Vec<GoalRecord>>,
    transcripts: DashMap<usize, Vec<RenderableTurn>>,
    run_state: RwLock<RunState>,
    cancel_token: Mutex<CancellationToken>,
    run_lock: tokio::sync::Mutex<()>,
    adhoc: DashMap<String, AdhocGoal>,
    events: GoalEventBus,
}

impl GoalController {
    pub fn new(executor: Arc<dyn GoalExecutor>, options: RunOptions) -> Self {
        Self {
            executor,
            options,
            goals: RwLock::new(Vec::new()),
            transcripts: DashMap::new(),
            run_state: RwLock::new(RunState::Idle),
            cancel_token: Mutex::new(CancellationToken::new()),
            run_lock: tokio::sync::Mutex::new(()),
            adhoc: DashMap::new(),
            events: GoalEventBus::with_capacity(options.event_capacity),
        }
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<GoalEvent> {
        self.events.subscribe()
    }

    pub(crate) fn events(&self) -> GoalEventBus {
        self.events.clone()
    }

    pub(crate) fn executor(&self) -> &Arc<dyn GoalExecutor> {
        &self.executor
    }

    /// Replaces the goal list; every goal starts out pending.
    pub fn load_goals(&self, specs: Vec<GoalSpec>) -> DataPilotResult<()> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| DataPilotError::Busy("cannot replace goals during a run".to_string()))?;
        for (index, spec) in specs.iter().enumerate() {
            validate_goal(index, spec)?;
        }

        let now = now_ms();
        let records: Vec<GoalRecord> = specs
            .into_iter()
            .map(|spec| GoalRecord::pending(spec, now))
            .collect();
        debug!("Goal list loaded: goals={}", records.len());
        *write(&self.goals) = records;
        self.transcripts.clear();
        self.set_run_state(RunState::Idle);
        Ok(())
    }

    pub fn goals(&self) -> Vec<GoalRecord> {
        read(&self.goals).clone()
    }

    pub fn statuses(&self) -> Vec<GoalStatus> {
        read(&self.goals).iter().map(|goal| goal.status).collect()
    }

    pub fn run_state(&self) -> RunState {
        *read(&self.run_state)
    }

    /// Latest transcript of the goal at `index`.
    pub fn transcript(&self, index: usize) -> Option<Vec<RenderableTurn>> {
        self.transcripts.get(&index).map(|turns| turns.clone())
    }

    /// Loads `specs` and runs all of them.
    pub async fn run_all(&self, specs: Vec<GoalSpec>) -> DataPilotResult<RunReport> {
        self.load_goals(specs)?;
        self.run(None).await
    }

    /// Runs the selected goals in list order.
    ///
    /// `None` selects every pending goal. Goal failures are reported through the
    /// goal statuses of the returned report; `Err` is only returned when the run
    /// cannot start.
    pub async fn run(&self, selection: Option<&[usize]>) -> DataPilotResult<RunReport> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| DataPilotError::Busy("a run is already in progress".to_string()))?;
        let order = self.resolve_selection(selection)?;

        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        let cancel = self.arm_cancel_token();
        info!("Starting goal run: run_id={}, selected={:?}", run_id, order);

        let mut queue = ExecutionQueue::new(order);
        let state = run_queue(self, &run_id, &mut queue, &cancel).await;
        self.set_run_state(state);
        self.events.emit(GoalEvent::RunFinished {
            run_id: run_id.clone(),
            state,
            timestamp: now_ms(),
        });
        info!("Goal run finished: run_id={}, state={:?}", run_id, state);

        Ok(RunReport {
            run_id,
            state,
            goals: self.goals(),
        })
    }

    /// Runs one goal outside the goal list with its own record.
    pub async fn run_single(&self, spec: GoalSpec) -> DataPilotResult<AdhocReport> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| DataPilotError::Busy("a run is already in progress".to_string()))?;
        validate_goal(0, &spec)?;

        let id = format!("adhoc-{}", uuid::Uuid::new_v4());
        let cancel = self.arm_cancel_token();
        let now = now_ms();
        let mut record = GoalRecord::pending(spec.clone(), now);
        record.status = GoalStatus::Running;
        record.started_at_ms = Some(now);
        self.adhoc.insert(
            id.clone(),
            AdhocGoal {
                record: record.clone(),
                turns: Vec::new(),
            },
        );
        self.emit_state_changed(&id, None, &record);
        debug!("Ad-hoc goal started: id={}, title={}", id, record.title);

        let ctx = GoalContext::new(&id, None, cancel.clone(), self.events());
        let result = self.executor.run_goal(&spec, &ctx).await;
        let settlement = settle(result, &cancel, &ctx);
        settlement.apply_to(&mut record, now_ms());
        self.adhoc.insert(
            id.clone(),
            AdhocGoal {
                record: record.clone(),
                turns: settlement.turns.clone(),
            },
        );
        self.emit_state_changed(&id, None, &record);

        let state = match record.status {
            GoalStatus::Failed => RunState::HaltedOnFailure,
            GoalStatus::Stopped => RunState::Cancelled,
            _ => RunState::Completed,
        };
        self.events.emit(GoalEvent::RunFinished {
            run_id: id.clone(),
            state,
            timestamp: now_ms(),
        });
        debug!("Ad-hoc goal finished: id={}, status={:?}", id, record.status);

        Ok(AdhocReport {
            id,
            record,
            turns: settlement.turns,
        })
    }

    pub fn adhoc_record(&self, id: &str) -> DataPilotResult<GoalRecord> {
        self.adhoc
            .get(id)
            .map(|goal| goal.record.clone())
            .ok_or_else(|| DataPilotError::not_found(format!("Ad-hoc goal not found: {}", id)))
    }

    pub fn adhoc_transcript(&self, id: &str) -> DataPilotResult<Vec<RenderableTurn>> {
        self.adhoc
            .get(id)
            .map(|goal| goal.turns.clone())
            .ok_or_else(|| DataPilotError::not_found(format!("Ad-hoc goal not found: {}", id)))
    }

    /// Sets the cancellation latch of the current execution.
    ///
    /// The running goal is signalled through its abort token; no further goal
    /// starts. Returns false if the latch was already set.
    pub fn cancel(&self) -> bool {
        let token = lock(&self.cancel_token);
        if token.is_cancelled() {
            return false;
        }
        info!("Cancelling goal execution");
        token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        lock(&self.cancel_token).is_cancelled()
    }

    pub(crate) fn set_run_state(&self, state: RunState) {
        *write(&self.run_state) = state;
    }

    /// Moves the goal at `index` to running and returns what to execute.
    pub(crate) fn begin_goal(&self, run_id: &str, index: usize) -> DataPilotResult<GoalSpec> {
        let record = {
            let mut goals = write(&self.goals);
            let goal = goals
                .get_mut(index)
                .ok_or_else(|| DataPilotError::not_found(format!("Goal not found: {}", index)))?;
            if !goal.status.can_transition_to(GoalStatus::Running) {
                return Err(DataPilotError::validation(format!(
                    "Goal {} is {:?}, not pending",
                    index, goal.status
                )));
            }
            let now = now_ms();
            goal.status = GoalStatus::Running;
            goal.started_at_ms = Some(now);
            goal.updated_at_ms = now;
            goal.clone()
        };
        self.emit_state_changed(run_id, Some(index), &record);
        Ok(record.spec())
    }

    pub(crate) fn finish_goal(&self, run_id: &str, index: usize, settlement: GoalSettlement) {
        let record = {
            let mut goals = write(&self.goals);
            let Some(goal) = goals.get_mut(index) else {
                return;
            };
            settlement.apply_to(goal, now_ms());
            goal.clone()
        };
        self.transcripts.insert(index, settlement.turns);
        self.emit_state_changed(run_id, Some(index), &record);
    }

    fn resolve_selection(&self, selection: Option<&[usize]>) -> DataPilotResult<Vec<usize>> {
        let goals = read(&self.goals);
        let Some(selection) = selection else {
            return Ok(goals
                .iter()
                .enumerate()
                .filter(|(_, goal)| goal.status == GoalStatus::Pending)
                .map(|(index, _)| index)
                .collect());
        };

        let mut order = selection.to_vec();
        order.sort_unstable();
        order.dedup();
        for &index in &order {
            let goal = goals.get(index).ok_or_else(|| {
                DataPilotError::validation(format!(
                    "Goal index out of range: {} (goals: {})",
                    index,
                    goals.len()
                ))
            })?;
            if goal.status != GoalStatus::Pending {
                return Err(DataPilotError::validation(format!(
                    "Goal {} is {:?}, only pending goals can be selected",
                    index, goal.status
                )));
            }
        }
        Ok(order)
    }

    fn arm_cancel_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *lock(&self.cancel_token) = token.clone();
        token
    }

    fn emit_state_changed(&self, run_id: &str, goal_index: Option<usize>, record: &GoalRecord) {
        self.events.emit(GoalEvent::GoalStateChanged {
            run_id: run_id.to_string(),
            goal_index,
            title: record.title.clone(),
            status: record.status,
            error: record.error.clone(),
            timestamp: record.updated_at_ms,
        });
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agentic::execution::{GoalOutcome, StreamingGoalExecutor};
    use async_trait::async_trait;
    use datapilot_transport::{ScriptStep, ScriptedTransport};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::broadcast;

    #[derive(Clone)]
    enum Behavior {
        Complete(&'static str),
        Fail(&'static str),
        WaitForAbort,
        FailOnAbort,
        Slow(Duration),
    }

    #[derive(Default)]
    struct FakeExecutor {
        behaviors: HashMap<String, Behavior>,
        started: Mutex<Vec<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl FakeExecutor {
        fn with(mut self, prompt: &str, behavior: Behavior) -> Self {
            self.behaviors.insert(prompt.to_string(), behavior);
            self
        }

        fn started(&self) -> Vec<String> {
            self.started.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GoalExecutor for FakeExecutor {
        async fn run_goal(
            &self,
            goal: &GoalSpec,
            ctx: &GoalContext,
        ) -> DataPilotResult<GoalOutcome> {
            self.started.lock().unwrap().push(goal.prompt().to_string());
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);

            let behavior = self
                .behaviors
                .get(goal.prompt())
                .cloned()
                .unwrap_or(Behavior::Complete("done"));
            let result = match behavior {
                Behavior::Complete(answer) => Ok(GoalOutcome::Completed {
                    turns: vec![RenderableTurn::SimpleBotTurn {
                        text: answer.to_string(),
                    }],
                }),
                Behavior::Fail(message) => Err(DataPilotError::Backend(message.to_string())),
                Behavior::WaitForAbort => {
                    ctx.cancel.cancelled().await;
                    Ok(GoalOutcome::Stopped { turns: vec![] })
                }
                Behavior::FailOnAbort => {
                    ctx.cancel.cancelled().await;
                    Err(DataPilotError::Backend("connection aborted".to_string()))
                }
                Behavior::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(GoalOutcome::Completed { turns: vec![] })
                }
            };
            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn specs(prompts: &[&str]) -> Vec<GoalSpec> {
        prompts
            .iter()
            .map(|prompt| GoalSpec::new(*prompt, ""))
            .collect()
    }

    fn controller(executor: Arc<FakeExecutor>, continue_on_failure: bool) -> Arc<GoalController> {
        Arc::new(GoalController::new(
            executor,
            RunOptions {
                continue_on_failure,
                ..RunOptions::default()
            },
        ))
    }

    async fn wait_until_running(rx: &mut broadcast::Receiver<GoalEvent>, index: usize) {
        let wait = async {
            loop {
                if let GoalEvent::GoalStateChanged {
                    goal_index: Some(i),
                    status: GoalStatus::Running,
                    ..
                } = rx.recv().await.unwrap()
                {
                    if i == index {
                        return;
                    }
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("goal never started");
    }

    #[tokio::test]
    async fn cancel_during_second_goal_leaves_third_pending() {
        let executor = Arc::new(FakeExecutor::default().with("g2", Behavior::WaitForAbort));
        let controller = controller(executor.clone(), false);
        controller.load_goals(specs(&["g1", "g2", "g3"])).unwrap();
        let mut rx = controller.subscribe();

        let runner = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run(None).await })
        };
        wait_until_running(&mut rx, 1).await;
        assert!(controller.cancel());
        assert!(!controller.cancel());

        let report = runner.await.unwrap().unwrap();
        assert_eq!(
            report.statuses(),
            vec![GoalStatus::Completed, GoalStatus::Stopped, GoalStatus::Pending]
        );
        assert_eq!(report.state, RunState::Cancelled);
        assert_eq!(controller.run_state(), RunState::Cancelled);
        assert_eq!(executor.started(), vec!["g1", "g2"]);
        assert_eq!(report.goals[0].output_text, "done");
    }

    #[tokio::test]
    async fn error_after_abort_is_stopped_not_failed() {
        let executor = Arc::new(FakeExecutor::default().with("g1", Behavior::FailOnAbort));
        let controller = controller(executor, false);
        controller.load_goals(specs(&["g1", "g2"])).unwrap();
        let mut rx = controller.subscribe();

        let runner = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run(None).await })
        };
        wait_until_running(&mut rx, 0).await;
        controller.cancel();

        let report = runner.await.unwrap().unwrap();
        assert_eq!(report.statuses(), vec![GoalStatus::Stopped, GoalStatus::Pending]);
        assert_eq!(report.state, RunState::Cancelled);
        assert!(report.goals[0].error.is_some());
    }

    #[tokio::test]
    async fn failure_halts_remaining_goals() {
        let executor = Arc::new(FakeExecutor::default().with("g2", Behavior::Fail("boom")));
        let controller = controller(executor.clone(), false);

        let report = controller.run_all(specs(&["g1", "g2", "g3"])).await.unwrap();
        assert_eq!(
            report.statuses(),
            vec![GoalStatus::Completed, GoalStatus::Failed, GoalStatus::Pending]
        );
        assert_eq!(report.state, RunState::HaltedOnFailure);
        assert!(report.goals[1].error.as_deref().unwrap().contains("boom"));
        assert_eq!(executor.started(), vec!["g1", "g2"]);
    }

    #[tokio::test]
    async fn continue_on_failure_runs_everything() {
        let executor = Arc::new(FakeExecutor::default().with("g2", Behavior::Fail("boom")));
        let controller = controller(executor, true);

        let report = controller.run_all(specs(&["g1", "g2", "g3"])).await.unwrap();
        assert_eq!(
            report.statuses(),
            vec![GoalStatus::Completed, GoalStatus::Failed, GoalStatus::Completed]
        );
        assert_eq!(report.state, RunState::Completed);
    }

    #[tokio::test]
    async fn selection_runs_subset_in_list_order() {
        let executor = Arc::new(FakeExecutor::default());
        let controller = controller(executor.clone(), false);
        controller.load_goals(specs(&["a", "b", "c"])).unwrap();

        let report = controller.run(Some(&[2, 0, 2][..])).await.unwrap();
        assert_eq!(
            report.statuses(),
            vec![GoalStatus::Completed, GoalStatus::Pending, GoalStatus::Completed]
        );
        assert_eq!(executor.started(), vec!["a", "c"]);

        let report = controller.run(None).await.unwrap();
        assert_eq!(report.statuses(), vec![GoalStatus::Completed; 3]);
        assert_eq!(executor.started(), vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn invalid_selection_is_rejected_before_running() {
        let executor = Arc::new(FakeExecutor::default());
        let controller = controller(executor.clone(), false);
        controller.load_goals(specs(&["a", "b"])).unwrap();

        assert!(matches!(
            controller.run(Some(&[5][..])).await,
            Err(DataPilotError::Validation(_))
        ));
        controller.run(Some(&[0][..])).await.unwrap();
        assert!(matches!(
            controller.run(Some(&[0, 1][..])).await,
            Err(DataPilotError::Validation(_))
        ));
        assert_eq!(executor.started(), vec!["a"]);
        assert_eq!(controller.statuses()[1], GoalStatus::Pending);
    }

    #[tokio::test]
    async fn goals_never_overlap() {
        let delay = Behavior::Slow(Duration::from_millis(20));
        let executor = Arc::new(
            FakeExecutor::default()
                .with("a", delay.clone())
                .with("b", delay.clone())
                .with("c", delay),
        );
        let controller = controller(executor.clone(), false);
        let report = controller.run_all(specs(&["a", "b", "c"])).await.unwrap();
        assert_eq!(report.state, RunState::Completed);
        assert_eq!(executor.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_run_and_reload_are_rejected_while_running() {
        let executor = Arc::new(FakeExecutor::default().with("a", Behavior::WaitForAbort));
        let controller = controller(executor, false);
        controller.load_goals(specs(&["a"])).unwrap();
        let mut rx = controller.subscribe();

        let runner = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run(None).await })
        };
        wait_until_running(&mut rx, 0).await;
        assert!(controller.run_state().is_running());
        assert!(matches!(
            controller.run(None).await,
            Err(DataPilotError::Busy(_))
        ));
        assert!(matches!(
            controller.load_goals(specs(&["b"])),
            Err(DataPilotError::Busy(_))
        ));
        assert!(matches!(
            controller.run_single(GoalSpec::new("c", "")).await,
            Err(DataPilotError::Busy(_))
        ));

        controller.cancel();
        runner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn new_run_resets_cancellation_latch() {
        let executor = Arc::new(FakeExecutor::default());
        let controller = controller(executor, false);
        controller.load_goals(specs(&["a"])).unwrap();
        controller.cancel();
        assert!(controller.is_cancelled());

        let report = controller.run(None).await.unwrap();
        assert_eq!(report.state, RunState::Completed);
        assert!(!controller.is_cancelled());
    }

    #[tokio::test]
    async fn reload_resets_statuses() {
        let executor = Arc::new(FakeExecutor::default());
        let controller = controller(executor, false);
        controller.run_all(specs(&["a"])).await.unwrap();
        assert_eq!(controller.statuses(), vec![GoalStatus::Completed]);
        assert!(controller.transcript(0).is_some());

        controller.load_goals(specs(&["a", "b"])).unwrap();
        assert_eq!(controller.statuses(), vec![GoalStatus::Pending; 2]);
        assert_eq!(controller.run_state(), RunState::Idle);
        assert!(controller.transcript(0).is_none());
    }

    #[tokio::test]
    async fn adhoc_goal_keeps_its_own_record() {
        let executor = Arc::new(FakeExecutor::default().with("quick", Behavior::Complete("42")));
        let controller = controller(executor, false);
        controller.load_goals(specs(&["a"])).unwrap();

        let report = controller
            .run_single(GoalSpec::new("quick", ""))
            .await
            .unwrap();
        assert!(report.id.starts_with("adhoc-"));
        assert_eq!(report.record.status, GoalStatus::Completed);
        assert_eq!(report.record.output_text, "42");
        assert!(report.record.started_at_ms.is_some());

        assert_eq!(controller.adhoc_record(&report.id).unwrap().output_text, "42");
        assert_eq!(controller.adhoc_transcript(&report.id).unwrap().len(), 1);
        assert_eq!(controller.statuses(), vec![GoalStatus::Pending]);
        assert!(matches!(
            controller.adhoc_record("adhoc-missing"),
            Err(DataPilotError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn emits_state_changes_and_run_finished() {
        let executor = Arc::new(FakeExecutor::default());
        let controller = controller(executor, false);
        controller.load_goals(specs(&["a"])).unwrap();
        let mut rx = controller.subscribe();

        let report = controller.run(None).await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.run_id(), report.run_id);
            match event {
                GoalEvent::GoalStateChanged { status, .. } => seen.push(format!("{:?}", status)),
                GoalEvent::RunFinished { state, .. } => seen.push(format!("{:?}", state)),
                GoalEvent::TurnsUpdated { .. } => {}
            }
        }
        assert_eq!(seen, vec!["Running", "Completed", "Completed"]);
    }

    #[tokio::test]
    async fn streaming_executor_opens_goals_one_by_one() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_script(
                    "Revenue by quarter",
                    ScriptedTransport::chunked(
                        "event: thought\ndata: Thought: group by quarter\n\nevent: final\ndata: [Final Answer] Q3 leads\n\n",
                        5,
                    ),
                )
                .with_script(
                    "Churn rate",
                    vec![ScriptStep::chunk(
                        "event: final\ndata: [Final Answer]: 4%\n\n",
                    )],
                ),
        );
        let executor = Arc::new(StreamingGoalExecutor::new(transport.clone()));
        let controller = GoalController::new(executor, RunOptions::default());

        let report = controller
            .run_all(vec![
                GoalSpec::new("Revenue", "Revenue by quarter"),
                GoalSpec::new("Churn", "Churn rate"),
            ])
            .await
            .unwrap();

        assert_eq!(report.statuses(), vec![GoalStatus::Completed; 2]);
        assert_eq!(transport.opened(), vec!["Revenue by quarter", "Churn rate"]);
        assert_eq!(report.goals[0].output_text, "Q3 leads");
        assert_eq!(report.goals[1].output_text, "4%");

        let transcript = controller.transcript(0).unwrap();
        assert!(transcript[0].is_user());
        assert_eq!(transcript[1].thought_sequence().len(), 1);
    }

    #[tokio::test]
    async fn missing_script_fails_goal_without_unwinding() {
        let transport = Arc::new(ScriptedTransport::new());
        let executor = Arc::new(StreamingGoalExecutor::new(transport));
        let controller = GoalController::new(executor, RunOptions::default());

        let report = controller
            .run_all(vec![GoalSpec::new("x", ""), GoalSpec::new("y", "")])
            .await
            .unwrap();
        assert_eq!(report.statuses(), vec![GoalStatus::Failed, GoalStatus::Pending]);
        assert!(report.goals[0]
            .error
            .as_deref()
            .unwrap()
            .contains("No script for goal"));
    }
}
