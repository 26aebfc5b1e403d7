//! Run Deliberation use case
//!
//! Drives a session from start (or resume) to a terminal state: visits every
//! agent once per round in their fixed order, persists each successful turn
//! as it lands, honours external cancellation between turns, and finishes
//! with a synthesis call that turns the transcript into action items.

use super::agent_turn::{AgentTurnExecutor, TurnError, TurnInput};
use super::synthesis::{SynthesisOutcome, SynthesisStep};
use super::transcript::{TranscriptAccumulator, WriteOutcome};
use crate::config::DeliberationParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::{DeliberationProgress, NoProgress};
use crate::ports::provider_client::ProviderClient;
use crate::ports::session_store::{SessionStore, SessionUpdate, StoreError};
use chrono::Utc;
use roundtable_domain::{
    AgentId, AgentSnapshot, ContextWindow, DomainError, Participant, ProviderProfile,
    RoundSchedule, Session, SessionEvent, SessionId, SessionStatus, StartMode, Turn,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur when starting or running a deliberation
///
/// Only start-time failures surface here. Per-turn provider failures are
/// absorbed by the round loop and never abort a session.
#[derive(Error, Debug)]
pub enum RunDeliberationError {
    #[error("{0}")]
    Precondition(#[from] DomainError),

    #[error("Agent '{0}' referenced by the session does not exist")]
    AgentNotFound(AgentId),

    #[error("Session '{0}' is being advanced by another run")]
    ConcurrentRun(SessionId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Coarse classification of [`RunDeliberationError`] for callers that map
/// errors onto responses or exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliberationErrorKind {
    Precondition,
    NotFound,
    Storage,
}

impl RunDeliberationError {
    pub fn kind(&self) -> DeliberationErrorKind {
        match self {
            RunDeliberationError::Precondition(_) => DeliberationErrorKind::Precondition,
            RunDeliberationError::AgentNotFound(_) => DeliberationErrorKind::NotFound,
            RunDeliberationError::ConcurrentRun(_) => DeliberationErrorKind::Precondition,
            RunDeliberationError::Store(StoreError::NotFound { .. }) => {
                DeliberationErrorKind::NotFound
            }
            RunDeliberationError::Store(
                StoreError::StatusConflict { .. } | StoreError::TranscriptConflict { .. },
            ) => DeliberationErrorKind::Precondition,
            RunDeliberationError::Store(_) => DeliberationErrorKind::Storage,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliberationOutcome {
    pub session_id: SessionId,
    /// `Completed` or `Cancelled`. `Running` means the run was interrupted
    /// locally and the session can be resumed.
    pub status: SessionStatus,
    pub turns_recorded: usize,
    pub expected_turns: usize,
    pub last_round: u32,
    pub action_items: Vec<String>,
    /// Rounds were cut short because none of them produced a turn
    pub stopped_early: bool,
}

impl DeliberationOutcome {
    pub fn is_partial(&self) -> bool {
        self.turns_recorded < self.expected_turns
    }
}

/// Why the round loop stopped before running out of rounds.
enum Halt {
    /// The stored status is no longer running
    Status(SessionStatus),
    /// The in-process cancellation token fired
    Interrupted,
    /// Another run appended turns to the same session
    Superseded,
}

/// Use case for running a deliberation session
pub struct RunDeliberationUseCase<P: ?Sized + 'static, S: ?Sized + 'static> {
    provider: Arc<P>,
    store: Arc<S>,
    /// Used by agents without their own provider reference and for synthesis
    default_provider: ProviderProfile,
    params: DeliberationParams,
    logger: Arc<dyn ConversationLogger>,
    cancellation: Option<CancellationToken>,
}

impl<P, S> RunDeliberationUseCase<P, S>
where
    P: ProviderClient + ?Sized + 'static,
    S: SessionStore + ?Sized + 'static,
{
    pub fn new(provider: Arc<P>, store: Arc<S>, default_provider: ProviderProfile) -> Self {
        Self {
            provider,
            store,
            default_provider,
            params: DeliberationParams::default(),
            logger: Arc::new(NoConversationLogger),
            cancellation: None,
        }
    }

    pub fn with_params(mut self, params: DeliberationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Stop starting new turns once `token` fires, without waiting for the
    /// store to report the cancellation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        session_id: &SessionId,
    ) -> Result<DeliberationOutcome, RunDeliberationError> {
        self.execute_with_progress(session_id, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        session_id: &SessionId,
        progress: &dyn DeliberationProgress,
    ) -> Result<DeliberationOutcome, RunDeliberationError> {
        let session = self.store.get_session(session_id).await?;
        let mode = session.plan_start()?;
        let (participants, frozen) = self.load_participants(&session).await?;
        self.claim(&session, mode, frozen).await?;

        if let StartMode::Resume { from_round } = mode {
            info!(
                "Resuming session {} at round {} with {} recorded turn(s)",
                session.id,
                from_round,
                session.transcript.len()
            );
        }

        info!(
            "Starting deliberation on '{}' with {} agents for {} round(s)",
            session.topic,
            participants.len(),
            session.max_rounds
        );
        self.logger.log(ConversationEvent::session_started(
            &session.id,
            &participants,
            session.current_round + 1,
        ));
        progress.on_session_start(&session.id, &participants, session.max_rounds);

        let mut transcript = TranscriptAccumulator::new(Arc::clone(&self.store), &session);
        let (halt, stopped_early) = self
            .run_rounds(&session, &participants, &mut transcript, progress)
            .await?;

        match halt {
            None => {}
            Some(Halt::Status(SessionStatus::Cancelled)) => {
                return Ok(self.cancelled(&session, &transcript, stopped_early));
            }
            Some(Halt::Interrupted) => {
                info!(
                    "Deliberation interrupted after {} turn(s); session {} stays resumable",
                    transcript.len(),
                    session.id
                );
                return Ok(self.outcome(
                    &session,
                    &transcript,
                    SessionStatus::Running,
                    Vec::new(),
                    stopped_early,
                ));
            }
            Some(Halt::Superseded) => {
                warn!(
                    "Session {} gained turns from another run; stopping this one",
                    session.id
                );
                return Err(RunDeliberationError::ConcurrentRun(session.id.clone()));
            }
            Some(Halt::Status(actual)) => {
                return Err(StoreError::StatusConflict {
                    expected: SessionStatus::Running,
                    actual,
                }
                .into());
            }
        }

        let action_items = self.synthesize(&session, &transcript, progress).await;
        self.complete(&session, &transcript, action_items, stopped_early)
            .await
    }

    /// Resolve each snapshot to a participant, preserving the session's
    /// agent order.
    ///
    /// Snapshots frozen by an earlier start keep their settings; the rest are
    /// read from the live agent records. Also returns the snapshots with every
    /// settings field filled in, ready to be stored.
    async fn load_participants(
        &self,
        session: &Session,
    ) -> Result<(Vec<Participant>, Vec<AgentSnapshot>), RunDeliberationError> {
        let unfrozen: Vec<AgentId> = session
            .agent_snapshots
            .iter()
            .filter(|snapshot| snapshot.settings.is_none())
            .map(|snapshot| snapshot.id.clone())
            .collect();
        let agents = if unfrozen.is_empty() {
            Vec::new()
        } else {
            self.store.get_agents(&unfrozen).await?
        };

        let mut participants = Vec::with_capacity(session.agent_snapshots.len());
        let mut frozen = Vec::with_capacity(session.agent_snapshots.len());
        for snapshot in &session.agent_snapshots {
            let settings = match &snapshot.settings {
                Some(settings) => settings.clone(),
                None => agents
                    .iter()
                    .find(|agent| agent.id == snapshot.id)
                    .ok_or_else(|| RunDeliberationError::AgentNotFound(snapshot.id.clone()))?
                    .settings(),
            };
            settings.validate(&snapshot.name)?;

            let provider = match &settings.provider_ref {
                Some(provider_id) => self.store.get_provider(provider_id).await?,
                None => self.default_provider.clone(),
            };
            provider.validate()?;

            participants.push(Participant::new(
                snapshot.id.clone(),
                snapshot.name.clone(),
                &settings,
                provider,
            ));
            frozen.push(AgentSnapshot {
                settings: Some(settings),
                ..snapshot.clone()
            });
        }
        Ok((participants, frozen))
    }

    /// Store the frozen agent settings. A draft session also moves to
    /// running in the same write.
    async fn claim(
        &self,
        session: &Session,
        mode: StartMode,
        frozen: Vec<AgentSnapshot>,
    ) -> Result<(), RunDeliberationError> {
        let update = match mode {
            StartMode::Fresh => SessionUpdate::new()
                .require(session.status)
                .status(session.status.transition(SessionEvent::Start)?),
            StartMode::Resume { .. } if frozen == session.agent_snapshots => return Ok(()),
            StartMode::Resume { .. } => SessionUpdate::new().require(SessionStatus::Running),
        }
        .agent_snapshots(frozen);

        match self.store.update_session(&session.id, update).await {
            Ok(_) => Ok(()),
            // Someone else started or cancelled it since we read it
            Err(StoreError::StatusConflict { actual, .. }) => {
                Err(DomainError::InvalidTransition {
                    from: actual,
                    event: SessionEvent::Start,
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn run_rounds(
        &self,
        session: &Session,
        participants: &[Participant],
        transcript: &mut TranscriptAccumulator<S>,
        progress: &dyn DeliberationProgress,
    ) -> Result<(Option<Halt>, bool), StoreError> {
        let schedule = RoundSchedule::for_session(session);
        let executor = Arc::new(
            AgentTurnExecutor::new(
                Arc::clone(&self.provider),
                self.params.retry.clone(),
                self.params.call_timeout,
            )
            .with_cancellation(self.cancellation.clone()),
        );
        // Rounds already visited without a turn count towards the limit too
        let last_spoken = transcript.turns().iter().map(|t| t.round).max().unwrap_or(0);
        let mut consecutive_empty = transcript.current_round().saturating_sub(last_spoken);
        if self.early_stop_due(transcript, consecutive_empty)
            && transcript.current_round() < session.max_rounds
        {
            warn!(
                "No agent has contributed in {} round(s); not resuming the remaining rounds",
                consecutive_empty
            );
            return Ok((None, true));
        }

        for round in schedule.rounds_after(transcript.current_round()) {
            let pending = schedule.pending_positions(round, transcript.turns());
            debug!("Round {}: {} agent(s) pending", round, pending.len());
            progress.on_round_start(round, session.max_rounds, pending.len());

            let halt = if self.params.concurrent_turns {
                self.run_round_concurrent(
                    session, participants, round, &pending, &executor, transcript, progress,
                )
                .await?
            } else {
                self.run_round_sequential(
                    session, participants, round, &pending, &executor, transcript, progress,
                )
                .await?
            };
            if halt.is_some() {
                return Ok((halt, false));
            }

            match transcript.finish_round(round).await? {
                WriteOutcome::Persisted => {}
                WriteOutcome::Halted(status) => return Ok((Some(Halt::Status(status)), false)),
                WriteOutcome::Superseded => return Ok((Some(Halt::Superseded), false)),
            }

            let recorded = transcript.turns_in_round(round);
            progress.on_round_complete(round, recorded);

            if recorded > 0 {
                consecutive_empty = 0;
                continue;
            }

            consecutive_empty += 1;
            warn!("Round {} produced no turns", round);
            self.logger
                .log(ConversationEvent::round_empty(&session.id, round));

            if self.early_stop_due(transcript, consecutive_empty) && round < session.max_rounds {
                warn!(
                    "No agent has contributed after {} round(s); skipping the remaining rounds",
                    consecutive_empty
                );
                return Ok((None, true));
            }
        }

        Ok((None, false))
    }

    /// Whether the empty-round limit is reached while nobody has spoken yet.
    fn early_stop_due(&self, transcript: &TranscriptAccumulator<S>, consecutive_empty: u32) -> bool {
        let limit_reached = self
            .params
            .empty_round_limit
            .is_some_and(|limit| limit > 0 && consecutive_empty >= limit);
        transcript.is_empty() && limit_reached
    }

    /// Visit pending agents one at a time; each sees the turns before it.
    #[allow(clippy::too_many_arguments)]
    async fn run_round_sequential(
        &self,
        session: &Session,
        participants: &[Participant],
        round: u32,
        pending: &[usize],
        executor: &AgentTurnExecutor<P>,
        transcript: &mut TranscriptAccumulator<S>,
        progress: &dyn DeliberationProgress,
    ) -> Result<Option<Halt>, StoreError> {
        let window = ContextWindow::new(self.params.context_window);

        for &position in pending {
            if let Some(halt) = self.check_halt(transcript).await? {
                return Ok(Some(halt));
            }

            let participant = &participants[position];
            let input = TurnInput {
                topic: &session.topic,
                objective: session.objective.as_deref(),
                round,
                max_rounds: session.max_rounds,
                prior_turns: window.select(transcript.turns()),
            };
            let result = executor.execute(participant, &input).await;

            if let Some(halt) = self
                .record(session, round, participant, result, transcript, progress)
                .await?
            {
                return Ok(Some(halt));
            }
        }

        Ok(None)
    }

    /// Call every pending agent at once against the context as it stood at
    /// the start of the round, then record the replies in visiting order.
    #[allow(clippy::too_many_arguments)]
    async fn run_round_concurrent(
        &self,
        session: &Session,
        participants: &[Participant],
        round: u32,
        pending: &[usize],
        executor: &Arc<AgentTurnExecutor<P>>,
        transcript: &mut TranscriptAccumulator<S>,
        progress: &dyn DeliberationProgress,
    ) -> Result<Option<Halt>, StoreError> {
        if let Some(halt) = self.check_halt(transcript).await? {
            return Ok(Some(halt));
        }

        let window = ContextWindow::new(self.params.context_window);
        let prior: Arc<[Turn]> = window.select(transcript.turns()).into();
        let topic: Arc<str> = session.topic.as_str().into();
        let objective: Option<Arc<str>> = session.objective.as_deref().map(Into::into);

        let mut join_set = JoinSet::new();
        for (slot, &position) in pending.iter().enumerate() {
            let executor = Arc::clone(executor);
            let participant = participants[position].clone();
            let prior = Arc::clone(&prior);
            let topic = Arc::clone(&topic);
            let objective = objective.clone();
            let max_rounds = session.max_rounds;

            join_set.spawn(async move {
                let input = TurnInput {
                    topic: &topic[..],
                    objective: objective.as_deref(),
                    round,
                    max_rounds,
                    prior_turns: &prior[..],
                };
                (slot, executor.execute(&participant, &input).await)
            });
        }

        let mut results: Vec<Option<Result<Turn, TurnError>>> =
            (0..pending.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((slot, result)) => results[slot] = Some(result),
                Err(e) => warn!("Turn task join error: {}", e),
            }
        }

        for (slot, result) in results.into_iter().enumerate() {
            // A task that panicked never reported back
            let result = result.unwrap_or_else(|| {
                Err(TurnError::Aborted {
                    agent: participants[pending[slot]].name.clone(),
                })
            });
            if let Some(halt) = self.check_halt(transcript).await? {
                return Ok(Some(halt));
            }
            let participant = &participants[pending[slot]];
            if let Some(halt) = self
                .record(session, round, participant, result, transcript, progress)
                .await?
            {
                return Ok(Some(halt));
            }
        }

        Ok(None)
    }

    /// Persist a successful turn or log a skipped one.
    async fn record(
        &self,
        session: &Session,
        round: u32,
        participant: &Participant,
        result: Result<Turn, TurnError>,
        transcript: &mut TranscriptAccumulator<S>,
        progress: &dyn DeliberationProgress,
    ) -> Result<Option<Halt>, StoreError> {
        let turn = match result {
            Ok(turn) => turn,
            Err(e) => {
                warn!("Skipping {} in round {}: {}", participant.name, round, e);
                self.logger.log(ConversationEvent::turn_failed(
                    &session.id,
                    round,
                    participant,
                    &e.to_string(),
                ));
                progress.on_turn_complete(round, participant, false);
                return Ok(None);
            }
        };

        match transcript.append(turn).await? {
            WriteOutcome::Persisted => {
                if let Some(turn) = transcript.last() {
                    self.logger
                        .log(ConversationEvent::turn_appended(&session.id, turn));
                }
                progress.on_turn_complete(round, participant, true);
                Ok(None)
            }
            WriteOutcome::Halted(status) => {
                info!(
                    "Discarding {}'s round {} turn: session is {}",
                    participant.name, round, status
                );
                Ok(Some(Halt::Status(status)))
            }
            WriteOutcome::Superseded => {
                info!(
                    "Discarding {}'s round {} turn: another run got there first",
                    participant.name, round
                );
                Ok(Some(Halt::Superseded))
            }
        }
    }

    async fn check_halt(
        &self,
        transcript: &TranscriptAccumulator<S>,
    ) -> Result<Option<Halt>, StoreError> {
        let status = transcript.stored_status().await?;
        if status != SessionStatus::Running {
            return Ok(Some(Halt::Status(status)));
        }
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return Ok(Some(Halt::Interrupted));
        }
        Ok(None)
    }

    async fn synthesize(
        &self,
        session: &Session,
        transcript: &TranscriptAccumulator<S>,
        progress: &dyn DeliberationProgress,
    ) -> Vec<String> {
        if transcript.is_empty() {
            info!("No turns recorded; skipping synthesis");
            return Vec::new();
        }

        progress.on_synthesis_start();
        let outcome = SynthesisStep::new(
            Arc::clone(&self.provider),
            self.default_provider.clone(),
            self.params.retry.clone(),
            self.params.call_timeout,
        )
        .with_params(self.params.synthesis.clone())
        .with_cancellation(self.cancellation.clone())
        .run(&session.topic, transcript.turns())
        .await;

        match &outcome {
            SynthesisOutcome::Items(items) => self
                .logger
                .log(ConversationEvent::synthesis_completed(&session.id, items)),
            SynthesisOutcome::Unparseable => self.logger.log(ConversationEvent::synthesis_failed(
                &session.id,
                "unparseable reply",
            )),
            SynthesisOutcome::Failed(e) => self
                .logger
                .log(ConversationEvent::synthesis_failed(&session.id, &e.to_string())),
            SynthesisOutcome::Skipped => {}
        }

        let items = outcome.into_items();
        progress.on_synthesis_complete(&items);
        items
    }

    async fn complete(
        &self,
        session: &Session,
        transcript: &TranscriptAccumulator<S>,
        action_items: Vec<String>,
        stopped_early: bool,
    ) -> Result<DeliberationOutcome, RunDeliberationError> {
        let next = SessionStatus::Running.transition(SessionEvent::Complete)?;
        let update = SessionUpdate::new()
            .require(SessionStatus::Running)
            .require_turns(transcript.len())
            .status(next)
            .action_items(action_items.clone())
            .completed_at(Utc::now());

        match self.store.update_session(&session.id, update).await {
            Ok(_) => {}
            Err(StoreError::StatusConflict {
                actual: SessionStatus::Cancelled,
                ..
            }) => return Ok(self.cancelled(session, transcript, stopped_early)),
            Err(StoreError::TranscriptConflict { .. }) => {
                return Err(RunDeliberationError::ConcurrentRun(session.id.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        let outcome = self.outcome(session, transcript, next, action_items, stopped_early);
        if outcome.is_partial() {
            info!(
                "Session {} completed with {}/{} turns",
                session.id, outcome.turns_recorded, outcome.expected_turns
            );
        } else {
            info!("Session {} completed", session.id);
        }
        self.logger.log(ConversationEvent::session_finished(
            &session.id,
            next,
            outcome.turns_recorded,
        ));
        Ok(outcome)
    }

    fn cancelled(
        &self,
        session: &Session,
        transcript: &TranscriptAccumulator<S>,
        stopped_early: bool,
    ) -> DeliberationOutcome {
        info!(
            "Session {} was cancelled after {} turn(s)",
            session.id,
            transcript.len()
        );
        self.logger.log(ConversationEvent::session_finished(
            &session.id,
            SessionStatus::Cancelled,
            transcript.len(),
        ));
        self.outcome(
            session,
            transcript,
            SessionStatus::Cancelled,
            Vec::new(),
            stopped_early,
        )
    }

    fn outcome(
        &self,
        session: &Session,
        transcript: &TranscriptAccumulator<S>,
        status: SessionStatus,
        action_items: Vec<String>,
        stopped_early: bool,
    ) -> DeliberationOutcome {
        DeliberationOutcome {
            session_id: session.id.clone(),
            status,
            turns_recorded: transcript.len(),
            expected_turns: session.expected_turns(),
            last_round: transcript.current_round(),
            action_items,
            stopped_early,
        }
    }
}
