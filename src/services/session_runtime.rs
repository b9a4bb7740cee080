//! Single-owner task driving the session controller.
//!
//! Player intents arrive as commands over an mpsc queue and are handled one at
//! a time, so every mutation and its persistence happen atomically with
//! respect to each other. Paced steps of a guess are scheduled as timers that
//! feed continuations back into the same loop, and a periodic check restarts
//! the session when the calendar day changes. Catalog reloads run on their own
//! task and report back the same way, so a slow catalog host never stalls
//! player intents.

use std::time::Duration;

use tokio::{
    sync::{mpsc, oneshot},
    time::{MissedTickBehavior, interval, sleep},
};
use tracing::{info, warn};

use crate::{
    dao::{
        catalog::{CatalogError, CatalogSource, load_catalog},
        kv_store::KeyValueStore,
    },
    dto::{
        session::{SelectResponse, SessionView, SubmitStatus},
        sse::AnimationStage,
    },
    error::ServiceError,
    services::{
        calendar::today_local,
        pacing::{
            CORRECT_DISSOLVE_DELAY, CORRECT_HOP_DURATION, CORRECT_SEQUENCE, DAY_CHECK_INTERVAL,
            PRE_CHECK_DELAY, WRONG_SEQUENCE,
        },
        session_service::SessionController,
    },
    state::{
        catalog::Catalog,
        state_machine::{PlanId, SubmitOutcome, Verdict},
    },
};

const COMMAND_CAPACITY: usize = 32;

type Clock = Box<dyn Fn() -> String + Send>;

enum SessionCommand {
    View {
        reply: oneshot::Sender<SessionView>,
    },
    Select {
        word: String,
        reply: oneshot::Sender<SelectResponse>,
    },
    DeselectAll {
        reply: oneshot::Sender<SessionView>,
    },
    Shuffle {
        reply: oneshot::Sender<SessionView>,
    },
    Submit {
        reply: oneshot::Sender<SubmitStatus>,
    },
    NextPuzzle {
        reply: oneshot::Sender<Result<SessionView, ServiceError>>,
    },
}

enum Continuation {
    Grade(PlanId),
    Animate(PlanId, AnimationStage),
    Apply(PlanId),
    CatalogLoaded {
        date: String,
        result: Result<Catalog, CatalogError>,
    },
}

/// Builder and event loop for the session task.
pub struct SessionRuntime<S> {
    controller: SessionController<S>,
    clock: Clock,
    catalog_source: Option<CatalogSource>,
    day_check: Duration,
    /// Day whose catalog reload is in flight.
    reloading: Option<String>,
}

impl<S: KeyValueStore + 'static> SessionRuntime<S> {
    /// Wrap an already started controller. Days are read from the local clock.
    pub fn new(controller: SessionController<S>) -> Self {
        Self {
            controller,
            clock: Box::new(today_local),
            catalog_source: None,
            day_check: DAY_CHECK_INTERVAL,
            reloading: None,
        }
    }

    /// Read the current day from `clock` instead of the local calendar.
    pub fn with_clock(mut self, clock: impl Fn() -> String + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Reload the catalog from `source` whenever the day changes.
    pub fn with_catalog_source(mut self, source: CatalogSource) -> Self {
        self.catalog_source = Some(source);
        self
    }

    /// Check for a new calendar day every `period` instead of [`DAY_CHECK_INTERVAL`].
    pub fn with_day_check(mut self, period: Duration) -> Self {
        self.day_check = period;
        self
    }

    /// Move the loop onto a Tokio task and return the handle used to talk to it.
    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        tokio::spawn(self.run(rx));
        SessionHandle { commands: tx }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        let (continuation_tx, mut continuations) = mpsc::unbounded_channel();
        let mut day_check = interval(self.day_check);
        day_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command, &continuation_tx),
                    None => break,
                },
                Some(continuation) = continuations.recv() => {
                    self.handle_continuation(continuation, &continuation_tx);
                }
                _ = day_check.tick() => self.check_day(&continuation_tx),
            }
        }
        info!("session runtime stopped");
    }

    fn handle_command(
        &mut self,
        command: SessionCommand,
        continuations: &mpsc::UnboundedSender<Continuation>,
    ) {
        match command {
            SessionCommand::View { reply } => {
                let _ = reply.send(self.controller.view());
            }
            SessionCommand::Select { word, reply } => {
                let selected = self.controller.select(&word);
                let submit_enabled = self
                    .controller
                    .session()
                    .is_some_and(|session| session.can_submit());
                let _ = reply.send(SelectResponse {
                    selected,
                    submit_enabled,
                });
            }
            SessionCommand::DeselectAll { reply } => {
                self.controller.deselect_all();
                let _ = reply.send(self.controller.view());
            }
            SessionCommand::Shuffle { reply } => {
                self.controller.shuffle();
                let _ = reply.send(self.controller.view());
            }
            SessionCommand::Submit { reply } => {
                let status = match self.controller.submit_guess() {
                    SubmitOutcome::Planned(plan) => {
                        schedule(continuations, PRE_CHECK_DELAY, Continuation::Grade(plan.id));
                        SubmitStatus::Pending
                    }
                    SubmitOutcome::Duplicate => SubmitStatus::Duplicate,
                    SubmitOutcome::InFlight => SubmitStatus::InFlight,
                    SubmitOutcome::Ignored => SubmitStatus::Ignored,
                };
                let _ = reply.send(status);
            }
            SessionCommand::NextPuzzle { reply } => {
                let result = self
                    .controller
                    .next_puzzle()
                    .map(|_| self.controller.view());
                let _ = reply.send(result);
            }
        }
    }

    fn handle_continuation(
        &mut self,
        continuation: Continuation,
        continuations: &mpsc::UnboundedSender<Continuation>,
    ) {
        match continuation {
            Continuation::Grade(plan_id) => match self.controller.grade(plan_id) {
                Some(Verdict::Correct(_)) => {
                    schedule(
                        continuations,
                        CORRECT_HOP_DURATION,
                        Continuation::Animate(plan_id, AnimationStage::Settle),
                    );
                    schedule(
                        continuations,
                        CORRECT_DISSOLVE_DELAY,
                        Continuation::Animate(plan_id, AnimationStage::Dissolve),
                    );
                    schedule(continuations, CORRECT_SEQUENCE, Continuation::Apply(plan_id));
                }
                Some(Verdict::Wrong { .. }) => {
                    schedule(continuations, WRONG_SEQUENCE, Continuation::Apply(plan_id));
                }
                None => {}
            },
            Continuation::Animate(plan_id, stage) => self.controller.animate(plan_id, stage),
            Continuation::Apply(plan_id) => {
                self.controller.resolve(plan_id);
            }
            Continuation::CatalogLoaded { date, result } => {
                self.reloading = None;
                match result {
                    Ok(catalog) => self.controller.replace_catalog(catalog),
                    Err(err) => {
                        warn!(error = %err, "catalog reload failed; keeping the previous one")
                    }
                }
                if date != self.controller.date() {
                    // Errors are already reported to the player by the controller.
                    let _ = self.controller.start(&date);
                }
            }
        }
    }

    fn check_day(&mut self, continuations: &mpsc::UnboundedSender<Continuation>) {
        let today = (self.clock)();
        if today == self.controller.date() || self.reloading.as_deref() == Some(today.as_str()) {
            return;
        }
        info!(from = %self.controller.date(), to = %today, "calendar day changed");

        let Some(source) = self.catalog_source.clone() else {
            let _ = self.controller.start(&today);
            return;
        };

        // The previous day keeps being served until the reload reports back.
        self.reloading = Some(today.clone());
        let tx = continuations.clone();
        tokio::spawn(async move {
            let result = load_catalog(&source).await;
            let _ = tx.send(Continuation::CatalogLoaded {
                date: today,
                result,
            });
        });
    }
}

fn schedule(
    continuations: &mpsc::UnboundedSender<Continuation>,
    delay: Duration,
    continuation: Continuation,
) {
    let tx = continuations.clone();
    tokio::spawn(async move {
        sleep(delay).await;
        let _ = tx.send(continuation);
    });
}

/// Cloneable handle forwarding player intents to the session task.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ServiceError::RuntimeStopped)?;
        response.await.map_err(|_| ServiceError::RuntimeStopped)
    }

    /// Current board.
    pub async fn view(&self) -> Result<SessionView, ServiceError> {
        self.request(|reply| SessionCommand::View { reply }).await
    }

    /// Toggle a word in the selection.
    pub async fn select(&self, word: String) -> Result<SelectResponse, ServiceError> {
        self.request(|reply| SessionCommand::Select { word, reply })
            .await
    }

    /// Clear the selection.
    pub async fn deselect_all(&self) -> Result<SessionView, ServiceError> {
        self.request(|reply| SessionCommand::DeselectAll { reply })
            .await
    }

    /// Reorder the remaining tiles.
    pub async fn shuffle(&self) -> Result<SessionView, ServiceError> {
        self.request(|reply| SessionCommand::Shuffle { reply }).await
    }

    /// Submit the current selection; the verdict arrives on the event stream.
    pub async fn submit(&self) -> Result<SubmitStatus, ServiceError> {
        self.request(|reply| SessionCommand::Submit { reply }).await
    }

    /// Play the next catalog entry.
    pub async fn next_puzzle(&self) -> Result<SessionView, ServiceError> {
        self.request(|reply| SessionCommand::NextPuzzle { reply })
            .await?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tempfile::tempdir;

    use super::*;
    use crate::{
        dao::{kv_store::MemoryStore, models::CatalogEntity, puzzle_store::PuzzleStore},
        dto::session::VisiblePhase,
        services::presentation::{PresentationEvent, recording::RecordingPresenter},
        state::puzzle::{Puzzle, fixtures::kitchen_entity},
    };

    const TODAY: &str = "05.03.2025";
    const TOMORROW: &str = "06.03.2025";

    fn spawn_at(day: Arc<Mutex<String>>) -> (SessionHandle, RecordingPresenter) {
        spawn_with(day, |runtime| runtime)
    }

    fn spawn_with(
        day: Arc<Mutex<String>>,
        configure: impl FnOnce(SessionRuntime<MemoryStore>) -> SessionRuntime<MemoryStore>,
    ) -> (SessionHandle, RecordingPresenter) {
        let catalog = Catalog::new(vec![
            Puzzle::try_from(kitchen_entity("1", TODAY)).unwrap(),
            Puzzle::try_from(kitchen_entity("2", TOMORROW)).unwrap(),
        ]);
        let presenter = RecordingPresenter::default();
        let mut controller = SessionController::new(
            catalog,
            PuzzleStore::new(MemoryStore::new()),
            Arc::new(presenter.clone()),
        );
        let today = day.lock().unwrap().clone();
        controller.start(&today).unwrap();

        let runtime =
            SessionRuntime::new(controller).with_clock(move || day.lock().unwrap().clone());
        let handle = configure(runtime).spawn();
        (handle, presenter)
    }

    async fn select_all(handle: &SessionHandle, words: &[&str]) {
        for word in words {
            handle.select(word.to_string()).await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn correct_guess_is_applied_after_its_animation() {
        let (handle, presenter) = spawn_at(Arc::new(Mutex::new(TODAY.into())));
        select_all(&handle, &["FORK", "SPOON", "KNIFE", "WHISK"]).await;
        presenter.take();

        assert_eq!(handle.submit().await.unwrap(), SubmitStatus::Pending);
        assert!(handle.view().await.unwrap().guess_pending);

        sleep(CORRECT_HOP_DURATION).await;
        assert_eq!(handle.view().await.unwrap().remaining.len(), 16);

        sleep(PRE_CHECK_DELAY + CORRECT_SEQUENCE).await;
        let view = handle.view().await.unwrap();
        assert_eq!(view.remaining.len(), 12);
        assert_eq!(view.solved.len(), 1);
        assert!(!view.guess_pending);

        let stages: Vec<AnimationStage> = presenter
            .take()
            .into_iter()
            .filter_map(|event| match event {
                PresentationEvent::GuessAnimation(animation) => Some(animation.stage),
                _ => None,
            })
            .collect();
        assert_eq!(stages, vec![AnimationStage::Settle, AnimationStage::Dissolve]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_pending_is_in_flight() {
        let (handle, _) = spawn_at(Arc::new(Mutex::new(TODAY.into())));
        select_all(&handle, &["FORK", "SPOON", "KNIFE", "RISK"]).await;

        assert_eq!(handle.submit().await.unwrap(), SubmitStatus::Pending);
        assert_eq!(handle.submit().await.unwrap(), SubmitStatus::InFlight);

        sleep(PRE_CHECK_DELAY + WRONG_SEQUENCE + Duration::from_millis(10)).await;
        let view = handle.view().await.unwrap();
        assert_eq!(view.mistakes, 1);
        assert_eq!(handle.submit().await.unwrap(), SubmitStatus::Duplicate);
    }

    #[tokio::test(start_paused = true)]
    async fn day_change_restarts_the_session() {
        let day = Arc::new(Mutex::new(TODAY.to_string()));
        let (handle, _) = spawn_at(day.clone());
        select_all(&handle, &["FORK", "SPOON", "KNIFE", "RISK"]).await;
        handle.submit().await.unwrap();

        *day.lock().unwrap() = TOMORROW.into();
        sleep(DAY_CHECK_INTERVAL + Duration::from_secs(1)).await;

        let view = handle.view().await.unwrap();
        assert_eq!(view.date, TOMORROW);
        assert_eq!(view.puzzle_id.as_deref(), Some("2"));
        assert_eq!(view.mistakes, 0);
        assert!(!view.guess_pending);
        assert_eq!(view.phase, VisiblePhase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn next_puzzle_cycles_the_catalog() {
        let (handle, _) = spawn_at(Arc::new(Mutex::new(TODAY.into())));
        let view = handle.next_puzzle().await.unwrap();
        assert_eq!(view.puzzle_id.as_deref(), Some("2"));
        assert_eq!(view.date, TODAY);

        let view = handle.next_puzzle().await.unwrap();
        assert_eq!(view.puzzle_id.as_deref(), Some("1"));
    }

    #[cfg(feature = "remote-catalog")]
    #[tokio::test]
    async fn stalled_catalog_reload_keeps_serving_intents() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and never answer.
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let day = Arc::new(Mutex::new(TODAY.to_string()));
        let (handle, _) = spawn_with(day.clone(), |runtime| {
            runtime
                .with_day_check(Duration::from_millis(20))
                .with_catalog_source(CatalogSource::Remote(format!("http://{addr}/puzzles.json")))
        });

        *day.lock().unwrap() = TOMORROW.into();
        sleep(Duration::from_millis(100)).await;

        let view = tokio::time::timeout(Duration::from_secs(1), handle.view())
            .await
            .expect("view answered while the catalog reload hangs")
            .unwrap();
        assert_eq!(view.date, TODAY);
        assert_eq!(handle.select("FORK".into()).await.unwrap().selected, 1);
    }

    #[tokio::test]
    async fn reloaded_catalog_serves_the_new_day() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("puzzles.json");
        let entity = CatalogEntity {
            puzzles: vec![kitchen_entity("7", TOMORROW)],
        };
        std::fs::write(&path, serde_json::to_string(&entity).unwrap()).unwrap();

        let day = Arc::new(Mutex::new(TODAY.to_string()));
        let (handle, _) = spawn_with(day.clone(), |runtime| {
            runtime
                .with_day_check(Duration::from_millis(10))
                .with_catalog_source(CatalogSource::File(path))
        });
        *day.lock().unwrap() = TOMORROW.into();

        let mut view = handle.view().await.unwrap();
        for _ in 0..200 {
            if view.date == TOMORROW {
                break;
            }
            sleep(Duration::from_millis(10)).await;
            view = handle.view().await.unwrap();
        }
        assert_eq!(view.date, TOMORROW);
        assert_eq!(view.puzzle_id.as_deref(), Some("7"));
    }
}
