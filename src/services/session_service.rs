//! Session controller: binds the catalog, the persistence adapter and the
//! session state machine, and decides when state is written and what the
//! presentation layer is told.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    dao::{
        kv_store::KeyValueStore,
        models::{FinalKind, FinalStateEntity, ProgressEntity},
        puzzle_store::{PuzzleKey, PuzzleStore},
    },
    dto::{
        session::{CategoryView, SessionView, VisiblePhase},
        sse::{AnimationStage, GuessAnimationEvent, GuessGradedEvent, GuessPendingEvent, MessageKind},
    },
    error::ServiceError,
    services::{
        pacing::{CORRECT_SEQUENCE, DUPLICATE_MESSAGE_DURATION, WRONG_SEQUENCE},
        presentation::{
            PresentationEvent, Presenter, TEXT_CORRECT, TEXT_DUPLICATE, TEXT_FAILED,
            TEXT_NO_PUZZLE, TEXT_ONE_AWAY, TEXT_SOLVED, TEXT_WRONG,
        },
    },
    state::{
        catalog::Catalog,
        puzzle::{Puzzle, SolvedCategory},
        state_machine::{
            MAX_MISTAKES, PlanId, Resolution, RestoredProgress, Session, SessionPhase,
            SubmitOutcome, Verdict,
        },
    },
};

struct ActiveSession {
    index: usize,
    key: PuzzleKey,
    session: Session,
}

/// Owns the day's session and every side effect attached to it.
pub struct SessionController<S> {
    catalog: Catalog,
    store: PuzzleStore<S>,
    presenter: Arc<dyn Presenter>,
    date: String,
    active: Option<ActiveSession>,
    trophies: u32,
}

impl<S: KeyValueStore> SessionController<S> {
    /// Build an idle controller; call [`SessionController::start`] to load a puzzle.
    pub fn new(catalog: Catalog, store: PuzzleStore<S>, presenter: Arc<dyn Presenter>) -> Self {
        let trophies = store.trophy_count();
        Self {
            catalog,
            store,
            presenter,
            date: String::new(),
            active: None,
            trophies,
        }
    }

    /// Day the controller was last started for.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Session in progress, if a puzzle is loaded.
    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// Storage key of the loaded puzzle.
    pub fn puzzle_key(&self) -> Option<&PuzzleKey> {
        self.active.as_ref().map(|active| &active.key)
    }

    /// Persistence adapter in use.
    pub fn store(&self) -> &PuzzleStore<S> {
        &self.store
    }

    /// Give back the persistence adapter.
    pub fn into_store(self) -> PuzzleStore<S> {
        self.store
    }

    /// Swap in a freshly loaded catalog. The current session is kept until the next start.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
    }

    /// Load the puzzle published on `date`.
    ///
    /// A locked puzzle comes back frozen in its final state, an unfinished one
    /// resumes from its progress snapshot, anything else starts fresh.
    pub fn start(&mut self, date: &str) -> Result<SessionPhase, ServiceError> {
        self.date = date.to_string();

        let Some((index, puzzle)) = self.catalog.select_for_date(date) else {
            self.active = None;
            warn!(date, puzzles = self.catalog.len(), "no puzzle available for today");
            self.presenter.present(PresentationEvent::message(
                TEXT_NO_PUZZLE,
                MessageKind::Incorrect,
                None,
            ));
            self.refresh();
            return Err(ServiceError::NoPuzzle(date.to_string()));
        };

        let key = PuzzleKey::new(date, puzzle.id());
        let session = self.resume(&key, puzzle);
        let phase = session.phase();
        info!(date, puzzle_id = %key.puzzle_id, ?phase, "session started");

        self.active = Some(ActiveSession {
            index,
            key,
            session,
        });
        self.refresh();
        if phase.is_terminal() {
            self.announce_end(phase);
        }
        Ok(phase)
    }

    /// Abandon the current puzzle and play the next catalog entry from scratch.
    ///
    /// Locks are not consulted. The new session is keyed by today's date.
    pub fn next_puzzle(&mut self) -> Result<SessionPhase, ServiceError> {
        let next = match &self.active {
            Some(active) => self.catalog.next_index(active.index),
            None => (!self.catalog.is_empty()).then_some(0),
        };
        let Some((index, puzzle)) =
            next.and_then(|index| self.catalog.get(index).map(|puzzle| (index, puzzle)))
        else {
            return Err(ServiceError::NoPuzzle(self.date.clone()));
        };

        let key = PuzzleKey::new(self.date.clone(), puzzle.id());
        info!(date = %self.date, puzzle_id = %key.puzzle_id, "switched to next puzzle");
        self.active = Some(ActiveSession {
            index,
            key,
            session: Session::new(puzzle),
        });
        self.refresh();
        Ok(SessionPhase::Playing)
    }

    /// Toggle `word` in the selection and return the selection size.
    pub fn select(&mut self, word: &str) -> usize {
        let Some(active) = self.active.as_mut() else {
            return 0;
        };

        let before = active.session.selected().len();
        let size = active.session.select(word);
        if size != before {
            self.save_progress();
            self.refresh();
        }
        size
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.session.selected().is_empty() {
            return;
        }

        active.session.deselect_all();
        self.save_progress();
        self.refresh();
    }

    /// Reorder the remaining tiles. Display order is not persisted.
    pub fn shuffle(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let shuffled = active.session.shuffle(&mut rand::rng());
        if shuffled {
            self.refresh();
        }
        shuffled
    }

    /// Submit the current selection as a guess.
    ///
    /// An accepted guess stays pending until [`SessionController::resolve`] is
    /// called with the returned plan id.
    pub fn submit_guess(&mut self) -> SubmitOutcome {
        let Some(active) = self.active.as_mut() else {
            return SubmitOutcome::Ignored;
        };

        let outcome = active.session.submit();
        match &outcome {
            SubmitOutcome::Planned(plan) => {
                info!(plan_id = %plan.id, words = ?plan.words, "guess submitted");
                self.presenter
                    .present(PresentationEvent::GuessPending(GuessPendingEvent {
                        words: plan.words.clone(),
                    }));
                self.refresh();
            }
            SubmitOutcome::Duplicate => {
                debug!("combination already tried");
                self.presenter.present(PresentationEvent::message(
                    TEXT_DUPLICATE,
                    MessageKind::Incorrect,
                    Some(DUPLICATE_MESSAGE_DURATION),
                ));
            }
            SubmitOutcome::Ignored | SubmitOutcome::InFlight => {
                debug!(?outcome, "submit ignored");
            }
        }
        outcome
    }

    /// Reveal the verdict of the pending guess so the presentation layer can animate it.
    pub fn grade(&mut self, plan_id: PlanId) -> Option<Verdict> {
        let active = self.active.as_ref()?;
        let verdict = match active.session.grade(plan_id) {
            Ok(verdict) => verdict,
            Err(err) => {
                debug!(%plan_id, error = %err, "dropping stale grading");
                return None;
            }
        };
        let words = active.session.pending()?.words.clone();

        let graded = match &verdict {
            Verdict::Correct(category) => GuessGradedEvent {
                correct: true,
                words,
                category: Some(CategoryView::from(&SolvedCategory::from(category))),
                one_away: false,
            },
            Verdict::Wrong { .. } => GuessGradedEvent {
                correct: false,
                words,
                category: None,
                one_away: verdict.is_one_away(),
            },
        };
        self.presenter.present(PresentationEvent::GuessGraded(graded));

        let message = match &verdict {
            Verdict::Correct(_) => {
                PresentationEvent::message(TEXT_CORRECT, MessageKind::Correct, Some(CORRECT_SEQUENCE))
            }
            Verdict::Wrong { .. } if verdict.is_one_away() => {
                PresentationEvent::message(TEXT_ONE_AWAY, MessageKind::Incorrect, Some(WRONG_SEQUENCE))
            }
            Verdict::Wrong { .. } => {
                PresentationEvent::message(TEXT_WRONG, MessageKind::Incorrect, Some(WRONG_SEQUENCE))
            }
        };
        self.presenter.present(message);
        Some(verdict)
    }

    /// Tell the presentation layer a pacing step of a correct guess elapsed.
    pub fn animate(&self, plan_id: PlanId, stage: AnimationStage) {
        let Some(plan) = self.session().and_then(|session| session.pending()) else {
            return;
        };
        if plan.id != plan_id {
            return;
        }
        self.presenter
            .present(PresentationEvent::GuessAnimation(GuessAnimationEvent {
                stage,
                words: plan.words.clone(),
            }));
    }

    /// Apply the pending guess and persist the outcome.
    ///
    /// Stale plan ids, for instance after the day rolled over, are ignored.
    pub fn resolve(&mut self, plan_id: PlanId) -> Option<Resolution> {
        let active = self.active.as_mut()?;
        let resolution = match active.session.apply(plan_id) {
            Ok(resolution) => resolution,
            Err(err) => {
                debug!(%plan_id, error = %err, "dropping stale resolution");
                return None;
            }
        };
        info!(
            %plan_id,
            correct = matches!(resolution.verdict, Verdict::Correct(_)),
            mistakes = active.session.mistakes(),
            phase = ?resolution.phase,
            "guess applied"
        );

        match resolution.phase {
            SessionPhase::Playing => self.save_progress(),
            SessionPhase::Solved => self.finalize(FinalKind::Solved),
            SessionPhase::Failed => self.finalize(FinalKind::Failed),
        }
        self.refresh();
        if resolution.phase.is_terminal() {
            self.announce_end(resolution.phase);
        }
        Some(resolution)
    }

    /// Everything the presentation layer needs to draw the board.
    pub fn view(&self) -> SessionView {
        let Some(active) = &self.active else {
            return SessionView {
                date: self.date.clone(),
                puzzle_id: None,
                phase: VisiblePhase::Unavailable,
                mistakes: 0,
                mistakes_remaining: MAX_MISTAKES,
                selected: Vec::new(),
                remaining: Vec::new(),
                solved: Vec::new(),
                submit_enabled: false,
                guess_pending: false,
                trophies: self.trophies,
            };
        };

        let session = &active.session;
        SessionView {
            date: self.date.clone(),
            puzzle_id: Some(active.key.puzzle_id.clone()),
            phase: session.phase().into(),
            mistakes: session.mistakes(),
            mistakes_remaining: MAX_MISTAKES.saturating_sub(session.mistakes()),
            selected: session.selected().to_vec(),
            remaining: session.remaining().iter().map(|tile| tile.word.clone()).collect(),
            solved: session.solved().iter().map(CategoryView::from).collect(),
            submit_enabled: session.can_submit(),
            guess_pending: session.pending().is_some(),
            trophies: self.trophies,
        }
    }

    fn resume(&self, key: &PuzzleKey, puzzle: Arc<Puzzle>) -> Session {
        if self.store.is_locked(key) {
            return match self.store.load_final(key) {
                Some(record) => {
                    let phase = match record.kind {
                        FinalKind::Solved => SessionPhase::Solved,
                        FinalKind::Failed => SessionPhase::Failed,
                    };
                    let solved = record.solved_categories.into_iter().map(Into::into).collect();
                    Session::finished(puzzle, phase, solved, record.mistakes)
                }
                None => {
                    warn!(puzzle_id = %key.puzzle_id, "locked puzzle has no readable final state; revealing solution");
                    let solution = puzzle.solution();
                    Session::finished(puzzle, SessionPhase::Failed, solution, 0)
                }
            };
        }

        if let Some(progress) = self.store.load_progress(key) {
            let restored = RestoredProgress {
                mistakes: progress.mistakes,
                solved: progress.solved.into_iter().map(Into::into).collect(),
                remaining: progress.remaining.into_iter().map(Into::into).collect(),
            };
            match Session::restore(puzzle.clone(), restored) {
                Some(session) => {
                    info!(puzzle_id = %key.puzzle_id, mistakes = session.mistakes(), "resumed saved progress");
                    return session;
                }
                None => warn!(puzzle_id = %key.puzzle_id, "discarding inconsistent progress snapshot"),
            }
        }

        Session::new(puzzle)
    }

    fn save_progress(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        let session = &active.session;
        if session.phase() != SessionPhase::Playing {
            return;
        }

        let progress = ProgressEntity {
            mistakes: session.mistakes(),
            solved: session.solved().iter().cloned().map(Into::into).collect(),
            remaining: session.remaining().iter().cloned().map(Into::into).collect(),
            selected: session.selected().to_vec(),
        };
        if let Err(err) = self.store.save_progress(&active.key, &progress) {
            warn!(puzzle_id = %active.key.puzzle_id, error = %err, "failed to save progress");
        }
    }

    /// Lock the puzzle and write its final record, once.
    fn finalize(&mut self, kind: FinalKind) {
        let Some(active) = &self.active else {
            return;
        };
        let key = active.key.clone();

        if let Err(err) = self.store.clear_progress(&key) {
            warn!(puzzle_id = %key.puzzle_id, error = %err, "failed to clear progress");
        }
        if self.store.is_locked(&key) {
            warn!(puzzle_id = %key.puzzle_id, "puzzle already locked; keeping the first final state");
            return;
        }

        let record = FinalStateEntity {
            kind,
            solved_categories: active.session.solved().iter().cloned().map(Into::into).collect(),
            mistakes: active.session.mistakes(),
        };
        if let Err(err) = self.store.save_final(&key, &record) {
            warn!(puzzle_id = %key.puzzle_id, error = %err, "failed to save final state");
        }
        if let Err(err) = self.store.lock(&key) {
            warn!(puzzle_id = %key.puzzle_id, error = %err, "failed to lock puzzle");
        }

        if kind == FinalKind::Solved {
            match self.store.increment_trophy_count() {
                Ok(total) => self.trophies = total,
                Err(err) => warn!(error = %err, "failed to award trophy"),
            }
            self.refresh();
        }
    }

    fn announce_end(&self, phase: SessionPhase) {
        let (text, kind) = match phase {
            SessionPhase::Solved => (TEXT_SOLVED, MessageKind::Correct),
            SessionPhase::Failed => (TEXT_FAILED, MessageKind::Incorrect),
            SessionPhase::Playing => return,
        };
        self.presenter
            .present(PresentationEvent::message(text, kind, None));
        self.presenter
            .present(PresentationEvent::LockUi(phase.into()));
    }

    fn refresh(&self) {
        self.presenter.present(PresentationEvent::Refresh(self.view()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{kv_store::MemoryStore, puzzle_store::KeySchema},
        dto::sse::MessageEvent,
        services::presentation::recording::RecordingPresenter,
        state::puzzle::fixtures::{kitchen_entity, words},
    };

    const TODAY: &str = "05.03.2025";

    fn catalog() -> Catalog {
        let second = Puzzle::try_from(kitchen_entity("2", "06.03.2025")).unwrap();
        let first = Puzzle::try_from(kitchen_entity("1", TODAY)).unwrap();
        Catalog::new(vec![first, second])
    }

    fn controller_with(store: MemoryStore) -> (SessionController<MemoryStore>, RecordingPresenter) {
        let presenter = RecordingPresenter::default();
        let controller =
            SessionController::new(catalog(), PuzzleStore::new(store), Arc::new(presenter.clone()));
        (controller, presenter)
    }

    fn started() -> (SessionController<MemoryStore>, RecordingPresenter) {
        let (mut controller, presenter) = controller_with(MemoryStore::new());
        controller.start(TODAY).unwrap();
        presenter.take();
        (controller, presenter)
    }

    fn guess(controller: &mut SessionController<MemoryStore>, picks: &[&str]) -> Option<Resolution> {
        controller.deselect_all();
        for word in picks {
            controller.select(word);
        }
        let SubmitOutcome::Planned(plan) = controller.submit_guess() else {
            return None;
        };
        controller.grade(plan.id)?;
        controller.resolve(plan.id)
    }

    fn key() -> PuzzleKey {
        PuzzleKey::new(TODAY, "1")
    }

    fn message_kind(events: &[PresentationEvent], text: &str) -> Option<MessageKind> {
        events.iter().find_map(|event| match event {
            PresentationEvent::Message(MessageEvent { text: shown, kind, .. }) if shown == text => {
                Some(*kind)
            }
            _ => None,
        })
    }

    #[test]
    fn start_loads_todays_puzzle_fresh() {
        let (mut controller, presenter) = controller_with(MemoryStore::new());
        assert_eq!(controller.start(TODAY).unwrap(), SessionPhase::Playing);

        let view = controller.view();
        assert_eq!(view.puzzle_id.as_deref(), Some("1"));
        assert_eq!(view.phase, VisiblePhase::Playing);
        assert_eq!(view.remaining.len(), 16);
        assert_eq!(view.mistakes_remaining, MAX_MISTAKES);
        assert!(matches!(presenter.take().as_slice(), [PresentationEvent::Refresh(_)]));
    }

    #[test]
    fn missing_puzzle_reports_unavailable() {
        let (mut controller, presenter) = controller_with(MemoryStore::new());
        assert!(matches!(
            controller.start("01.01.2030"),
            Err(ServiceError::NoPuzzle(_))
        ));
        assert_eq!(controller.view().phase, VisiblePhase::Unavailable);
        let events = presenter.take();
        assert_eq!(message_kind(&events, TEXT_NO_PUZZLE), Some(MessageKind::Incorrect));
        assert!(matches!(controller.submit_guess(), SubmitOutcome::Ignored));
    }

    #[test]
    fn selection_is_persisted_with_progress() {
        let (mut controller, _) = started();
        controller.select("FORK");
        controller.select("RISK");

        let progress = controller.store().load_progress(&key()).unwrap();
        assert_eq!(progress.selected, words(&["FORK", "RISK"]));
        assert_eq!(progress.remaining.len(), 16);
    }

    #[test]
    fn deselect_all_clears_selection_and_snapshot() {
        let (mut controller, _) = started();
        controller.select("FORK");
        controller.select("RISK");
        assert_eq!(controller.store().load_progress(&key()).unwrap().selected.len(), 2);

        controller.deselect_all();
        let view = controller.view();
        assert!(view.selected.is_empty());
        assert!(!view.submit_enabled);
        assert_eq!(view.remaining.len(), 16);
        assert!(controller.store().load_progress(&key()).unwrap().selected.is_empty());
    }

    #[test]
    fn correct_guess_announces_then_applies() {
        let (mut controller, presenter) = started();
        for word in ["FORK", "SPOON", "KNIFE", "WHISK"] {
            controller.select(word);
        }
        let SubmitOutcome::Planned(plan) = controller.submit_guess() else {
            panic!("guess not accepted");
        };
        assert!(controller.view().guess_pending);

        assert!(matches!(controller.grade(plan.id), Some(Verdict::Correct(_))));
        controller.animate(plan.id, AnimationStage::Settle);
        let resolution = controller.resolve(plan.id).unwrap();
        assert_eq!(resolution.phase, SessionPhase::Playing);

        let events = presenter.take();
        assert!(events.iter().any(|e| matches!(e, PresentationEvent::GuessPending(_))));
        assert!(events.iter().any(|e| matches!(
            e,
            PresentationEvent::GuessGraded(GuessGradedEvent { correct: true, .. })
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            PresentationEvent::GuessAnimation(GuessAnimationEvent { stage: AnimationStage::Settle, .. })
        )));

        let view = controller.view();
        assert_eq!(view.solved.len(), 1);
        assert_eq!(view.remaining.len(), 12);
        assert!(!view.guess_pending);
        let progress = controller.store().load_progress(&key()).unwrap();
        assert_eq!(progress.solved.len(), 1);
        assert!(progress.selected.is_empty());
    }

    #[test]
    fn one_away_guess_gets_its_hint() {
        let (mut controller, presenter) = started();
        let resolution = guess(&mut controller, &["FORK", "SPOON", "KNIFE", "RISK"]).unwrap();

        assert!(resolution.verdict.is_one_away());
        assert_eq!(presenter.messages(), vec![TEXT_ONE_AWAY.to_string()]);
        assert_eq!(controller.store().load_progress(&key()).unwrap().mistakes, 1);
    }

    #[test]
    fn duplicate_combination_costs_nothing() {
        let (mut controller, presenter) = started();
        guess(&mut controller, &["FORK", "SPOON", "RISK", "CLUE"]);
        presenter.take();

        assert!(guess(&mut controller, &["CLUE", "RISK", "SPOON", "FORK"]).is_none());
        assert_eq!(presenter.messages(), vec![TEXT_DUPLICATE.to_string()]);
        assert_eq!(controller.view().mistakes, 1);
    }

    #[test]
    fn solving_locks_and_awards_one_trophy() {
        let (mut controller, presenter) = started();
        guess(&mut controller, &["FORK", "SPOON", "RISK", "CLUE"]);
        guess(&mut controller, &["FORK", "SPOON", "KNIFE", "WHISK"]);
        guess(&mut controller, &["RISK", "CLUE", "LIFE", "MONOPOLY"]);
        guess(&mut controller, &["BATH", "GUN", "CARD", "CURTAIN"]);
        presenter.take();
        let resolution = guess(&mut controller, &["SKY", "DEAD", "HEAD", "PUNCH"]).unwrap();
        assert_eq!(resolution.phase, SessionPhase::Solved);

        let store = controller.store();
        assert!(store.is_locked(&key()));
        assert_eq!(store.load_progress(&key()), None);
        let record = store.load_final(&key()).unwrap();
        assert_eq!(record.kind, FinalKind::Solved);
        assert_eq!(record.mistakes, 1);
        assert_eq!(record.solved_categories.len(), 4);
        assert_eq!(store.trophy_count(), 1);
        assert_eq!(controller.view().trophies, 1);

        let events = presenter.take();
        assert!(events.iter().any(|e| matches!(e, PresentationEvent::LockUi(VisiblePhase::Solved))));
        assert!(events.iter().any(
            |e| matches!(e, PresentationEvent::Message(m) if m.text == TEXT_SOLVED)
        ));

        assert_eq!(controller.select("FORK"), 0);
        assert!(matches!(controller.submit_guess(), SubmitOutcome::Ignored));
    }

    #[test]
    fn fourth_mistake_locks_with_full_solution() {
        let (mut controller, presenter) = started();
        guess(&mut controller, &["FORK", "SPOON", "KNIFE", "WHISK"]);
        guess(&mut controller, &["RISK", "CLUE", "BATH", "SKY"]);
        guess(&mut controller, &["RISK", "CLUE", "BATH", "DEAD"]);
        guess(&mut controller, &["RISK", "CLUE", "BATH", "HEAD"]);
        let resolution = guess(&mut controller, &["RISK", "CLUE", "BATH", "PUNCH"]).unwrap();
        assert_eq!(resolution.phase, SessionPhase::Failed);

        let store = controller.store();
        let record = store.load_final(&key()).unwrap();
        assert_eq!(record.kind, FinalKind::Failed);
        assert_eq!(record.mistakes, MAX_MISTAKES);
        assert_eq!(record.solved_categories.len(), 4);
        assert_eq!(store.trophy_count(), 0);
        assert_eq!(store.load_progress(&key()), None);
        assert_eq!(controller.view().phase, VisiblePhase::Failed);
        assert_eq!(message_kind(&presenter.take(), TEXT_FAILED), Some(MessageKind::Incorrect));
    }

    #[test]
    fn restart_resumes_progress_without_tried_combinations() {
        let (mut controller, _) = started();
        guess(&mut controller, &["FORK", "SPOON", "KNIFE", "WHISK"]);
        guess(&mut controller, &["RISK", "CLUE", "BATH", "SKY"]);
        controller.select("CLUE");
        let before = controller.view();

        let (mut controller, _) = controller_with(controller.into_store().into_inner());
        assert_eq!(controller.start(TODAY).unwrap(), SessionPhase::Playing);
        let after = controller.view();
        assert_eq!(after.mistakes, 1);
        assert_eq!(after.solved, before.solved);
        assert_eq!(after.remaining, before.remaining);
        assert!(after.selected.is_empty());

        let resolution = guess(&mut controller, &["RISK", "CLUE", "BATH", "SKY"]);
        assert!(resolution.is_some());
        assert_eq!(controller.view().mistakes, 2);
    }

    #[test]
    fn restart_after_solving_stays_frozen() {
        let (mut controller, _) = started();
        guess(&mut controller, &["FORK", "SPOON", "KNIFE", "WHISK"]);
        guess(&mut controller, &["RISK", "CLUE", "LIFE", "MONOPOLY"]);
        guess(&mut controller, &["BATH", "GUN", "CARD", "CURTAIN"]);
        guess(&mut controller, &["SKY", "DEAD", "HEAD", "PUNCH"]);

        let (mut controller, presenter) = controller_with(controller.into_store().into_inner());
        assert_eq!(controller.start(TODAY).unwrap(), SessionPhase::Solved);
        let view = controller.view();
        assert!(view.remaining.is_empty());
        assert_eq!(view.solved.len(), 4);
        assert_eq!(view.trophies, 1);
        assert!(presenter.take().iter().any(|e| matches!(e, PresentationEvent::LockUi(_))));
    }

    #[test]
    fn lock_without_final_state_reveals_solution() {
        let schema = KeySchema::current();
        let store = MemoryStore::from_iter([(schema.lock_key(&key()), "done".to_string())]);
        let (mut controller, _) = controller_with(store);

        assert_eq!(controller.start(TODAY).unwrap(), SessionPhase::Failed);
        let view = controller.view();
        assert_eq!(view.solved.len(), 4);
        assert_eq!(view.mistakes, 0);
    }

    #[test]
    fn malformed_progress_starts_fresh() {
        let schema = KeySchema::current();
        let store = MemoryStore::from_iter([(schema.progress_key(&key()), "{broken".to_string())]);
        let (mut controller, _) = controller_with(store);

        assert_eq!(controller.start(TODAY).unwrap(), SessionPhase::Playing);
        assert_eq!(controller.view().remaining.len(), 16);
    }

    #[test]
    fn next_puzzle_ignores_locks_and_drops_pending_guess() {
        let (mut controller, _) = started();
        for word in ["FORK", "SPOON", "KNIFE", "WHISK"] {
            controller.select(word);
        }
        let SubmitOutcome::Planned(plan) = controller.submit_guess() else {
            panic!("guess not accepted");
        };

        controller.next_puzzle().unwrap();
        assert_eq!(controller.puzzle_key(), Some(&PuzzleKey::new(TODAY, "2")));
        assert_eq!(controller.resolve(plan.id), None);
        assert_eq!(controller.view().remaining.len(), 16);

        controller.next_puzzle().unwrap();
        assert_eq!(controller.puzzle_key(), Some(&key()));
    }

    #[test]
    fn shuffle_keeps_selection_and_skips_persistence() {
        let (mut controller, _) = started();
        controller.select("FORK");
        let saved = controller.store().load_progress(&key()).unwrap();

        assert!(controller.shuffle());
        assert_eq!(controller.view().selected, words(&["FORK"]));
        assert_eq!(controller.store().load_progress(&key()), Some(saved));
    }
}
