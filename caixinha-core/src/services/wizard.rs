//! Wizard service - the per-user conversation state machine
//!
//! Each inbound event is handled in two phases. `decide` is pure: from the
//! current session and the event it computes the next step. `execute` then
//! performs the step's side effects against the ports, committing the new
//! session only after the user was reached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::vocab::{
    categories_for, payment_methods_for, Choice, CONFIRM_OPTIONS, DATE_OPTIONS, KIND_OPTIONS,
    MENU_OPTIONS, PERIOD_OPTIONS,
};
use crate::domain::{
    InboundEvent, Kind, Session, Stage, TransactionRecord, WizardState, DEFAULT_CURRENCY,
};
use crate::parsers::{
    classify_category, classify_payment_method, is_cancel_keyword, is_menu_keyword, match_choice,
    match_choice_id, match_choice_text, parse_amount, parse_date, prefill, report_request,
};
use crate::ports::{Clock, Delivery, EventSink, RecordStore, SessionStore};

use super::logging::LogEvent;
use super::prompts::{self, deliver, prompt_for, Notice, Prompt};
use super::summary::{Period, SummaryService};

/// Lock map size above which idle entries are dropped
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// What handling one event led to
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A question was sent. `rejected` when the answer was not accepted and
    /// the same question went out again.
    Prompted { state: WizardState, rejected: bool },
    /// The record was stored and the session cleared
    Persisted(TransactionRecord),
    Cancelled,
    ReportDelivered { period: Period, records: usize },
}

/// Next step computed from a session and an event
#[derive(Debug)]
enum Step {
    Ask {
        session: Session,
        notice: Option<Notice>,
    },
    Persist(TransactionRecord),
    Cancel,
    Report(Period),
}

impl Step {
    fn ask(session: Session) -> Self {
        Step::Ask {
            session,
            notice: None,
        }
    }

    fn reject(session: Session, notice: Notice) -> Self {
        Step::Ask {
            session,
            notice: Some(notice),
        }
    }
}

/// Result of validating one answer against the pending field
enum Answer {
    Accepted(TransactionRecord),
    /// Valid, but the value comes from a free-text follow-up question
    FollowUp(WizardState),
    Rejected(Notice),
}

/// Per-user async locks, created on first use
#[derive(Default)]
struct UserLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    fn get(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if locks.len() > LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(user_id.to_string()).or_default().clone()
    }
}

/// Move a draft to its first missing field, or to confirmation once complete
fn advance(mut record: TransactionRecord) -> Session {
    match record.first_missing() {
        Some(field) => {
            let state = WizardState::for_field(field, record.kind);
            Session::collecting(record, state)
        }
        None => {
            record.normalize();
            Session::collecting(record, WizardState::AwaitingConfirmation)
        }
    }
}

/// Typed text, trimmed; `Err` carries the notice for blank or tapped replies
fn typed_text(event: &InboundEvent) -> std::result::Result<&str, Notice> {
    if !event.is_text() {
        return Err(Notice::TextExpected);
    }
    match event.payload.trim() {
        "" => Err(Notice::BlankText),
        text => Ok(text),
    }
}

/// Wizard service for collecting records over chat
pub struct WizardService {
    sessions: Arc<dyn SessionStore>,
    delivery: Arc<dyn Delivery>,
    records: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    summary: SummaryService,
    events: Option<Arc<dyn EventSink>>,
    currency: String,
    locks: UserLocks,
}

impl WizardService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        delivery: Arc<dyn Delivery>,
        records: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            summary: SummaryService::new(records.clone(), clock.clone()),
            sessions,
            delivery,
            records,
            clock,
            events: None,
            currency: DEFAULT_CURRENCY.to_string(),
            locks: UserLocks::default(),
        }
    }

    /// Currency stamped on new drafts
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Handle one inbound event.
    ///
    /// Events for the same sender are processed one at a time. An `Err` means
    /// a port failed; the stored session is then left as it was, so the same
    /// event can be redelivered.
    pub async fn handle(&self, event: &InboundEvent) -> Result<Outcome> {
        let user_id = event.sender_id.trim();
        if user_id.is_empty() {
            return Err(Error::validation("event without sender"));
        }

        let lock = self.locks.get(user_id);
        let _guard = lock.lock_owned().await;

        let current = self.sessions.get(user_id).await?;
        let previous_stage = current.as_ref().map(Session::stage);
        let session = current.unwrap_or_else(Session::menu);
        let state = session.state;

        let step = self.decide(session, event);
        debug!(state = state.as_str(), step = ?StepName::of(&step), "wizard step");

        self.execute(user_id, state, previous_stage, step).await
    }

    fn decide(&self, session: Session, event: &InboundEvent) -> Step {
        if event.is_text() && is_cancel_keyword(&event.payload) {
            return Step::Cancel;
        }

        match session.stage() {
            Stage::Menu => self.on_menu(event),
            Stage::Reporting => on_report_period(session, event),
            Stage::Confirming => on_confirmation(session, event),
            Stage::Collecting => match session.record {
                Some(record) => self.on_field(session.state, record, event),
                // A collecting state without a draft cannot make progress
                None => Step::ask(Session::menu()),
            },
        }
    }

    fn on_menu(&self, event: &InboundEvent) -> Step {
        if !event.is_text() {
            return match match_choice_id(MENU_OPTIONS, &event.payload) {
                Some(choice) => self.on_menu_choice(choice),
                None => Step::reject(Session::menu(), Notice::InvalidChoice),
            };
        }

        let text = event.payload.trim();
        if text.is_empty() || is_menu_keyword(text) {
            return Step::ask(Session::menu());
        }
        // A button label typed out by hand
        if let Some(choice) = match_choice_text(MENU_OPTIONS, text) {
            return self.on_menu_choice(choice);
        }
        match report_request(text) {
            Some(Some(choice)) => match Period::from_value(choice.value) {
                Some(period) => Step::Report(period),
                None => Step::ask(Session::reporting()),
            },
            Some(None) => Step::ask(Session::reporting()),
            None => {
                let mut record = self.new_draft(None);
                record.original_text = Some(text.to_string());
                prefill(text, self.clock.today()).apply(&mut record);
                Step::ask(advance(record))
            }
        }
    }

    fn on_menu_choice(&self, choice: &Choice) -> Step {
        match choice.value {
            "income" => Step::ask(advance(self.new_draft(Some(Kind::Income)))),
            "expense" => Step::ask(advance(self.new_draft(Some(Kind::Expense)))),
            _ => Step::ask(Session::reporting()),
        }
    }

    fn new_draft(&self, kind: Option<Kind>) -> TransactionRecord {
        let mut record = TransactionRecord::new(self.clock.now(), self.currency.clone());
        record.kind = kind;
        record
    }

    fn on_field(&self, state: WizardState, record: TransactionRecord, event: &InboundEvent) -> Step {
        match self.answer(state, record.clone(), event) {
            Answer::Accepted(record) => Step::ask(advance(record)),
            Answer::FollowUp(next) => Step::ask(Session::collecting(record, next)),
            Answer::Rejected(notice) => Step::reject(Session::collecting(record, state), notice),
        }
    }

    /// Validate an answer for `state`. Rejections never touch the draft.
    fn answer(&self, state: WizardState, mut record: TransactionRecord, event: &InboundEvent) -> Answer {
        let kind = record.kind.unwrap_or(Kind::Expense);

        match state {
            WizardState::AwaitingKind => match match_choice(KIND_OPTIONS, event) {
                Some(choice) => match choice.value.parse::<Kind>() {
                    Ok(kind) => {
                        record.kind = Some(kind);
                        Answer::Accepted(record)
                    }
                    Err(_) => Answer::Rejected(Notice::InvalidChoice),
                },
                None => Answer::Rejected(Notice::InvalidChoice),
            },

            WizardState::AwaitingCategory => {
                let options = categories_for(kind);
                match pick(options, event, |text| classify_category(text, kind)) {
                    Some(choice) if choice.opens_freetext() => {
                        Answer::FollowUp(WizardState::AwaitingCategoryFreetext)
                    }
                    Some(choice) => {
                        record.category = Some(choice.value.to_string());
                        Answer::Accepted(record)
                    }
                    None => Answer::Rejected(Notice::InvalidChoice),
                }
            }

            WizardState::AwaitingCategoryFreetext => match typed_text(event) {
                Ok(text) => {
                    record.category = Some(text.to_string());
                    Answer::Accepted(record)
                }
                Err(notice) => Answer::Rejected(notice),
            },

            WizardState::AwaitingAmount => match typed_text(event) {
                Ok(text) => match parse_amount(text).filter(|a| !a.is_zero()) {
                    Some(amount) => {
                        record.amount = Some(amount);
                        Answer::Accepted(record)
                    }
                    None => Answer::Rejected(Notice::InvalidAmount),
                },
                Err(Notice::BlankText) => Answer::Rejected(Notice::InvalidAmount),
                Err(notice) => Answer::Rejected(notice),
            },

            WizardState::AwaitingDescription => match typed_text(event) {
                Ok(text) => {
                    record.description = Some(text.to_string());
                    Answer::Accepted(record)
                }
                Err(notice) => Answer::Rejected(notice),
            },

            WizardState::AwaitingPaymentMethod | WizardState::AwaitingReceiptMethod => {
                let options = payment_methods_for(kind);
                match pick(options, event, |text| classify_payment_method(text, kind)) {
                    Some(choice) => {
                        record.payment_method = Some(choice.value.to_string());
                        Answer::Accepted(record)
                    }
                    None => Answer::Rejected(Notice::InvalidChoice),
                }
            }

            WizardState::AwaitingDate => {
                let today = self.clock.today();
                let date = match match_choice(DATE_OPTIONS, event) {
                    Some(choice) if choice.opens_freetext() => {
                        return Answer::FollowUp(WizardState::AwaitingDateFreetext)
                    }
                    Some(choice) if choice.value == "yesterday" => today.pred_opt(),
                    Some(_) => Some(today),
                    // A typed date answers the question directly
                    None if event.is_text() => parse_date(&event.payload, today),
                    None => None,
                };
                match date {
                    Some(date) => {
                        record.competence_date = Some(date);
                        Answer::Accepted(record)
                    }
                    None => Answer::Rejected(Notice::InvalidChoice),
                }
            }

            WizardState::AwaitingDateFreetext => match typed_text(event) {
                Ok(text) => match parse_date(text, self.clock.today()) {
                    Some(date) => {
                        record.competence_date = Some(date);
                        Answer::Accepted(record)
                    }
                    None => Answer::Rejected(Notice::InvalidDate),
                },
                Err(Notice::BlankText) => Answer::Rejected(Notice::InvalidDate),
                Err(notice) => Answer::Rejected(notice),
            },

            WizardState::StartMenu
            | WizardState::AwaitingConfirmation
            | WizardState::AwaitingReportPeriod => Answer::Rejected(Notice::InvalidChoice),
        }
    }

    async fn execute(
        &self,
        user_id: &str,
        state: WizardState,
        previous_stage: Option<Stage>,
        step: Step,
    ) -> Result<Outcome> {
        match step {
            Step::Ask { session, notice } => {
                let prompt = prompt_for(session.state, session.record.as_ref(), notice);
                self.send(user_id, session.state, &prompt).await?;

                let starts_draft = session.record.is_some()
                    && matches!(previous_stage, None | Some(Stage::Menu));
                if starts_draft {
                    let kind = session.record.as_ref().and_then(|r| r.kind);
                    let mut event = LogEvent::new("session_started").with_state(session.state.as_str());
                    if let Some(kind) = kind {
                        event = event.with_record_kind(kind.as_str());
                    }
                    self.emit(event);
                }

                let next = session.state;
                self.sessions.put(user_id, session).await?;
                Ok(Outcome::Prompted {
                    state: next,
                    rejected: notice.is_some(),
                })
            }

            Step::Persist(mut record) => {
                record.confirmed = true;
                if let Err(e) = self.records.append_record(&record).await {
                    warn!(state = state.as_str(), "could not store record: {e}");
                    self.emit(
                        LogEvent::new("persistence_failed")
                            .with_state(state.as_str())
                            .with_error(e.to_string()),
                    );
                    return Err(e);
                }
                // Cleared before the acknowledgement so a failed send never
                // leads to a second append
                self.sessions.delete(user_id).await?;

                let mut event = LogEvent::new("record_persisted").with_state(state.as_str());
                if let Some(kind) = record.kind {
                    event = event.with_record_kind(kind.as_str());
                }
                self.emit(event);

                let text = prompts::saved_message(&record);
                self.send(user_id, state, &Prompt::Text(text)).await?;
                Ok(Outcome::Persisted(record))
            }

            Step::Cancel => {
                self.send(user_id, state, &Prompt::Text(prompts::CANCELLED_MESSAGE.to_string()))
                    .await?;
                self.sessions.delete(user_id).await?;
                self.emit(LogEvent::new("session_cancelled").with_state(state.as_str()));
                Ok(Outcome::Cancelled)
            }

            Step::Report(period) => {
                let summary = match self.summary.summarize(period).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!(state = state.as_str(), "could not read records: {e}");
                        self.emit(
                            LogEvent::new("persistence_failed")
                                .with_state(state.as_str())
                                .with_error(e.to_string()),
                        );
                        return Err(e);
                    }
                };
                self.send(user_id, state, &Prompt::Text(summary.render())).await?;
                self.sessions.delete(user_id).await?;
                self.emit(LogEvent::new("report_delivered").with_state(state.as_str()));
                Ok(Outcome::ReportDelivered {
                    period,
                    records: summary.records,
                })
            }
        }
    }

    async fn send(&self, user_id: &str, state: WizardState, prompt: &Prompt) -> Result<()> {
        if let Err(e) = deliver(self.delivery.as_ref(), user_id, prompt).await {
            warn!(state = state.as_str(), "could not deliver message: {e}");
            self.emit(
                LogEvent::new("delivery_failed")
                    .with_state(state.as_str())
                    .with_error(e.to_string()),
            );
            return Err(e);
        }
        Ok(())
    }

    fn emit(&self, event: LogEvent) {
        if let Some(events) = &self.events {
            events.record(event);
        }
    }
}

/// Resolve an answer against `options`: taps by id, typed replies by label
/// or synonym, then by the keyword classifier
fn pick(
    options: &'static [Choice],
    event: &InboundEvent,
    classify: impl Fn(&str) -> Option<&'static str>,
) -> Option<&'static Choice> {
    match_choice(options, event).or_else(|| {
        if !event.is_text() {
            return None;
        }
        let value = classify(&event.payload)?;
        options.iter().find(|c| c.value == value)
    })
}

fn on_confirmation(session: Session, event: &InboundEvent) -> Step {
    match (match_choice(CONFIRM_OPTIONS, event).map(|c| c.value), session.record) {
        (Some("yes"), Some(record)) => Step::Persist(record),
        (Some("no"), _) => Step::Cancel,
        (_, Some(record)) => Step::reject(
            Session::collecting(record, WizardState::AwaitingConfirmation),
            Notice::InvalidChoice,
        ),
        (_, None) => Step::ask(Session::menu()),
    }
}

fn on_report_period(session: Session, event: &InboundEvent) -> Step {
    let choice = match_choice(PERIOD_OPTIONS, event).or_else(|| {
        event
            .is_text()
            .then(|| report_request(&event.payload).flatten())
            .flatten()
    });
    match choice.and_then(|c| Period::from_value(c.value)) {
        Some(period) => Step::Report(period),
        None => Step::reject(session, Notice::InvalidChoice),
    }
}

/// Step name for diagnostics; never includes record contents
#[derive(Debug)]
enum StepName {
    Ask,
    Reject,
    Persist,
    Cancel,
    Report,
}

impl StepName {
    fn of(step: &Step) -> Self {
        match step {
            Step::Ask { notice: None, .. } => StepName::Ask,
            Step::Ask { .. } => StepName::Reject,
            Step::Persist(_) => StepName::Persist,
            Step::Cancel => StepName::Cancel,
            Step::Report(_) => StepName::Report,
        }
    }
}
