//! Event-creation wizard state machine
//!
//! A draft walks a fixed, linear sequence of steps. Each inbound input either
//! re-prompts the current step, moves back one step, cancels the whole draft,
//! or is accepted and advances. Accepting input at the last step completes the
//! draft, which the caller then commits.
//!
//! ```text
//! Idle --start--> S0 --valid--> S1 --valid--> ... --valid--> Completed
//!  ^               |             |
//!  +---cancel------+-------------+   back: Si -> S(i-1), invalid: Si -> Si
//! ```

pub mod steps;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InveventError, InveventResult};
use crate::geo::Coordinates;
use crate::models::{EventVisibility, NewEvent};
use crate::reply::Reply;
use crate::types::TelegramId;
use steps::Outcome;

/// Inbound chat event, stripped of transport details
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Text(String),
    Location(Coordinates),
    /// File id of the largest photo size
    Photo { file_id: String },
    /// Anything else (stickers, documents, ...)
    Other,
}

impl Input {
    pub fn text(&self) -> Option<&str> {
        match self {
            Input::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Control words compare case-insensitively after trimming
pub(crate) fn token(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Words that only make sense inside a running wizard
pub fn is_wizard_control(text: &str) -> bool {
    matches!(
        token(text).as_str(),
        steps::BACK | steps::CANCEL | steps::SKIP | steps::TODAY | steps::TOMORROW
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Topic,
    EventType,
    DateTime,
    Location,
    Visibility,
    Picture,
    Description,
}

/// Accumulated answers of one user's wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub step: Step,
    pub topic: Option<String>,
    pub title: Option<String>,
    pub occurs_at: Option<DateTime<Utc>>,
    pub coordinates: Option<Coordinates>,
    pub address: Option<String>,
    pub visibility: Option<EventVisibility>,
    pub photo_file_id: Option<String>,
    pub description: Option<String>,
}

impl Draft {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            topic: None,
            title: None,
            occurs_at: None,
            coordinates: None,
            address: None,
            visibility: None,
            photo_file_id: None,
            description: None,
        }
    }

    /// Turn a completed draft into the event to persist
    pub fn into_new_event(self, owner_id: TelegramId) -> InveventResult<NewEvent> {
        let title = self.title.ok_or(InveventError::IncompleteDraft("title"))?;
        let occurs_at = self
            .occurs_at
            .ok_or(InveventError::IncompleteDraft("date and time"))?;
        let visibility = self
            .visibility
            .ok_or(InveventError::IncompleteDraft("visibility"))?;
        if self.coordinates.is_none() && self.address.is_none() {
            return Err(InveventError::IncompleteDraft("location"));
        }

        let event = NewEvent {
            owner_id,
            title,
            description: self.description.unwrap_or_default(),
            occurs_at,
            coordinates: self.coordinates,
            address: self.address,
            visibility,
            tags: self.topic.unwrap_or_default(),
            photo_file_id: self.photo_file_id,
        };
        event.validate()?;
        Ok(event)
    }
}

/// Ordered list of steps a draft walks through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    steps: &'static [Step],
}

impl Flow {
    /// topic, event type, date, location, visibility
    pub const STANDARD: Flow = Flow {
        steps: &[
            Step::Topic,
            Step::EventType,
            Step::DateTime,
            Step::Location,
            Step::Visibility,
        ],
    };

    /// Standard flow followed by an optional picture and description
    pub const EXTENDED: Flow = Flow {
        steps: &[
            Step::Topic,
            Step::EventType,
            Step::DateTime,
            Step::Location,
            Step::Visibility,
            Step::Picture,
            Step::Description,
        ],
    };

    pub fn first(&self) -> Step {
        self.steps[0]
    }

    pub fn steps(&self) -> &'static [Step] {
        self.steps
    }

    pub fn contains(&self, step: Step) -> bool {
        self.steps.contains(&step)
    }

    fn position(&self, step: Step) -> Option<usize> {
        self.steps.iter().position(|s| *s == step)
    }

    pub fn next(&self, step: Step) -> Option<Step> {
        self.position(step)
            .and_then(|i| self.steps.get(i + 1))
            .copied()
    }

    pub fn previous(&self, step: Step) -> Option<Step> {
        self.position(step)
            .and_then(|i| i.checked_sub(1))
            .map(|i| self.steps[i])
    }
}

/// What happened to a draft after one input
#[derive(Debug)]
pub enum Transition {
    /// Input rejected; the draft is unchanged and the step is prompted again
    Rejected { draft: Draft, reply: Reply },
    /// The draft moved (or stayed) without error; show `reply`
    Continue { draft: Draft, reply: Reply },
    /// The user aborted; drop the draft
    Cancelled,
    /// The last step accepted its input; commit the draft
    Completed(Draft),
    /// The draft points at a step this flow does not have
    OutOfRange,
}

/// The wizard's step table for one flow
#[derive(Debug, Clone, Copy)]
pub struct Wizard {
    flow: Flow,
}

impl Wizard {
    pub fn new(flow: Flow) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    /// Fresh draft at the first step and its prompt
    pub fn start(&self) -> (Draft, Reply) {
        let draft = Draft::new(self.flow.first());
        let reply = self.prompt(&draft);
        (draft, reply)
    }

    pub fn prompt(&self, draft: &Draft) -> Reply {
        steps::prompt(draft.step, draft, draft.step == self.flow.first())
    }

    /// Feed one input to the draft's current step
    pub fn handle(&self, draft: Draft, input: &Input, now: DateTime<Utc>) -> Transition {
        let control = input.text().map(token);
        if control.as_deref() == Some(steps::CANCEL) {
            return Transition::Cancelled;
        }
        if !self.flow.contains(draft.step) {
            return Transition::OutOfRange;
        }

        if control.as_deref() == Some(steps::BACK) {
            let mut draft = draft;
            if let Some(previous) = self.flow.previous(draft.step) {
                draft.step = previous;
            }
            let reply = self.prompt(&draft);
            return Transition::Continue { draft, reply };
        }

        match steps::accept(draft.step, &draft, input, now) {
            Outcome::Accept(mut next) => match self.flow.next(next.step) {
                Some(step) => {
                    next.step = step;
                    let reply = self.prompt(&next);
                    Transition::Continue { draft: next, reply }
                }
                None => Transition::Completed(next),
            },
            Outcome::Hint(reply) => Transition::Continue { draft, reply },
            Outcome::Reject(hint) => {
                let prompt = self.prompt(&draft);
                let reply = Reply {
                    text: format!("{hint}\n\n{}", prompt.text),
                    ..prompt
                };
                Transition::Rejected { draft, reply }
            }
        }
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(Flow::STANDARD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::Keyboard;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 14, 30, 0).unwrap()
    }

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    fn feed(wizard: &Wizard, draft: Draft, input: Input) -> Transition {
        wizard.handle(draft, &input, now())
    }

    /// Apply inputs that are all expected to be accepted
    fn walk(wizard: &Wizard, inputs: Vec<Input>) -> Transition {
        let (mut draft, _) = wizard.start();
        let mut inputs = inputs.into_iter().peekable();
        while let Some(input) = inputs.next() {
            let transition = feed(wizard, draft, input);
            if inputs.peek().is_none() {
                return transition;
            }
            match transition {
                Transition::Continue { draft: next, .. } => draft = next,
                other => panic!("unexpected transition {other:?}"),
            }
        }
        panic!("no inputs");
    }

    fn continue_draft(transition: Transition) -> Draft {
        match transition {
            Transition::Continue { draft, .. } => draft,
            other => panic!("expected Continue, got {other:?}"),
        }
    }

    #[test]
    fn test_standard_flow_completes_with_all_fields() {
        let wizard = Wizard::default();
        let done = walk(
            &wizard,
            vec![
                text("Concert"),
                text("Rock show"),
                text("2025-06-01 20:00"),
                Input::Location(Coordinates::new(55.75, 37.61)),
                text("Public"),
            ],
        );
        let Transition::Completed(draft) = done else {
            panic!("expected completion, got {done:?}");
        };

        let event = draft.into_new_event(1).unwrap();
        assert_eq!(event.title, "Rock show");
        assert_eq!(event.tags, "Concert");
        assert_eq!(
            event.occurs_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap()
        );
        assert_eq!(event.coordinates, Some(Coordinates::new(55.75, 37.61)));
        assert_eq!(event.address, None);
        assert_eq!(event.visibility, EventVisibility::Public);
        assert_eq!(event.description, "");
    }

    #[test]
    fn test_invalid_date_is_rejected_without_mutation() {
        let wizard = Wizard::default();
        let draft = continue_draft(walk(&wizard, vec![text("Concert"), text("Rock show")]));
        assert_eq!(draft.step, Step::DateTime);

        match feed(&wizard, draft.clone(), text("tomorrow please")) {
            Transition::Rejected { draft: same, reply } => {
                assert_eq!(same, draft);
                assert_eq!(reply.keyboard, wizard.prompt(&draft).keyboard);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_today_and_tomorrow_shortcuts() {
        let wizard = Wizard::default();
        let at_date = continue_draft(walk(&wizard, vec![text("Concert"), text("Rock show")]));

        let today = continue_draft(feed(&wizard, at_date.clone(), text("Today")));
        assert_eq!(today.occurs_at, Some(now()));

        let tomorrow = continue_draft(feed(&wizard, at_date, text(" TOMORROW ")));
        assert_eq!(
            tomorrow.occurs_at,
            Some(Utc.with_ymd_and_hms(2025, 5, 21, 0, 0, 0).unwrap())
        );
        assert_eq!(tomorrow.step, Step::Location);
    }

    #[test]
    fn test_back_keeps_collected_fields() {
        let wizard = Wizard::default();
        let at_location = continue_draft(walk(
            &wizard,
            vec![text("Concert"), text("Rock show"), text("2025-06-01 20:00")],
        ));
        assert_eq!(at_location.step, Step::Location);

        let back = feed(&wizard, at_location.clone(), text("back"));
        let Transition::Continue { draft, reply } = back else {
            panic!("expected Continue");
        };
        assert_eq!(draft.step, Step::DateTime);
        assert_eq!(draft.occurs_at, at_location.occurs_at);
        assert_eq!(draft.title.as_deref(), Some("Rock show"));
        assert!(reply.text.contains("Current: 2025-06-01 20:00 UTC"));

        let again = continue_draft(feed(&wizard, draft, text("2025-06-01 20:00")));
        assert_eq!(again, at_location);
    }

    #[test]
    fn test_back_at_first_step_is_absorbed() {
        let wizard = Wizard::default();
        let (draft, _) = wizard.start();
        let same = continue_draft(feed(&wizard, draft.clone(), text("back")));
        assert_eq!(same, draft);
    }

    #[test]
    fn test_cancel_from_every_step() {
        let wizard = Wizard::new(Flow::EXTENDED);
        for step in Flow::EXTENDED.steps() {
            let draft = Draft::new(*step);
            assert!(matches!(
                feed(&wizard, draft, text("Cancel")),
                Transition::Cancelled
            ));
        }
    }

    #[test]
    fn test_changing_topic_clears_title() {
        let wizard = Wizard::default();
        let at_date = continue_draft(walk(&wizard, vec![text("Concert"), text("Rock show")]));
        let at_type = continue_draft(feed(&wizard, at_date, text("back")));
        let at_topic = continue_draft(feed(&wizard, at_type, text("back")));
        assert_eq!(at_topic.step, Step::Topic);

        let same_topic = continue_draft(feed(&wizard, at_topic.clone(), text("Concert")));
        assert_eq!(same_topic.title.as_deref(), Some("Rock show"));

        let other_topic = continue_draft(feed(&wizard, at_topic, text("Sport")));
        assert_eq!(other_topic.title, None);
        assert!(matches!(
            feed(&wizard, other_topic, text("Rock show")),
            Transition::Rejected { .. }
        ));
    }

    #[test]
    fn test_other_topic_takes_free_text_title() {
        let wizard = Wizard::default();
        let draft = continue_draft(walk(&wizard, vec![text("Other"), text("  Knitting club ")]));
        assert_eq!(draft.title.as_deref(), Some("Knitting club"));

        let at_type = continue_draft(walk(&wizard, vec![text("Other")]));
        assert!(matches!(
            feed(&wizard, at_type, text(&"x".repeat(81))),
            Transition::Rejected { .. }
        ));
    }

    #[test]
    fn test_catalogue_options_match_exactly() {
        let wizard = Wizard::default();
        let (draft, _) = wizard.start();
        assert!(matches!(
            feed(&wizard, draft, text("concert")),
            Transition::Rejected { .. }
        ));
    }

    #[test]
    fn test_location_step_inputs() {
        let wizard = Wizard::default();
        let at_location = continue_draft(walk(
            &wizard,
            vec![text("Food"), text("Picnic"), text("today")],
        ));

        let address = continue_draft(feed(&wizard, at_location.clone(), text("Gorky Park")));
        assert_eq!(address.address.as_deref(), Some("Gorky Park"));
        assert_eq!(address.step, Step::Visibility);

        // Coordinates replace a previously typed address
        let back = continue_draft(feed(&wizard, address, text("back")));
        let point = continue_draft(feed(
            &wizard,
            back,
            Input::Location(Coordinates::new(55.73, 37.6)),
        ));
        assert_eq!(point.address, None);
        assert_eq!(point.coordinates, Some(Coordinates::new(55.73, 37.6)));

        let Transition::Continue { draft, reply } =
            feed(&wizard, at_location.clone(), text(steps::PICK_ON_MAP))
        else {
            panic!("expected Continue");
        };
        assert_eq!(draft, at_location);
        assert!(reply.text.contains("📎"));
        assert!(matches!(reply.keyboard, Keyboard::Reply(_)));

        assert!(matches!(
            feed(&wizard, at_location, Input::Other),
            Transition::Rejected { .. }
        ));
    }

    #[test]
    fn test_extended_flow_picture_and_description() {
        let wizard = Wizard::new(Flow::EXTENDED);
        let at_picture = continue_draft(walk(
            &wizard,
            vec![
                text("Party"),
                text("Birthday"),
                text("2025-06-01 20:00"),
                text("Main street 1"),
                text("private"),
            ],
        ));
        assert_eq!(at_picture.step, Step::Picture);
        assert!(matches!(
            feed(&wizard, at_picture.clone(), text("a cat")),
            Transition::Rejected { .. }
        ));

        let at_description = continue_draft(feed(
            &wizard,
            at_picture,
            Input::Photo {
                file_id: "AgAD-largest".to_string(),
            },
        ));
        let Transition::Completed(draft) =
            feed(&wizard, at_description, text("Bring snacks"))
        else {
            panic!("expected completion");
        };
        let event = draft.into_new_event(9).unwrap();
        assert_eq!(event.photo_file_id.as_deref(), Some("AgAD-largest"));
        assert_eq!(event.description, "Bring snacks");
        assert_eq!(event.visibility, EventVisibility::Private);
        assert_eq!(event.address.as_deref(), Some("Main street 1"));
    }

    #[test]
    fn test_out_of_range_step() {
        let wizard = Wizard::default();
        assert!(matches!(
            feed(&wizard, Draft::new(Step::Picture), text("skip")),
            Transition::OutOfRange
        ));
    }

    #[test]
    fn test_incomplete_draft_is_an_error() {
        let err = Draft::new(Step::Visibility).into_new_event(1).unwrap_err();
        assert!(matches!(err, InveventError::IncompleteDraft("title")));
    }

    #[test]
    fn test_wizard_control_words() {
        assert!(is_wizard_control(" Back"));
        assert!(is_wizard_control("TOMORROW"));
        assert!(!is_wizard_control("Public"));
        assert!(!is_wizard_control("tomorrow please"));
    }
}
