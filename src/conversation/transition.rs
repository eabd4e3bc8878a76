//! The total transition function for the posting dialog.
//!
//! Pure: given the same state, session, event, and date it always
//! produces the same next step and effects, with no I/O. The engine
//! owns effect execution and feeds remote completions back in as
//! events.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::effect::{Effect, PublishIntent};
use super::event::{AttachmentKind, Event, MediaBytes, RemoteFailure};
use super::state::{ConversationState, Session};
use crate::calendar::{self, CalendarCursor, Selection};

/// Keyboard choice that triggers an immediate post. Matched as a
/// case-sensitive prefix.
const CHOICE_NOW: &str = "Now";

/// Keyboard choice leading to the calendar picker.
const CHOICE_OTHER_DATE: &str = "Other date";

const PROMPT_CAPTION: &str = "Input description";
const PROMPT_DATE: &str = "Please select a date: ";
const PROMPT_TIME: &str = "Please enter the time in HH:MM format";
const LOGIN_FAILED: &str = "Sorry, we can't login to vk";
const STAGING_FAILED: &str = "Sorry, we couldn't save that image";
const PUBLISH_FAILED: &str = "Sorry, something went wrong";
const FAREWELL: &str = "Bye! I hope we can talk again some day.";

/// Why a conversation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The post went out and the share URL was delivered.
    Published,
    /// The user sent the cancel command.
    Cancelled,
    /// The publishing service rejected the credentials.
    AuthFailed,
    /// Staging the attachment to local storage failed.
    StagingFailed,
    /// Upload or post creation failed after the dialog completed.
    PublishFailed,
}

/// Where the machine goes after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The conversation continues in the given state.
    Continue(ConversationState),
    /// The conversation is over; the session must be discarded.
    End(EndReason),
}

/// Result of applying one event: the next step and the effects to run.
#[derive(Debug)]
pub struct Transition {
    pub step: Step,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: ConversationState) -> Self {
        Self {
            step: Step::Continue(state),
            effects: vec![],
        }
    }

    fn end(reason: EndReason) -> Self {
        Self {
            step: Step::End(reason),
            effects: vec![],
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// The event does not apply to the current state.
///
/// The engine logs these with the triggering event and drops them; the
/// conversation keeps its state.
#[derive(Debug, thiserror::Error)]
#[error("no transition from {state:?}")]
pub struct Unhandled {
    pub state: ConversationState,
    pub event: Event,
}

/// Starts a conversation for an incoming attachment.
#[must_use]
pub fn entry(kind: AttachmentKind, content: MediaBytes) -> Transition {
    Transition::to(ConversationState::Authorizing)
        .with_effect(Effect::PrepareConversation { kind, content })
}

/// Applies one event to an active conversation.
///
/// `today` anchors the calendar when it is first shown; it is passed in
/// so the function stays deterministic.
///
/// # Errors
///
/// Returns [`Unhandled`] when the event has no meaning in the current
/// state. The session is left untouched in that case.
pub fn transition(
    state: &ConversationState,
    session: &mut Session,
    event: Event,
    today: NaiveDate,
) -> Result<Transition, Unhandled> {
    match (state, event) {
        // Cancel applies everywhere, even with remote work in flight.
        (_, Event::Cancel) => Ok(Transition::end(EndReason::Cancelled).with_effect(
            Effect::RemoveKeyboard {
                text: FAREWELL.to_owned(),
            },
        )),

        (ConversationState::Authorizing, Event::SetupFinished(Ok(path))) => {
            session.media_path = Some(path);
            Ok(
                Transition::to(ConversationState::AwaitingCaption).with_effect(
                    Effect::SendText {
                        text: PROMPT_CAPTION.to_owned(),
                    },
                ),
            )
        }

        (ConversationState::Authorizing, Event::SetupFinished(Err(failure))) => {
            let (reason, text) = match failure {
                RemoteFailure::Staging => (EndReason::StagingFailed, STAGING_FAILED),
                _ => (EndReason::AuthFailed, LOGIN_FAILED),
            };
            Ok(Transition::end(reason).with_effect(Effect::SendText {
                text: text.to_owned(),
            }))
        }

        (ConversationState::AwaitingCaption, Event::Text { text }) => {
            session.caption = Some(text);
            Ok(
                Transition::to(ConversationState::AwaitingTimingChoice).with_effect(
                    Effect::SendTextWithChoices {
                        text: PROMPT_DATE.to_owned(),
                        choices: vec![CHOICE_NOW.to_owned(), CHOICE_OTHER_DATE.to_owned()],
                    },
                ),
            )
        }

        (ConversationState::AwaitingTimingChoice, Event::Text { text }) => {
            if text.starts_with(CHOICE_NOW) {
                Ok(begin_publish(session, None))
            } else {
                // Anything that is not "Now" asks for another date.
                Ok(show_calendar(CalendarCursor::from_date(today)))
            }
        }

        (ConversationState::AwaitingDatePick { cursor }, Event::ButtonPressed { payload }) => {
            match calendar::interpret(&payload) {
                Selection::Navigate(next) => Ok(Transition::to(
                    ConversationState::AwaitingDatePick { cursor: next },
                )
                .with_effect(Effect::EditGrid {
                    grid: calendar::render(next),
                })),
                Selection::Day(date) => {
                    session.scheduled_at = Some(date.and_time(NaiveTime::MIN));
                    Ok(Transition::to(ConversationState::AwaitingTime).with_effect(
                        Effect::RemoveKeyboard {
                            text: PROMPT_TIME.to_owned(),
                        },
                    ))
                }
                Selection::Ignore => Ok(Transition::to(ConversationState::AwaitingDatePick {
                    cursor: *cursor,
                })),
            }
        }

        (ConversationState::AwaitingTime, Event::Text { text }) => {
            match (parse_time_of_day(&text), session.scheduled_at) {
                (Some((hours, minutes)), Some(stored)) => {
                    let at = apply_time_of_day(stored.date(), hours, minutes);
                    session.scheduled_at = Some(at);
                    Ok(begin_publish(session, Some(at)))
                }
                (None, _) => Ok(show_calendar(CalendarCursor::from_date(today))),
                (Some(_), None) => Err(Unhandled {
                    state: *state,
                    event: Event::Text { text },
                }),
            }
        }

        (ConversationState::Publishing, Event::PublishFinished(Ok(url))) => {
            Ok(Transition::end(EndReason::Published).with_effect(Effect::SendText { text: url }))
        }

        (ConversationState::Publishing, Event::PublishFinished(Err(_))) => Ok(Transition::end(
            EndReason::PublishFailed,
        )
        .with_effect(Effect::SendText {
            text: PUBLISH_FAILED.to_owned(),
        })),

        (state, event) => Err(Unhandled {
            state: *state,
            event,
        }),
    }
}

fn begin_publish(session: &Session, scheduled_at: Option<NaiveDateTime>) -> Transition {
    Transition::to(ConversationState::Publishing).with_effect(Effect::Publish(PublishIntent {
        caption: session.caption.clone().unwrap_or_default(),
        media_path: session.media_path.clone().unwrap_or_default(),
        scheduled_at,
    }))
}

fn show_calendar(cursor: CalendarCursor) -> Transition {
    Transition::to(ConversationState::AwaitingDatePick { cursor }).with_effect(
        Effect::SendTextWithGrid {
            text: PROMPT_DATE.to_owned(),
            grid: calendar::render(cursor),
        },
    )
}

/// Parses `HH:MM` input: exactly two digits, a colon, two digits, naming
/// a real clock time. Out-of-range values are rejected rather than
/// allowed to overflow into the next day.
fn parse_time_of_day(text: &str) -> Option<(u32, u32)> {
    let (hours, minutes) = text.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.bytes().all(|b| b.is_ascii_digit())
        || !minutes.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some((hours, minutes))
}

/// Combines a picked date with a clock time.
fn apply_time_of_day(date: NaiveDate, hours: u32, minutes: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hours, minutes, 0).unwrap_or(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn ready_session() -> Session {
        Session {
            caption: Some("Test".to_owned()),
            scheduled_at: None,
            media_path: Some("/tmp/media/7/incoming.png".into()),
        }
    }

    fn text_event(text: &str) -> Event {
        Event::Text {
            text: text.to_owned(),
        }
    }

    fn apply(
        state: ConversationState,
        session: &mut Session,
        event: Event,
    ) -> Transition {
        transition(&state, session, event, today()).unwrap()
    }

    #[test]
    fn test_setup_success_prompts_for_caption() {
        let mut session = Session::new();
        let result = apply(
            ConversationState::Authorizing,
            &mut session,
            Event::SetupFinished(Ok("/tmp/x.png".into())),
        );

        assert_eq!(
            result.step,
            Step::Continue(ConversationState::AwaitingCaption)
        );
        assert_eq!(session.media_path, Some("/tmp/x.png".into()));
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::SendText { text }] if text == "Input description"
        ));
    }

    #[test]
    fn test_setup_auth_failure_ends_conversation() {
        let mut session = Session::new();
        let result = apply(
            ConversationState::Authorizing,
            &mut session,
            Event::SetupFinished(Err(RemoteFailure::Authentication)),
        );

        assert_eq!(result.step, Step::End(EndReason::AuthFailed));
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::SendText { text }] if text.contains("login")
        ));
    }

    #[test]
    fn test_caption_stored_and_choices_offered() {
        let mut session = Session::new();
        let result = apply(
            ConversationState::AwaitingCaption,
            &mut session,
            text_event("Hello"),
        );

        assert_eq!(session.caption.as_deref(), Some("Hello"));
        assert_eq!(
            result.step,
            Step::Continue(ConversationState::AwaitingTimingChoice)
        );
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::SendTextWithChoices { choices, .. }]
                if choices == &["Now".to_owned(), "Other date".to_owned()]
        ));
    }

    #[test]
    fn test_now_choice_publishes_without_timestamp() {
        let mut session = ready_session();
        let result = apply(
            ConversationState::AwaitingTimingChoice,
            &mut session,
            text_event("Now"),
        );

        assert_eq!(result.step, Step::Continue(ConversationState::Publishing));
        match result.effects.as_slice() {
            [Effect::Publish(intent)] => {
                assert_eq!(intent.caption, "Test");
                assert!(intent.scheduled_at.is_none());
            }
            effects => panic!("unexpected effects: {effects:?}"),
        }
    }

    #[test]
    fn test_now_match_is_a_case_sensitive_prefix() {
        let mut session = ready_session();
        let result = apply(
            ConversationState::AwaitingTimingChoice,
            &mut session,
            text_event("Now please"),
        );
        assert_eq!(result.step, Step::Continue(ConversationState::Publishing));

        let mut session = ready_session();
        let result = apply(
            ConversationState::AwaitingTimingChoice,
            &mut session,
            text_event("now"),
        );
        assert!(matches!(
            result.step,
            Step::Continue(ConversationState::AwaitingDatePick { .. })
        ));
    }

    #[test]
    fn test_other_date_shows_current_month() {
        let mut session = ready_session();
        let result = apply(
            ConversationState::AwaitingTimingChoice,
            &mut session,
            text_event("Other date"),
        );

        let expected = CalendarCursor::from_date(today());
        assert_eq!(
            result.step,
            Step::Continue(ConversationState::AwaitingDatePick { cursor: expected })
        );
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::SendTextWithGrid { grid, .. }] if *grid == calendar::render(expected)
        ));
    }

    #[test]
    fn test_navigation_redraws_in_place() {
        let cursor = CalendarCursor::new(2024, 12);
        let mut session = ready_session();
        let result = apply(
            ConversationState::AwaitingDatePick { cursor },
            &mut session,
            Event::ButtonPressed {
                payload: "cal:next:2024:12".to_owned(),
            },
        );

        let expected = CalendarCursor::new(2025, 1);
        assert_eq!(
            result.step,
            Step::Continue(ConversationState::AwaitingDatePick { cursor: expected })
        );
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::EditGrid { grid }] if *grid == calendar::render(expected)
        ));
    }

    #[test]
    fn test_day_press_stores_midnight_and_prompts_for_time() {
        let cursor = CalendarCursor::new(2024, 6);
        let mut session = ready_session();
        let result = apply(
            ConversationState::AwaitingDatePick { cursor },
            &mut session,
            Event::ButtonPressed {
                payload: "cal:day:2024:6:15".to_owned(),
            },
        );

        assert_eq!(result.step, Step::Continue(ConversationState::AwaitingTime));
        assert_eq!(
            session.scheduled_at,
            Some(
                NaiveDate::from_ymd_opt(2024, 6, 15)
                    .unwrap()
                    .and_time(NaiveTime::MIN)
            )
        );
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::RemoveKeyboard { text }] if text.contains("HH:MM")
        ));
    }

    #[test]
    fn test_header_press_is_a_noop() {
        let cursor = CalendarCursor::new(2024, 6);
        let mut session = ready_session();
        let result = apply(
            ConversationState::AwaitingDatePick { cursor },
            &mut session,
            Event::ButtonPressed {
                payload: "cal:ignore".to_owned(),
            },
        );

        assert_eq!(
            result.step,
            Step::Continue(ConversationState::AwaitingDatePick { cursor })
        );
        assert!(result.effects.is_empty());
        assert!(session.scheduled_at.is_none());
    }

    #[test]
    fn test_valid_time_keeps_date_and_applies_clock() {
        for (hours, minutes) in [(0, 0), (9, 5), (14, 30), (23, 59)] {
            let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
            let mut session = ready_session();
            session.scheduled_at = Some(date.and_time(NaiveTime::MIN));

            let result = apply(
                ConversationState::AwaitingTime,
                &mut session,
                text_event(&format!("{hours:02}:{minutes:02}")),
            );

            assert_eq!(result.step, Step::Continue(ConversationState::Publishing));
            let expected = date.and_time(NaiveTime::from_hms_opt(hours, minutes, 0).unwrap());
            assert_eq!(session.scheduled_at, Some(expected));
            match result.effects.as_slice() {
                [Effect::Publish(intent)] => assert_eq!(intent.scheduled_at, Some(expected)),
                effects => panic!("unexpected effects: {effects:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_time_returns_to_date_pick_without_touching_caption() {
        for input in ["14:3", "1430", "ab:cd", "24:00", "14:60", "14:30:00", ""] {
            let mut session = ready_session();
            session.scheduled_at = Some(today().and_time(NaiveTime::MIN));

            let result = apply(
                ConversationState::AwaitingTime,
                &mut session,
                text_event(input),
            );

            assert!(
                matches!(
                    result.step,
                    Step::Continue(ConversationState::AwaitingDatePick { .. })
                ),
                "{input:?}"
            );
            assert!(
                matches!(result.effects.as_slice(), [Effect::SendTextWithGrid { .. }]),
                "{input:?}"
            );
            assert_eq!(session.caption.as_deref(), Some("Test"), "{input:?}");
        }
    }

    #[test]
    fn test_publish_success_delivers_url() {
        let mut session = ready_session();
        let result = apply(
            ConversationState::Publishing,
            &mut session,
            Event::PublishFinished(Ok("https://vk.com/wall-1_2".to_owned())),
        );

        assert_eq!(result.step, Step::End(EndReason::Published));
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::SendText { text }] if text == "https://vk.com/wall-1_2"
        ));
    }

    #[test]
    fn test_publish_failure_notifies_and_ends() {
        let mut session = ready_session();
        let result = apply(
            ConversationState::Publishing,
            &mut session,
            Event::PublishFinished(Err(RemoteFailure::Upload)),
        );

        assert_eq!(result.step, Step::End(EndReason::PublishFailed));
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::SendText { text }] if text.contains("wrong")
        ));
    }

    #[test]
    fn test_cancel_applies_in_every_state() {
        let states = [
            ConversationState::Authorizing,
            ConversationState::AwaitingCaption,
            ConversationState::AwaitingTimingChoice,
            ConversationState::AwaitingDatePick {
                cursor: CalendarCursor::new(2024, 6),
            },
            ConversationState::AwaitingTime,
            ConversationState::Publishing,
        ];

        for state in states {
            let mut session = ready_session();
            let result = apply(state, &mut session, Event::Cancel);

            assert_eq!(result.step, Step::End(EndReason::Cancelled), "{state:?}");
            assert!(
                matches!(
                    result.effects.as_slice(),
                    [Effect::RemoveKeyboard { text }] if text.contains("Bye")
                ),
                "{state:?}"
            );
        }
    }

    #[test]
    fn test_unmatched_event_is_unhandled_and_leaves_session_alone() {
        let mut session = ready_session();
        let before = session.clone();

        let result = transition(
            &ConversationState::AwaitingCaption,
            &mut session,
            Event::ButtonPressed {
                payload: "cal:day:2024:6:1".to_owned(),
            },
            today(),
        );

        assert!(result.is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn test_entry_stages_and_authenticates() {
        let result = entry(AttachmentKind::Photo, MediaBytes(vec![1, 2, 3]));
        assert_eq!(
            result.step,
            Step::Continue(ConversationState::Authorizing)
        );
        assert!(matches!(
            result.effects.as_slice(),
            [Effect::PrepareConversation { .. }]
        ));
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("00:00"), Some((0, 0)));
        assert_eq!(parse_time_of_day("23:59"), Some((23, 59)));
        assert_eq!(parse_time_of_day("24:00"), None);
        assert_eq!(parse_time_of_day("12:60"), None);
        assert_eq!(parse_time_of_day("1:30"), None);
        assert_eq!(parse_time_of_day("12-30"), None);
        assert_eq!(parse_time_of_day("12:345"), None);
    }
}
