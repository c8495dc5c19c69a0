use dispatch_core::{
    update, AppState, ChatId, ClientId, Effect, Msg, NoticeStatus, PollState, RemoteStatus,
    ServerId, SessionConfig,
};
use pretty_assertions::assert_eq;

fn submit(state: AppState, text: &str) -> (AppState, ClientId) {
    let (state, _) = update(state, Msg::DraftChanged(text.to_owned()));
    let (state, effects) = update(state, Msg::PromptSubmitted);
    let client_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Submit { client_id, .. } => Some(*client_id),
            _ => None,
        })
        .expect("submit effect");
    (state, client_id)
}

fn enqueue(
    state: AppState,
    client_id: ClientId,
    server: &str,
    status: RemoteStatus,
) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::Enqueued {
            client_id,
            server_id: ServerId::from(server),
            status,
            chat_id: ChatId::from("chat-1"),
        },
    )
}

#[test]
fn cancel_clears_local_state_before_any_network_response() {
    let state = AppState::new(SessionConfig::default());
    let (state, client_id) = submit(state, "Hello");
    let (state, _) = enqueue(state, client_id, "q3", RemoteStatus::Pending);

    let (state, effects) = update(state, Msg::CancelRequested { client_id });

    // Gone from the view synchronously, before the cancel round trip.
    assert!(state.jobs().is_empty());
    assert!(state.transcript().is_empty());
    assert_eq!(
        effects,
        vec![
            Effect::CancelJob {
                server_id: ServerId::from("q3"),
            },
            Effect::DisarmPollTimer,
        ]
    );

    // A failed remote cancel notifies but does not restore the job.
    let (state, effects) = update(
        state,
        Msg::CancelFailed {
            message: "Could not cancel message".to_owned(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify {
            title: "Could not cancel message".to_owned(),
            status: NoticeStatus::Error,
        }]
    );
    assert!(state.jobs().is_empty());
}

#[test]
fn processing_jobs_cannot_be_cancelled() {
    let state = AppState::new(SessionConfig::default());
    let (state, client_id) = submit(state, "Hello");
    let (state, _) = enqueue(state, client_id, "q1", RemoteStatus::Processing);

    assert!(!state.view().jobs[0].cancellable);

    let (state, effects) = update(state, Msg::CancelRequested { client_id });
    assert!(effects.is_empty());
    assert!(state.jobs().get(client_id).is_some());
}

#[test]
fn cancel_before_enqueue_response_skips_the_remote_call() {
    let state = AppState::new(SessionConfig::default());
    let (state, client_id) = submit(state, "Hello");

    let (state, effects) = update(state, Msg::CancelRequested { client_id });
    assert!(effects.is_empty());
    assert!(state.jobs().is_empty());
    assert!(state.transcript().is_empty());

    // The enqueue response races in afterwards; the write is dropped and
    // no timer is armed for the dead job.
    let (state, effects) = enqueue(state, client_id, "q7", RemoteStatus::Pending);
    assert!(state.jobs().is_empty());
    assert!(effects.is_empty());
    assert_eq!(state.poll(), PollState::Disarmed);
}

#[test]
fn stale_enqueue_response_does_not_rebind_the_chat() {
    let state = AppState::new(SessionConfig::default());
    let (state, client_id) = submit(state, "Hello");
    let (state, _) = update(
        state,
        Msg::ChatSwitched {
            chat_id: Some(ChatId::from("chat-2")),
        },
    );

    // The enqueue response for the discarded session arrives late; it
    // must neither rebind nor bump the old chat.
    let (state, effects) = enqueue(state, client_id, "q7", RemoteStatus::Pending);

    assert!(effects.is_empty());
    assert_eq!(state.chat_id(), Some(&ChatId::from("chat-2")));
    assert!(state.jobs().is_empty());
    assert_eq!(state.poll(), PollState::Disarmed);
}

#[test]
fn cancelling_an_untracked_job_is_a_noop() {
    let state = AppState::new(SessionConfig::default());
    let (state, effects) = update(
        state,
        Msg::CancelRequested {
            client_id: ClientId(42),
        },
    );
    assert!(effects.is_empty());
    assert!(state.jobs().is_empty());
}
