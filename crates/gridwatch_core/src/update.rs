use crate::{AppState, Effect, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ConfigLoaded(shape) => {
            if state.session() != SessionState::AwaitingConfig {
                return (state, Vec::new());
            }
            if shape.is_empty() {
                state.disable();
                Vec::new()
            } else {
                state.start_polling(shape);
                vec![Effect::StartPolling { shape }]
            }
        }
        Msg::ConfigUnavailable => {
            if state.session() == SessionState::AwaitingConfig {
                state.disable();
            }
            Vec::new()
        }
        Msg::SnapshotPublished(snapshot) => {
            if state.session() == SessionState::Polling {
                state.accept_snapshot(snapshot);
            }
            Vec::new()
        }
        Msg::PollingStopped => {
            if state.session() == SessionState::Polling {
                state.disable();
            }
            Vec::new()
        }
        Msg::QuitRequested => match state.session() {
            SessionState::Polling => {
                state.stop();
                vec![Effect::StopPolling]
            }
            SessionState::AwaitingConfig | SessionState::Disabled => {
                state.stop();
                Vec::new()
            }
            SessionState::Stopped => Vec::new(),
        },
    };

    (state, effects)
}
