use std::time::{Duration, Instant};

use engine_logging::{engine_info, engine_warn};
use gridwatch_core::{Effect, Msg};
use gridwatch_engine::{ConfigSource, EngineConfig, EngineError, EngineEvent, EngineHandle};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(config)?;
        Ok(Self { engine })
    }

    pub fn load_config(&self, source: ConfigSource) {
        engine_info!("LoadConfig source={:?}", source);
        self.engine.load_config(source);
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartPolling { shape } => {
                    engine_info!("StartPolling grid={}", shape);
                    self.engine.start_polling(shape);
                }
                Effect::StopPolling => {
                    engine_info!("StopPolling");
                    self.engine.stop_polling();
                }
            }
        }
    }

    /// Wait up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }

    /// Block until the engine confirms polling has stopped, or `timeout` passes.
    pub fn wait_for_stop(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match self.engine.recv_timeout(remaining) {
                Some(EngineEvent::PollingStopped) => return true,
                Some(_) => {}
                None => break,
            }
        }
        engine_warn!("Engine did not confirm shutdown within {:?}", timeout);
        false
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ConfigResolved { shape } => Msg::ConfigLoaded(shape),
        EngineEvent::ConfigFailed { reason } => {
            engine_warn!("Grid config unavailable: {}", reason);
            Msg::ConfigUnavailable
        }
        EngineEvent::SnapshotPublished(snapshot) => Msg::SnapshotPublished(snapshot),
        EngineEvent::PollingStopped => {
            engine_info!("Engine reports polling stopped");
            Msg::PollingStopped
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Once;

    use gridwatch_core::{update, AppState, GridShape, SessionState};
    use pretty_assertions::assert_eq;

    use super::*;

    fn init_logging() {
        static INIT: Once = Once::new();
        INIT.call_once(engine_logging::initialize_for_tests);
    }

    fn pump_until_stopped(runner: &EffectRunner, mut state: AppState) -> AppState {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(msg) = runner.next_msg(Duration::from_millis(50)) {
                let stopped = msg == Msg::PollingStopped;
                let (next, effects) = update(state, msg);
                state = next;
                runner.enqueue(effects);
                if stopped {
                    break;
                }
            }
        }
        state
    }

    #[test]
    fn scheduler_that_cannot_start_disables_the_board() {
        init_logging();
        let mut config = EngineConfig::with_base_url("ftp://tiles.local");
        config.scheduler.interval = Duration::ZERO;
        let runner = EffectRunner::new(config).unwrap();

        let (state, effects) = update(AppState::new(), Msg::ConfigLoaded(GridShape::new(1, 1)));
        runner.enqueue(effects);
        let state = pump_until_stopped(&runner, state);

        assert_eq!(state.session(), SessionState::Disabled);
        assert!(state.latest().is_none());

        let (state, effects) = update(state, Msg::QuitRequested);
        assert_eq!(state.session(), SessionState::Stopped);
        assert!(effects.is_empty());
    }

    #[test]
    fn zero_interval_alone_disables_the_board() {
        init_logging();
        let mut config = EngineConfig::default();
        config.scheduler.interval = Duration::ZERO;
        let runner = EffectRunner::new(config).unwrap();

        let (state, effects) = update(AppState::new(), Msg::ConfigLoaded(GridShape::new(2, 1)));
        runner.enqueue(effects);
        let state = pump_until_stopped(&runner, state);

        assert_eq!(state.session(), SessionState::Disabled);
    }

    #[test]
    fn stop_without_running_scheduler_is_confirmed_promptly() {
        init_logging();
        let runner = EffectRunner::new(EngineConfig::default()).unwrap();

        let started = Instant::now();
        runner.enqueue(vec![Effect::StopPolling]);
        assert!(runner.wait_for_stop(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
