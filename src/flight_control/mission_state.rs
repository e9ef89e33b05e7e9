use std::collections::HashSet;
use std::sync::LazyLock;
use strum_macros::Display;

/// States of the mission loop.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionState {
    Init,
    AwaitTarget,
    Transform,
    Command,
    Aborted,
    Failed,
    Exhausted,
    /// Stopped from outside by the supervisor.
    Cancelled,
}

impl MissionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MissionState::Aborted
                | MissionState::Failed
                | MissionState::Exhausted
                | MissionState::Cancelled
        )
    }

    pub fn can_transition_to(self, next: MissionState) -> bool {
        LEGAL_TRANSITIONS.contains(&(self, next))
    }
}

/// Every transition the mission loop may take. Cancellation and the critical battery abort are
/// reachable from every non-terminal state.
pub static LEGAL_TRANSITIONS: LazyLock<HashSet<(MissionState, MissionState)>> =
    LazyLock::new(|| {
        use MissionState::{
            Aborted, AwaitTarget, Cancelled, Command, Exhausted, Failed, Init, Transform,
        };
        let mut lookup = HashSet::new();
        let transitions = vec![
            (Init, AwaitTarget),
            (AwaitTarget, Transform),
            (AwaitTarget, Exhausted),
            (Transform, Command),
            (Command, AwaitTarget),
            (Command, Failed),
        ];
        lookup.extend(transitions);
        for from in [Init, AwaitTarget, Transform, Command] {
            lookup.insert((from, Aborted));
            lookup.insert((from, Cancelled));
        }
        lookup
    });

#[cfg(test)]
mod tests {
    use super::MissionState;

    #[test]
    fn test_terminal_states_are_sinks() {
        let all = [
            MissionState::Init,
            MissionState::AwaitTarget,
            MissionState::Transform,
            MissionState::Command,
            MissionState::Aborted,
            MissionState::Failed,
            MissionState::Exhausted,
            MissionState::Cancelled,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            assert!(all.iter().all(|to| !from.can_transition_to(*to)));
        }
        assert!(MissionState::Command.can_transition_to(MissionState::AwaitTarget));
        assert!(!MissionState::Transform.can_transition_to(MissionState::Failed));
        assert_eq!(MissionState::AwaitTarget.to_string(), "AWAIT_TARGET");
    }
}
