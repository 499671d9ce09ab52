//! The ordered stage enumeration.

use std::fmt;

/// A stage in the shared element lifecycle.
///
/// Stages form a total order by rank; forward transitions move one step at a
/// time, while [`Finish`](GameStage::Finish) and
/// [`Destroy`](GameStage::Destroy) may be jumped to from any earlier stage.
/// [`Pause`](GameStage::Pause) is a side branch off
/// [`Play`](GameStage::Play): resuming returns the element to `Play` rather
/// than advancing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GameStage {
    /// Constructed, not yet prepared.
    Create = 1,
    /// Loading and one-time setup has run.
    Prepare = 2,
    /// Fully initialized, waiting to start.
    Ready = 3,
    /// Actively running.
    Play = 4,
    /// Suspended; resumable back to `Play`.
    Pause = 5,
    /// The session ended; the element keeps its resources.
    Finish = 6,
    /// Torn down; no further stage calls are valid.
    Destroy = 7,
}

/// Canonical list of all stages, in rank order.
pub const ALL_STAGES: [GameStage; 7] = [
    GameStage::Create,
    GameStage::Prepare,
    GameStage::Ready,
    GameStage::Play,
    GameStage::Pause,
    GameStage::Finish,
    GameStage::Destroy,
];

impl GameStage {
    /// Numeric rank used for ordering comparisons.
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Stable, human-readable label for logs and diagnostics.
    pub const fn label(self) -> &'static str {
        match self {
            GameStage::Create => "create",
            GameStage::Prepare => "prepare",
            GameStage::Ready => "ready",
            GameStage::Play => "play",
            GameStage::Pause => "pause",
            GameStage::Finish => "finish",
            GameStage::Destroy => "destroy",
        }
    }

    /// True for the terminal stages reachable by a jump from any earlier one.
    pub const fn is_terminal(self) -> bool {
        matches!(self, GameStage::Finish | GameStage::Destroy)
    }
}

impl fmt::Display for GameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_totally_ordered() {
        for pair in ALL_STAGES.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(GameStage::Create < GameStage::Destroy);
        assert!(GameStage::Pause > GameStage::Play);
    }

    #[test]
    fn test_ranks_match_sequence() {
        let ranks: Vec<u8> = ALL_STAGES.iter().map(|s| s.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(GameStage::Finish.is_terminal());
        assert!(GameStage::Destroy.is_terminal());
        assert!(!GameStage::Pause.is_terminal());
    }

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(GameStage::Create.label(), "create");
        assert_eq!(GameStage::Destroy.to_string(), "destroy");
    }
}
