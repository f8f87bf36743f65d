/// Orchestrator stages.
///
/// `Extracting → Deduplicating → WritingIndex → CleaningUp → Done`; a
/// failure in any stage before cleanup goes to `CleaningUp` with
/// `failed: true`, which ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Deduplicating,
    WritingIndex,
    CleaningUp { failed: bool },
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    Failed,
}

impl PipelineState {
    pub fn new() -> Self {
        PipelineState::Idle
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn transition(&self, outcome: StageOutcome) -> PipelineState {
        use PipelineState::*;

        match (self, outcome) {
            (Idle, StageOutcome::Succeeded) => Extracting,
            (Extracting, StageOutcome::Succeeded) => Deduplicating,
            (Deduplicating, StageOutcome::Succeeded) => WritingIndex,
            (WritingIndex, StageOutcome::Succeeded) => CleaningUp { failed: false },
            (Idle | Extracting | Deduplicating | WritingIndex, StageOutcome::Failed) => {
                CleaningUp { failed: true }
            }
            // cleanup outcome never changes the run result
            (CleaningUp { failed: false }, _) => Done,
            (CleaningUp { failed: true }, _) => Failed,
            (Done, _) => Done,
            (Failed, _) => Failed,
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks the current stage and every stage visited.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn advance(&mut self, outcome: StageOutcome) -> PipelineState {
        let next = self.state.transition(outcome);
        if next != self.state {
            self.history.push(next);
        }
        self.state = next;
        next
    }

    pub fn current_state(&self) -> PipelineState {
        self.state
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn visited(&self, state: PipelineState) -> bool {
        self.history.contains(&state)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
