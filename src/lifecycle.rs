/// Frame loop state, `Closing` is terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closing,
}

impl LoopState {
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    /// Moves to `Closing`, returns `true` only for the first call
    pub fn close(&mut self) -> bool {
        std::mem::replace(self, Self::Closing) == Self::Running
    }
}
