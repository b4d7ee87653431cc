//! Early stopping on a validation metric.
//!
//! Tracks the best validation score and the round it occurred in. Training
//! halts once the current round is more than `window` rounds past the best
//! one; the trainer then truncates the ensemble back to the best round.

/// Outcome of feeding one round's validation score to [`EarlyStopping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyStopAction {
    /// New best score; this round is the rollback target.
    Improved,
    /// No improvement, still within the window.
    Continue,
    /// No improvement for more than `window` rounds.
    Stop,
}

/// Early stopping state.
///
/// # Example
///
/// ```
/// use ranktree::training::{EarlyStopAction, EarlyStopping};
///
/// let mut early_stop = EarlyStopping::new(2, true);
/// assert_eq!(early_stop.update(0.5), EarlyStopAction::Improved);
/// assert_eq!(early_stop.update(0.5), EarlyStopAction::Continue);
/// assert_eq!(early_stop.update(0.4), EarlyStopAction::Continue);
/// assert_eq!(early_stop.update(0.5), EarlyStopAction::Stop);
/// assert_eq!(early_stop.best_round(), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    /// Rounds without improvement tolerated before stopping.
    window: usize,
    best_value: Option<f64>,
    best_round: Option<usize>,
    current_round: usize,
    higher_is_better: bool,
}

impl EarlyStopping {
    pub fn new(window: usize, higher_is_better: bool) -> Self {
        Self {
            window,
            best_value: None,
            best_round: None,
            current_round: 0,
            higher_is_better,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Record the score of the current round and advance to the next one.
    ///
    /// Only a strict improvement moves the best round, so a flat score keeps
    /// the earliest round that reached it.
    pub fn update(&mut self, value: f64) -> EarlyStopAction {
        let round = self.current_round;
        self.current_round += 1;

        let improved = match self.best_value {
            None => true,
            Some(best) if self.higher_is_better => value > best,
            Some(best) => value < best,
        };
        if improved {
            self.best_value = Some(value);
            self.best_round = Some(round);
            return EarlyStopAction::Improved;
        }

        let best_round = self.best_round.unwrap_or(0);
        if round - best_round > self.window {
            EarlyStopAction::Stop
        } else {
            EarlyStopAction::Continue
        }
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    /// Zero-based round of the best score, `None` before the first update.
    pub fn best_round(&self) -> Option<usize> {
        self.best_round
    }

    /// Number of rounds seen so far.
    pub fn current_round(&self) -> usize {
        self.current_round
    }

    pub fn reset(&mut self) {
        self.best_value = None;
        self.best_round = None;
        self.current_round = 0;
    }
}
