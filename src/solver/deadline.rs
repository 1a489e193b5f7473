use crate::DEADLINE_PERIOD;
use crate::PlanError;
use crate::Result;
use std::time::Duration;
use std::time::Instant;

/// Absolute wall-clock cutoff, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn none() -> Self {
        Self { at: None }
    }
    pub fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }
    /// A zero budget is already expired.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
        }
    }
    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }
    pub fn check(&self, context: &str) -> Result<()> {
        match self.expired() {
            true => Err(PlanError::deadline(context)),
            false => Ok(()),
        }
    }
    /// A counter that consults the clock every [`DEADLINE_PERIOD`] ticks,
    /// starting with the first.
    pub fn ticker<'a>(&'a self, context: &'a str) -> Ticker<'a> {
        Ticker {
            deadline: self,
            context,
            ticks: 0,
        }
    }
}

/// Amortized deadline checks for tight loops.
pub struct Ticker<'a> {
    deadline: &'a Deadline,
    context: &'a str,
    ticks: usize,
}

impl Ticker<'_> {
    pub fn tick(&mut self) -> Result<()> {
        let due = self.ticks % DEADLINE_PERIOD == 0;
        self.ticks += 1;
        match due {
            true => self.deadline.check(self.context),
            false => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_expired() {
        assert!(Deadline::after(Duration::ZERO).expired());
        assert!(!Deadline::none().expired());
        assert!(!Deadline::after(Duration::from_secs(3600)).expired());
    }

    #[test]
    fn first_tick_consults_the_clock() {
        let deadline = Deadline::after(Duration::ZERO);
        let mut ticker = deadline.ticker("test");
        assert!(ticker.tick().is_err());
    }
}
