/// Counts loop iterations for a metric that only needs refreshing every so
/// often.
///
/// A cadence is due on its first check and then on every `every`-th check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    every: u32,
    countdown: u32,
}

impl Cadence {
    pub fn every(every: u32) -> Self {
        Self {
            every: every.max(1),
            countdown: 0,
        }
    }

    /// Advance by one iteration, returning whether the metric is due now.
    pub fn due(&mut self) -> bool {
        if self.countdown == 0 {
            self.countdown = self.every - 1;
            true
        } else {
            self.countdown -= 1;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due_iterations(mut cadence: Cadence, iterations: u32) -> Vec<u32> {
        (0..iterations).filter(|_| cadence.due()).collect()
    }

    #[test]
    fn test_due_on_first_iteration_then_periodically() {
        assert_eq!(due_iterations(Cadence::every(10), 31), vec![0, 10, 20, 30]);
        assert_eq!(due_iterations(Cadence::every(5), 11), vec![0, 5, 10]);
    }

    #[test]
    fn test_every_iteration() {
        assert_eq!(due_iterations(Cadence::every(1), 4), vec![0, 1, 2, 3]);
        assert_eq!(due_iterations(Cadence::every(0), 3), vec![0, 1, 2]);
    }

    #[test]
    fn test_cadences_are_independent() {
        let mut date = Cadence::every(2);
        let mut mail = Cadence::every(3);
        let pattern: Vec<(bool, bool)> = (0..6).map(|_| (date.due(), mail.due())).collect();
        assert_eq!(
            pattern,
            vec![
                (true, true),
                (false, false),
                (true, false),
                (false, true),
                (true, false),
                (false, false),
            ]
        );
    }
}
