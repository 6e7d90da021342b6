//! Simulation scoring.

use serde::Serialize;
use std::fmt;

/// Counters collected over a simulation run.
///
/// A smart switch is scored on the step after it happens, from the value the
/// monitored unit senses on its new channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Steps consumed from the traffic source
    pub steps: u64,
    /// Steps that followed a smart-switch step (the scored steps)
    pub smart_switch_steps: u64,
    /// Scored steps where the monitored channel read EMPTY
    pub correct: u64,
    /// Scored steps where it read OCCUPIED while some channel was EMPTY
    pub incorrect: u64,
    /// Scored steps where a uniformly random channel was EMPTY
    pub random_correct: u64,
    /// Random exploration switches
    pub explorations: u64,
    /// History-driven switches (greedy, predicted or unchanged)
    pub predictions: u64,
    /// Steps spent in round-robin fallback
    pub fallback_steps: u64,
    /// Automatic history flushes
    pub history_flushes: u64,
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64)
}

impl SimulationStats {
    /// Share of scored steps landing on an EMPTY channel.
    pub fn correct_proportion(&self) -> Option<f64> {
        ratio(self.correct, self.smart_switch_steps)
    }

    /// Same, ignoring steps where every channel was OCCUPIED.
    pub fn correct_proportion_ignoring_dead_ends(&self) -> Option<f64> {
        ratio(self.correct, self.correct + self.incorrect)
    }

    /// Share of scored steps where a random pick would have been EMPTY.
    pub fn random_correct_proportion(&self) -> Option<f64> {
        ratio(self.random_correct, self.smart_switch_steps)
    }
}

fn fmt_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Steps:                         {}", self.steps)?;
        writeln!(f, "Fallback steps:                {}", self.fallback_steps)?;
        writeln!(f, "History flushes:               {}", self.history_flushes)?;
        writeln!(f, "Total smart switches:          {}", self.smart_switch_steps)?;
        writeln!(f, "  exploration / prediction:    {} / {}", self.explorations, self.predictions)?;
        writeln!(f, "Correct smart switches:        {}", self.correct)?;
        writeln!(f, "Incorrect smart switches:      {}", self.incorrect)?;
        writeln!(f, "Correct random switches:       {}", self.random_correct)?;
        writeln!(f, "Correct smart proportion:      {}", fmt_ratio(self.correct_proportion()))?;
        writeln!(
            f,
            "  ignoring dead ends:          {}",
            fmt_ratio(self.correct_proportion_ignoring_dead_ends())
        )?;
        write!(f, "Correct random proportion:     {}", fmt_ratio(self.random_correct_proportion()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportions() {
        let stats = SimulationStats {
            smart_switch_steps: 10,
            correct: 6,
            incorrect: 2,
            random_correct: 5,
            ..Default::default()
        };
        assert_eq!(stats.correct_proportion(), Some(0.6));
        assert_eq!(stats.correct_proportion_ignoring_dead_ends(), Some(0.75));
        assert_eq!(stats.random_correct_proportion(), Some(0.5));
    }

    #[test]
    fn test_zero_denominators() {
        let stats = SimulationStats::default();
        assert_eq!(stats.correct_proportion(), None);
        assert_eq!(stats.correct_proportion_ignoring_dead_ends(), None);
        assert_eq!(stats.random_correct_proportion(), None);
    }

    #[test]
    fn test_display() {
        let stats = SimulationStats {
            steps: 100,
            smart_switch_steps: 4,
            correct: 1,
            ..Default::default()
        };
        let report = stats.to_string();
        assert!(report.contains("Steps:                         100"));
        assert!(report.contains("Correct smart proportion:      0.2500"));
        assert!(report.contains("ignoring dead ends:          1.0000"));
    }
}
