//! Terminal output formatting

use console::{style, Color};

use crate::config::ColorChoice;
use crate::runner::Outcome;

/// Rate at or above which a parse rate is good
pub const GOOD_THRESHOLD: f64 = 0.8;
/// Rate at or above which a parse rate is acceptable
pub const OK_THRESHOLD: f64 = 0.5;

/// Colour settings, resolved once and passed to everything that prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(choice: ColorChoice) -> Self {
        let enabled = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => console::user_attended(),
        };
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            style(text).fg(color).force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: &str) -> String {
        if self.enabled {
            style(text).bold().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn outcome(&self, outcome: Outcome) -> String {
        match outcome {
            Outcome::Passed => self.paint("pass", Color::Green),
            Outcome::Failed => self.paint("fail", Color::Red),
            Outcome::Skipped => self.paint("skip", Color::Yellow),
        }
    }

    pub fn rate(&self, text: &str, class: RateClass) -> String {
        match class {
            RateClass::Good => self.paint(text, Color::Green),
            RateClass::Ok => self.paint(text, Color::Yellow),
            RateClass::Bad => self.paint(text, Color::Red),
        }
    }
}

/// Quality band of a parse rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateClass {
    Good,
    Ok,
    Bad,
}

impl RateClass {
    /// Classify a rate where higher is better
    pub fn of(rate: f64) -> Self {
        if rate >= GOOD_THRESHOLD {
            Self::Good
        } else if rate >= OK_THRESHOLD {
            Self::Ok
        } else {
            Self::Bad
        }
    }

    /// Classify a rate where lower is better, e.g. parses of ungrammatical items
    pub fn of_inverted(rate: f64) -> Self {
        Self::of(1.0 - rate)
    }
}

/// `pass\t:key`, or with a log pointer for anything but a pass
pub fn verdict_line(palette: &Palette, outcome: Outcome, key: &str, log: &std::path::Path) -> String {
    match outcome {
        Outcome::Passed => format!("{}\t{}", palette.outcome(outcome), key),
        _ => format!("{}\t{}; See {}", palette.outcome(outcome), key, log.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_rate_classes() {
        assert_eq!(RateClass::of(0.7), RateClass::Ok);
        assert_eq!(RateClass::of(0.8), RateClass::Good);
        assert_eq!(RateClass::of(0.49), RateClass::Bad);
        assert_eq!(RateClass::of_inverted(0.1), RateClass::Good);
        assert_eq!(RateClass::of_inverted(0.3), RateClass::Ok);
        assert_eq!(RateClass::of_inverted(0.9), RateClass::Bad);
    }

    #[test]
    fn test_plain_verdicts() {
        let palette = Palette::new(ColorChoice::Never);
        let log = Path::new("/tmp/wd/run-basic.log");
        assert_eq!(verdict_line(&palette, Outcome::Passed, ":basic", log), "pass\t:basic");
        assert_eq!(verdict_line(&palette, Outcome::Failed, ":basic", log), "fail\t:basic; See /tmp/wd/run-basic.log");
        assert_eq!(verdict_line(&palette, Outcome::Skipped, ":basic", log), "skip\t:basic; See /tmp/wd/run-basic.log");
    }

    #[test]
    fn test_forced_colour() {
        let palette = Palette::new(ColorChoice::Always);
        let pass = palette.outcome(Outcome::Passed);
        assert!(pass.contains("\u{1b}["));
        assert!(pass.contains("pass"));
        assert_eq!(Palette::plain().rate("0.7000", RateClass::Ok), "0.7000");
    }
}
