//! Escalation decision: explicit requests for a human, high urgency, or a
//! message arriving outside business hours.

use chrono::{DateTime, Timelike, Utc};

use super::urgency::classify_urgency;
use crate::config::EscalationConfig;
use crate::types::{EscalationDecision, EscalationReason, UrgencyLevel};

/// Phrases that ask for a human or signal a complaint. Checked independently
/// of the urgency rules even where the two overlap.
pub const ESCALATION_KEYWORDS: &[&str] = &[
    "speak to someone",
    "human",
    "agent",
    "representative",
    "manager",
    "supervisor",
    "escalate",
    "urgent",
    "emergency",
    "complaint",
];

/// `[start, end)` hour window in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub start: u32,
    pub end: u32,
}

impl BusinessHours {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let hour = at.hour();
        self.start <= hour && hour < self.end
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self { start: 9, end: 18 }
    }
}

impl From<&EscalationConfig> for BusinessHours {
    fn from(config: &EscalationConfig) -> Self {
        Self {
            start: config.business_hours_start,
            end: config.business_hours_end,
        }
    }
}

pub fn matches_escalation_keyword(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    ESCALATION_KEYWORDS.iter().any(|k| message_lower.contains(k))
}

/// Decide escalation for `message` received at `now`. Signals are checked in
/// order (keyword, urgency, after-hours) and the first one found is reported.
pub fn decide_escalation(
    message: &str,
    now: DateTime<Utc>,
    hours: BusinessHours,
) -> EscalationDecision {
    if matches_escalation_keyword(message) {
        return EscalationDecision::escalate(EscalationReason::KeywordMatch);
    }

    if classify_urgency(message) >= UrgencyLevel::High {
        return EscalationDecision::escalate(EscalationReason::Urgency);
    }

    if !hours.contains(now) {
        return EscalationDecision::escalate(EscalationReason::AfterHours);
    }

    EscalationDecision::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};

    const HOURS: BusinessHours = BusinessHours { start: 9, end: 18 };

    #[test]
    fn test_keyword_match() {
        let now = FixedClock::at_hour(12).now();
        let decision = decide_escalation("Can I speak to someone please", now, HOURS);
        assert!(decision.should_escalate);
        assert_eq!(decision.reason, EscalationReason::KeywordMatch);
    }

    #[test]
    fn test_urgency_escalates() {
        let now = FixedClock::at_hour(12).now();
        let decision = decide_escalation("I have a problem with my invoice", now, HOURS);
        assert_eq!(decision, EscalationDecision::escalate(EscalationReason::Urgency));

        let decision = decide_escalation("the site is broken", now, HOURS);
        assert_eq!(decision.reason, EscalationReason::Urgency);
    }

    #[test]
    fn test_medium_urgency_in_hours_does_not_escalate() {
        let now = FixedClock::at_hour(10).now();
        let decision = decide_escalation("How do I export a report?", now, HOURS);
        assert_eq!(decision, EscalationDecision::none());
    }

    #[test]
    fn test_after_hours_escalates_regardless_of_content() {
        for hour in (0..9).chain(18..24) {
            let now = FixedClock::at_hour(hour).now();
            for msg in ["thanks, bye", "", "How do I export a report?"] {
                let decision = decide_escalation(msg, now, HOURS);
                assert!(decision.should_escalate, "hour {} msg {:?}", hour, msg);
            }
        }
    }

    #[test]
    fn test_window_bounds() {
        assert!(HOURS.contains(FixedClock::at_hour(9).now()));
        assert!(HOURS.contains(FixedClock::at_hour(17).now()));
        assert!(!HOURS.contains(FixedClock::at_hour(18).now()));
        assert!(!HOURS.contains(FixedClock::at_hour(8).now()));
    }

    #[test]
    fn test_keyword_takes_precedence_over_after_hours() {
        let now = FixedClock::at_hour(3).now();
        let decision = decide_escalation("let me talk to a manager", now, HOURS);
        assert_eq!(decision.reason, EscalationReason::KeywordMatch);
    }
}
