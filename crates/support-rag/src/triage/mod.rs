//! Urgency and escalation triage for incoming customer messages.
//!
//! Everything here is a pure function of the message and the injected clock;
//! no store or network access happens on this path.

pub mod escalation;
pub mod urgency;

use serde::Serialize;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SupportConfig;
use crate::types::{EscalationDecision, UrgencyLevel, UserInfo};

pub use escalation::{decide_escalation, BusinessHours, ESCALATION_KEYWORDS};
pub use urgency::{classify_urgency, URGENCY_RULES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriageAssessment {
    pub urgency: UrgencyLevel,
    pub escalation: EscalationDecision,
}

pub struct Triage {
    clock: Arc<dyn Clock>,
    hours: BusinessHours,
    auto_escalation_enabled: bool,
}

impl Triage {
    pub fn new(clock: Arc<dyn Clock>, config: &SupportConfig) -> Self {
        Self {
            clock,
            hours: BusinessHours::from(&config.escalation),
            auto_escalation_enabled: config.features.auto_escalation_enabled,
        }
    }

    pub fn classify_urgency(&self, message: &str) -> UrgencyLevel {
        classify_urgency(message)
    }

    /// `user_info` is accepted for callers that have it; none of the current
    /// signals depend on it.
    pub fn decide_escalation(
        &self,
        message: &str,
        user_info: Option<&UserInfo>,
    ) -> EscalationDecision {
        if !self.auto_escalation_enabled {
            return EscalationDecision::none();
        }

        let decision = decide_escalation(message, self.clock.now(), self.hours);
        if decision.should_escalate {
            tracing::info!(
                reason = ?decision.reason,
                user_id = user_info.and_then(|u| u.user_id.as_deref()).unwrap_or("unknown"),
                "Conversation flagged for escalation"
            );
        }
        decision
    }

    pub fn assess(&self, message: &str, user_info: Option<&UserInfo>) -> TriageAssessment {
        TriageAssessment {
            urgency: self.classify_urgency(message),
            escalation: self.decide_escalation(message, user_info),
        }
    }
}
