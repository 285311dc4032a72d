//! Maturity-adaptive weight blending (§4.7). Early users get interpretable
//! signals (content + rule); mature users get behavior-driven signals
//! (collaborative); sequence share tracks engagement recency/depth.

use crate::models::{UserProfile, Weights};

pub fn weight_policy(profile: &UserProfile) -> Weights {
    let raw = if profile.rating_count < 5 {
        Weights {
            content: 0.40,
            collaborative: 0.10,
            sequence: 0.20 + 0.1 * profile.recency_score,
            rule: 0.30,
        }
    } else if profile.rating_count < 25 {
        Weights {
            content: 0.35,
            collaborative: 0.25,
            sequence: 0.25 + 0.05 * profile.session_depth,
            rule: 0.15,
        }
    } else {
        Weights {
            content: 0.25,
            collaborative: 0.45,
            sequence: 0.20 + 0.1 * profile.recency_score,
            rule: 0.10,
        }
    };

    normalize(raw)
}

fn normalize(weights: Weights) -> Weights {
    let content = weights.content.max(0.0);
    let collaborative = weights.collaborative.max(0.0);
    let sequence = weights.sequence.max(0.0);
    let rule = weights.rule.max(0.0);
    let sum = content + collaborative + sequence + rule;
    let sum = if sum == 0.0 { 1.0 } else { sum };

    Weights {
        content: content / sum,
        collaborative: collaborative / sum,
        sequence: sequence / sum,
        rule: rule / sum,
    }
}
