//! Voting rounds for review steps.

use serde::{Deserialize, Serialize};

/// Tolerance when comparing the approval ratio against the majority.
const RATIO_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: String,
    pub decision: Decision,
    pub confidence: f64,
    pub reasoning: String,
}

impl Vote {
    pub fn approve(voter_id: &str, confidence: f64, reasoning: &str) -> Self {
        Self::new(voter_id, Decision::Approve, confidence, reasoning)
    }

    pub fn reject(voter_id: &str, confidence: f64, reasoning: &str) -> Self {
        Self::new(voter_id, Decision::Reject, confidence, reasoning)
    }

    fn new(voter_id: &str, decision: Decision, confidence: f64, reasoning: &str) -> Self {
        Self {
            voter_id: voter_id.to_string(),
            decision,
            confidence,
            reasoning: reasoning.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VotingStatus {
    #[default]
    Open,
    Decided,
}

/// A vote on one topic.
///
/// The round stays open until `tally` is called. A round with fewer votes
/// than its quorum can still be tallied; the ratio is taken over the votes
/// actually cast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingRound {
    pub topic: String,
    pub votes: Vec<Vote>,
    pub quorum: usize,
    pub required_majority: f64,
    pub status: VotingStatus,
    pub decision: Option<Decision>,
}

impl VotingRound {
    pub fn new(topic: &str, quorum: usize, required_majority: f64) -> Self {
        Self {
            topic: topic.to_string(),
            votes: Vec::new(),
            quorum,
            required_majority,
            status: VotingStatus::Open,
            decision: None,
        }
    }

    /// Record a vote. A voter that already voted is ignored, as is any
    /// vote after the round was decided. Returns whether it was recorded.
    pub fn cast(&mut self, vote: Vote) -> bool {
        if self.status == VotingStatus::Decided
            || self.votes.iter().any(|v| v.voter_id == vote.voter_id)
        {
            return false;
        }
        self.votes.push(vote);
        true
    }

    pub fn approvals(&self) -> usize {
        self.votes
            .iter()
            .filter(|v| v.decision == Decision::Approve)
            .count()
    }

    pub fn has_quorum(&self) -> bool {
        self.votes.len() >= self.quorum
    }

    /// Approval ratio over the votes cast; 0.0 without votes.
    pub fn approval_ratio(&self) -> f64 {
        if self.votes.is_empty() {
            return 0.0;
        }
        self.approvals() as f64 / self.votes.len() as f64
    }

    /// Close the round. Approved iff approvals / votes ≥ required majority.
    pub fn tally(&mut self) -> Decision {
        let decision = if !self.votes.is_empty()
            && self.approval_ratio() + RATIO_EPSILON >= self.required_majority
        {
            Decision::Approve
        } else {
            Decision::Reject
        };
        self.status = VotingStatus::Decided;
        self.decision = Some(decision);
        decision
    }

    /// Mean confidence of the votes cast.
    pub fn mean_confidence(&self) -> f64 {
        if self.votes.is_empty() {
            return 0.0;
        }
        self.votes.iter().map(|v| v.confidence).sum::<f64>() / self.votes.len() as f64
    }
}
