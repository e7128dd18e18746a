//! Exam number issuing with a configurable uniqueness policy.

use std::collections::HashSet;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::document::present;

pub const EXAM_NUMBER_LENGTH: usize = 10;
const EXAM_NUMBER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Whether every exam number in one batch must be distinct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamNumberPolicy {
    #[default]
    Unique,
    AllowDuplicates,
}

impl FromStr for ExamNumberPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unique" => Ok(ExamNumberPolicy::Unique),
            "allow_duplicates" | "allow-duplicates" => Ok(ExamNumberPolicy::AllowDuplicates),
            other => Err(format!(
                "unknown exam number policy '{other}' (expected 'unique' or 'allow_duplicates')"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("exam number '{0}' is already used in this batch")]
pub struct DuplicateExamNumber(pub String);

/// Random `A-Z0-9` string of [`EXAM_NUMBER_LENGTH`] characters.
pub fn generate_exam_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..EXAM_NUMBER_LENGTH)
        .map(|_| EXAM_NUMBER_CHARSET[rng.random_range(0..EXAM_NUMBER_CHARSET.len())] as char)
        .collect()
}

/// Issues exam numbers for one batch, remembering every number it has handed out.
pub struct ExamNumberAllocator<R> {
    policy: ExamNumberPolicy,
    seen: HashSet<String>,
    rng: R,
}

impl<R: Rng> ExamNumberAllocator<R> {
    pub fn new(policy: ExamNumberPolicy, rng: R) -> Self {
        Self {
            policy,
            seen: HashSet::new(),
            rng,
        }
    }

    /// Keeps a supplied number or generates one. Under [`ExamNumberPolicy::Unique`]
    /// generated numbers are redrawn on collision and a reused supplied number is rejected.
    pub fn assign(&mut self, supplied: &Option<String>) -> Result<String, DuplicateExamNumber> {
        if let Some(number) = present(supplied) {
            let fresh = self.seen.insert(number.to_string());
            if !fresh && self.policy == ExamNumberPolicy::Unique {
                return Err(DuplicateExamNumber(number.to_string()));
            }
            return Ok(number.to_string());
        }

        loop {
            let candidate = generate_exam_number(&mut self.rng);
            let fresh = self.seen.insert(candidate.clone());
            if fresh || self.policy == ExamNumberPolicy::AllowDuplicates {
                return Ok(candidate);
            }
        }
    }
}
