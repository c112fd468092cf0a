use super::domain::{RecordId, ValuationDataset, Variable};
use super::ranking::{RankTable, TIE_TOLERANCE};
use super::weights::EffectiveWeights;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecord {
    pub id: RecordId,
    pub is_subject: bool,
    pub ranks: BTreeMap<Variable, u32>,
    /// rank × effective weight for each scored variable.
    pub contributions: BTreeMap<Variable, f64>,
    pub weighted_score: f64,
    pub final_rank: usize,
}

/// Records ordered by final rank (best first).
#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard {
    records: Vec<RankedRecord>,
}

impl Scoreboard {
    pub fn records(&self) -> &[RankedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn subject(&self) -> Option<&RankedRecord> {
        self.records.iter().find(|record| record.is_subject)
    }

    pub fn at_rank(&self, final_rank: usize) -> Option<&RankedRecord> {
        final_rank
            .checked_sub(1)
            .and_then(|index| self.records.get(index))
    }

    /// Subject position when every score tie is resolved against it.
    pub fn conservative_subject_rank(&self) -> Option<usize> {
        let subject = self.subject()?;
        let key = score_key(subject.weighted_score);
        let at_or_ahead = self
            .records
            .iter()
            .filter(|record| !record.is_subject && score_key(record.weighted_score) <= key)
            .count();
        Some(at_or_ahead + 1)
    }
}

pub fn score_records(
    dataset: &ValuationDataset,
    ranks: &RankTable,
    weights: &EffectiveWeights,
) -> Scoreboard {
    let mut records: Vec<RankedRecord> = dataset
        .records()
        .map(|record| {
            let record_ranks = ranks.for_record(&record.id);
            let contributions: BTreeMap<Variable, f64> = weights
                .iter()
                .filter_map(|(variable, weight)| {
                    record_ranks
                        .get(&variable)
                        .map(|rank| (variable, f64::from(*rank) * weight))
                })
                .collect();
            let weighted_score = contributions.values().sum();

            RankedRecord {
                id: record.id.clone(),
                is_subject: record.is_subject,
                ranks: record_ranks,
                contributions,
                weighted_score,
                final_rank: 0,
            }
        })
        .collect();

    records.sort_by(compare_standing);
    for (index, record) in records.iter_mut().enumerate() {
        record.final_rank = index + 1;
    }

    Scoreboard { records }
}

/// Ascending score; equal scores put the subject first, then address, then unit.
fn compare_standing(left: &RankedRecord, right: &RankedRecord) -> Ordering {
    score_key(left.weighted_score)
        .cmp(&score_key(right.weighted_score))
        .then_with(|| right.is_subject.cmp(&left.is_subject))
        .then_with(|| left.id.address.cmp(&right.id.address))
        .then_with(|| left.id.unit.cmp(&right.id.unit))
}

/// Scores quantised to the tie tolerance so that ordering stays a total order.
fn score_key(score: f64) -> i64 {
    (score / TIE_TOLERANCE).round() as i64
}
