//! Fusion, diversity reshaping, and cutoff/ranking (§4.8).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{ExplanationReason, HybridRecord, Item, ScoreRecord, Weights};

/// Builds the `itemId -> HybridRecord` map from the union of the four
/// scorers' outputs and computes the linear-fusion score. Fusion is
/// commutative over strategies — the four input lists carry no ordering
/// contract (§5).
pub fn fuse(
    content: Vec<ScoreRecord>,
    collaborative: Vec<ScoreRecord>,
    sequence: Vec<ScoreRecord>,
    rule: Vec<ScoreRecord>,
    weights: Weights,
    include_explanations: bool,
) -> Vec<HybridRecord> {
    struct Entry {
        item: Item,
        content: f64,
        collaborative: f64,
        sequence: f64,
        rule: f64,
    }

    let mut entries: HashMap<i64, Entry> = HashMap::new();

    let mut merge = |records: Vec<ScoreRecord>, set: fn(&mut Entry, f64)| {
        for record in records {
            let entry = entries.entry(record.item_id).or_insert_with(|| Entry {
                item: record.item.clone(),
                content: 0.0,
                collaborative: 0.0,
                sequence: 0.0,
                rule: 0.0,
            });
            set(entry, record.score);
        }
    };

    merge(content, |e, s| e.content = s);
    merge(collaborative, |e, s| e.collaborative = s);
    merge(sequence, |e, s| e.sequence = s);
    merge(rule, |e, s| e.rule = s);

    entries
        .into_values()
        .map(|entry| {
            let score = entry.content * weights.content
                + entry.collaborative * weights.collaborative
                + entry.sequence * weights.sequence
                + entry.rule * weights.rule;

            let explanation = if include_explanations {
                Some(explain(entry.content, entry.collaborative, entry.sequence, entry.rule, &weights))
            } else {
                None
            };

            HybridRecord {
                item_id: entry.item.id,
                item: entry.item,
                content_score: entry.content,
                collaborative_score: entry.collaborative,
                sequence_score: entry.sequence,
                rule_score: entry.rule,
                weights,
                score,
                source: "hybrid".to_string(),
                explanation,
            }
        })
        .collect()
}

fn explain(
    content: f64,
    collaborative: f64,
    sequence: f64,
    rule: f64,
    weights: &Weights,
) -> Vec<ExplanationReason> {
    let mut reasons = Vec::new();
    if content > 0.7 && weights.content > 0.2 {
        reasons.push(ExplanationReason::StrongContent);
    }
    if collaborative > 0.7 && weights.collaborative > 0.2 {
        reasons.push(ExplanationReason::SimilarUsers);
    }
    if sequence > 0.7 && weights.sequence > 0.2 {
        reasons.push(ExplanationReason::SessionFlow);
    }
    if rule > 0.6 && weights.rule > 0.1 {
        reasons.push(ExplanationReason::OnboardingMatch);
    }
    reasons
}

const GENRE_PENALTY: f64 = 0.3;
const DIRECTOR_PENALTY: f64 = 0.2;

/// Greedy overlap-penalty diversity reranking. Walks records in descending
/// score order, tracking the union of genres/directors already selected,
/// and multiplicatively shrinks each subsequent record's score for
/// overlap. Records are never dropped — only rescored — and a score can
/// only shrink, never grow (§3 invariants, §8 #4).
pub fn apply_diversity(mut records: Vec<HybridRecord>, diversity_factor: f64) -> Vec<HybridRecord> {
    if diversity_factor <= 0.0 {
        return records;
    }

    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut selected_genres: HashSet<String> = HashSet::new();
    let mut selected_directors: HashSet<String> = HashSet::new();

    for record in &mut records {
        let genre_overlap = record.item.genres.iter().any(|g| selected_genres.contains(g));
        let director_overlap = record
            .item
            .directors
            .iter()
            .any(|d| selected_directors.contains(d));

        let penalty = GENRE_PENALTY * genre_overlap as u8 as f64
            + DIRECTOR_PENALTY * director_overlap as u8 as f64;
        record.score *= 1.0 - penalty * diversity_factor;

        selected_genres.extend(record.item.genres.iter().cloned());
        selected_directors.extend(record.item.directors.iter().cloned());
    }

    records
}

/// Drops records below `min_score`, sorts descending by score (stable
/// ascending by `itemId` on ties), and takes the first `count`.
pub fn cutoff_and_rank(mut records: Vec<HybridRecord>, min_score: f64, count: usize) -> Vec<HybridRecord> {
    records.retain(|r| r.score >= min_score);
    records.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.item_id.cmp(&b.item_id))
    });
    records.truncate(count);
    records
}
