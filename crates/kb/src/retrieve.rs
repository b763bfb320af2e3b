//! Similarity retrieval over the knowledge base.
//!
//! Ranking uses a longest-matching-blocks ratio between the lowercased
//! query and each lowercased question: `2 * matched / (len(a) + len(b))`,
//! in `[0, 1]`. Tests pin both the formula and the 0.3 cutoff exactly.

use std::collections::HashMap;

use supportdesk_core::faq::ScoredEntry;
use tracing::debug;

use crate::store::FaqStore;

/// Entries at or below this score are dropped, even when fewer than `top_n`
/// survive.
pub const SCORE_THRESHOLD: f32 = 0.3;

/// Default number of entries returned per query.
pub const DEFAULT_TOP_N: usize = 3;

impl FaqStore {
    /// Rank all entries against `query` and return at most `top_n`, ordered
    /// by descending similarity. Ties preserve knowledge-base order.
    pub fn retrieve(&self, query: &str, top_n: usize) -> Vec<ScoredEntry> {
        let query_lower = query.to_lowercase();

        let mut scored: Vec<ScoredEntry> = self
            .all_entries()
            .iter()
            .map(|entry| ScoredEntry {
                score: similarity_ratio(&query_lower, &entry.question.to_lowercase()),
                entry: entry.clone(),
            })
            .collect();

        // Stable sort: equal scores keep their original order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let results: Vec<ScoredEntry> = scored
            .into_iter()
            .take(top_n)
            .filter(|s| s.score > SCORE_THRESHOLD)
            .collect();

        debug!(
            query_len = query.len(),
            candidates = self.len(),
            returned = results.len(),
            "Knowledge retrieval"
        );
        results
    }
}

/// Normalized string similarity in `[0, 1]`.
///
/// Recursively finds the longest common block, then matches what remains on
/// either side of it. The ratio is `2 * total_matched / (|a| + |b|)`; two
/// empty strings score 1.0.
pub fn similarity_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    // Positions of each character in b, ascending.
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }

    let mut matched = 0usize;
    let mut queue = vec![(0usize, a.len(), 0usize, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, size) = longest_match(&a, &b2j, alo, ahi, blo, bhi);
        if size > 0 {
            matched += size;
            queue.push((alo, i, blo, j));
            queue.push((i + size, ahi, j + size, bhi));
        }
    }

    2.0 * matched as f32 / total as f32
}

/// Find the longest block `a[i..i+size] == b[j..j+size]` within the given
/// window, preferring the earliest `i`, then the earliest `j`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);
    // j2len[j] = length of the longest run ending at a[i], b[j].
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for i in alo..ahi {
        let mut next_j2len: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(&a[i]) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let run = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                next_j2len.insert(j, run);
                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            }
        }
        j2len = next_j2len;
    }

    (best_i, best_j, best_size)
}
