// ============================================================
// Layer 5 — BLEU (n-gram precision)
// ============================================================
// Overlap-based translation quality score: geometric mean of
// clipped 1..4-gram precisions between a candidate sentence and
// a single reference, with a brevity penalty when the candidate
// is shorter than the reference. Tokens are whitespace-split.
//
// Reference: Papineni et al. (2002) — BLEU

use std::collections::HashMap;

const MAX_ORDER: usize = 4;

/// BLEU-style n-gram precision of `candidate` against `reference`.
///
/// Returns a score in [0.0, 1.0]. An empty candidate scores 0.0.
/// Only n-gram orders that fit in both sentences contribute, so
/// very short sentence pairs are still scoreable.
pub fn n_gram_precision(candidate: &str, reference: &str) -> f64 {
    let cand: Vec<&str> = candidate.split_whitespace().collect();
    let refr: Vec<&str> = reference.split_whitespace().collect();

    if cand.is_empty() || refr.is_empty() {
        return 0.0;
    }

    let max_n = MAX_ORDER.min(cand.len()).min(refr.len());
    let mut log_sum = 0.0;

    for n in 1..=max_n {
        let p = clipped_precision(&cand, &refr, n);
        if p == 0.0 {
            // one zero precision zeroes the geometric mean
            return 0.0;
        }
        log_sum += p.ln();
    }
    let geo_mean = (log_sum / max_n as f64).exp();

    // Brevity penalty: exp(1 - r/c) when the candidate is shorter
    let bp = if cand.len() >= refr.len() {
        1.0
    } else {
        (1.0 - refr.len() as f64 / cand.len() as f64).exp()
    };

    geo_mean * bp
}

/// Modified n-gram precision for one order: counts candidate n-grams
/// clipped by their occurrence count in the reference.
fn clipped_precision(cand: &[&str], refr: &[&str], n: usize) -> f64 {
    let cand_counts = ngram_counts(cand, n);
    let ref_counts = ngram_counts(refr, n);

    let total: usize = cand_counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    let matched: usize = cand_counts
        .iter()
        .map(|(gram, &count)| count.min(ref_counts.get(gram).copied().unwrap_or(0)))
        .sum();

    matched as f64 / total as f64
}

fn ngram_counts<'a>(tokens: &[&'a str], n: usize) -> HashMap<Vec<&'a str>, usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for window in tokens.windows(n) {
            *counts.entry(window.to_vec()).or_insert(0) += 1;
        }
    }
    counts
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sentences_score_one() {
        let s = "the cat sat on the mat";
        assert!((n_gram_precision(s, s) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn disjoint_sentences_score_zero() {
        assert_eq!(n_gram_precision("a b c d", "w x y z"), 0.0);
    }

    #[test]
    fn empty_candidate_scores_zero() {
        assert_eq!(n_gram_precision("", "a reference"), 0.0);
        assert_eq!(n_gram_precision("a candidate", ""), 0.0);
    }

    #[test]
    fn partial_overlap_is_between_zero_and_one() {
        let score = n_gram_precision("the cat sat down", "the cat sat on the mat");
        assert!(score > 0.0 && score < 1.0, "got {score}");
    }

    #[test]
    fn short_candidate_is_penalised() {
        // same matched prefix, shorter candidate → lower score
        let long = n_gram_precision("the cat sat on the mat", "the cat sat on the mat");
        let short = n_gram_precision("the cat sat", "the cat sat on the mat");
        assert!(short < long);
    }

    #[test]
    fn single_token_sentences_are_scoreable() {
        assert!((n_gram_precision("hello", "hello") - 1.0).abs() < 1e-12);
        assert_eq!(n_gram_precision("hello", "world"), 0.0);
    }
}
