//! Topic cluster extraction over a text collection.
//!
//! A lightweight stand-in for full topic modeling: ranked term groups are
//! built by seeding each topic with the most document-frequent unassigned
//! term and attaching the terms that co-occur with it most often. Fully
//! deterministic for a fixed input (ties break lexicographically), which
//! keeps report output stable across runs.

use std::collections::{HashMap, HashSet};

/// Minimum collection size for topic extraction to be meaningful;
/// callers skip the view below this.
pub const MIN_TEXTS: usize = 10;

/// One ranked term group. Weights are in [0, 1]: the seed term carries its
/// document-frequency share, members their co-occurrence share with the
/// seed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Topic {
    pub terms: Vec<(String, f64)>,
}

/// Extract up to `num_topics` ranked term groups from a text collection.
pub fn topic_terms(texts: &[String], num_topics: usize, terms_per_topic: usize) -> Vec<Topic> {
    let docs: Vec<HashSet<String>> = texts
        .iter()
        .map(|t| tokenize(t).into_iter().collect())
        .filter(|set: &HashSet<String>| !set.is_empty())
        .collect();

    if docs.is_empty() {
        return Vec::new();
    }

    // Document frequency per term; singletons carry no grouping signal.
    let mut df: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        for term in doc {
            *df.entry(term.as_str()).or_insert(0) += 1;
        }
    }
    df.retain(|_, count| *count >= 2);

    // Candidates sorted by frequency, ties lexicographic.
    let mut candidates: Vec<(&str, usize)> = df.iter().map(|(t, c)| (*t, *c)).collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let mut assigned: HashSet<&str> = HashSet::new();
    let mut topics = Vec::new();

    for _ in 0..num_topics {
        let Some(&(seed, seed_df)) = candidates.iter().find(|(t, _)| !assigned.contains(t))
        else {
            break;
        };
        assigned.insert(seed);

        // Rank remaining candidates by document co-occurrence with the seed.
        let mut cooc: Vec<(&str, usize, usize)> = candidates
            .iter()
            .filter(|(t, _)| !assigned.contains(t))
            .map(|&(t, t_df)| {
                let count = docs
                    .iter()
                    .filter(|doc| doc.contains(seed) && doc.contains(t))
                    .count();
                (t, count, t_df)
            })
            .filter(|(_, count, _)| *count > 0)
            .collect();
        cooc.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(b.0)));

        let mut terms = vec![(seed.to_string(), seed_df as f64 / docs.len() as f64)];
        for (term, count, _) in cooc.into_iter().take(terms_per_topic.saturating_sub(1)) {
            assigned.insert(term);
            terms.push((term.to_string(), count as f64 / seed_df as f64));
        }

        topics.push(Topic { terms });
    }

    topics
}

/// Lowercased alphabetic tokens longer than two characters, stopwords
/// removed. Shared with the word-frequency view.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() > 2 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

#[rustfmt::skip]
const STOPWORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "any", "are", "because", "been",
    "before", "being", "between", "both", "but", "came", "can", "come",
    "could", "did", "does", "doing", "during", "each", "for", "from", "get",
    "got", "had", "has", "have", "having", "her", "here", "him", "his",
    "how", "into", "its", "just", "like", "made", "make", "many", "more",
    "most", "much", "not", "now", "only", "other", "our", "out", "over",
    "own", "said", "same", "she", "should", "some", "still", "such", "than",
    "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "those", "through", "too", "under", "very", "was", "way",
    "were", "what", "when", "where", "which", "while", "who", "will",
    "with", "would", "you", "your",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        let cooking = [
            "baking bread needs flour yeast water",
            "knead the dough then bake the bread",
            "fresh bread from the oven with butter",
            "sourdough bread flour starter recipe",
            "bake dough in a hot oven",
            "bread recipe with flour and yeast",
        ];
        let coding = [
            "rust compiler catches memory bugs",
            "the rust borrow checker and compiler",
            "writing rust code with cargo",
            "cargo builds rust crates fast",
            "compiler errors teach rust ownership",
            "rust cargo test runs fast",
        ];
        cooking
            .iter()
            .chain(coding.iter())
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_groups_separate_domains() {
        let topics = topic_terms(&corpus(), 2, 4);
        assert_eq!(topics.len(), 2);

        let flat: Vec<Vec<&str>> = topics
            .iter()
            .map(|t| t.terms.iter().map(|(w, _)| w.as_str()).collect())
            .collect();

        // "bread" and "rust" dominate their halves of the corpus; each
        // should seed a distinct group.
        let seeds: Vec<&str> = flat.iter().map(|t| t[0]).collect();
        assert!(seeds.contains(&"bread"));
        assert!(seeds.contains(&"rust"));

        // No term appears in two groups
        let mut seen = HashSet::new();
        for group in &flat {
            for term in group {
                assert!(seen.insert(*term), "term '{}' assigned twice", term);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let a = topic_terms(&corpus(), 3, 4);
        let b = topic_terms(&corpus(), 3, 4);
        assert_eq!(a.len(), b.len());
        for (ta, tb) in a.iter().zip(b.iter()) {
            assert_eq!(ta.terms, tb.terms);
        }
    }

    #[test]
    fn test_empty_and_tiny_input() {
        assert!(topic_terms(&[], 5, 6).is_empty());
        let one = vec!["single text with unique words".to_string()];
        // No term reaches document frequency 2, so no groups form
        assert!(topic_terms(&one, 5, 6).is_empty());
    }

    #[test]
    fn test_weights_in_unit_interval() {
        for topic in topic_terms(&corpus(), 3, 5) {
            for (_, w) in &topic.terms {
                assert!(*w > 0.0 && *w <= 1.0, "weight out of range: {}", w);
            }
        }
    }
}
