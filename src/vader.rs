//! Rule-based sentiment scorer used as the fallback strategy.
//!
//! A VADER-style valence model: every token is looked up in an embedded
//! lexicon, adjusted for preceding intensifiers and negations plus
//! capitalization and punctuation emphasis, and the summed valence is
//! normalized into a compound score in [-1, 1].
//!
//! The scorer has no external dependency and no initialization failure mode:
//! it is total over all inputs, including the empty string (compound `0.0`).
//! For fixed text the result is fully deterministic.
//!
//! # Compound thresholds
//!
//! ```text
//! compound >  0.05  → Positive
//! compound < -0.05  → Negative
//! otherwise         → Neutral   (both boundaries are strict)
//! ```

use crate::models::{LexiconScores, Sentiment};

/// Normalization constant: compound = sum / sqrt(sum² + ALPHA).
const ALPHA: f64 = 15.0;

/// Scalar applied to a valence when a negation precedes it.
const NEGATION_SCALAR: f64 = -0.74;

/// Emphasis added to a valence for an ALL-CAPS token in mixed-case text.
const CAPS_EMPHASIS: f64 = 0.733;

/// Per-`!` emphasis added to the total, capped at four marks.
const EXCLAIM_EMPHASIS: f64 = 0.292;

/// Intensifier magnitude (sign per entry in `BOOSTERS`).
const BOOSTER_STEP: f64 = 0.293;

/// Compact valence lexicon on the −4..4 scale, covering vocabulary common
/// in social posts. Sorted by word for binary search.
#[rustfmt::skip]
const LEXICON: &[(&str, f64)] = &[
    ("adore", 2.9), ("afraid", -2.2), ("amazing", 2.8), ("angry", -2.3),
    ("annoyed", -1.8), ("annoying", -1.7), ("anxious", -1.9),
    ("appalling", -2.4), ("awesome", 3.1), ("awful", -2.0), ("bad", -2.5),
    ("beautiful", 2.9), ("best", 3.2), ("better", 1.9), ("bless", 1.8),
    ("bored", -1.3), ("boring", -1.3), ("brilliant", 2.8), ("broke", -1.1),
    ("broken", -1.6), ("calm", 1.3), ("celebrate", 2.7), ("charming", 2.2),
    ("cheerful", 2.5), ("comfortable", 1.7), ("cool", 1.3), ("crap", -2.0),
    ("crappy", -2.5), ("crash", -1.6), ("creepy", -1.7), ("cruel", -2.6),
    ("cry", -2.1), ("crying", -2.2), ("cute", 2.0), ("damn", -1.7),
    ("dead", -3.3), ("delight", 2.9), ("delighted", 2.7),
    ("depressed", -2.3), ("destroy", -2.4), ("die", -2.9),
    ("disappointed", -1.9), ("disappointing", -2.0), ("disaster", -3.1),
    ("disgusting", -2.4), ("dislike", -1.6), ("dreadful", -2.6),
    ("dull", -1.2), ("dumb", -2.3), ("easy", 1.4), ("elegant", 2.1),
    ("enjoy", 2.2), ("enjoyed", 2.3), ("epic", 2.5), ("evil", -3.4),
    ("excellent", 2.7), ("excited", 2.3), ("exciting", 2.2),
    ("fabulous", 2.9), ("fail", -2.5), ("failed", -2.3), ("failure", -2.6),
    ("fantastic", 2.6), ("fear", -2.2), ("fine", 0.8), ("fool", -1.9),
    ("fun", 2.3), ("funny", 1.9), ("furious", -2.7), ("glad", 2.0),
    ("gloomy", -1.9), ("good", 1.9), ("gorgeous", 2.8), ("great", 3.1),
    ("greatest", 3.2), ("gross", -2.1), ("happy", 2.7), ("hate", -2.7),
    ("hated", -2.9), ("hell", -2.5), ("helpful", 1.8), ("hilarious", 2.0),
    ("hope", 1.9), ("hopeless", -2.5), ("horrible", -2.5), ("hurt", -2.4),
    ("ill", -1.8), ("impressive", 2.3), ("incredible", 2.8),
    ("interesting", 1.7), ("jealous", -2.0), ("joy", 2.8), ("kill", -3.4),
    ("lame", -1.8), ("laugh", 2.2), ("like", 1.5), ("liked", 1.6),
    ("lonely", -2.0), ("lose", -1.9), ("loser", -2.4), ("lost", -1.5),
    ("love", 3.2), ("loved", 2.9), ("lovely", 2.8), ("loves", 2.7),
    ("lucky", 2.4), ("mad", -2.2), ("magnificent", 2.9), ("mess", -1.6),
    ("miserable", -2.8), ("miss", -1.4), ("nasty", -2.6), ("nice", 1.8),
    ("outstanding", 2.8), ("pain", -2.5), ("pathetic", -2.4),
    ("perfect", 2.7), ("pleasant", 2.2), ("pleased", 2.1), ("poor", -2.1),
    ("problem", -1.7), ("proud", 2.1), ("rude", -2.0), ("sad", -2.1),
    ("scared", -2.2), ("scary", -2.2), ("shame", -1.9), ("shit", -2.6),
    ("sick", -2.3), ("smart", 1.7), ("smile", 2.0), ("sorry", -0.3),
    ("stress", -1.8), ("stunning", 2.7), ("stupid", -2.4),
    ("success", 2.7), ("suck", -1.5), ("sucks", -1.5), ("super", 2.9),
    ("sweet", 2.0), ("terrible", -2.1), ("terrific", 2.7), ("thank", 1.5),
    ("thanks", 1.9), ("tired", -1.6), ("trash", -1.6), ("trouble", -1.8),
    ("ugly", -2.3), ("unhappy", -2.2), ("upset", -1.8), ("useless", -1.8),
    ("waste", -1.8), ("weak", -1.9), ("weird", -0.7), ("welcome", 2.0),
    ("win", 2.8), ("winning", 2.4), ("wonderful", 2.7), ("worry", -1.9),
    ("worse", -2.1), ("worst", -3.1), ("wow", 2.8), ("wrong", -2.1),
    ("wtf", -2.6), ("yay", 2.4),
];

/// Intensifiers: positive entries amplify, negative entries dampen.
/// Sorted by word.
#[rustfmt::skip]
const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOSTER_STEP), ("almost", -BOOSTER_STEP),
    ("barely", -BOOSTER_STEP), ("completely", BOOSTER_STEP),
    ("deeply", BOOSTER_STEP), ("enormously", BOOSTER_STEP),
    ("entirely", BOOSTER_STEP), ("especially", BOOSTER_STEP),
    ("extremely", BOOSTER_STEP), ("fully", BOOSTER_STEP),
    ("greatly", BOOSTER_STEP), ("highly", BOOSTER_STEP),
    ("hugely", BOOSTER_STEP), ("incredibly", BOOSTER_STEP),
    ("kinda", -BOOSTER_STEP), ("less", -BOOSTER_STEP),
    ("little", -BOOSTER_STEP), ("marginally", -BOOSTER_STEP),
    ("most", BOOSTER_STEP), ("particularly", BOOSTER_STEP),
    ("purely", BOOSTER_STEP), ("quite", BOOSTER_STEP),
    ("really", BOOSTER_STEP), ("remarkably", BOOSTER_STEP),
    ("slightly", -BOOSTER_STEP), ("so", BOOSTER_STEP),
    ("somewhat", -BOOSTER_STEP), ("sorta", -BOOSTER_STEP),
    ("thoroughly", BOOSTER_STEP), ("totally", BOOSTER_STEP),
    ("tremendously", BOOSTER_STEP), ("unbelievably", BOOSTER_STEP),
    ("utterly", BOOSTER_STEP), ("very", BOOSTER_STEP),
];

/// Negation tokens (apostrophes already stripped by tokenization).
/// Sorted.
#[rustfmt::skip]
const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "didnt", "doesnt",
    "dont", "isnt", "neither", "never", "no", "nobody", "none", "nope",
    "nor", "not", "nothing", "nowhere", "shouldnt", "wasnt", "werent",
    "without", "wont", "wouldnt",
];

#[derive(Debug)]
struct Token {
    clean: String,
    all_caps: bool,
}

/// Score a text, returning component proportions and the compound score.
pub fn polarity_scores(text: &str) -> LexiconScores {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return LexiconScores {
            neg: 0.0,
            neu: 0.0,
            pos: 0.0,
            compound: 0.0,
        };
    }

    let cap_diff = has_cap_differential(&tokens);
    let mut valences: Vec<f64> = Vec::with_capacity(tokens.len());

    for (i, token) in tokens.iter().enumerate() {
        let mut valence = lexicon_valence(&token.clean).unwrap_or(0.0);

        if valence != 0.0 {
            if token.all_caps && cap_diff {
                valence += CAPS_EMPHASIS.copysign(valence);
            }

            // Look back up to three tokens for intensifiers and negations.
            // Booster effect decays with distance from the sentiment word.
            for dist in 1..=3usize {
                let Some(j) = i.checked_sub(dist) else { break };
                let prev = &tokens[j];

                if let Some(boost) = booster_valence(&prev.clean) {
                    let decay = match dist {
                        1 => 1.0,
                        2 => 0.95,
                        _ => 0.9,
                    };
                    // Amplifiers push the valence away from zero, dampeners
                    // pull it toward zero, on whichever side it sits.
                    let mut scalar = boost * decay;
                    if valence < 0.0 {
                        scalar = -scalar;
                    }
                    valence += scalar;
                }

                if NEGATIONS.binary_search(&prev.clean.as_str()).is_ok() {
                    valence *= NEGATION_SCALAR;
                }
            }
        }

        valences.push(valence);
    }

    let mut total: f64 = valences.iter().sum();

    // Punctuation emphasis follows the sign of the running total.
    let emphasis = punctuation_emphasis(text);
    if total > 0.0 {
        total += emphasis;
    } else if total < 0.0 {
        total -= emphasis;
    }

    let compound = normalize(total);

    // Proportions, VADER-style: each polar token contributes its valence
    // plus one unit toward its side; non-lexicon tokens count as neutral.
    let mut pos_sum = 0.0f64;
    let mut neg_sum = 0.0f64;
    let mut neu_count = 0.0f64;
    for v in &valences {
        if *v > 0.0 {
            pos_sum += v + 1.0;
        } else if *v < 0.0 {
            neg_sum += v - 1.0;
        } else {
            neu_count += 1.0;
        }
    }

    if pos_sum > neg_sum.abs() {
        pos_sum += emphasis;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= emphasis;
    }

    let denom = pos_sum + neg_sum.abs() + neu_count;
    let (neg, neu, pos) = if denom > 0.0 {
        (
            round3(neg_sum.abs() / denom),
            round3(neu_count / denom),
            round3(pos_sum / denom),
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    LexiconScores {
        neg,
        neu,
        pos,
        compound: round4(compound),
    }
}

/// Map a compound score onto the canonical taxonomy.
///
/// Strict inequalities on both sides: a compound of exactly ±0.05 is
/// Neutral.
pub fn label_for_compound(compound: f64) -> Sentiment {
    if compound > 0.05 {
        Sentiment::Positive
    } else if compound < -0.05 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

fn lexicon_valence(word: &str) -> Option<f64> {
    LEXICON
        .binary_search_by(|(w, _)| w.cmp(&word))
        .ok()
        .map(|i| LEXICON[i].1)
}

fn booster_valence(word: &str) -> Option<f64> {
    BOOSTERS
        .binary_search_by(|(w, _)| w.cmp(&word))
        .ok()
        .map(|i| BOOSTERS[i].1)
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .filter_map(|raw| {
            let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.is_empty() {
                return None;
            }
            let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
            let all_caps = letters.len() > 1 && letters.iter().all(|c| c.is_uppercase());
            let clean: String = trimmed
                .chars()
                .filter(|c| *c != '\'' && *c != '\u{2019}')
                .collect::<String>()
                .to_lowercase();
            Some(Token { clean, all_caps })
        })
        .collect()
}

/// True when the text mixes ALL-CAPS tokens with normal-case tokens;
/// uniform casing carries no emphasis signal.
fn has_cap_differential(tokens: &[Token]) -> bool {
    let caps = tokens.iter().filter(|t| t.all_caps).count();
    caps > 0 && caps < tokens.len()
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclaims = text.matches('!').count().min(4);
    let questions = text.matches('?').count();
    let qm = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclaims as f64 * EXCLAIM_EMPHASIS + qm
}

fn normalize(sum: f64) -> f64 {
    let norm = sum / (sum * sum + ALPHA).sqrt();
    norm.clamp(-1.0, 1.0)
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_sorted() {
        assert!(LEXICON.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(BOOSTERS.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(NEGATIONS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_text_is_neutral_zero() {
        let scores = polarity_scores("");
        assert_eq!(scores.compound, 0.0);
        assert_eq!(label_for_compound(scores.compound), Sentiment::Neutral);
    }

    #[test]
    fn test_love_with_exclamations_is_positive() {
        let scores = polarity_scores("I love this!!!");
        assert!(scores.compound > 0.05, "compound = {}", scores.compound);
        assert_eq!(label_for_compound(scores.compound), Sentiment::Positive);
    }

    #[test]
    fn test_threshold_boundaries_are_strict() {
        assert_eq!(label_for_compound(0.05), Sentiment::Neutral);
        assert_eq!(label_for_compound(-0.05), Sentiment::Neutral);
        assert_eq!(label_for_compound(0.050001), Sentiment::Positive);
        assert_eq!(label_for_compound(-0.050001), Sentiment::Negative);
    }

    #[test]
    fn test_deterministic() {
        let text = "The service was awful but the food was amazing!";
        let a = polarity_scores(text);
        let b = polarity_scores(text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let plain = polarity_scores("this is good");
        let negated = polarity_scores("this is not good");
        assert!(plain.compound > 0.05);
        assert!(negated.compound < 0.0, "compound = {}", negated.compound);
    }

    #[test]
    fn test_booster_amplifies() {
        let plain = polarity_scores("this is good");
        let boosted = polarity_scores("this is very good");
        assert!(boosted.compound > plain.compound);
    }

    #[test]
    fn test_dampener_reduces() {
        let plain = polarity_scores("this is good");
        let damped = polarity_scores("this is slightly good");
        assert!(damped.compound < plain.compound);
    }

    #[test]
    fn test_caps_emphasis_in_mixed_case() {
        let plain = polarity_scores("that movie was great honestly");
        let shouted = polarity_scores("that movie was GREAT honestly");
        assert!(shouted.compound > plain.compound);
    }

    #[test]
    fn test_no_lexicon_words_is_neutral() {
        let scores = polarity_scores("the quick brown fox jumps over the fence");
        assert_eq!(scores.compound, 0.0);
        assert_eq!(label_for_compound(scores.compound), Sentiment::Neutral);
    }

    #[test]
    fn test_compound_stays_in_unit_interval() {
        let scores =
            polarity_scores("best best best best best best best best best best best!!!!");
        assert!(scores.compound <= 1.0);
        let scores = polarity_scores("worst worst worst worst worst worst worst worst!!!!");
        assert!(scores.compound >= -1.0);
    }
}
