//! Business type matching: light stemming, string similarity and fuzzy
//! lookup of user phrases against Google place types.

use std::collections::BTreeSet;

use crate::business::{is_valid_business_type, BUSINESS_TYPE_KEYWORDS, VALID_BUSINESS_TYPES};

pub const DEFAULT_SIMILARITY_THRESHOLD: u8 = 80;

pub fn simple_stem(word: &str) -> String {
    let mut word = word.to_lowercase();

    if word.ends_with("es") {
        word.truncate(word.len() - 2);
    } else if word.ends_with('s') {
        word.truncate(word.len() - 1);
    }

    if word.ends_with("ing") {
        word.truncate(word.len() - 3);
    }

    word
}

pub fn stem_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(simple_stem)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity ratio in `[0, 1]` based on the longest common subsequence.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(&a, &b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Similarity score 0..=100. Empty input scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (calculate_similarity(a, b) * 100.0).round() as u8
}

/// Best [`ratio`] of the shorter string against every equally long window
/// of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let mut best = 0u8;
    for window in longer.windows(shorter.len()) {
        let score = (2.0 * lcs_len(&shorter, window) as f64 / (2 * shorter.len()) as f64 * 100.0)
            .round() as u8;
        best = best.max(score);
        if best == 100 {
            break;
        }
    }
    best
}

fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn join_tokens<'a>(tokens: impl Iterator<Item = &'a String>) -> String {
    tokens.map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Compares the sorted token intersection with each side's remainder.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let left = tokenize(a);
    let right = tokenize(b);
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let common = join_tokens(left.intersection(&right));
    let only_left = join_tokens(left.difference(&right));
    let only_right = join_tokens(right.difference(&left));

    let combined_left = format!("{} {}", common, only_left).trim().to_string();
    let combined_right = format!("{} {}", common, only_right).trim().to_string();

    ratio(&common, &combined_left)
        .max(ratio(&common, &combined_right))
        .max(ratio(&combined_left, &combined_right))
}

/// Place types compare as words, so `car_wash` reads as `car wash`.
fn stem_business_type(business_type: &str) -> String {
    stem_phrase(&business_type.replace('_', " "))
}

/// Finds the place type the query names, allowing plural and gerund forms.
/// Falls back to containment in either direction.
pub fn find_exact_match<'a>(query: &str, valid_types: &[&'a str]) -> Option<&'a str> {
    let query_stemmed = stem_phrase(query);
    if query_stemmed.is_empty() {
        return None;
    }

    let stemmed: Vec<(&'a str, String)> = valid_types
        .iter()
        .map(|t| (*t, stem_business_type(t)))
        .collect();

    if let Some((valid_type, _)) = stemmed.iter().find(|(_, s)| *s == query_stemmed) {
        return Some(*valid_type);
    }

    stemmed
        .iter()
        .find(|(_, s)| s.contains(&query_stemmed) || query_stemmed.contains(s.as_str()))
        .map(|(valid_type, _)| *valid_type)
}

pub fn find_best_matches(query: &str, threshold: u8) -> Vec<String> {
    let mut matched = BTreeSet::new();

    for word in query.to_lowercase().split_whitespace() {
        for (keyword, place_types) in BUSINESS_TYPE_KEYWORDS {
            if partial_ratio(word, keyword) >= threshold
                || place_types
                    .iter()
                    .any(|t| partial_ratio(word, &t.to_lowercase()) >= threshold)
            {
                matched.insert(keyword.to_string());
            }
        }
    }

    if matched.is_empty() {
        matched = VALID_BUSINESS_TYPES
            .iter()
            .filter(|t| token_set_ratio(query, t) >= threshold)
            .map(|t| t.to_string())
            .collect();
    }

    matched.into_iter().collect()
}

/// Turns a business phrase into a place type usable by the nearby search.
pub fn resolve_business_type(phrase: &str) -> Option<String> {
    if let Some(exact) = find_exact_match(phrase, VALID_BUSINESS_TYPES) {
        return Some(exact.to_string());
    }

    find_best_matches(phrase, DEFAULT_SIMILARITY_THRESHOLD)
        .into_iter()
        .find_map(|candidate| {
            if is_valid_business_type(&candidate) {
                return Some(candidate);
            }
            BUSINESS_TYPE_KEYWORDS
                .iter()
                .find(|(keyword, _)| *keyword == candidate)
                .and_then(|(_, types)| {
                    types.iter().find(|t| is_valid_business_type(t)).map(|t| t.to_string())
                })
        })
}
