//! Match expressions for content lookup.
//!
//! A [`MatchExpr`] is a list of per-field conditions, each carrying an
//! ordered set of scoring [`Tier`]s. Evaluating the expression against a
//! content item yields the lowest score any condition produces, together
//! with the tier that produced it. Lower is better; an item no tier
//! accepts is not a match at all.
//!
//! | Tier | Condition | Score |
//! |------|-----------|-------|
//! | `Exact` | case-insensitive equality | `0` |
//! | `Substring` | query contained in field | `weight × (1 − |query| / |field|)` |
//! | `Fuzzy` | enough query words within edit distance | `weight + mean(distance)` |
//!
//! The same fields can also be lowered into a [`PatternQuery`] of plain
//! containment checks, which stores evaluate when they cannot compute
//! edit distances.

use serde::Serialize;
use std::cmp::Ordering;

use crate::edit_distance::distance;
use crate::models::ContentItem;

/// Searchable field of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Title,
    Description,
}

impl Field {
    /// Per-field weight for substring and fuzzy tiers.
    pub fn weight(&self) -> f64 {
        match self {
            Field::Name => 120.0,
            Field::Title => 100.0,
            Field::Description => 150.0,
        }
    }

    pub fn extract<'a>(&self, item: &'a ContentItem) -> Option<&'a str> {
        match self {
            Field::Name => Some(item.name.as_str()),
            Field::Title => item.display_name(),
            Field::Description => item.description(),
        }
    }
}

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactMatch,
    PartialMatch,
    FuzzyPartialMatch,
    PatternMatch,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::ExactMatch => "exact_match",
            MatchType::PartialMatch => "partial_match",
            MatchType::FuzzyPartialMatch => "fuzzy_partial_match",
            MatchType::PatternMatch => "pattern_match",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub score: f64,
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tier {
    Exact,
    Substring { weight: f64 },
    Fuzzy { weight: f64, max_distance: usize },
}

impl Tier {
    /// Score `value` against `query`. Both must already be lowercase.
    pub fn score(&self, value: &str, query: &str) -> Option<f64> {
        match *self {
            Tier::Exact => (value == query).then_some(0.0),
            Tier::Substring { weight } => {
                if value.is_empty() || !value.contains(query) {
                    return None;
                }
                let coverage = query.chars().count() as f64 / value.chars().count() as f64;
                Some(weight * (1.0 - coverage))
            }
            Tier::Fuzzy {
                weight,
                max_distance,
            } => fuzzy_words(value, query, max_distance).map(|mean| weight + mean),
        }
    }

    pub fn match_type(&self) -> MatchType {
        match self {
            Tier::Exact => MatchType::ExactMatch,
            Tier::Substring { .. } => MatchType::PartialMatch,
            Tier::Fuzzy { .. } => MatchType::FuzzyPartialMatch,
        }
    }
}

/// Mean distance of matched query words, if at least half of them (and
/// at least one) are within `max_distance` of some word in `value`.
fn fuzzy_words(value: &str, query: &str, max_distance: usize) -> Option<f64> {
    let value_words: Vec<&str> = value.split_whitespace().collect();
    let query_words: Vec<&str> = query.split_whitespace().collect();
    if value_words.is_empty() || query_words.is_empty() {
        return None;
    }

    let matched: Vec<usize> = query_words
        .iter()
        .filter_map(|qw| value_words.iter().map(|vw| distance(qw, vw)).min())
        .filter(|d| *d <= max_distance)
        .collect();

    let required = query_words.len().div_ceil(2).max(1);
    if matched.len() < required {
        return None;
    }

    Some(matched.iter().sum::<usize>() as f64 / matched.len() as f64)
}

/// One field/query pair with the tiers to try, best tier first.
#[derive(Debug, Clone)]
pub struct FieldCondition {
    pub field: Field,
    pub query: String,
    pub tiers: Vec<Tier>,
}

impl FieldCondition {
    /// Exact, substring, and fuzzy tiers with the field's weight.
    pub fn tiered(field: Field, query: &str, max_distance: usize) -> Self {
        let weight = field.weight();
        Self {
            field,
            query: query.trim().to_lowercase(),
            tiers: vec![
                Tier::Exact,
                Tier::Substring { weight },
                Tier::Fuzzy {
                    weight,
                    max_distance,
                },
            ],
        }
    }

    pub fn evaluate(&self, item: &ContentItem) -> Option<Scored> {
        let value = self.field.extract(item)?.to_lowercase();
        self.tiers
            .iter()
            .filter_map(|tier| {
                tier.score(&value, &self.query).map(|score| Scored {
                    score,
                    match_type: tier.match_type(),
                })
            })
            .min_by(compare_scored)
    }
}

/// Disjunction of field conditions scored by the best one.
#[derive(Debug, Clone, Default)]
pub struct MatchExpr {
    conditions: Vec<FieldCondition>,
}

impl MatchExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: FieldCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn evaluate(&self, item: &ContentItem) -> Option<Scored> {
        self.conditions
            .iter()
            .filter_map(|c| c.evaluate(item))
            .min_by(compare_scored)
    }

    /// Lower into plain containment checks over the same fields.
    pub fn to_pattern_query(&self) -> PatternQuery {
        PatternQuery {
            conditions: self
                .conditions
                .iter()
                .map(|c| (c.field, c.query.clone()))
                .collect(),
        }
    }
}

// `min_by` keeps the first of equal elements, so earlier tiers win ties
fn compare_scored(a: &Scored, b: &Scored) -> Ordering {
    a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal)
}

/// Case-insensitive "field contains query" checks, any of which matches.
#[derive(Debug, Clone, Default)]
pub struct PatternQuery {
    pub conditions: Vec<(Field, String)>,
}

impl PatternQuery {
    pub fn matches(&self, item: &ContentItem) -> bool {
        self.conditions.iter().any(|(field, query)| {
            field
                .extract(item)
                .map(|v| v.to_lowercase().contains(&query.to_lowercase()))
                .unwrap_or(false)
        })
    }
}
