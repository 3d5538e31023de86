//! Keyword classifier: free-text health outcomes → health pillars.
//!
//! The classifier is a pure, total function over a static keyword table.
//! Matching is case-insensitive: an exact lookup of the trimmed input, then a
//! substring scan of every keyword, unioning the pillars of everything that
//! matched. "Supports digestion" therefore picks up `digestion` even though the
//! whole string is not a key.
//!
//! Substring matching is naive: `rest` also matches "interest". Stored
//! outcomes were classified this way; tightening it to word boundaries means
//! re-classifying existing data.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::{HealthPillar, PillarSet};

use super::HealthPillar::{
    Digestion as D, Energy as E, Heart as H, Immunity as I, Inflammation as F,
    MentalClarity as M, MuscleRecovery as R, Sleep as S,
};

/// Lowercase keyword → pillars. Order is irrelevant to results.
static KEYWORDS: &[(&str, &[HealthPillar])] = &[
    // generic wellness terms
    ("energy", &[E]),
    ("vitality", &[E]),
    ("stamina", &[E]),
    ("fatigue", &[E]),
    ("endurance", &[E]),
    ("digestion", &[D]),
    ("digestive", &[D]),
    ("gut health", &[D]),
    ("gut", &[D]),
    ("bloating", &[D]),
    ("intestinal", &[D]),
    ("digestive health", &[D]),
    ("gastrointestinal", &[D]),
    ("immunity", &[I]),
    ("immune", &[I]),
    ("immune support", &[I]),
    ("immune system", &[I]),
    ("resilience", &[I]),
    ("immune function", &[I]),
    ("immune response", &[I]),
    ("sleep", &[S]),
    ("rest", &[S]),
    ("insomnia", &[S]),
    ("sleep quality", &[S]),
    ("sleep support", &[S]),
    ("restful", &[S]),
    ("mental", &[M]),
    ("mental clarity", &[M]),
    ("focus", &[M]),
    ("cognitive", &[M]),
    ("brain health", &[M]),
    ("clarity", &[M]),
    ("concentration", &[M]),
    ("memory", &[M]),
    ("brain function", &[M]),
    ("cognitive function", &[M]),
    ("heart", &[H]),
    ("heart health", &[H]),
    ("cardiovascular", &[H]),
    ("cholesterol", &[H]),
    ("blood pressure", &[H]),
    ("circulation", &[H]),
    ("cardiac", &[H]),
    ("muscle", &[R]),
    ("muscle recovery", &[R]),
    ("recovery", &[R]),
    ("strength", &[R]),
    ("athletic", &[R]),
    ("athletic performance", &[R]),
    ("performance", &[R]),
    ("muscle building", &[R]),
    ("exercise", &[R]),
    ("inflammation", &[F]),
    ("anti-inflammatory", &[F]),
    ("inflammatory", &[F]),
    ("reduce inflammation", &[F]),
    ("inflammation reduction", &[F]),
    // ingredients
    ("turmeric", &[F]),
    ("ginger", &[D, F]),
    ("garlic", &[I, H, F]),
    ("olive oil", &[H, F]),
    ("salmon", &[H, R, F]),
    ("fatty fish", &[H, R, F]),
    ("tuna", &[H, R]),
    ("walnuts", &[M, H, F]),
    ("almonds", &[H, R]),
    ("blueberries", &[I, M, F]),
    ("berries", &[I, M, F]),
    ("elderberries", &[I]),
    ("cherries", &[S, F]),
    ("tart cherries", &[S, R, F]),
    ("dark chocolate", &[M, H]),
    ("green tea", &[M, H, F]),
    ("coffee", &[E, M]),
    ("yogurt", &[D, R]),
    ("greek yogurt", &[D, R]),
    ("kefir", &[D, I]),
    ("sauerkraut", &[D, I]),
    ("bone broth", &[D, R, F]),
    ("oats", &[E, D, H]),
    ("quinoa", &[E, R]),
    ("sweet potato", &[E, D]),
    ("bananas", &[E, S]),
    ("eggs", &[E, M, R]),
    ("spinach", &[E, I, H]),
    ("lentils", &[E, D, H]),
    ("beans", &[E, D, H]),
    ("legumes", &[E, D, H]),
    ("chamomile", &[S]),
    ("passionflower", &[S]),
    ("kiwi", &[I, S]),
    ("avocado", &[M, H]),
    ("beef liver", &[E, M, R]),
    ("beets", &[E, H, R]),
    ("beet juice", &[E, H, R]),
    ("pomegranate", &[H, F]),
    ("citrus", &[I, H]),
    ("oranges", &[I, H]),
    ("tomatoes", &[H, F]),
    ("chicken", &[R]),
    ("turkey", &[S, R]),
    ("poultry", &[R]),
    ("cottage cheese", &[S, R]),
    ("milk", &[S, R]),
    ("broccoli", &[D, I, F]),
    ("mushrooms", &[I, R]),
    ("shiitake", &[I, R]),
    ("pumpkin seeds", &[I, R]),
    ("sunflower seeds", &[I, H]),
    ("chia seeds", &[E, D, H]),
    ("flax seeds", &[D, H, F]),
    ("peppermint", &[D]),
    ("fennel", &[D]),
    ("honey", &[E, I, S]),
    ("pineapple", &[D, F]),
    ("papaya", &[D]),
    ("watermelon", &[E, H]),
    ("apple", &[D, H]),
    ("apples", &[D, H]),
    ("artichoke", &[D, H]),
    ("brown rice", &[E, D, H]),
    ("rice", &[E, D, H]),
    ("dark leafy greens", &[E, I, H, F]),
    ("leafy greens", &[E, I, H, F]),
    ("kale", &[E, I, H, F]),
    ("nuts", &[M, H, R]),
    ("mixed nuts", &[M, H, R]),
    ("almond", &[H, R]),
    ("walnut", &[M, H, F]),
    ("oyster", &[I, M, R]),
    ("oysters", &[I, M, R]),
    ("red bell pepper", &[I, H]),
    ("bell pepper", &[I, H]),
    ("red pepper", &[I, H]),
    ("shellfish", &[I, M, R]),
    ("shrimp", &[I, M, R]),
    ("tart cherry juice", &[S, R, F]),
    ("cherry juice", &[S, R, F]),
    ("whole grain", &[E, D, H]),
    ("whole grains", &[E, D, H]),
    ("grain", &[E, D]),
];

static EXACT: LazyLock<HashMap<&'static str, &'static [HealthPillar]>> =
    LazyLock::new(|| KEYWORDS.iter().copied().collect());

/// The keyword table, for inspection and tests.
pub fn keyword_table() -> &'static [(&'static str, &'static [HealthPillar])] {
    KEYWORDS
}

/// Map free text to the set of pillars it mentions.
///
/// Empty input yields the empty set. Never fails, holds no state.
pub fn classify(text: &str) -> PillarSet {
    let mut pillars = PillarSet::new();
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return pillars;
    }

    if let Some(exact) = EXACT.get(lowered.as_str()) {
        pillars.extend(exact.iter().copied());
    }

    for (keyword, ids) in KEYWORDS {
        if lowered.contains(keyword) {
            pillars.extend(ids.iter().copied());
        }
    }

    pillars
}

/// [`classify`] for optional text; `None` yields the empty set.
pub fn classify_opt(text: Option<&str>) -> PillarSet {
    text.map(classify).unwrap_or_default()
}
