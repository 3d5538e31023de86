//! Multi-criteria entity search with pagination.
//!
//! Filtering runs in two phases. The store applies the [`CoarseFilter`] it
//! can evaluate during a scan; every remaining dimension is then checked in
//! memory, in parallel. All dimensions compose with AND, and list-valued
//! dimensions require every element to match.
//!
//! Numeric attribute ranges are the one exception to "filter everything, then
//! page". By default they run over an oversized batch cut from the sorted
//! result (`limit * coarse_fetch_factor` rows starting at `offset`), and the
//! reported `total` is the count *before* the numeric predicate, an upper
//! bound. Setting `exact_numeric_totals` applies the predicate to the whole
//! set instead. [`SearchResult::total_is_exact`] says which one happened.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::model::{Classification, Entity};
use crate::pillar::{PillarSet, parse_pillar_ids};
use crate::store::CoarseFilter;

use super::GraphSearchEngine;

/// Field to sort entities by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Asc => ord,
            Self::Desc => ord.reverse(),
        }
    }
}

/// Inclusive bounds on a numeric attribute, e.g. `calories` in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub key: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl NumericRange {
    /// Entities lacking a numeric value for `key` never match.
    pub fn matches(&self, entity: &Entity) -> bool {
        let Some(v) = entity.numeric_attribute(&self.key) else {
            return false;
        };
        self.min.is_none_or(|min| v >= min) && self.max.is_none_or(|max| v <= max)
    }
}

/// Search request. Every dimension is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Case-insensitive substring of name or id, matched as given:
    /// surrounding whitespace is part of the needle. Empty means no filter.
    pub query: Option<String>,
    pub primary_classification: Option<Classification>,
    /// Entity must carry every tag.
    pub classifications: Vec<String>,
    /// Each string must be a substring of at least one outcome's text.
    pub health_outcomes: Vec<String>,
    /// Each id must be among the ingredient's compounds.
    pub compound_ids: Vec<String>,
    /// Attribute values that must match exactly.
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Ingredient must have an outcome in at least one of these pillars.
    pub pillars: PillarSet,
    pub numeric_ranges: Vec<NumericRange>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub offset: usize,
    /// Page size; `None` takes the configured default.
    pub limit: Option<usize>,
    pub include_inactive: bool,
}

impl FilterSpec {
    fn coarse(&self) -> CoarseFilter {
        CoarseFilter {
            include_inactive: self.include_inactive,
            primary_classification: self.primary_classification,
            requires_health_outcomes: !self.pillars.is_empty() || !self.health_outcomes.is_empty(),
            text: self
                .query
                .as_deref()
                .filter(|q| !q.is_empty())
                .map(str::to_lowercase),
        }
    }

    /// Every in-memory predicate except numeric ranges.
    fn matches_exact(&self, entity: &Entity) -> bool {
        if !self
            .classifications
            .iter()
            .all(|tag| entity.has_classification(tag))
        {
            return false;
        }
        if !self
            .attributes
            .iter()
            .all(|(key, wanted)| entity.attribute(key).is_some_and(|a| value_eq(&a.value, wanted)))
        {
            return false;
        }

        let needs_ingredient = !self.health_outcomes.is_empty()
            || !self.compound_ids.is_empty()
            || !self.pillars.is_empty();
        if !needs_ingredient {
            return true;
        }
        let Some(data) = entity.as_ingredient() else {
            return false;
        };
        self.health_outcomes
            .iter()
            .all(|s| data.health_outcomes.iter().any(|h| h.outcome.contains(s.as_str())))
            && self.compound_ids.iter().all(|id| data.has_compound(id))
            && (self.pillars.is_empty() || data.supports_any(&self.pillars))
    }

    fn matches_numeric(&self, entity: &Entity) -> bool {
        self.numeric_ranges.iter().all(|r| r.matches(entity))
    }

    fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let ord = match self.sort_by {
            SortField::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        self.sort_order.apply(ord)
    }
}

/// Attribute equality, letting a string match a scalar's rendering so that
/// `color=green` and `calories=52` work from the command line.
fn value_eq(stored: &serde_json::Value, wanted: &serde_json::Value) -> bool {
    if stored == wanted {
        return true;
    }
    match (stored, wanted) {
        (serde_json::Value::String(s), serde_json::Value::Number(n))
        | (serde_json::Value::Number(n), serde_json::Value::String(s)) => {
            s.trim().parse::<f64>().ok() == n.as_f64()
        }
        (serde_json::Value::Bool(b), serde_json::Value::String(s))
        | (serde_json::Value::String(s), serde_json::Value::Bool(b)) => s == &b.to_string(),
        _ => false,
    }
}

/// One page of entity search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub entities: Vec<Entity>,
    /// Filtered, unpaginated count. An upper bound when `total_is_exact` is false.
    pub total: usize,
    pub total_is_exact: bool,
    pub offset: usize,
    pub limit: usize,
    pub elapsed_ms: f64,
}

/// Keep ingredients with at least one outcome in any of `pillars`.
///
/// An empty `pillars` returns `entities` unchanged.
pub fn filter_by_pillars(entities: Vec<Entity>, pillars: &PillarSet) -> Vec<Entity> {
    if pillars.is_empty() {
        return entities;
    }
    entities
        .into_iter()
        .filter(|e| e.as_ingredient().is_some_and(|d| d.supports_any(pillars)))
        .collect()
}

pub(super) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn page<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

impl GraphSearchEngine {
    fn validate_filter(&self, spec: &FilterSpec) -> QueryResult<usize> {
        let limit = spec.limit.unwrap_or(self.config.default_page_size);
        self.check_limit(limit)?;
        for range in &spec.numeric_ranges {
            if range.key.is_empty() {
                return Err(QueryError::invalid("numeric_ranges", "range key is empty"));
            }
            let bad_bound = |b: Option<f64>| b.is_some_and(|v| !v.is_finite());
            if bad_bound(range.min) || bad_bound(range.max) {
                return Err(QueryError::invalid(
                    "numeric_ranges",
                    format!("bounds for `{}` must be finite numbers", range.key),
                ));
            }
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min > max {
                    return Err(QueryError::invalid(
                        "numeric_ranges",
                        format!("min {min} exceeds max {max} for `{}`", range.key),
                    ));
                }
            }
        }
        Ok(limit)
    }

    /// Run a filtered, sorted, paginated entity search.
    pub fn search(&self, spec: &FilterSpec) -> QueryResult<SearchResult> {
        let start = Instant::now();
        let limit = self.validate_filter(spec)?;

        let candidates = self.entities.scan(&spec.coarse());
        let scanned = candidates.len();
        let mut matched: Vec<Entity> = candidates
            .into_par_iter()
            .filter(|e| spec.matches_exact(e))
            .collect();
        // Stable: equal keys keep store insertion order.
        matched.sort_by(|a, b| spec.compare(a, b));

        let (entities, total, total_is_exact) = if spec.numeric_ranges.is_empty() {
            let total = matched.len();
            (page(matched, spec.offset, limit), total, true)
        } else if self.config.exact_numeric_totals {
            let exact: Vec<Entity> = matched
                .into_par_iter()
                .filter(|e| spec.matches_numeric(e))
                .collect();
            let total = exact.len();
            (page(exact, spec.offset, limit), total, true)
        } else {
            let approx_total = matched.len();
            let batch = limit.saturating_mul(self.config.coarse_fetch_factor);
            let hits: Vec<Entity> = matched
                .into_iter()
                .skip(spec.offset)
                .take(batch)
                .filter(|e| spec.matches_numeric(e))
                .take(limit)
                .collect();
            (hits, approx_total, false)
        };

        let elapsed_ms = elapsed_ms(start);
        tracing::debug!(
            scanned,
            total,
            returned = entities.len(),
            total_is_exact,
            elapsed_ms,
            "entity search"
        );
        Ok(SearchResult {
            entities,
            total,
            total_is_exact,
            offset: spec.offset,
            limit,
            elapsed_ms,
        })
    }

    /// Search ingredients whose outcomes touch any of `pillar_ids`.
    ///
    /// An empty `pillar_ids` runs `base` unchanged. Ids outside 1–8 are
    /// rejected before the store is touched.
    pub fn filter_by_pillars(&self, base: &FilterSpec, pillar_ids: &[i64]) -> QueryResult<SearchResult> {
        let pillars = parse_pillar_ids(pillar_ids)
            .map_err(|e| QueryError::invalid("pillar_ids", e.to_string()))?;
        if pillars.is_empty() {
            return self.search(base);
        }
        let mut spec = base.clone();
        spec.primary_classification
            .get_or_insert(Classification::Ingredient);
        spec.pillars.extend(pillars);
        self.search(&spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pillar::HealthPillar;
    use crate::search::fixtures;
    use serde_json::json;

    fn ids(result: &SearchResult) -> Vec<&str> {
        result.entities.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn default_search_sorts_by_name() {
        let engine = fixtures::engine();
        let r = engine.search(&FilterSpec::default()).unwrap();
        assert_eq!(r.total, 8);
        assert!(r.total_is_exact);
        assert_eq!(
            ids(&r),
            vec![
                "apple",
                "curcumin",
                "ginger",
                "gingerol",
                "inflammation_pathway",
                "kale",
                "turmeric",
                "vitamin_c"
            ]
        );
    }

    #[test]
    fn query_matches_name_or_id() {
        let engine = fixtures::engine();
        let spec = FilterSpec {
            query: Some("GINGER".into()),
            ..Default::default()
        };
        assert_eq!(ids(&engine.search(&spec).unwrap()), vec!["ginger", "gingerol"]);

        let by_id = FilterSpec {
            query: Some("_c".into()),
            ..Default::default()
        };
        assert_eq!(ids(&engine.search(&by_id).unwrap()), vec!["vitamin_c"]);
    }

    #[test]
    fn query_whitespace_is_significant() {
        let engine = fixtures::engine();
        let spaced = FilterSpec {
            query: Some(" c".into()),
            ..Default::default()
        };
        assert_eq!(ids(&engine.search(&spaced).unwrap()), vec!["vitamin_c"]);

        let empty = FilterSpec {
            query: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(engine.search(&empty).unwrap().total, 8);
    }

    #[test]
    fn classifications_are_and_across_tags() {
        let engine = fixtures::engine();
        let one = FilterSpec {
            classifications: vec!["spice".into()],
            ..Default::default()
        };
        assert_eq!(engine.search(&one).unwrap().total, 2);
        let both = FilterSpec {
            classifications: vec!["spice".into(), "root".into()],
            ..Default::default()
        };
        assert_eq!(ids(&engine.search(&both).unwrap()), vec!["ginger"]);
    }

    #[test]
    fn health_outcomes_are_and_across_strings() {
        let engine = fixtures::engine();
        let spec = FilterSpec {
            health_outcomes: vec!["digestion".into(), "nausea".into()],
            ..Default::default()
        };
        assert_eq!(ids(&engine.search(&spec).unwrap()), vec!["ginger"]);
        let none = FilterSpec {
            health_outcomes: vec!["digestion".into(), "immunity".into()],
            ..Default::default()
        };
        assert_eq!(engine.search(&none).unwrap().total, 0);
    }

    #[test]
    fn compound_and_attribute_filters() {
        let engine = fixtures::engine();
        let spec = FilterSpec {
            compound_ids: vec!["curcumin".into()],
            ..Default::default()
        };
        assert_eq!(ids(&engine.search(&spec).unwrap()), vec!["turmeric"]);

        let mut attributes = BTreeMap::new();
        attributes.insert("color".to_string(), json!("green"));
        let spec = FilterSpec {
            attributes,
            ..Default::default()
        };
        assert_eq!(ids(&engine.search(&spec).unwrap()), vec!["kale"]);

        let mut attributes = BTreeMap::new();
        attributes.insert("calories".to_string(), json!("52"));
        let spec = FilterSpec {
            attributes,
            ..Default::default()
        };
        assert_eq!(ids(&engine.search(&spec).unwrap()), vec!["apple"]);
    }

    #[test]
    fn sort_descending_and_by_timestamp() {
        let engine = fixtures::engine();
        let spec = FilterSpec {
            primary_classification: Some(Classification::Ingredient),
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        assert_eq!(
            ids(&engine.search(&spec).unwrap()),
            vec!["turmeric", "kale", "ginger", "apple"]
        );

        let by_created = FilterSpec {
            primary_classification: Some(Classification::Ingredient),
            sort_by: SortField::CreatedAt,
            ..Default::default()
        };
        let r = engine.search(&by_created).unwrap();
        let times: Vec<_> = r.entities.iter().map(|e| e.created_at).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn pagination_covers_everything_once() {
        let engine = fixtures::engine();
        let full = engine
            .search(&FilterSpec {
                limit: Some(100),
                ..Default::default()
            })
            .unwrap();
        let mut paged = Vec::new();
        let mut offset = 0;
        while offset < full.total {
            let page = engine
                .search(&FilterSpec {
                    offset,
                    limit: Some(3),
                    ..Default::default()
                })
                .unwrap();
            paged.extend(page.entities.into_iter().map(|e| e.id));
            offset += 3;
        }
        let all: Vec<String> = full.entities.into_iter().map(|e| e.id).collect();
        assert_eq!(paged, all);
    }

    #[test]
    fn limit_is_validated() {
        let engine = fixtures::engine();
        let spec = FilterSpec {
            limit: Some(5000),
            ..Default::default()
        };
        assert!(matches!(
            engine.search(&spec),
            Err(QueryError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn numeric_ranges_approximate_total() {
        let engine = fixtures::engine();
        let spec = FilterSpec {
            primary_classification: Some(Classification::Ingredient),
            numeric_ranges: vec![NumericRange {
                key: "calories".into(),
                min: None,
                max: Some(100.0),
            }],
            ..Default::default()
        };
        let r = engine.search(&spec).unwrap();
        assert_eq!(ids(&r), vec!["apple", "ginger", "kale"]);
        assert!(!r.total_is_exact);
        assert_eq!(r.total, 4);
    }

    #[test]
    fn numeric_ranges_exact_total_when_configured() {
        let mut engine = fixtures::engine();
        engine.config.exact_numeric_totals = true;
        let spec = FilterSpec {
            numeric_ranges: vec![NumericRange {
                key: "protein_g".into(),
                min: Some(1.0),
                max: None,
            }],
            ..Default::default()
        };
        let r = engine.search(&spec).unwrap();
        assert!(r.total_is_exact);
        assert_eq!(r.total, 3);
        assert_eq!(ids(&r), vec!["ginger", "kale", "turmeric"]);
    }

    #[test]
    fn inverted_range_rejected() {
        let engine = fixtures::engine();
        let spec = FilterSpec {
            numeric_ranges: vec![NumericRange {
                key: "calories".into(),
                min: Some(10.0),
                max: Some(5.0),
            }],
            ..Default::default()
        };
        assert!(engine.search(&spec).is_err());
    }

    #[test]
    fn pillar_filter_is_or_across_pillars() {
        let engine = fixtures::engine();
        let r = engine.filter_by_pillars(&FilterSpec::default(), &[3, 8]).unwrap();
        assert_eq!(ids(&r), vec!["kale", "turmeric"]);

        let r = engine.filter_by_pillars(&FilterSpec::default(), &[2]).unwrap();
        assert_eq!(ids(&r), vec!["ginger"]);
    }

    #[test]
    fn empty_pillars_is_noop() {
        let engine = fixtures::engine();
        let base = FilterSpec::default();
        let plain = engine.search(&base).unwrap();
        let filtered = engine.filter_by_pillars(&base, &[]).unwrap();
        assert_eq!(ids(&plain), ids(&filtered));
    }

    #[test]
    fn bad_pillar_id_is_invalid_filter() {
        let engine = fixtures::engine();
        assert!(matches!(
            engine.filter_by_pillars(&FilterSpec::default(), &[3, 9]),
            Err(QueryError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn pure_pillar_filter() {
        let engine = fixtures::engine();
        let all = engine.search(&FilterSpec::default()).unwrap().entities;
        let same = filter_by_pillars(all.clone(), &PillarSet::new());
        assert_eq!(same, all);

        let wanted: PillarSet = [HealthPillar::Immunity, HealthPillar::Inflammation]
            .into_iter()
            .collect();
        let kept: Vec<String> = filter_by_pillars(all, &wanted)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(kept, vec!["kale", "turmeric"]);
    }

    #[test]
    fn adding_a_dimension_never_grows_total() {
        let engine = fixtures::engine();
        let base = FilterSpec {
            primary_classification: Some(Classification::Ingredient),
            ..Default::default()
        };
        let narrowed = FilterSpec {
            classifications: vec!["spice".into()],
            ..base.clone()
        };
        let narrower = FilterSpec {
            health_outcomes: vec!["Anti".into()],
            ..narrowed.clone()
        };
        let t0 = engine.search(&base).unwrap().total;
        let t1 = engine.search(&narrowed).unwrap().total;
        let t2 = engine.search(&narrower).unwrap().total;
        assert!(t1 <= t0 && t2 <= t1);
        assert_eq!(t2, 1);
    }

    #[test]
    fn inactive_entities_hidden_by_default() {
        let engine = fixtures::engine();
        engine.entity_store().deactivate("kale").unwrap();
        let r = engine.search(&FilterSpec::default()).unwrap();
        assert!(!ids(&r).contains(&"kale"));
        let r = engine
            .search(&FilterSpec {
                include_inactive: true,
                ..Default::default()
            })
            .unwrap();
        assert!(ids(&r).contains(&"kale"));
    }
}
