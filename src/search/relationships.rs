//! Relationship search: filter, sort, and page edges.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::model::{Confidence, Relationship};

use super::GraphSearchEngine;
use super::filter::{SortOrder, elapsed_ms};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipSort {
    #[default]
    ConfidenceScore,
    CreatedAt,
    RelationshipType,
}

/// Relationship search request. Unset fields do not filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipFilter {
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    /// Any of these types (OR). Empty means all types.
    pub relationship_types: Vec<String>,
    pub min_confidence: Option<u8>,
    pub max_confidence: Option<u8>,
    /// `Some(true)`: only edges with a quantity; `Some(false)`: only without.
    pub has_quantity: Option<bool>,
    /// Equality on context fields: `state` or any `params` key.
    pub context_filters: BTreeMap<String, serde_json::Value>,
    pub sort_by: RelationshipSort,
    pub sort_order: SortOrder,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Default for RelationshipFilter {
    fn default() -> Self {
        Self {
            source_id: None,
            target_id: None,
            relationship_types: Vec::new(),
            min_confidence: None,
            max_confidence: None,
            has_quantity: None,
            context_filters: BTreeMap::new(),
            sort_by: RelationshipSort::ConfidenceScore,
            sort_order: SortOrder::Desc,
            offset: 0,
            limit: None,
        }
    }
}

impl RelationshipFilter {
    fn matches(&self, r: &Relationship) -> bool {
        let conf = r.confidence_score.get();
        self.source_id.as_deref().is_none_or(|s| r.source_id == s)
            && self.target_id.as_deref().is_none_or(|t| r.target_id == t)
            && (self.relationship_types.is_empty()
                || self.relationship_types.contains(&r.relationship_type))
            && self.min_confidence.is_none_or(|min| conf >= min)
            && self.max_confidence.is_none_or(|max| conf <= max)
            && self.has_quantity.is_none_or(|want| r.quantity.is_some() == want)
            && self
                .context_filters
                .iter()
                .all(|(key, wanted)| r.context.field(key).as_ref() == Some(wanted))
    }

    fn compare(&self, a: &Relationship, b: &Relationship) -> Ordering {
        let ord = match self.sort_by {
            RelationshipSort::ConfidenceScore => a.confidence_score.cmp(&b.confidence_score),
            RelationshipSort::CreatedAt => a.created_at.cmp(&b.created_at),
            RelationshipSort::RelationshipType => a.relationship_type.cmp(&b.relationship_type),
        };
        self.sort_order.apply(ord).then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipSearchResult {
    pub relationships: Vec<Relationship>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub elapsed_ms: f64,
}

fn check_confidence(field: &str, value: Option<u8>) -> QueryResult<()> {
    match value {
        Some(v) if Confidence::new(v).is_none() => Err(QueryError::invalid(
            field,
            format!("{v} is outside the 1-5 confidence scale"),
        )),
        _ => Ok(()),
    }
}

impl GraphSearchEngine {
    pub fn search_relationships(&self, filter: &RelationshipFilter) -> QueryResult<RelationshipSearchResult> {
        let start = Instant::now();
        let limit = filter.limit.unwrap_or(self.config.default_page_size);
        self.check_limit(limit)?;
        check_confidence("min_confidence", filter.min_confidence)?;
        check_confidence("max_confidence", filter.max_confidence)?;
        if let (Some(min), Some(max)) = (filter.min_confidence, filter.max_confidence) {
            if min > max {
                return Err(QueryError::invalid(
                    "min_confidence",
                    format!("min {min} exceeds max {max}"),
                ));
            }
        }

        let snap = self.snapshot();
        let mut matched: Vec<&Relationship> = snap
            .relationships()
            .iter()
            .filter(|r| filter.matches(r))
            .collect();
        matched.sort_by(|a, b| filter.compare(a, b));
        let total = matched.len();
        let relationships: Vec<Relationship> = matched
            .into_iter()
            .skip(filter.offset)
            .take(limit)
            .cloned()
            .collect();

        let elapsed_ms = elapsed_ms(start);
        tracing::debug!(total, returned = relationships.len(), elapsed_ms, "relationship search");
        Ok(RelationshipSearchResult {
            relationships,
            total,
            offset: filter.offset,
            limit,
            elapsed_ms,
        })
    }
}
