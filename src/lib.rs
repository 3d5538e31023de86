// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # nutri-graph
//!
//! A nutrition knowledge graph: ingredients, nutrients, and compounds linked by
//! typed, confidence-scored relationships, with a query engine for discovery,
//! provenance tracing, and health-goal filtering.
//!
//! ## Architecture
//!
//! - **Pillars** (`pillar`): the fixed 8-category wellness taxonomy and the
//!   keyword classifier that maps outcome text onto it
//! - **Model** (`model`): entities with tagged payloads, ingredient upserts, relationships
//! - **Stores** (`store`): storage traits, in-memory implementations (DashMap), JSON datasets
//! - **Search** (`search`): filtering, BFS path finding (petgraph), connections,
//!   statistics, and autocomplete
//! - **Facade** (`facade`): the public operation surface used by the CLI
//!
//! ## Library usage
//!
//! ```no_run
//! use nutri_graph::config::EngineConfig;
//! use nutri_graph::facade::QueryFacade;
//! use nutri_graph::search::FilterSpec;
//!
//! let graph = QueryFacade::open("graph.json".as_ref(), EngineConfig::default()).unwrap();
//! let path = graph.find_path("turmeric", "inflammation_pathway", 3).unwrap();
//! println!("{} hops, avg confidence {:.1}", path.path_length, path.avg_confidence);
//!
//! let anti_inflammatory = graph.filter_by_pillars(&FilterSpec::default(), &[8]).unwrap();
//! println!("{} ingredients", anti_inflammatory.total);
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod model;
pub mod pillar;
pub mod search;
pub mod store;
