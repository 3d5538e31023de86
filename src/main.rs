//! nutri-graph CLI: query a nutrition knowledge graph.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use nutri_graph::config::EngineConfig;
use nutri_graph::facade::QueryFacade;
use nutri_graph::model::{Classification, Confidence};
use nutri_graph::search::{
    FilterSpec, NumericRange, RelationshipFilter, RelationshipSort, SortField, SortOrder,
};

#[derive(Parser)]
#[command(name = "nutri-graph", version, about = "Nutrition knowledge graph query engine")]
struct Cli {
    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset file (JSON). An empty graph is used when omitted.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show graph size and limits.
    Info,

    /// Search entities.
    Search {
        /// Case-insensitive substring of name or id.
        #[arg(long, short)]
        query: Option<String>,
        /// Primary classification: ingredient, nutrient, compound, other.
        #[arg(long = "type")]
        entity_type: Option<Classification>,
        /// Required classification tag (repeatable, all must match).
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Required health-outcome substring (repeatable).
        #[arg(long = "outcome")]
        outcomes: Vec<String>,
        /// Required compound id (repeatable).
        #[arg(long = "compound")]
        compounds: Vec<String>,
        /// Attribute equality, KEY=VALUE (repeatable).
        #[arg(long = "attr", value_parser = parse_key_value)]
        attributes: Vec<(String, String)>,
        /// Numeric lower bound, KEY=N (repeatable).
        #[arg(long = "min", value_parser = parse_key_number)]
        mins: Vec<(String, f64)>,
        /// Numeric upper bound, KEY=N (repeatable).
        #[arg(long = "max", value_parser = parse_key_number)]
        maxs: Vec<(String, f64)>,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, value_enum, default_value = "name")]
        sort: SortArg,
        /// Sort descending.
        #[arg(long)]
        desc: bool,
        /// Include deactivated entities.
        #[arg(long)]
        include_inactive: bool,
    },

    /// Find ingredients supporting health pillars.
    Ingredients {
        /// Pillar id 1-8 (repeatable, any may match). See `pillars`.
        #[arg(long = "pillar")]
        pillars: Vec<i64>,
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long)]
        min_calories: Option<f64>,
        #[arg(long)]
        max_calories: Option<f64>,
        #[arg(long)]
        min_protein: Option<f64>,
        #[arg(long)]
        max_protein: Option<f64>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Find a path between two entities.
    Path {
        source: String,
        target: String,
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Show direct connections of an entity.
    Connections {
        entity: String,
        /// Relationship type to keep (repeatable).
        #[arg(long = "type")]
        types: Vec<String>,
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Graph statistics.
    Stats {
        #[command(subcommand)]
        target: StatsTarget,
    },

    /// Autocomplete entity names.
    Suggest {
        query: String,
        #[arg(long = "type")]
        entity_type: Option<Classification>,
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Classify free text into health pillars.
    Classify { text: String },

    /// List the health pillars.
    Pillars,

    /// Search relationships.
    Relationships {
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        target: Option<String>,
        /// Relationship type (repeatable, any may match).
        #[arg(long = "type")]
        types: Vec<String>,
        #[arg(long)]
        min_confidence: Option<u8>,
        #[arg(long)]
        max_confidence: Option<u8>,
        #[arg(long)]
        has_quantity: Option<bool>,
        /// Context equality, KEY=VALUE on `state` or params (repeatable).
        #[arg(long = "context", value_parser = parse_key_value)]
        context: Vec<(String, String)>,
        #[arg(long, value_enum, default_value = "confidence")]
        sort: RelSortArg,
        /// Sort ascending (default is descending).
        #[arg(long)]
        asc: bool,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Add or update a health outcome on an ingredient.
    Outcome {
        entity: String,
        outcome: String,
        #[arg(long, default_value = "3")]
        confidence: i64,
        /// Save the updated graph back to --data.
        #[arg(long)]
        write: bool,
    },

    /// Add or update a compound entry on an ingredient.
    Compound {
        entity: String,
        compound_id: String,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        write: bool,
    },

    /// Deactivate an entity (it stays retrievable by id).
    Deactivate {
        entity: String,
        #[arg(long)]
        write: bool,
    },

    /// Show one entity by id, name, or alias.
    Show { name_or_id: String },
}

#[derive(Subcommand)]
enum StatsTarget {
    Entities,
    Relationships,
}

#[derive(clap::Args)]
struct PageArgs {
    #[arg(long, default_value = "0")]
    offset: usize,
    /// Page size; the configured default when omitted.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Created,
    Updated,
}

impl From<SortArg> for SortField {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Name => SortField::Name,
            SortArg::Created => SortField::CreatedAt,
            SortArg::Updated => SortField::UpdatedAt,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RelSortArg {
    Confidence,
    Created,
    Type,
}

impl From<RelSortArg> for RelationshipSort {
    fn from(s: RelSortArg) -> Self {
        match s {
            RelSortArg::Confidence => RelationshipSort::ConfidenceScore,
            RelSortArg::Created => RelationshipSort::CreatedAt,
            RelSortArg::Type => RelationshipSort::RelationshipType,
        }
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got \"{s}\""))?;
    if key.is_empty() {
        return Err(format!("empty key in \"{s}\""));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_key_number(s: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = parse_key_value(s)?;
    let n = value
        .parse::<f64>()
        .map_err(|_| format!("\"{value}\" is not a number"))?;
    Ok((key, n))
}

/// CLI values are JSON when they parse as JSON (`52`, `true`), else strings.
fn json_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn numeric_ranges(mins: Vec<(String, f64)>, maxs: Vec<(String, f64)>) -> Vec<NumericRange> {
    let mut ranges: BTreeMap<String, NumericRange> = BTreeMap::new();
    let bounds = mins
        .into_iter()
        .map(|(k, n)| (k, Some(n), None))
        .chain(maxs.into_iter().map(|(k, n)| (k, None, Some(n))));
    for (key, min, max) in bounds {
        let range = ranges.entry(key.clone()).or_insert(NumericRange {
            key,
            min: None,
            max: None,
        });
        range.min = min.or(range.min);
        range.max = max.or(range.max);
    }
    ranges.into_values().collect()
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn write_back(graph: &QueryFacade, data: Option<&Path>, write: bool) -> Result<()> {
    if !write {
        return Ok(());
    }
    let path = data.ok_or_else(|| {
        miette::miette!(
            code = "nutri::cli::no_data",
            help = "Pass --data <file.json> to choose where the graph is saved.",
            "--write needs a dataset file"
        )
    })?;
    graph.save(path)?;
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let graph = match &cli.data {
        Some(path) => QueryFacade::open(path, config)?,
        None => QueryFacade::in_memory(config)?,
    };
    let data = cli.data.as_deref();

    match cli.command {
        Commands::Info => {
            print!("{}", graph.info());
        }

        Commands::Search {
            query,
            entity_type,
            tags,
            outcomes,
            compounds,
            attributes,
            mins,
            maxs,
            page,
            sort,
            desc,
            include_inactive,
        } => {
            let spec = FilterSpec {
                query,
                primary_classification: entity_type,
                classifications: tags,
                health_outcomes: outcomes,
                compound_ids: compounds,
                attributes: attributes
                    .into_iter()
                    .map(|(k, v)| (k, json_value(&v)))
                    .collect(),
                numeric_ranges: numeric_ranges(mins, maxs),
                sort_by: sort.into(),
                sort_order: if desc { SortOrder::Desc } else { SortOrder::Asc },
                offset: page.offset,
                limit: page.limit,
                include_inactive,
                ..Default::default()
            };
            emit(&graph.search(&spec)?)?;
        }

        Commands::Ingredients {
            pillars,
            query,
            min_calories,
            max_calories,
            min_protein,
            max_protein,
            page,
        } => {
            let mut numeric = Vec::new();
            if min_calories.is_some() || max_calories.is_some() {
                numeric.push(NumericRange {
                    key: "calories".into(),
                    min: min_calories,
                    max: max_calories,
                });
            }
            if min_protein.is_some() || max_protein.is_some() {
                numeric.push(NumericRange {
                    key: "protein_g".into(),
                    min: min_protein,
                    max: max_protein,
                });
            }
            let base = FilterSpec {
                query,
                primary_classification: Some(Classification::Ingredient),
                numeric_ranges: numeric,
                offset: page.offset,
                limit: page.limit,
                ..Default::default()
            };
            emit(&graph.filter_by_pillars(&base, &pillars)?)?;
        }

        Commands::Path {
            source,
            target,
            max_depth,
        } => {
            let depth = max_depth.unwrap_or(graph.config().default_path_depth);
            emit(&graph.find_path(&source, &target, depth)?)?;
        }

        Commands::Connections {
            entity,
            types,
            max_depth,
        } => {
            let depth = max_depth.unwrap_or(1);
            let types = (!types.is_empty()).then_some(types.as_slice());
            emit(&graph.get_connections(&entity, types, depth)?)?;
        }

        Commands::Stats { target } => match target {
            StatsTarget::Entities => emit(&graph.entity_statistics())?,
            StatsTarget::Relationships => emit(&graph.relationship_statistics())?,
        },

        Commands::Suggest {
            query,
            entity_type,
            limit,
        } => {
            emit(&graph.suggest(&query, entity_type, limit)?)?;
        }

        Commands::Classify { text } => {
            let pillars: Vec<_> = graph
                .classify(&text)
                .into_iter()
                .map(|p| serde_json::json!({ "id": p.id(), "name": p.name() }))
                .collect();
            emit(&pillars)?;
        }

        Commands::Pillars => {
            emit(&graph.pillars())?;
        }

        Commands::Relationships {
            source,
            target,
            types,
            min_confidence,
            max_confidence,
            has_quantity,
            context,
            sort,
            asc,
            page,
        } => {
            let filter = RelationshipFilter {
                source_id: source,
                target_id: target,
                relationship_types: types,
                min_confidence,
                max_confidence,
                has_quantity,
                context_filters: context
                    .into_iter()
                    .map(|(k, v)| (k, json_value(&v)))
                    .collect(),
                sort_by: sort.into(),
                sort_order: if asc { SortOrder::Asc } else { SortOrder::Desc },
                offset: page.offset,
                limit: page.limit,
            };
            emit(&graph.search_relationships(&filter)?)?;
        }

        Commands::Outcome {
            entity,
            outcome,
            confidence,
            write,
        } => {
            let confidence = Confidence::try_from(confidence)?;
            let id = graph.resolve(&entity)?.id;
            let result = graph.upsert_health_outcome(&id, &outcome, confidence)?;
            write_back(&graph, data, write)?;
            emit(&serde_json::json!({
                "entity_id": id,
                "result": result,
                "entity": graph.get_entity(&id)?,
            }))?;
        }

        Commands::Compound {
            entity,
            compound_id,
            quantity,
            unit,
            write,
        } => {
            let id = graph.resolve(&entity)?.id;
            let result = graph.upsert_compound(&id, &compound_id, quantity, unit)?;
            write_back(&graph, data, write)?;
            emit(&serde_json::json!({ "entity_id": id, "result": result }))?;
        }

        Commands::Deactivate { entity, write } => {
            let id = graph.resolve(&entity)?.id;
            let changed = graph.deactivate(&id)?;
            write_back(&graph, data, write)?;
            emit(&serde_json::json!({ "entity_id": id, "deactivated": changed }))?;
        }

        Commands::Show { name_or_id } => {
            emit(&graph.resolve(&name_or_id)?)?;
        }
    }

    Ok(())
}
