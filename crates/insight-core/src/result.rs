//! Command-specific result payloads.
//!
//! `result` is a tagged variant whose tag equals the command family; the
//! shape validator dispatches on the tag.

use crate::response::EvidenceRef;
use serde::{Deserialize, Serialize};

/// Maximum final answer length for iterative results.
pub const MAX_ANSWER: usize = 600;
/// Maximum synthesis summary length.
pub const MAX_SUMMARY: usize = 400;

/// Command-specific result payload, tagged by family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResult {
    /// Iterative Q&A result.
    Iterative(IterativeResult),
    /// Event linkage result.
    Events(EventsResult),
    /// Knowledge-graph result.
    Graph(GraphResult),
    /// Memory operation result.
    Memory(MemoryResult),
    /// Cross-agent synthesis result.
    Synthesis(SynthesisResult),
    /// Trend forecast result.
    Forecast(ForecastResult),
    /// Competitor analysis result.
    Competitors(CompetitorsResult),
}

impl CommandResult {
    /// Family tag, matching the serde tag value.
    #[must_use]
    pub fn family(&self) -> &'static str {
        match self {
            Self::Iterative(_) => "iterative",
            Self::Events(_) => "events",
            Self::Graph(_) => "graph",
            Self::Memory(_) => "memory",
            Self::Synthesis(_) => "synthesis",
            Self::Forecast(_) => "forecast",
            Self::Competitors(_) => "competitors",
        }
    }
}

// ---------------------------------------------------------------------------
// Iterative Q&A
// ---------------------------------------------------------------------------

/// One retrieve-reason-refine step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterativeStep {
    /// 1-based iteration number.
    pub iteration: u32,
    /// Query used this iteration, at most 180 characters.
    pub query: String,
    /// Number of documents consulted this iteration.
    pub n_docs: usize,
    /// Why this iteration ran, at most 200 characters.
    pub reason: String,
}

/// Result of the iterative deep-dive agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterativeResult {
    /// Ordered step records.
    pub steps: Vec<IterativeStep>,
    /// Final synthesized answer, at most [`MAX_ANSWER`] characters.
    pub answer: String,
    /// Up to five suggested follow-up questions.
    pub followups: Vec<String>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A clustered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event id, `evt_{i}`.
    pub id: String,
    /// Event title.
    pub title: String,
    /// `[start_date, end_date]`, both `YYYY-MM-DD`.
    pub ts_range: [String; 2],
    /// Entities mentioned in the clustered documents.
    pub entities: Vec<String>,
    /// Article ids of the contributing documents.
    pub docs: Vec<String>,
}

/// Position of an event relative to a reference event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelinePosition {
    /// Strictly earlier than the reference.
    Before,
    /// Overlapping time ranges.
    Overlap,
    /// Strictly later than the reference.
    After,
}

/// A temporal relation between two events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRelation {
    /// The event being placed.
    pub event_id: String,
    /// Its position relative to the reference event.
    pub position: TimelinePosition,
    /// The reference event.
    pub ref_event_id: String,
}

/// A detected cause-effect link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalLink {
    /// The cause event id.
    pub cause_event_id: String,
    /// The effect event id.
    pub effect_event_id: String,
    /// Link confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Supporting references; at least one.
    pub evidence_refs: Vec<EvidenceRef>,
}

/// Result of the events agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsResult {
    /// Clustered events.
    pub events: Vec<EventRecord>,
    /// Temporal relations between adjacent events.
    pub timeline: Vec<TimelineRelation>,
    /// Cause-effect links with confidence above the recording floor.
    pub causal_links: Vec<CausalLink>,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A node in the knowledge subgraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node id.
    pub id: String,
    /// Node type: `topic`, `article`, or `entity`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display label.
    pub label: String,
}

/// An edge in the knowledge subgraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Edge type; currently always `relates_to`.
    #[serde(rename = "type")]
    pub edge_type: String,
    /// Edge weight in `[0.0, 1.0]`.
    pub weight: f64,
}

/// A subgraph extracted around the top-scored nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    /// Nodes reached within the hop limit.
    pub nodes: Vec<GraphNode>,
    /// Edges between the reached nodes.
    pub edges: Vec<GraphEdge>,
}

/// A path found between two central nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPath {
    /// Node id sequence.
    pub nodes: Vec<String>,
    /// Hop count (`nodes.len() - 1`).
    pub hops: usize,
    /// Path score (average edge weight).
    pub score: f64,
}

/// Result of the graph agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphResult {
    /// The extracted subgraph.
    pub subgraph: Subgraph,
    /// Paths between central nodes.
    pub paths: Vec<GraphPath>,
    /// Short generated answer text.
    pub answer: String,
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// A storage suggestion produced by the memory agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySuggestion {
    /// Memory type: `episodic` or `semantic`.
    #[serde(rename = "type")]
    pub memory_type: String,
    /// Proposed content.
    pub content: String,
    /// Importance in `[0.0, 1.0]`.
    pub importance: f64,
    /// Proposed time-to-live in days.
    pub ttl_days: u32,
}

/// A memory queued for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStoreItem {
    /// Memory type: `episodic` or `semantic`.
    #[serde(rename = "type")]
    pub memory_type: String,
    /// Stored content.
    pub content: String,
    /// Source references (article ids or URLs).
    pub refs: Vec<String>,
    /// Time-to-live in days.
    pub ttl_days: u32,
}

/// A recalled memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Record id.
    pub id: String,
    /// Memory type.
    #[serde(rename = "type")]
    pub memory_type: String,
    /// Record content.
    pub content: String,
    /// Creation date, `YYYY-MM-DD`.
    pub ts: String,
    /// Source references.
    pub refs: Vec<String>,
}

/// Result of the memory agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryResult {
    /// Operation performed: `suggest`, `store`, or `recall`.
    pub operation: String,
    /// Suggestions (suggest operation).
    #[serde(default)]
    pub suggestions: Vec<MemorySuggestion>,
    /// Stored candidates (store operation).
    #[serde(default)]
    pub to_store: Vec<MemoryStoreItem>,
    /// Recalled records (recall operation).
    #[serde(default)]
    pub records: Vec<MemoryRecord>,
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// A contradiction detected across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// What diverges.
    pub description: String,
    /// At least two contradictory references.
    pub evidence_refs: Vec<EvidenceRef>,
}

/// An actionable recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The recommendation text.
    pub recommendation: String,
    /// Expected impact: `low`, `medium`, or `high`.
    pub impact: String,
    /// Supporting references; at least one.
    pub evidence_refs: Vec<EvidenceRef>,
}

/// Result of the synthesis agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// Unified summary, at most [`MAX_SUMMARY`] characters.
    pub summary: String,
    /// Detected conflicts, each with at least two references.
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    /// Recommended actions; at least one.
    pub actions: Vec<Action>,
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// Forecast direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastDirection {
    /// Momentum is increasing.
    Up,
    /// Momentum is decreasing.
    Down,
    /// No clear movement.
    Flat,
}

/// A driver behind a forecast, with its evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDriver {
    /// What is pushing the trend.
    pub signal: String,
    /// Supporting reference.
    pub evidence_ref: EvidenceRef,
}

/// Bounds of a forecast confidence interval; `lower <= upper`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// A single forecast entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastItem {
    /// Forecasted topic.
    pub topic: String,
    /// Direction of movement.
    pub direction: ForecastDirection,
    /// Confidence interval with ordered bounds.
    pub confidence_interval: ConfidenceInterval,
    /// At least one driver with evidence.
    pub drivers: Vec<ForecastDriver>,
    /// Forecast horizon (e.g. `1w`).
    pub horizon: String,
}

/// Result of the forecast agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Forecast entries; at least one.
    pub forecast: Vec<ForecastItem>,
}

// ---------------------------------------------------------------------------
// Competitors
// ---------------------------------------------------------------------------

/// Competitive stance of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    /// Dominant coverage share.
    Leader,
    /// Rapidly growing coverage.
    FastFollower,
    /// Narrow, specialized coverage.
    Niche,
}

/// A topic overlap entry between competing domains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapEntry {
    /// The shared topic.
    pub topic: String,
    /// Domains covering it.
    pub domains: Vec<String>,
}

/// Competitive positioning of a single domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Positioning {
    /// The domain.
    pub domain: String,
    /// Its stance.
    pub stance: Stance,
    /// Free-form notes.
    pub notes: String,
}

/// Sentiment movement for a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentDelta {
    /// The domain.
    pub domain: String,
    /// Sentiment change in `[-1.0, 1.0]`.
    pub delta: f64,
}

/// Result of the competitor agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorsResult {
    /// Topic overlap entries.
    #[serde(default)]
    pub overlap: Vec<OverlapEntry>,
    /// Positioning entries.
    pub positioning: Vec<Positioning>,
    /// Optional sentiment deltas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_delta: Option<Vec<SentimentDelta>>,
    /// Most-covered domains; non-empty whenever positioning is present.
    pub top_domains: Vec<String>,
}
