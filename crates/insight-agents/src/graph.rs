//! Knowledge-graph construction and traversal.
//!
//! Builds a labelled multigraph over topic, article and entity nodes with
//! `relates_to` edges weighted from document scores, then extracts a BFS
//! subgraph around the highest-degree nodes and searches paths between them.

use crate::entities::extract_entities;
use insight_core::{trim_chars, Document, GraphEdge, GraphNode, GraphPath, GraphResult, Lang, Subgraph};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::info;

/// Limits applied to graph construction and traversal.
#[derive(Debug, Clone, Copy)]
pub struct GraphLimits {
    /// Maximum traversal depth from the start nodes.
    pub hop_limit: u32,
    /// Node cap for construction and the extracted subgraph.
    pub max_nodes: usize,
    /// Edge cap for construction and the extracted subgraph.
    pub max_edges: usize,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            hop_limit: 3,
            max_nodes: 200,
            max_edges: 600,
        }
    }
}

/// The full constructed graph, before subgraph extraction.
#[derive(Debug, Clone, Default)]
pub struct NewsGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    adjacency: HashMap<String, Vec<usize>>,
}

impl NewsGraph {
    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn add_node(&mut self, node: GraphNode) {
        if !self.adjacency.contains_key(&node.id) {
            self.adjacency.insert(node.id.clone(), Vec::new());
            self.nodes.push(node);
        }
    }

    fn add_edge(&mut self, source: &str, target: &str, weight: f64) {
        let index = self.edges.len();
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            edge_type: "relates_to".to_string(),
            weight: weight.clamp(0.0, 1.0),
        });
        if let Some(list) = self.adjacency.get_mut(source) {
            list.push(index);
        }
        if let Some(list) = self.adjacency.get_mut(target) {
            list.push(index);
        }
    }

    fn neighbors(&self, node_id: &str) -> Vec<(&str, f64)> {
        self.adjacency
            .get(node_id)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| {
                        let edge = &self.edges[i];
                        let other = if edge.source == node_id {
                            edge.target.as_str()
                        } else {
                            edge.source.as_str()
                        };
                        (other, edge.weight)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Top-`k` node ids by degree.
    #[must_use]
    pub fn central_nodes(&self, k: usize) -> Vec<String> {
        let mut by_degree: Vec<(&String, usize)> = self
            .adjacency
            .iter()
            .map(|(id, edges)| (id, edges.len()))
            .collect();
        by_degree.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        by_degree.into_iter().take(k).map(|(id, _)| id.clone()).collect()
    }
}

/// The graph agent.
#[derive(Debug, Clone, Default)]
pub struct GraphAgent;

impl GraphAgent {
    /// Create an agent.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the graph from documents around a topic.
    #[must_use]
    pub fn build_graph(&self, query: &str, docs: &[Document], limits: GraphLimits) -> NewsGraph {
        let mut graph = NewsGraph::default();

        let topic_id = format!("topic:{}", query.to_lowercase());
        graph.add_node(GraphNode {
            id: topic_id.clone(),
            node_type: "topic".to_string(),
            label: query.to_string(),
        });

        for (idx, doc) in docs.iter().enumerate() {
            if graph.node_count() >= limits.max_nodes || graph.edge_count() >= limits.max_edges {
                break;
            }

            let article_id = format!(
                "article:{}",
                doc.article_id.clone().unwrap_or_else(|| idx.to_string())
            );
            graph.add_node(GraphNode {
                id: article_id.clone(),
                node_type: "article".to_string(),
                label: doc.title.clone(),
            });
            graph.add_edge(&topic_id, &article_id, doc.score);

            let text = format!("{} {}", doc.title, doc.snippet);
            for entity in extract_entities(&text, 5) {
                if graph.node_count() >= limits.max_nodes || graph.edge_count() >= limits.max_edges {
                    break;
                }
                let entity_id = format!("entity:{}", entity.to_lowercase());
                graph.add_node(GraphNode {
                    id: entity_id.clone(),
                    node_type: "entity".to_string(),
                    label: entity,
                });
                graph.add_edge(&article_id, &entity_id, doc.score);
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph built"
        );
        graph
    }

    /// Breadth-first subgraph from `start` up to the limits.
    #[must_use]
    pub fn traverse_bfs(&self, graph: &NewsGraph, start: &[String], limits: GraphLimits) -> Subgraph {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();

        for node_id in start {
            if graph.adjacency.contains_key(node_id) && visited.insert(node_id.clone()) {
                queue.push_back((node_id.clone(), 0));
            }
        }

        while let Some((node_id, depth)) = queue.pop_front() {
            if depth >= limits.hop_limit || visited.len() >= limits.max_nodes {
                continue;
            }
            for (neighbor, _) in graph.neighbors(&node_id) {
                if visited.len() >= limits.max_nodes {
                    break;
                }
                if visited.insert(neighbor.to_string()) {
                    queue.push_back((neighbor.to_string(), depth + 1));
                }
            }
        }

        let nodes: Vec<GraphNode> = graph
            .nodes
            .iter()
            .filter(|node| visited.contains(&node.id))
            .cloned()
            .collect();
        let edges: Vec<GraphEdge> = graph
            .edges
            .iter()
            .filter(|edge| visited.contains(&edge.source) && visited.contains(&edge.target))
            .take(limits.max_edges)
            .cloned()
            .collect();

        Subgraph { nodes, edges }
    }

    /// BFS path search between two nodes, returning up to `max_paths` paths
    /// scored by average edge weight.
    #[must_use]
    pub fn find_paths(
        &self,
        graph: &NewsGraph,
        start: &str,
        end: &str,
        max_hops: u32,
        max_paths: usize,
    ) -> Vec<GraphPath> {
        let mut paths = Vec::new();
        let mut queue: VecDeque<(Vec<String>, Vec<f64>)> = VecDeque::new();
        queue.push_back((vec![start.to_string()], Vec::new()));

        while let Some((path, weights)) = queue.pop_front() {
            if paths.len() >= max_paths {
                break;
            }
            let Some(last) = path.last().cloned() else {
                continue;
            };
            if last == end && path.len() > 1 {
                let score = if weights.is_empty() {
                    0.0
                } else {
                    weights.iter().sum::<f64>() / weights.len() as f64
                };
                paths.push(GraphPath {
                    hops: path.len() - 1,
                    nodes: path,
                    score: (score * 100.0).round() / 100.0,
                });
                continue;
            }
            if path.len() as u32 > max_hops {
                continue;
            }
            for (neighbor, weight) in graph.neighbors(&last) {
                if path.iter().any(|n| n == neighbor) {
                    continue;
                }
                let mut next_path = path.clone();
                next_path.push(neighbor.to_string());
                let mut next_weights = weights.clone();
                next_weights.push(weight);
                queue.push_back((next_path, next_weights));
            }
        }

        paths
    }

    /// Full graph flow: build, extract the subgraph around the central
    /// nodes, search paths, and phrase the answer.
    #[must_use]
    pub fn run(&self, query: &str, docs: &[Document], limits: GraphLimits, lang: Lang) -> GraphResult {
        let graph = self.build_graph(query, docs, limits);
        let central = graph.central_nodes(3);
        let subgraph = self.traverse_bfs(&graph, &central, limits);

        let paths = if central.len() >= 2 {
            self.find_paths(&graph, &central[0], &central[1], limits.hop_limit, 5)
        } else {
            Vec::new()
        };

        let answer = match lang {
            Lang::Ru => format!(
                "Граф из {} узлов и {} связей построен вокруг запроса.",
                subgraph.nodes.len(),
                subgraph.edges.len()
            ),
            Lang::En => format!(
                "Graph of {} nodes and {} edges built around query.",
                subgraph.nodes.len(),
                subgraph.edges.len()
            ),
        };

        GraphResult {
            subgraph,
            paths,
            answer: trim_chars(&answer, 600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("Acme Corp expands", "2025-06-01")
                .with_article_id("d1")
                .with_snippet("expansion continues across europe")
                .with_score(0.9),
            Document::new("Acme Corp hires", "2025-06-02")
                .with_article_id("d2")
                .with_snippet("hiring ramps up quickly")
                .with_score(0.8),
            Document::new("Beta Labs funding", "2025-06-03")
                .with_article_id("d3")
                .with_snippet("a fresh round closes")
                .with_score(0.7),
            Document::new("Beta Labs growth", "2025-06-04")
                .with_article_id("d4")
                .with_snippet("user numbers climb")
                .with_score(0.6),
        ]
    }

    #[test]
    fn test_build_graph_node_types() {
        let agent = GraphAgent::new();
        let graph = agent.build_graph("expansion", &docs(), GraphLimits::default());

        assert!(graph.nodes.iter().any(|n| n.node_type == "topic"));
        assert!(graph.nodes.iter().any(|n| n.node_type == "article"));
        assert!(graph.nodes.iter().any(|n| n.node_type == "entity"));
        assert!(graph.edges.iter().all(|e| e.edge_type == "relates_to"));
        assert!(graph.edges.iter().all(|e| (0.0..=1.0).contains(&e.weight)));
    }

    #[test]
    fn test_shared_entity_connects_articles() {
        let agent = GraphAgent::new();
        let graph = agent.build_graph("expansion", &docs(), GraphLimits::default());
        // "Acme Corp" appears in two articles, so its entity node has degree ≥ 2.
        let acme_edges = graph
            .edges
            .iter()
            .filter(|e| e.target == "entity:acme corp" || e.source == "entity:acme corp")
            .count();
        assert!(acme_edges >= 2);
    }

    #[test]
    fn test_node_cap_respected() {
        let agent = GraphAgent::new();
        let limits = GraphLimits {
            hop_limit: 2,
            max_nodes: 4,
            max_edges: 10,
        };
        let graph = agent.build_graph("expansion", &docs(), limits);
        assert!(graph.node_count() <= 4);
    }

    #[test]
    fn test_central_nodes_by_degree() {
        let agent = GraphAgent::new();
        let graph = agent.build_graph("expansion", &docs(), GraphLimits::default());
        let central = graph.central_nodes(1);
        // The topic node touches every article and has the highest degree.
        assert_eq!(central[0], "topic:expansion");
    }

    #[test]
    fn test_bfs_hop_limit() {
        let agent = GraphAgent::new();
        let graph = agent.build_graph("expansion", &docs(), GraphLimits::default());
        let limits = GraphLimits {
            hop_limit: 1,
            max_nodes: 200,
            max_edges: 600,
        };
        let subgraph = agent.traverse_bfs(&graph, &["topic:expansion".to_string()], limits);
        // One hop from the topic reaches articles but not entities.
        assert!(subgraph.nodes.iter().all(|n| n.node_type != "entity"));
        assert!(subgraph.nodes.iter().any(|n| n.node_type == "article"));
    }

    #[test]
    fn test_find_paths() {
        let agent = GraphAgent::new();
        let graph = agent.build_graph("expansion", &docs(), GraphLimits::default());
        let paths = agent.find_paths(&graph, "article:d1", "article:d2", 3, 5);
        // d1 and d2 connect via the topic node and via the shared entity.
        assert!(!paths.is_empty());
        assert!(paths.iter().all(|p| p.hops == p.nodes.len() - 1));
        assert!(paths.iter().all(|p| p.score >= 0.0 && p.score <= 1.0));
    }

    #[test]
    fn test_run_produces_answer() {
        let agent = GraphAgent::new();
        let result = agent.run("expansion", &docs(), GraphLimits::default(), Lang::En);
        assert!(!result.subgraph.nodes.is_empty());
        assert!(result.answer.contains("nodes"));
    }
}
