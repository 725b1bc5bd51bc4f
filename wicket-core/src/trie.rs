//! Route matching trie.
//!
//! The trie is keyed by path segment and built once from the route
//! cache; request handling only reads it, so it is shared freely across
//! request threads. Each node holds one compiled [`Segment`], literal
//! children keyed by exact text, non-literal children in specificity
//! order, and the method-qualified leaves of routes terminating at that
//! node.
//!
//! Matching is a backtracking descent trying children most-specific
//! first: exact literal, constrained capture, pattern, plain capture,
//! greedy capture (shortest take first, then longer), optional capture
//! (supplied value, then default). Every terminal reached contributes a
//! candidate; candidates carry an accumulated specificity score so the
//! resolver can order them deterministically, which is what makes
//! `{value:int}` win over `{value}` for `/123`.

use crate::logging::{debug, trace};
use crate::segment::Segment;
use crate::{ConditionFn, Error, HttpMethod, RouteCache, RouteParams};
use std::collections::HashMap;

/// Specificity rank of a segment kind, also the per-segment score
/// contribution. Higher is more specific.
fn rank(segment: &Segment) -> u8 {
    match segment {
        Segment::Literal(_) => 5,
        Segment::Constrained { .. } => 4,
        Segment::Pattern { .. } => 3,
        Segment::Capture { .. } => 2,
        Segment::Greedy { .. } => 1,
        Segment::Optional { .. } => 0,
    }
}

/// A method-qualified route terminating at a trie node.
#[derive(Clone)]
struct RouteLeaf {
    module_key: String,
    route_index: usize,
    method: HttpMethod,
    condition: Option<ConditionFn>,
}

/// One candidate produced by a trie query, regardless of method. The
/// resolver filters by method and uses the off-method candidates for
/// method-not-allowed detection.
#[derive(Clone)]
pub struct MatchCandidate {
    pub module_key: String,
    pub route_index: usize,
    pub method: HttpMethod,
    pub condition: Option<ConditionFn>,
    pub parameters: RouteParams,
    pub score: u128,
}

impl std::fmt::Debug for MatchCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchCandidate")
            .field("module_key", &self.module_key)
            .field("route_index", &self.route_index)
            .field("method", &self.method)
            .field("score", &self.score)
            .finish()
    }
}

struct TrieNode {
    segment: Segment,
    /// Literal children keyed by text (lowercased when matching is
    /// case-insensitive).
    literal_children: HashMap<String, TrieNode>,
    /// Non-literal children with their raw segment text (for dedupe),
    /// sorted by descending specificity after the build.
    pattern_children: Vec<(String, TrieNode)>,
    leaves: Vec<RouteLeaf>,
}

impl TrieNode {
    fn new(segment: Segment) -> Self {
        Self {
            segment,
            literal_children: HashMap::new(),
            pattern_children: Vec::new(),
            leaves: Vec::new(),
        }
    }

    fn sort_children(&mut self) {
        self.pattern_children
            .sort_by(|(_, a), (_, b)| rank(&b.segment).cmp(&rank(&a.segment)));
        for child in self.literal_children.values_mut() {
            child.sort_children();
        }
        for (_, child) in &mut self.pattern_children {
            child.sort_children();
        }
    }
}

/// The compiled route trie.
pub struct RouteTrie {
    root: TrieNode,
    case_sensitive: bool,
}

impl RouteTrie {
    /// Build the trie from a route cache. A pure function of the cache
    /// and the case-sensitivity setting; building twice yields a trie
    /// producing identical matches. Malformed segments fail here, before
    /// any request is served.
    pub fn build(cache: &RouteCache, case_sensitive: bool) -> Result<Self, Error> {
        let mut root = TrieNode::new(Segment::Literal(String::new()));
        let mut route_count = 0usize;

        for (module_key, routes) in cache.iter() {
            for cached in routes {
                let description = &cached.description;
                insert_route(
                    &mut root,
                    module_key,
                    cached.index,
                    description.method,
                    description.condition.clone(),
                    &description.segments,
                    &description.path,
                    case_sensitive,
                )?;
                route_count += 1;
            }
        }

        root.sort_children();
        debug!(routes = route_count, case_sensitive, "route trie built");
        Ok(Self {
            root,
            case_sensitive,
        })
    }

    /// Collect every candidate route matching the given path, for all
    /// methods. Candidates are returned unsorted; callers order by
    /// score.
    pub fn matches(&self, path: &str) -> Vec<MatchCandidate> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut results = Vec::new();
        let mut params: Vec<(String, String)> = Vec::new();

        descend(
            &self.root,
            &segments,
            self.case_sensitive,
            &mut params,
            0,
            &mut results,
        );

        trace!(path, candidates = results.len(), "trie query");
        results
    }
}

#[allow(clippy::too_many_arguments)]
fn insert_route(
    root: &mut TrieNode,
    module_key: &str,
    route_index: usize,
    method: HttpMethod,
    condition: Option<ConditionFn>,
    segments: &[String],
    path: &str,
    case_sensitive: bool,
) -> Result<(), Error> {
    let mut node = root;

    for raw in segments {
        let segment = Segment::parse(raw, case_sensitive).map_err(|reason| {
            Error::RouteSyntax {
                path: path.to_string(),
                reason,
            }
        })?;

        node = match segment {
            Segment::Literal(text) => {
                let key = if case_sensitive {
                    text.clone()
                } else {
                    text.to_lowercase()
                };
                node.literal_children
                    .entry(key)
                    .or_insert_with(|| TrieNode::new(Segment::Literal(text)))
            }
            other => {
                let position = node
                    .pattern_children
                    .iter()
                    .position(|(existing, _)| existing == raw);
                let index = match position {
                    Some(index) => index,
                    None => {
                        node.pattern_children
                            .push((raw.clone(), TrieNode::new(other)));
                        node.pattern_children.len() - 1
                    }
                };
                &mut node.pattern_children[index].1
            }
        };
    }

    node.leaves.push(RouteLeaf {
        module_key: module_key.to_string(),
        route_index,
        method,
        condition,
    });
    Ok(())
}

/// Shift the score one segment deeper and add a segment rank. Every
/// consumed request segment shifts exactly once, so scores of competing
/// candidates for the same request are directly comparable.
fn bump(score: u128, segment_rank: u8) -> u128 {
    (score << 3) | segment_rank as u128
}

fn collect_leaves(
    node: &TrieNode,
    params: &[(String, String)],
    score: u128,
    results: &mut Vec<MatchCandidate>,
) {
    for leaf in &node.leaves {
        results.push(MatchCandidate {
            module_key: leaf.module_key.clone(),
            route_index: leaf.route_index,
            method: leaf.method,
            condition: leaf.condition.clone(),
            parameters: params.iter().cloned().collect(),
            score,
        });
    }
}

fn descend(
    node: &TrieNode,
    segments: &[&str],
    case_sensitive: bool,
    params: &mut Vec<(String, String)>,
    score: u128,
    results: &mut Vec<MatchCandidate>,
) {
    if segments.is_empty() {
        collect_leaves(node, params, score, results);

        // Optional captures may be omitted entirely from the request;
        // walk them without consuming, capturing declared defaults.
        for (_, child) in &node.pattern_children {
            if let Segment::Optional { name, default } = &child.segment {
                let saved = params.len();
                if let Some(default) = default {
                    params.push((name.clone(), default.clone()));
                }
                descend(child, segments, case_sensitive, params, score, results);
                params.truncate(saved);
            }
        }
        return;
    }

    let head = segments[0];

    // Exact literal first
    let key = if case_sensitive {
        head.to_string()
    } else {
        head.to_lowercase()
    };
    if let Some(child) = node.literal_children.get(&key) {
        descend(
            child,
            &segments[1..],
            case_sensitive,
            params,
            bump(score, 5),
            results,
        );
    }

    // Then non-literal children, most specific first
    for (_, child) in &node.pattern_children {
        let saved = params.len();
        match &child.segment {
            Segment::Literal(_) => {}
            Segment::Constrained { name, constraint } => {
                if constraint.is_satisfied(head) {
                    params.push((name.clone(), head.to_string()));
                    descend(
                        child,
                        &segments[1..],
                        case_sensitive,
                        params,
                        bump(score, 4),
                        results,
                    );
                }
            }
            Segment::Pattern { regex, names } => {
                if let Some(caps) = regex.captures(head) {
                    for name in names {
                        if let Some(value) = caps.name(name) {
                            params.push((name.clone(), value.as_str().to_string()));
                        }
                    }
                    descend(
                        child,
                        &segments[1..],
                        case_sensitive,
                        params,
                        bump(score, 3),
                        results,
                    );
                }
            }
            Segment::Capture { name } => {
                params.push((name.clone(), head.to_string()));
                descend(
                    child,
                    &segments[1..],
                    case_sensitive,
                    params,
                    bump(score, 2),
                    results,
                );
            }
            Segment::Greedy { name } => {
                // Shortest capture first, backtracking to longer takes
                for take in 1..=segments.len() {
                    let captured = segments[..take].join("/");
                    params.push((name.clone(), captured));
                    let mut taken_score = score;
                    for _ in 0..take {
                        taken_score = bump(taken_score, 1);
                    }
                    descend(
                        child,
                        &segments[take..],
                        case_sensitive,
                        params,
                        taken_score,
                        results,
                    );
                    params.truncate(saved);
                }
            }
            Segment::Optional { name, default } => {
                // Supplied value first
                params.push((name.clone(), head.to_string()));
                descend(
                    child,
                    &segments[1..],
                    case_sensitive,
                    params,
                    bump(score, 0),
                    results,
                );
                params.truncate(saved);

                // Then the omitted slot, using the default if declared
                if let Some(default) = default {
                    params.push((name.clone(), default.clone()));
                }
                descend(child, segments, case_sensitive, params, score, results);
            }
        }
        params.truncate(saved);
    }
}
