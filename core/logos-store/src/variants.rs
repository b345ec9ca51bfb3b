use std::collections::{BTreeSet, HashMap};

use logos_protocol::{EntryId, SenseId, VariantTarget, VariantType};
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Directed;

use crate::data::StoreData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VariantEdge {
    kind: VariantType,
    /// Set when the link points at one sense rather than the whole entry.
    sense: Option<SenseId>,
}

/// Variant-of links between lexical entries.
///
/// Edges run from the variant to the entry it is a variant of; a link to a
/// sense points at the sense's owning entry and remembers the sense.
pub struct VariantGraph {
    graph: Graph<EntryId, VariantEdge, Directed>,
    index_map: HashMap<EntryId, NodeIndex>,
}

impl VariantGraph {
    pub fn build(data: &StoreData) -> Self {
        let mut graph = Self {
            graph: Graph::new(),
            index_map: HashMap::new(),
        };
        for entry in data.entries() {
            graph.node(entry.id);
            for link in &entry.variant_of {
                let (target, sense) = match link.target {
                    VariantTarget::Entry(id) => (Some(id), None),
                    VariantTarget::Sense(id) => (data.sense(id).map(|s| s.owner), Some(id)),
                };
                // Links to deleted objects are dropped.
                if let Some(target) = target.filter(|t| data.entry(*t).is_some()) {
                    let from = graph.node(entry.id);
                    let to = graph.node(target);
                    graph.graph.add_edge(from, to, VariantEdge { kind: link.kind, sense });
                }
            }
        }
        graph
    }

    fn node(&mut self, entry: EntryId) -> NodeIndex {
        let graph = &mut self.graph;
        *self
            .index_map
            .entry(entry)
            .or_insert_with(|| graph.add_node(entry))
    }

    /// The entry plus everything it is (transitively) a variant of.
    pub fn family(&self, entry: EntryId) -> BTreeSet<EntryId> {
        let mut family = BTreeSet::new();
        family.insert(entry);
        let start = match self.index_map.get(&entry) {
            Some(idx) => *idx,
            None => return family,
        };

        let mut stack = vec![start];
        let mut visited = vec![];
        while let Some(current) = stack.pop() {
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            family.insert(self.graph[current]);
            for edge in self.graph.edges(current) {
                stack.push(edge.target());
            }
        }
        family
    }

    pub fn sense_in_family(&self, data: &StoreData, entry: EntryId, sense: SenseId) -> bool {
        data.sense(sense)
            .map_or(false, |s| self.family(entry).contains(&s.owner))
    }

    /// The sense a variant entry stands for: the linked sense, or the first
    /// sense of the linked entry, following further variant links if that
    /// entry has none. With `kind`, only links of that type are followed
    /// from `entry`. `None` when `entry` is not a variant.
    pub fn target_sense(
        &self,
        data: &StoreData,
        entry: EntryId,
        kind: Option<VariantType>,
    ) -> Option<SenseId> {
        let start = *self.index_map.get(&entry)?;
        let mut frontier: Vec<_> = self
            .graph
            .edges(start)
            .filter(|e| kind.map_or(true, |k| e.weight().kind == k))
            .map(|e| (e.target(), e.weight().sense))
            .collect();
        // petgraph yields edges newest-first; links are declared oldest-first.
        frontier.reverse();

        let mut visited = vec![start];
        let mut queue = std::collections::VecDeque::from(frontier);
        while let Some((node, sense)) = queue.pop_front() {
            if let Some(sense) = sense.filter(|s| data.sense(*s).is_some()) {
                return Some(sense);
            }
            if visited.contains(&node) {
                continue;
            }
            visited.push(node);
            let target = self.graph[node];
            if let Some(first) = data.entry(target).and_then(|e| e.senses.first()) {
                return Some(*first);
            }
            let mut next: Vec<_> = self
                .graph
                .edges(node)
                .map(|e| (e.target(), e.weight().sense))
                .collect();
            next.reverse();
            queue.extend(next);
        }
        None
    }
}
