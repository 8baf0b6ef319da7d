//! Mutable tree form of a COA plan, used for simplification.
//!
//! Simplification collapses any node whose multiple children lead into
//! structurally identical subtrees: if every observed value of an
//! investigation prescribes the same continuation, the investigation buys
//! nothing and is dropped. Node ids are renumbered densely after every
//! collapse so repeated passes see a canonical tree.

use super::{CoaPlan, CoaStep};
use std::collections::BTreeMap;

pub(crate) type NodeId = usize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoaTree {
    labels: BTreeMap<NodeId, String>,
    children: BTreeMap<NodeId, Vec<NodeId>>,
    parents: BTreeMap<NodeId, NodeId>,
    /// Observed value on the edge into this node, if the parent branched.
    edge_values: BTreeMap<NodeId, Option<usize>>,
    root: Option<NodeId>,
    next_id: NodeId,
}

/// Label-and-shape fingerprint used to compare subtrees.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Shape {
    label: String,
    children: Vec<Shape>,
}

impl CoaTree {
    pub fn from_plan(plan: &CoaPlan) -> Self {
        let mut tree = Self::default();
        tree.add_linear(plan, None, None);
        tree
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn add_linear(&mut self, plan: &[CoaStep], parent: Option<NodeId>, edge: Option<usize>) {
        let mut parent = parent;
        let mut edge = edge;
        for step in plan {
            match step {
                CoaStep::Action(label) => {
                    let id = self.new_node(label.clone(), parent, edge);
                    parent = Some(id);
                    edge = None;
                }
                CoaStep::Branch(table) => {
                    for (value, subplan) in table {
                        if subplan.is_empty() {
                            continue;
                        }
                        self.add_linear(subplan, parent, Some(*value));
                    }
                }
            }
        }
    }

    fn new_node(&mut self, label: String, parent: Option<NodeId>, edge: Option<usize>) -> NodeId {
        self.next_id += 1;
        let id = self.next_id;
        self.labels.insert(id, label);
        self.children.entry(id).or_default();
        match parent {
            Some(parent) => {
                self.children.entry(parent).or_default().push(id);
                self.parents.insert(id, parent);
                self.edge_values.insert(id, edge);
            }
            None => {
                self.root = Some(id);
                self.edge_values.insert(id, None);
            }
        }
        id
    }

    fn shape(&self, id: NodeId) -> Shape {
        Shape {
            label: self.labels[&id].clone(),
            children: self.children[&id].iter().map(|c| self.shape(*c)).collect(),
        }
    }

    /// First node (breadth-first) whose branches all lead into identical
    /// subtrees.
    fn find_collapsible(&self) -> Option<NodeId> {
        let root = self.root?;
        let mut queue = vec![root];
        let mut at = 0;
        while at < queue.len() {
            let id = queue[at];
            at += 1;
            let kids = &self.children[&id];
            if kids.len() > 1 {
                let first = self.shape(kids[0]);
                if kids[1..].iter().all(|k| self.shape(*k) == first) {
                    return Some(id);
                }
            }
            queue.extend(kids.iter().copied());
        }
        None
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for child in &self.children[&id] {
            self.collect_subtree(*child, out);
        }
    }

    /// Splice the first child's subtree into the target's place and drop
    /// the target together with the remaining duplicate subtrees.
    fn collapse(&mut self, target: NodeId) {
        let kids = self.children[&target].clone();
        let representative = kids[0];
        let mut doomed = Vec::new();
        for duplicate in &kids[1..] {
            self.collect_subtree(*duplicate, &mut doomed);
        }
        doomed.push(target);

        let parent = self.parents.get(&target).copied();
        let incoming = self.edge_values.get(&target).copied().flatten();
        match parent {
            Some(parent) => {
                if let Some(slot) = self
                    .children
                    .get_mut(&parent)
                    .and_then(|c| c.iter_mut().find(|c| **c == target))
                {
                    *slot = representative;
                }
                self.parents.insert(representative, parent);
                self.edge_values.insert(representative, incoming);
            }
            None => {
                self.root = Some(representative);
                self.parents.remove(&representative);
                self.edge_values.insert(representative, None);
            }
        }

        for id in doomed {
            self.labels.remove(&id);
            self.children.remove(&id);
            self.parents.remove(&id);
            self.edge_values.remove(&id);
        }
    }

    /// Relabel ids densely as 1..=len in ascending order of the old ids.
    fn renumber(&mut self) {
        let old: Vec<NodeId> = self.labels.keys().copied().collect();
        if old.iter().enumerate().all(|(i, id)| *id == i + 1) {
            self.next_id = old.len();
            return;
        }
        let map: BTreeMap<NodeId, NodeId> =
            old.iter().enumerate().map(|(i, id)| (*id, i + 1)).collect();
        self.labels = self
            .labels
            .iter()
            .map(|(id, label)| (map[id], label.clone()))
            .collect();
        self.children = self
            .children
            .iter()
            .map(|(id, kids)| (map[id], kids.iter().map(|k| map[k]).collect()))
            .collect();
        self.parents = self
            .parents
            .iter()
            .map(|(id, parent)| (map[id], map[parent]))
            .collect();
        self.edge_values = self
            .edge_values
            .iter()
            .map(|(id, edge)| (map[id], *edge))
            .collect();
        self.root = self.root.map(|r| map[&r]);
        self.next_id = old.len();
    }

    /// Collapse until no node has uniformly identical branch subtrees.
    pub fn simplify(mut self) -> Self {
        while let Some(target) = self.find_collapsible() {
            self.collapse(target);
            self.renumber();
        }
        self
    }

    pub fn to_plan(&self) -> CoaPlan {
        match self.root {
            Some(root) => self.plan_from(root),
            None => Vec::new(),
        }
    }

    fn plan_from(&self, id: NodeId) -> CoaPlan {
        let mut plan = vec![CoaStep::Action(self.labels[&id].clone())];
        let kids = &self.children[&id];
        if kids.is_empty() {
            return plan;
        }
        if kids.iter().any(|k| self.edge_values[k].is_some()) {
            let mut table = BTreeMap::new();
            for kid in kids {
                if let Some(value) = self.edge_values[kid] {
                    table.insert(value, self.plan_from(*kid));
                }
            }
            plan.push(CoaStep::Branch(table));
        } else {
            plan.extend(self.plan_from(kids[0]));
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(label: &str) -> CoaStep {
        CoaStep::Action(label.to_string())
    }

    fn branching_plan() -> CoaPlan {
        let mut table = BTreeMap::new();
        table.insert(0, vec![action("do(B=1)")]);
        table.insert(1, vec![action("do(B=0)")]);
        vec![action("inv(A)"), CoaStep::Branch(table)]
    }

    #[test]
    fn test_roundtrip_preserves_structure() {
        let plan = branching_plan();
        let tree = CoaTree::from_plan(&plan);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.to_plan(), plan);
    }

    #[test]
    fn test_distinct_branches_survive_simplification() {
        let plan = branching_plan();
        let simplified = CoaTree::from_plan(&plan).simplify().to_plan();
        assert_eq!(simplified, plan);
    }

    #[test]
    fn test_identical_branches_collapse() {
        let mut table = BTreeMap::new();
        table.insert(0, vec![action("do(B=1)")]);
        table.insert(1, vec![action("do(B=1)")]);
        let plan = vec![action("inv(A)"), CoaStep::Branch(table)];

        let simplified = CoaTree::from_plan(&plan).simplify().to_plan();
        assert_eq!(simplified, vec![action("do(B=1)")]);
    }

    #[test]
    fn test_nested_collapse_cascades() {
        // Both outer branches hold identical inner investigations, and the
        // inner ones are themselves uniform.
        let mut inner = BTreeMap::new();
        inner.insert(0, vec![action("do(C=0)")]);
        inner.insert(1, vec![action("do(C=0)")]);
        let uniform_inner = vec![action("inv(B)"), CoaStep::Branch(inner)];

        let mut outer = BTreeMap::new();
        outer.insert(0, uniform_inner.clone());
        outer.insert(1, uniform_inner);
        let plan = vec![action("inv(A)"), CoaStep::Branch(outer)];

        let simplified = CoaTree::from_plan(&plan).simplify().to_plan();
        assert_eq!(simplified, vec![action("do(C=0)")]);
    }

    #[test]
    fn test_simplify_is_idempotent() {
        let mut table = BTreeMap::new();
        table.insert(0, vec![action("do(B=1)"), action("do_none(C)")]);
        table.insert(1, vec![action("do(B=1)"), action("do_none(C)")]);
        let plan = vec![action("inv(A)"), CoaStep::Branch(table)];

        let once = CoaTree::from_plan(&plan).simplify().to_plan();
        let twice = CoaTree::from_plan(&once).simplify().to_plan();
        assert_eq!(once, twice);
        assert_eq!(once, vec![action("do(B=1)"), action("do_none(C)")]);
    }

    #[test]
    fn test_empty_plan() {
        let tree = CoaTree::from_plan(&Vec::new());
        assert!(tree.is_empty());
        assert!(tree.simplify().to_plan().is_empty());
    }
}
