//! Actions and the legality rules over evidence tiers.

use crate::evidence::EvidenceTiers;
use serde::Serialize;
use std::fmt;

/// What an action does to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Force the node to the given value.
    Do(usize),
    /// Observe the node's value.
    Inv,
    /// Permanently decline to intervene on the node.
    DoNone,
    /// Permanently decline to investigate the node.
    InvNone,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Action {
    pub node: String,
    pub kind: ActionKind,
    pub time_cost: u32,
}

impl Action {
    pub fn intervene(node: impl Into<String>, value: usize, time_cost: u32) -> Self {
        Self {
            node: node.into(),
            kind: ActionKind::Do(value),
            time_cost,
        }
    }

    pub fn investigate(node: impl Into<String>, time_cost: u32) -> Self {
        Self {
            node: node.into(),
            kind: ActionKind::Inv,
            time_cost,
        }
    }

    pub fn decline_intervention(node: impl Into<String>, time_cost: u32) -> Self {
        Self {
            node: node.into(),
            kind: ActionKind::DoNone,
            time_cost,
        }
    }

    pub fn decline_investigation(node: impl Into<String>, time_cost: u32) -> Self {
        Self {
            node: node.into(),
            kind: ActionKind::InvNone,
            time_cost,
        }
    }

    pub fn label(&self) -> String {
        match self.kind {
            ActionKind::Do(value) => format!("do({}={})", self.node, value),
            ActionKind::Inv => format!("inv({})", self.node),
            ActionKind::DoNone => format!("do_none({})", self.node),
            ActionKind::InvNone => format!("inv_none({})", self.node),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// The fixed set of actions available to an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionCatalog {
    actions: Vec<Action>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

/// Actions that may be taken under the given evidence with the given time
/// left. Time cost must fit the budget, and each kind respects the tiers:
/// an intervened node cannot be investigated or re-intervened, a forfeited
/// node stays forfeited.
pub fn legal_actions<'a>(
    catalog: &'a ActionCatalog,
    tiers: &EvidenceTiers,
    time_remaining: u32,
) -> Vec<&'a Action> {
    if time_remaining == 0 {
        return Vec::new();
    }
    catalog
        .actions()
        .iter()
        .filter(|action| {
            if action.time_cost > time_remaining {
                return false;
            }
            let node = &action.node;
            match action.kind {
                ActionKind::Inv => {
                    !tiers.inv_evidence.contains_key(node) && !tiers.do_evidence.contains_key(node)
                }
                ActionKind::Do(_) => {
                    !tiers.do_evidence.contains_key(node) && !tiers.do_none.contains(node)
                }
                ActionKind::DoNone => {
                    !tiers.do_none.contains(node) && !tiers.do_evidence.contains_key(node)
                }
                ActionKind::InvNone => {
                    !tiers.inv_none.contains(node) && !tiers.inv_evidence.contains_key(node)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ActionCatalog {
        ActionCatalog::new(vec![
            Action::investigate("A", 1),
            Action::intervene("A", 1, 2),
            Action::decline_intervention("A", 0),
            Action::decline_investigation("A", 0),
        ])
    }

    #[test]
    fn test_no_time_no_actions() {
        let catalog = catalog();
        let legal = legal_actions(&catalog, &EvidenceTiers::new(), 0);
        assert!(legal.is_empty());
    }

    #[test]
    fn test_cost_respects_budget() {
        let catalog = catalog();
        let legal = legal_actions(&catalog, &EvidenceTiers::new(), 1);
        assert!(!legal.iter().any(|a| matches!(a.kind, ActionKind::Do(_))));
        assert!(legal.iter().any(|a| a.kind == ActionKind::Inv));
    }

    #[test]
    fn test_intervened_node_blocks_investigation() {
        let mut tiers = EvidenceTiers::new();
        tiers.do_evidence.insert("A".into(), 1);
        let catalog = catalog();
        let legal = legal_actions(&catalog, &tiers, 5);
        assert!(!legal.iter().any(|a| a.kind == ActionKind::Inv));
        assert!(!legal.iter().any(|a| matches!(a.kind, ActionKind::Do(_))));
        assert!(!legal.iter().any(|a| a.kind == ActionKind::DoNone));
        // Observation is still forfeitable.
        assert!(legal.iter().any(|a| a.kind == ActionKind::InvNone));
    }

    #[test]
    fn test_forfeiture_is_permanent() {
        let mut tiers = EvidenceTiers::new();
        tiers.do_none.insert("A".into());
        tiers.inv_none.insert("A".into());
        let catalog = catalog();
        let legal = legal_actions(&catalog, &tiers, 5);
        assert!(legal.iter().any(|a| a.kind == ActionKind::Inv));
        assert_eq!(legal.len(), 1);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Action::intervene("B", 1, 1).label(), "do(B=1)");
        assert_eq!(Action::investigate("B", 1).label(), "inv(B)");
        assert_eq!(Action::decline_intervention("B", 0).label(), "do_none(B)");
        assert_eq!(Action::decline_investigation("B", 0).label(), "inv_none(B)");
    }
}
