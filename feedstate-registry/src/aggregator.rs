//! Per-interest subscription aggregation.
//!
//! Every agent contributes a category set to each interest it follows. The
//! upstream subscription for an interest is the union of those contributions,
//! and only changes to that union are emitted as commands.

use crate::agent::AgentId;
use crate::subscription::{CategorySet, Interest, SubCommand};
use std::collections::BTreeMap;

/// Tracks agent contributions per interest and emits minimal deltas.
#[derive(Debug, Default)]
pub struct SubscriptionAggregator {
    subs: BTreeMap<Interest, BTreeMap<AgentId, CategorySet>>,
}

impl SubscriptionAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `agent` needs `required` for `interest`.
    ///
    /// Returns a subscribe command for the categories the aggregate gained.
    pub fn subscribe(
        &mut self,
        agent: AgentId,
        required: CategorySet,
        interest: &Interest,
    ) -> Option<SubCommand> {
        if required.is_empty() {
            return None;
        }
        let agents = self.subs.entry(interest.clone()).or_default();
        let before = union(agents);
        agents.insert(agent, required);
        let added = union(agents).difference(before);

        (!added.is_empty()).then(|| SubCommand::subscribe(interest.clone(), added))
    }

    /// Drops the contribution of `agent` to `interest`.
    ///
    /// Returns an unsubscribe command for the categories no remaining agent
    /// needs.
    pub fn unsubscribe(&mut self, agent: AgentId, interest: &Interest) -> Option<SubCommand> {
        let agents = self.subs.get_mut(interest)?;
        let former = agents.remove(&agent)?;
        let remaining = union(agents);
        if agents.is_empty() {
            self.subs.remove(interest);
        }
        let removed = former.difference(remaining);

        (!removed.is_empty()).then(|| SubCommand::unsubscribe(interest.clone(), removed))
    }

    /// Drops every contribution of `agent`.
    pub fn unsubscribe_all(&mut self, agent: AgentId) -> Vec<SubCommand> {
        self.interests_of(agent)
            .iter()
            .filter_map(|interest| self.unsubscribe(agent, interest))
            .collect()
    }

    /// Union of all contributions to `interest`.
    #[must_use]
    pub fn aggregate(&self, interest: &Interest) -> CategorySet {
        self.subs.get(interest).map_or(CategorySet::EMPTY, union)
    }

    /// Interests with at least one contribution.
    pub fn interests(&self) -> impl Iterator<Item = &Interest> {
        self.subs.keys()
    }

    /// Interests `agent` contributes to.
    #[must_use]
    pub fn interests_of(&self, agent: AgentId) -> Vec<Interest> {
        self.subs
            .iter()
            .filter(|(_, agents)| agents.contains_key(&agent))
            .map(|(interest, _)| interest.clone())
            .collect()
    }

    /// Number of interests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// Returns true if nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

fn union(agents: &BTreeMap<AgentId, CategorySet>) -> CategorySet {
    agents
        .values()
        .fold(CategorySet::EMPTY, |acc, set| acc.union(*set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{SubAction, SubscriptionType};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn set(kinds: &[SubscriptionType]) -> CategorySet {
        kinds.iter().copied().collect()
    }

    #[test]
    fn test_two_agents_share_an_interest() {
        let mut agg = SubscriptionAggregator::new();
        let esz3 = Interest::instrument("ESZ3");
        let a = AgentId(1);
        let b = AgentId(2);

        let cmd = agg.subscribe(a, set(&[SubscriptionType::Trade]), &esz3);
        assert_eq!(
            cmd,
            Some(SubCommand::subscribe(esz3.clone(), set(&[SubscriptionType::Trade])))
        );

        let cmd = agg.subscribe(
            b,
            set(&[SubscriptionType::Trade, SubscriptionType::Book]),
            &esz3,
        );
        assert_eq!(
            cmd,
            Some(SubCommand::subscribe(esz3.clone(), set(&[SubscriptionType::Book])))
        );

        assert_eq!(agg.unsubscribe(a, &esz3), None);
        assert_eq!(
            agg.aggregate(&esz3),
            set(&[SubscriptionType::Trade, SubscriptionType::Book])
        );

        let cmd = agg.unsubscribe(b, &esz3).unwrap();
        assert_eq!(cmd.action, SubAction::Unsubscribe);
        assert_eq!(
            cmd.categories,
            set(&[SubscriptionType::Trade, SubscriptionType::Book])
        );
        assert!(agg.is_empty());
    }

    #[test]
    fn test_resubscribe_is_idempotent() {
        let mut agg = SubscriptionAggregator::new();
        let esz3 = Interest::instrument("ESZ3");
        assert!(agg.subscribe(AgentId(1), CategorySet::ALL, &esz3).is_some());
        assert!(agg.subscribe(AgentId(1), CategorySet::ALL, &esz3).is_none());
        assert!(agg.subscribe(AgentId(1), CategorySet::EMPTY, &esz3).is_none());
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_unsubscribe_unknown() {
        let mut agg = SubscriptionAggregator::new();
        let esz3 = Interest::instrument("ESZ3");
        assert!(agg.unsubscribe(AgentId(1), &esz3).is_none());
        agg.subscribe(AgentId(1), CategorySet::ALL, &esz3);
        assert!(agg.unsubscribe(AgentId(2), &esz3).is_none());
        assert_eq!(agg.aggregate(&esz3), CategorySet::ALL);
    }

    #[test]
    fn test_unsubscribe_all() {
        let mut agg = SubscriptionAggregator::new();
        let esz3 = Interest::instrument("ESZ3");
        let cme = Interest::exchange("CME");
        agg.subscribe(AgentId(1), CategorySet::ALL, &esz3);
        agg.subscribe(AgentId(1), CategorySet::ALL, &cme);
        agg.subscribe(AgentId(2), CategorySet::ALL, &cme);

        assert_eq!(agg.interests_of(AgentId(1)).len(), 2);
        let commands = agg.unsubscribe_all(AgentId(1));
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].interest, esz3);
        assert_eq!(agg.interests().collect::<Vec<_>>(), vec![&cme]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Subscribe(u64, u8, usize),
        Unsubscribe(u64, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..4, 0u8..16, 0usize..3).prop_map(|(a, s, i)| Op::Subscribe(a, s, i)),
            (0u64..4, 0usize..3).prop_map(|(a, i)| Op::Unsubscribe(a, i)),
        ]
    }

    proptest! {
        #[test]
        fn test_replayed_deltas_match_aggregate(ops in prop::collection::vec(op(), 1..100)) {
            let interests = [
                Interest::instrument("ESZ3"),
                Interest::instrument("NQZ3"),
                Interest::exchange("CME"),
            ];
            let mut agg = SubscriptionAggregator::new();
            let mut model: HashMap<(u64, usize), CategorySet> = HashMap::new();
            let mut upstream: HashMap<Interest, CategorySet> = HashMap::new();

            for op in ops {
                let (command, index) = match op {
                    Op::Subscribe(agent, bits, index) => {
                        let required: CategorySet = SubscriptionType::ALL
                            .into_iter()
                            .filter(|kind| bits & (1 << *kind as u8) != 0)
                            .collect();
                        if !required.is_empty() {
                            model.insert((agent, index), required);
                        }
                        (agg.subscribe(AgentId(agent), required, &interests[index]), index)
                    }
                    Op::Unsubscribe(agent, index) => {
                        model.remove(&(agent, index));
                        (agg.unsubscribe(AgentId(agent), &interests[index]), index)
                    }
                };

                let before = upstream.get(&interests[index]).copied().unwrap_or_default();
                if let Some(command) = command {
                    prop_assert!(!command.categories.is_empty());
                    let entry = upstream.entry(command.interest.clone()).or_default();
                    match command.action {
                        SubAction::Subscribe => {
                            prop_assert!(command.categories.difference(before) == command.categories);
                            *entry = entry.union(command.categories);
                        }
                        SubAction::Unsubscribe => {
                            prop_assert!(command.categories.is_subset(before));
                            *entry = entry.difference(command.categories);
                        }
                    }
                }

                for (i, interest) in interests.iter().enumerate() {
                    let expected = model
                        .iter()
                        .filter(|((_, idx), _)| *idx == i)
                        .fold(CategorySet::EMPTY, |acc, (_, set)| acc.union(*set));
                    prop_assert_eq!(agg.aggregate(interest), expected);
                    prop_assert_eq!(upstream.get(interest).copied().unwrap_or_default(), expected);
                }
            }
        }
    }
}
