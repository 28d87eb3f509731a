//! Per-fighter bonus pools.
//!
//! Four kinds of bonus feed every roll of a category:
//!
//! - **permanent**: always applied, never consumed.
//! - **one-shot**: applied to the next roll, then reset to zero.
//! - **discretionary**: individual values the fighter chooses to spend.
//! - **shared**: discretionary values visible under several categories at
//!   once. They live in an arena of groups; each category links to the
//!   groups it can draw from, so spending under one category depletes the
//!   value for all of them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::roll_type::{BonusKey, RollType};

/// Handle to a shared discretionary group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedGroupId(usize);

/// The bonus pools owned by one fighter.
#[derive(Debug, Clone, Default)]
pub struct BonusPools {
    permanent: HashMap<RollType, i32>,
    one_shot: HashMap<BonusKey, i32>,
    discretionary: HashMap<RollType, Vec<i32>>,
    groups: Vec<Vec<i32>>,
    links: HashMap<RollType, Vec<SharedGroupId>>,
}

impl BonusPools {
    /// Create empty pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Permanent bonus for a category.
    pub fn permanent(&self, category: RollType) -> i32 {
        self.permanent.get(&category).copied().unwrap_or(0)
    }

    /// Add (or with a negative value, remove) a permanent bonus.
    pub fn add_permanent(&mut self, category: RollType, value: i32) {
        *self.permanent.entry(category).or_insert(0) += value;
    }

    /// Pending one-shot bonus for a key.
    pub fn one_shot(&self, key: impl Into<BonusKey>) -> i32 {
        self.one_shot.get(&key.into()).copied().unwrap_or(0)
    }

    /// Add to a one-shot bonus.
    pub fn add_one_shot(&mut self, key: impl Into<BonusKey>, value: i32) {
        *self.one_shot.entry(key.into()).or_insert(0) += value;
    }

    /// Return the one-shot bonus for a key and reset it to zero.
    pub fn consume_one_shot(&mut self, key: impl Into<BonusKey>) -> i32 {
        self.one_shot.remove(&key.into()).unwrap_or(0)
    }

    /// Discard a one-shot bonus without using it.
    pub fn clear_one_shot(&mut self, key: impl Into<BonusKey>) {
        self.one_shot.remove(&key.into());
    }

    /// Add one discretionary value to a category's own pool.
    pub fn add_discretionary(&mut self, category: RollType, value: i32) {
        self.discretionary.entry(category).or_default().push(value);
    }

    /// Create a shared group of values usable under every listed category.
    pub fn add_shared(
        &mut self,
        categories: impl IntoIterator<Item = RollType>,
        values: impl IntoIterator<Item = i32>,
    ) -> SharedGroupId {
        let id = SharedGroupId(self.groups.len());
        self.groups.push(values.into_iter().collect());
        for category in categories {
            let links = self.links.entry(category).or_default();
            if !links.contains(&id) {
                links.push(id);
            }
        }
        id
    }

    /// Values remaining in a shared group.
    pub fn shared_group(&self, id: SharedGroupId) -> &[i32] {
        self.groups.get(id.0).map_or(&[], Vec::as_slice)
    }

    /// Every discretionary value available to a category, own pool first.
    pub fn available_discretionary(&self, category: RollType) -> Vec<i32> {
        let mut values = self
            .discretionary
            .get(&category)
            .cloned()
            .unwrap_or_default();
        for id in self.links.get(&category).into_iter().flatten() {
            values.extend_from_slice(self.shared_group(*id));
        }
        values
    }

    /// The most this category could possibly add to a roll. Never mutates.
    pub fn max_bonus(&self, category: RollType) -> i32 {
        self.permanent(category)
            + self.one_shot(category)
            + self.available_discretionary(category).iter().sum::<i32>()
    }

    /// Spend the cheapest set of discretionary values that reaches `needed`.
    ///
    /// Returns the amount spent. If nothing is needed, or no subset is large
    /// enough, nothing is spent and 0 is returned. Ties between equally
    /// cheap subsets go to the one using fewer values.
    pub fn spend_discretionary(&mut self, category: RollType, needed: i32) -> i32 {
        if needed <= 0 {
            return 0;
        }
        let values = self.available_discretionary(category);
        let Some(chosen) = cheapest_subset(&values, needed) else {
            tracing::trace!(?category, needed, "discretionary bonuses insufficient");
            return 0;
        };
        let spent: i32 = chosen.iter().sum();
        for value in chosen {
            self.remove_value(category, value);
        }
        tracing::trace!(?category, needed, spent, "spent discretionary bonuses");
        spent
    }

    fn remove_value(&mut self, category: RollType, value: i32) {
        let own = self.discretionary.entry(category).or_default();
        if let Some(pos) = own.iter().position(|&v| v == value) {
            own.remove(pos);
            return;
        }
        for id in self.links.get(&category).into_iter().flatten() {
            let Some(group) = self.groups.get_mut(id.0) else {
                continue;
            };
            if let Some(pos) = group.iter().position(|&v| v == value) {
                group.remove(pos);
                return;
            }
        }
    }
}

/// Minimum-sum subset of `values` whose sum is at least `needed`.
///
/// Exact for any number of values: a 0/1 knapsack over the sums below
/// `needed + max`, which bounds every minimal covering subset. Among subsets
/// with the same sum the one with fewer values wins. Non-positive values
/// never help and are skipped.
fn cheapest_subset(values: &[i32], needed: i32) -> Option<Vec<i32>> {
    let usable: Vec<i32> = values.iter().copied().filter(|&v| v > 0).collect();
    let max = usable.iter().copied().max()?;
    let needed = usize::try_from(needed).ok()?;
    let bound = needed.checked_add(usize::try_from(max).ok()?)?;

    // fewest[s]: fewest values summing to exactly s among the items seen so far
    let mut fewest: Vec<Option<u32>> = vec![None; bound];
    fewest[0] = Some(0);
    let mut took = vec![vec![false; bound]; usable.len()];
    for (i, &value) in usable.iter().enumerate() {
        let value = value as usize;
        for sum in (value..bound).rev() {
            let Some(count) = fewest[sum - value] else {
                continue;
            };
            if fewest[sum].is_none_or(|best| count + 1 < best) {
                fewest[sum] = Some(count + 1);
                took[i][sum] = true;
            }
        }
    }

    let mut sum = (needed..bound).find(|&s| fewest[s].is_some())?;
    let mut chosen = Vec::new();
    for i in (0..usable.len()).rev() {
        if took[i][sum] {
            chosen.push(usable[i]);
            sum -= usable[i] as usize;
        }
    }
    Some(chosen)
}
