//! Battlefield layout: who stands next to whom and who can reach whom.
//!
//! Two sides face each other in lines. Under [`FormationKind::Surround`],
//! a side reduced to a single fighter facing two or more enemies is
//! encircled instead: the lone fighter reaches every surrounder, the
//! surrounders form a ring, and each of them gains a permanent bonus on
//! every attack roll. Every death re-derives the whole layout.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, CombatResult};
use crate::fighter::{Fighter, FighterId};
use crate::roll_type::RollType;

/// One of the two opposing sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The first side.
    A,
    /// The second side.
    B,
}

impl Side {
    /// The opposing side.
    pub fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// How the battlefield may be arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationKind {
    /// Two facing lines, never encircled (a wall or a corridor).
    Line,
    /// Two facing lines that encircle a lone survivor.
    #[default]
    Surround,
}

/// The arrangement currently deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// Two facing lines.
    Line,
    /// A single fighter ringed by every enemy.
    Encircled {
        /// The surrounded fighter.
        inner: FighterId,
    },
}

/// Adjacency and reachability between living fighters.
#[derive(Debug, Clone)]
pub struct Formation {
    kind: FormationKind,
    sides: [Vec<FighterId>; 2],
    left: HashMap<FighterId, FighterId>,
    right: HashMap<FighterId, FighterId>,
    reach: HashMap<FighterId, BTreeSet<FighterId>>,
    layout: Layout,
    surround_bonuses: Vec<(FighterId, i32)>,
}

impl Formation {
    /// Deploy two sides. Fighter ids index into `fighters`.
    pub fn new(
        kind: FormationKind,
        side_a: Vec<FighterId>,
        side_b: Vec<FighterId>,
        fighters: &mut [Fighter],
    ) -> CombatResult<Self> {
        if side_a.is_empty() {
            return Err(CombatError::EmptySide(Side::A));
        }
        if side_b.is_empty() {
            return Err(CombatError::EmptySide(Side::B));
        }
        let mut formation = Self {
            kind,
            sides: [side_a, side_b],
            left: HashMap::new(),
            right: HashMap::new(),
            reach: HashMap::new(),
            layout: Layout::Line,
            surround_bonuses: Vec::new(),
        };
        formation.deploy(fighters);
        Ok(formation)
    }

    /// The formation kind.
    pub fn kind(&self) -> FormationKind {
        self.kind
    }

    /// The layout currently deployed.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Living members of a side, in deployment order.
    pub fn side(&self, side: Side) -> &[FighterId] {
        &self.sides[side.index()]
    }

    /// Which side a living fighter is on.
    pub fn side_of(&self, id: FighterId) -> Option<Side> {
        [Side::A, Side::B]
            .into_iter()
            .find(|side| self.side(*side).contains(&id))
    }

    /// Whether either side has been wiped out.
    pub fn one_side_finished(&self) -> bool {
        self.sides.iter().any(Vec::is_empty)
    }

    /// Distinct same-side neighbors.
    pub fn adjacent(&self, id: FighterId) -> Vec<FighterId> {
        let mut out = Vec::with_capacity(2);
        for neighbor in [self.left.get(&id), self.right.get(&id)]
            .into_iter()
            .flatten()
        {
            if *neighbor != id && !out.contains(neighbor) {
                out.push(*neighbor);
            }
        }
        out
    }

    /// Enemies this fighter can reach, lowest id first.
    pub fn attackable(&self, id: FighterId) -> Vec<FighterId> {
        self.reach
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether `from` can reach `to`.
    pub fn can_reach(&self, from: FighterId, to: FighterId) -> bool {
        self.reach.get(&from).is_some_and(|set| set.contains(&to))
    }

    /// The attack bonus each surrounder currently holds, or 0.
    pub fn surround_bonus(&self) -> i32 {
        self.surround_bonuses.first().map_or(0, |(_, bonus)| *bonus)
    }

    /// Remove a dead fighter and redeploy what is left.
    pub fn death(&mut self, corpse: FighterId, fighters: &mut [Fighter]) {
        let left = self.left.remove(&corpse);
        let right = self.right.remove(&corpse);
        if let Some(l) = left {
            match right.filter(|r| *r != l) {
                Some(r) => self.right.insert(l, r),
                None => self.right.remove(&l),
            };
        }
        if let Some(r) = right {
            match left.filter(|l| *l != r) {
                Some(l) => self.left.insert(r, l),
                None => self.left.remove(&r),
            };
        }
        self.reach.remove(&corpse);
        for set in self.reach.values_mut() {
            set.remove(&corpse);
        }
        for side in &mut self.sides {
            side.retain(|id| *id != corpse);
        }
        tracing::debug!(%corpse, "removed from formation");
        if self.one_side_finished() {
            self.remove_surround_bonuses(fighters);
            self.layout = Layout::Line;
        } else {
            self.deploy(fighters);
        }
    }

    fn deploy(&mut self, fighters: &mut [Fighter]) {
        self.remove_surround_bonuses(fighters);
        self.left.clear();
        self.right.clear();
        self.reach.clear();
        let [a, b] = self.sides.clone();
        if self.kind == FormationKind::Surround && a.len() == 1 && b.len() >= 2 {
            self.encircle(a[0], &b, fighters);
        } else if self.kind == FormationKind::Surround && b.len() == 1 && a.len() >= 2 {
            self.encircle(b[0], &a, fighters);
        } else {
            self.deploy_line(&a, &b);
        }
    }

    /// Side A at positions `2i`, side B at `2j + (n_a - n_b)` so the shorter
    /// side is centered; pairs within distance 2 reach each other.
    fn deploy_line(&mut self, a: &[FighterId], b: &[FighterId]) {
        self.layout = Layout::Line;
        self.link(a, false);
        self.link(b, false);
        let offset = a.len() as i64 - b.len() as i64;
        for (i, &fa) in a.iter().enumerate() {
            for (j, &fb) in b.iter().enumerate() {
                let distance = (2 * i as i64 - (2 * j as i64 + offset)).abs();
                if distance <= 2 {
                    self.connect(fa, fb);
                }
            }
        }
    }

    fn encircle(&mut self, inner: FighterId, outer: &[FighterId], fighters: &mut [Fighter]) {
        self.layout = Layout::Encircled { inner };
        self.link(outer, true);
        for &fo in outer {
            self.connect(inner, fo);
        }
        let bonus = 5 * (1 + outer.len() as i32);
        for &fo in outer {
            if let Some(fighter) = fighters.get_mut(fo.0) {
                for rt in RollType::ATTACKS {
                    fighter.bonuses.add_permanent(rt, bonus);
                }
            }
            self.surround_bonuses.push((fo, bonus));
        }
        tracing::debug!(%inner, surrounders = outer.len(), bonus, "encircled");
    }

    fn remove_surround_bonuses(&mut self, fighters: &mut [Fighter]) {
        for (id, bonus) in self.surround_bonuses.drain(..) {
            if let Some(fighter) = fighters.get_mut(id.0) {
                for rt in RollType::ATTACKS {
                    fighter.bonuses.add_permanent(rt, -bonus);
                }
            }
        }
    }

    fn link(&mut self, ids: &[FighterId], circular: bool) {
        if ids.len() < 2 {
            return;
        }
        for pair in ids.windows(2) {
            self.right.insert(pair[0], pair[1]);
            self.left.insert(pair[1], pair[0]);
        }
        if circular {
            let (first, last) = (ids[0], ids[ids.len() - 1]);
            self.left.insert(first, last);
            self.right.insert(last, first);
        }
    }

    fn connect(&mut self, x: FighterId, y: FighterId) {
        self.reach.entry(x).or_default().insert(y);
        self.reach.entry(y).or_default().insert(x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use proptest::prelude::*;

    fn fighters(n: usize) -> Vec<Fighter> {
        (0..n).map(|i| testing::fighter(&format!("F{i}"))).collect()
    }

    fn ids(range: std::ops::Range<usize>) -> Vec<FighterId> {
        range.map(FighterId).collect()
    }

    fn assert_symmetric(formation: &Formation, all: &[FighterId]) {
        for &x in all {
            for &y in all {
                assert_eq!(
                    formation.can_reach(x, y),
                    formation.can_reach(y, x),
                    "{x} and {y} disagree"
                );
            }
        }
    }

    #[test]
    fn empty_side_is_an_error() {
        let mut fs = fighters(2);
        let err = Formation::new(FormationKind::Line, ids(0..2), vec![], &mut fs).unwrap_err();
        assert!(matches!(err, CombatError::EmptySide(Side::B)));
    }

    #[test]
    fn one_on_one_line() {
        let mut fs = fighters(2);
        let f = Formation::new(FormationKind::Surround, ids(0..1), ids(1..2), &mut fs).unwrap();
        assert_eq!(f.layout(), Layout::Line);
        assert!(f.can_reach(FighterId(0), FighterId(1)));
        assert!(f.adjacent(FighterId(0)).is_empty());
        assert_eq!(f.side_of(FighterId(1)), Some(Side::B));
    }

    #[test]
    fn three_versus_two_line_reach() {
        let mut fs = fighters(5);
        let f = Formation::new(FormationKind::Line, ids(0..3), ids(3..5), &mut fs).unwrap();
        // A at 0,2,4; B at 1,3.
        assert_eq!(f.attackable(FighterId(0)), vec![FighterId(3)]);
        assert_eq!(f.attackable(FighterId(1)), vec![FighterId(3), FighterId(4)]);
        assert_eq!(f.attackable(FighterId(2)), vec![FighterId(4)]);
        assert_eq!(f.adjacent(FighterId(1)), vec![FighterId(0), FighterId(2)]);
        assert_eq!(f.adjacent(FighterId(3)), vec![FighterId(4)]);
        assert_symmetric(&f, &ids(0..5));
    }

    #[test]
    fn surround_transitions() {
        let mut fs = fighters(5);
        let mut f =
            Formation::new(FormationKind::Surround, ids(0..3), ids(3..5), &mut fs).unwrap();
        assert_eq!(f.layout(), Layout::Line);

        f.death(FighterId(0), &mut fs);
        assert_eq!(f.layout(), Layout::Line);
        f.death(FighterId(1), &mut fs);
        assert_eq!(f.layout(), Layout::Encircled { inner: FighterId(2) });
        assert_eq!(f.surround_bonus(), 15);
        for id in [3, 4] {
            assert_eq!(fs[id].bonuses.permanent(RollType::Attack), 15);
            assert_eq!(fs[id].bonuses.permanent(RollType::Lunge), 15);
            assert_eq!(fs[id].bonuses.permanent(RollType::Parry), 0);
        }
        assert_eq!(f.attackable(FighterId(2)), vec![FighterId(3), FighterId(4)]);
        assert_eq!(f.adjacent(FighterId(3)), vec![FighterId(4)]);
        assert_symmetric(&f, &ids(0..5));

        f.death(FighterId(4), &mut fs);
        assert_eq!(f.layout(), Layout::Line);
        assert_eq!(f.surround_bonus(), 0);
        assert_eq!(fs[3].bonuses.permanent(RollType::Attack), 0);
        assert_eq!(fs[4].bonuses.permanent(RollType::Attack), 0);
        assert!(f.can_reach(FighterId(2), FighterId(3)));
    }

    #[test]
    fn bonus_shrinks_as_surrounders_fall() {
        let mut fs = fighters(4);
        let mut f =
            Formation::new(FormationKind::Surround, ids(0..1), ids(1..4), &mut fs).unwrap();
        assert_eq!(f.surround_bonus(), 20);
        f.death(FighterId(2), &mut fs);
        assert_eq!(f.surround_bonus(), 15);
        assert_eq!(fs[1].bonuses.permanent(RollType::Attack), 15);
        assert_eq!(fs[2].bonuses.permanent(RollType::Attack), 0);
    }

    #[test]
    fn line_kind_never_encircles() {
        let mut fs = fighters(3);
        let f = Formation::new(FormationKind::Line, ids(0..1), ids(1..3), &mut fs).unwrap();
        assert_eq!(f.layout(), Layout::Line);
        assert_eq!(f.surround_bonus(), 0);
        assert_eq!(f.attackable(FighterId(0)), vec![FighterId(1), FighterId(2)]);
    }

    #[test]
    fn eliminating_a_side_clears_bonuses() {
        let mut fs = fighters(3);
        let mut f =
            Formation::new(FormationKind::Surround, ids(0..1), ids(1..3), &mut fs).unwrap();
        f.death(FighterId(0), &mut fs);
        assert!(f.one_side_finished());
        assert_eq!(fs[1].bonuses.permanent(RollType::Attack), 0);
        assert!(f.attackable(FighterId(1)).is_empty());
    }

    proptest! {
        #[test]
        fn reach_stays_symmetric_through_deaths(
            n_a in 1usize..5,
            n_b in 1usize..5,
            order in proptest::collection::vec(0usize..8, 0..8),
            surround in any::<bool>(),
        ) {
            let total = n_a + n_b;
            let mut fs = fighters(total);
            let kind = if surround { FormationKind::Surround } else { FormationKind::Line };
            let mut f = Formation::new(kind, ids(0..n_a), ids(n_a..total), &mut fs).unwrap();
            let all = ids(0..total);
            for pick in order {
                if f.one_side_finished() {
                    break;
                }
                let corpse = FighterId(pick % total);
                if f.side_of(corpse).is_none() {
                    continue;
                }
                f.death(corpse, &mut fs);
                for &x in &all {
                    for &y in &all {
                        prop_assert_eq!(f.can_reach(x, y), f.can_reach(y, x));
                    }
                    prop_assert!(f.adjacent(x).len() <= 2);
                }
            }
        }
    }
}
