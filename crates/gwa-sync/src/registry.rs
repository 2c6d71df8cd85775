//! Per-kind ordering declarations and the schedules derived from them.

use std::collections::BTreeMap;

use gwa_model::EntityKind;

use crate::error::{Result, SyncError};

/// Ordering declaration of one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub kind: EntityKind,
    pub read_priority: u32,
    pub read_prerequisites: Vec<EntityKind>,
    pub write_priority: u32,
    pub write_prerequisites: Vec<EntityKind>,
}

impl Registration {
    fn new(kind: EntityKind, read: (u32, &[EntityKind]), write: (u32, &[EntityKind])) -> Self {
        Self {
            kind,
            read_priority: read.0,
            read_prerequisites: read.1.to_vec(),
            write_priority: write.0,
            write_prerequisites: write.1.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// The registration table.
///
/// On write, kinds that synthesize entities run before the synthesized kind:
/// elements, meshes and members create nodes, and nodes create axes.
pub fn registrations() -> Vec<Registration> {
    use EntityKind::*;
    vec![
        Registration::new(Material, (0, &[]), (0, &[])),
        Registration::new(Property1D, (1, &[Material]), (1, &[Material])),
        Registration::new(Property2D, (1, &[Material]), (1, &[Material])),
        Registration::new(PropertyMass, (1, &[]), (1, &[])),
        Registration::new(Axis, (2, &[]), (6, &[Node])),
        Registration::new(Node, (3, &[Axis]), (
            5,
            &[Element0D, Element1D, Element2D, Mesh, Member1D, Member2D],
        )),
        Registration::new(Element0D, (4, &[Node, PropertyMass]), (3, &[PropertyMass])),
        Registration::new(Element1D, (4, &[Node, Property1D]), (3, &[Property1D])),
        Registration::new(Element2D, (4, &[Node, Property2D]), (3, &[Property2D])),
        Registration::new(Mesh, (5, &[Element2D]), (3, &[Property2D])),
        Registration::new(Member1D, (6, &[Node, Property1D]), (4, &[Property1D])),
        Registration::new(Member2D, (6, &[Node, Property2D]), (4, &[Property2D])),
        Registration::new(LoadCase, (7, &[]), (2, &[])),
        Registration::new(LoadNode, (8, &[Node, LoadCase]), (7, &[Node, LoadCase])),
        Registration::new(Load1D, (8, &[Element1D, LoadCase]), (7, &[Element1D, LoadCase])),
        Registration::new(
            Load2D,
            (8, &[Element2D, Mesh, LoadCase]),
            (7, &[Element2D, Mesh, LoadCase]),
        ),
    ]
}

/// Execution order of the kinds for one direction, with the prerequisites
/// each kind waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    order: Vec<EntityKind>,
    prerequisites: BTreeMap<EntityKind, Vec<EntityKind>>,
}

impl Schedule {
    /// Topologically sorts the registrations (Kahn's algorithm). Among kinds
    /// that are ready at the same time the lower priority runs first, then
    /// the earlier declaration.
    pub fn build(registrations: &[Registration], direction: Direction) -> Result<Self> {
        let mut prerequisites = BTreeMap::<EntityKind, Vec<EntityKind>>::new();
        let mut rank = BTreeMap::<EntityKind, (u32, usize)>::new();
        for (position, reg) in registrations.iter().enumerate() {
            let (priority, before) = match direction {
                Direction::Read => (reg.read_priority, &reg.read_prerequisites),
                Direction::Write => (reg.write_priority, &reg.write_prerequisites),
            };
            rank.insert(reg.kind, (priority, position));
            prerequisites.insert(reg.kind, before.clone());
        }

        // Prerequisites that are not registered impose no ordering.
        let mut in_degree = BTreeMap::<EntityKind, usize>::new();
        let mut dependents = BTreeMap::<EntityKind, Vec<EntityKind>>::new();
        for (kind, before) in &prerequisites {
            let known: Vec<EntityKind> = before
                .iter()
                .copied()
                .filter(|p| rank.contains_key(p))
                .collect();
            in_degree.insert(*kind, known.len());
            for prerequisite in known {
                dependents.entry(prerequisite).or_default().push(*kind);
            }
        }

        let mut order = Vec::with_capacity(rank.len());
        let mut ready: Vec<EntityKind> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(kind, _)| *kind)
            .collect();

        while !ready.is_empty() {
            ready.sort_by_key(|kind| std::cmp::Reverse(rank[kind]));
            let Some(kind) = ready.pop() else { break };
            order.push(kind);
            for dependent in dependents.get(&kind).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(*dependent);
                    }
                }
            }
        }

        if order.len() < rank.len() {
            let stuck = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(kind, _)| *kind)
                .collect();
            return Err(SyncError::DependencyCycle(stuck));
        }

        Ok(Self {
            order,
            prerequisites,
        })
    }

    pub fn read() -> Result<Self> {
        Self::build(&registrations(), Direction::Read)
    }

    pub fn write() -> Result<Self> {
        Self::build(&registrations(), Direction::Write)
    }

    pub fn order(&self) -> &[EntityKind] {
        &self.order
    }

    pub fn prerequisites(&self, kind: EntityKind) -> &[EntityKind] {
        self.prerequisites
            .get(&kind)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    /// Position of `kind` in the order.
    pub fn position(&self, kind: EntityKind) -> Option<usize> {
        self.order.iter().position(|k| *k == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindState {
    Pending,
    Running,
    Done,
}

/// Per-kind state of one operation: `Pending -> Running -> Done`.
#[derive(Debug, Clone)]
pub struct Progress<'a> {
    schedule: &'a Schedule,
    states: BTreeMap<EntityKind, KindState>,
}

impl<'a> Progress<'a> {
    pub fn new(schedule: &'a Schedule) -> Self {
        let states = schedule
            .order()
            .iter()
            .map(|kind| (*kind, KindState::Pending))
            .collect();
        Self { schedule, states }
    }

    /// Moves `kind` to `Running` once every prerequisite is `Done`.
    pub fn start(&mut self, kind: EntityKind) -> Result<()> {
        for prerequisite in self.schedule.prerequisites(kind) {
            let done = self
                .states
                .get(prerequisite)
                .is_none_or(|state| *state == KindState::Done);
            if !done {
                return Err(SyncError::PrerequisiteNotDone {
                    kind,
                    prerequisite: *prerequisite,
                });
            }
        }
        self.states.insert(kind, KindState::Running);
        Ok(())
    }

    pub fn finish(&mut self, kind: EntityKind) {
        self.states.insert(kind, KindState::Done);
    }

    pub fn state(&self, kind: EntityKind) -> KindState {
        self.states.get(&kind).copied().unwrap_or(KindState::Pending)
    }

    pub fn is_complete(&self) -> bool {
        self.states.values().all(|state| *state == KindState::Done)
    }
}
