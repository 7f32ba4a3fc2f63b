//! Mobile agents spreading infection on contact over a terrain grid.

use crate::config::Rates;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::model::{AXIS_MOVES, Agent, AgentHealth, Coord, Terrain};
use crate::stats::AgentStats;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

/// Population of agents over a terrain grid.
///
/// Unlike [`Field`](crate::field::Field), a step here is sequential: each
/// phase sees the mutations of the phases before it, and within a phase
/// each agent sees the mutations made for agents processed earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    terrain: Grid<Terrain>,
    agents: Vec<Agent>,
    stats: AgentStats,
}

impl Population {
    /// Draw the terrain and place `n_agents` agents uniformly at random.
    ///
    /// The agents with ids `0..n_infected` start infected.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        n_agents: usize,
        n_infected: usize,
        p_occupied: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig("grid size must be positive".into()));
        }
        if n_infected > n_agents {
            return Err(Error::InvalidConfig(format!(
                "initial infected count {n_infected} exceeds population of {n_agents}"
            )));
        }
        let n_agents_u32 = u32::try_from(n_agents).map_err(|_| {
            Error::InvalidConfig(format!("population of {n_agents} does not fit agent ids"))
        })?;
        let occupied_dist = Bernoulli::new(p_occupied).map_err(|err| {
            Error::InvalidConfig(format!("occupied terrain fraction {p_occupied}: {err}"))
        })?;

        let terrain = Grid::from_fn(size, |_| {
            if occupied_dist.sample(rng) {
                Terrain::Occupied
            } else {
                Terrain::Empty
            }
        });

        let agents: Vec<_> = (0..n_agents_u32)
            .map(|id| {
                let coord = Coord::new(rng.random_range(0..size), rng.random_range(0..size));
                let health = if (id as usize) < n_infected {
                    AgentHealth::Infected
                } else {
                    AgentHealth::Healthy
                };
                Agent::new(id, coord, health)
            })
            .collect();

        Ok(Self::from_parts(terrain, agents))
    }

    /// Assemble a population from an existing terrain and agent list.
    ///
    /// Agents are reordered by id.
    ///
    /// # Errors
    /// Fails if an agent stands outside the terrain or two agents share an id.
    pub fn with_agents(terrain: Grid<Terrain>, mut agents: Vec<Agent>) -> Result<Self> {
        if let Some(agent) = agents.iter().find(|a| !terrain.contains(a.coord())) {
            return Err(Error::OutOfBounds {
                coord: agent.coord(),
                size: terrain.size(),
            });
        }
        agents.sort_by_key(Agent::id);
        if agents.windows(2).any(|pair| pair[0].id() == pair[1].id()) {
            return Err(Error::InvalidConfig("agent ids must be unique".into()));
        }
        Ok(Self::from_parts(terrain, agents))
    }

    fn from_parts(terrain: Grid<Terrain>, agents: Vec<Agent>) -> Self {
        let stats = AgentStats::count(&agents);
        Self {
            terrain,
            agents,
            stats,
        }
    }

    pub fn size(&self) -> usize {
        self.terrain.size()
    }

    pub fn terrain(&self) -> &Grid<Terrain> {
        &self.terrain
    }

    /// Living agents, in id order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Counts as of the last reset, step or infection.
    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    /// In-bounds cells covered by an agent: its own cell and its four axis neighbours.
    pub fn hitbox(&self, agent: &Agent) -> impl Iterator<Item = Coord> + '_ {
        let coord = agent.coord();
        std::iter::once(coord).chain(
            AXIS_MOVES
                .iter()
                .filter_map(move |&(d_row, d_col)| coord.offset(d_row, d_col, self.size())),
        )
    }

    /// Infect every healthy agent standing on `coord`.
    ///
    /// An empty cell is a no-op. Coordinates outside the grid yield
    /// [`Error::OutOfBounds`] and leave the population unchanged.
    pub fn infect(&mut self, coord: Coord) -> Result<()> {
        self.terrain.linear_index(coord)?;
        for agent in self.agents.iter_mut().filter(|a| a.coord() == coord) {
            agent.infect();
        }
        self.refresh_stats();
        Ok(())
    }

    pub fn infect_agent(&mut self, id: u32) -> Result<()> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(Error::UnknownAgent(id))?;
        agent.infect();
        self.refresh_stats();
        Ok(())
    }

    /// Advance one tick. Returns `false`, without touching the generator,
    /// when nobody is left alive.
    pub fn step<R: Rng + ?Sized>(&mut self, rates: &Rates, rng: &mut R) -> bool {
        if self.agents.is_empty() {
            return false;
        }

        self.move_agents(&rates.movement, rng);
        self.spread_on_contact();
        self.remove_deceased(&rates.death, rng);
        self.refresh_stats();

        true
    }

    /// Whether no further infection can happen.
    pub fn is_settled(&self) -> bool {
        self.stats.healthy == 0 || self.stats.infected == 0
    }

    fn move_agents<R: Rng + ?Sized>(&mut self, movement: &Bernoulli, rng: &mut R) {
        let size = self.size();
        for agent in &mut self.agents {
            if !movement.sample(rng) {
                continue;
            }
            let (d_row, d_col) = AXIS_MOVES[rng.random_range(0..AXIS_MOVES.len())];
            // Moves off the edge are dropped.
            if let Some(dest) = agent.coord().offset(d_row, d_col, size) {
                agent.move_to(dest);
            }
        }
    }

    fn spread_on_contact(&mut self) {
        let n_agts = self.agents.len();
        for i in 0..n_agts {
            for j in (i + 1)..n_agts {
                let (a, b) = (&self.agents[i], &self.agents[j]);
                if a.health() != b.health() && hitboxes_overlap(a.coord(), b.coord()) {
                    self.agents[i].infect();
                    self.agents[j].infect();
                }
            }
        }
    }

    fn remove_deceased<R: Rng + ?Sized>(&mut self, death: &Bernoulli, rng: &mut R) {
        let n_before = self.agents.len();
        self.agents
            .retain(|agent| !(agent.is_infected() && death.sample(rng)));
        let n_dead = n_before - self.agents.len();
        if n_dead > 0 {
            log::trace!("{n_dead} agents died, {} remain", self.agents.len());
        }
    }

    fn refresh_stats(&mut self) {
        self.stats = AgentStats::count(&self.agents);
    }
}

/// Two clipped hitboxes share a cell exactly when the agents are at most two
/// axis steps apart; any shared cell lies between them, hence inside the grid.
fn hitboxes_overlap(a: Coord, b: Coord) -> bool {
    a.manhattan(b) <= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Params;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use std::collections::HashSet;

    fn rng() -> ChaCha12Rng {
        ChaCha12Rng::seed_from_u64(7)
    }

    fn rates(p_move: f64, p_death: f64) -> Rates {
        Params {
            p_move,
            p_death,
            ..Params::default()
        }
        .rates()
        .expect("valid params")
    }

    fn flat(size: usize) -> Grid<Terrain> {
        Grid::from_fn(size, |_| Terrain::Empty)
    }

    fn agent(id: u32, row: usize, col: usize, health: AgentHealth) -> Agent {
        Agent::new(id, Coord::new(row, col), health)
    }

    #[test]
    fn rejects_bad_reset() {
        let mut rng = rng();
        assert!(matches!(
            Population::new(10, 2, 3, 0.8, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Population::new(0, 2, 1, 0.8, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Population::new(10, 2, 1, -0.5, &mut rng),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn reset_places_agents_in_bounds() {
        let mut rng = rng();
        let pop = Population::new(15, 40, 3, 0.8, &mut rng).expect("valid population");

        assert_eq!(pop.agents().len(), 40);
        assert!(pop.agents().iter().all(|a| pop.terrain().contains(a.coord())));
        let infected: Vec<_> = pop
            .agents()
            .iter()
            .filter(|a| a.is_infected())
            .map(Agent::id)
            .collect();
        assert_eq!(infected, vec![0, 1, 2]);
        assert_eq!(
            pop.stats(),
            AgentStats {
                healthy: 37,
                infected: 3,
                alive: 40
            }
        );
    }

    #[test]
    fn hitbox_rule_matches_cell_sets() {
        let pop = Population::with_agents(flat(5), Vec::new()).expect("valid population");
        let coords: Vec<_> = (0..5)
            .flat_map(|row| (0..5).map(move |col| Coord::new(row, col)))
            .collect();
        for &a in &coords {
            let box_a: HashSet<_> =
                pop.hitbox(&agent(0, a.row, a.col, AgentHealth::Healthy)).collect();
            for &b in &coords {
                let box_b: HashSet<_> =
                    pop.hitbox(&agent(1, b.row, b.col, AgentHealth::Healthy)).collect();
                assert_eq!(
                    !box_a.is_disjoint(&box_b),
                    hitboxes_overlap(a, b),
                    "mismatch for {a} and {b}"
                );
            }
        }
    }

    #[test]
    fn moves_are_single_axis_steps() {
        let size = 5;
        let agents = vec![
            agent(0, 2, 2, AgentHealth::Healthy),
            agent(1, 0, 0, AgentHealth::Healthy),
        ];
        let mut pop = Population::with_agents(flat(size), agents).expect("valid population");
        let mut rng = rng();
        let rates = rates(1.0, 0.0);

        let on_edge = |c: Coord| c.row == 0 || c.col == 0 || c.row == size - 1 || c.col == size - 1;
        let mut dropped = 0;
        for _ in 0..500 {
            let before: Vec<_> = pop.agents().iter().map(Agent::coord).collect();
            pop.step(&rates, &mut rng);
            for (&from, to) in before.iter().zip(pop.agents().iter().map(Agent::coord)) {
                assert!(pop.terrain().contains(to));
                match from.manhattan(to) {
                    1 => {}
                    0 => {
                        assert!(on_edge(from), "interior agent at {from} stayed put");
                        dropped += 1;
                    }
                    d => panic!("moved {d} cells from {from} to {to}"),
                }
            }
        }
        assert!(dropped > 0);
    }

    #[test]
    fn corner_agent_only_reaches_neighbours() {
        let agents = vec![agent(0, 0, 0, AgentHealth::Healthy)];
        let mut rng = rng();
        let rates = rates(1.0, 0.0);

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let mut pop =
                Population::with_agents(flat(5), agents.clone()).expect("valid population");
            pop.step(&rates, &mut rng);
            seen.insert(pop.agents()[0].coord());
        }
        let expected: HashSet<_> = [Coord::new(0, 0), Coord::new(0, 1), Coord::new(1, 0)].into();
        assert_eq!(seen, expected);

        let mut pop = Population::with_agents(flat(1), agents).expect("valid population");
        for _ in 0..20 {
            pop.step(&rates, &mut rng);
            assert_eq!(pop.agents()[0].coord(), Coord::new(0, 0));
        }
    }

    #[test]
    fn contact_infects_both_ways() {
        let agents = vec![
            agent(0, 0, 0, AgentHealth::Healthy),
            agent(1, 1, 1, AgentHealth::Infected),
            agent(2, 4, 4, AgentHealth::Healthy),
        ];
        let mut pop = Population::with_agents(flat(5), agents).expect("valid population");
        let mut rng = rng();

        assert!(pop.step(&rates(0.0, 0.0), &mut rng));
        assert!(pop.agents()[0].is_infected());
        assert!(!pop.agents()[2].is_infected());
        assert_eq!(pop.stats().infected, 2);
    }

    #[test]
    fn contact_chains_within_one_step() {
        // Pair (1, 2) infects 1, which then passes it on to 3 in the same pass.
        // Pair (0, 1) was evaluated before that, so 0 stays healthy.
        let agents = vec![
            agent(0, 0, 0, AgentHealth::Healthy),
            agent(1, 0, 2, AgentHealth::Healthy),
            agent(2, 0, 4, AgentHealth::Infected),
            agent(3, 2, 2, AgentHealth::Healthy),
        ];
        let mut pop = Population::with_agents(flat(6), agents).expect("valid population");
        let mut rng = rng();

        pop.step(&rates(0.0, 0.0), &mut rng);
        let health: Vec<_> = pop.agents().iter().map(Agent::is_infected).collect();
        assert_eq!(health, vec![false, true, true, true]);
    }

    #[test]
    fn healthy_agents_never_die() {
        let agents = (0..20)
            .map(|id| agent(id, 0, id as usize, AgentHealth::Healthy))
            .collect();
        let mut pop = Population::with_agents(flat(20), agents).expect("valid population");
        let mut rng = rng();
        for _ in 0..10 {
            pop.step(&rates(0.5, 1.0), &mut rng);
        }
        assert_eq!(pop.stats().alive, 20);
        assert!(pop.is_settled());
    }

    #[test]
    fn depopulation_then_no_op() {
        let agents = vec![agent(0, 2, 2, AgentHealth::Infected)];
        let mut pop = Population::with_agents(flat(5), agents).expect("valid population");
        let mut rng = rng();
        let rates = rates(0.5, 1.0);

        assert!(pop.step(&rates, &mut rng));
        assert!(pop.is_empty());
        assert_eq!(pop.stats(), AgentStats::default());

        let probe = rng.clone();
        for _ in 0..5 {
            assert!(!pop.step(&rates, &mut rng));
        }
        assert_eq!(rng, probe);
        assert_eq!(pop.stats(), AgentStats::default());
    }

    #[test]
    fn infect_by_cell_and_id() {
        let agents = vec![
            agent(0, 1, 1, AgentHealth::Healthy),
            agent(1, 1, 1, AgentHealth::Healthy),
            agent(2, 3, 3, AgentHealth::Healthy),
        ];
        let mut pop = Population::with_agents(flat(4), agents).expect("valid population");

        pop.infect(Coord::new(1, 1)).expect("in bounds");
        assert_eq!(pop.stats().infected, 2);

        pop.infect(Coord::new(0, 0)).expect("in bounds");
        assert_eq!(pop.stats().infected, 2);

        let before = pop.clone();
        let coord = Coord::new(4, 0);
        assert_eq!(pop.infect(coord), Err(Error::OutOfBounds { coord, size: 4 }));
        assert_eq!(pop.infect_agent(9), Err(Error::UnknownAgent(9)));
        assert_eq!(pop, before);

        pop.infect_agent(2).expect("agent exists");
        assert_eq!(pop.stats().healthy, 0);
    }

    #[test]
    fn with_agents_validates() {
        let outside = vec![agent(0, 0, 5, AgentHealth::Healthy)];
        assert!(matches!(
            Population::with_agents(flat(5), outside),
            Err(Error::OutOfBounds { .. })
        ));
        let dup = vec![
            agent(3, 0, 0, AgentHealth::Healthy),
            agent(3, 1, 0, AgentHealth::Healthy),
        ];
        assert!(matches!(
            Population::with_agents(flat(5), dup),
            Err(Error::InvalidConfig(_))
        ));
    }

    proptest! {
        #[test]
        fn population_invariants_hold(
            size in 1usize..10,
            n_agents in 0usize..30,
            p_move in 0.0f64..=1.0,
            p_death in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let n_infected = n_agents / 3;
            let mut pop = Population::new(size, n_agents, n_infected, 0.5, &mut rng)
                .expect("valid population");
            let rates = rates(p_move, p_death);

            let mut alive = pop.stats().alive;
            for _ in 0..15 {
                let before: Vec<_> = pop.agents().to_vec();
                pop.step(&rates, &mut rng);
                for agent in pop.agents() {
                    let from = before
                        .iter()
                        .find(|a| a.id() == agent.id())
                        .expect("survivor existed before the step");
                    prop_assert!(from.coord().manhattan(agent.coord()) <= 1);
                }
                let stats = pop.stats();
                prop_assert_eq!(stats.healthy + stats.infected, stats.alive);
                prop_assert_eq!(stats.alive, pop.agents().len());
                prop_assert!(stats.alive <= alive);
                prop_assert!(pop.agents().iter().all(|a| pop.terrain().contains(a.coord())));
                prop_assert!(pop.agents().windows(2).all(|w| w[0].id() < w[1].id()));
                alive = stats.alive;
            }
        }
    }
}
