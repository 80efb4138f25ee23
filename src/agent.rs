//! Agents: the tile-placing environment and the slider players, including
//! the TD(0) learning slider this crate exists for.
//!
//! Variants form a closed set dispatched through [`Agent`]; every variant
//! satisfies the same decision contract: `take_action` returns `Some` action
//! or `None` when it cannot act.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{AgentConfig, Role};
use crate::engine::{Board, Move, Reward};
use crate::ntuple::{TupleNetwork, WeightError};

/// A game action: a player slide or an environment placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Slide(Move),
    Place { pos: usize, tile: u8, hint: u8 },
}

fn seed_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Closed set of agent variants; constructed from an [`AgentConfig`].
pub enum Agent {
    RandomPlacer(RandomPlacer),
    RandomSlider(RandomSlider),
    HeuristicSlider(HeuristicSlider),
    LearningSlider(LearningSlider),
}

impl Agent {
    /// Pick the variant for a validated config: placers are random; sliders
    /// are selected by name, defaulting to the TD learner.
    pub fn from_config(cfg: AgentConfig) -> Result<Self, WeightError> {
        match cfg.role {
            Role::Placer => Ok(Agent::RandomPlacer(RandomPlacer::new(cfg.seed))),
            Role::Slider => match cfg.name.as_str() {
                "random" => Ok(Agent::RandomSlider(RandomSlider::new(cfg.seed))),
                "greedy" => Ok(Agent::HeuristicSlider(HeuristicSlider)),
                _ => Ok(Agent::LearningSlider(LearningSlider::from_config(&cfg)?)),
            },
        }
    }

    pub fn take_action(&mut self, board: &Board) -> Option<Action> {
        match self {
            Agent::RandomPlacer(agent) => agent.take_action(board),
            Agent::RandomSlider(agent) => agent.take_action(board),
            Agent::HeuristicSlider(agent) => agent.take_action(board),
            Agent::LearningSlider(agent) => agent.take_action(board),
        }
    }

    pub fn open_episode(&mut self) {}

    /// Episode teardown; the learner trains on the recorded trajectory here.
    pub fn close_episode(&mut self) {
        if let Agent::LearningSlider(agent) = self {
            agent.update_episode();
        }
    }

    /// Run teardown; the learner persists its weights if configured to.
    pub fn finish(&self) -> Result<(), WeightError> {
        match self {
            Agent::LearningSlider(agent) => agent.save_weights(),
            _ => Ok(()),
        }
    }
}

/// Environment agent: drops the hinted tile on a random legal slot and draws
/// the next hint from the bag.
pub struct RandomPlacer {
    rng: StdRng,
}

impl RandomPlacer {
    pub fn new(seed: Option<u64>) -> Self {
        RandomPlacer { rng: seed_rng(seed) }
    }

    pub fn take_action(&mut self, board: &Board) -> Option<Action> {
        let mut slots = board.placement_slots().to_vec();
        slots.shuffle(&mut self.rng);
        for pos in slots {
            if board.rank(pos) != 0 {
                continue;
            }
            let mut bag: Vec<u8> = (1..=3).filter(|&t| board.in_bag(t)).collect();
            bag.shuffle(&mut self.rng);
            let tile = match board.hint() {
                0 => bag.pop()?,
                hinted => hinted,
            };
            let hint = bag.pop()?;
            return Some(Action::Place { pos, tile, hint });
        }
        None
    }
}

/// Baseline player: a uniformly random legal slide.
pub struct RandomSlider {
    rng: StdRng,
}

impl RandomSlider {
    pub fn new(seed: Option<u64>) -> Self {
        RandomSlider { rng: seed_rng(seed) }
    }

    pub fn take_action(&mut self, board: &Board) -> Option<Action> {
        let mut directions = Move::ALL;
        directions.shuffle(&mut self.rng);
        for direction in directions {
            let mut probe = *board;
            if probe.slide(direction) != -1 {
                return Some(Action::Slide(direction));
            }
        }
        None
    }
}

/// Baseline player: greedy on immediate slide reward, first direction in
/// order winning ties.
pub struct HeuristicSlider;

impl HeuristicSlider {
    pub fn take_action(&mut self, board: &Board) -> Option<Action> {
        let mut best: Option<(Move, Reward)> = None;
        for direction in Move::ALL {
            let mut probe = *board;
            let reward = probe.slide(direction);
            if reward == -1 {
                continue;
            }
            if best.map_or(true, |(_, best_reward)| reward > best_reward) {
                best = Some((direction, reward));
            }
        }
        best.map(|(direction, _)| Action::Slide(direction))
    }
}

/// One recorded ply: the boards around the chosen slide, its reward, and the
/// combined score (reward + afterstate estimate) at decision time.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub before: Board,
    pub after: Board,
    pub dir: Move,
    pub reward: Reward,
    pub value: f32,
}

impl Step {
    /// Marker recorded when no direction is legal; discarded unexamined by
    /// the episode update.
    fn terminal(board: &Board) -> Step {
        Step { before: *board, after: *board, dir: Move::Up, reward: 0, value: 0.0 }
    }
}

/// TD(0) learning player: 1-step lookahead over an n-tuple network, with a
/// backward update over the recorded trajectory at episode end.
pub struct LearningSlider {
    alpha: f32,
    net: TupleNetwork,
    trajectory: Vec<Step>,
    save: Option<PathBuf>,
}

impl LearningSlider {
    pub fn new(alpha: f32, net: TupleNetwork) -> Self {
        LearningSlider { alpha, net, trajectory: Vec::with_capacity(1 << 12), save: None }
    }

    pub fn from_config(cfg: &AgentConfig) -> Result<Self, WeightError> {
        let mut net = TupleNetwork::new(&cfg.init);
        if let Some(path) = &cfg.load {
            net.load_from_path(path)?;
        }
        let mut slider = LearningSlider::new(cfg.alpha, net);
        slider.save = cfg.save.clone();
        Ok(slider)
    }

    pub fn network(&self) -> &TupleNetwork {
        &self.net
    }

    pub fn trajectory_len(&self) -> usize {
        self.trajectory.len()
    }

    /// 1-step lookahead: score every legal direction by immediate reward
    /// plus the network's afterstate estimate, keep the strict maximum (the
    /// first direction in `Move::ALL` order wins ties), and record the ply.
    ///
    /// When no direction is legal a terminal marker is recorded instead and
    /// `None` signals the caller to end the episode.
    pub fn take_action(&mut self, before: &Board) -> Option<Action> {
        let mut best: Option<(Move, Board, Reward, f32)> = None;
        for direction in Move::ALL {
            let mut after = *before;
            let reward = after.slide(direction);
            if reward == -1 {
                continue;
            }
            let value = reward as f32 + self.net.estimate(&after);
            let better = match &best {
                None => true,
                Some((_, _, _, best_value)) => value > *best_value,
            };
            if better {
                best = Some((direction, after, reward, value));
            }
        }
        match best {
            Some((dir, after, reward, value)) => {
                self.trajectory.push(Step { before: *before, after, dir, reward, value });
                Some(Action::Slide(dir))
            }
            None => {
                self.trajectory.push(Step::terminal(before));
                None
            }
        }
    }

    /// Backward TD(0) sweep over the finished episode.
    ///
    /// Discards the terminal marker, then walks the trajectory from the last
    /// move to the first: each move's afterstate is corrected toward the
    /// already-corrected value of the move that followed it, and the freshly
    /// updated estimate (plus the move's reward) becomes the target for the
    /// move before it. Consumes the whole trajectory.
    pub fn update_episode(&mut self) {
        let mut exact = 0.0f32;
        self.trajectory.pop();
        while let Some(step) = self.trajectory.pop() {
            let error = exact - (step.value - step.reward as f32);
            exact = step.reward as f32 + self.net.update(&step.after, self.alpha * error);
        }
    }

    /// Write the weight tables to the configured save path, if any.
    pub fn save_weights(&self) -> Result<(), WeightError> {
        match &self.save {
            Some(path) => self.net.save_to_path(path),
            None => Ok(()),
        }
    }
}
