// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Initial wiring patterns for a population
//!
//! A topology is only consulted once, when the population is created. It turns
//! the population's members into a list of directed `(source, target)` pairs;
//! the network then creates one connection per pair.

use ahash::AHashSet;
use brainll_npu_neural::NeuronId;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Every ordered pair (no self-connections) with independent probability
    Random { probability: f64 },
    /// Row-major 2-D grid, each member wired to its von Neumann neighbours
    Grid { width: usize, height: usize },
    /// Watts-Strogatz ring: `k` nearest neighbours, each edge rewired with probability `rewire_probability`
    SmallWorld { k: usize, rewire_probability: f64 },
}

impl Topology {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Random { .. } => "random",
            Self::Grid { .. } => "grid",
            Self::SmallWorld { .. } => "small_world",
        }
    }

    /// Directed pairs to connect, in deterministic order for a given RNG state
    pub fn edges(&self, members: &[NeuronId], rng: &mut StdRng) -> Vec<(NeuronId, NeuronId)> {
        match *self {
            Self::Random { probability } => random_edges(members, probability, rng),
            Self::Grid { width, height } => grid_edges(members, width, height),
            Self::SmallWorld {
                k,
                rewire_probability,
            } => small_world_edges(members, k, rewire_probability, rng),
        }
    }
}

fn random_edges(members: &[NeuronId], probability: f64, rng: &mut StdRng) -> Vec<(NeuronId, NeuronId)> {
    let p = probability.clamp(0.0, 1.0);
    let mut edges = Vec::new();
    for &source in members {
        for &target in members {
            if source != target && rng.gen_bool(p) {
                edges.push((source, target));
            }
        }
    }
    edges
}

fn grid_edges(members: &[NeuronId], width: usize, height: usize) -> Vec<(NeuronId, NeuronId)> {
    let cells = (width * height).min(members.len());
    let at = |x: usize, y: usize| -> Option<NeuronId> {
        let index = y * width + x;
        (index < cells).then(|| members[index])
    };

    let mut edges = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let Some(source) = at(x, y) else { continue };
            let mut neighbours = Vec::with_capacity(4);
            if y > 0 {
                neighbours.push(at(x, y - 1));
            }
            if x > 0 {
                neighbours.push(at(x - 1, y));
            }
            if x + 1 < width {
                neighbours.push(at(x + 1, y));
            }
            if y + 1 < height {
                neighbours.push(at(x, y + 1));
            }
            edges.extend(neighbours.into_iter().flatten().map(|target| (source, target)));
        }
    }
    edges
}

fn small_world_edges(
    members: &[NeuronId],
    k: usize,
    rewire_probability: f64,
    rng: &mut StdRng,
) -> Vec<(NeuronId, NeuronId)> {
    let n = members.len();
    if n < 3 {
        return Vec::new();
    }
    let half = (k / 2).clamp(1, (n - 1) / 2);
    let p = rewire_probability.clamp(0.0, 1.0);

    // Undirected edges as (low, high) index pairs
    let mut undirected: AHashSet<(usize, usize)> = AHashSet::new();
    let mut order = Vec::new();
    let key = |a: usize, b: usize| if a < b { (a, b) } else { (b, a) };
    for i in 0..n {
        for j in 1..=half {
            let e = key(i, (i + j) % n);
            if undirected.insert(e) {
                order.push(e);
            }
        }
    }

    for slot in order.iter_mut() {
        if !rng.gen_bool(p) {
            continue;
        }
        let (a, _) = *slot;
        // Degree of `a` may already saturate the ring
        if (0..n).filter(|&c| c != a && !undirected.contains(&key(a, c))).count() == 0 {
            continue;
        }
        loop {
            let candidate = rng.gen_range(0..n);
            let e = key(a, candidate);
            if candidate != a && !undirected.contains(&e) {
                undirected.remove(&*slot);
                undirected.insert(e);
                *slot = e;
                break;
            }
        }
    }

    let mut edges = Vec::with_capacity(order.len() * 2);
    for (a, b) in order {
        edges.push((members[a], members[b]));
        edges.push((members[b], members[a]));
    }
    edges
}
