//! Reverse post-order, dominators, post-dominators, and back edges.
//!
//! Dominator sets are iteratively intersected over predecessors until a
//! fixpoint, seeded with the entry dominating itself; post-dominators run
//! the same algorithm over reversed edges from the exit blocks. An edge
//! `u -> v` is a back edge iff `v` dominates `u`.

use crate::graph::{BlockId, ControlFlowGraph};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashSet;

/// Fill in `rpo`, `dominators`, `post_dominators`, and `back_edges`.
pub fn analyze(cfg: &mut ControlFlowGraph<'_>) {
    cfg.rpo = reverse_post_order(cfg);
    cfg.dominators = dominator_sets(cfg);
    cfg.post_dominators = post_dominator_sets(cfg);

    let mut back_edges = FxHashSet::default();
    for edge in &cfg.edges {
        if cfg.dominators[edge.source.index()].contains(edge.target.index()) {
            back_edges.insert(edge.id);
        }
    }
    cfg.back_edges = back_edges;
}

/// Reverse post-order from the entry: every non-back-edge predecessor
/// precedes its successor. Computed once per pass and indexed by position.
fn reverse_post_order(cfg: &ControlFlowGraph<'_>) -> Vec<BlockId> {
    let n = cfg.blocks.len();
    let mut visited = FixedBitSet::with_capacity(n);
    let mut post_order = Vec::with_capacity(n);
    // Iterative DFS with an explicit done-marker frame.
    let mut stack: Vec<(BlockId, bool)> = vec![(cfg.entry, false)];
    while let Some((block, children_done)) = stack.pop() {
        if children_done {
            post_order.push(block);
            continue;
        }
        if visited.contains(block.index()) {
            continue;
        }
        visited.insert(block.index());
        stack.push((block, true));
        // Push in reverse so the first successor is visited first.
        let succs: Vec<BlockId> = cfg.successors(block).map(|e| e.target).collect();
        for &target in succs.iter().rev() {
            if !visited.contains(target.index()) {
                stack.push((target, false));
            }
        }
    }
    post_order.reverse();
    post_order
}

fn dominator_sets(cfg: &ControlFlowGraph<'_>) -> Vec<FixedBitSet> {
    let n = cfg.blocks.len();
    let mut all = FixedBitSet::with_capacity(n);
    all.insert_range(..);

    // Only blocks in RPO are reachable; unreachable predecessors must not
    // poison the intersection.
    let reachable: FxHashSet<BlockId> = cfg.rpo.iter().copied().collect();

    let mut dom: Vec<FixedBitSet> = vec![all; n];
    let mut entry_set = FixedBitSet::with_capacity(n);
    entry_set.insert(cfg.entry.index());
    dom[cfg.entry.index()] = entry_set;
    for block in &cfg.blocks {
        if !reachable.contains(&block.id) {
            let mut set = FixedBitSet::with_capacity(n);
            set.insert(block.id.index());
            dom[block.id.index()] = set;
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for &block in &cfg.rpo {
            if block == cfg.entry {
                continue;
            }
            let mut new_set: Option<FixedBitSet> = None;
            for pred in cfg.predecessors(block) {
                if !reachable.contains(&pred.source) {
                    continue;
                }
                let pred_dom = &dom[pred.source.index()];
                match &mut new_set {
                    None => new_set = Some(pred_dom.clone()),
                    Some(set) => set.intersect_with(pred_dom),
                }
            }
            let mut new_set = new_set.unwrap_or_else(|| FixedBitSet::with_capacity(n));
            new_set.insert(block.index());
            if new_set != dom[block.index()] {
                dom[block.index()] = new_set;
                changed = true;
            }
        }
    }
    dom
}

fn post_dominator_sets(cfg: &ControlFlowGraph<'_>) -> Vec<FixedBitSet> {
    let n = cfg.blocks.len();
    // Exit blocks have no successors.
    let exits: Vec<BlockId> = cfg
        .blocks
        .iter()
        .map(|b| b.id)
        .filter(|&b| cfg.successors(b).next().is_none())
        .collect();

    let mut all = FixedBitSet::with_capacity(n);
    all.insert_range(..);
    let mut pdom: Vec<FixedBitSet> = vec![all; n];
    for &exit in &exits {
        let mut set = FixedBitSet::with_capacity(n);
        set.insert(exit.index());
        pdom[exit.index()] = set;
    }

    // Iterate in post-order-ish (reverse RPO) for fast convergence.
    let order: Vec<BlockId> = cfg.rpo.iter().rev().copied().collect();
    let exit_set: FxHashSet<BlockId> = exits.iter().copied().collect();
    let mut changed = true;
    while changed {
        changed = false;
        for &block in &order {
            if exit_set.contains(&block) {
                continue;
            }
            let mut new_set: Option<FixedBitSet> = None;
            for succ in cfg.successors(block) {
                let succ_pdom = &pdom[succ.target.index()];
                match &mut new_set {
                    None => new_set = Some(succ_pdom.clone()),
                    Some(set) => set.intersect_with(succ_pdom),
                }
            }
            let mut new_set = new_set.unwrap_or_else(|| FixedBitSet::with_capacity(n));
            new_set.insert(block.index());
            if new_set != pdom[block.index()] {
                pdom[block.index()] = new_set;
                changed = true;
            }
        }
    }
    pdom
}

#[cfg(test)]
#[path = "tests/dominator_tests.rs"]
mod tests;
