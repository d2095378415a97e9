//! Span-augmented probabilistic skip list, sorted by (score, member).
//!
//! This is the order index behind [`SortedSet`](crate::SortedSet). Every
//! forward pointer carries a span: the number of level-0 nodes it skips,
//! counting the destination. Summing spans along any descent from the
//! head sentinel to a node yields that node's 1-based rank, which is what
//! lets one structure answer both score-range and rank-range queries in
//! O(log n).
//!
//! Nodes live in an arena (`Vec` plus a free list) and link to each other
//! by slot id, so the whole structure is safe Rust. Slot 0 is the head
//! sentinel: it carries no entry, has the maximum number of levels, and
//! is never counted in `len`.
//!
//! Ranks are 1-based everywhere in this module; the façade converts to
//! the 0-based public convention.

use std::cmp::Ordering;
use std::fmt::{self, Write as _};
use std::hash::Hash;

use ahash::AHashMap;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::range::ScoreRange;
use crate::score::ScoreHandler;

/// Maximum node height. 2^32 expected elements is ample for an
/// in-memory index.
pub(crate) const MAX_LEVEL: usize = 32;

/// Probability that a new node grows one more level.
const P: f64 = 0.5;

/// Arena slot id. Slot `HEAD` is the sentinel.
pub(crate) type NodeId = u32;

const HEAD: NodeId = 0;

/// A member together with its score.
///
/// Range queries return these by value; they are snapshots, never
/// handles into the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<M, S> {
    /// The unique member.
    pub member: M,
    /// The score the member is ranked by.
    pub score: S,
}

/// One level of a node: forward link plus the number of level-0 nodes it
/// skips (counting the destination; 0 when there is no destination).
#[derive(Debug, Clone, Default)]
struct Level {
    forward: Option<NodeId>,
    span: usize,
}

struct Node<M, S> {
    /// `None` only on the head sentinel.
    entry: Option<Entry<M, S>>,
    levels: Vec<Level>,
    /// Level-0 predecessor; `None` on the first data node and the head.
    backward: Option<NodeId>,
}

impl<M, S> Node<M, S> {
    fn new(entry: Option<Entry<M, S>>, height: usize) -> Self {
        Self {
            entry,
            levels: vec![Level::default(); height],
            backward: None,
        }
    }
}

pub(crate) struct SkipList<M, S, H> {
    nodes: Vec<Node<M, S>>,
    /// Recycled arena slots.
    free: Vec<NodeId>,
    /// Last data node at level 0.
    tail: Option<NodeId>,
    /// Current height: the maximum height over all data nodes, at least 1.
    level: usize,
    /// Data node count (the sentinel is not counted).
    len: usize,
    handler: H,
    rng: SmallRng,
}

impl<M, S, H> SkipList<M, S, H>
where
    M: Ord,
    H: ScoreHandler<S>,
{
    pub(crate) fn new(handler: H) -> Self {
        Self::with_rng(handler, SmallRng::from_entropy())
    }

    /// Deterministic level sequence for a given seed.
    pub(crate) fn with_seed(handler: H, seed: u64) -> Self {
        Self::with_rng(handler, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(handler: H, rng: SmallRng) -> Self {
        Self {
            nodes: vec![Node::new(None, MAX_LEVEL)],
            free: Vec::new(),
            tail: None,
            level: 1,
            len: 0,
            handler,
            rng,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn handler(&self) -> &H {
        &self.handler
    }

    /// First data node, or `None` when empty.
    pub(crate) fn first(&self) -> Option<NodeId> {
        self.forward(HEAD, 0)
    }

    /// Last data node, or `None` when empty.
    pub(crate) fn last(&self) -> Option<NodeId> {
        self.tail
    }

    /// Level-0 successor.
    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        self.forward(id, 0)
    }

    /// Level-0 predecessor (`None` on the first data node).
    pub(crate) fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).backward
    }

    pub(crate) fn entry(&self, id: NodeId) -> &Entry<M, S> {
        self.node(id)
            .entry
            .as_ref()
            .expect("data node has an entry")
    }

    /// Ascending level-0 walk.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry<M, S>> + '_ {
        std::iter::successors(self.first(), move |&id| self.next(id))
            .map(move |id| self.entry(id))
    }

    // ---------------------------------------------------------------- walk

    fn node(&self, id: NodeId) -> &Node<M, S> {
        &self.nodes[id as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<M, S> {
        &mut self.nodes[id as usize]
    }

    fn forward(&self, id: NodeId, level: usize) -> Option<NodeId> {
        self.node(id).levels[level].forward
    }

    fn span(&self, id: NodeId, level: usize) -> usize {
        self.node(id).levels[level].span
    }

    fn level_mut(&mut self, id: NodeId, level: usize) -> &mut Level {
        &mut self.nodes[id as usize].levels[level]
    }

    /// Composite order: score via the handler, ties broken by member.
    fn key_cmp(&self, id: NodeId, score: &S, member: &M) -> Ordering {
        let e = self.entry(id);
        self.handler
            .cmp(&e.score, score)
            .then_with(|| e.member.cmp(member))
    }

    /// Geometric draw in `[1, MAX_LEVEL]`.
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.gen::<f64>() < P {
            level += 1;
        }
        level
    }

    fn alloc(&mut self, node: Node<M, S>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id as usize] = node;
                id
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as NodeId
            }
        }
    }

    // -------------------------------------------------------------- insert

    /// Inserts a new (score, member) node.
    ///
    /// The caller guarantees the member is not already present; duplicate
    /// detection belongs to the membership map, not the list.
    pub(crate) fn insert(&mut self, score: S, member: M) -> NodeId {
        let new_level = self.random_level();

        // Scratch sized to exactly what this insert can touch.
        let touched = new_level.max(self.level);
        let mut update = vec![HEAD; touched];
        let mut rank = vec![0usize; touched];

        let mut node = HEAD;
        for i in (0..self.level).rev() {
            // Resume from the rank accumulated one level up.
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.forward(node, i) {
                if self.key_cmp(next, &score, &member) == Ordering::Less {
                    rank[i] += self.span(node, i);
                    node = next;
                } else {
                    break;
                }
            }
            update[i] = node;
        }

        if new_level > self.level {
            for i in self.level..new_level {
                rank[i] = 0;
                update[i] = HEAD;
            }
            self.level = new_level;
        }

        let new_id = self.alloc(Node::new(Some(Entry { member, score }), new_level));

        for i in 0..new_level {
            let u = update[i];
            let u_forward = self.forward(u, i);
            let u_span = self.span(u, i);
            // rank[0] is the new node's immediate predecessor's rank;
            // the old span splits into predecessor→new and new→successor.
            let before = rank[0] - rank[i];
            {
                let lvl = self.level_mut(new_id, i);
                lvl.forward = u_forward;
                lvl.span = if u_forward.is_some() { u_span - before } else { 0 };
            }
            let lvl = self.level_mut(u, i);
            lvl.forward = Some(new_id);
            lvl.span = before + 1;
        }

        // Nodes taller than the new one now skip one more element.
        for i in new_level..self.level {
            let u = update[i];
            if self.forward(u, i).is_some() {
                self.level_mut(u, i).span += 1;
            }
        }

        self.node_mut(new_id).backward = (update[0] != HEAD).then_some(update[0]);
        match self.forward(new_id, 0) {
            Some(next) => self.node_mut(next).backward = Some(new_id),
            None => self.tail = Some(new_id),
        }

        self.len += 1;
        new_id
    }

    // -------------------------------------------------------------- delete

    /// Deletes the node matching both score and member. Returns whether a
    /// match was found.
    pub(crate) fn delete(&mut self, score: &S, member: &M) -> bool {
        let mut update = vec![HEAD; self.level];

        let mut node = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(node, i) {
                if self.key_cmp(next, score, member) == Ordering::Less {
                    node = next;
                } else {
                    break;
                }
            }
            update[i] = node;
        }

        // Scores repeat; the candidate must match on both coordinates.
        match self.forward(node, 0) {
            Some(target) if self.key_cmp(target, score, member) == Ordering::Equal => {
                self.unlink(target, &update);
                true
            }
            _ => false,
        }
    }

    /// Unsplices `id` using the predecessors captured by the caller's
    /// walk, then recycles its slot and returns its entry.
    ///
    /// `update` stays valid for deleting a run of consecutive nodes
    /// starting at `id`, which is what the range deletions rely on.
    fn unlink(&mut self, id: NodeId, update: &[NodeId]) -> Entry<M, S> {
        for i in 0..self.level {
            let u = update[i];
            if self.forward(u, i) == Some(id) {
                let d_forward = self.forward(id, i);
                let d_span = self.span(id, i);
                let lvl = self.level_mut(u, i);
                lvl.forward = d_forward;
                lvl.span = if d_forward.is_some() {
                    lvl.span + d_span - 1
                } else {
                    0
                };
            } else if self.forward(u, i).is_some() {
                // Taller predecessor skipping over the deleted node.
                self.level_mut(u, i).span -= 1;
            }
        }

        let backward = self.node(id).backward;
        match self.forward(id, 0) {
            Some(next) => self.node_mut(next).backward = backward,
            None => self.tail = backward,
        }

        while self.level > 1 && self.forward(HEAD, self.level - 1).is_none() {
            self.level -= 1;
        }
        self.len -= 1;

        let node = self.node_mut(id);
        node.levels = Vec::new();
        node.backward = None;
        let entry = node.entry.take().expect("unlinked a data node");
        self.free.push(id);
        entry
    }

    // -------------------------------------------------------------- ranges

    /// Whether `score` clears the range's lower bound.
    pub(crate) fn score_gte_min(&self, score: &S, range: &ScoreRange<S>) -> bool {
        match self.handler.cmp(score, &range.min) {
            Ordering::Less => false,
            Ordering::Equal => !range.min_exclusive,
            Ordering::Greater => true,
        }
    }

    /// Whether `score` clears the range's upper bound.
    pub(crate) fn score_lte_max(&self, score: &S, range: &ScoreRange<S>) -> bool {
        match self.handler.cmp(score, &range.max) {
            Ordering::Less => true,
            Ordering::Equal => !range.max_exclusive,
            Ordering::Greater => false,
        }
    }

    fn range_empty(&self, range: &ScoreRange<S>) -> bool {
        match self.handler.cmp(&range.min, &range.max) {
            Ordering::Greater => true,
            Ordering::Equal => range.min_exclusive || range.max_exclusive,
            Ordering::Less => false,
        }
    }

    /// Whether any part of the list's score span intersects `range`.
    /// True does not imply a node actually falls inside.
    fn intersects(&self, range: &ScoreRange<S>) -> bool {
        if self.range_empty(range) {
            return false;
        }
        let Some(tail) = self.tail else {
            return false;
        };
        if !self.score_gte_min(&self.entry(tail).score, range) {
            return false;
        }
        let Some(first) = self.first() else {
            return false;
        };
        self.score_lte_max(&self.entry(first).score, range)
    }

    /// First node inside `range`, or `None`.
    pub(crate) fn first_in_range(&self, range: &ScoreRange<S>) -> Option<NodeId> {
        if !self.intersects(range) {
            return None;
        }

        // Descend while the successor is still below the lower bound.
        let mut node = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(node, i) {
                if !self.score_gte_min(&self.entry(next).score, range) {
                    node = next;
                } else {
                    break;
                }
            }
        }

        let candidate = self.forward(node, 0)?;
        self.score_lte_max(&self.entry(candidate).score, range)
            .then_some(candidate)
    }

    /// Last node inside `range`, or `None`.
    pub(crate) fn last_in_range(&self, range: &ScoreRange<S>) -> Option<NodeId> {
        if !self.intersects(range) {
            return None;
        }

        // Descend while the successor still clears the upper bound.
        let mut node = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(node, i) {
                if self.score_lte_max(&self.entry(next).score, range) {
                    node = next;
                } else {
                    break;
                }
            }
        }

        if node == HEAD {
            return None;
        }
        self.score_gte_min(&self.entry(node).score, range)
            .then_some(node)
    }

    /// Deletes every node whose score falls in `range`, removing the
    /// members from `dict` as well. Returns the count removed.
    pub(crate) fn delete_range_by_score(
        &mut self,
        range: &ScoreRange<S>,
        dict: &mut AHashMap<M, S>,
    ) -> usize
    where
        M: Hash,
    {
        let mut update = vec![HEAD; self.level];

        let mut node = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(node, i) {
                if !self.score_gte_min(&self.entry(next).score, range) {
                    node = next;
                } else {
                    break;
                }
            }
            update[i] = node;
        }

        let mut removed = 0;
        let mut cursor = self.forward(node, 0);
        while let Some(id) = cursor {
            if !self.score_lte_max(&self.entry(id).score, range) {
                break;
            }
            cursor = self.forward(id, 0);
            let entry = self.unlink(id, &update);
            dict.remove(&entry.member);
            removed += 1;
        }
        removed
    }

    /// Deletes every node whose 1-based rank lies in `[start, end]`,
    /// removing the members from `dict` as well. Returns the count
    /// removed.
    pub(crate) fn delete_range_by_rank(
        &mut self,
        start: usize,
        end: usize,
        dict: &mut AHashMap<M, S>,
    ) -> usize
    where
        M: Hash,
    {
        let mut update = vec![HEAD; self.level];
        let mut traversed = 0;

        let mut node = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(node, i) {
                if traversed + self.span(node, i) < start {
                    traversed += self.span(node, i);
                    node = next;
                } else {
                    break;
                }
            }
            update[i] = node;
        }

        // `node` is the last one ranked below `start`.
        traversed += 1;

        let mut removed = 0;
        let mut cursor = self.forward(node, 0);
        while let Some(id) = cursor {
            if traversed > end {
                break;
            }
            cursor = self.forward(id, 0);
            let entry = self.unlink(id, &update);
            dict.remove(&entry.member);
            removed += 1;
            traversed += 1;
        }
        removed
    }

    // ---------------------------------------------------------------- rank

    /// 1-based rank of the node matching (score, member), or 0 when absent.
    ///
    /// `score` must be the member's stored score (the façade reads it
    /// from the membership map). The walk advances through equal keys as
    /// well, so when the node exists the cursor lands on it — possibly
    /// already at an upper level, in which case the accumulated rank is
    /// returned without descending further.
    pub(crate) fn rank_of(&self, score: &S, member: &M) -> usize {
        let mut rank = 0;
        let mut node = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(node, i) {
                if self.key_cmp(next, score, member) != Ordering::Greater {
                    rank += self.span(node, i);
                    node = next;
                } else {
                    break;
                }
            }

            if node != HEAD && self.entry(node).member == *member {
                return rank;
            }
        }
        0
    }

    /// Node at the given 1-based rank, or `None` when out of bounds.
    pub(crate) fn get_by_rank(&self, rank: usize) -> Option<NodeId> {
        if rank == 0 {
            return None;
        }
        let mut traversed = 0;
        let mut node = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(node, i) {
                if traversed + self.span(node, i) <= rank {
                    traversed += self.span(node, i);
                    node = next;
                } else {
                    break;
                }
            }
            if traversed == rank {
                return Some(node);
            }
        }
        None
    }

    // ---------------------------------------------------------------- dump

    /// Renders the level-0 sequence, one `{rank:i, obj:m, score:s}` line
    /// per node. Diagnostic only.
    pub(crate) fn dump(&self) -> String
    where
        M: fmt::Debug,
        S: fmt::Debug,
    {
        let mut out = String::new();
        for (rank, entry) in self.iter().enumerate() {
            let _ = writeln!(
                out,
                "{{rank:{rank}, obj:{:?}, score:{:?}}}",
                entry.member, entry.score
            );
        }
        out
    }
}
