//! Graph-coloring register allocation.
//!
//! Chaitin-style "simple" coloring driven by a priority queue: the vertex
//! with the most forbidden colors is colored next, always with the smallest
//! color not forbidden for it.  There is no spilling decision here: a color
//! at or beyond the register budget *is* the spill decision, consumed by the
//! rewrite stage through [`RegisterMap`].  The algorithm is total: it never
//! fails, and for identical graph and tie-break order its output is
//! bit-identical across runs.

use crate::interference::InterfGraph;
use crate::tac::Ident;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

// ============================================================================
// Indexed max-heap priority queue
// ============================================================================

/// A max-priority queue supporting `inc_prio` on arbitrary keys.
///
/// A standard binary heap augmented with a key→heap-index side table that is
/// updated on every swap.  Priorities are `(prio, secondary)` pairs compared
/// lexicographically; the secondary component breaks ties deterministically.
pub struct PrioQueue<T> {
    heap: Vec<Entry<T>>,
    pos: HashMap<T, usize>,
}

struct Entry<T> {
    key: T,
    prio: usize,
    secondary: i64,
}

impl<T> Entry<T> {
    fn rank(&self) -> (usize, i64) {
        (self.prio, self.secondary)
    }
}

impl<T: Eq + Hash + Clone> PrioQueue<T> {
    pub fn new() -> Self {
        PrioQueue {
            heap: Vec::new(),
            pos: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Insert `key` with priority 0 and the given tie-break value.
    pub fn push(&mut self, key: T, secondary: i64) {
        let i = self.heap.len();
        self.pos.insert(key.clone(), i);
        self.heap.push(Entry {
            key,
            prio: 0,
            secondary,
        });
        self.sift_up(i);
    }

    /// Remove and return the key with the highest `(prio, secondary)` rank.
    pub fn pop(&mut self) -> Option<T> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let entry = self.heap.pop().expect("heap is non-empty");
        self.pos.remove(&entry.key);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(entry.key)
    }

    /// Increase the priority of `key` by one.  No-op for keys no longer in
    /// the queue.
    pub fn inc_prio(&mut self, key: &T) {
        if let Some(&i) = self.pos.get(key) {
            self.heap[i].prio += 1;
            self.sift_up(i);
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.pos.insert(self.heap[i].key.clone(), i);
        self.pos.insert(self.heap[j].key.clone(), j);
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.heap[parent].rank() >= self.heap[i].rank() {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let l = 2 * i + 1;
            let r = 2 * i + 2;
            let mut largest = i;
            if l < self.heap.len() && self.heap[l].rank() > self.heap[largest].rank() {
                largest = l;
            }
            if r < self.heap.len() && self.heap[r].rank() > self.heap[largest].rank() {
                largest = r;
            }
            if largest == i {
                return;
            }
            self.swap(i, largest);
            i = largest;
        }
    }
}

impl<T: Eq + Hash + Clone> Default for PrioQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Register map
// ============================================================================

/// The allocator's result: a color per identifier plus the register budget.
///
/// Colors `0..max_regs` map to the physical registers `$s0..`; colors at or
/// beyond the budget are spilled and resolve to `None`.
pub struct RegisterMap {
    colors: HashMap<Ident, usize>,
    max_regs: usize,
}

impl RegisterMap {
    pub fn new(colors: HashMap<Ident, usize>, max_regs: usize) -> Self {
        RegisterMap { colors, max_regs }
    }

    /// The register for `x` if it lives in a register, `None` if spilled
    /// (or unknown).
    pub fn resolve(&self, x: &Ident) -> Option<Ident> {
        let i = *self.colors.get(x)?;
        if i < self.max_regs {
            Some(Ident::new(format!("$s{i}")))
        } else {
            None
        }
    }

    /// The raw color assigned to `x`.
    pub fn color(&self, x: &Ident) -> Option<usize> {
        self.colors.get(x).copied()
    }

    pub fn max_regs(&self) -> usize {
        self.max_regs
    }
}

impl fmt::Display for RegisterMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut assigned: Vec<(&Ident, usize)> = self
            .colors
            .iter()
            .filter(|(_, &c)| c < self.max_regs)
            .map(|(x, &c)| (x, c))
            .collect();
        assigned.sort();
        write!(f, "RegisterMap(")?;
        for (i, (x, c)) in assigned.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{x}: $s{c}")?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// Coloring
// ============================================================================

/// The smallest non-negative color not forbidden for `x`.
fn choose_color(forbidden: &HashSet<usize>) -> usize {
    let mut c = 0;
    while forbidden.contains(&c) {
        c += 1;
    }
    c
}

/// Color an interference graph with at most `max_regs` physical registers.
///
/// `secondary_order` breaks priority ties; vertices absent from the map fall
/// back to their (negated) insertion position in the graph, so earlier
/// vertices win ties by default.  Identical graph and tie-break order give a
/// bit-identical result.
pub fn color_interf_graph(
    g: &InterfGraph,
    secondary_order: &HashMap<Ident, i64>,
    max_regs: usize,
) -> RegisterMap {
    debug!("coloring interference graph, max_regs={max_regs}");
    let mut colors: HashMap<Ident, usize> = HashMap::new();
    let mut forbidden: HashMap<Ident, HashSet<usize>> =
        g.vertices().map(|v| (v.clone(), HashSet::new())).collect();

    let mut q: PrioQueue<Ident> = PrioQueue::new();
    for (i, v) in g.vertices().enumerate() {
        let sec = secondary_order.get(v).copied().unwrap_or(-(i as i64));
        q.push(v.clone(), sec);
    }

    while let Some(u) = q.pop() {
        let color = choose_color(&forbidden[&u]);
        colors.insert(u.clone(), color);
        for v in g.succs(&u) {
            if colors.contains_key(v) {
                continue;
            }
            if let Some(f) = forbidden.get_mut(v) {
                f.insert(color);
                q.inc_prio(v);
            }
        }
    }

    let m = RegisterMap::new(colors, max_regs);
    debug!("register map: {m}");
    m
}
