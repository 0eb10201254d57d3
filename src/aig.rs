use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Debug;

use log::debug;

use crate::node::Node;
use crate::reference::Ref;
use crate::table::Table;

/// The And-Inverter Graph manager.
///
/// All nodes live in the manager and all operations go through it, which
/// guarantees structural sharing (hash consing): building the same
/// expression twice yields the same node. There are exactly two node kinds,
/// variables and AND gates; every other connective is derived from AND and
/// negation, and negation is free (it lives in the sign of a [`Ref`]).
///
/// # References
///
/// Nodes are reference counted. Operations documented as returning a *new
/// reference* obligate the caller to eventually [`dec`][Aig::dec] the
/// result; operations returning a *shared reference* (negation via `-`,
/// [`Ref::strip`], [`child`][Aig::child]) impose no additional obligation.
/// The FALSE constant is owned by the manager: [`inc`][Aig::inc] and
/// [`dec`][Aig::dec] on it are no-ops and it is never released.
///
/// # Examples
///
/// ```
/// use aig_rs::aig::Aig;
///
/// let aig = Aig::default();
/// let x = aig.mk_var(1, 0);
/// let y = aig.mk_var(2, 0);
/// let f = aig.mk_and(x, -y);
/// assert_eq!(f, aig.mk_and(-y, x));
/// assert_eq!(aig.mk_and(f, -f), aig.mk_false());
/// ```
pub struct Aig {
    storage: RefCell<Table<Node>>,
    assignments: RefCell<HashMap<usize, Ref>>,
    indices: RefCell<HashMap<usize, u32>>,
    next_index: Cell<u32>,
    pub zero: Ref,
    pub one: Ref,
}

impl Aig {
    /// Create a new manager with storage for `2^storage_bits` nodes.
    pub fn new(storage_bits: usize) -> Self {
        assert!(
            storage_bits <= 31,
            "Storage bits should be in the range 0..=31"
        );

        let mut storage = Table::new(storage_bits);

        // Allocate the constant node:
        let constant = storage.alloc();
        assert_eq!(constant, 1); // Make sure the constant node is (1).
        let zero = Ref::positive(constant as u32);
        let one = -zero;

        Self {
            storage: RefCell::new(storage),
            assignments: RefCell::new(HashMap::new()),
            indices: RefCell::new(HashMap::new()),
            next_index: Cell::new(1),
            zero,
            one,
        }
    }
}

impl Default for Aig {
    fn default() -> Self {
        Aig::new(20)
    }
}

impl Debug for Aig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Aig")
            .field("capacity", &storage.capacity())
            .field("size", &storage.size())
            .field("live", &self.current_nodes())
            .finish()
    }
}

impl Aig {
    /// Get the node referenced by the given index.
    pub fn node(&self, index: usize) -> Node {
        *self.storage.borrow().value(index)
    }

    pub fn is_false(&self, f: Ref) -> bool {
        f == self.zero
    }
    pub fn is_true(&self, f: Ref) -> bool {
        f == self.one
    }
    pub fn is_constant(&self, f: Ref) -> bool {
        f.index() == self.zero.index()
    }
    pub fn is_var(&self, f: Ref) -> bool {
        matches!(self.node(f.index()), Node::Var { .. })
    }
    pub fn is_and(&self, f: Ref) -> bool {
        matches!(self.node(f.index()), Node::And { .. })
    }

    /// Get the external identifier of a variable node.
    pub fn var_id(&self, f: Ref) -> u32 {
        match self.node(f.index()) {
            Node::Var { var, .. } => var,
            _ => panic!("Node {} is not a variable", f),
        }
    }

    /// Get the time slice of a variable node.
    pub fn var_slice(&self, f: Ref) -> i32 {
        match self.node(f.index()) {
            Node::Var { slice, .. } => slice,
            _ => panic!("Node {} is not a variable", f),
        }
    }

    /// Get a child of an AND node (shared reference).
    ///
    /// `f` must be an unsigned reference to an AND node, and `pos` must be
    /// 0 (left) or 1 (right).
    pub fn child(&self, f: Ref, pos: usize) -> Ref {
        assert!(!f.is_negated(), "Reference {} is negated", f);
        assert!(pos <= 1, "Child position {} is out of range", pos);
        match self.node(f.index()) {
            Node::And { left, right } => {
                if pos == 0 {
                    left
                } else {
                    right
                }
            }
            _ => panic!("Node {} is not an AND", f),
        }
    }

    /// The number of nodes currently alive, excluding the constant.
    pub fn current_nodes(&self) -> usize {
        self.storage.borrow().real_size() - 1
    }

    /// Get the reference count of the referenced node.
    /// The constant has no meaningful count and reports 0.
    pub fn ref_count(&self, f: Ref) -> u32 {
        if self.is_constant(f) {
            return 0;
        }
        self.storage.borrow().ref_count(f.index())
    }

    /// Take a new reference to the given node and return it.
    pub fn inc(&self, f: Ref) -> Ref {
        if !self.is_constant(f) {
            self.storage.borrow_mut().inc_ref(f.index());
        }
        f
    }

    /// Release a reference to the given node.
    ///
    /// When the count of a node drops to zero, the node is removed from the
    /// hash table, its storage is released, and the references it held on
    /// its AND children are released in turn. Releasing a reference that
    /// was never taken is a usage error and panics.
    pub fn dec(&self, f: Ref) {
        let mut pending = vec![f.index()];
        while let Some(index) = pending.pop() {
            if index == self.zero.index() {
                continue;
            }
            let mut storage = self.storage.borrow_mut();
            if storage.dec_ref(index) == 0 {
                let node = *storage.value(index);
                storage.remove(index);
                if let Node::And { left, right } = node {
                    pending.push(left.index());
                    pending.push(right.index());
                }
            }
        }
    }
}

impl Aig {
    /// The FALSE constant (shared reference).
    pub fn mk_false(&self) -> Ref {
        self.zero
    }

    /// The TRUE constant, which is the negation of FALSE (shared reference).
    pub fn mk_true(&self) -> Ref {
        self.one
    }

    /// Get or create the variable node for the pair `(var, slice)`.
    ///
    /// Repeated calls with the same pair return the same node. The `slice`
    /// tags a copy of the variable at a discrete time step, for unrolling
    /// sequential systems; purely combinational problems use slice 0.
    /// Returns a new reference.
    pub fn mk_var(&self, var: u32, slice: i32) -> Ref {
        debug!("mk_var(var = {}, slice = {})", var, slice);

        let (index, _) = self.storage.borrow_mut().put(Node::Var { var, slice });
        self.inc(Ref::positive(index as u32))
    }

    /// Get or create the AND of `a` and `b`. Returns a new reference.
    ///
    /// The operation simplifies before consing:
    ///
    /// ```text
    /// and(x, false) = false
    /// and(x, true)  = x
    /// and(x, x)     = x
    /// and(x, ~x)    = false
    /// ```
    ///
    /// Otherwise the operands are put in canonical order, so `and(a, b)`
    /// and `and(b, a)` resolve to one physical node.
    pub fn mk_and(&self, a: Ref, b: Ref) -> Ref {
        debug!("mk_and(a = {}, b = {})", a, b);

        if self.is_false(a) || self.is_false(b) {
            return self.zero;
        }
        if self.is_true(a) {
            return self.inc(b);
        }
        if self.is_true(b) {
            return self.inc(a);
        }
        if a == b {
            return self.inc(a);
        }
        if a == -b {
            return self.zero;
        }

        let (left, right) = if a.unsigned() <= b.unsigned() {
            (a, b)
        } else {
            (b, a)
        };

        let (index, created) = self.storage.borrow_mut().put(Node::And { left, right });
        if created {
            self.inc(left);
            self.inc(right);
        }
        self.inc(Ref::positive(index as u32))
    }

    /// `or(a, b) = ~and(~a, ~b)`. Returns a new reference.
    pub fn mk_or(&self, a: Ref, b: Ref) -> Ref {
        debug!("mk_or(a = {}, b = {})", a, b);
        -self.mk_and(-a, -b)
    }

    /// `implies(a, b) = ~and(a, ~b)`. Returns a new reference.
    pub fn mk_implies(&self, a: Ref, b: Ref) -> Ref {
        debug!("mk_implies(a = {}, b = {})", a, b);
        -self.mk_and(a, -b)
    }

    /// `xor(a, b) = or(and(a, ~b), and(~a, b))`. Returns a new reference.
    pub fn mk_xor(&self, a: Ref, b: Ref) -> Ref {
        debug!("mk_xor(a = {}, b = {})", a, b);
        let l = self.mk_and(a, -b);
        let r = self.mk_and(-a, b);
        let res = self.mk_or(l, r);
        self.dec(l);
        self.dec(r);
        res
    }

    /// `xnor(a, b) = ~xor(a, b)`. Returns a new reference.
    pub fn mk_xnor(&self, a: Ref, b: Ref) -> Ref {
        debug!("mk_xnor(a = {}, b = {})", a, b);
        -self.mk_xor(a, b)
    }

    /// `ite(c, t, e) = or(and(c, t), and(~c, e))`. Returns a new reference.
    ///
    /// Simplifies before building: a constant condition resolves
    /// immediately, `t == e` collapses to `t`, and `(t, e) = (true, false)`
    /// collapses to `c`.
    pub fn mk_ite(&self, c: Ref, t: Ref, e: Ref) -> Ref {
        debug!("mk_ite(c = {}, t = {}, e = {})", c, t, e);

        if self.is_true(c) {
            return self.inc(t);
        }
        if self.is_false(c) {
            return self.inc(e);
        }
        if t == e {
            return self.inc(t);
        }
        if self.is_true(t) && self.is_false(e) {
            return self.inc(c);
        }

        let l = self.mk_and(c, t);
        let r = self.mk_and(-c, e);
        let res = self.mk_or(l, r);
        self.dec(l);
        self.dec(r);
        res
    }
}

impl Aig {
    /// Record the assignment `lhs -> rhs` for the next
    /// [`substitute`][Aig::substitute] call.
    ///
    /// `lhs` must be an unsigned reference to a variable node. Re-assigning
    /// the same `lhs` before a substitution overwrites the previous mapping
    /// (last write wins). The manager holds a reference on both sides until
    /// the substitution consumes the table.
    ///
    /// The assignment graph must be acyclic: no `lhs` may be reachable from
    /// its own `rhs` through other assignments. Violating this is a caller
    /// bug and makes [`substitute`][Aig::substitute] diverge.
    pub fn assign(&self, lhs: Ref, rhs: Ref) {
        debug!("assign(lhs = {}, rhs = {})", lhs, rhs);

        assert!(!lhs.is_negated(), "Left-hand side {} is negated", lhs);
        assert!(self.is_var(lhs), "Left-hand side {} is not a variable", lhs);

        self.inc(lhs);
        self.inc(rhs);
        let old = self.assignments.borrow_mut().insert(lhs.index(), rhs);
        if let Some(old) = old {
            // Last write wins: release the holds of the overwritten mapping.
            self.dec(old);
            self.dec(lhs);
        }
    }

    /// Substitute the recorded assignments into the AIG rooted at `root`
    /// and return a new reference to the result.
    ///
    /// The substitution is performed recursively so that all left-hand
    /// sides are eliminated, including occurrences inside right-hand sides.
    /// The rebuild is memoized over node identity, so the work is linear in
    /// the size of the DAG. The assignment table is consumed: when this
    /// call returns, the table is empty.
    pub fn substitute(&self, root: Ref) -> Ref {
        debug!("substitute(root = {})", root);

        let map = self.assignments.take();
        let mut cache = HashMap::new();

        let image = self.substitute_(root.index(), &map, &mut cache);
        let res = self.inc(if root.is_negated() { -image } else { image });

        for (&lhs, &rhs) in map.iter() {
            self.dec(Ref::positive(lhs as u32));
            self.dec(rhs);
        }
        for &image in cache.values() {
            self.dec(image);
        }

        res
    }

    /// Rebuild the DAG under the unsigned node `index`, mapping assigned
    /// variables to the image of their right-hand side. Every cache entry
    /// holds one reference.
    fn substitute_(
        &self,
        index: usize,
        map: &HashMap<usize, Ref>,
        cache: &mut HashMap<usize, Ref>,
    ) -> Ref {
        if let Some(&res) = cache.get(&index) {
            return res;
        }

        let res = match self.node(index) {
            Node::False => self.zero,
            Node::Var { .. } => match map.get(&index) {
                Some(&rhs) => {
                    let image = self.substitute_(rhs.index(), map, cache);
                    self.inc(if rhs.is_negated() { -image } else { image })
                }
                None => self.inc(Ref::positive(index as u32)),
            },
            Node::And { left, right } => {
                let l = self.substitute_(left.index(), map, cache);
                let l = if left.is_negated() { -l } else { l };
                let r = self.substitute_(right.index(), map, cache);
                let r = if right.is_negated() { -r } else { r };
                self.mk_and(l, r)
            }
        };

        cache.insert(index, res);
        res
    }

    /// Replace every variable `(v, slice)` reachable from `root` by
    /// `(v, slice + delta)` and return a new reference to the result.
    ///
    /// Uses the same memoized, canonicalizing rebuild as
    /// [`substitute`][Aig::substitute], so equal shifts of equal inputs
    /// stay structurally equal.
    pub fn shift(&self, root: Ref, delta: i32) -> Ref {
        debug!("shift(root = {}, delta = {})", root, delta);

        let mut cache = HashMap::new();
        let image = self.shift_(root.index(), delta, &mut cache);
        let res = self.inc(if root.is_negated() { -image } else { image });

        for &image in cache.values() {
            self.dec(image);
        }

        res
    }

    fn shift_(&self, index: usize, delta: i32, cache: &mut HashMap<usize, Ref>) -> Ref {
        if let Some(&res) = cache.get(&index) {
            return res;
        }

        let res = match self.node(index) {
            Node::False => self.zero,
            Node::Var { var, slice } => self.mk_var(var, slice + delta),
            Node::And { left, right } => {
                let l = self.shift_(left.index(), delta, cache);
                let l = if left.is_negated() { -l } else { l };
                let r = self.shift_(right.index(), delta, cache);
                let r = if right.is_negated() { -r } else { r };
                self.mk_and(l, r)
            }
        };

        cache.insert(index, res);
        res
    }
}

impl Aig {
    /// Assign Tseitin indices to every node reachable from `root` that does
    /// not have one yet.
    ///
    /// The traversal is post-order, left child before right child, parent
    /// after both children. The counter continues from the current maximum,
    /// so indices accumulate across calls until
    /// [`reset_indices`][Aig::reset_indices]. FALSE is permanently index 0.
    pub fn assign_indices(&self, root: Ref) {
        debug!("assign_indices(root = {})", root);
        self.assign_indices_(root.index());
    }

    fn assign_indices_(&self, index: usize) {
        if index == self.zero.index() {
            return;
        }
        if self.indices.borrow().contains_key(&index) {
            return;
        }

        if let Node::And { left, right } = self.node(index) {
            self.assign_indices_(left.index());
            self.assign_indices_(right.index());
        }

        let i = self.next_index.get();
        self.indices.borrow_mut().insert(index, i);
        self.next_index.set(i + 1);
    }

    /// Clear all Tseitin indices and reset the counter.
    pub fn reset_indices(&self) {
        debug!("reset_indices()");
        self.indices.borrow_mut().clear();
        self.next_index.set(1);
    }

    /// The Tseitin index of the referenced node (the sign is ignored).
    /// FALSE is always 0; any other node must have been indexed by a prior
    /// [`assign_indices`][Aig::assign_indices] call, otherwise this panics.
    pub fn index(&self, f: Ref) -> u32 {
        if self.is_constant(f) {
            return 0;
        }
        match self.indices.borrow().get(&f.index()) {
            Some(&i) => i,
            None => panic!("Node {} has no index assigned", f),
        }
    }

    /// The maximum Tseitin index assigned so far (0 if none).
    pub fn max_index(&self) -> u32 {
        self.next_index.get() - 1
    }

    /// The DIMACS-style literal of `f`: `index(strip(f)) + 1`, negated if
    /// `f` is negated. Never 0; FALSE is 1 and TRUE is -1.
    pub fn int_index(&self, f: Ref) -> i32 {
        let i = (self.index(f) + 1) as i32;
        if f.is_negated() {
            -i
        } else {
            i
        }
    }

    /// The AIGER-style literal of `f`: `2 * index(strip(f))`, plus 1 if `f`
    /// is negated. FALSE is 0 and TRUE is 1.
    pub fn unsigned_index(&self, f: Ref) -> u32 {
        2 * self.index(f) + f.is_negated() as u32
    }
}
