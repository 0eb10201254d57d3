use std::collections::HashMap;
use std::ops::{BitAnd, BitOr, BitXor, Rem};

use crate::aig::Aig;
use crate::node::Node;
use crate::reference::Ref;

pub struct AigAndOp {
    f: Ref,
    g: Ref,
}

impl BitAnd for Ref {
    type Output = AigAndOp;

    fn bitand(self, rhs: Self) -> Self::Output {
        AigAndOp { f: self, g: rhs }
    }
}

pub struct AigOrOp {
    f: Ref,
    g: Ref,
}

impl BitOr for Ref {
    type Output = AigOrOp;

    fn bitor(self, rhs: Self) -> Self::Output {
        AigOrOp { f: self, g: rhs }
    }
}

pub struct AigXorOp {
    f: Ref,
    g: Ref,
}

impl BitXor for Ref {
    type Output = AigXorOp;

    fn bitxor(self, rhs: Self) -> Self::Output {
        AigXorOp { f: self, g: rhs }
    }
}

pub struct AigXnorOp {
    f: Ref,
    g: Ref,
}

impl Rem for Ref {
    type Output = AigXnorOp;

    fn rem(self, rhs: Self) -> Self::Output {
        AigXnorOp { f: self, g: rhs }
    }
}

pub trait Eval {
    fn eval(&self, aig: &Aig) -> Ref;
}

impl Aig {
    pub fn eval(&self, value: impl Eval) -> Ref {
        value.eval(self)
    }
}

impl Eval for Ref {
    fn eval(&self, aig: &Aig) -> Ref {
        aig.inc(*self)
    }
}

impl Eval for AigAndOp {
    fn eval(&self, aig: &Aig) -> Ref {
        aig.mk_and(self.f, self.g)
    }
}

impl Eval for AigOrOp {
    fn eval(&self, aig: &Aig) -> Ref {
        aig.mk_or(self.f, self.g)
    }
}

impl Eval for AigXorOp {
    fn eval(&self, aig: &Aig) -> Ref {
        aig.mk_xor(self.f, self.g)
    }
}

impl Eval for AigXnorOp {
    fn eval(&self, aig: &Aig) -> Ref {
        aig.mk_xnor(self.f, self.g)
    }
}

impl Aig {
    /// Evaluate the Boolean function rooted at `f` under the given variable
    /// environment, mapping each `(var, slice)` pair to a truth value.
    ///
    /// Every variable reachable from `f` must be present in the
    /// environment; a missing variable panics. The evaluation is memoized
    /// over node identity, so shared substructure is visited once.
    pub fn evaluate(&self, f: Ref, env: &HashMap<(u32, i32), bool>) -> bool {
        let mut cache = HashMap::new();
        self.evaluate_(f.index(), env, &mut cache) != f.is_negated()
    }

    fn evaluate_(
        &self,
        index: usize,
        env: &HashMap<(u32, i32), bool>,
        cache: &mut HashMap<usize, bool>,
    ) -> bool {
        if let Some(&value) = cache.get(&index) {
            return value;
        }

        let value = match self.node(index) {
            Node::False => false,
            Node::Var { var, slice } => match env.get(&(var, slice)) {
                Some(&b) => b,
                None => panic!("No value for variable ({}, {})", var, slice),
            },
            Node::And { left, right } => {
                let l = self.evaluate_(left.index(), env, cache) != left.is_negated();
                let r = self.evaluate_(right.index(), env, cache) != right.is_negated();
                l && r
            }
        };

        cache.insert(index, value);
        value
    }
}
