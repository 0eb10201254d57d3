use crate::reference::Ref;
use crate::utils::{pairing3, MyHash};

/// An AIG node.
///
/// There are exactly two "real" node kinds, variables and AND gates, plus
/// the FALSE sentinel that every manager allocates once. TRUE is not a node:
/// it is the negation of FALSE, carried in the sign of a [`Ref`].
///
/// A variable is identified by the pair of an external identifier and an
/// integer time slice (for time frame expansion; purely combinational
/// problems use slice 0). An AND gate stores its two children in the
/// manager's canonical order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Node {
    False,
    Var { var: u32, slice: i32 },
    And { left: Ref, right: Ref },
}

#[allow(clippy::derivable_impls)]
impl Default for Node {
    fn default() -> Self {
        Node::False
    }
}

fn slice_code(slice: i32) -> u64 {
    ((slice.unsigned_abs() as u64) << 1) + (slice < 0) as u64
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        match *self {
            Node::False => 0,
            Node::Var { var, slice } => pairing3(1, var as u64, slice_code(slice)),
            Node::And { left, right } => {
                pairing3(2, left.unsigned() as u64, right.unsigned() as u64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_identity() {
        let a = Node::Var { var: 1, slice: 0 };
        let b = Node::Var { var: 1, slice: 0 };
        let c = Node::Var { var: 1, slice: 1 };
        let d = Node::Var { var: 2, slice: 0 };
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_hash_discriminates_slices() {
        let pos = Node::Var { var: 1, slice: 1 };
        let neg = Node::Var { var: 1, slice: -1 };
        assert_ne!(MyHash::hash(&pos), MyHash::hash(&neg));
    }

    #[test]
    fn test_hash_discriminates_signs() {
        let x = Ref::positive(2);
        let y = Ref::positive(3);
        let a = Node::And { left: x, right: y };
        let b = Node::And { left: -x, right: y };
        assert_ne!(MyHash::hash(&a), MyHash::hash(&b));
    }
}
