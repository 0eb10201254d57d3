//! # aig-rs: And-Inverter Graphs in Rust
//!
//! **`aig-rs`** is a safe, manager-centric library for working with **And-Inverter Graphs (AIGs)**:
//! DAG representations of Boolean functions whose only operators are AND and complementation.
//! It is designed as the expression core of verification and model-checking tooling.
//!
//! ## What is an AIG?
//!
//! An And-Inverter Graph represents a Boolean function as a DAG of two-input AND gates
//! whose edges may be complemented. Negation is free --- it is a sign bit carried in the
//! reference, not a node --- and structurally identical sub-expressions are shared.
//! This makes AIGs a compact, cheap-to-build intermediate form for CNF encoding and
//! time frame expansion.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All operations go through the [`Aig`][crate::aig::Aig] manager.
//!   This ensures structural sharing (hash consing) and a fixed local simplification ruleset.
//! - **Signed References**: Lightweight [`Ref`][crate::reference::Ref] handles carry the
//!   complementation bit, so a literal and its negation share one allocation.
//! - **Explicit Reference Counting**: Nodes are released eagerly and storage is recycled;
//!   [`inc`][crate::aig::Aig::inc]/[`dec`][crate::aig::Aig::dec] make ownership explicit.
//! - **Substitution & Time Shift**: Memoized, canonicalizing replacement of variable leaves
//!   by arbitrary AIGs, and whole-graph time-slice shifting for unrolling sequential systems.
//! - **Tseitin Indices**: Persistent node numbering compatible with DIMACS and AIGER
//!   literal encodings.
//!
//! ## Basic Usage
//!
//! ```rust
//! use aig_rs::aig::Aig;
//!
//! // 1. Initialize the manager
//! let aig = Aig::default();
//!
//! // 2. Create variables (external id, time slice)
//! let x = aig.mk_var(1, 0);
//! let y = aig.mk_var(2, 0);
//!
//! // 3. Build a formula: f = x AND (NOT y)
//! // Note: We use the manager to perform operations!
//! let f = aig.mk_and(x, -y);
//!
//! // 4. Structural sharing: the same expression is the same node
//! assert_eq!(f, aig.mk_and(-y, x));
//!
//! // 5. Number the nodes for CNF export
//! aig.assign_indices(f);
//! assert_eq!(aig.int_index(f), 4);
//! ```
//!
//! ## Core Components
//!
//! - **[`aig`]**: The heart of the library. Contains the [`Aig`][crate::aig::Aig] manager,
//!   the canonical builder, substitution, time shift, and the indexer.
//! - **[`reference`]**: The signed node reference type.
//! - **[`eval`]**: Operator sugar and semantic evaluation under a variable environment.

pub mod aig;
pub mod eval;
pub mod node;
pub mod reference;
pub mod table;
pub mod utils;
