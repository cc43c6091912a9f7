//! Design/background partition of the grid and block slicing of operators.
//!
//! A design mask splits the flattened index space into the design indices
//! (mask `true`) and the background indices (mask `false`). Relative to that
//! split the Maxwell operator decomposes as
//!
//! $$
//! M = \begin{pmatrix} A_{bb} & B_{bd} \\ C_{db} & D_{dd} \end{pmatrix}
//! $$
//!
//! where the subscripts name the row and column sets. Note the block named
//! `A` acts on the *background*; the design cells sit in block `D`.

use crate::solver::SolverError;
use crate::sparse::{self, SparseOperator};
use crate::types::BoolGrid;

/// Ascending index lists for the design and background cells of a mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignPartition {
    /// Flattened indices where the mask is `true`.
    pub design: Vec<usize>,
    /// Flattened indices where the mask is `false`.
    pub background: Vec<usize>,
}

impl DesignPartition {
    /// Split a mask, scanning cells in row-major order.
    pub fn from_mask(mask: &BoolGrid) -> Self {
        let mut design = Vec::new();
        let mut background = Vec::new();
        for (index, &is_design) in mask.iter().enumerate() {
            if is_design {
                design.push(index);
            } else {
                background.push(index);
            }
        }
        Self { design, background }
    }

    /// Total number of cells covered by the partition.
    pub fn len(&self) -> usize {
        self.design.len() + self.background.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_design(&self) -> usize {
        self.design.len()
    }

    pub fn num_background(&self) -> usize {
        self.background.len()
    }
}

/// The four sub-blocks of an operator under a [`DesignPartition`].
#[derive(Debug, Clone)]
pub struct BlockPartition {
    /// Background rows, background columns.
    pub a_bb: SparseOperator,
    /// Background rows, design columns.
    pub b_bd: SparseOperator,
    /// Design rows, background columns.
    pub c_db: SparseOperator,
    /// Design rows, design columns.
    pub d_dd: SparseOperator,
}

#[derive(Clone, Copy)]
enum Slot {
    Design(usize),
    Background(usize),
}

impl BlockPartition {
    /// Slice `operator` into its four blocks in one pass over its entries.
    ///
    /// # Panics
    /// Panics if the operator is not square with dimension `partition.len()`.
    pub fn extract(operator: &SparseOperator, partition: &DesignPartition) -> Result<Self, SolverError> {
        let n = partition.len();
        assert_eq!(
            (operator.nrows(), operator.ncols()),
            (n, n),
            "Operator dimension must match the partition"
        );

        // Global index -> position within its own block
        let mut slots = vec![Slot::Background(0); n];
        for (local, &global) in partition.design.iter().enumerate() {
            slots[global] = Slot::Design(local);
        }
        for (local, &global) in partition.background.iter().enumerate() {
            slots[global] = Slot::Background(local);
        }

        let (mut bb, mut bd, mut db, mut dd) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for (i, j, v) in sparse::triplets(operator) {
            match (slots[i], slots[j]) {
                (Slot::Background(r), Slot::Background(c)) => bb.push((r, c, v)),
                (Slot::Background(r), Slot::Design(c)) => bd.push((r, c, v)),
                (Slot::Design(r), Slot::Background(c)) => db.push((r, c, v)),
                (Slot::Design(r), Slot::Design(c)) => dd.push((r, c, v)),
            }
        }

        let (nd, nb) = (partition.num_design(), partition.num_background());
        Ok(Self {
            a_bb: sparse::from_triplets(nb, nb, &bb)?,
            b_bd: sparse::from_triplets(nb, nd, &bd)?,
            c_db: sparse::from_triplets(nd, nb, &db)?,
            d_dd: sparse::from_triplets(nd, nd, &dd)?,
        })
    }
}
