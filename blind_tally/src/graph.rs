//! The pairwise preference graph of an election.

use std::ops::{Index, IndexMut};

use log::debug;
use snafu::prelude::*;

use crate::config::*;

/// A square table indexed by candidate position.
///
/// As a pairwise matrix, `m[(i, j)]` is the number of counted ballots that prefer
/// candidate `i` over candidate `j`. The same shape holds the strongest paths
/// once closed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Matrix {
    size: usize,
    cells: Vec<i64>,
}

impl Matrix {
    /// An all-zero matrix for `size` candidates.
    pub fn new(size: usize) -> Matrix {
        Matrix {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Builds a matrix from its rows. Returns None if the rows do not form a square.
    pub fn from_rows(rows: &[Vec<i64>]) -> Option<Matrix> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Some(Matrix {
            size,
            cells: rows.concat(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> Vec<Vec<i64>> {
        self.cells
            .chunks(self.size.max(1))
            .take(self.size)
            .map(|r| r.to_vec())
            .collect()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = i64;
    fn index(&self, (i, j): (usize, usize)) -> &i64 {
        &self.cells[i * self.size + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut i64 {
        &mut self.cells[i * self.size + j]
    }
}

/// Adds the preferences expressed by one ballot to the pairwise matrix.
///
/// Unranked candidates (rank `<= 0`) are placed after every ranked candidate and
/// stay tied with each other. The matrix is left untouched if the ordering does
/// not have one rank per candidate.
pub fn accumulate(matrix: &mut Matrix, ballot: &Ballot) -> Result<(), TallyError> {
    let n = matrix.size();
    ensure!(
        ballot.ordering.len() == n,
        MalformedOrderingSnafu {
            voter: ballot.voter.clone(),
            expected: n,
            found: ballot.ordering.len(),
        }
    );

    let last = n as i64 + 1;
    let ranks: Vec<i64> = ballot
        .ordering
        .iter()
        .map(|&r| if r <= 0 { last } else { r as i64 })
        .collect();

    for (i, ri) in ranks.iter().enumerate() {
        for (j, rj) in ranks.iter().enumerate() {
            // Lower is better: first place beats second place.
            if ri < rj {
                matrix[(i, j)] += 1;
            }
        }
    }
    debug!("accumulate: voter {} ranks {:?}", ballot.voter, ranks);
    Ok(())
}
