//! Strongest paths between candidates (Schulze method).

use log::debug;

use crate::graph::Matrix;

/// Closes a pairwise matrix: drops the defeats, then computes the strength of the
/// strongest path between every ordered pair of candidates.
pub fn close(pairwise: &Matrix) -> Matrix {
    let filtered = defeat_filter(pairwise);
    let closure = strongest_paths(&filtered);
    debug!("close: closure: {:?}", closure.rows());
    closure
}

/// Keeps `m[i][j]` only where `i` beats or ties `j` head to head.
pub fn defeat_filter(pairwise: &Matrix) -> Matrix {
    let n = pairwise.size();
    let mut res = pairwise.clone();
    for i in 0..n {
        for j in 0..n {
            if pairwise[(i, j)] < pairwise[(j, i)] {
                res[(i, j)] = 0;
            }
        }
    }
    res
}

/// Widest path composition, without any filtering of the input.
///
/// The strength of a path is its weakest link, and `res[i][j]` is the strength of
/// the strongest path from `i` to `j`. The diagonal is left untouched.
pub fn strongest_paths(matrix: &Matrix) -> Matrix {
    let order: Vec<usize> = (0..matrix.size()).collect();
    strongest_paths_with_order(matrix, &order)
}

// The intermediates may be visited in any order, the closure is the same.
pub(crate) fn strongest_paths_with_order(matrix: &Matrix, intermediates: &[usize]) -> Matrix {
    let n = matrix.size();
    let mut res = matrix.clone();
    for &k in intermediates {
        for i in 0..n {
            if i == k {
                continue;
            }
            for j in 0..n {
                if j == i || j == k {
                    continue;
                }
                let through_k = res[(i, k)].min(res[(k, j)]);
                if through_k > res[(i, j)] {
                    res[(i, j)] = through_k;
                }
            }
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::pairwise_strategy;
    use proptest::prelude::*;

    #[test]
    fn defeats_are_dropped() {
        let m = Matrix::from_rows(&[vec![0, 2, 2], vec![1, 0, 2], vec![1, 1, 0]]).unwrap();
        let f = defeat_filter(&m);
        assert_eq!(f.rows(), vec![vec![0, 2, 2], vec![0, 0, 2], vec![0, 0, 0]]);
        assert_eq!(close(&m), f);
    }

    #[test]
    fn head_to_head_ties_are_kept_on_both_sides() {
        let m = Matrix::from_rows(&[vec![0, 3], vec![3, 0]]).unwrap();
        assert_eq!(close(&m), m);
    }

    #[test]
    fn cycle_goes_through_the_strongest_path() {
        // a > b by 8, b > c by 7, c > a by 6 (as filtered strengths).
        let m = Matrix::from_rows(&[vec![0, 8, 0], vec![0, 0, 7], vec![6, 0, 0]]).unwrap();
        let c = close(&m);
        assert_eq!(
            c.rows(),
            vec![vec![0, 8, 7], vec![6, 0, 7], vec![6, 6, 0]]
        );
    }

    #[test]
    fn wikipedia_example() {
        // The 5 candidates, 45 voters example of the Schulze method.
        let m = Matrix::from_rows(&[
            vec![0, 20, 26, 30, 22],
            vec![25, 0, 16, 33, 18],
            vec![19, 29, 0, 17, 24],
            vec![15, 12, 28, 0, 14],
            vec![23, 27, 21, 31, 0],
        ])
        .unwrap();
        let c = close(&m);
        assert_eq!(
            c.rows(),
            vec![
                vec![0, 28, 28, 30, 24],
                vec![25, 0, 28, 33, 24],
                vec![25, 29, 0, 29, 24],
                vec![25, 28, 28, 0, 24],
                vec![25, 28, 28, 31, 0],
            ]
        );
    }

    proptest! {
        #[test]
        fn closing_again_changes_nothing(m in pairwise_strategy(6)) {
            let c = close(&m);
            prop_assert_eq!(strongest_paths(&c), c);
        }

        #[test]
        fn order_of_intermediates_does_not_matter(
            m in pairwise_strategy(6),
            order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            let filtered = defeat_filter(&m);
            prop_assert_eq!(
                strongest_paths_with_order(&filtered, &order),
                strongest_paths(&filtered)
            );
        }
    }
}
