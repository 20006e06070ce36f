//! Connected component maxima and zero/non-zero index sets.

use super::{NumericArray, Operand};
use crate::element::{Element, RealElement};
use crate::error::{ArrayError, Result};
use log::debug;
use std::collections::VecDeque;

/// Offsets of the 8 neighbours of a grid cell.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Index of the maximum of every 8-connected component of non-zero cells in
/// a row-major `height` x `width` grid.
///
/// Components are discovered in row-major order of their first cell and
/// explored breadth first; ties keep the first cell reached.
fn component_maxima<T: RealElement>(data: &[T], height: usize, width: usize) -> Vec<usize> {
    let mut visited = vec![false; data.len()];
    let mut maxima = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..data.len() {
        if visited[start] || data[start].is_approx_zero() {
            continue;
        }

        visited[start] = true;
        queue.push_back(start);
        let mut best = start;

        while let Some(index) = queue.pop_front() {
            if data[index] > data[best] {
                best = index;
            }

            let row = (index / width) as isize;
            let col = (index % width) as isize;
            for (dr, dc) in NEIGHBOURS {
                let (r, c) = (row + dr, col + dc);
                if r < 0 || c < 0 || r >= height as isize || c >= width as isize {
                    continue;
                }
                let neighbour = r as usize * width + c as usize;
                if !visited[neighbour] && !data[neighbour].is_approx_zero() {
                    visited[neighbour] = true;
                    queue.push_back(neighbour);
                }
            }
        }

        maxima.push(best);
    }

    maxima
}

fn components_max_operand<T: RealElement>(operand: Operand<'_, T>) -> Result<NumericArray<T>> {
    if operand.is_empty() {
        return Err(ArrayError::empty("connected_components_max"));
    }

    let (height, width) = operand.shape();
    let maxima = component_maxima(operand.as_slice(), height, width);
    debug!("found {} connected components in {height}x{width} grid", maxima.len());

    let kept: Vec<(usize, T)> = maxima
        .into_iter()
        .map(|index| (index, operand.as_slice()[index]))
        .collect();

    let mut out = match operand {
        Operand::Owned(mut array) => {
            array.as_mut_slice().fill(T::zero());
            array
        }
        Operand::Borrowed(view) => {
            NumericArray::new(height, width)?.with_parallelism(view.parallelism())
        }
    };
    for (index, value) in kept {
        out[index] = value;
    }
    Ok(out)
}

impl<T: RealElement> NumericArray<T> {
    /// Keep only the maximum of each 8-connected component of non-zero
    /// entries, zeroing everything else.
    pub fn connected_components_max(&self) -> Result<Self> {
        components_max_operand(self.into())
    }

    pub fn into_connected_components_max(self) -> Result<Self> {
        components_max_operand(self.into())
    }
}

impl<T: Element> NumericArray<T> {
    /// Sorted indices of the entries that are not approximately zero.
    pub fn non_zero_indices(&self) -> Vec<usize> {
        self.indices_where(|value| !value.is_approx_zero())
    }

    /// Sorted indices of the approximately zero entries.
    pub fn zero_indices(&self) -> Vec<usize> {
        self.indices_where(|value| value.is_approx_zero())
    }

    fn indices_where(&self, predicate: impl Fn(T) -> bool) -> Vec<usize> {
        self.as_slice()
            .iter()
            .enumerate()
            .filter(|(_, &value)| predicate(value))
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    #[test]
    fn test_two_blobs_keep_their_maxima() {
        let mut grid = NumericArray::<f64>::new(5, 5).unwrap();
        grid[(0, 0)] = 3.0;
        grid[(0, 1)] = 5.0;
        grid[(4, 4)] = 7.0;

        let maxima = grid.connected_components_max().unwrap();
        assert_eq!(maxima.non_zero_indices(), vec![1, 24]);
        assert_eq!(maxima[(0, 1)], 5.0);
        assert_eq!(maxima[(4, 4)], 7.0);
    }

    #[test]
    fn test_diagonal_cells_are_connected() {
        let mut grid = NumericArray::<f64>::new(3, 3).unwrap();
        grid[(0, 0)] = 1.0;
        grid[(1, 1)] = 2.0;
        grid[(2, 2)] = 4.0;
        grid[(0, 2)] = 3.0;

        let maxima = grid.into_connected_components_max().unwrap();
        assert_eq!(maxima.non_zero_indices(), vec![8]);
    }

    #[test]
    fn test_ties_keep_first_reached() {
        let grid = NumericArray::from_slice(&[2.0f64, 2.0, 0.0, 0.0], 2, 2).unwrap();
        let maxima = grid.connected_components_max().unwrap();
        assert_eq!(maxima.as_slice(), &[2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_index_sets_partition_range() {
        let mut rng = StdRng::seed_from_u64(41);
        let values: Vec<f64> = (0..400)
            .map(|_| if rng.gen_bool(0.4) { 0.0 } else { rng.gen_range(-1.0..1.0) })
            .collect();
        let array = NumericArray::from_slice(&values, 20, 20).unwrap();

        let non_zero: BTreeSet<usize> = array.non_zero_indices().into_iter().collect();
        let zero: BTreeSet<usize> = array.zero_indices().into_iter().collect();

        assert!(non_zero.is_disjoint(&zero));
        let union: Vec<usize> = non_zero.union(&zero).copied().collect();
        assert_eq!(union, (0..400).collect::<Vec<_>>());
        assert_eq!(non_zero.len(), array.non_zero_amount().unwrap());
    }
}
