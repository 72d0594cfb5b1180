//! In-place half transposes for the two-pass 2D FFT.
//!
//! A row FFT of real input is conjugate symmetric, so only columns
//! `0..n/2` have to survive into the column pass. These transposes move
//! exactly that half and clear the rest, which lets the second pass skip the
//! lower rows entirely. Both expect a square `n x n` view with `n` even.

use num_traits::Zero;

use crate::view::StridedViewMut;

fn half_side<T: Copy>(view: &StridedViewMut<'_, T>) -> usize {
    let n = view.width();
    assert_eq!(n, view.height(), "half transpose needs a square view");
    assert!(n % 2 == 0, "half transpose needs an even side, got {n}");
    n / 2
}

fn transpose_upper_left<T: Copy>(view: &mut StridedViewMut<'_, T>, h: usize) {
    for r in 0..h {
        for c in r + 1..h {
            view.swap((r, c), (c, r));
        }
    }
}

/// Left half `[0..n, 0..n/2]` becomes the transposed upper half
/// `[0..n/2, 0..n]`; rows `n/2..n` are zeroed.
///
/// Row `j` of the result holds column `j` of the input.
pub fn transpose_square_left_half_up<T: Copy + Zero>(view: &mut StridedViewMut<'_, T>) {
    let h = half_side(view);
    transpose_upper_left(view, h);
    for i in 0..h {
        for j in 0..h {
            let v = view.get(h + i, j);
            view.set(j, h + i, v);
        }
    }
    view.fill_block(h, 0, 2 * h, h, T::zero());
}

/// Upper half `[0..n/2, 0..n]` becomes the transposed left half
/// `[0..n, 0..n/2]`; columns `n/2..n` are zeroed.
///
/// Column `j` of the result holds row `j` of the input.
pub fn transpose_square_upper_half_back<T: Copy + Zero>(view: &mut StridedViewMut<'_, T>) {
    let h = half_side(view);
    transpose_upper_left(view, h);
    for i in 0..h {
        for j in 0..h {
            let v = view.get(j, h + i);
            view.set(h + i, j, v);
        }
    }
    view.fill_block(0, h, h, 2 * h, T::zero());
}

#[cfg(test)]
mod tests {
    use super::*;

    // Value encodes its original position: row * 10 + col, offset by 1 so
    // zero marks a cleared cell.
    fn numbered(n: usize, stride: usize) -> Vec<u32> {
        let mut data = vec![999u32; n * stride];
        for r in 0..n {
            for c in 0..n {
                data[r * stride + c] = (r * 10 + c + 1) as u32;
            }
        }
        data
    }

    #[test]
    fn test_left_half_up_moves_columns_to_rows() {
        let n = 4;
        let stride = 6;
        let mut data = numbered(n, stride);
        let mut view = StridedViewMut::new(&mut data, 0, n, n, stride);
        transpose_square_left_half_up(&mut view);

        for j in 0..n / 2 {
            for y in 0..n {
                assert_eq!(view.get(j, y), (y * 10 + j + 1) as u32, "row {j} col {y}");
            }
        }
        for r in n / 2..n {
            for c in 0..n {
                assert_eq!(view.get(r, c), 0);
            }
        }
        // Padding past the row width is never touched.
        for r in 0..n {
            assert_eq!(data[r * stride + 4], 999);
            assert_eq!(data[r * stride + 5], 999);
        }
    }

    #[test]
    fn test_upper_half_back_moves_rows_to_columns() {
        let n = 8;
        let mut data = numbered(n, n);
        let mut view = StridedViewMut::new(&mut data, 0, n, n, n);
        transpose_square_upper_half_back(&mut view);

        for y in 0..n {
            for j in 0..n / 2 {
                assert_eq!(view.get(y, j), (j * 10 + y + 1) as u32);
            }
            for c in n / 2..n {
                assert_eq!(view.get(y, c), 0);
            }
        }
    }

    #[test]
    fn test_round_trip_restores_left_half() {
        let n = 8;
        let original = numbered(n, n);
        let mut data = original.clone();
        let mut view = StridedViewMut::new(&mut data, 0, n, n, n);
        transpose_square_left_half_up(&mut view);
        transpose_square_upper_half_back(&mut view);

        for r in 0..n {
            for c in 0..n / 2 {
                assert_eq!(view.get(r, c), original[r * n + c]);
            }
        }
    }
}
