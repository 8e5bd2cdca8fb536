use crate::Field;

/// Laplace-expansion determinant of a row-major `n × n` matrix.
///
/// Exponential in `n`; intended for small certificates (n ≤ 32).
pub fn naive_det<F: Field>(n: usize, matrix: &[F]) -> F {
    assert_eq!(matrix.len(), n * n);
    assert!(n <= 32);

    fn det_rec<F: Field>(n: usize, matrix: &[F], used: u32) -> F {
        let i = used.count_ones() as usize;
        if i == n {
            return F::one();
        }

        let mut e = -F::one();
        let mut acc = F::zero();

        for j in 0..n {
            if used & (1 << j) != 0 {
                continue;
            }
            e = -e;

            let a = matrix[n * i + j];
            if a.is_zero() {
                continue;
            }

            acc += e * a * det_rec(n, matrix, used | (1 << j));
        }

        acc
    }

    det_rec(n, matrix, 0)
}
