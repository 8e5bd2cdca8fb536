use std::ops::{Add, Neg, Sub, Mul, Index, IndexMut, AddAssign, SubAssign, MulAssign, Range};
use nalgebra::{ClosedAdd, ClosedMul, ClosedSub, DMatrix, Scalar};
use delegate::delegate;
use derive_more::Display;
use auto_impl_ops::auto_ops;
use num_traits::{Zero, One, Float};
use lovasz::Field;
use crate::MatType;

#[derive(Clone, Debug, Display, PartialEq)]
pub struct Mat<R> {
    inner: DMatrix<R>
}

impl<R> MatType for Mat<R> {
    fn shape(&self) -> (usize, usize) {
        (self.inner.nrows(), self.inner.ncols())
    }
}

impl<R> Mat<R> {
    pub fn inner(&self) -> &DMatrix<R> {
        &self.inner
    }

    pub fn into_inner(self) -> DMatrix<R> {
        self.inner
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &R)> {
        let m = self.rows();
        self.inner.iter().enumerate().map(move |(i, a)|
            (i % m, i / m, a)
        )
    }
}

impl<R> Mat<R>
where R: Scalar {
    pub fn from_data<I>(shape: (usize, usize), data: I) -> Self
    where I: IntoIterator<Item = R> {
        DMatrix::from_row_iterator(shape.0, shape.1, data).into()
    }

    pub fn zero(shape: (usize, usize)) -> Self
    where R: Zero {
        let inner = DMatrix::zeros(shape.0, shape.1);
        Self::from(inner)
    }

    pub fn is_zero(&self) -> bool
    where R: Zero {
        self.iter().all(|e| e.2.is_zero())
    }

    pub fn id(size: usize) -> Self
    where R: Zero + One {
        let inner = DMatrix::identity(size, size);
        Self::from(inner)
    }

    pub fn submat(&self, rows: Range<usize>, cols: Range<usize>) -> Mat<R> {
        let (i0, i1) = (rows.start, rows.end);
        let (j0, j1) = (cols.start, cols.end);

        assert!(i0 <= i1 && i1 <= self.rows());
        assert!(j0 <= j1 && j1 <= self.cols());

        let view = self.inner.view((i0, j0), (i1 - i0, j1 - j0));
        Self::from(view.clone_owned())
    }

    pub fn submat_rows(&self, rows: Range<usize>) -> Mat<R> {
        let n = self.cols();
        self.submat(rows, 0 .. n)
    }

    pub fn submat_cols(&self, cols: Range<usize>) -> Mat<R> {
        let m = self.rows();
        self.submat(0 .. m, cols)
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.inner.swap_rows(i, j);
    }

    pub fn swap_cols(&mut self, i: usize, j: usize) {
        self.inner.swap_columns(i, j);
    }
}

impl<R> From<DMatrix<R>> for Mat<R> {
    fn from(inner: DMatrix<R>) -> Self {
        Self { inner }
    }
}

impl<R> Index<(usize, usize)> for Mat<R> {
    type Output = R;
    delegate! {
        to self.inner {
            fn index(&self, index: (usize, usize)) -> &R;
        }
    }
}

impl<R> IndexMut<(usize, usize)> for Mat<R> {
    delegate! {
        to self.inner {
            fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output;
        }
    }
}

impl<R> Default for Mat<R>
where R: Scalar + Zero {
    fn default() -> Self {
        Self::zero((0, 0))
    }
}

impl<R> Neg for Mat<R>
where R: Scalar + Neg<Output = R> {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Mat::from(-self.inner)
    }
}

impl<R> Neg for &Mat<R>
where R: Scalar + Neg<Output = R> {
    type Output = Mat<R>;
    fn neg(self) -> Self::Output {
        Mat::from(-&self.inner)
    }
}

#[auto_ops]
impl<R> AddAssign<&Mat<R>> for Mat<R>
where R: Scalar + ClosedAdd {
    fn add_assign(&mut self, rhs: &Self) {
        self.inner += &rhs.inner;
    }
}

#[auto_ops]
impl<R> SubAssign<&Mat<R>> for Mat<R>
where R: Scalar + ClosedSub {
    fn sub_assign(&mut self, rhs: &Self) {
        self.inner -= &rhs.inner
    }
}

#[auto_ops]
impl<'a, 'b, R> Mul<&'b Mat<R>> for &'a Mat<R>
where R: Scalar + Zero + One + ClosedAdd + ClosedMul {
    type Output = Mat<R>;
    fn mul(self, rhs: &'b Mat<R>) -> Self::Output {
        let prod = &self.inner * &rhs.inner;
        Mat::from(prod)
    }
}

// Column-major level-1 primitives for the reduction algorithms.
// Operating on the contiguous buffer keeps the inner loops allocation-free.
impl<F> Mat<F>
where F: Field {
    pub fn col_norm(&self, j: usize, rows: Range<usize>) -> F::Real {
        let m = self.rows();
        let col = &self.inner.as_slice()[j * m .. (j + 1) * m];
        rows.fold(F::Real::zero(), |acc, i| acc + col[i].abs_sqr()).sqrt()
    }

    /// Max column sum of moduli.
    pub fn one_norm(&self) -> F::Real {
        let m = self.rows();
        let s = self.inner.as_slice();
        (0..self.cols()).map(|j|
            s[j * m .. (j + 1) * m].iter().fold(F::Real::zero(), |acc, a| acc + a.abs())
        ).fold(F::Real::zero(), |acc, x| acc.max(x))
    }

    /// `init + Σ conj(A(i,a)) A(i,b)` over `rows`, folded left to right.
    pub fn col_dot_conj(&self, a: usize, b: usize, rows: Range<usize>, init: F) -> F {
        let m = self.rows();
        let s = self.inner.as_slice();
        let ca = &s[a * m .. (a + 1) * m];
        let cb = &s[b * m .. (b + 1) * m];
        rows.fold(init, |acc, i| acc + ca[i].conj() * cb[i])
    }

    /// `A(rows, dst) += alpha * A(rows, src)`.
    pub fn col_axpy(&mut self, alpha: F, src: usize, dst: usize, rows: Range<usize>) {
        assert_ne!(src, dst);
        let m = self.rows();
        let s = self.inner.as_mut_slice();

        let (src_col, dst_col) = if src < dst {
            let (lo, hi) = s.split_at_mut(dst * m);
            (&lo[src * m .. (src + 1) * m], &mut hi[.. m])
        } else {
            let (lo, hi) = s.split_at_mut(src * m);
            (&hi[.. m] as &[F], &mut lo[dst * m .. (dst + 1) * m])
        };

        for i in rows {
            dst_col[i] += alpha * src_col[i];
        }
    }

    /// `A(dst, :) += alpha * A(src, :)`.
    pub fn row_axpy(&mut self, alpha: F, src: usize, dst: usize) {
        assert_ne!(src, dst);
        let (m, n) = self.shape();
        let s = self.inner.as_mut_slice();
        for j in 0..n {
            let x = s[j * m + src];
            s[j * m + dst] += alpha * x;
        }
    }

    pub fn col_scale(&mut self, alpha: F, j: usize, rows: Range<usize>) {
        let m = self.rows();
        let col = &mut self.inner.as_mut_slice()[j * m .. (j + 1) * m];
        for i in rows {
            col[i] *= alpha;
        }
    }

    pub fn set_col_zero(&mut self, j: usize) {
        let m = self.rows();
        let col = &mut self.inner.as_mut_slice()[j * m .. (j + 1) * m];
        col.fill(F::zero());
    }

    pub fn copy_col_from(&mut self, j: usize, other: &Mat<F>, oj: usize) {
        let m = self.rows();
        assert_eq!(m, other.rows());
        let src = &other.inner.as_slice()[oj * m .. (oj + 1) * m];
        self.inner.as_mut_slice()[j * m .. (j + 1) * m].copy_from_slice(src);
    }

    /// Relocate column `from` to position `to`, cyclically shifting the
    /// columns in between by one.
    pub fn move_col(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let m = self.rows();
        let (lo, hi) = (from.min(to), from.max(to));
        let s = &mut self.inner.as_mut_slice()[lo * m .. (hi + 1) * m];
        if from > to {
            s.rotate_right(m);
        } else {
            s.rotate_left(m);
        }
    }

    /// Row analogue of [`Self::move_col`].
    pub fn move_row(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let (m, n) = self.shape();
        let (lo, hi) = (from.min(to), from.max(to));
        let s = self.inner.as_mut_slice();
        for j in 0..n {
            let col = &mut s[j * m .. (j + 1) * m];
            if from > to {
                col[lo ..= hi].rotate_right(1);
            } else {
                col[lo ..= hi].rotate_left(1);
            }
        }
    }

    pub fn make_upper_trapezoidal(&mut self) {
        let (m, n) = self.shape();
        for j in 0..n {
            for i in j + 1..m {
                self[(i, j)] = F::zero();
            }
        }
    }
}
