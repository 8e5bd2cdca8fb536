// Lattice applications built on the LLL reducer: image/kernel extraction
// (Henri Cohen, "A course in computational algebraic number theory",
// Alg. 2.7.1) and integer-relation searches via the embedding
// B = [I; sqrt(N) z^T] (Cohen, subsection 2.7.2).

use log::info;
use num_traits::Float;

use lovasz::algo::ln_gamma_half;
use lovasz::{Field, Real};
use crate::dense::{Mat, MatType};
use super::lll::{lll_in_place, LLLCtrl, LLLError, LLLInfo};

/// Image and kernel bases of the lattice spanned by the columns of `b`.
///
/// Reduction with full transform tracking leaves an image basis in the
/// leading `rank` columns of the reduced matrix and a kernel basis in the
/// trailing columns of the transform; the kernel basis is LLL-reduced itself
/// before being returned.
pub fn lattice_image_and_kernel<F>(b: &Mat<F>, ctrl: &LLLCtrl<F::Real>)
    -> Result<(Mat<F>, Mat<F>), LLLError>
where F: Field {
    let n = b.cols();
    let red = lll_in_place(b.clone(), [true, false], ctrl)?;
    let rank = red.info.rank;

    let image = red.basis.submat_cols(0..rank);
    let trans = red.trans.expect("transform was tracked");
    let kernel = trans.submat_cols(rank..n);

    let kernel = if kernel.cols() > 0 {
        lll_in_place(kernel, [false, false], ctrl)?.basis
    } else {
        kernel
    };

    Ok((image, kernel))
}

/// The LLL-reduced kernel basis of the lattice map given by `b`.
pub fn lattice_kernel<F>(b: &Mat<F>, ctrl: &LLLCtrl<F::Real>)
    -> Result<Mat<F>, LLLError>
where F: Field {
    let (_, kernel) = lattice_image_and_kernel(b, ctrl)?;
    Ok(kernel)
}

#[derive(Clone, Debug)]
pub struct ZDependence<F: Field> {
    /// Number of leading columns carrying a nearly exact relation.
    pub num_exact: usize,

    /// The reduced embedding basis; row `n` holds `sqrt(N) z^T U`.
    pub basis: Mat<F>,

    /// Candidate relation coefficients, one per column.
    pub trans: Mat<F>,

    pub info: LLLInfo<F::Real>,
}

/// Search for integer relations `a` with `z^T a ≈ 0` by reducing the
/// quadratic form `|| a ||² + N | z^T a |²`.
///
/// A column counts as nearly exact if its bottom entry is at most
/// `sqrt(eps) ||B||₁`; every column is inspected, since exact relations
/// need not end up contiguous at the front.
pub fn z_dependence_search<F>(z: &[F], n_sqrt: F::Real, ctrl: &LLLCtrl<F::Real>)
    -> Result<ZDependence<F>, LLLError>
where F: Field {
    let n = z.len();
    if n == 0 {
        return Err(LLLError::InvalidArgument("empty input vector".to_string()));
    }

    let mut b = Mat::zero((n + 1, n));
    for (j, &zeta) in z.iter().enumerate() {
        b[(j, j)] = F::one();
        b[(n, j)] = F::from_real(n_sqrt) * zeta;
    }

    let red = lll_in_place(b, [true, false], ctrl)?;
    let basis = red.basis;
    let trans = red.trans.expect("transform was tracked");

    let tol = <F as Field>::eps().sqrt() * basis.one_norm();
    let mut num_exact = 0;
    for j in 0..n {
        if basis[(n, j)].abs() <= tol {
            num_exact += 1;
        }
    }

    info!("z-dependence: {} nearly exact relations", num_exact);

    Ok(ZDependence { num_exact, basis, trans, info: red.info })
}

/// Search for (Gaussian) integer coefficients of a polynomial of `alpha`,
/// of degree below `n`, that is nearly zero.
pub fn algebraic_relation_search<F>(alpha: F, n: usize, n_sqrt: F::Real, ctrl: &LLLCtrl<F::Real>)
    -> Result<ZDependence<F>, LLLError>
where F: Field {
    if n == 0 {
        return Err(LLLError::InvalidArgument("need at least one power of alpha".to_string()));
    }

    let mut z = Vec::with_capacity(n);
    let mut pow = F::one();
    for _ in 0..n {
        z.push(pow);
        pow *= alpha;
    }

    z_dependence_search(&z, n_sqrt, ctrl)
}

/// Gaussian estimate of the minimum vector length of a rank-`n` lattice:
/// `GH(L) = (1/sqrt(pi)) Γ(n/2+1)^{1/n} |det(L)|^{1/n}`.
pub fn lattice_gaussian_heuristic<R: Real>(n: usize, log_vol: R) -> R {
    assert!(n > 0);
    ((ln_gamma_half::<R>(n + 2) + log_vol) / R::from_usize(n)).exp() / R::PI().sqrt()
}
