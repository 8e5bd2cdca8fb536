// "Factoring polynomials with rational coefficients",
// Arjen Lenstra, Hendrik Lenstra, and László Lovász
// https://link.springer.com/article/10.1007/BF01457454
//
// "Lattice Basis Reduction: Improved Practical Algorithms and Solving
// Subset Sum Problems", Claus-Peter Schnorr and Marcus Euchner
// (deep insertion; note the partial-norm initialization fix below)
//
// see also: Henri Cohen, "A course in computational algebraic number theory",
// for the Pohst (MLLL) handling of linearly dependent columns,
// and LAWN 176 for the downdated column norms used during deep insertion.

use std::time::{Duration, Instant};
use itertools::Itertools;
use log::{info, trace};
use num_traits::{Float, Zero, One};
use thiserror::Error;

use lovasz::{Field, Real};
use crate::dense::{Mat, MatType};

/// Reduce a copy of `b`, keeping the original.
///
/// `with_trans = [form_u, form_u_inv]` selects whether the unimodular column
/// transform and/or its inverse are accumulated.
pub fn lll<F>(b: &Mat<F>, with_trans: [bool; 2], ctrl: &LLLCtrl<F::Real>)
    -> Result<LLLReduced<F>, LLLError>
where F: Field {
    lll_in_place(b.clone(), with_trans, ctrl)
}

/// Reduce `b`, consuming it.
pub fn lll_in_place<F>(b: Mat<F>, with_trans: [bool; 2], ctrl: &LLLCtrl<F::Real>)
    -> Result<LLLReduced<F>, LLLError>
where F: Field {
    info!("lll: {:?}", b.shape());

    ctrl.validate()?;

    let mut calc = LLLCalc::new(b, with_trans, ctrl);
    calc.process()?;
    Ok(calc.result())
}

/// Reduce `b`, delegating to the unblocked algorithm.
///
/// The tree scheduling intended for widths above `cutoff` is not implemented;
/// every width is handed to the flat driver.
pub fn recursive_lll<F>(b: Mat<F>, cutoff: usize, ctrl: &LLLCtrl<F::Real>)
    -> Result<LLLReduced<F>, LLLError>
where F: Field {
    if b.cols() > cutoff {
        info!("recursive-lll: width {} exceeds cutoff {}, reducing unblocked", b.cols(), cutoff);
    }
    lll_in_place(b, [false, false], ctrl)
}

/// `Σ_j 2(n-j) log |R(j,j)|`, the potential whose monotone descent bounds
/// the swap count. A vanishing diagonal yields `-∞`, the degenerate-lattice
/// sentinel.
pub fn log_potential<F>(r: &Mat<F>) -> F::Real
where F: Field {
    let n = r.cols().min(r.rows());
    let mut acc = F::Real::zero();
    for j in 0..n {
        acc = acc + F::Real::from_usize(2 * (n - j)) * r[(j, j)].abs().ln();
    }
    acc
}

// -- control and results -- //

#[derive(Clone, Debug, PartialEq)]
pub struct LLLCtrl<R: Real> {
    /// Lovász parameter, in (1/4, 1).
    pub delta: R,

    /// Size-reduction threshold, in [1/2, sqrt(delta)).
    pub eta: R,

    /// Only size-reduce column k against column k-1.
    pub weak: bool,

    /// Use the Schnorr-Euchner deep-insertion driver.
    pub deep: bool,

    /// Reorder columns by a column-pivoted QR before reducing (Wubben et al.);
    /// tends to greatly decrease the number of swaps.
    pub presort: bool,
    pub smallest_first: bool,

    /// Reorthogonalize when a size-reduced column retains at most this
    /// fraction of its former norm.
    pub reorthog_tol: R,

    /// Number of times the reflector stack is applied per column expansion.
    pub num_orthog: usize,

    /// Columns with 2-norm at most this are forced to zero.
    pub zero_tol: R,

    pub progress: bool,
    pub time: bool,
}

impl<R: Real> Default for LLLCtrl<R> {
    fn default() -> Self {
        let eps = <R as Field>::eps();
        let pow = R::from_f64(0.9);

        LLLCtrl {
            delta: R::from_f64(0.75),
            eta: R::half() + eps.powf(pow),
            weak: false,
            deep: false,
            presort: true,
            smallest_first: true,
            reorthog_tol: R::zero(),
            num_orthog: 1,
            zero_tol: eps.powf(pow),
            progress: false,
            time: false,
        }
    }
}

impl<R: Real> LLLCtrl<R> {
    pub fn validate(&self) -> Result<(), LLLError> {
        if !(self.delta > R::from_f64(0.25) && self.delta < R::one()) {
            return Err(LLLError::InvalidArgument(
                format!("delta must lie in (1/4, 1): {}", self.delta)
            ));
        }
        if !(self.eta >= R::half() && self.eta < self.delta.sqrt()) {
            return Err(LLLError::InvalidArgument(
                format!("eta must lie in [1/2, sqrt(delta)): {}", self.eta)
            ));
        }
        if self.num_orthog == 0 {
            return Err(LLLError::InvalidArgument(
                "num_orthog must be positive".to_string()
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LLLInfo<R: Real> {
    pub delta: R,
    pub eta: R,
    pub rank: usize,
    pub nullity: usize,
    pub num_swaps: usize,
    pub log_vol: R,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LLLError {
    #[error("encountered a non-finite column norm; increase working precision")]
    Overflow,

    #[error("encountered a column norm greater than 1/eps")]
    PrecisionExhausted,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Clone, Debug)]
pub struct LLLReduced<F: Field> {
    /// The reduced basis; zero columns occupy the trailing positions.
    pub basis: Mat<F>,

    /// Upper-trapezoidal factor of the implicit QR of `basis`.
    pub r: Mat<F>,

    /// Unimodular transform with `basis = b * trans`, if requested.
    pub trans: Option<Mat<F>>,
    pub trans_inv: Option<Mat<F>>,

    pub info: LLLInfo<F::Real>,
}

// -- reflector primitives -- //

// Form a left reflector zeroing A(i+1.., j), overwriting A(i,j) with the
// (real, possibly negative) signed norm and the tail with the reflector
// vector; the unit head stays implicit. Returns tau.
fn left_reflector<F>(a: &mut Mat<F>, i: usize, j: usize) -> F
where F: Field {
    let m = a.rows();
    let alpha = a[(i, j)];
    let xnorm = a.col_norm(j, i + 1..m);
    let (are, aim) = (alpha.re(), alpha.im());

    if xnorm.is_zero() && aim.is_zero() {
        return F::zero();
    }

    let norm = are.safe_norm(aim).safe_norm(xnorm);
    let beta = if are >= F::Real::zero() { -norm } else { norm };

    let tau = F::from_parts((beta - are) / beta, -aim / beta);
    let scale = (alpha - F::from_real(beta)).recip();
    a.col_scale(scale, j, i + 1..m);
    a[(i, j)] = F::from_real(beta);
    tau
}

// Apply the reflector stored in column `v` (head at row `i`, implicit unit)
// to column `dst`.
fn apply_reflector<F>(a: &mut Mat<F>, i: usize, v: usize, dst: usize, tau: F)
where F: Field {
    let m = a.rows();
    let ip = a.col_dot_conj(v, dst, i + 1..m, a[(i, dst)]);
    let s = -tau * ip;
    a[(i, dst)] += s;
    a.col_axpy(s, v, dst, i + 1..m);
}

// -- private implementation -- //

#[derive(Debug, Default)]
struct Timers {
    apply_house: Duration,
    round: Duration,
}

#[derive(Debug)]
struct LLLCalc<'a, F>
where F: Field {
    b: Mat<F>,
    trans: Option<Mat<F>>,
    trans_inv: Option<Mat<F>>,
    qr: Mat<F>,
    tau: Vec<F>,
    d: Vec<F::Real>,
    x: Vec<F>,
    active: usize,
    num_swaps: usize,
    ctrl: &'a LLLCtrl<F::Real>,
    timers: Timers,
}

impl<'a, F> LLLCalc<'a, F>
where F: Field {
    fn new(b: Mat<F>, with_trans: [bool; 2], ctrl: &'a LLLCtrl<F::Real>) -> Self {
        let (m, n) = b.shape();
        let min_dim = m.min(n);
        let trans = with_trans[0].then(|| Mat::id(n));
        let trans_inv = with_trans[1].then(|| Mat::id(n));

        LLLCalc {
            qr: Mat::zero((m, n)),
            tau: vec![F::zero(); min_dim],
            d: vec![F::Real::one(); min_dim],
            x: vec![F::zero(); n],
            active: n,
            num_swaps: 0,
            b, trans, trans_inv, ctrl,
            timers: Timers::default(),
        }
    }

    fn process(&mut self) -> Result<(), LLLError> {
        if self.ctrl.presort {
            self.presort();
        }
        if self.ctrl.deep {
            self.process_deep()
        } else {
            self.process_flat()
        }
    }

    fn check_norm(norm: F::Real) -> Result<F::Real, LLLError> {
        if !Float::is_finite(norm) {
            return Err(LLLError::Overflow);
        }
        if norm > F::Real::one() / <F as Field>::eps() {
            return Err(LLLError::PrecisionExhausted);
        }
        Ok(norm)
    }

    // Reorder the columns by a column-pivoted Householder QR on a scratch
    // copy; only the pivot order is kept. Heuristic: with smallest_first the
    // pass stops once the best residual vanishes.
    fn presort(&mut self) {
        let (m, n) = self.b.shape();
        let mut scratch = self.b.clone();

        for j in 0..m.min(n) {
            let mut pick = j;
            let mut best = scratch.col_norm(j, j..m);
            for c in j + 1..n {
                let norm = scratch.col_norm(c, j..m);
                let better = if self.ctrl.smallest_first { norm < best } else { norm > best };
                if better {
                    pick = c;
                    best = norm;
                }
            }

            if pick != j {
                scratch.swap_cols(j, pick);
                self.b.swap_cols(j, pick);
                if let Some(u) = self.trans.as_mut() {
                    u.swap_cols(j, pick);
                }
                if let Some(uinv) = self.trans_inv.as_mut() {
                    uinv.swap_rows(j, pick);
                }
            }

            if best.is_zero() {
                break;
            }

            let tau = left_reflector(&mut scratch, j, j);
            for c in j + 1..n {
                apply_reflector(&mut scratch, j, j, c, tau);
            }
        }
    }

    // Copy B(:,k) into QR(:,k) and rotate it with the first k (scaled)
    // Householder reflectors.
    fn expand_qr(&mut self, k: usize) {
        let m = self.b.rows();
        self.qr.copy_col_from(k, &self.b, k);

        let t0 = self.ctrl.time.then(Instant::now);
        for _ in 0..self.ctrl.num_orthog {
            for i in 0..k.min(m) {
                apply_reflector(&mut self.qr, i, i, k, self.tau[i]);
                let fix = F::from_real(self.d[i]);
                self.qr[(i, k)] *= fix;
            }
        }
        if let Some(t0) = t0 {
            self.timers.apply_house += t0.elapsed();
        }
    }

    // Next step of Householder reduction; d[k] keeps R(k,k) non-negative.
    fn householder_step(&mut self, k: usize) {
        let tau = left_reflector(&mut self.qr, k, k);
        self.tau[k] = tau;

        if self.qr[(k, k)].re() < F::Real::zero() {
            self.d[k] = -F::Real::one();
            self.qr[(k, k)] = -self.qr[(k, k)];
        } else {
            self.d[k] = F::Real::one();
        }
    }

    // Size-reduce column k. Returns true if the column collapsed to zero.
    fn step(&mut self, k: usize) -> Result<bool, LLLError> {
        let m = self.b.rows();

        loop {
            self.expand_qr(k);

            let old_norm = Self::check_norm(self.b.col_norm(k, 0..m))?;

            if old_norm <= self.ctrl.zero_tol {
                self.b.set_col_zero(k);
                self.qr.set_col_zero(k);
                if k < self.tau.len() {
                    self.tau[k] = F::from_real(F::Real::half());
                    self.d[k] = F::Real::one();
                }
                return Ok(true);
            }

            let t0 = self.ctrl.time.then(Instant::now);
            if self.ctrl.weak {
                self.reduce_weak(k);
            } else {
                self.reduce_full(k);
            }
            let new_norm = self.b.col_norm(k, 0..m);
            if let Some(t0) = t0 {
                self.timers.round += t0.elapsed();
            }
            let new_norm = Self::check_norm(new_norm)?;

            if new_norm > self.ctrl.reorthog_tol * old_norm {
                break;
            }
            if self.ctrl.progress {
                info!("reorthogonalizing at k={}: old_norm={}, new_norm={}",
                    k, old_norm, new_norm);
            }
        }

        if k < self.tau.len() {
            self.householder_step(k);
        }
        Ok(false)
    }

    // Weak mode: a single coefficient against column k-1.
    fn reduce_weak(&mut self, k: usize) {
        let (m, n) = self.b.shape();
        if k > m {
            return;
        }

        let rho = self.qr[(k - 1, k - 1)].re();
        if rho <= self.ctrl.zero_tol {
            return;
        }

        let chi = self.qr[(k - 1, k)] / F::from_real(rho);
        if Float::abs(chi.re()) > self.ctrl.eta || Float::abs(chi.im()) > self.ctrl.eta {
            let chi = chi.round();
            self.qr.col_axpy(-chi, k - 1, k, 0..k);
            self.b.col_axpy(-chi, k - 1, k, 0..m);
            if let Some(u) = self.trans.as_mut() {
                u.col_axpy(-chi, k - 1, k, 0..n);
            }
            if let Some(uinv) = self.trans_inv.as_mut() {
                uinv.row_axpy(chi, k, k - 1);
            }
        }
    }

    // Standard mode: scan i = k-1 down to 0, accumulating the rounded
    // coefficients in x, then apply the rank-1 update to B (and U, U^{-1}).
    // The descending order matters: reducing at row i changes the coefficient
    // seen at every i' < i.
    fn reduce_full(&mut self, k: usize) {
        let (m, n) = self.b.shape();
        let lim = k.min(m);

        for i in (0..lim).rev() {
            if self.qr[(i, i)].abs() <= self.ctrl.zero_tol {
                self.x[i] = F::zero();
                continue;
            }

            let chi = self.qr[(i, k)] / self.qr[(i, i)];
            let chi = if Float::abs(chi.re()) > self.ctrl.eta
                || Float::abs(chi.im()) > self.ctrl.eta
            {
                let chi = chi.round();
                self.qr.col_axpy(-chi, i, k, 0..i + 1);
                chi
            } else {
                F::zero()
            };
            self.x[i] = chi;
        }

        for j in 0..lim {
            let chi = self.x[j];
            if chi.is_zero() {
                continue;
            }
            self.b.col_axpy(-chi, j, k, 0..m);
            if let Some(u) = self.trans.as_mut() {
                u.col_axpy(-chi, j, k, 0..n);
            }
        }
        if let Some(uinv) = self.trans_inv.as_mut() {
            for i in 0..lim {
                let chi = self.x[i];
                if !chi.is_zero() {
                    uinv.row_axpy(chi, k, i);
                }
            }
        }
    }

    // Move the (already zeroed) column k behind the active block.
    fn park(&mut self, k: usize) {
        let last = self.active - 1;
        self.b.move_col(k, last);
        self.qr.move_col(k, last);
        if let Some(u) = self.trans.as_mut() {
            u.move_col(k, last);
        }
        if let Some(uinv) = self.trans_inv.as_mut() {
            uinv.move_row(k, last);
        }
        self.active = last;

        trace!("parked zero column at {}", last);
    }

    // Establish a non-zero column 0 (parking zero ones) and its reflector.
    fn init_first(&mut self) -> Result<(), LLLError> {
        let m = self.b.rows();
        while self.active > 0 {
            let norm = Self::check_norm(self.b.col_norm(0, 0..m))?;
            if norm <= self.ctrl.zero_tol {
                self.b.set_col_zero(0);
                self.qr.set_col_zero(0);
                self.park(0);
            } else {
                self.expand_qr(0);
                self.householder_step(0);
                return Ok(());
            }
        }
        Ok(())
    }

    fn process_flat(&mut self) -> Result<(), LLLError> {
        self.init_first()?;

        let m = self.b.rows();
        let sqrt_delta = self.ctrl.delta.sqrt();

        let mut k = 1;
        while k < self.active {
            if self.step(k)? {
                self.park(k);
                continue;
            }

            // k can exceed m only for wide inputs; the phantom rows read as 0
            let rho_km1_km1 = if k <= m { self.qr[(k - 1, k - 1)].re() } else { F::Real::zero() };
            let rho_km1_k = if k <= m { self.qr[(k - 1, k)] } else { F::zero() };
            let rho_k_k = if k < m { self.qr[(k, k)].re() } else { F::Real::zero() };

            let left = sqrt_delta * rho_km1_km1;
            let right = rho_k_k.safe_norm(rho_km1_k.abs());

            if left <= right {
                k += 1;
                continue;
            }

            self.num_swaps += 1;
            if self.ctrl.progress {
                info!("dropping from k={} to {}: sqrt(delta)*R(k-1,k-1)={} > {}",
                    k, (k - 1).max(1), left, right);
            }

            self.b.swap_cols(k - 1, k);
            if let Some(u) = self.trans.as_mut() {
                u.swap_cols(k - 1, k);
            }
            if let Some(uinv) = self.trans_inv.as_mut() {
                uinv.swap_rows(k - 1, k);
            }

            if k == 1 {
                // column 0 changed; rebuild its reflector
                self.expand_qr(0);
                self.householder_step(0);
            } else {
                k -= 1;
            }
        }
        Ok(())
    }

    fn process_deep(&mut self) -> Result<(), LLLError> {
        self.init_first()?;

        let m = self.b.rows();
        let sqrt_delta = self.ctrl.delta.sqrt();
        let update_tol = <F as Field>::eps().sqrt();

        // Trusting the downdates alone is slightly faster but riskier.
        const ALWAYS_RECOMPUTE_NORMS: bool = true;

        let mut k = 1;
        while k < self.active {
            if self.step(k)? {
                self.park(k);
                continue;
            }

            // Schnorr-Euchner initialize the running norm at || R(0..k+1, k) ||,
            // not R(k,k); their paper's "New Step 4" has it the other way.
            let top = (k + 1).min(m);
            let mut orig_norm = self.qr.col_norm(k, 0..top);
            let mut partial_norm = orig_norm;

            let mut inserted = false;
            for i in 0..k.min(m) {
                let left = sqrt_delta * self.qr[(i, i)].re();
                if left > partial_norm {
                    self.num_swaps += 1;
                    if self.ctrl.progress {
                        info!("deep inserting k={} at i={}: sqrt(delta)*R(i,i)={} > {}",
                            k, i, left, partial_norm);
                    }

                    self.b.move_col(k, i);
                    if let Some(u) = self.trans.as_mut() {
                        u.move_col(k, i);
                    }
                    if let Some(uinv) = self.trans_inv.as_mut() {
                        uinv.move_row(k, i);
                    }

                    if i == 0 {
                        self.expand_qr(0);
                        self.householder_step(0);
                        k = 1;
                    } else {
                        k = i;
                    }
                    inserted = true;
                    break;
                }

                // downdate the partial norm in the manner of LAWN 176
                let gamma = self.qr[(i, k)].abs() / partial_norm;
                let gamma = ((F::Real::one() - gamma) * (F::Real::one() + gamma))
                    .max(F::Real::zero());
                let ratio = partial_norm / orig_norm;
                let phi = gamma * ratio * ratio;
                if phi <= update_tol || ALWAYS_RECOMPUTE_NORMS {
                    partial_norm = self.qr.col_norm(k, i + 1..top);
                    orig_norm = partial_norm;
                } else {
                    partial_norm = partial_norm * gamma.sqrt();
                }
            }

            if !inserted {
                k += 1;
            }
        }
        Ok(())
    }

    // Largest delta and smallest eta that the reduced R certifies.
    fn achieved(&self) -> (F::Real, F::Real) {
        let (m, n) = self.b.shape();
        let lim = self.active.min(m.min(n));
        let ztol = self.ctrl.zero_tol;

        let mut delta = F::Real::max_value();
        for (i, j) in (0..lim).tuple_windows() {
            let rho_i_i = self.qr[(i, i)].re();
            if rho_i_i <= ztol {
                break;
            }
            let rho_i_j = self.qr[(i, j)].abs();
            let rho_j_j = self.qr[(j, j)].re();
            let bound = (rho_j_j * rho_j_j + rho_i_j * rho_i_j) / (rho_i_i * rho_i_i);
            delta = delta.min(bound);
        }

        let mut eta = F::Real::zero();
        for j in 1..lim {
            for i in 0..j {
                let rho_i_i = self.qr[(i, i)].re();
                if rho_i_i <= ztol {
                    continue;
                }
                eta = eta.max(self.qr[(i, j)].abs() / rho_i_i);
            }
        }

        (delta, eta)
    }

    fn log_volume(&self) -> F::Real {
        let (m, n) = self.b.shape();
        let lim = self.active.min(m.min(n));
        let ztol = self.ctrl.zero_tol;

        (0..lim).fold(F::Real::zero(), |acc, j| {
            let rho = self.qr[(j, j)].re();
            if rho > ztol { acc + rho.ln() } else { acc }
        })
    }

    fn result(mut self) -> LLLReduced<F> {
        if self.ctrl.time {
            info!("apply-householder time: {:?}", self.timers.apply_house);
            info!("round time:             {:?}", self.timers.round);
        }

        self.qr.make_upper_trapezoidal();

        let n = self.b.cols();
        let rank = self.active;
        let (delta, eta) = self.achieved();
        let log_vol = self.log_volume();

        let info = LLLInfo {
            delta,
            eta,
            rank,
            nullity: n - rank,
            num_swaps: self.num_swaps,
            log_vol,
        };

        LLLReduced {
            basis: self.b,
            r: self.qr,
            trans: self.trans,
            trans_inv: self.trans_inv,
            info,
        }
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use num_complex::Complex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ctrl() -> LLLCtrl<f64> {
        LLLCtrl::default()
    }

    #[test]
    fn ctrl_validation() {
        let mut c = ctrl();
        assert!(c.validate().is_ok());

        c.delta = 1.2;
        assert!(matches!(c.validate(), Err(LLLError::InvalidArgument(_))));

        let mut c = ctrl();
        c.eta = 0.9; // >= sqrt(3/4)
        assert!(matches!(c.validate(), Err(LLLError::InvalidArgument(_))));

        let mut c = ctrl();
        c.num_orthog = 0;
        assert!(matches!(c.validate(), Err(LLLError::InvalidArgument(_))));

        let b: Mat<f64> = Mat::id(2);
        let mut c = ctrl();
        c.delta = 0.1;
        assert!(lll(&b, [false, false], &c).is_err());
    }

    #[test]
    fn identity_basis() {
        let b: Mat<f64> = Mat::id(3);
        let red = lll(&b, [true, true], &ctrl()).unwrap();

        assert_eq!(red.basis, Mat::id(3));
        assert_eq!(red.r, Mat::id(3));
        assert_eq!(red.trans, Some(Mat::id(3)));
        assert_eq!(red.info.rank, 3);
        assert_eq!(red.info.nullity, 0);
        assert_eq!(red.info.num_swaps, 0);
        assert_eq!(red.info.log_vol, 0.0);
    }

    #[test]
    fn two_vector_classic() {
        let b = Mat::from_data((3, 2), [
            1., 1.,
            0., 1.,
            0., 1000.,
        ]);
        let red = lll(&b, [true, true], &ctrl()).unwrap();

        helper::assert_reduced(&b, &red, &ctrl());
        assert_eq!(red.basis, Mat::from_data((3, 2), [
            1., 0.,
            0., 1.,
            0., 1000.,
        ]));
        assert_eq!(red.info.rank, 2);
    }

    #[test]
    fn rank_deficient_pair() {
        // parallel columns
        let b = Mat::from_data((2, 2), [
            2., 4.,
            1., 2.,
        ]);
        let red = lll(&b, [true, true], &ctrl()).unwrap();

        helper::assert_reduced(&b, &red, &ctrl());
        assert_eq!(red.info.rank, 1);
        assert_eq!(red.info.nullity, 1);
        assert_eq!(red.basis[(0, 1)], 0.0);
        assert_eq!(red.basis[(1, 1)], 0.0);
        assert_eq!(red.basis[(0, 0)].abs(), 2.0);

        let u = red.trans.as_ref().unwrap();
        let det = lovasz::algo::naive_det(2, &helper::row_major(u));
        assert_eq!(det.abs(), 1.0);
    }

    #[test]
    fn gcd_row() {
        let _ = lovasz::util::log::init_simple_logger(log::LevelFilter::Off);

        let b = Mat::<f64>::from_data((1, 3), [40., 60., 90.]);
        let c = LLLCtrl { progress: true, time: true, ..ctrl() };
        let red = lll(&b, [true, true], &c).unwrap();

        helper::assert_reduced(&b, &red, &c);
        assert_eq!(red.info.rank, 1);
        assert_eq!(red.info.nullity, 2);
        assert_eq!(red.basis[(0, 0)].abs(), 10.0);
        assert_eq!(red.basis[(0, 1)], 0.0);
        assert_eq!(red.basis[(0, 2)], 0.0);
        assert!((red.info.log_vol - 10.0_f64.ln()).abs() < 1e-12);
    }

    fn knapsack_input() -> (Mat<f64>, f64) {
        let d = Mat::from_data((5, 5), [
            1., 0., 0., 0., 0.,
            0., 29., 0., 0., 0.,
           -1., 0., 31., 0., 0.,
            0., 0., 0., 37., 0.,
            1., 0., 0., 0., 41.,
        ]);
        let u0 = Mat::from_data((5, 5), [
            1., 3., -2., 0., 1.,
            0., 1., 4., -1., 2.,
            0., 0., 1., 2., -3.,
            0., 0., 0., 1., 5.,
            0., 0., 0., 0., 1.,
        ]);
        let mut b = &d * &u0;
        // hide the planted column at the back
        b.move_col(0, 4);

        let det = 29. * 31. * 37. * 41.;
        (b, det)
    }

    fn assert_planted(basis: &Mat<f64>) {
        let target = [1., 0., -1., 0., 1.];
        let found = (0..5).any(|j|
            (0..5).all(|i| basis[(i, j)] == target[i]) ||
            (0..5).all(|i| basis[(i, j)] == -target[i])
        );
        assert!(found, "planted vector not recovered:\n{}", basis);
    }

    #[test]
    fn knapsack_planted() {
        let (b, det) = knapsack_input();
        let c = LLLCtrl { delta: 0.99, presort: false, ..ctrl() };
        let red = lll(&b, [true, true], &c).unwrap();

        helper::assert_reduced(&b, &red, &c);
        assert_planted(&red.basis);
        assert!(red.info.num_swaps > 0);
        assert_eq!(red.info.rank, 5);
        assert!((red.info.log_vol - det.ln()).abs() < 1e-9);

        let u = red.trans.as_ref().unwrap();
        let det_u = lovasz::algo::naive_det(5, &helper::row_major(u));
        assert_eq!(det_u.abs(), 1.0);
    }

    #[test]
    fn knapsack_deep() {
        let (b, det) = knapsack_input();
        let c = LLLCtrl { delta: 0.99, deep: true, ..ctrl() };
        let red = lll(&b, [true, true], &c).unwrap();

        helper::assert_reduced(&b, &red, &c);
        assert_planted(&red.basis);
        assert!((red.info.log_vol - det.ln()).abs() < 1e-9);
    }

    #[test]
    fn idempotent() {
        let (b, _) = knapsack_input();
        let c = LLLCtrl { delta: 0.99, presort: false, ..ctrl() };

        let red = lll(&b, [false, false], &c).unwrap();
        let again = lll(&red.basis, [false, false], &c).unwrap();

        assert_eq!(again.info.num_swaps, 0);
        assert_eq!(again.basis, red.basis);
    }

    #[test]
    fn complex_dependent_pair() {
        type C = Complex<f64>;
        let c = C::new;

        // col1 = (1+i) col0
        let b = Mat::from_data((2, 2), [
            c(1., 0.), c(1., 1.),
            c(0., 1.), c(-1., 1.),
        ]);
        let red = lll(&b, [true, true], &ctrl()).unwrap();

        helper::assert_reduced(&b, &red, &ctrl());
        assert_eq!(red.info.rank, 1);
        assert_eq!(red.info.nullity, 1);
        assert!(red.basis.submat_cols(1..2).is_zero());

        let u = red.trans.as_ref().unwrap();
        let det = lovasz::algo::naive_det(2, &helper::row_major(u));
        assert!((det.abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn overflow_detected() {
        let b = Mat::from_data((2, 2), [
            f64::MAX, 1.,
            f64::MAX, 1.,
        ]);
        assert!(matches!(lll(&b, [false, false], &ctrl()), Err(LLLError::Overflow)));
    }

    #[test]
    fn precision_exhausted() {
        let b = Mat::from_data((2, 2), [
            1e20, 2e20,
            1e20, 3e20,
        ]);
        assert!(matches!(lll(&b, [false, false], &ctrl()), Err(LLLError::PrecisionExhausted)));
    }

    #[test]
    fn rand_flat() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(m, n) in &[(4, 4), (6, 4), (5, 5), (2, 4), (6, 6)] {
            for _ in 0..5 {
                let b = helper::rand_int_mat(&mut rng, (m, n));
                let c = ctrl();
                let red = lll(&b, [true, true], &c).unwrap();
                helper::assert_reduced(&b, &red, &c);

                if n <= 6 {
                    let u = red.trans.as_ref().unwrap();
                    let det = lovasz::algo::naive_det(n, &helper::row_major(u));
                    assert_eq!(det.abs(), 1.0);
                }
            }
        }
    }

    #[test]
    fn rand_deep() {
        let mut rng = StdRng::seed_from_u64(11);
        for &(m, n) in &[(4, 4), (6, 4), (5, 5)] {
            for _ in 0..5 {
                let b = helper::rand_int_mat(&mut rng, (m, n));
                let c = LLLCtrl { deep: true, delta: 0.9, ..ctrl() };
                let red = lll(&b, [true, true], &c).unwrap();
                helper::assert_reduced(&b, &red, &c);
            }
        }
    }

    #[test]
    fn rand_weak() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..10 {
            let b = helper::rand_int_mat(&mut rng, (5, 4));
            let c = LLLCtrl { weak: true, ..ctrl() };
            let red = lll(&b, [true, true], &c).unwrap();

            // weak reduction still yields an exact unimodular factorization
            let u = red.trans.as_ref().unwrap();
            let uinv = red.trans_inv.as_ref().unwrap();
            assert_eq!(&b * u, red.basis);
            assert_eq!(u * uinv, Mat::id(4));
            assert_eq!(red.info.rank + red.info.nullity, 4);
            for j in red.info.rank..4 {
                assert!(red.basis.submat_cols(j..j + 1).is_zero());
            }
        }
    }

    #[test]
    fn rand_complex() {
        type C = Complex<f64>;
        let mut rng = StdRng::seed_from_u64(17);

        for &(m, n) in &[(3, 3), (4, 3)] {
            for _ in 0..5 {
                let b = Mat::from_data((m, n), (0..m * n).map(|_| {
                    C::new(
                        rng.gen_range(-4..=4) as f64,
                        rng.gen_range(-4..=4) as f64,
                    )
                }));
                let c = LLLCtrl::default();
                let red = lll(&b, [true, true], &c).unwrap();
                helper::assert_reduced(&b, &red, &c);
            }
        }
    }

    #[test]
    fn num_orthog_twice() {
        let (b, _) = knapsack_input();
        let c = LLLCtrl { delta: 0.99, num_orthog: 2, ..ctrl() };
        let red = lll(&b, [true, true], &c).unwrap();
        helper::assert_reduced(&b, &red, &c);
        assert_planted(&red.basis);
    }

    #[test]
    fn recursive_delegates() {
        let (b, det) = knapsack_input();
        let c = LLLCtrl { delta: 0.99, ..ctrl() };
        let red = recursive_lll(b, 3, &c).unwrap();

        assert_planted(&red.basis);
        assert!((red.info.log_vol - det.ln()).abs() < 1e-9);
    }

    #[test]
    fn reorthogonalization_triggers() {
        // size reduction collapses the second column by six orders of
        // magnitude, forcing a rebuild of its QR column
        let b = Mat::from_data((2, 2), [
            1e6, 1e6,
            1., 0.,
        ]);
        let c = LLLCtrl { reorthog_tol: 0.5, ..ctrl() };
        let red = lll(&b, [true, true], &c).unwrap();

        helper::assert_reduced(&b, &red, &c);
        assert_eq!(red.info.rank, 2);
    }

    #[test]
    fn log_potential_values() {
        let r = Mat::<f64>::from_data((2, 2), [
            2., 5.,
            0., 3.,
        ]);
        let expected = 4.0 * 2.0_f64.ln() + 2.0 * 3.0_f64.ln();
        assert!((log_potential(&r) - expected).abs() < 1e-12);
    }

    #[test]
    fn log_potential_rank_deficient() {
        let b = Mat::from_data((2, 2), [
            2., 4.,
            1., 2.,
        ]);
        let red = lll(&b, [false, false], &ctrl()).unwrap();
        assert_eq!(red.info.nullity, 1);
        assert_eq!(log_potential(&red.r), f64::NEG_INFINITY);
    }

    pub(in super::super) mod helper {
        use super::*;

        pub fn rand_int_mat(rng: &mut StdRng, shape: (usize, usize)) -> Mat<f64> {
            let (m, n) = shape;
            Mat::from_data((m, n), (0..m * n).map(|_|
                rng.gen_range(-9..=9) as f64
            ))
        }

        pub fn row_major<F: Field>(a: &Mat<F>) -> Vec<F> {
            let (m, n) = a.shape();
            let mut buf = Vec::with_capacity(m * n);
            for i in 0..m {
                for j in 0..n {
                    buf.push(a[(i, j)]);
                }
            }
            buf
        }

        pub fn assert_reduced<F>(b0: &Mat<F>, red: &LLLReduced<F>, ctrl: &LLLCtrl<F::Real>)
        where F: Field {
            let (m, n) = b0.shape();
            let min_dim = m.min(n);
            let rank = red.info.rank;
            let phi = F::phi();
            let tol = F::Real::from_f64(1e-8);

            // B_out = B_in U, exactly
            if let Some(u) = red.trans.as_ref() {
                assert_eq!(&(b0 * u), &red.basis);
            }

            // U U^{-1} = I, exactly
            if let (Some(u), Some(uinv)) = (red.trans.as_ref(), red.trans_inv.as_ref()) {
                assert_eq!(u * uinv, Mat::id(n));
            }

            // rank + nullity = n; zero columns trail
            assert_eq!(rank + red.info.nullity, n);
            assert!(red.basis.submat_cols(rank..n).is_zero());
            assert!(red.r.submat_cols(rank..n).is_zero());

            let lim = rank.min(min_dim);

            // non-negative diagonal
            for j in 0..lim {
                assert!(red.r[(j, j)].re() >= F::Real::zero());
            }

            // size-reduction
            for j in 0..lim {
                for i in 0..j {
                    let rho_i_i = red.r[(i, i)].re();
                    if rho_i_i <= ctrl.zero_tol {
                        continue;
                    }
                    let ratio = red.r[(i, j)].abs() / rho_i_i;
                    assert!(ratio <= phi * ctrl.eta + tol,
                        "not size-reduced at ({}, {}): {}", i, j, ratio);
                }
            }

            // Lovasz condition on consecutive columns
            for i in 0..lim.saturating_sub(1) {
                let rho_i_i = red.r[(i, i)].re();
                let rho_i_j = red.r[(i, i + 1)].abs();
                let rho_j_j = red.r[(i + 1, i + 1)].re();
                let lhs = ctrl.delta * rho_i_i * rho_i_i;
                let rhs = rho_j_j * rho_j_j + rho_i_j * rho_i_j;
                assert!(lhs <= rhs + tol,
                    "Lovasz fails at {}: {} > {}", i, lhs, rhs);
            }

            // reported quality
            assert!(red.info.delta >= ctrl.delta - tol);
            assert!(red.info.eta <= phi * ctrl.eta + tol);

            // volume agrees with the diagonal of R
            let log_vol = (0..lim).fold(F::Real::zero(), |acc, j| {
                let rho = red.r[(j, j)].re();
                if rho > ctrl.zero_tol { acc + rho.ln() } else { acc }
            });
            assert!(Float::abs(red.info.log_vol - log_vol) <= tol);
        }
    }
}
