use crate::Real;

pub fn ln_factorial<R: Real>(k: usize) -> R {
    (2..=k).fold(R::zero(), |acc, j| acc + R::from_usize(j).ln())
}

/// `ln Γ(two_x / 2)` for positive half-integer arguments.
///
/// Exact up to rounding via `Γ(k) = (k-1)!` and
/// `Γ(k + 1/2) = (2k)! √π / (4^k k!)`.
pub fn ln_gamma_half<R: Real>(two_x: usize) -> R {
    assert!(two_x > 0);

    if two_x % 2 == 0 {
        ln_factorial(two_x / 2 - 1)
    } else {
        let k = two_x / 2;
        ln_factorial::<R>(2 * k)
            - R::from_usize(k) * R::from_f64(4.0).ln()
            - ln_factorial::<R>(k)
            + R::PI().ln() * R::half()
    }
}
