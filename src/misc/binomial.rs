use std::collections::HashMap;

use nalgebra::RealField;

/// A memoized binomial coefficient table.
/// Used by rational derivative evaluation, where the same small coefficients are requested repeatedly.
#[derive(Debug, Default)]
pub struct Binomial<T> {
    memo: HashMap<(usize, usize), T>,
}

impl<T: RealField + Copy> Binomial<T> {
    pub fn new() -> Self {
        Self {
            memo: HashMap::new(),
        }
    }

    /// Returns the binomial coefficient of `n` and `k`.
    /// # Example
    /// ```
    /// use wingshell::prelude::Binomial;
    /// let mut binom = Binomial::<f64>::new();
    /// assert_eq!(binom.get(4, 2), 6.);
    /// assert_eq!(binom.get(5, 0), 1.);
    /// assert_eq!(binom.get(2, 3), 0.);
    /// ```
    pub fn get(&mut self, n: usize, k: usize) -> T {
        if k == 0 || k == n {
            return T::one();
        } else if n == 0 || k > n {
            return T::zero();
        }

        let k = k.min(n - k);
        if let Some(v) = self.memo.get(&(n, k)) {
            return *v;
        }

        let r = self.get(n - 1, k) + self.get(n - 1, k - 1);
        self.memo.insert((n, k), r);
        r
    }
}
