use std::ops::Index;

use nalgebra::RealField;

/// Knot vector representation
/// Knots are kept in non-decreasing order
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: RealField + Copy> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Place knots for global interpolation by averaging `degree` consecutive parameters
    /// The returned vector is clamped on [params[0], params[last]]
    /// # Example
    /// ```
    /// use wingshell::prelude::KnotVector;
    /// let knots = KnotVector::averaged(&[0., 0.25, 0.5, 0.75, 1.], 2);
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 0.375, 0.625, 1., 1., 1.]);
    /// ```
    pub fn averaged(params: &[T], degree: usize) -> Self {
        let n = params.len();
        let first = params[0];
        let last = params[n - 1];
        let inv = T::one() / T::from_usize(degree).unwrap();

        let mut knots = vec![first; degree + 1];
        for j in 1..(n - degree) {
            let sum = params[j..(j + degree)]
                .iter()
                .fold(T::zero(), |acc, u| acc + *u);
            knots.push(sum * inv);
        }
        knots.extend(std::iter::repeat_n(last, degree + 1));
        Self(knots)
    }

    /// Place knots for a least squares approximation with `control_points` control points
    /// so that every knot span contains at least one parameter
    pub fn approximating(params: &[T], degree: usize, control_points: usize) -> Self {
        let m = params.len() - 1;
        let n = control_points - 1;
        let first = params[0];
        let last = params[m];

        let d = (m + 1) as f64 / (n - degree + 1) as f64;
        let mut knots = vec![first; degree + 1];
        for j in 1..=(n - degree) {
            let jd = j as f64 * d;
            let i = (jd.floor() as usize).clamp(1, m);
            let alpha = T::from_f64(jd - i as f64).unwrap();
            knots.push((T::one() - alpha) * params[i - 1] + alpha * params[i]);
        }
        knots.extend(std::iter::repeat_n(last, degree + 1));
        Self(knots)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn first(&self) -> T {
        self.0[0]
    }

    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Get the domain of the knot vector by degree
    pub fn domain(&self, degree: usize) -> (T, T) {
        (self.0[degree], self.0[self.0.len() - 1 - degree])
    }

    pub fn clamp(&self, degree: usize, u: T) -> T {
        let (min, max) = self.domain(degree);
        u.clamp(min, max)
    }

    /// Rescale the knots so that the domain becomes [0, 1]
    pub fn normalized(&self, degree: usize) -> Self {
        let (min, max) = self.domain(degree);
        let span = max - min;
        Self(self.0.iter().map(|k| (*k - min) / span).collect())
    }

    /// Get the distinct knots paired with their multiplicity
    /// # Example
    /// ```
    /// use wingshell::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let mult = knots.multiplicity();
    /// assert_eq!(mult, vec![(0., 3), (1., 1), (2., 1), (3., 3)]);
    /// ```
    pub fn multiplicity(&self) -> Vec<(T, usize)> {
        let mut mult: Vec<(T, usize)> = vec![];
        for knot in self.0.iter() {
            let repeated =
                matches!(mult.last(), Some(last) if (*knot - last.0).abs() <= T::default_epsilon());
            if repeated {
                if let Some(last) = mult.last_mut() {
                    last.1 += 1;
                }
            } else {
                mult.push((*knot, 1));
            }
        }
        mult
    }

    /// Check if the first and last knots are repeated more than `degree` times
    pub fn is_clamped(&self, degree: usize) -> bool {
        let multiplicity = self.multiplicity();
        match (multiplicity.first(), multiplicity.last()) {
            (Some(start), Some(end)) => start.1 > degree && end.1 > degree,
            _ => false,
        }
    }

    /// Collect the knots of `other` that are missing in this vector, counting multiplicity
    /// Inserting the returned knots makes this vector a superset of `other`
    pub fn missing_from(&self, other: &Self, tolerance: T) -> Vec<T> {
        let mine = self.multiplicity();
        other
            .multiplicity()
            .into_iter()
            .flat_map(|(knot, m)| {
                let present = mine
                    .iter()
                    .find(|(k, _)| (*k - knot).abs() <= tolerance)
                    .map(|(_, m)| *m)
                    .unwrap_or(0);
                std::iter::repeat_n(knot, m.saturating_sub(present))
            })
            .collect()
    }

    /// Find the knot span index by binary search
    /// `n` is the index of the last control point
    ///
    /// # Example
    /// ```
    /// use wingshell::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// assert_eq!(knots.find_knot_span_index(4, 2, 2.5), 4);
    /// assert_eq!(knots.find_knot_span_index(4, 2, 3.0), 4);
    /// assert_eq!(knots.find_knot_span_index(4, 2, 0.0), 2);
    /// ```
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        if u >= self[n + 1] - T::default_epsilon() {
            return n;
        }

        if u <= self[degree] + T::default_epsilon() {
            return degree;
        }

        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || self[mid + 1] <= u {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            let next = (low + high) / 2;
            if mid == next {
                break;
            }
            mid = next;
        }

        mid
    }

    /// Triangular table of the non-vanishing basis functions of every degree up to `degree`
    /// The upper triangle `ndu[r][j]` holds N(span - j + r, j), the lower triangle the knot differences
    fn basis_table(&self, span: usize, u: T, degree: usize) -> Vec<Vec<T>> {
        let mut ndu = vec![vec![T::zero(); degree + 1]; degree + 1];
        let left = (0..=degree)
            .map(|j| if j == 0 { T::zero() } else { u - self[span + 1 - j] })
            .collect::<Vec<_>>();
        let right = (0..=degree)
            .map(|j| if j == 0 { T::zero() } else { self[span + j] - u })
            .collect::<Vec<_>>();

        ndu[0][0] = T::one();
        for j in 1..=degree {
            let mut carry = T::zero();
            for r in 0..j {
                ndu[j][r] = right[r + 1] + left[j - r];
                let t = ndu[r][j - 1] / ndu[j][r];
                ndu[r][j] = carry + right[r + 1] * t;
                carry = left[j - r] * t;
            }
            ndu[j][j] = carry;
        }
        ndu
    }

    /// Compute the non-vanishing basis functions
    pub fn basis_functions(&self, knot_span_index: usize, u: T, degree: usize) -> Vec<T> {
        let ndu = self.basis_table(knot_span_index, u, degree);
        ndu.iter().map(|row| row[degree]).collect()
    }

    /// Compute the non-vanishing basis functions and their derivatives up to `n` (Piegl & Tiller A2.3)
    /// Row k of the result holds the k-th derivatives, rows above the degree are zero
    pub fn derivative_basis_functions(
        &self,
        knot_index: usize,
        u: T,
        degree: usize,
        n: usize,
    ) -> Vec<Vec<T>> {
        let p = degree;
        let ndu = self.basis_table(knot_index, u, p);

        let mut ders = vec![vec![T::zero(); p + 1]; n + 1];
        for j in 0..=p {
            ders[0][j] = ndu[j][p];
        }

        let kmax = n.min(p);
        let mut a = [vec![T::zero(); p + 1], vec![T::zero(); p + 1]];
        for r in 0..=p {
            let (mut s1, mut s2) = (0, 1);
            a[0][0] = T::one();

            for k in 1..=kmax {
                let pk = p - k;
                let mut d = T::zero();

                if r >= k {
                    a[s2][0] = a[s1][0] / ndu[pk + 1][r - k];
                    d = a[s2][0] * ndu[r - k][pk];
                }

                let j1 = if r + 1 >= k { 1 } else { k - r };
                let j2 = if r + k <= p + 1 { k - 1 } else { p - r };
                for j in j1..=j2 {
                    let rj = r + j - k;
                    a[s2][j] = (a[s1][j] - a[s1][j - 1]) / ndu[pk + 1][rj];
                    d += a[s2][j] * ndu[rj][pk];
                }

                if r <= pk {
                    a[s2][k] = -a[s1][k - 1] / ndu[pk + 1][r];
                    d += a[s2][k] * ndu[r][pk];
                }

                ders[k][r] = d;
                std::mem::swap(&mut s1, &mut s2);
            }
        }

        // scale row k by p! / (p - k)!
        let mut factor = p;
        for k in 1..=kmax {
            let f = T::from_usize(factor).unwrap();
            ders[k].iter_mut().for_each(|v| *v *= f);
            factor *= p - k;
        }
        ders
    }

    /// Compute basis functions at `divs + 1` regularly spaced parameters over the domain
    /// Returns a tuple of knot spans and basis functions
    pub fn regularly_spaced_basis_functions(
        &self,
        degree: usize,
        divs: usize,
    ) -> (Vec<usize>, Vec<Vec<T>>) {
        let n = self.len() - degree - 2;
        let (start, end) = self.domain(degree);
        let step = (end - start) / T::from_usize(divs).unwrap();

        (0..=divs)
            .map(|i| {
                let u = if i == divs {
                    end
                } else {
                    start + step * T::from_usize(i).unwrap()
                };
                let span = self.find_knot_span_index(n, degree, u);
                (span, self.basis_functions(span, u, degree))
            })
            .unzip()
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::KnotVector;

    #[test]
    fn basis_functions_partition_unity() {
        let knots = KnotVector::new(vec![0., 0., 0., 0., 0.3, 0.7, 1., 1., 1., 1.]);
        let n = knots.len() - 3 - 2;
        for i in 0..=20 {
            let u = i as f64 / 20.;
            let span = knots.find_knot_span_index(n, 3, u);
            let sum: f64 = knots.basis_functions(span, u, 3).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn derivative_basis_functions_sum_to_zero() {
        let knots = KnotVector::new(vec![0., 0., 0., 0.5, 1., 1., 1.]);
        let n = knots.len() - 2 - 2;
        let span = knots.find_knot_span_index(n, 2, 0.3);
        let ders = knots.derivative_basis_functions(span, 0.3, 2, 2);
        assert_relative_eq!(ders[0].iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(ders[1].iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(ders[2].iter().sum::<f64>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn approximating_knots_are_clamped_and_sorted() {
        let params: Vec<f64> = (0..20).map(|i| i as f64 / 19.).collect();
        let knots = KnotVector::approximating(&params, 3, 8);
        assert_eq!(knots.len(), 8 + 3 + 1);
        assert!(knots.is_clamped(3));
        assert!(knots.iter().zip(knots.iter().skip(1)).all(|(a, b)| a <= b));
        assert_eq!(knots.domain(3), (0., 1.));
    }

    #[test]
    fn missing_knots_respect_multiplicity() {
        let a = KnotVector::new(vec![0., 0., 0.5, 1., 1.]);
        let b = KnotVector::new(vec![0., 0., 0.25, 0.5, 0.5, 1., 1.]);
        assert_eq!(a.missing_from(&b, 1e-12), vec![0.25, 0.5]);
        assert!(b.missing_from(&a, 1e-12).is_empty());
    }

    #[test]
    fn normalized_domain() {
        let knots = KnotVector::new(vec![2., 2., 3., 4., 4.]);
        let normalized = knots.normalized(1);
        assert_eq!(normalized.to_vec(), vec![0., 0., 0.5, 1., 1.]);
    }
}
