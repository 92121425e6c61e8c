use crate::algorithms;
use crate::algorithms::miller_rabin::is_prime;

const SMALL_PRIME_BOUND: u64 = 1000;

///
/// Computes the largest integer `x` such that `x^root <= n`.
/// 
/// Candidates are compared using checked arithmetic, so this never overflows,
/// even if `(x + 1)^root` does not fit into a `u64`.
/// 
pub fn root_floor(n: u64, root: u32) -> u64 {
    assert!(root > 0);
    if root == 1 || n < 2 {
        return n;
    }
    let exceeds = |x: u64| x.checked_pow(root).map(|power| power > n).unwrap_or(true);
    let mut left = 1;
    let mut right = 1u64 << (64 / root as u64).min(63);
    while !exceeds(right) {
        left = right;
        right = right.saturating_mul(2);
    }
    // invariant: left^root <= n < right^root
    while right - left > 1 {
        let mid = left + (right - left) / 2;
        if exceeds(mid) {
            right = mid;
        } else {
            left = mid;
        }
    }
    return left;
}

///
/// If `n = m^k` for some `k >= 2`, returns `(m, k)` with `k` maximal.
/// 
fn is_power(n: u64) -> Option<(u64, u32)> {
    if n < 4 {
        return None;
    }
    for k in (2..=(63 - n.leading_zeros())).rev() {
        let root = root_floor(n, k);
        if root.pow(k) == n {
            return Some((root, k));
        }
    }
    return None;
}

///
/// Factors the given integer into prime powers, returned in ascending order of the primes.
/// 
/// The factorization of `0` and `1` is empty.
/// 
pub fn factor(mut n: u64) -> Vec<(u64, usize)> {
    let mut result = Vec::new();
    if n < 2 {
        return result;
    }

    // first we remove small factors
    for p in algorithms::erathostenes::erathostenes(SMALL_PRIME_BOUND) {
        let mut count = 0;
        while n % p == 0 {
            n /= p;
            count += 1;
        }
        if count >= 1 {
            result.push((p, count));
        }
    }

    if n == 1 {
        return result;
    } else if is_prime(n) {
        result.push((n, 1));
        return result;
    }

    // then check for powers, so that the remaining cofactor is not a perfect power
    if let Some((m, k)) = is_power(n) {
        let mut power_factors = factor(m);
        for (_, multiplicity) in &mut power_factors {
            *multiplicity *= k as usize;
        }
        result.extend(power_factors);
        result.sort_unstable();
        return result;
    }

    // all remaining prime factors are larger than the bound
    let mut d = SMALL_PRIME_BOUND + 1;
    while d.saturating_mul(d) <= n {
        let mut count = 0;
        while n % d == 0 {
            n /= d;
            count += 1;
        }
        if count >= 1 {
            result.push((d, count));
        }
        d += 2;
    }
    if n > 1 {
        result.push((n, 1));
    }
    return result;
}

///
/// Checks whether `n = p^e` for a prime `p` and `e >= 1`, and if so, returns `(p, e)`.
/// 
pub fn is_prime_power(n: u64) -> Option<(u64, usize)> {
    if n < 2 {
        return None;
    } else if is_prime(n) {
        return Some((n, 1));
    }
    let (m, k) = is_power(n)?;
    let (p, e) = is_prime_power(m)?;
    return Some((p, e * k as usize));
}

///
/// Returns `phi(n) = #(Z/nZ)*`, computed from the factorization of `n`.
/// 
pub fn euler_phi(n: u64) -> u64 {
    factor(n).into_iter()
        .map(|(p, e)| (p - 1) * p.pow(e as u32 - 1))
        .product()
}

#[test]
fn test_root_floor() {
    assert_eq!(3, root_floor(27, 3));
    assert_eq!(2, root_floor(26, 3));
    assert_eq!(4, root_floor(16, 2));
    assert_eq!(4, root_floor(24, 2));
    assert_eq!(2, root_floor(1 << 62, 62));
    assert_eq!(4294967295, root_floor(u64::MAX, 2));
    assert_eq!(1, root_floor(1, 5));
    assert_eq!(0, root_floor(0, 5));
}

#[test]
fn test_factor() {
    assert_eq!(Vec::<(u64, usize)>::new(), factor(1));
    assert_eq!(vec![(2, 3), (3, 1)], factor(24));
    assert_eq!(vec![(7, 1)], factor(7));
    assert_eq!(vec![(1009, 2)], factor(1009 * 1009));
    assert_eq!(vec![(2, 1), (1009, 1), (1013, 1)], factor(2 * 1009 * 1013));
    assert_eq!(vec![(3, 2), (1009, 1), (1013, 1)], factor(9 * 1009 * 1013));
}

#[test]
fn test_is_prime_power() {
    assert_eq!(None, is_prime_power(0));
    assert_eq!(None, is_prime_power(1));
    assert_eq!(Some((2, 1)), is_prime_power(2));
    assert_eq!(Some((2, 3)), is_prime_power(8));
    assert_eq!(Some((3, 4)), is_prime_power(81));
    assert_eq!(Some((2, 6)), is_prime_power(64));
    assert_eq!(None, is_prime_power(6));
    assert_eq!(None, is_prime_power(36));
    assert_eq!(Some((1009, 2)), is_prime_power(1009 * 1009));
}

#[test]
fn test_euler_phi() {
    assert_eq!(1, euler_phi(1));
    assert_eq!(4, euler_phi(5));
    assert_eq!(4, euler_phi(12));
    assert_eq!(6, euler_phi(9));
}
