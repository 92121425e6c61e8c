use crate::algorithms::sqr_mul::{mul_mod, pow_mod};

///
/// The first 12 primes. Using them as Miller-Rabin bases gives a correct test
/// for all `n < 3.3 * 10^24`, in particular for all `u64`.
///
const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

///
/// Deterministic Miller-Rabin primality test for `u64`.
///
/// Small factors are handled by trial division, all other inputs are checked
/// by [`is_prime_base()`].
///
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n == p {
            return true;
        } else if n % p == 0 {
            return false;
        }
    }
    return is_prime_base(n);
}

///
/// Miller-Rabin primality test w.r.t. the bases in `WITNESSES`, without trial
/// division by small primes. Requires `n > 37` to be odd.
///
/// Complexity O(log(n)^3)
///
pub fn is_prime_base(n: u64) -> bool {
    assert!(n > 37 && n % 2 == 1);
    let n_minus_one = n - 1;
    let s = n_minus_one.trailing_zeros();
    let d = n_minus_one >> s;

    for a in WITNESSES {
        let mut current = pow_mod(a, d, n);
        let mut miller_rabin_condition = current == 1;
        for _r in 0..s {
            miller_rabin_condition |= current == n_minus_one;
            if miller_rabin_condition {
                break;
            }
            current = mul_mod(current, current, n);
        }
        if !miller_rabin_condition {
            return false;
        }
    }
    return true;
}

#[cfg(test)]
use crate::algorithms::erathostenes::erathostenes;

#[test]
pub fn test_is_prime() {
    assert!(is_prime(2));
    assert!(is_prime(3));
    assert!(is_prime(5));
    assert!(is_prime(7));
    assert!(is_prime(11));
    assert!(is_prime(37));
    assert!(is_prime(22531));
    assert!(is_prime(417581));
    assert!(is_prime(68719476767));
    assert!(is_prime(18446744073709551557));

    assert!(!is_prime(0));
    assert!(!is_prime(1));
    assert!(!is_prime(4));
    assert!(!is_prime(6));
    assert!(!is_prime(8));
    assert!(!is_prime(9));
    assert!(!is_prime(10));
    assert!(!is_prime(22532));
    assert!(!is_prime(347584));
    assert!(!is_prime(u64::MAX));
    // Carmichael numbers
    assert!(!is_prime(561));
    assert!(!is_prime(41041));
}

#[test]
fn test_strong_pseudoprimes() {
    // strong pseudoprimes to all prime bases up to 11, resp. 23
    assert!(!is_prime(2152302898747));
    assert!(!is_prime(3825123056546413051));
}

#[test]
fn test_is_prime_matches_trial_division() {
    for n in 1_000_000_000..1_000_002_000 {
        let expected = (2..).take_while(|d: &u64| d * d <= n).all(|d| n % d != 0);
        assert_eq!(expected, is_prime(n), "wrong result for {}", n);
    }
}

#[test]
fn test_is_prime_matches_sieve() {
    let primes = erathostenes(2000);
    for n in 0..2000 {
        assert_eq!(primes.binary_search(&n).is_ok(), is_prime(n), "wrong result for {}", n);
    }
}
