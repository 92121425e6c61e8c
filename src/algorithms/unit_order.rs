use crate::algorithms::eea::gcd;
use crate::algorithms::int_factor::{euler_phi, factor};
use crate::algorithms::sqr_mul::pow_mod;

///
/// Computes the multiplicative order of `x` in the group `(Z/nZ)*`, i.e. the
/// smallest `k >= 1` with `x^k = 1 mod n`.
/// 
/// Returns `None` if `x` is not a unit modulo `n`. For `n = 1`, the group is
/// trivial and the order is `1`.
/// 
pub fn multiplicative_order(x: u64, n: u64) -> Option<u64> {
    assert!(n > 0);
    if n == 1 {
        return Some(1);
    } else if gcd(x % n, n) != 1 {
        return None;
    }
    let order_multiple = euler_phi(n);
    let mut result = 1;
    for (p, e) in factor(order_multiple) {
        let mut current = pow_mod(x, order_multiple / p.pow(e as u32), n);
        while current != 1 {
            current = pow_mod(current, p, n);
            result *= p;
        }
    }
    return Some(result);
}

#[test]
fn test_multiplicative_order() {
    assert_eq!(Some(4), multiplicative_order(3, 5));
    assert_eq!(Some(1), multiplicative_order(1, 5));
    assert_eq!(Some(2), multiplicative_order(4, 5));
    assert_eq!(Some(1), multiplicative_order(7, 3));
    assert_eq!(Some(6), multiplicative_order(3, 7));
    assert_eq!(Some(2), multiplicative_order(5, 12));
    assert_eq!(Some(1), multiplicative_order(10, 1));
    assert_eq!(None, multiplicative_order(2, 4));
    assert_eq!(None, multiplicative_order(0, 7));
}

#[test]
fn test_multiplicative_order_brute_force() {
    for n in 2..60 {
        for x in 1..n {
            let expected = (1..=n).find(|k| pow_mod(x, *k, n) == 1);
            assert_eq!(expected, multiplicative_order(x, n), "x = {}, n = {}", x, n);
        }
    }
}
