
///
/// Computes `a * b mod n`, without overflowing for any `u64` inputs.
/// 
pub fn mul_mod(a: u64, b: u64, n: u64) -> u64 {
    debug_assert!(n > 0);
    ((a as u128 * b as u128) % n as u128) as u64
}

///
/// Computes `base^power mod n` using square-and-multiply.
/// 
/// By convention, `base^0 = 1 mod n`, which is `0` if `n = 1`.
/// 
pub fn pow_mod(base: u64, power: u64, n: u64) -> u64 {
    assert!(n > 0);
    let base = base % n;
    let mut result = 1 % n;
    if power == 0 {
        return result;
    }
    for i in (0..=(63 - power.leading_zeros())).rev() {
        result = mul_mod(result, result, n);
        if (power >> i) & 1 == 1 {
            result = mul_mod(result, base, n);
        }
    }
    return result;
}

#[test]
fn test_pow_mod() {
    assert_eq!(9, pow_mod(3, 2, 100));
    assert_eq!(243, pow_mod(3, 5, 1000));
    assert_eq!(1, pow_mod(3, 4, 5));
    assert_eq!(1, pow_mod(7, 0, 5));
    assert_eq!(0, pow_mod(7, 0, 1));
    assert_eq!(0, pow_mod(10, 3, 10));
}

#[test]
fn test_mul_mod_large() {
    let n = u64::MAX - 58;
    assert_eq!(mul_mod(n - 1, n - 1, n), 1);
    assert_eq!(pow_mod(n - 1, 3, n), n - 1);
}
