
///
/// Computes the nonnegative greatest common divisor of `a` and `b`,
/// with `gcd(0, 0) = 0`.
/// 
pub fn gcd(a: u64, b: u64) -> u64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    return a;
}

#[test]
fn test_gcd() {
    assert_eq!(3, gcd(15, 6));
    assert_eq!(3, gcd(6, 15));
    assert_eq!(1, gcd(7, 5));
    assert_eq!(5, gcd(0, 5));
    assert_eq!(5, gcd(5, 0));
    assert_eq!(0, gcd(0, 0));
}
