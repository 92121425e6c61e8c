///
/// Returns all primes `< B`, in ascending order.
/// 
pub fn erathostenes(B: u64) -> Vec<u64> {
    let mut primes = Vec::new();
    if B <= 2 {
        return primes;
    }
    primes.push(2);
    let mut list = Vec::new();
    list.resize((B / 2) as usize, true);
    for i in 1..(B / 2) {
        let n = i * 2 + 1;
        if n >= B {
            break;
        }
        if list[i as usize] {
            primes.push(n);
            let mut j = i + n;
            while j < B / 2 {
                list[j as usize] = false;
                j += n;
            }
        }
    }
    return primes;
}

#[test]
fn test_erathostenes() {
    assert_eq!(Vec::<u64>::new(), erathostenes(2));
    assert_eq!(vec![2], erathostenes(3));
    assert_eq!(vec![2, 3], erathostenes(4));
    assert_eq!(vec![2, 3, 5, 7, 11, 13, 17, 19], erathostenes(20));
    assert_eq!(vec![2, 3, 5, 7, 11, 13, 17, 19, 23], erathostenes(24));
}

#[test]
fn test_erathostenes_count() {
    assert_eq!(168, erathostenes(1000).len());
    assert_eq!(997, *erathostenes(1000).last().unwrap());
}
