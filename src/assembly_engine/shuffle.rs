use rand::Rng;

/// Unbiased in-place Fisher-Yates shuffle driven by the caller's RNG.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffle an owned vector and hand it back.
pub fn shuffled<T, R: Rng>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    shuffle(&mut items, rng);
    items
}

/// Pick one element uniformly; panics on an empty slice.
pub fn pick<'a, T, R: Rng>(items: &'a [T], rng: &mut R) -> &'a T {
    assert!(!items.is_empty(), "pick from empty catalogue");
    &items[rng.gen_range(0..items.len())]
}
