/// Sequence-similarity ratio in `0.0..=1.0`
///
/// Ratcliff/Obershelp: find the longest common block, recurse on the pieces
/// to its left and right, and score `2 * matched / (len(a) + len(b))`.
/// Compares characters, so it is safe on any UTF-8 input.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, alo, ahi, b, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block in `a[alo..ahi]` x `b[blo..bhi]`, earliest in `a` on ties
fn longest_match(
    a: &[char],
    alo: usize,
    ahi: usize,
    b: &[char],
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    // prev[x] = length of the common suffix ending at a[i-1], b[blo + x - 1]
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];

    for i in alo..ahi {
        for x in 1..=width {
            let j = blo + x - 1;
            curr[x] = if a[i] == b[j] { prev[x - 1] + 1 } else { 0 };
            if curr[x] > best.2 {
                best = (i + 1 - curr[x], j + 1 - curr[x], curr[x]);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}
