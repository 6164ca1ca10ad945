//! Windowed 1-D line processing: mirror border extension, weighted
//! convolution and order-statistic selection over a single row or column.

use std::cmp::Ordering;

use tessera_image::Sample;

/// Build the mirror-extended scratch line for a window extension of `ext`
/// samples per side: the head holds the first `ext` interior samples
/// reversed (the boundary sample itself is not repeated), the middle is a
/// verbatim copy, and the tail mirrors the trailing interior samples.
///
/// Requires `line.len() > ext`.
pub(crate) fn extend_mirrored<T: Sample>(line: &[T], ext: usize, scratch: &mut Vec<T>) {
    debug_assert!(line.len() > ext);
    scratch.clear();
    scratch.reserve(line.len() + 2 * ext);
    for i in 0..ext {
        scratch.push(line[ext - i]);
    }
    scratch.extend_from_slice(line);
    for i in 0..ext {
        scratch.push(line[line.len() - 2 - i]);
    }
}

/// Convolve one line in place against a 1-D coefficient vector of odd
/// length, sampling the window with the given interlacing distance.
///
/// The linear combination accumulates in `f64` regardless of the sample
/// storage type; the result is narrowed back with the type's rounding and
/// clamping semantics.
pub(crate) fn convolve_line<T: Sample>(
    line: &mut [T],
    scratch: &mut Vec<T>,
    coefficients: &[f64],
    interlace: usize,
) {
    let radius = coefficients.len() / 2;
    let ext = radius * interlace;
    extend_mirrored(line, ext, scratch);

    for (i, out) in line.iter_mut().enumerate() {
        let mut acc = 0.0;
        let mut u = i;
        for &h in coefficients {
            acc += scratch[u].to_f64() * h;
            u += interlace;
        }
        *out = T::from_f64(acc);
    }
}

/// Replace each line sample by the `rank`-th smallest of its window of
/// `size` samples, using the same mirror extension and interlaced sampling
/// as [`convolve_line`].
pub(crate) fn rank_line<T: Sample>(
    line: &mut [T],
    scratch: &mut Vec<T>,
    window: &mut Vec<T>,
    size: usize,
    rank: usize,
    interlace: usize,
) {
    let radius = size / 2;
    let ext = radius * interlace;
    extend_mirrored(line, ext, scratch);

    for (i, out) in line.iter_mut().enumerate() {
        window.clear();
        window.extend((0..size).map(|j| scratch[i + j * interlace]));
        *out = select_rank(window, rank);
    }
}

/// Select the `rank`-th smallest window sample. Medians of the window sizes
/// that occur in practice (3, 5, 7, 9 and 25 elements) go through fixed
/// sorting networks; everything else falls back to generic partial
/// selection. The window contents are permuted.
pub(crate) fn select_rank<T: Sample>(window: &mut [T], rank: usize) -> T {
    let n = window.len();
    if n % 2 == 1 && rank == n / 2 {
        match n {
            1 => return window[0],
            3 => return median3(window),
            5 => return median5(window),
            7 => return median7(window),
            9 => return median9(window),
            25 => return median25(window),
            _ => {}
        }
    }
    let (_, nth, _) = window
        .select_nth_unstable_by(rank, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    *nth
}

#[inline]
fn cmpxchg<T: PartialOrd + Copy>(v: &mut [T], a: usize, b: usize) {
    if v[b] < v[a] {
        v.swap(a, b);
    }
}

#[inline]
fn run_network<T: PartialOrd + Copy>(v: &mut [T], net: &[(usize, usize)]) {
    for &(a, b) in net {
        cmpxchg(v, a, b);
    }
}

#[inline]
fn max2<T: PartialOrd + Copy>(a: T, b: T) -> T {
    if a < b {
        b
    } else {
        a
    }
}

#[inline]
fn min2<T: PartialOrd + Copy>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

fn median3<T: PartialOrd + Copy>(v: &mut [T]) -> T {
    run_network(v, &[(0, 1), (1, 2)]);
    max2(v[0], v[1])
}

fn median5<T: PartialOrd + Copy>(v: &mut [T]) -> T {
    run_network(v, &[(0, 1), (3, 4), (0, 3), (1, 4), (1, 2), (2, 3)]);
    max2(v[1], v[2])
}

fn median7<T: PartialOrd + Copy>(v: &mut [T]) -> T {
    run_network(
        v,
        &[
            (0, 5),
            (0, 3),
            (1, 6),
            (2, 4),
            (0, 1),
            (3, 5),
            (2, 6),
            (2, 3),
            (3, 6),
            (4, 5),
            (1, 4),
            (1, 3),
        ],
    );
    min2(v[3], v[4])
}

fn median9<T: PartialOrd + Copy>(v: &mut [T]) -> T {
    run_network(
        v,
        &[
            (1, 2),
            (4, 5),
            (7, 8),
            (0, 1),
            (3, 4),
            (6, 7),
            (1, 2),
            (4, 5),
            (7, 8),
            (0, 3),
            (5, 8),
            (4, 7),
            (3, 6),
            (1, 4),
            (2, 5),
            (4, 7),
            (4, 2),
            (6, 4),
        ],
    );
    min2(v[2], v[4])
}

#[rustfmt::skip]
const MEDIAN25_NETWORK: [(usize, usize); 98] = [
    (0, 1), (3, 4), (2, 4), (2, 3), (6, 7), (5, 7), (5, 6), (9, 10), (8, 10),
    (8, 9), (12, 13), (11, 13), (11, 12), (15, 16), (14, 16), (14, 15),
    (18, 19), (17, 19), (17, 18), (21, 22), (20, 22), (20, 21), (23, 24),
    (2, 5), (3, 6), (0, 6), (0, 3), (4, 7), (1, 7), (1, 4), (11, 14), (8, 14),
    (8, 11), (12, 15), (9, 15), (9, 12), (13, 16), (10, 16), (10, 13),
    (20, 23), (17, 23), (17, 20), (21, 24), (18, 24), (18, 21), (19, 22),
    (8, 17), (9, 18), (0, 18), (0, 9), (10, 19), (1, 19), (1, 10), (11, 20),
    (2, 20), (2, 11), (12, 21), (3, 21), (3, 12), (13, 22), (4, 22), (4, 13),
    (14, 23), (5, 23), (5, 14), (15, 24), (6, 24), (6, 15), (7, 16), (7, 19),
    (13, 21), (15, 23), (7, 13), (7, 15), (1, 9), (3, 11), (5, 17), (11, 17),
    (9, 17), (4, 10), (6, 12), (7, 14), (4, 6), (4, 7), (12, 14), (10, 14),
    (6, 7), (10, 12), (6, 10), (6, 17), (12, 17), (7, 17), (7, 10), (12, 18),
    (7, 12), (10, 18), (12, 20), (10, 20),
];

fn median25<T: PartialOrd + Copy>(v: &mut [T]) -> T {
    run_network(v, &MEDIAN25_NETWORK);
    max2(v[10], v[12])
}
