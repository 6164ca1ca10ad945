//! Shared sliding-cache engine for 2-D windowed operators.
//!
//! The engine walks the image selection top to bottom with a cache of
//! `span` mirror-extended rows, gathers an interlaced `size x size` window
//! around every output position and hands it to a reducer. Morphological
//! and adaptive filters are reducers plugged into this engine.

use tessera_image::{PixelBuffer, Sample, Selection, Status};

use crate::error::FilterError;
use crate::parallel::{self, Band, Monitor};

/// Reduces one gathered window to an output sample.
pub(crate) trait WindowReducer<T: Sample> {
    /// Reduce the gathered window to a single value. `center` is the
    /// original sample at the output position. The window contents may be
    /// permuted.
    fn reduce(&mut self, window: &mut Vec<T>, center: T) -> T;
}

/// Geometry of the gathered window.
#[derive(Clone, Copy)]
pub(crate) struct WindowSpec {
    /// Samples gathered per axis.
    pub size: usize,
    /// Distance between two consecutive window taps.
    pub interlace: usize,
}

impl WindowSpec {
    pub(crate) fn span(&self) -> usize {
        parallel::overlapping_distance(self.size, self.interlace)
    }
}

/// Apply a windowed reducer over the image selection in place.
///
/// Every band reads the pristine plane, including the halo rows of its
/// neighbors, and writes its output to a private block. The shared buffer
/// is mutated only in the single-threaded merge after all workers of all
/// channels have joined, so an abort discards the private blocks and
/// leaves the buffer untouched.
///
/// Returns `true` when the window span exceeds either selection dimension
/// and the selection was zeroed instead of processed.
pub(crate) fn apply_windowed<T, R, F>(
    image: &mut PixelBuffer<T>,
    spec: WindowSpec,
    parallel_enabled: bool,
    max_processors: usize,
    status: &Status,
    make_reducer: F,
) -> Result<bool, FilterError>
where
    T: Sample,
    R: WindowReducer<T>,
    F: Fn() -> R + Sync,
{
    let sel = image.selection();
    let span = spec.span();
    if span > sel.rect.width() || span > sel.rect.height() {
        image.fill_selection(T::MIN_SAMPLE);
        return Ok(true);
    }

    let width = image.width();
    let height = image.height();
    let rows_sel = sel.rect.height();

    // a band must hold at least one full window span to amortize its
    // private cache, which also guarantees halo reads never cross more
    // than one band boundary
    let num_threads = parallel::thread_count(rows_sel, span, parallel_enabled, max_processors);
    let pool = parallel::build_pool(num_threads)?;
    let bands = parallel::partition(rows_sel, num_threads);

    let mut channel_outputs = Vec::with_capacity(sel.ch_last - sel.ch_first + 1);
    for c in sel.ch_first..=sel.ch_last {
        let plane = image.plane(c)?;
        let outputs = parallel::run_bands(&pool, bands.clone(), status, |band| {
            process_band(plane, band, &sel, width, height, spec, status, &make_reducer)
        })?;
        channel_outputs.push(outputs);
    }

    let w = sel.rect.width();
    for (c, outputs) in (sel.ch_first..=sel.ch_last).zip(channel_outputs) {
        let plane = image.plane_mut(c)?;
        for (band, out) in bands.iter().zip(outputs) {
            for (r, row) in out.chunks(w).enumerate() {
                let y = sel.rect.y0 + band.start + r;
                plane[y * width + sel.rect.x0..y * width + sel.rect.x1].copy_from_slice(row);
            }
        }
    }
    Ok(false)
}

#[allow(clippy::too_many_arguments)]
fn process_band<T, R>(
    plane: &[T],
    band: Band,
    sel: &Selection,
    width: usize,
    height: usize,
    spec: WindowSpec,
    status: &Status,
    make_reducer: &impl Fn() -> R,
) -> Result<Vec<T>, FilterError>
where
    T: Sample,
    R: WindowReducer<T>,
{
    let span = spec.span();
    let n2 = span / 2;
    let d = spec.interlace;
    let (x0, x1) = (sel.rect.x0, sel.rect.x1);
    let w = x1 - x0;
    let cache_width = w + 2 * n2;
    let abs_start = sel.rect.y0 + band.start;
    let abs_end = sel.rect.y0 + band.end;

    let mut reducer = make_reducer();
    let mut monitor = Monitor::new(status);
    let mut window: Vec<T> = Vec::with_capacity(spec.size * spec.size);
    let mut out = vec![T::MIN_SAMPLE; band.len() * w];
    let mut cache: Vec<Vec<T>> = vec![vec![T::MIN_SAMPLE; cache_width]; span];

    // initial fill: rows above the physical top edge reflect downwards
    for (i, row) in cache.iter_mut().enumerate() {
        let src = if i < n2 {
            let i0 = abs_start as isize + i as isize - n2 as isize;
            if i0 < 0 {
                abs_start + n2 - 1 - i
            } else {
                i0 as usize
            }
        } else {
            abs_start + i - n2
        };
        row[n2..n2 + w].copy_from_slice(&plane[src * width + x0..src * width + x1]);
        mirror_edges(row, n2, w);
    }

    let mut y = abs_start;
    loop {
        let out_base = (y - abs_start) * w;
        for x in 0..w {
            window.clear();
            for i in (0..span).step_by(d) {
                window.extend((0..spec.size).map(|t| cache[i][x + t * d]));
            }
            let center = plane[y * width + x0 + x];
            out[out_base + x] = reducer.reduce(&mut window, center);
        }
        monitor.advance(w as u64)?;

        y += 1;
        if y == abs_end {
            break;
        }

        // slide the cache one row down
        cache.rotate_left(1);
        let src_abs = y + n2;
        if src_abs < height {
            let row = &mut cache[span - 1];
            row[n2..n2 + w].copy_from_slice(&plane[src_abs * width + x0..src_abs * width + x1]);
            mirror_edges(row, n2, w);
        } else {
            // past the physical bottom edge the last context row repeats
            let (head, tail) = cache.split_at_mut(span - 1);
            tail[0].copy_from_slice(&head[span - 2]);
        }
    }

    monitor.finish();
    Ok(out)
}

/// Mirror the selection edges into the cache row margins, without repeating
/// the edge samples themselves.
fn mirror_edges<T: Copy>(row: &mut [T], n2: usize, w: usize) {
    for j in 0..n2 {
        row[j] = row[2 * n2 - j];
    }
    let last = n2 + w - 1;
    for j in 1..=n2 {
        row[last + j] = row[last - j];
    }
}
