use rayon::prelude::*;

use tessera_image::Status;

use crate::error::FilterError;

/// Samples processed between two progress/abort checks inside worker loops.
pub(crate) const MONITOR_CHUNK: u64 = 65536;

/// The full span of a windowed operator of linear `size` sampled with the
/// given interlacing distance. This is the minimal extent a band must be
/// able to read around any output position, and twice the halo each band
/// needs from its neighbors.
pub fn overlapping_distance(size: usize, interlace: usize) -> usize {
    size + (size - 1) * (interlace - 1)
}

/// A contiguous partition of the selected extent assigned to one worker.
///
/// Bands are ephemeral: created at dispatch time, destroyed after the
/// overlap reconciliation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Band {
    /// First row or column of the band, relative to the selection.
    pub start: usize,
    /// One past the last row or column of the band.
    pub end: usize,
    /// Whether the band borders a preceding band and reads halo context
    /// from it.
    pub has_upper_overlap: bool,
    /// Whether the band borders a following band and reads halo context
    /// from it.
    pub has_lower_overlap: bool,
}

impl Band {
    /// Number of rows or columns in the band.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the band is empty.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Split `extent` rows or columns into `num_bands` contiguous bands of
/// near-equal size. The division remainder is absorbed by the last band.
pub fn partition(extent: usize, num_bands: usize) -> Vec<Band> {
    let num_bands = num_bands.clamp(1, extent.max(1));
    let per_band = extent / num_bands;
    (0..num_bands)
        .map(|i| Band {
            start: i * per_band,
            end: if i + 1 < num_bands {
                (i + 1) * per_band
            } else {
                extent
            },
            has_upper_overlap: i > 0,
            has_lower_overlap: i + 1 < num_bands,
        })
        .collect()
}

/// Number of worker threads for a workload of `extent` items where each
/// band must keep at least `overhead_limit` items to amortize its setup
/// and halo cost. Returns 1 when parallel processing is disabled.
pub fn thread_count(
    extent: usize,
    overhead_limit: usize,
    parallel: bool,
    max_processors: usize,
) -> usize {
    if !parallel || extent == 0 {
        return 1;
    }
    (extent / overhead_limit.max(1)).clamp(1, max_processors.max(1))
}

/// Build a fixed-size local thread pool with one thread per band.
pub(crate) fn build_pool(num_threads: usize) -> Result<rayon::ThreadPool, FilterError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| FilterError::ThreadPool(e.to_string()))
}

/// Run one worker per band input and collect the outputs in band order.
///
/// An abort request pending before dispatch cancels the run without
/// starting any worker. A worker failure raises the shared abort flag so
/// sibling bands observe it at their next monitor check and unwind; the
/// first real error is then re-raised. If every early exit was a
/// cooperative abort, the result is [`FilterError::Cancelled`].
pub(crate) fn run_bands<I, R, F>(
    pool: &rayon::ThreadPool,
    inputs: Vec<I>,
    status: &Status,
    worker: F,
) -> Result<Vec<R>, FilterError>
where
    I: Send,
    R: Send,
    F: Fn(I) -> Result<R, FilterError> + Sync,
{
    if status.is_abort_requested() {
        return Err(FilterError::Cancelled);
    }
    log::trace!("dispatching {} band(s)", inputs.len());

    let results: Vec<Result<R, FilterError>> = pool.install(|| {
        inputs
            .into_par_iter()
            .map(|input| {
                worker(input).map_err(|e| {
                    if !matches!(e, FilterError::Cancelled) {
                        status.request_abort();
                    }
                    e
                })
            })
            .collect()
    });

    let mut outputs = Vec::with_capacity(results.len());
    let mut first_error = None;
    let mut cancelled = false;
    for result in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(FilterError::Cancelled) => cancelled = true,
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        Err(e)
    } else if cancelled {
        Err(FilterError::Cancelled)
    } else {
        Ok(outputs)
    }
}

/// Per-worker progress accounting: batches counter updates and polls the
/// abort flag once per [`MONITOR_CHUNK`] samples.
pub(crate) struct Monitor<'a> {
    status: &'a Status,
    pending: u64,
}

impl<'a> Monitor<'a> {
    pub(crate) fn new(status: &'a Status) -> Self {
        Self { status, pending: 0 }
    }

    /// Account for `n` processed samples. Returns [`FilterError::Cancelled`]
    /// if an abort was requested.
    pub(crate) fn advance(&mut self, n: u64) -> Result<(), FilterError> {
        self.pending += n;
        if self.pending >= MONITOR_CHUNK {
            self.status.advance(self.pending);
            self.pending = 0;
            if self.status.is_abort_requested() {
                return Err(FilterError::Cancelled);
            }
        }
        Ok(())
    }

    /// Flush the remaining sample count to the shared status object.
    pub(crate) fn finish(mut self) {
        self.status.advance(self.pending);
        self.pending = 0;
    }
}
