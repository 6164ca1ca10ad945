use crate::error::BufferError;

/// A half-open rectangle `[x0, x1) x [y0, y1)` in pixel coordinates.
///
/// # Examples
///
/// ```
/// use tessera_image::Rect;
///
/// let r = Rect::new(2, 1, 7, 4);
/// assert_eq!(r.width(), 5);
/// assert_eq!(r.height(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    /// Left column (inclusive).
    pub x0: usize,
    /// Top row (inclusive).
    pub y0: usize,
    /// Right column (exclusive).
    pub x1: usize,
    /// Bottom row (exclusive).
    pub y1: usize,
}

impl Rect {
    /// Create a new rectangle from its corner coordinates.
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width of the rectangle in pixels.
    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    /// Height of the rectangle in pixels.
    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

/// The region of a buffer that operations implicitly honor: a sub-rectangle
/// plus an inclusive channel range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Selected rectangle.
    pub rect: Rect,
    /// First selected channel (inclusive).
    pub ch_first: usize,
    /// Last selected channel (inclusive).
    pub ch_last: usize,
}

impl Selection {
    /// Number of selected channels.
    pub fn num_channels(&self) -> usize {
        self.ch_last - self.ch_first + 1
    }

    /// Number of selected samples across all selected channels.
    pub fn num_samples(&self) -> usize {
        self.rect.width() * self.rect.height() * self.num_channels()
    }
}

/// A planar 2-D multi-channel pixel buffer.
///
/// Samples are stored channel-major: `channels` contiguous planes of
/// `height x width` samples each. All channels share identical dimensions.
/// Operations honor the buffer [`Selection`], which defaults to the full
/// buffer. Mutating operations take the buffer by `&mut`; callers that need
/// to keep the original clone it up front.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer<T> {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<T>,
    selection: Selection,
}

impl<T: Copy> PixelBuffer<T> {
    /// Create a new buffer from existing sample data.
    ///
    /// # Errors
    ///
    /// Returns an error if `channels` is zero or the data length does not
    /// equal `width * height * channels`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_image::PixelBuffer;
    ///
    /// let buf = PixelBuffer::new(4, 3, 1, vec![0u8; 12]).unwrap();
    /// assert_eq!(buf.width(), 4);
    /// assert_eq!(buf.height(), 3);
    /// ```
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self, BufferError> {
        if channels == 0 {
            return Err(BufferError::ZeroChannels);
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(BufferError::InvalidDataLength(data.len(), expected));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
            selection: Selection {
                rect: Rect::new(0, 0, width, height),
                ch_first: 0,
                ch_last: channels - 1,
            },
        })
    }

    /// Create a new buffer filled with a constant value.
    pub fn from_val(
        width: usize,
        height: usize,
        channels: usize,
        val: T,
    ) -> Result<Self, BufferError> {
        Self::new(width, height, channels, vec![val; width * height * channels])
    }

    /// Width of the buffer in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the buffer in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// The current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Whether the current selection covers no samples.
    pub fn is_empty_selection(&self) -> bool {
        self.selection.rect.is_empty()
    }

    /// Select a sub-rectangle. Subsequent operations are restricted to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the rectangle does not fit within the buffer.
    pub fn select_rect(&mut self, rect: Rect) -> Result<(), BufferError> {
        if rect.x1 > self.width || rect.y1 > self.height {
            return Err(BufferError::SelectionOutOfBounds(
                rect.x0,
                rect.x1,
                rect.y0,
                rect.y1,
                self.width,
                self.height,
            ));
        }
        self.selection.rect = rect;
        Ok(())
    }

    /// Select an inclusive channel range.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is reversed or out of bounds.
    pub fn select_channels(&mut self, first: usize, last: usize) -> Result<(), BufferError> {
        if first > last || last >= self.channels {
            return Err(BufferError::InvalidChannelRange(first, last, self.channels));
        }
        self.selection.ch_first = first;
        self.selection.ch_last = last;
        Ok(())
    }

    /// Restore the selection to the full buffer.
    pub fn reset_selection(&mut self) {
        self.selection = Selection {
            rect: Rect::new(0, 0, self.width, self.height),
            ch_first: 0,
            ch_last: self.channels - 1,
        };
    }

    /// All samples of the buffer, channel-major.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// All samples of the buffer, channel-major, mutable.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// One channel plane (`height * width` samples, row-major).
    ///
    /// # Errors
    ///
    /// Returns an error if the channel index is out of bounds.
    pub fn plane(&self, channel: usize) -> Result<&[T], BufferError> {
        if channel >= self.channels {
            return Err(BufferError::ChannelIndexOutOfBounds(channel, self.channels));
        }
        let n = self.width * self.height;
        Ok(&self.data[channel * n..(channel + 1) * n])
    }

    /// One channel plane, mutable.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel index is out of bounds.
    pub fn plane_mut(&mut self, channel: usize) -> Result<&mut [T], BufferError> {
        if channel >= self.channels {
            return Err(BufferError::ChannelIndexOutOfBounds(channel, self.channels));
        }
        let n = self.width * self.height;
        Ok(&mut self.data[channel * n..(channel + 1) * n])
    }

    /// A single sample. Intended for tests and fixtures, not hot loops.
    pub fn pixel(&self, x: usize, y: usize, channel: usize) -> T {
        let n = self.width * self.height;
        self.data[channel * n + y * self.width + x]
    }

    /// Set a single sample. Intended for tests and fixtures, not hot loops.
    pub fn set_pixel(&mut self, x: usize, y: usize, channel: usize, val: T) {
        let n = self.width * self.height;
        self.data[channel * n + y * self.width + x] = val;
    }

    /// Fill every sample of the current selection with a constant value.
    pub fn fill_selection(&mut self, val: T) {
        let sel = self.selection;
        let (width, plane_len) = (self.width, self.width * self.height);
        for c in sel.ch_first..=sel.ch_last {
            let plane = &mut self.data[c * plane_len..(c + 1) * plane_len];
            for y in sel.rect.y0..sel.rect.y1 {
                plane[y * width + sel.rect.x0..y * width + sel.rect.x1].fill(val);
            }
        }
    }

    /// Cast the buffer samples to a different type, preserving the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if any sample is not representable in the target type.
    pub fn cast<U>(&self) -> Result<PixelBuffer<U>, BufferError>
    where
        T: num_traits::NumCast,
        U: num_traits::NumCast + Copy,
    {
        let data = self
            .data
            .iter()
            .map(|&x| {
                U::from(x).ok_or(BufferError::InvalidDataLength(self.data.len(), self.data.len()))
            })
            .collect::<Result<Vec<U>, _>>()?;
        let mut out = PixelBuffer::new(self.width, self.height, self.channels, data)?;
        out.selection = self.selection;
        Ok(out)
    }
}
