/// An error type for the buffer module.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// Error when the data length does not match the buffer shape.
    #[error("Data length ({0}) does not match the buffer shape ({1})")]
    InvalidDataLength(usize, usize),

    /// Error when a buffer is created with zero channels.
    #[error("A pixel buffer must have at least one channel")]
    ZeroChannels,

    /// Error when a channel index is out of bounds.
    #[error("Channel index {0} is out of bounds for a buffer with {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a channel range is reversed or out of bounds.
    #[error("Invalid channel range {0}..={1} for a buffer with {2} channels")]
    InvalidChannelRange(usize, usize, usize),

    /// Error when a selection rectangle does not fit in the buffer.
    #[error("Selection rectangle [{0}, {1}) x [{2}, {3}) exceeds the buffer bounds ({4} x {5})")]
    SelectionOutOfBounds(usize, usize, usize, usize, usize, usize),
}
