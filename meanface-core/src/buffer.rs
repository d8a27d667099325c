use image::{GrayImage, RgbImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("Buffer length {len} does not match {height}x{width}x{channels}")]
    LengthMismatch {
        len: usize,
        width: usize,
        height: usize,
        channels: usize,
    },
    #[error("Image dimensions must be non-zero")]
    EmptyImage,
    #[error("Expected {expected} channels, got {got}")]
    ChannelMismatch { expected: usize, got: usize },
}

/// Borrowed view over interleaved 8-bit image data, row-major
/// `height x width x channels`.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
}

impl<'a> ImageView<'a> {
    /// Wrap a raw buffer. The buffer length must be exactly
    /// `width * height * channels`.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, BufferError> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(BufferError::EmptyImage);
        }
        if data.len() != width * height * channels {
            return Err(BufferError::LengthMismatch {
                len: data.len(),
                width,
                height,
                channels,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    pub fn from_rgb(image: &'a RgbImage) -> Self {
        Self {
            data: image.as_raw(),
            width: image.width() as usize,
            height: image.height() as usize,
            channels: 3,
        }
    }

    pub fn from_gray(image: &'a GrayImage) -> Self {
        Self {
            data: image.as_raw(),
            width: image.width() as usize,
            height: image.height() as usize,
            channels: 1,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// All channel samples of the pixel at `(row, col)`.
    #[inline]
    pub(crate) fn pixel(&self, row: usize, col: usize) -> &'a [u8] {
        let offset = (row * self.width + col) * self.channels;
        &self.data[offset..offset + self.channels]
    }
}

/// Owned destination buffer produced by the warp, same layout as [`ImageView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl CropBuffer {
    pub(crate) fn zeroed(width: usize, height: usize, channels: usize) -> Self {
        Self {
            data: vec![0; width * height * channels],
            width,
            height,
            channels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Channel samples of the pixel at `(row, col)`.
    pub fn pixel(&self, row: usize, col: usize) -> &[u8] {
        let offset = (row * self.width + col) * self.channels;
        &self.data[offset..offset + self.channels]
    }

    pub fn to_rgb(&self) -> Result<RgbImage, BufferError> {
        if self.channels != 3 {
            return Err(BufferError::ChannelMismatch {
                expected: 3,
                got: self.channels,
            });
        }
        RgbImage::from_raw(self.width as u32, self.height as u32, self.data.clone()).ok_or(
            BufferError::LengthMismatch {
                len: self.data.len(),
                width: self.width,
                height: self.height,
                channels: self.channels,
            },
        )
    }

    pub fn to_gray(&self) -> Result<GrayImage, BufferError> {
        if self.channels != 1 {
            return Err(BufferError::ChannelMismatch {
                expected: 1,
                got: self.channels,
            });
        }
        GrayImage::from_raw(self.width as u32, self.height as u32, self.data.clone()).ok_or(
            BufferError::LengthMismatch {
                len: self.data.len(),
                width: self.width,
                height: self.height,
                channels: self.channels,
            },
        )
    }
}
