use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(target_os = "macos")]
use objc2::rc::Retained;
#[cfg(target_os = "macos")]
use objc2::runtime::ProtocolObject;
#[cfg(target_os = "macos")]
use objc2_metal::{
    MTLDevice, MTLPixelFormat, MTLTexture, MTLTextureDescriptor, MTLTextureUsage,
};

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid texture data size: expected {expected}, got {actual}")]
    InvalidData { expected: usize, actual: usize },

    #[error("{0}")]
    Gpu(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Bgra8,
}

impl TextureFormat {
    #[cfg(target_os = "macos")]
    pub fn metal_format(&self) -> MTLPixelFormat {
        match self {
            Self::Rgba8 => MTLPixelFormat::RGBA8Unorm,
            Self::Bgra8 => MTLPixelFormat::BGRA8Unorm,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

/// Decoded pixels waiting for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: TextureFormat,
}

impl TextureImage {
    /// 1x1 opaque white, bound for untextured materials and failed loads.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            data: vec![255; 4],
            format: TextureFormat::Rgba8,
        }
    }

    /// # Errors
    /// Returns an error if `data` does not hold exactly `width * height` pixels.
    pub fn from_raw(
        width: u32,
        height: u32,
        data: Vec<u8>,
        format: TextureFormat,
    ) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(TextureError::InvalidData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            format,
        })
    }
}

/// Decodes an image file into RGBA8.
///
/// # Errors
/// Returns [`TextureError::Decode`] if the file is missing or not a supported image.
pub fn load_texture_image(path: impl AsRef<Path>) -> Result<TextureImage, TextureError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba_image = image.to_rgba8();
    let (width, height) = rgba_image.dimensions();

    Ok(TextureImage {
        width,
        height,
        data: rgba_image.into_raw(),
        format: TextureFormat::Rgba8,
    })
}

#[cfg(target_os = "macos")]
pub struct Texture {
    pub texture: Retained<ProtocolObject<dyn MTLTexture>>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

#[cfg(target_os = "macos")]
impl Texture {
    pub fn load(
        device: &ProtocolObject<dyn MTLDevice>,
        path: impl AsRef<Path>,
    ) -> Result<Self, TextureError> {
        let image = load_texture_image(path)?;
        Self::from_image(device, &image)
    }

    pub fn from_image(
        device: &ProtocolObject<dyn MTLDevice>,
        image: &TextureImage,
    ) -> Result<Self, TextureError> {
        let TextureImage {
            width,
            height,
            format,
            ..
        } = *image;

        let expected_size = width as usize * height as usize * format.bytes_per_pixel();
        if image.data.len() != expected_size {
            return Err(TextureError::InvalidData {
                expected: expected_size,
                actual: image.data.len(),
            });
        }

        let descriptor = unsafe { MTLTextureDescriptor::new() };
        unsafe {
            descriptor.setPixelFormat(format.metal_format());
            descriptor.setWidth(width as usize);
            descriptor.setHeight(height as usize);
            descriptor.setUsage(MTLTextureUsage::ShaderRead);
        }

        let texture = device
            .newTextureWithDescriptor(&descriptor)
            .ok_or_else(|| TextureError::Gpu("Failed to create texture".to_string()))?;

        let bytes_per_row = width as usize * format.bytes_per_pixel();
        let region = objc2_metal::MTLRegion {
            origin: objc2_metal::MTLOrigin { x: 0, y: 0, z: 0 },
            size: objc2_metal::MTLSize {
                width: width as usize,
                height: height as usize,
                depth: 1,
            },
        };

        // Safety: image.data holds exactly width * height pixels and outlives the call.
        // Metal copies the bytes into the texture.
        unsafe {
            let data_ptr = std::ptr::NonNull::new(image.data.as_ptr().cast_mut().cast())
                .ok_or_else(|| {
                    TextureError::Gpu("Failed to create NonNull pointer for texture data".to_string())
                })?;

            texture.replaceRegion_mipmapLevel_withBytes_bytesPerRow(
                region,
                0,
                data_ptr,
                bytes_per_row,
            );
        }

        Ok(Self {
            texture,
            width,
            height,
            format,
        })
    }
}
