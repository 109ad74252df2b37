//! Decoding image files into [`PixelBuffer`]s.
//!
//! JPEG support comes from `jpeg-decoder` (feature `jpeg-decode`) and PNG
//! support from `png` (feature `png-decode`). The format is sniffed from
//! the leading bytes, not the extension.
//!
//! ```ignore
//! use vegmask::decode::{decode_file, discover_images};
//!
//! for path in discover_images("./plots".as_ref())? {
//!     let buffer = decode_file(&path)?;
//!     println!("{}: {}x{}", path.display(), buffer.width(), buffer.height());
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::BatchImage;
use crate::error::{Error, Result};
use crate::pixels::PixelBuffer;

/// Extensions picked up by [`discover_images`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn decode_error(path: &Path, reason: impl Into<String>) -> Error {
    Error::Decode {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Decode an in-memory JPEG or PNG. `path` is only used in error messages.
pub fn decode_bytes(data: &[u8], path: &Path) -> Result<PixelBuffer> {
    if data.starts_with(JPEG_MAGIC) {
        decode_jpeg(data, path)
    } else if data.starts_with(PNG_MAGIC) {
        decode_png(data, path)
    } else {
        Err(decode_error(path, "unrecognized image format"))
    }
}

/// Read and decode an image file.
pub fn decode_file(path: &Path) -> Result<PixelBuffer> {
    let data = fs::read(path)
        .map_err(|e| decode_error(path, e.to_string()))?;
    decode_bytes(&data, path)
}

#[cfg(feature = "jpeg-decode")]
fn decode_jpeg(data: &[u8], path: &Path) -> Result<PixelBuffer> {
    use std::io::Cursor;

    let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(data));
    let pixels = decoder
        .decode()
        .map_err(|e| decode_error(path, e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| decode_error(path, "missing JPEG info after decode"))?;

    let width = usize::from(info.width);
    let height = usize::from(info.height);

    let data = match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => pixels,
        jpeg_decoder::PixelFormat::L8 => pixels.iter().flat_map(|&g| [g, g, g]).collect(),
        jpeg_decoder::PixelFormat::L16 => pixels
            .chunks_exact(2)
            .flat_map(|c| [c[0], c[0], c[0]])
            .collect(),
        jpeg_decoder::PixelFormat::CMYK32 => {
            return Err(decode_error(path, "CMYK JPEGs are not supported"));
        }
    };

    Ok(PixelBuffer::RgbBytes {
        data,
        width,
        height,
    })
}

#[cfg(not(feature = "jpeg-decode"))]
fn decode_jpeg(_data: &[u8], path: &Path) -> Result<PixelBuffer> {
    Err(decode_error(path, "built without JPEG support"))
}

#[cfg(feature = "png-decode")]
fn decode_png(data: &[u8], path: &Path) -> Result<PixelBuffer> {
    use std::io::Cursor;

    let mut decoder = png::Decoder::new(Cursor::new(data));
    let transformations = png::Transformations::EXPAND | png::Transformations::STRIP_16;
    decoder.set_transformations(transformations);
    let mut reader = decoder
        .read_info()
        .map_err(|e| decode_error(path, format!("reading PNG header: {e}")))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| decode_error(path, "PNG output buffer size unavailable"))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| decode_error(path, e.to_string()))?;
    buf.truncate(info.buffer_size());

    let width = info.width as usize;
    let height = info.height as usize;

    Ok(match info.color_type {
        png::ColorType::Rgb => PixelBuffer::RgbBytes {
            data: buf,
            width,
            height,
        },
        png::ColorType::Rgba => PixelBuffer::RgbaBytes {
            data: buf,
            width,
            height,
        },
        png::ColorType::Grayscale => PixelBuffer::RgbBytes {
            data: buf.iter().flat_map(|&g| [g, g, g]).collect(),
            width,
            height,
        },
        png::ColorType::GrayscaleAlpha => PixelBuffer::RgbaBytes {
            data: buf
                .chunks_exact(2)
                .flat_map(|c| [c[0], c[0], c[0], c[1]])
                .collect(),
            width,
            height,
        },
        other => {
            let reason = format!("unsupported PNG color type {other:?}");
            return Err(decode_error(path, reason));
        }
    })
}

#[cfg(not(feature = "png-decode"))]
fn decode_png(_data: &[u8], path: &Path) -> Result<PixelBuffer> {
    Err(decode_error(path, "built without PNG support"))
}

fn has_supported_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.starts_with('.'))
}

/// List image files directly inside `dir`, sorted by file name.
///
/// Hidden files are skipped.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        let reason = format!("not a directory: {}", dir.display());
        return Err(Error::invalid(reason));
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_supported_extension(p))
        .filter(|p| !is_hidden(p))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Decode files in order, named by their file name.
///
/// Stops at the first file that fails to decode.
pub fn load_batch(paths: &[PathBuf]) -> Result<Vec<BatchImage>> {
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let buffer = decode_file(path).map_err(|e| Error::BatchAborted {
                filename: name.clone(),
                source: Box::new(e),
            })?;
            Ok(BatchImage::new(name, buffer))
        })
        .collect()
}
