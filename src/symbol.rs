//! Symbol Encoder - serial number to QR raster
//!
//! Modules are drawn at `box_size` pixels inside a quiet zone, then the
//! whole symbol is resampled to a fixed square with Lanczos3.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Smallest quiet zone the encoder will draw, in modules
pub const MIN_BORDER: u32 = 2;

#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("Payload does not fit in a QR symbol: {0}")]
    Capacity(String),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Raster geometry for the symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSpec {
    /// Output edge length in pixels
    #[serde(default = "default_size")]
    pub size: u32,
    /// Pixels per module before resampling
    #[serde(default = "default_box_size")]
    pub box_size: u32,
    /// Quiet zone width in modules
    #[serde(default = "default_border")]
    pub border: u32,
}

fn default_size() -> u32 { 150 }
fn default_box_size() -> u32 { 10 }
fn default_border() -> u32 { MIN_BORDER }

impl Default for SymbolSpec {
    fn default() -> Self {
        Self {
            size: default_size(),
            box_size: default_box_size(),
            border: default_border(),
        }
    }
}

/// A rendered symbol and the payload it encodes
#[derive(Debug, Clone)]
pub struct SymbolImage {
    payload: String,
    modules: u32,
    raster: GrayImage,
}

impl SymbolImage {
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Modules per side, quiet zone excluded
    pub fn modules(&self) -> u32 {
        self.modules
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    pub fn raster(&self) -> &GrayImage {
        &self.raster
    }

    /// Encode as PNG in memory, for previews
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, SymbolError> {
        self.encode_as(ImageFormat::Png)
    }

    /// Encode in any compiled-in container format
    pub fn encode_as(&self, format: ImageFormat) -> Result<Vec<u8>, SymbolError> {
        let mut buf = Cursor::new(Vec::new());
        self.raster.write_to(&mut buf, format)?;
        Ok(buf.into_inner())
    }
}

/// Builds QR symbols at the highest error-correction level
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolEncoder {
    spec: SymbolSpec,
}

impl SymbolEncoder {
    pub fn new(spec: SymbolSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &SymbolSpec {
        &self.spec
    }

    /// Encode `payload` into a `size`×`size` raster.
    ///
    /// The smallest version that holds the payload at level H is chosen, so
    /// longer payloads grow the symbol without changing the output size.
    pub fn encode(&self, payload: &str) -> Result<SymbolImage, SymbolError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
            .map_err(|e| SymbolError::Capacity(e.to_string()))?;

        let modules = code.width() as u32;
        let colors = code.to_colors();
        let border = self.spec.border.max(MIN_BORDER);
        let box_size = self.spec.box_size.max(1);
        let edge = (modules + 2 * border) * box_size;

        let raw = GrayImage::from_fn(edge, edge, |x, y| {
            let mx = (x / box_size).checked_sub(border);
            let my = (y / box_size).checked_sub(border);
            match (mx, my) {
                (Some(mx), Some(my)) if mx < modules && my < modules => {
                    match colors[(my * modules + mx) as usize] {
                        Color::Dark => DARK,
                        Color::Light => LIGHT,
                    }
                }
                _ => LIGHT,
            }
        });

        let raster = imageops::resize(&raw, self.spec.size, self.spec.size, FilterType::Lanczos3);

        tracing::debug!(
            payload,
            modules,
            version = ?code.version(),
            size = self.spec.size,
            "Encoded symbol"
        );

        Ok(SymbolImage {
            payload: payload.to_string(),
            modules,
            raster,
        })
    }
}
