//! Source of the generic folder cover image.
//!
//! Folders have no cover of their own. The collection shows one shared
//! placeholder, generated once per thumbnail height and cached under the
//! reserved id [`FOLDER_COVER_ID`].

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use super::ThumbnailError;

/// Reserved cache id of the folder placeholder: the CRC-32 of `"folder.png"`.
pub const FOLDER_COVER_ID: u32 = 0xa38b_a0ff;

/// Provides the raw bytes of the folder placeholder image.
pub trait PlaceholderSource: Send + Sync {
    /// Encoded image bytes in any format the thumbnail decoder accepts.
    fn bytes(&self) -> Result<Vec<u8>, ThumbnailError>;
}

/// Fixed placeholder bytes, e.g. a bundled `folder.png`.
#[derive(Debug, Clone)]
pub struct StaticPlaceholder(pub Vec<u8>);

impl PlaceholderSource for StaticPlaceholder {
    fn bytes(&self) -> Result<Vec<u8>, ThumbnailError> {
        Ok(self.0.clone())
    }
}

/// Draws a plain folder glyph.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedFolderIcon;

const ICON_WIDTH: u32 = 256;
const ICON_HEIGHT: u32 = 200;
const TAB_WIDTH: u32 = 100;
const TAB_HEIGHT: u32 = 28;
const BACK: Rgba<u8> = Rgba([222, 170, 64, 255]);
const FRONT: Rgba<u8> = Rgba([244, 196, 86, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

impl GeneratedFolderIcon {
    fn draw() -> RgbaImage {
        RgbaImage::from_fn(ICON_WIDTH, ICON_HEIGHT, |x, y| {
            let in_tab = x >= 8 && x < 8 + TAB_WIDTH && y >= 8 && y < 8 + TAB_HEIGHT;
            let in_back = x >= 8 && x < ICON_WIDTH - 8 && y >= 8 + TAB_HEIGHT && y < ICON_HEIGHT - 8;
            let in_front =
                x >= 16 && x < ICON_WIDTH - 16 && y >= 8 + TAB_HEIGHT + 20 && y < ICON_HEIGHT - 16;

            if in_front {
                FRONT
            } else if in_tab || in_back {
                BACK
            } else {
                CLEAR
            }
        })
    }
}

impl PlaceholderSource for GeneratedFolderIcon {
    fn bytes(&self) -> Result<Vec<u8>, ThumbnailError> {
        let mut buf = Cursor::new(Vec::new());
        Self::draw()
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(ThumbnailError::Encode)?;
        Ok(buf.into_inner())
    }
}
