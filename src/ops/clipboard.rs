// ============================================================================
// CLIPBOARD — copy the rendered chart image to the OS clipboard
// ============================================================================

use image::RgbaImage;

/// Write an RGBA image to the system clipboard.
/// arboard wants ImageData { width, height, bytes } in RGBA order.
pub fn copy_image(image: &RgbaImage) -> Result<(), String> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| format!("Clipboard unavailable: {}", e))?;
    let data = arboard::ImageData {
        width: image.width() as usize,
        height: image.height() as usize,
        bytes: std::borrow::Cow::Borrowed(image.as_raw()),
    };
    clipboard
        .set_image(data)
        .map_err(|e| format!("Clipboard copy failed: {}", e))
}
