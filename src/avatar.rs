use eframe::egui::ColorImage;
use tracing::debug;

use crate::normalize::PLACEHOLDER_AVATAR;

/// Downloads and decodes the uploader's profile picture, falling back to the
/// placeholder image when the given URL does not yield a usable picture.
/// Blocking: run it off the UI thread.
pub fn fetch_avatar(url: &str) -> Option<ColorImage> {
    fetch_image(url).or_else(|| {
        debug!(%url, "avatar failed to load, using placeholder");
        (url != PLACEHOLDER_AVATAR)
            .then(|| fetch_image(PLACEHOLDER_AVATAR))
            .flatten()
    })
}

fn fetch_image(url: &str) -> Option<ColorImage> {
    let resp = reqwest::blocking::get(url).ok()?.error_for_status().ok()?.bytes().ok()?;
    decode(&resp)
}

/// Raw bytes to an egui image; `None` for anything `image` cannot read.
pub fn decode(bytes: &[u8]) -> Option<ColorImage> {
    let img = image::load_from_memory(bytes).ok()?.to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, &img))
}
