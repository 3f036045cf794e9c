//! Card thumbnails loaded through the active results source.

use std::collections::{HashMap, VecDeque};

use anyhow::{Context, Result};
use eframe::egui;
use plant_core::ResultsSource;

pub const THUMB_SIZE: u32 = 120;
const MAX_THUMBS: usize = 256;

/// LRU of thumbnail textures keyed by `image_path`. Failed loads are
/// remembered as `None` so a broken path is not retried every frame.
#[derive(Default)]
pub struct ThumbCache {
    thumbs: HashMap<String, Option<egui::TextureHandle>>,
    keys: VecDeque<String>,
}

impl ThumbCache {
    pub fn clear(&mut self) {
        self.thumbs.clear();
        self.keys.clear();
    }

    pub fn get_or_load(
        &mut self,
        ctx: &egui::Context,
        source: Option<&dyn ResultsSource>,
        image_path: &str,
    ) -> Option<egui::TextureId> {
        if let Some(entry) = self.thumbs.get(image_path) {
            let id = entry.as_ref().map(|t| t.id());
            self.touch(image_path);
            return id;
        }
        let source = source?;
        if image_path.trim().is_empty() {
            return None;
        }

        let texture = match load_thumb(source, image_path) {
            Ok(color) => Some(ctx.load_texture(
                format!("thumb:{image_path}"),
                color,
                egui::TextureOptions::LINEAR,
            )),
            Err(e) => {
                tracing::warn!("Failed to load thumbnail for {image_path}: {e:#}");
                None
            }
        };
        let id = texture.as_ref().map(|t| t.id());
        self.insert(image_path, texture);
        id
    }

    fn insert(&mut self, image_path: &str, texture: Option<egui::TextureHandle>) {
        self.thumbs.insert(image_path.to_string(), texture);
        self.keys.push_back(image_path.to_string());
        if self.thumbs.len() > MAX_THUMBS
            && let Some(old) = self.keys.pop_front()
        {
            self.thumbs.remove(&old);
        }
    }

    fn touch(&mut self, image_path: &str) {
        if let Some(pos) = self.keys.iter().position(|k| k == image_path)
            && let Some(key) = self.keys.remove(pos)
        {
            self.keys.push_back(key);
        }
    }
}

fn load_thumb(source: &dyn ResultsSource, image_path: &str) -> Result<egui::ColorImage> {
    let bytes = source
        .load_image(image_path)
        .with_context(|| format!("cannot read {image_path}"))?;
    let img = image::load_from_memory(&bytes).context("cannot decode image")?;
    let thumb = image::imageops::thumbnail(&img, THUMB_SIZE, THUMB_SIZE);
    let (w, h) = thumb.dimensions();
    let pixels = thumb.into_raw();
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        [w as usize, h as usize],
        &pixels,
    ))
}
