//! World texture loading.
//!
//! A texture source is a local path, a `file://` URL or an `http(s)://` URL.
//! Decoded images are reduced to a single luminance channel (red) which the
//! point field generator samples.

use crate::error::TextureError;
use crate::point_field::{self, PointField};
use image::DynamicImage;
use rand::prelude::*;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Maximum size for downloaded textures (16MB)
const MAX_TEXTURE_SIZE: u64 = 16 * 1024 * 1024;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Row-major 8-bit luminance buffer.
#[derive(Debug, Clone)]
pub struct LuminanceMap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl LuminanceMap {
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize {
            return Err(TextureError::InvalidDimensions(width, height));
        }
        Ok(Self { width, height, data })
    }

    /// Keeps the red channel; grayscale images expand to equal channels.
    pub fn from_image(image: &DynamicImage) -> Result<Self, TextureError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let data = rgb.pixels().map(|p| p.0[0]).collect();
        Self::from_raw(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luminance at normalized coordinates, `u` across and `v` down.
    pub fn sample_uv(&self, u: f64, v: f64) -> u8 {
        let x = (u * (self.width - 1) as f64).floor() as usize;
        let y = (v * (self.height - 1) as f64).floor() as usize;
        let x = x.min(self.width as usize - 1);
        let y = y.min(self.height as usize - 1);
        self.data[y * self.width as usize + x]
    }
}

/// Load and decode a texture synchronously.
pub fn load_luminance(source: &str) -> Result<LuminanceMap, TextureError> {
    let image = load_image(source, &AtomicBool::new(true))?;
    LuminanceMap::from_image(&image)
}

fn load_image(source: &str, alive: &AtomicBool) -> Result<DynamicImage, TextureError> {
    let bytes = if let Some(path) = source.strip_prefix("file://") {
        let path = urlencoding::decode(path).map_err(|_| TextureError::InvalidUrl(source.to_string()))?;
        std::fs::read(Path::new(path.as_ref()))?
    } else if source.starts_with("http://") || source.starts_with("https://") {
        fetch(source)?
    } else {
        std::fs::read(Path::new(source))?
    };

    if !alive.load(Ordering::Relaxed) {
        return Err(TextureError::Cancelled);
    }

    Ok(image::load_from_memory(&bytes)?)
}

fn fetch(url: &str) -> Result<Vec<u8>, TextureError> {
    let http_err = |message: String| TextureError::Http { url: url.to_string(), message };

    let response = ureq::get(url)
        .timeout(HTTP_TIMEOUT)
        .call()
        .map_err(|e| http_err(e.to_string()))?;

    if let Some(len) = response
        .header("Content-Length")
        .and_then(|s| s.parse::<u64>().ok())
    {
        if len > MAX_TEXTURE_SIZE {
            return Err(TextureError::TooLarge { limit: MAX_TEXTURE_SIZE });
        }
    }

    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_TEXTURE_SIZE + 1)
        .read_to_end(&mut bytes)?;

    if bytes.len() as u64 > MAX_TEXTURE_SIZE {
        return Err(TextureError::TooLarge { limit: MAX_TEXTURE_SIZE });
    }
    Ok(bytes)
}

/// Parameters for one background point field build.
#[derive(Debug, Clone)]
pub struct PointFieldRequest {
    pub texture: Option<String>,
    pub count: usize,
    pub radius: f64,
    pub seed: u64,
}

/// Loads a texture and generates its point field off the render thread.
///
/// Dropping the loader marks it dead; the worker checks the flag between
/// steps and discards its result instead of sending into a torn-down scene.
pub struct PointFieldLoader {
    alive: Arc<AtomicBool>,
    receiver: Receiver<PointField>,
    done: bool,
}

impl PointFieldLoader {
    pub fn spawn(request: PointFieldRequest) -> Self {
        let (tx, rx) = mpsc::channel();
        let alive = Arc::new(AtomicBool::new(true));
        let worker_alive = alive.clone();

        thread::spawn(move || {
            if let Some(field) = build_point_field(&request, &worker_alive) {
                if worker_alive.load(Ordering::Relaxed) {
                    let _ = tx.send(field);
                }
            }
        });

        Self { alive, receiver: rx, done: false }
    }

    /// Returns the point field once, the first time it is polled after
    /// the worker finishes.
    pub fn poll(&mut self) -> Option<PointField> {
        if self.done {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(field) => {
                self.done = true;
                Some(field)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                None
            }
        }
    }
}

impl Drop for PointFieldLoader {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
    }
}

/// Resolve the texture (if any) and run the generator, degrading to the
/// uniform branch when the texture cannot be used. Returns `None` only when
/// `alive` was cleared mid-build.
pub fn build_point_field(request: &PointFieldRequest, alive: &AtomicBool) -> Option<PointField> {
    let mut rng = StdRng::seed_from_u64(request.seed);

    let luminance = match request.texture.as_deref() {
        None => None,
        Some(source) => match load_image(source, alive).and_then(|img| LuminanceMap::from_image(&img)) {
            Ok(map) => {
                tracing::debug!(source, width = map.width(), height = map.height(), "texture decoded");
                Some(map)
            }
            Err(TextureError::Cancelled) => return None,
            Err(e) => {
                tracing::warn!(source, error = %e, "failed to load earth texture, falling back to uniform sampling");
                None
            }
        },
    };

    if !alive.load(Ordering::Relaxed) {
        return None;
    }
    Some(point_field::generate(request.count, request.radius, luminance.as_ref(), &mut rng))
}
