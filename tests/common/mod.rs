//! Shared fixtures and stand-in background removers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use imgly_silhouette::{
    BackgroundRemover, EncodedImage, ImageIOService, ImageUpload, ProgressReporter, RasterBuffer,
    RemovalProgress, Result, SilhouetteError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Opaque gradient image so neighbouring pixels differ
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 30) as u8, (y * 30) as u8, 200, 255])
    })
}

pub fn png_bytes(image: RgbaImage) -> Vec<u8> {
    ImageIOService::encode_png(&RasterBuffer::from_rgba(image)).unwrap()
}

pub fn opaque_png(width: u32, height: u32) -> Vec<u8> {
    png_bytes(gradient_image(width, height))
}

pub fn png_upload(width: u32, height: u32) -> ImageUpload {
    ImageUpload::new(opaque_png(width, height), "image/png").with_file_name("photo.png")
}

/// Left half transparent, right half untouched
pub fn cut_left_half(source: &EncodedImage) -> Result<EncodedImage> {
    let raster = ImageIOService::decode(source, "test input")?;
    let width = raster.width();
    let mut image = raster.into_image();
    for (x, _, pixel) in image.enumerate_pixels_mut() {
        if x < width / 2 {
            pixel[3] = 0;
        }
    }
    Ok(EncodedImage::png(png_bytes(image)))
}

/// Remover that cuts the left half away and counts its calls
#[derive(Default)]
pub struct CutoutRemover {
    calls: AtomicUsize,
    inputs: Mutex<Vec<Vec<u8>>>,
}

impl CutoutRemover {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<Vec<u8>> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackgroundRemover for CutoutRemover {
    async fn remove_background(
        &self,
        source: EncodedImage,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<EncodedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(source.bytes().to_vec());
        progress.report_removal_progress(RemovalProgress::new("compute:inference", 1, 1));
        cut_left_half(&source)
    }

    fn name(&self) -> &str {
        "cutout"
    }
}

/// Remover that always fails
pub struct FailingRemover(pub &'static str);

#[async_trait]
impl BackgroundRemover for FailingRemover {
    async fn remove_background(
        &self,
        _source: EncodedImage,
        _progress: Arc<dyn ProgressReporter>,
    ) -> Result<EncodedImage> {
        Err(SilhouetteError::background_removal(self.0))
    }
}

/// Remover returning a fixed encoded image
pub struct FixedRemover(pub EncodedImage);

#[async_trait]
impl BackgroundRemover for FixedRemover {
    async fn remove_background(
        &self,
        _source: EncodedImage,
        _progress: Arc<dyn ProgressReporter>,
    ) -> Result<EncodedImage> {
        Ok(self.0.clone())
    }
}

/// Remover that holds every call until the test releases it
pub struct GatedRemover {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedRemover {
    pub fn new() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                gate: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl BackgroundRemover for GatedRemover {
    async fn remove_background(
        &self,
        source: EncodedImage,
        _progress: Arc<dyn ProgressReporter>,
    ) -> Result<EncodedImage> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.await
                .map_err(|_| SilhouetteError::background_removal("gate dropped"))?;
        }
        cut_left_half(&source)
    }
}

/// Progress reporter that records every removal progress triple
#[derive(Default)]
pub struct RecordingProgress {
    pub progress: Mutex<Vec<RemovalProgress>>,
    pub errors: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingProgress {
    fn report_stage(&self, _stage: imgly_silhouette::ProcessingStage) {}

    fn report_removal_progress(&self, progress: RemovalProgress) {
        self.progress.lock().unwrap().push(progress);
    }

    fn report_error(&self, _stage: imgly_silhouette::ProcessingStage, error: &str) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}
