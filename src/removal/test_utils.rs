//! Mock background removers for testing the adapter and the controller
//!
//! These stand in for a real removal service so tests can exercise success,
//! failure and panic paths without network access.

use super::BackgroundRemover;
use crate::{
    error::{Result, SilhouetteError},
    raster::RasterBuffer,
    services::{ImageIOService, ProgressReporter, RemovalProgress},
    types::EncodedImage,
};
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex, Weak};

#[derive(Debug, Clone)]
enum Behavior {
    Cutout,
    Fail(String),
    FailWith(Arc<Mutex<Option<SilhouetteError>>>),
    Panic(String),
    Empty,
    Garbage,
}

/// Mock remover with call history
///
/// `cutout` makes the left half of every image transparent.
#[derive(Debug, Clone)]
pub(crate) struct MockRemover {
    behavior: Behavior,
    inputs: Arc<Mutex<Vec<EncodedImage>>>,
    outputs: Arc<Mutex<Vec<Weak<[u8]>>>>,
}

impl MockRemover {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            inputs: Arc::new(Mutex::new(Vec::new())),
            outputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn cutout() -> Self {
        Self::with_behavior(Behavior::Cutout)
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self::with_behavior(Behavior::Fail(message.to_string()))
    }

    pub(crate) fn failing_with(error: SilhouetteError) -> Self {
        Self::with_behavior(Behavior::FailWith(Arc::new(Mutex::new(Some(error)))))
    }

    pub(crate) fn panicking(message: &str) -> Self {
        Self::with_behavior(Behavior::Panic(message.to_string()))
    }

    pub(crate) fn empty() -> Self {
        Self::with_behavior(Behavior::Empty)
    }

    /// Succeeds with bytes that are not an image
    pub(crate) fn garbage() -> Self {
        Self::with_behavior(Behavior::Garbage)
    }

    pub(crate) fn call_count(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    /// Every encoded image this remover was asked to process
    pub(crate) fn inputs(&self) -> Vec<EncodedImage> {
        self.inputs.lock().unwrap().clone()
    }

    /// Whether any produced result is still held by somebody
    pub(crate) fn live_outputs(&self) -> usize {
        self.outputs
            .lock()
            .unwrap()
            .iter()
            .filter(|weak| weak.upgrade().is_some())
            .count()
    }

    /// PNG of a fully opaque image with a gradient so pixels differ
    pub(crate) fn opaque_png(width: u32, height: u32) -> EncodedImage {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 40) as u8, (y * 40) as u8, 90, 255])
        });
        let png = ImageIOService::encode_png(&RasterBuffer::from_rgba(image)).unwrap();
        EncodedImage::png(png)
    }

    fn cut_left_half(source: &EncodedImage) -> Result<Vec<u8>> {
        let raster = ImageIOService::decode(source, "mock input")?;
        let width = raster.width();
        let mut image = raster.into_image();
        for (x, _, pixel) in image.enumerate_pixels_mut() {
            if x < width / 2 {
                pixel[3] = 0;
            }
        }
        ImageIOService::encode_png(&RasterBuffer::from_rgba(image))
    }

    fn record_output(&self, bytes: Vec<u8>) -> EncodedImage {
        let shared: Arc<[u8]> = bytes.into();
        self.outputs.lock().unwrap().push(Arc::downgrade(&shared));
        EncodedImage::png(shared)
    }
}

#[async_trait]
impl BackgroundRemover for MockRemover {
    async fn remove_background(
        &self,
        source: EncodedImage,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<EncodedImage> {
        self.inputs.lock().unwrap().push(source.clone());
        progress.report_removal_progress(RemovalProgress::new("fetch:/models/isnet", 1, 2));

        match &self.behavior {
            Behavior::Cutout => {
                let bytes = Self::cut_left_half(&source)?;
                progress.report_removal_progress(RemovalProgress::new("fetch:/models/isnet", 2, 2));
                Ok(self.record_output(bytes))
            },
            Behavior::Fail(message) => Err(SilhouetteError::background_removal(message.clone())),
            Behavior::FailWith(slot) => Err(slot
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| SilhouetteError::background_removal("mock exhausted"))),
            Behavior::Panic(message) => panic!("{}", message),
            Behavior::Empty => Ok(EncodedImage::png(Vec::new())),
            Behavior::Garbage => Ok(self.record_output(b"definitely not a png".to_vec())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
