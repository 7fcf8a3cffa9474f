//! Error handling and edge case testing
//!
//! Covers rejected inputs, decode failures in both pipeline branches, late
//! removal results after a reset, and boundary values of the color codec.

mod common;

use common::{png_upload, FixedRemover, GatedRemover};
use imgly_silhouette::{
    format_hex, parse_hex, silhouette_from_bytes, try_parse_hex, ColorInput, Dispatch,
    EncodedImage, ImageUpload, PipelineCommand, PipelineConfig, PipelineController,
    PipelinePhase, RasterBuffer, Rgb, SilhouetteError, SilhouetteFilter,
};
use std::sync::Arc;

#[test]
fn test_non_image_upload_is_rejected() {
    let mut controller = PipelineController::without_removal(PipelineConfig::default()).unwrap();

    for media_type in ["text/plain", "application/pdf", "", "imagepng"] {
        let err = controller
            .dispatch(PipelineCommand::Upload(ImageUpload::new(b"data".to_vec(), media_type)))
            .unwrap_err();
        assert!(
            matches!(err, SilhouetteError::InvalidInputType(_)),
            "{media_type:?} should be rejected"
        );
    }
    assert_eq!(controller.phase(), PipelinePhase::Idle);
    assert!(controller.original().is_none());
}

#[test]
fn test_image_type_with_garbage_bytes_is_a_decode_failure() {
    let mut controller = PipelineController::without_removal(PipelineConfig::default()).unwrap();
    controller.dispatch(PipelineCommand::Upload(png_upload(2, 2))).unwrap();

    let err = controller
        .dispatch(PipelineCommand::Upload(ImageUpload::new(
            b"\x89PNG but not really".to_vec(),
            "image/png",
        )))
        .unwrap_err();
    assert!(matches!(err, SilhouetteError::Decode(_)));

    // Back to the upload zone, nothing half-loaded left behind
    assert_eq!(controller.phase(), PipelinePhase::Idle);
    assert!(controller.original().is_none());
    assert!(controller.source().is_none());
    assert!(controller.silhouette().is_none());
    assert!(controller.last_error().unwrap().contains("Decode"));
}

#[tokio::test]
async fn test_undecodable_removal_result_returns_to_idle() {
    let remover = FixedRemover(EncodedImage::png(b"not a png".to_vec()));
    let config = PipelineConfig::builder().remove_background(true).build().unwrap();
    let mut controller = PipelineController::new(config, Arc::new(remover)).unwrap();

    let err = controller
        .handle(PipelineCommand::Upload(png_upload(2, 2)))
        .await
        .unwrap_err();
    assert!(matches!(err, SilhouetteError::Decode(_)));
    assert_eq!(controller.phase(), PipelinePhase::Idle);
    assert!(!controller.is_processing());

    // Recoverable: the next upload is accepted
    controller
        .handle(PipelineCommand::ToggleBackgroundRemoval(false))
        .await
        .unwrap();
    controller.handle(PipelineCommand::Upload(png_upload(1, 1))).await.unwrap();
    assert_eq!(controller.phase(), PipelinePhase::Ready);
}

#[tokio::test]
async fn test_empty_removal_result_falls_back() {
    let remover = FixedRemover(EncodedImage::png(Vec::new()));
    let config = PipelineConfig::builder().remove_background(true).build().unwrap();
    let mut controller = PipelineController::new(config, Arc::new(remover)).unwrap();

    let dispatch = controller.handle(PipelineCommand::Upload(png_upload(2, 2))).await.unwrap();
    assert!(matches!(dispatch, Dispatch::RenderedFromOriginal { .. }));
}

#[tokio::test]
async fn test_late_result_after_reset_is_discarded() {
    let (remover, release) = GatedRemover::new();
    let config = PipelineConfig::builder().remove_background(true).build().unwrap();
    let mut controller = PipelineController::new(config, Arc::new(remover)).unwrap();

    let Dispatch::RemovalStarted(pending) = controller
        .dispatch(PipelineCommand::Upload(png_upload(2, 2)))
        .unwrap()
    else {
        panic!("expected background removal to start");
    };
    controller.dispatch(PipelineCommand::Reset).unwrap();
    assert!(controller.is_processing());

    release.send(()).unwrap();
    let outcome = pending.run().await;
    assert!(outcome.result.is_ok());

    let dispatch = controller.complete_removal(outcome).unwrap();
    assert!(matches!(dispatch, Dispatch::Discarded));
    assert_eq!(controller.phase(), PipelinePhase::Idle);
    assert!(controller.silhouette().is_none());
    assert!(!controller.is_processing());
}

#[test]
fn test_toggle_without_upload_only_records_setting() {
    let mut controller = PipelineController::without_removal(PipelineConfig::default()).unwrap();
    let dispatch = controller
        .dispatch(PipelineCommand::ToggleBackgroundRemoval(true))
        .unwrap();
    assert!(matches!(dispatch, Dispatch::Unchanged));
    assert!(controller.remove_background());
    assert!(!controller.is_processing());
}

#[test]
fn test_download_before_any_upload() {
    let controller = PipelineController::without_removal(PipelineConfig::default()).unwrap();
    assert!(matches!(
        controller.download(),
        Err(SilhouetteError::NothingToExport(_))
    ));
}

#[test]
fn test_invalid_pipeline_config_is_rejected() {
    for name in ["", "out.jpg", "dir/out.png"] {
        let config = PipelineConfig {
            download_file_name: name.to_string(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            PipelineController::without_removal(config),
            Err(SilhouetteError::InvalidConfig(_))
        ));
    }
}

#[test]
fn test_picker_value_garbage_falls_back_to_black() {
    let mut controller = PipelineController::without_removal(PipelineConfig::default()).unwrap();
    controller.on_color_change(ColorInput::Picker("#FFFFFF".into()));
    controller.on_color_change(ColorInput::Picker("bogus".into()));
    assert_eq!(controller.color(), Rgb::BLACK);
}

#[test]
fn test_color_codec_boundaries() {
    assert_eq!(parse_hex("#000000"), Rgb::new(0, 0, 0));
    assert_eq!(parse_hex("#ffffff"), Rgb::new(255, 255, 255));
    assert_eq!(format_hex(Rgb::new(255, 255, 255)), "#FFFFFF");
    assert_eq!(format_hex(Rgb::new(0, 1, 15)), "#00010F");

    for bad in ["#FFF", "#GGGGGG", "##FFFFFF", "#FFFFFFF", "#+1+1+1", ""] {
        assert!(try_parse_hex(bad).is_err(), "{bad:?} should be rejected");
    }
}

#[test]
fn test_zero_sized_raster_is_a_no_op() {
    let mut raster = RasterBuffer::from_raw(0, 0, Vec::new()).unwrap();
    SilhouetteFilter::apply(&mut raster, Rgb::new(1, 2, 3));
    assert_eq!(raster.pixel_count(), 0);
    assert!(raster.pixels().is_empty());
}

#[test]
fn test_mismatched_raw_length_is_rejected() {
    let err = RasterBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
    assert!(matches!(err, SilhouetteError::InvalidRaster(_)));
}

#[test]
fn test_fully_transparent_image_is_unchanged() {
    let raster = RasterBuffer::from_raw(2, 1, vec![9, 8, 7, 0, 1, 2, 3, 0]).unwrap();
    let png = imgly_silhouette::ImageIOService::encode_png(&raster).unwrap();

    let silhouette = silhouette_from_bytes(&png, Rgb::new(255, 0, 0)).unwrap();
    assert_eq!(silhouette.pixels(), raster.pixels());
}
