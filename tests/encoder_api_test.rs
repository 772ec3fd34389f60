//! Integration tests for the public GifEncoder API.

mod common;

use std::sync::{Arc, Mutex};

use base64::Engine;
use common::*;
use gif_quant::{DisposalMethod, DitherMode, Rgba};
use gifloom::models::PaletteEntry;
use gifloom::{EncoderConfig, EncoderError, FrameOptions, GifEncoder};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_encode_animation() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder.set_delay(0.05);
    for shade in [0u8, 80, 160, 240] {
        encoder
            .add_frame(solid(8, 6, Rgba::opaque(shade, 100, 255 - shade)), FrameOptions::default())
            .unwrap();
    }
    assert_eq!(encoder.frame_count(), 4);

    let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
    assert_eq!((gif.width, gif.height), (8, 6));
    assert_eq!(gif.repeat, Some(0));
    assert_eq!(gif.frames.len(), 4);
    assert!(gif.frames.iter().all(|f| f.delay == 5));
    assert_indices_in_range(&gif);
}

#[tokio::test]
async fn test_frames_keep_submission_order() {
    let mut config = test_config();
    config.num_workers = 3;
    config.dithering = DitherMode::FloydSteinberg;
    let mut encoder = GifEncoder::new(config).unwrap();

    // Larger frames first so later jobs tend to finish earlier
    let shades = [10u8, 60, 110, 160, 210];
    for (i, shade) in shades.iter().enumerate() {
        let frame = if i == 0 { gradient(8, 6) } else { solid(8, 6, Rgba::opaque(*shade, *shade, *shade)) };
        encoder.add_frame(frame, FrameOptions::default()).unwrap();
    }

    let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
    assert_eq!(gif.frames.len(), 5);
    for (frame, shade) in gif.frames.iter().zip(shades).skip(1) {
        let color = frame.palette[frame.indices[0] as usize];
        assert_eq!(color, Rgba::opaque(shade, shade, shade));
    }
}

#[tokio::test]
async fn test_white_frame_with_two_color_palette() {
    let config = EncoderConfig {
        palette: Some(vec![PaletteEntry::Rgb(0xFFFFFF), PaletteEntry::Rgb(0x000000)]),
        ..test_config()
    };
    let mut encoder = GifEncoder::new(config).unwrap();
    encoder.add_frame(solid(2, 2, WHITE), FrameOptions::default()).unwrap();

    let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
    assert_eq!(gif.global_palette.as_deref(), Some(&[WHITE, BLACK][..]));
    let frame = &gif.frames[0];
    assert!(!frame.has_local_palette);
    assert_eq!(frame.indices, vec![0; 4]);
}

#[tokio::test]
async fn test_three_color_palette_is_trimmed() {
    let config = EncoderConfig {
        palette: Some(vec![
            PaletteEntry::Hex("#FF0000".to_string()),
            PaletteEntry::Hex("#FF00FF".to_string()),
            PaletteEntry::Hex("#FFFFFF".to_string()),
        ]),
        ..test_config()
    };
    let (encoder, logs) = capture_warnings(|| GifEncoder::new(config));
    let mut encoder = encoder.unwrap();
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("palette size is not a power of two"), "{logs}");
    assert!(logs.contains("len=3"), "{logs}");

    encoder.add_frame(solid(2, 2, WHITE), FrameOptions::default()).unwrap();

    let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
    assert_eq!(
        gif.global_palette.unwrap(),
        vec![Rgba::opaque(255, 0, 0), Rgba::opaque(255, 0, 255)]
    );
}

#[tokio::test]
async fn test_valid_palette_logs_no_warning() {
    let config = EncoderConfig {
        palette: Some(vec![PaletteEntry::Rgb(0xFFFFFF), PaletteEntry::Rgb(0x000000)]),
        ..test_config()
    };
    let (encoder, logs) = capture_warnings(|| GifEncoder::new(config));
    encoder.unwrap();
    assert_eq!(logs, "");
}

#[tokio::test]
async fn test_single_transparent_pixel() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder
        .add_frame(solid(1, 1, CLEAR), FrameOptions::new().transparency_cut_off(0.7))
        .unwrap();

    let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
    let frame = &gif.frames[0];
    let index = frame.transparent_index.expect("frame should be transparent");
    let sentinel = frame.palette[index as usize];
    assert_ne!(sentinel.to_rgb_hex(), 0x000000);
    assert_eq!(frame.indices, vec![index]);
}

#[tokio::test]
async fn test_transparent_background() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder
        .add_frame(
            disc(12, Rgba::opaque(250, 200, 0)),
            FrameOptions::new().disposal(DisposalMethod::Background),
        )
        .unwrap();

    let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
    let frame = &gif.frames[0];
    let index = frame.transparent_index.unwrap();
    assert_eq!(frame.disposal, DisposalMethod::Background);
    // corners are outside the disc, the center inside
    assert_eq!(frame.indices[0], index);
    assert_ne!(frame.indices[6 * 12 + 6], index);
}

#[tokio::test]
async fn test_black_sprite_on_transparent_background() {
    let mut pixels = vec![BLACK; 16];
    pixels[0] = CLEAR;
    for px in &mut pixels[8..] {
        *px = Rgba::opaque(255, 0, 0);
    }
    let frame = gif_quant::Frame::from_pixels(4, 4, &pixels).unwrap();

    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder.add_frame(frame, FrameOptions::default()).unwrap();

    let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
    let frame = &gif.frames[0];
    let index = frame.transparent_index.unwrap();
    assert_eq!(frame.indices[0], index);

    let opaque_as_transparent = frame.indices[1..].iter().filter(|&&i| i == index).count();
    assert_eq!(opaque_as_transparent, 0);
    for &i in &frame.indices[1..8] {
        assert_eq!(frame.palette[i as usize], BLACK);
    }
    for &i in &frame.indices[8..] {
        assert_eq!(frame.palette[i as usize], Rgba::opaque(255, 0, 0));
    }
}

#[tokio::test]
async fn test_repeat_and_delay_settings() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder.set_repeat(None);
    encoder.set_delay(0.2);
    encoder.add_frame(solid(3, 3, WHITE), FrameOptions::default()).unwrap();
    encoder.set_delay(1.0);
    encoder.add_frame(solid(3, 3, BLACK), FrameOptions::default()).unwrap();

    let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
    assert_eq!(gif.repeat, None);
    assert_eq!(gif.frames[0].delay, 20);
    assert_eq!(gif.frames[1].delay, 100);
}

#[tokio::test]
async fn test_base64_output() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder.add_frame(gradient(5, 5), FrameOptions::default()).unwrap();

    let blob = encoder.get_blob_gif().await.unwrap();
    let text = encoder.get_base64_gif().await.unwrap();
    let decoded = base64::engine::general_purpose::STANDARD.decode(text).unwrap();
    assert_eq!(decoded, blob);
}

#[tokio::test]
async fn test_progress_reaches_completion() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    let sink = seen.clone();
    encoder.on_render_progress(move |p| sink.lock().unwrap().push(p));

    for _ in 0..3 {
        encoder.add_frame(gradient(6, 6), FrameOptions::default()).unwrap();
    }
    encoder.get_blob_gif().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(*seen.last().unwrap(), 1.0);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_mismatched_frame_size() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder.set_size(4, 4);
    encoder.add_frame(solid(4, 4, WHITE), FrameOptions::default()).unwrap();
    encoder.add_frame(solid(5, 4, WHITE), FrameOptions::default()).unwrap();

    assert!(matches!(
        encoder.get_blob_gif().await,
        Err(EncoderError::Gif(gif_quant::GifError::FrameSizeMismatch { frame: 1, .. }))
    ));
}

#[tokio::test]
async fn test_zero_workers() {
    let config = EncoderConfig {
        num_workers: 0,
        ..EncoderConfig::default()
    };
    let mut encoder = GifEncoder::new(config).unwrap();
    assert!(matches!(
        encoder.add_frame(solid(1, 1, WHITE), FrameOptions::default()),
        Err(EncoderError::ResourceExhausted(_))
    ));
}

#[tokio::test]
async fn test_destroy() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder.add_frame(solid(2, 2, WHITE), FrameOptions::default()).unwrap();
    encoder.destroy();

    assert!(matches!(
        encoder.add_frame(solid(2, 2, WHITE), FrameOptions::default()),
        Err(EncoderError::ResourceExhausted(_))
    ));
    assert!(matches!(
        encoder.get_blob_gif().await,
        Err(EncoderError::ResourceExhausted(_))
    ));
}

#[tokio::test]
async fn test_no_frames() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    assert!(matches!(encoder.get_blob_gif().await, Err(EncoderError::NoFrames)));
}

#[tokio::test]
async fn test_finalized_encoder_rejects_frames() {
    let mut encoder = GifEncoder::new(test_config()).unwrap();
    encoder.add_frame(solid(2, 2, WHITE), FrameOptions::default()).unwrap();
    let first = encoder.get_blob_gif().await.unwrap();
    assert_eq!(encoder.get_blob_gif().await.unwrap(), first);
    assert!(matches!(
        encoder.add_frame(solid(2, 2, WHITE), FrameOptions::default()),
        Err(EncoderError::Finalized)
    ));
}

#[test]
fn test_requires_runtime() {
    assert!(matches!(
        GifEncoder::new(test_config()),
        Err(EncoderError::Runtime(_))
    ));
}

#[tokio::test]
async fn test_every_dither_mode_encodes() {
    for mode in DitherMode::ALL {
        let mut config = test_config();
        config.dithering = mode;
        config.max_colors = 8;
        let mut encoder = GifEncoder::new(config).unwrap();
        encoder.add_frame(gradient(9, 7), FrameOptions::default()).unwrap();
        let gif = assert_gif(&encoder.get_blob_gif().await.unwrap());
        assert!(gif.frames[0].palette.len() <= 8, "mode {mode}");
        assert_indices_in_range(&gif);
    }
}
