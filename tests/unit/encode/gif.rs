use std::io::BufReader;
use std::path::PathBuf;

use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;

use super::*;

fn out_path(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_encode_gif");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn writes_every_frame_in_order() {
    let path = out_path("three.gif");
    let frames = vec![
        PixelArray::new_filled(4, 4, [255, 0, 0]),
        PixelArray::new_filled(4, 4, [0, 255, 0]),
        PixelArray::new_filled(4, 4, [0, 0, 255]),
    ];
    encode_gif(&frames, 100, &path).unwrap();

    let decoder = GifDecoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
    let decoded = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(decoded.len(), 3);

    let first = decoded[0].buffer().get_pixel(0, 0).0;
    let last = decoded[2].buffer().get_pixel(0, 0).0;
    assert!(first[0] > 200 && first[2] < 50);
    assert!(last[2] > 200 && last[0] < 50);

    let (numer, denom) = decoded[1].delay().numer_denom_ms();
    assert_eq!(numer / denom, 100);
}

#[test]
fn empty_frame_list_is_rejected() {
    let path = out_path("empty.gif");
    assert!(matches!(
        encode_gif(&[], 100, &path),
        Err(MergeError::Validation(_))
    ));
    assert!(!path.exists());
}

#[test]
fn rgba_conversion_is_opaque() {
    let rgba = to_rgba(&PixelArray::new_filled(1, 2, [7, 8, 9])).unwrap();
    assert_eq!(rgba.get_pixel(0, 1).0, [7, 8, 9, 255]);
}

#[test]
fn smaller_frames_are_padded_to_the_largest() {
    let path = out_path("mixed.gif");
    let frames = vec![
        PixelArray::new_filled(2, 2, [0, 0, 0]),
        PixelArray::new_filled(6, 4, [0, 0, 0]),
    ];
    encode_gif(&frames, 50, &path).unwrap();

    let decoder = GifDecoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
    let decoded = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(decoded.len(), 2);
    let first = decoded[0].buffer();
    assert_eq!(first.dimensions(), (6, 4));
    assert!(first.get_pixel(0, 0).0[0] < 50);
    assert!(first.get_pixel(5, 3).0[0] > 200);
}

#[test]
fn default_framerate_delay_is_raised_to_gif_resolution() {
    let path = out_path("fast.gif");
    let frames = vec![
        PixelArray::new_filled(2, 2, [255, 0, 0]),
        PixelArray::new_filled(2, 2, [0, 0, 255]),
    ];
    encode_gif(&frames, 7, &path).unwrap();

    let decoder = GifDecoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
    let decoded = decoder.into_frames().collect_frames().unwrap();
    for frame in &decoded {
        let (numer, denom) = frame.delay().numer_denom_ms();
        assert_eq!(numer / denom, MIN_GIF_DELAY_MS);
    }
}
