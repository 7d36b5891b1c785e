use pano_features::FeatureParams;
use pano_image::Image;
use pano_io::functional::{read_image_any_rgb8, write_image_rgb8};
use pano_stitch::{StitchConfig, StitchError, Stitcher};

/// Blocky pseudo-random scene with strong corners and no zero pixel.
fn scene(x: usize, y: usize) -> [u8; 3] {
    let (bx, by) = (x / 5, y / 5);
    let h = bx.wrapping_mul(73_856_093) ^ by.wrapping_mul(19_349_663);
    let v = 30 + (h % 200) as u8;
    [v, v.wrapping_add(7).max(1), 255 - v]
}

fn view(x0: usize, width: usize, height: usize) -> Result<Image<u8, 3>, StitchError> {
    Ok(Image::from_fn([width, height].into(), |x, y| scene(x + x0, y))?)
}

#[test]
fn stitch_files_with_default_collaborators() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let inputs = [
        tmp_dir.path().join("left.png"),
        tmp_dir.path().join("right.png"),
    ];
    write_image_rgb8(&inputs[0], &view(0, 160, 120)?)?;
    write_image_rgb8(&inputs[1], &view(80, 160, 120)?)?;

    let config = StitchConfig {
        features: FeatureParams {
            max_keypoints: 5000,
            ..Default::default()
        },
        ..Default::default()
    };
    let stitcher = Stitcher::from_config(config)?;

    let images = [read_image_any_rgb8(&inputs[0])?, read_image_any_rgb8(&inputs[1])?];
    let alignment = stitcher
        .align(&images)?
        .ok_or(StitchError::Config("no alignment".into()))?;
    let offset = alignment.transforms[1].apply([0.0, 0.0]);
    let origin = alignment.transforms[0].apply([0.0, 0.0]);
    assert!((offset[0] - origin[0] - 80.0).abs() < 1.0, "offset {offset:?}");
    assert!((offset[1] - origin[1]).abs() < 1.0, "offset {offset:?}");

    let output = tmp_dir.path().join("pano.png");
    let size = stitcher
        .stitch_files(&inputs, &output)?
        .ok_or(StitchError::Config("nothing written".into()))?;
    assert!(output.exists());
    assert!((239..=241).contains(&size.width), "{size}");
    assert!((119..=121).contains(&size.height), "{size}");
    Ok(())
}

#[test]
fn stitch_files_downscales_to_display_size() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let input = tmp_dir.path().join("single.png");
    write_image_rgb8(&input, &view(0, 120, 80)?)?;

    let config = StitchConfig {
        display_max: [50, 50].into(),
        ..Default::default()
    };
    let stitcher = Stitcher::from_config(config)?;

    let output = tmp_dir.path().join("small.png");
    let size = stitcher
        .stitch_files(&[&input], &output)?
        .ok_or(StitchError::Config("nothing written".into()))?;

    // 120x80 -> 60x40 -> 30x20
    assert_eq!(size, [30, 20].into());
    assert_eq!(read_image_any_rgb8(&output)?.size(), size);
    Ok(())
}

#[test]
fn stitch_files_without_inputs_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let output = tmp_dir.path().join("pano.png");
    let stitcher = Stitcher::from_config(StitchConfig::default())?;

    let inputs: [&str; 0] = [];
    assert!(stitcher.stitch_files(&inputs, &output)?.is_none());
    assert!(!output.exists());
    Ok(())
}

#[test]
fn unreadable_input_is_an_io_failure() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let good = tmp_dir.path().join("good.png");
    write_image_rgb8(&good, &view(0, 40, 40)?)?;
    let missing = tmp_dir.path().join("missing.png");
    let output = tmp_dir.path().join("pano.png");

    let stitcher = Stitcher::from_config(StitchConfig::default())?;
    let result = stitcher.stitch_files(&[&good, &missing], &output);

    assert!(matches!(result, Err(StitchError::Io(_))));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn unrelated_images_write_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let inputs = [tmp_dir.path().join("a.png"), tmp_dir.path().join("b.png")];
    // featureless images produce no correspondences
    write_image_rgb8(&inputs[0], &Image::from_size_val([64, 64].into(), 90u8)?)?;
    write_image_rgb8(&inputs[1], &Image::from_size_val([64, 64].into(), 160u8)?)?;
    let output = tmp_dir.path().join("pano.png");

    let stitcher = Stitcher::from_config(StitchConfig::default())?;
    let result = stitcher.stitch_files(&inputs, &output);

    assert!(matches!(
        result,
        Err(StitchError::AlignmentFailure {
            previous: 0,
            current: 1
        })
    ));
    assert!(!output.exists());
    Ok(())
}
