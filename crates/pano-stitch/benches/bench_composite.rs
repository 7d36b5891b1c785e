use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use pano_image::Image;
use pano_stitch::{
    overwrite_non_background, CanvasBounds, Compositor, Frame, PerspectiveWarper, Transform,
};

fn bench_overwrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("OverwriteNonBackground");

    for (width, height) in [(640, 480), (1500, 700), (3000, 1000)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let base = Image::<u8, 3>::from_size_val([*width, *height].into(), 10).unwrap();
        // left half background, right half content
        let layer = Image::<u8, 3>::from_fn([*width, *height].into(), |x, _| {
            if x < width / 2 {
                [0, 0, 0]
            } else {
                [200, 100, 50]
            }
        })
        .unwrap();

        group.bench_with_input(
            BenchmarkId::new("par_chunks", &parameter_string),
            &(&base, &layer),
            |b, i| {
                let (mut dst, src) = (i.0.clone(), i.1);
                b.iter(|| overwrite_non_background(black_box(&mut dst), black_box(src)))
            },
        );
    }
    group.finish();
}

fn bench_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("Composite");
    group.sample_size(20);

    for n in [3usize, 5].iter() {
        let parameter_string = format!("{}x640x480", n);

        let images: Vec<Image<u8, 3>> = (0..*n)
            .map(|i| {
                Image::from_fn([640, 480].into(), |x, y| {
                    [1 + (x % 250) as u8, 1 + (y % 250) as u8, 10 * i as u8 + 1]
                })
                .unwrap()
            })
            .collect();

        let center = (n - 1) / 2;
        let recentered: Vec<Transform> = (0..*n)
            .map(|i| {
                let tx = 500.0 * (i as f64 - center as f64);
                Transform::translation(tx, 0.0, Frame::Image(i), Frame::Image(center))
            })
            .collect();
        let bounds = CanvasBounds::from_transforms(&recentered, [640, 480].into())
            .unwrap()
            .unwrap();
        let transforms = bounds.apply(&recentered);
        let canvas_size = bounds.canvas_size(usize::MAX).unwrap();

        let warper = PerspectiveWarper::default();
        let compositor = Compositor::new(&warper);

        group.bench_with_input(
            BenchmarkId::new("streaming", &parameter_string),
            &(&images, &transforms),
            |b, i| {
                b.iter(|| {
                    compositor.composite(
                        black_box(i.0),
                        black_box(i.1),
                        black_box(canvas_size),
                        black_box(center),
                    )
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_overwrite, bench_composite);
criterion_main!(benches);
