//! Cross-crate behavior tests for the dispatch and pyramid layers.

use std::collections::HashMap;

use pxl_core::{CoreError, FilterKind, FilterRequest, PixelBuffer};
use pxl_engine::{EngineError, ExecutionPath, Processor};

fn gradient(width: usize, height: usize, channels: usize) -> PixelBuffer {
    let data = (0..width * height * channels)
        .map(|i| ((i * 13) % 256) as u8)
        .collect();
    PixelBuffer::from_vec(width, height, channels, data).unwrap()
}

fn classic_suite() -> Vec<FilterRequest> {
    vec![
        FilterRequest::new(FilterKind::Grayscale),
        FilterRequest::new(FilterKind::Blur { sigma: 2.0 }),
        FilterRequest::new(FilterKind::Sharpen { intensity: 1.0 }),
        FilterRequest::new(FilterKind::Noise { level: 25.0, seed: 99 }),
        FilterRequest::new(FilterKind::EdgeDetect),
    ]
}

#[test]
fn test_apply_all_runs_classic_suite() {
    let processor = Processor::cpu();
    let img = gradient(48, 32, 3);
    let reports = processor.apply_all(&img, &classic_suite());

    assert_eq!(reports.len(), 5);
    let names: Vec<_> = reports.iter().map(|r| r.name).collect();
    assert_eq!(names, ["grayscale", "blur", "sharpen", "noise", "edges"]);
    for report in &reports {
        let out = report.result.as_ref().unwrap();
        assert_eq!(out.dimensions(), img.dimensions());
        assert_eq!(report.backend, ExecutionPath::Cpu);
    }
}

#[test]
fn test_dispatcher_isolates_failed_task() {
    // One deliberately broken request in a batch of five: the bad sigma
    // is only caught inside the task, so its siblings must be untouched.
    let processor = Processor::cpu();
    let img = gradient(32, 32, 3);
    let mut requests = classic_suite();
    requests[1] = FilterRequest::new(FilterKind::Blur { sigma: -1.0 });

    let reports = processor.apply_all(&img, &requests);
    assert_eq!(reports.len(), 5);
    assert!(reports[1].result.is_err());
    for (i, report) in reports.iter().enumerate() {
        if i != 1 {
            assert!(report.result.is_ok(), "task {i} should have survived");
        }
    }
}

#[test]
fn test_apply_matches_direct_ops() {
    let processor = Processor::cpu();
    let img = gradient(24, 24, 3);
    let out = processor
        .apply(&img, &FilterRequest::new(FilterKind::Grayscale))
        .unwrap();
    let mut expected = img.clone();
    pxl_ops::filter::grayscale(&mut expected);
    assert_eq!(out.data(), expected.data());
    // The task must not mutate its input.
    assert_eq!(img, gradient(24, 24, 3));
}

#[test]
fn test_apply_shape_changing_filters() {
    let processor = Processor::cpu();
    let img = gradient(40, 24, 3);

    let rotated = processor
        .apply(&img, &FilterRequest::new(FilterKind::Rotate90 { times: 1 }))
        .unwrap();
    assert_eq!(rotated.dimensions(), (24, 40, 3));

    let halved = processor
        .apply(&img, &FilterRequest::new(FilterKind::Downsample { factor: 2 }))
        .unwrap();
    assert_eq!(halved.dimensions(), (20, 12, 3));
}

#[test]
fn test_compress_halves_each_level() {
    let processor = Processor::cpu();
    let img = gradient(256, 256, 3);
    let levels = processor.compress(&img, 3).unwrap();

    let widths: Vec<_> = levels.iter().map(|l| l.width()).collect();
    assert_eq!(widths, [128, 64, 32]);
    let heights: Vec<_> = levels.iter().map(|l| l.height()).collect();
    assert_eq!(heights, [128, 64, 32]);
}

#[test]
fn test_compress_stops_at_floor() {
    let processor = Processor::cpu();
    let img = gradient(64, 64, 1);
    // Requested ten levels, but 64 -> 32 -> 16 -> 8 hits the floor after
    // three.
    let levels = processor.compress(&img, 10).unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels.last().unwrap().dimensions(), (8, 8, 1));
}

#[test]
fn test_compress_rejects_zero_levels() {
    let processor = Processor::cpu();
    let img = gradient(32, 32, 1);
    assert!(matches!(
        processor.compress(&img, 0),
        Err(EngineError::InvalidParameter(_))
    ));
}

#[test]
fn test_compress_filter_kind_returns_final_level() {
    let processor = Processor::cpu();
    let img = gradient(128, 128, 3);
    let via_apply = processor
        .apply(&img, &FilterRequest::new(FilterKind::Compress { levels: 2 }))
        .unwrap();
    let via_compress = processor.compress(&img, 2).unwrap();
    assert_eq!(via_apply, *via_compress.last().unwrap());
}

#[test]
fn test_gpu_preference_degrades_to_cpu() {
    // With no adapter present this exercises the device-absence fallback;
    // with one present it simply runs on the GPU. Either way the batch
    // must succeed.
    let processor = Processor::gpu();
    let img = gradient(32, 32, 3);
    let reports = processor.apply_all(&img, &[FilterRequest::new(FilterKind::FlipH)]);
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert!(report.result.is_ok());
    if !processor.gpu_available() {
        assert_eq!(report.backend, ExecutionPath::Cpu);
    }
}

#[test]
fn test_boundary_errors_map_into_engine_taxonomy() {
    let err = FilterRequest::parse("posterize", &HashMap::new()).unwrap_err();
    assert!(matches!(
        EngineError::from(err),
        EngineError::UnsupportedFilter(_)
    ));

    let err = FilterRequest::parse("blur", &HashMap::new()).unwrap_err();
    assert!(matches!(
        EngineError::from(err),
        EngineError::InvalidParameter(_)
    ));

    assert!(matches!(
        EngineError::from(CoreError::InvalidDimensions("x".into())),
        EngineError::InvalidParameter(_)
    ));
}

#[test]
fn test_reports_carry_timing() {
    let processor = Processor::cpu();
    let img = gradient(64, 64, 3);
    let reports =
        processor.apply_all(&img, &[FilterRequest::new(FilterKind::Blur { sigma: 2.0 })]);
    // Elapsed time is monotonic-clock based and never zero for real work.
    assert!(reports[0].elapsed.as_nanos() > 0);
}
