use hplc_peaks::utils::stats::trapezoid;
use hplc_peaks::{
    ControlPoint,
    PeakBound,
    PeakPipeline,
    PipelineError,
    ProcessingGuard,
    ProcessingRegistry,
    Series,
};

fn gaussian(t: f64, center: f64, sigma: f64, height: f64) -> f64 {
    height * (-0.5 * ((t - center) / sigma).powi(2)).exp()
}

fn trace(f: impl Fn(f64) -> f64) -> Series {
    let samples: Vec<f64> = (0..600).map(|i| f(i as f64 / 60.0)).collect();
    Series::from_samples(&samples, 1000.0).unwrap()
}

#[test]
fn test_recompute_matches_pipeline_on_isolated_peak() {
    // Test: Redrawing a detected peak with its own bounds gives the same peak
    let raw = trace(|t| gaussian(t, 5.0, 0.1, 50.0));
    let pipeline = PeakPipeline::default();
    let output = pipeline.process(&raw).unwrap();
    assert_eq!(output.peaks.len(), 1);
    let detected = &output.peaks[0];

    let slice = raw.slice(detected.start, detected.end).unwrap();
    let redrawn = pipeline
        .recompute_peak(&slice, PeakBound::at(detected.start), PeakBound::at(detected.end))
        .unwrap();

    assert_eq!(redrawn.apex, detected.apex);
    assert_eq!(redrawn.start, detected.start);
    assert_eq!(redrawn.end, detected.end);
    let (a, b) = (redrawn.area.unwrap(), detected.area.unwrap());
    assert!((a - b).abs() <= 1e-4 * b, "{} vs {}", a, b);
}

#[test]
fn test_manual_peak_area_above_drawn_chord() {
    // Test: start/end values of 5 mAU subtract a 5 mAU high rectangle
    let raw = trace(|t| 5.0 + gaussian(t, 5.0, 0.2, 20.0));
    let (start, end) = (4.0, 6.0);
    let slice = raw.slice(start, end).unwrap();
    let total = trapezoid(slice.times(), slice.values());

    let peak = PeakPipeline::default()
        .recompute_peak(
            &slice,
            PeakBound::anchored(start, 5.0),
            PeakBound::anchored(end, 5.0),
        )
        .unwrap();
    assert!(peak.is_manual());
    assert_eq!(peak.start_value, Some(5.0));
    let expected = total - (end - start) * 5.0;
    assert!((peak.area.unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_half_anchored_bounds_use_simple_rule() {
    // Test: A single anchored bound is not a manual peak
    let raw = trace(|t| 5.0 + gaussian(t, 5.0, 0.2, 20.0));
    let pipeline = PeakPipeline::default();
    let plain = pipeline
        .recompute_peak(&raw, PeakBound::at(4.0), PeakBound::at(6.0))
        .unwrap();
    let half = pipeline
        .recompute_peak(&raw, PeakBound::anchored(4.0, 0.0), PeakBound::at(6.0))
        .unwrap();
    assert!(!half.is_manual());
    assert_eq!(half.area, plain.area);
}

#[test]
fn test_manual_baseline_replaces_automatic_one() {
    // Test: Control points define the baseline wholesale, even above the data
    let raw = trace(|t| 2.0 + gaussian(t, 5.0, 0.1, 50.0));
    let points = [
        ControlPoint::new(9.0, 4.0),
        ControlPoint::new(1.0, 3.0),
        ControlPoint::new(5.0, 3.5),
    ];
    let baseline = PeakPipeline::default()
        .apply_manual_baseline(&raw, &points)
        .unwrap();

    assert_eq!(baseline.times(), raw.times());
    assert!((baseline.value_at(0.0) - 3.0).abs() < 1e-12);
    assert!((baseline.value_at(5.0) - 3.5).abs() < 1e-12);
    assert!((baseline.value_at(9.9) - 4.0).abs() < 1e-12);
    assert!((baseline.value_at(3.0) - 3.25).abs() < 0.01);
    // Not clamped: the drawn line sits above the 2 mAU floor.
    assert!(baseline.value_at(2.0) > raw.value_at(2.0));
}

#[test]
fn test_manual_baseline_without_usable_points() {
    let raw = trace(|_| 1.0);
    let res = PeakPipeline::default().apply_manual_baseline(&raw, &[ControlPoint::new(100.0, 1.0)]);
    assert_eq!(res, Err(PipelineError::NoUsableControlPoints));
}

#[test]
fn test_registry_serializes_work_per_measurement() {
    // Test: A second worker on a busy measurement is refused, others proceed
    let registry = ProcessingRegistry::new();
    let pipeline = PeakPipeline::default();
    let raw = trace(|t| 2.0 + gaussian(t, 5.0, 0.1, 50.0));

    let busy = registry.handle("m-1");
    let _held = ProcessingGuard::enter(&busy).unwrap();

    std::thread::scope(|s| {
        let same = s.spawn(|| pipeline.process_tracked(&registry.handle("m-1"), &raw));
        let other = s.spawn(|| pipeline.process_tracked(&registry.handle("m-2"), &raw));

        assert!(matches!(
            same.join().unwrap(),
            Err(PipelineError::AlreadyProcessing { .. })
        ));
        assert_eq!(other.join().unwrap().unwrap().peaks.len(), 1);
    });

    assert!(registry.is_processing("m-1"));
    assert!(!registry.is_processing("m-2"));
}
