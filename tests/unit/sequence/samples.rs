use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn single_segment_is_current_frame() {
    assert_eq!(plan_samples(7.0, 0.0, 1.0, 1, 1.0, 1.0).as_slice(), &[7.0]);
    assert_eq!(plan_samples(7.0, 0.0, 1.0, 0, 1.0, 1.0).as_slice(), &[7.0]);
}

#[test]
fn two_segments_span_the_shutter() {
    let t = plan_samples(0.0, 0.0, 1.0, 2, 1.0, 1.0);
    assert_eq!(t.as_slice(), &[0.0, 1.0]);
}

#[test]
fn times_are_absolute_and_uniform_at_full_efficiency() {
    let t = plan_samples(10.0, -0.5, 0.5, 5, 1.0, 1.0);
    let want = [9.5, 9.75, 10.0, 10.25, 10.5];
    assert_eq!(t.len(), 5);
    for (a, b) in t.iter().zip(want) {
        assert!(close(*a, b), "{a} != {b}");
    }
}

#[test]
fn reduced_efficiency_packs_samples_toward_the_ends() {
    let uniform = plan_samples(0.0, 0.0, 1.0, 3, 1.0, 1.0);
    let soft = plan_samples(0.0, 0.0, 1.0, 5, 0.0, 0.0);
    assert!(close(uniform[1], 0.5));
    // Triangle curve: endpoints stay, inner samples crowd the open and close ramps.
    assert!(close(soft[0], 0.0));
    assert!(close(soft[1], 0.125));
    assert!(close(soft[2], 0.5));
    assert!(close(soft[3], 0.875));
    assert!(close(soft[4], 1.0));
    assert!(soft.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn asymmetric_efficiency_shifts_samples_toward_the_softer_edge() {
    // Open ramp covers half the interval: a third of the light passes by its end.
    let t = plan_samples(0.0, 0.0, 1.0, 3, 0.0, 1.0);
    assert!(close(t[1], 1.0 / 3.0));
    let t = plan_samples(0.0, 0.0, 1.0, 3, 1.0, 0.0);
    assert!(close(t[1], 2.0 / 3.0));
}

#[test]
fn reversed_shutter_is_normalized() {
    let t = plan_samples(0.0, 1.0, 0.0, 2, 1.0, 1.0);
    assert_eq!(t.as_slice(), &[0.0, 1.0]);
}

#[test]
fn zero_length_shutter_collapses_to_one_time() {
    let t = plan_samples(3.0, 0.0, 0.0, 4, 1.0, 1.0);
    assert_eq!(t.as_slice(), &[3.0]);
}
