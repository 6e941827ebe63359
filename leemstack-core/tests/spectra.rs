use approx::assert_abs_diff_eq;
use leemstack_core::{
    EnergyAxis, EnergySettings, IntegrationWindow, SampleDepth, Stack, StackStore, Volume,
    WindowSpec, WindowType,
};
use ndarray::Array3;

/// A stack whose pixel (r, c) carries a Gaussian peak centred at slice r + c.
fn peaked_stack(h: usize, w: usize, d: usize) -> Stack {
    let data = Array3::from_shape_fn((h, w, d), |(r, c, k)| {
        #[allow(clippy::cast_precision_loss)]
        let x = k as f64 - (r + c) as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let v = (1000.0 * (-x * x / 8.0).exp()).round() as u16 + 100;
        v
    });
    let volume = Volume::from_array(data, SampleDepth::U16);
    let axis = EnergyAxis::build(EnergySettings::new(2.0, 0.5), d);
    Stack::new(volume, axis).unwrap()
}

#[test]
fn hover_curve_matches_energy_axis_length() {
    let mut store = StackStore::new();
    store.replace(peaked_stack(6, 6, 40));
    let energies = store.stack().unwrap().energy().values().to_vec();
    for (r, c) in [(0, 0), (3, 2), (5, 5)] {
        let curve = store
            .smoothed_spectrum(r, c, &WindowSpec::default())
            .unwrap();
        assert_eq!(curve.len(), energies.len());
    }
    assert_eq!(store.cache().unwrap().computed(), 3);
}

#[test]
fn smoothing_keeps_peak_position_for_symmetric_windows() {
    let mut store = StackStore::new();
    store.replace(peaked_stack(4, 4, 40));
    let spec = WindowSpec::new(6, WindowType::Blackman).unwrap();
    let curve = store.smoothed_spectrum(2, 3, &spec).unwrap();
    let peak = curve
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    // Even-length windows shift by at most half a sample.
    assert!((4..=6).contains(&peak), "peak at {peak}");
}

#[test]
fn region_integral_of_single_pixel_box_equals_raw_curve() {
    let mut store = StackStore::new();
    store.replace(peaked_stack(5, 5, 12));
    let raw = store.raw_spectrum(2, 2).unwrap();
    let box0 = store.integrate(IntegrationWindow::new(2, 2, 0)).unwrap();
    assert_eq!(raw, box0);

    let box1 = store.integrate(IntegrationWindow::new(2, 2, 1)).unwrap();
    let manual: Vec<f64> = (0..12)
        .map(|k| {
            let mut sum = 0.0;
            for r in 1..=3 {
                for c in 1..=3 {
                    sum += store.raw_spectrum(r, c).unwrap()[k];
                }
            }
            sum
        })
        .collect();
    for (a, b) in box1.iter().zip(&manual) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-9);
    }
}
