use smallvec::SmallVec;

/// Absolute motion sample times for one frame, ascending.
pub type SampleTimes = SmallVec<[f64; 4]>;

/// Plan motion sample times for a frame.
///
/// `segment_count <= 1` yields exactly `[current]`. Otherwise `segment_count` times span
/// `[current + shutter_open, current + shutter_close]`, both ends included. A trapezoidal shutter
/// curve with ramps covering `(1 - efficiency) / 2` of the interval at each end warps the uniform
/// positions through its normalized cumulative transmission, so lower efficiency packs samples
/// toward that end. Efficiencies of 1 give uniform spacing.
pub fn plan_samples(
    current: f64,
    shutter_open: f64,
    shutter_close: f64,
    segment_count: u32,
    efficiency_open: f64,
    efficiency_close: f64,
) -> SampleTimes {
    let mut times = SampleTimes::new();
    if segment_count <= 1 {
        times.push(current);
        return times;
    }

    let (open, close) = if shutter_close < shutter_open {
        (shutter_close, shutter_open)
    } else {
        (shutter_open, shutter_close)
    };
    let span = close - open;
    let curve = ShutterCurve::new(efficiency_open, efficiency_close);
    let last = segment_count - 1;

    for i in 0..segment_count {
        let u = if i == 0 {
            0.0
        } else if i == last {
            1.0
        } else {
            curve.cumulative(f64::from(i) / f64::from(last))
        };
        times.push(current + open + u * span);
    }
    times.dedup();
    times
}

/// Normalized trapezoid on `[0, 1]`: rises over `ro`, flat at 1, falls over `rc`.
struct ShutterCurve {
    ro: f64,
    rc: f64,
    area: f64,
}

impl ShutterCurve {
    fn new(efficiency_open: f64, efficiency_close: f64) -> Self {
        let ramp = |e: f64| {
            if e.is_finite() {
                (1.0 - e).clamp(0.0, 1.0) * 0.5
            } else {
                0.0
            }
        };
        let ro = ramp(efficiency_open);
        let rc = ramp(efficiency_close);
        Self {
            ro,
            rc,
            area: 1.0 - ro * 0.5 - rc * 0.5,
        }
    }

    /// Fraction of the total transmission accumulated by position `x` in `[0, 1]`.
    fn cumulative(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        let a = if x < self.ro {
            x * x / (2.0 * self.ro)
        } else if x <= 1.0 - self.rc {
            self.ro * 0.5 + (x - self.ro)
        } else {
            let rest = 1.0 - x;
            self.area - rest * rest / (2.0 * self.rc)
        };
        (a / self.area).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/samples.rs"]
mod tests;
