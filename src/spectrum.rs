//! Per-frame spectrum math: bass energy, bar layout and hue cycling.

/// Mean magnitude of the first `bins` entries, normalised to 0..=1.
/// An empty snapshot (or `bins == 0`) is silence.
pub fn bass_energy(snapshot: &[u8], bins: usize) -> f64 {
    let n = bins.min(snapshot.len());
    if n == 0 {
        return 0.0;
    }
    let sum: u32 = snapshot[..n].iter().map(|&v| u32::from(v)).sum();
    sum as f64 / n as f64 / 255.0
}

/// One bar of the visualizer in canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, 0..360.
    pub hue: f64,
}

/// Hue for bar `index` of `count` at `now_ms`: a rainbow spread across the
/// bars, rotating with wall-clock time.
pub fn bar_hue(now_ms: f64, speed: f64, index: usize, count: usize) -> f64 {
    let spread = if count == 0 { 0.0 } else { index as f64 * 360.0 / count as f64 };
    (now_ms * speed + spread).rem_euclid(360.0)
}

/// Lay out `min(max_bars, snapshot.len())` bars across a `width` x `height`
/// canvas. When the snapshot is longer than the cap, neighbouring bins are
/// averaged into one bar.
pub fn layout_bars(
    snapshot: &[u8],
    max_bars: usize,
    width: f64,
    height: f64,
    now_ms: f64,
    hue_speed: f64,
) -> Vec<Bar> {
    let count = max_bars.min(snapshot.len());
    if count == 0 || width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }
    let bar_w = width / count as f64;
    (0..count)
        .map(|i| {
            let lo = i * snapshot.len() / count;
            let hi = ((i + 1) * snapshot.len() / count).max(lo + 1);
            let bucket = &snapshot[lo..hi];
            let mean = bucket.iter().map(|&v| f64::from(v)).sum::<f64>() / bucket.len() as f64;
            Bar {
                x: i as f64 * bar_w,
                width: bar_w,
                height: mean / 255.0 * height,
                hue: bar_hue(now_ms, hue_speed, i, count),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bass_uses_low_bins_only() {
        let mut snap = vec![0u8; 64];
        snap[..8].fill(255);
        assert!((bass_energy(&snap, 8) - 1.0).abs() < 1e-12);
        assert!((bass_energy(&snap, 16) - 0.5).abs() < 1e-12);
        assert_eq!(bass_energy(&[], 8), 0.0);
        assert_eq!(bass_energy(&snap, 0), 0.0);
    }

    #[test]
    fn bass_with_short_snapshot() {
        assert!((bass_energy(&[51, 51], 10) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn bars_are_capped_and_scaled() {
        let snap = vec![255u8; 256];
        let bars = layout_bars(&snap, 128, 512.0, 100.0, 0.0, 0.05);
        assert_eq!(bars.len(), 128);
        assert!((bars[0].width - 4.0).abs() < 1e-12);
        assert!((bars[127].x - 508.0).abs() < 1e-12);
        assert!(bars.iter().all(|b| (b.height - 100.0).abs() < 1e-9));
    }

    #[test]
    fn bars_average_bins() {
        let snap = [0u8, 255, 255, 255];
        let bars = layout_bars(&snap, 2, 20.0, 255.0, 0.0, 0.0);
        assert_eq!(bars.len(), 2);
        assert!((bars[0].height - 127.5).abs() < 1e-9);
        assert!((bars[1].height - 255.0).abs() < 1e-9);
    }

    #[test]
    fn no_bars_without_canvas_area() {
        assert!(layout_bars(&[1, 2, 3], 128, 0.0, 10.0, 0.0, 0.1).is_empty());
        assert!(layout_bars(&[], 128, 10.0, 10.0, 0.0, 0.1).is_empty());
    }

    #[test]
    fn hue_rotates_with_time() {
        let a = bar_hue(0.0, 0.05, 3, 12);
        let b = bar_hue(1000.0, 0.05, 3, 12);
        assert!((a - 90.0).abs() < 1e-9);
        assert!((b - 140.0).abs() < 1e-9);
        assert!(bar_hue(1e9, 0.05, 11, 12) < 360.0);
    }
}
