//! Text shown in the overlay panels.

use crate::render::PassId;
use crate::timing::PassTimings;

pub const HELP_LINES: [&str; 4] = [
    "WASD to move around, move mouse to move camera",
    "Q to enable/disable screen space reflections",
    "E to regenerate the crates",
    "R to show/hide the performance counters",
];

/// One line per pass (`label: 1.234ms`), then the CPU frame time.
///
/// Passes without a measurement read "n/a".
pub fn counter_lines(timings: Option<&PassTimings>, frame_seconds: f32) -> Vec<String> {
    let mut lines: Vec<String> = PassId::ALL
        .iter()
        .map(|&pass| match timings.and_then(|t| t.millis(pass)) {
            Some(ms) => format!("{}: {ms:.3}ms", pass.label()),
            None => format!("{}: n/a", pass.label()),
        })
        .collect();
    lines.push(format!("Frame (CPU): {:.3}ms", f64::from(frame_seconds) * 1e3));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_without_timings_read_na() {
        let lines = counter_lines(None, 0.016);
        assert_eq!(lines.len(), PassId::COUNT + 1);
        assert_eq!(lines[0], "G-Buffer Construction: n/a");
        assert_eq!(lines[4], "Final Combine Step: n/a");
        assert_eq!(lines[5], "Frame (CPU): 16.000ms");
    }
}
