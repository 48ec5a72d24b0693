//! Radial clock projection
//!
//! A pure projection from a user's timers plus their live registry entries to
//! the geometry a client needs to draw the concentric-ring clock: one ring per
//! timer (longest duration outermost) with a stroke-dash offset tracking the
//! remaining fraction, and a center display showing the next timer to
//! complete.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::Serialize;

use super::registry::{self, LiveEntry};
use super::timeline::{self, format_mmss};
use super::timer::Timer;

const RING_STROKE: f64 = 3.0;
const RING_GAP: f64 = 11.0;
const MAX_RADIUS: f64 = 180.0;
/// Rings at or below this radius are degenerate and omitted.
const MIN_RADIUS: f64 = 10.0;

const NEUTRAL_COLOR: &str = "#FFFFFF";

/// Geometry for one timer's ring.
#[derive(Debug, Clone, Serialize)]
pub struct Ring {
    pub timer_id: String,
    pub label: String,
    pub color: String,
    pub radius: f64,
    pub circumference: f64,
    /// Offset into the dash pattern: 0 draws the full circle, the whole
    /// circumference erases it.
    pub dash_offset: f64,
    pub time_left: u32,
    pub is_running: bool,
    /// Seconds until the next checkpoint, if one remains.
    pub until_checkpoint: Option<u32>,
    /// Fill percentage per sub-interval block, in execution order.
    pub block_fill: Vec<f64>,
}

/// The clock's center readout.
#[derive(Debug, Clone, Serialize)]
pub struct CenterDisplay {
    /// Remaining time of the next timer to complete, as "MM:SS".
    pub display: String,
    pub color: String,
    /// Ambient glow, lit while anything is running.
    pub glowing: bool,
}

/// One render frame of the radial clock.
#[derive(Debug, Clone, Serialize)]
pub struct ClockFrame {
    pub rings: Vec<Ring>,
    pub center: CenterDisplay,
    pub any_running: bool,
}

/// Project timers and their live entries into a render frame.
///
/// Timers missing a live entry (engine not yet heard from) render full and
/// idle rather than being dropped.
pub fn project(timers: &[Timer], live: &HashMap<String, LiveEntry>) -> ClockFrame {
    let mut ordered: Vec<&Timer> = timers.iter().collect();
    ordered.sort_by(|a, b| b.duration.cmp(&a.duration).then(a.id.cmp(&b.id)));

    let mut rings = Vec::with_capacity(ordered.len());
    for (index, timer) in ordered.iter().enumerate() {
        let radius = MAX_RADIUS - index as f64 * (RING_STROKE + RING_GAP);
        if radius <= MIN_RADIUS {
            // Radii only shrink from here; nothing further can render.
            break;
        }
        let entry = live.get(&timer.id).copied().unwrap_or(LiveEntry {
            time_left: timer.duration,
            is_running: false,
        });
        let circumference = 2.0 * PI * radius;
        let fraction = if timer.duration > 0 {
            f64::from(entry.time_left) / f64::from(timer.duration)
        } else {
            0.0
        };
        let checkpoints = timer.checkpoints();
        let elapsed = timeline::elapsed(timer.duration, entry.time_left);
        rings.push(Ring {
            timer_id: timer.id.clone(),
            label: timer.label.clone(),
            color: timer.color.clone(),
            radius,
            circumference,
            dash_offset: circumference - fraction * circumference,
            time_left: entry.time_left,
            is_running: entry.is_running,
            until_checkpoint: timeline::next_checkpoint(&checkpoints, elapsed)
                .map(|stamp| stamp - elapsed),
            block_fill: (0..checkpoints.len())
                .map(|block| timeline::block_fill_fraction(block, &checkpoints, elapsed))
                .collect(),
        });
    }

    let any_running = registry::any_running_in(live);
    let center = match registry::next_to_complete_in(live) {
        Some((id, entry)) => CenterDisplay {
            display: format_mmss(entry.time_left),
            color: timers
                .iter()
                .find(|timer| timer.id == id)
                .map(|timer| timer.color.clone())
                .unwrap_or_else(|| NEUTRAL_COLOR.to_string()),
            glowing: any_running,
        },
        None => CenterDisplay {
            display: format_mmss(0),
            color: NEUTRAL_COLOR.to_string(),
            glowing: false,
        },
    };

    ClockFrame {
        rings,
        center,
        any_running,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn timer(id: &str, duration: u32, color: &str) -> Timer {
        Timer {
            id: id.to_string(),
            user_id: "user".to_string(),
            label: id.to_string(),
            color: color.to_string(),
            duration,
            intervals: vec![],
            created_at: Utc::now(),
        }
    }

    fn entry(time_left: u32, is_running: bool) -> LiveEntry {
        LiveEntry { time_left, is_running }
    }

    #[test]
    fn longest_timer_takes_the_outermost_ring() {
        let timers = vec![timer("short", 60, "#33FF57"), timer("long", 90, "#FF5733")];
        let frame = project(&timers, &HashMap::new());
        assert_eq!(frame.rings[0].timer_id, "long");
        assert_eq!(frame.rings[0].radius, 180.0);
        assert_eq!(frame.rings[1].radius, 166.0);
    }

    #[test]
    fn degenerate_inner_rings_are_omitted() {
        let timers: Vec<Timer> = (0..20)
            .map(|i| timer(&format!("t{:02}", i), 100 + i, "#FF5733"))
            .collect();
        let frame = project(&timers, &HashMap::new());
        // radius = 180 - 14 * index stays above 10 through index 12
        assert_eq!(frame.rings.len(), 13);
        assert!(frame.rings.iter().all(|ring| ring.radius > MIN_RADIUS));
    }

    #[test]
    fn dash_offset_tracks_remaining_fraction() {
        let timers = vec![timer("t", 100, "#FF5733")];
        let full = project(&timers, &HashMap::from([("t".to_string(), entry(100, true))]));
        assert_eq!(full.rings[0].dash_offset, 0.0);

        let spent = project(&timers, &HashMap::from([("t".to_string(), entry(0, false))]));
        assert_eq!(spent.rings[0].dash_offset, spent.rings[0].circumference);

        let half = project(&timers, &HashMap::from([("t".to_string(), entry(50, true))]));
        assert!((half.rings[0].dash_offset - half.rings[0].circumference / 2.0).abs() < 1e-9);
    }

    #[test]
    fn missing_entries_render_full_and_idle() {
        let timers = vec![timer("t", 100, "#FF5733")];
        let frame = project(&timers, &HashMap::new());
        assert_eq!(frame.rings[0].time_left, 100);
        assert!(!frame.rings[0].is_running);
        assert_eq!(frame.rings[0].dash_offset, 0.0);
    }

    #[test]
    fn rings_carry_checkpoint_progress() {
        let mut t = timer("t", 90, "#FF5733");
        t.intervals = vec![30, 60];
        // elapsed 15: halfway through the first block
        let live = HashMap::from([("t".to_string(), entry(75, true))]);
        let frame = project(&[t], &live);
        let ring = &frame.rings[0];
        assert_eq!(ring.until_checkpoint, Some(15));
        assert_eq!(ring.block_fill, vec![50.0, 0.0]);

        // A single-block timer has no checkpoints to report.
        let plain = timer("p", 60, "#33FF57");
        let frame = project(&[plain], &HashMap::new());
        assert_eq!(frame.rings[0].until_checkpoint, None);
        assert!(frame.rings[0].block_fill.is_empty());
    }

    #[test]
    fn center_shows_next_to_complete_with_glow() {
        let timers = vec![timer("a", 300, "#FF5733"), timer("b", 600, "#33FF57")];
        let live = HashMap::from([
            ("a".to_string(), entry(65, true)),
            ("b".to_string(), entry(30, false)),
        ]);
        let frame = project(&timers, &live);
        assert_eq!(frame.center.display, "01:05");
        assert_eq!(frame.center.color, "#FF5733");
        assert!(frame.center.glowing);
        assert!(frame.any_running);
    }

    #[test]
    fn center_falls_back_to_neutral_zero() {
        let frame = project(&[], &HashMap::new());
        assert!(frame.rings.is_empty());
        assert_eq!(frame.center.display, "00:00");
        assert_eq!(frame.center.color, NEUTRAL_COLOR);
        assert!(!frame.center.glowing);
        assert!(!frame.any_running);
    }
}
