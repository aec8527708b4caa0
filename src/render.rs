use rayon::prelude::*;

use crate::config::Params;
use crate::grid::{Grid, Pos};
use crate::reach::ReachMap;

const SEA_CALM: [u8; 4] = [18, 40, 82, 255];
const SEA_STORM: [u8; 4] = [225, 235, 245, 255];
const SHORE: [u8; 4] = [210, 200, 160, 255];
const HIGHLAND: [u8; 4] = [70, 120, 60, 255];
const REACHABLE: [u8; 4] = [240, 170, 40, 255];
const PATH: [u8; 4] = [220, 30, 30, 255];
const ORIGIN: [u8; 4] = [40, 220, 60, 255];
const TARGET: [u8; 4] = [250, 60, 220, 255];

/// How strongly reachable cells are tinted over the sea colour.
const REACH_TINT: f32 = 0.55;

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
        255,
    ]
}

/// Everything needed to draw one simulated step.
pub struct Frame<'a> {
    pub terrain: &'a Grid<f32>,
    pub wave: &'a Grid<f32>,
    pub reach: &'a ReachMap,
    pub origin: Pos,
    pub target: Pos,
    pub path: Option<&'a [Pos]>,
}

/// Render one step as RGBA, one pixel per cell.
pub fn render_frame(frame: &Frame<'_>, params: &Params) -> Vec<u8> {
    let w = frame.terrain.w;
    let h = frame.terrain.h;
    let mut rgba = vec![0u8; w * h * 4];

    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let height = frame.terrain.get(x, y);
            let color = if height >= params.land_threshold {
                let t = (height - params.land_threshold) / (1.0 - params.land_threshold).max(1e-6);
                lerp_color(SHORE, HIGHLAND, t)
            } else {
                let sea = lerp_color(SEA_CALM, SEA_STORM, frame.wave.get(x, y));
                if frame.reach.get(x, y) {
                    lerp_color(sea, REACHABLE, REACH_TINT)
                } else {
                    sea
                }
            };
            row[x * 4..x * 4 + 4].copy_from_slice(&color);
        }
    });

    let mut paint = |p: Pos, color: [u8; 4]| {
        if frame.terrain.contains(p) {
            let i = (p.y as usize * w + p.x as usize) * 4;
            rgba[i..i + 4].copy_from_slice(&color);
        }
    };
    for &p in frame.path.unwrap_or(&[]) {
        paint(p, PATH);
    }
    paint(frame.origin, ORIGIN);
    paint(frame.target, TARGET);

    rgba
}
