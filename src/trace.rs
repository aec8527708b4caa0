use crate::grid::{Pos, moves_from};
use crate::reach::ReachMap;

/// Keeps every step's reachable set so one concrete route can be
/// recovered after the target is found. Costs one byte per cell per
/// step, so it is only switched on for visualisation.
#[derive(Debug, Default)]
pub struct PathTracer {
    frames: Vec<Vec<bool>>,
    w: usize,
    h: usize,
}

impl PathTracer {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            frames: Vec::new(),
            w,
            h,
        }
    }

    pub fn record(&mut self, reach: &ReachMap) {
        debug_assert!(reach.w == self.w && reach.h == self.h);
        self.frames.push(reach.snapshot());
    }

    fn reachable(&self, frame: usize, p: Pos) -> bool {
        self.frames[frame][p.y as usize * self.w + p.x as usize]
    }

    /// Walk back from `target` in the last recorded frame to `origin`.
    ///
    /// Returns the route origin first. Consecutive cells are one move
    /// apart and each cell was passable at the step it is visited. `None`
    /// if the target is not reachable in the last frame.
    pub fn backtrack(&self, origin: Pos, target: Pos) -> Option<Vec<Pos>> {
        let last = self.frames.len().checked_sub(1)?;
        if !self.reachable(last, target) {
            return None;
        }

        let mut path = vec![target];
        let mut cur = target;
        let mut frame = last;
        while cur != origin {
            // Origin counts as a source in every frame, so stepping onto it ends the walk.
            let near: Vec<Pos> = moves_from(cur, self.w, self.h).collect();
            let prev = if near.contains(&origin) {
                origin
            } else if frame == 0 {
                return None;
            } else {
                *near.iter().find(|&&p| self.reachable(frame - 1, p))?
            };
            path.push(prev);
            cur = prev;
            frame = frame.saturating_sub(1);
        }
        path.reverse();
        Some(path)
    }
}
