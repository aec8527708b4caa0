use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::config::Params;
use crate::grid::{Grid, MOVES, Pos, in_bounds};

/// Rows handed to a worker at a time. Frontiers are sparse early on,
/// so small chunks keep the work-stealing pool balanced.
const ROWS_PER_TASK: usize = 4;

/// Reachability bitmap shared between workers during one expansion.
///
/// One byte-sized atomic flag per cell: concurrent writers only ever store
/// `true`, so relaxed ordering is enough and the join at the end of the
/// parallel region publishes the result.
#[derive(Debug)]
pub struct ReachMap {
    cells: Vec<AtomicBool>,
    pub w: usize,
    pub h: usize,
}

impl ReachMap {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            cells: (0..w * h).map(|_| AtomicBool::new(false)).collect(),
            w,
            h,
        }
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[self.idx(x, y)].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn at(&self, p: Pos) -> bool {
        in_bounds(p, self.w, self.h) && self.get(p.x as usize, p.y as usize)
    }

    /// Mark a cell. Returns true if this call flipped it.
    #[inline]
    pub fn mark(&self, x: usize, y: usize) -> bool {
        !self.cells[self.idx(x, y)].swap(true, Ordering::Relaxed)
    }

    /// Reset every cell to unreachable.
    pub fn clear(&mut self) {
        self.cells.par_iter_mut().for_each(|c| *c.get_mut() = false);
    }

    pub fn count(&self) -> usize {
        self.cells.par_iter().filter(|c| c.load(Ordering::Relaxed)).count()
    }

    pub fn snapshot(&self) -> Vec<bool> {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}

/// Result of one frontier expansion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Expansion {
    pub target_reached: bool,
    /// Number of cells reachable after this step.
    pub marked: usize,
}

/// A ship can enter a cell that is water and calm enough.
#[inline]
pub fn passable(terrain: &Grid<f32>, wave: &Grid<f32>, x: usize, y: usize, params: &Params) -> bool {
    terrain.get(x, y) < params.land_threshold && wave.get(x, y) < params.ship_threshold
}

/// One step of multi-source reachability.
///
/// Every cell reachable in `prev`, plus `origin` (the journey may start at
/// any step), spreads to each passable cell of its 3x3 neighbourhood in
/// `out`. `out` is cleared first, so stale contents never leak through.
pub fn expand(
    prev: &ReachMap,
    terrain: &Grid<f32>,
    wave: &Grid<f32>,
    origin: Pos,
    target: Pos,
    out: &mut ReachMap,
    params: &Params,
) -> Expansion {
    let w = out.w;
    let h = out.h;
    debug_assert!(prev.w == w && prev.h == h);

    out.clear();
    let out = &*out;

    let (target_reached, marked) = (0..h)
        .into_par_iter()
        .with_max_len(ROWS_PER_TASK)
        .map(|y| {
            let mut reached = false;
            let mut marked = 0usize;
            for x in 0..w {
                let source = Pos::new(x as i32, y as i32);
                if !prev.get(x, y) && source != origin {
                    continue;
                }
                for m in MOVES {
                    let c = source + m;
                    if !in_bounds(c, w, h) {
                        continue;
                    }
                    let (cx, cy) = (c.x as usize, c.y as usize);
                    if out.get(cx, cy) || !passable(terrain, wave, cx, cy, params) {
                        continue;
                    }
                    if c == target {
                        reached = true;
                    }
                    if out.mark(cx, cy) {
                        marked += 1;
                    }
                }
            }
            (reached, marked)
        })
        // Not `any`: every row has to finish marking.
        .reduce(|| (false, 0), |a, b| (a.0 | b.0, a.1 + b.1));

    Expansion {
        target_reached,
        marked,
    }
}
