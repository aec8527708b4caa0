use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Row-major flat grid. No per-cell objects, f32 friendly.
/// Bounded on all four sides (no wrapping).
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            data: vec![T::default(); w * h],
            w,
            h,
        }
    }

    #[cfg(test)]
    pub fn filled(w: usize, h: usize, v: T) -> Self {
        Self {
            data: vec![v; w * h],
            w,
            h,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    pub fn at(&self, p: Pos) -> T {
        self.get(p.x as usize, p.y as usize)
    }

    #[inline]
    pub fn contains(&self, p: Pos) -> bool {
        in_bounds(p, self.w, self.h)
    }

    #[inline]
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.w || y + 1 == self.h
    }
}

/// Grid coordinate. Signed so that offsets and out-of-range candidates
/// can be represented before the bounds check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: Pos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl Add for Pos {
    type Output = Pos;

    #[inline]
    fn add(self, rhs: Pos) -> Pos {
        Pos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// One step of movement: the 8 neighbors plus staying in place.
pub const MOVES: [Pos; 9] = [
    Pos::new(-1, 0),
    Pos::new(0, -1),
    Pos::new(1, 0),
    Pos::new(0, 1),
    Pos::new(-1, -1),
    Pos::new(-1, 1),
    Pos::new(1, -1),
    Pos::new(1, 1),
    Pos::new(0, 0),
];

#[inline]
pub fn in_bounds(p: Pos, w: usize, h: usize) -> bool {
    p.x >= 0 && p.y >= 0 && (p.x as usize) < w && (p.y as usize) < h
}

/// Cells reachable from `p` in one move, clipped to the grid.
pub fn moves_from(p: Pos, w: usize, h: usize) -> impl Iterator<Item = Pos> {
    let mut out = [Pos::default(); 9];
    let mut n = 0;
    for m in MOVES {
        let c = p + m;
        if in_bounds(c, w, h) {
            out[n] = c;
            n += 1;
        }
    }
    out.into_iter().take(n)
}
