//! Square bit matrices packed into a `u64`.

use serde::{Deserialize, Serialize};

/// `side x side` bits, row-major with the first cell in the most
/// significant position. `1` is a white cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitGrid {
    side: usize,
    code: u64,
}

impl BitGrid {
    /// All-zero grid. `side * side` must not exceed 64.
    pub fn new(side: usize) -> Self {
        debug_assert!(side * side <= 64);
        Self { side, code: 0 }
    }

    /// Interpret the low `side * side` bits of `code`.
    pub fn from_code(side: usize, code: u64) -> Self {
        let n = side * side;
        let mask = if n >= 64 { u64::MAX } else { (1u64 << n) - 1 };
        Self {
            side,
            code: code & mask,
        }
    }

    /// Build from rows of `0`/`1` values; `None` if the rows are not square.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Option<Self> {
        let side = rows.len();
        if side * side > 64 {
            return None;
        }
        let mut grid = Self::new(side);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != side {
                return None;
            }
            for (x, &b) in row.iter().enumerate() {
                grid.set(y, x, b != 0);
            }
        }
        Some(grid)
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn n_bits(&self) -> usize {
        self.side * self.side
    }

    #[inline]
    pub fn code(&self) -> u64 {
        self.code
    }

    #[inline]
    fn shift(&self, row: usize, col: usize) -> usize {
        self.n_bits() - 1 - (row * self.side + col)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        (self.code >> self.shift(row, col)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, bit: bool) {
        let s = self.shift(row, col);
        if bit {
            self.code |= 1u64 << s;
        } else {
            self.code &= !(1u64 << s);
        }
    }

    /// Row `row` as `0`/`1` bytes.
    pub fn row(&self, row: usize) -> impl Iterator<Item = u8> + '_ {
        (0..self.side).map(move |col| u8::from(self.get(row, col)))
    }

    /// Quarter turn: `dst[i][j] = src[side-1-j][i]`.
    pub fn rotate(&self) -> Self {
        let n = self.side;
        let mut out = Self::new(n);
        for i in 0..n {
            for j in 0..n {
                out.set(i, j, self.get(n - 1 - j, i));
            }
        }
        out
    }

    /// The grid and its three successive quarter turns.
    pub fn rotations(&self) -> [Self; 4] {
        let r1 = self.rotate();
        let r2 = r1.rotate();
        let r3 = r2.rotate();
        [*self, r1, r2, r3]
    }

    #[inline]
    pub fn hamming(&self, other: &Self) -> u32 {
        (self.code ^ other.code).count_ones()
    }
}
