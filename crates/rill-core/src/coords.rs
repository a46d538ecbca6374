//! Grid addressing: cell coordinates and the four pipe directions.
//!
//! "Top" is `y + 1` and "Bottom" is `y − 1`, matching the flux layout
//! `[Left, Right, Top, Bottom]`.

/// An integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// One of the four pipe directions out of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Top,
        Direction::Bottom,
    ];

    /// Slot of this direction in a `[f64; 4]` flux record.
    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
        }
    }

    /// The neighbouring cell in this direction, or `None` at the grid boundary.
    #[inline]
    pub fn neighbor(self, x: usize, y: usize, width: usize, height: usize) -> Option<(usize, usize)> {
        match self {
            Direction::Left => x.checked_sub(1).map(|nx| (nx, y)),
            Direction::Right => (x + 1 < width).then_some((x + 1, y)),
            Direction::Top => (y + 1 < height).then_some((x, y + 1)),
            Direction::Bottom => y.checked_sub(1).map(|ny| (x, ny)),
        }
    }

    /// Row-major index of the neighbour, or `None` at the boundary.
    #[inline]
    pub fn neighbor_index(self, x: usize, y: usize, width: usize, height: usize) -> Option<usize> {
        self.neighbor(x, y, width, height).map(|(nx, ny)| ny * width + nx)
    }
}

/// Differences `v[self] − v[neighbour]` in `[L, R, T, B]` order.
/// A missing neighbour contributes exactly 0.
#[inline]
pub fn neighbor_differences(values: &[f64], x: usize, y: usize, width: usize, height: usize) -> [f64; 4] {
    let here = values[y * width + x];
    let mut out = [0.0; 4];
    for dir in Direction::ALL {
        if let Some(j) = dir.neighbor_index(x, y, width, height) {
            out[dir.slot()] = here - values[j];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_cells_have_two_neighbors() {
        let count = |x, y| Direction::ALL.iter().filter(|d| d.neighbor(x, y, 4, 3).is_some()).count();
        assert_eq!(count(0, 0), 2);
        assert_eq!(count(3, 2), 2);
        assert_eq!(count(1, 1), 4);
        assert_eq!(count(0, 1), 3);
    }

    #[test]
    fn opposite_round_trips_through_neighbor() {
        for dir in Direction::ALL {
            let (nx, ny) = dir.neighbor(2, 2, 5, 5).unwrap();
            assert_eq!(dir.opposite().neighbor(nx, ny, 5, 5), Some((2, 2)));
        }
    }

    #[test]
    fn top_is_increasing_y() {
        assert_eq!(Direction::Top.neighbor(1, 1, 3, 3), Some((1, 2)));
        assert_eq!(Direction::Bottom.neighbor(1, 1, 3, 3), Some((1, 0)));
    }

    #[test]
    fn boundary_differences_are_zero() {
        let v = [5.0, 1.0, 2.0, 3.0];
        let d = neighbor_differences(&v, 0, 0, 2, 2);
        assert_eq!(d, [0.0, 4.0, 3.0, 0.0]);
    }
}
