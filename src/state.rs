use crate::error::ConfigError;

/// Reserved medium: never moves, has no density and blocks every direction.
pub const WALL: u8 = b'#';
/// Default light medium.
pub const EMPTY: u8 = b' ';
/// Default heavy medium; its pressure feedback is damped.
pub const FLUID: u8 = b'.';

/// Axis directions in the order every per-cell array uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// (row, col) offset.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Row-major index for in-bounds coordinates.
#[inline(always)]
pub const fn idx(row: usize, col: usize, cols: usize) -> usize {
    row * cols + col
}

/// Density per medium symbol. Only ASCII symbols can be registered.
#[derive(Clone, Debug)]
pub struct DensityTable<P> {
    rho: [Option<P>; 128],
}

impl<P: Copy> DensityTable<P> {
    pub fn new() -> Self {
        Self { rho: [None; 128] }
    }

    /// Register `value` for `symbol`. Walls and non-ASCII symbols are rejected.
    pub fn set(&mut self, symbol: u8, value: P) -> Result<(), ConfigError> {
        if symbol == WALL || !symbol.is_ascii() {
            return Err(ConfigError::BadDensitySymbol((symbol as char).to_string()));
        }
        self.rho[symbol as usize] = Some(value);
        Ok(())
    }

    pub fn get(&self, symbol: u8) -> Option<P> {
        self.rho.get(symbol as usize).copied().flatten()
    }

    /// Registered `(symbol, density)` pairs in symbol order.
    pub fn entries(&self) -> impl Iterator<Item = (u8, P)> + '_ {
        self.rho
            .iter()
            .enumerate()
            .filter_map(|(symbol, rho)| rho.map(|r| (symbol as u8, r)))
    }
}

impl<P: Copy> Default for DensityTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cell media plus the static topology derived from them.
///
/// Which cells are walls never changes after construction, so the
/// openness count (non-wall axis neighbors) is computed once. Cells
/// outside the rectangle count as walls.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
    openness: Vec<u8>,
}

impl Grid {
    /// Build from text rows; the row count and every row length must match the declared size.
    pub fn from_rows<S: AsRef<str>>(rows: usize, cols: usize, lines: &[S]) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyField);
        }
        if lines.len() != rows {
            return Err(ConfigError::RowCount { expected: rows, actual: lines.len() });
        }
        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let len = line.chars().count();
            if len != cols {
                return Err(ConfigError::RowLength { row, expected: cols, actual: len });
            }
            for (col, ch) in line.chars().enumerate() {
                if !ch.is_ascii() {
                    return Err(ConfigError::NonAsciiSymbol { row, col, symbol: ch });
                }
                cells.push(ch as u8);
            }
        }

        let mut grid = Self { rows, cols, cells, openness: vec![0; rows * cols] };
        for cell in 0..grid.len() {
            if grid.is_wall(cell) {
                continue;
            }
            let open = Direction::ALL
                .iter()
                .filter(|&&dir| grid.open_neighbor(cell, dir).is_some())
                .count();
            grid.openness[cell] = open as u8;
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn coords(&self, cell: usize) -> (usize, usize) {
        (cell / self.cols, cell % self.cols)
    }

    #[inline(always)]
    pub fn medium(&self, cell: usize) -> u8 {
        self.cells[cell]
    }

    #[inline(always)]
    pub fn is_wall(&self, cell: usize) -> bool {
        self.cells[cell] == WALL
    }

    /// Neighbor index, or `None` past the edge.
    #[inline(always)]
    pub fn neighbor(&self, cell: usize, dir: Direction) -> Option<usize> {
        let (row, col) = self.coords(cell);
        let (dr, dc) = dir.delta();
        let nr = row.checked_add_signed(dr)?;
        let nc = col.checked_add_signed(dc)?;
        (nr < self.rows && nc < self.cols).then(|| idx(nr, nc, self.cols))
    }

    /// Neighbor index when it exists and is not a wall.
    #[inline(always)]
    pub fn open_neighbor(&self, cell: usize, dir: Direction) -> Option<usize> {
        self.neighbor(cell, dir).filter(|&n| !self.is_wall(n))
    }

    #[inline(always)]
    pub fn openness(&self, cell: usize) -> u8 {
        self.openness[cell]
    }

    /// Exchange media. Walls never take part, so topology is unchanged.
    pub fn swap_media(&mut self, a: usize, b: usize) {
        debug_assert!(!self.is_wall(a) && !self.is_wall(b));
        self.cells.swap(a, b);
    }

    pub fn row_bytes(&self, row: usize) -> &[u8] {
        let start = idx(row, 0, self.cols);
        &self.cells[start..start + self.cols]
    }

    pub fn lines(&self) -> Vec<String> {
        (0..self.rows)
            .map(|r| self.row_bytes(r).iter().map(|&b| b as char).collect())
            .collect()
    }

    /// Append the grid, one line per row.
    pub fn render_into(&self, out: &mut String) {
        out.reserve(self.rows * (self.cols + 1));
        for row in 0..self.rows {
            out.extend(self.row_bytes(row).iter().map(|&b| b as char));
            out.push('\n');
        }
    }

    /// Number of cells holding `symbol`.
    pub fn count(&self, symbol: u8) -> usize {
        self.cells.iter().filter(|&&c| c == symbol).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(lines: &[&str]) -> Grid {
        Grid::from_rows(lines.len(), lines[0].len(), lines).unwrap()
    }

    #[test]
    fn test_direction_opposites() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dr, dc) = dir.delta();
            let (or, oc) = dir.opposite().delta();
            assert_eq!((dr + or, dc + oc), (0, 0));
        }
    }

    #[test]
    fn test_direction_index_order() {
        let indices: Vec<usize> = Direction::ALL.iter().map(|d| d.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_openness_counts_non_wall_neighbors() {
        let g = grid(&["#####", "#. .#", "## ##", "#####"]);
        assert_eq!(g.openness(idx(1, 1, 5)), 1);
        assert_eq!(g.openness(idx(1, 2, 5)), 3);
        assert_eq!(g.openness(idx(2, 2, 5)), 1);
        assert_eq!(g.openness(idx(0, 0, 5)), 0, "walls keep zero openness");
    }

    #[test]
    fn test_enclosed_cell_has_zero_openness() {
        let g = grid(&["###", "# #", "###"]);
        assert_eq!(g.openness(idx(1, 1, 3)), 0);
    }

    #[test]
    fn test_edges_behave_like_walls() {
        let g = grid(&["..", ".."]);
        assert_eq!(g.neighbor(0, Direction::Up), None);
        assert_eq!(g.neighbor(0, Direction::Left), None);
        assert_eq!(g.neighbor(0, Direction::Right), Some(1));
        assert_eq!(g.neighbor(0, Direction::Down), Some(2));
        assert_eq!(g.openness(0), 2);
    }

    #[test]
    fn test_row_count_mismatch() {
        let err = Grid::from_rows(3, 2, &["..", ".."]).unwrap_err();
        assert!(matches!(err, ConfigError::RowCount { expected: 3, actual: 2 }));
    }

    #[test]
    fn test_row_length_mismatch() {
        let err = Grid::from_rows(2, 3, &["...", ".."]).unwrap_err();
        assert!(matches!(err, ConfigError::RowLength { row: 1, expected: 3, actual: 2 }));
    }

    #[test]
    fn test_non_ascii_rejected() {
        let err = Grid::from_rows(1, 2, &[".é"]).unwrap_err();
        assert!(matches!(err, ConfigError::NonAsciiSymbol { row: 0, col: 1, .. }));
    }

    #[test]
    fn test_render_round_trip() {
        let lines = ["####", "#. #", "####"];
        let g = grid(&lines);
        let mut out = String::new();
        g.render_into(&mut out);
        assert_eq!(out, "####\n#. #\n####\n");
        assert_eq!(g.lines(), lines.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn test_swap_media_and_count() {
        let mut g = grid(&["#. #"]);
        assert_eq!(g.count(FLUID), 1);
        g.swap_media(1, 2);
        assert_eq!(g.medium(1), EMPTY);
        assert_eq!(g.medium(2), FLUID);
        assert_eq!(g.count(WALL), 2);
    }

    #[test]
    fn test_density_table() {
        let mut table = DensityTable::new();
        table.set(EMPTY, 0.01f64).unwrap();
        table.set(FLUID, 1000.0).unwrap();
        assert_eq!(table.get(FLUID), Some(1000.0));
        assert_eq!(table.get(b'x'), None);
        assert_eq!(table.get(200), None);
        assert!(table.set(WALL, 1.0).is_err());
        let entries: Vec<_> = table.entries().collect();
        assert_eq!(entries, vec![(EMPTY, 0.01), (FLUID, 1000.0)]);
    }
}
