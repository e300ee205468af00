use crate::number::Real;
use crate::state::Direction;

/// One scalar per cell per axis direction (velocity or resolved flow).
#[derive(Clone, Debug, PartialEq)]
pub struct VectorField<T> {
    values: Vec<[T; 4]>,
}

impl<T: Real> VectorField<T> {
    pub fn new(len: usize) -> Self {
        Self { values: vec![[T::zero(); 4]; len] }
    }

    #[inline(always)]
    pub fn get(&self, cell: usize, dir: Direction) -> T {
        self.values[cell][dir.index()]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, cell: usize, dir: Direction) -> &mut T {
        &mut self.values[cell][dir.index()]
    }

    #[inline(always)]
    pub fn set(&mut self, cell: usize, dir: Direction, value: T) {
        self.values[cell][dir.index()] = value;
    }

    /// Accumulate `dv` and return the new component.
    #[inline(always)]
    pub fn add(&mut self, cell: usize, dir: Direction, dv: T) -> T {
        let v = self.get_mut(cell, dir);
        *v += dv;
        *v
    }

    /// Rebuild from four consecutive values per cell. A trailing partial cell is dropped.
    pub fn from_flat(flat: &[T]) -> Self {
        let values = flat
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Self { values }
    }

    /// All components, cell by cell in direction order.
    pub fn flat(&self) -> impl Iterator<Item = T> + '_ {
        self.values.iter().flatten().copied()
    }

    pub fn cell(&self, cell: usize) -> &[T; 4] {
        &self.values[cell]
    }

    /// Exchange the whole direction vectors of two cells.
    pub fn swap_cells(&mut self, a: usize, b: usize) {
        self.values.swap(a, b);
    }

    pub fn clear(&mut self) {
        self.values.fill([T::zero(); 4]);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
