use crate::field::VectorField;
use crate::number::Real;
use crate::state::{Direction, Grid};

/// Largest amount by which |flow| exceeds |velocity| in any cell and direction.
/// Zero or negative when every edge respects its capacity.
pub fn max_flow_excess<V: Real, F: Real>(velocity: &VectorField<V>, flow: &VectorField<F>) -> f64 {
    let mut worst = f64::NEG_INFINITY;
    for cell in 0..velocity.len() {
        for dir in Direction::ALL {
            let excess = flow.get(cell, dir).to_f64().abs() - velocity.get(cell, dir).to_f64().abs();
            worst = worst.max(excess);
        }
    }
    if worst.is_finite() { worst } else { 0.0 }
}

/// Sum of all cell pressures.
pub fn total_pressure<P: Real>(pressure: &[P]) -> f64 {
    pressure.iter().map(|p| p.to_f64()).sum()
}

/// Number of wall cells with a non-zero component in `field`.
pub fn moving_walls<T: Real>(grid: &Grid, field: &VectorField<T>) -> usize {
    (0..grid.len())
        .filter(|&cell| grid.is_wall(cell) && field.cell(cell).iter().any(|&v| v != T::zero()))
        .count()
}

/// `(symbol, cells)` for every symbol present, in symbol order.
pub fn media_counts(grid: &Grid) -> Vec<(u8, usize)> {
    let mut counts = [0usize; 128];
    for cell in 0..grid.len() {
        counts[grid.medium(cell) as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, n)| **n > 0)
        .map(|(symbol, &n)| (symbol as u8, n))
        .collect()
}
