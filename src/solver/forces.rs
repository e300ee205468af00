use super::{Shape, Simulation};
use crate::error::SimError;
use crate::number::Real;
use crate::state::Direction;

impl<P: Real, V: Real, F: Real, S: Shape> Simulation<P, V, F, S> {
    /// Gravity on every cell that has an open cell below it.
    pub(super) fn apply_external_forces(&mut self) {
        for cell in 0..self.grid.len() {
            if self.grid.is_wall(cell) {
                continue;
            }
            if self.grid.open_neighbor(cell, Direction::Down).is_some() {
                self.velocity.add(cell, Direction::Down, self.g);
            }
        }
    }

    /// Turn pressure differences from the start of the tick into velocity.
    ///
    /// Force toward a lower-pressure neighbor first cancels whatever the
    /// neighbor already pushes back with; only the remainder becomes new
    /// velocity and leaves the source cell's pressure.
    pub(super) fn apply_pressure_forces(&mut self, total_delta: &mut P) -> Result<(), SimError> {
        self.old_pressure.copy_from_slice(&self.pressure);
        for cell in 0..self.grid.len() {
            if self.grid.is_wall(cell) {
                continue;
            }
            for dir in Direction::ALL {
                let Some(next) = self.grid.open_neighbor(cell, dir) else {
                    continue;
                };
                if self.old_pressure[next] >= self.old_pressure[cell] {
                    continue;
                }
                let mut force = self.old_pressure[cell] - self.old_pressure[next];

                let back = dir.opposite();
                let rho_next = self.rho(next);
                let held = self.velocity.get(next, back).cast::<P>() * rho_next;
                if held >= force {
                    *self.velocity.get_mut(next, back) -= (force / rho_next).cast::<V>();
                    continue;
                }
                force -= held;
                self.velocity.set(next, back, V::zero());

                let rho = self.rho(cell);
                self.velocity.add(cell, dir, (force / rho).cast::<V>());
                let share = self.pressure_share(force, cell)?;
                self.pressure[cell] -= share;
                *total_delta -= share;
            }
        }
        Ok(())
    }
}
