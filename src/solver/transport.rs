use super::{Shape, Simulation};
use crate::error::SimError;
use crate::number::Real;
use crate::state::Direction;

impl<P: Real, V: Real, F: Real, S: Shape> Simulation<P, V, F, S> {
    /// Give every unsettled cell one chance to move its content along its velocity.
    /// Returns whether anything moved.
    pub(super) fn apply_moves(&mut self) -> Result<bool, SimError> {
        self.ut += 2;
        let mut moved = false;
        for cell in 0..self.grid.len() {
            if self.grid.is_wall(cell) || self.last_use[cell] == self.ut {
                continue;
            }
            let draw = self.random01::<V>();
            if draw < self.move_prob(cell) {
                moved = true;
                self.propagate_move(cell)?;
            } else {
                self.propagate_stop(cell, true);
            }
        }
        Ok(moved)
    }

    /// Sum of non-negative velocity toward neighbors not yet settled this sweep.
    pub(super) fn move_prob(&self, cell: usize) -> V {
        let mut sum = V::zero();
        for dir in Direction::ALL {
            let Some(next) = self.grid.open_neighbor(cell, dir) else {
                continue;
            };
            if self.last_use[next] == self.ut {
                continue;
            }
            let v = self.velocity.get(cell, dir);
            if v >= V::zero() {
                sum += v;
            }
        }
        sum
    }

    /// Follow randomly chosen velocity directions until the chain reaches the
    /// starting cell again, then rotate contents along the chain from its far
    /// end back to the start. The starting cell itself never swaps; its
    /// predecessor on the closed chain does.
    ///
    /// The chain lives on an explicit stack, so its length is bounded by the
    /// cell count rather than the thread's stack.
    fn propagate_move(&mut self, start: usize) -> Result<bool, SimError> {
        self.last_use[start] = self.ut - 1;
        let mut chain = vec![MoveStep { cell: start, target: start }];
        // Outcome of the step just popped, for the one below it
        let mut returned: Option<bool> = None;

        while let Some(step) = chain.last_mut() {
            let cell = step.cell;
            let closed = if returned.take() == Some(true) {
                true
            } else {
                match self.sample_move(cell)? {
                    None => false,
                    Some(next) if self.last_use[next] == self.ut - 1 => {
                        step.target = next;
                        true
                    }
                    Some(next) => {
                        step.target = next;
                        self.last_use[next] = self.ut;
                        chain.push(MoveStep { cell: next, target: next });
                        continue;
                    }
                }
            };

            let target = step.target;
            chain.pop();
            self.last_use[cell] = self.ut;
            for dir in Direction::ALL {
                if let Some(next) = self.grid.open_neighbor(cell, dir) {
                    if self.last_use[next] < self.ut - 1 && self.velocity.get(cell, dir) < V::zero() {
                        self.propagate_stop(next, false);
                    }
                }
            }
            if closed && !chain.is_empty() {
                self.swap_cells(cell, target);
            }
            returned = Some(closed);
        }
        Ok(returned == Some(true))
    }

    /// Pick the next cell of a move chain, weighted by non-negative velocity
    /// toward neighbors not yet settled. `None` when no such velocity is left.
    fn sample_move(&mut self, cell: usize) -> Result<Option<usize>, SimError> {
        let mut bounds = [V::zero(); 4];
        let mut sum = V::zero();
        for dir in Direction::ALL {
            if let Some(next) = self.grid.open_neighbor(cell, dir) {
                let v = self.velocity.get(cell, dir);
                if self.last_use[next] != self.ut && v >= V::zero() {
                    sum += v;
                }
            }
            bounds[dir.index()] = sum;
        }
        if sum == V::zero() {
            return Ok(None);
        }

        let pick = self.random01::<V>() * sum;
        let next = Direction::ALL
            .into_iter()
            .find(|dir| bounds[dir.index()] > pick)
            .and_then(|dir| self.grid.open_neighbor(cell, dir));
        match next {
            Some(next) => Ok(Some(next)),
            None => {
                let (row, col) = self.grid.coords(cell);
                Err(SimError::EmptySample { row, col })
            }
        }
    }

    /// Settle `cell` unless it still points at an unvisited neighbor, then
    /// spread to the neighbors it is not pushing into, depth first.
    fn propagate_stop(&mut self, start: usize, force: bool) {
        if !force && self.pushes_onward(start) {
            return;
        }
        self.last_use[start] = self.ut;
        // (cell, next direction to try)
        let mut stack = vec![(start, 0usize)];
        while let Some(frame) = stack.last_mut() {
            let (cell, tried) = *frame;
            let Some(&dir) = Direction::ALL.get(tried) else {
                stack.pop();
                continue;
            };
            frame.1 += 1;
            let Some(next) = self.grid.open_neighbor(cell, dir) else {
                continue;
            };
            if self.last_use[next] == self.ut || self.velocity.get(cell, dir) > V::zero() || self.pushes_onward(next) {
                continue;
            }
            self.last_use[next] = self.ut;
            stack.push((next, 0));
        }
    }

    /// `cell` has positive velocity toward a neighbor not visited this sweep.
    fn pushes_onward(&self, cell: usize) -> bool {
        Direction::ALL.into_iter().any(|dir| {
            self.grid.open_neighbor(cell, dir).is_some_and(|next| {
                self.last_use[next] < self.ut - 1 && self.velocity.get(cell, dir) > V::zero()
            })
        })
    }
}

/// One cell on a move chain and the neighbor it was sampled to move into.
struct MoveStep {
    cell: usize,
    target: usize,
}
