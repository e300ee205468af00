use super::{FLOW_EPSILON, FLOW_UNIT, Shape, Simulation};
use crate::error::SimError;
use crate::number::{Real, min};
use crate::state::{Direction, FLUID};

/// Result of pushing flow out of one cell.
struct Pushed<F> {
    amount: F,
    /// The caller's edge should carry `amount` too.
    propagate: bool,
    /// Cell where the path closed on itself.
    end: Option<usize>,
}

/// A cell on the flow search stack.
struct FlowFrame<F> {
    cell: usize,
    limit: F,
    /// Directions already tried, in `Direction::ALL` order.
    tried: usize,
    /// Sum of what the cells below this one pushed.
    total: F,
    /// Direction of the edge to the frame above, while it runs.
    waiting: Option<Direction>,
}

impl<F: Real> FlowFrame<F> {
    fn new(cell: usize, limit: F) -> Self {
        Self { cell, limit, tried: 0, total: F::zero(), waiting: None }
    }
}

impl<P: Real, V: Real, F: Real, S: Shape> Simulation<P, V, F, S> {
    /// Resolve velocity into flow, one sweep at a time until a sweep pushes nothing.
    /// Returns the number of sweeps.
    pub(super) fn make_flow(&mut self) -> usize {
        self.flow.clear();
        let unit = F::from_int(FLOW_UNIT);
        let mut sweeps = 0;
        loop {
            self.ut += 2;
            sweeps += 1;
            let mut pushed = false;
            for cell in 0..self.grid.len() {
                if self.grid.is_wall(cell) || self.last_use[cell] == self.ut {
                    continue;
                }
                if self.propagate_flow(cell, unit).amount > F::zero() {
                    pushed = true;
                }
            }
            if !pushed {
                return sweeps;
            }
        }
    }

    /// Depth-first search for a path that returns to a cell still on the stack.
    /// Each edge on a closed path takes the path's bottleneck amount.
    ///
    /// The search keeps its own stack of frames and visits cells in the same
    /// order a recursive walk would.
    fn propagate_flow(&mut self, start: usize, limit: F) -> Pushed<F> {
        self.last_use[start] = self.ut - 1;
        let mut stack = vec![FlowFrame::new(start, limit)];
        // Result of the frame just popped, for the one below it
        let mut returned: Option<Pushed<F>> = None;

        while let Some(frame) = stack.last_mut() {
            let cell = frame.cell;
            let mut done = None;
            let mut descend = None;

            if let Some(child) = returned.take() {
                frame.total += child.amount;
                if let (true, Some(dir)) = (child.propagate, frame.waiting) {
                    self.flow.add(cell, dir, child.amount);
                    done = Some(Pushed {
                        amount: child.amount,
                        propagate: child.end != Some(cell),
                        end: child.end,
                    });
                }
                frame.waiting = None;
            }

            if done.is_none() {
                match Direction::ALL.get(frame.tried).copied() {
                    None => done = Some(Pushed { amount: frame.total, propagate: false, end: None }),
                    Some(dir) => {
                        frame.tried += 1;
                        if let Some((next, amount)) = self.flow_edge(cell, dir, frame.limit) {
                            if self.last_use[next] == self.ut - 1 {
                                // Back edge: the path closes here
                                self.flow.add(cell, dir, amount);
                                done = Some(Pushed { amount, propagate: true, end: Some(next) });
                            } else {
                                frame.waiting = Some(dir);
                                descend = Some((next, amount));
                            }
                        }
                    }
                }
            }

            if let Some(pushed) = done {
                self.last_use[cell] = self.ut;
                stack.pop();
                returned = Some(pushed);
            } else if let Some((next, amount)) = descend {
                self.last_use[next] = self.ut - 1;
                stack.push(FlowFrame::new(next, amount));
            }
        }
        returned.unwrap_or(Pushed { amount: F::zero(), propagate: false, end: None })
    }

    /// Neighbor across `dir` and the amount the edge can still take, if it
    /// leads to a cell not finished this sweep and has capacity left.
    fn flow_edge(&self, cell: usize, dir: Direction, limit: F) -> Option<(usize, F)> {
        let next = self.grid.open_neighbor(cell, dir)?;
        if self.last_use[next] >= self.ut {
            return None;
        }
        let capacity = self.velocity.get(cell, dir).cast::<F>();
        let used = self.flow.get(cell, dir);
        if capacity - used <= self.flow_epsilon {
            return None;
        }
        Some((next, min(limit, capacity - used)))
    }

    /// Cut positive velocity back to the resolved flow and return the
    /// difference as pressure on the receiving side of each edge. An edge
    /// into a wall or off the grid returns it to the source cell.
    pub(super) fn recalculate_pressure(&mut self, total_delta: &mut P) -> Result<(), SimError> {
        for cell in 0..self.grid.len() {
            if self.grid.is_wall(cell) {
                continue;
            }
            for dir in Direction::ALL {
                let old_v = self.velocity.get(cell, dir);
                if old_v <= V::zero() {
                    continue;
                }
                let flow = self.flow.get(cell, dir);
                let mut new_v = flow.cast::<V>();
                if new_v > old_v {
                    if (new_v - old_v).to_f64() > FLOW_EPSILON {
                        let (row, col) = self.grid.coords(cell);
                        return Err(SimError::FlowExceedsCapacity {
                            row,
                            col,
                            dir: dir.name(),
                            flow: flow.to_f64(),
                            velocity: old_v.to_f64(),
                        });
                    }
                    new_v = old_v;
                }
                self.velocity.set(cell, dir, new_v);

                let mut force = (old_v - new_v).cast::<P>() * self.rho(cell);
                if self.grid.medium(cell) == FLUID {
                    force *= self.fluid_damping;
                }
                let target = self.grid.open_neighbor(cell, dir).unwrap_or(cell);
                let share = self.pressure_share(force, target)?;
                self.pressure[target] += share;
                *total_delta += share;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::checkpoint::{CellState, FieldFile, Samples};
    use crate::error::SimError;
    use crate::number::{Fixed, Real};
    use crate::solver::{SolverParams, Simulation};
    use crate::state::{Direction, idx};

    type Sim = Simulation<Fixed<32, 16>, Fixed<32, 16>, Fixed<32, 16>>;

    fn load(field: &[&str], velocity: &[(usize, Direction, f64)]) -> Sim {
        let mut file = FieldFile::new(field);
        let cells = file.rows * file.cols;
        let mut flat = vec![0.0; cells * 4];
        for &(cell, dir, v) in velocity {
            flat[cell * 4 + dir.index()] = v;
        }
        file.state = Some(CellState {
            pressure: Samples::Float(vec![0.0; cells]),
            velocity: Samples::Float(flat),
        });
        Sim::from_file(&file, &SolverParams::default()).unwrap()
    }

    #[test]
    fn test_ring_flow_limited_by_bottleneck() {
        // Clockwise circulation around a 2x2 block; the top edge is the bottleneck
        let tl = idx(0, 0, 2);
        let tr = idx(0, 1, 2);
        let br = idx(1, 1, 2);
        let bl = idx(1, 0, 2);
        let mut sim = load(
            &["  ", "  "],
            &[
                (tl, Direction::Right, 0.25),
                (tr, Direction::Down, 2.0),
                (br, Direction::Left, 2.0),
                (bl, Direction::Up, 2.0),
            ],
        );
        sim.make_flow();
        for (cell, dir) in [(tl, Direction::Right), (tr, Direction::Down), (br, Direction::Left), (bl, Direction::Up)] {
            let f = sim.flow.get(cell, dir).to_f64();
            assert_eq!(f, 0.25, "flow on cell {} {:?}: {}", cell, dir, f);
        }
    }

    #[test]
    fn test_flow_caps_at_one_unit_per_sweep_and_repeats() {
        let mut sim = load(&[". "], &[(0, Direction::Right, 2.5), (1, Direction::Left, 2.5)]);
        let sweeps = sim.make_flow();
        // 1 + 1 + 0.5, then one sweep that finds nothing left
        assert_eq!(sweeps, 4);
        assert_eq!(sim.flow.get(0, Direction::Right).to_f64(), 2.5);
        assert_eq!(sim.flow.get(1, Direction::Left).to_f64(), 2.5);
    }

    #[test]
    fn test_dead_end_gets_no_flow() {
        let mut sim = load(&["..."], &[(0, Direction::Right, 1.0), (1, Direction::Right, 1.0)]);
        let sweeps = sim.make_flow();
        assert_eq!(sweeps, 1);
        assert!(sim.flow.flat().all(|f| f == Fixed::<32, 16>::zero()));
    }

    #[test]
    fn test_recalculate_credits_receiving_cell() {
        // Empty cell with unresolved velocity toward the fluid
        let mut sim = load(&["# .#"], &[(1, Direction::Right, 0.5)]);
        sim.make_flow();
        let mut delta = Fixed::<32, 16>::zero();
        sim.recalculate_pressure(&mut delta).unwrap();
        assert_eq!(sim.velocity.get(1, Direction::Right).to_f64(), 0.0);
        // 0.5 * rho(' '), spread over the fluid cell's single open side
        let expected = Fixed::<32, 16>::from_f64(0.5) * Fixed::<32, 16>::from_f64(0.01);
        assert_eq!(sim.pressure(2), expected);
        assert_eq!(sim.pressure(1), Fixed::<32, 16>::zero());
        assert_eq!(delta, expected);
    }

    #[test]
    fn test_recalculate_against_wall_credits_source_with_damping() {
        let mut sim = load(&["#. #"], &[(1, Direction::Left, 1.0)]);
        sim.make_flow();
        let mut delta = Fixed::<32, 16>::zero();
        sim.recalculate_pressure(&mut delta).unwrap();
        let p = sim.pressure(1).to_f64();
        // 1.0 * 1000 * 0.8, with 0.8 truncated to 16 fractional bits
        assert!((p - 800.0).abs() < 0.05, "fluid keeps damped force: {}", p);
        assert_eq!(sim.pressure(2).to_f64(), 0.0);
    }

    #[test]
    fn test_negative_velocity_left_alone() {
        let mut sim = load(&["  "], &[(0, Direction::Right, -1.0)]);
        sim.make_flow();
        let mut delta = Fixed::<32, 16>::zero();
        sim.recalculate_pressure(&mut delta).unwrap();
        assert_eq!(sim.velocity.get(0, Direction::Right).to_f64(), -1.0);
        assert_eq!(delta, Fixed::<32, 16>::zero());
    }

    /// Velocities circulating clockwise around a `2 x cols` ring.
    fn ring(cols: usize) -> Vec<(usize, Direction, f64)> {
        let mut velocity = Vec::new();
        for col in 0..cols {
            let top = if col + 1 < cols { Direction::Right } else { Direction::Down };
            let bottom = if col > 0 { Direction::Left } else { Direction::Up };
            velocity.push((idx(0, col, cols), top, 1.0));
            velocity.push((idx(1, col, cols), bottom, 1.0));
        }
        velocity
    }

    #[test]
    fn test_long_ring_resolves_on_default_stack() {
        let cols = 5000;
        let row = " ".repeat(cols);
        let velocity = ring(cols);
        let mut sim = load(&[row.as_str(), row.as_str()], &velocity);
        assert_eq!(sim.make_flow(), 2);
        for &(cell, dir, _) in &velocity {
            let f = sim.flow.get(cell, dir).to_f64();
            assert_eq!(f, 1.0, "flow on cell {} {:?}: {}", cell, dir, f);
        }
    }

    #[test]
    fn test_flow_over_capacity_is_an_error() {
        let mut sim = load(&["  "], &[(0, Direction::Right, 0.5)]);
        sim.flow.set(0, Direction::Right, Fixed::<32, 16>::from_f64(0.51));
        let mut delta = Fixed::<32, 16>::zero();
        let err = sim.recalculate_pressure(&mut delta).unwrap_err();
        assert!(
            matches!(err, SimError::FlowExceedsCapacity { row: 0, col: 0, dir: "right", .. }),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_flow_within_epsilon_is_clamped() {
        let mut sim = load(&["  "], &[(0, Direction::Right, 0.5)]);
        // Three raw units over: about 4.6e-5, inside the tolerance
        let half = Fixed::<32, 16>::from_f64(0.5);
        sim.flow.set(0, Direction::Right, Fixed::<32, 16>::from_raw(half.raw() + 3));
        let mut delta = Fixed::<32, 16>::zero();
        sim.recalculate_pressure(&mut delta).unwrap();
        assert_eq!(sim.velocity.get(0, Direction::Right), half);
        assert_eq!(delta, Fixed::<32, 16>::zero());
    }
}
