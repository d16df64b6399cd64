use ndarray::{Array2, ArrayView2};

use crate::error::{Result, TrackerError};

/// Exact rectangular linear sum assignment (minimisation).
///
/// Shortest augmenting path with row/column potentials. Pairs `min(rows, cols)`
/// rows with distinct columns at minimum total cost and returns them as parallel
/// `(row_indices, col_indices)` sorted by row.
pub fn linear_sum_assignment(cost_matrix: ArrayView2<f64>) -> Result<(Vec<usize>, Vec<usize>)> {
    let (row, col) = cost_matrix.dim();
    if row == 0 || col == 0 {
        return Err(TrackerError::assignment(format!(
            "degenerate {}x{} cost matrix",
            row, col
        )));
    }
    if cost_matrix.iter().any(|c| !c.is_finite()) {
        return Err(TrackerError::assignment("cost matrix has non-finite entries"));
    }

    // the solver wants at least as many columns as rows
    let transpose = col < row;
    let cost: Array2<f64> = if transpose {
        cost_matrix.t().to_owned()
    } else {
        cost_matrix.to_owned()
    };

    let col4row = solve(&cost)?;

    let mut pairs: Vec<(usize, usize)> = col4row
        .into_iter()
        .enumerate()
        .map(|(r, c)| if transpose { (c, r) } else { (r, c) })
        .collect();
    pairs.sort_unstable();

    Ok(pairs.into_iter().unzip())
}

/// Assigns a column to every row of `cost` (requires `nrows <= ncols`).
fn solve(cost: &Array2<f64>) -> Result<Vec<usize>> {
    let (nr, nc) = cost.dim();
    let mut u = vec![0.0; nr];
    let mut v = vec![0.0; nc];
    let mut shortest = vec![f64::INFINITY; nc];
    let mut path = vec![0usize; nc];
    let mut col4row: Vec<Option<usize>> = vec![None; nr];
    let mut row4col: Vec<Option<usize>> = vec![None; nc];
    let mut visited_rows = vec![false; nr];
    let mut visited_cols = vec![false; nc];
    let mut remaining = vec![0usize; nc];

    for cur_row in 0..nr {
        // Dijkstra-like search for the cheapest augmenting path from cur_row
        let mut min_val = 0.0;
        let mut num_remaining = nc;
        for (it, slot) in remaining.iter_mut().enumerate() {
            *slot = nc - it - 1;
        }
        visited_rows.iter_mut().for_each(|x| *x = false);
        visited_cols.iter_mut().for_each(|x| *x = false);
        shortest.iter_mut().for_each(|x| *x = f64::INFINITY);

        let mut i = cur_row;
        let sink = loop {
            visited_rows[i] = true;
            let mut index = None;
            let mut lowest = f64::INFINITY;
            for (it, &j) in remaining[..num_remaining].iter().enumerate() {
                let r = min_val + cost[[i, j]] - u[i] - v[j];
                if r < shortest[j] {
                    path[j] = i;
                    shortest[j] = r;
                }
                if shortest[j] < lowest || (shortest[j] == lowest && row4col[j].is_none()) {
                    lowest = shortest[j];
                    index = Some(it);
                }
            }

            min_val = lowest;
            let index = match index {
                Some(index) if min_val.is_finite() => index,
                _ => return Err(TrackerError::assignment("cost matrix is infeasible")),
            };

            let j = remaining[index];
            visited_cols[j] = true;
            num_remaining -= 1;
            remaining[index] = remaining[num_remaining];

            match row4col[j] {
                None => break j,
                Some(next) => i = next,
            }
        };

        // update dual variables
        u[cur_row] += min_val;
        for r in 0..nr {
            if visited_rows[r] && r != cur_row {
                if let Some(c) = col4row[r] {
                    u[r] += min_val - shortest[c];
                }
            }
        }
        for c in 0..nc {
            if visited_cols[c] {
                v[c] -= min_val - shortest[c];
            }
        }

        // augment along the path back to cur_row
        let mut j = sink;
        loop {
            let i = path[j];
            row4col[j] = Some(i);
            let previous = col4row[i].replace(j);
            if i == cur_row {
                break;
            }
            j = previous.ok_or_else(|| TrackerError::assignment("broken augmenting path"))?;
        }
    }

    col4row
        .into_iter()
        .map(|c| c.ok_or_else(|| TrackerError::assignment("row left unassigned")))
        .collect()
}

/// Outcome of gated matching, indexed by cost-matrix row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matching {
    /// Matched column per row, `None` when unassigned.
    pub rows: Vec<Option<usize>>,
    /// Optimal pairs dropped for exceeding the threshold.
    pub rejected: Vec<(usize, usize)>,
}

/// Costs are clamped to this before solving so the potentials stay finite.
const COST_CEILING: f64 = 1e12;

/// Runs the solver, then demotes every pair whose cost exceeds `max_distance`.
///
/// Empty matrices never reach the solver; every row comes back unassigned.
/// Entries above [`COST_CEILING`] (or non-finite) are solved as the ceiling and
/// gated on their real value, so they never match unless `max_distance` admits them.
pub fn min_cost_matching(cost_matrix: ArrayView2<f64>, max_distance: f64) -> Result<Matching> {
    let (row, col) = cost_matrix.dim();
    let mut matching = Matching {
        rows: vec![None; row],
        rejected: vec![],
    };
    if row == 0 || col == 0 {
        return Ok(matching);
    }

    // f64::min drops NaN
    let clamped = cost_matrix.mapv(|c| c.min(COST_CEILING));
    let (row_indices, col_indices) = linear_sum_assignment(clamped.view())?;
    for (r, c) in row_indices.into_iter().zip(col_indices) {
        if !(cost_matrix[[r, c]] <= max_distance) {
            log::debug!(
                "rejecting pair row {} col {}: cost {:.2} > {:.2}",
                r,
                c,
                cost_matrix[[r, c]],
                max_distance
            );
            matching.rejected.push((r, c));
            continue;
        }
        matching.rows[r] = Some(c);
    }
    Ok(matching)
}
