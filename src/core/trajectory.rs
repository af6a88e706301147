use chrono::{Months, NaiveDate};
use serde::Serialize;

use super::error::SimError;
use super::state::Simulation;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Debt,
    Cash,
    Investment,
    NetWorth,
}

impl Category {
    /// Darker shades once independence has been reached.
    pub fn color(self, financially_independent: bool) -> &'static str {
        match (self, financially_independent) {
            (Category::Debt, true) => "#e65c00",
            (Category::Debt, false) => "#ff944d",
            (Category::Cash, true) => "#008000",
            (Category::Cash, false) => "#00e600",
            (Category::Investment, true) => "#800080",
            (Category::Investment, false) => "#e600e6",
            (Category::NetWorth, true) => "#75a3a3",
            (Category::NetWorth, false) => "#b3cccc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Negative magnitude of outstanding debt.
    pub debt: f64,
    pub cash: f64,
    pub cash_plus_investments: f64,
    pub net_worth: f64,
    pub financially_independent: bool,
}

impl Snapshot {
    pub fn capture(sim: &Simulation) -> Result<Self, SimError> {
        let start = sim.current_date();
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or(SimError::DateOutOfRange)?;
        Ok(Self {
            start,
            end,
            debt: -sim.debt(),
            cash: sim.cash(),
            cash_plus_investments: sim.cash() + sim.net_investments(),
            net_worth: sim.net_worth(),
            financially_independent: sim.is_financially_independent(),
        })
    }

    /// The four chart bands of this month as `(category, bottom, top)`.
    pub fn bands(&self) -> [(Category, f64, f64); 4] {
        [
            (Category::Debt, self.debt, 0.0),
            (Category::Cash, 0.0, self.cash),
            (Category::Investment, self.cash, self.cash_plus_investments),
            (Category::NetWorth, self.cash_plus_investments, self.net_worth),
        ]
    }
}

#[derive(Debug, Default)]
pub struct TrajectoryRecorder {
    snapshots: Vec<Snapshot>,
}

impl TrajectoryRecorder {
    pub fn with_capacity(months: usize) -> Self {
        Self {
            snapshots: Vec::with_capacity(months),
        }
    }

    pub fn record(&mut self, sim: &Simulation) -> Result<(), SimError> {
        self.snapshots.push(Snapshot::capture(sim)?);
        Ok(())
    }

    pub fn finish(self) -> Trajectory {
        Trajectory {
            snapshots: self.snapshots,
        }
    }
}

/// Ordered, one-per-month record of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trajectory {
    snapshots: Vec<Snapshot>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// First month flagged as financially independent.
    pub fn independence_date(&self) -> Option<NaiveDate> {
        self.snapshots
            .iter()
            .find(|s| s.financially_independent)
            .map(|s| s.start)
    }

    pub fn quads(&self) -> QuadTable {
        let mut table = QuadTable::with_capacity(self.snapshots.len() * 4);
        for snapshot in &self.snapshots {
            for (category, bottom, top) in snapshot.bands() {
                table.left.push(snapshot.start);
                table.right.push(snapshot.end);
                table.bottom.push(bottom);
                table.top.push(top);
                table
                    .color
                    .push(category.color(snapshot.financially_independent));
                table.category.push(category);
            }
        }
        table
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

/// Column-oriented rows for a quad/bar chart, four rows per month.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuadTable {
    pub left: Vec<NaiveDate>,
    pub right: Vec<NaiveDate>,
    pub bottom: Vec<f64>,
    pub top: Vec<f64>,
    pub color: Vec<&'static str>,
    pub category: Vec<Category>,
}

impl QuadTable {
    fn with_capacity(rows: usize) -> Self {
        Self {
            left: Vec::with_capacity(rows),
            right: Vec::with_capacity(rows),
            bottom: Vec::with_capacity(rows),
            top: Vec::with_capacity(rows),
            color: Vec::with_capacity(rows),
            category: Vec::with_capacity(rows),
        }
    }

    pub fn rows(&self) -> usize {
        self.left.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(month: u32, fi: bool) -> Snapshot {
        let start = NaiveDate::from_ymd_opt(2020, month, 1).expect("valid date");
        Snapshot {
            start,
            end: start + Months::new(1),
            debt: -40.0,
            cash: 10.0,
            cash_plus_investments: 25.0,
            net_worth: 135.0,
            financially_independent: fi,
        }
    }

    fn trajectory(snapshots: Vec<Snapshot>) -> Trajectory {
        Trajectory { snapshots }
    }

    #[test]
    fn quads_emit_four_stacked_bands_per_month() {
        let traj = trajectory(vec![snapshot(1, false), snapshot(2, true)]);
        let quads = traj.quads();

        assert_eq!(quads.rows(), 8);
        assert_eq!(
            &quads.category[..4],
            &[
                Category::Debt,
                Category::Cash,
                Category::Investment,
                Category::NetWorth
            ]
        );
        assert_eq!(&quads.bottom[..4], &[-40.0, 0.0, 10.0, 25.0]);
        assert_eq!(&quads.top[..4], &[0.0, 10.0, 25.0, 135.0]);
        assert_eq!(quads.left[0], NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"));
        assert_eq!(quads.right[0], NaiveDate::from_ymd_opt(2020, 2, 1).expect("valid date"));
    }

    #[test]
    fn quad_colors_switch_once_independent() {
        let quads = trajectory(vec![snapshot(1, false), snapshot(2, true)]).quads();
        assert_eq!(quads.color[0], "#ff944d");
        assert_eq!(quads.color[4], "#e65c00");
        assert_eq!(quads.color[7], "#75a3a3");
    }

    #[test]
    fn independence_date_is_first_flagged_month() {
        let traj = trajectory(vec![snapshot(1, false), snapshot(2, true), snapshot(3, true)]);
        assert_eq!(
            traj.independence_date(),
            NaiveDate::from_ymd_opt(2020, 2, 1)
        );
        assert_eq!(trajectory(vec![snapshot(1, false)]).independence_date(), None);
    }

    #[test]
    fn trajectory_iteration_is_restartable() {
        let traj = trajectory(vec![snapshot(1, false), snapshot(2, false)]);
        let first: Vec<_> = traj.iter().map(|s| s.start).collect();
        let second: Vec<_> = (&traj).into_iter().map(|s| s.start).collect();
        assert_eq!(first, second);
        assert_eq!(traj.len(), 2);
    }

    #[test]
    fn quad_table_serializes_named_columns() {
        let json = serde_json::to_string(&trajectory(vec![snapshot(1, false)]).quads())
            .expect("table should serialize");
        for column in ["\"left\"", "\"right\"", "\"bottom\"", "\"top\"", "\"color\"", "\"category\""] {
            assert!(json.contains(column), "missing column {column}");
        }
        assert!(json.contains("\"net-worth\""));
        assert!(json.contains("\"2020-01-01\""));
    }
}
