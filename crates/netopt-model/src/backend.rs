//! LP 求解後端
//!
//! 模型建構只產生 [`LinearProgram`]，透過 [`LpBackend`] 交給任意求解器；
//! 預設後端為 `good_lp` 的純 Rust `minilp`，外層以 [`WithDeadline`] 施加時間上限。

use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use good_lp::solvers::minilp::minilp;
use good_lp::{variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use netopt_core::SolveStatus;

use crate::lp::{LinearProgram, RowSense};

/// 單次求解的結果
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    /// 變數值（依 column 順序）；不可行或無可用解時為 None
    pub values: Option<Vec<f64>>,
    pub message: Option<String>,
    pub elapsed: Duration,
}

impl SolverOutcome {
    pub fn optimal(values: Vec<f64>, elapsed: Duration) -> Self {
        Self {
            status: SolveStatus::Optimal,
            values: Some(values),
            message: None,
            elapsed,
        }
    }

    pub fn failed(status: SolveStatus, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status,
            values: None,
            message: Some(message.into()),
            elapsed,
        }
    }
}

/// LP 求解後端介面
///
/// 實作必須可重入：同一實例可能被多個情境同時呼叫。
pub trait LpBackend: Send + Sync {
    /// 後端名稱
    fn name(&self) -> &'static str;

    /// 求解最小化問題
    fn solve(&self, program: &LinearProgram, time_limit: Duration) -> SolverOutcome;
}

/// good_lp + minilp 後端（阻塞，不支援時間上限）
#[derive(Debug, Clone, Copy, Default)]
pub struct MinilpBackend;

impl MinilpBackend {
    fn solve_blocking(program: &LinearProgram) -> SolverOutcome {
        let start = Instant::now();

        let mut vars = ProblemVariables::new();
        let columns: Vec<Variable> = program
            .columns
            .iter()
            .map(|c| {
                let definition = variable().min(c.lower);
                match c.upper {
                    Some(upper) => vars.add(definition.max(upper)),
                    None => vars.add(definition),
                }
            })
            .collect();

        let mut objective = Expression::with_capacity(columns.len());
        for (column, &var) in program.columns.iter().zip(&columns) {
            if column.cost != 0.0 {
                objective.add_mul(column.cost, var);
            }
        }

        let mut model = vars.minimise(objective).using(minilp);
        for row in &program.rows {
            let mut lhs = Expression::with_capacity(row.terms.len());
            for &(col, coef) in &row.terms {
                lhs.add_mul(coef, columns[col.0]);
            }
            let constraint = match row.sense {
                RowSense::Le => lhs.leq(row.rhs),
                RowSense::Ge => lhs.geq(row.rhs),
                RowSense::Eq => lhs.eq(row.rhs),
            };
            model = model.with(constraint);
        }

        match model.solve() {
            Ok(solution) => {
                let values = columns.iter().map(|&v| solution.value(v)).collect();
                SolverOutcome::optimal(values, start.elapsed())
            }
            Err(ResolutionError::Infeasible) => {
                SolverOutcome::failed(SolveStatus::Infeasible, "problem is infeasible", start.elapsed())
            }
            Err(ResolutionError::Unbounded) => {
                SolverOutcome::failed(SolveStatus::SolverError, "problem is unbounded", start.elapsed())
            }
            Err(other) => SolverOutcome::failed(SolveStatus::SolverError, other.to_string(), start.elapsed()),
        }
    }
}

impl LpBackend for MinilpBackend {
    fn name(&self) -> &'static str {
        "minilp"
    }

    fn solve(&self, program: &LinearProgram, _time_limit: Duration) -> SolverOutcome {
        Self::solve_blocking(program)
    }
}

/// 為阻塞後端施加牆鐘時間上限
///
/// 求解在獨立執行緒進行；超時後立即回傳 `TimeLimitReached`，
/// 背景執行緒完成後其結果被丟棄。
///
/// 限制：minilp 無法中途取消，超時的執行緒會持續佔用一個 CPU 直到求解結束；
/// 連續超時會累積背景執行緒。需要硬性上限時應改用支援時間限制的後端。
#[derive(Debug, Clone)]
pub struct WithDeadline<B> {
    inner: Arc<B>,
}

impl<B> WithDeadline<B> {
    pub fn new(inner: B) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

impl<B: LpBackend + 'static> LpBackend for WithDeadline<B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn solve(&self, program: &LinearProgram, time_limit: Duration) -> SolverOutcome {
        let start = Instant::now();
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let program = program.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("lp-{}", program.name))
            .spawn(move || {
                let outcome = inner.solve(&program, time_limit);
                // 接收端可能已因超時離開
                let _ = tx.send(outcome);
            });

        if let Err(e) = spawned {
            return SolverOutcome::failed(
                SolveStatus::SolverError,
                format!("無法啟動求解執行緒: {}", e),
                start.elapsed(),
            );
        }

        match rx.recv_timeout(time_limit) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!("求解 {} 超過時間上限 {:?}", self.inner.name(), time_limit);
                SolverOutcome::failed(
                    SolveStatus::TimeLimitReached,
                    format!("time limit of {:?} reached", time_limit),
                    start.elapsed(),
                )
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => SolverOutcome::failed(
                SolveStatus::SolverError,
                "求解執行緒異常終止",
                start.elapsed(),
            ),
        }
    }
}

/// 預設後端：minilp + 時間上限
pub fn default_backend() -> WithDeadline<MinilpBackend> {
    WithDeadline::new(MinilpBackend)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 刻意拖延的後端，用於驗證時間上限
    struct SlowBackend {
        delay: Duration,
    }

    impl LpBackend for SlowBackend {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn solve(&self, program: &LinearProgram, _time_limit: Duration) -> SolverOutcome {
            std::thread::sleep(self.delay);
            SolverOutcome::optimal(vec![0.0; program.columns.len()], self.delay)
        }
    }

    fn small_program() -> LinearProgram {
        // min x + 2y  s.t. x + y = 4, x ≤ 3
        let mut lp = LinearProgram::new("small");
        let x = lp.add_column("x", 1.0, Some(3.0));
        let y = lp.add_column("y", 2.0, None);
        lp.add_row("sum", vec![(x, 1.0), (y, 1.0)], RowSense::Eq, 4.0);
        lp
    }

    #[test]
    fn test_minilp_solves_small_program() {
        let program = small_program();
        let outcome = MinilpBackend.solve(&program, Duration::from_secs(5));

        assert_eq!(outcome.status, SolveStatus::Optimal);
        let values = outcome.values.unwrap();
        assert!((values[0] - 3.0).abs() < 1e-6);
        assert!((values[1] - 1.0).abs() < 1e-6);
        assert!((program.objective_at(&values) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_minilp_reports_infeasible() {
        let mut program = small_program();
        let y = crate::lp::ColumnId(1);
        program.add_row("y_cap", vec![(y, 1.0)], RowSense::Le, 0.5);

        let outcome = MinilpBackend.solve(&program, Duration::from_secs(5));
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.values.is_none());
    }

    #[test]
    fn test_deadline_passes_through_fast_result() {
        let backend = default_backend();
        let outcome = backend.solve(&small_program(), Duration::from_secs(10));
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(backend.name(), "minilp");
    }

    #[test]
    fn test_deadline_reports_time_limit() {
        let backend = WithDeadline::new(SlowBackend {
            delay: Duration::from_millis(500),
        });
        let start = Instant::now();
        let outcome = backend.solve(&small_program(), Duration::from_millis(20));

        assert_eq!(outcome.status, SolveStatus::TimeLimitReached);
        assert!(outcome.values.is_none());
        assert!(start.elapsed() < Duration::from_millis(400));
    }
}
