//! 與後端無關的線性規劃表示

/// 變數索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId(pub usize);

/// 決策變數（連續）
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub lower: f64,
    pub upper: Option<f64>,
    /// 目標函數係數
    pub cost: f64,
}

/// 約束方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// Σ ≤ rhs
    Le,
    /// Σ ≥ rhs
    Ge,
    /// Σ = rhs
    Eq,
}

/// 線性約束
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub terms: Vec<(ColumnId, f64)>,
    pub sense: RowSense,
    pub rhs: f64,
}

/// 最小化問題
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProgram {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// 目標函數常數項（不影響最優解）
    pub objective_offset: f64,
}

impl LinearProgram {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 新增非負變數
    pub fn add_column(&mut self, name: impl Into<String>, cost: f64, upper: Option<f64>) -> ColumnId {
        let id = ColumnId(self.columns.len());
        self.columns.push(Column {
            name: name.into(),
            lower: 0.0,
            upper,
            cost,
        });
        id
    }

    /// 新增約束；無任何項的約束直接略過
    pub fn add_row(&mut self, name: impl Into<String>, terms: Vec<(ColumnId, f64)>, sense: RowSense, rhs: f64) {
        if terms.is_empty() {
            return;
        }
        self.rows.push(Row {
            name: name.into(),
            terms,
            sense,
            rhs,
        });
    }

    /// 以給定解計算目標值（含常數項）
    pub fn objective_at(&self, values: &[f64]) -> f64 {
        self.objective_offset
            + self
                .columns
                .iter()
                .zip(values)
                .map(|(c, v)| c.cost * v)
                .sum::<f64>()
    }

    /// 檢查解是否滿足所有約束與變數界限
    pub fn is_satisfied_by(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.columns.len() {
            return false;
        }

        let bounds_ok = self.columns.iter().zip(values).all(|(c, &v)| {
            v >= c.lower - tolerance && c.upper.map_or(true, |u| v <= u + tolerance)
        });

        bounds_ok
            && self.rows.iter().all(|row| {
                let lhs: f64 = row.terms.iter().map(|&(col, coef)| coef * values[col.0]).sum();
                match row.sense {
                    RowSense::Le => lhs <= row.rhs + tolerance,
                    RowSense::Ge => lhs >= row.rhs - tolerance,
                    RowSense::Eq => (lhs - row.rhs).abs() <= tolerance,
                }
            })
    }
}
