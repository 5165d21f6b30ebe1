//! Fixed-step explicit Runge–Kutta methods, each described by its Butcher tableau
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Explicit Runge–Kutta method used to advance the state by one fixed step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Solver {
    /// Forward Euler, first order.
    Euler,
    /// Heun's method (explicit trapezoidal rule), second order.
    Heun,
    /// Kutta's third order method.
    Rk3,
    /// Classic fourth order Runge–Kutta method.
    ///
    /// The reference method; four derivative evaluations per step weighted 1, 2, 2, 1.
    #[default]
    Rk4,
    /// Fourth order Runge–Kutta 3/8 rule.
    Rk38,
}

/// Coefficients of an explicit Runge–Kutta method
///
/// Stage `i` is evaluated at `t + c[i]·h` and state `y + h·Σ_j a[i][j]·k_j` (for `j < i`),
/// the step result is `y + h·Σ_i b[i]·k_i`.
#[derive(Debug, PartialEq)]
pub struct ButcherTableau {
    pub a: &'static [&'static [f64]],
    pub b: &'static [f64],
    pub c: &'static [f64],
}

impl ButcherTableau {
    /// Number of derivative evaluations per step
    pub fn stages(&self) -> usize {
        self.b.len()
    }
}

static EULER: ButcherTableau = ButcherTableau {
    a: &[&[]],
    b: &[1.],
    c: &[0.],
};

static HEUN: ButcherTableau = ButcherTableau {
    a: &[&[], &[1.]],
    b: &[0.5, 0.5],
    c: &[0., 1.],
};

static RK3: ButcherTableau = ButcherTableau {
    a: &[&[], &[0.5], &[-1., 2.]],
    b: &[1. / 6., 2. / 3., 1. / 6.],
    c: &[0., 0.5, 1.],
};

static RK4: ButcherTableau = ButcherTableau {
    a: &[&[], &[0.5], &[0., 0.5], &[0., 0., 1.]],
    b: &[1. / 6., 1. / 3., 1. / 3., 1. / 6.],
    c: &[0., 0.5, 0.5, 1.],
};

static RK38: ButcherTableau = ButcherTableau {
    a: &[&[], &[1. / 3.], &[-1. / 3., 1.], &[1., -1., 1.]],
    b: &[1. / 8., 3. / 8., 3. / 8., 1. / 8.],
    c: &[0., 1. / 3., 2. / 3., 1.],
};

impl Solver {
    pub fn tableau(&self) -> &'static ButcherTableau {
        match self {
            Solver::Euler => &EULER,
            Solver::Heun => &HEUN,
            Solver::Rk3 => &RK3,
            Solver::Rk4 => &RK4,
            Solver::Rk38 => &RK38,
        }
    }
}

impl FromStr for Solver {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(Solver::Euler),
            "heun" | "rk2" => Ok(Solver::Heun),
            "rk3" => Ok(Solver::Rk3),
            "rk4" => Ok(Solver::Rk4),
            "rk38" => Ok(Solver::Rk38),
            _ => Err(SolverError::UnknownSolver(s.to_string())),
        }
    }
}

impl TryFrom<String> for Solver {
    type Error = SolverError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Solver> for String {
    fn from(value: Solver) -> Self {
        value.to_string()
    }
}

impl Display for Solver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Solver::Euler => "Euler",
            Solver::Heun => "Heun",
            Solver::Rk3 => "RK3",
            Solver::Rk4 => "RK4",
            Solver::Rk38 => "RK38",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum SolverError {
    #[error("Unknown solver {0:?} (expected one of Euler, Heun, RK3, RK4, RK38)")]
    UnknownSolver(String),
}

#[cfg(test)]
mod solver_tests {
    use super::*;

    const ALL: [Solver; 5] = [
        Solver::Euler,
        Solver::Heun,
        Solver::Rk3,
        Solver::Rk4,
        Solver::Rk38,
    ];

    #[test]
    fn tableaux_are_consistent() {
        for solver in ALL {
            let tableau = solver.tableau();
            assert_eq!(tableau.a.len(), tableau.stages());
            assert_eq!(tableau.c.len(), tableau.stages());
            // Weights sum to one
            let total: f64 = tableau.b.iter().sum();
            assert!((total - 1.).abs() < 1e-15, "{}", solver);
            for (i, row) in tableau.a.iter().enumerate() {
                // Explicit methods only look at earlier stages
                assert_eq!(row.len(), i);
                let row_sum: f64 = row.iter().sum();
                assert!((row_sum - tableau.c[i]).abs() < 1e-15, "{}", solver);
            }
        }
    }

    #[test]
    fn parse_names() {
        for solver in ALL {
            assert_eq!(solver.to_string().parse::<Solver>().unwrap(), solver);
        }
        assert_eq!("rk4".parse::<Solver>().unwrap(), Solver::Rk4);
        assert_eq!(Solver::default(), Solver::Rk4);
        assert!("DP5".parse::<Solver>().is_err());
    }
}
