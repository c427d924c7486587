//! Derivative-free minimization used for likelihood estimation.

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged before the iteration cap.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance, relative to the best objective value.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.1).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-9,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

/// Simplex state: vertices with their objective values, kept sorted best-first.
struct Simplex {
    vertices: Vec<Vec<f64>>,
    values: Vec<f64>,
}

impl Simplex {
    fn new<F>(objective: &F, initial: &[f64], step: f64) -> Self
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = initial.len();
        let mut vertices = Vec::with_capacity(n + 1);
        vertices.push(initial.to_vec());
        for i in 0..n {
            let mut vertex = initial.to_vec();
            vertex[i] += if initial[i].abs() > 1e-10 {
                step * initial[i].abs().max(1.0)
            } else {
                step
            };
            vertices.push(vertex);
        }
        let values = vertices.iter().map(|v| evaluate(objective, v)).collect();
        let mut simplex = Self { vertices, values };
        simplex.sort();
        simplex
    }

    fn sort(&mut self) {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]));
        self.vertices = order.iter().map(|&i| self.vertices[i].clone()).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
    }

    fn worst(&self) -> usize {
        self.values.len() - 1
    }

    fn centroid(&self) -> Vec<f64> {
        let n = self.vertices[0].len();
        let count = self.vertices.len() - 1;
        let mut centroid = vec![0.0; n];
        for vertex in &self.vertices[..count] {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v;
            }
        }
        centroid.iter_mut().for_each(|c| *c /= count as f64);
        centroid
    }

    fn diameter(&self) -> f64 {
        let best = &self.vertices[0];
        self.vertices[1..]
            .iter()
            .map(|v| euclidean_distance(v, best))
            .fold(0.0, f64::max)
    }

    fn replace_worst(&mut self, vertex: Vec<f64>, value: f64) {
        let worst = self.worst();
        self.vertices[worst] = vertex;
        self.values[worst] = value;
    }
}

/// Minimize `objective` with the Nelder-Mead simplex method.
///
/// Non-finite objective values are treated as `+inf`, so the simplex retreats from
/// regions where the objective cannot be evaluated.
///
/// # Example
/// ```
/// use incidence_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(objective: F, initial: &[f64], config: NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let mut simplex = Simplex::new(&objective, initial, config.initial_step);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let best = simplex.values[0];
        let worst_idx = simplex.worst();
        let worst = simplex.values[worst_idx];
        let second_worst = simplex.values[worst_idx - 1];

        let scale = config.tolerance * (1.0 + best.abs());
        if (worst - best).abs() <= scale || simplex.diameter() < config.tolerance {
            converged = best.is_finite();
            break;
        }

        let centroid = simplex.centroid();
        let reflected = towards(&centroid, &simplex.vertices[worst_idx], -config.alpha);
        let reflected_value = evaluate(&objective, &reflected);

        if reflected_value < best {
            let expanded = towards(&centroid, &reflected, config.gamma);
            let expanded_value = evaluate(&objective, &expanded);
            if expanded_value < reflected_value {
                simplex.replace_worst(expanded, expanded_value);
            } else {
                simplex.replace_worst(reflected, reflected_value);
            }
        } else if reflected_value < second_worst {
            simplex.replace_worst(reflected, reflected_value);
        } else {
            let (contracted, contracted_value) = if reflected_value < worst {
                let point = towards(&centroid, &reflected, config.rho);
                let value = evaluate(&objective, &point);
                (point, value)
            } else {
                let point = towards(&centroid, &simplex.vertices[worst_idx], config.rho);
                let value = evaluate(&objective, &point);
                (point, value)
            };

            if contracted_value < worst.min(reflected_value) {
                simplex.replace_worst(contracted, contracted_value);
            } else {
                let anchor = simplex.vertices[0].clone();
                for i in 1..simplex.vertices.len() {
                    let shrunk = towards(&anchor, &simplex.vertices[i], config.sigma);
                    simplex.values[i] = evaluate(&objective, &shrunk);
                    simplex.vertices[i] = shrunk;
                }
            }
        }

        simplex.sort();
    }

    NelderMeadResult {
        optimal_point: simplex.vertices[0].clone(),
        optimal_value: simplex.values[0],
        iterations,
        converged,
    }
}

fn evaluate<F>(objective: &F, point: &[f64]) -> f64
where
    F: Fn(&[f64]) -> f64,
{
    let value = objective(point);
    if value.is_finite() {
        value
    } else {
        f64::INFINITY
    }
}

/// `origin + coef * (point - origin)`; a negative coefficient reflects through `origin`.
fn towards(origin: &[f64], point: &[f64], coef: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + coef * (p - o))
        .collect()
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
