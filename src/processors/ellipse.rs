//! Direct least-squares ellipse fitting for the ovality check.
//!
//! Implements the constrained fit of Fitzgibbon, Pilu and Fisher (1999). The
//! quadratic coefficients are recovered from a 3x3 generalized eigensystem
//! solved in closed form, so the fit needs no iteration and no random state.

use nalgebra::{DMatrix, Matrix3, Vector3};

/// Geometric parameters of a fitted ellipse.
///
/// `major` and `minor` are full axis lengths with `major >= minor`. The
/// rotation angle is in radians, normalized to (-pi/2, pi/2].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedEllipse {
    pub center: (f64, f64),
    pub major: f64,
    pub minor: f64,
    pub angle: f64,
}

/// Fits an ellipse to a point set.
///
/// Needs at least 5 points. Returns `None` when the scatter system is
/// singular or the best conic is not an ellipse, which covers collinear and
/// otherwise degenerate inputs.
pub fn fit_ellipse(points: &[(f64, f64)]) -> Option<FittedEllipse> {
    let n = points.len();
    if n < 5 {
        return None;
    }

    // Shift to the centroid and scale so the mean radius is sqrt(2). The fit
    // is solved in these coordinates and mapped back at the end.
    let inv_n = 1.0 / n as f64;
    let mean_x: f64 = points.iter().map(|p| p.0).sum::<f64>() * inv_n;
    let mean_y: f64 = points.iter().map(|p| p.1).sum::<f64>() * inv_n;
    let mean_dist: f64 = points
        .iter()
        .map(|p| ((p.0 - mean_x).powi(2) + (p.1 - mean_y).powi(2)).sqrt())
        .sum::<f64>()
        * inv_n;
    let scale = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    // Design matrix D with one row [x^2, xy, y^2, x, y, 1] per point.
    let mut design = DMatrix::<f64>::zeros(n, 6);
    for (i, &(px, py)) in points.iter().enumerate() {
        let x = (px - mean_x) * scale;
        let y = (py - mean_y) * scale;
        design[(i, 0)] = x * x;
        design[(i, 1)] = x * y;
        design[(i, 2)] = y * y;
        design[(i, 3)] = x;
        design[(i, 4)] = y;
        design[(i, 5)] = 1.0;
    }

    // Scatter matrix S = D^T D, partitioned into 3x3 blocks.
    let scatter = design.transpose() * &design;
    let s11 = scatter.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = scatter.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = scatter.fixed_view::<3, 3>(3, 3).into_owned();

    let s22_inv = s22.try_inverse()?;
    let reduced = s11 - s12 * s22_inv * s12.transpose();

    // Inverse of the constraint matrix [[0, 0, 2], [0, -1, 0], [2, 0, 0]],
    // which encodes the ellipse condition 4AC - B^2 > 0.
    let c1_inv = Matrix3::new(0.0, 0.0, 0.5, 0.0, -1.0, 0.0, 0.5, 0.0, 0.0);
    let quadratic = constrained_eigenvector(&(c1_inv * reduced))?;
    let linear = -s22_inv * s12.transpose() * quadratic;

    let conic = denormalize(
        [
            quadratic[0],
            quadratic[1],
            quadratic[2],
            linear[0],
            linear[1],
            linear[2],
        ],
        mean_x,
        mean_y,
        scale,
    );

    conic_to_ellipse(&conic)
}

/// Finds the eigenvector of a 3x3 system that satisfies the ellipse
/// constraint, picking the eigenvalue of smallest magnitude when several
/// qualify.
fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let trace = system[(0, 0)] + system[(1, 1)] + system[(2, 2)];
    let minor_sum = system[(0, 0)] * system[(1, 1)] - system[(0, 1)] * system[(1, 0)]
        + system[(0, 0)] * system[(2, 2)]
        - system[(0, 2)] * system[(2, 0)]
        + system[(1, 1)] * system[(2, 2)]
        - system[(1, 2)] * system[(2, 1)];
    let det = system.determinant();

    let mut best: Option<Vector3<f64>> = None;
    let mut best_magnitude = f64::MAX;
    for eigenvalue in real_cubic_roots(-trace, minor_sum, -det) {
        let shifted = system - Matrix3::identity() * eigenvalue;
        let Some(v) = null_vector(&shifted) else {
            continue;
        };
        if 4.0 * v[0] * v[2] - v[1] * v[1] > 0.0 && eigenvalue.abs() < best_magnitude {
            best_magnitude = eigenvalue.abs();
            best = Some(v);
        }
    }
    best
}

/// Null vector of a near-singular 3x3 matrix, from the largest-norm row of
/// its adjugate. Each such row is proportional to the null vector when the
/// matrix has rank 2.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            -(m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)]),
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            -(m[(0, 1)] * m[(2, 2)] - m[(0, 2)] * m[(2, 1)]),
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            -(m[(0, 0)] * m[(2, 1)] - m[(0, 1)] * m[(2, 0)]),
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            -(m[(0, 0)] * m[(1, 2)] - m[(0, 2)] * m[(1, 0)]),
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];

    let best = rows
        .iter()
        .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))?;
    let norm_sq = best.norm_squared();
    if norm_sq < 1e-30 {
        return None;
    }
    Some(best / norm_sq.sqrt())
}

/// Real roots of the monic cubic x^3 + b x^2 + c x + d = 0.
fn real_cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    // Depressed form t^3 + pt + q with x = t - b/3.
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    let discriminant = -4.0 * p * p * p - 27.0 * q * q;
    if discriminant >= 0.0 {
        let r = (-p / 3.0).sqrt();
        let cos_arg = if r.abs() < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        (0..3)
            .map(|k| {
                2.0 * r * ((theta + 2.0 * std::f64::consts::PI * k as f64) / 3.0).cos() + shift
            })
            .collect()
    } else {
        let sqrt_term = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        let u = (-q / 2.0 + sqrt_term).cbrt();
        let v = (-q / 2.0 - sqrt_term).cbrt();
        vec![u + v + shift]
    }
}

/// Maps conic coefficients fitted on normalized coordinates back to pixel
/// coordinates, substituting x' = s(x - mx), y' = s(y - my).
fn denormalize(c: [f64; 6], mx: f64, my: f64, s: f64) -> [f64; 6] {
    let [a, b, cc, d, e, f] = c;
    let s2 = s * s;
    [
        a * s2,
        b * s2,
        cc * s2,
        -2.0 * a * s2 * mx - b * s2 * my + d * s,
        -b * s2 * mx - 2.0 * cc * s2 * my + e * s,
        a * s2 * mx * mx + b * s2 * mx * my + cc * s2 * my * my - d * s * mx - e * s * my + f,
    ]
}

/// Converts conic coefficients to geometric parameters.
///
/// Returns `None` unless the conic is a proper ellipse with positive axes.
fn conic_to_ellipse(conic: &[f64; 6]) -> Option<FittedEllipse> {
    let [a, b, c, d, e, f] = *conic;

    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 {
        return None;
    }

    let denom = 4.0 * a * c - b * b;
    let cx = (b * e - 2.0 * c * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;

    let angle = if (a - c).abs() < 1e-15 {
        if b > 0.0 {
            std::f64::consts::FRAC_PI_4
        } else if b < 0.0 {
            -std::f64::consts::FRAC_PI_4
        } else {
            0.0
        }
    } else {
        0.5 * b.atan2(a - c)
    };

    let sum = a + c;
    let spread = ((a - c).powi(2) + b * b).sqrt();
    let lambda1 = (sum + spread) / 2.0;
    let lambda2 = (sum - spread) / 2.0;

    let f_center = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;
    if f_center.abs() < 1e-15 {
        return None;
    }

    let semi_a_sq = -f_center / lambda1;
    let semi_b_sq = -f_center / lambda2;
    if semi_a_sq <= 0.0 || semi_b_sq <= 0.0 {
        return None;
    }

    let semi_a = semi_a_sq.sqrt();
    let semi_b = semi_b_sq.sqrt();
    let (semi_major, semi_minor, mut angle) = if semi_a >= semi_b {
        (semi_a, semi_b, angle)
    } else {
        (semi_b, semi_a, angle + std::f64::consts::FRAC_PI_2)
    };

    while angle > std::f64::consts::FRAC_PI_2 {
        angle -= std::f64::consts::PI;
    }
    while angle <= -std::f64::consts::FRAC_PI_2 {
        angle += std::f64::consts::PI;
    }

    if !(semi_major.is_finite() && semi_minor.is_finite() && cx.is_finite() && cy.is_finite()) {
        return None;
    }

    Some(FittedEllipse {
        center: (cx, cy),
        major: 2.0 * semi_major,
        minor: 2.0 * semi_minor,
        angle,
    })
}
