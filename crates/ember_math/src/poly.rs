//! Real-root solvers for low-degree polynomials.
//!
//! The torus intersection reduces to a quartic in the ray parameter; the
//! solvers work in f64 because the quartic coefficients span many orders
//! of magnitude and f32 loses the close root pairs at grazing angles.

/// Roots of `a x^2 + b x + c = 0`. Returns the real roots in ascending
/// order and their count.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> ([f64; 2], usize) {
    if a.abs() < 1e-14 {
        if b.abs() < 1e-14 {
            return ([0.0; 2], 0);
        }
        return ([-c / b, 0.0], 1);
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return ([0.0; 2], 0);
    }

    // Citardauq form avoids cancellation when b dominates
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    let mut roots = [q / a, if q.abs() < 1e-300 { q / a } else { c / q }];
    if roots[0] > roots[1] {
        roots.swap(0, 1);
    }
    ([roots[0], roots[1]], 2)
}

/// Real roots of `a x^3 + b x^2 + c x + d = 0` (a != 0), unordered.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> ([f64; 3], usize) {
    // Depress: x = t - b/(3a) gives t^3 + p t + q
    let b = b / a;
    let c = c / a;
    let d = d / a;
    let shift = b / 3.0;

    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;

    let half_q = q / 2.0;
    let third_p = p / 3.0;
    let disc = half_q * half_q + third_p * third_p * third_p;

    if disc > 1e-12 {
        // One real root (Cardano)
        let sqrt_disc = disc.sqrt();
        let t = (-half_q + sqrt_disc).cbrt() + (-half_q - sqrt_disc).cbrt();
        ([t - shift, 0.0, 0.0], 1)
    } else if disc >= -1e-12 {
        // Repeated roots
        let u = (-half_q).cbrt();
        ([2.0 * u - shift, -u - shift, 0.0], 2)
    } else {
        // Three distinct real roots (trigonometric form)
        let r = (-third_p).sqrt();
        let phi = (-half_q / (r * r * r)).clamp(-1.0, 1.0).acos();
        let mut roots = [0.0; 3];
        for (k, root) in roots.iter_mut().enumerate() {
            *root = 2.0 * r * ((phi + 2.0 * std::f64::consts::PI * k as f64) / 3.0).cos() - shift;
        }
        (roots, 3)
    }
}

/// Real roots of `a x^4 + b x^3 + c x^2 + d x + e = 0` (a != 0), unordered.
///
/// Ferrari's method: depress the quartic, split it into two quadratics via
/// a root of the resolvent cubic.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> ([f64; 4], usize) {
    let p = b / a;
    let q = c / a;
    let r = d / a;
    let s = e / a;
    let shift = p / 4.0;

    // Depressed quartic y^4 + ay2 y^2 + ay1 y + ay0, x = y - p/4
    let p2 = p * p;
    let ay2 = q - 3.0 * p2 / 8.0;
    let ay1 = r - p * q / 2.0 + p2 * p / 8.0;
    let ay0 = s - p * r / 4.0 + p2 * q / 16.0 - 3.0 * p2 * p2 / 256.0;

    let mut roots = [0.0; 4];
    let mut count = 0;

    if ay1.abs() < 1e-10 {
        // Biquadratic: quadratic in y^2
        let (zs, zn) = solve_quadratic(1.0, ay2, ay0);
        for &z in &zs[..zn] {
            if z < 0.0 {
                continue;
            }
            let y = z.sqrt();
            roots[count] = y - shift;
            count += 1;
            if y > 0.0 {
                roots[count] = -y - shift;
                count += 1;
            }
        }
        return (roots, count);
    }

    // Resolvent cubic z^3 + 2*ay2 z^2 + (ay2^2 - 4 ay0) z - ay1^2 = 0.
    // Its value at z=0 is -ay1^2 <= 0, so a nonnegative real root exists.
    let (zs, zn) = solve_cubic(1.0, 2.0 * ay2, ay2 * ay2 - 4.0 * ay0, -ay1 * ay1);
    let mut z0 = 0.0f64;
    for &z in &zs[..zn] {
        if z > z0 {
            z0 = z;
        }
    }
    if z0 <= 0.0 {
        return (roots, 0);
    }

    let m = z0.sqrt();
    let n_minus = (ay2 + z0 - ay1 / m) / 2.0;
    let n_plus = (ay2 + z0 + ay1 / m) / 2.0;

    let (r1, n1) = solve_quadratic(1.0, m, n_minus);
    for &y in &r1[..n1] {
        roots[count] = y - shift;
        count += 1;
    }
    let (r2, n2) = solve_quadratic(1.0, -m, n_plus);
    for &y in &r2[..n2] {
        roots[count] = y - shift;
        count += 1;
    }

    (roots, count)
}

/// Smallest root strictly greater than `min`, if any.
pub fn smallest_positive_root(roots: &[f64], min: f64) -> Option<f64> {
    let mut best: Option<f64> = None;
    for &root in roots {
        if root > min && best.map_or(true, |b| root < b) {
            best = Some(root);
        }
    }
    best
}
