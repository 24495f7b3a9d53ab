use glam::Vec2;

use crate::{
    collision::{
        distance::{distance, DistanceInput, SimplexCache},
        shapes::DistanceProxy,
    },
    config::{LINEAR_SLOP, MAX_POLYGON_VERTICES},
    core::types::{cross_vs, Sweep},
};

#[derive(Debug, Clone)]
pub struct ToiInput {
    pub proxy_a: DistanceProxy,
    pub proxy_b: DistanceProxy,
    pub sweep_a: Sweep,
    pub sweep_b: Sweep,
    /// Largest admissible impact time, in `[0, 1]` of the sub-step.
    pub t_max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToiState {
    Unknown,
    /// The root finder could not reach tolerance; treat as touching at `t`.
    Failed,
    Overlapped,
    Touching,
    Separated,
}

#[derive(Debug, Clone, Copy)]
pub struct ToiOutput {
    pub state: ToiState,
    pub t: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeparationKind {
    /// Separating axis through the closest support points.
    Points,
    /// Separating axis is an edge normal on A.
    FaceA,
    /// Separating axis is an edge normal on B.
    FaceB,
}

/// Separating-axis evaluation over swept shapes. Built from the distance
/// simplex so the axis tracks the closest features at `t1`.
struct SeparationFunction<'a> {
    proxy_a: &'a DistanceProxy,
    proxy_b: &'a DistanceProxy,
    sweep_a: Sweep,
    sweep_b: Sweep,
    kind: SeparationKind,
    local_point: Vec2,
    axis: Vec2,
}

impl<'a> SeparationFunction<'a> {
    fn new(
        cache: &SimplexCache,
        proxy_a: &'a DistanceProxy,
        sweep_a: Sweep,
        proxy_b: &'a DistanceProxy,
        sweep_b: Sweep,
        t1: f32,
    ) -> Self {
        let count = cache.count as usize;
        debug_assert!(count > 0 && count < 3);

        let xf_a = sweep_a.transform_at(t1);
        let xf_b = sweep_b.transform_at(t1);

        if count == 1 {
            let local_point_a = proxy_a.vertex(cache.index_a[0] as usize);
            let local_point_b = proxy_b.vertex(cache.index_b[0] as usize);
            let point_a = xf_a.apply(local_point_a);
            let point_b = xf_b.apply(local_point_b);
            let axis = (point_b - point_a).normalize_or_zero();
            return Self {
                proxy_a,
                proxy_b,
                sweep_a,
                sweep_b,
                kind: SeparationKind::Points,
                local_point: Vec2::ZERO,
                axis,
            };
        }

        if cache.index_a[0] == cache.index_a[1] {
            // Two support points on B, one on A.
            let local_point_b1 = proxy_b.vertex(cache.index_b[0] as usize);
            let local_point_b2 = proxy_b.vertex(cache.index_b[1] as usize);

            let mut axis = cross_vs(local_point_b2 - local_point_b1, 1.0).normalize();
            let normal = xf_b.q.apply(axis);

            let local_point = 0.5 * (local_point_b1 + local_point_b2);
            let point_b = xf_b.apply(local_point);

            let local_point_a = proxy_a.vertex(cache.index_a[0] as usize);
            let point_a = xf_a.apply(local_point_a);

            if (point_a - point_b).dot(normal) < 0.0 {
                axis = -axis;
            }
            Self {
                proxy_a,
                proxy_b,
                sweep_a,
                sweep_b,
                kind: SeparationKind::FaceB,
                local_point,
                axis,
            }
        } else {
            // Two support points on A, one or two on B.
            let local_point_a1 = proxy_a.vertex(cache.index_a[0] as usize);
            let local_point_a2 = proxy_a.vertex(cache.index_a[1] as usize);

            let mut axis = cross_vs(local_point_a2 - local_point_a1, 1.0).normalize();
            let normal = xf_a.q.apply(axis);

            let local_point = 0.5 * (local_point_a1 + local_point_a2);
            let point_a = xf_a.apply(local_point);

            let local_point_b = proxy_b.vertex(cache.index_b[0] as usize);
            let point_b = xf_b.apply(local_point_b);

            if (point_b - point_a).dot(normal) < 0.0 {
                axis = -axis;
            }
            Self {
                proxy_a,
                proxy_b,
                sweep_a,
                sweep_b,
                kind: SeparationKind::FaceA,
                local_point,
                axis,
            }
        }
    }

    /// Deepest witness pair and its separation at time `t`.
    fn find_min_separation(&self, t: f32) -> (usize, usize, f32) {
        let xf_a = self.sweep_a.transform_at(t);
        let xf_b = self.sweep_b.transform_at(t);

        match self.kind {
            SeparationKind::Points => {
                let axis_a = xf_a.q.apply_inv(self.axis);
                let axis_b = xf_b.q.apply_inv(-self.axis);

                let index_a = self.proxy_a.support(axis_a);
                let index_b = self.proxy_b.support(axis_b);

                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));

                (index_a, index_b, (point_b - point_a).dot(self.axis))
            }
            SeparationKind::FaceA => {
                let normal = xf_a.q.apply(self.axis);
                let point_a = xf_a.apply(self.local_point);

                let axis_b = xf_b.q.apply_inv(-normal);
                let index_b = self.proxy_b.support(axis_b);
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));

                (0, index_b, (point_b - point_a).dot(normal))
            }
            SeparationKind::FaceB => {
                let normal = xf_b.q.apply(self.axis);
                let point_b = xf_b.apply(self.local_point);

                let axis_a = xf_a.q.apply_inv(-normal);
                let index_a = self.proxy_a.support(axis_a);
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));

                (index_a, 0, (point_a - point_b).dot(normal))
            }
        }
    }

    /// Separation of a fixed witness pair at time `t`.
    fn evaluate(&self, index_a: usize, index_b: usize, t: f32) -> f32 {
        let xf_a = self.sweep_a.transform_at(t);
        let xf_b = self.sweep_b.transform_at(t);

        match self.kind {
            SeparationKind::Points => {
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                (point_b - point_a).dot(self.axis)
            }
            SeparationKind::FaceA => {
                let normal = xf_a.q.apply(self.axis);
                let point_a = xf_a.apply(self.local_point);
                let point_b = xf_b.apply(self.proxy_b.vertex(index_b));
                (point_b - point_a).dot(normal)
            }
            SeparationKind::FaceB => {
                let normal = xf_b.q.apply(self.axis);
                let point_b = xf_b.apply(self.local_point);
                let point_a = xf_a.apply(self.proxy_a.vertex(index_a));
                (point_a - point_b).dot(normal)
            }
        }
    }
}

/// Computes the first time in `[0, t_max]` at which the swept proxies reach
/// the target separation band. Time is bisected so that rotation never
/// skips a feature crossing (conservative advancement).
pub fn time_of_impact(input: &ToiInput) -> ToiOutput {
    const MAX_ITERATIONS: usize = 20;
    const MAX_ROOT_ITERATIONS: usize = 50;

    let proxy_a = &input.proxy_a;
    let proxy_b = &input.proxy_b;

    let mut sweep_a = input.sweep_a;
    let mut sweep_b = input.sweep_b;

    // Large rotations make the root finder ambiguous; keep angles tame.
    sweep_a.normalize();
    sweep_b.normalize();

    let t_max = input.t_max;

    let total_radius = proxy_a.radius + proxy_b.radius;
    let target = LINEAR_SLOP.max(total_radius - 3.0 * LINEAR_SLOP);
    let tolerance = 0.25 * LINEAR_SLOP;
    debug_assert!(target > tolerance);

    let mut t1 = 0.0f32;
    let mut cache = SimplexCache::default();

    let mut output = ToiOutput {
        state: ToiState::Unknown,
        t: t_max,
    };

    let mut iterations = 0;
    loop {
        let xf_a = sweep_a.transform_at(t1);
        let xf_b = sweep_b.transform_at(t1);

        // Squeeze the distance between the cores at t1.
        let distance_input = DistanceInput {
            proxy_a: proxy_a.clone(),
            proxy_b: proxy_b.clone(),
            transform_a: xf_a,
            transform_b: xf_b,
            use_radii: false,
        };
        let distance_output = distance(&distance_input, &mut cache);

        if distance_output.distance <= 0.0 {
            output.state = ToiState::Overlapped;
            output.t = 0.0;
            break;
        }

        if distance_output.distance < target + tolerance {
            output.state = ToiState::Touching;
            output.t = t1;
            break;
        }

        let fcn = SeparationFunction::new(&cache, proxy_a, sweep_a, proxy_b, sweep_b, t1);

        // Resolve every deep witness pair at t2, pushing t2 back until the
        // deepest point clears the target band.
        let mut done = false;
        let mut t2 = t_max;
        let mut push_back_iterations = 0;
        loop {
            let (index_a, index_b, mut s2) = fcn.find_min_separation(t2);

            if s2 > target + tolerance {
                output.state = ToiState::Separated;
                output.t = t_max;
                done = true;
                break;
            }

            if s2 > target - tolerance {
                // Advance the sweeps; a new separating axis is needed.
                t1 = t2;
                break;
            }

            let mut s1 = fcn.evaluate(index_a, index_b, t1);

            if s1 < target - tolerance {
                output.state = ToiState::Failed;
                output.t = t1;
                done = true;
                break;
            }

            if s1 <= target + tolerance {
                output.state = ToiState::Touching;
                output.t = t1;
                done = true;
                break;
            }

            // Root find on [t1, t2], alternating secant and bisection.
            let mut root_iterations = 0;
            let mut a1 = t1;
            let mut a2 = t2;
            loop {
                let t = if root_iterations & 1 == 1 {
                    a1 + (target - s1) * (a2 - a1) / (s2 - s1)
                } else {
                    0.5 * (a1 + a2)
                };
                root_iterations += 1;

                let s = fcn.evaluate(index_a, index_b, t);

                if (s - target).abs() < tolerance {
                    t2 = t;
                    break;
                }

                if s > target {
                    a1 = t;
                    s1 = s;
                } else {
                    a2 = t;
                    s2 = s;
                }

                if root_iterations == MAX_ROOT_ITERATIONS {
                    break;
                }
            }

            push_back_iterations += 1;
            if push_back_iterations == MAX_POLYGON_VERTICES {
                break;
            }
        }

        iterations += 1;
        if done {
            break;
        }

        if iterations == MAX_ITERATIONS {
            // Root finder got stuck; the caller treats this as touching at t1.
            output.state = ToiState::Failed;
            output.t = t1;
            break;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::Shape;
    use approx::assert_relative_eq;

    fn static_sweep(center: Vec2) -> Sweep {
        Sweep {
            local_center: Vec2::ZERO,
            c0: center,
            c: center,
            a0: 0.0,
            a: 0.0,
            alpha0: 0.0,
        }
    }

    #[test]
    fn fast_circle_hits_wall_before_crossing() {
        let circle = DistanceProxy::new(&Shape::circle(0.25), 0);
        let wall = DistanceProxy::new(&Shape::cuboid(0.05, 5.0), 0);

        let sweep_circle = Sweep {
            local_center: Vec2::ZERO,
            c0: Vec2::new(-5.0, 0.0),
            c: Vec2::new(5.0, 0.0),
            a0: 0.0,
            a: 0.0,
            alpha0: 0.0,
        };

        let output = time_of_impact(&ToiInput {
            proxy_a: wall,
            proxy_b: circle,
            sweep_a: static_sweep(Vec2::ZERO),
            sweep_b: sweep_circle,
            t_max: 1.0,
        });

        assert_eq!(output.state, ToiState::Touching);
        // Touch at roughly x = -(0.05 + 0.25) after 5 units of travel.
        assert_relative_eq!(output.t, (5.0 - 0.3) / 10.0, epsilon = 0.01);
    }

    #[test]
    fn separated_paths_never_collide() {
        let a = DistanceProxy::new(&Shape::circle(0.25), 0);
        let b = DistanceProxy::new(&Shape::circle(0.25), 0);

        let sweep_b = Sweep {
            local_center: Vec2::ZERO,
            c0: Vec2::new(-5.0, 3.0),
            c: Vec2::new(5.0, 3.0),
            a0: 0.0,
            a: 0.0,
            alpha0: 0.0,
        };

        let output = time_of_impact(&ToiInput {
            proxy_a: a,
            proxy_b: b,
            sweep_a: static_sweep(Vec2::ZERO),
            sweep_b,
            t_max: 1.0,
        });

        assert_eq!(output.state, ToiState::Separated);
        assert_eq!(output.t, 1.0);
    }

    #[test]
    fn initial_overlap_is_reported() {
        let a = DistanceProxy::new(&Shape::circle(0.5), 0);
        let b = DistanceProxy::new(&Shape::circle(0.5), 0);

        let output = time_of_impact(&ToiInput {
            proxy_a: a,
            proxy_b: b,
            sweep_a: static_sweep(Vec2::ZERO),
            sweep_b: static_sweep(Vec2::new(0.25, 0.0)),
            t_max: 1.0,
        });

        assert_eq!(output.state, ToiState::Overlapped);
        assert_eq!(output.t, 0.0);
    }
}
