//! Interpolation.
//!
//! The room pushes discrete position updates at its own cadence. The client
//! renders at its own rate and, every frame, moves each displayed position a
//! fixed fraction of the way toward the last authoritative one.

use room_shared::config::{BlendMode, ClientConfig};

use crate::registry::{EntityRegistry, RemoteEntity};

/// Fraction of the remaining distance closed per frame.
pub const DEFAULT_BLEND_FACTOR: f32 = 0.2;

/// Exponential smoothing toward authoritative positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolator {
    factor: f32,
    mode: BlendMode,
    reference_frame_ms: f32,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::per_frame(DEFAULT_BLEND_FACTOR)
    }
}

impl Interpolator {
    pub fn new(factor: f32, mode: BlendMode, reference_frame_ms: f32) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            mode,
            reference_frame_ms,
        }
    }

    pub fn per_frame(factor: f32) -> Self {
        Self::new(factor, BlendMode::PerFrame, 1000.0 / 60.0)
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self::new(cfg.blend_factor, cfg.blend_mode, cfg.reference_frame_ms)
    }

    /// Blend factor to apply for a frame that took `delta_ms`.
    ///
    /// `TimeScaled` closes `1 - (1 - factor)^(delta / reference)` of the gap,
    /// which equals `factor` when the frame is exactly the reference length.
    pub fn effective_factor(&self, delta_ms: f32) -> f32 {
        match self.mode {
            BlendMode::PerFrame => self.factor,
            BlendMode::TimeScaled => {
                if self.reference_frame_ms <= 0.0 {
                    return self.factor;
                }
                if delta_ms.is_nan() || delta_ms <= 0.0 {
                    return 0.0;
                }
                let frames = delta_ms / self.reference_frame_ms;
                (1.0 - (1.0 - self.factor).powf(frames)).clamp(0.0, 1.0)
            }
        }
    }

    /// Advances one entity's displayed position toward its authoritative one.
    pub fn step(&self, entity: &mut RemoteEntity, delta_ms: f32) {
        let t = self.effective_factor(delta_ms);
        entity.displayed = entity.displayed.lerp(entity.authoritative, t);
    }

    /// Advances every registered entity.
    pub fn step_all(&self, registry: &mut EntityRegistry, delta_ms: f32) {
        for (_, entity) in registry.iter_mut() {
            self.step(entity, delta_ms);
        }
    }
}

/// Number of per-frame steps needed to bring `initial_distance` within
/// `epsilon` of a fixed target: `ceil(ln(epsilon / d0) / ln(1 - alpha))`.
///
/// Returns `None` when the target is never reached (`alpha <= 0`, or a
/// non-positive `epsilon` with a non-zero distance).
pub fn ticks_to_converge(initial_distance: f32, epsilon: f32, alpha: f32) -> Option<u32> {
    let d0 = f64::from(initial_distance.abs());
    let eps = f64::from(epsilon);
    let alpha = f64::from(alpha);

    if d0 <= eps {
        return Some(0);
    }
    if eps <= 0.0 || alpha <= 0.0 {
        return None;
    }
    if alpha >= 1.0 {
        return Some(1);
    }
    let ticks = ((eps / d0).ln() / (1.0 - alpha).ln()).ceil();
    Some(ticks as u32)
}

#[cfg(test)]
mod tests {
    use room_shared::{math::Vec2, net::PlayerState};

    use super::*;
    use crate::host::HeadlessScene;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn one_step_closes_a_fifth_of_the_gap() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "abc".into(), PlayerState { x: 100.0, y: 100.0 });
        reg.on_session_changed(&"abc".into(), PlayerState { x: 110.0, y: 100.0 });

        Interpolator::default().step_all(&mut reg, 16.0);

        let e = reg.get(&"abc".into()).unwrap();
        assert!(approx(e.displayed.x, 102.0));
        assert!(approx(e.displayed.y, 100.0));
    }

    #[test]
    fn no_snap_on_first_frame() {
        let mut scene = HeadlessScene::new();
        let mut reg = EntityRegistry::new("ship_0001");
        reg.on_session_added(&mut scene, "abc".into(), PlayerState { x: 40.0, y: -7.0 });

        Interpolator::default().step_all(&mut reg, 16.0);
        assert_eq!(
            reg.get(&"abc".into()).unwrap().displayed,
            Vec2::new(40.0, -7.0)
        );
    }

    #[test]
    fn distance_strictly_decreases_and_converges() {
        let interp = Interpolator::default();
        let mut entity = RemoteEntity {
            sprite: crate::host::SpriteId(0),
            authoritative: Vec2::new(100.0, 0.0),
            displayed: Vec2::new(0.0, 0.0),
        };
        let eps = 0.01;
        let expected = ticks_to_converge(100.0, eps, DEFAULT_BLEND_FACTOR).unwrap();
        assert_eq!(expected, 42);

        let mut prev = entity.displayed.distance(entity.authoritative);
        let mut ticks = 0;
        while prev > eps {
            interp.step(&mut entity, 16.0);
            let d = entity.displayed.distance(entity.authoritative);
            assert!(d < prev, "distance must shrink every tick");
            prev = d;
            ticks += 1;
        }
        assert_eq!(ticks, expected);
    }

    #[test]
    fn ticks_to_converge_edges() {
        assert_eq!(ticks_to_converge(0.0, 0.1, 0.2), Some(0));
        assert_eq!(ticks_to_converge(5.0, 10.0, 0.2), Some(0));
        assert_eq!(ticks_to_converge(5.0, 0.1, 0.0), None);
        assert_eq!(ticks_to_converge(5.0, 0.0, 0.2), None);
        assert_eq!(ticks_to_converge(5.0, 0.1, 1.0), Some(1));
    }

    #[test]
    fn time_scaled_matches_per_frame_at_reference() {
        let scaled = Interpolator::new(0.2, BlendMode::TimeScaled, 16.0);
        assert!(approx(scaled.effective_factor(16.0), 0.2));
        // Two half-length frames close the same gap as one full frame.
        let half = scaled.effective_factor(8.0);
        assert!(approx(1.0 - (1.0 - half) * (1.0 - half), 0.2));
        assert_eq!(scaled.effective_factor(0.0), 0.0);
    }

    #[test]
    fn per_frame_ignores_delta() {
        let interp = Interpolator::default();
        assert_eq!(interp.effective_factor(1.0), 0.2);
        assert_eq!(interp.effective_factor(100.0), 0.2);
    }
}
