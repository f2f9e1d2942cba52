/// ピクセル空間の2D点
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 余弦計算の分母ガード
const ANGLE_EPSILON: f64 = 1e-8;

pub fn midpoint(a: Point2, b: Point2) -> Point2 {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// b を頂点とする a-b-c の折れ角（度）
///
/// 180°からの偏差を返す: a, b, c が一直線（b が間）なら 0°、鋭く曲がるほど大きい。
/// 長さ0のベクトルでも NaN にならない。
pub fn angle_between(a: Point2, b: Point2, c: Point2) -> f64 {
    let ba = (a.x - b.x, a.y - b.y);
    let bc = (c.x - b.x, c.y - b.y);

    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let mag_ba = ba.0.hypot(ba.1);
    let mag_bc = bc.0.hypot(bc.1);

    let cos = (dot / (mag_ba * mag_bc + ANGLE_EPSILON)).clamp(-1.0, 1.0);
    (180.0 - cos.acos().to_degrees()).abs()
}

/// lower→upper ベクトルの鉛直からの傾き（度）
///
/// 画像座標は y が下向きなので、upper が真上にあれば 0°。
/// 正: upper が右に傾いている。
pub fn tilt_from_vertical(lower: Point2, upper: Point2) -> f64 {
    f64::atan2(upper.x - lower.x, lower.y - upper.y).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(Point2::new(0.0, 10.0), Point2::new(20.0, 30.0));
        assert_eq!(m, Point2::new(10.0, 20.0));
    }

    #[test]
    fn test_angle_collinear_is_zero() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(5.0, 5.0);
        let c = Point2::new(10.0, 10.0);
        assert!(approx_eq(angle_between(a, b, c), 0.0, 1e-2));
    }

    #[test]
    fn test_angle_right_angle() {
        let a = Point2::new(0.0, 10.0);
        let b = Point2::new(0.0, 0.0);
        let c = Point2::new(10.0, 0.0);
        // θ = 90° → |180 - 90| = 90
        assert!(approx_eq(angle_between(a, b, c), 90.0, 1e-6));
    }

    #[test]
    fn test_angle_folded_back() {
        let a = Point2::new(10.0, 0.0);
        let b = Point2::new(0.0, 0.0);
        let c = Point2::new(20.0, 0.0);
        // θ = 0° → 180
        assert!(approx_eq(angle_between(a, b, c), 180.0, 1e-2));
    }

    #[test]
    fn test_angle_degenerate_is_finite() {
        let a = Point2::new(3.0, 4.0);
        let b = Point2::new(1.0, 1.0);
        let angle = angle_between(a, b, a);
        assert!(angle.is_finite());

        // 全点が一致しても NaN にならない
        let p = Point2::new(2.0, 2.0);
        let angle = angle_between(p, p, p);
        assert!(angle.is_finite());
        assert!(approx_eq(angle, 90.0, 1e-9));
    }

    #[test]
    fn test_tilt_upright_is_zero() {
        let hip = Point2::new(320.0, 400.0);
        let shoulder = Point2::new(320.0, 200.0);
        assert_eq!(tilt_from_vertical(hip, shoulder), 0.0);
    }

    #[test]
    fn test_tilt_sign() {
        let hip = Point2::new(320.0, 400.0);
        let right = tilt_from_vertical(hip, Point2::new(420.0, 300.0));
        let left = tilt_from_vertical(hip, Point2::new(220.0, 300.0));
        assert!(approx_eq(right, 45.0, 1e-9));
        assert!(approx_eq(left, -45.0, 1e-9));
    }

    #[test]
    fn test_tilt_coincident_points() {
        let p = Point2::new(100.0, 100.0);
        assert_eq!(tilt_from_vertical(p, p), 0.0);
    }
}
