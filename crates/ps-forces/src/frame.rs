//! Reference frames a native force may be expressed in.

use nalgebra::{Matrix3, Vector3};

use crate::error::{ForceError, ForceResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Frame {
    /// Already in body axes.
    #[default]
    None,
    /// Wind axes; the host supplies the wind → body matrix each tick.
    WindBody,
    /// Local-level axes; the host supplies the local → body matrix.
    LocalBody,
    /// Fixed mounting angles (roll, pitch, yaw).
    Custom,
}

impl Frame {
    pub fn from_name(name: &str) -> ForceResult<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "NONE" | "BODY" => Ok(Frame::None),
            "WIND" | "WINDBODY" => Ok(Frame::WindBody),
            "LOCAL" | "LOCALBODY" => Ok(Frame::LocalBody),
            "CUSTOM" => Ok(Frame::Custom),
            _ => Err(ForceError::UnknownFrame {
                name: name.to_string(),
            }),
        }
    }
}

/// Body ← native rotation for mounting angles `(roll, pitch, yaw)` in
/// radians.
pub fn custom_transform(orientation: &Vector3<f64>) -> Matrix3<f64> {
    let (sr, cr) = orientation.x.sin_cos();
    let (sp, cp) = orientation.y.sin_cos();
    let (sy, cy) = orientation.z.sin_cos();

    let srsp = sr * sp;
    let crcy = cr * cy;
    let crsy = cr * sy;

    Matrix3::new(
        cp * cy,
        srsp * cy - crsy,
        crcy * sp + sr * sy,
        cp * sy,
        srsp * sy + crcy,
        crsy * sp - sr * cy,
        -sp,
        sr * cp,
        cr * cp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Frame::from_name("wind").unwrap(), Frame::WindBody);
        assert_eq!(Frame::from_name("Custom").unwrap(), Frame::Custom);
        assert!(matches!(
            Frame::from_name("sideways"),
            Err(ForceError::UnknownFrame { .. })
        ));
    }

    #[test]
    fn zero_angles_are_identity() {
        let t = custom_transform(&Vector3::zeros());
        assert!((t - Matrix3::identity()).norm() < 1e-15);
    }

    #[test]
    fn yaw_rotates_x_into_y() {
        let t = custom_transform(&Vector3::new(0.0, 0.0, core::f64::consts::FRAC_PI_2));
        let v = t * Vector3::x();
        assert!((v - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn pitch_up_tilts_thrust_upward() {
        // Positive pitch points the native x axis above the body x axis
        // (negative body z).
        let t = custom_transform(&Vector3::new(0.0, 0.1, 0.0));
        let v = t * Vector3::x();
        assert!(v.z < 0.0);
    }
}
