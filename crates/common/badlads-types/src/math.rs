//! Plain value records that give shape to the flattened float arrays on the wire.
//!
//! No math is implemented here; the host owns all spatial logic. Up is `+z`.

use crate::error::WireError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn expect_len(record: &'static str, floats: &[f32], expected: usize) -> Result<(), WireError> {
    if floats.len() != expected {
        return Err(WireError::FloatCount {
            record,
            expected,
            found: floats.len(),
        });
    }
    Ok(())
}

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector::new(0.0, 0.0, 0.0);
    pub const ONE: Vector = Vector::new(1.0, 1.0, 1.0);
    pub const WIRE_LEN: usize = 3;

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn to_wire(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_wire(floats: &[f32]) -> Result<Self, WireError> {
        expect_len("vector", floats, Self::WIRE_LEN)?;
        Ok(Self::new(floats[0], floats[1], floats[2]))
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {}, y: {}, z: {})", self.x, self.y, self.z)
    }
}

/// Pitch, yaw and roll in degrees. Gimbal lock is not handled.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    pub const ZERO: Rotation = Rotation::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(pitch: {}, yaw: {}, roll: {})",
            self.pitch, self.yaw, self.roll
        )
    }
}

/// Object transform: position, rotation, scale.
///
/// Wire form is 9 floats: `x y z pitch yaw roll scale_x scale_y scale_z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector,
    pub rotation: Rotation,
    pub scale: Vector,
}

impl Transform {
    pub const IDENTITY: Transform = Transform::new(Vector::ZERO, Rotation::ZERO, Vector::ONE);
    pub const WIRE_LEN: usize = 9;

    pub const fn new(position: Vector, rotation: Rotation, scale: Vector) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Identity rotation and scale at `position`.
    pub const fn at(position: Vector) -> Self {
        Self::new(position, Rotation::ZERO, Vector::ONE)
    }

    pub const fn to_wire(self) -> [f32; 9] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.rotation.pitch,
            self.rotation.yaw,
            self.rotation.roll,
            self.scale.x,
            self.scale.y,
            self.scale.z,
        ]
    }

    pub fn from_wire(floats: &[f32]) -> Result<Self, WireError> {
        expect_len("transform", floats, Self::WIRE_LEN)?;
        Ok(Self::new(
            Vector::new(floats[0], floats[1], floats[2]),
            Rotation::new(floats[3], floats[4], floats[5]),
            Vector::new(floats[6], floats[7], floats[8]),
        ))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(position: {}, rotation: {}, scale: {})",
            self.position, self.rotation, self.scale
        )
    }
}

/// Axis-aligned bounds. Wire form is 6 floats: center, then extents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vector,
    pub extents: Vector,
}

impl Bounds {
    pub const WIRE_LEN: usize = 6;

    pub const fn new(center: Vector, extents: Vector) -> Self {
        Self { center, extents }
    }

    pub const fn to_wire(self) -> [f32; 6] {
        [
            self.center.x,
            self.center.y,
            self.center.z,
            self.extents.x,
            self.extents.y,
            self.extents.z,
        ]
    }

    pub fn from_wire(floats: &[f32]) -> Result<Self, WireError> {
        expect_len("bounds", floats, Self::WIRE_LEN)?;
        Ok(Self::new(
            Vector::new(floats[0], floats[1], floats[2]),
            Vector::new(floats[3], floats[4], floats[5]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(floats: &[f32]) -> Vec<u32> {
        floats.iter().map(|f| f.to_bits()).collect()
    }

    #[test]
    fn transform_wire_round_trip_is_bit_exact() {
        let original = Transform::new(
            Vector::new(1.5, -0.0, f32::MIN_POSITIVE),
            Rotation::new(90.0, 1.0e-7, -179.99),
            Vector::new(f32::MAX, 0.1, 3.0),
        );
        let wire = original.to_wire();
        let decoded = Transform::from_wire(&wire).unwrap();
        assert_eq!(bits(&decoded.to_wire()), bits(&wire));
        assert_eq!(decoded.position.y.to_bits(), (-0.0f32).to_bits());
    }

    #[test]
    fn transform_wire_order_is_position_rotation_scale() {
        let wire = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let t = Transform::from_wire(&wire).unwrap();
        assert_eq!(t.position, Vector::new(1.0, 2.0, 3.0));
        assert_eq!(t.rotation, Rotation::new(4.0, 5.0, 6.0));
        assert_eq!(t.scale, Vector::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn bounds_keep_center_before_extents() {
        let b = Bounds::new(Vector::new(10.0, 20.0, 30.0), Vector::new(1.0, 2.0, 3.0));
        let wire = b.to_wire();
        assert_eq!(wire, [10.0, 20.0, 30.0, 1.0, 2.0, 3.0]);
        assert_eq!(Bounds::from_wire(&wire).unwrap(), b);
    }

    #[test]
    fn wrong_float_counts_are_rejected() {
        assert_eq!(
            Transform::from_wire(&[0.0; 6]),
            Err(WireError::FloatCount {
                record: "transform",
                expected: 9,
                found: 6
            })
        );
        assert!(Bounds::from_wire(&[0.0; 9]).is_err());
        assert!(Vector::from_wire(&[]).is_err());
    }

    #[test]
    fn display_matches_chat_friendly_format() {
        assert_eq!(Vector::ONE.to_string(), "(x: 1, y: 1, z: 1)");
        assert_eq!(
            Transform::IDENTITY.to_string(),
            "(position: (x: 0, y: 0, z: 0), rotation: (pitch: 0, yaw: 0, roll: 0), scale: (x: 1, y: 1, z: 1))"
        );
    }
}
