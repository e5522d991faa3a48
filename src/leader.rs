//! Leader pose source
//!
//! The tracked object a disturbance is applied relative to. The controller
//! only ever reads it.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::{UnitQuaternion, Vector3};

/// Position and orientation of a tracked object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    pub fn at(position: Vector3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Read-only access to the leader's current pose.
pub trait LeaderSource {
    fn pose(&self) -> Pose;

    fn position(&self) -> Vector3<f64> {
        self.pose().position
    }
}

impl LeaderSource for Pose {
    fn pose(&self) -> Pose {
        *self
    }
}

/// Shared leader driven from outside the controller.
impl<T: LeaderSource> LeaderSource for Rc<RefCell<T>> {
    fn pose(&self) -> Pose {
        self.borrow().pose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_leader_reflects_external_writes() {
        let shared = Rc::new(RefCell::new(Pose::at(Vector3::new(0.0, 1.0, 0.0))));
        let view = Rc::clone(&shared);

        shared.borrow_mut().position.y = 2.5;
        assert_eq!(view.position().y, 2.5);
    }
}
