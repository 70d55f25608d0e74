use handworks_common::HandSide;

use crate::controller::ControllerState;

/// Everything a component may read during one simulation tick.
///
/// Passed explicitly into every update call; nothing in the core reads input
/// or frame time from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickContext {
    /// Seconds elapsed since the previous tick.
    pub delta: f32,
    pub left: ControllerState,
    pub right: ControllerState,
}

impl TickContext {
    pub fn new(delta: f32) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    pub fn with_controller(mut self, side: HandSide, state: ControllerState) -> Self {
        *self.controller_mut(side) = state;
        self
    }

    pub fn controller(&self, side: HandSide) -> &ControllerState {
        match side {
            HandSide::Left => &self.left,
            HandSide::Right => &self.right,
        }
    }

    pub fn controller_mut(&mut self, side: HandSide) -> &mut ControllerState {
        match side {
            HandSide::Left => &mut self.left,
            HandSide::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controllers_are_routed_by_side() {
        let ctx = TickContext::new(1.0 / 90.0)
            .with_controller(HandSide::Right, ControllerState::default().with_grip(1.0));
        assert_eq!(ctx.controller(HandSide::Right).grip, 1.0);
        assert_eq!(ctx.controller(HandSide::Left).grip, 0.0);
        assert!((ctx.delta - 1.0 / 90.0).abs() < f32::EPSILON);
    }
}
