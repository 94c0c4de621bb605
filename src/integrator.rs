//! Damped explicit integration with soft toroidal wrapping

use crate::config::IntegratorConfig;
use crate::types::Node;
use crate::viewport::Viewport;

/// Advance every node by one step.
///
/// Runs strictly after all forces for the frame have been accumulated:
/// damp, clamp speed, move, then wrap.
pub fn integrate(nodes: &mut [Node], config: &IntegratorConfig, viewport: Viewport, dt: f32) {
    let damping = config.damping.powf(dt);

    for node in nodes.iter_mut() {
        node.vx *= damping;
        node.vy *= damping;
        clamp_speed(node, config.max_speed);

        node.x += node.vx * dt;
        node.y += node.vy * dt;

        wrap(node, viewport, config.wrap_margin);
    }
}

fn clamp_speed(node: &mut Node, max_speed: f32) {
    let speed = node.speed();
    if speed > max_speed {
        let scale = max_speed / speed;
        node.vx *= scale;
        node.vy *= scale;
    }
}

/// Move a node that drifted more than `margin` past an edge to the far side.
///
/// The jump is exactly `extent + 2 * margin`, so the node reappears `margin`
/// outside the opposite edge and keeps its velocity.
pub fn wrap(node: &mut Node, viewport: Viewport, margin: f32) {
    node.x = wrap_axis(node.x, viewport.width, margin);
    node.y = wrap_axis(node.y, viewport.height, margin);
}

fn wrap_axis(value: f32, extent: f32, margin: f32) -> f32 {
    let span = extent + 2.0 * margin;
    if value < -margin {
        value + span
    } else if value > extent + margin {
        value - span
    } else {
        value
    }
}
