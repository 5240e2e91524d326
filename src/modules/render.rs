//! Draws a [`PhysicsWorld`] onto the fixed board surface with macroquad.

use macroquad::prelude::*;

use crate::modules::board::{HEIGHT, WIDTH};
use crate::modules::palette::BACKGROUND;
use crate::modules::world::{PhysicsWorld, Shape};

/// Map a `width` x `height` virtual surface onto the window.
///
/// With the `scale` feature the surface keeps its aspect ratio and is
/// centred; without it the surface is stretched to fill the window.
pub fn use_virtual_resolution(width: f32, height: f32) {
    let (sw, sh) = (screen_width(), screen_height());
    let viewport = if cfg!(feature = "scale") {
        let scale = (sw / width).min(sh / height);
        let (vw, vh) = (width * scale, height * scale);
        Some((
            ((sw - vw) / 2.0) as i32,
            ((sh - vh) / 2.0) as i32,
            vw as i32,
            vh as i32,
        ))
    } else {
        None
    };

    set_camera(&Camera2D {
        target: vec2(width / 2.0, height / 2.0),
        // positive y zoom keeps y pointing down, like screen space
        zoom: vec2(2.0 / width, 2.0 / height),
        viewport,
        ..Default::default()
    });
}

/// Clear the board surface and draw every body at its current pose.
pub fn draw_world<W: PhysicsWorld + ?Sized>(world: &W) {
    use_virtual_resolution(WIDTH, HEIGHT);
    draw_rectangle(0.0, 0.0, WIDTH, HEIGHT, BACKGROUND);

    for body in world.bodies() {
        match body.shape {
            Shape::Circle { radius } => {
                draw_circle(body.position.x, body.position.y, radius, body.fill);
            }
            Shape::Rect { width, height } => {
                // offset (0.5, 0.5) rotates about the centre rather than the corner
                draw_rectangle_ex(
                    body.position.x,
                    body.position.y,
                    width,
                    height,
                    DrawRectangleParams {
                        offset: vec2(0.5, 0.5),
                        rotation: body.angle,
                        color: body.fill,
                    },
                );
            }
        }
    }

    set_default_camera();
}
