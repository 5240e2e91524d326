//! Static board geometry: boundary walls, baffles, the peg lattice and the
//! bin dividers.
//!
//! Positions are in board units on a 300x550 surface with y pointing down.
//! Every body is inserted into the world as it is built; nothing is handed
//! back for later mutation.

use std::f32::consts::PI;

use macroquad::math::vec2;
use tracing::info;

use crate::modules::palette::FOREGROUND;
use crate::modules::world::{BodySpec, PhysicsWorld};

pub const WIDTH: f32 = 300.0;
pub const HEIGHT: f32 = 550.0;

pub const WALL_THICKNESS: f32 = 20.0;

pub const PEG_SPACING_X: f32 = 14.0;
pub const PEG_SPACING_Y: f32 = 14.0;
/// Rows `0..PEG_ROWS` are walked; only rows after `PEG_FIRST_ROW - 1` get pegs.
pub const PEG_ROWS: u32 = 21;
pub const PEG_FIRST_ROW: u32 = 10;

pub const DIVIDER_FIRST_X: u32 = 20;
pub const DIVIDER_LAST_X: u32 = 280;
pub const DIVIDER_STEP: u32 = 10;
pub const DIVIDER_Y: f32 = 415.0;
pub const DIVIDER_WIDTH: f32 = 1.0;
pub const DIVIDER_HEIGHT: f32 = 260.0;

pub const BAFFLE_THICKNESS: f32 = 2.0;

/// `(x, y, length, angle / PI)` for the three mirrored baffle pairs, top to bottom.
const BAFFLES: [(f32, f32, f32, f32); 6] = [
    (190.0, 45.0, 95.0, -0.3),
    (110.0, 45.0, 95.0, 0.3),
    (196.0, 100.0, 75.0, 0.153),
    (104.0, 100.0, 75.0, -0.153),
    (260.0, 180.0, 140.0, 0.353),
    (40.0, 180.0, 140.0, -0.353),
];

/// How many bodies of each kind a board holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardSummary {
    pub walls: usize,
    pub baffles: usize,
    pub pegs: usize,
    pub dividers: usize,
}

impl BoardSummary {
    pub fn total(&self) -> usize {
        self.walls + self.baffles + self.pegs + self.dividers
    }
}

fn wall(x: f32, y: f32, width: f32, height: f32) -> BodySpec {
    BodySpec::rect(vec2(x, y), width, height)
        .fixed()
        .fill(FOREGROUND)
}

/// Lattice position of the peg at `row`, `column`.
pub fn peg_position(row: u32, column: u32) -> (f32, f32) {
    let x = 150.0 + (column as f32 * PEG_SPACING_X - row as f32 * (PEG_SPACING_X / 2.0));
    let y = row as f32 * PEG_SPACING_Y - 10.0;
    (x, y)
}

/// Divider centre x positions, `20, 30, ..., 280`.
pub fn divider_xs() -> impl Iterator<Item = f32> {
    (DIVIDER_FIRST_X..=DIVIDER_LAST_X)
        .step_by(DIVIDER_STEP as usize)
        .map(|x| x as f32)
}

/// Top, bottom, left and right walls. The side walls are twice the board
/// height so balls cannot spill over them.
pub fn build_boundary<W: PhysicsWorld + ?Sized>(world: &mut W, width: f32, height: f32) -> usize {
    let walls = [
        wall(width / 2.0, 0.0, width, WALL_THICKNESS),           // top
        wall(width / 2.0, height, width, WALL_THICKNESS),        // bottom
        wall(0.0, height, WALL_THICKNESS, height * 2.0),         // left
        wall(width, height, WALL_THICKNESS, height * 2.0),       // right
    ];
    for spec in walls {
        world.add_body(spec);
    }
    walls.len()
}

/// The funnel baffles. Fixed coordinates, independent of board size.
pub fn build_baffles<W: PhysicsWorld + ?Sized>(world: &mut W) -> usize {
    // Each baffle is a thin rotated wall; the pairs mirror around x = 150
    for (x, y, length, turns) in BAFFLES {
        world.add_body(wall(x, y, length, BAFFLE_THICKNESS).angle(PI * turns));
    }
    BAFFLES.len()
}

/// Triangular peg lattice centred on x = 150, lower half of the drop zone only.
pub fn build_peg_lattice<W: PhysicsWorld + ?Sized>(world: &mut W, peg_size: f32) -> usize {
    let mut pegs = 0;
    // Row `row` holds `row - 1` pegs, each row shifted half a spacing left
    // so the lattice stays staggered and centred
    for row in 0..PEG_ROWS {
        for column in 1..row {
            // Upper rows stay clear so balls go through the baffles first
            if row < PEG_FIRST_ROW {
                continue;
            }
            let (x, y) = peg_position(row, column);
            world.add_body(
                BodySpec::circle(vec2(x, y), peg_size)
                    .fixed()
                    .fill(FOREGROUND),
            );
            pegs += 1;
        }
    }
    pegs
}

/// One thin wall per bin edge.
pub fn build_dividers<W: PhysicsWorld + ?Sized>(world: &mut W) -> usize {
    let mut dividers = 0;
    for x in divider_xs() {
        world.add_body(wall(x, DIVIDER_Y, DIVIDER_WIDTH, DIVIDER_HEIGHT));
        dividers += 1;
    }
    dividers
}

/// Build the complete static board into `world`.
pub fn build_board<W: PhysicsWorld + ?Sized>(world: &mut W, peg_size: f32) -> BoardSummary {
    // ---------------- Outer walls, baffles, pegs, bins -----------------------
    let summary = BoardSummary {
        walls: build_boundary(world, WIDTH, HEIGHT),
        baffles: build_baffles(world),
        pegs: build_peg_lattice(world, peg_size),
        dividers: build_dividers(world),
    };
    info!(
        walls = summary.walls,
        baffles = summary.baffles,
        pegs = summary.pegs,
        dividers = summary.dividers,
        "board built"
    );
    summary
}
