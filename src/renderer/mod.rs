//! Debug overlay
//!
//! The engine never draws. A host implements [`DebugSurface`] over whatever
//! canvas it has, and the engine walks its last quadtree into it.

use crate::sim::{QuadTree, Rect};

/// Node outline color (RGBA)
pub const NODE_STROKE: [f32; 4] = [0.0, 1.0, 0.0, 0.5];
/// Fill for leaves that hold bodies (RGBA)
pub const OCCUPIED_FILL: [f32; 4] = [1.0, 1.0, 0.0, 0.1];

/// A drawing target for the overlay
pub trait DebugSurface {
    fn stroke_rect(&mut self, rect: Rect, color: [f32; 4]);

    fn fill_rect(&mut self, rect: Rect, color: [f32; 4]);
}

/// One recorded overlay primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Stroke(Rect, [f32; 4]),
    Fill(Rect, [f32; 4]),
}

/// Surface that records primitives, for hosts that batch their drawing
#[derive(Debug, Default)]
pub struct CommandList {
    pub commands: Vec<DrawCommand>,
}

impl DebugSurface for CommandList {
    fn stroke_rect(&mut self, rect: Rect, color: [f32; 4]) {
        self.commands.push(DrawCommand::Stroke(rect, color));
    }

    fn fill_rect(&mut self, rect: Rect, color: [f32; 4]) {
        self.commands.push(DrawCommand::Fill(rect, color));
    }
}

/// Outline every node; fill nodes that hold items
pub fn draw_quad_tree<T: Copy>(tree: &QuadTree<T>, surface: &mut dyn DebugSurface) {
    for node in tree.nodes() {
        surface.stroke_rect(node.boundary, NODE_STROKE);
        if !node.items.is_empty() {
            surface.fill_rect(node.boundary, OCCUPIED_FILL);
        }
    }
}
