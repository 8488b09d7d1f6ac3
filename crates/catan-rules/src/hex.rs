//! Axial hex geometry for a pointy-top board.
//!
//! Three coordinate kinds live here:
//! - `HexCoord` names a tile
//! - `VertexCoord` names a tile corner (settlement and city spots)
//! - `EdgeCoord` names a tile side (road spots)
//!
//! On a pointy-top grid each corner is the top pole of exactly one hex or the
//! bottom pole of exactly one hex, so a corner has a single name. A side is
//! shared by two hexes and `EdgeCoord::new` picks one canonical name for it.
//!
//! Everything maps onto an integer lattice (`lattice_point`), which gives
//! exact comparisons and a stable ordering with no floating point.

use serde::{Deserialize, Serialize};

/// Which pole of its hex a corner is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexDirection {
    North,
    South,
}

/// The six sides of a pointy-top hex, also used as neighbor directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeDirection {
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
}

impl EdgeDirection {
    /// Clockwise, starting at the upper-right side
    pub const ALL: [EdgeDirection; 6] = [
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Axial (dq, dr) step to the neighbor across this side
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (0, -1),
        }
    }

    /// The same side seen from the neighbor
    pub fn opposite(self) -> Self {
        Self::ALL[(self as usize + 3) % 6]
    }
}

/// Axial hex coordinate; `q` grows eastward and `r` grows south-eastward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Neighbors in `EdgeDirection::ALL` order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        EdgeDirection::ALL.map(|dir| self.neighbor(dir))
    }

    pub fn neighbor(&self, direction: EdgeDirection) -> HexCoord {
        let (dq, dr) = direction.offset();
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// Steps between two hexes
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        dq.abs().max(dr.abs()).max((dq + dr).abs()) as u32
    }

    /// Corners clockwise from the top one
    pub fn vertices(&self) -> [VertexCoord; 6] {
        EdgeDirection::ALL.map(|dir| side_corners(*self, dir)[0])
    }

    /// Sides clockwise from the upper-right one
    pub fn edges(&self) -> [EdgeCoord; 6] {
        EdgeDirection::ALL.map(|dir| EdgeCoord::new(*self, dir))
    }

    /// Center of the hex on the integer lattice.
    ///
    /// x is measured in half hex widths and y in half hex radii, which puts
    /// every corner on an integer point as well.
    pub fn lattice_center(&self) -> (i32, i32) {
        (2 * self.q + self.r, 3 * self.r)
    }
}

/// The two corners of side `dir` of `hex`, in clockwise order around it
fn side_corners(hex: HexCoord, dir: EdgeDirection) -> [VertexCoord; 2] {
    use EdgeDirection::*;
    use VertexDirection::{North, South};
    let at = |d: EdgeDirection, pole| VertexCoord::new(hex.neighbor(d), pole);
    let top = VertexCoord::new(hex, North);
    let bottom = VertexCoord::new(hex, South);
    match dir {
        NorthEast => [top, at(NorthEast, South)],
        East => [at(NorthEast, South), at(SouthEast, North)],
        SouthEast => [at(SouthEast, North), bottom],
        SouthWest => [bottom, at(SouthWest, North)],
        West => [at(SouthWest, North), at(NorthWest, South)],
        NorthWest => [at(NorthWest, South), top],
    }
}

/// A tile corner, named as a pole of one hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexCoord {
    pub hex: HexCoord,
    pub direction: VertexDirection,
}

impl VertexCoord {
    pub fn new(hex: HexCoord, direction: VertexDirection) -> Self {
        Self { hex, direction }
    }

    /// The two sides of `hex` meeting at this pole
    fn pole_sides(&self) -> (EdgeDirection, EdgeDirection) {
        match self.direction {
            VertexDirection::North => (EdgeDirection::NorthWest, EdgeDirection::NorthEast),
            VertexDirection::South => (EdgeDirection::SouthWest, EdgeDirection::SouthEast),
        }
    }

    /// The three hexes sharing this corner (some may be off the board)
    pub fn touching_hexes(&self) -> [HexCoord; 3] {
        let (left, right) = self.pole_sides();
        [self.hex, self.hex.neighbor(left), self.hex.neighbor(right)]
    }

    /// The three sides ending at this corner
    pub fn touching_edges(&self) -> [EdgeCoord; 3] {
        let (left, right) = self.pole_sides();
        // The third side runs between the two neighbors, east of the left one
        [
            EdgeCoord::new(self.hex, left),
            EdgeCoord::new(self.hex, right),
            EdgeCoord::new(self.hex.neighbor(left), EdgeDirection::East),
        ]
    }

    /// Corners one side away
    pub fn adjacent_vertices(&self) -> [VertexCoord; 3] {
        self.touching_edges().map(|edge| {
            let [a, b] = edge.endpoints();
            if a == *self {
                b
            } else {
                a
            }
        })
    }

    /// Position on the integer lattice (see [`HexCoord::lattice_center`])
    pub fn lattice_point(&self) -> (i32, i32) {
        let (x, y) = self.hex.lattice_center();
        let dy = match self.direction {
            VertexDirection::North => -2,
            VertexDirection::South => 2,
        };
        (x, y + dy)
    }
}

/// A tile side, named from the hex with the smaller (q, r)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeCoord {
    pub hex: HexCoord,
    pub direction: EdgeDirection,
}

impl EdgeCoord {
    /// Canonicalizing constructor
    pub fn new(hex: HexCoord, direction: EdgeDirection) -> Self {
        let other = hex.neighbor(direction);
        if (other.q, other.r) < (hex.q, hex.r) {
            Self {
                hex: other,
                direction: direction.opposite(),
            }
        } else {
            Self { hex, direction }
        }
    }

    /// The two hexes on either side
    pub fn touching_hexes(&self) -> [HexCoord; 2] {
        [self.hex, self.hex.neighbor(self.direction)]
    }

    pub fn endpoints(&self) -> [VertexCoord; 2] {
        side_corners(self.hex, self.direction)
    }

    /// Twice the midpoint on the integer lattice (doubled to stay integral)
    pub fn lattice_midpoint2(&self) -> (i32, i32) {
        let [a, b] = self.endpoints();
        let (ax, ay) = a.lattice_point();
        let (bx, by) = b.lattice_point();
        (ax + bx, ay + by)
    }
}
