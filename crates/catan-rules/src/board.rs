//! Game board representation: tiles, the derived vertex/edge graph, ports
//! and the robber.
//!
//! The board is built once from 19 land hexes. Every corner and side of those
//! hexes becomes an indexed `VertexId` / `EdgeId`, and all adjacency is
//! precomputed into tables, so rule checks are plain lookups. After
//! construction only the robber moves.

use crate::hex::{EdgeCoord, HexCoord, VertexCoord};
use crate::resources::Resource;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Player identifier: the seat index in turn order
pub type PlayerId = u8;

/// Number of land tiles on the board
pub const TILE_COUNT: usize = 19;

/// Number of ports on the coast
pub const PORT_COUNT: usize = 9;

/// Land hexes in id order: center, inner ring, outer ring (both clockwise from the east)
const LAND_COORDS: [HexCoord; TILE_COUNT] = [
    HexCoord::new(0, 0),
    HexCoord::new(1, 0),
    HexCoord::new(1, -1),
    HexCoord::new(0, -1),
    HexCoord::new(-1, 0),
    HexCoord::new(-1, 1),
    HexCoord::new(0, 1),
    HexCoord::new(2, 0),
    HexCoord::new(2, -1),
    HexCoord::new(2, -2),
    HexCoord::new(1, -2),
    HexCoord::new(0, -2),
    HexCoord::new(-1, -1),
    HexCoord::new(-2, 0),
    HexCoord::new(-2, 1),
    HexCoord::new(-2, 2),
    HexCoord::new(-1, 2),
    HexCoord::new(0, 2),
    HexCoord::new(1, 1),
];

/// Positions along the clockwise coastline (30 sides) that carry a port
const PORT_SLOTS: [usize; PORT_COUNT] = [0, 3, 6, 10, 13, 16, 20, 23, 26];

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u8);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_type!(
    /// Index of a land tile (0-18)
    TileId
);
index_type!(
    /// Index of a tile corner
    VertexId
);
index_type!(
    /// Index of a tile side
    EdgeId
);

/// What a tile produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileKind {
    /// Produces a resource when its number is rolled
    Resource(Resource),
    /// No production; starts with the robber
    Desert,
}

/// Port types for bank trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Port {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specific(Resource),
}

impl Port {
    /// The exchange rate for this port
    pub fn rate(&self) -> u32 {
        match self {
            Port::Generic => 3,
            Port::Specific(_) => 2,
        }
    }
}

/// A single land tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub coord: HexCoord,
    pub kind: TileKind,
    /// Dice number that triggers production (2-12, None for the desert)
    pub number: Option<u8>,
}

impl Tile {
    /// Get the resource this tile produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self.kind {
            TileKind::Resource(r) => Some(r),
            TileKind::Desert => None,
        }
    }
}

/// A corner of one or more tiles, with its precomputed neighborhood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexNode {
    pub coord: VertexCoord,
    /// Land tiles touching this corner (1-3)
    pub tiles: Vec<TileId>,
    /// Land edges meeting here (2-3)
    pub edges: Vec<EdgeId>,
    /// Corners one edge away, in the same order as `edges`
    pub neighbors: Vec<VertexId>,
}

/// A side of one or two tiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeNode {
    pub coord: EdgeCoord,
    pub vertices: [VertexId; 2],
    /// Land tiles sharing this side (1 on the coast, 2 inland)
    pub tiles: Vec<TileId>,
}

/// Port placement on the coast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPlacement {
    pub edge: EdgeId,
    pub port: Port,
}

/// Errors for explicitly supplied layouts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("layout must contain exactly one desert, found {0}")]
    DesertCount(usize),

    #[error("tile {0} has an invalid production number")]
    InvalidNumber(usize),
}

/// The complete game board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    tiles: Vec<Tile>,
    tile_vertices: Vec<[VertexId; 6]>,
    vertices: Vec<VertexNode>,
    edges: Vec<EdgeNode>,
    ports: Vec<PortPlacement>,
    robber: TileId,
}

impl Board {
    /// The fixed beginner layout (desert in the middle)
    pub fn beginner() -> Self {
        use Resource::*;
        use TileKind::{Desert as D, Resource as R};
        let kinds = [
            D,
            R(Ore),
            R(Wheat),
            R(Sheep),
            R(Wood),
            R(Brick),
            R(Wheat),
            R(Wood),
            R(Sheep),
            R(Brick),
            R(Wheat),
            R(Wood),
            R(Sheep),
            R(Ore),
            R(Wheat),
            R(Sheep),
            R(Brick),
            R(Wood),
            R(Ore),
        ];
        let numbers = [
            None,
            Some(3),
            Some(4),
            Some(5),
            Some(9),
            Some(10),
            Some(11),
            Some(6),
            Some(2),
            Some(9),
            Some(8),
            Some(3),
            Some(10),
            Some(6),
            Some(4),
            Some(11),
            Some(8),
            Some(5),
            Some(12),
        ];
        Self::assemble(&kinds, &numbers, Self::standard_ports())
    }

    /// Create the standard board with randomized tiles, numbers and port types
    pub fn standard_with_rng<R: Rng>(rng: &mut R) -> Self {
        let mut kinds: Vec<TileKind> = Vec::with_capacity(TILE_COUNT);
        for (resource, count) in [
            (Resource::Wood, 4),
            (Resource::Wheat, 4),
            (Resource::Sheep, 4),
            (Resource::Ore, 3),
            (Resource::Brick, 3),
        ] {
            kinds.extend(std::iter::repeat(TileKind::Resource(resource)).take(count));
        }
        kinds.push(TileKind::Desert);
        kinds.shuffle(rng);

        // Standard dice number distribution: one 2 and 12, two of everything else but 7
        let numbers: Vec<u8> = vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];
        let resource_positions: Vec<usize> = kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| matches!(k, TileKind::Resource(_)))
            .map(|(i, _)| i)
            .collect();
        let assignment = assign_numbers_avoiding_adjacent_68(&resource_positions, &numbers, rng);

        let mut tile_numbers = [None; TILE_COUNT];
        for (&position, &number) in resource_positions.iter().zip(assignment.iter()) {
            tile_numbers[position] = Some(number);
        }

        let mut ports = Self::standard_ports();
        ports.shuffle(rng);

        Self::assemble(&kinds, &tile_numbers, ports)
    }

    /// Build a board from an explicit layout, in tile id order
    pub fn from_layout(
        kinds: [TileKind; TILE_COUNT],
        numbers: [Option<u8>; TILE_COUNT],
        ports: [Port; PORT_COUNT],
    ) -> Result<Self, BoardError> {
        let deserts = kinds.iter().filter(|k| **k == TileKind::Desert).count();
        if deserts != 1 {
            return Err(BoardError::DesertCount(deserts));
        }
        for (i, (kind, number)) in kinds.iter().zip(numbers.iter()).enumerate() {
            let valid = match (kind, number) {
                (TileKind::Desert, None) => true,
                (TileKind::Resource(_), Some(n)) => (2..=12).contains(n) && *n != 7,
                _ => false,
            };
            if !valid {
                return Err(BoardError::InvalidNumber(i));
            }
        }
        Ok(Self::assemble(&kinds, &numbers, ports.to_vec()))
    }

    fn standard_ports() -> Vec<Port> {
        vec![
            Port::Generic,
            Port::Specific(Resource::Sheep),
            Port::Generic,
            Port::Generic,
            Port::Specific(Resource::Brick),
            Port::Specific(Resource::Wood),
            Port::Generic,
            Port::Specific(Resource::Wheat),
            Port::Specific(Resource::Ore),
        ]
    }

    /// Derive the vertex/edge graph from the tile layout
    fn assemble(kinds: &[TileKind], numbers: &[Option<u8>], port_types: Vec<Port>) -> Self {
        let tiles: Vec<Tile> = LAND_COORDS
            .iter()
            .enumerate()
            .map(|(i, &coord)| Tile {
                id: TileId(i as u8),
                coord,
                kind: kinds[i],
                number: numbers[i],
            })
            .collect();
        let tile_by_coord: HashMap<HexCoord, TileId> =
            tiles.iter().map(|t| (t.coord, t.id)).collect();

        // Row-major ids on the integer lattice keep numbering stable
        let mut vertex_coords: Vec<VertexCoord> = tiles
            .iter()
            .flat_map(|t| t.coord.vertices())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        vertex_coords.sort_by_key(|v| {
            let (x, y) = v.lattice_point();
            (y, x)
        });
        let mut edge_coords: Vec<EdgeCoord> = tiles
            .iter()
            .flat_map(|t| t.coord.edges())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        edge_coords.sort_by_key(|e| {
            let (x, y) = e.lattice_midpoint2();
            (y, x)
        });

        let vertex_ids: HashMap<VertexCoord, VertexId> = vertex_coords
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, VertexId(i as u8)))
            .collect();
        let edge_ids: HashMap<EdgeCoord, EdgeId> = edge_coords
            .iter()
            .enumerate()
            .map(|(i, e)| (*e, EdgeId(i as u8)))
            .collect();

        let edges: Vec<EdgeNode> = edge_coords
            .iter()
            .map(|&coord| EdgeNode {
                coord,
                vertices: coord.endpoints().map(|v| vertex_ids[&v]),
                tiles: land_tiles(&coord.touching_hexes(), &tile_by_coord),
            })
            .collect();

        let vertices: Vec<VertexNode> = vertex_coords
            .iter()
            .enumerate()
            .map(|(i, &coord)| {
                let id = VertexId(i as u8);
                let mut incident: Vec<EdgeId> = coord
                    .touching_edges()
                    .iter()
                    .filter_map(|e| edge_ids.get(e).copied())
                    .collect();
                incident.sort();
                let neighbors = incident
                    .iter()
                    .map(|e| {
                        let [a, b] = edges[e.index()].vertices;
                        if a == id {
                            b
                        } else {
                            a
                        }
                    })
                    .collect();
                VertexNode {
                    coord,
                    tiles: land_tiles(&coord.touching_hexes(), &tile_by_coord),
                    edges: incident,
                    neighbors,
                }
            })
            .collect();

        let tile_vertices = tiles
            .iter()
            .map(|t| t.coord.vertices().map(|v| vertex_ids[&v]))
            .collect();

        // Coastline sides sorted clockwise by angle around the center
        let mut coast: Vec<EdgeId> = edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.tiles.len() == 1)
            .map(|(i, _)| EdgeId(i as u8))
            .collect();
        coast.sort_by(|a, b| {
            coastal_angle(&edges[a.index()]).total_cmp(&coastal_angle(&edges[b.index()]))
        });
        let ports = PORT_SLOTS
            .iter()
            .zip(port_types)
            .map(|(&slot, port)| PortPlacement {
                edge: coast[slot % coast.len()],
                port,
            })
            .collect();

        let robber = tiles
            .iter()
            .find(|t| t.kind == TileKind::Desert)
            .map(|t| t.id)
            .unwrap_or(TileId(0));

        Self {
            tiles,
            tile_vertices,
            vertices,
            edges,
            ports,
            robber,
        }
    }

    // ==================== Query Methods ====================

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.index())
    }

    pub fn vertices(&self) -> &[VertexNode] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeNode] {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_vertex(&self, v: VertexId) -> bool {
        v.index() < self.vertices.len()
    }

    pub fn is_tile(&self, t: TileId) -> bool {
        t.index() < self.tiles.len()
    }

    /// Land tiles touching a corner
    pub fn tiles_touching_vertex(&self, v: VertexId) -> &[TileId] {
        &self.vertices[v.index()].tiles
    }

    /// The two endpoints of a side
    pub fn vertices_of_edge(&self, e: EdgeId) -> [VertexId; 2] {
        self.edges[e.index()].vertices
    }

    /// Sides meeting at a corner
    pub fn edges_touching_vertex(&self, v: VertexId) -> &[EdgeId] {
        &self.vertices[v.index()].edges
    }

    /// Corners exactly one side away
    pub fn vertices_adjacent_to(&self, v: VertexId) -> &[VertexId] {
        &self.vertices[v.index()].neighbors
    }

    /// The side joining two corners, if they are adjacent
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        if !self.is_vertex(a) || !self.is_vertex(b) {
            return None;
        }
        let node = &self.vertices[a.index()];
        node.neighbors
            .iter()
            .position(|&n| n == b)
            .map(|i| node.edges[i])
    }

    /// The six corners of a tile, clockwise from the top
    pub fn tile_vertices(&self, t: TileId) -> &[VertexId; 6] {
        &self.tile_vertices[t.index()]
    }

    pub fn ports(&self) -> &[PortPlacement] {
        &self.ports
    }

    /// Ports reachable from a corner
    pub fn ports_at_vertex(&self, v: VertexId) -> impl Iterator<Item = Port> + '_ {
        self.ports
            .iter()
            .filter(move |p| self.vertices_of_edge(p.edge).contains(&v))
            .map(|p| p.port)
    }

    /// The tile currently holding the robber
    pub fn robber(&self) -> TileId {
        self.robber
    }

    // ==================== Mutation ====================

    /// Move the robber (assumes validation already done)
    pub fn move_robber(&mut self, tile: TileId) {
        assert!(self.is_tile(tile), "robber moved off the board: {}", tile);
        self.robber = tile;
    }
}

fn land_tiles(hexes: &[HexCoord], tile_by_coord: &HashMap<HexCoord, TileId>) -> Vec<TileId> {
    let mut tiles: Vec<TileId> = hexes
        .iter()
        .filter_map(|h| tile_by_coord.get(h).copied())
        .collect();
    tiles.sort();
    tiles
}

fn coastal_angle(edge: &EdgeNode) -> f64 {
    let (x2, y2) = edge.coord.lattice_midpoint2();
    let x = f64::from(x2) * 3.0_f64.sqrt() / 2.0;
    let y = f64::from(y2) * 0.5;
    y.atan2(x)
}

/// Shuffle numbers onto resource tiles until no 6 and 8 touch
fn assign_numbers_avoiding_adjacent_68<R: Rng>(
    resource_positions: &[usize],
    numbers: &[u8],
    rng: &mut R,
) -> Vec<u8> {
    const MAX_ATTEMPTS: usize = 100;

    let mut shuffled = numbers.to_vec();
    for _ in 0..MAX_ATTEMPTS {
        shuffled.shuffle(rng);
        if is_valid_number_placement(resource_positions, &shuffled) {
            break;
        }
    }
    shuffled
}

/// Check if a number placement keeps 6s and 8s apart
fn is_valid_number_placement(resource_positions: &[usize], numbers: &[u8]) -> bool {
    let hot: HashSet<HexCoord> = resource_positions
        .iter()
        .zip(numbers)
        .filter(|(_, &n)| n == 6 || n == 8)
        .map(|(&pos, _)| LAND_COORDS[pos])
        .collect();

    hot.iter()
        .all(|coord| coord.neighbors().iter().all(|n| !hot.contains(n)))
}
