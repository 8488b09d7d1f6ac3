//! Who has built what, and where.
//!
//! The ledger stores one slot per vertex and per edge of a [`Board`] and
//! answers the spatial rule questions (distance rule, road connectivity,
//! port access, longest trail). Placement methods assume the caller has
//! validated the move; placing onto an occupied slot is a defect and panics.

use crate::board::{Board, EdgeId, PlayerId, Port, TileId, VertexId};
use crate::resources::Resource;
use serde::{Deserialize, Serialize};

/// What's built on a vertex (corner)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum VertexBuilding {
    /// Nothing built
    #[default]
    Empty,
    /// Settlement (1 VP, 1 resource per adjacent tile)
    Settlement(PlayerId),
    /// City (2 VP, 2 resources per adjacent tile)
    City(PlayerId),
}

impl VertexBuilding {
    /// Get the owner of this building, if any
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            VertexBuilding::Empty => None,
            VertexBuilding::Settlement(p) | VertexBuilding::City(p) => Some(*p),
        }
    }

    /// Victory points provided by this building
    pub fn victory_points(&self) -> u32 {
        self.resource_multiplier()
    }

    /// Resource multiplier (how many resources per production)
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            VertexBuilding::Empty => 0,
            VertexBuilding::Settlement(_) => 1,
            VertexBuilding::City(_) => 2,
        }
    }
}

/// What's built on an edge (side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum EdgeBuilding {
    #[default]
    Empty,
    Road(PlayerId),
}

impl EdgeBuilding {
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            EdgeBuilding::Empty => None,
            EdgeBuilding::Road(p) => Some(*p),
        }
    }
}

/// Every building and road on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingLedger {
    vertices: Vec<VertexBuilding>,
    roads: Vec<EdgeBuilding>,
}

impl BuildingLedger {
    /// An empty ledger sized for `board`
    pub fn new(board: &Board) -> Self {
        Self {
            vertices: vec![VertexBuilding::Empty; board.vertex_count()],
            roads: vec![EdgeBuilding::Empty; board.edge_count()],
        }
    }

    pub fn building_at(&self, v: VertexId) -> VertexBuilding {
        self.vertices.get(v.index()).copied().unwrap_or_default()
    }

    pub fn road_at(&self, e: EdgeId) -> EdgeBuilding {
        self.roads.get(e.index()).copied().unwrap_or_default()
    }

    /// All occupied vertices with their buildings
    pub fn buildings(&self) -> impl Iterator<Item = (VertexId, VertexBuilding)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, b)| **b != VertexBuilding::Empty)
            .map(|(i, b)| (VertexId(i as u8), *b))
    }

    /// Edges holding one of `player`'s roads
    pub fn roads_of(&self, player: PlayerId) -> impl Iterator<Item = EdgeId> + '_ {
        self.roads
            .iter()
            .enumerate()
            .filter(move |(_, r)| **r == EdgeBuilding::Road(player))
            .map(|(i, _)| EdgeId(i as u8))
    }

    pub fn settlement_count(&self, player: PlayerId) -> u32 {
        self.vertices
            .iter()
            .filter(|b| **b == VertexBuilding::Settlement(player))
            .count() as u32
    }

    pub fn city_count(&self, player: PlayerId) -> u32 {
        self.vertices
            .iter()
            .filter(|b| **b == VertexBuilding::City(player))
            .count() as u32
    }

    pub fn road_count(&self, player: PlayerId) -> u32 {
        self.roads_of(player).count() as u32
    }

    /// Victory points from settlements and cities
    pub fn building_points(&self, player: PlayerId) -> u32 {
        self.vertices
            .iter()
            .filter(|b| b.owner() == Some(player))
            .map(|b| b.victory_points())
            .sum()
    }

    // ==================== Placement ====================

    pub fn place_settlement(&mut self, v: VertexId, player: PlayerId) {
        let slot = &mut self.vertices[v.index()];
        assert_eq!(*slot, VertexBuilding::Empty, "vertex {} already built on", v);
        *slot = VertexBuilding::Settlement(player);
    }

    pub fn upgrade_to_city(&mut self, v: VertexId, player: PlayerId) {
        let slot = &mut self.vertices[v.index()];
        assert_eq!(
            *slot,
            VertexBuilding::Settlement(player),
            "vertex {} holds no settlement of player {}",
            v,
            player
        );
        *slot = VertexBuilding::City(player);
    }

    pub fn place_road(&mut self, e: EdgeId, player: PlayerId) {
        let slot = &mut self.roads[e.index()];
        assert_eq!(*slot, EdgeBuilding::Empty, "edge {} already has a road", e);
        *slot = EdgeBuilding::Road(player);
    }

    // ==================== Spatial Rules ====================

    /// No building on `v` or on any corner one edge away
    pub fn satisfies_distance_rule(&self, board: &Board, v: VertexId) -> bool {
        self.building_at(v) == VertexBuilding::Empty
            && board
                .vertices_adjacent_to(v)
                .iter()
                .all(|&n| self.building_at(n) == VertexBuilding::Empty)
    }

    /// Whether one of `player`'s roads ends at `v`
    pub fn touches_own_road(&self, board: &Board, v: VertexId, player: PlayerId) -> bool {
        board
            .edges_touching_vertex(v)
            .iter()
            .any(|&e| self.road_at(e) == EdgeBuilding::Road(player))
    }

    /// Whether a road on `e` would join `player`'s network.
    ///
    /// An endpoint connects if it holds the player's building, or if it is not
    /// blocked by an opponent's building and another of the player's roads
    /// meets there.
    pub fn road_connects(&self, board: &Board, e: EdgeId, player: PlayerId) -> bool {
        board.vertices_of_edge(e).iter().any(|&v| {
            match self.building_at(v).owner() {
                Some(owner) if owner == player => return true,
                Some(_) => return false,
                None => {}
            }
            board
                .edges_touching_vertex(v)
                .iter()
                .any(|&other| other != e && self.road_at(other) == EdgeBuilding::Road(player))
        })
    }

    /// Best bank trade ratio `player` gets when giving away `resource`
    pub fn trade_ratio(&self, board: &Board, player: PlayerId, resource: Resource) -> u32 {
        let mut ratio = 4;
        for placement in board.ports() {
            if !self.owns_port_edge(board, placement.edge, player) {
                continue;
            }
            match placement.port {
                Port::Generic => ratio = ratio.min(3),
                Port::Specific(r) if r == resource => ratio = ratio.min(2),
                Port::Specific(_) => {}
            }
        }
        ratio
    }

    /// Whether `player` has a building on either end of a port edge
    pub fn owns_port_edge(&self, board: &Board, e: EdgeId, player: PlayerId) -> bool {
        board
            .vertices_of_edge(e)
            .iter()
            .any(|&v| self.building_at(v).owner() == Some(player))
    }

    /// Players with a building on a corner of `tile`, in seat order
    pub fn players_on_tile(&self, board: &Board, tile: TileId) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = board
            .tile_vertices(tile)
            .iter()
            .filter_map(|&v| self.building_at(v).owner())
            .collect();
        players.sort();
        players.dedup();
        players
    }

    /// Corners where `player` could put a settlement during normal play
    pub fn legal_settlement_spots(&self, board: &Board, player: PlayerId) -> Vec<VertexId> {
        (0..board.vertex_count())
            .map(|i| VertexId(i as u8))
            .filter(|&v| {
                self.satisfies_distance_rule(board, v) && self.touches_own_road(board, v, player)
            })
            .collect()
    }

    /// Free edges that would join `player`'s network
    pub fn legal_road_spots(&self, board: &Board, player: PlayerId) -> Vec<EdgeId> {
        (0..board.edge_count())
            .map(|i| EdgeId(i as u8))
            .filter(|&e| self.road_at(e) == EdgeBuilding::Empty && self.road_connects(board, e, player))
            .collect()
    }

    // ==================== Longest Road ====================

    /// Length of the longest trail (no edge reused) through `player`'s roads.
    ///
    /// A trail may end at, but never pass through, a corner holding another
    /// player's building.
    pub fn longest_road(&self, board: &Board, player: PlayerId) -> u32 {
        let owned: u128 = self
            .roads_of(player)
            .fold(0, |mask, e| mask | (1u128 << e.index()));
        if owned == 0 {
            return 0;
        }

        let mut best = 0;
        for start in 0..board.vertex_count() {
            let start = VertexId(start as u8);
            let has_road = board
                .edges_touching_vertex(start)
                .iter()
                .any(|e| owned & (1u128 << e.index()) != 0);
            if has_road {
                best = best.max(self.trail_from(board, player, start, owned, 0));
            }
        }
        best
    }

    fn trail_from(&self, board: &Board, player: PlayerId, at: VertexId, owned: u128, used: u128) -> u32 {
        let mut best = 0;
        let node = &board.vertices()[at.index()];
        for (&edge, &next) in node.edges.iter().zip(node.neighbors.iter()) {
            let bit = 1u128 << edge.index();
            if owned & bit == 0 || used & bit != 0 {
                continue;
            }
            let blocked = self
                .building_at(next)
                .owner()
                .is_some_and(|owner| owner != player);
            let rest = if blocked {
                0
            } else {
                self.trail_from(board, player, next, owned, used | bit)
            };
            best = best.max(1 + rest);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk `len` edges away from `start`, never revisiting a corner
    fn path_from(board: &Board, start: VertexId, len: usize) -> Vec<EdgeId> {
        let origin = board.vertices()[start.index()].coord.lattice_point();
        let spread = |v: &VertexId| {
            let (x, y) = board.vertices()[v.index()].coord.lattice_point();
            (x - origin.0).pow(2) + (y - origin.1).pow(2)
        };
        let mut seen = vec![start];
        let mut edges = Vec::new();
        let mut at = start;
        while edges.len() < len {
            let next = board
                .vertices_adjacent_to(at)
                .iter()
                .copied()
                .filter(|n| !seen.contains(n))
                .max_by_key(spread)
                .unwrap();
            edges.push(board.edge_between(at, next).unwrap());
            seen.push(next);
            at = next;
        }
        edges
    }

    #[test]
    fn test_distance_rule() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        let corners = *board.tile_vertices(TileId(0));

        ledger.place_settlement(corners[0], 0);
        assert!(!ledger.satisfies_distance_rule(&board, corners[0]));
        assert!(!ledger.satisfies_distance_rule(&board, corners[1]));
        assert!(ledger.satisfies_distance_rule(&board, corners[2]));
        assert!(ledger.satisfies_distance_rule(&board, corners[3]));
    }

    #[test]
    fn test_road_connects_from_building_and_road() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        let corners = *board.tile_vertices(TileId(0));
        let first = board.edge_between(corners[0], corners[1]).unwrap();
        let second = board.edge_between(corners[1], corners[2]).unwrap();
        let far = board.edge_between(corners[3], corners[4]).unwrap();

        assert!(!ledger.road_connects(&board, first, 0));
        ledger.place_settlement(corners[0], 0);
        assert!(ledger.road_connects(&board, first, 0));
        assert!(!ledger.road_connects(&board, first, 1));

        ledger.place_road(first, 0);
        assert!(ledger.road_connects(&board, second, 0));
        assert!(!ledger.road_connects(&board, far, 0));
    }

    #[test]
    fn test_opponent_building_blocks_road_connection() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        let corners = *board.tile_vertices(TileId(0));
        let first = board.edge_between(corners[0], corners[1]).unwrap();
        let second = board.edge_between(corners[1], corners[2]).unwrap();

        ledger.place_road(first, 0);
        ledger.place_settlement(corners[1], 1);
        assert!(!ledger.road_connects(&board, second, 0));
    }

    #[test]
    #[should_panic]
    fn test_double_settlement_is_fatal() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        ledger.place_settlement(VertexId(10), 0);
        ledger.place_settlement(VertexId(10), 1);
    }

    #[test]
    fn test_city_replaces_settlement() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        ledger.place_settlement(VertexId(20), 2);
        ledger.upgrade_to_city(VertexId(20), 2);
        assert_eq!(ledger.building_at(VertexId(20)), VertexBuilding::City(2));
        assert_eq!(ledger.settlement_count(2), 0);
        assert_eq!(ledger.city_count(2), 1);
        assert_eq!(ledger.building_points(2), 2);
    }

    #[test]
    fn test_longest_road_straight_line() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        for e in path_from(&board, VertexId(0), 6) {
            ledger.place_road(e, 0);
        }
        assert_eq!(ledger.longest_road(&board, 0), 6);
        assert_eq!(ledger.longest_road(&board, 1), 0);
    }

    #[test]
    fn test_longest_road_y_shape_is_not_edge_count() {
        // Fork at an inland corner: arms of 3, 2 and 1 edges (6 roads total)
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        let hub = board.tile_vertices(TileId(0))[0];
        let arms = board.vertices_adjacent_to(hub).to_vec();
        assert_eq!(arms.len(), 3);

        let mut total = 0;
        for (arm, extra) in arms.iter().zip([2usize, 1, 0]) {
            ledger.place_road(board.edge_between(hub, *arm).unwrap(), 0);
            total += 1;
            let mut seen = vec![hub, *arm];
            seen.extend(arms.iter().copied());
            let mut at = *arm;
            for _ in 0..extra {
                let next = board
                    .vertices_adjacent_to(at)
                    .iter()
                    .copied()
                    .find(|n| !seen.contains(n) && ledger.building_at(*n) == VertexBuilding::Empty)
                    .unwrap();
                let e = board.edge_between(at, next).unwrap();
                ledger.place_road(e, 0);
                total += 1;
                seen.push(next);
                at = next;
            }
        }

        assert_eq!(total, 6);
        assert_eq!(ledger.longest_road(&board, 0), 5);
    }

    #[test]
    fn test_longest_road_broken_by_opponent_settlement() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        let path = path_from(&board, VertexId(0), 6);
        for &e in &path {
            ledger.place_road(e, 0);
        }
        // Corner between the 2nd and 3rd edge
        let [a, b] = board.vertices_of_edge(path[1]);
        let [c, d] = board.vertices_of_edge(path[2]);
        let cut = if a == c || a == d { a } else { b };
        ledger.place_settlement(cut, 1);

        assert_eq!(ledger.longest_road(&board, 0), 4);
    }

    #[test]
    fn test_longest_road_counts_loop_once() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        let corners = *board.tile_vertices(TileId(0));
        for i in 0..6 {
            let e = board.edge_between(corners[i], corners[(i + 1) % 6]).unwrap();
            ledger.place_road(e, 3);
        }
        assert_eq!(ledger.longest_road(&board, 3), 6);
    }

    #[test]
    fn test_trade_ratio_from_ports() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        assert_eq!(ledger.trade_ratio(&board, 0, Resource::Ore), 4);

        let generic = board
            .ports()
            .iter()
            .find(|p| p.port == Port::Generic)
            .unwrap();
        ledger.place_settlement(board.vertices_of_edge(generic.edge)[0], 0);
        assert_eq!(ledger.trade_ratio(&board, 0, Resource::Ore), 3);

        let ore = board
            .ports()
            .iter()
            .find(|p| p.port == Port::Specific(Resource::Ore))
            .unwrap();
        ledger.place_settlement(board.vertices_of_edge(ore.edge)[1], 0);
        assert_eq!(ledger.trade_ratio(&board, 0, Resource::Ore), 2);
        assert_eq!(ledger.trade_ratio(&board, 0, Resource::Wood), 3);
        assert_eq!(ledger.trade_ratio(&board, 1, Resource::Ore), 4);
    }

    #[test]
    fn test_players_on_tile() {
        let board = Board::beginner();
        let mut ledger = BuildingLedger::new(&board);
        let corners = *board.tile_vertices(TileId(5));
        ledger.place_settlement(corners[3], 2);
        ledger.place_settlement(corners[0], 1);
        assert_eq!(ledger.players_on_tile(&board, TileId(5)), vec![1, 2]);
        assert!(ledger.players_on_tile(&board, TileId(9)).is_empty());
    }
}
