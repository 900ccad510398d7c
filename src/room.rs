use crate::{
    graph::{component_count, reachable_from},
    grid::Grid,
    region::Region,
    Coord,
};

use petgraph::{
    graph::NodeIndex,
    stable_graph::StableGraph,
    visit::IntoEdgeReferences,
    Undirected,
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// A floor region that survived pruning.
#[derive(Clone, Debug)]
pub struct Room {
    pub tiles: Vec<Coord>,
    /// Tiles with at least one orthogonal wall neighbor.
    pub edge_tiles: Vec<Coord>,
    pub is_main: bool,
    pub accessible_from_main: bool,
}

impl Room {
    /// Edge detection reads `grid` as it is when the room is built.
    pub fn new(tiles: Region, grid: &Grid) -> Self {
        let edge_tiles = tiles
            .iter()
            .filter(|t| t.orthogonal_neighbors().iter().any(|n| grid.is_wall(*n)))
            .cloned()
            .collect();

        Room {
            tiles,
            edge_tiles,
            is_main: false,
            accessible_from_main: false,
        }
    }

    pub fn size(&self) -> usize {
        self.tiles.len()
    }
}

/// The carved segment between two rooms' closest edge tiles.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Passage {
    pub from: Coord,
    pub to: Coord,
}

/// A candidate connection found by `RoomGraph::closest_link`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoomLink {
    pub room_a: usize,
    pub room_b: usize,
    pub passage: Passage,
    pub distance_squared: i64,
}

/// Rooms are identified by their index, which is also their node index in the connection graph.
/// Rooms are never removed.
pub struct RoomGraph {
    rooms: Vec<Room>,
    connections: StableGraph<usize, Passage, Undirected>,
}

impl RoomGraph {
    /// Orders rooms by descending size (stable) and makes the largest one the main room.
    pub fn new(mut rooms: Vec<Room>) -> Self {
        rooms.sort_by_key(|r| Reverse(r.size()));
        if let Some(main) = rooms.first_mut() {
            main.is_main = true;
            main.accessible_from_main = true;
            log::debug!("Main room has {} tiles", main.size());
        }

        let mut connections = StableGraph::default();
        for i in 0..rooms.len() {
            connections.add_node(i);
        }

        RoomGraph { rooms, connections }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, i: usize) -> &Room {
        &self.rooms[i]
    }

    pub fn is_connected(&self, a: usize, b: usize) -> bool {
        self.connections
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    pub fn connection_count(&self, i: usize) -> usize {
        self.connections.edges(NodeIndex::new(i)).count()
    }

    /// Links `a` and `b` symmetrically. If either side was reachable from the main room, the whole
    /// joined component becomes reachable.
    pub fn connect(&mut self, a: usize, b: usize, passage: Passage) {
        let (na, nb) = (NodeIndex::new(a), NodeIndex::new(b));
        self.connections.add_edge(na, nb, passage);

        if self.rooms[a].accessible_from_main || self.rooms[b].accessible_from_main {
            for n in reachable_from(&self.connections, na) {
                self.rooms[self.connections[n]].accessible_from_main = true;
            }
        }
    }

    /// Finds the pair of edge tiles with the smallest squared distance, over every source room and
    /// every target room that is distinct from it and not already connected to it. Ties keep the
    /// first pair found.
    pub fn closest_link(&self, sources: &[usize], targets: &[usize]) -> Option<RoomLink> {
        // PERF: quadratic in rooms and in edge tiles per room pair
        let mut best: Option<RoomLink> = None;
        for &a in sources.iter() {
            for &b in targets.iter() {
                if a == b || self.is_connected(a, b) {
                    continue;
                }
                for tile_a in self.rooms[a].edge_tiles.iter() {
                    for tile_b in self.rooms[b].edge_tiles.iter() {
                        let d = tile_a.distance_squared(tile_b);
                        if best.map_or(true, |l| d < l.distance_squared) {
                            best = Some(RoomLink {
                                room_a: a,
                                room_b: b,
                                passage: Passage {
                                    from: *tile_a,
                                    to: *tile_b,
                                },
                                distance_squared: d,
                            });
                        }
                    }
                }
            }
        }

        best
    }

    /// Room indices split into (reachable from main, not reachable), each in room order.
    pub fn partition_by_access(&self) -> (Vec<usize>, Vec<usize>) {
        (0..self.len()).partition(|i| self.rooms[*i].accessible_from_main)
    }

    pub fn all_accessible(&self) -> bool {
        self.rooms.iter().all(|r| r.accessible_from_main)
    }

    /// Passages in the order they were added.
    pub fn passages(&self) -> Vec<Passage> {
        (&self.connections)
            .edge_references()
            .map(|e| *e.weight())
            .collect()
    }

    pub fn component_count(&self) -> usize {
        component_count(&self.connections)
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
