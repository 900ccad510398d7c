use petgraph::{
    algo::tarjan_scc,
    graph::NodeIndex,
    stable_graph::StableGraph,
    visit::{depth_first_search, Control, DfsEvent},
    EdgeType,
};

/// All nodes reachable from `start`, including `start`, in discovery order.
pub fn reachable_from<N, E, Ty: EdgeType>(
    graph: &StableGraph<N, E, Ty>,
    start: NodeIndex,
) -> Vec<NodeIndex> {
    let mut reached = Vec::new();
    depth_first_search(graph, Some(start), |event| {
        if let DfsEvent::Discover(n, _) = event {
            reached.push(n);
        }

        Control::<()>::Continue
    });

    reached
}

/// For an undirected graph this is the number of connected components.
pub fn component_count<N, E, Ty: EdgeType>(graph: &StableGraph<N, E, Ty>) -> usize {
    tarjan_scc(graph).len()
}
