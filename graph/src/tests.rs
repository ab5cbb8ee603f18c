use std::sync::Arc;

use async_trait::async_trait;
use container::{Container, ContainerError, ContainerState, RemoveOptions};

use crate::{BuildError, Graph};

struct MockContainer {
    id: String,
    deps: Vec<String>,
}

impl MockContainer {
    fn new(id: &str, deps: &[&str]) -> Arc<dyn Container> {
        Arc::new(MockContainer {
            id: id.to_string(),
            deps: deps.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl Container for MockContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.deps
    }

    async fn lock(&self) {}
    async fn unlock(&self) {}

    async fn sync_state(&self) -> Result<(), ContainerError> {
        Ok(())
    }

    async fn check_dependencies_running(
        &self,
        _dependency_ids: &[String],
    ) -> Result<Vec<String>, ContainerError> {
        Ok(Vec::new())
    }

    async fn init_and_start(&self) -> Result<(), ContainerError> {
        Ok(())
    }

    async fn restart_with_timeout(&self, _timeout: Option<u64>) -> Result<(), ContainerError> {
        Ok(())
    }

    async fn stop(&self, _timeout: Option<u64>) -> Result<(), ContainerError> {
        Ok(())
    }

    async fn full_cleanup(&self, _only_stopped: bool) -> Result<(), ContainerError> {
        Ok(())
    }

    async fn remove(&self, _opts: RemoveOptions) -> Result<(), ContainerError> {
        Ok(())
    }

    fn state(&self) -> ContainerState {
        ContainerState::Running
    }

    fn is_infra(&self) -> bool {
        false
    }

    fn named_volumes(&self) -> Vec<String> {
        Vec::new()
    }
}

fn linear_chain() -> Vec<Arc<dyn Container>> {
    vec![
        MockContainer::new("A", &[]),
        MockContainer::new("B", &["A"]),
        MockContainer::new("C", &["B"]),
    ]
}

fn diamond() -> Vec<Arc<dyn Container>> {
    vec![
        MockContainer::new("A", &[]),
        MockContainer::new("B", &["A"]),
        MockContainer::new("C", &["A"]),
        MockContainer::new("D", &["B", "C"]),
    ]
}

#[test]
fn build_round_trip_counts_match() {
    let graph = Graph::build(diamond()).unwrap();
    assert_eq!(graph.len(), 4);

    let forward_edges: usize = (0..graph.node_count())
        .map(|i| {
            graph
                .entry(petgraph::graph::NodeIndex::new(i))
                .depends_on()
                .len()
        })
        .sum();
    let inverse_edges: usize = (0..graph.node_count())
        .map(|i| {
            graph
                .entry(petgraph::graph::NodeIndex::new(i))
                .depended_on()
                .len()
        })
        .sum();
    assert_eq!(forward_edges, inverse_edges);
    assert_eq!(forward_edges, 4);
}

#[test]
fn entry_sets_are_exact() {
    let graph = Graph::build(diamond()).unwrap();

    let no_dep_ids: Vec<&str> = graph
        .no_dep_nodes()
        .iter()
        .map(|&idx| graph.entry(idx).id())
        .collect();
    assert_eq!(no_dep_ids, vec!["A"]);

    let mut not_depended_ids: Vec<&str> = graph
        .not_depended_on_nodes()
        .map(|idx| graph.entry(idx).id())
        .collect();
    not_depended_ids.sort_unstable();
    assert_eq!(not_depended_ids, vec!["D"]);
}

#[test]
fn linear_chain_builds() {
    let graph = Graph::build(linear_chain()).unwrap();
    assert_eq!(graph.len(), 3);
    let c = graph.entry_by_id("C").unwrap();
    assert_eq!(c.depends_on().len(), 1);
    assert_eq!(graph.entry(c.depends_on()[0]).id(), "B");
}

#[test]
fn unknown_dependency_is_rejected() {
    let containers = vec![MockContainer::new("A", &["ghost"])];
    let err = Graph::build(containers).unwrap_err();
    assert_eq!(
        err,
        BuildError::UnknownDependency {
            node: "A".to_string(),
            dependency: "ghost".to_string(),
        }
    );
}

#[test]
fn self_loop_is_rejected() {
    let containers = vec![MockContainer::new("A", &["A"])];
    let err = Graph::build(containers).unwrap_err();
    assert_eq!(err, BuildError::CyclicGraph);
}

#[test]
fn two_node_cycle_is_rejected() {
    let containers = vec![MockContainer::new("A", &["B"]), MockContainer::new("B", &["A"])];
    let err = Graph::build(containers).unwrap_err();
    assert_eq!(err, BuildError::CyclicGraph);
}
