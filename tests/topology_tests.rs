#[cfg(test)]
mod topology_tests {
    use regionsim::attributes::{LinkAttribute, NodeAttribute};
    use regionsim::engine::HeartbeatEngine;
    use regionsim::identifiers::{NodeIdentifier, RegionIdentifier};
    use regionsim::network::AddressRegistry;
    use regionsim::report::EstimationWindow;
    use regionsim::topology::{parse_directory, BasicNetworkFactory, FormatError, TOPOLOGY_FILENAME};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    const TOPOLOGY: &str = "\
# three regions of a small testbed
source tb_compat.tcl
set ns [new Simulator]

set nodeA [$ns node]
set nodeB [$ns node]
set clientC [$ns node]
tb-set-node-os $nodeA UBUNTU18-64-STD

set link0 [$ns duplex-link $nodeA $nodeB 100mb 0ms DropTail]
set link1 [$ns duplex-link $nodeB $clientC 512kb 0ms DropTail]

$ns rtproto Static
$ns run
";

    fn factory() -> BasicNetworkFactory {
        BasicNetworkFactory::new(Arc::new(AddressRegistry::new()), HeartbeatEngine::factory())
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn scenario_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), TOPOLOGY_FILENAME, TOPOLOGY);
        write(
            dir.path(),
            "nodeA.json",
            r#"{
                "region": "east",
                "pool": true,
                "resource-report": {
                    "serverCapacity": { "CPU": 8, "MEMORY": 32, "QUANTUM": 1 },
                    "networkLoad": { "*": { "DATARATE": 5 } }
                }
            }"#,
        );
        write(dir.path(), "nodeB.json", r#"{ "region": "west" }"#);
        write(dir.path(), "clientC.json", r#"{ "client": true, "region": "west" }"#);
        dir
    }

    #[test]
    fn test_parse_scenario_directory() {
        let dir = scenario_dir();
        let graph = parse_directory(dir.path(), &factory()).unwrap();

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.clients().len(), 1);
        assert_eq!(graph.links().len(), 2);

        let node_a = graph.node("nodeA").unwrap();
        assert_eq!(node_a.region(), RegionIdentifier::new("east"));
        assert!(node_a.is_pool());
        assert_eq!(node_a.handle().hardware().as_deref(), Some("UBUNTU18-64-STD"));

        let node_b = graph.node("nodeB").unwrap();
        let neighbors = node_b.handle().neighbors();
        assert_eq!(neighbors[&NodeIdentifier::new("nodeA")], 100.0 * 1024.0 * 1024.0);
        assert_eq!(neighbors[&NodeIdentifier::new("clientC")], 512.0 * 1024.0);

        let client = graph.client("clientC").unwrap();
        assert_eq!(client.region(), RegionIdentifier::new("west"));
        assert!(client.handle().has_neighbor(&NodeIdentifier::new("nodeB")));

        assert_eq!(graph.regions(), vec![RegionIdentifier::new("east"), RegionIdentifier::new("west")]);
    }

    #[test]
    fn test_node_document_feeds_resource_report() {
        let dir = scenario_dir();
        let graph = parse_directory(dir.path(), &factory()).unwrap();

        let report = graph
            .node("nodeA")
            .unwrap()
            .current_resource_report(EstimationWindow::Short);
        assert_eq!(report.server_capacity().len(), 2);
        assert_eq!(report.server_capacity()[&NodeAttribute::Cpu], 8.0);
        assert_eq!(report.server_capacity()[&NodeAttribute::Memory], 32.0);

        let neighbor = NodeIdentifier::new("nodeB");
        assert_eq!(report.network_load()[&neighbor][&LinkAttribute::Datarate], 5.0);
        assert_eq!(
            report.network_capacity()[&neighbor][&LinkAttribute::Datarate],
            100.0 * 1024.0 * 1024.0
        );
    }

    #[test]
    fn test_missing_node_documents_default_to_null_region() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), TOPOLOGY_FILENAME, TOPOLOGY);

        let graph = parse_directory(dir.path(), &factory()).unwrap();
        assert_eq!(graph.nodes().len(), 3);
        assert!(graph.clients().is_empty());
        assert!(graph.node("nodeA").unwrap().region().is_null());
    }

    #[test]
    fn test_broken_node_document_aborts_parse() {
        let dir = scenario_dir();
        write(dir.path(), "nodeB.json", "{ not json");

        let err = parse_directory(dir.path(), &factory()).unwrap_err();
        assert!(matches!(err, FormatError::NodeConfig { ref node, .. } if node == "nodeB"));
    }

    #[test]
    fn test_missing_topology_file() {
        let dir = TempDir::new().unwrap();
        let err = parse_directory(dir.path(), &factory()).unwrap_err();
        assert!(matches!(err, FormatError::Io { .. }));
    }
}
