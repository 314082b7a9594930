#![no_main]

use libfuzzer_sys::fuzz_target;
use mzgraph::graph::GraphStore;

fuzz_target!(|data: &[u8]| {
    // Parsing must either succeed or return an error, never panic
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(graph) = GraphStore::parse(text) {
        // Whatever parsed must survive a serialize/parse cycle unchanged
        let reparsed = GraphStore::parse(&graph.serialize())
            .expect("serialized output must parse");
        assert_eq!(graph.distinct(), reparsed.distinct());
    }
});
