#![no_main]

use libfuzzer_sys::fuzz_target;
use mzgraph::builders::graphml::parse_edges;

fuzz_target!(|data: &[u8]| {
    // Malformed XML must come back as an error, never a panic
    if let Ok(edges) = parse_edges(data) {
        for edge in edges {
            let _ = edge.float("weight");
        }
    }
});
