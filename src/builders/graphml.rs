//! Minimal GraphML reader for molecular network edges

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::BuildError;

/// An edge with its data values keyed by attribute name
#[derive(Debug, Clone, PartialEq)]
pub struct GraphmlEdge {
    pub source: String,
    pub target: String,
    pub data: HashMap<String, String>,
}

impl GraphmlEdge {
    /// Numeric value of an edge attribute
    pub fn float(&self, name: &str) -> Option<f64> {
        self.data
            .get(name)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

/// Read every edge of a GraphML file; `Ok(None)` when the file is absent
pub fn read_edges(path: &Path) -> Result<Option<Vec<GraphmlEdge>>, BuildError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    parse_edges(BufReader::new(file)).map(Some)
}

fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, BuildError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| BuildError::XmlError(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)?.to_string();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Parse edges from GraphML.
///
/// `<key>` declarations map data ids to attribute names; edges may appear
/// as empty elements or carry `<data>` children.
pub fn parse_edges<R: BufRead>(reader: R) -> Result<Vec<GraphmlEdge>, BuildError> {
    let mut reader = Reader::from_reader(reader);
    reader.config_mut().trim_text(true);

    let mut key_names: HashMap<String, String> = HashMap::new();
    let mut edges = Vec::new();
    let mut current: Option<GraphmlEdge> = None;
    let mut data_key: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"key" => register_key(e, &mut key_names)?,
                b"edge" => current = Some(start_edge(e)?),
                b"data" if current.is_some() => data_key = get_attribute(e, "key")?,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"key" => register_key(e, &mut key_names)?,
                b"edge" => edges.push(start_edge(e)?),
                _ => {}
            },
            Ok(Event::Text(ref t)) => {
                if let (Some(edge), Some(key)) = (current.as_mut(), data_key.as_ref()) {
                    let name = key_names.get(key).cloned().unwrap_or_else(|| key.clone());
                    edge.data.insert(name, t.unescape()?.into_owned());
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"data" => data_key = None,
                b"edge" => {
                    if let Some(edge) = current.take() {
                        edges.push(edge);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(BuildError::XmlError(e)),
            _ => {}
        }
        buf.clear();
    }

    if current.is_some() {
        return Err(BuildError::InvalidGraphml("unterminated <edge>".to_string()));
    }
    Ok(edges)
}

fn register_key(e: &BytesStart, key_names: &mut HashMap<String, String>) -> Result<(), BuildError> {
    if let (Some(id), Some(name)) = (get_attribute(e, "id")?, get_attribute(e, "attr.name")?) {
        key_names.insert(id, name);
    }
    Ok(())
}

fn start_edge(e: &BytesStart) -> Result<GraphmlEdge, BuildError> {
    let source = get_attribute(e, "source")?
        .ok_or_else(|| BuildError::InvalidGraphml("edge without source".to_string()))?;
    let target = get_attribute(e, "target")?
        .ok_or_else(|| BuildError::InvalidGraphml("edge without target".to_string()))?;
    Ok(GraphmlEdge {
        source,
        target,
        data: HashMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPHML: &str = r#"<?xml version='1.0' encoding='utf-8'?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="edge" attr.name="weight" attr.type="double"/>
  <key id="d1" for="edge" attr.name="deltamz" attr.type="double"/>
  <graph edgedefault="undirected">
    <node id="1"/>
    <node id="2"/>
    <edge source="1" target="2">
      <data key="d0">0.85</data>
      <data key="d1">14.01</data>
    </edge>
    <edge source="2" target="3"/>
  </graph>
</graphml>"#;

    #[test]
    fn test_parse_edges() {
        let edges = parse_edges(GRAPHML.as_bytes()).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].source, "1");
        assert_eq!(edges[0].target, "2");
        assert_eq!(edges[0].float("weight"), Some(0.85));
        assert_eq!(edges[0].float("deltamz"), Some(14.01));
        assert_eq!(edges[1].float("weight"), None);
    }

    #[test]
    fn test_edge_without_target_is_invalid() {
        let xml = r#"<graphml><graph><edge source="1"/></graph></graphml>"#;
        assert!(matches!(
            parse_edges(xml.as_bytes()),
            Err(BuildError::InvalidGraphml(_))
        ));
    }

    #[test]
    fn test_attribute_values_read_verbatim() {
        let xml = r#"<graphml><key id="d0" for="edge" attr.name="cosine score"/><graph><edge source="n&#49;" target="2"><data key="d0">0.5</data></edge></graph></graphml>"#;
        let edges = parse_edges(xml.as_bytes()).unwrap();
        assert_eq!(edges[0].source, "n&#49;");
        assert_eq!(edges[0].float("cosine score"), Some(0.5));
    }

    #[test]
    fn test_non_utf8_attribute_is_an_error() {
        let mut xml = b"<graphml><graph><edge source=\"".to_vec();
        xml.push(0xff);
        xml.extend_from_slice(b"\" target=\"2\"/></graph></graphml>");
        assert!(matches!(
            parse_edges(xml.as_slice()),
            Err(BuildError::Utf8Error(_)) | Err(BuildError::XmlError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_edges(&dir.path().join("none.graphml")).unwrap().is_none());
    }
}
