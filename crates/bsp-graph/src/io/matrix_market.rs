//! Matrix Market coordinate reader
//!
//! Accepts `%%MatrixMarket matrix coordinate <field> <symmetry>` with field
//! `pattern`, `integer` or `real` and symmetry `general` or `symmetric`.
//! Entry `i j [w]` is the directed edge from vertex `i` to vertex `j`, both
//! 1-based. A symmetric file adds the reverse of every off-diagonal entry.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::pregel::{GraphBuilder, PregelError, Topology, VertexId};

/// Upper bound on edges reserved from the size line alone
const MAX_RESERVED_EDGES: usize = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Pattern,
    Weighted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symmetry {
    General,
    Symmetric,
}

fn parse_header(line: &str) -> Result<(Field, Symmetry), PregelError> {
    let tokens: Vec<String> = line.split_whitespace().map(str::to_ascii_lowercase).collect();
    let [banner, object, format, field, symmetry] = tokens.as_slice() else {
        return Err(PregelError::graph_format(1, "expected a five-token %%MatrixMarket header"));
    };
    if banner != "%%matrixmarket" || object != "matrix" || format != "coordinate" {
        return Err(PregelError::graph_format(
            1,
            "only '%%MatrixMarket matrix coordinate' files are supported",
        ));
    }
    let field = match field.as_str() {
        "pattern" => Field::Pattern,
        "integer" | "real" | "double" => Field::Weighted,
        other => {
            return Err(PregelError::graph_format(1, format!("unsupported field '{other}'")))
        }
    };
    let symmetry = match symmetry.as_str() {
        "general" => Symmetry::General,
        "symmetric" => Symmetry::Symmetric,
        other => {
            return Err(PregelError::graph_format(
                1,
                format!("unsupported symmetry '{other}'"),
            ))
        }
    };
    Ok((field, symmetry))
}

fn parse_number<T: std::str::FromStr>(
    token: Option<&str>,
    line: usize,
    what: &str,
) -> Result<T, PregelError> {
    let token = token.ok_or_else(|| PregelError::graph_format(line, format!("missing {what}")))?;
    token
        .parse()
        .map_err(|_| PregelError::graph_format(line, format!("invalid {what} '{token}'")))
}

fn parse_vertex(token: Option<&str>, line: usize, vertex_count: usize) -> Result<VertexId, PregelError> {
    let external: u64 = parse_number(token, line, "vertex id")?;
    VertexId::from_external(external)
        .filter(|v| v.index() < vertex_count)
        .ok_or_else(|| {
            PregelError::graph_format(
                line,
                format!("vertex id {external} outside 1..={vertex_count}"),
            )
        })
}

/// Read a coordinate file into a builder
pub fn read_matrix_market<R: BufRead>(reader: R) -> Result<GraphBuilder, PregelError> {
    let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));

    let (field, symmetry) = match lines.next() {
        Some((_, line)) => parse_header(&line?)?,
        None => return Err(PregelError::graph_format(1, "empty input")),
    };

    let mut builder = GraphBuilder::new(0);
    let mut size: Option<(usize, usize)> = None;
    let mut entries = 0usize;
    let mut last_line = 1;

    for (number, line) in lines {
        let line = line?;
        last_line = number;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();

        let Some((vertex_count, _)) = size else {
            let rows: usize = parse_number(tokens.next(), number, "row count")?;
            let cols: usize = parse_number(tokens.next(), number, "column count")?;
            let declared: usize = parse_number(tokens.next(), number, "entry count")?;
            let vertex_count = rows.max(cols);
            if u32::try_from(vertex_count).is_err() {
                return Err(PregelError::graph_format(
                    number,
                    format!("{vertex_count} vertices exceed the 32-bit id space"),
                ));
            }
            let edges = match symmetry {
                Symmetry::General => Some(declared),
                Symmetry::Symmetric => declared.checked_mul(2),
            }
            .ok_or_else(|| {
                PregelError::graph_format(number, format!("entry count {declared} is too large"))
            })?;
            builder = GraphBuilder::new(vertex_count);
            // the declared count is untrusted until the entries are read
            builder.reserve(edges.min(MAX_RESERVED_EDGES));
            size = Some((vertex_count, declared));
            continue;
        };

        let src = parse_vertex(tokens.next(), number, vertex_count)?;
        let dst = parse_vertex(tokens.next(), number, vertex_count)?;
        let weight = match field {
            Field::Pattern => None,
            Field::Weighted => {
                let w: f64 = parse_number(tokens.next(), number, "edge weight")?;
                if !w.is_finite() {
                    return Err(PregelError::graph_format(
                        number,
                        format!("edge weight {w} is not finite"),
                    ));
                }
                Some(w)
            }
        };

        let reverse = symmetry == Symmetry::Symmetric && src != dst;
        match weight {
            Some(w) => {
                builder.add_weighted_edge(src, dst, w)?;
                if reverse {
                    builder.add_weighted_edge(dst, src, w)?;
                }
            }
            None => {
                builder.add_edge(src, dst)?;
                if reverse {
                    builder.add_edge(dst, src)?;
                }
            }
        }
        entries += 1;
    }

    let Some((_, declared)) = size else {
        return Err(PregelError::graph_format(last_line, "missing size line"));
    };
    if entries != declared {
        return Err(PregelError::graph_format(
            last_line,
            format!("size line declares {declared} entries, found {entries}"),
        ));
    }
    Ok(builder)
}

/// Load a Matrix Market file split into `partitions` vertex blocks
pub fn load_matrix_market(path: &Path, partitions: usize) -> Result<Topology, PregelError> {
    let file = File::open(path)?;
    let topology = read_matrix_market(BufReader::new(file))?
        .with_partitions(partitions)
        .build();

    info!(
        path = %path.display(),
        vertices = topology.vertex_count(),
        edges = topology.edge_count(),
        weighted = topology.is_weighted(),
        "Graph loaded"
    );
    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn read(text: &str) -> Result<Topology, PregelError> {
        read_matrix_market(Cursor::new(text)).map(GraphBuilder::build)
    }

    #[test]
    fn test_general_pattern() {
        let topology = read(
            "%%MatrixMarket matrix coordinate pattern general\n\
             % a comment\n\
             3 3 2\n\
             1 2\n\
             3 1\n",
        )
        .unwrap();

        assert_eq!(topology.vertex_count(), 3);
        assert_eq!(topology.edge_count(), 2);
        assert!(!topology.is_weighted());
        let targets: Vec<_> = topology.out_edges(VertexId(2)).map(|(v, _)| v).collect();
        assert_eq!(targets, vec![VertexId(0)]);
    }

    #[test]
    fn test_symmetric_real_adds_reverse_edges() {
        let topology = read(
            "%%MatrixMarket matrix coordinate real symmetric\n\
             4 4 3\n\
             2 1 0.5\n\
             3 3 1.0\n\
             4 2 2.0\n",
        )
        .unwrap();

        // diagonal entry stored once
        assert_eq!(topology.edge_count(), 5);
        assert!(topology.is_weighted());
        let from_one: Vec<_> = topology.out_edges(VertexId(0)).collect();
        assert_eq!(from_one, vec![(VertexId(1), 0.5)]);
    }

    #[test]
    fn test_vertex_count_is_larger_dimension() {
        let topology =
            read("%%MatrixMarket matrix coordinate pattern general\n2 5 1\n1 5\n").unwrap();
        assert_eq!(topology.vertex_count(), 5);
    }

    #[test]
    fn test_bad_header() {
        let err = read("%%MatrixMarket matrix array real general\n1 1\n").unwrap_err();
        assert!(matches!(err, PregelError::GraphFormat { line: 1, .. }));
    }

    #[test]
    fn test_out_of_range_vertex_reports_line() {
        let err = read("%%MatrixMarket matrix coordinate pattern general\n2 2 1\n1 3\n")
            .unwrap_err();
        match err {
            PregelError::GraphFormat { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("outside 1..=2"));
            }
            other => panic!("Wrong error type: {other:?}"),
        }
    }

    #[test]
    fn test_missing_weight() {
        let err = read("%%MatrixMarket matrix coordinate integer general\n2 2 1\n1 2\n")
            .unwrap_err();
        assert!(matches!(err, PregelError::GraphFormat { line: 3, .. }));
    }

    #[test]
    fn test_non_finite_weight_reports_line() {
        for weight in ["NaN", "inf", "-inf"] {
            let text = format!(
                "%%MatrixMarket matrix coordinate real general\n2 2 2\n1 2 1.0\n2 1 {weight}\n"
            );
            let err = read(&text).unwrap_err();
            assert!(
                matches!(err, PregelError::GraphFormat { line: 4, .. }),
                "{weight}: {err:?}"
            );
        }
    }

    #[test]
    fn test_overflowing_entry_count_is_an_error() {
        let err = read("%%MatrixMarket matrix coordinate pattern symmetric\n3 3 18446744073709551615\n")
            .unwrap_err();
        match err {
            PregelError::GraphFormat { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("too large"));
            }
            other => panic!("Wrong error type: {other:?}"),
        }
    }

    #[test]
    fn test_huge_entry_count_does_not_preallocate() {
        let err = read("%%MatrixMarket matrix coordinate pattern general\n3 3 100000000000000\n1 2\n")
            .unwrap_err();
        match err {
            PregelError::GraphFormat { message, .. } => {
                assert!(message.contains("declares 100000000000000 entries, found 1"));
            }
            other => panic!("Wrong error type: {other:?}"),
        }
    }

    #[test]
    fn test_entry_count_mismatch() {
        let err = read("%%MatrixMarket matrix coordinate pattern general\n2 2 2\n1 2\n")
            .unwrap_err();
        assert!(matches!(err, PregelError::GraphFormat { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "%%MatrixMarket matrix coordinate pattern general\n3 3 2\n1 2\n2 3\n"
        )
        .unwrap();

        let topology = load_matrix_market(file.path(), 2).unwrap();
        assert_eq!(topology.vertex_count(), 3);
        assert_eq!(topology.partitions(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = load_matrix_market(Path::new("/definitely/not/here.mtx"), 1).unwrap_err();
        assert!(matches!(err, PregelError::Io(_)));
    }
}
