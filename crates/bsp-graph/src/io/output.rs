//! Two-column result writer
//!
//! One `id value` line per vertex in id order, ids 1-based. Unreached BFS
//! vertices print `i64::MAX`, unreachable SSSP vertices print `inf`, and
//! component or community labels print as vertex ids.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::algorithms::{AlgorithmOutput, UNREACHED};
use crate::pregel::{PregelError, VertexId};

/// Printed for vertices BFS never reached
pub const UNREACHED_SENTINEL: i64 = i64::MAX;

/// Write `output` to `writer`
pub fn write_output<W: Write>(output: &AlgorithmOutput, writer: W) -> io::Result<()> {
    let mut w = BufWriter::new(writer);
    let rows = (0..output.len() as u32).map(VertexId);

    match output {
        AlgorithmOutput::Depths(depths) => {
            for (v, depth) in rows.zip(depths) {
                if *depth == UNREACHED {
                    writeln!(w, "{} {}", v.external(), UNREACHED_SENTINEL)?;
                } else {
                    writeln!(w, "{} {}", v.external(), depth)?;
                }
            }
        }
        AlgorithmOutput::Distances(values) | AlgorithmOutput::Scores(values) => {
            for (v, value) in rows.zip(values) {
                writeln!(w, "{} {}", v.external(), value)?;
            }
        }
        AlgorithmOutput::Labels(labels) => {
            for (v, label) in rows.zip(labels) {
                writeln!(w, "{} {}", v.external(), label.external())?;
            }
        }
    }
    w.flush()
}

/// Write `output` to a file, or to stdout when `path` is `-`
pub fn write_output_to(output: &AlgorithmOutput, path: &Path) -> Result<(), PregelError> {
    if path.as_os_str() == "-" {
        write_output(output, io::stdout().lock())?;
    } else {
        write_output(output, File::create(path)?)?;
    }
    Ok(())
}
