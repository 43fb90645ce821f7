//! Minimal PDB emission for structure snapshots and trajectories.
//!
//! Only what downstream visualization needs is written: a CRYST1 record
//! derived from the periodic box vectors and fixed-width ATOM records.
//! Trajectories are multi-MODEL files with one MODEL block per frame.

use crate::core::models::snapshot::Snapshot;
use crate::core::models::topology::Topology;
use nalgebra::Vector3;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Box edge lengths (Å) and angles (degrees) from the periodic box vectors.
fn cell_parameters(box_vectors: &[[f64; 3]; 3]) -> ([f64; 3], [f64; 3]) {
    let a = Vector3::from(box_vectors[0]);
    let b = Vector3::from(box_vectors[1]);
    let c = Vector3::from(box_vectors[2]);
    let lengths = [a.norm(), b.norm(), c.norm()];
    let angle = |u: &Vector3<f64>, v: &Vector3<f64>| {
        (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0).acos().to_degrees()
    };
    let angles = [angle(&b, &c), angle(&a, &c), angle(&a, &b)];
    (lengths, angles)
}

fn write_cryst1(writer: &mut impl Write, box_vectors: &[[f64; 3]; 3]) -> io::Result<()> {
    let (lengths, angles) = cell_parameters(box_vectors);
    writeln!(
        writer,
        "CRYST1{:9.3}{:9.3}{:9.3}{:7.2}{:7.2}{:7.2} P 1           1",
        lengths[0], lengths[1], lengths[2], angles[0], angles[1], angles[2]
    )
}

fn write_atoms(writer: &mut impl Write, topology: &Topology, snapshot: &Snapshot) -> io::Result<()> {
    for (index, (atom, position)) in topology.atoms.iter().zip(&snapshot.positions).enumerate() {
        // Short atom names start at column 14 by PDB convention.
        let name = if atom.name.len() >= 4 {
            atom.name.clone()
        } else {
            format!(" {:<3}", atom.name)
        };
        writeln!(
            writer,
            "ATOM  {:>5} {:<4} {:>3} {}{:>4}    {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}",
            (index + 1) % 100_000,
            name,
            atom.residue_name,
            atom.chain_id,
            atom.residue_seq.rem_euclid(10_000),
            position[0],
            position[1],
            position[2],
            1.00,
            0.00,
            atom.element,
        )?;
    }
    Ok(())
}

/// Writes a single-frame structure snapshot.
pub fn write_structure(path: &Path, topology: &Topology, snapshot: &Snapshot) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_cryst1(&mut writer, &snapshot.box_vectors)?;
    write_atoms(&mut writer, topology, snapshot)?;
    writeln!(writer, "END")?;
    writer.flush()
}

/// Append-only multi-MODEL trajectory, one frame per sampling interval.
pub struct TrajectoryWriter {
    writer: BufWriter<File>,
    frames: usize,
}

impl TrajectoryWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            frames: 0,
        })
    }

    /// Number of frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn append_frame(&mut self, topology: &Topology, snapshot: &Snapshot) -> io::Result<()> {
        self.frames += 1;
        writeln!(self.writer, "MODEL     {:>4}", self.frames)?;
        write_cryst1(&mut self.writer, &snapshot.box_vectors)?;
        write_atoms(&mut self.writer, topology, snapshot)?;
        writeln!(self.writer, "ENDMDL")?;
        self.writer.flush()
    }
}
