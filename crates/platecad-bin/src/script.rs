//! The batch script format `platecad` runs: an ordered list of paint,
//! erase, placement, DRC-check, and plow operations against cells that
//! are created the first time they're named. Not an interactive shell;
//! see the crate-level docs.

use anyhow::{bail, Context, Result};
use core_cell::{CellDefId, CellLibrary, Orientation};
use core_tile::{Coord, Rect};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ScriptFile {
    #[serde(default)]
    pub ops: Vec<Op>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Paint {
        cell: String,
        plane: String,
        #[serde(rename = "type")]
        ttype: String,
        rect: [Coord; 4],
    },
    Erase {
        cell: String,
        plane: String,
        rect: [Coord; 4],
    },
    Place {
        parent: String,
        child: String,
        #[serde(default)]
        orientation: String,
        #[serde(default)]
        dx: Coord,
        #[serde(default)]
        dy: Coord,
    },
    Check {
        cell: String,
        plane: String,
        rect: [Coord; 4],
    },
    Plow {
        cell: String,
        plane: String,
        direction: String,
        rect: [Coord; 4],
        distance: Coord,
    },
}

pub fn load(path: impl AsRef<Path>) -> Result<ScriptFile> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let file: ScriptFile = toml::from_str(&text)
        .with_context(|| format!("failed to parse script {}", path.display()))?;
    Ok(file)
}

pub fn rect_of(raw: [Coord; 4]) -> Rect {
    Rect::new(raw[0], raw[1], raw[2], raw[3])
}

pub fn parse_orientation(name: &str) -> Result<Orientation> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "" | "r0" => Orientation::R0,
        "r90" => Orientation::R90,
        "r180" => Orientation::R180,
        "r270" => Orientation::R270,
        "mirrorx" => Orientation::MirrorX,
        "mirrorx90" => Orientation::MirrorX90,
        "mirrory" => Orientation::MirrorY,
        "mirrory90" => Orientation::MirrorY90,
        other => bail!("unknown orientation {other:?}"),
    })
}

pub fn parse_direction(name: &str) -> Result<core_plow::Direction> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "north" => core_plow::Direction::North,
        "south" => core_plow::Direction::South,
        "east" => core_plow::Direction::East,
        "west" => core_plow::Direction::West,
        other => bail!("unknown plow direction {other:?}"),
    })
}

/// Finds the named cell, defining an empty one the first time it's seen.
pub fn cell_named(lib: &mut CellLibrary, name: &str) -> CellDefId {
    match lib.by_name(name) {
        Some(id) => id,
        None => lib.define(core_cell::CellDef::new(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ops_in_file_order() {
        let file: ScriptFile = toml::from_str(
            r#"
            [[ops]]
            op = "paint"
            cell = "top"
            plane = "metal"
            type = "metal1"
            rect = [0, 0, 10, 10]

            [[ops]]
            op = "plow"
            cell = "top"
            plane = "metal"
            direction = "east"
            rect = [0, 0, 10, 10]
            distance = 5
        "#,
        )
        .unwrap();

        assert_eq!(file.ops.len(), 2);
        assert!(matches!(file.ops[0], Op::Paint { .. }));
        assert!(matches!(file.ops[1], Op::Plow { .. }));
    }

    #[test]
    fn cell_named_reuses_an_existing_definition() {
        let mut lib = CellLibrary::new();
        let a = cell_named(&mut lib, "top");
        let b = cell_named(&mut lib, "top");
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_orientation_is_rejected() {
        assert!(parse_orientation("diagonal").is_err());
    }
}
