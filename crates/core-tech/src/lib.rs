//! Technology-file loading: parses a TOML technology description into a
//! [`core_tile::types::TypeTable`] and a [`rules::RuleTable`], then runs
//! the post-load optimization pass that collapses dominated plowing
//! rules.
//!
//! The textual grammar is deliberately TOML rather than the line-oriented
//! technology-file format layout tools traditionally use; parsing that
//! legacy grammar is an explicit non-goal. This module resolves the same
//! information (types, connectivity, contact stacking, DRC cookies,
//! plowing width/spacing) the traditional loader would.

pub mod rules;

use core_tile::types::{PlaneId, TileType, TypeTable};
use core_tile::Coord;
use rules::{CookieFlags, DrcCookie, PlowRule, RuleTable};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TechError {
    #[error("failed to read technology file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse technology file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("rule references undefined type {0:?}")]
    UnknownType(String),
}

pub type Result<T> = std::result::Result<T, TechError>;

#[derive(Debug, Deserialize, Default)]
struct TechFile {
    #[serde(default)]
    types: Vec<TypeEntry>,
    #[serde(default)]
    connect: Vec<PairEntry>,
    #[serde(default)]
    stack: Vec<PairEntry>,
    #[serde(default)]
    drc: DrcSection,
    #[serde(default)]
    plow: PlowSection,
}

#[derive(Debug, Deserialize)]
struct TypeEntry {
    name: String,
    plane: String,
    #[serde(default)]
    fixed: bool,
    #[serde(default)]
    covered: bool,
    #[serde(default)]
    drag: bool,
    #[serde(default)]
    residues: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PairEntry {
    a: String,
    b: String,
}

#[derive(Debug, Deserialize, Default)]
struct DrcSection {
    #[serde(default)]
    rule: Vec<DrcRuleEntry>,
}

/// What a DRC rule entry checks. `Spacing` is the ordinary pairwise edge
/// rule `basic_check` evaluates; the rest select one of the whole-region
/// scanners, evaluated once per connected component of `left`.
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum DrcRuleKind {
    #[default]
    Spacing,
    Area,
    MaxwidthBendsIllegal,
    MaxwidthWithBends,
    RectSize,
}

#[derive(Debug, Deserialize)]
struct DrcRuleEntry {
    left: String,
    right: String,
    #[serde(default)]
    distance: Coord,
    #[serde(default)]
    corner_distance: Option<Coord>,
    #[serde(default)]
    both_corners: bool,
    #[serde(default)]
    outside: bool,
    #[serde(default)]
    why: String,
    #[serde(default)]
    kind: DrcRuleKind,
    /// Area threshold (`kind = "area"`) or narrow-width threshold
    /// (`kind = "maxwidth_*"`).
    #[serde(default)]
    limit: Coord,
    #[serde(default)]
    min_size: Option<[Coord; 2]>,
    #[serde(default)]
    max_size: Option<[Coord; 2]>,
    /// Plane the reported violation is tagged with. Defaults to the
    /// right-hand type's own plane, so a cross-plane contact rule (e.g.
    /// a via spacing rule checked against the metal plane it lands on)
    /// can report against the plane that actually needs re-checking.
    #[serde(default)]
    check_plane: Option<String>,
    /// Types that satisfy the rule at the extended corner look-ahead.
    /// Defaults to the same set as the ordinary near-side check.
    #[serde(default)]
    corner_ok: Vec<String>,
    /// A secondary rule that only applies once this one has already
    /// fired (`CookieFlags::TRIGGER`).
    #[serde(default)]
    trigger: Option<Box<DrcRuleEntry>>,
}

#[derive(Debug, Deserialize, Default)]
struct PlowSection {
    #[serde(default)]
    width: Vec<PlowRuleEntry>,
    #[serde(default)]
    spacing: Vec<PlowRuleEntry>,
}

#[derive(Debug, Deserialize)]
struct PlowRuleEntry {
    types: Vec<String>,
    #[serde(default)]
    other: Vec<String>,
    distance: Coord,
}

/// A fully resolved technology: the type catalog plus its rule table.
pub struct Technology {
    pub types: TypeTable,
    pub rules: RuleTable,
    name_to_type: HashMap<String, TileType>,
    name_to_plane: HashMap<String, PlaneId>,
}

impl Technology {
    pub fn type_named(&self, name: &str) -> Option<TileType> {
        self.name_to_type.get(name).copied()
    }

    pub fn plane_named(&self, name: &str) -> Option<PlaneId> {
        self.name_to_plane.get(name).copied()
    }
}

/// Parse and resolve a technology file already read into memory.
pub fn load_str(text: &str) -> Result<Technology> {
    let file: TechFile = toml::from_str(text)?;
    build(file)
}

/// Load a technology file from disk.
pub fn load_from(path: impl AsRef<Path>) -> Result<Technology> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| TechError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(target: "tech", path = %path.display(), "loading technology file");
    load_str(&text)
}

fn build(file: TechFile) -> Result<Technology> {
    let mut types = TypeTable::new();
    let mut name_to_type = HashMap::new();
    let mut name_to_plane = HashMap::new();
    let mut next_plane = 0u16;
    let mut next_type = 1u16; // 0 is TileType::SPACE

    for entry in &file.types {
        let plane = *name_to_plane.entry(entry.plane.clone()).or_insert_with(|| {
            let id = PlaneId(next_plane);
            next_plane += 1;
            id
        });
        let t = TileType(next_type);
        next_type += 1;
        types.define_type(t, entry.name.clone(), plane);
        if entry.fixed {
            types.mark_fixed(t);
        }
        if entry.covered {
            types.mark_covered(t);
        }
        if entry.drag {
            types.mark_drag(t);
        }
        name_to_type.insert(entry.name.clone(), t);
    }

    // Residues reference types that must already be defined above, so
    // resolved in a second pass.
    for entry in &file.types {
        if entry.residues.is_empty() {
            continue;
        }
        let contact = *name_to_type
            .get(&entry.name)
            .ok_or_else(|| TechError::UnknownType(entry.name.clone()))?;
        let residues = entry
            .residues
            .iter()
            .map(|n| name_to_type.get(n).copied().ok_or_else(|| TechError::UnknownType(n.clone())))
            .collect::<Result<Vec<_>>>()?;
        types.set_residues(contact, residues);
    }

    for pair in &file.connect {
        let a = resolve(&name_to_type, &pair.a)?;
        let b = resolve(&name_to_type, &pair.b)?;
        types.set_connects(a, b);
    }
    for pair in &file.stack {
        let a = resolve(&name_to_type, &pair.a)?;
        let b = resolve(&name_to_type, &pair.b)?;
        types.set_stacking(a, b);
    }

    let mut rules = RuleTable::new();
    for rule in &file.drc.rule {
        let left = resolve(&name_to_type, &rule.left)?;
        let right = resolve(&name_to_type, &rule.right)?;
        let cookie = build_cookie(rule, &name_to_type, &name_to_plane, &types)?;
        rules.add_drc_cookie(left, right, cookie);
    }

    for entry in &file.plow.width {
        rules.add_plow_width(PlowRule {
            types: resolve_mask(&name_to_type, &entry.types)?,
            other: None,
            distance: entry.distance,
        });
    }
    for entry in &file.plow.spacing {
        let other = if entry.other.is_empty() {
            None
        } else {
            Some(resolve_mask(&name_to_type, &entry.other)?)
        };
        rules.add_plow_spacing(PlowRule {
            types: resolve_mask(&name_to_type, &entry.types)?,
            other,
            distance: entry.distance,
        });
    }
    rules.optimize();
    tracing::info!(
        target: "tech",
        types = name_to_type.len(),
        "technology resolved and plowing rules optimized",
    );

    Ok(Technology {
        types,
        rules,
        name_to_type,
        name_to_plane,
    })
}

/// Resolves one `[[drc.rule]]` entry (and, recursively, its nested
/// `trigger` rule, if any) into a [`DrcCookie`].
fn build_cookie(
    rule: &DrcRuleEntry,
    name_to_type: &HashMap<String, TileType>,
    name_to_plane: &HashMap<String, PlaneId>,
    types: &TypeTable,
) -> Result<DrcCookie> {
    let left = resolve(name_to_type, &rule.left)?;
    let right = resolve(name_to_type, &rule.right)?;
    let edge_plane = types.plane_of(left).unwrap_or(PlaneId(0));
    let check_plane = match &rule.check_plane {
        Some(name) => *name_to_plane.get(name).ok_or_else(|| TechError::UnknownType(name.clone()))?,
        None => types.plane_of(right).unwrap_or(edge_plane),
    };

    let mut flags = CookieFlags::empty();
    if rule.both_corners {
        flags |= CookieFlags::BOTH_CORNERS;
    }
    if rule.outside {
        flags |= CookieFlags::OUTSIDE;
    }
    match rule.kind {
        DrcRuleKind::Spacing => {}
        DrcRuleKind::Area => flags |= CookieFlags::AREA,
        DrcRuleKind::MaxwidthBendsIllegal => flags |= CookieFlags::MAXWIDTH | CookieFlags::BENDS_ILLEGAL,
        DrcRuleKind::MaxwidthWithBends => flags |= CookieFlags::MAXWIDTH,
        DrcRuleKind::RectSize => flags |= CookieFlags::RECT_SIZE,
    }

    let corner_mask = if rule.corner_ok.is_empty() {
        types.connects_to(left)
    } else {
        resolve_mask(name_to_type, &rule.corner_ok)?
    };

    let trigger_of = match &rule.trigger {
        Some(t) => {
            flags |= CookieFlags::TRIGGER;
            Some(Box::new(build_cookie(t, name_to_type, name_to_plane, types)?))
        }
        None => None,
    };

    Ok(DrcCookie {
        distance: rule.distance,
        corner_distance: rule.corner_distance.unwrap_or(rule.distance),
        ok_mask: types.connects_to(left),
        corner_mask,
        edge_plane,
        check_plane,
        flags,
        region_limit: rule.limit,
        min_size: rule.min_size.map(|[w, h]| (w, h)).unwrap_or((0, 0)),
        max_size: rule.max_size.map(|[w, h]| (w, h)).unwrap_or((core_tile::INFINITY, core_tile::INFINITY)),
        why: if rule.why.is_empty() {
            format!("{}-{} spacing", rule.left, rule.right)
        } else {
            rule.why.clone()
        },
        trigger_of,
    })
}

fn resolve(table: &HashMap<String, TileType>, name: &str) -> Result<TileType> {
    table.get(name).copied().ok_or_else(|| TechError::UnknownType(name.to_string()))
}

fn resolve_mask(table: &HashMap<String, TileType>, names: &[String]) -> Result<core_tile::types::TypeMask> {
    names.iter().map(|n| resolve(table, n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[types]]
        name = "metal1"
        plane = "metal"

        [[types]]
        name = "metal2"
        plane = "metal"

        [[types]]
        name = "via1"
        plane = "via"
        residues = ["metal1", "metal2"]

        [[connect]]
        a = "via1"
        b = "metal1"

        [[drc.rule]]
        left = "metal1"
        right = "metal1"
        distance = 3
        why = "metal1 spacing"

        [[plow.width]]
        types = ["metal1"]
        distance = 2

        [[plow.spacing]]
        types = ["metal1"]
        other = ["metal2"]
        distance = 3
    "#;

    #[test]
    fn loads_types_and_resolves_residues() {
        let tech = load_str(SAMPLE).unwrap();
        let via = tech.type_named("via1").unwrap();
        let m1 = tech.type_named("metal1").unwrap();
        assert_eq!(tech.types.residues(via), &[m1, tech.type_named("metal2").unwrap()]);
        assert!(tech.types.connect(via, m1));
    }

    #[test]
    fn loads_drc_and_plow_rules() {
        let tech = load_str(SAMPLE).unwrap();
        let m1 = tech.type_named("metal1").unwrap();
        let m2 = tech.type_named("metal2").unwrap();
        assert_eq!(tech.rules.drc_cookies(m1, m1).len(), 1);
        assert_eq!(tech.rules.plow_width_for(m1), 2);
        assert_eq!(tech.rules.plow_spacing_for(m1, m2), 3);
    }

    #[test]
    fn unknown_type_in_rule_is_an_error() {
        let bad = SAMPLE.replace("metal1\"\nright", "ghost\"\nright");
        assert!(load_str(&bad).is_err());
    }
}
