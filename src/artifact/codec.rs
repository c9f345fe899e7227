//! Text layout of an [`EncodingArtifact`].
//!
//! The artifact is a set of named text sections addressed by relative path:
//!
//! ```text
//! model.ini
//! domains/d000.txt ...
//! feature_engineering/target_encoding/te_column_name_to_missing_values_presence.ini
//! feature_engineering/target_encoding/encoding_map.ini
//! ```
//!
//! `model.ini` holds the scalar metadata under `[info]` and one
//! `column = <levels> <file>` line per encoded column under `[domains]`. Each
//! domain file lists the training labels one per line, in category-id order.
//! The presence section has `column = 0|1` lines; the encoding map has a
//! `[column]` header followed by `category_id = sum count` lines.
//!
//! Columns and categories are written in sorted order and floats use the
//! shortest representation that parses back to the same value, so
//! write → read → write reproduces identical bytes. `model.ini` is written last.

use crate::artifact::{ColumnEncoding, EncodingArtifact};
use crate::dataset::CategoryId;
use crate::encoding::blending::BlendingParams;
use crate::encoding::stats::{CategoryStat, ColumnEncodingMap};
use crate::error::EncodingError;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MODEL_INI: &str = "model.ini";
pub const DOMAINS_DIR: &str = "domains";
pub const MISSING_VALUES_PRESENCE: &str =
    "feature_engineering/target_encoding/te_column_name_to_missing_values_presence.ini";
pub const ENCODING_MAP: &str = "feature_engineering/target_encoding/encoding_map.ini";

pub const ALGO: &str = "targetencoder";
pub const FORMAT_VERSION: &str = "1.00";

/// Destination for artifact sections.
pub trait SectionWriter {
    fn write_section(&mut self, path: &str, contents: &str) -> Result<(), EncodingError>;
}

/// Source of artifact sections.
pub trait SectionReader {
    /// # Errors
    /// [`EncodingError::MissingSection`] when no section exists at `path`.
    fn read_section(&self, path: &str) -> Result<String, EncodingError>;
}

/// Sections stored as files below a root directory.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SectionWriter for DirectoryStore {
    fn write_section(&mut self, path: &str, contents: &str) -> Result<(), EncodingError> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, contents)?;
        Ok(())
    }
}

impl SectionReader for DirectoryStore {
    fn read_section(&self, path: &str) -> Result<String, EncodingError> {
        match fs::read_to_string(self.root.join(path)) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(EncodingError::MissingSection(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Sections kept in memory, keyed by path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    sections: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &BTreeMap<String, String> {
        &self.sections
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.sections.get(path).map(String::as_str)
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.sections.remove(path)
    }
}

impl SectionWriter for MemoryStore {
    fn write_section(&mut self, path: &str, contents: &str) -> Result<(), EncodingError> {
        self.sections.insert(path.to_string(), contents.to_string());
        Ok(())
    }
}

impl SectionReader for MemoryStore {
    fn read_section(&self, path: &str) -> Result<String, EncodingError> {
        self.sections
            .get(path)
            .cloned()
            .ok_or_else(|| EncodingError::MissingSection(path.to_string()))
    }
}

fn domain_file_name(position: usize) -> String {
    format!("d{:03}.txt", position)
}

fn domain_path(file: &str) -> String {
    format!("{}/{}", DOMAINS_DIR, file)
}

fn has_line_break(s: &str) -> bool {
    s.contains('\n') || s.contains('\r')
}

fn check_writable(artifact: &EncodingArtifact) -> Result<(), EncodingError> {
    if !artifact.prior_mean.is_finite() {
        return Err(EncodingError::Serialization(format!(
            "prior mean {} is not finite",
            artifact.prior_mean
        )));
    }
    for (name, column) in &artifact.columns {
        if name.is_empty() || has_line_break(name) || name.contains(" = ") {
            return Err(EncodingError::Serialization(format!(
                "column name {:?} cannot be written to an artifact",
                name
            )));
        }
        if let Some(label) = column.domain().iter().find(|l| has_line_break(l)) {
            return Err(EncodingError::Serialization(format!(
                "label {:?} of column '{}' contains a line break",
                label, name
            )));
        }
    }
    Ok(())
}

/// Render every section of the artifact, keyed by path.
pub fn render_sections(artifact: &EncodingArtifact) -> Result<BTreeMap<String, String>, EncodingError> {
    check_writable(artifact)?;
    let mut sections = BTreeMap::new();

    let mut model = String::new();
    writeln!(model, "[info]").ok();
    writeln!(model, "algo = {}", ALGO).ok();
    writeln!(model, "format_version = {}", FORMAT_VERSION).ok();
    writeln!(model, "n_columns = {}", artifact.n_columns()).ok();
    writeln!(model, "with_blending = {}", artifact.with_blending).ok();
    if artifact.with_blending {
        writeln!(model, "inflection_point = {}", artifact.blending.k).ok();
        writeln!(model, "smoothing = {}", artifact.blending.f).ok();
    }
    writeln!(model, "priorMean = {}", artifact.prior_mean).ok();
    writeln!(model).ok();
    writeln!(model, "[domains]").ok();

    let mut presence = String::new();
    let mut map = String::new();
    for (position, (name, column)) in artifact.columns.iter().enumerate() {
        let file = domain_file_name(position);
        writeln!(model, "{} = {} {}", name, column.domain().len(), file).ok();

        let mut labels = String::new();
        for label in column.domain() {
            labels.push_str(label);
            labels.push('\n');
        }
        sections.insert(domain_path(&file), labels);

        writeln!(presence, "{} = {}", name, u8::from(column.missing_value_present())).ok();

        writeln!(map, "[{}]", name).ok();
        for stat in column.map().iter() {
            writeln!(map, "{} = {} {}", stat.category_id, stat.sum, stat.count).ok();
        }
    }

    sections.insert(MISSING_VALUES_PRESENCE.to_string(), presence);
    sections.insert(ENCODING_MAP.to_string(), map);
    sections.insert(MODEL_INI.to_string(), model);
    Ok(sections)
}

/// Write every section of the artifact; `model.ini` goes last.
pub fn write_artifact<W: SectionWriter + ?Sized>(
    artifact: &EncodingArtifact,
    writer: &mut W,
) -> Result<(), EncodingError> {
    let mut sections = render_sections(artifact)?;
    let model = sections.remove(MODEL_INI).unwrap_or_default();
    for (path, contents) in &sections {
        debug!(path = %path, bytes = contents.len(), "writing artifact section");
        writer.write_section(path, contents)?;
    }
    writer.write_section(MODEL_INI, &model)?;
    info!(
        columns = artifact.n_columns(),
        sections = sections.len() + 1,
        "target encoding artifact written"
    );
    Ok(())
}

enum IniLine<'a> {
    Header(&'a str),
    Entry { key: &'a str, value: &'a str },
}

fn ini_lines<'a>(section: &str, text: &'a str) -> Result<Vec<(usize, IniLine<'a>)>, EncodingError> {
    let mut lines = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        if raw.trim().is_empty() {
            continue;
        }
        if raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']') {
            lines.push((line, IniLine::Header(&raw[1..raw.len() - 1])));
        } else if let Some((key, value)) = raw.rsplit_once(" = ") {
            lines.push((line, IniLine::Entry { key, value }));
        } else {
            return Err(EncodingError::format(
                section,
                line,
                format!("expected 'key = value', found '{}'", raw),
            ));
        }
    }
    Ok(lines)
}

fn parse_f64(section: &str, line: usize, s: &str) -> Result<f64, EncodingError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EncodingError::format(section, line, format!("invalid number '{}'", s)))
}

fn parse_bool(section: &str, line: usize, s: &str) -> Result<bool, EncodingError> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(EncodingError::format(
            section,
            line,
            format!("expected 'true' or 'false', found '{}'", s),
        )),
    }
}

struct ModelInfo {
    prior_mean: f64,
    with_blending: bool,
    blending: BlendingParams,
    /// column -> (line, level count, domain file)
    domains: BTreeMap<String, (usize, usize, String)>,
}

fn required_key<'a>(
    info: &BTreeMap<&str, (usize, &'a str)>,
    key: &str,
) -> Result<(usize, &'a str), EncodingError> {
    info.get(key)
        .copied()
        .ok_or_else(|| EncodingError::format(MODEL_INI, 0, format!("missing key '{}'", key)))
}

fn parse_model(text: &str) -> Result<ModelInfo, EncodingError> {
    let mut info: BTreeMap<&str, (usize, &str)> = BTreeMap::new();
    let mut domains = BTreeMap::new();
    let mut current: Option<&str> = None;

    for (line, entry) in ini_lines(MODEL_INI, text)? {
        match entry {
            IniLine::Header(name @ ("info" | "domains")) => current = Some(name),
            IniLine::Header(other) => {
                return Err(EncodingError::format(
                    MODEL_INI,
                    line,
                    format!("unknown section [{}]", other),
                ))
            }
            IniLine::Entry { key, value } => match current {
                Some("info") => {
                    if info.insert(key, (line, value)).is_some() {
                        return Err(EncodingError::format(
                            MODEL_INI,
                            line,
                            format!("duplicate key '{}'", key),
                        ));
                    }
                }
                Some(_) => {
                    let (count, file) = value.split_once(' ').ok_or_else(|| {
                        EncodingError::format(MODEL_INI, line, "expected '<levels> <file>'")
                    })?;
                    let count = count.parse::<usize>().map_err(|_| {
                        EncodingError::format(MODEL_INI, line, format!("invalid level count '{}'", count))
                    })?;
                    if domains
                        .insert(key.to_string(), (line, count, file.to_string()))
                        .is_some()
                    {
                        return Err(EncodingError::format(
                            MODEL_INI,
                            line,
                            format!("duplicate domain for column '{}'", key),
                        ));
                    }
                }
                None => {
                    return Err(EncodingError::format(
                        MODEL_INI,
                        line,
                        "entry outside of a section",
                    ))
                }
            },
        }
    }

    let required = |key: &str| required_key(&info, key);

    let (line, algo) = required("algo")?;
    if algo != ALGO {
        return Err(EncodingError::format(
            MODEL_INI,
            line,
            format!("unexpected algo '{}'", algo),
        ));
    }
    let (line, version) = required("format_version")?;
    if version != FORMAT_VERSION {
        return Err(EncodingError::format(
            MODEL_INI,
            line,
            format!("unsupported format version '{}'", version),
        ));
    }
    let (line, n_columns) = required("n_columns")?;
    let n_columns = n_columns.parse::<usize>().map_err(|_| {
        EncodingError::format(MODEL_INI, line, format!("invalid column count '{}'", n_columns))
    })?;
    if n_columns != domains.len() {
        return Err(EncodingError::format(
            MODEL_INI,
            line,
            format!("n_columns is {} but {} domains are listed", n_columns, domains.len()),
        ));
    }
    let (line, with_blending) = required("with_blending")?;
    let with_blending = parse_bool(MODEL_INI, line, with_blending)?;
    let blending = if with_blending {
        let (kl, k) = required("inflection_point")?;
        let (fl, f) = required("smoothing")?;
        let smoothing = parse_f64(MODEL_INI, fl, f)?;
        if smoothing <= 0.0 {
            return Err(EncodingError::format(
                MODEL_INI,
                fl,
                format!("smoothing must be positive, found '{}'", f),
            ));
        }
        BlendingParams::new(parse_f64(MODEL_INI, kl, k)?, smoothing)
    } else {
        BlendingParams::DEFAULT
    };
    let (line, prior) = required("priorMean")?;
    let prior_mean = parse_f64(MODEL_INI, line, prior)?;

    Ok(ModelInfo {
        prior_mean,
        with_blending,
        blending,
        domains,
    })
}

fn parse_domain(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').map(str::to_string).collect()
}

fn parse_presence(text: &str) -> Result<BTreeMap<String, bool>, EncodingError> {
    let mut presence = BTreeMap::new();
    for (line, entry) in ini_lines(MISSING_VALUES_PRESENCE, text)? {
        let IniLine::Entry { key, value } = entry else {
            return Err(EncodingError::format(
                MISSING_VALUES_PRESENCE,
                line,
                "unexpected section header",
            ));
        };
        let present = match value {
            "0" => false,
            "1" => true,
            _ => {
                return Err(EncodingError::format(
                    MISSING_VALUES_PRESENCE,
                    line,
                    format!("expected 0 or 1, found '{}'", value),
                ))
            }
        };
        if presence.insert(key.to_string(), present).is_some() {
            return Err(EncodingError::format(
                MISSING_VALUES_PRESENCE,
                line,
                format!("duplicate column '{}'", key),
            ));
        }
    }
    Ok(presence)
}

fn parse_encoding_map(text: &str) -> Result<BTreeMap<String, (usize, Vec<(usize, CategoryStat)>)>, EncodingError> {
    let mut columns: BTreeMap<String, (usize, Vec<(usize, CategoryStat)>)> = BTreeMap::new();
    let mut current: Option<String> = None;
    for (line, entry) in ini_lines(ENCODING_MAP, text)? {
        match entry {
            IniLine::Header(name) => {
                if columns.insert(name.to_string(), (line, Vec::new())).is_some() {
                    return Err(EncodingError::format(
                        ENCODING_MAP,
                        line,
                        format!("duplicate column '{}'", name),
                    ));
                }
                current = Some(name.to_string());
            }
            IniLine::Entry { key, value } => {
                let column = current
                    .as_ref()
                    .and_then(|c| columns.get_mut(c))
                    .ok_or_else(|| EncodingError::format(ENCODING_MAP, line, "entry outside of a column"))?;
                let category_id = key.parse::<CategoryId>().map_err(|_| {
                    EncodingError::format(ENCODING_MAP, line, format!("invalid category id '{}'", key))
                })?;
                let (sum, count) = value
                    .split_once(' ')
                    .ok_or_else(|| EncodingError::format(ENCODING_MAP, line, "expected 'sum count'"))?;
                let sum = parse_f64(ENCODING_MAP, line, sum)?;
                let count = count.parse::<i64>().map_err(|_| {
                    EncodingError::format(ENCODING_MAP, line, format!("invalid count '{}'", count))
                })?;
                if count < 1 {
                    return Err(EncodingError::format(
                        ENCODING_MAP,
                        line,
                        format!("count must be at least 1, found {}", count),
                    ));
                }
                column.1.push((
                    line,
                    CategoryStat {
                        category_id,
                        sum,
                        count,
                    },
                ));
            }
        }
    }
    Ok(columns)
}

/// Read and validate every section of an artifact.
///
/// # Errors
/// [`EncodingError::MissingSection`] for an absent section and
/// [`EncodingError::ArtifactFormat`] for any malformed or inconsistent content.
pub fn read_artifact<R: SectionReader + ?Sized>(reader: &R) -> Result<EncodingArtifact, EncodingError> {
    let model = parse_model(&reader.read_section(MODEL_INI)?)?;
    let mut presence = parse_presence(&reader.read_section(MISSING_VALUES_PRESENCE)?)?;
    let mut maps = parse_encoding_map(&reader.read_section(ENCODING_MAP)?)?;

    let mut artifact = EncodingArtifact::new(model.prior_mean, model.with_blending, model.blending);
    for (name, (line, levels, file)) in &model.domains {
        let path = domain_path(file);
        let domain = parse_domain(&reader.read_section(&path)?);
        {
            let mut seen = HashSet::with_capacity(domain.len());
            for (position, label) in domain.iter().enumerate() {
                if !seen.insert(label.as_str()) {
                    return Err(EncodingError::format(
                        &path,
                        position + 1,
                        format!("duplicate label '{}'", label),
                    ));
                }
            }
        }
        if domain.len() != *levels {
            return Err(EncodingError::format(
                MODEL_INI,
                *line,
                format!(
                    "domain of '{}' declares {} levels but {} has {}",
                    name,
                    levels,
                    path,
                    domain.len()
                ),
            ));
        }
        let missing_value_present = presence.remove(name).ok_or_else(|| {
            EncodingError::format(
                MISSING_VALUES_PRESENCE,
                0,
                format!("no entry for column '{}'", name),
            )
        })?;
        let (header_line, stats) = maps.remove(name).ok_or_else(|| {
            EncodingError::format(ENCODING_MAP, 0, format!("no section for column '{}'", name))
        })?;

        let missing_id = domain.len() as CategoryId;
        let mut map = ColumnEncodingMap::new();
        for (stat_line, stat) in stats {
            let in_domain = stat.category_id < missing_id
                || (stat.category_id == missing_id && missing_value_present);
            if !in_domain {
                return Err(EncodingError::format(
                    ENCODING_MAP,
                    stat_line,
                    format!("category id {} outside the domain of '{}'", stat.category_id, name),
                ));
            }
            if map.get(stat.category_id).is_some() {
                return Err(EncodingError::format(
                    ENCODING_MAP,
                    stat_line,
                    format!("duplicate category id {}", stat.category_id),
                ));
            }
            map.insert(stat);
        }
        debug!(column = %name, categories = map.len(), header_line, "artifact column loaded");
        artifact
            .columns
            .insert(name.clone(), ColumnEncoding::new(domain, missing_value_present, map));
    }

    if let Some(name) = presence.keys().next() {
        return Err(EncodingError::format(
            MISSING_VALUES_PRESENCE,
            0,
            format!("unknown column '{}'", name),
        ));
    }
    if let Some((name, (line, _))) = maps.iter().next() {
        return Err(EncodingError::format(
            ENCODING_MAP,
            *line,
            format!("unknown column '{}'", name),
        ));
    }

    info!(columns = artifact.n_columns(), "target encoding artifact loaded");
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(with_blending: bool) -> EncodingArtifact {
        let mut map = ColumnEncodingMap::new();
        for (id, sum, count) in [(0, 40.0, 80), (1, 5.0, 20), (2, 0.1 + 0.2, 3)] {
            map.insert(CategoryStat {
                category_id: id,
                sum,
                count,
            });
        }
        let mut other = ColumnEncodingMap::new();
        other.insert(CategoryStat {
            category_id: 0,
            sum: 1.0,
            count: 1,
        });
        let blending = if with_blending {
            BlendingParams::new(5.0, 1.0)
        } else {
            BlendingParams::DEFAULT
        };
        let mut artifact = EncodingArtifact::new(0.4, with_blending, blending);
        artifact.columns.insert(
            "city".to_string(),
            ColumnEncoding::new(vec!["A".to_string(), "B".to_string()], true, map),
        );
        artifact.columns.insert(
            "app id".to_string(),
            ColumnEncoding::new(vec!["x".to_string()], false, other),
        );
        artifact
    }

    #[test]
    fn test_layout() {
        let mut store = MemoryStore::new();
        write_artifact(&sample(true), &mut store).unwrap();
        assert_eq!(
            store.get(MODEL_INI).unwrap(),
            "[info]\nalgo = targetencoder\nformat_version = 1.00\nn_columns = 2\n\
             with_blending = true\ninflection_point = 5\nsmoothing = 1\npriorMean = 0.4\n\n\
             [domains]\napp id = 1 d000.txt\ncity = 2 d001.txt\n"
        );
        assert_eq!(store.get("domains/d001.txt").unwrap(), "A\nB\n");
        assert_eq!(
            store.get(MISSING_VALUES_PRESENCE).unwrap(),
            "app id = 0\ncity = 1\n"
        );
        assert_eq!(
            store.get(ENCODING_MAP).unwrap(),
            "[app id]\n0 = 1 1\n[city]\n0 = 40 80\n1 = 5 20\n2 = 0.30000000000000004 3\n"
        );
    }

    #[test]
    fn test_blending_keys_omitted_when_disabled() {
        let sections = render_sections(&sample(false)).unwrap();
        let model = &sections[MODEL_INI];
        assert!(model.contains("with_blending = false"));
        assert!(!model.contains("inflection_point"));
        assert!(!model.contains("smoothing"));
    }

    #[test]
    fn test_roundtrip_is_byte_identical() {
        for blending in [true, false] {
            let artifact = sample(blending);
            let mut first = MemoryStore::new();
            write_artifact(&artifact, &mut first).unwrap();
            let loaded = read_artifact(&first).unwrap();
            assert_eq!(loaded, artifact);
            let mut second = MemoryStore::new();
            write_artifact(&loaded, &mut second).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_directory_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        write_artifact(&sample(true), &mut store).unwrap();
        assert!(dir.path().join(ENCODING_MAP).exists());
        assert_eq!(read_artifact(&store).unwrap(), sample(true));
    }

    fn corrupt(path: &str, from: &str, to: &str) -> Result<EncodingArtifact, EncodingError> {
        let mut store = MemoryStore::new();
        write_artifact(&sample(true), &mut store).unwrap();
        let text = store.get(path).unwrap().replace(from, to);
        store.write_section(path, &text).unwrap();
        read_artifact(&store)
    }

    #[test]
    fn test_missing_section() {
        let mut store = MemoryStore::new();
        write_artifact(&sample(true), &mut store).unwrap();
        store.remove(ENCODING_MAP);
        assert!(matches!(
            read_artifact(&store),
            Err(EncodingError::MissingSection(p)) if p == ENCODING_MAP
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_artifact(&DirectoryStore::new(dir.path())),
            Err(EncodingError::MissingSection(_))
        ));
    }

    #[test]
    fn test_malformed_sections_are_rejected() {
        let cases = [
            (ENCODING_MAP, "1 = 5 20", "1 = 5 0"),
            (ENCODING_MAP, "1 = 5 20", "1 = five 20"),
            (ENCODING_MAP, "1 = 5 20", "1 5 20"),
            (ENCODING_MAP, "1 = 5 20", "7 = 5 20"),
            (ENCODING_MAP, "[city]", "[town]"),
            (MISSING_VALUES_PRESENCE, "city = 1", "city = yes"),
            (MISSING_VALUES_PRESENCE, "city = 1", "town = 1"),
            (MODEL_INI, "priorMean = 0.4", "prior = 0.4"),
            (MODEL_INI, "with_blending = true", "with_blending = maybe"),
            (MODEL_INI, "n_columns = 2", "n_columns = 3"),
            (MODEL_INI, "format_version = 1.00", "format_version = 2.00"),
            (MODEL_INI, "city = 2 d001.txt", "city = 3 d001.txt"),
            ("domains/d001.txt", "A\nB\n", "A\n"),
            ("domains/d001.txt", "A\nB\n", "A\nA\n"),
            (MODEL_INI, "smoothing = 1", "smoothing = 0"),
            (MODEL_INI, "smoothing = 1", "smoothing = -2"),
            (MODEL_INI, "inflection_point = 5", "inflection_point = inf"),
        ];
        for (path, from, to) in cases {
            let result = corrupt(path, from, to);
            assert!(
                matches!(result, Err(EncodingError::ArtifactFormat { .. })),
                "{} with '{}' -> '{}' gave {:?}",
                path,
                from,
                to,
                result
            );
        }
    }

    #[test]
    fn test_line_breaks_cannot_be_written() {
        let mut artifact = sample(false);
        artifact.columns.insert(
            "bad".to_string(),
            ColumnEncoding::new(vec!["two\nlines".to_string()], false, ColumnEncodingMap::new()),
        );
        assert!(matches!(
            write_artifact(&artifact, &mut MemoryStore::new()),
            Err(EncodingError::Serialization(_))
        ));
    }
}
