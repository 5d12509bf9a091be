//! Dependency coordinate substitution inside Maven-style markup.
//!
//! Coordinates are written `groupId:artifactId` or
//! `groupId:artifactId:version`. Entries are located with regular
//! expressions over the `<groupId>`, `<artifactId>` and `<version>` tag
//! sequence, not by parsing the document, and only the tag contents are
//! rewritten. Every other byte is left untouched.
//!
//! Accepted old → new shapes:
//!
//! | old | new | effect |
//! |---|---|---|
//! | `g:a` | `g:a` | rename group and artifact |
//! | `g:a:v` | `g:a:v` | rename, and set the version (or the property it points to) |
//! | `g:a:*` | `g:a` | rename and drop the `<version>` tag |
//!
//! A well-formed coordinate that is absent from the content is a no-op.

use crate::engine::errors::ParameterError;
use crate::regex_cache;
use regex::bytes::{Captures, Regex};

/// Any run of bytes on the current line, then optionally a newline and a
/// run on the next line. Tags of one entry are matched across at most one
/// line break.
const GAP: &str = r"(?-u:[^\n])*?(?:\n(?-u:[^\n])*?)?";

const WILDCARD_VERSION: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
}

/// One parsed `old → new` coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    Rename { old: Coordinate, new: Coordinate },
    SetVersion { old: Coordinate, new: Coordinate, version: String },
    RemoveVersion { old: Coordinate, new: Coordinate },
}

impl Substitution {
    /// Parse a pair, rejecting every shape not listed in the module docs.
    pub fn parse(old: &str, new: &str) -> Result<Self, ParameterError> {
        let invalid = || ParameterError::InvalidCoordinates {
            old: old.to_string(),
            new: new.to_string(),
        };

        let old_parts: Vec<&str> = old.split(':').collect();
        let new_parts: Vec<&str> = new.split(':').collect();
        if old_parts.iter().chain(new_parts.iter()).any(|p| p.trim().is_empty()) {
            return Err(invalid());
        }

        let pair = |group: &str, artifact: &str| Coordinate {
            group_id: group.trim().to_string(),
            artifact_id: artifact.trim().to_string(),
            version: None,
        };

        match (old_parts.as_slice(), new_parts.as_slice()) {
            ([og, oa], [ng, na]) => Ok(Substitution::Rename {
                old: pair(og, oa),
                new: pair(ng, na),
            }),
            ([og, oa, ov], [ng, na]) if ov.trim() == WILDCARD_VERSION => {
                Ok(Substitution::RemoveVersion {
                    old: pair(og, oa),
                    new: pair(ng, na),
                })
            }
            ([og, oa, ov], [ng, na, nv]) if nv.trim() != WILDCARD_VERSION => {
                Ok(Substitution::SetVersion {
                    old: Coordinate {
                        version: Some(ov.trim().to_string()),
                        ..pair(og, oa)
                    },
                    new: Coordinate {
                        version: Some(nv.trim().to_string()),
                        ..pair(ng, na)
                    },
                    version: nv.trim().to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Apply this substitution to every matching entry in `content`.
    pub fn apply(&self, content: Vec<u8>) -> Result<Vec<u8>, ParameterError> {
        match self {
            Substitution::Rename { old, new } => rename(content, old, new),
            Substitution::SetVersion { old, new, version } => {
                set_version(content, old, new, version)
            }
            Substitution::RemoveVersion { old, new } => remove_version(content, old, new),
        }
    }
}

/// Check that `pairs` can be consumed as `old, new` coordinate pairs.
pub fn validate_pairs(pairs: &[String]) -> Result<(), ParameterError> {
    parse_pairs(pairs).map(|_| ())
}

/// Apply coordinate pairs in order, each over the previous output.
pub fn replace_dependencies(
    mut content: Vec<u8>,
    pairs: &[String],
) -> Result<Vec<u8>, ParameterError> {
    for substitution in parse_pairs(pairs)? {
        let before = content.len();
        content = substitution.apply(content)?;
        tracing::trace!(?substitution, before, after = content.len(), "dependency substitution");
    }
    Ok(content)
}

fn parse_pairs(pairs: &[String]) -> Result<Vec<Substitution>, ParameterError> {
    if pairs.len() % 2 != 0 {
        return Err(ParameterError::UnpairedParameters { found: pairs.len() });
    }
    pairs
        .chunks_exact(2)
        .map(|pair| Substitution::parse(&pair[0], &pair[1]))
        .collect()
}

fn compile(pattern: &str) -> Result<Regex, ParameterError> {
    regex_cache::get_or_compile(pattern).map_err(|err| ParameterError::InvalidPattern {
        message: err.to_string(),
    })
}

/// `(<groupId>)G(</groupId>…<artifactId>)A(</artifactId>`, left open so
/// callers can extend the tail.
fn anchor(old: &Coordinate) -> String {
    format!(
        r"(<groupId>\s*){}(\s*</groupId>{GAP}<artifactId>\s*){}(\s*</artifactId>",
        regex::escape(&old.group_id),
        regex::escape(&old.artifact_id),
    )
}

fn rewrite_anchor(caps: &Captures<'_>, new: &Coordinate, out: &mut Vec<u8>) {
    out.extend_from_slice(&caps[1]);
    out.extend_from_slice(new.group_id.as_bytes());
    out.extend_from_slice(&caps[2]);
    out.extend_from_slice(new.artifact_id.as_bytes());
    out.extend_from_slice(&caps[3]);
}

fn rename(content: Vec<u8>, old: &Coordinate, new: &Coordinate) -> Result<Vec<u8>, ParameterError> {
    let regex = compile(&format!("{})", anchor(old)))?;
    if !regex.is_match(&content) {
        return Ok(content);
    }
    let replaced = regex.replace_all(&content, |caps: &Captures<'_>| {
        let mut out = Vec::with_capacity(caps[0].len());
        rewrite_anchor(caps, new, &mut out);
        out
    });
    Ok(replaced.into_owned())
}

fn set_version(
    content: Vec<u8>,
    old: &Coordinate,
    new: &Coordinate,
    version: &str,
) -> Result<Vec<u8>, ParameterError> {
    let regex = compile(&format!(
        r"{}{GAP}<version>\s*)((?-u:[^<])*?)(\s*</version>)",
        anchor(old)
    ))?;
    if !regex.is_match(&content) {
        return Ok(content);
    }

    let mut properties: Vec<String> = Vec::new();
    let replaced = regex
        .replace_all(&content, |caps: &Captures<'_>| {
            let mut out = Vec::with_capacity(caps[0].len());
            rewrite_anchor(caps, new, &mut out);
            match property_placeholder(&caps[4]) {
                Some(property) => {
                    out.extend_from_slice(&caps[4]);
                    if !properties.contains(&property) {
                        properties.push(property);
                    }
                }
                None => out.extend_from_slice(version.as_bytes()),
            }
            out.extend_from_slice(&caps[5]);
            out
        })
        .into_owned();

    properties
        .iter()
        .try_fold(replaced, |content, property| set_property(content, property, version))
}

/// Rewrite the declaration of `property` inside `<properties>` blocks.
///
/// Tags of the same name anywhere else (a project `<version>`, the versions
/// of other entries) are never touched.
fn set_property(content: Vec<u8>, property: &str, value: &str) -> Result<Vec<u8>, ParameterError> {
    let blocks = compile(r"(?s)(<properties\s*>)((?-u:.)*?)(</properties\s*>)")?;
    let name = regex::escape(property);
    let declaration = compile(&format!(r"(<{name}>\s*)(?-u:[^<])*?(\s*</{name}>)"))?;

    let mut declared = false;
    let replaced = blocks
        .replace_all(&content, |caps: &Captures<'_>| {
            let body = &caps[2];
            let mut out = Vec::with_capacity(caps[0].len());
            out.extend_from_slice(&caps[1]);
            if declaration.is_match(body) {
                declared = true;
                let rewritten = declaration.replace_all(body, |inner: &Captures<'_>| {
                    let mut tag = Vec::with_capacity(inner[0].len());
                    tag.extend_from_slice(&inner[1]);
                    tag.extend_from_slice(value.as_bytes());
                    tag.extend_from_slice(&inner[2]);
                    tag
                });
                out.extend_from_slice(&rewritten);
            } else {
                out.extend_from_slice(body);
            }
            out.extend_from_slice(&caps[3]);
            out
        })
        .into_owned();

    if !declared {
        tracing::debug!(property, "property referenced by version is not declared");
    }
    Ok(replaced)
}

fn remove_version(
    content: Vec<u8>,
    old: &Coordinate,
    new: &Coordinate,
) -> Result<Vec<u8>, ParameterError> {
    let regex = compile(&format!(
        r"{}(?-u:[^\n])*?)(?:\n(?-u:[^\n])*?)?<version>(?-u:[^<])*</version>",
        anchor(old)
    ))?;
    if !regex.is_match(&content) {
        return rename(content, old, new);
    }
    let replaced = regex.replace_all(&content, |caps: &Captures<'_>| {
        let mut out = Vec::with_capacity(caps[0].len());
        rewrite_anchor(caps, new, &mut out);
        out
    });
    Ok(replaced.into_owned())
}

/// `${name}` → `name`.
fn property_placeholder(version: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(version).ok()?.trim();
    let name = text.strip_prefix("${")?.strip_suffix('}')?;
    if name.is_empty() || name.contains(|c: char| matches!(c, '{' | '}' | '<' | '>')) {
        return None;
    }
    Some(name.to_string())
}
