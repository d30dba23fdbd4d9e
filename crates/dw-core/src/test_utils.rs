//! Fixture helpers for building real save files in tests.
//!
//! The monitoring surface never writes save data; this encoder exists so
//! tests can materialise both schemas in a temp dir and exercise the real
//! read path end to end.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::nbt::Tag;

fn tag_id(tag: &Tag) -> u8 {
    match tag {
        Tag::Byte(_) => 0x01,
        Tag::Short(_) => 0x02,
        Tag::Int(_) => 0x03,
        Tag::Long(_) => 0x04,
        Tag::Float(_) => 0x05,
        Tag::Double(_) => 0x06,
        Tag::ByteArray(_) => 0x07,
        Tag::String(_) => 0x08,
        Tag::List(_) => 0x09,
        Tag::Compound(_) => 0x0a,
        Tag::IntArray(_) => 0x0b,
        Tag::LongArray(_) => 0x0c,
    }
}

fn write_name(out: &mut Vec<u8>, name: &str) {
    out.extend_from_slice(&(name.len() as u16).to_be_bytes());
    out.extend_from_slice(name.as_bytes());
}

fn write_payload(out: &mut Vec<u8>, tag: &Tag) {
    match tag {
        Tag::Byte(v) => out.push(*v as u8),
        Tag::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::ByteArray(items) => {
            out.extend_from_slice(&(items.len() as i32).to_be_bytes());
            out.extend(items.iter().map(|b| *b as u8));
        }
        Tag::String(s) => write_name(out, s),
        Tag::List(items) => {
            let elem_id = items.first().map(tag_id).unwrap_or(0x00);
            out.push(elem_id);
            out.extend_from_slice(&(items.len() as i32).to_be_bytes());
            for item in items {
                write_payload(out, item);
            }
        }
        Tag::Compound(children) => {
            for (name, child) in children {
                out.push(tag_id(child));
                write_name(out, name);
                write_payload(out, child);
            }
            out.push(0x00);
        }
        Tag::IntArray(items) => {
            out.extend_from_slice(&(items.len() as i32).to_be_bytes());
            for v in items {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
        Tag::LongArray(items) => {
            out.extend_from_slice(&(items.len() as i32).to_be_bytes());
            for v in items {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
    }
}

/// Encode a named root tag as an uncompressed NBT stream.
pub fn encode_named(name: &str, root: &Tag) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(tag_id(root));
    write_name(&mut out, name);
    write_payload(&mut out, root);
    out
}

/// Gzip an encoded stream the way the game does when saving.
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Write `root` to `path` as a gzipped level file with an unnamed root.
pub fn write_level(path: &Path, root: &Tag) {
    std::fs::write(path, gzip(&encode_named("", root))).unwrap();
}

fn compound(children: Vec<(&str, Tag)>) -> Tag {
    Tag::Compound(
        children
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<HashMap<_, _>>(),
    )
}

/// Build a modern `level.dat` root with the given `Data` fields; any field
/// passed as `None` is omitted entirely.
pub fn modern_level(level_name: Option<&str>, day_time: Option<i64>, time: Option<i64>) -> Tag {
    let mut data = Vec::new();
    if let Some(name) = level_name {
        data.push(("LevelName", Tag::String(name.to_string())));
    }
    if let Some(ticks) = day_time {
        data.push(("DayTime", Tag::Long(ticks)));
    }
    if let Some(ticks) = time {
        data.push(("Time", Tag::Long(ticks)));
    }
    compound(vec![("Data", compound(data))])
}

/// Build an Indev `.mclevel` root with the given `Environment.TimeOfDay`.
pub fn indev_level(time_of_day: i16) -> Tag {
    compound(vec![(
        "Environment",
        compound(vec![("TimeOfDay", Tag::Short(time_of_day))]),
    )])
}

/// An Indev root whose `Environment` section is missing.
pub fn indev_level_without_environment() -> Tag {
    compound(vec![("About", compound(vec![]))])
}
