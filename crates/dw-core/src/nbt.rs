use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

/// Nesting depth at which we assume the input is malformed rather than a
/// real save file. Vanilla level data is under ten levels deep.
const MAX_DEPTH: usize = 64;

/// Errors produced while decoding a save file's tag tree.
#[derive(Debug, thiserror::Error)]
pub enum NbtError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown tag id {0:#04x}")]
    UnknownTagId(u8),
    #[error("root tag is not a compound")]
    RootNotCompound,
    #[error("negative length {0} in {1}")]
    NegativeLength(i32, &'static str),
    #[error("tag name is not valid UTF-8")]
    InvalidName,
    #[error("nesting exceeds {MAX_DEPTH} levels")]
    TooDeep,
}

/// A decoded NBT value.
///
/// Compounds map child names to tags; every numeric payload keeps the
/// signedness and width it has on disk (the save format is big-endian
/// throughout).
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(HashMap<String, Tag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    /// Look up a child of a compound. `None` when `self` is not a compound
    /// or the key is absent.
    pub fn get(&self, key: &str) -> Option<&Tag> {
        match self {
            Tag::Compound(children) => children.get(key),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&HashMap<String, Tag>> {
        match self {
            Tag::Compound(children) => Some(children),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            Tag::Short(v) => Some(*v),
            _ => None,
        }
    }
}

/// Read a level file into its named root compound.
///
/// Both schemas gzip their tag tree, but some old Indev saves and
/// third-party tools write it raw, so the gzip magic is sniffed rather
/// than assumed.
pub fn read_file(path: &Path) -> Result<(String, Tag), NbtError> {
    let mut file = BufReader::new(File::open(path)?);
    let mut head = [0u8; 2];
    file.read_exact(&mut head)?;

    let rest = head.as_slice().chain(file);
    if head == [0x1f, 0x8b] {
        from_reader(GzDecoder::new(rest))
    } else {
        from_reader(rest)
    }
}

/// Decode a named root compound from an uncompressed NBT stream.
pub fn from_reader<R: Read>(mut reader: R) -> Result<(String, Tag), NbtError> {
    let id = read_u8(&mut reader)?;
    if id != 0x0a {
        return Err(NbtError::RootNotCompound);
    }
    let name = read_string(&mut reader)?;
    let root = read_payload(&mut reader, id, 0)?;
    Ok((name, root))
}

fn read_payload<R: Read>(reader: &mut R, id: u8, depth: usize) -> Result<Tag, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::TooDeep);
    }
    match id {
        0x01 => Ok(Tag::Byte(read_u8(reader)? as i8)),
        0x02 => Ok(Tag::Short(i16::from_be_bytes(read_array(reader)?))),
        0x03 => Ok(Tag::Int(i32::from_be_bytes(read_array(reader)?))),
        0x04 => Ok(Tag::Long(i64::from_be_bytes(read_array(reader)?))),
        0x05 => Ok(Tag::Float(f32::from_be_bytes(read_array(reader)?))),
        0x06 => Ok(Tag::Double(f64::from_be_bytes(read_array(reader)?))),
        0x07 => {
            let len = read_len(reader, "byte array")?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            Ok(Tag::ByteArray(buf.into_iter().map(|b| b as i8).collect()))
        }
        0x08 => Ok(Tag::String(read_string(reader)?)),
        0x09 => {
            let elem_id = read_u8(reader)?;
            let len = read_len(reader, "list")?;
            let mut items = Vec::with_capacity(len.min(1 << 16));
            for _ in 0..len {
                items.push(read_payload(reader, elem_id, depth + 1)?);
            }
            Ok(Tag::List(items))
        }
        0x0a => {
            let mut children = HashMap::new();
            loop {
                let child_id = read_u8(reader)?;
                if child_id == 0x00 {
                    break;
                }
                let name = read_string(reader)?;
                let child = read_payload(reader, child_id, depth + 1)?;
                children.insert(name, child);
            }
            Ok(Tag::Compound(children))
        }
        0x0b => {
            let len = read_len(reader, "int array")?;
            let mut items = Vec::with_capacity(len.min(1 << 16));
            for _ in 0..len {
                items.push(i32::from_be_bytes(read_array(reader)?));
            }
            Ok(Tag::IntArray(items))
        }
        0x0c => {
            let len = read_len(reader, "long array")?;
            let mut items = Vec::with_capacity(len.min(1 << 16));
            for _ in 0..len {
                items.push(i64::from_be_bytes(read_array(reader)?));
            }
            Ok(Tag::LongArray(items))
        }
        other => Err(NbtError::UnknownTagId(other)),
    }
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8, NbtError> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N], NbtError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_len<R: Read>(reader: &mut R, what: &'static str) -> Result<usize, NbtError> {
    let len = i32::from_be_bytes(read_array(reader)?);
    if len < 0 {
        return Err(NbtError::NegativeLength(len, what));
    }
    Ok(len as usize)
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, NbtError> {
    let len = u16::from_be_bytes(read_array(reader)?) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    // Save files use Java's "modified UTF-8"; the names we care about are
    // plain ASCII, so strict UTF-8 is fine and anything else is rejected.
    String::from_utf8(buf).map_err(|_| NbtError::InvalidName)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{encode_named, gzip, modern_level};

    #[test]
    fn decodes_an_encoded_compound() {
        let root = modern_level(Some("Hollow"), Some(48123), None);
        let bytes = encode_named("", &root);
        let (name, decoded) = from_reader(bytes.as_slice()).unwrap();

        assert_eq!(name, "");
        let data = decoded.get("Data").unwrap();
        assert_eq!(data.get("LevelName").unwrap().as_str(), Some("Hollow"));
        assert_eq!(data.get("DayTime").unwrap().as_long(), Some(48123));
    }

    #[test]
    fn sniffs_gzip_and_raw() {
        let root = modern_level(None, None, Some(24000));
        let raw = encode_named("", &root);
        let zipped = gzip(&raw);

        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("raw.dat");
        let gz_path = dir.path().join("gz.dat");
        std::fs::write(&raw_path, &raw).unwrap();
        std::fs::write(&gz_path, &zipped).unwrap();

        let (_, from_raw) = read_file(&raw_path).unwrap();
        let (_, from_gz) = read_file(&gz_path).unwrap();
        assert_eq!(from_raw, from_gz);
    }

    #[test]
    fn rejects_non_compound_root() {
        // Long tag at the root.
        let bytes = [0x04u8, 0x00, 0x00, 1, 2, 3, 4, 5, 6, 7, 8];
        assert!(matches!(
            from_reader(&bytes[..]),
            Err(NbtError::RootNotCompound)
        ));
    }

    #[test]
    fn rejects_unknown_tag_id() {
        // Compound root whose first child has an invalid id.
        let bytes = [0x0au8, 0x00, 0x00, 0x7f];
        assert!(matches!(
            from_reader(&bytes[..]),
            Err(NbtError::UnknownTagId(0x7f))
        ));
    }

    #[test]
    fn truncated_input_is_an_io_error() {
        let root = modern_level(Some("Hollow"), Some(1), None);
        let mut bytes = encode_named("", &root);
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(from_reader(bytes.as_slice()), Err(NbtError::Io(_))));
    }

    #[test]
    fn accessors_are_type_strict() {
        let root = modern_level(Some("Hollow"), Some(1), None);
        let data = root.get("Data").unwrap();
        assert_eq!(data.get("LevelName").unwrap().as_long(), None);
        assert_eq!(data.get("DayTime").unwrap().as_str(), None);
        assert!(root.get("LevelName").is_none()); // not a direct child
        assert!(Tag::Long(3).get("anything").is_none());
    }
}
