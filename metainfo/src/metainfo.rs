//! The in-memory `Metainfo`/`Info` model: load-from-bytes, re-encode, and
//! the info-hash. Unknown root-level and info-level keys are preserved
//! across a load/modify/save cycle in an `extra` side table on each struct.
//!
//! Because [`bencode::decode`] rejects any dictionary whose keys are not
//! already in ascending order, anything that successfully decoded was
//! already canonical bencode; re-encoding a loaded, unmodified document
//! therefore reproduces the original bytes exactly; there is no need to
//! cache the original byte image separately.

use bencode::{decode, encode, Dict, DictExt, Value};
use sha1::{Digest, Sha1};

use crate::error::{LoadError, LoadResult};
use crate::keys;

pub type Sha1Digest = [u8; 20];

/// One file entry as recorded inside a multi-file info dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoFile {
    pub path: Vec<String>,
    pub length: u64,
    pub md5sum: Option<Vec<u8>>,
}

/// Whether an info dictionary describes a single file or a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Single { length: u64, md5sum: Option<Vec<u8>> },
    Multi { files: Vec<InfoFile> },
}

/// Directory and checksum data for a torrent file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    name: String,
    piece_length_exp: u32,
    pieces: Vec<Sha1Digest>,
    private: Option<bool>,
    source: Option<String>,
    layout: Layout,
    extra: Dict,
}

impl Info {
    pub fn new(name: impl Into<String>, piece_length_exp: u32, pieces: Vec<Sha1Digest>, layout: Layout) -> Info {
        Info {
            name: name.into(),
            piece_length_exp,
            pieces,
            private: None,
            source: None,
            layout,
            extra: Dict::new(),
        }
    }

    pub fn from_value(value: &Value) -> LoadResult<Info> {
        let dict = value
            .as_dict()
            .ok_or_else(|| LoadError::Invariant("info value is not a dictionary".into()))?;

        let name = dict.require_str(keys::NAME)?.to_owned();

        let piece_length = dict.require_int(keys::PIECE_LENGTH)?;
        if piece_length <= 0 || !(piece_length as u64).is_power_of_two() {
            return Err(LoadError::Invariant(format!(
                "piece length {piece_length} is not a positive power of two"
            )));
        }
        let piece_length_exp = (piece_length as u64).trailing_zeros();

        let pieces_bytes = dict.require_bytes(keys::PIECES)?;
        if pieces_bytes.len() % 20 != 0 {
            return Err(LoadError::Invariant(format!(
                "pieces field length {} is not a multiple of 20",
                pieces_bytes.len()
            )));
        }
        let pieces = pieces_bytes
            .chunks_exact(20)
            .map(|chunk| {
                let mut digest = [0u8; 20];
                digest.copy_from_slice(chunk);
                digest
            })
            .collect::<Vec<_>>();

        let private = dict.opt_int(keys::PRIVATE).map(|p| p == 1);
        let source = dict.opt_str(keys::SOURCE).map(str::to_owned);

        let layout = if let Some(files_value) = dict.opt_list(keys::FILES) {
            let mut files = Vec::with_capacity(files_value.len());
            for file_value in files_value {
                let file_dict = file_value
                    .as_dict()
                    .ok_or_else(|| LoadError::Invariant("file entry is not a dictionary".into()))?;

                let length = file_dict.require_int(keys::LENGTH)?;
                if length < 0 {
                    return Err(LoadError::Invariant("file length is negative".into()));
                }

                let path_list = file_dict.require_list(keys::PATH)?;
                if path_list.is_empty() {
                    return Err(LoadError::Invariant("file path list is empty".into()));
                }
                let path = path_list
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .map(str::to_owned)
                            .ok_or_else(|| LoadError::Invariant("path element is not a utf-8 byte-string".into()))
                    })
                    .collect::<LoadResult<Vec<_>>>()?;

                let md5sum = file_dict.opt_bytes(keys::MD5SUM).map(<[u8]>::to_vec);
                files.push(InfoFile { path, length: length as u64, md5sum });
            }
            if files.is_empty() {
                return Err(LoadError::Invariant("multi-file torrent has an empty files list".into()));
            }
            Layout::Multi { files }
        } else {
            let length = dict.require_int(keys::LENGTH)?;
            if length < 0 {
                return Err(LoadError::Invariant("file length is negative".into()));
            }
            let md5sum = dict.opt_bytes(keys::MD5SUM).map(<[u8]>::to_vec);
            Layout::Single { length: length as u64, md5sum }
        };

        let mut extra = dict.clone();
        for key in [
            keys::NAME,
            keys::PIECE_LENGTH,
            keys::PIECES,
            keys::PRIVATE,
            keys::SOURCE,
            keys::FILES,
            keys::LENGTH,
            keys::MD5SUM,
        ] {
            extra.remove(key);
        }

        Ok(Info { name, piece_length_exp, pieces, private, source, layout, extra })
    }

    pub fn to_value(&self) -> Value {
        let mut dict = self.extra.clone();

        dict.insert(keys::NAME.to_vec(), Value::str(&self.name));
        dict.insert(keys::PIECE_LENGTH.to_vec(), Value::Int(self.piece_length() as i64));

        let pieces_bytes: Vec<u8> = self.pieces.iter().flat_map(|digest| digest.iter().copied()).collect();
        dict.insert(keys::PIECES.to_vec(), Value::bytes(pieces_bytes));

        if let Some(private) = self.private {
            dict.insert(keys::PRIVATE.to_vec(), Value::Int(i64::from(private)));
        }
        if let Some(source) = &self.source {
            dict.insert(keys::SOURCE.to_vec(), Value::str(source));
        }

        match &self.layout {
            Layout::Single { length, md5sum } => {
                dict.insert(keys::LENGTH.to_vec(), Value::Int(*length as i64));
                if let Some(md5) = md5sum {
                    dict.insert(keys::MD5SUM.to_vec(), Value::bytes(md5.clone()));
                }
            }
            Layout::Multi { files } => {
                let list = files
                    .iter()
                    .map(|file| {
                        let mut file_dict = Dict::new();
                        file_dict.insert(keys::LENGTH.to_vec(), Value::Int(file.length as i64));
                        file_dict.insert(
                            keys::PATH.to_vec(),
                            Value::List(file.path.iter().map(Value::str).collect()),
                        );
                        if let Some(md5) = &file.md5sum {
                            file_dict.insert(keys::MD5SUM.to_vec(), Value::bytes(md5.clone()));
                        }
                        Value::Dict(file_dict)
                    })
                    .collect();
                dict.insert(keys::FILES.to_vec(), Value::List(list));
            }
        }

        Value::Dict(dict)
    }

    pub fn encode(&self) -> Vec<u8> {
        encode(&self.to_value())
    }

    pub fn info_hash(&self) -> Sha1Digest {
        let mut hasher = Sha1::new();
        hasher.update(self.encode());
        let digest = hasher.finalize();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        out
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn piece_length_exp(&self) -> u32 {
        self.piece_length_exp
    }

    pub fn piece_length(&self) -> u64 {
        1u64 << self.piece_length_exp
    }

    pub fn pieces(&self) -> &[Sha1Digest] {
        &self.pieces
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_private(&self) -> Option<bool> {
        self.private
    }

    pub fn set_private(&mut self, private: Option<bool>) {
        self.private = private;
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: Option<String>) {
        self.source = source;
    }

    /// `Some(name)` for a multi-file (directory) torrent, `None` for a
    /// single-file torrent; checking this, not the file count, is the
    /// correct way to distinguish the two forms.
    pub fn directory(&self) -> Option<&str> {
        match &self.layout {
            Layout::Multi { .. } => Some(&self.name),
            Layout::Single { .. } => None,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn total_size(&self) -> u64 {
        match &self.layout {
            Layout::Single { length, .. } => *length,
            Layout::Multi { files } => files.iter().map(|file| file.length).sum(),
        }
    }

    /// Inserts a non-standard `entropy` key with fresh random bytes,
    /// deliberately changing the info hash while leaving every other field
    /// untouched.
    pub fn insert_entropy(&mut self, bytes: Vec<u8>) {
        self.extra.insert(keys::ENTROPY.to_vec(), Value::bytes(bytes));
    }
}

/// A parsed `.torrent` file: the info dictionary plus tracker and display
/// metadata at the root level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metainfo {
    info: Info,
    announce: Option<String>,
    announce_list: Option<Vec<Vec<String>>>,
    url_list: Vec<String>,
    comment: Option<String>,
    created_by: Option<String>,
    creation_date: Option<i64>,
    encoding: Option<String>,
    extra: Dict,
}

impl Metainfo {
    pub fn new(info: Info) -> Metainfo {
        Metainfo {
            info,
            announce: None,
            announce_list: None,
            url_list: Vec::new(),
            comment: None,
            created_by: None,
            creation_date: None,
            encoding: None,
            extra: Dict::new(),
        }
    }

    pub fn load(bytes: &[u8]) -> LoadResult<Metainfo> {
        let value = decode(bytes)?;
        let dict = value
            .as_dict()
            .ok_or_else(|| LoadError::Invariant("metainfo is not a dictionary".into()))?;

        let info_value = dict.require(keys::INFO)?;
        let info = Info::from_value(info_value)?;

        let announce = dict.opt_str(keys::ANNOUNCE).map(str::to_owned);
        let announce_list = dict.opt_list(keys::ANNOUNCE_LIST).map(|tiers| {
            tiers
                .iter()
                .filter_map(|tier| tier.as_list())
                .map(|tier| tier.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
                .collect()
        });
        let url_list = dict
            .opt_list(keys::URL_LIST)
            .map(|list| list.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
            .unwrap_or_default();
        let comment = dict.opt_str(keys::COMMENT).map(str::to_owned);
        let created_by = dict.opt_str(keys::CREATED_BY).map(str::to_owned);
        let creation_date = dict.opt_int(keys::CREATION_DATE);
        let encoding = dict.opt_str(keys::ENCODING).map(str::to_owned);

        let mut extra = dict.clone();
        for key in [
            keys::INFO,
            keys::ANNOUNCE,
            keys::ANNOUNCE_LIST,
            keys::URL_LIST,
            keys::COMMENT,
            keys::CREATED_BY,
            keys::CREATION_DATE,
            keys::ENCODING,
        ] {
            extra.remove(key);
        }

        Ok(Metainfo {
            info,
            announce,
            announce_list,
            url_list,
            comment,
            created_by,
            creation_date,
            encoding,
            extra,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode(&self.to_value())
    }

    fn to_value(&self) -> Value {
        let mut dict = self.extra.clone();

        dict.insert(keys::INFO.to_vec(), self.info.to_value());
        if let Some(announce) = &self.announce {
            dict.insert(keys::ANNOUNCE.to_vec(), Value::str(announce));
        }
        if let Some(list) = &self.announce_list {
            let tiers = list
                .iter()
                .map(|tier| Value::List(tier.iter().map(Value::str).collect()))
                .collect();
            dict.insert(keys::ANNOUNCE_LIST.to_vec(), Value::List(tiers));
        }
        if !self.url_list.is_empty() {
            dict.insert(
                keys::URL_LIST.to_vec(),
                Value::List(self.url_list.iter().map(Value::str).collect()),
            );
        }
        if let Some(comment) = &self.comment {
            dict.insert(keys::COMMENT.to_vec(), Value::str(comment));
        }
        if let Some(created_by) = &self.created_by {
            dict.insert(keys::CREATED_BY.to_vec(), Value::str(created_by));
        }
        if let Some(date) = self.creation_date {
            dict.insert(keys::CREATION_DATE.to_vec(), Value::Int(date));
        }
        if let Some(encoding) = &self.encoding {
            dict.insert(keys::ENCODING.to_vec(), Value::str(encoding));
        }

        Value::Dict(dict)
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut Info {
        &mut self.info
    }

    pub fn info_hash(&self) -> Sha1Digest {
        self.info.info_hash()
    }

    pub fn announce(&self) -> Option<&str> {
        self.announce.as_deref()
    }

    pub fn set_announce(&mut self, url: Option<String>) {
        self.announce = url;
    }

    pub fn announce_list(&self) -> Option<&[Vec<String>]> {
        self.announce_list.as_deref()
    }

    pub fn set_announce_list(&mut self, list: Option<Vec<Vec<String>>>) {
        self.announce_list = list;
    }

    pub fn url_list(&self) -> &[String] {
        &self.url_list
    }

    pub fn set_url_list(&mut self, list: Vec<String>) {
        self.url_list = list;
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn set_created_by(&mut self, created_by: Option<String>) {
        self.created_by = created_by;
    }

    pub fn creation_date(&self) -> Option<i64> {
        self.creation_date
    }

    pub fn set_creation_date(&mut self, date: Option<i64>) {
        self.creation_date = date;
    }

    /// Mirrors the first tracker of `announce-list`'s first tier into
    /// `announce`, per the invariant that the two stay in sync.
    pub fn sync_primary_announce(&mut self) {
        if let Some(first) = self.announce_list.as_ref().and_then(|list| list.first()).and_then(|tier| tier.first()) {
            self.announce = Some(first.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_single_file_bytes() -> Vec<u8> {
        let mut info = Dict::new();
        info.insert(keys::NAME.to_vec(), Value::str("movie.mkv"));
        info.insert(keys::PIECE_LENGTH.to_vec(), Value::Int(65536));
        info.insert(keys::PIECES.to_vec(), Value::bytes(vec![0u8; 40]));
        info.insert(keys::LENGTH.to_vec(), Value::Int(123456));

        let mut root = Dict::new();
        root.insert(keys::ANNOUNCE.to_vec(), Value::str("udp://tracker.example:80"));
        root.insert(keys::INFO.to_vec(), Value::Dict(info));

        encode(&Value::Dict(root))
    }

    #[test]
    fn loads_single_file_torrent() {
        let metainfo = Metainfo::load(&sample_single_file_bytes()).unwrap();

        assert_eq!(metainfo.announce(), Some("udp://tracker.example:80"));
        assert_eq!(metainfo.info().name(), "movie.mkv");
        assert_eq!(metainfo.info().piece_length(), 65536);
        assert_eq!(metainfo.info().piece_count(), 2);
        assert_eq!(metainfo.info().total_size(), 123456);
        assert_eq!(metainfo.info().directory(), None);
    }

    #[test]
    fn load_then_save_is_byte_identical_when_unmodified() {
        let bytes = sample_single_file_bytes();
        let metainfo = Metainfo::load(&bytes).unwrap();

        assert_eq!(metainfo.to_bytes(), bytes);
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let mut bytes_dict = match decode(&sample_single_file_bytes()).unwrap() {
            Value::Dict(d) => d,
            _ => unreachable!(),
        };
        bytes_dict.insert(b"x_custom_field".to_vec(), Value::str("keep me"));
        if let Value::Dict(info) = bytes_dict.get_mut(keys::INFO).unwrap() {
            info.insert(b"x_info_field".to_vec(), Value::Int(7));
        }
        let bytes = encode(&Value::Dict(bytes_dict));

        let metainfo = Metainfo::load(&bytes).unwrap();
        let round_tripped = metainfo.to_bytes();

        assert_eq!(round_tripped, bytes);
    }

    #[test]
    fn multi_file_layout_reports_directory_name() {
        let mut file_a = Dict::new();
        file_a.insert(keys::LENGTH.to_vec(), Value::Int(10));
        file_a.insert(keys::PATH.to_vec(), Value::List(vec![Value::str("a.txt")]));

        let mut info = Dict::new();
        info.insert(keys::NAME.to_vec(), Value::str("pack"));
        info.insert(keys::PIECE_LENGTH.to_vec(), Value::Int(16384));
        info.insert(keys::PIECES.to_vec(), Value::bytes(vec![0u8; 20]));
        info.insert(keys::FILES.to_vec(), Value::List(vec![Value::Dict(file_a)]));

        let mut root = Dict::new();
        root.insert(keys::INFO.to_vec(), Value::Dict(info));

        let metainfo = Metainfo::load(&encode(&Value::Dict(root))).unwrap();

        assert_eq!(metainfo.info().directory(), Some("pack"));
        assert_eq!(metainfo.info().total_size(), 10);
    }

    #[test]
    fn rejects_pieces_not_a_multiple_of_twenty() {
        let mut info = Dict::new();
        info.insert(keys::NAME.to_vec(), Value::str("f"));
        info.insert(keys::PIECE_LENGTH.to_vec(), Value::Int(16384));
        info.insert(keys::PIECES.to_vec(), Value::bytes(vec![0u8; 7]));
        info.insert(keys::LENGTH.to_vec(), Value::Int(1));

        let mut root = Dict::new();
        root.insert(keys::INFO.to_vec(), Value::Dict(info));

        assert!(Metainfo::load(&encode(&Value::Dict(root))).is_err());
    }

    #[test]
    fn rejects_piece_length_that_is_not_a_power_of_two() {
        let mut info = Dict::new();
        info.insert(keys::NAME.to_vec(), Value::str("f"));
        info.insert(keys::PIECE_LENGTH.to_vec(), Value::Int(12345));
        info.insert(keys::PIECES.to_vec(), Value::bytes(vec![0u8; 20]));
        info.insert(keys::LENGTH.to_vec(), Value::Int(1));

        let mut root = Dict::new();
        root.insert(keys::INFO.to_vec(), Value::Dict(info));

        assert!(Metainfo::load(&encode(&Value::Dict(root))).is_err());
    }
}
