//! A flattened, read-only summary of a `Metainfo`, for a consumer that wants
//! to print or serialize a torrent's metadata without reaching into the
//! bencode tree itself.

use crate::metainfo::{InfoFile, Layout, Metainfo, Sha1Digest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectLayout {
    SingleFile { length: u64 },
    MultiFile { files: Vec<InfoFile> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectSummary {
    pub name: String,
    pub info_hash: Sha1Digest,
    pub piece_length: u64,
    pub piece_count: usize,
    pub total_size: u64,
    pub private: Option<bool>,
    pub source: Option<String>,
    pub layout: InspectLayout,
    pub announce: Option<String>,
    pub announce_list: Option<Vec<Vec<String>>>,
    pub url_list: Vec<String>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub creation_date: Option<i64>,
}

pub fn inspect(metainfo: &Metainfo) -> InspectSummary {
    let info = metainfo.info();
    let layout = match info.layout().clone() {
        Layout::Single { length, .. } => InspectLayout::SingleFile { length },
        Layout::Multi { files } => InspectLayout::MultiFile { files },
    };

    InspectSummary {
        name: info.name().to_owned(),
        info_hash: metainfo.info_hash(),
        piece_length: info.piece_length(),
        piece_count: info.piece_count(),
        total_size: info.total_size(),
        private: info.is_private(),
        source: info.source().map(str::to_owned),
        layout,
        announce: metainfo.announce().map(str::to_owned),
        announce_list: metainfo.announce_list().map(<[_]>::to_vec),
        url_list: metainfo.url_list().to_vec(),
        comment: metainfo.comment().map(str::to_owned),
        created_by: metainfo.created_by().map(str::to_owned),
        creation_date: metainfo.creation_date(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metainfo::{Info, Layout};

    #[test]
    fn summarizes_a_single_file_torrent() {
        let info = Info::new("movie.mkv", 16, vec![[0u8; 20]], Layout::Single { length: 123, md5sum: None });
        let mut metainfo = Metainfo::new(info);
        metainfo.set_announce(Some("udp://tracker.example:80".to_string()));

        let summary = inspect(&metainfo);

        assert_eq!(summary.name, "movie.mkv");
        assert_eq!(summary.total_size, 123);
        assert_eq!(summary.layout, InspectLayout::SingleFile { length: 123 });
        assert_eq!(summary.announce.as_deref(), Some("udp://tracker.example:80"));
    }
}
