//! Applies a layered set of field changes to an already-loaded `Metainfo`:
//! `modify` never walks a file tree or re-hashes; it only mutates the
//! typed model and (when an info-level field changed) lets [`Metainfo`]
//! re-encode the info dictionary on its next [`Metainfo::to_bytes`] call.

use std::path::{Path, PathBuf};

use rand::Rng;

use crate::atomic::write_atomic;
use crate::error::ModifyResult;
use crate::metainfo::Metainfo;
use crate::preset::PresetOptions;

/// Applies `options` to `metainfo` in place, field by field. A field that is
/// `None` in `options` is left untouched rather than cleared, so repeated
/// application with the same options is idempotent (see the tests below).
pub fn apply(metainfo: &mut Metainfo, options: &PresetOptions) {
    if let Some(trackers) = &options.trackers {
        if let Some(first) = trackers.first() {
            metainfo.set_announce(Some(first.clone()));
        }
        metainfo.set_announce_list(if trackers.len() > 1 { Some(trackers.iter().map(|t| vec![t.clone()]).collect()) } else { None });
        metainfo.sync_primary_announce();
    }
    if let Some(webseeds) = &options.webseeds {
        metainfo.set_url_list(webseeds.clone());
    }
    if let Some(comment) = &options.comment {
        metainfo.set_comment(Some(comment.clone()));
    }
    if options.no_date == Some(true) {
        metainfo.set_creation_date(None);
    }
    if options.no_creator == Some(true) {
        metainfo.set_created_by(None);
    }

    let info = metainfo.info_mut();
    if let Some(private) = options.private {
        info.set_private(Some(private));
    }
    if let Some(source) = &options.source {
        info.set_source(Some(source.clone()));
    }
    if options.entropy == Some(true) {
        let bytes: [u8; 16] = rand::thread_rng().gen();
        info.insert_entropy(bytes.to_vec());
    }
}

/// Loads the metainfo at `input`, applies `options` (the caller has already
/// folded default/preset/explicit layers via [`crate::preset::merge`]), and
/// writes the result to `output`. Refuses to write over `input` unless
/// `allow_overwrite` is set, since `modify` is meant to produce a derived
/// copy, not clobber the source torrent.
pub fn modify_file(input: &Path, output: &Path, options: &PresetOptions, allow_overwrite: bool) -> ModifyResult<()> {
    if !allow_overwrite && paths_match(input, output) {
        return Err(crate::error::ModifyError::WouldOverwriteInput(output.to_path_buf()));
    }

    if let Some(trackers) = &options.trackers {
        for url in trackers {
            if !crate::tracker::is_valid_url(url) {
                return Err(crate::error::ModifyError::BadTrackerUrl(url.clone()));
            }
        }
    }

    let bytes = std::fs::read(input).map_err(|source| crate::error::ModifyError::Io { path: input.to_path_buf(), source })?;
    let mut metainfo = Metainfo::load(&bytes)?;
    apply(&mut metainfo, options);

    let out_bytes = metainfo.to_bytes();
    write_atomic(output, &out_bytes).map_err(|source| crate::error::ModifyError::Io { path: output.to_path_buf(), source })
}

fn paths_match(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// `<input-stem>.modified.torrent` alongside `input`, the default derived
/// output path when the caller has not named one explicitly.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}.modified.torrent"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metainfo::{Info, Layout};
    use tempfile::tempdir;

    fn sample() -> Metainfo {
        let info = Info::new("f", 16, vec![[0u8; 20]], Layout::Single { length: 10, md5sum: None });
        Metainfo::new(info)
    }

    #[test]
    fn applying_the_same_options_twice_is_byte_identical() {
        let mut metainfo = sample();
        let options = PresetOptions { private: Some(true), source: Some("GRP".to_string()), ..Default::default() };

        apply(&mut metainfo, &options);
        let once = metainfo.to_bytes();
        apply(&mut metainfo, &options);
        let twice = metainfo.to_bytes();

        assert_eq!(once, twice);
    }

    #[test]
    fn tracker_change_keeps_announce_and_announce_list_in_sync() {
        let mut metainfo = sample();
        let options = PresetOptions { trackers: Some(vec!["udp://a.example:80".to_string()]), ..Default::default() };

        apply(&mut metainfo, &options);

        assert_eq!(metainfo.announce(), Some("udp://a.example:80"));
    }

    #[test]
    fn unset_fields_are_left_alone() {
        let mut metainfo = sample();
        metainfo.set_comment(Some("keep me".to_string()));

        apply(&mut metainfo, &PresetOptions { private: Some(true), ..Default::default() });

        assert_eq!(metainfo.comment(), Some("keep me"));
    }

    #[test]
    fn modify_file_refuses_to_overwrite_the_input_by_default() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.torrent");
        std::fs::write(&input, sample().to_bytes()).unwrap();

        let result = modify_file(&input, &input, &PresetOptions::default(), false);
        assert!(matches!(result, Err(crate::error::ModifyError::WouldOverwriteInput(_))));
    }

    #[test]
    fn modify_file_rejects_a_malformed_tracker_url() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.torrent");
        std::fs::write(&input, sample().to_bytes()).unwrap();
        let output = default_output_path(&input);

        let options = PresetOptions { trackers: Some(vec!["not a url".to_string()]), ..Default::default() };
        let result = modify_file(&input, &output, &options, false);

        assert!(matches!(result, Err(crate::error::ModifyError::BadTrackerUrl(_))));
    }

    #[test]
    fn modify_file_writes_a_derived_copy() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.torrent");
        std::fs::write(&input, sample().to_bytes()).unwrap();
        let output = default_output_path(&input);

        let options = PresetOptions { source: Some("GRP".to_string()), ..Default::default() };
        modify_file(&input, &output, &options, false).unwrap();

        let modified = Metainfo::load(&std::fs::read(&output).unwrap()).unwrap();
        assert_eq!(modified.info().source(), Some("GRP"));
    }
}
