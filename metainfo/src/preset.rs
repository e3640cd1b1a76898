//! Typed, in-process shape for the options a preset file or CLI flag set
//! produces. The YAML preset loader and the CLI argument parser are external
//! collaborators; this module only owns the merge and the resulting struct
//! `create`/`modify` actually consume.

/// One layer of option overrides. Every field is optional; `None` means
/// "this layer has no opinion", so [`merge`] can fold three layers together
/// uniformly without special-casing any individual field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetOptions {
    pub trackers: Option<Vec<String>>,
    pub webseeds: Option<Vec<String>>,
    pub private: Option<bool>,
    pub piece_length: Option<u32>,
    pub max_piece_length: Option<u32>,
    pub comment: Option<String>,
    pub source: Option<String>,
    pub no_date: Option<bool>,
    pub no_creator: Option<bool>,
    pub exclude_patterns: Option<Vec<String>>,
    pub include_patterns: Option<Vec<String>>,
    pub entropy: Option<bool>,
}

/// Folds `default`, `preset`, and `explicit` into one [`PresetOptions`],
/// field by field, where each field takes the last non-`None` value across
/// the three layers in that order. `explicit` (command-line flags) always
/// wins over `preset` (a named block from the preset file), which always
/// wins over `default` (the preset file's top-level default block).
pub fn merge(default: PresetOptions, preset: PresetOptions, explicit: PresetOptions) -> PresetOptions {
    PresetOptions {
        trackers: explicit.trackers.or(preset.trackers).or(default.trackers),
        webseeds: explicit.webseeds.or(preset.webseeds).or(default.webseeds),
        private: explicit.private.or(preset.private).or(default.private),
        piece_length: explicit.piece_length.or(preset.piece_length).or(default.piece_length),
        max_piece_length: explicit.max_piece_length.or(preset.max_piece_length).or(default.max_piece_length),
        comment: explicit.comment.or(preset.comment).or(default.comment),
        source: explicit.source.or(preset.source).or(default.source),
        no_date: explicit.no_date.or(preset.no_date).or(default.no_date),
        no_creator: explicit.no_creator.or(preset.no_creator).or(default.no_creator),
        exclude_patterns: explicit.exclude_patterns.or(preset.exclude_patterns).or(default.exclude_patterns),
        include_patterns: explicit.include_patterns.or(preset.include_patterns).or(default.include_patterns),
        entropy: explicit.entropy.or(preset.entropy).or(default.entropy),
    }
}

/// One create/modify unit out of a batch document: a source path, an
/// optional output override, and the options layer for that job alone. A
/// batch runner is expected to merge each job's options against its own
/// default/preset layers before constructing this.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub path: std::path::PathBuf,
    pub output: Option<std::path::PathBuf>,
    pub options: PresetOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_wins_over_preset_and_default() {
        let default = PresetOptions { comment: Some("default".into()), ..Default::default() };
        let preset = PresetOptions { comment: Some("preset".into()), ..Default::default() };
        let explicit = PresetOptions { comment: Some("explicit".into()), ..Default::default() };

        let merged = merge(default, preset, explicit);
        assert_eq!(merged.comment, Some("explicit".to_string()));
    }

    #[test]
    fn an_unset_layer_falls_through_to_the_next() {
        let default = PresetOptions { private: Some(true), ..Default::default() };
        let preset = PresetOptions::default();
        let explicit = PresetOptions::default();

        let merged = merge(default, preset, explicit);
        assert_eq!(merged.private, Some(true));
    }

    #[test]
    fn merge_is_field_wise_not_all_or_nothing() {
        let default = PresetOptions { comment: Some("d".into()), source: Some("d-src".into()), ..Default::default() };
        let preset = PresetOptions { source: Some("p-src".into()), ..Default::default() };
        let explicit = PresetOptions::default();

        let merged = merge(default, preset, explicit);
        assert_eq!(merged.comment, Some("d".to_string()));
        assert_eq!(merged.source, Some("p-src".to_string()));
    }
}
