//! Catalog rows, clip references and the budgeted selection pass.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::audio::ClipDecoder;

// ---------------------------------------------------------------------------
// CatalogError
// ---------------------------------------------------------------------------

/// Errors raised while reading the catalog file.
///
/// The catalog is trusted external data: any read or deserialization
/// problem is fatal, there is no per-row recovery.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file does not exist at the given path.
    #[error("catalog file not found: {0}")]
    NotFound(PathBuf),

    /// The file could not be read or a row failed typed deserialization.
    #[error("failed to read catalog: {0}")]
    Read(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// CatalogRow
// ---------------------------------------------------------------------------

/// One record of the corpus metadata file.
///
/// Columns beyond these six are ignored. `start`/`end` are clip boundaries
/// in seconds within the original recording, `end >= start`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    pub class: String,
    pub start: f64,
    pub end: f64,
    pub fold: String,
    pub slice_file_name: String,
    pub salience: u8,
}

impl CatalogRow {
    /// Clip duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }

    /// Perceptual salience of the clip within its original recording.
    pub fn salience(&self) -> Salience {
        Salience::from_catalog_value(self.salience)
    }
}

// ---------------------------------------------------------------------------
// Salience
// ---------------------------------------------------------------------------

/// Whether a clip is perceptually foreground or background in its source
/// recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Salience {
    Foreground,
    Background,
}

impl Salience {
    /// Catalog encoding: `1` is foreground; anything else is treated as
    /// background (the catalog is trusted, garbage values propagate as
    /// background rather than erroring).
    pub fn from_catalog_value(value: u8) -> Self {
        if value == 1 {
            Salience::Foreground
        } else {
            Salience::Background
        }
    }
}

// ---------------------------------------------------------------------------
// ClipReference
// ---------------------------------------------------------------------------

/// A catalog row that passed selection, resolved to an on-disk path.
///
/// Created during the scan, consumed once by the dispatcher, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipReference {
    /// Resolved path: `{audio_dir}/fold{fold}/{slice_file_name}`.
    pub path: PathBuf,
    /// Clip duration in seconds.
    pub duration_secs: f64,
    /// Salience carried over from the catalog row.
    pub salience: Salience,
}

impl ClipReference {
    /// Basename of the source clip, sent as the upload's file-name header.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// SelectionBudget
// ---------------------------------------------------------------------------

/// Running totals tracked during the scan.
///
/// The total budget is soft: it is checked at loop entry against prior
/// rows only, so the final total may overshoot the target by the duration
/// of the last accepted clip. The foreground budget is hard: it is checked
/// before accepting each foreground clip.
#[derive(Debug)]
struct SelectionBudget {
    total_secs: f64,
    foreground_secs: f64,
    max_foreground_secs: f64,
}

impl SelectionBudget {
    fn new(target_total_secs: f64, foreground_fraction: f64) -> Self {
        Self {
            total_secs: 0.0,
            foreground_secs: 0.0,
            max_foreground_secs: target_total_secs * foreground_fraction,
        }
    }

    /// True once the scan should stop (checked before each row).
    fn exhausted(&self, target_total_secs: f64) -> bool {
        self.total_secs > target_total_secs
    }

    /// True when accepting a foreground clip of `duration_secs` would
    /// overshoot the foreground budget.
    fn foreground_would_overshoot(&self, duration_secs: f64) -> bool {
        self.foreground_secs + duration_secs > self.max_foreground_secs
    }

    fn accept(&mut self, duration_secs: f64, salience: Salience) {
        self.total_secs += duration_secs;
        if salience == Salience::Foreground {
            self.foreground_secs += duration_secs;
        }
    }
}

// ---------------------------------------------------------------------------
// read_catalog
// ---------------------------------------------------------------------------

/// Read every row of the catalog file, in file order.
///
/// # Errors
///
/// Fatal on a missing file, an unreadable file, or a row whose fields do
/// not deserialize (e.g. a non-numeric duration).
pub fn read_catalog(path: &Path) -> Result<Vec<CatalogRow>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// select_clips
// ---------------------------------------------------------------------------

/// Select clips of class `label` from `rows` until the total-duration
/// budget is exhausted, keeping catalog order.
///
/// Per row, in order:
/// 1. stop the scan once the running total exceeds `target_total_secs`
///    (prior rows only — the selection may overshoot by the last accepted
///    clip's duration);
/// 2. skip rows of a different class;
/// 3. skip rows whose resolved file fails `decoder.probe` (logged, never
///    fatal);
/// 4. skip foreground rows that would overshoot
///    `target_total_secs * foreground_fraction`;
/// 5. otherwise accept the row and update the budgets.
pub fn select_clips(
    rows: &[CatalogRow],
    audio_dir: &Path,
    label: &str,
    target_total_secs: f64,
    foreground_fraction: f64,
    decoder: &dyn ClipDecoder,
) -> Vec<ClipReference> {
    let mut budget = SelectionBudget::new(target_total_secs, foreground_fraction);
    let mut selected = Vec::new();

    for row in rows {
        if budget.exhausted(target_total_secs) {
            break;
        }
        if row.class != label {
            continue;
        }

        let duration_secs = row.duration_secs();
        let path = audio_dir
            .join(format!("fold{}", row.fold))
            .join(&row.slice_file_name);

        if !decoder.probe(&path) {
            log::info!("skipping incompatible clip: {}", path.display());
            continue;
        }

        let salience = row.salience();
        if salience == Salience::Foreground && budget.foreground_would_overshoot(duration_secs) {
            continue;
        }

        budget.accept(duration_secs, salience);
        selected.push(ClipReference {
            path,
            duration_secs,
            salience,
        });
    }

    log::debug!(
        "selected {} clips, {:.1}s total ({:.1}s foreground)",
        selected.len(),
        budget.total_secs,
        budget.foreground_secs,
    );
    selected
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockDecoder;
    use std::io::Write;
    use tempfile::tempdir;

    fn row(class: &str, duration: f64, salience: u8, file: &str) -> CatalogRow {
        CatalogRow {
            class: class.into(),
            start: 10.0,
            end: 10.0 + duration,
            fold: "1".into(),
            slice_file_name: file.into(),
            salience,
        }
    }

    fn audio_dir() -> PathBuf {
        PathBuf::from("/corpus/audio")
    }

    fn select(
        rows: &[CatalogRow],
        label: &str,
        target: f64,
        fg_fraction: f64,
        decoder: &MockDecoder,
    ) -> Vec<ClipReference> {
        select_clips(rows, &audio_dir(), label, target, fg_fraction, decoder)
    }

    // ---- label + path ------------------------------------------------------

    #[test]
    fn skips_rows_of_other_classes() {
        let rows = vec![
            row("siren", 10.0, 2, "a.wav"),
            row("car_horn", 10.0, 2, "b.wav"),
            row("siren", 10.0, 2, "c.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&rows, "siren", 600.0, 0.5, &decoder);
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|c| c.path.to_string_lossy().contains("fold1")));
        assert_eq!(picked[0].file_name(), "a.wav");
        assert_eq!(picked[1].file_name(), "c.wav");
    }

    #[test]
    fn resolves_fold_subdirectory() {
        let mut r = row("siren", 5.0, 2, "clip.wav");
        r.fold = "7".into();
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&[r], "siren", 600.0, 0.5, &decoder);
        assert_eq!(
            picked[0].path,
            PathBuf::from("/corpus/audio/fold7/clip.wav")
        );
    }

    // ---- total budget ------------------------------------------------------

    /// Three 100 s rows against a 250 s target: the stop check runs against
    /// the total of prior rows (100, then 200, both <= 250), so the third
    /// row is still accepted and the total overshoots to 300.
    #[test]
    fn total_budget_overshoots_by_at_most_one_clip() {
        let rows = vec![
            row("siren", 100.0, 1, "a.wav"),
            row("siren", 100.0, 1, "b.wav"),
            row("siren", 100.0, 1, "c.wav"),
            row("siren", 100.0, 1, "d.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&rows, "siren", 250.0, 1.0, &decoder);
        assert_eq!(picked.len(), 3);

        let total: f64 = picked.iter().map(|c| c.duration_secs).sum();
        assert_eq!(total, 300.0);
        // Overshoot is bounded by the last accepted clip's duration.
        assert!(total - 250.0 <= picked.last().unwrap().duration_secs);
    }

    #[test]
    fn scan_stops_once_total_exceeds_target() {
        let rows = vec![
            row("siren", 300.0, 2, "a.wav"),
            row("siren", 1.0, 2, "b.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]);

        // 300 > 250 after the first row, so the second is never evaluated.
        let picked = select(&rows, "siren", 250.0, 0.5, &decoder);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].file_name(), "a.wav");
    }

    #[test]
    fn zero_target_selects_first_matching_row_only() {
        // total 0.0 is not > 0.0 at entry, so one row is still accepted.
        let rows = vec![
            row("siren", 4.0, 2, "a.wav"),
            row("siren", 4.0, 2, "b.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&rows, "siren", 0.0, 0.0, &decoder);
        assert_eq!(picked.len(), 1);
    }

    // ---- foreground budget -------------------------------------------------

    #[test]
    fn foreground_budget_is_a_hard_cap() {
        let rows = vec![
            row("siren", 40.0, 1, "fg1.wav"),
            row("siren", 40.0, 1, "fg2.wav"), // 80 > 100*0.5: rejected
            row("siren", 40.0, 2, "bg1.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&rows, "siren", 100.0, 0.5, &decoder);
        let names: Vec<_> = picked.iter().map(ClipReference::file_name).collect();
        assert_eq!(names, ["fg1.wav", "bg1.wav"]);

        let fg_total: f64 = picked
            .iter()
            .filter(|c| c.salience == Salience::Foreground)
            .map(|c| c.duration_secs)
            .sum();
        assert!(fg_total <= 100.0 * 0.5);
    }

    /// A rejected foreground clip does not end the scan; later foreground
    /// clips that fit are still taken.
    #[test]
    fn smaller_foreground_clip_fits_after_a_rejection() {
        let rows = vec![
            row("siren", 40.0, 1, "fg-big.wav"),
            row("siren", 20.0, 1, "fg-too-big.wav"), // 60 > 50
            row("siren", 10.0, 1, "fg-small.wav"),   // 50 <= 50
        ];
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&rows, "siren", 100.0, 0.5, &decoder);
        let names: Vec<_> = picked.iter().map(ClipReference::file_name).collect();
        assert_eq!(names, ["fg-big.wav", "fg-small.wav"]);
    }

    #[test]
    fn zero_foreground_fraction_skips_every_foreground_row() {
        let rows = vec![
            row("siren", 10.0, 1, "fg.wav"),
            row("siren", 10.0, 2, "bg.wav"),
            row("siren", 10.0, 1, "fg2.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&rows, "siren", 600.0, 0.0, &decoder);
        let names: Vec<_> = picked.iter().map(ClipReference::file_name).collect();
        assert_eq!(names, ["bg.wav"]);
    }

    #[test]
    fn background_rows_ignore_the_foreground_budget() {
        let rows = vec![
            row("siren", 50.0, 2, "bg1.wav"),
            row("siren", 50.0, 2, "bg2.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&rows, "siren", 600.0, 0.0, &decoder);
        assert_eq!(picked.len(), 2);
    }

    // ---- probe filter ------------------------------------------------------

    #[test]
    fn probe_failures_are_excluded_and_scan_continues() {
        let rows = vec![
            row("siren", 10.0, 2, "good1.wav"),
            row("siren", 10.0, 2, "broken.wav"),
            row("siren", 10.0, 2, "good2.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]).with_probe_failure("broken.wav");

        let picked = select(&rows, "siren", 600.0, 0.5, &decoder);
        let names: Vec<_> = picked.iter().map(ClipReference::file_name).collect();
        assert_eq!(names, ["good1.wav", "good2.wav"]);
    }

    /// A clip that fails the probe must not count toward any budget.
    #[test]
    fn probe_failures_do_not_consume_budget() {
        let rows = vec![
            row("siren", 100.0, 2, "broken.wav"),
            row("siren", 100.0, 2, "good.wav"),
        ];
        let decoder = MockDecoder::ok(vec![]).with_probe_failure("broken.wav");

        let picked = select(&rows, "siren", 150.0, 0.5, &decoder);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].file_name(), "good.wav");
    }

    // ---- ordering + empty --------------------------------------------------

    #[test]
    fn selection_preserves_catalog_order() {
        let rows: Vec<_> = (0..5)
            .map(|i| row("siren", 1.0, 2, &format!("clip{i}.wav")))
            .collect();
        let decoder = MockDecoder::ok(vec![]);

        let picked = select(&rows, "siren", 600.0, 0.5, &decoder);
        let names: Vec<_> = picked.iter().map(ClipReference::file_name).collect();
        assert_eq!(
            names,
            ["clip0.wav", "clip1.wav", "clip2.wav", "clip3.wav", "clip4.wav"]
        );
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        let decoder = MockDecoder::ok(vec![]);
        assert!(select(&[], "siren", 600.0, 0.5, &decoder).is_empty());
    }

    // ---- salience mapping --------------------------------------------------

    #[test]
    fn only_one_is_foreground() {
        assert_eq!(Salience::from_catalog_value(1), Salience::Foreground);
        assert_eq!(Salience::from_catalog_value(2), Salience::Background);
        assert_eq!(Salience::from_catalog_value(0), Salience::Background);
        assert_eq!(Salience::from_catalog_value(9), Salience::Background);
    }

    // ---- read_catalog ------------------------------------------------------

    #[test]
    fn read_catalog_maps_columns_by_name_and_ignores_extras() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("meta.csv");
        let mut f = std::fs::File::create(&path).expect("create");
        writeln!(f, "slice_file_name,fsID,start,end,salience,fold,classID,class").unwrap();
        writeln!(f, "100032-3-0-0.wav,100032,0.0,4.0,1,5,3,dog_bark").unwrap();
        writeln!(f, "100263-2-0-117.wav,100263,58.5,62.5,2,5,2,children_playing").unwrap();
        drop(f);

        let rows = read_catalog(&path).expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].class, "dog_bark");
        assert_eq!(rows[0].fold, "5");
        assert_eq!(rows[0].duration_secs(), 4.0);
        assert_eq!(rows[0].salience(), Salience::Foreground);
        assert_eq!(rows[1].slice_file_name, "100263-2-0-117.wav");
        assert_eq!(rows[1].salience(), Salience::Background);
    }

    #[test]
    fn read_catalog_missing_file_is_fatal() {
        let dir = tempdir().expect("temp dir");
        let err = read_catalog(&dir.path().join("nope.csv")).expect_err("should fail");
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn read_catalog_malformed_duration_is_fatal() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.csv");
        let mut f = std::fs::File::create(&path).expect("create");
        writeln!(f, "slice_file_name,start,end,salience,fold,class").unwrap();
        writeln!(f, "a.wav,zero,4.0,1,1,dog_bark").unwrap();
        drop(f);

        assert!(matches!(read_catalog(&path), Err(CatalogError::Read(_))));
    }
}
