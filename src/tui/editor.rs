//! Editable session state behind the TUI.
//!
//! Rendering lives in the parent module; everything here is plain data so key
//! handling can be tested without a terminal. Every applied edit re-runs
//! [`recompute`] and replaces the derived values wholesale.

use std::path::PathBuf;

use crossterm::event::KeyCode;

use crate::app::pipeline::{SessionInputs, SessionOutput, build_report, recompute, resolve_range};
use crate::domain::{CalibrationPoint, UnknownSample, fmt_factor, parse_reading};
use crate::io::export::{default_report_name, write_report};
use crate::math::round3;

/// Arrow-key nudge applied to the fit range bounds (mg/mL).
pub const RANGE_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Settings,
    Standards,
    Unknowns,
}

impl Section {
    fn next(self) -> Self {
        match self {
            Section::Settings => Section::Standards,
            Section::Standards => Section::Unknowns,
            Section::Unknowns => Section::Settings,
        }
    }

    fn prev(self) -> Self {
        match self {
            Section::Settings => Section::Unknowns,
            Section::Standards => Section::Settings,
            Section::Unknowns => Section::Standards,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    RangeStart,
    RangeEnd,
    Beverage,
    Estimate,
    DilutionFactor,
}

pub const SETTINGS: [Setting; 5] = [
    Setting::RangeStart,
    Setting::RangeEnd,
    Setting::Beverage,
    Setting::Estimate,
    Setting::DilutionFactor,
];

impl Setting {
    pub fn label(self) -> &'static str {
        match self {
            Setting::RangeStart => "Fit range start (mg/mL)",
            Setting::RangeEnd => "Fit range end (mg/mL)",
            Setting::Beverage => "Beverage",
            Setting::Estimate => "Estimated conc. (mg/mL)",
            Setting::DilutionFactor => "Dilution factor",
        }
    }
}

/// Column of a two-column table (standards or unknowns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Left,
    Right,
}

impl Column {
    fn toggle(self) -> Self {
        match self {
            Column::Left => Column::Right,
            Column::Right => Column::Left,
        }
    }
}

/// What an open text prompt will be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Setting(Setting),
    Standard { row: usize, column: Column },
    NewStandard,
    Unknown { row: usize, column: Column },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    pub target: EditTarget,
    pub buffer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct Editor {
    pub inputs: SessionInputs,
    pub output: SessionOutput,
    pub section: Section,
    pub setting: usize,
    pub standard_row: usize,
    pub unknown_row: usize,
    pub column: Column,
    pub edit: Option<TextEdit>,
    pub status: String,
    pub export_dir: PathBuf,
}

impl Editor {
    pub fn new(inputs: SessionInputs) -> Self {
        let output = recompute(&inputs);
        Self {
            inputs,
            output,
            section: Section::Settings,
            setting: 0,
            standard_row: 0,
            unknown_row: 0,
            column: Column::Right,
            edit: None,
            status: "Tab switch section  Enter edit  q quit".to_string(),
            export_dir: PathBuf::from("."),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> KeyOutcome {
        if self.edit.is_some() {
            self.handle_edit_key(code);
            return KeyOutcome::Continue;
        }

        match code {
            KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Tab => self.section = self.section.next(),
            KeyCode::BackTab => self.section = self.section.prev(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Left | KeyCode::Right => self.horizontal(code == KeyCode::Right),
            KeyCode::Enter => self.begin_edit(),
            KeyCode::Char('a') => self.add_row(),
            KeyCode::Char('x') => self.delete_row(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        KeyOutcome::Continue
    }

    /// Target of the current selection, whether or not a prompt is open.
    pub fn selected_target(&self) -> Option<EditTarget> {
        match self.section {
            Section::Settings => SETTINGS.get(self.setting).map(|s| EditTarget::Setting(*s)),
            Section::Standards => (self.standard_row < self.inputs.calibration.len()).then_some(
                EditTarget::Standard {
                    row: self.standard_row,
                    column: self.column,
                },
            ),
            Section::Unknowns => (self.unknown_row < self.inputs.unknowns.len()).then_some(
                EditTarget::Unknown {
                    row: self.unknown_row,
                    column: self.column,
                },
            ),
        }
    }

    /// Current value of a setting as shown in the settings panel.
    pub fn setting_text(&self, setting: Setting) -> String {
        let inputs = &self.inputs;
        match setting {
            Setting::RangeStart => format!("{:.3}", inputs.range.start),
            Setting::RangeEnd => format!("{:.3}", inputs.range.end),
            Setting::Beverage => inputs.beverage.clone(),
            Setting::Estimate => inputs
                .dilution
                .estimated_concentration
                .map(|v| v.to_string())
                .unwrap_or_default(),
            Setting::DilutionFactor => inputs
                .dilution
                .dilution_factor
                .map(fmt_factor)
                .unwrap_or_default(),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let (cursor, len) = match self.section {
            Section::Settings => (&mut self.setting, SETTINGS.len()),
            Section::Standards => (&mut self.standard_row, self.inputs.calibration.len()),
            Section::Unknowns => (&mut self.unknown_row, self.inputs.unknowns.len()),
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn horizontal(&mut self, right: bool) {
        match self.section {
            Section::Standards | Section::Unknowns => self.column = self.column.toggle(),
            Section::Settings => {
                let delta = if right { RANGE_STEP } else { -RANGE_STEP };
                match SETTINGS.get(self.setting) {
                    Some(Setting::RangeStart) => {
                        let start = snap_to_step(self.inputs.range.start + delta);
                        self.set_range(Some(start), Some(self.inputs.range.end));
                    }
                    Some(Setting::RangeEnd) => {
                        let end = snap_to_step(self.inputs.range.end + delta);
                        self.set_range(Some(self.inputs.range.start), Some(end));
                    }
                    _ => {}
                }
            }
        }
    }

    fn begin_edit(&mut self) {
        let Some(target) = self.selected_target() else {
            return;
        };
        let buffer = match target {
            EditTarget::Setting(s) => self.setting_text(s),
            EditTarget::Standard { row, column } => self
                .inputs
                .calibration
                .points
                .get(row)
                .map(|p| match column {
                    Column::Left => p.concentration.to_string(),
                    Column::Right => p.absorbance.to_string(),
                })
                .unwrap_or_default(),
            EditTarget::Unknown { row, column } => self
                .inputs
                .unknowns
                .get(row)
                .map(|u| match column {
                    Column::Left => u.label.clone(),
                    Column::Right => u.absorbance.map(|a| a.to_string()).unwrap_or_default(),
                })
                .unwrap_or_default(),
            EditTarget::NewStandard => String::new(),
        };
        self.edit = Some(TextEdit { target, buffer });
        self.status = "Editing: Enter apply, Esc cancel".to_string();
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(edit) = self.edit.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.edit = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                if let Some(edit) = self.edit.take() {
                    self.apply_edit(edit);
                }
            }
            KeyCode::Backspace => {
                edit.buffer.pop();
            }
            KeyCode::Char(c) => edit.buffer.push(c),
            _ => {}
        }
    }

    /// Apply a prompt's text. Rejected input leaves the inputs untouched.
    fn apply_edit(&mut self, edit: TextEdit) {
        let text = edit.buffer.trim();
        let result = match edit.target {
            EditTarget::Setting(setting) => self.apply_setting(setting, text),
            EditTarget::Standard { row, column } => self.apply_standard(row, column, text),
            EditTarget::NewStandard => self.apply_new_standard(text),
            EditTarget::Unknown { row, column } => self.apply_unknown(row, column, text),
        };
        match result {
            Ok(()) => {
                self.refresh();
                self.status = "Updated.".to_string();
            }
            Err(message) => self.status = message,
        }
    }

    fn apply_setting(&mut self, setting: Setting, text: &str) -> Result<(), String> {
        match setting {
            Setting::RangeStart | Setting::RangeEnd => {
                let value = parse_reading(text).ok_or_else(|| format!("Not a number: '{text}'"))?;
                let (start, end) = if setting == Setting::RangeStart {
                    (value, self.inputs.range.end)
                } else {
                    (self.inputs.range.start, value)
                };
                self.set_range(Some(start), Some(end));
            }
            Setting::Beverage => self.inputs.beverage = text.to_string(),
            // Blank or non-numeric clears the value; the corrector then asks for input.
            Setting::Estimate => self.inputs.dilution.estimated_concentration = parse_reading(text),
            Setting::DilutionFactor => self.inputs.dilution.dilution_factor = parse_reading(text),
        }
        Ok(())
    }

    fn apply_standard(&mut self, row: usize, column: Column, text: &str) -> Result<(), String> {
        let value = parse_reading(text).ok_or_else(|| format!("Not a number: '{text}'"))?;
        if column == Column::Left && value < 0.0 {
            return Err(format!("Concentration must be >= 0 (got {value})."));
        }
        let point = self
            .inputs
            .calibration
            .points
            .get_mut(row)
            .ok_or_else(|| "No such standard row.".to_string())?;
        match column {
            Column::Left => point.concentration = value,
            Column::Right => point.absorbance = value,
        }
        self.reclamp_range();
        Ok(())
    }

    fn apply_new_standard(&mut self, text: &str) -> Result<(), String> {
        let mut parts = text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty());
        let (Some(conc), Some(abs), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err("Enter a new standard as `concentration, absorbance`.".to_string());
        };
        let concentration =
            parse_reading(conc).ok_or_else(|| format!("Not a number: '{conc}'"))?;
        let absorbance = parse_reading(abs).ok_or_else(|| format!("Not a number: '{abs}'"))?;
        if concentration < 0.0 {
            return Err(format!("Concentration must be >= 0 (got {concentration})."));
        }
        self.inputs
            .calibration
            .points
            .push(CalibrationPoint::new(concentration, absorbance));
        self.standard_row = self.inputs.calibration.len() - 1;
        self.reclamp_range();
        Ok(())
    }

    fn apply_unknown(&mut self, row: usize, column: Column, text: &str) -> Result<(), String> {
        let sample = self
            .inputs
            .unknowns
            .get_mut(row)
            .ok_or_else(|| "No such sample row.".to_string())?;
        match column {
            Column::Left => sample.label = text.to_string(),
            Column::Right => sample.absorbance = parse_reading(text),
        }
        Ok(())
    }

    fn add_row(&mut self) {
        match self.section {
            Section::Standards => {
                self.edit = Some(TextEdit {
                    target: EditTarget::NewStandard,
                    buffer: String::new(),
                });
                self.status = "New standard: `concentration, absorbance`".to_string();
            }
            Section::Unknowns => {
                let label = format!("row {}", self.inputs.unknowns.len() + 1);
                self.inputs.unknowns.push(UnknownSample::new(label, None));
                self.unknown_row = self.inputs.unknowns.len() - 1;
                self.refresh();
                self.status = "Added sample row.".to_string();
            }
            Section::Settings => {}
        }
    }

    fn delete_row(&mut self) {
        match self.section {
            Section::Standards if self.standard_row < self.inputs.calibration.len() => {
                self.inputs.calibration.points.remove(self.standard_row);
                self.standard_row = self
                    .standard_row
                    .min(self.inputs.calibration.len().saturating_sub(1));
                self.reclamp_range();
                self.refresh();
                self.status = "Removed standard.".to_string();
            }
            Section::Unknowns if self.unknown_row < self.inputs.unknowns.len() => {
                self.inputs.unknowns.remove(self.unknown_row);
                self.unknown_row = self
                    .unknown_row
                    .min(self.inputs.unknowns.len().saturating_sub(1));
                self.refresh();
                self.status = "Removed sample row.".to_string();
            }
            _ => {}
        }
    }

    fn set_range(&mut self, start: Option<f64>, end: Option<f64>) {
        self.inputs.range = resolve_range(&self.inputs.calibration, start, end);
        self.refresh();
    }

    /// Keep the range bounds inside the (possibly changed) concentration domain.
    fn reclamp_range(&mut self) {
        let range = self.inputs.range;
        self.inputs.range = resolve_range(&self.inputs.calibration, Some(range.start), Some(range.end));
    }

    fn refresh(&mut self) {
        self.output = recompute(&self.inputs);
    }

    fn export(&mut self) {
        let path = self.export_dir.join(default_report_name(&self.inputs.beverage));
        let generated_at = Some(chrono::Local::now().naive_local());
        let result = build_report(&self.inputs, &self.output, generated_at)
            .and_then(|report| write_report(&path, &report));
        self.status = match result {
            Ok(()) => format!("Report written to {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }
}

/// Snap a nudged bound onto the `RANGE_STEP` grid so repeated steps land on
/// exact standard concentrations.
fn snap_to_step(value: f64) -> f64 {
    round3((value / RANGE_STEP).round() * RANGE_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DilutionOutcome, Estimate, FitRange};
    use crate::error::FitError;

    fn type_text(editor: &mut Editor, text: &str) {
        for c in text.chars() {
            editor.handle_key(KeyCode::Char(c));
        }
    }

    fn clear_buffer(editor: &mut Editor) {
        if let Some(edit) = editor.edit.as_mut() {
            edit.buffer.clear();
        }
    }

    #[test]
    fn starts_with_a_fitted_default_session() {
        let editor = Editor::new(SessionInputs::default());
        assert!(editor.output.valid_fit().is_some());
        assert_eq!(editor.section, Section::Settings);
        assert_eq!(
            editor.selected_target(),
            Some(EditTarget::Setting(Setting::RangeStart))
        );
    }

    #[test]
    fn editing_an_unknown_absorbance_recomputes_its_estimate() {
        let mut editor = Editor::new(SessionInputs::default());
        editor.handle_key(KeyCode::Tab);
        editor.handle_key(KeyCode::Tab);
        assert_eq!(editor.section, Section::Unknowns);

        editor.handle_key(KeyCode::Enter);
        type_text(&mut editor, "0.30");
        editor.handle_key(KeyCode::Enter);

        assert_eq!(editor.inputs.unknowns[0].absorbance, Some(0.30));
        assert_eq!(editor.output.estimates[0].estimate, Estimate::Value(2.168));
        assert_eq!(editor.status, "Updated.");
    }

    #[test]
    fn escape_cancels_without_changes() {
        let mut editor = Editor::new(SessionInputs::default());
        editor.handle_key(KeyCode::Down);
        editor.handle_key(KeyCode::Enter);
        clear_buffer(&mut editor);
        type_text(&mut editor, "2");
        assert_eq!(editor.handle_key(KeyCode::Esc), KeyOutcome::Continue);
        assert!(editor.edit.is_none());
        assert_eq!(editor.inputs.range.end, 10.0);
    }

    #[test]
    fn narrowing_the_range_to_one_point_invalidates_the_fit() {
        let mut editor = Editor::new(SessionInputs::default());
        editor.handle_key(KeyCode::Enter);
        clear_buffer(&mut editor);
        type_text(&mut editor, "3");
        editor.handle_key(KeyCode::Enter);
        editor.handle_key(KeyCode::Down);
        editor.handle_key(KeyCode::Enter);
        clear_buffer(&mut editor);
        type_text(&mut editor, "5");
        editor.handle_key(KeyCode::Enter);

        assert_eq!(editor.inputs.range, FitRange { start: 3.0, end: 5.0 });
        assert_eq!(
            editor.output.fit,
            Err(FitError::InsufficientData { points: 1, distinct: 1 })
        );
    }

    #[test]
    fn range_bounds_are_clamped_to_the_standards() {
        let mut editor = Editor::new(SessionInputs::default());
        editor.handle_key(KeyCode::Down);
        editor.handle_key(KeyCode::Enter);
        clear_buffer(&mut editor);
        type_text(&mut editor, "50");
        editor.handle_key(KeyCode::Enter);
        assert_eq!(editor.inputs.range.end, 10.0);

        editor.handle_key(KeyCode::Left);
        assert!((editor.inputs.range.end - 9.9).abs() < 1e-9);
    }

    #[test]
    fn invalid_number_is_rejected_with_status() {
        let mut editor = Editor::new(SessionInputs::default());
        editor.handle_key(KeyCode::Tab);
        editor.handle_key(KeyCode::Enter);
        clear_buffer(&mut editor);
        type_text(&mut editor, "abc");
        editor.handle_key(KeyCode::Enter);
        assert!(editor.status.starts_with("Not a number"));
        assert_eq!(editor.inputs.calibration.points[0].absorbance, 0.0);
    }

    #[test]
    fn dilution_inputs_drive_the_final_result() {
        let mut editor = Editor::new(SessionInputs::default());
        for _ in 0..3 {
            editor.handle_key(KeyCode::Down);
        }
        editor.handle_key(KeyCode::Enter);
        type_text(&mut editor, "0.5");
        editor.handle_key(KeyCode::Enter);
        editor.handle_key(KeyCode::Down);
        editor.handle_key(KeyCode::Enter);
        clear_buffer(&mut editor);
        type_text(&mut editor, "10");
        editor.handle_key(KeyCode::Enter);

        assert_eq!(editor.output.dilution.original_concentration(), Some(5.0));
        assert!(matches!(editor.output.dilution, DilutionOutcome::Corrected(_)));
    }

    #[test]
    fn standards_can_be_added_and_removed() {
        let mut editor = Editor::new(SessionInputs::default());
        editor.handle_key(KeyCode::Tab);

        editor.handle_key(KeyCode::Char('a'));
        type_text(&mut editor, "12, 1.4");
        editor.handle_key(KeyCode::Enter);
        assert_eq!(editor.inputs.calibration.len(), 9);
        assert_eq!(editor.standard_row, 8);

        editor.handle_key(KeyCode::Char('x'));
        assert_eq!(editor.inputs.calibration.len(), 8);
        assert_eq!(editor.standard_row, 7);
    }

    #[test]
    fn export_writes_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = Editor::new(SessionInputs::default());
        editor.export_dir = dir.path().to_path_buf();

        editor.handle_key(KeyCode::Char('e'));
        let path = dir.path().join("orange_soda_standard_curve.csv");
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("DNS Assay Standard Curve Report\n"));
        assert!(editor.status.starts_with("Report written"));
    }

    #[test]
    fn quit_only_outside_prompts() {
        let mut editor = Editor::new(SessionInputs::default());
        editor.handle_key(KeyCode::Enter);
        assert_eq!(editor.handle_key(KeyCode::Char('q')), KeyOutcome::Continue);
        editor.handle_key(KeyCode::Esc);
        assert_eq!(editor.handle_key(KeyCode::Char('q')), KeyOutcome::Quit);
    }

    #[test]
    fn escape_outside_a_prompt_keeps_the_session() {
        let mut editor = Editor::new(SessionInputs::default());
        editor.handle_key(KeyCode::Enter);
        editor.handle_key(KeyCode::Esc);
        assert!(editor.edit.is_none());
        assert_eq!(editor.handle_key(KeyCode::Esc), KeyOutcome::Continue);
    }

    #[test]
    fn repeated_nudges_land_on_standard_concentrations() {
        let mut editor = Editor::new(SessionInputs::default());
        for _ in 0..20 {
            editor.handle_key(KeyCode::Right);
        }
        assert_eq!(editor.inputs.range.start, 2.0);
        assert_eq!(editor.output.valid_fit().map(|f| f.n_points), Some(5));

        for _ in 0..20 {
            editor.handle_key(KeyCode::Right);
        }
        assert_eq!(editor.inputs.range.start, 4.0);
        assert_eq!(editor.output.valid_fit().map(|f| f.n_points), Some(4));

        editor.handle_key(KeyCode::Down);
        for _ in 0..15 {
            editor.handle_key(KeyCode::Left);
        }
        assert_eq!(editor.inputs.range.end, 8.5);
        assert_eq!(editor.output.valid_fit().map(|f| f.n_points), Some(3));
    }
}
