use serde::{Deserialize, Serialize};

use crate::module::ModuleId;
use crate::units::EntryUnit;

/// Longest accumulator the panel readout can show.
const MAX_ENTRY_CHARS: usize = 12;

/// Numeric field a keypad entry can land in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTarget {
    CenterFrequency,
    StartFrequency,
    StopFrequency,
    Span,
    ReferenceLevel,
    MinAmplitude,
    MaxAmplitude,
    ModuleGain(ModuleId),
    ModuleLoFrequency(ModuleId),
    ModuleBackOff(ModuleId),
}

/// A committed entry, already scaled to base units (Hz or dBm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryCommit {
    pub target: EntryTarget,
    pub value: f64,
}

/// Calculator-style accumulator behind the panel's physical keypad.
///
/// Digits append text; nothing is interpreted until commit, and a commit
/// can never fail: an empty or malformed accumulator reads as zero and the
/// receiving field clamps whatever arrives. With no bound target or unit,
/// entry keys are explicit no-ops so stray presses between exercises leave
/// no state behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypad {
    accumulator: String,
    unit: Option<EntryUnit>,
    target: Option<EntryTarget>,
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            accumulator: String::new(),
            unit: None,
            target: None,
        }
    }

    /// Text the panel readout shows.
    pub fn display(&self) -> &str {
        &self.accumulator
    }

    pub fn unit(&self) -> Option<EntryUnit> {
        self.unit
    }

    pub fn target(&self) -> Option<EntryTarget> {
        self.target
    }

    /// Point the keypad at a field. Starts a fresh entry; the sticky unit
    /// carries over, matching how the panel's unit buttons latch.
    pub fn bind_target(&mut self, target: EntryTarget) {
        self.target = Some(target);
        self.accumulator.clear();
    }

    pub fn clear_target(&mut self) {
        self.target = None;
        self.accumulator.clear();
    }

    pub fn press_digit(&mut self, digit: u8) {
        if self.target.is_none() || digit > 9 {
            return;
        }
        if self.accumulator.len() >= MAX_ENTRY_CHARS {
            return;
        }
        self.accumulator.push((b'0' + digit) as char);
    }

    /// At most one decimal point; on an empty entry it reads "0.".
    pub fn press_decimal(&mut self) {
        if self.target.is_none() || self.accumulator.contains('.') {
            return;
        }
        if self.accumulator.len() >= MAX_ENTRY_CHARS {
            return;
        }
        if self.accumulator.is_empty() {
            self.accumulator.push('0');
        }
        self.accumulator.push('.');
    }

    pub fn press_backspace(&mut self) {
        self.accumulator.pop();
    }

    /// Drop the entry without committing.
    pub fn press_clear(&mut self) {
        self.accumulator.clear();
    }

    /// Switch units, re-expressing the displayed value in the new unit so
    /// the physical quantity is unchanged: 1200 MHz becomes 1.2 GHz, not
    /// 1200 GHz.
    pub fn select_unit(&mut self, unit: EntryUnit) {
        if let (Some(old), false) = (self.unit, self.accumulator.is_empty()) {
            if old != unit {
                let value: f64 = self.accumulator.parse().unwrap_or(0.0);
                let rebased = value * old.multiplier() / unit.multiplier();
                self.accumulator = format!("{}", rebased);
            }
        }
        self.unit = Some(unit);
    }

    /// Parse, scale to base units, and clear the accumulator. `None` when
    /// no target or unit is bound.
    pub fn commit(&mut self) -> Option<EntryCommit> {
        let target = self.target?;
        let unit = self.unit?;
        let value: f64 = self.accumulator.parse().unwrap_or(0.0);
        self.accumulator.clear();
        Some(EntryCommit {
            target,
            value: value * unit.multiplier(),
        })
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::FrequencyUnit;

    fn bound_keypad() -> Keypad {
        let mut keypad = Keypad::new();
        keypad.bind_target(EntryTarget::CenterFrequency);
        keypad
    }

    #[test]
    fn digits_accumulate_as_text() {
        let mut keypad = bound_keypad();
        keypad.press_digit(1);
        keypad.press_digit(2);
        keypad.press_decimal();
        keypad.press_digit(5);
        assert_eq!(keypad.display(), "12.5");
    }

    #[test]
    fn unbound_keypad_ignores_everything() {
        let mut keypad = Keypad::new();
        keypad.press_digit(7);
        keypad.press_decimal();
        assert_eq!(keypad.display(), "");
        keypad.select_unit(EntryUnit::Frequency(FrequencyUnit::Mhz));
        assert_eq!(keypad.commit(), None);
    }

    #[test]
    fn second_decimal_is_a_no_op() {
        let mut keypad = bound_keypad();
        keypad.press_digit(1);
        keypad.press_decimal();
        keypad.press_digit(5);
        keypad.press_decimal();
        assert_eq!(keypad.display(), "1.5");
    }

    #[test]
    fn decimal_on_empty_reads_zero_point() {
        let mut keypad = bound_keypad();
        keypad.press_decimal();
        assert_eq!(keypad.display(), "0.");
    }

    #[test]
    fn backspace_on_empty_never_panics() {
        let mut keypad = bound_keypad();
        keypad.press_backspace();
        keypad.press_backspace();
        assert_eq!(keypad.display(), "");
        keypad.press_digit(4);
        keypad.press_backspace();
        assert_eq!(keypad.display(), "");
    }

    #[test]
    fn commit_scales_by_the_unit() {
        let mut keypad = bound_keypad();
        keypad.press_digit(1);
        keypad.press_digit(2);
        keypad.press_decimal();
        keypad.press_digit(5);
        keypad.select_unit(EntryUnit::Frequency(FrequencyUnit::Mhz));
        let commit = keypad.commit().unwrap();
        assert_eq!(commit.target, EntryTarget::CenterFrequency);
        assert_eq!(commit.value, 12.5e6);
        assert_eq!(keypad.display(), "");
    }

    #[test]
    fn commit_without_unit_is_a_no_op() {
        let mut keypad = bound_keypad();
        keypad.press_digit(9);
        assert_eq!(keypad.commit(), None);
        // the entry is still there once a unit arrives
        assert_eq!(keypad.display(), "9");
    }

    #[test]
    fn empty_accumulator_commits_zero() {
        let mut keypad = bound_keypad();
        keypad.select_unit(EntryUnit::Dbm);
        let commit = keypad.commit().unwrap();
        assert_eq!(commit.value, 0.0);
    }

    #[test]
    fn unit_switch_rebases_the_display() {
        let mut keypad = bound_keypad();
        keypad.press_digit(1);
        keypad.press_digit(2);
        keypad.press_digit(0);
        keypad.press_digit(0);
        keypad.select_unit(EntryUnit::Frequency(FrequencyUnit::Mhz));
        keypad.select_unit(EntryUnit::Frequency(FrequencyUnit::Ghz));
        assert_eq!(keypad.display(), "1.2");
        let commit = keypad.commit().unwrap();
        assert_eq!(commit.value, 1.2e9);
    }

    #[test]
    fn rebasing_preserves_the_committed_value() {
        let ladder = [
            EntryUnit::Frequency(FrequencyUnit::Hz),
            EntryUnit::Frequency(FrequencyUnit::Khz),
            EntryUnit::Frequency(FrequencyUnit::Mhz),
            EntryUnit::Frequency(FrequencyUnit::Ghz),
        ];
        let mut keypad = bound_keypad();
        keypad.press_digit(2);
        keypad.press_digit(5);
        keypad.select_unit(EntryUnit::Frequency(FrequencyUnit::Mhz));
        for unit in ladder {
            keypad.select_unit(unit);
        }
        let commit = keypad.commit().unwrap();
        assert!((commit.value - 25.0e6).abs() < 1e-3);
    }

    #[test]
    fn rebinding_starts_a_fresh_entry_with_a_sticky_unit() {
        let mut keypad = bound_keypad();
        keypad.press_digit(5);
        keypad.select_unit(EntryUnit::Frequency(FrequencyUnit::Mhz));
        keypad.bind_target(EntryTarget::Span);
        assert_eq!(keypad.display(), "");
        keypad.press_digit(2);
        let commit = keypad.commit().unwrap();
        assert_eq!(commit.target, EntryTarget::Span);
        assert_eq!(commit.value, 2.0e6);
    }

    #[test]
    fn entry_length_is_capped() {
        let mut keypad = bound_keypad();
        for _ in 0..30 {
            keypad.press_digit(9);
        }
        assert_eq!(keypad.display().len(), 12);
    }
}
