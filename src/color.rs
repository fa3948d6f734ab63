//! Per-point colors and the fixed mapping from labels to colors.

use std::convert::TryFrom;

use derive_more::Display;
use static_assertions::assert_eq_size;


/// An 8 bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(fmt = "rgb({}, {}, {})", r, g, b)]
#[repr(C)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

assert_eq_size!(Rgb, [u8; 3]);

impl Rgb {
    pub const GRAY: Rgb = Rgb::new(128, 128, 128);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Colors of the known labels, indexed by the label value.
const LABEL_COLORS: [Rgb; 3] = [
    Rgb::GRAY,  // environment
    Rgb::BLUE,  // workpiece
    Rgb::RED,   // defect
];

/// Color of every label without an entry in the table, including negative
/// labels.
pub const FALLBACK_COLOR: Rgb = Rgb::GREEN;

/// Returns the color for the given label: gray for 0, blue for 1, red for 2
/// and green for everything else.
pub fn label_color(label: i32) -> Rgb {
    usize::try_from(label)
        .ok()
        .and_then(|idx| LABEL_COLORS.get(idx))
        .copied()
        .unwrap_or(FALLBACK_COLOR)
}

/// Maps every label to its color.
pub fn colorize(labels: &[i32]) -> Vec<Rgb> {
    labels.iter().map(|&l| label_color(l)).collect()
}

/// The classes a point can be labeled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// Background, i.e. everything that is not the workpiece.
    Environment = 0,
    Workpiece = 1,
    /// A defect on the workpiece surface.
    Defect = 2,
}

impl Label {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Label::Environment),
            1 => Some(Label::Workpiece),
            2 => Some(Label::Defect),
            _ => None,
        }
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    pub fn color(self) -> Rgb {
        label_color(self.raw())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels() {
        assert_eq!(label_color(0), Rgb::new(128, 128, 128));
        assert_eq!(label_color(1), Rgb::new(0, 0, 255));
        assert_eq!(label_color(2), Rgb::new(255, 0, 0));
    }

    #[test]
    fn unknown_labels_are_green() {
        for &label in &[3, 4, 17, 255, i32::max_value(), -1, -2, i32::min_value()] {
            assert_eq!(label_color(label), Rgb::GREEN, "label {}", label);
        }
    }

    #[test]
    fn label_roundtrip() {
        for &label in &[Label::Environment, Label::Workpiece, Label::Defect] {
            assert_eq!(Label::from_raw(label.raw()), Some(label));
            assert_eq!(label.color(), label_color(label.raw()));
        }
        assert_eq!(Label::from_raw(3), None);
        assert_eq!(Label::from_raw(-1), None);
    }

    #[test]
    fn colorize_keeps_order() {
        assert_eq!(
            colorize(&[1, 2, 0, 9]),
            vec![Rgb::BLUE, Rgb::RED, Rgb::GRAY, Rgb::GREEN],
        );
        assert!(colorize(&[]).is_empty());
    }

    #[test]
    fn display() {
        assert_eq!(Rgb::GRAY.to_string(), "rgb(128, 128, 128)");
    }
}
