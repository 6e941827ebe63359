//! User selections and their colour assignment.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed colour palette for selection markers and curves (RGB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette;

impl Palette {
    /// Palette entries in assignment order, each channel `floor(255 * f)`
    /// of the unit-range palette.
    pub const COLORS: [[u8; 3]; 10] = [
        [102, 193, 164],
        [251, 140, 97],
        [140, 159, 202],
        [230, 137, 194],
        [165, 215, 83],
        [255, 216, 46],
        [229, 195, 147],
        [178, 178, 178],
        [102, 193, 164],
        [251, 140, 97],
    ];

    /// Number of colours before selections wrap around.
    pub const SIZE: usize = Self::COLORS.len();

    /// Colour for `index`, wrapping past the end of the palette.
    #[must_use]
    pub fn rgb(index: usize) -> [u8; 3] {
        Self::COLORS[index % Self::SIZE]
    }
}

/// One selected pixel, or a box around it when `half_width` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selection {
    /// Row of the selected pixel (box centre).
    pub row: usize,
    /// Column of the selected pixel (box centre).
    pub col: usize,
    /// Integration half-width for region selections.
    pub half_width: Option<usize>,
    /// Index into [`Palette::COLORS`].
    pub color_index: usize,
}

/// Result of adding a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// The stored selection.
    pub selection: Selection,
    /// Position of the selection in the set.
    pub index: usize,
    /// True when the set wrapped and all previous selections were dropped;
    /// renderers should remove their old markers.
    pub cleared: bool,
}

/// Ordered selections with cyclic colour assignment.
///
/// Once more selections are made than the palette holds, the set is cleared
/// and colouring restarts from the first palette entry.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    entries: Vec<Selection>,
    clicks: usize,
}

impl SelectionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a selection and assigns its colour.
    ///
    /// Coordinates must already be validated against the volume.
    pub fn add(&mut self, row: usize, col: usize, half_width: Option<usize>) -> SelectionOutcome {
        self.clicks += 1;
        let cleared = self.clicks > Palette::SIZE;
        if cleared {
            self.entries.clear();
            self.clicks = 1;
        }
        let selection = Selection {
            row,
            col,
            half_width,
            color_index: self.clicks - 1,
        };
        self.entries.push(selection);
        SelectionOutcome {
            selection,
            index: self.entries.len() - 1,
            cleared,
        }
    }

    /// Drops every selection and restarts colouring.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.clicks = 0;
    }

    /// Number of active selections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Active selections in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[Selection] {
        &self.entries
    }

    /// Iterates over active selections.
    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_assigned_in_order() {
        let mut set = SelectionSet::new();
        for i in 0..3 {
            let out = set.add(i, i, None);
            assert_eq!(out.selection.color_index, i);
            assert_eq!(out.index, i);
            assert!(!out.cleared);
        }
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_wraps_and_clears_past_palette_size() {
        let mut set = SelectionSet::new();
        for i in 0..Palette::SIZE {
            assert!(!set.add(i, 0, Some(2)).cleared);
        }
        assert_eq!(set.len(), Palette::SIZE);

        let out = set.add(7, 7, Some(2));
        assert!(out.cleared);
        assert_eq!(out.selection.color_index, 0);
        assert_eq!(set.len(), 1);
        assert_eq!(set.entries()[0].row, 7);

        assert_eq!(set.add(8, 8, None).selection.color_index, 1);
    }

    #[test]
    fn test_clear_restarts_counter() {
        let mut set = SelectionSet::new();
        set.add(1, 1, None);
        set.add(2, 2, None);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.add(3, 3, None).selection.color_index, 0);
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(Palette::rgb(0), Palette::rgb(Palette::SIZE));
    }

    #[test]
    fn test_palette_channels_are_truncated() {
        let unit = [
            [0.4, 0.76078, 0.64705],
            [0.98823, 0.55294, 0.38431],
            [0.55294, 0.62745, 0.79607],
            [0.90588, 0.54117, 0.76470],
            [0.65098, 0.84705, 0.32941],
            [1.0, 0.85098, 0.18431],
            [0.89804, 0.76862, 0.58039],
            [0.70196, 0.70196, 0.70196],
        ];
        for (i, rgb) in unit.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let expected = rgb.map(|f: f64| (255.0 * f) as u8);
            assert_eq!(Palette::rgb(i), expected, "entry {i}");
        }
        assert_eq!(Palette::rgb(0), [102, 193, 164]);
        assert_eq!(Palette::rgb(8), Palette::rgb(0));
        assert_eq!(Palette::rgb(9), Palette::rgb(1));
    }
}
