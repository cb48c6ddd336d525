//! Sample planes with reflected border margins.
//!
//! A plane stores its logical `width x height` samples surrounded by `margin`
//! rows and columns of border on every side. The border holds mirrored copies
//! of interior samples so that filters can read a few samples past each edge
//! without any special casing. Which interior sample a border position mirrors
//! is decided by the plane's [`Extension`] on that axis.

use core::mem;

use crate::error::{GeometryError, Result, bail};
use crate::schedule::RowRange;

/// The default border margin, in samples, on every side of a plane.
pub const MARGIN: usize = 4;

const PITCH_ALIGNMENT: usize = 8;

/// How samples outside of a plane's logical extent are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Extension {
    /// Whole-sample mirroring around the first and last sample,
    /// so that index `-1` maps to `1` and index `n` to `n - 2`.
    #[default]
    Symmetric,
    /// Mirroring for a band of detail coefficients.
    ///
    /// Coefficient `j` sits at position `2j + 1` of a signal of length
    /// `parent`. Out of range coefficients are found by mirroring that
    /// position in the parent signal and mapping it back.
    Detail {
        /// The length of the signal the coefficients were derived from.
        parent: usize,
    },
}

impl Extension {
    /// Map a possibly out of range index into `0..len`.
    pub fn source(self, index: isize, len: usize) -> usize {
        match self {
            Self::Symmetric => reflect(index, len),
            Self::Detail { parent } => {
                let mapped = reflect(2 * index + 1, parent).saturating_sub(1) / 2;
                mapped.min(len.saturating_sub(1))
            }
        }
    }
}

/// Whole-sample symmetric reflection of `index` into `0..len`.
pub(crate) fn reflect(index: isize, len: usize) -> usize {
    if len < 2 {
        return 0;
    }

    let period = 2 * (len as isize - 1);
    let folded = index.rem_euclid(period);

    if folded < len as isize {
        folded as usize
    } else {
        (period - folded) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) pitch: usize,
    pub(crate) margin: usize,
    pub(crate) x_extension: Extension,
    pub(crate) y_extension: Extension,
}

impl Layout {
    /// The number of stored rows, including the top and bottom margins.
    fn stored_rows(&self) -> usize {
        self.height + 2 * self.margin
    }

    /// The offset of row `y` in a buffer whose first stored row is `first`.
    fn offset(&self, y: isize, first: isize) -> usize {
        debug_assert!(y >= first);
        (y - first) as usize * self.pitch
    }

    /// Rewrite the horizontal margins of one stored row.
    fn fill_row(&self, row: &mut [i16]) {
        let (m, w) = (self.margin, self.width);

        for k in 1..=m {
            let left = self.x_extension.source(-(k as isize), w);
            row[m - k] = row[m + left];

            let right = self.x_extension.source((w - 1 + k) as isize, w);
            row[m + w - 1 + k] = row[m + right];
        }
    }

    /// Rewrite the margin rows above the plane. `data` must start at stored
    /// row `first` and contain every row the margin mirrors.
    fn fill_top(&self, data: &mut [i16], first: isize) {
        for k in 1..=self.margin as isize {
            let source = self.y_extension.source(-k, self.height) as isize;
            self.copy_row(data, first, source, -k);
        }
    }

    /// Rewrite the margin rows below the plane.
    fn fill_bottom(&self, data: &mut [i16], first: isize) {
        let last = self.height as isize - 1;

        for k in 1..=self.margin as isize {
            let source = self.y_extension.source(last + k, self.height) as isize;
            self.copy_row(data, first, source, last + k);
        }
    }

    fn copy_row(&self, data: &mut [i16], first: isize, source: isize, target: isize) {
        let source = self.offset(source, first);
        let target = self.offset(target, first);
        data.copy_within(source..source + self.pitch, target);
    }
}

/// A grid of signed 16-bit samples with a reflected border.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    data: Vec<i16>,
    layout: Layout,
}

impl Plane {
    /// Create a zeroed plane with the default margin and an aligned pitch.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!(GeometryError::ZeroDimension);
        }

        Ok(Self::blank(
            width,
            height,
            Extension::Symmetric,
            Extension::Symmetric,
        ))
    }

    /// Create a plane from `width * height` tightly packed samples.
    pub fn from_samples(width: usize, height: usize, samples: &[i16]) -> Result<Self> {
        let mut plane = Self::new(width, height)?;

        if samples.len() != width * height {
            bail!(GeometryError::SampleCount);
        }

        for (y, chunk) in samples.chunks_exact(width).enumerate() {
            plane.row_mut(y).copy_from_slice(chunk);
        }

        plane.fill_margins();

        Ok(plane)
    }

    /// Adopt a caller-provided buffer.
    ///
    /// Row `y` of the logical plane starts at `(y + margin) * pitch + margin`.
    /// The border is filled from the logical samples before returning.
    pub fn from_parts(
        data: Vec<i16>,
        width: usize,
        height: usize,
        pitch: usize,
        margin: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!(GeometryError::ZeroDimension);
        }

        if margin < MARGIN {
            bail!(GeometryError::MarginTooSmall);
        }

        if pitch < width + 2 * margin {
            bail!(GeometryError::PitchTooSmall);
        }

        let layout = Layout {
            width,
            height,
            pitch,
            margin,
            x_extension: Extension::Symmetric,
            y_extension: Extension::Symmetric,
        };

        if data.len() < layout.stored_rows() * pitch {
            bail!(GeometryError::BufferTooSmall);
        }

        let mut plane = Self { data, layout };
        plane.fill_margins();

        Ok(plane)
    }

    pub(crate) fn blank(
        width: usize,
        height: usize,
        x_extension: Extension,
        y_extension: Extension,
    ) -> Self {
        let margin = MARGIN;
        let pitch = (width + 2 * margin).next_multiple_of(PITCH_ALIGNMENT);
        let layout = Layout {
            width,
            height,
            pitch,
            margin,
            x_extension,
            y_extension,
        };

        Self {
            data: vec![0; layout.stored_rows() * pitch],
            layout,
        }
    }

    /// A zeroed plane with the same layout.
    pub(crate) fn like(&self) -> Self {
        Self {
            data: vec![0; self.data.len()],
            layout: self.layout,
        }
    }

    /// The number of logical samples per row.
    pub fn width(&self) -> usize {
        self.layout.width
    }

    /// The number of logical rows.
    pub fn height(&self) -> usize {
        self.layout.height
    }

    /// The distance between two rows, in samples.
    pub fn pitch(&self) -> usize {
        self.layout.pitch
    }

    /// The number of border samples on each side.
    pub fn margin(&self) -> usize {
        self.layout.margin
    }

    /// The border rule along the horizontal axis.
    pub fn x_extension(&self) -> Extension {
        self.layout.x_extension
    }

    /// The border rule along the vertical axis.
    pub fn y_extension(&self) -> Extension {
        self.layout.y_extension
    }

    /// Whether both planes have the same dimensions, pitch and margin.
    pub fn same_geometry(&self, other: &Self) -> bool {
        let (a, b) = (&self.layout, &other.layout);
        a.width == b.width && a.height == b.height && a.pitch == b.pitch && a.margin == b.margin
    }

    fn row_start(&self, y: isize) -> usize {
        self.layout.offset(y, -(self.layout.margin as isize))
    }

    /// Return the sample at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> i16 {
        self.row(y)[x]
    }

    /// Overwrite the sample at `(x, y)`.
    ///
    /// The border is not updated, call [`Plane::fill_margins`] once done.
    pub fn set(&mut self, x: usize, y: usize, value: i16) {
        self.row_mut(y)[x] = value;
    }

    /// Read a sample that may lie up to `margin` samples outside of the plane.
    #[inline]
    pub(crate) fn at(&self, x: isize, y: isize) -> i16 {
        let m = self.layout.margin as isize;
        debug_assert!(x >= -m && x < self.layout.width as isize + m);
        self.data[self.row_start(y) + (x + m) as usize]
    }

    /// The logical samples of row `y`.
    pub fn row(&self, y: usize) -> &[i16] {
        let start = self.row_start(y as isize) + self.layout.margin;
        &self.data[start..start + self.layout.width]
    }

    /// The logical samples of row `y`, mutably.
    ///
    /// The border is not updated, call [`Plane::fill_margins`] once done.
    pub fn row_mut(&mut self, y: usize) -> &mut [i16] {
        let start = self.row_start(y as isize) + self.layout.margin;
        &mut self.data[start..start + self.layout.width]
    }

    /// Iterate over the logical rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[i16]> + '_ {
        (0..self.layout.height).map(|y| self.row(y))
    }

    /// The logical samples of row `y`, where out of range rows are resolved
    /// through the vertical extension.
    pub(crate) fn row_at(&self, y: isize) -> &[i16] {
        self.row(self.layout.y_extension.source(y, self.layout.height))
    }

    /// Row `y` including its left and right margins, so that logical sample
    /// `x` lives at index `x + margin`.
    pub(crate) fn padded_row(&self, y: usize) -> &[i16] {
        let start = self.row_start(y as isize);
        &self.data[start..start + self.layout.width + 2 * self.layout.margin]
    }

    /// Rewrite the whole border from the logical samples.
    pub fn fill_margins(&mut self) {
        let layout = self.layout;

        for y in 0..layout.height {
            let start = self.row_start(y as isize);
            layout.fill_row(&mut self.data[start..start + layout.pitch]);
        }

        let first = -(layout.margin as isize);
        layout.fill_top(&mut self.data, first);
        layout.fill_bottom(&mut self.data, first);
    }

    /// Copy the logical samples into a tightly packed vector.
    pub fn to_vec(&self) -> Vec<i16> {
        let mut samples = Vec::with_capacity(self.layout.width * self.layout.height);

        for row in self.rows() {
            samples.extend_from_slice(row);
        }

        samples
    }

    /// Return the underlying buffer, border included.
    pub fn into_data(self) -> Vec<i16> {
        self.data
    }

    /// Split the plane into disjoint, mutable row bands, one per range.
    ///
    /// `ranges` must be ascending and cover `0..height` without gaps, empty
    /// ranges may appear anywhere. Every border row is handed to the band
    /// whose range contains the row it mirrors, so a band of any height can
    /// fill its share of the border without touching rows of another band.
    pub(crate) fn split_rows_mut(&mut self, ranges: &[RowRange]) -> Vec<RowsMut<'_>> {
        let layout = self.layout;
        let (pitch, height) = (layout.pitch, layout.height);
        let border = layout.margin * pitch;

        let (top, rest) = self.data.split_at_mut(border);
        let (mut body, rest) = rest.split_at_mut(height * pitch);
        let bottom = &mut rest[..border];

        let mut bands = Vec::with_capacity(ranges.len());
        let mut next = 0;

        for &rows in ranges {
            if !rows.is_empty() {
                debug_assert_eq!(rows.start, next);
                next = rows.end;
            }

            let (band, tail) = mem::take(&mut body).split_at_mut(rows.len() * pitch);
            body = tail;

            bands.push(RowsMut {
                data: band,
                rows,
                layout,
                borders: Vec::new(),
            });
        }

        debug_assert_eq!(next, height);

        let margin = layout.margin as isize;
        let above = top.chunks_exact_mut(pitch).zip(-margin..);
        let below = bottom.chunks_exact_mut(pitch).zip(height as isize..);

        for (row, y) in above.chain(below) {
            let source = layout.y_extension.source(y, height);

            if let Some(band) = bands.iter_mut().find(|b| b.rows.contains(source)) {
                band.borders.push((source, row));
            }
        }

        bands
    }
}

/// A mutable band of rows of a [`Plane`], handed to a single worker.
pub(crate) struct RowsMut<'a> {
    data: &'a mut [i16],
    rows: RowRange,
    layout: Layout,
    /// Border rows together with the row of this band they mirror.
    borders: Vec<(usize, &'a mut [i16])>,
}

impl RowsMut<'_> {
    /// The logical rows this band may write.
    pub(crate) fn rows(&self) -> RowRange {
        self.rows
    }

    pub(crate) fn width(&self) -> usize {
        self.layout.width
    }

    fn start(&self, y: usize) -> usize {
        debug_assert!(self.rows.contains(y));
        (y - self.rows.start) * self.layout.pitch
    }

    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [i16] {
        let start = self.start(y) + self.layout.margin;
        &mut self.data[start..start + self.layout.width]
    }

    pub(crate) fn fill_row_margins(&mut self, y: usize) {
        let start = self.start(y);
        self.layout
            .fill_row(&mut self.data[start..start + self.layout.pitch]);
    }

    /// Copy the border rows this band was handed from the rows they mirror.
    /// Must run after those rows, including their horizontal margins, have
    /// been written.
    pub(crate) fn fill_vertical_margins(&mut self) {
        let Self {
            data,
            rows,
            layout,
            borders,
        } = self;

        for (source, row) in borders.iter_mut() {
            let start = (*source - rows.start) * layout.pitch;
            row.copy_from_slice(&data[start..start + layout.pitch]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Plane {
        let samples: Vec<i16> = (0..width * height).map(|i| i as i16).collect();
        Plane::from_samples(width, height, &samples).unwrap()
    }

    // ==========================================
    // Extension rules
    // ==========================================

    #[test]
    fn reflect_mirrors_whole_samples() {
        let mapped: Vec<usize> = (-4..9).map(|i| reflect(i, 5)).collect();
        assert_eq!(mapped, vec![4, 3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1, 0]);

        assert_eq!(reflect(-1, 2), 1);
        assert_eq!(reflect(-2, 2), 0);
        assert_eq!(reflect(3, 2), 1);
        assert_eq!(reflect(7, 1), 0);
    }

    #[test]
    fn detail_extension_odd_parent() {
        // Parent of length 5 has detail coefficients at positions 1 and 3.
        let ext = Extension::Detail { parent: 5 };

        assert_eq!(ext.source(-1, 2), 0);
        assert_eq!(ext.source(0, 2), 0);
        assert_eq!(ext.source(1, 2), 1);
        assert_eq!(ext.source(2, 2), 1);
        assert_eq!(ext.source(3, 2), 0);
    }

    #[test]
    fn detail_extension_even_parent() {
        // Parent of length 6 has detail coefficients at positions 1, 3 and 5.
        let ext = Extension::Detail { parent: 6 };

        assert_eq!(ext.source(-1, 3), 0);
        assert_eq!(ext.source(-2, 3), 1);
        assert_eq!(ext.source(2, 3), 2);
        assert_eq!(ext.source(3, 3), 1);
    }

    // ==========================================
    // Construction
    // ==========================================

    #[test]
    fn from_samples_fills_border() {
        let plane = ramp(5, 4);

        assert_eq!(plane.pitch() % PITCH_ALIGNMENT, 0);
        assert_eq!(plane.at(-1, 0), plane.get(1, 0));
        assert_eq!(plane.at(-2, 1), plane.get(2, 1));
        assert_eq!(plane.at(5, 2), plane.get(3, 2));
        assert_eq!(plane.at(2, -1), plane.get(2, 1));
        assert_eq!(plane.at(2, 4), plane.get(2, 2));
        assert_eq!(plane.at(-1, -1), plane.get(1, 1));
        assert_eq!(plane.at(6, 5), plane.get(2, 1));
    }

    #[test]
    fn from_samples_rejects_bad_input() {
        assert_eq!(
            Plane::from_samples(3, 3, &[0; 8]),
            Err(GeometryError::SampleCount.into())
        );
        assert_eq!(
            Plane::from_samples(0, 3, &[]),
            Err(GeometryError::ZeroDimension.into())
        );
    }

    #[test]
    fn from_parts_validates_layout() {
        let pitch = 4 + 2 * MARGIN;
        let len = pitch * (3 + 2 * MARGIN);

        assert!(Plane::from_parts(vec![0; len], 4, 3, pitch, MARGIN).is_ok());
        assert_eq!(
            Plane::from_parts(vec![0; len], 4, 3, pitch - 1, MARGIN),
            Err(GeometryError::PitchTooSmall.into())
        );
        assert_eq!(
            Plane::from_parts(vec![0; len], 4, 3, pitch, MARGIN - 1),
            Err(GeometryError::MarginTooSmall.into())
        );
        assert_eq!(
            Plane::from_parts(vec![0; len - 1], 4, 3, pitch, MARGIN),
            Err(GeometryError::BufferTooSmall.into())
        );
    }

    #[test]
    fn from_parts_uses_caller_layout() {
        let (width, height, pitch, margin) = (3, 2, 16, 5);
        let mut data = vec![0; pitch * (height + 2 * margin)];
        data[(margin + 1) * pitch + margin + 2] = 42;

        let plane = Plane::from_parts(data, width, height, pitch, margin).unwrap();

        assert_eq!(plane.get(2, 1), 42);
        assert_eq!(plane.at(2, 2), 0);
        assert_eq!(plane.at(2, -1), 42);
        assert_eq!(plane.into_data().len(), pitch * (height + 2 * margin));
    }

    #[test]
    fn row_at_resolves_through_extension() {
        let plane = ramp(3, 4);

        assert_eq!(plane.row_at(-1), plane.row(1));
        assert_eq!(plane.row_at(4), plane.row(2));
        assert_eq!(plane.padded_row(0).len(), 3 + 2 * MARGIN);
    }

    // ==========================================
    // Row bands
    // ==========================================

    fn refill_in_bands(plane: &mut Plane, expected: &Plane, ranges: &[RowRange]) -> Vec<usize> {
        for y in 0..plane.height() {
            plane.row_mut(y).fill(0);
        }
        plane.fill_margins();
        assert_ne!(*plane, *expected);

        let mut bands = plane.split_rows_mut(ranges);
        let owned = bands.iter().map(|b| b.borders.len()).collect();

        for band in &mut bands {
            for y in band.rows().iter() {
                let row = expected.row(y).to_vec();
                band.row_mut(y).copy_from_slice(&row);
                band.fill_row_margins(y);
            }
            band.fill_vertical_margins();
        }

        owned
    }

    #[test]
    fn split_rows_hands_borders_to_the_band_holding_their_source() {
        let mut plane = ramp(4, 10);
        let expected = plane.clone();
        let ranges = [
            RowRange::new(0, 0),
            RowRange::new(0, 1),
            RowRange::new(1, 4),
            RowRange::new(4, 10),
            RowRange::new(10, 10),
        ];

        // The top border mirrors rows 1 to 4, the bottom one rows 8 to 5.
        let owned = refill_in_bands(&mut plane, &expected, &ranges);

        assert_eq!(owned, vec![0, 0, 3, 5, 0]);
        assert_eq!(plane, expected);
    }

    #[test]
    fn split_rows_supports_single_row_bands() {
        let mut plane = ramp(3, 5);
        let expected = plane.clone();
        let ranges: Vec<_> = (0..5).map(|y| RowRange::new(y, y + 1)).collect();

        let owned = refill_in_bands(&mut plane, &expected, &ranges);

        // Row 0 only mirrors the lowest border row.
        assert_eq!(owned, vec![1, 2, 2, 2, 1]);
        assert_eq!(plane, expected);
    }

    #[test]
    fn split_rows_follows_detail_extension() {
        let samples: Vec<i16> = (0..12).collect();
        let mut expected = Plane::blank(
            3,
            4,
            Extension::Symmetric,
            Extension::Detail { parent: 8 },
        );

        for (y, chunk) in samples.chunks_exact(3).enumerate() {
            expected.row_mut(y).copy_from_slice(chunk);
        }
        expected.fill_margins();

        let mut plane = expected.clone();
        let ranges = [RowRange::new(0, 1), RowRange::new(1, 3), RowRange::new(3, 4)];
        let owned = refill_in_bands(&mut plane, &expected, &ranges);

        // Rows -1, 6 and 7 mirror row 0, only row -4 mirrors row 3.
        assert_eq!(owned, vec![3, 4, 1]);
        assert_eq!(plane, expected);
    }
}
