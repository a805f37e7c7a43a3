// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Named axis layouts.
//!
//! Operators that care about the semantic role of an axis (spatial
//! transforms, pooling, attention over sequence positions) look axes up
//! by name rather than by position. An axis that a tensor does not use
//! is simply absent; shape inference must leave absent axes absent.

/// Maps semantic axis names to positions in a [`crate::Shape`].
///
/// Every field may be `None` for tensors that don't carry that axis —
/// a plain matrix has no height or width, a 1-D embedding has nothing
/// but batch. Two layouts with the same present axes at the same
/// positions compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct AxisLayout {
    /// Index of the batch axis, if present.
    pub batch: Option<usize>,
    /// Index of the channel axis, if present.
    pub channel: Option<usize>,
    /// Index of the height axis, if present.
    pub height: Option<usize>,
    /// Index of the width axis, if present.
    pub width: Option<usize>,
}

impl AxisLayout {
    /// A layout with every named axis absent.
    pub fn none() -> Self {
        Self::default()
    }

    /// The standard 4-D NCHW layout (batch, channel, height, width).
    pub fn nchw() -> Self {
        Self {
            batch: Some(0),
            channel: Some(1),
            height: Some(2),
            width: Some(3),
        }
    }

    /// A 2-D layout treating rows as height and columns as width.
    pub fn hw() -> Self {
        Self {
            batch: None,
            channel: None,
            height: Some(0),
            width: Some(1),
        }
    }

    /// Returns `true` if no named axis is present.
    pub fn is_empty(&self) -> bool {
        self.batch.is_none()
            && self.channel.is_none()
            && self.height.is_none()
            && self.width.is_none()
    }

    /// Returns the largest axis index present, if any.
    pub fn max_index(&self) -> Option<usize> {
        [self.batch, self.channel, self.height, self.width]
            .into_iter()
            .flatten()
            .max()
    }
}

impl std::fmt::Display for AxisLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut axes: Vec<(usize, char)> = Vec::new();
        if let Some(i) = self.batch {
            axes.push((i, 'N'));
        }
        if let Some(i) = self.channel {
            axes.push((i, 'C'));
        }
        if let Some(i) = self.height {
            axes.push((i, 'H'));
        }
        if let Some(i) = self.width {
            axes.push((i, 'W'));
        }
        if axes.is_empty() {
            return f.write_str("-");
        }
        axes.sort();
        for (_, c) in axes {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nchw() {
        let l = AxisLayout::nchw();
        assert_eq!(l.batch, Some(0));
        assert_eq!(l.width, Some(3));
        assert_eq!(l.max_index(), Some(3));
        assert_eq!(format!("{l}"), "NCHW");
    }

    #[test]
    fn test_none() {
        let l = AxisLayout::none();
        assert!(l.is_empty());
        assert_eq!(l.max_index(), None);
        assert_eq!(format!("{l}"), "-");
    }

    #[test]
    fn test_hw() {
        let l = AxisLayout::hw();
        assert_eq!(l.height, Some(0));
        assert_eq!(l.width, Some(1));
        assert!(l.batch.is_none());
        assert_eq!(format!("{l}"), "HW");
    }
}
