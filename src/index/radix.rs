use crate::PlanError;
use crate::Result;

/// Mixed-radix positional system over per-agent digits.
///
/// Agent 0 is the most significant digit, so joint indices enumerate
/// tuples in lexicographic order. Joint actions, joint observations and
/// joint types are all encoded this way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Radix {
    sizes: Vec<usize>,
    strides: Vec<usize>,
    size: usize,
}

impl Radix {
    pub fn new(sizes: Vec<usize>) -> Result<Self> {
        let mut strides = vec![1; sizes.len()];
        let mut size = 1usize;
        for (i, n) in sizes.iter().enumerate().rev() {
            strides[i] = size;
            size = size
                .checked_mul(*n)
                .ok_or_else(|| PlanError::overflow(format!("joint space {:?}", sizes)))?;
        }
        Ok(Self {
            sizes,
            strides,
            size,
        })
    }
    /// Number of joint indices.
    pub fn size(&self) -> usize {
        self.size
    }
    /// Number of digits.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
    /// Radix of a single digit.
    pub fn base(&self, digit: usize) -> usize {
        self.sizes[digit]
    }
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }
    /// Joint-index weight of a single digit.
    pub fn stride(&self, digit: usize) -> usize {
        self.strides[digit]
    }
    pub fn joint(&self, digits: &[usize]) -> usize {
        debug_assert!(digits.len() == self.sizes.len());
        debug_assert!(digits.iter().zip(&self.sizes).all(|(d, n)| d < n));
        digits
            .iter()
            .zip(self.strides.iter())
            .map(|(d, s)| d * s)
            .sum()
    }
    pub fn digit(&self, joint: usize, digit: usize) -> usize {
        (joint / self.strides[digit]) % self.sizes[digit]
    }
    pub fn split(&self, joint: usize) -> Vec<usize> {
        (0..self.sizes.len()).map(|i| self.digit(joint, i)).collect()
    }
}
