use std::{fmt::Debug, ops};

use approx::AbsDiffEq;

use crate::multiply::{Variant, multiply_loop};

/// A 4x4 single precision matrix stored in row-major order.
///
/// Cell `(row, column)` lives at flat index `row * 4 + column`.
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Matrix4x4(pub [[f32; 4]; 4]);

impl Matrix4x4 {
    pub const ZERO: Self = Self([[0.; 4]; 4]);

    pub const IDENTITY: Self = Self([
        [1., 0., 0., 0.],
        [0., 1., 0., 0.],
        [0., 0., 1., 0.],
        [0., 0., 0., 1.],
    ]);

    /// Panics unless `rows` yields exactly four rows of four cells.
    pub fn from_rows(rows: impl IntoIterator<Item = impl IntoIterator<Item = f32>>) -> Self {
        Self(
            rows.into_iter()
                .map(|iter| {
                    iter.into_iter()
                        .collect::<Box<[_]>>()
                        .as_ref()
                        .try_into()
                        .expect("each row must have 4 cells")
                })
                .collect::<Box<[_]>>()
                .as_ref()
                .try_into()
                .expect("matrix must have 4 rows"),
        )
    }

    pub fn from_flat(cells: [f32; 4 * 4]) -> Self {
        bytemuck::cast(cells)
    }

    /// Returns the matrix's cells as a slice in row-major order.
    pub fn flat_cells(&self) -> &[f32; 4 * 4] {
        bytemuck::cast_ref(&self.0)
    }

    pub fn flat_cells_mut(&mut self) -> &mut [f32; 4 * 4] {
        bytemuck::cast_mut(&mut self.0)
    }

    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self(self.0.map(|row| row.map(&f)))
    }

    /// Multiplies `self * rhs` with the chosen kernel.
    pub fn multiply_with(&self, rhs: &Self, variant: Variant) -> Self {
        let mut result = Self::ZERO;
        variant.apply(self.flat_cells(), rhs.flat_cells(), result.flat_cells_mut());
        result
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl ops::Index<(usize, usize)> for Matrix4x4 {
    type Output = f32;
    fn index(&self, (row, column): (usize, usize)) -> &Self::Output {
        &self.0[row][column]
    }
}

impl ops::IndexMut<(usize, usize)> for Matrix4x4 {
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut Self::Output {
        &mut self.0[row][column]
    }
}

impl ops::Mul<&Matrix4x4> for &Matrix4x4 {
    type Output = Matrix4x4;

    fn mul(self, rhs: &Matrix4x4) -> Self::Output {
        let mut result = Matrix4x4::ZERO;
        multiply_loop(self.flat_cells(), rhs.flat_cells(), result.flat_cells_mut());
        result
    }
}

impl approx::AbsDiffEq for Matrix4x4 {
    type Epsilon = <f32 as AbsDiffEq>::Epsilon;
    fn default_epsilon() -> Self::Epsilon {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.flat_cells()
            .iter()
            .zip(other.flat_cells().iter())
            .all(|(lhs, rhs)| lhs.abs_diff_eq(rhs, epsilon))
    }
}

impl approx::RelativeEq for Matrix4x4 {
    fn default_max_relative() -> Self::Epsilon {
        f32::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.flat_cells()
            .iter()
            .zip(other.flat_cells().iter())
            .all(|(lhs, rhs)| lhs.relative_eq(rhs, epsilon, max_relative))
    }
}

impl approx::UlpsEq for Matrix4x4 {
    fn default_max_ulps() -> u32 {
        f32::default_max_ulps()
    }

    fn ulps_eq(&self, other: &Self, epsilon: Self::Epsilon, max_ulps: u32) -> bool {
        self.flat_cells()
            .iter()
            .zip(other.flat_cells().iter())
            .all(|(lhs, rhs)| lhs.ulps_eq(rhs, epsilon, max_ulps))
    }
}

impl Debug for Matrix4x4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Matrix4x4([")?;
        let mut first_row_written = false;
        for row in self.0.iter() {
            if f.alternate() {
                if !first_row_written {
                    f.write_str("\n")?
                }
                write!(f, "    {:?}", row)?;
                f.write_str(",\n")?;
            } else {
                if first_row_written {
                    f.write_str(", ")?
                }
                row.fmt(f)?;
            }
            first_row_written = true;
        }
        f.write_str("])")?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use approx::{assert_abs_diff_eq, assert_relative_eq, assert_ulps_eq};

    use super::*;

    #[test]
    fn test_approx() {
        let matrix = Matrix4x4::from_rows([
            [1., 0., 0., 0.],
            [0., 2., 0., 0.],
            [0., 0., 3., 0.],
            [0., 0., 0., 4.],
        ]);

        // Introduce floating point error.
        let modified = matrix.map(|cell| (cell * 10000. + 3.) / 10000. - 3. / 10000.);

        assert_ne!(matrix, modified);
        assert_abs_diff_eq!(matrix, modified);
        assert_relative_eq!(matrix, modified);
        assert_ulps_eq!(matrix, modified);
    }

    #[test]
    fn test_row_major_layout() {
        let matrix = Matrix4x4::from_rows([
            [1., 2., 3., 4.],
            [5., 6., 7., 8.],
            [9., 10., 11., 12.],
            [13., 14., 15., 16.],
        ]);

        assert_eq!(matrix[(1, 2)], 7.);
        assert_eq!(matrix.flat_cells()[6], 7.);
        assert_eq!(
            Matrix4x4::from_flat(*matrix.flat_cells()),
            matrix,
            "flat view must keep row-major order"
        );
    }

    #[test]
    fn test_index_mut_writes_flat_cell() {
        let mut matrix = Matrix4x4::ZERO;
        matrix[(3, 0)] = 9.;

        assert_eq!(matrix.flat_cells()[12], 9.);
    }

    #[test]
    #[should_panic]
    fn test_from_rows_rejects_short_row() {
        Matrix4x4::from_rows([
            vec![1., 0., 0., 0.],
            vec![0., 1., 0.],
            vec![0., 0., 1., 0.],
            vec![0., 0., 0., 1.],
        ]);
    }

    #[test]
    fn test_debug_format() {
        let compact = format!("{:?}", Matrix4x4::IDENTITY);
        assert_eq!(
            compact,
            "Matrix4x4([[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], \
             [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]])"
        );

        let pretty = format!("{:#?}", Matrix4x4::ZERO);
        assert_eq!(pretty.lines().count(), 6);
    }

    #[test]
    fn test_multiply_identity() {
        let matrix = Matrix4x4::from_rows([
            [1., 2., 3., 4.],
            [5., 6., 7., 8.],
            [9., 10., 11., 12.],
            [13., 14., 15., 16.],
        ]);

        assert_abs_diff_eq!(matrix, &matrix * &Matrix4x4::IDENTITY);
    }

    #[test]
    fn test_multiply() {
        let a = Matrix4x4::from_rows([
            [1., 2., 0., 1.],
            [0., 1., 3., 2.],
            [4., 0., 1., 0.],
            [2., 1., 0., 1.],
        ]);
        let b = Matrix4x4::from_rows([
            [2., 1., 3., 0.],
            [1., 0., 2., 1.],
            [0., 1., 1., 2.],
            [3., 0., 0., 1.],
        ]);
        let expected = Matrix4x4::from_rows([
            [7., 1., 7., 3.],
            [7., 3., 5., 9.],
            [8., 5., 13., 2.],
            [8., 2., 8., 2.],
        ]);

        assert_abs_diff_eq!(expected, &a * &b);
        for &variant in Variant::ALL {
            assert_abs_diff_eq!(expected, a.multiply_with(&b, variant));
        }
    }
}
